//! Error types for document loading and IR compilation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading a schema document or a configuration file.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    InvalidConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Fatal errors during compilation of a schema document.
///
/// Everything else the compiler encounters (missing or duplicated operation
/// ids, filters matching nothing, unused models) is logged and recovered from.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("unsupported swagger version {found:?}: expected \"2.0\"")]
    UnsupportedVersion { found: String },

    #[error("unresolved reference: {reference}")]
    UnresolvedReference { reference: String },

    #[error("model '{model}' extends unknown model '{parent}'")]
    UnresolvedParent { model: String, parent: String },

    #[error("invalid document: {message}")]
    InvalidDocument { message: String },
}

impl CompileError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::FileNotFound {
            path: PathBuf::from("swagger.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = LoadError::InvalidJson { source };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn compile_error_exit_codes() {
        let err = CompileError::UnsupportedVersion {
            found: "3.0.1".into(),
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn compile_error_display() {
        let err = CompileError::UnresolvedParent {
            model: "Pet".into(),
            parent: "Animal".into(),
        };
        assert_eq!(err.to_string(), "model 'Pet' extends unknown model 'Animal'");

        let err = CompileError::UnsupportedVersion {
            found: "3.0.1".into(),
        };
        assert_eq!(
            err.to_string(),
            "unsupported swagger version \"3.0.1\": expected \"2.0\""
        );
    }
}
