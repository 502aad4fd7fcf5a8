//! CLI integration tests for swagger-ir binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const PETSTORE: &str = "tests/fixtures/petstore.json";

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("swagger-ir"))
}

// Helper to create a temp document or config file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

mod compile_command {
    use super::*;

    #[test]
    fn basic_compile() {
        cmd()
            .args(["compile", PETSTORE])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""className":"PetService""#))
            .stdout(predicate::str::contains(r#""rootUrl":"https://petstore.example.com/v1""#));
    }

    #[test]
    fn compile_with_pretty() {
        cmd()
            .args(["compile", PETSTORE, "--pretty"])
            .assert()
            .success()
            // Pretty output has newlines and indentation
            .stdout(predicate::str::contains("{\n"));
    }

    #[test]
    fn compile_with_output_file() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("ir.json");

        cmd()
            .args(["compile", PETSTORE, "--output", output.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());

        let content = fs::read_to_string(&output).unwrap();
        let ir: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(ir["models"]["pet"]["kind"], "object");
        assert_eq!(ir["services"]["Pet"]["operations"][0]["id"], "listPets");
    }

    #[test]
    fn exclude_tags_prunes_models() {
        cmd()
            .args(["compile", PETSTORE, "--exclude-tags", "admin"])
            .assert()
            .success()
            .stdout(predicate::str::contains("AdminReport").not());

        cmd()
            .args([
                "compile",
                PETSTORE,
                "--exclude-tags",
                "admin",
                "--keep-unused-models",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("AdminReport"));
    }

    #[test]
    fn container_threshold_flag() {
        cmd()
            .args(["compile", PETSTORE, "--min-params-for-container", "1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("encodeURIComponent(params.id)"));
    }

    #[test]
    fn config_file_options() {
        let dir = TempDir::new().unwrap();
        let config = write_temp_file(
            &dir,
            "config.json",
            r#"{"includeTags": "admin", "prefix": "Shop"}"#,
        );

        cmd()
            .args(["compile", PETSTORE, "--config", config.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""moduleClass":"ShopModule""#))
            .stdout(predicate::str::contains("PetService").not());
    }

    #[test]
    fn flags_override_config() {
        let dir = TempDir::new().unwrap();
        let config = write_temp_file(&dir, "config.json", r#"{"includeTags": "admin"}"#);

        cmd()
            .args([
                "compile",
                PETSTORE,
                "--config",
                config.to_str().unwrap(),
                "--include-tags",
                "pet",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("PetService"));
    }

    #[test]
    fn missing_operation_id_warns() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(
            &dir,
            "swagger.json",
            r#"{"swagger": "2.0", "paths": {"/pets": {"get": {"responses": {}}}}}"#,
        );

        cmd()
            .args(["compile", schema.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""id":"getPets""#))
            .stderr(predicate::str::contains("synthesized"));
    }
}

mod tags_command {
    use super::*;

    #[test]
    fn lists_services() {
        cmd()
            .args(["tags", PETSTORE])
            .assert()
            .success()
            .stdout(predicate::str::contains("Pet\t4 operations\t2 models"))
            .stdout(predicate::str::contains("Admin\t1 operations\t1 models"));
    }

    #[test]
    fn respects_filters() {
        cmd()
            .args(["tags", PETSTORE, "--exclude-tags", "admin"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Admin").not());
    }

    #[test]
    fn no_matching_services() {
        cmd()
            .args(["tags", PETSTORE, "--include-tags", "store"])
            .assert()
            .success()
            .stderr(predicate::str::contains("No services match"));
    }
}

mod error_handling {
    use super::*;

    #[test]
    fn file_not_found() {
        cmd()
            .args(["compile", "/nonexistent/swagger.json"])
            .assert()
            .failure()
            .code(3)
            .stderr(predicate::str::contains("not found"));
    }

    #[test]
    fn invalid_json_document() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "swagger.json", "not json");

        cmd()
            .args(["compile", schema.to_str().unwrap()])
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("invalid JSON"));
    }

    #[test]
    fn unsupported_version() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "openapi.json", r#"{"openapi": "3.0.0"}"#);

        cmd()
            .args(["compile", schema.to_str().unwrap()])
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("unsupported swagger version"));
    }

    #[test]
    fn unknown_parent() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(
            &dir,
            "swagger.json",
            r##"{"swagger": "2.0", "definitions": {"Pet": {"allOf": [{"$ref": "#/definitions/Animal"}]}}}"##,
        );

        cmd()
            .args(["compile", schema.to_str().unwrap()])
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("extends unknown model 'Animal'"));
    }

    #[test]
    fn invalid_config() {
        let dir = TempDir::new().unwrap();
        let config = write_temp_file(&dir, "config.json", r#"{"minParamsForContainer": "two"}"#);

        cmd()
            .args(["compile", PETSTORE, "--config", config.to_str().unwrap()])
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("invalid configuration"));
    }

    #[test]
    fn invalid_sort_params() {
        cmd()
            .args(["compile", PETSTORE, "--sort-params", "random"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("expected asc, desc or none"));
    }
}

mod help_and_version {
    use super::*;

    #[test]
    fn help_flag() {
        cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("compile"))
            .stdout(predicate::str::contains("tags"));
    }

    #[test]
    fn version_flag() {
        cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("swagger-ir"));
    }

    #[test]
    fn missing_schema_argument() {
        cmd().arg("compile").assert().failure();
    }
}
