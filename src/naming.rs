//! Identifier conventions for generated code.
//!
//! All helpers are ASCII-oriented: characters outside `[A-Za-z0-9_]` are
//! treated as separators.

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Key used for table lookups of models.
pub fn normalize_model_name(name: &str) -> String {
    name.to_lowercase()
}

/// Converts a name into a class name: separators are dropped and the
/// following character is upper-cased, as is the first character.
/// A leading digit is escaped with `_`.
pub fn to_class_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut up_next = false;
    for c in name.chars() {
        if !is_word_char(c) {
            up_next = true;
        } else if up_next {
            result.push(c.to_ascii_uppercase());
            up_next = false;
        } else if result.is_empty() {
            result.push(c.to_ascii_uppercase());
        } else {
            result.push(c);
        }
    }
    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, '_');
    }
    result
}

/// Converts a class name into a kebab-case file stem (`PetStore` -> `pet-store`).
pub fn to_file_name(type_name: &str) -> String {
    let mut result = String::with_capacity(type_name.len() + 4);
    let mut was_lower = false;
    for c in type_name.chars() {
        let is_lower = c.is_ascii_lowercase();
        if !is_lower && was_lower {
            result.push('-');
        }
        result.push(c.to_ascii_lowercase());
        was_lower = is_lower;
    }
    result
}

/// Converts an enum value into a constant name (`inStock` -> `IN_STOCK`).
pub fn to_enum_name(value: &str) -> String {
    let mut upper = String::with_capacity(value.len() + 4);
    let mut was_lower = false;
    for c in value.chars() {
        let is_lower = c.is_ascii_lowercase();
        if !is_lower && was_lower {
            upper.push('_');
        }
        upper.extend(c.to_uppercase());
        was_lower = is_lower;
    }
    if value.starts_with(|c: char| c.is_ascii_digit()) {
        upper.insert(0, '_');
    }

    // Collapse every run of non-word characters and underscores into one `_`
    let mut result = String::with_capacity(upper.len());
    for c in upper.chars() {
        let c = if is_word_char(c) { c } else { '_' };
        if c == '_' && result.ends_with('_') {
            continue;
        }
        result.push(c);
    }
    result
}

/// Transforms a string into an identifier: alphanumerics are kept, anything
/// else is dropped and upper-cases the next kept character.
pub fn to_identifier(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut was_sep = false;
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            if was_sep {
                result.push(c.to_ascii_uppercase());
                was_sep = false;
            } else {
                result.push(c);
            }
        } else {
            was_sep = true;
        }
    }
    result
}

/// Upper-cases the first character.
pub fn capitalize_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lower-cases the first character.
pub fn uncapitalize_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Normalizes a tag into a service name. Missing or empty tags fall back to
/// `default_tag`.
pub fn tag_name(tag: Option<&str>, default_tag: &str) -> String {
    let tag = match tag {
        Some(t) if !t.is_empty() => t,
        _ => default_tag,
    };
    capitalize_first(&to_identifier(tag))
}

/// Simple class name of a qualified reference (`#/definitions/pet-store` -> `PetStore`).
pub fn simple_ref(reference: &str) -> String {
    let simple = match reference.rfind('/') {
        Some(idx) => &reference[idx + 1..],
        None => reference,
    };
    to_class_name(simple)
}

/// Whether `name` can be emitted as a bare property key.
pub fn is_bare_identifier(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| is_word_char(c) || c == '$')
}

/// Property key as emitted: bare when possible, double-quoted otherwise.
pub fn property_key(name: &str) -> String {
    if is_bare_identifier(name) {
        name.to_string()
    } else {
        format!("\"{}\"", name)
    }
}

/// Renders `text` as a block doc comment indented by `level` steps.
///
/// Empty text yields just the indentation so templates can splice the result
/// unconditionally.
pub fn to_comments(text: Option<&str>, level: usize) -> String {
    let indent = "  ".repeat(level);
    let text = match text {
        Some(t) if !t.is_empty() => t,
        _ => return indent,
    };
    let mut result = format!("\n{indent}/**\n");
    for line in text.trim().split('\n') {
        result.push_str(&indent);
        result.push_str(" *");
        if !line.is_empty() {
            result.push(' ');
            result.push_str(line);
        }
        result.push('\n');
    }
    result.push_str(&indent);
    result.push_str(" */\n");
    result.push_str(&indent);
    result
}
