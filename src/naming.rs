//! Identifier derivation for generated types and fields.

use crate::error::GenerateError;
use crate::schema::Schema;

/// Convert arbitrary text into an exported Go identifier.
///
/// Splits on every character that is not a letter or digit, capitalises the
/// first letter of each word and joins them. A leading digit gets a `_`
/// prefix. Returns an empty string when nothing usable remains.
pub fn go_name(text: &str) -> String {
    let mut name = String::with_capacity(text.len());
    let words = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty());

    for (i, word) in words.enumerate() {
        if i == 0 && word.starts_with(|c: char| c.is_ascii_digit()) {
            name.push('_');
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
    }
    name
}

/// Derive a type name for `schema`: its title if set, otherwise `hint`.
///
/// # Errors
///
/// Returns `GenerateError::InvalidName` if the chosen text has no letters
/// or digits.
pub fn type_name(schema: &Schema, hint: &str) -> Result<String, GenerateError> {
    let source = schema
        .title
        .as_deref()
        .filter(|title| !title.trim().is_empty())
        .unwrap_or(hint);
    identifier(source, &schema.path_element)
}

/// Sanitise `text` into an identifier, failing if nothing remains.
pub fn identifier(text: &str, path: &str) -> Result<String, GenerateError> {
    let name = go_name(text);
    if name.is_empty() {
        return Err(GenerateError::InvalidName {
            name: text.to_string(),
            path: path.to_string(),
        });
    }
    Ok(name)
}

/// Return `base`, or `base` with the smallest numeric suffix from 2 upwards
/// for which `taken` is false.
pub fn disambiguate(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}{}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Unescape the last segment of a JSON pointer (`~1` = `/`, `~0` = `~`).
pub fn last_pointer_segment(pointer: &str) -> String {
    pointer
        .rsplit('/')
        .next()
        .unwrap_or(pointer)
        .replace("~1", "/")
        .replace("~0", "~")
}
