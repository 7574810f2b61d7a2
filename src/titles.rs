//! Heading and file-name normalization.
//!
//! Site headings are inconsistently punctuated ("A1 : Cinématique" next to
//! "A3 la force") and may carry characters that are unsafe in file names.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TitleError {
    /// No `label rest` shape to split on once separators are removed.
    #[error("malformed title {raw:?}: expected a chapter label followed by a name")]
    Malformed { raw: String },
}

/// First character uppercased, the rest untouched.
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// First character uppercased, the rest lowercased (directory names).
pub fn capitalize_word(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Normalize a raw chapter heading into its on-disk title:
/// `"A1 : la cinématique"` becomes `"A1 - La cinématique"`.
pub fn normalize_chapter_title(raw: &str) -> Result<String, TitleError> {
    let stripped = raw.replace(": ", "");
    let (label, name) = stripped
        .split_once(' ')
        .ok_or_else(|| TitleError::Malformed { raw: raw.to_owned() })?;
    let title = format!("{label} - {}", capitalize_first(name));
    Ok(title.replace(" ?", "").replace('/', ", "))
}

/// Make a book title usable as a directory name.
pub fn sanitize_display(raw: &str) -> String {
    raw.replace(':', "-").replace(" ?", "").replace('/', ", ")
}

/// Archive entry name to a safe `.pdf` file name.
pub fn archive_filename(name: &str) -> String {
    format!("{name}.pdf")
        .replace(':', "-")
        .replace(['/', '\\'], "-")
        .replace('?', "")
        .replace('"', "'")
}
