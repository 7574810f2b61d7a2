use chrono::{DateTime, NaiveDateTime};
use lopdf::{Document, Object};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CreationDateError {
    /// The bytes are not a readable PDF.
    #[error("unreadable pdf: {0}")]
    Load(#[from] lopdf::Error),
    /// No information dictionary, or no creation date in it.
    #[error("pdf carries no creation date")]
    Missing,
    /// A creation date outside the `D:YYYYMMDDHHMMSS` family.
    #[error("unparseable creation date {raw:?}")]
    Unparseable { raw: String },
}

/// Extract a PDF's creation date, rendered as `DD/MM/YYYY HH:MM:SS`.
pub fn creation_date(bytes: &[u8]) -> Result<String, CreationDateError> {
    let document = Document::load_mem(bytes)?;
    let raw = info_creation_date(&document).ok_or(CreationDateError::Missing)?;
    render_pdf_date(&raw)
}

/// Raw `CreationDate` string from the trailer's info dictionary.
fn info_creation_date(document: &Document) -> Option<String> {
    let info = match document.trailer.get(b"Info").ok()? {
        Object::Reference(id) => document.get_object(*id).ok()?,
        direct => direct,
    };
    match info.as_dict().ok()?.get(b"CreationDate").ok()? {
        Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

/// `D:20240512093045+02'00'` renders as `12/05/2024 09:30:45`.
///
/// Quotes are stripped first; a missing offset or a bare trailing `Z` is
/// accepted. The rendered value keeps the stamp's own clock fields, offset
/// included but not applied.
fn render_pdf_date(raw: &str) -> Result<String, CreationDateError> {
    const RENDERED: &str = "%d/%m/%Y %H:%M:%S";
    let cleaned = raw.replace(['\'', '"'], "");
    let cleaned = cleaned.trim();
    if let Ok(stamp) = DateTime::parse_from_str(cleaned, "D:%Y%m%d%H%M%S%z") {
        return Ok(stamp.format(RENDERED).to_string());
    }
    let bare = cleaned.strip_suffix('Z').unwrap_or(cleaned);
    NaiveDateTime::parse_from_str(bare, "D:%Y%m%d%H%M%S")
        .map(|stamp| stamp.format(RENDERED).to_string())
        .map_err(|_| CreationDateError::Unparseable { raw: raw.to_owned() })
}
