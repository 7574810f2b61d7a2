//! Text decoding for a site that serves UTF-8 bytes behind Latin-1 labels.

/// Repair text that was decoded as Latin-1 while the underlying bytes were
/// UTF-8 ("MÃ©canique" becomes "Mécanique").
///
/// The text is re-encoded to Latin-1 and decoded as UTF-8; if either step
/// fails it was not mojibake and comes back unchanged, so repairing twice is
/// the same as repairing once.
pub fn fix_encoding(text: &str) -> String {
    let mut bytes = Vec::with_capacity(text.len());
    for ch in text.chars() {
        match u8::try_from(u32::from(ch)) {
            Ok(byte) => bytes.push(byte),
            Err(_) => return text.to_owned(),
        }
    }
    match String::from_utf8(bytes) {
        Ok(repaired) => repaired,
        Err(_) => text.to_owned(),
    }
}

/// Decode as Latin-1: every byte maps to the code point of the same value.
pub fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| char::from(byte)).collect()
}

/// Decode by sniffing the content: strict UTF-8 when the bytes allow it,
/// Latin-1 otherwise. More reliable than the headers on this site.
pub fn sniffed(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_owned(),
        Err(_) => latin1(bytes),
    }
}

/// Decode honouring a declared charset label; unlabelled or unknown labels
/// fall back to lossy UTF-8.
pub fn declared(bytes: &[u8], charset: Option<&str>) -> String {
    let label = charset.map(str::to_ascii_lowercase);
    match label.as_deref() {
        Some("iso-8859-1" | "latin1" | "latin-1" | "windows-1252") => latin1(bytes),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}
