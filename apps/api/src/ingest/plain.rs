//! Plain-text and Markdown pass-through.

use crate::ingest::ExtractionError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Decodes file bytes as text. A UTF-16 byte-order mark switches to UTF-16; anything
/// else is read as UTF-8 (BOM stripped) with invalid sequences replaced.
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        return decode_utf16(rest, u16::from_be_bytes);
    }
    String::from_utf8_lossy(bytes).into_owned()
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Reads a text file. NUL characters mean the file is binary despite its name.
pub fn extract_plain(bytes: &[u8]) -> Result<String, ExtractionError> {
    let text = decode_text(bytes);
    if text.contains('\0') {
        return Err(ExtractionError::UnsupportedFormat(
            "file declared as text contains binary data".to_string(),
        ));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_passes_through_unchanged() {
        let text = "# 職缺說明\n\nSenior Rust Engineer\n";
        assert_eq!(extract_plain(text.as_bytes()).unwrap(), text);
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("Name,Age".as_bytes());
        assert_eq!(decode_text(&bytes), "Name,Age");
    }

    #[test]
    fn test_utf16_le_with_bom() {
        let mut bytes = UTF16_LE_BOM.to_vec();
        for unit in "hi 你".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_text(&bytes), "hi 你");
    }

    #[test]
    fn test_utf16_be_with_bom() {
        let mut bytes = UTF16_BE_BOM.to_vec();
        for unit in "ok".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_text(&bytes), "ok");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        assert_eq!(decode_text(&[b'a', 0xFF, b'b']), "a\u{FFFD}b");
    }

    #[test]
    fn test_binary_content_is_unsupported() {
        let err = extract_plain(&[0x50, 0x4B, 0x03, 0x04, 0x00, 0x00]).unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(_)));
    }
}
