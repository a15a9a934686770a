use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

#[derive(Debug)]
pub struct DecodedText {
    pub text: String,
    /// Lowercase encoding label, `utf-8-sig` when a UTF-8 BOM was stripped.
    pub encoding: String,
    pub had_errors: bool,
}

/// Decodes a language file. A BOM decides the encoding outright; otherwise
/// valid UTF-8 is taken as is and anything else goes through charset detection.
pub fn decode(bytes: &[u8]) -> DecodedText {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        let label = if encoding == UTF_8 {
            "utf-8-sig".to_string()
        } else {
            encoding.name().to_lowercase()
        };
        return DecodedText {
            text: text.into_owned(),
            encoding: label,
            had_errors,
        };
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return DecodedText {
            text: text.to_string(),
            encoding: "utf-8".into(),
            had_errors: false,
        };
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);

    let (text, _, had_errors) = encoding.decode(bytes);
    DecodedText {
        text: text.into_owned(),
        encoding: encoding.name().to_lowercase(),
        had_errors,
    }
}
