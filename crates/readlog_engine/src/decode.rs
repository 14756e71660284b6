use chardetng::EncodingDetector;
use encoding_rs::Encoding;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPage {
    pub html: String,
    pub encoding_label: String,
}

/// Decode a page body into UTF-8: BOM -> Content-Type charset -> chardetng guess.
///
/// Malformed sequences become U+FFFD; metadata extraction is best effort and
/// never rejects a page for its encoding.
pub fn decode_page(bytes: &[u8], content_type: Option<&str>) -> DecodedPage {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    if let Some(enc) = content_type
        .and_then(charset_param)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return decode_with(bytes, enc);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_with(bytes, detector.guess(None, true))
}

/// Media type without parameters, lowercased.
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase()
}

fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']).to_string())
    })
}

fn decode_with(bytes: &[u8], enc: &'static Encoding) -> DecodedPage {
    let (text, actual, _had_errors) = enc.decode(bytes);
    DecodedPage {
        html: text.into_owned(),
        encoding_label: actual.name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_page, essence};

    #[test]
    fn charset_header_is_respected() {
        let decoded = decode_page(b"caf\xe9", Some("text/html; Charset=\"ISO-8859-1\""));
        assert_eq!(decoded.html, "café");
        assert_eq!(decoded.encoding_label, "windows-1252");
    }

    #[test]
    fn bom_wins_over_header() {
        let decoded = decode_page(b"\xEF\xBB\xBFhello", Some("text/html; charset=latin1"));
        assert_eq!(decoded.html, "hello");
        assert_eq!(decoded.encoding_label, "UTF-8");
    }

    #[test]
    fn invalid_bytes_are_replaced_not_rejected() {
        let decoded = decode_page(b"ok \xff\xfe done", Some("text/html; charset=utf-8"));
        assert!(decoded.html.starts_with("ok "));
        assert!(decoded.html.ends_with(" done"));
    }

    #[test]
    fn essence_strips_parameters() {
        assert_eq!(essence("Application/PDF; name=x.pdf"), "application/pdf");
    }
}
