//! Tests for HTML encoding sniffing and decoding.

use bilby_html::encoding::{decode_html, normalize_encoding_label, sniff_html_encoding};

#[test]
fn test_transport_label_wins() {
    let (enc, bom) = sniff_html_encoding(b"\xEF\xBB\xBFhello", Some("iso-8859-2"));
    assert_eq!(enc, "iso-8859-2");
    assert_eq!(bom, 0);
}

#[test]
fn test_unknown_transport_label_falls_through() {
    let (enc, bom) = sniff_html_encoding(b"\xEF\xBB\xBFhello", Some("klingon-8"));
    assert_eq!(enc, "utf-8");
    assert_eq!(bom, 3);
}

#[test]
fn test_bom_sniffing() {
    assert_eq!(sniff_html_encoding(b"\xEF\xBB\xBFx", None), ("utf-8", 3));
    assert_eq!(sniff_html_encoding(b"\xFF\xFEx\x00", None), ("utf-16le", 2));
    assert_eq!(sniff_html_encoding(b"\xFE\xFF\x00x", None), ("utf-16be", 2));
}

#[test]
fn test_fallback_is_windows_1252() {
    assert_eq!(sniff_html_encoding(b"<p>plain</p>", None), ("windows-1252", 0));
}

#[test]
fn test_label_normalization() {
    assert_eq!(normalize_encoding_label("UTF-8"), Some("utf-8"));
    assert_eq!(normalize_encoding_label("  utf8  "), Some("utf-8"));
    // Security: utf-7 is never honored.
    assert_eq!(normalize_encoding_label("utf-7"), Some("windows-1252"));
    // The latin-1 family is windows-1252 in HTML.
    assert_eq!(normalize_encoding_label("ISO-8859-1"), Some("windows-1252"));
    assert_eq!(normalize_encoding_label("latin1"), Some("windows-1252"));
    assert_eq!(normalize_encoding_label("latin2"), Some("iso-8859-2"));
    assert_eq!(normalize_encoding_label("EUC-JP"), Some("euc-jp"));
    assert_eq!(normalize_encoding_label("bogus"), None);
    assert_eq!(normalize_encoding_label(""), None);
}

#[test]
fn test_meta_charset_prescan() {
    let (enc, _) = sniff_html_encoding(b"<html><meta charset=\"utf-8\"><body>", None);
    assert_eq!(enc, "utf-8");

    let (enc, _) = sniff_html_encoding(b"<meta charset=iso-8859-2>", None);
    assert_eq!(enc, "iso-8859-2");
}

#[test]
fn test_meta_http_equiv_content_type() {
    let (enc, _) = sniff_html_encoding(
        b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=utf-8\">",
        None,
    );
    assert_eq!(enc, "utf-8");
}

#[test]
fn test_meta_inside_comment_is_skipped() {
    let (enc, _) = sniff_html_encoding(b"<!-- <meta charset=utf-8> -->", None);
    assert_eq!(enc, "windows-1252");
}

#[test]
fn test_meta_utf16_is_rewritten_to_utf8() {
    // A prescan that could read the document cannot be UTF-16.
    let (enc, _) = sniff_html_encoding(b"<meta charset=utf-16>", None);
    assert_eq!(enc, "utf-8");
}

#[test]
fn test_meta_with_unclosed_quote_is_ignored() {
    let (enc, _) = sniff_html_encoding(b"<meta charset=\"utf-8", None);
    assert_eq!(enc, "windows-1252");
}

#[test]
fn test_prescan_bounded_at_1024_non_comment_bytes() {
    let mut data = vec![b' '; 1500];
    data.extend_from_slice(b"<meta charset=utf-8>");
    let (enc, _) = sniff_html_encoding(&data, None);
    assert_eq!(enc, "windows-1252");
}

#[test]
fn test_prescan_skips_large_comment() {
    // Comments don't count against the 1024-byte budget.
    let mut data = Vec::new();
    data.extend_from_slice(b"<!--");
    data.extend(std::iter::repeat_n(b'x', 3000));
    data.extend_from_slice(b"--><meta charset=utf-8>");
    let (enc, _) = sniff_html_encoding(&data, None);
    assert_eq!(enc, "utf-8");
}

#[test]
fn test_decode_meta_then_utf8_payload() {
    // 3C 6D 65 74 61 20 63 68 61 72 73 65 74 3D 22 75 74 66 2D 38 22 3E C3 A9
    let bytes = b"<meta charset=\"utf-8\">\xC3\xA9";
    let (text, enc) = decode_html(bytes, None);
    assert_eq!(enc, "utf-8");
    assert_eq!(text, "<meta charset=\"utf-8\">\u{00E9}");
}

#[test]
fn test_decode_windows_1252_fallback() {
    let (text, enc) = decode_html(b"caf\xE9", None);
    assert_eq!(enc, "windows-1252");
    assert_eq!(text, "caf\u{00E9}");
}

#[test]
fn test_decode_utf16le_with_bom() {
    let (text, enc) = decode_html(b"\xFF\xFEh\x00i\x00", None);
    assert_eq!(enc, "utf-16le");
    assert_eq!(text, "hi");
}

#[test]
fn test_decode_invalid_utf8_replaces() {
    let (text, enc) = decode_html(b"a\xFFb", Some("utf-8"));
    assert_eq!(enc, "utf-8");
    assert_eq!(text, "a\u{FFFD}b");
}
