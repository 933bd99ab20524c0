//! HTML encoding sniffing and decoding.
//!
//! [§ 13.2.3.2 Determining the character encoding](https://html.spec.whatwg.org/multipage/parsing.html#determining-the-character-encoding)
//!
//! Inputs are bytes and an optional transport-supplied encoding label.
//! Outputs are a decoded string and the chosen encoding name.
//!
//! Precedence: a normalized transport label wins unconditionally; then a
//! leading BOM; then a bounded prescan for `<meta charset=...>` /
//! `<meta http-equiv="content-type" ...>`; otherwise windows-1252.

use encoding_rs::{EUC_JP, Encoding, ISO_8859_2, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};

const ASCII_WHITESPACE: &[u8] = &[0x09, 0x0A, 0x0C, 0x0D, 0x20];

fn is_ascii_ws(b: u8) -> bool {
    ASCII_WHITESPACE.contains(&b)
}

fn is_ascii_alpha(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

fn skip_ascii_whitespace(data: &[u8], mut i: usize) -> usize {
    while i < data.len() && is_ascii_ws(data[i]) {
        i += 1;
    }
    i
}

fn strip_ascii_whitespace(value: &[u8]) -> &[u8] {
    let mut start = 0;
    let mut end = value.len();
    while start < end && is_ascii_ws(value[start]) {
        start += 1;
    }
    while end > start && is_ascii_ws(value[end - 1]) {
        end -= 1;
    }
    &value[start..end]
}

/// Normalize an encoding label to one of the supported decoder names.
///
/// Case-insensitive. Security: `utf-7` and aliases map to windows-1252.
/// The latin-1 family maps to windows-1252 as HTML requires. Unknown labels
/// return `None`.
#[must_use]
pub fn normalize_encoding_label(label: &str) -> Option<&'static str> {
    let s = label.trim().to_ascii_lowercase();
    if s.is_empty() {
        return None;
    }

    // Security: never allow utf-7.
    if matches!(s.as_str(), "utf-7" | "utf7" | "x-utf-7") {
        return Some("windows-1252");
    }

    if matches!(s.as_str(), "utf-8" | "utf8") {
        return Some("utf-8");
    }

    // HTML treats latin-1 labels as windows-1252.
    if matches!(
        s.as_str(),
        "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" | "l1" | "cp819" | "ibm819"
    ) {
        return Some("windows-1252");
    }

    if matches!(s.as_str(), "windows-1252" | "windows1252" | "cp1252" | "x-cp1252") {
        return Some("windows-1252");
    }

    if matches!(s.as_str(), "iso-8859-2" | "iso8859-2" | "latin2" | "latin-2") {
        return Some("iso-8859-2");
    }

    if matches!(s.as_str(), "euc-jp" | "eucjp") {
        return Some("euc-jp");
    }

    match s.as_str() {
        "utf-16" | "utf16" => Some("utf-16"),
        "utf-16le" | "utf16le" => Some("utf-16le"),
        "utf-16be" | "utf16be" => Some("utf-16be"),
        _ => None,
    }
}

/// Per HTML meta charset handling: a meta-declared UTF-16/UTF-32 label is
/// rewritten to UTF-8 (the document being prescanned is evidently not
/// UTF-16-encoded, or the prescan could not have read it).
fn normalize_meta_declared_encoding(label: &[u8]) -> Option<&'static str> {
    let label = String::from_utf8_lossy(label);
    let enc = normalize_encoding_label(&label)?;
    if matches!(enc, "utf-16" | "utf-16le" | "utf-16be" | "utf-32" | "utf-32le" | "utf-32be") {
        return Some("utf-8");
    }
    Some(enc)
}

/// Byte-order-mark sniff: returns the encoding and the BOM length to skip.
fn sniff_bom(data: &[u8]) -> (Option<&'static str>, usize) {
    if data.len() >= 3 && data[0..3] == [0xEF, 0xBB, 0xBF] {
        return (Some("utf-8"), 3);
    }
    if data.len() >= 2 && data[0..2] == [0xFF, 0xFE] {
        return (Some("utf-16le"), 2);
    }
    if data.len() >= 2 && data[0..2] == [0xFE, 0xFF] {
        return (Some("utf-16be"), 2);
    }
    (None, 0)
}

/// Extract `charset=value` from a `content` attribute
/// (`text/html; charset=utf-8`). Handles quoting; returns the raw value.
fn extract_charset_from_content(content: &[u8]) -> Option<Vec<u8>> {
    if content.is_empty() {
        return None;
    }

    // Normalize whitespace to spaces and lowercase for robust matching.
    let s: Vec<u8> = content
        .iter()
        .map(|&ch| if is_ascii_ws(ch) { 0x20 } else { ch.to_ascii_lowercase() })
        .collect();

    let idx = s.windows(7).position(|w| w == b"charset")?;

    let n = s.len();
    let mut i = skip_ascii_whitespace(&s, idx + 7);
    if i >= n || s[i] != b'=' {
        return None;
    }
    i = skip_ascii_whitespace(&s, i + 1);
    if i >= n {
        return None;
    }

    let quote = if s[i] == b'"' || s[i] == b'\'' {
        let q = s[i];
        i += 1;
        Some(q)
    } else {
        None
    };

    let start = i;
    while i < n {
        let ch = s[i];
        match quote {
            Some(q) => {
                if ch == q {
                    break;
                }
            }
            None => {
                if is_ascii_ws(ch) || ch == b';' {
                    break;
                }
            }
        }
        i += 1;
    }

    if let Some(q) = quote {
        if i >= n || s[i] != q {
            return None;
        }
    }

    Some(s[start..i].to_vec())
}

/// Skip past the end of the tag starting at `i`, honoring quoted attribute
/// values so a `>` inside quotes does not terminate the tag. Returns the new
/// position and the number of bytes consumed against the non-comment budget.
fn skip_tag(data: &[u8], start: usize, max_total: usize, budget_left: usize) -> (usize, usize) {
    let n = data.len();
    let mut k = start;
    let mut consumed = 0;
    let mut quote: Option<u8> = None;
    while k < n && k < max_total && consumed < budget_left {
        let ch = data[k];
        match quote {
            None => {
                if ch == b'"' || ch == b'\'' {
                    quote = Some(ch);
                } else if ch == b'>' {
                    return (k + 1, consumed + 1);
                }
            }
            Some(q) => {
                if ch == q {
                    quote = None;
                }
            }
        }
        k += 1;
        consumed += 1;
    }
    (k, consumed)
}

/// Bounded prescan for a `<meta>` charset declaration.
///
/// Scans up to 1024 bytes worth of non-comment input, but allows skipping
/// arbitrarily large comments (bounded by a hard 64 KiB cap).
fn prescan_for_meta_charset(data: &[u8]) -> Option<&'static str> {
    const MAX_NON_COMMENT: usize = 1024;
    const MAX_TOTAL_SCAN: usize = 65536;

    let n = data.len();
    let mut i = 0;
    let mut non_comment = 0;

    while i < n && i < MAX_TOTAL_SCAN && non_comment < MAX_NON_COMMENT {
        if data[i] != b'<' {
            i += 1;
            non_comment += 1;
            continue;
        }

        // Comment: skipped without charging the non-comment budget.
        if i + 3 < n && &data[i + 1..i + 4] == b"!--" {
            let end = data[i + 4..].windows(3).position(|w| w == b"-->")?;
            i = i + 4 + end + 3;
            continue;
        }

        let j = i + 1;
        if j < n && data[j] == b'/' {
            // Skip end tag.
            let (next, consumed) = skip_tag(data, i, MAX_TOTAL_SCAN, MAX_NON_COMMENT - non_comment);
            i = next;
            non_comment += consumed;
            continue;
        }

        if j >= n || !is_ascii_alpha(data[j]) {
            i += 1;
            non_comment += 1;
            continue;
        }

        let name_start = j;
        let mut j = j;
        while j < n && is_ascii_alpha(data[j]) {
            j += 1;
        }

        if !data[name_start..j].eq_ignore_ascii_case(b"meta") {
            // Skip the rest of this tag so a '<' inside an attribute value
            // is not mistaken for a new tag.
            let (next, consumed) = skip_tag(data, i, MAX_TOTAL_SCAN, MAX_NON_COMMENT - non_comment);
            i = next;
            non_comment += consumed;
            continue;
        }

        // Parse attributes until '>'
        let mut charset: Option<Vec<u8>> = None;
        let mut http_equiv: Option<Vec<u8>> = None;
        let mut content: Option<Vec<u8>> = None;

        let mut k = j;
        let mut saw_gt = false;
        let start_i = i;
        let mut aborted = false;

        while k < n && k < MAX_TOTAL_SCAN {
            let ch = data[k];
            if ch == b'>' {
                saw_gt = true;
                k += 1;
                break;
            }
            if ch == b'<' {
                // Restart scanning from here.
                break;
            }
            if is_ascii_ws(ch) || ch == b'/' {
                k += 1;
                continue;
            }

            // Attribute name
            let attr_start = k;
            while k < n {
                let ch = data[k];
                if is_ascii_ws(ch) || matches!(ch, b'=' | b'>' | b'/' | b'<') {
                    break;
                }
                k += 1;
            }
            let attr_name: Vec<u8> = data[attr_start..k].to_ascii_lowercase();
            k = skip_ascii_whitespace(data, k);

            let mut value: Option<Vec<u8>> = None;
            if k < n && data[k] == b'=' {
                k = skip_ascii_whitespace(data, k + 1);
                if k >= n {
                    break;
                }

                if data[k] == b'"' || data[k] == b'\'' {
                    let q = data[k];
                    k += 1;
                    let val_start = k;
                    match data[k..].iter().position(|&b| b == q) {
                        Some(offset) => {
                            value = Some(data[val_start..val_start + offset].to_vec());
                            k = val_start + offset + 1;
                        }
                        None => {
                            // Unclosed quote: ignore this meta entirely.
                            aborted = true;
                            break;
                        }
                    }
                } else {
                    let val_start = k;
                    while k < n {
                        let ch = data[k];
                        if is_ascii_ws(ch) || ch == b'>' || ch == b'<' {
                            break;
                        }
                        k += 1;
                    }
                    value = Some(data[val_start..k].to_vec());
                }
            }

            match attr_name.as_slice() {
                b"charset" => charset = value.as_deref().map(|v| strip_ascii_whitespace(v).to_vec()),
                b"http-equiv" => http_equiv = value,
                b"content" => content = value,
                _ => {}
            }
        }

        if aborted {
            i += 1;
            non_comment += 1;
            continue;
        }

        if saw_gt {
            if let Some(charset) = charset.filter(|c| !c.is_empty()) {
                if let Some(enc) = normalize_meta_declared_encoding(&charset) {
                    return Some(enc);
                }
            }

            if let (Some(http_equiv), Some(content)) = (&http_equiv, &content) {
                if http_equiv.eq_ignore_ascii_case(b"content-type") {
                    if let Some(extracted) = extract_charset_from_content(content) {
                        if let Some(enc) = normalize_meta_declared_encoding(&extracted) {
                            return Some(enc);
                        }
                    }
                }
            }

            // Continue scanning after this tag.
            non_comment += k - start_i;
            i = k;
        } else {
            // Continue scanning after this tag attempt.
            i += 1;
            non_comment += 1;
        }
    }

    None
}

/// Sniff the encoding of an HTML byte stream.
///
/// Returns the chosen encoding name and the BOM length to skip.
#[must_use]
pub fn sniff_html_encoding(data: &[u8], transport_encoding: Option<&str>) -> (&'static str, usize) {
    // Transport overrides everything.
    if let Some(label) = transport_encoding {
        if let Some(enc) = normalize_encoding_label(label) {
            return (enc, 0);
        }
    }

    let (bom_enc, bom_len) = sniff_bom(data);
    if let Some(enc) = bom_enc {
        return (enc, bom_len);
    }

    if let Some(enc) = prescan_for_meta_charset(data) {
        return (enc, 0);
    }

    ("windows-1252", 0)
}

/// Decode an HTML byte stream using HTML encoding sniffing.
///
/// Returns `(text, encoding_name)`. Malformed sequences become U+FFFD; no
/// error is reported for them. Unsupported sniff results silently fall back
/// to windows-1252.
#[must_use]
pub fn decode_html(data: &[u8], transport_encoding: Option<&str>) -> (String, &'static str) {
    let (enc, bom_len) = sniff_html_encoding(data, transport_encoding);

    // Allowlist supported decoders.
    let (enc, bom_len) = match enc {
        "utf-8" | "windows-1252" | "iso-8859-2" | "euc-jp" | "utf-16" | "utf-16le" | "utf-16be" => {
            (enc, bom_len)
        }
        _ => ("windows-1252", 0),
    };

    let payload = &data[bom_len..];

    let decoder: &'static Encoding = match enc {
        "windows-1252" => WINDOWS_1252,
        "iso-8859-2" => ISO_8859_2,
        "euc-jp" => EUC_JP,
        // An unadorned utf-16 label means little-endian when no BOM said
        // otherwise (and the BOM path already consumed any BOM).
        "utf-16" | "utf-16le" => UTF_16LE,
        "utf-16be" => UTF_16BE,
        _ => UTF_8,
    };

    // BOM handling already happened in the sniff; any remaining U+FEFF is
    // the tokenizer's to discard.
    let (text, _) = decoder.decode_without_bom_handling(payload);
    (text.into_owned(), enc)
}
