//! Character reference decoding for the HTML tokenizer.
//!
//! [§ 13.2.5.72 Character reference state](https://html.spec.whatwg.org/multipage/parsing.html#character-reference-state)
//!
//! The tokenizer buffers character data and decodes references at flush
//! boundaries rather than running the per-character reference states:
//! text flushed from the DATA and RCDATA families goes through
//! [`decode_entities_in_text`], attribute values go through it with
//! `in_attribute` set (which enables the stricter legacy rules).
//!
//! Supported forms: `&name;`, `&name` (legacy set only), `&#digits;`,
//! `&#xhex;`, with longest-legacy-prefix fallback (`&notit` resolves as
//! `&not` + `it`).

use super::named_character_references::{is_legacy_entity, lookup_entity, numeric_replacement};

/// Decode a numeric character reference body like `60` or `3C`.
///
/// [§ 13.2.5.80](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-end-state)
///
/// Applies the windows-1252 C1 substitution table; out-of-range and
/// surrogate code points become U+FFFD.
fn decode_numeric_entity(digits: &str, is_hex: bool) -> char {
    let radix = if is_hex { 16 } else { 10 };
    // Overflow means the value is far past U+10FFFF.
    let code_point = u32::from_str_radix(digits, radix).unwrap_or(u32::MAX);

    if let Some(replacement) = numeric_replacement(code_point) {
        return replacement;
    }
    if code_point > 0x0010_FFFF {
        return '\u{FFFD}';
    }
    if (0xD800..=0xDFFF).contains(&code_point) {
        return '\u{FFFD}';
    }
    char::from_u32(code_point).unwrap_or('\u{FFFD}')
}

/// A legacy name that also resolves in the full table. All legacy names do,
/// but the two tables are maintained separately, so check both.
fn legacy_lookup(name: &str) -> Option<&'static str> {
    if is_legacy_entity(name) {
        lookup_entity(name)
    } else {
        None
    }
}

/// Longest legacy prefix of `name` that resolves, with its length.
fn longest_legacy_prefix(name: &str) -> Option<(usize, &'static str)> {
    for k in (1..=name.len()).rev() {
        let prefix = &name[..k];
        if let Some(replacement) = legacy_lookup(prefix) {
            return Some((k, replacement));
        }
    }
    None
}

/// Decode all HTML character references in `text`.
///
/// `in_attribute` enables the stricter attribute-value rules: a
/// semicolonless legacy match is suppressed when the following character is
/// alphanumeric or `=`, and legacy prefix matches never decode.
#[must_use]
pub fn decode_entities_in_text(text: &str, in_attribute: bool) -> String {
    let bytes = text.as_bytes();
    let length = bytes.len();
    let mut result = String::with_capacity(text.len());
    let mut i = 0;

    while i < length {
        let Some(offset) = text[i..].find('&') else {
            result.push_str(&text[i..]);
            break;
        };
        let next_amp = i + offset;

        if next_amp > i {
            result.push_str(&text[i..next_amp]);
        }

        i = next_amp;
        let mut j = i + 1;

        // Numeric reference
        if j < length && bytes[j] == b'#' {
            j += 1;
            let mut is_hex = false;

            if j < length && (bytes[j] == b'x' || bytes[j] == b'X') {
                is_hex = true;
                j += 1;
            }

            let digit_start = j;
            if is_hex {
                while j < length && bytes[j].is_ascii_hexdigit() {
                    j += 1;
                }
            } else {
                while j < length && bytes[j].is_ascii_digit() {
                    j += 1;
                }
            }

            let has_semicolon = j < length && bytes[j] == b';';
            let digits = &text[digit_start..j];

            if digits.is_empty() {
                // Invalid numeric reference, keep as-is.
                let end = if has_semicolon { j + 1 } else { j };
                result.push_str(&text[i..end]);
                i = end;
            } else {
                result.push(decode_numeric_entity(digits, is_hex));
                i = if has_semicolon { j + 1 } else { j };
            }
            continue;
        }

        // Named reference: collect the alphanumeric run after '&'.
        while j < length && bytes[j].is_ascii_alphanumeric() {
            j += 1;
        }

        let entity_name = &text[i + 1..j];
        let has_semicolon = j < length && bytes[j] == b';';

        if entity_name.is_empty() {
            result.push('&');
            i += 1;
            continue;
        }

        // Exact match with the semicolon present.
        if has_semicolon {
            if let Some(replacement) = lookup_entity(entity_name) {
                result.push_str(replacement);
                i = j + 1;
                continue;
            }
            // Semicolon present but no exact match: in text, a legacy prefix
            // may still resolve (the rest re-emits verbatim).
            if !in_attribute {
                if let Some((matched, replacement)) = longest_legacy_prefix(entity_name) {
                    result.push_str(replacement);
                    i = i + 1 + matched;
                    continue;
                }
            }
        }

        // Legacy entity without a semicolon.
        if let Some(replacement) = legacy_lookup(entity_name) {
            // In attribute values, a semicolonless legacy match is suppressed
            // when followed by an alphanumeric or '='.
            let next_char = bytes.get(j).copied();
            if in_attribute
                && next_char.is_some_and(|ch| ch.is_ascii_alphanumeric() || ch == b'=')
            {
                result.push('&');
                i += 1;
                continue;
            }

            result.push_str(replacement);
            i = j;
            continue;
        }

        // Longest legacy prefix without a semicolon (`&notit` -> `&not` + `it`).
        if let Some((matched, replacement)) = longest_legacy_prefix(entity_name) {
            if in_attribute {
                // The character after a proper prefix is always alphanumeric
                // (the name was built from alphanumerics), so never decode.
                result.push('&');
                i += 1;
                continue;
            }

            result.push_str(replacement);
            i = i + 1 + matched;
            continue;
        }

        // No match at all.
        if has_semicolon {
            result.push_str(&text[i..=j]);
            i = j + 1;
        } else {
            result.push('&');
            i += 1;
        }
    }

    result
}
