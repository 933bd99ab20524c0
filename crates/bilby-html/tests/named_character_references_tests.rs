//! Tests for the named character reference tables and the flush-time
//! decoder.

use bilby_html::tokenizer::character_reference::decode_entities_in_text;
use bilby_html::tokenizer::named_character_references::{is_legacy_entity, lookup_entity};

#[test]
fn test_lookup_common_entities() {
    assert_eq!(lookup_entity("amp"), Some("&"));
    assert_eq!(lookup_entity("lt"), Some("<"));
    assert_eq!(lookup_entity("gt"), Some(">"));
    assert_eq!(lookup_entity("nbsp"), Some("\u{00A0}"));
    assert_eq!(lookup_entity("eacute"), Some("\u{00E9}"));
}

#[test]
fn test_lookup_is_case_sensitive() {
    assert_eq!(lookup_entity("AElig"), Some("\u{00C6}"));
    assert_eq!(lookup_entity("aelig"), Some("\u{00E6}"));
    assert_eq!(lookup_entity("Amp"), None);
}

#[test]
fn test_lookup_multi_character_entity() {
    assert_eq!(lookup_entity("fjlig"), Some("fj"));
    assert_eq!(lookup_entity("NotEqualTilde"), Some("\u{2242}\u{338}"));
}

#[test]
fn test_lookup_unknown() {
    assert_eq!(lookup_entity("zzznope"), None);
}

#[test]
fn test_legacy_set() {
    assert!(is_legacy_entity("amp"));
    assert!(is_legacy_entity("not"));
    assert!(is_legacy_entity("COPY"));
    // Modern names require the semicolon.
    assert!(!is_legacy_entity("notin"));
    assert!(!is_legacy_entity("prod"));
}

#[test]
fn test_decode_simple_text() {
    assert_eq!(decode_entities_in_text("a &amp; b", false), "a & b");
    assert_eq!(decode_entities_in_text("no entities here", false), "no entities here");
}

#[test]
fn test_decode_is_stable_without_ampersand() {
    // Decoding is closed under re-decoding for &-free output.
    let decoded = decode_entities_in_text("&lt;p&gt;", false);
    assert_eq!(decoded, "<p>");
    assert_eq!(decode_entities_in_text(&decoded, false), "<p>");
}

#[test]
fn test_decode_legacy_prefix_in_text() {
    assert_eq!(decode_entities_in_text("&notit;", false), "\u{00AC}it;");
    assert_eq!(decode_entities_in_text("&notin;", false), "\u{2209}");
}

#[test]
fn test_decode_numeric() {
    assert_eq!(decode_entities_in_text("&#65;&#x42;", false), "AB");
    assert_eq!(decode_entities_in_text("&#0;", false), "\u{FFFD}");
    assert_eq!(decode_entities_in_text("&#x99;", false), "\u{2122}");
    assert_eq!(decode_entities_in_text("&#xDEAD;", false), "\u{FFFD}");
    assert_eq!(decode_entities_in_text("&#1114112;", false), "\u{FFFD}");
}

#[test]
fn test_decode_numeric_without_semicolon() {
    assert_eq!(decode_entities_in_text("&#65x", false), "Ax");
}

#[test]
fn test_decode_invalid_numeric_kept() {
    assert_eq!(decode_entities_in_text("&#;", false), "&#;");
    assert_eq!(decode_entities_in_text("&#x;", false), "&#x;");
}

#[test]
fn test_decode_attribute_suppression() {
    // Followed by alphanumeric or '=': not decoded in attributes.
    assert_eq!(decode_entities_in_text("&ampx", true), "&ampx");
    assert_eq!(decode_entities_in_text("&amp=x", true), "&amp=x");
    // Followed by anything else: decoded.
    assert_eq!(decode_entities_in_text("&amp x", true), "& x");
    assert_eq!(decode_entities_in_text("&amp;x", true), "&x");
}

#[test]
fn test_decode_attribute_never_uses_prefix_match() {
    assert_eq!(decode_entities_in_text("&notit;", true), "&notit;");
}
