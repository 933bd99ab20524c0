//! Foreign content parsing support for SVG and MathML.
//!
//! [§ 13.2.6.3 Creating and inserting nodes](https://html.spec.whatwg.org/multipage/parsing.html#creating-and-inserting-nodes)
//! [§ 13.2.6.5 The rules for parsing tokens in foreign content](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inforeign)

pub mod mathml;
pub mod svg;

pub use mathml::adjust_mathml_attributes;
pub use svg::{adjust_svg_attributes, adjust_svg_tag_name};

use bilby_dom::AttrList;

/// [§ 13.2.6.3 Adjust foreign attributes](https://html.spec.whatwg.org/multipage/parsing.html#adjust-foreign-attributes)
///
/// "When the steps below require the user agent to adjust foreign attributes
/// for a token, then, if any of the attributes on the token match the strings
/// in the first column of the following table, let the attribute be a
/// namespaced attribute, with the prefix being the string in the second
/// column, the local name being the string in the third column, and the
/// namespace being the namespace in the fourth column."
///
/// Format: (`attribute_name`, prefix, `local_name`, namespace)
///
/// NOTE: The DOM stores attribute names flat, so adjustment here means
/// normalizing the name to its prefixed spelling; the test-format dump
/// renders these with the colon replaced by a space.
const FOREIGN_ATTRIBUTE_ADJUSTMENTS: &[(&str, &str, &str, &str)] = &[
    // XLink namespace attributes
    ("xlink:actuate", "xlink", "actuate", "http://www.w3.org/1999/xlink"),
    ("xlink:arcrole", "xlink", "arcrole", "http://www.w3.org/1999/xlink"),
    ("xlink:href", "xlink", "href", "http://www.w3.org/1999/xlink"),
    ("xlink:role", "xlink", "role", "http://www.w3.org/1999/xlink"),
    ("xlink:show", "xlink", "show", "http://www.w3.org/1999/xlink"),
    ("xlink:title", "xlink", "title", "http://www.w3.org/1999/xlink"),
    ("xlink:type", "xlink", "type", "http://www.w3.org/1999/xlink"),
    // XML namespace attributes
    ("xml:lang", "xml", "lang", "http://www.w3.org/XML/1998/namespace"),
    ("xml:space", "xml", "space", "http://www.w3.org/XML/1998/namespace"),
    // XMLNS namespace attributes
    ("xmlns", "", "xmlns", "http://www.w3.org/2000/xmlns/"),
    ("xmlns:xlink", "xmlns", "xlink", "http://www.w3.org/2000/xmlns/"),
];

/// Normalized spelling for a namespaced foreign attribute, if `lower_name`
/// is one.
pub(crate) fn foreign_attribute_adjustment(lower_name: &str) -> Option<String> {
    for &(from, prefix, local_name, _namespace) in FOREIGN_ATTRIBUTE_ADJUSTMENTS {
        if lower_name == from {
            if prefix.is_empty() {
                return Some(local_name.to_string());
            }
            return Some(format!("{prefix}:{local_name}"));
        }
    }
    None
}

/// [§ 13.2.6.3 Adjust foreign attributes](https://html.spec.whatwg.org/multipage/parsing.html#adjust-foreign-attributes)
///
/// Adjust namespaced attributes (xlink:href, xml:lang, xmlns, ...) in place.
pub fn adjust_foreign_attributes(attrs: &mut AttrList) {
    for attr in attrs.iter_mut() {
        if let Some(adjusted) = foreign_attribute_adjustment(&attr.name.to_ascii_lowercase()) {
            attr.name = adjusted;
        }
    }
}
