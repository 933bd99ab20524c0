//! MathML foreign content support.
//!
//! [§ 13.2.6.3](https://html.spec.whatwg.org/multipage/parsing.html#creating-and-inserting-nodes)

use bilby_dom::AttrList;

/// [§ 13.2.6.3 Adjust MathML attributes](https://html.spec.whatwg.org/multipage/parsing.html#adjust-mathml-attributes)
///
/// "If the attribute's name is definitionurl, change it to definitionURL."
const MATHML_ATTRIBUTE_ADJUSTMENTS: &[(&str, &str)] = &[("definitionurl", "definitionURL")];

/// [§ 13.2.6.3 Adjust MathML attributes](https://html.spec.whatwg.org/multipage/parsing.html#adjust-mathml-attributes)
///
/// Adjust attribute names for MathML elements.
pub fn adjust_mathml_attributes(attrs: &mut AttrList) {
    for attr in attrs.iter_mut() {
        for &(from, to) in MATHML_ATTRIBUTE_ADJUSTMENTS {
            if attr.name == from {
                attr.name = to.to_string();
                break;
            }
        }
    }
}
