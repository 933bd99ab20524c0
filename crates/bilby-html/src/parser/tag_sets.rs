//! Element category tables used by tree construction.
//!
//! [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction)
//!
//! All names here are HTML-namespace local names; the foreign-namespace
//! categories (integration points, breakout set) live alongside them because
//! the foreign-content algorithm consults both.

/// [§ 13.2.6.2](https://html.spec.whatwg.org/multipage/parsing.html#special)
///
/// "The following elements have varying levels of special parsing rules."
/// (HTML-namespace members only; the MathML/SVG members are recognized via
/// the integration-point checks instead.)
pub const SPECIAL_ELEMENTS: &[&str] = &[
    "address", "applet", "area", "article", "aside", "base", "basefont", "bgsound", "blockquote",
    "body", "br", "button", "caption", "center", "col", "colgroup", "dd", "details", "dir", "div",
    "dl", "dt", "embed", "fieldset", "figcaption", "figure", "footer", "form", "frame", "frameset",
    "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hgroup", "hr", "html", "iframe", "img",
    "input", "keygen", "li", "link", "listing", "main", "marquee", "menu", "meta", "nav",
    "noembed", "noframes", "noscript", "object", "ol", "p", "param", "plaintext", "pre", "script",
    "search", "section", "select", "source", "style", "summary", "table", "tbody", "td",
    "template", "textarea", "tfoot", "th", "thead", "title", "tr", "track", "ul", "wbr", "xmp",
];

/// [§ 13.2.6.2](https://html.spec.whatwg.org/multipage/parsing.html#formatting)
///
/// "The following HTML elements are those that end up in the list of active
/// formatting elements."
pub const FORMATTING_ELEMENTS: &[&str] = &[
    "a", "b", "big", "code", "em", "font", "i", "nobr", "s", "small", "strike", "strong", "tt",
    "u",
];

/// The heading elements, h1 through h6.
pub const HEADING_ELEMENTS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// [§ 13.2.6.3](https://html.spec.whatwg.org/multipage/parsing.html#generate-implied-end-tags)
///
/// "When the steps below require the UA to generate implied end tags, then,
/// while the current node is [one of these], the UA must pop the current
/// node off the stack of open elements."
pub const IMPLIED_END_TAGS: &[&str] = &[
    "dd", "dt", "li", "optgroup", "option", "p", "rb", "rp", "rt", "rtc",
];

/// [§ 13.2.4.2](https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-scope)
///
/// The default scope terminator set. The scope variants below differ only in
/// what they add to (or replace in) this set.
pub const DEFAULT_SCOPE_TERMINATORS: &[&str] = &[
    "applet", "caption", "html", "table", "td", "th", "marquee", "object", "template",
];

/// [§ 13.2.4.2](https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-list-item-scope)
pub const LIST_ITEM_SCOPE_TERMINATORS: &[&str] = &[
    "applet", "caption", "html", "table", "td", "th", "marquee", "object", "template", "ol", "ul",
];

/// [§ 13.2.4.2](https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-button-scope)
pub const BUTTON_SCOPE_TERMINATORS: &[&str] = &[
    "applet", "caption", "html", "table", "td", "th", "marquee", "object", "template", "button",
];

/// [§ 13.2.4.2](https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-table-scope)
pub const TABLE_SCOPE_TERMINATORS: &[&str] = &["html", "table", "template"];

/// Terminators for closing an open `dd`/`dt` when a new one starts: every
/// special element except `address`, `div`, and `p`.
///
/// [§ 13.2.6.4.7](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
/// "If node is in the special category, but is not an address, div, or p
/// element, then jump to the step labeled done below."
pub const DEFINITION_SCOPE_TERMINATORS: &[&str] = &[
    "applet", "area", "article", "aside", "base", "basefont", "bgsound", "blockquote", "body",
    "br", "button", "caption", "center", "col", "colgroup", "dd", "details", "dir", "dl", "dt",
    "embed", "fieldset", "figcaption", "figure", "footer", "form", "frame", "frameset", "h1",
    "h2", "h3", "h4", "h5", "h6", "head", "header", "hgroup", "hr", "html", "iframe", "img",
    "input", "keygen", "li", "link", "listing", "main", "marquee", "menu", "meta", "nav",
    "noembed", "noframes", "noscript", "object", "ol", "p", "param", "plaintext", "pre", "script",
    "search", "section", "select", "source", "style", "summary", "table", "tbody", "td",
    "template", "textarea", "tfoot", "th", "thead", "title", "tr", "track", "ul", "wbr", "xmp",
];

/// [§ 13.2.6.1](https://html.spec.whatwg.org/multipage/parsing.html#appropriate-place-for-inserting-a-node)
///
/// The elements that trigger foster parenting when they are the insertion
/// target.
pub const TABLE_FOSTER_TARGETS: &[&str] = &["table", "tbody", "tfoot", "thead", "tr"];

/// Table-structural tags that insert into the table normally even when the
/// foster-parenting flag is set.
pub const TABLE_ALLOWED_CHILDREN: &[&str] = &[
    "caption", "col", "colgroup", "tbody", "td", "tfoot", "th", "thead", "tr",
];

/// [§ 13.2.6.5](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inforeign)
///
/// Start tags that break out of foreign content back into HTML parsing
/// (`font` joins them only when it carries a color/face/size attribute).
pub const FOREIGN_BREAKOUT_ELEMENTS: &[&str] = &[
    "b", "big", "blockquote", "body", "br", "center", "code", "dd", "div", "dl", "dt", "em",
    "embed", "h1", "h2", "h3", "h4", "h5", "h6", "head", "hr", "i", "img", "li", "listing",
    "menu", "meta", "nobr", "ol", "p", "pre", "ruby", "s", "small", "span", "strong", "strike",
    "sub", "sup", "table", "tt", "u", "ul", "var",
];

/// SVG elements that are HTML integration points.
///
/// [§ 13.2.6.5](https://html.spec.whatwg.org/multipage/parsing.html#html-integration-point)
/// (MathML `annotation-xml` joins them only with a `text/html` or
/// `application/xhtml+xml` encoding attribute, checked in code.)
pub const SVG_HTML_INTEGRATION_POINTS: &[&str] = &["foreignObject", "desc", "title"];

/// MathML text integration points.
///
/// [§ 13.2.6.5](https://html.spec.whatwg.org/multipage/parsing.html#mathml-text-integration-point)
pub const MATHML_TEXT_INTEGRATION_POINTS: &[&str] = &["mi", "mo", "mn", "ms", "mtext"];

/// Membership helper; all the tables above are small enough for a linear
/// scan.
pub fn contains(set: &[&str], name: &str) -> bool {
    set.contains(&name)
}
