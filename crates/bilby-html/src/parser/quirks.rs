//! Quirks-mode determination from the DOCTYPE.
//!
//! [§ 13.2.6.4.1 The "initial" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-initial-insertion-mode)

use bilby_dom::DoctypeData;

/// Document compatibility mode selected from the doctype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuirksMode {
    /// Full quirks mode.
    Quirks,
    /// Limited-quirks ("almost standards") mode.
    LimitedQuirks,
    /// Standards mode.
    NoQuirks,
}

/// Doctypes that are *not* a parse error. Everything else gets an
/// `unknown-doctype` error (independently of the quirks decision).
const ACCEPTABLE_DOCTYPES: &[(&str, Option<&str>, Option<&str>)] = &[
    ("html", None, None),
    ("html", None, Some("about:legacy-compat")),
    ("html", Some("-//W3C//DTD HTML 4.0//EN"), None),
    (
        "html",
        Some("-//W3C//DTD HTML 4.0//EN"),
        Some("http://www.w3.org/TR/REC-html40/strict.dtd"),
    ),
    ("html", Some("-//W3C//DTD HTML 4.01//EN"), None),
    (
        "html",
        Some("-//W3C//DTD HTML 4.01//EN"),
        Some("http://www.w3.org/TR/html4/strict.dtd"),
    ),
    (
        "html",
        Some("-//W3C//DTD XHTML 1.0 Strict//EN"),
        Some("http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd"),
    ),
    (
        "html",
        Some("-//W3C//DTD XHTML 1.1//EN"),
        Some("http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd"),
    ),
];

/// Public identifiers that force quirks mode on exact (lowercased) match.
const QUIRKY_PUBLIC_MATCHES: &[&str] = &[
    "-//w3o//dtd w3 html strict 3.0//en//",
    "-/w3c/dtd html 4.0 transitional/en",
    "html",
];

/// System identifiers that force quirks mode on exact (lowercased) match.
const QUIRKY_SYSTEM_MATCHES: &[&str] =
    &["http://www.ibm.com/data/dtd/v11/ibmxhtml1-transitional.dtd"];

/// Public identifier prefixes that force quirks mode.
const QUIRKY_PUBLIC_PREFIXES: &[&str] = &[
    "+//silmaril//dtd html pro v0r11 19970101//",
    "-//advasoft ltd//dtd html 3.0 aswedit + extensions//",
    "-//as//dtd html 3.0 aswedit + extensions//",
    "-//ietf//dtd html 2.0 level 1//",
    "-//ietf//dtd html 2.0 level 2//",
    "-//ietf//dtd html 2.0 strict level 1//",
    "-//ietf//dtd html 2.0 strict level 2//",
    "-//ietf//dtd html 2.0 strict//",
    "-//ietf//dtd html 2.0//",
    "-//ietf//dtd html 2.1e//",
    "-//ietf//dtd html 3.0//",
    "-//ietf//dtd html 3.2 final//",
    "-//ietf//dtd html 3.2//",
    "-//ietf//dtd html 3//",
    "-//ietf//dtd html level 0//",
    "-//ietf//dtd html level 1//",
    "-//ietf//dtd html level 2//",
    "-//ietf//dtd html level 3//",
    "-//ietf//dtd html strict level 0//",
    "-//ietf//dtd html strict level 1//",
    "-//ietf//dtd html strict level 2//",
    "-//ietf//dtd html strict level 3//",
    "-//ietf//dtd html strict//",
    "-//ietf//dtd html//",
    "-//metrius//dtd metrius presentational//",
    "-//microsoft//dtd internet explorer 2.0 html strict//",
    "-//microsoft//dtd internet explorer 2.0 html//",
    "-//microsoft//dtd internet explorer 2.0 tables//",
    "-//microsoft//dtd internet explorer 3.0 html strict//",
    "-//microsoft//dtd internet explorer 3.0 html//",
    "-//microsoft//dtd internet explorer 3.0 tables//",
    "-//netscape comm. corp.//dtd html//",
    "-//netscape comm. corp.//dtd strict html//",
    "-//o'reilly and associates//dtd html 2.0//",
    "-//o'reilly and associates//dtd html extended 1.0//",
    "-//o'reilly and associates//dtd html extended relaxed 1.0//",
    "-//softquad software//dtd hotmetal pro 6.0::19990601::extensions to html 4.0//",
    "-//softquad//dtd hotmetal pro 4.0::19971010::extensions to html 4.0//",
    "-//spyglass//dtd html 2.0 extended//",
    "-//sq//dtd html 2.0 hotmetal + extensions//",
    "-//sun microsystems corp.//dtd hotjava html//",
    "-//sun microsystems corp.//dtd hotjava strict html//",
    "-//w3c//dtd html 3 1995-03-24//",
    "-//w3c//dtd html 3.2 draft//",
    "-//w3c//dtd html 3.2 final//",
    "-//w3c//dtd html 3.2//",
    "-//w3c//dtd html 3.2s draft//",
    "-//w3c//dtd html 4.0 frameset//",
    "-//w3c//dtd html 4.0 transitional//",
    "-//w3c//dtd html experimental 19960712//",
    "-//w3c//dtd html experimental 970421//",
    "-//w3c//dtd w3 html//",
    "-//w3o//dtd w3 html 3.0//",
    "-//webtechs//dtd mozilla html 2.0//",
    "-//webtechs//dtd mozilla html//",
];

/// Public identifier prefixes that select limited-quirks mode.
const LIMITED_QUIRKY_PUBLIC_PREFIXES: &[&str] = &[
    "-//w3c//dtd xhtml 1.0 frameset//",
    "-//w3c//dtd xhtml 1.0 transitional//",
];

/// HTML 4.01 prefixes: quirks without a system id, limited-quirks with one.
const HTML4_PUBLIC_PREFIXES: &[&str] = &[
    "-//w3c//dtd html 4.01 frameset//",
    "-//w3c//dtd html 4.01 transitional//",
];

fn contains_prefix(haystack: &[&str], needle: &str) -> bool {
    haystack.iter().any(|prefix| needle.starts_with(prefix))
}

/// Decide whether a doctype is a parse error and which compatibility mode it
/// selects.
///
/// `iframe_srcdoc` suppresses quirks mode for non-quirky doctypes per
/// [§ 13.2.6.4.1](https://html.spec.whatwg.org/multipage/parsing.html#the-initial-insertion-mode).
pub fn doctype_error_and_quirks(doctype: &DoctypeData, iframe_srcdoc: bool) -> (bool, QuirksMode) {
    let name = doctype.name.as_deref().map(str::to_ascii_lowercase);
    let public_id = doctype.public_id.as_deref();
    let system_id = doctype.system_id.as_deref();

    let parse_error = !ACCEPTABLE_DOCTYPES.iter().any(|(ok_name, ok_public, ok_system)| {
        name.as_deref() == Some(*ok_name) && public_id == *ok_public && system_id == *ok_system
    });

    let public_lower = public_id.map(str::to_ascii_lowercase);
    let system_lower = system_id.map(str::to_ascii_lowercase);

    let quirks = if doctype.force_quirks {
        QuirksMode::Quirks
    } else if iframe_srcdoc {
        QuirksMode::NoQuirks
    } else if name.as_deref() != Some("html") {
        QuirksMode::Quirks
    } else if public_lower
        .as_deref()
        .is_some_and(|p| QUIRKY_PUBLIC_MATCHES.contains(&p))
    {
        QuirksMode::Quirks
    } else if system_lower
        .as_deref()
        .is_some_and(|s| QUIRKY_SYSTEM_MATCHES.contains(&s))
    {
        QuirksMode::Quirks
    } else if public_lower
        .as_deref()
        .is_some_and(|p| contains_prefix(QUIRKY_PUBLIC_PREFIXES, p))
    {
        QuirksMode::Quirks
    } else if public_lower
        .as_deref()
        .is_some_and(|p| contains_prefix(LIMITED_QUIRKY_PUBLIC_PREFIXES, p))
    {
        QuirksMode::LimitedQuirks
    } else if public_lower
        .as_deref()
        .is_some_and(|p| contains_prefix(HTML4_PUBLIC_PREFIXES, p))
    {
        if system_lower.is_none() {
            QuirksMode::Quirks
        } else {
            QuirksMode::LimitedQuirks
        }
    } else {
        QuirksMode::NoQuirks
    };

    (parse_error, quirks)
}
