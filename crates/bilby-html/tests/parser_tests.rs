//! Integration tests for the HTML tree builder.
//!
//! Trees are compared in the html5lib-tests canonical dump format, which
//! keeps the expectations readable and pins down exact structure.

use bilby_dom::DomTree;
use bilby_dom::serialize::{to_html, to_test_format};
use bilby_html::{FragmentContext, ParseOpts, parse_document, parse_fragment};

/// Helper to parse HTML and return the DOM tree.
fn parse(html: &str) -> DomTree {
    parse_document(html, &ParseOpts::default())
        .expect("lenient parsing never fails")
        .dom
}

/// Helper to parse and dump in html5lib format.
fn dump(html: &str) -> String {
    let tree = parse(html);
    to_test_format(&tree, tree.root())
}

fn dump_fragment(html: &str, context: &FragmentContext) -> String {
    let parsed = parse_fragment(html, context, &ParseOpts::default())
        .expect("lenient parsing never fails");
    to_test_format(&parsed.dom, parsed.dom.root())
}

fn errors(html: &str) -> Vec<String> {
    let opts = ParseOpts {
        collect_errors: true,
        ..ParseOpts::default()
    };
    parse_document(html, &opts)
        .expect("lenient parsing never fails")
        .errors
        .iter()
        .map(|e| e.code.to_string())
        .collect()
}

// ========== document skeleton ==========

#[test]
fn test_empty_input_synthesizes_skeleton() {
    assert_eq!(dump(""), "| <html>\n|   <head>\n|   <body>");
}

#[test]
fn test_bom_only_input_matches_empty() {
    assert_eq!(dump("\u{FEFF}"), dump(""));
}

#[test]
fn test_explicit_document_structure() {
    assert_eq!(
        dump("<!DOCTYPE html><html><head></head><body></body></html>"),
        "| <!DOCTYPE html>\n| <html>\n|   <head>\n|   <body>"
    );
}

#[test]
fn test_bare_text_gets_body() {
    assert_eq!(
        dump("Hello"),
        "| <html>\n|   <head>\n|   <body>\n|     \"Hello\""
    );
}

#[test]
fn test_head_elements_stay_in_head() {
    assert_eq!(
        dump("<title>T</title><p>x"),
        "| <html>\n|   <head>\n|     <title>\n|       \"T\"\n|   <body>\n|     <p>\n|       \"x\""
    );
}

#[test]
fn test_duplicate_html_merges_attributes() {
    // The dump sorts attributes; both survive on the one html element.
    assert_eq!(
        dump("<html lang=en><html class=x><body>"),
        "| <html>\n|   class=\"x\"\n|   lang=\"en\"\n|   <head>\n|   <body>"
    );
}

// ========== implied tags ==========

#[test]
fn test_p_implies_close() {
    assert_eq!(
        dump("<p>One<p>Two"),
        "| <html>\n|   <head>\n|   <body>\n|     <p>\n|       \"One\"\n|     <p>\n|       \"Two\""
    );
}

#[test]
fn test_li_implies_close() {
    assert_eq!(
        dump("<ul><li>a<li>b</ul>"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <ul>\n",
            "|       <li>\n|         \"a\"\n",
            "|       <li>\n|         \"b\""
        )
    );
}

#[test]
fn test_dd_dt_imply_close() {
    assert_eq!(
        dump("<dl><dt>t<dd>d</dl>"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <dl>\n",
            "|       <dt>\n|         \"t\"\n",
            "|       <dd>\n|         \"d\""
        )
    );
}

#[test]
fn test_end_p_without_open_p_makes_phantom() {
    assert_eq!(
        dump("<body></p>"),
        "| <html>\n|   <head>\n|   <body>\n|     <p>"
    );
}

#[test]
fn test_end_br_becomes_br() {
    assert_eq!(
        dump("x</br>y"),
        "| <html>\n|   <head>\n|   <body>\n|     \"x\"\n|     <br>\n|     \"y\""
    );
}

#[test]
fn test_image_is_rewritten_to_img() {
    assert_eq!(
        dump("<image src=x>"),
        "| <html>\n|   <head>\n|   <body>\n|     <img>\n|       src=\"x\""
    );
}

#[test]
fn test_pre_drops_first_newline() {
    assert_eq!(
        dump("<pre>\ntext</pre>"),
        "| <html>\n|   <head>\n|   <body>\n|     <pre>\n|       \"text\""
    );
}

// ========== adoption agency ==========

#[test]
fn test_misnested_b_and_p() {
    // <b>1<p>2</b>3</p>: the adoption agency splits b around the p.
    assert_eq!(
        dump("<b>1<p>2</b>3</p>"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <b>\n|       \"1\"\n",
            "|     <p>\n",
            "|       <b>\n|         \"2\"\n",
            "|       \"3\""
        )
    );
}

#[test]
fn test_adoption_agency_scenario() {
    // <p>a<b>b<i>c</p>d</i>e</b>: the inner <i> is cloned by
    // reconstruction after </p>.
    assert_eq!(
        dump("<p>a<b>b<i>c</p>d</i>e</b>"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <p>\n",
            "|       \"a\"\n",
            "|       <b>\n",
            "|         \"b\"\n",
            "|         <i>\n",
            "|           \"c\"\n",
            "|     <b>\n",
            "|       <i>\n",
            "|         \"d\"\n",
            "|       \"e\""
        )
    );
}

#[test]
fn test_nested_a_adoption() {
    // The second <a> runs the adoption agency; the div keeps a clone plus
    // the fresh element.
    assert_eq!(
        dump("<a><div><a>x</a></div>"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <a>\n",
            "|     <div>\n",
            "|       <a>\n",
            "|       <a>\n|         \"x\""
        )
    );
}

#[test]
fn test_formatting_reconstruction_after_p() {
    assert_eq!(
        dump("<p><b>x</p>y"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <p>\n",
            "|       <b>\n|         \"x\"\n",
            "|     <b>\n|       \"y\""
        )
    );
}

#[test]
fn test_noahs_ark_caps_identical_entries() {
    // Four identical <b>s: reconstruction after </p> recreates only three.
    assert_eq!(
        dump("<p><b><b><b><b>x</p>y"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <p>\n",
            "|       <b>\n|         <b>\n|           <b>\n|             <b>\n|               \"x\"\n",
            "|     <b>\n|       <b>\n|         <b>\n|           \"y\""
        )
    );
}

// ========== tables ==========

#[test]
fn test_table_with_implied_tbody() {
    assert_eq!(
        dump("<table><tr><td>x</td></tr></table>foo"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <table>\n",
            "|       <tbody>\n",
            "|         <tr>\n",
            "|           <td>\n|             \"x\"\n",
            "|     \"foo\""
        )
    );
}

#[test]
fn test_table_text_is_foster_parented() {
    // "A" moves out in front of the table; <td> implies tbody and tr.
    assert_eq!(
        dump("<table>A<td>B</td></table>"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     \"A\"\n",
            "|     <table>\n",
            "|       <tbody>\n",
            "|         <tr>\n",
            "|           <td>\n|             \"B\""
        )
    );
}

#[test]
fn test_table_whitespace_is_not_fostered() {
    assert_eq!(
        dump("<table> <td>B</table>"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <table>\n",
            "|       \" \"\n",
            "|       <tbody>\n",
            "|         <tr>\n",
            "|           <td>\n|             \"B\""
        )
    );
}

#[test]
fn test_element_foster_parenting() {
    assert_eq!(
        dump("<table><div>x</div><tr><td>y</table>"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <div>\n|       \"x\"\n",
            "|     <table>\n",
            "|       <tbody>\n",
            "|         <tr>\n",
            "|           <td>\n|             \"y\""
        )
    );
}

#[test]
fn test_hidden_input_in_table_stays() {
    assert_eq!(
        dump("<table><input type=hidden></table>"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <table>\n",
            "|       <input>\n|         type=\"hidden\""
        )
    );
}

#[test]
fn test_caption_and_colgroup() {
    assert_eq!(
        dump("<table><caption>c</caption><colgroup><col></colgroup><tr><td>x</table>"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <table>\n",
            "|       <caption>\n|         \"c\"\n",
            "|       <colgroup>\n|         <col>\n",
            "|       <tbody>\n",
            "|         <tr>\n",
            "|           <td>\n|             \"x\""
        )
    );
}

// ========== quirks mode ==========

#[test]
fn test_no_quirks_table_closes_p() {
    assert_eq!(
        dump("<!DOCTYPE html><p>a<table>b"),
        concat!(
            "| <!DOCTYPE html>\n| <html>\n|   <head>\n|   <body>\n",
            "|     <p>\n|       \"a\"\n",
            "|     \"b\"\n",
            "|     <table>"
        )
    );
}

#[test]
fn test_quirks_table_nests_in_p() {
    // No doctype: quirks mode, the table stays inside the paragraph and the
    // fostered text coalesces with "a".
    assert_eq!(
        dump("<p>a<table>b"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <p>\n|       \"ab\"\n",
            "|       <table>"
        )
    );
}

#[test]
fn test_iframe_srcdoc_suppresses_quirks() {
    let opts = ParseOpts {
        iframe_srcdoc: true,
        ..ParseOpts::default()
    };
    let parsed = parse_document("<!DOCTYPE bogus><p>a<table>b", &opts).unwrap();
    let dumped = to_test_format(&parsed.dom, parsed.dom.root());
    // No-quirks: the table is a sibling of the paragraph.
    assert_eq!(
        dumped,
        concat!(
            "| <!DOCTYPE bogus>\n| <html>\n|   <head>\n|   <body>\n",
            "|     <p>\n|       \"a\"\n",
            "|     \"b\"\n",
            "|     <table>"
        )
    );
}

// ========== select ==========

#[test]
fn test_select_options() {
    assert_eq!(
        dump("<select><option>A<option>B</select>"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <select>\n",
            "|       <option>\n|         \"A\"\n",
            "|       <option>\n|         \"B\""
        )
    );
}

#[test]
fn test_select_table_tag_ends_select() {
    assert_eq!(
        dump("<table><tr><td><select><td>x</table>"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <table>\n",
            "|       <tbody>\n",
            "|         <tr>\n",
            "|           <td>\n|             <select>\n",
            "|           <td>\n|             \"x\""
        )
    );
}

#[test]
fn test_select_permits_curated_html_content() {
    assert_eq!(
        dump("<select><div>d</div><button>b</button></select>"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <select>\n",
            "|       <div>\n|         \"d\"\n",
            "|       <button>\n|         \"b\""
        )
    );
}

#[test]
fn test_selectedcontent_is_populated() {
    assert_eq!(
        dump("<select><selectedcontent></selectedcontent><option selected><b>X</b></option></select>"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <select>\n",
            "|       <selectedcontent>\n",
            "|         <b>\n|           \"X\"\n",
            "|       <option>\n",
            "|         selected=\"\"\n",
            "|         <b>\n|           \"X\""
        )
    );
}

// ========== templates ==========

#[test]
fn test_template_contents_are_separate() {
    assert_eq!(
        dump("<template><td>cell</td></template>"),
        concat!(
            "| <html>\n|   <head>\n",
            "|     <template>\n",
            "|       content\n",
            "|         <td>\n|           \"cell\"\n",
            "|   <body>"
        )
    );
}

#[test]
fn test_template_in_body() {
    assert_eq!(
        dump("<body><template><p>x</p></template>"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <template>\n",
            "|       content\n",
            "|         <p>\n|           \"x\""
        )
    );
}

// ========== foreign content ==========

#[test]
fn test_svg_integration_point() {
    assert_eq!(
        dump("<!DOCTYPE html><html><head></head><body><svg><foreignObject><p>x</p></foreignObject></svg></body></html>"),
        concat!(
            "| <!DOCTYPE html>\n| <html>\n|   <head>\n|   <body>\n",
            "|     <svg svg>\n",
            "|       <svg foreignObject>\n",
            "|         <p>\n|           \"x\""
        )
    );
}

#[test]
fn test_svg_tag_and_attribute_case_adjustment() {
    assert_eq!(
        dump("<svg viewbox=\"0 0 1 1\"><lineargradient></lineargradient></svg>"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <svg svg>\n",
            "|       viewBox=\"0 0 1 1\"\n",
            "|       <svg linearGradient>"
        )
    );
}

#[test]
fn test_mathml_text_integration_point() {
    assert_eq!(
        dump("<math><mi>x</mi><mn>2</mn></math>"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <math math>\n",
            "|       <math mi>\n|         \"x\"\n",
            "|       <math mn>\n|         \"2\""
        )
    );
}

#[test]
fn test_foreign_breakout() {
    assert_eq!(
        dump("<svg><p>x"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <svg svg>\n",
            "|     <p>\n|       \"x\""
        )
    );
}

#[test]
fn test_font_with_color_breaks_out() {
    assert_eq!(
        dump("<svg><font color=red>x"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <svg svg>\n",
            "|     <font>\n|       color=\"red\"\n|       \"x\""
        )
    );
}

#[test]
fn test_font_without_breakout_attrs_stays_foreign() {
    assert_eq!(
        dump("<svg><font size-less=1>x"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <svg svg>\n",
            "|       <svg font>\n|         size-less=\"1\"\n|         \"x\""
        )
    );
}

#[test]
fn test_annotation_xml_html_integration() {
    assert_eq!(
        dump("<math><annotation-xml encoding=\"text/html\"><div>d</div></annotation-xml></math>"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <math math>\n",
            "|       <math annotation-xml>\n",
            "|         encoding=\"text/html\"\n",
            "|         <div>\n|           \"d\""
        )
    );
}

#[test]
fn test_mathml_definitionurl_adjustment() {
    assert_eq!(
        dump("<math definitionurl=x></math>"),
        concat!(
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <math math>\n",
            "|       definitionURL=\"x\""
        )
    );
}

// ========== frameset ==========

#[test]
fn test_frameset_replaces_body() {
    assert_eq!(
        dump("<html><frameset><frame></frameset>"),
        concat!(
            "| <html>\n|   <head>\n",
            "|   <frameset>\n",
            "|     <frame>"
        )
    );
}

#[test]
fn test_frameset_not_ok_after_text() {
    assert_eq!(
        dump("<body>x<frameset>"),
        "| <html>\n|   <head>\n|   <body>\n|     \"x\""
    );
}

// ========== comments ==========

#[test]
fn test_comment_placement() {
    assert_eq!(
        dump("<!--before--><html><body><!--inside--></body></html><!--after-->"),
        concat!(
            "| <!-- before -->\n",
            "| <html>\n|   <head>\n|   <body>\n",
            "|     <!-- inside -->\n",
            "| <!-- after -->"
        )
    );
}

// ========== fragments ==========

#[test]
fn test_fragment_tr_context() {
    assert_eq!(
        dump_fragment("<td>x</td>", &FragmentContext::new("tr")),
        "| <td>\n|   \"x\""
    );
}

#[test]
fn test_fragment_div_context() {
    assert_eq!(
        dump_fragment("<p>a<p>b", &FragmentContext::new("div")),
        "| <p>\n|   \"a\"\n| <p>\n|   \"b\""
    );
}

#[test]
fn test_fragment_title_context_is_rawtext() {
    assert_eq!(
        dump_fragment("a<b>c", &FragmentContext::new("title")),
        "| \"a<b>c\""
    );
}

// ========== errors ==========

#[test]
fn test_error_collection_order_is_deterministic() {
    let first = errors("<p>a<table>b");
    let second = errors("<p>a<table>b");
    assert_eq!(first, second);
    assert!(first.contains(&"expected-doctype-but-got-start-tag".to_string()));
    assert!(first.contains(&"foster-parenting-character".to_string()));
}

#[test]
fn test_strict_mode_raises_on_first_error() {
    let opts = ParseOpts {
        strict: true,
        ..ParseOpts::default()
    };
    let result = parse_document("<p>x", &opts);
    let error = result.expect_err("missing doctype is a parse error in strict mode");
    assert_eq!(error.error.code, "expected-doctype-but-got-start-tag");

    let ok = parse_document("<!DOCTYPE html><html><head></head><body><p>x</p></body></html>", &opts);
    assert!(ok.is_ok());
}

// ========== round trips ==========

#[test]
fn test_serialize_reparse_round_trip() {
    let inputs = [
        "<!DOCTYPE html><p>a<b>b</b></p>",
        "<table><tr><td>x</td></tr></table>",
        "<ul><li>1<li>2</ul>",
    ];
    for input in inputs {
        let tree = parse(input);
        let serialized = to_html(&tree, tree.root(), false, 2);
        let reparsed = parse(&serialized);
        assert_eq!(
            to_test_format(&tree, tree.root()),
            to_test_format(&reparsed, reparsed.root()),
            "round trip diverged for {input}"
        );
    }
}
