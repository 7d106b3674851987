use std::cell::{Cell, RefCell};
use std::io;
use std::rc::Rc;
use std::time::Duration;

use bytes::Bytes;
use futures::stream;

use super::*;
use crate::config::test_parse_config;
use crate::error::ErrorKind;

const DOC: &str = "<html><head></head><body>";

fn body(inner: &str) -> String {
    format!("{DOC}{inner}</body></html>")
}

fn set_text(selectors: &[&str], text: &'static str) -> TransformationRule {
    TransformationRule::new(selectors.to_vec(), move |node, doc| async move {
        doc.set_text(node, text)?;
        anyhow::Ok(())
    })
}

fn add_class(selectors: &[&str], class: &'static str) -> TransformationRule {
    TransformationRule::new(selectors.to_vec(), move |node, doc| async move {
        doc.add_class(node, class)?;
        anyhow::Ok(())
    })
}

fn counting(selectors: &[&str], counter: Rc<Cell<usize>>) -> TransformationRule {
    TransformationRule::new(selectors.to_vec(), move |_, _| {
        let counter = counter.clone();
        async move {
            counter.set(counter.get() + 1);
            anyhow::Ok(())
        }
    })
}

fn failing(selectors: &[&str]) -> TransformationRule {
    TransformationRule::new(selectors.to_vec(), |_, _| async {
        Err::<(), _>(anyhow::anyhow!("mutation refused"))
    })
}

// =============================================================================
// Input shapes
// =============================================================================

#[tokio::test]
async fn test_text_input() {
    let transformer = Transformer::new([set_text(&["h1"], "Modified Title")]);
    let out = transformer
        .transform("<html><body><h1>Original Title</h1></body></html>")
        .await
        .unwrap();
    assert!(out.contains("<h1>Modified Title</h1>"));
}

#[tokio::test]
async fn test_bytes_input() {
    let transformer = Transformer::new([add_class(&["p"], "modified")]);
    let input = Bytes::from_static(b"<html><body><p>Test paragraph</p></body></html>");
    let out = transformer.transform(input).await.unwrap();
    assert!(out.contains("<p class=\"modified\">Test paragraph</p>"));
}

#[tokio::test]
async fn test_stream_input() {
    let rule = TransformationRule::new(["div"], |node, doc| async move {
        doc.set_attr(node, "data-modified", "true")?;
        anyhow::Ok(())
    });
    let chunks = ["<html><body><di", "v>Test div</div></bo", "dy></html>"];
    let input = Input::stream(stream::iter(
        chunks.map(|c| Ok::<_, io::Error>(Bytes::from_static(c.as_bytes()))),
    ));

    let out = Transformer::new([rule]).transform(input).await.unwrap();
    assert!(out.contains("<div data-modified=\"true\">Test div</div>"));
}

#[tokio::test]
async fn test_reader_input() {
    let transformer = Transformer::new([set_text(&["em"], "read")]);
    let input = Input::reader(&b"<p><em>x</em></p>"[..]);
    let out = transformer.transform(input).await.unwrap();
    assert_eq!(out, body("<p><em>read</em></p>"));
}

#[tokio::test]
async fn test_tree_input_is_mutated_in_place() {
    let doc = Document::parse_document("<html><body><span>Original span</span></body></html>");
    let transformer = Transformer::new([set_text(&["span"], "Modified span")]);

    let out = transformer.transform(doc.clone()).await.unwrap();
    assert!(out.contains("<span>Modified span</span>"));
    assert!(doc.html().contains("<span>Modified span</span>"));
}

#[tokio::test]
async fn test_tree_input_ignores_options() {
    let doc = Document::parse_document("<p>x</p>");
    let transformer = Transformer::new([]).with_options(TransformOptions::fragment());
    let out = transformer.transform(doc).await.unwrap();
    assert_eq!(out, body("<p>x</p>"));
}

// =============================================================================
// Rule semantics
// =============================================================================

#[tokio::test]
async fn test_multiple_rules() {
    let transformer = Transformer::new([
        set_text(&["h1"], "New Title"),
        add_class(&["p"], "highlight"),
    ]);
    let out = transformer
        .transform("<h1>Old Title</h1><p>Paragraph</p>")
        .await
        .unwrap();
    assert_eq!(out, body("<h1>New Title</h1><p class=\"highlight\">Paragraph</p>"));
}

#[tokio::test]
async fn test_every_match_is_mutated() {
    let transformer = Transformer::new([add_class(&[".item"], "processed")]);
    let out = transformer
        .transform("<div class=\"item\">A</div><div class=\"item\">B</div>")
        .await
        .unwrap();
    assert_eq!(
        out,
        body("<div class=\"item processed\">A</div><div class=\"item processed\">B</div>")
    );
}

#[tokio::test]
async fn test_multiple_selectors_in_one_rule() {
    let transformer = Transformer::new([add_class(&["h1", "h2"], "heading")]);
    let out = transformer
        .transform("<h1>Title 1</h1><h2>Title 2</h2><h3>Title 3</h3>")
        .await
        .unwrap();
    assert!(out.contains("<h1 class=\"heading\">Title 1</h1>"));
    assert!(out.contains("<h2 class=\"heading\">Title 2</h2>"));
    assert!(out.contains("<h3>Title 3</h3>"));
}

#[tokio::test]
async fn test_nested_selectors() {
    let transformer = Transformer::new([
        add_class(&[".container"], "processed"),
        set_text(&[".container p"], "Modified paragraph"),
    ]);
    let out = transformer
        .transform("<div class=\"container\"><p>Nested paragraph</p></div>")
        .await
        .unwrap();
    assert!(out.contains("<div class=\"container processed\"><p>Modified paragraph</p></div>"));
}

#[tokio::test]
async fn test_complex_selectors() {
    let transformer = Transformer::new([
        add_class(&["div > p.content"], "direct"),
        add_class(&["li:nth-child(2)"], "second"),
        add_class(&["span:not(.exclude)"], "included"),
    ]);
    let out = transformer
        .transform(
            "<div><p class=\"content\">a</p><section><p class=\"content\">b</p></section></div>\
             <ul><li>1</li><li>2</li><li>3</li></ul>\
             <span>x</span><span class=\"exclude\">y</span>",
        )
        .await
        .unwrap();

    assert!(out.contains("<p class=\"content direct\">a</p>"));
    assert!(out.contains("<section><p class=\"content\">b</p></section>"));
    assert!(out.contains("<ul><li>1</li><li class=\"second\">2</li><li>3</li></ul>"));
    assert!(out.contains("<span class=\"included\">x</span><span class=\"exclude\">y</span>"));
}

#[tokio::test]
async fn test_has_selector() {
    let transformer = Transformer::new([
        add_class(&["div:has(> p)"], "with-paragraph"),
        add_class(&["section:has(.note)"], "annotated"),
    ]);
    let out = transformer
        .transform(
            "<div><p>a</p></div><div><span>b</span></div>\
             <section><div><em class=\"note\">n</em></div></section><section></section>",
        )
        .await
        .unwrap();

    assert!(out.contains("<div class=\"with-paragraph\"><p>a</p></div><div><span>b</span></div>"));
    assert!(out.contains("<section class=\"annotated\"><div><em class=\"note\">n</em></div></section><section></section>"));
}

#[tokio::test]
async fn test_fragment_wrapper_never_matches() {
    let everything = Rc::new(Cell::new(0));
    let root = Rc::new(Cell::new(0));
    let transformer = Transformer::new([
        counting(&["*"], everything.clone()),
        counting(&["html"], root.clone()),
    ])
    .with_options(TransformOptions::fragment());

    let report = transformer
        .transform_report("<p>a</p>", &TransformOptions::fragment())
        .await
        .unwrap();
    assert_eq!(everything.get(), 1);
    assert_eq!(root.get(), 0);
    assert_eq!(report.applied, 1);
    assert_eq!(report.html, "<p>a</p>");
}

#[tokio::test]
async fn test_wrap_rule() {
    let rule = TransformationRule::new(["div"], |node, doc| async move {
        doc.wrap(node, "<section class=\"wrapper\"></section>")?;
        anyhow::Ok(())
    });
    let out = Transformer::new([rule])
        .transform("<div>Test</div>")
        .await
        .unwrap();
    assert!(out.contains("<section class=\"wrapper\"><div>Test</div></section>"));
}

#[tokio::test]
async fn test_empty_input_gets_body() {
    let rule = TransformationRule::new(["body"], |node, doc| async move {
        doc.append_html(node, "<p>Added content</p>")?;
        anyhow::Ok(())
    });
    let out = Transformer::new([rule]).transform("").await.unwrap();
    assert!(out.contains("<p>Added content</p>"));
}

#[tokio::test]
async fn test_head_elements() {
    let transformer = Transformer::new([
        set_text(&["title"], "New Title"),
        TransformationRule::new(["meta[name=\"description\"]"], |node, doc| async move {
            doc.set_attr(node, "content", "Updated description")?;
            anyhow::Ok(())
        }),
        TransformationRule::new(["link[rel=\"stylesheet\"]"], |node, doc| async move {
            doc.set_attr(node, "href", "/new.css")?;
            anyhow::Ok(())
        }),
        TransformationRule::new(["head"], |node, doc| async move {
            doc.append_html(node, "<meta name=\"robots\" content=\"noindex\">")?;
            anyhow::Ok(())
        }),
    ]);
    let out = transformer
        .transform(
            "<html><head><title>Old</title>\
             <meta name=\"description\" content=\"old\">\
             <link rel=\"stylesheet\" href=\"/old.css\"></head><body></body></html>",
        )
        .await
        .unwrap();

    let doc = Document::parse_document(&out);
    assert!(out.contains("<title>New Title</title>"));
    let meta = doc.select("head > meta[name=\"description\"]").unwrap()[0];
    assert_eq!(
        doc.attr(meta, "content").unwrap().as_deref(),
        Some("Updated description")
    );
    let link = doc.select("head > link").unwrap()[0];
    assert_eq!(doc.attr(link, "href").unwrap().as_deref(), Some("/new.css"));
    assert_eq!(
        doc.select("head > meta[name=\"robots\"][content=\"noindex\"]")
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_overlapping_selectors_mutate_twice() {
    let calls = Rc::new(Cell::new(0));
    let transformer = Transformer::new([counting(&["div", ".x"], calls.clone())]);

    let report = transformer
        .transform_report("<div class=\"x\"></div><div></div>", &TransformOptions::new())
        .await
        .unwrap();
    assert_eq!(calls.get(), 3);
    assert_eq!(report.applied, 3);
}

#[tokio::test]
async fn test_zero_matches_is_noop() {
    let calls = Rc::new(Cell::new(0));
    let transformer = Transformer::new([
        counting(&[".missing"], calls.clone()),
        set_text(&["p"], "hit"),
    ]);
    let out = transformer.transform("<p>x</p>").await.unwrap();
    assert_eq!(calls.get(), 0);
    assert_eq!(out, body("<p>hit</p>"));
}

#[tokio::test]
async fn test_no_rules_reserializes_input() {
    let input = "<div class=\"a\"><p>x</p></div>";
    let out = Transformer::default().transform(input).await.unwrap();
    assert_eq!(out, Document::parse_document(input).html());
}

#[tokio::test]
async fn test_async_mutation() {
    let rule = TransformationRule::new(["div"], |node, doc| async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        doc.set_text(node, "Async modified")?;
        anyhow::Ok(())
    });
    let out = Transformer::new([rule])
        .transform("<div>Original</div>")
        .await
        .unwrap();
    assert!(out.contains("<div>Async modified</div>"));
}

#[tokio::test]
async fn test_mutations_run_concurrently() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let rule = {
        let events = events.clone();
        TransformationRule::new(["li"], move |node, doc| {
            let events = events.clone();
            async move {
                let label = doc.text(node)?;
                events.borrow_mut().push(format!("start {label}"));
                tokio::time::sleep(Duration::from_millis(5)).await;
                events.borrow_mut().push(format!("end {label}"));
                anyhow::Ok(())
            }
        })
    };

    Transformer::new([rule])
        .transform("<ul><li>a</li><li>b</li><li>c</li></ul>")
        .await
        .unwrap();

    let events = events.borrow();
    assert_eq!(events.len(), 6);
    assert_eq!(events[..3], ["start a", "start b", "start c"]);
}

#[tokio::test]
async fn test_rules_start_in_collection_order() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let record = |name: &'static str| {
        let order = order.clone();
        TransformationRule::new(["p"], move |_, _| {
            let order = order.clone();
            async move {
                order.borrow_mut().push(name);
                anyhow::Ok(())
            }
        })
    };

    Transformer::new([record("first"), record("second"), record("third")])
        .transform("<p></p>")
        .await
        .unwrap();
    assert_eq!(*order.borrow(), ["first", "second", "third"]);
}

#[tokio::test]
async fn test_resolution_sees_earlier_synchronous_edits() {
    let transformer = Transformer::new([
        add_class(&["div"], "marked"),
        set_text(&[".marked"], "seen"),
    ]);
    let out = transformer.transform("<div>x</div>").await.unwrap();
    assert_eq!(out, body("<div class=\"marked\">seen</div>"));
}

#[tokio::test]
async fn test_fragment_mode() {
    let transformer = Transformer::new([set_text(&["h1"], "Modified")]);
    let out = transformer
        .transform_with("<h1>Title</h1>", &TransformOptions::fragment())
        .await
        .unwrap();
    assert_eq!(out, "<h1>Modified</h1>");

    let transformer = transformer.with_options(TransformOptions::fragment());
    assert_eq!(transformer.transform("<h1>x</h1>").await.unwrap(), "<h1>Modified</h1>");
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_failing_rule_is_isolated() {
    let transformer = Transformer::new([failing(&["p"]), set_text(&["h1"], "ok")]);
    let report = transformer
        .transform_report("<h1>x</h1><p>a</p><p>b</p>", &TransformOptions::new())
        .await
        .unwrap();

    assert!(report.html.contains("<h1>ok</h1>"));
    assert_eq!(report.applied, 1);
    assert_eq!(report.failures.len(), 2);
    assert!(report.failures.iter().all(|f| f.rule == 0 && f.selector == "p"));
    assert_eq!(report.failures[0].error.to_string(), "mutation refused");
}

#[tokio::test]
async fn test_failure_does_not_stop_sibling_nodes() {
    let rule = TransformationRule::new(["li"], |node, doc| async move {
        if doc.text(node)? == "bad" {
            anyhow::bail!("bad item");
        }
        doc.add_class(node, "done")?;
        anyhow::Ok(())
    });
    let out = Transformer::new([rule])
        .transform("<ul><li>bad</li><li>good</li></ul>")
        .await
        .unwrap();
    assert!(out.contains("<li>bad</li><li class=\"done\">good</li>"));
}

#[tokio::test]
async fn test_abort_policy_settles_then_fails() {
    let calls = Rc::new(Cell::new(0));
    let doc = Document::parse_document("<p>a</p><p>b</p>");
    let transformer = Transformer::new([failing(&["p:first-child"]), counting(&["p"], calls.clone())])
        .with_failure_policy(FailurePolicy::Abort);

    let err = transformer.transform(doc).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MutationFailure);
    assert_eq!(calls.get(), 2);
    match err {
        TransformError::Mutations(failures) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].selector, "p:first-child");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_invalid_selector_fails_before_mutating() {
    let calls = Rc::new(Cell::new(0));
    let transformer = Transformer::new([counting(&["p"], calls.clone()), counting(&["div["], calls.clone())]);

    let err = transformer.transform("<p></p><div></div>").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SelectorResolutionFailure);
    assert_eq!(calls.get(), 0);
}

#[tokio::test]
async fn test_invalid_utf8_is_parse_failure() {
    let err = Transformer::default()
        .transform(vec![b'<', b'p', 0xff, b'>'])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParseFailure);
}

#[tokio::test]
async fn test_stream_error_is_stream_failure() {
    let input = Input::stream(stream::iter([
        Ok(Bytes::from_static(b"<p>")),
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed")),
    ]));
    let err = Transformer::default().transform(input).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StreamFailure);
}

// =============================================================================
// Rule collection
// =============================================================================

#[test]
fn test_add_rules_keeps_order_and_identity() {
    let a = set_text(&["h1"], "a");
    let b = add_class(&["p"], "b");
    let c = add_class(&["div"], "c");

    let mut transformer = Transformer::new([a.clone()]);
    transformer.add_rules([b.clone(), c.clone()]);

    let rules = transformer.rules();
    assert_eq!(rules.len(), 3);
    assert!(rules[0].ptr_eq(&a));
    assert!(rules[1].ptr_eq(&b));
    assert!(rules[2].ptr_eq(&c));
}

#[test]
fn test_add_rule_and_extend() {
    let mut transformer = Transformer::default();
    transformer.add_rule(set_text(&["h1"], "a"));
    transformer.extend([set_text(&["h2"], "b")]);
    assert_eq!(transformer.rules().len(), 2);
    assert_eq!(transformer.rules()[1].selectors(), ["h2"]);
}

#[test]
fn test_remove_rule_matches_verbatim() {
    let keep = add_class(&["div p"], "x");
    let mut transformer = Transformer::new([
        set_text(&["h1"], "a"),
        keep.clone(),
        add_class(&["p", "h1"], "y"),
    ]);

    assert_eq!(transformer.remove_rule("p"), 1);
    assert_eq!(transformer.remove_rule("missing"), 0);
    assert_eq!(transformer.remove_rule("h1"), 1);
    assert_eq!(transformer.rules().len(), 1);
    assert!(transformer.rules()[0].ptr_eq(&keep));
}

#[tokio::test]
async fn test_clear_rules() {
    let mut transformer = Transformer::new([set_text(&["p"], "changed")]);
    transformer.clear_rules();
    assert!(transformer.rules().is_empty());

    let out = transformer.transform("<p>same</p>").await.unwrap();
    assert_eq!(out, body("<p>same</p>"));
}

// =============================================================================
// Configuration
// =============================================================================

#[tokio::test]
async fn test_from_config() {
    let config = test_parse_config(
        r#"
        [transform]
        failure_policy = "abort"
        is_document = false
        "#,
    );
    let transformer = Transformer::from_config(&config, [set_text(&["b"], "y")]);
    assert_eq!(transformer.failure_policy(), FailurePolicy::Abort);
    assert_eq!(transformer.options().is_document, Some(false));
    assert_eq!(transformer.transform("<b>x</b>").await.unwrap(), "<b>y</b>");
}

#[test]
fn test_default_policy_is_isolate() {
    assert_eq!(Transformer::default().failure_policy(), FailurePolicy::Isolate);
}
