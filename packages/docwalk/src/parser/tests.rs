use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use super::*;
use crate::config::PARAM_MAX_DEPTH;
use crate::testing::TreeDecoder;

fn manager_with(decoder: TreeDecoder) -> ParserManager {
    let mut manager = ParserManager::new();
    manager.register(decoder);
    manager
}

/// Label for an event: container name, text, or tag.
fn label(event: &NodeEvent) -> String {
    match event.tag() {
        Tag::Content => event.text().to_string(),
        Tag::Document => "#doc".to_string(),
        _ => format!("{}{{", event.string_attribute("name")),
    }
}

type Log = Rc<RefCell<Vec<String>>>;

fn recorder(log: &Log, prefix: &'static str) -> impl FnMut(&mut NodeEvent) + 'static {
    let log = Rc::clone(log);
    move |event: &mut NodeEvent| {
        log.borrow_mut().push(format!("{prefix}:{}", label(event)));
    }
}

fn labels(manager: &ParserManager, document: &str) -> Vec<String> {
    let log: Log = Rc::default();
    let mut parser = manager.get_parser_by_extension("doc.tree").unwrap();
    parser.add_callback_on_new_node(recorder(&log, "a"));
    parser.parse(document.as_bytes()).unwrap();
    let entries = log.borrow().clone();
    entries
        .into_iter()
        .map(|e| e.trim_start_matches("a:").to_string())
        .collect()
}

#[test]
fn test_preorder_depth_and_sequence() {
    let manager = manager_with(TreeDecoder::new());
    let events = RefCell::new(Vec::new());
    let mut parser = manager.get_parser_by_extension("doc.tree").unwrap();
    parser.add_callback_on_new_node(|event: &mut NodeEvent| {
        events
            .borrow_mut()
            .push((label(event), event.depth(), event.sequence()));
    });
    let summary = parser.parse(b"one box { two inner { three } } four").unwrap();
    drop(parser);

    assert_eq!(
        events.into_inner(),
        vec![
            ("#doc".to_string(), 0, 0),
            ("one".to_string(), 1, 1),
            ("box{".to_string(), 1, 2),
            ("two".to_string(), 2, 3),
            ("inner{".to_string(), 2, 4),
            ("three".to_string(), 3, 5),
            ("four".to_string(), 1, 6),
        ]
    );
    assert_eq!(
        summary,
        ParseSummary {
            outcome: Outcome::Completed,
            events: 7,
            skipped: 0,
        }
    );
}

#[test]
fn test_root_document_attributes() {
    let manager = manager_with(TreeDecoder::new());
    let root = RefCell::new(None);
    let mut parser = manager.get_parser_by_extension("Notes.TREE").unwrap();
    parser.add_callback_on_new_node(|event: &mut NodeEvent| {
        if event.tag() == &Tag::Document {
            *root.borrow_mut() = Some(event.clone());
        }
    });
    parser.parse(b"a b").unwrap();
    drop(parser);

    let root = root.into_inner().unwrap();
    assert_eq!(root.string_attribute("name"), "Notes.TREE");
    assert_eq!(root.string_attribute("format"), "tree");
    assert_eq!(root.uint_attribute("size"), 3);
    assert_eq!(root.text(), "");
}

#[test]
fn test_observers_run_in_registration_order() {
    let manager = manager_with(TreeDecoder::new());
    let log: Log = Rc::default();
    let mut parser = manager.get_parser_by_extension("doc.tree").unwrap();
    parser.add_callback_on_new_node(recorder(&log, "first"));
    parser.add_callback_on_new_node(recorder(&log, "second"));
    parser.parse(b"x y").unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            "first:#doc",
            "second:#doc",
            "first:x",
            "second:x",
            "first:y",
            "second:y",
        ]
    );
}

#[test]
fn test_skip_does_not_cancel() {
    let manager = manager_with(TreeDecoder::new());
    let log: Log = Rc::default();
    let mut parser = manager.get_parser_by_extension("doc.tree").unwrap();
    parser.add_callback_on_new_node(|event: &mut NodeEvent| {
        if event.text() == "drop" {
            event.set_skip();
        }
    });
    parser.add_callback_on_new_node(recorder(&log, "w"));
    let summary = parser.parse(b"keep drop keep2").unwrap();

    assert_eq!(*log.borrow(), vec!["w:#doc", "w:keep", "w:keep2"]);
    assert_eq!(summary.outcome, Outcome::Completed);
    assert_eq!(summary.events, 4);
    assert_eq!(summary.skipped, 1);
}

#[test]
fn test_skipped_container_subtree_is_withheld_from_later_observers() {
    let manager = manager_with(TreeDecoder::new());
    let log: Log = Rc::default();
    let mut parser = manager.get_parser_by_extension("doc.tree").unwrap();
    parser.add_callback_on_new_node(recorder(&log, "early"));
    parser.add_callback_on_new_node(|event: &mut NodeEvent| {
        if event.string_attribute("name") == "secret" {
            event.set_skip();
        }
    });
    parser.add_callback_on_new_node(recorder(&log, "late"));
    parser
        .parse(b"secret { hidden nested { deeper } } public { shown }")
        .unwrap();

    let late: Vec<String> = log
        .borrow()
        .iter()
        .filter(|e| e.starts_with("late:"))
        .cloned()
        .collect();
    assert_eq!(late, vec!["late:#doc", "late:public{", "late:shown"]);

    // observers before the skipping one still see the whole subtree
    let early = log.borrow().iter().filter(|e| e.starts_with("early:")).count();
    assert_eq!(early, 7);
}

struct Auditor {
    log: Log,
}

impl Observer for Auditor {
    fn on_node(&mut self, event: &mut NodeEvent) {
        self.log
            .borrow_mut()
            .push(format!("{}:{}", label(event), event.is_skipped()));
    }

    fn sees_skipped(&self) -> bool {
        true
    }
}

#[test]
fn test_opted_in_observer_sees_skipped_event_but_not_subtree() {
    let manager = manager_with(TreeDecoder::new());
    let log: Log = Rc::default();
    let mut parser = manager.get_parser_by_extension("doc.tree").unwrap();
    parser.add_callback_on_new_node(|event: &mut NodeEvent| {
        if event.string_attribute("name") == "old" || event.text() == "stale" {
            event.set_skip();
        }
    });
    parser.add_callback_on_new_node(Auditor {
        log: Rc::clone(&log),
    });
    parser.parse(b"stale old { inside } fresh").unwrap();

    assert_eq!(
        *log.borrow(),
        vec!["#doc:false", "stale:true", "old{:true", "fresh:false"]
    );
}

#[test]
fn test_cancel_propagates_out_of_nested_parses() {
    let manager = manager_with(
        TreeDecoder::new()
            .with_doc("outer", "o1 @inner o2")
            .with_doc("inner", "i1 stop i2"),
    );
    let log: Log = Rc::default();
    let mut parser = manager.get_parser_by_extension("doc.tree").unwrap();
    parser.add_callback_on_new_node(recorder(&log, "a"));
    parser.add_callback_on_new_node(|event: &mut NodeEvent| {
        if event.text() == "stop" {
            event.set_cancel();
        }
    });
    parser.add_callback_on_new_node(recorder(&log, "b"));
    let summary = parser.parse(b"start box { @outer after } tail").unwrap();

    assert_eq!(summary.outcome, Outcome::Cancelled);
    assert!(summary.is_cancelled());
    let log = log.borrow();
    // the cancelling event reaches observers before the canceller only
    assert_eq!(log.last().map(String::as_str), Some("a:stop"));
    assert!(!log.iter().any(|e| e.contains("i2") || e.contains("after") || e.contains("tail")));
    assert_eq!(summary.events, 6);
}

#[test]
fn test_cancel_on_root_stops_everything() {
    let manager = manager_with(TreeDecoder::new());
    let mut parser = manager.get_parser_by_extension("doc.tree").unwrap();
    parser.add_callback_on_new_node(|event: &mut NodeEvent| event.set_cancel());
    let summary = parser.parse(b"a b c").unwrap();
    assert_eq!(summary.events, 1);
    assert!(summary.is_cancelled());
}

#[test]
fn test_nested_failure_is_absorbed() {
    let manager = manager_with(TreeDecoder::new().with_doc("bad", "partial ! never"));
    let found = labels(&manager, "before @bad after");
    assert_eq!(found, vec!["#doc", "before", "partial", "after"]);
}

#[test]
fn test_unknown_nested_format_is_absorbed() {
    let mut manager = ParserManager::new();
    manager.register(TreeDecoder::new().with_extensions(["root"]));
    let log: Log = Rc::default();
    let mut parser = manager.get_parser_by_extension("doc.root").unwrap();
    parser.add_callback_on_new_node(recorder(&log, "a"));
    // `@x` resolves to x.tree, which nothing handles here
    let summary = parser.parse(b"one @x two").unwrap();

    assert_eq!(summary.outcome, Outcome::Completed);
    assert_eq!(*log.borrow(), vec!["a:#doc", "a:one", "a:two"]);
}

#[test]
fn test_top_level_failure_is_decode_failure() {
    let manager = manager_with(TreeDecoder::new());
    let log: Log = Rc::default();
    let mut parser = manager.get_parser_by_extension("doc.tree").unwrap();
    parser.add_callback_on_new_node(recorder(&log, "a"));
    let err = parser.parse(b"seen ! unseen").unwrap_err();

    assert!(matches!(err, DocwalkError::DecodeFailure { ref format, .. } if format == "tree"));
    assert_eq!(*log.borrow(), vec!["a:#doc", "a:seen"]);
}

#[test]
fn test_nesting_limit() {
    let manager = manager_with(TreeDecoder::new().with_doc("loop", "x @loop"));
    let default_run = labels(&manager, "x @loop");
    assert_eq!(
        default_run.iter().filter(|l| *l == "x").count(),
        crate::config::MAX_NESTING_DEPTH + 1
    );

    let log: Log = Rc::default();
    let mut parser = manager.get_parser_by_extension("doc.tree").unwrap();
    parser.add_parameters(Parameters::new().with_uint(PARAM_MAX_DEPTH, 2));
    parser.add_callback_on_new_node(recorder(&log, "a"));
    let summary = parser.parse(b"x @loop").unwrap();

    assert_eq!(summary.outcome, Outcome::Completed);
    assert_eq!(*log.borrow(), vec!["a:#doc", "a:x", "a:x", "a:x"]);
}

/// Emits the `label` parameter and descends once into `inner.labelled`.
struct LabelDecoder;

impl Decoder for LabelDecoder {
    fn format(&self) -> &str {
        "labelled"
    }

    fn extensions(&self) -> Vec<String> {
        vec!["labelled".to_string()]
    }

    fn decode(&self, document: &[u8], ctx: &mut TraversalContext<'_, '_>) -> Result<()> {
        let label = ctx.parameters().get_str("label").unwrap_or("<none>").to_string();
        ctx.emit(NodeEvent::new(Tag::Content).with_text(label));
        if !document.is_empty() {
            ctx.parse_nested("inner.labelled", b"");
        }
        Ok(())
    }
}

#[test]
fn test_parameters_reach_nested_parses() {
    let mut manager = ParserManager::new();
    manager.register(LabelDecoder);

    let texts = RefCell::new(Vec::new());
    let mut parser = manager.get_parser_by_extension("top.labelled").unwrap();
    parser.add_parameters(Parameters::new().with_string("label", "first"));
    parser.add_parameters(Parameters::new().with_string("label", "shared"));
    parser.add_callback_on_new_node(|event: &mut NodeEvent| {
        if event.tag() == &Tag::Content {
            texts.borrow_mut().push(event.text().to_string());
        }
    });
    parser.parse(b"go").unwrap();
    assert_eq!(parser.parameters().get_str("label"), Some("shared"));
    drop(parser);

    assert_eq!(texts.into_inner(), vec!["shared", "shared"]);
}

#[test]
fn test_parser_is_reusable() {
    let manager = manager_with(TreeDecoder::new());
    let count = RefCell::new(0);
    let mut parser = manager.get_parser_by_extension("doc.tree").unwrap();
    parser.add_callback_on_new_node(|_: &mut NodeEvent| *count.borrow_mut() += 1);

    let first = parser.parse(b"a b").unwrap();
    let second = parser.parse(b"c").unwrap();
    drop(parser);

    assert_eq!(first.events, 3);
    assert_eq!(second.events, 2);
    assert_eq!(count.into_inner(), 5);
}
