//! End-to-end tests for docwalk pipelines.
//!
//! Runs the built-in decoders, chains and writers over the fixtures in
//! `tests/fixtures` and over archives assembled at test time.

use std::cell::{Cell, RefCell};
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use docwalk::config::{parse_date_bound, PARAM_DATE_FROM, PARAM_DATE_TO};
use docwalk::{
    ChainState, DocwalkError, Exporter, Fragment, HtmlWriter, Importer, Input, NodeEvent,
    Parameters, ParserManager, SimpleExtractor, Tag, TextWriter, Transformer,
};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_fixture(name: &str) -> Vec<u8> {
    let path = fixture(name);
    fs::read(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

fn skip_subject(subject: &'static str) -> Transformer {
    Transformer::filter(move |event: &NodeEvent| {
        event.tag() == &Tag::MailHeader && event.string_attribute("subject") == subject
    })
}

fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

const FULL_INBOX_TEXT: &str = "Hello A\n\
Quarterly figures attached.\n\
region,total\n\
north,42\n\
Hello B\n";

#[test]
fn test_mailbox_filter_end_to_end() {
    let (exporter, buffer) = Exporter::to_buffer(TextWriter::new());
    let chain = Fragment::new(Importer::with_builtin())
        .with_input(Input::from_file(fixture("inbox.mbox")).unwrap())
        .then(skip_subject("Report"))
        .connect(exporter)
        .unwrap();

    assert_eq!(buffer.to_string_lossy(), "Hello A\nHello B\n");
    assert!(matches!(chain.state(), ChainState::Completed(s) if !s.is_cancelled()));
}

#[test]
fn test_mailbox_without_filter_includes_attachment() {
    let text = SimpleExtractor::new(fixture("inbox.mbox")).extract().unwrap();
    assert_eq!(text, FULL_INBOX_TEXT);
}

#[test]
fn test_date_window_applies_inside_mailbox() {
    let parameters = Parameters::new()
        .with_uint(PARAM_DATE_FROM, parse_date_bound("2024-01-10", false).unwrap())
        .with_uint(PARAM_DATE_TO, parse_date_bound("2024-01-31", true).unwrap());

    let text = SimpleExtractor::new(fixture("inbox.mbox"))
        .with_parameters(parameters)
        .extract()
        .unwrap();
    assert_eq!(text, "Quarterly figures attached.\nregion,total\nnorth,42\n");
}

#[test]
fn test_attachment_structure() {
    let manager = ParserManager::with_builtin();
    let events = RefCell::new(Vec::new());
    let mut parser = manager.get_parser_by_extension("inbox.mbox").unwrap();
    parser.add_callback_on_new_node(|event: &mut NodeEvent| {
        events.borrow_mut().push(event.clone());
    });
    let summary = parser.parse(&load_fixture("inbox.mbox")).unwrap();
    drop(parser);

    let events = events.into_inner();
    assert_eq!(summary.events, events.len());

    let attachment = events
        .iter()
        .find(|e| e.tag() == &Tag::Attachment)
        .expect("attachment node");
    assert_eq!(attachment.string_attribute("name"), "figures.csv");
    assert_eq!(attachment.string_attribute("content_type"), "text/csv");
    assert_eq!(attachment.uint_attribute("size"), 21);
    assert_eq!(attachment.depth(), 2);

    let dates: Vec<u64> = events
        .iter()
        .filter(|e| e.tag() == &Tag::MailHeader)
        .map(|e| e.uint_attribute("date"))
        .collect();
    assert_eq!(dates, vec![1_704_099_600, 1_705_320_000, 1_706_776_200]);

    // sequence numbers are dense and in emission order
    for (index, event) in events.iter().enumerate() {
        assert_eq!(event.sequence(), index);
    }
}

#[test]
fn test_archive_with_mailbox_inside() {
    let archive = build_zip(&[
        ("mail/inbox.mbox", load_fixture("inbox.mbox").as_slice()),
        ("notes.txt", load_fixture("notes.txt").as_slice()),
    ]);

    let (exporter, buffer) = Exporter::to_buffer(TextWriter::new());
    Fragment::new(Importer::with_builtin())
        .with_input(Input::from_bytes("bundle.zip", archive))
        .then(skip_subject("Report"))
        .connect(exporter)
        .unwrap();

    assert_eq!(
        buffer.to_string_lossy(),
        "Hello A\nHello B\nMeeting notes\nBudget approved.\n"
    );
}

#[test]
fn test_cancel_inside_archive_stops_everything() {
    let archive = build_zip(&[
        ("mail/inbox.mbox", load_fixture("inbox.mbox").as_slice()),
        ("notes.txt", load_fixture("notes.txt").as_slice()),
    ]);

    let stop = Transformer::new(|event: &mut NodeEvent| {
        if event.string_attribute("subject") == "Report" {
            event.set_cancel();
        }
    });
    let (exporter, buffer) = Exporter::to_buffer(TextWriter::new());
    let chain = Fragment::new(Importer::with_builtin())
        .with_input(Input::from_bytes("bundle.zip", archive))
        .then(stop)
        .connect(exporter)
        .unwrap();

    assert_eq!(buffer.to_string_lossy(), "Hello A\n");
    assert!(matches!(chain.state(), ChainState::Completed(s) if s.is_cancelled()));
}

#[test]
fn test_fan_out_text_and_html() {
    let fragment = Fragment::new(Importer::with_builtin())
        .with_input(Input::from_file(fixture("inbox.mbox")).unwrap())
        .then(skip_subject("Report"));

    let (text, text_buffer) = Exporter::to_buffer(TextWriter::new());
    let (html, html_buffer) = Exporter::to_buffer(HtmlWriter::new().with_title("Inbox"));
    fragment.clone().connect(text).unwrap();
    fragment.connect(html).unwrap();

    assert_eq!(text_buffer.to_string_lossy(), "Hello A\nHello B\n");

    let html = html_buffer.to_string_lossy();
    let mut options = roxmltree::ParsingOptions::default();
    options.allow_dtd = true;
    let doc = roxmltree::Document::parse_with_options(&html, options).unwrap();
    let headings: Vec<&str> = doc
        .descendants()
        .filter(|n| n.has_tag_name("h2"))
        .filter_map(|n| n.text())
        .collect();
    assert_eq!(headings, vec!["Hello A", "Hello B"]);
}

#[test]
fn test_fan_in_reuses_filter_state() {
    let seen_subjects = Rc::new(RefCell::new(Vec::new()));
    let dedupe = {
        let seen = Rc::clone(&seen_subjects);
        Transformer::new(move |event: &mut NodeEvent| {
            if event.tag() == &Tag::MailHeader {
                let subject = event.string_attribute("subject").to_string();
                if seen.borrow().contains(&subject) {
                    event.set_skip();
                } else {
                    seen.borrow_mut().push(subject);
                }
            }
        })
    };

    let (exporter, buffer) = Exporter::to_buffer(TextWriter::new());
    let mut chain = Fragment::new(Importer::with_builtin())
        .then(dedupe)
        .build([exporter])
        .unwrap();

    chain.set_input(Input::from_file(fixture("inbox.mbox")).unwrap()).unwrap();
    let first_run = buffer.to_string_lossy();
    chain.set_input(Input::from_file(fixture("inbox.mbox")).unwrap()).unwrap();
    chain.set_input(Input::from_file(fixture("notes.txt")).unwrap()).unwrap();

    assert_eq!(chain.runs(), 3);
    assert_eq!(first_run, FULL_INBOX_TEXT);
    // the second mailbox run repeats nothing
    assert_eq!(
        buffer.to_string_lossy(),
        format!("{FULL_INBOX_TEXT}Meeting notes\nBudget approved.\n")
    );
    assert_eq!(seen_subjects.borrow().len(), 3);
}

#[test]
fn test_xml_fixture() {
    let text = SimpleExtractor::new(fixture("catalog.xml")).extract().unwrap();
    assert_eq!(text, "Rust in Practice\nParsing & Traversal\n");

    let books = Rc::new(Cell::new(0));
    let counter = {
        let books = Rc::clone(&books);
        move |event: &NodeEvent| {
            if event.string_attribute("element") == "book" {
                books.set(books.get() + 1);
            }
            false
        }
    };
    SimpleExtractor::new(fixture("catalog.xml"))
        .with_filter(counter)
        .extract()
        .unwrap();
    assert_eq!(books.get(), 2);
}

#[test]
fn test_shared_manager_across_threads() {
    let manager = Arc::new(ParserManager::with_builtin());
    let inbox = load_fixture("inbox.mbox");

    let counts: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let manager = Arc::clone(&manager);
                let inbox = &inbox;
                scope.spawn(move || {
                    let mut parser = manager.get_parser_by_extension("inbox.mbox").unwrap();
                    parser.parse(inbox).unwrap().events
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(counts.windows(2).all(|w| w[0] == w[1]));
    assert!(counts[0] > 0);
}

#[test]
fn test_unsupported_format_error_lists_formats() {
    let err = SimpleExtractor::from_bytes("slides.pptx", vec![0_u8; 4])
        .extract()
        .unwrap_err();
    assert!(matches!(err, DocwalkError::FormatNotSupported { .. }));
    assert_eq!(
        err.to_string(),
        "Format not supported: 'slides.pptx'. Available formats: text, xml, mail, mbox, zip"
    );
}

#[cfg(unix)]
#[test]
fn test_plugin_manifest_extends_registry() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("upper.yaml"),
        "name: upper\nextensions: [up]\ncommand: [tr, a-z, A-Z]\n",
    )
    .unwrap();

    let manager = Arc::new(ParserManager::with_plugin_dir(dir.path()).unwrap());
    assert!(manager.available_formats().contains(&"upper".to_string()));

    let text = SimpleExtractor::from_bytes("note.up", "hello\n")
        .with_manager(manager)
        .extract()
        .unwrap();
    assert_eq!(text, "HELLO\n");
}
