#![forbid(unsafe_code)]

//! The `quill` command line end to end, against a temporary storage file.
//!
//! Run:
//!   cargo test -p quill --test cli_flows

use std::fs;
use std::path::Path;

use clap::Parser;
use proptest::prelude::*;
use tempfile::tempdir;

use quill::cli::{Cli, run_with_io};
use quill::edit::Directive;

fn quill(storage: &Path, args: &[&str], input: &str) -> String {
    let mut argv = vec!["quill", "--storage", storage.to_str().unwrap()];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();
    let mut out = Vec::new();
    run_with_io(cli, input.as_bytes(), &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn edit_then_recover_print_and_clear() {
    let dir = tempdir().unwrap();
    let storage = dir.path().join("quill-storage.json");

    let out = quill(&storage, &["edit"], "type Hello\nquit\n");
    assert!(out.contains("1 autosaves"), "{out}");

    let recovered = quill(&storage, &["recover"], "");
    assert_eq!(
        recovered.trim_end(),
        "<p>Start typing your document here...Hello</p>"
    );

    let printed = dir.path().join("print.html");
    quill(&storage, &["print", printed.to_str().unwrap()], "");
    let html = fs::read_to_string(&printed).unwrap();
    assert!(html.contains("<title>Print Document</title>"), "{html}");
    assert!(html.contains("document here...Hello"), "{html}");

    let cleared = quill(&storage, &["clear"], "");
    assert_eq!(cleared.trim_end(), "cleared autosavedContent");
    let recovered = quill(&storage, &["recover"], "");
    assert_eq!(
        recovered.trim_end(),
        "<p>Start typing your document here...</p>"
    );
}

#[test]
fn second_session_resumes_the_autosave() {
    let dir = tempdir().unwrap();
    let storage = dir.path().join("quill-storage.json");
    quill(&storage, &["edit"], "new\ntype first\n");
    let out = quill(&storage, &["edit"], "type  second\nshow\n");
    assert!(
        out.lines()
            .any(|l| l == "<p>Start typing your document here...first second</p>"),
        "{out}"
    );
}

#[test]
fn config_file_changes_the_autosave_key() {
    let dir = tempdir().unwrap();
    let storage = dir.path().join("quill-storage.json");
    let config = dir.path().join("quill.json");
    fs::write(&config, r#"{ "autosave_key": "draft", "placeholder": "<p></p>" }"#).unwrap();
    let config = config.to_str().unwrap();

    quill(&storage, &["--config", config, "edit"], "type x\n");
    assert_eq!(quill(&storage, &["--config", config, "recover"], "").trim_end(), "<p>x</p>");
    // The default key is untouched.
    assert_eq!(
        quill(&storage, &["recover"], "").trim_end(),
        "<p>Start typing your document here...</p>"
    );
}

#[test]
fn formatting_and_history_through_directives() {
    let dir = tempdir().unwrap();
    let storage = dir.path().join("quill-storage.json");
    let script = "\
new
select typing
format bold
key ctrl+i
show
undo
undo
show
redo
show
stats
";
    let out = quill(&storage, &["edit"], script);
    let shown: Vec<&str> = out.lines().filter(|l| l.starts_with("<p>")).collect();
    assert_eq!(
        shown,
        vec![
            "<p>Start <i><b>typing</b></i> your document here...</p>",
            "<p>Start typing your document here...</p>",
            "<p>Start <b>typing</b> your document here...</p>",
        ],
        "{out}"
    );
    assert!(out.contains("[success] New document created"), "{out}");
    assert!(out.contains("Words: 5 | Characters: "), "{out}");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn directive_parsing_never_panics(line in "\\PC{0,40}") {
        let _ = line.parse::<Directive>();
    }

    #[test]
    fn typed_text_is_kept_verbatim(text in "[a-zA-Z0-9 ]{1,30}") {
        prop_assume!(!text.trim().is_empty());
        let parsed = format!("type {text}").parse::<Directive>();
        prop_assert_eq!(parsed, Ok(Directive::Type(text)));
    }
}
