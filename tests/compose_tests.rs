use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use gistify::compose::{output_path, slugify, to_markdown, write_markdown};
use spectral::assert_that;

macro_rules! assert_slugs {
    (
        $(
            $test_name:ident : title => $title:expr, slug => $slug:expr
        ),+ $(,)?
    ) => {
        $(
            #[test]
            fn $test_name() {
                assert_that(&slugify($title)).is_equal_to($slug.to_owned());
            }
        )+
    }
}

assert_slugs![
    words_are_dashed:
        title => "Attention Is All You Need",
        slug => "attention-is-all-you-need",
    punctuation_runs_collapse:
        title => "Rust 2024: what's new?!",
        slug => "rust-2024-what-s-new",
    edges_are_trimmed:
        title => "  --Hello--  ",
        slug => "hello",
    empty_title_falls_back:
        title => "!!!",
        slug => "summary",
    non_ascii_is_dropped:
        title => "Über café",
        slug => "ber-caf",
];

#[test]
fn long_titles_are_capped() {
    assert_that(&slugify(&"a".repeat(200)).len()).is_equal_to(80);
}

#[test]
fn markdown_document_layout() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 9).expect("Expected a valid date.");

    let markdown = to_markdown(
        "  The gist.\n",
        "https://example.com/article",
        Some("An Article"),
        date,
    );

    assert_that(&markdown).is_equal_to(
        "# An Article\n\n**Source:** https://example.com/article\n\n---\n\n## Summary\n\n\
         The gist.\n\n---\n*Generated by Gistify on 2024-03-09*"
            .to_owned(),
    );
}

#[test]
fn untitled_document_gets_placeholder_heading() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 9).expect("Expected a valid date.");

    let markdown = to_markdown("Gist", "file:///tmp/paper.pdf", None, date);

    assert!(markdown.starts_with("# Untitled Article\n"));
}

#[test]
fn explicit_output_path_wins() {
    let explicit = PathBuf::from("notes/out.md");

    assert_that(&output_path(Some(&explicit), Path::new("output"), Some("Title")))
        .is_equal_to(explicit);
}

#[test]
fn default_output_path_uses_title_slug() {
    assert_that(&output_path(None, Path::new("output"), Some("My Title")))
        .is_equal_to(PathBuf::from("output/my-title.md"));
    assert_that(&output_path(None, Path::new("output"), None))
        .is_equal_to(PathBuf::from("output/summary.md"));
}

#[test]
fn write_markdown_creates_directories() {
    let dir = tempfile::tempdir().expect("Expected a temp dir.");
    let path = dir.path().join("nested").join("gist.md");

    write_markdown(&path, "# Gist").expect("Expected the document to be written.");

    assert_that(&std::fs::read_to_string(&path).expect("Expected the document to exist."))
        .is_equal_to("# Gist".to_owned());
}
