//! End-to-end linking over on-disk vaults
//!
//! Run with: `cargo test --test vault_linking`

mod common;

use common::TestVault;
use vaultlink::linking::FailureStage;
use vaultlink::LinkerConfig;

const OOP: &str = "Object-Oriented Programming.md";
const FP: &str = "Functional Programming.md";
const OVERVIEW: &str = "Overview.md";

fn vault_with_oop() -> TestVault {
    let vault = TestVault::new();
    vault.write(OOP, "This is a file about object-oriented programming.");
    vault
}

#[tokio::test]
async fn test_simple_linking() {
    let vault = vault_with_oop();
    vault.write(OVERVIEW, "This note mentions object-oriented programming.");

    let report = vault.link().await;

    assert_eq!(
        vault.read(OVERVIEW),
        "This note mentions [[object-oriented programming]]."
    );
    assert!(report.edited.contains(&vault.id(OVERVIEW)));
    assert_eq!(report.found, 2);
}

#[tokio::test]
async fn test_case_insensitive_linking_keeps_source_casing() {
    let vault = vault_with_oop();
    vault.write(OVERVIEW, "This note mentions Object-Oriented Programming.");

    let report = vault.link().await;

    assert_eq!(
        vault.read(OVERVIEW),
        "This note mentions [[Object-Oriented Programming]]."
    );
    assert!(report.edited.contains(&vault.id(OVERVIEW)));
}

#[tokio::test]
async fn test_no_mentions_leaves_note_alone() {
    let vault = vault_with_oop();
    let body = "This note does not mention any programming languages.";
    vault.write(OVERVIEW, body);

    let report = vault.link().await;

    assert_eq!(vault.read(OVERVIEW), body);
    assert!(!report.edited.contains(&vault.id(OVERVIEW)));
}

#[tokio::test]
async fn test_only_exact_spelling_is_linked() {
    let vault = vault_with_oop();
    vault.write(
        OVERVIEW,
        "This note mentions object-oriented programming, but not object oriented programming.",
    );

    vault.link().await;

    assert_eq!(
        vault.read(OVERVIEW),
        "This note mentions [[object-oriented programming]], but not object oriented programming."
    );
}

#[tokio::test]
async fn test_several_titles_in_one_note() {
    let vault = vault_with_oop();
    vault.write(FP, "This is a file about functional programming.");
    vault.write(
        OVERVIEW,
        "This note mentions object-oriented programming and functional programming.",
    );

    let report = vault.link().await;

    assert_eq!(
        vault.read(OVERVIEW),
        "This note mentions [[object-oriented programming]] and [[functional programming]]."
    );
    assert!(report.edited.contains(&vault.id(OVERVIEW)));
}

#[tokio::test]
async fn test_many_similar_titles() {
    let vault = TestVault::new();
    let titles: Vec<String> = (1..=10).map(|n| format!("Link{}", n)).collect();
    for title in &titles {
        vault.write(
            &format!("{}.md", title),
            &format!("This is a file about {}.", title.to_lowercase()),
        );
    }
    vault.write(OVERVIEW, &format!("This file mentions {}.", titles.join(", ")));

    vault.link().await;

    let linked: Vec<String> = titles.iter().map(|t| format!("[[{}]]", t)).collect();
    assert_eq!(
        vault.read(OVERVIEW),
        format!("This file mentions {}.", linked.join(", "))
    );
}

#[tokio::test]
async fn test_longer_title_wins_over_prefix() {
    let vault = vault_with_oop();
    vault.write("Object.md", "This is a file about objects.");
    vault.write(
        OVERVIEW,
        "This note mentions object-oriented programming and objects.",
    );

    let report = vault.link().await;

    assert_eq!(
        vault.read(OVERVIEW),
        "This note mentions [[object-oriented programming]] and objects."
    );
    assert_eq!(vault.read("Object.md"), "This is a file about objects.");
    assert!(!report.edited.contains(&vault.id("Object.md")));
}

#[tokio::test]
async fn test_existing_links_untouched() {
    let vault = vault_with_oop();
    let body = "This note mentions [[Object-Oriented Programming]] and ![[Object-Oriented Programming]].";
    vault.write(OVERVIEW, body);

    let report = vault.link().await;

    assert_eq!(vault.read(OVERVIEW), body);
    assert!(!report.edited.contains(&vault.id(OVERVIEW)));
}

#[tokio::test]
async fn test_no_links_in_code() {
    let vault = vault_with_oop();
    vault.write(
        OVERVIEW,
        "This note mentions object-oriented programming.\n\
         \n\
         ```\n\
         This is a code block mentioning object-oriented programming.\n\
         ```\n\
         Inline `object-oriented programming` stays too.\n\
         And here is another mention of object-oriented programming outside the code block.\n",
    );

    vault.link().await;

    assert_eq!(
        vault.read(OVERVIEW),
        "This note mentions [[object-oriented programming]].\n\
         \n\
         ```\n\
         This is a code block mentioning object-oriented programming.\n\
         ```\n\
         Inline `object-oriented programming` stays too.\n\
         And here is another mention of [[object-oriented programming]] outside the code block.\n"
    );
}

#[tokio::test]
async fn test_no_links_in_frontmatter() {
    let vault = vault_with_oop();
    vault.write(
        OVERVIEW,
        "---\ntitle: Object-Oriented Programming\n---\nThis note mentions object-oriented programming.",
    );

    vault.link().await;

    assert_eq!(
        vault.read(OVERVIEW),
        "---\ntitle: Object-Oriented Programming\n---\nThis note mentions [[object-oriented programming]]."
    );
}

#[tokio::test]
async fn test_indented_frontmatter_delimiter() {
    let vault = vault_with_oop();
    vault.write(
        OVERVIEW,
        "---\n        title: Object-Oriented Programming\n        ---\n        This note mentions object-oriented programming.",
    );

    vault.link().await;

    assert_eq!(
        vault.read(OVERVIEW),
        "---\n        title: Object-Oriented Programming\n        ---\n        This note mentions [[object-oriented programming]]."
    );
}

#[tokio::test]
async fn test_reference_links_untouched() {
    let vault = vault_with_oop();
    let body = "Read [Object-Oriented Programming][oop].\n\n[oop]: https://example.com/oop\n";
    vault.write(OVERVIEW, body);

    let report = vault.link().await;

    assert_eq!(vault.read(OVERVIEW), body);
    assert!(!report.edited.contains(&vault.id(OVERVIEW)));
}

#[tokio::test]
async fn test_urls_and_markdown_links_untouched() {
    let vault = TestVault::new();
    vault.write("Rust.md", "");
    let body = "See [the Rust book](https://doc.rust-lang.org/book/) or https://rust-lang.org/Rust today.";
    vault.write(OVERVIEW, body);

    let report = vault.link().await;

    assert_eq!(vault.read(OVERVIEW), body);
    assert_eq!(report.edited_count(), 0);
}

#[tokio::test]
async fn test_second_run_changes_nothing() {
    let vault = vault_with_oop();
    vault.write(FP, "Functional programming, unlike object-oriented programming...");
    vault.write(
        OVERVIEW,
        "Object-oriented programming and functional programming, twice: object-oriented programming.",
    );

    let first = vault.link().await;
    let after_first = (vault.read(OOP), vault.read(FP), vault.read(OVERVIEW));
    assert_eq!(first.edited_count(), 3);

    let second = vault.link().await;
    let after_second = (vault.read(OOP), vault.read(FP), vault.read(OVERVIEW));

    assert_eq!(second.edited_count(), 0);
    assert_eq!(second.links_inserted, 0);
    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn test_undecodable_note_is_isolated() {
    let vault = vault_with_oop();
    vault.write(OVERVIEW, "This note mentions object-oriented programming.");
    vault.write_bytes("Broken.md", b"object-oriented programming \xff\xfe");

    let report = vault.link().await;

    assert_eq!(report.found, 3);
    assert_eq!(report.scanned, 2);
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.id, vault.id("Broken.md"));
    assert_eq!(failure.stage, FailureStage::Read);
    assert_eq!(failure.kind, "decode");

    assert_eq!(
        vault.read(OVERVIEW),
        "This note mentions [[object-oriented programming]]."
    );
    assert_eq!(
        std::fs::read(vault.path("Broken.md")).unwrap(),
        b"object-oriented programming \xff\xfe"
    );
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let vault = vault_with_oop();
    let body = "This note mentions object-oriented programming.";
    vault.write(OVERVIEW, body);

    let report = vault
        .link_with(LinkerConfig::new().with_concurrency(2).with_dry_run(true))
        .await;

    assert!(report.dry_run);
    assert!(report.edited.contains(&vault.id(OVERVIEW)));
    assert_eq!(vault.read(OVERVIEW), body);
}

#[tokio::test]
async fn test_nested_notes_link_and_hidden_dirs_skipped() {
    let vault = TestVault::new();
    vault.write("projects/deep/Graph Theory.md", "");
    vault.write(".obsidian/Secret.md", "");
    vault.write(OVERVIEW, "Notes on graph theory, kept secret.");

    let report = vault.link().await;

    assert_eq!(report.found, 2);
    assert_eq!(
        vault.read(OVERVIEW),
        "Notes on [[graph theory]], kept secret."
    );
}

#[tokio::test]
async fn test_skip_self_links() {
    let vault = vault_with_oop();
    vault.write(OVERVIEW, "This note mentions object-oriented programming.");

    let report = vault
        .link_with(LinkerConfig::new().with_skip_self_links(true))
        .await;

    assert_eq!(
        vault.read(OOP),
        "This is a file about object-oriented programming."
    );
    assert_eq!(report.edited, vec![vault.id(OVERVIEW)]);
}

#[tokio::test]
async fn test_report_serializes_to_json() {
    let vault = vault_with_oop();
    vault.write(OVERVIEW, "object-oriented programming");
    vault.write_bytes("Broken.md", b"\xff");

    let report = vault.link().await;
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["found"], 3);
    assert_eq!(json["links_inserted"], 2);
    assert_eq!(json["edited"].as_array().unwrap().len(), 2);
    assert_eq!(json["failures"][0]["stage"], "read");
    assert_eq!(json["failures"][0]["kind"], "decode");
    assert_eq!(json["dry_run"], false);
}
