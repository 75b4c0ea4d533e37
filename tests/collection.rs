//! Collection behaviour exercised through the public API only.

use pagebind::{MoveDirection, PageCollection, PagebindError};

fn sources(c: &PageCollection) -> Vec<String> {
    c.entries()
        .iter()
        .map(|e| e.source.as_str().to_string())
        .collect()
}

#[test]
fn repeated_adds_never_duplicate() {
    let mut c = PageCollection::new();
    let inputs = ["a", "b", "a", "c", "b", "", "c", "d", "a"];
    for s in inputs {
        c.add_page(s);
    }
    assert_eq!(sources(&c), vec!["a", "b", "c", "d"]);
}

#[test]
fn bulk_add_dedups_within_and_against_existing() {
    let mut c = PageCollection::new();
    assert_eq!(c.add_pages(["a", "b", "a"]).len(), 2);
    assert_eq!(sources(&c), vec!["a", "b"]);

    let v = c.version();
    assert!(c.add_pages(["b", "a", ""]).is_empty());
    assert_eq!(c.version(), v, "no-op bulk add must not bump the version");

    c.add_pages(["c", "a", "d"]);
    assert_eq!(sources(&c), vec!["a", "b", "c", "d"]);
}

#[test]
fn remove_by_id_is_exact_and_tolerates_unknown_ids() {
    let mut c = PageCollection::new();
    let ids = c.add_pages(["a", "b", "c"]);
    assert!(c.remove_page(ids[1]));
    assert!(!c.remove_page(ids[1]));
    assert_eq!(sources(&c), vec!["a", "c"]);

    // a re-added source gets a fresh id
    let again = c.add_page("b").unwrap();
    assert_ne!(again, ids[1]);
}

#[test]
fn moves_swap_neighbours_and_ignore_the_ends() {
    let mut c = PageCollection::new();
    c.add_pages(["a", "b", "c"]);

    assert!(!c.move_page(0, MoveDirection::Up));
    assert!(!c.move_page(2, MoveDirection::Down));
    assert!(!c.move_page(9, MoveDirection::Up));
    assert_eq!(sources(&c), vec!["a", "b", "c"]);

    assert!(c.move_page(2, MoveDirection::Up));
    assert_eq!(sources(&c), vec!["a", "c", "b"]);
    assert!(c.move_page(0, MoveDirection::Down));
    assert_eq!(sources(&c), vec!["c", "a", "b"]);
}

#[test]
fn up_then_down_restores_order() {
    let mut c = PageCollection::new();
    c.add_pages(["a", "b", "c", "d"]);
    let before = sources(&c);
    for i in 1..4 {
        c.move_page(i, MoveDirection::Up);
        c.move_page(i - 1, MoveDirection::Down);
        assert_eq!(sources(&c), before);
    }
}

#[test]
fn snapshot_is_frozen() {
    let mut c = PageCollection::new();
    c.add_pages(["a", "b"]);
    let snap = c.snapshot();

    c.move_page(0, MoveDirection::Down);
    c.add_page("z");
    let first = c.entries()[0].id;
    c.remove_page(first);

    let frozen: Vec<&str> = snap.iter().map(|e| e.source.as_str()).collect();
    assert_eq!(frozen, vec!["a", "b"]);
    assert!(snap.version() < c.version());
}

#[test]
fn rejected_bulk_import_leaves_collection_untouched() {
    let mut c = PageCollection::new();
    c.add_page("https://example.com/1.png");
    let v = c.version();

    for bad in [
        "not json",
        r#"{"pages": []}"#,
        r#"["data:image/png;base64,aGk=", "https://example.com/2.png"]"#,
        r#"["data:image/png;base64,aGk=", 42]"#,
    ] {
        let err = c.import_bulk(bad).unwrap_err();
        assert!(matches!(err, PagebindError::BulkImportRejected { .. }), "{bad}");
    }
    assert_eq!(c.version(), v);
    assert_eq!(sources(&c), vec!["https://example.com/1.png"]);
}

#[test]
fn bulk_import_appends_in_order() {
    let mut c = PageCollection::new();
    let ids = c
        .import_bulk(r#"["data:image/png;base64,AAAA", "data:image/jpeg;base64,BBBB", "data:image/png;base64,AAAA"]"#)
        .unwrap();
    assert_eq!(ids.len(), 2);
    assert!(c.entries().iter().all(|e| e.source.is_inline()));
    assert_eq!(c.entries()[0].display_label(), "Captured from screen");
    assert!(c.import_bulk("   ").unwrap().is_empty());
}
