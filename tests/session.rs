mod common;

use std::collections::HashMap;

use photo_report::{PhotoDraft, PhotoList, ReportContext, parse_date, photo_number};

fn list_of(names: &[&str]) -> PhotoList {
    let mut list = PhotoList::new();
    for name in names {
        assert!(list.add(name, common::png_bytes(8, 6)));
    }
    list
}

#[test]
fn duplicate_and_deleted_names_are_not_re_added() {
    let mut list = list_of(&["a.png", "b.png"]);
    assert!(!list.add("a.png", Vec::new()));

    list.remove("b.png").unwrap();
    assert!(!list.add("b.png", Vec::new()), "deleted photos wait for undo");
    assert_eq!(list.names(), ["a.png"]);
}

#[test]
fn undo_restores_original_position() {
    let mut list = list_of(&["a.png", "b.png", "c.png"]);
    let token = list.remove("b.png").unwrap();
    assert_eq!((token.name(), token.index()), ("b.png", 1));
    assert_eq!(list.last_deleted(), Some("b.png"));
    assert!(list.remove("missing.png").is_none());

    assert!(list.undo(&token));
    assert_eq!(list.names(), ["a.png", "b.png", "c.png"]);
    assert!(!list.undo(&token), "a token restores once");
    assert_eq!(list.last_deleted(), None);
}

#[test]
fn undo_after_shrinking_appends() {
    let mut list = list_of(&["a.png", "b.png", "c.png"]);
    let c = list.remove("c.png").unwrap();
    list.remove("a.png").unwrap();
    assert!(list.undo(&c));
    assert_eq!(list.names(), ["b.png", "c.png"]);

    assert_eq!(list.undo_last().as_deref(), Some("a.png"));
    assert_eq!(list.names(), ["a.png", "b.png", "c.png"]);
    assert_eq!(list.undo_last(), None);
}

#[test]
fn reorder_skips_unknown_and_keeps_the_rest() {
    let mut list = list_of(&["a.png", "b.png", "c.png", "d.png"]);
    list.reorder(&["c.png", "zzz.png", "a.png", "c.png"]);
    assert_eq!(list.names(), ["c.png", "a.png", "b.png", "d.png"]);

    list.retain_uploaded(&["a.png", "d.png"]);
    assert_eq!(list.names(), ["a.png", "d.png"]);
    assert_eq!(list.len(), 2);
}

#[test]
fn records_are_numbered_in_list_order() {
    let _ = env_logger::try_init();
    let mut list = list_of(&["a.png", "b.png", "c.png"]);
    list.reorder(&["c.png", "a.png", "b.png"]);

    let records = list
        .build_records(&common::context(), &HashMap::new())
        .unwrap();
    let numbered: Vec<(&str, &str)> = records
        .iter()
        .map(|r| (r.number.as_str(), r.filename.as_str()))
        .collect();
    assert_eq!(numbered, [("01", "c.png"), ("02", "a.png"), ("03", "b.png")]);
    assert_eq!((records[0].image.width(), records[0].image.height()), (8, 6));
    assert_eq!(photo_number(9), "10");
}

#[test]
fn blank_fields_fall_back_to_report_values() {
    let _ = env_logger::try_init();
    let context = ReportContext {
        location: "分局".into(),
        date: "2024-03-04".into(),
        description: "  現場狀況  ".into(),
        ..common::context()
    };
    let list = list_of(&["a.png", "b.png"]);
    let mut drafts = HashMap::new();
    drafts.insert(
        "b.png".to_string(),
        PhotoDraft {
            date: parse_date("2023-12-31"),
            time: Some("08:15".into()),
            location: "路口".into(),
            description: " 車牌 ".into(),
        },
    );

    let records = list.build_records(&context, &drafts).unwrap();
    let a = &records[0];
    assert_eq!(a.date, "2024-03-04");
    assert_eq!(a.location, "分局");
    assert_eq!(a.description, "現場狀況");
    assert_eq!(a.time.len(), 5, "HH:MM default: {}", a.time);
    assert_eq!(a.time.as_bytes()[2], b':');

    let b = &records[1];
    assert_eq!(b.date, "2023-12-31");
    assert_eq!(b.time, "08:15");
    assert_eq!(b.location, "路口");
    assert_eq!(b.description, "車牌");
}

#[test]
fn dates_parse_from_form_input() {
    assert!(parse_date(" 2024-01-01 ").is_some());
    assert!(parse_date("2024/01/01").is_none());
    assert!(parse_date("").is_none());
}
