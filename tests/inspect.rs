mod common;

use std::path::Path;

use photo_report::{analyze_structure, describe_structure};

#[test]
fn lists_tables_and_non_empty_cells() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_file(dir.path(), "A4_Vertical.docx", &common::vertical_template());

    let report = analyze_structure(&path).unwrap();
    println!("{report}");
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(
        lines,
        [
            "File: A4_Vertical.docx",
            "Tables: 1",
            "",
            "[Table 0] 4 rows x 2 cols",
            "(0,0)案由：[案由] | (0,1)製作人：[製作人]",
            "(1,0)[日期] [時間] | (1,1)[地點]",
            "(2,0)編號 [編號] | (2,1)[說明]",
            "(3,0)[圖片]",
        ]
    );
}

#[test]
fn merged_cells_report_grid_columns() {
    let _ = env_logger::try_init();
    let merged = r#"<w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p><w:r><w:t>[圖片 1]</w:t></w:r></w:p></w:tc>"#;
    let multi_line = r#"<w:tc><w:p><w:r><w:t>[日期 2]</w:t></w:r></w:p><w:p><w:r><w:t>[時間 2]</w:t></w:r></w:p></w:tc>"#;
    let body = format!(
        r#"<w:tbl><w:tblGrid><w:gridCol/><w:gridCol/><w:gridCol/><w:gridCol/></w:tblGrid><w:tr>{merged}{empty}{multi_line}</w:tr></w:tbl><w:tbl><w:tr>{other}</w:tr></w:tbl>"#,
        empty = common::cell(""),
        other = common::cell("x"),
    );
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_file(dir.path(), "左右.docx", &common::docx_bytes(&body));

    let report = analyze_structure(&path).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines[1], "Tables: 2");
    assert_eq!(lines[3], "[Table 0] 1 rows x 4 cols");
    assert_eq!(lines[4], r"(0,0)[圖片 1] | (0,3)[日期 2]\n[時間 2]");
    assert_eq!(lines[6], "[Table 1] 1 rows x 0 cols");
    assert_eq!(lines[7], "(0,0)x");
}

#[test]
fn failures_become_error_lines() {
    let _ = env_logger::try_init();
    let missing = describe_structure(Path::new("no/such/template.docx"));
    assert!(missing.starts_with("Error: "), "{missing}");

    let dir = tempfile::tempdir().unwrap();
    let path = common::write_file(dir.path(), "bad.docx", b"plain text");
    let bad = describe_structure(&path);
    assert!(bad.starts_with("Error: "), "{bad}");
    assert!(analyze_structure(&path).is_err());
}
