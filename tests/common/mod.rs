#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use image::{DynamicImage, Rgb, RgbImage};
use photo_report::{PhotoRecord, ReportContext};
use zip::write::SimpleFileOptions;

pub const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"/>"#;

/// A minimal DOCX whose body is `body_xml`.
pub fn docx_bytes(body_xml: &str) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{WML_NS}"><w:body>{body_xml}</w:body></w:document>"#
    );
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, data) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", PACKAGE_RELS),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS),
        ("word/styles.xml", STYLES),
        ("word/document.xml", document.as_str()),
    ] {
        zip.start_file(name, options).unwrap();
        zip.write_all(data.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// `docx` with part `name` replaced by `data`, or dropped when `data` is `None`.
pub fn replace_part(docx: &[u8], name: &str, data: Option<&[u8]>) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(Cursor::new(docx)).unwrap();
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let entry_name = entry.name().to_string();
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).unwrap();
        if entry_name == name {
            match data {
                Some(d) => bytes = d.to_vec(),
                None => continue,
            }
        }
        zip.start_file(entry_name, SimpleFileOptions::default()).unwrap();
        zip.write_all(&bytes).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

pub fn cell(text: &str) -> String {
    format!(r#"<w:tc><w:tcPr><w:tcW w:w="4000" w:type="dxa"/></w:tcPr><w:p><w:r><w:t>{text}</w:t></w:r></w:p></w:tc>"#)
}

pub fn row(cells: &[&str]) -> String {
    let cells: String = cells.iter().map(|c| cell(c)).collect();
    format!("<w:tr>{cells}</w:tr>")
}

pub fn table(rows: &[&[&str]]) -> String {
    let cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let grid: String = (0..cols).map(|_| r#"<w:gridCol w:w="4000"/>"#).collect();
    let rows: String = rows.iter().map(|r| row(r)).collect();
    format!("<w:tbl><w:tblPr/><w:tblGrid>{grid}</w:tblGrid>{rows}</w:tbl>")
}

const SECTION: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1800" w:bottom="1440" w:left="1800" w:header="851" w:footer="992" w:gutter="0"/></w:sectPr>"#;

/// One photo per table, unsuffixed keys.
pub fn vertical_body() -> String {
    let tbl = table(&[
        &["案由：[案由]", "製作人：[製作人]"],
        &["[日期] [時間]", "[地點]"],
        &["編號 [編號]", "[說明]"],
        &["[圖片]"],
    ]);
    format!("<w:p><w:r><w:t>照片黏貼表</w:t></w:r></w:p>{tbl}<w:p><w:r><w:t>trailing</w:t></w:r></w:p>{SECTION}")
}

/// Two photos per table with positional suffixes and a shared `[日期]`.
pub fn side_by_side_body() -> String {
    let tbl = table(&[
        &["[案由] [日期]", "[製作人]"],
        &["[圖片 1]", "[圖片 2]"],
        &["[日期 1] [時間 1]", "[日期 2] [時間 2]"],
        &["[地點 1]", "[地點 2]"],
        &["[編號 1] [說明 1]", "[編號 2] [說明 2]"],
    ]);
    format!("{tbl}{SECTION}")
}

pub fn vertical_template() -> Vec<u8> {
    docx_bytes(&vertical_body())
}

pub fn side_by_side_template() -> Vec<u8> {
    docx_bytes(&side_by_side_body())
}

pub fn write_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

pub fn solid_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([40, 120, 200])))
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    solid_image(width, height)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

pub fn context() -> ReportContext {
    ReportContext {
        header_text: "蒐證照片".into(),
        subject: "測試案".into(),
        location: "臺南".into(),
        maker: "王小明".into(),
        date: "2024-01-01".into(),
        description: "現場".into(),
    }
}

pub fn record(idx: usize, width: u32, height: u32) -> PhotoRecord {
    PhotoRecord {
        number: format!("{:02}", idx + 1),
        date: "2024-01-01".into(),
        time: format!("10:{:02}", idx),
        location: format!("地點{}", idx + 1),
        description: format!("說明{}", idx + 1),
        image: solid_image(width, height),
        filename: format!("photo{}.png", idx + 1),
    }
}

pub fn records(count: usize) -> Vec<PhotoRecord> {
    (0..count).map(|i| record(i, 400, 300)).collect()
}

/// A generated DOCX opened for inspection.
pub struct Output {
    entries: Vec<(String, Vec<u8>)>,
}

impl Output {
    pub fn new(bytes: &[u8]) -> Self {
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut entries = Vec::new();
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i).unwrap();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            entries.push((entry.name().to_string(), data));
        }
        Self { entries }
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn part(&self, name: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| String::from_utf8(d.clone()).unwrap())
    }

    pub fn document(&self) -> String {
        self.part("word/document.xml").expect("document part")
    }

    pub fn media_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(n, _)| n.starts_with("word/media/"))
            .count()
    }
}

fn is_w(node: &roxmltree::Node, local: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local
        && node.tag_name().namespace() == Some(WML_NS)
}

/// Local names of the direct children of `w:body`.
pub fn body_children(document_xml: &str) -> Vec<String> {
    let doc = roxmltree::Document::parse(document_xml).unwrap();
    let body = doc
        .descendants()
        .find(|n| is_w(n, "body"))
        .expect("w:body");
    body.children()
        .filter(|n| n.is_element())
        .map(|n| n.tag_name().name().to_string())
        .collect()
}

/// Concatenated `w:t` text of every table in the body, one string per table.
pub fn table_texts(document_xml: &str) -> Vec<String> {
    let doc = roxmltree::Document::parse(document_xml).unwrap();
    doc.descendants()
        .filter(|n| is_w(n, "tbl"))
        .map(|tbl| {
            tbl.descendants()
                .filter(|n| is_w(n, "t"))
                .filter_map(|n| n.text())
                .collect::<Vec<_>>()
                .join("")
        })
        .collect()
}

/// Attribute `w:{attr}` of the first `w:{local}` element in `xml`.
pub fn w_attr(xml: &str, local: &str, attr: &str) -> Option<String> {
    let doc = roxmltree::Document::parse(xml).unwrap();
    doc.descendants()
        .find(|n| is_w(n, local))
        .and_then(|n| n.attribute((WML_NS, attr)))
        .map(str::to_string)
}

pub fn count_w(xml: &str, local: &str) -> usize {
    let doc = roxmltree::Document::parse(xml).unwrap();
    doc.descendants().filter(|n| is_w(n, local)).count()
}
