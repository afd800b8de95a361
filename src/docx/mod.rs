pub(crate) mod rels;
pub(crate) mod xml;

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;

use crate::error::Error;

use rels::Relationships;
use xml::Element;

pub(crate) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(crate) const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const WPD_NS: &str =
    "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub(crate) const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
pub(crate) const REL_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const PKG_REL_NS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";
const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

pub(crate) const REL_TYPE_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
pub(crate) const REL_TYPE_HEADER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
pub(crate) const REL_TYPE_FOOTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";

const CT_HEADER: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";
const CT_FOOTER: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";

const DOCUMENT_PART: &str = "word/document.xml";
const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const MEDIA_PREFIX: &str = "media/report_image";

/// Raw zip entries of a DOCX, in archive order.
#[derive(Clone, Default)]
pub struct Package {
    entries: Vec<(String, Vec<u8>)>,
}

impl Package {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let file = std::fs::File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Error::Io(
                std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())),
            ),
            _ => Error::Io(e),
        })?;
        Self::read(file)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        Self::read(Cursor::new(data))
    }

    fn read<R: Read + Seek>(reader: R) -> Result<Self, Error> {
        let mut zip = zip::ZipArchive::new(reader)
            .map_err(|_| Error::InvalidDocx("file is not a ZIP archive".into()))?;
        let mut entries = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            entries.push((name, data));
        }
        Ok(Self { entries })
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d.as_slice())
    }

    pub fn part_text(&self, name: &str) -> Option<String> {
        self.part(name)
            .map(|d| String::from_utf8_lossy(d).into_owned())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = data,
            None => self.entries.push((name.to_string(), data)),
        }
    }

    pub fn write(&self) -> Result<Vec<u8>, Error> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        // [Content_Types].xml goes first; some consumers sniff for it.
        let ordered = self
            .entries
            .iter()
            .filter(|(n, _)| n == CONTENT_TYPES_PART)
            .chain(self.entries.iter().filter(|(n, _)| n != CONTENT_TYPES_PART));
        for (name, data) in ordered {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }
        Ok(zip.finish()?.into_inner())
    }
}

/// Which kind of page-margin part a section references.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HeaderFooterKind {
    Header,
    Footer,
}

impl HeaderFooterKind {
    fn rel_type(self) -> &'static str {
        match self {
            HeaderFooterKind::Header => REL_TYPE_HEADER,
            HeaderFooterKind::Footer => REL_TYPE_FOOTER,
        }
    }

    fn content_type(self) -> &'static str {
        match self {
            HeaderFooterKind::Header => CT_HEADER,
            HeaderFooterKind::Footer => CT_FOOTER,
        }
    }

    fn root_name(self) -> &'static str {
        match self {
            HeaderFooterKind::Header => "hdr",
            HeaderFooterKind::Footer => "ftr",
        }
    }
}

/// A DOCX opened for editing: the main document tree plus the package
/// bookkeeping (relationships, content types, added parts) needed to add
/// images and header/footer parts.
pub struct WordDocument {
    package: Package,
    document: Element,
    rels: Relationships,
    content_types: Element,
    parts: BTreeMap<String, Element>,
    next_drawing_id: u32,
    next_media: u32,
}

impl WordDocument {
    pub fn open(path: &Path) -> Result<Self, Error> {
        Self::from_package(Package::open(path)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        Self::from_package(Package::from_bytes(data)?)
    }

    fn from_package(package: Package) -> Result<Self, Error> {
        let text = package.part_text(DOCUMENT_PART).ok_or_else(|| {
            Error::InvalidDocx("missing word/document.xml (is this a DOCX file?)".into())
        })?;
        let document = xml::parse(&text)?;
        if document.w_child("body").is_none() {
            return Err(Error::InvalidDocx("missing w:body".into()));
        }

        // A template without relationships is fine; a broken list is not.
        let rels = match package.part_text(DOCUMENT_RELS_PART) {
            Some(t) => Relationships::parse(&t)?,
            None => Relationships::default(),
        };
        let content_types = match package.part_text(CONTENT_TYPES_PART) {
            Some(t) => xml::parse(&t)?,
            None => Element::new("Types").with_attr("xmlns", CONTENT_TYPES_NS),
        };

        let mut max_drawing_id = 0;
        document.walk(&mut |e| {
            if e.name.ends_with(":docPr")
                && let Some(id) = e.attr("id").and_then(|v| v.parse::<u32>().ok())
            {
                max_drawing_id = max_drawing_id.max(id);
            }
        });
        let next_media = (1..)
            .find(|n| !package.contains(&format!("word/{MEDIA_PREFIX}{n}.jpeg")))
            .unwrap_or(1);

        Ok(Self {
            package,
            document,
            rels,
            content_types,
            parts: BTreeMap::new(),
            next_drawing_id: max_drawing_id + 1,
            next_media,
        })
    }

    pub(crate) fn body(&self) -> &Element {
        self.document
            .w_child("body")
            .expect("presence of w:body is checked on load")
    }

    pub(crate) fn body_mut(&mut self) -> &mut Element {
        self.document
            .w_child_mut("body")
            .expect("presence of w:body is checked on load")
    }

    /// Declare `xmlns:{prefix}` on the document root when missing.
    pub(crate) fn ensure_namespace(&mut self, prefix: &str, uri: &str) {
        let key = format!("xmlns:{prefix}");
        if self.document.attr(&key).is_none() {
            self.document.set_attr(&key, uri);
        }
    }

    pub(crate) fn next_drawing_id(&mut self) -> u32 {
        let id = self.next_drawing_id;
        self.next_drawing_id += 1;
        id
    }

    /// Store JPEG bytes as a new media part; returns the relationship id.
    pub(crate) fn add_jpeg(&mut self, data: Vec<u8>) -> String {
        let target = format!("{MEDIA_PREFIX}{}.jpeg", self.next_media);
        self.next_media += 1;
        self.package.set_part(&format!("word/{target}"), data);
        self.ensure_default_content_type("jpeg", "image/jpeg");
        self.rels.add(REL_TYPE_IMAGE, &target)
    }

    /// Relationship id of the header or footer part `word/{file_name}`,
    /// creating an empty part on first use. Repeated calls return the same id.
    pub(crate) fn header_footer_part(&mut self, kind: HeaderFooterKind, file_name: &str) -> String {
        if let Some(id) = self.rels.find(kind.rel_type(), file_name) {
            let id = id.to_string();
            self.load_part(kind, file_name);
            return id;
        }
        let id = self.rels.add(kind.rel_type(), file_name);
        self.ensure_override_content_type(&format!("/word/{file_name}"), kind.content_type());
        self.parts
            .insert(file_name.to_string(), empty_header_footer(kind));
        id
    }

    fn load_part(&mut self, kind: HeaderFooterKind, file_name: &str) {
        if self.parts.contains_key(file_name) {
            return;
        }
        let parsed = self
            .package
            .part_text(&format!("word/{file_name}"))
            .and_then(|t| xml::parse(&t).ok())
            .unwrap_or_else(|| empty_header_footer(kind));
        self.parts.insert(file_name.to_string(), parsed);
    }

    /// Mutable tree of a part previously returned by [`Self::header_footer_part`].
    pub(crate) fn part_mut(&mut self, file_name: &str) -> Option<&mut Element> {
        self.parts.get_mut(file_name)
    }

    fn ensure_default_content_type(&mut self, extension: &str, content_type: &str) {
        let present = self.content_types.elements().any(|e| {
            e.name == "Default"
                && e.attr("Extension")
                    .is_some_and(|x| x.eq_ignore_ascii_case(extension))
        });
        if !present {
            let node = Element::new("Default")
                .with_attr("Extension", extension)
                .with_attr("ContentType", content_type);
            // Defaults precede Overrides in the schema.
            let at = self
                .content_types
                .children
                .iter()
                .position(|n| matches!(n, xml::Node::Element(e) if e.name == "Override"))
                .unwrap_or(self.content_types.children.len());
            self.content_types
                .children
                .insert(at, xml::Node::Element(node));
        }
    }

    fn ensure_override_content_type(&mut self, part_name: &str, content_type: &str) {
        let present = self
            .content_types
            .elements()
            .any(|e| e.name == "Override" && e.attr("PartName") == Some(part_name));
        if !present {
            self.content_types.children.push(xml::Node::Element(
                Element::new("Override")
                    .with_attr("PartName", part_name)
                    .with_attr("ContentType", content_type),
            ));
        }
    }

    /// Serialize every edited part back into a fresh zip.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut package = self.package.clone();
        package.set_part(DOCUMENT_PART, self.document.serialize().into_bytes());
        package.set_part(
            DOCUMENT_RELS_PART,
            self.rels.to_element().serialize().into_bytes(),
        );
        package.set_part(
            CONTENT_TYPES_PART,
            self.content_types.serialize().into_bytes(),
        );
        for (file_name, part) in &self.parts {
            package.set_part(&format!("word/{file_name}"), part.serialize().into_bytes());
        }
        package.write()
    }
}

fn empty_header_footer(kind: HeaderFooterKind) -> Element {
    Element::w(kind.root_name())
        .with_attr("xmlns:w", WML_NS)
        .with_attr("xmlns:r", REL_NS)
}
