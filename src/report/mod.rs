pub(crate) mod fit;
pub(crate) mod section;
pub(crate) mod table;
pub(crate) mod tokens;

use std::path::Path;
use std::time::Instant;

use crate::docx::WordDocument;
use crate::docx::xml::Node;
use crate::error::Error;
use crate::model::{LayoutStyle, PhotoRecord, ReportContext};

use table::{PictureRef, PictureSink, TableSnapshot, spacer_paragraph};

/// What one assembly produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssemblyStats {
    pub tables: usize,
    pub spacers: usize,
    pub text_slots: usize,
    pub picture_slots: usize,
}

impl PictureSink for WordDocument {
    fn embed_jpeg(&mut self, data: Vec<u8>) -> PictureRef {
        let rel_id = self.add_jpeg(data);
        let drawing_id = self.next_drawing_id();
        PictureRef { rel_id, drawing_id }
    }

    fn allocate_drawing_id(&mut self) -> u32 {
        self.next_drawing_id()
    }
}

/// Open a template, failing with [`Error::Template`] when it does not exist.
pub fn load_template(path: &Path) -> Result<WordDocument, Error> {
    if !path.is_file() {
        return Err(Error::Template(format!(
            "template not found: {}",
            path.display()
        )));
    }
    WordDocument::open(path)
}

/// Fill `doc` (a freshly loaded template) with one table per batch of
/// `style.items_per_table` photos and finalize its page layout.
///
/// Everything after the template's first table is discarded, so the page
/// setup, header and footer come only from `style` and `context`.
pub fn assemble(
    doc: &mut WordDocument,
    context: &ReportContext,
    photos: &[PhotoRecord],
    style: &LayoutStyle,
) -> Result<AssemblyStats, Error> {
    style.validate()?;

    let body = doc.body_mut();
    let (table_index, snapshot) = body
        .children
        .iter()
        .enumerate()
        .find_map(|(i, n)| match n {
            Node::Element(e) if e.is_w("tbl") => Some((i, TableSnapshot::capture(e))),
            _ => None,
        })
        .ok_or_else(|| Error::Template("template contains no table".into()))?;
    if photos.is_empty() {
        return Err(Error::EmptyReport);
    }
    let dropped = body.children.len() - table_index - 1;
    body.children.truncate(table_index + 1);
    log::debug!("Dropped {dropped} node(s) after the template table");

    let mut stats = AssemblyStats::default();
    for (batch_no, batch) in photos.chunks(style.items_per_table).enumerate() {
        let map = tokens::resolve(context, batch, style);
        let mut table = snapshot.instantiate();
        let filled = table::fill(&mut table, &map, style, &mut *doc)?;
        if filled.picture_slots < batch.len() {
            let names: Vec<&str> = batch.iter().map(|p| p.filename.as_str()).collect();
            log::warn!(
                "Table {} has {} picture slot(s) for {} photo(s): {}",
                batch_no + 1,
                filled.picture_slots,
                batch.len(),
                names.join(", ")
            );
        }
        stats.text_slots += filled.text_slots;
        stats.picture_slots += filled.picture_slots;

        let body = doc.body_mut();
        if batch_no == 0 {
            body.children[table_index] = Node::Element(table);
        } else {
            body.children.push(Node::Element(spacer_paragraph(style)));
            body.children.push(Node::Element(table));
            stats.spacers += 1;
        }
        stats.tables += 1;
    }

    section::finalize(doc, &context.header_text, style);
    Ok(stats)
}

/// Assemble `doc` and serialize it to DOCX bytes.
pub fn generate(
    mut doc: WordDocument,
    context: &ReportContext,
    photos: &[PhotoRecord],
    style: &LayoutStyle,
) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();
    let stats = assemble(&mut doc, context, photos, style)?;
    let t_assemble = t0.elapsed();

    let bytes = doc.to_bytes()?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: assemble={:.1}ms, serialize={:.1}ms, total={:.1}ms ({} photos, {} tables, output {} bytes)",
        t_assemble.as_secs_f64() * 1000.0,
        (t_total - t_assemble).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        photos.len(),
        stats.tables,
        bytes.len(),
    );
    Ok(bytes)
}
