//! Table cloning and placeholder filling.

use crate::docx::xml::{Element, Node, PPR_ORDER, RPR_ORDER};
use crate::docx::{DML_NS, PIC_NS, REL_NS, WPD_NS};
use crate::error::Error;
use crate::model::{
    BODY_FONT_PT, LayoutStyle, STANDARD_FONT, SlotValue, cm_to_emu, pt_to_half_points,
    pt_to_twips,
};
use crate::photo::compress_image;

use super::fit::fit;
use super::tokens::{Placeholder, TokenMap};

/// The template table as it was before anything was filled. Every table
/// after the first is instantiated from this copy.
pub struct TableSnapshot {
    pristine: Element,
}

impl TableSnapshot {
    pub fn capture(table: &Element) -> Self {
        Self {
            pristine: table.clone(),
        }
    }

    pub fn instantiate(&self) -> Element {
        self.pristine.clone()
    }
}

/// Near-invisible paragraph separating two consecutive tables: exact line
/// height of `table_spacing_pt`, holding one empty run at
/// `table_spacing_font_pt`.
pub fn spacer_paragraph(style: &LayoutStyle) -> Element {
    let spacing = Element::w("spacing")
        .with_attr("w:before", "0")
        .with_attr("w:after", "0")
        .with_attr("w:line", pt_to_twips(style.table_spacing_pt).to_string())
        .with_attr("w:lineRule", "exact");
    let size = pt_to_half_points(style.table_spacing_font_pt).max(1).to_string();
    let rpr = Element::w("rPr")
        .with_child(Element::w("sz").with_attr("w:val", size.as_str()))
        .with_child(Element::w("szCs").with_attr("w:val", size));
    Element::w("p")
        .with_child(Element::w("pPr").with_child(spacing))
        .with_child(Element::w("r").with_child(rpr))
}

/// Where an embedded picture lives in the package.
pub struct PictureRef {
    pub rel_id: String,
    pub drawing_id: u32,
}

/// Receives compressed picture bytes and stores them as a media part.
pub trait PictureSink {
    fn embed_jpeg(&mut self, data: Vec<u8>) -> PictureRef;

    /// A `wp:docPr` id not yet used anywhere in the document.
    fn allocate_drawing_id(&mut self) -> u32;
}

/// Counts of what one [`fill`] call replaced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FillStats {
    pub text_slots: usize,
    pub picture_slots: usize,
}

/// Replace every placeholder of `tokens` found in the cells of `table`.
///
/// Tokens are applied per cell in map order, so several placeholders in one
/// cell are each replaced. Text that matches no token is left alone.
/// Drawings the table already carries get fresh ids first.
pub fn fill(
    table: &mut Element,
    tokens: &TokenMap,
    style: &LayoutStyle,
    sink: &mut impl PictureSink,
) -> Result<FillStats, Error> {
    renumber_drawings(table, sink);
    let mut stats = FillStats::default();
    for row in table.w_children_mut("tr") {
        for cell in row.w_children_mut("tc") {
            for (placeholder, value) in tokens.iter() {
                if !placeholder.is_found_in(&cell_text(cell)) {
                    continue;
                }
                match value {
                    SlotValue::Picture { image, filename } => {
                        let picture = if image.width() == 0 || image.height() == 0 {
                            log::warn!("Photo '{filename}' has no pixels; leaving its slot empty");
                            None
                        } else {
                            Some(build_picture(image, filename, style, sink)?)
                        };
                        fill_picture_slot(cell, placeholder, picture);
                        stats.picture_slots += 1;
                    }
                    SlotValue::Text(text) => {
                        stats.text_slots += fill_text_slot(cell, placeholder, text);
                    }
                }
                log::debug!("Filled {}", placeholder.token());
            }
        }
    }
    Ok(stats)
}

/// Give every `wp:docPr` in `table` a new id from `sink`.
fn renumber_drawings(table: &mut Element, sink: &mut impl PictureSink) {
    table.walk_mut(&mut |e| {
        if e.name.ends_with(":docPr") && e.attr("id").is_some() {
            e.set_attr("id", sink.allocate_drawing_id().to_string());
        }
    });
}

/// Text of a cell as Word shows it: paragraphs joined by newlines.
pub fn cell_text(cell: &Element) -> String {
    let paragraphs: Vec<String> = cell.w_children("p").map(paragraph_text).collect();
    paragraphs.join("\n")
}

/// Visible text of a paragraph. Drawings, deleted text and field
/// instructions do not contribute.
pub fn paragraph_text(paragraph: &Element) -> String {
    let mut out = String::new();
    collect_text(paragraph, &mut out);
    out
}

fn collect_text(node: &Element, out: &mut String) {
    for child in node.elements() {
        let Some(local) = child.name.strip_prefix("w:") else {
            continue;
        };
        match local {
            "t" => {
                for n in &child.children {
                    if let Node::Text(t) = n {
                        out.push_str(t);
                    }
                }
            }
            "tab" => out.push('\t'),
            "br" | "cr" => out.push('\n'),
            "drawing" | "pict" | "del" | "instrText" | "pPr" | "rPr" => {}
            _ => collect_text(child, out),
        }
    }
}

fn fill_text_slot(cell: &mut Element, placeholder: &Placeholder, value: &str) -> usize {
    let mut replaced = 0;
    for paragraph in cell.w_children_mut("p") {
        let text = paragraph_text(paragraph);
        if !placeholder.is_found_in(&text) {
            continue;
        }
        let new_text = placeholder.replace_in(&text, value);
        rewrite_paragraph(paragraph, &new_text);
        for run in paragraph.w_children_mut("r") {
            set_run_font(run, STANDARD_FONT, BODY_FONT_PT);
        }
        replaced += 1;
    }
    replaced
}

/// Replace the paragraph's text runs with runs spelling `text`. Paragraph
/// properties, the first run's formatting and any drawings are kept.
fn rewrite_paragraph(paragraph: &mut Element, text: &str) {
    let ppr = paragraph.w_child("pPr").cloned();
    let base_rpr = first_run_properties(paragraph);
    let drawings = drawing_runs(paragraph);

    paragraph.children.clear();
    if let Some(ppr) = ppr {
        paragraph.children.push(Node::Element(ppr));
    }
    if !text.is_empty() {
        paragraph
            .children
            .push(Node::Element(text_run(text, base_rpr)));
    }
    paragraph
        .children
        .extend(drawings.into_iter().map(Node::Element));
}

fn fill_picture_slot(cell: &mut Element, placeholder: &Placeholder, picture: Option<Element>) {
    let remaining = placeholder.replace_in(&cell_text(cell), "");

    let first = cell.w_child("p");
    let mut ppr = first
        .and_then(|p| p.w_child("pPr"))
        .cloned()
        .unwrap_or_else(|| Element::w("pPr"));
    let base_rpr = first.and_then(first_run_properties);
    let drawings: Vec<Element> = cell.w_children("p").flat_map(drawing_runs).collect();

    ppr.ordered_child_mut("jc", PPR_ORDER)
        .set_attr("w:val", "center");
    let mut paragraph = Element::w("p").with_child(ppr);
    if !remaining.is_empty() {
        paragraph = paragraph.with_child(text_run(&remaining, base_rpr));
    }
    for run in drawings.into_iter().chain(picture) {
        paragraph = paragraph.with_child(run);
    }

    // Cell content is replaced wholesale; only the cell properties survive.
    cell.children
        .retain(|n| matches!(n, Node::Element(e) if e.is_w("tcPr")));
    cell.children.push(Node::Element(paragraph));
}

fn first_run_properties(paragraph: &Element) -> Option<Element> {
    let mut found = None;
    paragraph.walk(&mut |e| {
        if found.is_none() && e.is_w("r") {
            found = Some(e.w_child("rPr").cloned());
        }
    });
    found.flatten()
}

fn drawing_runs(paragraph: &Element) -> Vec<Element> {
    paragraph
        .w_children("r")
        .filter(|r| r.w_child("drawing").is_some() || r.w_child("pict").is_some())
        .cloned()
        .collect()
}

/// A run spelling `text`, with tabs and line breaks as their own elements.
fn text_run(text: &str, rpr: Option<Element>) -> Element {
    let mut run = Element::w("r");
    if let Some(rpr) = rpr {
        run.children.push(Node::Element(rpr));
    }
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            run = run.with_child(Element::w("br"));
        }
        for (j, segment) in line.split('\t').enumerate() {
            if j > 0 {
                run = run.with_child(Element::w("tab"));
            }
            if !segment.is_empty() {
                run = run.with_child(text_element(segment));
            }
        }
    }
    run
}

pub(crate) fn text_element(text: &str) -> Element {
    let t = Element::w("t");
    let t = if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        t.with_attr("xml:space", "preserve")
    } else {
        t
    };
    t.with_text(text)
}

/// Apply an East Asian typeface and size to a run, overriding theme fonts.
pub(crate) fn set_run_font(run: &mut Element, font: &str, size_pt: f32) {
    let rpr = run.properties_mut("rPr");
    let fonts = rpr.ordered_child_mut("rFonts", RPR_ORDER);
    fonts
        .attrs
        .retain(|(k, _)| !matches!(k.as_str(), "w:asciiTheme" | "w:hAnsiTheme" | "w:eastAsiaTheme"));
    fonts.set_attr("w:ascii", font);
    fonts.set_attr("w:hAnsi", font);
    fonts.set_attr("w:eastAsia", font);
    rpr.ordered_child_mut("sz", RPR_ORDER)
        .set_attr("w:val", pt_to_half_points(size_pt).to_string());
}

fn build_picture(
    image: &image::DynamicImage,
    filename: &str,
    style: &LayoutStyle,
    sink: &mut impl PictureSink,
) -> Result<Element, Error> {
    let bounds = fit(
        (image.width(), image.height()),
        style.max_img_width,
        style.max_img_height,
    );
    let compressed =
        compress_image(image, style.image_max_px, style.jpeg_quality).map_err(|source| {
            Error::Image {
                filename: filename.to_string(),
                source,
            }
        })?;
    let (width_cm, height_cm) = bounds.resolve((compressed.width, compressed.height));
    let extent = (cm_to_emu(width_cm), cm_to_emu(height_cm));
    log::debug!(
        "Embedding '{filename}' at {width_cm:.2}x{height_cm:.2} cm ({} bytes)",
        compressed.data.len()
    );

    let picture = sink.embed_jpeg(compressed.data);
    Ok(picture_run(&picture, extent, filename))
}

/// An inline `w:drawing` run. Namespaces are declared on the drawing so the
/// fragment is valid wherever it is placed.
fn picture_run(picture: &PictureRef, (cx, cy): (u64, u64), filename: &str) -> Element {
    let cx = cx.to_string();
    let cy = cy.to_string();
    let id = picture.drawing_id.to_string();
    let name = format!("Picture {id}");

    let graphic_frame = Element::new("wp:cNvGraphicFramePr").with_child(
        Element::new("a:graphicFrameLocks").with_attr("noChangeAspect", "1"),
    );
    let pic = Element::new("pic:pic")
        .with_child(
            Element::new("pic:nvPicPr")
                .with_child(
                    Element::new("pic:cNvPr")
                        .with_attr("id", "0")
                        .with_attr("name", filename),
                )
                .with_child(Element::new("pic:cNvPicPr")),
        )
        .with_child(
            Element::new("pic:blipFill")
                .with_child(Element::new("a:blip").with_attr("r:embed", picture.rel_id.as_str()))
                .with_child(Element::new("a:stretch").with_child(Element::new("a:fillRect"))),
        )
        .with_child(
            Element::new("pic:spPr")
                .with_child(
                    Element::new("a:xfrm")
                        .with_child(Element::new("a:off").with_attr("x", "0").with_attr("y", "0"))
                        .with_child(
                            Element::new("a:ext")
                                .with_attr("cx", cx.as_str())
                                .with_attr("cy", cy.as_str()),
                        ),
                )
                .with_child(
                    Element::new("a:prstGeom")
                        .with_attr("prst", "rect")
                        .with_child(Element::new("a:avLst")),
                ),
        );
    let inline = Element::new("wp:inline")
        .with_attr("distT", "0")
        .with_attr("distB", "0")
        .with_attr("distL", "0")
        .with_attr("distR", "0")
        .with_child(
            Element::new("wp:extent")
                .with_attr("cx", cx.as_str())
                .with_attr("cy", cy.as_str()),
        )
        .with_child(
            Element::new("wp:docPr")
                .with_attr("id", id)
                .with_attr("name", name),
        )
        .with_child(graphic_frame)
        .with_child(
            Element::new("a:graphic").with_child(
                Element::new("a:graphicData")
                    .with_attr("uri", PIC_NS)
                    .with_child(pic),
            ),
        );
    let drawing = Element::w("drawing")
        .with_attr("xmlns:wp", WPD_NS)
        .with_attr("xmlns:a", DML_NS)
        .with_attr("xmlns:pic", PIC_NS)
        .with_attr("xmlns:r", REL_NS)
        .with_child(inline);
    Element::w("r").with_child(drawing)
}
