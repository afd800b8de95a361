//! Page geometry, header and footer of the generated document.

use crate::docx::xml::{Element, Node, PPR_ORDER, SECTPR_ORDER};
use crate::docx::{HeaderFooterKind, REL_NS, WordDocument};
use crate::model::{
    BODY_FONT_PT, HEADER_FONT_PT, LayoutStyle, STANDARD_FONT, cm_to_twips,
};

use super::table::{set_run_font, text_element};

pub const HEADER_PART: &str = "report_header1.xml";
pub const FOOTER_PART: &str = "report_footer1.xml";

/// Apply the layout's page size and margins to every section, write the
/// header (when `header_text` is non-empty) and rebuild the page-number
/// footer. Running it again yields the same document.
pub fn finalize(doc: &mut WordDocument, header_text: &str, style: &LayoutStyle) {
    doc.ensure_namespace("r", REL_NS);

    let body = doc.body_mut();
    let has_body_section = body
        .elements()
        .last()
        .is_some_and(|e| e.is_w("sectPr"));
    if !has_body_section {
        body.children.push(Node::Element(Element::w("sectPr")));
    }

    let header_id = if header_text.is_empty() {
        None
    } else {
        let id = doc.header_footer_part(HeaderFooterKind::Header, HEADER_PART);
        if let Some(part) = doc.part_mut(HEADER_PART) {
            replace_paragraphs(part, header_paragraph(header_text));
        }
        Some(id)
    };
    let footer_id = doc.header_footer_part(HeaderFooterKind::Footer, FOOTER_PART);
    if let Some(part) = doc.part_mut(FOOTER_PART) {
        replace_paragraphs(part, page_number_paragraph());
    }

    let mut sections = 0;
    for_each_section(doc.body_mut(), &mut |sect| {
        apply_geometry(sect, style);
        if let Some(id) = &header_id {
            set_reference(sect, "headerReference", id);
        }
        set_reference(sect, "footerReference", &footer_id);
        sections += 1;
    });
    log::debug!("Finalized {sections} section(s)");
}

fn for_each_section(body: &mut Element, apply: &mut impl FnMut(&mut Element)) {
    for child in body.elements_mut() {
        if child.is_w("sectPr") {
            apply(child);
        } else if child.is_w("p")
            && let Some(sect) = child
                .w_child_mut("pPr")
                .and_then(|ppr| ppr.w_child_mut("sectPr"))
        {
            apply(sect);
        }
    }
}

fn apply_geometry(sect: &mut Element, style: &LayoutStyle) {
    let pg_sz = sect.ordered_child_mut("pgSz", SECTPR_ORDER);
    pg_sz.set_attr("w:w", cm_to_twips(style.page_width).to_string());
    pg_sz.set_attr("w:h", cm_to_twips(style.page_height).to_string());
    if style.page_width > style.page_height {
        pg_sz.set_attr("w:orient", "landscape");
    } else {
        pg_sz.attrs.retain(|(k, _)| k != "w:orient");
    }

    let pg_mar = sect.ordered_child_mut("pgMar", SECTPR_ORDER);
    pg_mar.set_attr("w:top", cm_to_twips(style.margin_top).to_string());
    pg_mar.set_attr("w:right", cm_to_twips(style.margin_right).to_string());
    pg_mar.set_attr("w:bottom", cm_to_twips(style.margin_bottom).to_string());
    pg_mar.set_attr("w:left", cm_to_twips(style.margin_left).to_string());
    pg_mar.set_attr("w:header", cm_to_twips(style.header_distance).to_string());
    pg_mar.set_attr("w:footer", cm_to_twips(style.footer_distance).to_string());
    if pg_mar.attr("w:gutter").is_none() {
        pg_mar.set_attr("w:gutter", "0");
    }
}

/// Point the section's default header or footer at `rel_id`.
fn set_reference(sect: &mut Element, kind: &str, rel_id: &str) {
    sect.children.retain(|n| {
        !matches!(n, Node::Element(e) if e.is_w(kind) && e.attr("w:type") == Some("default"))
    });
    let reference = Element::w(kind)
        .with_attr("w:type", "default")
        .with_attr("r:id", rel_id);
    // References lead the section properties; headers before footers.
    let at = sect
        .children
        .iter()
        .position(|n| match n {
            Node::Element(e) => {
                !(e.is_w("headerReference") || (kind == "footerReference" && e.is_w("footerReference")))
            }
            Node::Text(_) => false,
        })
        .unwrap_or(sect.children.len());
    sect.children.insert(at, Node::Element(reference));
}

fn replace_paragraphs(part: &mut Element, paragraph: Element) {
    part.remove_w_children("p");
    part.children.push(Node::Element(paragraph));
}

fn centered_paragraph() -> Element {
    let mut ppr = Element::w("pPr");
    ppr.ordered_child_mut("jc", PPR_ORDER)
        .set_attr("w:val", "center");
    Element::w("p").with_child(ppr)
}

fn styled_run(text: &str, size_pt: f32) -> Element {
    let mut run = Element::w("r").with_child(text_element(text));
    set_run_font(&mut run, STANDARD_FONT, size_pt);
    run
}

fn header_paragraph(text: &str) -> Element {
    centered_paragraph().with_child(styled_run(text, HEADER_FONT_PT))
}

/// `第 {PAGE} 頁 - 共 {NUMPAGES} 頁`, with both numbers as live fields.
fn page_number_paragraph() -> Element {
    let field = |instr: &str| {
        Element::w("fldSimple")
            .with_attr("w:instr", instr)
            .with_child(styled_run("1", BODY_FONT_PT))
    };
    centered_paragraph()
        .with_child(styled_run("第 ", BODY_FONT_PT))
        .with_child(field("PAGE"))
        .with_child(styled_run(" 頁 - 共 ", BODY_FONT_PT))
        .with_child(field("NUMPAGES"))
        .with_child(styled_run(" 頁", BODY_FONT_PT))
}
