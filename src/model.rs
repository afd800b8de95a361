use std::str::FromStr;

use image::DynamicImage;

use crate::error::Error;

pub const STANDARD_FONT: &str = "標楷體";
pub const BODY_FONT_PT: f32 = 12.0;
pub const HEADER_FONT_PT: f32 = 24.0;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const FALLBACK_FILE_NAME: &str = "photo_report.docx";

const TWIPS_PER_CM: f32 = 1440.0 / 2.54;
const EMU_PER_CM: f32 = 360_000.0;

pub fn cm_to_twips(cm: f32) -> u32 {
    (cm * TWIPS_PER_CM).round() as u32
}

pub fn cm_to_emu(cm: f32) -> u64 {
    (cm * EMU_PER_CM).round() as u64
}

pub fn pt_to_twips(pt: f32) -> u32 {
    (pt * 20.0).round() as u32
}

/// OOXML font sizes (`w:sz`) are in half-points.
pub fn pt_to_half_points(pt: f32) -> u32 {
    (pt * 2.0).round() as u32
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutKind {
    Vertical,
    SideBySide,
}

impl LayoutKind {
    /// Pick a layout from the template's file name, the way report authors
    /// name their two-column templates.
    pub fn detect(template_file_name: &str) -> Self {
        if template_file_name.contains("左右") || template_file_name.contains("Side") {
            LayoutKind::SideBySide
        } else {
            LayoutKind::Vertical
        }
    }

    pub fn style(self) -> LayoutStyle {
        match self {
            LayoutKind::Vertical => LayoutStyle::vertical(),
            LayoutKind::SideBySide => LayoutStyle::side_by_side(),
        }
    }
}

impl FromStr for LayoutKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vertical" | "Vertical" | "A4_Vertical" => Ok(LayoutKind::Vertical),
            "side-by-side" | "SideBySide" | "A4_SideBySide" => Ok(LayoutKind::SideBySide),
            other => Err(format!(
                "unknown layout '{other}' (expected 'vertical' or 'side-by-side')"
            )),
        }
    }
}

/// Page geometry and batching for one report. Lengths are in centimetres
/// unless the field name says otherwise.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutStyle {
    pub items_per_table: usize,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub header_distance: f32,
    pub footer_distance: f32,
    pub page_width: f32,
    pub page_height: f32,
    pub table_spacing_pt: f32,
    pub table_spacing_font_pt: f32,
    pub max_img_width: f32,
    pub max_img_height: f32,
    /// Placeholder keys carry a positional " N" suffix. Always equal to
    /// `items_per_table > 1`.
    pub suffix_mode: bool,
    pub image_max_px: u32,
    pub jpeg_quality: u8,
}

impl LayoutStyle {
    pub fn vertical() -> Self {
        Self {
            items_per_table: 1,
            margin_top: 1.5,
            margin_bottom: 1.9,
            margin_left: 3.17,
            margin_right: 3.17,
            header_distance: 1.5,
            footer_distance: 1.75,
            page_width: 21.0,
            page_height: 29.7,
            table_spacing_pt: 4.0,
            table_spacing_font_pt: 1.0,
            max_img_width: 14.4,
            max_img_height: 9.8,
            suffix_mode: false,
            image_max_px: 1600,
            jpeg_quality: 85,
        }
    }

    pub fn side_by_side() -> Self {
        Self {
            items_per_table: 2,
            margin_top: 2.54,
            margin_bottom: 2.54,
            margin_left: 1.9,
            margin_right: 1.9,
            max_img_width: 8.3,
            max_img_height: 18.0,
            suffix_mode: true,
            ..Self::vertical()
        }
    }

    pub fn uses_suffix(&self) -> bool {
        self.items_per_table > 1
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.items_per_table == 0 {
            return Err(Error::Generation(
                "layout must place at least one photo per table".into(),
            ));
        }
        if self.suffix_mode != self.uses_suffix() {
            return Err(Error::Generation(format!(
                "layout suffix mode ({}) disagrees with {} item(s) per table",
                self.suffix_mode, self.items_per_table
            )));
        }
        if self.max_img_width <= 0.0 || self.max_img_height <= 0.0 {
            return Err(Error::Generation("image box must have positive size".into()));
        }
        Ok(())
    }
}

impl Default for LayoutStyle {
    fn default() -> Self {
        Self::vertical()
    }
}

/// Report-wide metadata entered once per report.
#[derive(Clone, Debug, Default)]
pub struct ReportContext {
    pub header_text: String,
    pub subject: String,
    pub location: String,
    pub maker: String,
    /// `YYYY-MM-DD` or empty.
    pub date: String,
    pub description: String,
}

/// `{subject}_{date}.docx`, or a generic name when either part is blank.
pub fn output_file_name(context: &ReportContext) -> String {
    let subject = context.subject.trim();
    let date = context.date.trim();
    if subject.is_empty() || date.is_empty() {
        return FALLBACK_FILE_NAME.to_string();
    }
    format!("{subject}_{date}.docx")
}

/// One photo with every field already resolved against the report context.
#[derive(Clone, Debug)]
pub struct PhotoRecord {
    /// 1-based position, zero-padded to two digits.
    pub number: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub description: String,
    pub image: DynamicImage,
    pub filename: String,
}

/// What a placeholder is replaced with.
#[derive(Clone, Debug)]
pub enum SlotValue<'a> {
    Text(String),
    Picture {
        image: &'a DynamicImage,
        filename: &'a str,
    },
}
