mod docx;
mod error;
mod inspect;
mod model;
mod photo;
mod report;
mod session;

pub use docx::WordDocument;
pub use error::Error;
pub use inspect::{analyze_structure, describe_structure};
pub use model::{
    BODY_FONT_PT, DOCX_MIME, FALLBACK_FILE_NAME, HEADER_FONT_PT, LayoutKind, LayoutStyle,
    PhotoRecord, ReportContext, STANDARD_FONT, SlotValue, output_file_name,
};
pub use photo::{
    CompressedImage, capture_date, compress_image, crop_to_ratio, load_image, load_photo,
    resize_with_padding,
};
pub use report::fit::{Fit, fit};
pub use report::section::{FOOTER_PART, HEADER_PART, finalize};
pub use report::table::FillStats;
pub use report::tokens::{Placeholder, TokenMap, resolve};
pub use report::{AssemblyStats, assemble, load_template};
pub use session::{PhotoDraft, PhotoList, UndoToken, UploadedPhoto, parse_date, photo_number};

use std::path::Path;
use std::time::Instant;

/// Build a report from the template at `template` and return the DOCX bytes.
pub fn generate_report(
    context: &ReportContext,
    photos: &[PhotoRecord],
    template: &Path,
    style: &LayoutStyle,
) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();
    let doc = load_template(template)?;
    log::info!(
        "Loaded template {} in {:.1}ms",
        template.display(),
        t0.elapsed().as_secs_f64() * 1000.0
    );
    report::generate(doc, context, photos, style)
}

/// [`generate_report`] for a template already held in memory.
pub fn generate_report_from_bytes(
    context: &ReportContext,
    photos: &[PhotoRecord],
    template: &[u8],
    style: &LayoutStyle,
) -> Result<Vec<u8>, Error> {
    let doc = WordDocument::from_bytes(template)?;
    report::generate(doc, context, photos, style)
}

pub fn write_report(
    context: &ReportContext,
    photos: &[PhotoRecord],
    template: &Path,
    style: &LayoutStyle,
    output: &Path,
) -> Result<(), Error> {
    let bytes = generate_report(context, photos, template, style)?;
    std::fs::write(output, &bytes).map_err(Error::Io)?;
    Ok(())
}
