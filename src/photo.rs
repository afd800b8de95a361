//! Photo pre-processing: oriented decoding, JPEG compression for embedding,
//! preview letterboxing and EXIF capture dates.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageDecoder, ImageError, ImageReader, Rgb, RgbImage};

use crate::error::Error;

/// Width of the canvas produced by [`resize_with_padding`].
const PADDED_BASE_WIDTH: u32 = 1000;

/// Re-encoded photo bytes ready to be stored as a media part.
pub struct CompressedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decode an uploaded photo and apply its EXIF orientation.
pub fn load_image(data: &[u8]) -> Result<DynamicImage, ImageError> {
    let mut decoder = ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// [`load_image`] with the failure attributed to `filename`.
pub fn load_photo(filename: &str, data: &[u8]) -> Result<DynamicImage, Error> {
    load_image(data).map_err(|source| Error::Image {
        filename: filename.to_string(),
        source,
    })
}

/// Shrink to fit `max_px` × `max_px` (never enlarging), flatten to RGB and
/// encode as JPEG at `quality`.
pub fn compress_image(
    img: &DynamicImage,
    max_px: u32,
    quality: u8,
) -> Result<CompressedImage, ImageError> {
    let rgb = if img.width() > max_px || img.height() > max_px {
        img.resize(max_px, max_px, FilterType::Lanczos3).to_rgb8()
    } else {
        img.to_rgb8()
    };
    let (width, height) = rgb.dimensions();

    let mut data = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut data, quality);
    DynamicImage::ImageRgb8(rgb).write_with_encoder(encoder)?;

    Ok(CompressedImage {
        data,
        width,
        height,
    })
}

/// Letterbox `img` onto a white canvas of aspect `target_ratio` so previews
/// share one height while showing the whole picture.
pub fn resize_with_padding(img: &DynamicImage, target_ratio: f32) -> RgbImage {
    let base_w = PADDED_BASE_WIDTH;
    let base_h = ((base_w as f32 / target_ratio) as u32).max(1);
    let mut canvas = RgbImage::from_pixel(base_w, base_h, Rgb([255, 255, 255]));
    if img.width() == 0 || img.height() == 0 {
        return canvas;
    }

    let current_ratio = img.width() as f32 / img.height() as f32;
    let (w, h, x, y) = if current_ratio > target_ratio {
        let h = ((base_w as f32 / current_ratio) as u32).max(1);
        (base_w, h, 0, (base_h.saturating_sub(h)) / 2)
    } else {
        let w = ((base_h as f32 * current_ratio) as u32).max(1);
        (w, base_h, (base_w.saturating_sub(w)) / 2, 0)
    };

    let resized = img.resize_exact(w, h, FilterType::Lanczos3).to_rgb8();
    imageops::overlay(&mut canvas, &resized, x as i64, y as i64);
    canvas
}

/// Center-crop `img` to `target_ratio` (width / height).
pub fn crop_to_ratio(img: &DynamicImage, target_ratio: f32) -> DynamicImage {
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 {
        return img.clone();
    }
    let current_ratio = w as f32 / h as f32;
    if current_ratio > target_ratio {
        let new_w = ((h as f32 * target_ratio) as u32).clamp(1, w);
        img.crop_imm((w - new_w) / 2, 0, new_w, h)
    } else {
        let new_h = ((w as f32 / target_ratio) as u32).clamp(1, h);
        img.crop_imm(0, (h - new_h) / 2, w, new_h)
    }
}

const TAG_DATE_TIME: u16 = 0x0132;
const TAG_EXIF_IFD: u16 = 0x8769;
const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;

/// Capture date (`YYYY-MM-DD`) from the photo's EXIF block, preferring
/// DateTimeOriginal over the IFD0 DateTime.
pub fn capture_date(data: &[u8]) -> Option<String> {
    let mut decoder = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?
        .into_decoder()
        .ok()?;
    let exif = decoder.exif_metadata().ok()??;
    exif_date(&exif)
}

/// Parse a raw TIFF-structured EXIF block (optionally prefixed with
/// `Exif\0\0`).
pub(crate) fn exif_date(exif: &[u8]) -> Option<String> {
    let tiff = exif.strip_prefix(b"Exif\0\0").unwrap_or(exif);
    let big_endian = match tiff.get(0..2)? {
        b"II" => false,
        b"MM" => true,
        _ => return None,
    };
    let u16_at = |off: usize| -> Option<u16> {
        let b = tiff.get(off..off + 2)?;
        Some(if big_endian {
            u16::from_be_bytes([b[0], b[1]])
        } else {
            u16::from_le_bytes([b[0], b[1]])
        })
    };
    let u32_at = |off: usize| -> Option<u32> {
        let b = tiff.get(off..off + 4)?;
        let b = [b[0], b[1], b[2], b[3]];
        Some(if big_endian {
            u32::from_be_bytes(b)
        } else {
            u32::from_le_bytes(b)
        })
    };
    // (tag, value-or-offset field position) for each entry of an IFD
    let entries = |ifd: usize| -> Vec<(u16, usize)> {
        let count = u16_at(ifd).unwrap_or(0) as usize;
        (0..count)
            .map(|i| ifd + 2 + i * 12)
            .filter_map(|e| Some((u16_at(e)?, e + 8)))
            .collect()
    };
    let ascii_at = |field: usize| -> Option<String> {
        let off = u32_at(field)? as usize;
        let raw = tiff.get(off..off + 19)?;
        let text = std::str::from_utf8(raw).ok()?;
        normalize_exif_date(text)
    };

    let ifd0 = u32_at(4)? as usize;
    let ifd0_entries = entries(ifd0);
    let original = ifd0_entries
        .iter()
        .find(|(tag, _)| *tag == TAG_EXIF_IFD)
        .and_then(|(_, field)| u32_at(*field))
        .and_then(|exif_ifd| {
            entries(exif_ifd as usize)
                .into_iter()
                .find(|(tag, _)| *tag == TAG_DATE_TIME_ORIGINAL)
        })
        .and_then(|(_, field)| ascii_at(field));
    original.or_else(|| {
        ifd0_entries
            .iter()
            .find(|(tag, _)| *tag == TAG_DATE_TIME)
            .and_then(|(_, field)| ascii_at(*field))
    })
}

/// `YYYY:MM:DD HH:MM:SS` → `YYYY-MM-DD`.
fn normalize_exif_date(text: &str) -> Option<String> {
    let date = text.split(' ').next()?;
    let parts: Vec<&str> = date.split(':').collect();
    match parts.as_slice() {
        [y, m, d]
            if y.len() == 4
                && m.len() == 2
                && d.len() == 2
                && parts.iter().all(|p| p.bytes().all(|b| b.is_ascii_digit())) =>
        {
            Some(format!("{y}-{m}-{d}"))
        }
        _ => None,
    }
}
