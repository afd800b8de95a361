mod common;

use std::io::Cursor;

use image::{DynamicImage, GenericImageView};
use photo_report::{
    LayoutKind, LayoutStyle, ReportContext, capture_date, compress_image, crop_to_ratio,
    load_image, output_file_name, resize_with_padding,
};

/// Little-endian TIFF block with a single IFD0 DateTime entry.
fn exif_with_date(date: &str) -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&8u32.to_le_bytes());
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x0132u16.to_le_bytes());
    tiff.extend_from_slice(&2u16.to_le_bytes());
    tiff.extend_from_slice(&20u32.to_le_bytes());
    tiff.extend_from_slice(&26u32.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());
    tiff.extend_from_slice(date.as_bytes());
    tiff.push(0);
    tiff
}

/// A JPEG with an APP1 Exif segment spliced in after SOI.
fn jpeg_with_exif(date: &str) -> Vec<u8> {
    let jpeg = compress_image(&common::solid_image(16, 16), 1600, 90)
        .unwrap()
        .data;
    let mut payload = b"Exif\0\0".to_vec();
    payload.extend(exif_with_date(date));
    let len = (payload.len() + 2) as u16;

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend(payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

#[test]
fn compression_bounds_long_side_and_never_enlarges() {
    let _ = env_logger::try_init();
    println!("{:>11} -> {:>11} {:>8}", "input", "output", "bytes");
    for (w, h, expected) in [
        (3200, 1600, (1600, 800)),
        (1200, 2400, (800, 1600)),
        (100, 50, (100, 50)),
    ] {
        let out = compress_image(&common::solid_image(w, h), 1600, 85).unwrap();
        println!(
            "{:>11} -> {:>11} {:>8}",
            format!("{w}x{h}"),
            format!("{}x{}", out.width, out.height),
            out.data.len()
        );
        assert_eq!((out.width, out.height), expected);
        assert_eq!(&out.data[..2], &[0xFF, 0xD8], "JPEG SOI");
        let decoded = image::load_from_memory(&out.data).unwrap();
        assert_eq!(decoded.dimensions(), expected);
    }
}

#[test]
fn transparent_png_is_flattened() {
    let rgba = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
        10,
        10,
        image::Rgba([255, 0, 0, 0]),
    ));
    let out = compress_image(&rgba, 1600, 85).unwrap();
    let decoded = image::load_from_memory(&out.data).unwrap();
    assert_eq!(decoded.color(), image::ColorType::Rgb8);
}

#[test]
fn padding_letterboxes_onto_white() {
    let wide = common::solid_image(200, 100);
    let canvas = resize_with_padding(&wide, 1.0);
    assert_eq!(canvas.dimensions(), (1000, 1000));
    assert_eq!(canvas.get_pixel(500, 10).0, [255, 255, 255]);
    assert_ne!(canvas.get_pixel(500, 500).0, [255, 255, 255]);

    let tall = common::solid_image(100, 400);
    let canvas = resize_with_padding(&tall, 2.0);
    assert_eq!(canvas.dimensions(), (1000, 500));
    assert_eq!(canvas.get_pixel(5, 250).0, [255, 255, 255]);
    assert_ne!(canvas.get_pixel(500, 250).0, [255, 255, 255]);
}

#[test]
fn crop_centers_on_target_ratio() {
    let img = common::solid_image(400, 300);
    assert_eq!(crop_to_ratio(&img, 1.0).dimensions(), (300, 300));
    assert_eq!(crop_to_ratio(&img, 2.0).dimensions(), (400, 200));
}

#[test]
fn load_image_reads_png_and_jpeg() {
    let png = load_image(&common::png_bytes(30, 20)).unwrap();
    assert_eq!(png.dimensions(), (30, 20));

    let mut jpeg = Cursor::new(Vec::new());
    common::solid_image(12, 24)
        .write_to(&mut jpeg, image::ImageFormat::Jpeg)
        .unwrap();
    let jpeg = load_image(jpeg.get_ref()).unwrap();
    assert_eq!(jpeg.dimensions(), (12, 24));
}

#[test]
fn capture_date_comes_from_exif() {
    let _ = env_logger::try_init();
    let data = jpeg_with_exif("2023:05:06 07:08:09");
    assert_eq!(capture_date(&data).as_deref(), Some("2023-05-06"));
    assert_eq!(load_image(&data).unwrap().dimensions(), (16, 16));

    assert_eq!(capture_date(&jpeg_with_exif("not a date at all!!")), None);
    assert_eq!(capture_date(&common::png_bytes(4, 4)), None);
}

#[test]
fn layout_selection() {
    assert_eq!(LayoutKind::detect("A4_左右_範本.docx"), LayoutKind::SideBySide);
    assert_eq!(LayoutKind::detect("A4_SideBySide.docx"), LayoutKind::SideBySide);
    assert_eq!(LayoutKind::detect("A4_Vertical.docx"), LayoutKind::Vertical);
    assert_eq!("side-by-side".parse::<LayoutKind>(), Ok(LayoutKind::SideBySide));
    assert_eq!("A4_Vertical".parse::<LayoutKind>(), Ok(LayoutKind::Vertical));
    assert!("landscape".parse::<LayoutKind>().is_err());

    assert_eq!(LayoutKind::SideBySide.style(), LayoutStyle::side_by_side());
    for style in [LayoutStyle::vertical(), LayoutStyle::side_by_side()] {
        assert!(style.validate().is_ok());
        assert_eq!(style.suffix_mode, style.uses_suffix());
    }
}

#[test]
fn output_name_falls_back_when_incomplete() {
    let mut context = ReportContext {
        subject: "竊盜案".into(),
        date: "2024-05-01".into(),
        ..Default::default()
    };
    assert_eq!(output_file_name(&context), "竊盜案_2024-05-01.docx");
    context.date = "  ".into();
    assert_eq!(output_file_name(&context), "photo_report.docx");
    context.date = "2024-05-01".into();
    context.subject.clear();
    assert_eq!(output_file_name(&context), "photo_report.docx");
}
