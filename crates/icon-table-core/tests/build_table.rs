use icon_table_core::error::IconTableError;
use icon_table_core::prelude::*;
use icon_table_core::{diff_record, parse_cpp_header, verify_table};
use image::{DynamicImage, Rgba, RgbaImage};

fn icon(w: u32, h: u32, color: [u8; 4]) -> DynamicImage {
    let mut img = RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 0]));
    for y in h / 4..h - h / 4 {
        for x in w / 4..w - w / 4 {
            img.put_pixel(x, y, Rgba(color));
        }
    }
    DynamicImage::ImageRgba8(img)
}

fn inputs() -> Vec<InputImage> {
    vec![
        InputImage::new("bug.png", icon(32, 32, [255, 255, 255, 255])),
        InputImage::new("logo.png", icon(20, 12, [200, 30, 10, 180])),
        InputImage::new("dot.png", icon(4, 4, [0, 0, 0, 255])),
    ]
}

#[test]
fn build_is_idempotent() {
    let cfg = BuildConfig::builder()
        .alpha_only(AlphaOnlyPolicy::Only(vec!["bug.png".into()]))
        .build();
    let a = build_table(&inputs(), &cfg).expect("build");
    let b = build_table(&inputs(), &cfg).expect("build");
    assert_eq!(a.table, b.table);
    assert_eq!(to_cpp_header(&a.table), to_cpp_header(&b.table));
}

#[test]
fn duplicate_name_aborts_build() {
    let mut list = inputs();
    list.push(InputImage::new("dot.png", icon(8, 8, [1, 2, 3, 4])));
    match build_table(&list, &BuildConfig::default()) {
        Err(IconTableError::DuplicateName(name)) => assert_eq!(name, "dot.png"),
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("duplicate name must not produce a table"),
    }
}

#[test]
fn failing_image_is_skipped() {
    let mut list = inputs();
    list.push(InputImage::new("empty.png", DynamicImage::new_rgba8(0, 0)));
    let out = build_table(&list, &BuildConfig::default()).expect("build");
    assert_eq!(out.table.len(), 3);
    assert_eq!(out.failures.len(), 1);
    assert_eq!(out.failures[0].name, "empty.png");
    assert!(matches!(
        out.failures[0].error,
        IconTableError::EmptyImage { .. }
    ));
}

#[test]
fn resize_applies_to_every_image() {
    let cfg = BuildConfig::builder().resize(16, 16).build();
    let out = build_table(&inputs(), &cfg).expect("build");
    assert!(out.table.records().all(|r| (r.width, r.height) == (16, 16)));
}

#[test]
fn only_allowlisted_images_drop_colour() {
    let cfg = BuildConfig::builder()
        .alpha_only(AlphaOnlyPolicy::Only(vec!["bug.png".into()]))
        .allow_raw_container(false)
        .build();
    let out = build_table(&inputs(), &cfg).expect("build");
    assert!(out.table.lookup("bug.png").expect("bug").alpha_only);
    assert!(!out.table.lookup("logo.png").expect("logo").alpha_only);
    assert!(!out.table.lookup("dot.png").expect("dot").alpha_only);
}

#[test]
fn verify_decodes_every_record() {
    let cfg = BuildConfig::builder().alpha_only(AlphaOnlyPolicy::All).build();
    let list = inputs();
    let out = build_table(&list, &cfg).expect("build");
    let verified = verify_table(&out.table).expect("verify");
    assert_eq!(verified.len(), 3);
    for v in &verified {
        let rec = out.table.lookup(&v.name).expect("record");
        assert_eq!(v.image.dimensions(), (rec.width, rec.height));
    }

    // bug.png is white, so alpha-only loses nothing
    let bug = list.iter().find(|i| i.name == "bug.png").expect("bug");
    let report = diff_record(
        out.table.lookup("bug.png").expect("record"),
        &PixelBuffer::from_image(&bug.image),
    )
    .expect("diff");
    assert!(report.is_identical(), "{}", report);
}

#[test]
fn header_round_trips_through_import() {
    let out = build_table(&inputs(), &BuildConfig::default()).expect("build");
    let header = to_cpp_header(&out.table);
    let back = parse_cpp_header(&header).expect("parse");
    assert_eq!(back, out.table);
    for rec in back.records() {
        decode_record(rec).expect("decode");
    }
}

#[test]
fn stats_reflect_table() {
    let out = build_table(&inputs(), &BuildConfig::default()).expect("build");
    let s = out.stats();
    assert_eq!(s.num_images, 3);
    assert_eq!(s.num_raw_container + s.num_alpha_rle + s.num_full_rle, 3);
    assert_eq!(s.decoded_bytes, (32 * 32 + 20 * 12 + 4 * 4) * 4);
    assert!(s.summary().contains("Images: 3"));
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_matches_sequential() {
    let seq = build_table(&inputs(), &BuildConfig::default()).expect("build");
    let cfg = BuildConfig::builder().parallel(true).threads(Some(2)).build();
    let par = build_table(&inputs(), &cfg).expect("build");
    assert_eq!(seq.table, par.table);
}

#[test]
fn jpeg_source_bytes_never_stored_as_png() {
    let gradient = image::RgbImage::from_fn(32, 32, |x, y| {
        image::Rgb([(x * 8) as u8, (y * 8) as u8, ((x + y) * 4) as u8])
    });
    let mut jpg = Vec::new();
    DynamicImage::ImageRgb8(gradient)
        .write_to(&mut std::io::Cursor::new(&mut jpg), image::ImageFormat::Jpeg)
        .expect("encode jpeg");
    let decoded = image::load_from_memory(&jpg).expect("decode jpeg");
    let list = vec![InputImage::new("gradient.jpg", decoded).with_source(jpg.clone())];

    let out = build_table(&list, &BuildConfig::default()).expect("build");
    let rec = out.table.lookup("gradient.jpg").expect("record");
    assert!(!(rec.is_raw_png && rec.data.starts_with(&[0xFF, 0xD8])));

    let cfg = BuildConfig::builder().force_raw_container(true).build();
    let out = build_table(&list, &cfg).expect("build");
    let rec = out.table.lookup("gradient.jpg").expect("record");
    assert!(rec.is_raw_png);
    assert!(rec.data.starts_with(b"\x89PNG\r\n\x1a\n"));
    assert_ne!(rec.data, jpg);
}
