//! Integration tests for image conforming and blending.
//!
//! Exercises layerline-raster with readers from layerline-media.

use layerline_core::{Color, FrameRate, ImageBuffer, OutputFormat, PixelFormat};
use layerline_media::{ColorReader, ImageReader};
use layerline_raster::{blend_over, conform, ScaleMode};
use layerline_timeline::{Clip, Timeline};
use std::borrow::Cow;

const RATE: FrameRate = FrameRate::FPS_24;

fn timeline(width: u32, height: u32, pixel_format: PixelFormat) -> Timeline {
    let format = OutputFormat::new(width, height, RATE, 48000, 2).with_pixel_format(pixel_format);
    Timeline::new(format).unwrap()
}

#[test]
fn png_overlay_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logo.png");
    let mut logo = image::RgbaImage::from_pixel(8, 8, image::Rgba([0, 0, 255, 255]));
    logo.put_pixel(0, 0, image::Rgba([0, 0, 0, 0]));
    logo.save(&path).unwrap();

    let mut timeline = timeline(8, 8, PixelFormat::Rgba8);
    timeline.set_background(Color::WHITE);
    let clip = Clip::builder(ImageReader::open_path(&path, RATE, 24)).build().unwrap();
    timeline.add_clip(clip).unwrap();
    timeline.open().unwrap();

    let frame = timeline.get_frame(12).unwrap();
    // Transparent logo pixel shows the background
    assert_eq!(frame.pixel(0, 0).unwrap(), Color::WHITE);
    assert_eq!(frame.pixel(4, 4).unwrap(), Color::BLUE);
}

#[test]
fn missing_image_fails_open() {
    let dir = tempfile::tempdir().unwrap();
    let mut timeline = timeline(8, 8, PixelFormat::Rgba8);
    let reader = ImageReader::open_path(dir.path().join("absent.png"), RATE, 24);
    timeline.add_clip(Clip::builder(reader).build().unwrap()).unwrap();
    assert!(timeline.open().is_err());
    assert!(timeline.get_frame(0).unwrap_err().is_not_open());
}

#[test]
fn sixteen_bit_output() {
    let mut timeline = timeline(16, 16, PixelFormat::Rgba16);
    let half = Color::new(0.25, 0.5, 0.75, 1.0);
    timeline
        .add_clip(
            Clip::builder(ColorReader::new("half", half, 16, 16, RATE, 10))
                .build()
                .unwrap(),
        )
        .unwrap();
    timeline.open().unwrap();

    let frame = timeline.get_frame(0).unwrap();
    let image = frame.image().unwrap();
    assert_eq!(image.format(), PixelFormat::Rgba16);
    // Precision is limited by the 8-bit source frame
    let [r, g, b, a] = half.to_rgba8();
    let expected = Color::from_rgba8(r, g, b, a).to_rgba16();
    assert_eq!(image.pixel(3, 3).unwrap().to_rgba16(), expected);
}

#[test]
fn gray_source_is_converted() {
    let raw: Vec<u8> = (0..16).map(|i| i * 16).collect();
    let gray = ImageBuffer::from_raw(4, 4, PixelFormat::Gray8, &raw).unwrap();
    let mut timeline = timeline(4, 4, PixelFormat::Rgba8);
    let clip = Clip::builder(ImageReader::from_image("gray", gray, RATE, 1)).build().unwrap();
    timeline.add_clip(clip).unwrap();
    timeline.open().unwrap();

    let frame = timeline.get_frame(0).unwrap();
    assert_eq!(frame.pixel(1, 2).unwrap().to_rgba8(), [96, 96, 96, 255]);
}

#[test]
fn native_scale_crops_large_source() {
    let mut source = ImageBuffer::filled(12, 12, PixelFormat::Rgba8, Color::RED);
    source.set_pixel(4, 4, Color::GREEN).unwrap();
    let mut timeline = timeline(4, 4, PixelFormat::Rgba8);
    let clip = Clip::builder(ImageReader::from_image("big", source, RATE, 1))
        .scale(ScaleMode::None)
        .build()
        .unwrap();
    timeline.add_clip(clip).unwrap();
    timeline.open().unwrap();

    // The canvas shows source pixels 4..8 in both axes
    let frame = timeline.get_frame(0).unwrap();
    assert_eq!(frame.pixel(0, 0).unwrap(), Color::GREEN);
    assert_eq!(frame.pixel(3, 3).unwrap(), Color::RED);
}

#[test]
fn stretch_fills_canvas() {
    let source = ImageBuffer::filled(2, 6, PixelFormat::Rgba8, Color::YELLOW);
    let mut timeline = timeline(10, 5, PixelFormat::Rgba8);
    let clip = Clip::builder(ImageReader::from_image("tall", source, RATE, 1))
        .scale(ScaleMode::Stretch)
        .build()
        .unwrap();
    timeline.add_clip(clip).unwrap();
    timeline.open().unwrap();

    let frame = timeline.get_frame(0).unwrap();
    assert_eq!(frame.pixel(0, 0).unwrap(), Color::YELLOW);
    assert_eq!(frame.pixel(4, 9).unwrap(), Color::YELLOW);
}

#[test]
fn conforming_never_touches_the_source() {
    let source = ImageBuffer::test_pattern(16, 4, 3);
    let copy = source.clone();
    assert!(matches!(
        conform(&source, 16, 4, PixelFormat::Rgba8, ScaleMode::Fit),
        Cow::Borrowed(_)
    ));
    let scaled = conform(&source, 32, 8, PixelFormat::Rgba16, ScaleMode::Fit);
    assert_eq!((scaled.width(), scaled.height()), (32, 8));

    let mut canvas = ImageBuffer::filled(16, 4, PixelFormat::Rgba8, Color::BLACK);
    blend_over(&mut canvas, &source, 0.5).unwrap();
    assert_eq!(source, copy);
}
