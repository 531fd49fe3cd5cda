//! Integration tests for timeline composition.
//!
//! Exercises cross-crate interactions between layerline-core,
//! layerline-media and layerline-timeline.

use layerline_core::{Color, FrameRate, ImageBuffer, OutputFormat, PixelFormat};
use layerline_media::{ColorReader, ImageReader, PatternReader};
use layerline_timeline::{Clip, Timeline};

use crate::support::{format, HEIGHT, RATE, WIDTH};

// ── Helpers ────────────────────────────────────────────────────

fn bars(frames: i64) -> PatternReader {
    PatternReader::new("bars", WIDTH, HEIGHT, RATE, frames)
}

fn solid(color: Color, frames: i64) -> ColorReader {
    ColorReader::new("solid", color, WIDTH, HEIGHT, RATE, frames)
}

/// Pattern base spanning two seconds plus a red still from 0.05s for 0.5s.
fn two_track_timeline() -> Timeline {
    let mut timeline = Timeline::new(format()).unwrap();
    timeline
        .add_clip(Clip::builder(bars(60)).layer(0).build().unwrap())
        .unwrap();

    let still = ImageBuffer::filled(320, 240, PixelFormat::Rgba8, Color::RED);
    let overlay = Clip::builder(ImageReader::from_image("overlay", still, RATE, 60))
        .position_seconds(0.05, RATE)
        .trim_seconds(0.0, 0.5, RATE)
        .layer(1)
        .build()
        .unwrap();
    timeline.add_clip(overlay).unwrap();
    timeline.open().unwrap();
    timeline
}

// ── Construction ───────────────────────────────────────────────

#[test]
fn constructor_keeps_output_format() {
    let timeline = Timeline::new(format()).unwrap();
    assert_eq!(timeline.format().width, 640);
    assert_eq!(timeline.format().height, 480);
    assert_eq!(timeline.format().frame_rate, FrameRate::new(30, 1));
    assert!((timeline.format().frame_rate.to_fps_f64() - 30.0).abs() < f64::EPSILON);
    assert!(!timeline.is_open());
    assert!(timeline.clips().is_empty());
}

#[test]
fn constructor_rejects_bad_formats() {
    assert!(Timeline::new(OutputFormat::new(640, 0, RATE, 48000, 2)).is_err());
    assert!(Timeline::new(OutputFormat::new(640, 480, FrameRate::new(0, 1), 48000, 2)).is_err());
    assert!(Timeline::new(OutputFormat::new(640, 480, RATE, 0, 2)).is_err());
}

#[test]
fn frames_conform_to_output_format() {
    let mut timeline = Timeline::new(format()).unwrap();
    // Source larger than the output and at another rate
    let big = PatternReader::new("big", 1920, 1080, FrameRate::FPS_24, 48);
    timeline.add_clip(Clip::builder(big).build().unwrap()).unwrap();
    timeline.open().unwrap();

    let frame = timeline.get_frame(10).unwrap();
    let image = frame.image().unwrap();
    assert_eq!((image.width(), image.height()), (WIDTH, HEIGHT));
    assert_eq!(image.format(), PixelFormat::Rgba8);
    let audio = frame.audio().unwrap();
    assert_eq!(audio.sample_rate(), 48000);
    assert_eq!(audio.channel_count(), 2);
    assert_eq!(audio.samples_per_channel(), 1600);
}

// ── Scenario ───────────────────────────────────────────────────

#[test]
fn overlay_window_uses_rounded_seconds() {
    let timeline = two_track_timeline();
    let overlay = &timeline.clips()[1];
    // 0.05s * 30 = 1.5 frames rounds down to 1; 0.5s is 15 frames
    assert_eq!(overlay.position(), 1);
    assert_eq!(overlay.duration(), 15);
    assert_eq!(timeline.duration_frames(), 60);
}

#[test]
fn base_only_before_overlay() {
    let timeline = two_track_timeline();
    let frame = timeline.get_frame(0).unwrap();
    assert_eq!(frame.image().unwrap(), &ImageBuffer::test_pattern(WIDTH, HEIGHT, 0));
}

#[test]
fn overlay_on_top_inside_window() {
    let timeline = two_track_timeline();
    for n in [1, 8, 15] {
        let frame = timeline.get_frame(n).unwrap();
        assert_eq!(frame.pixel(0, 0).unwrap(), Color::RED, "frame {}", n);
        assert_eq!(frame.pixel(HEIGHT - 1, WIDTH - 1).unwrap(), Color::RED);
        assert_eq!(frame.pixel(240, 320).unwrap(), Color::RED);
    }
}

#[test]
fn base_only_after_overlay() {
    let timeline = two_track_timeline();
    let frame = timeline.get_frame(16).unwrap();
    assert_eq!(frame.image().unwrap(), &ImageBuffer::test_pattern(WIDTH, HEIGHT, 16));
}

// ── Background and determinism ─────────────────────────────────

#[test]
fn outside_all_clips_is_background() {
    let timeline = two_track_timeline();
    let a = timeline.get_frame(200).unwrap();
    let b = timeline.get_frame(200).unwrap();
    let background = ImageBuffer::filled(WIDTH, HEIGHT, PixelFormat::Rgba8, Color::BLACK);
    assert_eq!(a.image().unwrap(), &background);
    assert_eq!(a, b);
    let audio = a.audio().unwrap();
    assert!((0..audio.samples_per_channel()).all(|i| audio.sample_f32(0, i).unwrap() == 0.0));
}

#[test]
fn repeated_requests_are_bit_identical() {
    let first = two_track_timeline();
    let second = two_track_timeline();
    for n in [0, 5, 15, 16, 59] {
        let a = first.get_frame(n).unwrap();
        let b = second.get_frame(n).unwrap();
        assert_eq!(a.image(), b.image(), "image of frame {}", n);
        assert_eq!(a.audio(), b.audio(), "audio of frame {}", n);
    }
}

#[test]
fn custom_background() {
    let mut timeline = Timeline::new(format()).unwrap();
    timeline.set_background(Color::WHITE);
    timeline.open().unwrap();
    assert_eq!(timeline.get_frame(3).unwrap().pixel(10, 10).unwrap(), Color::WHITE);
}

// ── Layering ───────────────────────────────────────────────────

#[test]
fn higher_layer_dominates_regardless_of_insertion_order() {
    let mut timeline = Timeline::new(format()).unwrap();
    let top = Clip::builder(solid(Color::GREEN, 30)).layer(5).build().unwrap();
    let bottom = Clip::builder(solid(Color::BLUE, 30)).layer(2).build().unwrap();
    timeline.add_clip(top).unwrap();
    timeline.add_clip(bottom).unwrap();
    timeline.open().unwrap();
    assert_eq!(timeline.get_frame(0).unwrap().pixel(100, 100).unwrap(), Color::GREEN);
}

#[test]
fn equal_layers_stack_in_insertion_order() {
    let mut timeline = Timeline::new(format()).unwrap();
    for color in [Color::BLUE, Color::YELLOW] {
        let clip = Clip::builder(solid(color, 30)).layer(1).build().unwrap();
        timeline.add_clip(clip).unwrap();
    }
    timeline.open().unwrap();
    assert_eq!(timeline.get_frame(0).unwrap().pixel(1, 1).unwrap(), Color::YELLOW);
}

#[test]
fn transparent_overlay_leaves_base_unchanged() {
    let mut timeline = Timeline::new(format()).unwrap();
    timeline
        .add_clip(Clip::builder(bars(30)).build().unwrap())
        .unwrap();
    let ghost = Clip::builder(solid(Color::RED, 30))
        .layer(1)
        .opacity(0.0)
        .build()
        .unwrap();
    let ghost = timeline.add_clip(ghost).unwrap();
    timeline.open().unwrap();

    let frame = timeline.get_frame(4).unwrap();
    assert_eq!(frame.image().unwrap(), &ImageBuffer::test_pattern(WIDTH, HEIGHT, 4));

    timeline.update_clip(ghost, |clip| clip.set_opacity(1.0)).unwrap();
    let frame = timeline.get_frame(4).unwrap();
    assert_eq!(frame.pixel(5, 5).unwrap(), Color::RED);
}

#[test]
fn disabled_clip_is_skipped() {
    let mut timeline = Timeline::new(format()).unwrap();
    let clip = Clip::builder(solid(Color::RED, 30)).enabled(false).build().unwrap();
    timeline.add_clip(clip).unwrap();
    timeline.open().unwrap();
    assert_eq!(timeline.get_frame(0).unwrap().pixel(0, 0).unwrap(), Color::BLACK);
}

// ── Mapping ────────────────────────────────────────────────────

#[test]
fn position_and_trim_map_to_local_frames() {
    let mut timeline = Timeline::new(format()).unwrap();
    let clip = Clip::builder(bars(100))
        .position(10)
        .trim(5, 15)
        .build()
        .unwrap();
    timeline.add_clip(clip).unwrap();
    timeline.open().unwrap();

    let black = ImageBuffer::filled(WIDTH, HEIGHT, PixelFormat::Rgba8, Color::BLACK);
    assert_eq!(timeline.get_frame(9).unwrap().image().unwrap(), &black);
    assert_eq!(
        timeline.get_frame(10).unwrap().image().unwrap(),
        &ImageBuffer::test_pattern(WIDTH, HEIGHT, 5)
    );
    assert_eq!(
        timeline.get_frame(19).unwrap().image().unwrap(),
        &ImageBuffer::test_pattern(WIDTH, HEIGHT, 14)
    );
    assert_eq!(timeline.get_frame(20).unwrap().image().unwrap(), &black);
}

#[test]
fn source_rate_is_mapped_through_time() {
    let mut timeline = Timeline::new(format()).unwrap();
    let film = PatternReader::new("film", WIDTH, HEIGHT, FrameRate::FPS_24, 48);
    let id = timeline.add_clip(Clip::builder(film).build().unwrap()).unwrap();
    // Two seconds of 24 fps source cover 60 timeline frames
    assert_eq!(timeline.clip(id).unwrap().duration(), 60);
    timeline.open().unwrap();

    // Timeline frame 5 is 1/6 s, which is source frame 4
    assert_eq!(
        timeline.get_frame(5).unwrap().image().unwrap(),
        &ImageBuffer::test_pattern(WIDTH, HEIGHT, 4)
    );
}

#[test]
fn removed_clip_no_longer_renders() {
    let mut timeline = Timeline::new(format()).unwrap();
    let id = timeline
        .add_clip(Clip::builder(solid(Color::RED, 30)).build().unwrap())
        .unwrap();
    timeline.open().unwrap();
    assert_eq!(timeline.get_frame(0).unwrap().pixel(0, 0).unwrap(), Color::RED);

    let clip = timeline.remove_clip(id).unwrap();
    assert!(!clip.is_open());
    assert_eq!(timeline.get_frame(0).unwrap().pixel(0, 0).unwrap(), Color::BLACK);
    assert_eq!(timeline.duration_frames(), 0);
}
