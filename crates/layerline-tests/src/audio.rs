//! Integration tests for the audio path.
//!
//! Exercises layerline-audio through timeline composition.

use layerline_audio::Mixer;
use layerline_core::{FrameRate, OutputFormat, SampleData, SampleFormat};
use layerline_media::{PatternReader, Tone, ToneReader};
use layerline_timeline::{Clip, Timeline};

fn tone_timeline(format: OutputFormat, tones: &[(Tone, f32)]) -> Timeline {
    let mut timeline = Timeline::new(format).unwrap();
    for (i, (tone, volume)) in tones.iter().enumerate() {
        let reader = ToneReader::new(format!("tone-{}", i), *tone, format.frame_rate, 300);
        let clip = Clip::builder(reader).volume(*volume).build().unwrap();
        timeline.add_clip(clip).unwrap();
    }
    timeline.open().unwrap();
    timeline
}

fn i16_samples(timeline: &Timeline, frame: i64, channel: usize) -> Vec<i16> {
    match timeline.get_frame(frame).unwrap().audio().unwrap().data() {
        SampleData::I16(ch) => ch[channel].clone(),
        SampleData::F32(_) => panic!("expected 16-bit audio"),
    }
}

#[test]
fn fractional_rates_distribute_samples_exactly() {
    let format = OutputFormat::new(64, 36, FrameRate::FPS_29_97, 44100, 2);
    let timeline = tone_timeline(format, &[]);
    let total: usize = (0..300)
        .map(|n| timeline.get_frame(n).unwrap().audio().unwrap().samples_per_channel())
        .sum();
    // 300 frames at 30000/1001 fps last 10.01 s
    assert_eq!(total, 441_441);
}

#[test]
fn mono_source_feeds_both_output_channels() {
    let format = OutputFormat::new(64, 36, FrameRate::FPS_30, 48000, 2);
    let timeline = tone_timeline(format, &[(Tone::new(440.0, 0.5, 48000, 1), 1.0)]);
    let frame = timeline.get_frame(2).unwrap();
    let audio = frame.audio().unwrap();
    assert_eq!(audio.channel_f32(0).unwrap(), audio.channel_f32(1).unwrap());
    assert!(audio.channel_f32(0).unwrap().iter().any(|s| s.abs() > 0.1));
}

#[test]
fn resampled_source_fills_the_frame() {
    let format = OutputFormat::new(64, 36, FrameRate::FPS_25, 48000, 2);
    let timeline = tone_timeline(format, &[(Tone::new(220.0, 0.5, 22050, 2), 1.0)]);
    let frame = timeline.get_frame(0).unwrap();
    let audio = frame.audio().unwrap();
    assert_eq!(audio.sample_rate(), 48000);
    assert_eq!(audio.samples_per_channel(), 1920);
    // The 22.05 kHz block spans the whole frame after resampling
    let tail = audio.channel_f32(0).unwrap()[1800..].to_vec();
    assert!(tail.iter().any(|s| s.abs() > 0.05));
}

#[test]
fn slower_source_joins_seamlessly() {
    let format = OutputFormat::new(64, 36, FrameRate::FPS_30, 48000, 1);
    let tone = Tone::new(440.0, 0.8, 48000, 1);
    let mut timeline = Timeline::new(format).unwrap();
    let reader = ToneReader::new("film-tone", tone, FrameRate::FPS_24, 48);
    timeline.add_clip(Clip::builder(reader).build().unwrap()).unwrap();
    timeline.open().unwrap();

    let joined: Vec<f32> = (0..10)
        .flat_map(|n| timeline.get_frame(n).unwrap().audio().unwrap().channel_f32(0).unwrap())
        .collect();
    let expected: Vec<f32> = (0..10)
        .flat_map(|n| tone.block(n, FrameRate::FPS_30).unwrap().channel_f32(0).unwrap())
        .collect();
    assert_eq!(joined.len(), 16_000);
    assert_eq!(joined, expected);
}

#[test]
fn faster_source_with_video_keeps_audio_continuous() {
    let format = OutputFormat::new(64, 36, FrameRate::FPS_24, 48000, 2);
    let tone = Tone::new(330.0, 0.5, 48000, 2);
    let mut timeline = Timeline::new(format).unwrap();
    let reader = PatternReader::new("bars", 64, 36, FrameRate::FPS_30, 60).with_tone(tone);
    timeline.add_clip(Clip::builder(reader).build().unwrap()).unwrap();
    timeline.open().unwrap();

    // Frames requested out of order still line up by sample time
    for n in [7, 0, 3, 12, 1] {
        let frame = timeline.get_frame(n).unwrap();
        let expected = tone.block(n, FrameRate::FPS_24).unwrap();
        assert_eq!(frame.audio().unwrap(), &expected, "frame {}", n);
    }
}

#[test]
fn sources_are_summed_not_averaged() {
    let format = OutputFormat::new(64, 36, FrameRate::FPS_24, 48000, 1);
    let tone = Tone::new(300.0, 0.3, 48000, 1);
    let single = tone_timeline(format, &[(tone, 1.0)]);
    let double = tone_timeline(format, &[(tone, 1.0), (tone, 1.0)]);
    let a = single.get_frame(4).unwrap();
    let b = double.get_frame(4).unwrap();
    let (a, b) = (a.audio().unwrap(), b.audio().unwrap());
    for i in (0..2000).step_by(97) {
        let expected = 2.0 * a.sample_f32(0, i).unwrap();
        assert!((b.sample_f32(0, i).unwrap() - expected).abs() < 1e-6);
    }
}

#[test]
fn sixteen_bit_mix_saturates() {
    let format = OutputFormat::new(64, 36, FrameRate::FPS_24, 48000, 1)
        .with_sample_format(SampleFormat::I16);
    let tone = Tone::new(100.0, 0.9, 48000, 1);
    let single = tone_timeline(format, &[(tone, 1.0)]);
    let double = tone_timeline(format, &[(tone, 1.0), (tone, 1.0)]);

    let once = i16_samples(&single, 1, 0);
    let twice = i16_samples(&double, 1, 0);
    for (s, d) in once.iter().zip(&twice) {
        assert_eq!(*d, s.saturating_add(*s));
    }
    assert!(twice.contains(&i16::MAX));
    assert!(twice.contains(&i16::MIN));
}

#[test]
fn muted_clip_contributes_silence() {
    let format = OutputFormat::new(64, 36, FrameRate::FPS_30, 48000, 2);
    let timeline = tone_timeline(format, &[(Tone::new(440.0, 0.5, 48000, 2), 0.0)]);
    let frame = timeline.get_frame(0).unwrap();
    assert!(frame
        .audio()
        .unwrap()
        .channel_f32(1)
        .unwrap()
        .iter()
        .all(|s| *s == 0.0));
}

#[test]
fn timeline_mix_matches_direct_mixer() {
    let format = OutputFormat::new(64, 36, FrameRate::FPS_25, 48000, 2);
    let low = Tone::new(110.0, 0.4, 48000, 1);
    let high = Tone::new(880.0, 0.2, 44100, 2);
    let timeline = tone_timeline(format, &[(low, 0.5), (high, 0.8)]);

    let mut mixer = Mixer::new(48000, 2, 1920, SampleFormat::F32);
    mixer.add(&low.block(7, format.frame_rate).unwrap(), 0.5).unwrap();
    mixer.add(&high.block(7, format.frame_rate).unwrap(), 0.8).unwrap();
    assert_eq!(mixer.source_count(), 2);
    let expected = mixer.finish();

    let frame = timeline.get_frame(7).unwrap();
    assert_eq!(frame.audio().unwrap(), &expected);
}
