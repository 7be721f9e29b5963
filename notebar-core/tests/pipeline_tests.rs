use notebar_core::audio::{SourcePacedClock, ToneSource};
use notebar_core::fft::FftSpectrum;
use notebar_core::{Analyzer, AnalyzerConfig, Display, FrameLoop};

fn tone_loop(frequency_hz: f32, amplitude: f32) -> FrameLoop<ToneSource, SourcePacedClock, FftSpectrum> {
    let config = AnalyzerConfig::default();
    let source = ToneSource::new(
        frequency_hz,
        amplitude,
        config.sample_rate,
        config.adc_bias,
        config.adc_max(),
    );
    let provider = FftSpectrum::new(config.sample_count);
    let analyzer = Analyzer::new(config).unwrap();
    FrameLoop::new(source, SourcePacedClock, provider, analyzer)
}

#[test]
fn steady_tone_on_a_bin_becomes_note_a() {
    let mut frame_loop = tone_loop(437.5, 400.0);

    let first = frame_loop.run_frame().unwrap();
    assert!(first.confident);
    assert_eq!(first.peak.bin, 14);
    assert!(first.pitch.is_none());

    let mut last = first;
    for _ in 0..5 {
        last = frame_loop.run_frame().unwrap();
    }
    let pitch = last.pitch.expect("steady tone should produce a note");
    assert_eq!(pitch.name(), "A");
    assert!((pitch.frequency_hz - 437.5).abs() < 1.0, "got {}", pitch.frequency_hz);
    assert!(!last.display.is_quiet());
}

#[test]
fn tone_between_bins_is_refined() {
    // Middle C sits at bin ~8.37
    let mut frame_loop = tone_loop(261.63, 400.0);
    let mut last = frame_loop.run_frame().unwrap();
    for _ in 0..5 {
        last = frame_loop.run_frame().unwrap();
    }
    assert!((last.peak.frequency_hz - 261.63).abs() < 8.0, "got {}", last.peak.frequency_hz);
    assert_eq!(last.pitch.map(|p| p.name()), Some("C"));
}

#[test]
fn silence_blanks_display_and_never_tracks() {
    let mut frame_loop = tone_loop(0.0, 0.0);
    for _ in 0..10 {
        let report = frame_loop.run_frame().unwrap();
        assert_eq!(report.display, Display::Quiet);
        assert!(!report.confident);
        assert!(report.pitch.is_none());
    }
    assert_eq!(frame_loop.analyzer().normalizer().max_reference(), 1.0);
}

#[test]
fn note_survives_short_dropout_then_clears() {
    let mut frame_loop = tone_loop(437.5, 400.0);
    for _ in 0..5 {
        frame_loop.run_frame().unwrap();
    }
    let hold_frames = frame_loop.analyzer().config().hold_frames;

    frame_loop.source_mut().set_amplitude(0.0);
    for _ in 0..hold_frames - 1 {
        let report = frame_loop.run_frame().unwrap();
        assert!(!report.confident);
        assert_eq!(report.pitch.map(|p| p.name()), Some("A"));
    }
    let report = frame_loop.run_frame().unwrap();
    assert!(report.pitch.is_none());
    assert!(!frame_loop.analyzer().tracker().is_tracking());
}

#[test]
fn quiet_stretch_freezes_display_reference() {
    let mut frame_loop = tone_loop(437.5, 400.0);
    for _ in 0..3 {
        frame_loop.run_frame().unwrap();
    }
    let reference = frame_loop.analyzer().normalizer().max_reference();
    assert!(reference > 1.0);

    frame_loop.source_mut().set_amplitude(0.0);
    for _ in 0..20 {
        frame_loop.run_frame().unwrap();
        assert_eq!(frame_loop.analyzer().normalizer().max_reference(), reference);
    }
}

#[test]
fn note_follows_a_change_of_tone() {
    let mut frame_loop = tone_loop(437.5, 400.0);
    for _ in 0..5 {
        frame_loop.run_frame().unwrap();
    }
    frame_loop.source_mut().set_frequency(261.63);

    let mut last = None;
    for _ in 0..40 {
        last = frame_loop.run_frame().unwrap().pitch;
    }
    assert_eq!(last.map(|p| p.name()), Some("C"));
}

#[test]
fn reports_reach_a_channel_renderer() {
    let mut frame_loop = tone_loop(437.5, 400.0);
    let (mut tx, rx) = crossbeam_channel::unbounded();

    let report = frame_loop.run_frame_into(&mut tx).unwrap();
    assert_eq!(rx.try_recv().unwrap(), report);

    drop(rx);
    assert!(frame_loop.run_frame_into(&mut tx).is_err());
}

#[test]
fn bias_calibration_on_idle_input_matches_nominal() {
    let mut frame_loop = tone_loop(0.0, 0.0);
    let bias = frame_loop.calibrate_bias(512).unwrap();
    assert_eq!(bias, 2048.0);
    assert_eq!(frame_loop.bias(), 2048.0);
}
