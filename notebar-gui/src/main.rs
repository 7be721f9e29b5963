//! # Note Bar - Desktop Host
//!
//! Runs the note bar analysis pipeline against the default microphone and
//! draws its output the way the small bitmap screen would: a bar graph of the
//! spectrum and the name of the note being played.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI application with dark theme
//! - **Audio Thread**: Owns the frame loop (capture, transform, analysis)
//! - **Communication**: Crossbeam channels for reports, status and control
//! - **Updates**: 60 FPS continuous updates via subscription system

mod ui;
mod widgets;

use std::thread;

use anyhow::Result;
use cpal::traits::StreamTrait;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use iced::{Element, Subscription, Theme};
use log::{error, info};
use notebar_core::audio::{self, CaptureBlock, ChannelSource, SourcePacedClock};
use notebar_core::fft::FftSpectrum;
use notebar_core::{Analyzer, AnalyzerConfig, FrameLoop, FrameReport};

use ui::main_display::create_main_view;

/// Raw samples averaged at start-up to measure the microphone bias.
const BIAS_CALIBRATION_SAMPLES: usize = 2048;

/// Capture blocks buffered between the CPAL callback and the frame loop.
const CAPTURE_QUEUE_DEPTH: usize = 64;

/// Main entry point for the Note Bar application.
pub fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("[MAIN] Starting Note Bar...");
    let result = iced::application("Note Bar", NotebarApp::update, NotebarApp::view)
        .subscription(NotebarApp::subscription)
        .theme(NotebarApp::theme)
        .run();
    info!("[MAIN] Application finished with result: {:?}", result);
    result
}

/// Application message types for the Iced GUI framework.
#[derive(Debug, Clone)]
pub enum Message {
    /// Clear the pitch and display state of the analyzer.
    ResetAnalyzer,
    /// Application exit request.
    Exit,
    /// Timer tick for real-time updates.
    Tick,
}

/// Requests the GUI sends to the audio thread.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Control {
    Reset,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AudioStatus {
    Running,
    Failed(String),
}

/// Everything the view needs to draw one frame.
#[derive(Debug, Clone)]
pub struct AppDisplayData {
    pub audio_status: AudioStatus,
    pub last_report: Option<FrameReport>,
    pub band_count: usize,
}

/// Handle to the detached audio thread.
#[derive(Debug)]
struct AudioWorker {
    control_tx: Sender<Control>,
}

#[derive(Debug)]
struct NotebarApp {
    audio_worker: Option<AudioWorker>,
    report_receiver: Receiver<FrameReport>,
    status_receiver: Receiver<String>,
    display_data: AppDisplayData,
}

impl Default for NotebarApp {
    fn default() -> Self {
        let config = AnalyzerConfig::default();
        let (report_tx, report_rx) = crossbeam_channel::unbounded();
        let (status_tx, status_rx) = crossbeam_channel::bounded(1);

        info!("[MAIN] Starting audio processing...");
        let audio_worker = start_audio_worker(config.clone(), report_tx, status_tx);

        Self {
            audio_worker: Some(audio_worker),
            report_receiver: report_rx,
            status_receiver: status_rx,
            display_data: AppDisplayData {
                audio_status: AudioStatus::Running,
                last_report: None,
                band_count: config.band_count,
            },
        }
    }
}

impl NotebarApp {
    fn update(&mut self, message: Message) {
        match message {
            Message::ResetAnalyzer => {
                info!("[MAIN] Resetting analyzer state");
                self.send_control(Control::Reset);
            }
            Message::Exit => {
                info!("[MAIN] Exit requested - stopping audio worker...");
                self.send_control(Control::Shutdown);
                // The frame loop may be blocked on a silent device; do not join it.
                self.audio_worker = None;
                std::process::exit(0);
            }
            Message::Tick => {
                // Only the newest report is drawn
                while let Ok(report) = self.report_receiver.try_recv() {
                    self.display_data.last_report = Some(report);
                }
                if let Ok(reason) = self.status_receiver.try_recv() {
                    self.display_data.audio_status = AudioStatus::Failed(reason);
                    self.display_data.last_report = None;
                }
            }
        }
    }

    fn send_control(&self, control: Control) {
        if let Some(worker) = &self.audio_worker {
            if worker.control_tx.try_send(control).is_err() {
                error!("[MAIN] Audio worker not listening for {:?}", control);
            }
        }
    }

    fn view(&self) -> Element<'_, Message> {
        create_main_view(&self.display_data)
    }

    /// Returns a timer subscription that fires every 16ms (60 FPS).
    fn subscription(&self) -> Subscription<Message> {
        iced::time::every(std::time::Duration::from_millis(16)).map(|_| Message::Tick)
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Spawns the dedicated audio thread.
///
/// The thread reports a failure reason on `status_tx` if it stops for any
/// reason other than a shutdown request.
fn start_audio_worker(
    config: AnalyzerConfig,
    report_tx: Sender<FrameReport>,
    status_tx: Sender<String>,
) -> AudioWorker {
    let (control_tx, control_rx) = crossbeam_channel::bounded(8);
    thread::spawn(move || {
        info!("[AUDIO-THREAD] Starting audio thread...");
        if let Err(e) = run_audio_loop(config, report_tx, control_rx) {
            error!("[AUDIO-THREAD] Audio loop stopped: {:#}", e);
            let _ = status_tx.try_send(format!("{:#}", e));
        }
        info!("[AUDIO-THREAD] Audio thread finished");
    });

    AudioWorker { control_tx }
}

/// Captures, analyzes and forwards frames until shut down.
fn run_audio_loop(
    config: AnalyzerConfig,
    mut report_tx: Sender<FrameReport>,
    control_rx: Receiver<Control>,
) -> Result<()> {
    let (raw_audio_tx, raw_audio_rx) = crossbeam_channel::bounded::<CaptureBlock>(CAPTURE_QUEUE_DEPTH);
    let stream = audio::start_audio_capture(raw_audio_tx, config.sample_rate)?;

    let source = ChannelSource::new(raw_audio_rx, config.adc_bias, config.adc_max());
    let provider = FftSpectrum::new(config.sample_count);
    let analyzer = Analyzer::new(config)?;
    let mut frame_loop = FrameLoop::new(source, SourcePacedClock, provider, analyzer);
    frame_loop.calibrate_bias(BIAS_CALIBRATION_SAMPLES)?;

    info!("[AUDIO-THREAD] Entering frame loop...");
    loop {
        match control_rx.try_recv() {
            Ok(Control::Reset) => frame_loop.analyzer_mut().reset(),
            Ok(Control::Shutdown) | Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {}
        }
        frame_loop.run_frame_into(&mut report_tx)?;
    }

    info!("[AUDIO-THREAD] Stopping stream...");
    stream.pause()?;
    Ok(())
}
