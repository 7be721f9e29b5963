//! # Audio Acquisition Module
//!
//! Sample sources, frame pacing and frame acquisition for the analysis loop.
//!
//! ## Features
//! - `SampleSource`: one converter code per call, biased around the ADC midpoint
//! - `ChannelSource`: CPAL input stream delivered over a crossbeam channel
//! - `ToneSource`: deterministic sine generator for tests and demos
//! - `FrameClock`: blocking wait-for-next-sample contract with jitter accounting
//! - Start-up bias calibration

use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SupportedStreamConfigRange;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, info, warn};

use crate::error::AnalyzerError;

/// Yields raw converter codes one at a time.
pub trait SampleSource {
    /// Next code in `0..=adc_max`, or `None` once the source has closed.
    fn read_sample(&mut self) -> Option<u16>;

    /// Whether samples were lost just before the last one read.
    ///
    /// Clears the flag. Sources that never drop samples keep the default.
    fn take_gap(&mut self) -> bool {
        false
    }
}

/// Paces acquisition at the sample rate.
pub trait FrameClock {
    /// Blocks until the next sample is due.
    fn wait_for_tick(&mut self);
}

/// Converts a float sample in `[-1, 1]` to a converter code around `bias`.
fn to_adc_code(sample: f32, bias: u16, adc_max: u16) -> u16 {
    let code = bias as f32 + sample * bias as f32;
    code.round().clamp(0.0, adc_max as f32) as u16
}

/// One capture callback's worth of mono samples.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CaptureBlock {
    pub samples: Vec<f32>,
    /// Set when one or more earlier blocks were dropped before this one.
    pub after_gap: bool,
}

/// Sample source fed by blocks of float samples over a channel.
///
/// Reading blocks until the next block arrives, so the source paces itself at
/// the rate of whatever fills the channel.
pub struct ChannelSource {
    receiver: Receiver<CaptureBlock>,
    block: CaptureBlock,
    position: usize,
    gap: bool,
    bias: u16,
    adc_max: u16,
}

impl ChannelSource {
    pub fn new(receiver: Receiver<CaptureBlock>, bias: u16, adc_max: u16) -> Self {
        Self {
            receiver,
            block: CaptureBlock::default(),
            position: 0,
            gap: false,
            bias,
            adc_max,
        }
    }
}

impl SampleSource for ChannelSource {
    fn read_sample(&mut self) -> Option<u16> {
        while self.position >= self.block.samples.len() {
            self.block = self.receiver.recv().ok()?;
            self.position = 0;
            self.gap |= self.block.after_gap;
        }
        let sample = self.block.samples[self.position];
        self.position += 1;
        Some(to_adc_code(sample, self.bias, self.adc_max))
    }

    fn take_gap(&mut self) -> bool {
        std::mem::take(&mut self.gap)
    }
}

/// Endless sine wave around the converter bias.
#[derive(Debug, Clone)]
pub struct ToneSource {
    frequency_hz: f32,
    amplitude: f32,
    sample_rate: u32,
    bias: u16,
    adc_max: u16,
    index: u64,
}

impl ToneSource {
    /// # Arguments
    /// * `frequency_hz` - Tone frequency
    /// * `amplitude` - Peak deviation from the bias, in converter codes
    /// * `sample_rate` - Rate the samples are meant to be played at
    /// * `bias` / `adc_max` - Converter midpoint and full-scale code
    pub fn new(frequency_hz: f32, amplitude: f32, sample_rate: u32, bias: u16, adc_max: u16) -> Self {
        Self {
            frequency_hz,
            amplitude,
            sample_rate,
            bias,
            adc_max,
            index: 0,
        }
    }

    /// A source that only ever reports the bias.
    pub fn silence(sample_rate: u32, bias: u16, adc_max: u16) -> Self {
        Self::new(0.0, 0.0, sample_rate, bias, adc_max)
    }

    pub fn set_frequency(&mut self, frequency_hz: f32) {
        self.frequency_hz = frequency_hz;
    }

    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = amplitude;
    }
}

impl SampleSource for ToneSource {
    fn read_sample(&mut self) -> Option<u16> {
        let t = self.index as f64 / self.sample_rate as f64;
        self.index += 1;
        let value = self.amplitude as f64
            * (2.0 * std::f64::consts::PI * self.frequency_hz as f64 * t).sin();
        let code = (self.bias as f64 + value).round().clamp(0.0, self.adc_max as f64);
        Some(code as u16)
    }
}

/// Clock for sources that already block at the hardware rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourcePacedClock;

impl FrameClock for SourcePacedClock {
    fn wait_for_tick(&mut self) {}
}

/// Busy-waits on `Instant` deadlines spaced one sample period apart.
///
/// Ticks that arrive later than the tolerance are counted as overruns. When
/// the clock falls more than a full period behind it resynchronises instead
/// of bursting to catch up.
#[derive(Debug)]
pub struct IntervalClock {
    period: Duration,
    tolerance: Duration,
    next_tick: Option<Instant>,
    overruns: u64,
}

impl IntervalClock {
    pub fn new(sample_rate: u32, tolerance_us: u64) -> Self {
        Self {
            period: Duration::from_secs_f64(1.0 / sample_rate as f64),
            tolerance: Duration::from_micros(tolerance_us),
            next_tick: None,
            overruns: 0,
        }
    }

    /// Ticks that arrived later than the jitter tolerance.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }
}

impl FrameClock for IntervalClock {
    fn wait_for_tick(&mut self) {
        let deadline = match self.next_tick {
            Some(deadline) => deadline,
            None => {
                let now = Instant::now();
                self.next_tick = Some(now + self.period);
                return;
            }
        };

        while Instant::now() < deadline {
            std::hint::spin_loop();
        }

        let now = Instant::now();
        let lateness = now - deadline;
        if lateness > self.tolerance {
            self.overruns += 1;
            if self.overruns.is_power_of_two() {
                warn!(
                    "sample tick {:?} late ({} overruns so far); pitch estimates may drift",
                    lateness, self.overruns
                );
            }
        }

        self.next_tick = Some(if lateness > self.period {
            now + self.period
        } else {
            deadline + self.period
        });
    }
}

/// Fills `out` with one frame of bias-free samples.
///
/// Waits on `clock` before every read. If the source reports lost samples the
/// frame starts over, so a frame never spans a gap.
///
/// # Returns
/// * `Err(AnalyzerError::SourceClosed)` - The source ran dry mid-frame
pub fn acquire_frame<S, C>(
    source: &mut S,
    clock: &mut C,
    bias: f32,
    out: &mut [f32],
) -> Result<(), AnalyzerError>
where
    S: SampleSource + ?Sized,
    C: FrameClock + ?Sized,
{
    let mut filled = 0;
    while filled < out.len() {
        clock.wait_for_tick();
        let raw = source.read_sample().ok_or(AnalyzerError::SourceClosed)?;
        if source.take_gap() && filled > 0 {
            debug!("capture gap after {} samples, restarting frame", filled);
            filled = 0;
        }
        out[filled] = raw as f32 - bias;
        filled += 1;
    }
    Ok(())
}

/// Measures the DC bias of a source by averaging `count` raw samples.
///
/// Meant to run once at start-up while the input is quiet.
pub fn estimate_bias<S>(source: &mut S, count: usize) -> Result<f32, AnalyzerError>
where
    S: SampleSource + ?Sized,
{
    if count == 0 {
        return Err(AnalyzerError::InvalidConfig(
            "bias calibration needs at least one sample".to_string(),
        ));
    }
    let mut sum = 0.0f64;
    for _ in 0..count {
        sum += source.read_sample().ok_or(AnalyzerError::SourceClosed)? as f64;
    }
    let bias = (sum / count as f64) as f32;
    info!("estimated DC bias {:.1} from {} samples", bias, count);
    Ok(bias)
}

/// Starts audio capture from the default input device.
///
/// Only the first channel is kept. Each callback's samples go out as one
/// block on `sender`. Blocks are dropped if the channel is full, and the next
/// block that gets through is flagged with `after_gap`.
///
/// # Arguments
/// * `sender` - Channel sender for streaming sample blocks to the analysis loop
/// * `sample_rate` - Required capture rate in Hz
///
/// # Returns
/// * `Ok(stream)` - Running stream; capture stops when it is dropped
/// * `Err(e)` - No device, or no f32 input configuration covers `sample_rate`
pub fn start_audio_capture(sender: Sender<CaptureBlock>, sample_rate: u32) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    info!("Using audio input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, sample_rate)
        .ok_or_else(|| anyhow!("No f32 input format supports {} Hz", sample_rate))?;

    let config: cpal::StreamConfig = supported_config
        .with_sample_rate(cpal::SampleRate(sample_rate))
        .into();
    let channels = config.channels.max(1) as usize;

    info!("Capturing {} channel(s) at {} Hz", channels, sample_rate);

    let err_fn = |err| warn!("An error occurred on the audio stream: {}", err);

    let mut dropped = false;
    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            let block = CaptureBlock {
                samples: data.iter().step_by(channels).copied().collect(),
                after_gap: dropped,
            };
            dropped = sender.try_send(block).is_err();
            if dropped {
                debug!("analysis loop behind, dropped a capture block");
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok(stream)
}

/// Picks the f32 input configuration whose rate range covers `target_rate`,
/// preferring the fewest channels.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .filter(|c| c.min_sample_rate().0 <= target_rate && target_rate <= c.max_sample_rate().0)
        .min_by_key(|c| c.channels())
}
