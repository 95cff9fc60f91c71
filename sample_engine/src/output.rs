//! Real-time audio output using cpal.
//!
//! The output callback owns a [`Renderer`]; the frame loop only touches the
//! shared [`ControlSlots`], so no lock is taken on the audio thread.

use std::path::Path;
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use hand_geometry::{ControlSink, ControlValues};
use tracing::{error, info};

use crate::backend::AudioBackend;
use crate::error::EngineError;
use crate::sample::Sample;
use crate::shifter::PitchShifter;
use crate::slots::ControlSlots;
use crate::voice::LoopVoice;

const OUTPUT_GAIN: f32 = 0.8;

// ════════════════════════════════════════════════════════════════════════════
// Renderer — the DSP chain run inside the callback
// ════════════════════════════════════════════════════════════════════════════

pub struct Renderer {
    voice:   LoopVoice,
    shifter: PitchShifter,
    slots:   Arc<ControlSlots>,
}

impl Renderer {
    pub fn new(sample: Arc<Sample>, output_rate: u32, slots: Arc<ControlSlots>) -> Self {
        Renderer {
            voice:   LoopVoice::new(sample, output_rate),
            shifter: PitchShifter::new(output_rate),
            slots,
        }
    }

    /// Fill an interleaved buffer.  Controls are read once per call, so a
    /// change lands on the next buffer boundary.
    pub fn render<T>(&mut self, output: &mut [T], channels: usize)
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let controls = self.slots.load();
        for frame in output.chunks_mut(channels.max(1)) {
            let dry = self.voice.next_frame(controls.playback_rate);
            let wet = self.shifter.process(dry, controls.pitch_semitones) * OUTPUT_GAIN;
            let value = T::from_sample(wet);
            for sample in frame.iter_mut() {
                *sample = value;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AudioEngine — cpal stream lifecycle
// ════════════════════════════════════════════════════════════════════════════

pub struct AudioEngine {
    sample: Arc<Sample>,
    slots:  Arc<ControlSlots>,
    stream: Option<cpal::Stream>,
}

impl AudioEngine {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        Ok(Self::with_sample(Sample::load(path)?))
    }

    pub fn with_sample(sample: Sample) -> Self {
        AudioEngine {
            sample: Arc::new(sample),
            slots:  Arc::new(ControlSlots::default()),
            stream: None,
        }
    }

    pub fn slots(&self) -> Arc<ControlSlots> { Arc::clone(&self.slots) }

    pub fn is_playing(&self) -> bool { self.stream.is_some() }

    fn build_stream<T>(
        &self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
    ) -> Result<cpal::Stream, EngineError>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let channels = config.channels as usize;
        let mut renderer = Renderer::new(
            Arc::clone(&self.sample),
            config.sample_rate.0,
            Arc::clone(&self.slots),
        );
        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                renderer.render(data, channels);
            },
            |err| error!("Audio stream error: {}", err),
            None,
        )?;
        Ok(stream)
    }
}

impl ControlSink for AudioEngine {
    fn write_controls(&mut self, controls: ControlValues) {
        self.slots.store(controls);
    }
}

impl AudioBackend for AudioEngine {
    fn name(&self) -> &'static str { "cpal" }

    fn start(&mut self) -> Result<(), EngineError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let host = cpal::default_host();
        info!("Audio host: {:?}", host.id());

        let device = host.default_output_device().ok_or(EngineError::NoOutputDevice)?;
        if let Ok(name) = device.name() {
            info!("Audio device: {}", name);
        }

        let supported = device.default_output_config()?;
        info!("Audio config: {:?}", supported);
        let format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();

        let stream = match format {
            cpal::SampleFormat::F32 => self.build_stream::<f32>(&device, &config),
            cpal::SampleFormat::I16 => self.build_stream::<i16>(&device, &config),
            cpal::SampleFormat::U16 => self.build_stream::<u16>(&device, &config),
            other => Err(EngineError::UnsupportedFormat(other)),
        }?;

        stream.play()?;
        info!(
            "Audio stream started at {} Hz, looping {:.2}s of audio",
            config.sample_rate.0,
            self.sample.duration_secs()
        );
        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                error!("Audio stream pause failed: {}", e);
            }
            info!("Audio stream stopped");
        }
    }

    fn current(&self) -> ControlValues { self.slots.load() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(value: f32, len: usize) -> Arc<Sample> {
        Arc::new(Sample::from_frames(vec![value; len], 48_000))
    }

    #[test]
    fn render_fills_every_channel() {
        let slots = Arc::new(ControlSlots::default());
        let mut r = Renderer::new(constant(0.5, 64), 48_000, slots);
        let mut buf = vec![0.0f32; 16];
        r.render(&mut buf, 2);
        for pair in buf.chunks(2) {
            assert_eq!(pair[0], pair[1]);
            assert!((pair[0] - 0.5 * OUTPUT_GAIN).abs() < 1e-6);
        }
    }

    #[test]
    fn render_follows_slot_updates() {
        let ramp: Vec<f32> = (0..32).map(|i| i as f32 / 32.0).collect();
        let slots = Arc::new(ControlSlots::default());
        let mut r = Renderer::new(Arc::new(Sample::from_frames(ramp, 48_000)), 48_000, Arc::clone(&slots));

        let mut buf = vec![0.0f32; 4];
        r.render(&mut buf, 1);
        assert!((buf[1] - buf[0] - OUTPUT_GAIN / 32.0).abs() < 1e-6);

        slots.store(ControlValues { pitch_semitones: 0, playback_rate: 2.0 });
        r.render(&mut buf, 1);
        assert!((buf[1] - buf[0] - 2.0 * OUTPUT_GAIN / 32.0).abs() < 1e-6);
    }

    #[test]
    fn render_converts_to_integer_formats() {
        let slots = Arc::new(ControlSlots::default());
        let mut r = Renderer::new(constant(0.0, 8), 48_000, slots);
        let mut buf = vec![1i16; 8];
        r.render(&mut buf, 2);
        assert!(buf.iter().all(|&s| s == 0));
    }

    #[test]
    fn engine_holds_controls_before_start() {
        let mut e = AudioEngine::with_sample(Sample::from_frames(vec![0.0; 4], 44_100));
        let c = ControlValues { pitch_semitones: -7, playback_rate: 0.75 };
        e.write_controls(c);
        assert_eq!(e.current(), c);
        assert_eq!(e.slots().load(), c);
        assert!(!e.is_playing());
    }
}
