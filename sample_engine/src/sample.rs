//! Loop source decoding.

use std::path::Path;

use tracing::info;

use crate::error::EngineError;

/// Mono audio at a fixed sample rate.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    frames:      Vec<f32>,
    sample_rate: u32,
}

impl Sample {
    pub fn from_frames(frames: Vec<f32>, sample_rate: u32) -> Self {
        Sample { frames, sample_rate: sample_rate.max(1) }
    }

    /// Decode a WAV file (integer or float PCM, any channel count).
    /// Multi-channel audio is averaged down to mono.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let wav_err = |source| EngineError::Wav { path: path.to_path_buf(), source };

        let mut reader = hound::WavReader::open(path).map_err(wav_err)?;
        let spec = reader.spec();

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(wav_err)?,
            hound::SampleFormat::Int => {
                let full_scale = (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / full_scale))
                    .collect::<Result<_, _>>()
                    .map_err(wav_err)?
            }
        };

        let channels = spec.channels.max(1) as usize;
        let frames: Vec<f32> = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();

        if frames.is_empty() {
            return Err(EngineError::EmptySample(path.to_path_buf()));
        }

        info!(
            path = %path.display(),
            frames = frames.len(),
            sample_rate = spec.sample_rate,
            channels,
            "loaded loop source"
        );
        Ok(Sample::from_frames(frames, spec.sample_rate))
    }

    pub fn frames(&self) -> &[f32] { &self.frames }
    pub fn len(&self) -> usize { self.frames.len() }
    pub fn is_empty(&self) -> bool { self.frames.is_empty() }
    pub fn sample_rate(&self) -> u32 { self.sample_rate }

    pub fn duration_secs(&self) -> f64 {
        self.frames.len() as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, spec: hound::WavSpec, samples: &[i16]) {
        let mut w = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            w.write_sample(s).unwrap();
        }
        w.finalize().unwrap();
    }

    #[test]
    fn stereo_int_is_mixed_to_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        write_wav(&path, spec, &[16384, 0, -16384, -16384]);

        let s = Sample::load(&path).unwrap();
        assert_eq!(s.sample_rate(), 22_050);
        assert_eq!(s.len(), 2);
        assert!((s.frames()[0] - 0.25).abs() < 1e-6);
        assert!((s.frames()[1] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn float_wav_round_trips_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 48_000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut w = hound::WavWriter::create(&path, spec).unwrap();
        for v in [0.5f32, -0.25, 0.125] {
            w.write_sample(v).unwrap();
        }
        w.finalize().unwrap();

        let s = Sample::load(&path).unwrap();
        assert_eq!(s.frames(), &[0.5, -0.25, 0.125]);
        assert!((s.duration_secs() - 3.0 / 48_000.0).abs() < 1e-12);
    }

    #[test]
    fn empty_wav_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        write_wav(&path, spec, &[]);
        assert!(matches!(Sample::load(&path), Err(EngineError::EmptySample(_))));
    }

    #[test]
    fn missing_file_is_a_wav_error() {
        let err = Sample::load("/definitely/not/here.wav").unwrap_err();
        assert!(matches!(err, EngineError::Wav { .. }));
    }
}
