//! Sound cues.
//!
//! - `SoundBank`: WAV samples decoded with hound, grouped by cue name
//! - `Mixer`: sums the one-shot voices that are still playing
//! - `AudioOutput`: cpal stream fed from a lock-free ring buffer
//!
//! The game thread calls [`Audio::pump`] once per frame; the cpal callback
//! only drains the ring buffer.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use rand::seq::SliceRandom;
use rand::Rng;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::HeapRb;
use thiserror::Error;

/// Ring buffer length in interleaved samples (~85 ms of stereo at 48 kHz).
const RING_BUFFER_SIZE: usize = 8192;

/// Most recent cue names kept for inspection.
const HISTORY: usize = 32;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("sound file {0} not found")]
    NotFound(PathBuf),
    #[error("cannot decode {path}: {source}")]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
    #[error("{0} contains no samples")]
    Empty(PathBuf),
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("no audio output device found")]
    NoDevice,
    #[error("cannot query the output config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),
    #[error("unsupported sample format {0:?}")]
    UnsupportedFormat(SampleFormat),
    #[error("cannot build the output stream: {0}")]
    Build(#[from] cpal::BuildStreamError),
    #[error("cannot start the output stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
}

/// A decoded mono sample.
#[derive(Debug)]
pub struct Sound {
    pub rate: u32,
    pub samples: Vec<f32>,
}

impl Sound {
    /// Decodes a WAV file, averaging all channels down to mono.
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        if !path.exists() {
            return Err(AssetError::NotFound(path.to_path_buf()));
        }
        let wav_err = |source| AssetError::Wav {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = hound::WavReader::open(path).map_err(wav_err)?;
        let spec = reader.spec();
        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(wav_err)?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<_, _>>()
                    .map_err(wav_err)?
            }
        };

        let channels = spec.channels.max(1) as usize;
        let samples: Vec<f32> = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();
        if samples.is_empty() {
            return Err(AssetError::Empty(path.to_path_buf()));
        }
        Ok(Self {
            rate: spec.sample_rate,
            samples,
        })
    }
}

/// Named cues, each backed by one or more samples.
#[derive(Default)]
pub struct SoundBank {
    cues: HashMap<String, Vec<Arc<Sound>>>,
}

impl SoundBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every file that exists; missing or broken files only warn.
    pub fn load_cue(&mut self, cue: &str, files: &[PathBuf]) -> usize {
        let mut loaded = 0;
        for file in files {
            match Sound::load(file) {
                Ok(sound) => {
                    self.insert(cue, sound);
                    loaded += 1;
                }
                Err(e) => tracing::warn!(cue, error = %e, "sound skipped"),
            }
        }
        loaded
    }

    pub fn insert(&mut self, cue: &str, sound: Sound) {
        self.cues
            .entry(cue.to_string())
            .or_default()
            .push(Arc::new(sound));
    }

    pub fn first(&self, cue: &str) -> Option<Arc<Sound>> {
        self.cues.get(cue).and_then(|v| v.first()).cloned()
    }

    pub fn pick<R: Rng>(&self, cue: &str, rng: &mut R) -> Option<Arc<Sound>> {
        self.cues.get(cue).and_then(|v| v.choose(rng)).cloned()
    }

    pub fn len(&self, cue: &str) -> usize {
        self.cues.get(cue).map_or(0, Vec::len)
    }
}

struct Voice {
    sound: Arc<Sound>,
    pos: f64,
    step: f64,
    volume: f32,
}

/// One-shot sample mixer.
pub struct Mixer {
    rate: u32,
    voices: Vec<Voice>,
}

impl Mixer {
    pub fn new(rate: u32) -> Self {
        Self {
            rate,
            voices: Vec::new(),
        }
    }

    pub fn play(&mut self, sound: Arc<Sound>, volume: f32) {
        let step = sound.rate as f64 / self.rate.max(1) as f64;
        self.voices.push(Voice {
            sound,
            pos: 0.0,
            step,
            volume,
        });
    }

    pub fn active(&self) -> usize {
        self.voices.len()
    }

    /// Fills `out` with interleaved frames of `channels` samples each.
    pub fn mix(&mut self, out: &mut [f32], channels: usize) {
        out.fill(0.0);
        let channels = channels.max(1);
        for voice in &mut self.voices {
            for frame in out.chunks_mut(channels) {
                let Some(&sample) = voice.sound.samples.get(voice.pos as usize) else {
                    break;
                };
                for s in frame.iter_mut() {
                    *s += sample * voice.volume;
                }
                voice.pos += voice.step;
            }
        }
        for s in out.iter_mut() {
            *s = s.clamp(-1.0, 1.0);
        }
        self.voices
            .retain(|v| (v.pos as usize) < v.sound.samples.len());
    }
}

/// cpal output fed through a ring buffer.
pub struct AudioOutput {
    _stream: Stream,
    producer: ringbuf::HeapProd<f32>,
    channels: usize,
    sample_rate: u32,
}

impl AudioOutput {
    /// Opens the default output device in its native sample format.
    pub fn new() -> Result<Self, OutputError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(OutputError::NoDevice)?;
        let default_config = device.default_output_config()?;
        let channels = default_config.channels();
        let sample_rate = default_config.sample_rate().0;

        let config = StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let ring = HeapRb::<f32>::new(RING_BUFFER_SIZE);
        let (producer, consumer) = ring.split();

        let format = default_config.sample_format();
        let stream = match format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, consumer)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, consumer)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, consumer)?,
            other => return Err(OutputError::UnsupportedFormat(other)),
        };
        stream.play()?;

        tracing::info!(sample_rate, channels, ?format, "audio output initialized");

        Ok(Self {
            _stream: stream,
            producer,
            channels: channels as usize,
            sample_rate,
        })
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut consumer: ringbuf::HeapCons<f32>,
) -> Result<Stream, OutputError>
where
    T: SizedSample + FromSample<f32>,
{
    let mut scratch = vec![0.0f32; 4096];
    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            if scratch.len() < data.len() {
                scratch.resize(data.len(), 0.0);
            }
            let popped = consumer.pop_slice(&mut scratch[..data.len()]);
            write_samples(data, &scratch[..popped]);
        },
        |err| {
            tracing::error!("Audio stream error: {}", err);
        },
        None,
    )?;
    Ok(stream)
}

/// Converts `mixed` into the device format; the rest of `data` is silence.
fn write_samples<T: Sample + FromSample<f32>>(data: &mut [T], mixed: &[f32]) {
    let (head, tail) = data.split_at_mut(mixed.len().min(data.len()));
    for (out, &s) in head.iter_mut().zip(mixed) {
        *out = T::from_sample(s);
    }
    tail.fill(T::EQUILIBRIUM);
}

/// Sound bank, mixer and (optional) device output together.
pub struct Audio {
    bank: SoundBank,
    mixer: Mixer,
    output: Option<AudioOutput>,
    volume: f32,
    played: Vec<String>,
    scratch: Vec<f32>,
}

impl Audio {
    /// Opens the default output device; without one the run stays silent.
    pub fn open(bank: SoundBank, volume: f32, enabled: bool) -> Self {
        let output = if enabled {
            match AudioOutput::new() {
                Ok(output) => Some(output),
                Err(e) => {
                    tracing::warn!(error = %e, "audio disabled");
                    None
                }
            }
        } else {
            None
        };
        let rate = output.as_ref().map_or(44_100, |o| o.sample_rate);
        Self {
            bank,
            mixer: Mixer::new(rate),
            output,
            volume,
            played: Vec::new(),
            scratch: Vec::new(),
        }
    }

    pub fn silent() -> Self {
        Self::open(SoundBank::new(), 0.0, false)
    }

    fn start(&mut self, cue: &str, sound: Option<Arc<Sound>>) {
        if self.played.len() == HISTORY {
            self.played.remove(0);
        }
        self.played.push(cue.to_string());
        match sound {
            Some(sound) if self.output.is_some() => self.mixer.play(sound, self.volume),
            Some(_) => {}
            None => tracing::trace!(cue, "no sample for cue"),
        }
    }

    pub fn play(&mut self, cue: &str) {
        let sound = self.bank.first(cue);
        self.start(cue, sound);
    }

    pub fn play_random<R: Rng>(&mut self, cue: &str, rng: &mut R) {
        let sound = self.bank.pick(cue, rng);
        self.start(cue, sound);
    }

    /// Cues requested so far, most recent last.
    pub fn played(&self) -> &[String] {
        &self.played
    }

    /// Mixes into whatever space the ring buffer has free.
    pub fn pump(&mut self) {
        let Some(output) = &mut self.output else {
            return;
        };
        let free = output.producer.vacant_len();
        let len = free - free % output.channels;
        if len == 0 {
            return;
        }
        self.scratch.resize(len, 0.0);
        self.mixer.mix(&mut self.scratch, output.channels);
        output.producer.push_slice(&self.scratch);
    }
}
