//! Audio fingerprint.
//!
//! A triangle oscillator is run through an analyser and a dynamics
//! compressor into a muted gain node on an offline context. Floating-point
//! rounding in the DSP path varies across hardware and driver stacks, so a
//! handful of output samples make a stable signal.

use crate::error::CapabilityError;
use crate::hashing::sha256_hex;
use crate::host::{AudioGraphSpec, AudioProvider, OfflineAudioGraph, Waveform};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const AUDIO_SAMPLE_RATE: u32 = 44_100;
pub const AUDIO_DURATION_MS: u32 = 100;
/// Evenly spaced offsets read from the rendered buffer
pub const AUDIO_SAMPLE_POINTS: usize = 30;
/// Decimal places per sample in the hashed string
pub const AUDIO_SAMPLE_PRECISION: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFingerprint {
    pub hash: String,
    pub supported: bool,
}

impl AudioFingerprint {
    pub fn unsupported() -> Self {
        Self {
            hash: String::new(),
            supported: false,
        }
    }
}

/// The fixed offline graph.
pub fn graph_spec() -> AudioGraphSpec {
    AudioGraphSpec {
        sample_rate: AUDIO_SAMPLE_RATE,
        frames: (AUDIO_SAMPLE_RATE * AUDIO_DURATION_MS / 1000) as usize,
        waveform: Waveform::Triangle,
        frequency_hz: 10_000.0,
        analyser_fft_size: 2048,
        compressor_threshold_db: -50.0,
        compressor_knee_db: 40.0,
        compressor_ratio: 12.0,
        compressor_attack_s: 0.0,
        compressor_release_s: 0.25,
        gain: 0.0,
    }
}

/// Render the graph and hash sampled output. The graph is always closed.
pub fn collect_audio(provider: Option<&dyn AudioProvider>) -> AudioFingerprint {
    let Some(provider) = provider else {
        debug!("Audio unsupported: no offline audio context");
        return AudioFingerprint::unsupported();
    };

    match render(provider) {
        Ok(hash) => AudioFingerprint {
            hash,
            supported: true,
        },
        Err(e) => {
            debug!("Audio unsupported: {}", e);
            AudioFingerprint::unsupported()
        }
    }
}

fn render(provider: &dyn AudioProvider) -> Result<String, CapabilityError> {
    let graph = provider.create_graph(&graph_spec())?;
    let mut graph = scopeguard::guard(graph, |mut graph: Box<dyn OfflineAudioGraph>| graph.close());
    let samples = graph.render()?;
    sample_digest(&samples).ok_or_else(|| CapabilityError::failed("render", "empty buffer"))
}

/// Hash of |sample| at evenly spaced offsets, fixed precision, concatenated.
pub fn sample_digest(samples: &[f32]) -> Option<String> {
    if samples.is_empty() {
        return None;
    }

    let mut rendered = String::new();
    for i in 0..AUDIO_SAMPLE_POINTS {
        let offset = i * samples.len() / AUDIO_SAMPLE_POINTS;
        let value = f64::from(samples[offset]).abs();
        rendered.push_str(&format!("{value:.prec$}", prec = AUDIO_SAMPLE_PRECISION));
    }
    Some(sha256_hex(rendered))
}
