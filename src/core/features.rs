//! Derived behavioral statistics.
//!
//! Computed on demand from a tracker snapshot, never on the event path.
//! Everything here reads positions and timing only.

use crate::core::payload::PageTiming;
use crate::hashing::fast_hash;
use crate::core::tracker::{
    ClickSample, ClickSamples, EventCounts, InteractionTracker, PointerSample, PointerSamples,
    ScrollSamples,
};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::HashMap;

/// Grid size for pointer-position entropy.
pub const ENTROPY_GRID: f64 = 10.0;

/// Click density is reported per million square pixels.
const CLICK_DENSITY_SCALE: f64 = 1_000_000.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseSignals {
    pub samples: PointerSamples,
    /// Pointer-move events dispatched, stored or not
    pub total_events: u64,
    /// px/ms between consecutive samples
    pub velocities: Vec<f64>,
    /// px/ms² between consecutive velocities
    pub accelerations: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollSignals {
    pub samples: ScrollSamples,
    pub total_events: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickSignals {
    pub samples: ClickSamples,
    pub total_events: u64,
    /// ms between consecutive clicks
    pub intervals: Vec<u64>,
}

/// Keystroke count and timing. No key values exist at this level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardSignals {
    pub count: u64,
    pub intervals: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_interval_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingSignals {
    /// Page-relative time the snapshot was taken
    pub observed_ms: u64,
    pub idle_ms: u64,
    pub active_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_first_interaction_ms: Option<u64>,
    pub page: PageTiming,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionSignals {
    pub total_events: u64,
    /// Shannon entropy (bits) of pointer positions on a 10px grid
    pub pointer_entropy: f64,
    /// 1 / (1 + variance(scroll velocities))
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll_smoothness: Option<f64>,
    /// Clicks per viewport area, scaled by 1e6
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_density: Option<f64>,
}

/// The behavioral block of the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehavioralSignals {
    pub mouse: MouseSignals,
    pub scroll: ScrollSignals,
    pub clicks: ClickSignals,
    pub keyboard: KeyboardSignals,
    pub timing: TimingSignals,
    pub interaction: InteractionSignals,
}

impl BehavioralSignals {
    /// Whether any interaction was observed at all.
    pub fn is_empty(&self) -> bool {
        self.interaction.total_events == 0
    }
}

/// Derive the behavioral block from one consistent read of `tracker`.
pub fn compute_signals(
    tracker: &InteractionTracker,
    now_ms: u64,
    viewport_area: f64,
) -> BehavioralSignals {
    let counts: EventCounts = tracker.counts();
    let pointer = tracker.pointer_samples();
    let scroll = tracker.scroll_samples();
    let clicks = tracker.click_samples();

    let velocities = pointer_velocities(pointer);
    let accelerations = accelerations(pointer, &velocities);

    let scroll_velocities: Vec<f64> = scroll.iter().skip(1).map(|s| s.velocity).collect();

    let key_intervals: Vec<u64> = tracker.key_intervals().to_vec();
    let mean_interval_ms = if key_intervals.is_empty() {
        None
    } else {
        Some(key_intervals.iter().map(|&i| i as f64).mean())
    };

    let idle_ms = tracker.idle_ms(now_ms);
    let active_ms = tracker.active_ms(now_ms);
    let time_to_first_interaction_ms = tracker.first_activity_at();

    BehavioralSignals {
        mouse: MouseSignals {
            samples: pointer.clone(),
            total_events: counts.pointer_moves,
            velocities,
            accelerations,
        },
        scroll: ScrollSignals {
            samples: scroll.clone(),
            total_events: counts.scrolls,
        },
        clicks: ClickSignals {
            samples: clicks.clone(),
            total_events: counts.clicks,
            intervals: click_intervals(clicks),
        },
        keyboard: KeyboardSignals {
            count: counts.keystrokes,
            intervals: key_intervals,
            mean_interval_ms,
        },
        timing: TimingSignals {
            observed_ms: now_ms,
            idle_ms,
            active_ms,
            time_to_first_interaction_ms,
            page: PageTiming::default(),
        },
        interaction: InteractionSignals {
            total_events: counts.total(),
            pointer_entropy: position_entropy(pointer, ENTROPY_GRID),
            scroll_smoothness: smoothness(&scroll_velocities),
            click_density: click_density(clicks.len(), viewport_area),
        },
    }
}

/// Speed between consecutive pointer samples, px/ms.
pub fn pointer_velocities(samples: &[PointerSample]) -> Vec<f64> {
    samples
        .windows(2)
        .map(|pair| {
            let dt = pair[1].t.saturating_sub(pair[0].t);
            if dt == 0 {
                0.0
            } else {
                (pair[1].x - pair[0].x).hypot(pair[1].y - pair[0].y) / dt as f64
            }
        })
        .collect()
}

/// Change in velocity per ms. `velocities[i]` spans samples `i..=i+1`.
pub fn accelerations(samples: &[PointerSample], velocities: &[f64]) -> Vec<f64> {
    velocities
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let dt = samples[i + 2].t.saturating_sub(samples[i + 1].t);
            if dt == 0 {
                0.0
            } else {
                (pair[1] - pair[0]) / dt as f64
            }
        })
        .collect()
}

/// Shannon entropy, −Σ p·log2 p, over grid-quantized positions.
pub fn position_entropy(samples: &[PointerSample], grid: f64) -> f64 {
    if samples.is_empty() || grid <= 0.0 {
        return 0.0;
    }

    let mut buckets: HashMap<u32, usize> = HashMap::new();
    for sample in samples {
        *buckets.entry(grid_cell(sample, grid)).or_insert(0) += 1;
    }

    let total = samples.len() as f64;
    let entropy: f64 = buckets
        .values()
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum();
    // a single bucket yields -0.0
    entropy.max(0.0)
}

/// Bucket key of the grid cell holding `sample`.
fn grid_cell(sample: &PointerSample, grid: f64) -> u32 {
    let column = (sample.x / grid).floor() as i64;
    let row = (sample.y / grid).floor() as i64;
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&column.to_le_bytes());
    key[8..].copy_from_slice(&row.to_le_bytes());
    fast_hash(key)
}

/// 1 / (1 + population variance). `None` without any velocity.
pub fn smoothness(velocities: &[f64]) -> Option<f64> {
    if velocities.is_empty() {
        return None;
    }
    let variance = if velocities.len() < 2 {
        0.0
    } else {
        velocities.iter().population_variance()
    };
    Some(1.0 / (1.0 + variance))
}

/// Clicks per viewport area × 1e6. `None` for a zero-sized viewport.
pub fn click_density(clicks: usize, viewport_area: f64) -> Option<f64> {
    if viewport_area <= 0.0 {
        return None;
    }
    Some(clicks as f64 / viewport_area * CLICK_DENSITY_SCALE)
}

/// ms between consecutive clicks.
pub fn click_intervals(clicks: &[ClickSample]) -> Vec<u64> {
    clicks
        .windows(2)
        .map(|pair| pair[1].t.saturating_sub(pair[0].t))
        .collect()
}
