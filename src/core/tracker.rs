//! Bounded accumulation of interaction samples.
//!
//! Every sequence has a hard capacity fixed in its type. Once full, further
//! samples are dropped rather than evicting the oldest, so the shape of the
//! early interaction survives and memory stays bounded under event floods.

use crate::collector::types::{InteractionEvent, MouseButton};
use serde::{Deserialize, Serialize};

pub const MAX_POINTER_SAMPLES: usize = 100;
pub const MAX_SCROLL_SAMPLES: usize = 50;
pub const MAX_CLICK_SAMPLES: usize = 20;
pub const MAX_KEY_INTERVALS: usize = 100;

pub type PointerSamples = heapless::Vec<PointerSample, MAX_POINTER_SAMPLES>;
pub type ScrollSamples = heapless::Vec<ScrollSample, MAX_SCROLL_SAMPLES>;
pub type ClickSamples = heapless::Vec<ClickSample, MAX_CLICK_SAMPLES>;
pub type KeyIntervals = heapless::Vec<u64, MAX_KEY_INTERVALS>;

/// Sampling and idle heuristics. Defaults are empirical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BehavioralConfig {
    /// Minimum spacing between stored pointer samples
    pub pointer_interval_ms: u64,
    /// Minimum spacing between stored scroll samples
    pub scroll_interval_ms: u64,
    /// Gap after which the visitor counts as idle
    pub idle_threshold_ms: u64,
    /// Pending-event capacity between host dispatch and the collector
    pub channel_capacity: usize,
}

impl Default for BehavioralConfig {
    fn default() -> Self {
        Self {
            pointer_interval_ms: 100,
            scroll_interval_ms: 200,
            idle_threshold_ms: 5_000,
            channel_capacity: 10_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
    pub t: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollSample {
    pub x: f64,
    pub y: f64,
    pub t: u64,
    /// |Δposition| / Δt against the previous stored sample, px/ms
    pub velocity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClickSample {
    pub x: f64,
    pub y: f64,
    pub button: MouseButton,
    pub t: u64,
}

/// Events dispatched per kind, stored or not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCounts {
    pub pointer_moves: u64,
    pub scrolls: u64,
    pub clicks: u64,
    pub keystrokes: u64,
}

impl EventCounts {
    pub fn total(&self) -> u64 {
        self.pointer_moves + self.scrolls + self.clicks + self.keystrokes
    }
}

/// The live accumulator. Mutated only by its owning collector.
#[derive(Debug, Clone)]
pub struct InteractionTracker {
    config: BehavioralConfig,
    pointer: PointerSamples,
    scroll: ScrollSamples,
    clicks: ClickSamples,
    key_intervals: KeyIntervals,
    counts: EventCounts,
    last_pointer_at: Option<u64>,
    last_scroll_at: Option<u64>,
    last_key_at: Option<u64>,
    first_activity_at: Option<u64>,
    last_activity_at: Option<u64>,
    idle_total_ms: u64,
}

impl InteractionTracker {
    pub fn new(config: BehavioralConfig) -> Self {
        Self {
            config,
            pointer: heapless::Vec::new(),
            scroll: heapless::Vec::new(),
            clicks: heapless::Vec::new(),
            key_intervals: heapless::Vec::new(),
            counts: EventCounts::default(),
            last_pointer_at: None,
            last_scroll_at: None,
            last_key_at: None,
            first_activity_at: None,
            last_activity_at: None,
            idle_total_ms: 0,
        }
    }

    pub fn config(&self) -> &BehavioralConfig {
        &self.config
    }

    /// Fold one event in. Returns whether a sample was stored.
    pub fn record(&mut self, event: InteractionEvent) -> bool {
        let at = event.at_ms();
        self.mark_activity(at);

        match event {
            InteractionEvent::PointerMove { x, y, at_ms } => {
                self.counts.pointer_moves += 1;
                if !interval_elapsed(self.last_pointer_at, at_ms, self.config.pointer_interval_ms) {
                    return false;
                }
                let stored = self.pointer.push(PointerSample { x, y, t: at_ms }).is_ok();
                if stored {
                    self.last_pointer_at = Some(at_ms);
                }
                stored
            }
            InteractionEvent::Scroll { x, y, at_ms } => {
                self.counts.scrolls += 1;
                if !interval_elapsed(self.last_scroll_at, at_ms, self.config.scroll_interval_ms) {
                    return false;
                }
                let velocity = match self.scroll.last() {
                    Some(prev) => {
                        let dt = at_ms.saturating_sub(prev.t);
                        if dt == 0 {
                            0.0
                        } else {
                            (x - prev.x).hypot(y - prev.y) / dt as f64
                        }
                    }
                    None => 0.0,
                };
                let stored = self
                    .scroll
                    .push(ScrollSample {
                        x,
                        y,
                        t: at_ms,
                        velocity,
                    })
                    .is_ok();
                if stored {
                    self.last_scroll_at = Some(at_ms);
                }
                stored
            }
            InteractionEvent::Click {
                x,
                y,
                button,
                at_ms,
            } => {
                self.counts.clicks += 1;
                self.clicks
                    .push(ClickSample {
                        x,
                        y,
                        button,
                        t: at_ms,
                    })
                    .is_ok()
            }
            InteractionEvent::Keystroke { at_ms } => {
                self.counts.keystrokes += 1;
                let previous = self.last_key_at.replace(at_ms);
                match previous {
                    Some(prev) => self.key_intervals.push(at_ms.saturating_sub(prev)).is_ok(),
                    None => true,
                }
            }
        }
    }

    fn mark_activity(&mut self, at: u64) {
        if self.first_activity_at.is_none() {
            self.first_activity_at = Some(at);
        }
        if let Some(last) = self.last_activity_at {
            let gap = at.saturating_sub(last);
            if gap > self.config.idle_threshold_ms {
                self.idle_total_ms += gap;
            }
            self.last_activity_at = Some(last.max(at));
        } else {
            self.last_activity_at = Some(at);
        }
    }

    /// Idle time as of `now_ms`: the current idle stretch once it passes the
    /// threshold, otherwise the running idle total.
    pub fn idle_ms(&self, now_ms: u64) -> u64 {
        let since_last = now_ms.saturating_sub(self.last_activity_at.unwrap_or(0));
        if since_last > self.config.idle_threshold_ms {
            since_last
        } else {
            self.idle_total_ms
        }
    }

    /// Time since the first activity that was not idle: every gap past the
    /// threshold counts, including the current stretch once it passes.
    pub fn active_ms(&self, now_ms: u64) -> u64 {
        let (Some(first), Some(last)) = (self.first_activity_at, self.last_activity_at) else {
            return 0;
        };
        let since_last = now_ms.saturating_sub(last);
        let current_idle = if since_last > self.config.idle_threshold_ms {
            since_last
        } else {
            0
        };
        now_ms
            .saturating_sub(first)
            .saturating_sub(self.idle_total_ms + current_idle)
    }

    pub fn pointer_samples(&self) -> &PointerSamples {
        &self.pointer
    }

    pub fn scroll_samples(&self) -> &ScrollSamples {
        &self.scroll
    }

    pub fn click_samples(&self) -> &ClickSamples {
        &self.clicks
    }

    pub fn key_intervals(&self) -> &KeyIntervals {
        &self.key_intervals
    }

    pub fn counts(&self) -> EventCounts {
        self.counts
    }

    pub fn first_activity_at(&self) -> Option<u64> {
        self.first_activity_at
    }

    pub fn idle_total_ms(&self) -> u64 {
        self.idle_total_ms
    }

    /// Discard everything collected so far.
    pub fn clear(&mut self) {
        *self = Self::new(self.config.clone());
    }
}

fn interval_elapsed(last: Option<u64>, at: u64, interval: u64) -> bool {
    match last {
        Some(last) => at >= last && at - last >= interval,
        None => true,
    }
}
