//! Long-lived behavioral collection.
//!
//! Host callbacks push [`InteractionEvent`]s through an [`EventSink`] into a
//! bounded channel. The [`BehavioralCollector`] is the channel's single
//! consumer and the only writer of its [`InteractionTracker`], so no locking
//! is needed around the samples themselves.

pub mod types;

use crate::core::features::{compute_signals, BehavioralSignals};
use crate::core::tracker::{BehavioralConfig, InteractionTracker};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

pub use types::{InteractionEvent, MouseButton};

/// Errors from collector lifecycle calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectorError {
    #[error("collector is already running")]
    AlreadyRunning,
}

/// Cloneable handle given to host event dispatch.
///
/// Dispatch never blocks and never fails loudly: events are dropped while
/// the collector is stopped or its queue is full.
#[derive(Clone)]
pub struct EventSink {
    sender: Sender<InteractionEvent>,
    running: Arc<AtomicBool>,
}

impl EventSink {
    /// Offer one event. Returns whether it was queued.
    pub fn dispatch(&self, event: InteractionEvent) -> bool {
        if !self.running.load(Ordering::SeqCst) {
            return false;
        }
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Owns the event queue and the interaction accumulator.
pub struct BehavioralCollector {
    tracker: InteractionTracker,
    sender: Sender<InteractionEvent>,
    receiver: Receiver<InteractionEvent>,
    running: Arc<AtomicBool>,
}

impl BehavioralCollector {
    pub fn new(config: BehavioralConfig) -> Self {
        let (sender, receiver) = bounded(config.channel_capacity.max(1));
        Self {
            tracker: InteractionTracker::new(config),
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start accepting events.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }
        self.running.store(true, Ordering::SeqCst);
        debug!("Behavioral collector started");
        Ok(())
    }

    /// Stop accepting events. Samples already collected are kept.
    pub fn stop(&mut self) {
        if self.running.swap(false, Ordering::SeqCst) {
            debug!("Behavioral collector stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// A handle for the host's event dispatch.
    pub fn sink(&self) -> EventSink {
        EventSink {
            sender: self.sender.clone(),
            running: Arc::clone(&self.running),
        }
    }

    /// Fold every queued event into the tracker. Returns how many were read.
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(event) = self.receiver.try_recv() {
            self.tracker.record(event);
            processed += 1;
        }
        processed
    }

    /// Drain the queue and derive statistics from that single state.
    pub fn snapshot(&mut self, now_ms: u64, viewport_area: f64) -> BehavioralSignals {
        self.pump();
        compute_signals(&self.tracker, now_ms, viewport_area)
    }

    pub fn tracker(&self) -> &InteractionTracker {
        &self.tracker
    }

    /// Drop queued events and every collected sample.
    pub fn clear(&mut self) {
        while self.receiver.try_recv().is_ok() {}
        self.tracker.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tracker::MAX_POINTER_SAMPLES;

    #[test]
    fn test_start_twice_fails() {
        let mut collector = BehavioralCollector::new(BehavioralConfig::default());
        assert!(collector.start().is_ok());
        assert_eq!(collector.start(), Err(CollectorError::AlreadyRunning));
        collector.stop();
        assert!(!collector.is_running());
    }

    #[test]
    fn test_sink_drops_while_stopped() {
        let mut collector = BehavioralCollector::new(BehavioralConfig::default());
        let sink = collector.sink();

        assert!(!sink.dispatch(InteractionEvent::keystroke(0)));
        collector.start().unwrap();
        assert!(sink.dispatch(InteractionEvent::keystroke(10)));
        assert_eq!(collector.pump(), 1);
        assert_eq!(collector.tracker().counts().keystrokes, 1);
    }

    #[test]
    fn test_full_queue_drops_instead_of_blocking() {
        let config = BehavioralConfig {
            channel_capacity: 3,
            ..Default::default()
        };
        let mut collector = BehavioralCollector::new(config);
        collector.start().unwrap();
        let sink = collector.sink();

        let accepted = (0..10)
            .filter(|&i| sink.dispatch(InteractionEvent::keystroke(i)))
            .count();
        assert_eq!(accepted, 3);
    }

    #[test]
    fn test_flood_of_pointer_events_stays_capped() {
        let mut collector = BehavioralCollector::new(BehavioralConfig::default());
        collector.start().unwrap();
        let sink = collector.sink();

        for i in 0..500u64 {
            sink.dispatch(InteractionEvent::pointer_move(i as f64, i as f64, i * 150));
        }
        let signals = collector.snapshot(100_000, 1.0);
        assert!(signals.mouse.samples.len() <= MAX_POINTER_SAMPLES);
        assert_eq!(signals.mouse.samples.len(), MAX_POINTER_SAMPLES);
        assert_eq!(signals.mouse.total_events, 500);
    }

    #[test]
    fn test_sink_usable_from_other_threads() {
        let mut collector = BehavioralCollector::new(BehavioralConfig::default());
        collector.start().unwrap();
        let sink = collector.sink();

        let handle = std::thread::spawn(move || {
            for i in 0..20u64 {
                sink.dispatch(InteractionEvent::keystroke(i * 10));
            }
        });
        handle.join().unwrap();

        let signals = collector.snapshot(1_000, 1.0);
        assert_eq!(signals.keyboard.count, 20);
    }

    #[test]
    fn test_clear() {
        let mut collector = BehavioralCollector::new(BehavioralConfig::default());
        collector.start().unwrap();
        collector.sink().dispatch(InteractionEvent::keystroke(1));
        collector.clear();
        assert_eq!(collector.snapshot(10, 1.0).keyboard.count, 0);
    }
}
