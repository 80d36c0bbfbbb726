//! Core data handling.
//!
//! This module contains:
//! - Bounded accumulation of interaction samples
//! - Derived behavioral statistics
//! - Telemetry payload assembly

pub mod features;
pub mod payload;
pub mod tracker;

pub use features::{compute_signals, BehavioralSignals};
pub use payload::{
    BrowserSignals, NavigatorSignals, NetworkSignals, PageTiming, PayloadBuilder, QuirkSignals,
    ScreenSignals, StorageSignals, TelemetryPayload,
};
pub use tracker::{BehavioralConfig, InteractionTracker};
