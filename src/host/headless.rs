//! Native-process host used by the CLI.
//!
//! There is no display, rendering stack, or audio device here, so canvas,
//! audio, font and WebGL capabilities are simply absent and those signals
//! come out as unsupported.

use super::{HostEnvironment, NavigatorInfo, StorageKind};
use crate::core::payload::{NetworkSignals, ScreenSignals};
use crate::error::CapabilityError;
use std::time::Instant;

/// Environment backed by the current process.
pub struct HeadlessHost {
    started: Instant,
    time_zone: String,
    do_not_track: bool,
}

impl HeadlessHost {
    pub fn new() -> Self {
        let time_zone = std::env::var("TZ")
            .ok()
            .filter(|tz| !tz.trim().is_empty())
            .unwrap_or_else(|| "UTC".to_string());

        Self {
            started: Instant::now(),
            time_zone,
            do_not_track: false,
        }
    }

    /// Report Do-Not-Track as enabled.
    pub fn with_do_not_track(mut self, enabled: bool) -> Self {
        self.do_not_track = enabled;
        self
    }

    pub fn time_zone(&self) -> &str {
        &self.time_zone
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostEnvironment for HeadlessHost {
    fn screen(&self) -> ScreenSignals {
        ScreenSignals {
            width: 1920,
            height: 1080,
            avail_width: 1920,
            avail_height: 1080,
            color_depth: 24,
            pixel_ratio: 1.0,
            viewport_width: 1920,
            viewport_height: 1080,
        }
    }

    fn navigator(&self) -> NavigatorInfo {
        let language = std::env::var("LANG")
            .ok()
            .and_then(|lang| lang.split('.').next().map(|l| l.replace('_', "-")))
            .filter(|l| !l.is_empty() && l != "C" && l != "POSIX")
            .unwrap_or_else(|| "en-US".to_string());

        NavigatorInfo {
            user_agent: format!("scrybe-collect/{}", env!("CARGO_PKG_VERSION")),
            languages: vec![language.clone()],
            language,
            platform: std::env::consts::OS.to_string(),
            vendor: String::new(),
            time_zone: Some(self.time_zone.clone()),
            time_zone_offset_minutes: 0,
            hardware_concurrency: std::thread::available_parallelism()
                .ok()
                .and_then(|n| u32::try_from(n.get()).ok()),
            device_memory_gb: None,
            max_touch_points: 0,
            cookie_enabled: false,
            webdriver: false,
        }
    }

    fn connection(&self) -> Option<NetworkSignals> {
        None
    }

    fn probe_storage(&self, _kind: StorageKind) -> Result<bool, CapabilityError> {
        Ok(false)
    }

    fn has_global(&self, _name: &str) -> bool {
        false
    }

    fn plugins(&self) -> Result<Vec<String>, CapabilityError> {
        Ok(Vec::new())
    }

    fn do_not_track(&self) -> bool {
        self.do_not_track
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
