//! Telemetry payload assembly.
//!
//! The payload is the aggregate root sent to the ingestion gateway:
//!
//! ```text
//! { sessionId, timestamp, network, browser: { canvas, webgl?, audio?, fonts?,
//!   screen, navigator, quirks, storage, plugins }, behavioral: { mouse, scroll,
//!   clicks, keyboard, timing, interaction } }
//! ```
//!
//! Unsupported sub-signals are omitted, never zero-filled, so two devices
//! lacking WebGL do not collide on an all-zero WebGL block.

use crate::core::features::BehavioralSignals;
use crate::error::SignError;
use crate::fingerprint::{AudioFingerprint, CanvasFingerprint, FontFingerprint, WebGlFingerprint};
use serde::{Deserialize, Serialize};

/// Screen and viewport geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenSignals {
    pub width: u32,
    pub height: u32,
    pub avail_width: u32,
    pub avail_height: u32,
    pub color_depth: u8,
    pub pixel_ratio: f64,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl ScreenSignals {
    /// Viewport area in square CSS pixels.
    pub fn viewport_area(&self) -> f64 {
        f64::from(self.viewport_width) * f64::from(self.viewport_height)
    }
}

/// Network-condition hints from the Network Information API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSignals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downlink_mbps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtt_ms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_data: Option<bool>,
}

/// Navigation timing milestones, in milliseconds since navigation start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTiming {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dom_content_loaded_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_first_byte_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigatorSignals {
    pub user_agent: String,
    pub language: String,
    pub languages: Vec<String>,
    pub platform: String,
    pub vendor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    pub time_zone_offset_minutes: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware_concurrency: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_memory_gb: Option<f64>,
    pub max_touch_points: u32,
    pub cookie_enabled: bool,
    pub do_not_track: bool,
}

/// Automation and headless-browser markers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuirkSignals {
    pub webdriver: bool,
    /// Automation-indicating globals found on the host
    pub automation_markers: Vec<String>,
    pub headless_user_agent: bool,
    pub empty_languages: bool,
}

/// Storage-API availability. A probe that throws reads as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSignals {
    pub local_storage: bool,
    pub session_storage: bool,
    pub indexed_db: bool,
    pub cookies: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserSignals {
    pub canvas: CanvasFingerprint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webgl: Option<WebGlFingerprint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioFingerprint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fonts: Option<FontFingerprint>,
    pub screen: ScreenSignals,
    pub navigator: NavigatorSignals,
    pub quirks: QuirkSignals,
    pub storage: StorageSignals,
    pub plugins: Vec<String>,
}

/// One submission's worth of observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryPayload {
    pub session_id: String,
    /// Collection time, milliseconds since the Unix epoch
    pub timestamp: i64,
    pub network: NetworkSignals,
    pub browser: BrowserSignals,
    pub behavioral: BehavioralSignals,
}

impl TelemetryPayload {
    /// Compact JSON body. This exact string is what gets signed and sent.
    pub fn to_body(&self) -> Result<String, SignError> {
        serde_json::to_string(self).map_err(|e| SignError::Serialization(e.to_string()))
    }
}

/// Assembles payloads for one session.
pub struct PayloadBuilder {
    session_id: String,
}

impl PayloadBuilder {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Freeze the collected signals into a payload stamped `timestamp_ms`.
    pub fn build(
        &self,
        timestamp_ms: i64,
        network: NetworkSignals,
        browser: BrowserSignals,
        behavioral: BehavioralSignals,
    ) -> TelemetryPayload {
        TelemetryPayload {
            session_id: self.session_id.clone(),
            timestamp: timestamp_ms,
            network,
            browser,
            behavioral,
        }
    }
}
