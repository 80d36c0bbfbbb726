//! In-memory host and transport fakes shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use scrybe_collector::core::payload::{NetworkSignals, PageTiming, ScreenSignals};
use scrybe_collector::error::{CapabilityError, TransportError};
use scrybe_collector::host::{
    AudioGraphSpec, AudioProvider, Canvas2d, CanvasProvider, DrawCommand, HostEnvironment,
    NavigatorInfo, OfflineAudioGraph, StorageKind, TextMeasurer, TextMetrics,
};
use scrybe_collector::signer::SignedEnvelope;
use scrybe_collector::transport::{IngestReceipt, Transport};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const TEST_KEY: &str = "integration-test-key";

/// Counts every call a collector makes into the fake host.
#[derive(Debug, Default)]
pub struct CallCounts {
    pub canvas: AtomicUsize,
    pub audio: AtomicUsize,
    pub fonts: AtomicUsize,
    pub storage_probes: AtomicUsize,
}

impl CallCounts {
    pub fn collector_calls(&self) -> usize {
        self.canvas.load(Ordering::SeqCst)
            + self.audio.load(Ordering::SeqCst)
            + self.fonts.load(Ordering::SeqCst)
            + self.storage_probes.load(Ordering::SeqCst)
    }
}

pub struct FakeHost {
    pub do_not_track: bool,
    pub clock_ms: AtomicU64,
    pub calls: Arc<CallCounts>,
}

impl FakeHost {
    pub fn new(do_not_track: bool, calls: Arc<CallCounts>) -> Self {
        Self {
            do_not_track,
            clock_ms: AtomicU64::new(1_000),
            calls,
        }
    }
}

impl HostEnvironment for FakeHost {
    fn screen(&self) -> ScreenSignals {
        ScreenSignals {
            width: 1440,
            height: 900,
            avail_width: 1440,
            avail_height: 875,
            color_depth: 30,
            pixel_ratio: 2.0,
            viewport_width: 1280,
            viewport_height: 720,
        }
    }

    fn navigator(&self) -> NavigatorInfo {
        NavigatorInfo {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)".to_string(),
            language: "de-DE".to_string(),
            languages: vec!["de-DE".to_string(), "en".to_string()],
            platform: "MacIntel".to_string(),
            vendor: "Apple Computer, Inc.".to_string(),
            time_zone: Some("Europe/Berlin".to_string()),
            time_zone_offset_minutes: -60,
            hardware_concurrency: Some(8),
            device_memory_gb: Some(8.0),
            max_touch_points: 0,
            cookie_enabled: true,
            webdriver: false,
        }
    }

    fn connection(&self) -> Option<NetworkSignals> {
        Some(NetworkSignals {
            effective_type: Some("4g".to_string()),
            downlink_mbps: Some(10.0),
            rtt_ms: Some(50),
            save_data: Some(false),
        })
    }

    fn probe_storage(&self, kind: StorageKind) -> Result<bool, CapabilityError> {
        self.calls.storage_probes.fetch_add(1, Ordering::SeqCst);
        match kind {
            StorageKind::IndexedDb => Err(CapabilityError::failed("indexedDB.open", "InvalidStateError")),
            _ => Ok(true),
        }
    }

    fn has_global(&self, _name: &str) -> bool {
        false
    }

    fn plugins(&self) -> Result<Vec<String>, CapabilityError> {
        Ok(vec!["PDF Viewer".to_string()])
    }

    fn do_not_track(&self) -> bool {
        self.do_not_track
    }

    fn elapsed_ms(&self) -> u64 {
        self.clock_ms.load(Ordering::SeqCst)
    }

    fn page_timing(&self) -> PageTiming {
        PageTiming {
            dom_content_loaded_ms: Some(420),
            load_ms: Some(910),
            time_to_first_byte_ms: Some(85),
        }
    }
}

/// Canvas that "renders" by logging commands.
pub struct FakeCanvas {
    pub calls: Arc<CallCounts>,
}

struct LogSurface(String);

impl Canvas2d for LogSurface {
    fn draw(&mut self, command: &DrawCommand) -> Result<(), CapabilityError> {
        self.0.push_str(&format!("{command:?}"));
        Ok(())
    }

    fn encode(&mut self) -> Result<String, CapabilityError> {
        Ok(format!("data:image/png;base64,{}", self.0.len()))
    }
}

impl CanvasProvider for FakeCanvas {
    fn create_surface(&self, _width: u32, _height: u32) -> Result<Box<dyn Canvas2d>, CapabilityError> {
        self.calls.canvas.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(LogSurface(String::new())))
    }
}

pub struct FakeAudio {
    pub calls: Arc<CallCounts>,
}

struct SineGraph(usize);

impl OfflineAudioGraph for SineGraph {
    fn render(&mut self) -> Result<Vec<f32>, CapabilityError> {
        Ok((0..self.0).map(|i| (i as f32 * 0.3).sin() * 0.01).collect())
    }

    fn close(&mut self) {}
}

impl AudioProvider for FakeAudio {
    fn create_graph(&self, spec: &AudioGraphSpec) -> Result<Box<dyn OfflineAudioGraph>, CapabilityError> {
        self.calls.audio.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SineGraph(spec.frames)))
    }
}

/// Reports "Helvetica" as the only installed candidate.
pub struct FakeFonts {
    pub calls: Arc<CallCounts>,
}

impl TextMeasurer for FakeFonts {
    fn measure(&self, _text: &str, font: &str) -> Result<TextMetrics, CapabilityError> {
        self.calls.fonts.fetch_add(1, Ordering::SeqCst);
        let width = if font.contains("\"Helvetica\"") { 540.0 } else { 500.0 };
        Ok(TextMetrics { width, height: 80.0 })
    }
}

/// Records every envelope and answers with a fixed receipt.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<SignedEnvelope>>,
    pub delay_ms: u64,
}

impl RecordingTransport {
    pub fn with_delay(delay_ms: u64) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            delay_ms,
        }
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last_body(&self) -> serde_json::Value {
        let sent = self.sent.lock().unwrap();
        let envelope = sent.last().expect("nothing sent");
        serde_json::from_str(&envelope.body).expect("body is JSON")
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, envelope: &SignedEnvelope) -> Result<IngestReceipt, TransportError> {
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        self.sent.lock().unwrap().push(envelope.clone());
        Ok(IngestReceipt {
            session_id: "gw-1".to_string(),
            is_new: true,
            timestamp: "2024-01-22T10:00:00Z".to_string(),
        })
    }
}
