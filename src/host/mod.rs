//! Capability ports onto the hosting environment.
//!
//! Each collector depends on one narrow capability ("can render 2D",
//! "can process audio", "can measure text") so it runs unchanged against a
//! real browser bridge, the headless host, or an in-memory fake.
//! An absent API is `None` in [`Capabilities`]; a blocked or throwing API
//! returns `Err(CapabilityError)`.

pub mod headless;

use crate::core::payload::{NetworkSignals, PageTiming, ScreenSignals};
use crate::error::CapabilityError;
use crate::storage::ScopedStorage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use headless::HeadlessHost;

/// Navigator-level properties as exposed by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigatorInfo {
    pub user_agent: String,
    pub language: String,
    pub languages: Vec<String>,
    pub platform: String,
    pub vendor: String,
    /// IANA zone name, when the host exposes one
    pub time_zone: Option<String>,
    /// Minutes west of UTC, as `Date.getTimezoneOffset` reports it
    pub time_zone_offset_minutes: i32,
    pub hardware_concurrency: Option<u32>,
    pub device_memory_gb: Option<f64>,
    pub max_touch_points: u32,
    pub cookie_enabled: bool,
    /// `navigator.webdriver`
    pub webdriver: bool,
}

/// Storage APIs whose availability is probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Local,
    Session,
    IndexedDb,
    Cookies,
}

/// One-shot environment properties and the page clock.
pub trait HostEnvironment: Send + Sync {
    fn screen(&self) -> ScreenSignals;

    fn navigator(&self) -> NavigatorInfo;

    /// Network Information API, if present.
    fn connection(&self) -> Option<NetworkSignals>;

    /// Whether a storage API is usable. May throw.
    fn probe_storage(&self, kind: StorageKind) -> Result<bool, CapabilityError>;

    /// Whether a global (window/document/navigator) property is defined.
    fn has_global(&self, name: &str) -> bool;

    /// Plugin names in host order. May throw.
    fn plugins(&self) -> Result<Vec<String>, CapabilityError>;

    /// Whether the visitor enabled Do-Not-Track.
    fn do_not_track(&self) -> bool;

    /// Milliseconds since page start (monotonic).
    fn elapsed_ms(&self) -> u64;

    /// Navigation timing, when the host records it.
    fn page_timing(&self) -> PageTiming {
        PageTiming::default()
    }
}

/// A fixed-step 2D drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Fill `rect` with a horizontal linear gradient.
    GradientRect {
        rect: (f64, f64, f64, f64),
        stops: Vec<(f64, String)>,
    },
    FillText {
        text: String,
        font: String,
        color: String,
        x: f64,
        y: f64,
    },
    StrokeArc {
        center: (f64, f64),
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        color: String,
        line_width: f64,
    },
}

/// An offscreen 2D surface.
pub trait Canvas2d {
    fn draw(&mut self, command: &DrawCommand) -> Result<(), CapabilityError>;

    /// Serialize the rendered surface (a data URL in browsers).
    fn encode(&mut self) -> Result<String, CapabilityError>;
}

/// "Can render 2D."
pub trait CanvasProvider: Send + Sync {
    fn create_surface(&self, width: u32, height: u32) -> Result<Box<dyn Canvas2d>, CapabilityError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// Offline graph: oscillator → analyser → compressor → gain → destination.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioGraphSpec {
    pub sample_rate: u32,
    pub frames: usize,
    pub waveform: Waveform,
    pub frequency_hz: f64,
    pub analyser_fft_size: u32,
    pub compressor_threshold_db: f64,
    pub compressor_knee_db: f64,
    pub compressor_ratio: f64,
    pub compressor_attack_s: f64,
    pub compressor_release_s: f64,
    pub gain: f64,
}

/// A constructed offline audio graph.
pub trait OfflineAudioGraph {
    /// Run the graph and return the first output channel.
    fn render(&mut self) -> Result<Vec<f32>, CapabilityError>;

    /// Release the graph. Called exactly once, on success or failure.
    fn close(&mut self);
}

/// "Can process audio."
pub trait AudioProvider: Send + Sync {
    fn create_graph(&self, spec: &AudioGraphSpec) -> Result<Box<dyn OfflineAudioGraph>, CapabilityError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
}

/// "Can measure text."
pub trait TextMeasurer: Send + Sync {
    /// Measure `text` rendered with a CSS font shorthand such as
    /// `72px "Arial", monospace`.
    fn measure(&self, text: &str, font: &str) -> Result<TextMetrics, CapabilityError>;
}

/// Raw WebGL context parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebGlParameters {
    pub vendor: String,
    pub renderer: String,
    pub version: String,
    pub shading_language_version: String,
    /// Present only with `WEBGL_debug_renderer_info`
    pub unmasked_vendor: Option<String>,
    pub unmasked_renderer: Option<String>,
    pub max_texture_size: u32,
    pub extensions: Vec<String>,
}

/// "Can open a WebGL context."
pub trait WebGlProbe: Send + Sync {
    fn parameters(&self) -> Result<WebGlParameters, CapabilityError>;
}

/// Everything the pipeline may use on this host.
#[derive(Clone)]
pub struct Capabilities {
    pub environment: Arc<dyn HostEnvironment>,
    pub storage: Arc<dyn ScopedStorage>,
    pub canvas: Option<Arc<dyn CanvasProvider>>,
    pub audio: Option<Arc<dyn AudioProvider>>,
    pub fonts: Option<Arc<dyn TextMeasurer>>,
    pub webgl: Option<Arc<dyn WebGlProbe>>,
}

impl Capabilities {
    /// Environment and storage only; every rendering capability absent.
    pub fn new(environment: Arc<dyn HostEnvironment>, storage: Arc<dyn ScopedStorage>) -> Self {
        Self {
            environment,
            storage,
            canvas: None,
            audio: None,
            fonts: None,
            webgl: None,
        }
    }

    pub fn with_canvas(mut self, canvas: Arc<dyn CanvasProvider>) -> Self {
        self.canvas = Some(canvas);
        self
    }

    pub fn with_audio(mut self, audio: Arc<dyn AudioProvider>) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn with_fonts(mut self, fonts: Arc<dyn TextMeasurer>) -> Self {
        self.fonts = Some(fonts);
        self
    }

    pub fn with_webgl(mut self, webgl: Arc<dyn WebGlProbe>) -> Self {
        self.webgl = Some(webgl);
        self
    }
}
