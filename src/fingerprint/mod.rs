//! One-shot device fingerprint collectors.
//!
//! Each collector isolates its own failures: an absent or throwing API
//! degrades to an unsupported or omitted value and never surfaces as an
//! error.

pub mod audio;
pub mod canvas;
pub mod environment;
pub mod fonts;
pub mod webgl;

pub use audio::{collect_audio, AudioFingerprint};
pub use canvas::{collect_canvas, CanvasFingerprint};
pub use environment::{collect_environment, EnvironmentSignals};
pub use fonts::{detect_fonts, FontFingerprint, DEFAULT_FONT_TOLERANCE};
pub use webgl::{collect_webgl, WebGlFingerprint};

use crate::core::payload::{BrowserSignals, NetworkSignals};
use crate::host::Capabilities;
use std::thread;
use tracing::debug;

/// Run every one-shot collector against `caps`.
///
/// Canvas, audio and font probing are independent and run on scoped
/// threads; environment reads happen on the calling thread meanwhile.
pub fn collect_browser(caps: &Capabilities, font_tolerance: f64) -> (NetworkSignals, BrowserSignals) {
    let (environment, canvas, audio, fonts) = thread::scope(|scope| {
        let canvas = scope.spawn(|| collect_canvas(caps.canvas.as_deref()));
        // absent API omits the block; a failing one reports supported: false
        let audio = scope.spawn(|| caps.audio.as_deref().map(|a| collect_audio(Some(a))));
        let fonts = scope.spawn(|| detect_fonts(caps.fonts.as_deref(), font_tolerance));

        let environment = collect_environment(&*caps.environment);
        (
            environment,
            canvas.join().unwrap_or_else(|_| CanvasFingerprint::unsupported()),
            audio.join().unwrap_or(None),
            fonts.join().unwrap_or(None),
        )
    });
    let webgl = collect_webgl(caps.webgl.as_deref());

    debug!(
        canvas = canvas.supported,
        audio = audio.as_ref().map(|a| a.supported),
        fonts = fonts.as_ref().map(|f| f.fonts.len()),
        webgl = webgl.is_some(),
        "One-shot collection finished"
    );

    let browser = BrowserSignals {
        canvas,
        webgl,
        audio,
        fonts,
        screen: environment.screen,
        navigator: environment.navigator,
        quirks: environment.quirks,
        storage: environment.storage,
        plugins: environment.plugins,
    };
    (environment.network, browser)
}
