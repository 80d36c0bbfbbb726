//! Canvas fingerprint.
//!
//! A fixed scene (gradient, two overlapping text runs in different
//! families, a stroked arc) is rendered offscreen and the encoded surface is
//! hashed. Differences in GPU, driver and font rasterizer make the hash a
//! stable per-device signal.

use crate::error::CapabilityError;
use crate::hashing::sha256_hex;
use crate::host::{CanvasProvider, DrawCommand};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

pub const CANVAS_WIDTH: u32 = 280;
pub const CANVAS_HEIGHT: u32 = 60;

const CANVAS_TEXT: &str = "Cwm fjordbank glyphs vext quiz, \u{1F603}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasFingerprint {
    pub hash: String,
    pub supported: bool,
}

impl CanvasFingerprint {
    pub fn unsupported() -> Self {
        Self {
            hash: String::new(),
            supported: false,
        }
    }
}

/// The fixed drawing sequence. Order and values are part of the fingerprint.
pub fn scene() -> Vec<DrawCommand> {
    vec![
        DrawCommand::GradientRect {
            rect: (0.0, 0.0, f64::from(CANVAS_WIDTH), f64::from(CANVAS_HEIGHT)),
            stops: vec![
                (0.0, "#ff6600".to_string()),
                (0.5, "#006699".to_string()),
                (1.0, "#66cc00".to_string()),
            ],
        },
        DrawCommand::FillText {
            text: CANVAS_TEXT.to_string(),
            font: "14px 'Arial'".to_string(),
            color: "#f60".to_string(),
            x: 2.0,
            y: 15.0,
        },
        DrawCommand::FillText {
            text: CANVAS_TEXT.to_string(),
            font: "18px 'Times New Roman'".to_string(),
            color: "rgba(102, 204, 0, 0.7)".to_string(),
            x: 4.0,
            y: 17.0,
        },
        DrawCommand::StrokeArc {
            center: (220.0, 30.0),
            radius: 20.0,
            start_angle: 0.0,
            end_angle: 2.0 * PI,
            color: "rgba(0, 102, 153, 0.9)".to_string(),
            line_width: 2.0,
        },
    ]
}

/// Render, encode and hash the scene. Never fails: any error yields
/// `{hash: "", supported: false}`.
pub fn collect_canvas(provider: Option<&dyn CanvasProvider>) -> CanvasFingerprint {
    let Some(provider) = provider else {
        debug!("Canvas unsupported: no 2D surface");
        return CanvasFingerprint::unsupported();
    };

    match render(provider) {
        Ok(encoded) => CanvasFingerprint {
            hash: sha256_hex(encoded),
            supported: true,
        },
        Err(e) => {
            debug!("Canvas unsupported: {}", e);
            CanvasFingerprint::unsupported()
        }
    }
}

fn render(provider: &dyn CanvasProvider) -> Result<String, CapabilityError> {
    let mut surface = provider.create_surface(CANVAS_WIDTH, CANVAS_HEIGHT)?;
    for command in scene() {
        surface.draw(&command)?;
    }
    let encoded = surface.encode()?;
    // browsers return a bare "data:," for surfaces they refuse to encode
    if encoded.is_empty() || encoded == "data:," {
        return Err(CapabilityError::failed("encode", "empty surface"));
    }
    Ok(encoded)
}
