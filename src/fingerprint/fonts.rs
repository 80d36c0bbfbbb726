//! Installed-font detection by text metrics.
//!
//! A font that is not installed silently falls back to the generic family
//! requested after it, producing metrics identical to that family's
//! baseline. Any measurable difference against a baseline means the
//! candidate rendered with its own glyphs.

use crate::error::CapabilityError;
use crate::hashing::sha256_hex;
use crate::host::{TextMeasurer, TextMetrics};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const FONT_TEST_STRING: &str = "mmmmmmmmmmlli";
pub const FONT_TEST_SIZE: &str = "72px";
pub const BASELINE_FAMILIES: [&str; 3] = ["monospace", "sans-serif", "serif"];
/// Metric difference above which a candidate counts as present
pub const DEFAULT_FONT_TOLERANCE: f64 = 0.5;

/// Curated cross-platform candidates.
pub const CANDIDATE_FONTS: &[&str] = &[
    "Andale Mono",
    "Arial",
    "Arial Black",
    "Arial Narrow",
    "Arial Unicode MS",
    "Avenir",
    "Baskerville",
    "Bitstream Vera Sans Mono",
    "Book Antiqua",
    "Bookman Old Style",
    "Calibri",
    "Cambria",
    "Candara",
    "Century Gothic",
    "Comic Sans MS",
    "Consolas",
    "Constantia",
    "Corbel",
    "Courier",
    "Courier New",
    "DejaVu Sans",
    "DejaVu Serif",
    "Droid Sans",
    "Franklin Gothic Medium",
    "Futura",
    "Garamond",
    "Geneva",
    "Georgia",
    "Gill Sans",
    "Helvetica",
    "Helvetica Neue",
    "Impact",
    "Liberation Mono",
    "Liberation Sans",
    "Lucida Console",
    "Lucida Grande",
    "Lucida Sans Unicode",
    "Menlo",
    "Monaco",
    "MS Gothic",
    "MS Sans Serif",
    "Noto Sans",
    "Optima",
    "Palatino",
    "Palatino Linotype",
    "Roboto",
    "Segoe UI",
    "SF Pro Text",
    "Tahoma",
    "Times",
    "Times New Roman",
    "Trebuchet MS",
    "Ubuntu",
    "Verdana",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontFingerprint {
    /// Detected fonts, sorted
    pub fonts: Vec<String>,
    pub hash: String,
}

/// Detect installed candidates. `None` when the measurer is absent, a
/// baseline cannot be measured, or nothing is detected.
pub fn detect_fonts(measurer: Option<&dyn TextMeasurer>, tolerance: f64) -> Option<FontFingerprint> {
    let Some(measurer) = measurer else {
        debug!("Font detection unsupported: no measurement context");
        return None;
    };

    let baselines = match measure_baselines(measurer) {
        Ok(baselines) => baselines,
        Err(e) => {
            debug!("Font detection unsupported: {}", e);
            return None;
        }
    };

    let mut fonts: Vec<String> = CANDIDATE_FONTS
        .iter()
        .filter(|candidate| is_present(measurer, candidate, &baselines, tolerance))
        .map(|candidate| candidate.to_string())
        .collect();

    if fonts.is_empty() {
        return None;
    }

    fonts.sort();
    fonts.dedup();
    let hash = sha256_hex(fonts.join(","));
    Some(FontFingerprint { fonts, hash })
}

fn measure_baselines(measurer: &dyn TextMeasurer) -> Result<[TextMetrics; 3], CapabilityError> {
    let mut baselines = [TextMetrics {
        width: 0.0,
        height: 0.0,
    }; 3];
    for (slot, family) in baselines.iter_mut().zip(BASELINE_FAMILIES) {
        *slot = measurer.measure(FONT_TEST_STRING, &format!("{FONT_TEST_SIZE} {family}"))?;
    }
    Ok(baselines)
}

fn is_present(
    measurer: &dyn TextMeasurer,
    candidate: &str,
    baselines: &[TextMetrics; 3],
    tolerance: f64,
) -> bool {
    BASELINE_FAMILIES
        .iter()
        .zip(baselines)
        .any(|(family, baseline)| {
            let font = format!("{FONT_TEST_SIZE} \"{candidate}\", {family}");
            match measurer.measure(FONT_TEST_STRING, &font) {
                Ok(metrics) => {
                    (metrics.width - baseline.width).abs() > tolerance
                        || (metrics.height - baseline.height).abs() > tolerance
                }
                Err(_) => false,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Measures like a browser with a fixed set of installed fonts.
    struct FakeMeasurer {
        installed: Vec<(&'static str, TextMetrics)>,
        fail_baselines: bool,
    }

    fn baseline_for(family: &str) -> TextMetrics {
        match family {
            "monospace" => TextMetrics {
                width: 561.6,
                height: 82.0,
            },
            "sans-serif" => TextMetrics {
                width: 520.0,
                height: 83.0,
            },
            _ => TextMetrics {
                width: 500.3,
                height: 84.0,
            },
        }
    }

    impl TextMeasurer for FakeMeasurer {
        fn measure(&self, _text: &str, font: &str) -> Result<TextMetrics, CapabilityError> {
            let spec = font.trim_start_matches("72px ");
            let fallback = spec.rsplit(", ").next().unwrap_or(spec);
            if self.fail_baselines && !spec.contains('"') {
                return Err(CapabilityError::unavailable("measureText"));
            }
            for (name, metrics) in &self.installed {
                if spec.starts_with(&format!("\"{name}\"")) {
                    return Ok(*metrics);
                }
            }
            Ok(baseline_for(fallback))
        }
    }

    fn measurer_with(installed: Vec<(&'static str, TextMetrics)>) -> FakeMeasurer {
        FakeMeasurer {
            installed,
            fail_baselines: false,
        }
    }

    #[test]
    fn test_absent_fonts_never_detected() {
        let measurer = measurer_with(vec![]);
        assert_eq!(detect_fonts(Some(&measurer), DEFAULT_FONT_TOLERANCE), None);
    }

    #[test]
    fn test_present_fonts_detected_and_sorted() {
        let measurer = measurer_with(vec![
            (
                "Verdana",
                TextMetrics {
                    width: 610.0,
                    height: 88.0,
                },
            ),
            (
                "Arial",
                TextMetrics {
                    width: 530.0,
                    height: 83.0,
                },
            ),
        ]);

        let result = detect_fonts(Some(&measurer), DEFAULT_FONT_TOLERANCE).unwrap();
        assert_eq!(result.fonts, vec!["Arial".to_string(), "Verdana".to_string()]);
        assert_eq!(result.hash, sha256_hex("Arial,Verdana"));
    }

    #[test]
    fn test_difference_within_tolerance_ignored() {
        // matches the monospace baseline within 0.5 and the others exactly
        let measurer = measurer_with(vec![(
            "Courier",
            TextMetrics {
                width: 561.9,
                height: 82.0,
            },
        )]);
        // still differs from the sans-serif and serif baselines
        let result = detect_fonts(Some(&measurer), DEFAULT_FONT_TOLERANCE).unwrap();
        assert_eq!(result.fonts, vec!["Courier".to_string()]);

        let tolerant = detect_fonts(Some(&measurer), 100.0);
        assert_eq!(tolerant, None);
    }

    #[test]
    fn test_unavailable_context() {
        assert_eq!(detect_fonts(None, DEFAULT_FONT_TOLERANCE), None);
        let broken = FakeMeasurer {
            installed: vec![],
            fail_baselines: true,
        };
        assert_eq!(detect_fonts(Some(&broken), DEFAULT_FONT_TOLERANCE), None);
    }
}
