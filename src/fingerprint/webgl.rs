//! WebGL parameters fingerprint.

use crate::hashing::sha256_hex;
use crate::host::{WebGlParameters, WebGlProbe};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebGlFingerprint {
    pub hash: String,
    pub vendor: String,
    pub renderer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmasked_vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmasked_renderer: Option<String>,
    pub version: String,
    pub shading_language_version: String,
    pub max_texture_size: u32,
    /// Supported extensions, sorted
    pub extensions: Vec<String>,
    pub extension_count: usize,
}

/// Read GPU parameters. `None` when WebGL is absent or blocked.
pub fn collect_webgl(probe: Option<&dyn WebGlProbe>) -> Option<WebGlFingerprint> {
    let parameters = match probe?.parameters() {
        Ok(parameters) => parameters,
        Err(e) => {
            debug!("WebGL unsupported: {}", e);
            return None;
        }
    };

    let hash = sha256_hex(canonical_parameters(&parameters));
    let mut extensions = parameters.extensions;
    extensions.sort();

    Some(WebGlFingerprint {
        hash,
        vendor: parameters.vendor,
        renderer: parameters.renderer,
        unmasked_vendor: parameters.unmasked_vendor,
        unmasked_renderer: parameters.unmasked_renderer,
        version: parameters.version,
        shading_language_version: parameters.shading_language_version,
        max_texture_size: parameters.max_texture_size,
        extension_count: extensions.len(),
        extensions,
    })
}

/// `|`-joined parameters with extensions sorted, so host ordering of the
/// extension list does not change the hash.
pub fn canonical_parameters(parameters: &WebGlParameters) -> String {
    let mut extensions = parameters.extensions.clone();
    extensions.sort();

    [
        parameters.vendor.as_str(),
        parameters.renderer.as_str(),
        parameters.version.as_str(),
        parameters.shading_language_version.as_str(),
        parameters.unmasked_vendor.as_deref().unwrap_or(""),
        parameters.unmasked_renderer.as_deref().unwrap_or(""),
        parameters.max_texture_size.to_string().as_str(),
        extensions.join(",").as_str(),
    ]
    .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CapabilityError;

    struct FakeProbe(Result<WebGlParameters, CapabilityError>);

    impl WebGlProbe for FakeProbe {
        fn parameters(&self) -> Result<WebGlParameters, CapabilityError> {
            self.0.clone()
        }
    }

    fn parameters() -> WebGlParameters {
        WebGlParameters {
            vendor: "WebKit".to_string(),
            renderer: "WebKit WebGL".to_string(),
            version: "WebGL 1.0".to_string(),
            shading_language_version: "WebGL GLSL ES 1.0".to_string(),
            unmasked_vendor: Some("Google Inc. (NVIDIA)".to_string()),
            unmasked_renderer: Some("ANGLE (NVIDIA GeForce RTX 3070)".to_string()),
            max_texture_size: 16384,
            extensions: vec!["OES_texture_float".to_string(), "ANGLE_instanced_arrays".to_string()],
        }
    }

    #[test]
    fn test_collect_webgl() {
        let fingerprint = collect_webgl(Some(&FakeProbe(Ok(parameters())))).unwrap();
        assert_eq!(fingerprint.hash.len(), 64);
        assert_eq!(fingerprint.extension_count, 2);
        assert_eq!(
            fingerprint.extensions,
            vec!["ANGLE_instanced_arrays", "OES_texture_float"]
        );
        assert_eq!(
            fingerprint.unmasked_renderer.as_deref(),
            Some("ANGLE (NVIDIA GeForce RTX 3070)")
        );
    }

    #[test]
    fn test_extension_order_does_not_matter() {
        let mut reordered = parameters();
        reordered.extensions.reverse();
        assert_eq!(
            canonical_parameters(&parameters()),
            canonical_parameters(&reordered)
        );
    }

    #[test]
    fn test_unsupported_is_omitted() {
        assert_eq!(collect_webgl(None), None);
        let blocked = FakeProbe(Err(CapabilityError::unavailable("webgl context")));
        assert_eq!(collect_webgl(Some(&blocked)), None);
    }
}
