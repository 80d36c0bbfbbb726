//! One-shot environment properties.
//!
//! Pure reads of host-exposed values. Storage probes that throw read as
//! `false`; plugin enumeration is capped to keep the payload small.

use crate::core::payload::{
    NavigatorSignals, NetworkSignals, QuirkSignals, ScreenSignals, StorageSignals,
};
use crate::host::{HostEnvironment, StorageKind};
use tracing::debug;

/// Maximum plugin names reported.
pub const MAX_PLUGINS: usize = 20;

/// Globals injected by automation frameworks.
pub const AUTOMATION_MARKERS: &[&str] = &[
    "_phantom",
    "callPhantom",
    "__nightmare",
    "domAutomation",
    "domAutomationController",
    "_selenium",
    "__selenium_unwrapped",
    "__webdriver_evaluate",
    "__driver_evaluate",
    "__webdriver_script_fn",
    "__fxdriver_unwrapped",
    "_Selenium_IDE_Recorder",
    "__playwright",
    "__pwInitScripts",
    "Cypress",
];

const HEADLESS_UA_MARKERS: &[&str] = &["HeadlessChrome", "PhantomJS", "Headless"];

/// Everything the environment collector reads.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentSignals {
    pub network: NetworkSignals,
    pub screen: ScreenSignals,
    pub navigator: NavigatorSignals,
    pub quirks: QuirkSignals,
    pub storage: StorageSignals,
    pub plugins: Vec<String>,
}

pub fn collect_environment(env: &dyn HostEnvironment) -> EnvironmentSignals {
    let info = env.navigator();

    let quirks = QuirkSignals {
        webdriver: info.webdriver,
        automation_markers: AUTOMATION_MARKERS
            .iter()
            .filter(|marker| env.has_global(marker))
            .map(|marker| marker.to_string())
            .collect(),
        headless_user_agent: HEADLESS_UA_MARKERS
            .iter()
            .any(|marker| info.user_agent.contains(marker)),
        empty_languages: info.languages.is_empty(),
    };

    let navigator = NavigatorSignals {
        user_agent: info.user_agent,
        language: info.language,
        languages: info.languages,
        platform: info.platform,
        vendor: info.vendor,
        time_zone: info.time_zone,
        time_zone_offset_minutes: info.time_zone_offset_minutes,
        hardware_concurrency: info.hardware_concurrency,
        device_memory_gb: info.device_memory_gb,
        max_touch_points: info.max_touch_points,
        cookie_enabled: info.cookie_enabled,
        do_not_track: env.do_not_track(),
    };

    EnvironmentSignals {
        network: env.connection().unwrap_or_default(),
        screen: env.screen(),
        navigator,
        quirks,
        storage: probe_storage(env),
        plugins: collect_plugins(env),
    }
}

fn probe_storage(env: &dyn HostEnvironment) -> StorageSignals {
    let probe = |kind: StorageKind| match env.probe_storage(kind) {
        Ok(available) => available,
        Err(e) => {
            debug!("Storage probe {:?} failed: {}", kind, e);
            false
        }
    };

    StorageSignals {
        local_storage: probe(StorageKind::Local),
        session_storage: probe(StorageKind::Session),
        indexed_db: probe(StorageKind::IndexedDb),
        cookies: probe(StorageKind::Cookies),
    }
}

fn collect_plugins(env: &dyn HostEnvironment) -> Vec<String> {
    match env.plugins() {
        Ok(plugins) => plugins.into_iter().take(MAX_PLUGINS).collect(),
        Err(e) => {
            debug!("Plugin enumeration failed: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CapabilityError;
    use crate::host::NavigatorInfo;

    struct FakeEnv {
        plugins: usize,
        markers: Vec<&'static str>,
        user_agent: &'static str,
    }

    impl HostEnvironment for FakeEnv {
        fn screen(&self) -> ScreenSignals {
            ScreenSignals {
                width: 2560,
                height: 1440,
                ..Default::default()
            }
        }

        fn navigator(&self) -> NavigatorInfo {
            NavigatorInfo {
                user_agent: self.user_agent.to_string(),
                languages: vec!["en-GB".to_string()],
                webdriver: !self.markers.is_empty(),
                ..Default::default()
            }
        }

        fn connection(&self) -> Option<NetworkSignals> {
            None
        }

        fn probe_storage(&self, kind: StorageKind) -> Result<bool, CapabilityError> {
            match kind {
                StorageKind::Local => Ok(true),
                StorageKind::Session => Err(CapabilityError::failed("sessionStorage", "SecurityError")),
                StorageKind::IndexedDb => Ok(true),
                StorageKind::Cookies => Ok(false),
            }
        }

        fn has_global(&self, name: &str) -> bool {
            self.markers.contains(&name)
        }

        fn plugins(&self) -> Result<Vec<String>, CapabilityError> {
            Ok((0..self.plugins).map(|i| format!("Plugin {i}")).collect())
        }

        fn do_not_track(&self) -> bool {
            true
        }

        fn elapsed_ms(&self) -> u64 {
            0
        }
    }

    #[test]
    fn test_throwing_probe_reads_false() {
        let env = FakeEnv {
            plugins: 0,
            markers: vec![],
            user_agent: "Mozilla/5.0",
        };
        let signals = collect_environment(&env);
        assert_eq!(
            signals.storage,
            StorageSignals {
                local_storage: true,
                session_storage: false,
                indexed_db: true,
                cookies: false,
            }
        );
        assert!(signals.navigator.do_not_track);
        assert_eq!(signals.screen.width, 2560);
        assert_eq!(signals.network, NetworkSignals::default());
    }

    #[test]
    fn test_plugins_capped() {
        let env = FakeEnv {
            plugins: 64,
            markers: vec![],
            user_agent: "Mozilla/5.0",
        };
        let signals = collect_environment(&env);
        assert_eq!(signals.plugins.len(), MAX_PLUGINS);
        assert_eq!(signals.plugins[0], "Plugin 0");
    }

    #[test]
    fn test_automation_markers() {
        let env = FakeEnv {
            plugins: 0,
            markers: vec!["__playwright", "callPhantom"],
            user_agent: "Mozilla/5.0 HeadlessChrome/120.0",
        };
        let quirks = collect_environment(&env).quirks;
        assert!(quirks.webdriver);
        assert!(quirks.headless_user_agent);
        assert_eq!(quirks.automation_markers, vec!["callPhantom", "__playwright"]);
        assert!(!quirks.empty_languages);
    }
}
