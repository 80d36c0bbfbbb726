//! Consent state machine.
//!
//! `unknown → {granted, denied}` only through [`ConsentManager::set_consent`].
//! The initial state comes from configuration, then storage, then denial.

use crate::storage::ScopedStorage;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Storage key holding `"1"` (granted) or `"0"` (denied).
pub const CONSENT_STORAGE_KEY: &str = "scrybe_consent";

/// Time zones treated as EU/EEA for the stricter-default heuristic.
const EU_TIME_ZONES: &[&str] = &[
    "Europe/Amsterdam",
    "Europe/Athens",
    "Europe/Berlin",
    "Europe/Bratislava",
    "Europe/Brussels",
    "Europe/Bucharest",
    "Europe/Budapest",
    "Europe/Busingen",
    "Europe/Copenhagen",
    "Europe/Dublin",
    "Europe/Helsinki",
    "Europe/Lisbon",
    "Europe/Ljubljana",
    "Europe/Luxembourg",
    "Europe/Madrid",
    "Europe/Malta",
    "Europe/Mariehamn",
    "Europe/Oslo",
    "Europe/Paris",
    "Europe/Prague",
    "Europe/Riga",
    "Europe/Rome",
    "Europe/Sofia",
    "Europe/Stockholm",
    "Europe/Tallinn",
    "Europe/Vaduz",
    "Europe/Vienna",
    "Europe/Vilnius",
    "Europe/Warsaw",
    "Europe/Zagreb",
    "Atlantic/Azores",
    "Atlantic/Canary",
    "Atlantic/Madeira",
    "Atlantic/Reykjavik",
    "Asia/Famagusta",
    "Asia/Nicosia",
];

/// Tri-state consent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentState {
    Unknown,
    Granted,
    Denied,
}

impl ConsentState {
    /// Decode a stored value. Anything other than `"1"`/`"0"` is unknown.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("1") => ConsentState::Granted,
            Some("0") => ConsentState::Denied,
            _ => ConsentState::Unknown,
        }
    }

    /// The stored encoding, if the state is decided.
    pub fn stored_value(self) -> Option<&'static str> {
        match self {
            ConsentState::Granted => Some("1"),
            ConsentState::Denied => Some("0"),
            ConsentState::Unknown => None,
        }
    }

    pub fn is_granted(self) -> bool {
        self == ConsentState::Granted
    }
}

impl std::fmt::Display for ConsentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsentState::Unknown => write!(f, "unknown"),
            ConsentState::Granted => write!(f, "granted"),
            ConsentState::Denied => write!(f, "denied"),
        }
    }
}

/// Best-effort EU heuristic from an IANA zone name.
///
/// Never authoritative: it only selects the stricter default.
pub fn is_eu_visitor(time_zone: &str) -> bool {
    let name = time_zone
        .parse::<Tz>()
        .map(|tz| tz.name().to_string())
        .unwrap_or_else(|_| time_zone.to_string());
    EU_TIME_ZONES.iter().any(|zone| name.starts_with(zone))
}

/// Owns the consent record for one page lifetime.
pub struct ConsentManager {
    state: ConsentState,
    storage: Arc<dyn ScopedStorage>,
    eu_visitor: bool,
}

impl ConsentManager {
    /// Resolve the initial state: configuration, then storage, then denied.
    pub fn new(
        configured: Option<bool>,
        storage: Arc<dyn ScopedStorage>,
        time_zone: Option<&str>,
    ) -> Self {
        let eu_visitor = time_zone.map(is_eu_visitor).unwrap_or(false);

        let state = match configured {
            Some(true) => ConsentState::Granted,
            Some(false) => ConsentState::Denied,
            None => match Self::read_stored(storage.as_ref()) {
                ConsentState::Unknown => ConsentState::Denied,
                stored => stored,
            },
        };

        debug!(
            "Consent resolved to {} (eu_visitor={}, configured={:?})",
            state, eu_visitor, configured
        );

        Self {
            state,
            storage,
            eu_visitor,
        }
    }

    /// The stored record, `Unknown` when absent or unreadable.
    pub fn read_stored(storage: &dyn ScopedStorage) -> ConsentState {
        match storage.get(CONSENT_STORAGE_KEY) {
            Ok(value) => ConsentState::from_stored(value.as_deref()),
            Err(e) => {
                debug!("Consent storage unreadable: {}", e);
                ConsentState::Unknown
            }
        }
    }

    pub fn state(&self) -> ConsentState {
        self.state
    }

    pub fn is_granted(&self) -> bool {
        self.state.is_granted()
    }

    /// Whether the visitor looks like an EU/EEA visitor. Heuristic only.
    pub fn requires_explicit_consent(&self) -> bool {
        self.eu_visitor
    }

    /// Record a decision. Persistence failures are swallowed.
    pub fn set_consent(&mut self, granted: bool) -> ConsentState {
        self.state = if granted {
            ConsentState::Granted
        } else {
            ConsentState::Denied
        };

        if let Some(value) = self.state.stored_value() {
            if let Err(e) = self.storage.set(CONSENT_STORAGE_KEY, value) {
                debug!("Consent not persisted: {}", e);
            }
        }

        self.state
    }
}
