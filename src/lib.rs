//! Scrybe Collector - privacy-bounded device and interaction signals for
//! bot detection.
//!
//! This library gathers rendering fingerprints, environment properties and
//! interaction timing, assembles them into a bounded telemetry payload, and
//! signs it with HMAC-SHA256 before a single submission to the ingestion
//! gateway.
//!
//! # Privacy Guarantees
//!
//! - **Consent first**: nothing is collected unless consent is granted, and
//!   Do-Not-Track suppresses collection when respected
//! - **No content**: key values, typed text and page content are never read
//! - **Bounded**: every sample sequence has a hard cap; overflow is dropped
//! - **Isolated failures**: a blocked API degrades to "unsupported"
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         Orchestrator                             │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  consent / DNT ──▶ fingerprint (canvas, audio, fonts, webgl, env)│
//! │                          │                                       │
//! │  host events ──▶ EventSink ──▶ BehavioralCollector ──snapshot──┐ │
//! │                          ▼                                     ▼ │
//! │                    PayloadBuilder ──▶ Signer ──▶ Transport ──▶ gateway
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use scrybe_collector::{Capabilities, Config, HeadlessHost, MemoryStorage, Orchestrator};
//!
//! # async fn run() -> Result<(), scrybe_collector::ScrybeError> {
//! let mut config = Config::new("https://api.example.com", "shared-key");
//! config.consent_given = Some(true);
//!
//! let caps = Capabilities::new(Arc::new(HeadlessHost::new()), Arc::new(MemoryStorage::new()));
//! let orchestrator = Orchestrator::new(config, caps)?;
//! let outcome = orchestrator.init().await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

pub mod collector;
pub mod config;
pub mod consent;
pub mod core;
pub mod error;
pub mod fingerprint;
pub mod hashing;
pub mod host;
pub mod orchestrator;
pub mod session;
pub mod signer;
pub mod storage;
pub mod transport;

// Re-export key types at crate root for convenience
pub use collector::{BehavioralCollector, CollectorError, EventSink, InteractionEvent, MouseButton};
pub use config::{Config, ConfigError};
pub use consent::{ConsentManager, ConsentState};
pub use core::{BehavioralConfig, BehavioralSignals, PayloadBuilder, TelemetryPayload};
pub use error::{CapabilityError, ScrybeError, SignError, StorageError, TransportError};
pub use host::{Capabilities, HeadlessHost, HostEnvironment};
pub use orchestrator::{InitOutcome, Lifecycle, Orchestrator, SuppressReason};
pub use session::SessionIdentity;
pub use signer::SignedEnvelope;
pub use storage::{DisabledStorage, FileStorage, MemoryStorage, ScopedStorage};
pub use transport::{HttpTransport, IngestReceipt, SubmissionOutcome, Transport, UnloadSignal};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Privacy declaration that can be displayed to users.
pub const PRIVACY_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║              SCRYBE COLLECTOR - PRIVACY DECLARATION              ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This collector gathers device and interaction signals to tell   ║
║  people apart from automation. It runs only with consent.        ║
║                                                                  ║
║  ✓ WHAT WE CAPTURE:                                              ║
║    • Rendering fingerprints (canvas, audio, fonts, GPU)          ║
║    • Screen, locale and browser capability properties            ║
║    • Pointer, scroll and click positions (sampled, capped)       ║
║    • When keys are pressed (timing only)                         ║
║                                                                  ║
║  ✗ WHAT WE NEVER CAPTURE:                                        ║
║    • Which keys you press (no passwords, messages, etc.)         ║
║    • Form contents or page text                                  ║
║    • Cookies or browsing history                                 ║
║                                                                  ║
║  Do-Not-Track is honored. Every submission is signed and sent    ║
║  once; no data leaves without your consent.                      ║
║                                                                  ║
║  You can revoke consent anytime with:                            ║
║    scrybe-collect consent revoke                                 ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
