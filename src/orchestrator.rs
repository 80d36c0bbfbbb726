//! Submission lifecycle.
//!
//! ```text
//! uninitialized ──init──▶ initializing ──sent──▶ active
//!       │                      │
//!       │ DNT / no consent     └──failed / aborted──▶ uninitialized
//!       ▼
//!   suppressed ──set_consent(true)──▶ initializing
//! ```
//!
//! Once a submission has been delivered, re-granting consent after a
//! revocation returns to `active` without sending again. After `unload()`
//! nothing is collected and the behavioral collector is never restarted.
//!
//! Locks are held only across synchronous steps, never across the network
//! call, so host event dispatch keeps flowing into the behavioral collector
//! while a submission is in flight.

use crate::collector::{BehavioralCollector, CollectorError, EventSink};
use crate::config::Config;
use crate::consent::{ConsentManager, ConsentState};
use crate::core::payload::{PayloadBuilder, TelemetryPayload};
use crate::error::ScrybeError;
use crate::fingerprint::collect_browser;
use crate::host::Capabilities;
use crate::session::SessionIdentity;
use crate::signer::SignedEnvelope;
use crate::transport::{submit, HttpTransport, IngestReceipt, SubmissionOutcome, Transport, UnloadSignal};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Initializing,
    /// A submission landed. Terminal for the page lifetime.
    Active,
    /// Collection is not allowed.
    Suppressed,
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Lifecycle::Uninitialized => "uninitialized",
            Lifecycle::Initializing => "initializing",
            Lifecycle::Active => "active",
            Lifecycle::Suppressed => "suppressed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    DoNotTrack,
    ConsentDenied,
}

/// Result of one `init()` call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    Submitted(IngestReceipt),
    Suppressed(SuppressReason),
    /// Another cycle is in flight or already completed.
    AlreadyRunning,
    /// The page unloaded before or during transmission.
    Aborted,
}

pub struct Orchestrator {
    config: Config,
    capabilities: Capabilities,
    transport: Arc<dyn Transport>,
    unload: UnloadSignal,
    session: SessionIdentity,
    state: Mutex<Lifecycle>,
    /// A submission has been accepted during this page lifetime
    delivered: AtomicBool,
    consent: Mutex<ConsentManager>,
    collector: Mutex<BehavioralCollector>,
}

impl Orchestrator {
    /// Orchestrator submitting over HTTPS to `config.api_url`.
    pub fn new(config: Config, capabilities: Capabilities) -> Result<Self, ScrybeError> {
        let transport = HttpTransport::new(&config.api_url, config.timeout)?;
        Ok(Self::with_transport(config, capabilities, Arc::new(transport)))
    }

    pub fn with_transport(
        config: Config,
        capabilities: Capabilities,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let time_zone = capabilities.environment.navigator().time_zone;
        let consent = ConsentManager::new(
            config.consent_given,
            Arc::clone(&capabilities.storage),
            time_zone.as_deref(),
        );
        let session = SessionIdentity::new(Arc::clone(&capabilities.storage));
        let collector = BehavioralCollector::new(config.behavioral.clone());

        Self {
            config,
            capabilities,
            transport,
            unload: UnloadSignal::new(),
            session,
            state: Mutex::new(Lifecycle::Uninitialized),
            delivered: AtomicBool::new(false),
            consent: Mutex::new(consent),
            collector: Mutex::new(collector),
        }
    }

    pub fn state(&self) -> Lifecycle {
        *lock(&self.state)
    }

    pub fn consent_state(&self) -> ConsentState {
        lock(&self.consent).state()
    }

    /// Whether the visitor looks like an EU/EEA visitor. Heuristic only.
    pub fn requires_explicit_consent(&self) -> bool {
        lock(&self.consent).requires_explicit_consent()
    }

    pub fn session_id(&self) -> String {
        self.session.get_or_create()
    }

    /// Handle for the host's interaction-event dispatch.
    pub fn event_sink(&self) -> EventSink {
        lock(&self.collector).sink()
    }

    pub fn unload_signal(&self) -> UnloadSignal {
        self.unload.clone()
    }

    /// Start behavioral collection ahead of `init()` when collection is
    /// allowed. Returns whether the collector is running.
    pub fn observe(&self) -> bool {
        if let Some(reason) = self.suppress_reason() {
            debug!("Not observing: {:?}", reason);
            return false;
        }
        let mut collector = lock(&self.collector);
        // checked under the collector lock so a concurrent unload() stops us
        if self.unload.is_fired() {
            debug!("Not observing: page unloaded");
            return false;
        }
        if collector.start().is_ok() {
            info!("Behavioral collection started");
        }
        collector.is_running()
    }

    /// Run one submission cycle if allowed.
    ///
    /// Only transport and encoding failures are returned as errors; they
    /// move the lifecycle back to `Uninitialized` so a later call starts a
    /// fresh cycle.
    pub async fn init(&self) -> Result<InitOutcome, ScrybeError> {
        {
            let mut state = lock(&self.state);
            if self.unload.is_fired() {
                debug!("init() ignored: page unloaded");
                return Ok(InitOutcome::Aborted);
            }
            match *state {
                Lifecycle::Initializing | Lifecycle::Active => {
                    debug!("init() ignored: already {}", *state);
                    return Ok(InitOutcome::AlreadyRunning);
                }
                Lifecycle::Uninitialized | Lifecycle::Suppressed => {}
            }

            if let Some(reason) = self.suppress_reason() {
                info!("Collection suppressed: {:?}", reason);
                *state = Lifecycle::Suppressed;
                return Ok(InitOutcome::Suppressed(reason));
            }

            *state = Lifecycle::Initializing;
        }
        info!("Collection cycle starting");

        let result = self.run_cycle().await;

        let mut state = lock(&self.state);
        // a revocation during the cycle keeps the lifecycle suppressed
        let settle = |state: &mut Lifecycle, next: Lifecycle| {
            if *state == Lifecycle::Initializing {
                *state = next;
            }
        };
        match result {
            Ok(SubmissionOutcome::Delivered(receipt)) => {
                info!(session_id = %receipt.session_id, is_new = receipt.is_new, "Submission accepted");
                self.delivered.store(true, Ordering::SeqCst);
                settle(&mut state, Lifecycle::Active);
                Ok(InitOutcome::Submitted(receipt))
            }
            Ok(SubmissionOutcome::Aborted) => {
                info!("Submission abandoned on unload");
                settle(&mut state, Lifecycle::Uninitialized);
                Ok(InitOutcome::Aborted)
            }
            Err(e) => {
                warn!("Submission failed: {}", e);
                settle(&mut state, Lifecycle::Uninitialized);
                Err(e)
            }
        }
    }

    /// Record a consent decision.
    ///
    /// Granting from `Suppressed` immediately re-enters the cycle and
    /// returns its outcome, unless a submission was already delivered, in
    /// which case the lifecycle returns to `Active`. Revoking stops and
    /// clears behavioral collection.
    pub async fn set_consent(&self, granted: bool) -> Result<Option<InitOutcome>, ScrybeError> {
        let consent = lock(&self.consent).set_consent(granted);
        info!("Consent set to {}", consent);

        if !granted {
            {
                let mut collector = lock(&self.collector);
                collector.stop();
                collector.clear();
            }
            *lock(&self.state) = Lifecycle::Suppressed;
            return Ok(None);
        }

        {
            let mut state = lock(&self.state);
            if *state != Lifecycle::Suppressed {
                return Ok(None);
            }
            if self.delivered.load(Ordering::SeqCst) {
                debug!("Consent re-granted after delivery; not resubmitting");
                *state = Lifecycle::Active;
                return Ok(None);
            }
        }
        self.init().await.map(Some)
    }

    /// Page teardown: abandon any in-flight transmission and stop listening.
    pub fn unload(&self) {
        self.unload.fire();
        lock(&self.collector).stop();
        debug!("Unloaded");
    }

    fn suppress_reason(&self) -> Option<SuppressReason> {
        if self.config.respect_do_not_track && self.capabilities.environment.do_not_track() {
            return Some(SuppressReason::DoNotTrack);
        }
        if !lock(&self.consent).is_granted() {
            return Some(SuppressReason::ConsentDenied);
        }
        None
    }

    async fn run_cycle(&self) -> Result<SubmissionOutcome, ScrybeError> {
        let payload = self.assemble();
        let timestamp_ms = payload.timestamp;
        let body = payload.to_body()?;
        let envelope = SignedEnvelope::seal(body, timestamp_ms, self.config.api_key.as_bytes())?;
        debug!(nonce = %envelope.nonce, "Payload signed");

        Ok(submit(self.transport.as_ref(), &envelope, &self.unload).await?)
    }

    /// One consistent read of every signal source.
    fn assemble(&self) -> TelemetryPayload {
        let (network, browser) = collect_browser(&self.capabilities, self.config.font_tolerance);
        let environment = &self.capabilities.environment;

        let behavioral = {
            let mut collector = lock(&self.collector);
            if self.unload.is_fired() {
                debug!("Page unloaded; behavioral collector stays stopped");
            } else if let Err(CollectorError::AlreadyRunning) = collector.start() {
                debug!("Behavioral collector already running");
            }
            let mut signals = collector.snapshot(environment.elapsed_ms(), browser.screen.viewport_area());
            signals.timing.page = environment.page_timing();
            signals
        };
        debug!(events = behavioral.interaction.total_events, "Behavioral snapshot taken");

        PayloadBuilder::new(self.session.get_or_create()).build(
            Utc::now().timestamp_millis(),
            network,
            browser,
            behavioral,
        )
    }
}

/// Lock, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
