//! In-process store for single-use, time-limited invite tokens.
//!
//! An admin issues a token bound to a payload (an agency and an email), and a
//! later unauthenticated caller exchanges it exactly once for that payload.
//! Never-issued, expired and already-redeemed tokens are indistinguishable to
//! the caller.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Uppercase alphanumeric, easy to read out over the phone.
pub const DEFAULT_TOKEN_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const DEFAULT_TOKEN_LENGTH: usize = 6;
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
pub const DEFAULT_SWEEP_INTERVAL_MINUTES: u64 = 30;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 64;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum InviteStoreError {
    #[error("Invalid invite token settings: {0}")]
    InvalidSettings(String),

    #[error("Could not generate a unique invite token after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct InviteTokenSettings {
    /// How long a token stays redeemable after issuance.
    pub lifetime: Duration,
    /// Period of the background sweep.
    pub sweep_interval: std::time::Duration,
    pub alphabet: Vec<char>,
    pub length: usize,
    /// Generation attempts before `issue` gives up.
    pub max_attempts: u32,
}

impl Default for InviteTokenSettings {
    fn default() -> Self {
        Self {
            lifetime: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
            sweep_interval: std::time::Duration::from_secs(DEFAULT_SWEEP_INTERVAL_MINUTES * 60),
            alphabet: DEFAULT_TOKEN_ALPHABET.chars().collect(),
            length: DEFAULT_TOKEN_LENGTH,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl InviteTokenSettings {
    pub fn validate(&self) -> Result<(), InviteStoreError> {
        if self.alphabet.is_empty() {
            return Err(InviteStoreError::InvalidSettings(
                "alphabet must not be empty".into(),
            ));
        }
        if self.length == 0 {
            return Err(InviteStoreError::InvalidSettings(
                "token length must be at least 1".into(),
            ));
        }
        if self.lifetime <= Duration::zero() {
            return Err(InviteStoreError::InvalidSettings(
                "token lifetime must be positive".into(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(InviteStoreError::InvalidSettings(
                "sweep interval must be positive".into(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(InviteStoreError::InvalidSettings(
                "max attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct InviteEntry<P> {
    payload: P,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl<P> InviteEntry<P> {
    fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

pub struct InviteTokenStore<P> {
    entries: Mutex<HashMap<String, InviteEntry<P>>>,
    settings: InviteTokenSettings,
    clock: Arc<dyn Clock>,
}

impl<P> InviteTokenStore<P> {
    pub fn new(settings: InviteTokenSettings) -> Result<Self, InviteStoreError> {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(
        settings: InviteTokenSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, InviteStoreError> {
        settings.validate()?;
        Ok(Self {
            entries: Mutex::new(HashMap::new()),
            settings,
            clock,
        })
    }

    pub fn settings(&self) -> &InviteTokenSettings {
        &self.settings
    }

    // The table is only ever mutated by single inserts and removes, so a
    // poisoned guard still holds a consistent map.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, InviteEntry<P>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn generate_candidate(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.settings.length)
            .map(|_| self.settings.alphabet[rng.gen_range(0..self.settings.alphabet.len())])
            .collect()
    }

    /// Stores `payload` under a fresh token and returns the token.
    ///
    /// A candidate that keys a live entry is thrown away and regenerated. An
    /// entry that has expired but not been swept yet is not live, so its key
    /// may be handed out again.
    pub fn issue(&self, payload: P) -> Result<String, InviteStoreError> {
        let mut entries = self.lock();
        let now = self.clock.now();

        for attempt in 1..=self.settings.max_attempts {
            let token = self.generate_candidate();
            let taken = entries
                .get(&token)
                .map(|entry| entry.is_valid(now))
                .unwrap_or(false);

            if taken {
                debug!("Invite token collision on attempt {}, regenerating", attempt);
                continue;
            }

            // Saturate rather than overflow for very long lifetimes
            let expires_at = now
                .checked_add_signed(self.settings.lifetime)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            entries.insert(
                token.clone(),
                InviteEntry {
                    payload,
                    issued_at: now,
                    expires_at,
                },
            );
            debug!("Issued invite token, {} entries held", entries.len());
            return Ok(token);
        }

        warn!(
            "Invite token keyspace exhausted after {} attempts ({} entries held)",
            self.settings.max_attempts,
            entries.len()
        );
        Err(InviteStoreError::Exhausted {
            attempts: self.settings.max_attempts,
        })
    }

    /// Consumes `token`, returning its payload if it was still valid.
    ///
    /// The entry is removed whether or not it had expired.
    pub fn redeem(&self, token: &str) -> Option<P> {
        let mut entries = self.lock();
        let entry = entries.remove(token)?;

        let now = self.clock.now();
        if entry.is_valid(now) {
            debug!(
                "Redeemed invite token issued {}s ago",
                (now - entry.issued_at).num_seconds()
            );
            Some(entry.payload)
        } else {
            debug!("Discarded expired invite token on redemption");
            None
        }
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn sweep(&self) -> usize {
        let mut entries = self.lock();
        let now = self.clock.now();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_valid(now));
        before - entries.len()
    }

    /// Number of entries held, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<P: Send + 'static> InviteTokenStore<P> {
    /// Starts the periodic sweep on the current tokio runtime.
    ///
    /// The first sweep runs one full interval after this call.
    pub fn spawn_sweeper(store: Arc<Self>) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let period = store.settings.sweep_interval;
        let first_tick = Instant::now() + period;

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = store.sweep();
                        if removed > 0 {
                            info!("Invite sweep removed {} expired tokens", removed);
                        } else {
                            debug!("Invite sweep found nothing to remove");
                        }
                    }
                    _ = &mut shutdown_rx => {
                        debug!("Invite sweeper stopping");
                        break;
                    }
                }
            }
        });

        SweeperHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }
}

/// Owner of a running sweeper task.
pub struct SweeperHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signals the sweeper to stop and waits for it to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            // The receiver is gone only if the task already ended.
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!("Invite sweeper task ended abnormally: {}", e);
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        if self.shutdown.is_some() {
            self.task.abort();
        }
    }
}
