//! Live exchange rate subscription for a single token.
//!
//! A subscription owns a background task that fetches the token's rate when
//! it starts, whenever the token changes, on every refresh interval and on
//! demand. Consumers read the latest [`RateState`] or watch it for changes.
//!
//! State machine per token:
//!
//! ```text
//! Idle -> Loading -> Ready
//!                 \-> Error
//! Ready | Error -> Loading   (timer tick or refresh())
//! ```
//!
//! Dropping the subscription (or calling [`RateSubscription::unsubscribe`])
//! aborts the task and its timer. A fetch that completes after that is never
//! published.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::cache::RateCache;
use crate::convert;
use crate::models::{normalize_token, ExchangeRate};

/// Default interval between automatic refreshes (5 minutes).
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default fallback rate: 850 fiat units per token.
pub const DEFAULT_FALLBACK_RATE: Decimal = Decimal::from_parts(850, 0, 0, false, 0);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateStatus {
    Idle,
    Loading,
    Ready,
    Error,
}

impl std::fmt::Display for RateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Ready => write!(f, "ready"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Snapshot of a subscription.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateState {
    pub token: String,
    pub status: RateStatus,
    pub loading: bool,
    /// Last successfully fetched rate for `token`; kept across failed refreshes.
    pub rate: Option<ExchangeRate>,
    pub error: Option<String>,
}

impl RateState {
    fn idle(token: String) -> Self {
        Self {
            token,
            status: RateStatus::Idle,
            loading: false,
            rate: None,
            error: None,
        }
    }

    fn begin_loading(&mut self) {
        self.status = RateStatus::Loading;
        self.loading = true;
    }

    fn apply(&mut self, result: Option<ExchangeRate>) {
        self.loading = false;
        match result {
            Some(rate) => {
                self.status = RateStatus::Ready;
                self.rate = Some(rate);
                self.error = None;
            }
            None => {
                self.status = RateStatus::Error;
                self.error = Some(format!("Failed to fetch exchange rate for {}", self.token));
            }
        }
    }
}

/// Subscription settings.
#[derive(Clone, Debug)]
pub struct SubscriptionOptions {
    /// Rate used while no live rate is available.
    pub fallback_rate: Decimal,
    pub refresh_interval: Duration,
}

impl Default for SubscriptionOptions {
    fn default() -> Self {
        Self {
            fallback_rate: DEFAULT_FALLBACK_RATE,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

#[derive(Debug)]
enum Command {
    Refresh,
    SetToken(String),
}

#[derive(Clone, Copy)]
enum FetchKind {
    /// Mount or token change: a fresh cache entry is good enough.
    Cached,
    /// Timer tick or manual refresh: always go to the source.
    Fresh,
}

/// Handle to a running rate subscription.
pub struct RateSubscription {
    state: watch::Receiver<RateState>,
    commands: mpsc::UnboundedSender<Command>,
    fallback_rate: Decimal,
    task: JoinHandle<()>,
}

impl RateSubscription {
    /// Starts watching `token`. Must be called inside a Tokio runtime.
    pub fn spawn(cache: Arc<RateCache>, token: &str, options: SubscriptionOptions) -> Self {
        let token = normalize_token(token);
        let (state_tx, state_rx) = watch::channel(RateState::idle(token.clone()));
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(run_subscription(
            cache,
            token,
            options.refresh_interval,
            state_tx,
            command_rx,
        ));

        Self {
            state: state_rx,
            commands: command_tx,
            fallback_rate: options.fallback_rate,
            task,
        }
    }

    pub fn state(&self) -> RateState {
        self.state.borrow().clone()
    }

    /// A receiver that yields every state change.
    pub fn watch(&self) -> watch::Receiver<RateState> {
        self.state.clone()
    }

    pub fn token(&self) -> String {
        self.state.borrow().token.clone()
    }

    pub fn exchange_rate(&self) -> Option<ExchangeRate> {
        self.state.borrow().rate.clone()
    }

    pub fn fallback_rate(&self) -> Decimal {
        self.fallback_rate
    }

    /// The live rate if one has been fetched, else the fallback.
    pub fn effective_rate(&self) -> Decimal {
        self.state
            .borrow()
            .rate
            .as_ref()
            .map(|r| r.rate)
            .unwrap_or(self.fallback_rate)
    }

    /// Whether [`effective_rate`](Self::effective_rate) is the fallback.
    pub fn is_fallback(&self) -> bool {
        self.state.borrow().rate.is_none()
    }

    pub fn fiat_to_token(&self, fiat_amount: Decimal) -> Decimal {
        convert::fiat_to_token(fiat_amount, Some(self.effective_rate()))
    }

    pub fn token_to_fiat(&self, token_amount: Decimal) -> Decimal {
        convert::token_to_fiat(token_amount, Some(self.effective_rate()))
    }

    /// Fetch now instead of waiting for the next tick.
    pub fn refresh(&self) {
        let _ = self.commands.send(Command::Refresh);
    }

    /// Switch to another token. The old token's rate is discarded.
    pub fn set_token(&self, token: &str) {
        let _ = self.commands.send(Command::SetToken(normalize_token(token)));
    }

    /// Stops the background task. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for RateSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_subscription(
    cache: Arc<RateCache>,
    mut token: String,
    refresh_interval: Duration,
    state: watch::Sender<RateState>,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    let mut ticker = interval_at(Instant::now() + refresh_interval, refresh_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut pending = Some(FetchKind::Cached);

    loop {
        if let Some(kind) = pending.take() {
            let requested = token.clone();
            state.send_modify(RateState::begin_loading);

            let fetch = async {
                match kind {
                    FetchKind::Cached => cache.get(&requested).await,
                    FetchKind::Fresh => cache.refresh(&requested).await,
                }
            };
            tokio::pin!(fetch);

            let outcome = loop {
                tokio::select! {
                    result = &mut fetch => break Some(result),
                    command = commands.recv() => match command {
                        None => return,
                        Some(Command::Refresh) => {}
                        Some(Command::SetToken(next)) if next != token => {
                            token = next;
                            state.send_replace(RateState::idle(token.clone()));
                            ticker.reset();
                            pending = Some(FetchKind::Cached);
                            break None;
                        }
                        Some(Command::SetToken(_)) => {}
                    },
                }
            };

            if let Some(result) = outcome {
                if result.is_none() {
                    log::warn!("Using fallback rate for {} until next refresh", requested);
                }
                state.send_modify(|s| s.apply(result));
            }
            continue;
        }

        tokio::select! {
            _ = ticker.tick() => pending = Some(FetchKind::Fresh),
            command = commands.recv() => match command {
                None => return,
                Some(Command::Refresh) => pending = Some(FetchKind::Fresh),
                Some(Command::SetToken(next)) => {
                    if next != token {
                        token = next;
                        state.send_replace(RateState::idle(token.clone()));
                        ticker.reset();
                        pending = Some(FetchKind::Cached);
                    }
                }
            },
        }
    }
}
