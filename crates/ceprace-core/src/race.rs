//! First-response-wins race across address backends.
//!
//! Every contender runs as its own task and delivers into one bounded
//! channel. The coordinator takes whatever arrives first, or gives up when
//! the shared deadline token fires.
//!
//! ```text
//!            ┌──────────────┐  try_send   ┌─────────────┐
//!  spawn ──▶ │ BrasilAPI    │ ──────────▶ │             │
//!            └──────────────┘             │  mpsc (≥2)  │ ──recv──▶ Won(address)
//!            ┌──────────────┐  try_send   │             │
//!  spawn ──▶ │ ViaCEP       │ ──────────▶ │             │
//!            └──────────────┘             └─────────────┘
//!                   ▲                                    ┌──────────┐
//!                   └──────── CancellationToken ◀─────── │ deadline │ ──▶ TimedOut
//!                                                        └──────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::adapters::{BrasilApiAdapter, ViaCepAdapter};
use crate::data_source::AddressSource;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::{Address, FetchError, LookupConfig, ProviderId};

/// Smallest result buffer, even for a single contender.
pub const MIN_CHANNEL_CAPACITY: usize = 2;

/// What one contender task did with its lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Delivery {
    /// The address was placed on the result channel.
    Delivered,
    /// The address was decoded but the coordinator had already gone.
    Discarded,
    /// No address was produced.
    Failed(FetchError),
    /// The task ended without reporting (panicked).
    Lost(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContenderReport {
    pub provider: ProviderId,
    pub delivery: Delivery,
}

/// Handles to the contender tasks of a finished race.
///
/// Dropping this detaches the tasks; they still finish on their own once
/// their request completes or the deadline cancels it.
#[derive(Debug)]
pub struct Stragglers {
    handles: Vec<(ProviderId, JoinHandle<Delivery>)>,
}

impl Stragglers {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every contender and collect what each one did.
    pub async fn settle(self) -> Vec<ContenderReport> {
        let mut reports = Vec::with_capacity(self.handles.len());
        for (provider, handle) in self.handles {
            let delivery = match handle.await {
                Ok(delivery) => delivery,
                Err(error) => Delivery::Lost(error.to_string()),
            };
            reports.push(ContenderReport { provider, delivery });
        }
        reports
    }
}

/// Winning side of a race.
#[derive(Debug)]
pub struct RaceSuccess {
    pub address: Address,
    pub winner: ProviderId,
    pub contenders: Vec<ProviderId>,
    pub latency_ms: u64,
    pub stragglers: Stragglers,
}

/// No contender delivered before the deadline.
///
/// Transport errors, bad bodies, not-found answers and slow backends all end
/// up here without distinction.
#[derive(Debug, Error)]
#[error("timed out after {budget_ms}ms waiting for an address")]
pub struct RaceTimeout {
    pub budget_ms: u64,
    pub contenders: Vec<ProviderId>,
    pub latency_ms: u64,
    pub stragglers: Stragglers,
}

pub type RaceResult = Result<RaceSuccess, RaceTimeout>;

/// Launches every registered source at once and keeps the first address.
pub struct RaceCoordinator {
    sources: Vec<Arc<dyn AddressSource>>,
    cancel_losers_on_win: bool,
}

impl RaceCoordinator {
    pub fn new(sources: Vec<Arc<dyn AddressSource>>) -> Self {
        Self {
            sources,
            cancel_losers_on_win: false,
        }
    }

    /// Both backends over one shared reqwest client.
    pub fn from_config(config: &LookupConfig) -> Self {
        Self::with_http_client(config, Arc::new(ReqwestHttpClient::new()))
    }

    /// Both backends over the given transport.
    pub fn with_http_client(config: &LookupConfig, http_client: Arc<dyn HttpClient>) -> Self {
        let brasilapi =
            BrasilApiAdapter::new(Arc::clone(&http_client), config.brasilapi_base_url.clone())
                .with_timeout_ms(config.timeout_ms);
        let viacep = ViaCepAdapter::new(http_client, config.viacep_base_url.clone())
            .with_timeout_ms(config.timeout_ms);

        Self::new(vec![Arc::new(brasilapi), Arc::new(viacep)])
            .with_cancel_losers_on_win(config.cancel_losers_on_win)
    }

    pub fn with_cancel_losers_on_win(mut self, enabled: bool) -> Self {
        self.cancel_losers_on_win = enabled;
        self
    }

    pub fn sources(&self) -> &[Arc<dyn AddressSource>] {
        &self.sources
    }

    pub fn contenders(&self) -> Vec<ProviderId> {
        self.sources.iter().map(|source| source.id()).collect()
    }

    /// Race every source for `postal_code`, waiting at most `budget`.
    pub async fn race(&self, postal_code: &str, budget: Duration) -> RaceResult {
        let started = Instant::now();
        let budget_ms = duration_ms(budget);
        let contenders = self.contenders();
        let token = deadline_token(started + budget);
        let (results, mut inbox) = mpsc::channel(channel_capacity(self.sources.len()));

        debug!(postal_code, contenders = contenders.len(), budget_ms, "race started");

        let handles = self
            .sources
            .iter()
            .map(|source| {
                let provider = source.id();
                let source = Arc::clone(source);
                let postal_code = postal_code.to_owned();
                let cancel = token.clone();
                let results = results.clone();
                let handle = tokio::spawn(async move {
                    contend(source.as_ref(), &postal_code, &cancel, &results).await
                });
                (provider, handle)
            })
            .collect::<Vec<_>>();
        // Only contenders hold senders now, so an all-failed race closes the
        // channel. The `Some` pattern below then disables that branch and the
        // deadline decides, matching a race where nobody answered.
        drop(results);

        let winner = tokio::select! {
            biased;
            Some(address) = inbox.recv() => Some(address),
            () = token.cancelled() => None,
        };
        let stragglers = Stragglers { handles };
        let latency_ms = elapsed_ms(started);

        match winner {
            Some(address) => {
                if self.cancel_losers_on_win {
                    token.cancel();
                }
                debug!(
                    postal_code,
                    winner = %address.source,
                    latency_ms,
                    "race decided"
                );
                Ok(RaceSuccess {
                    winner: address.source,
                    address,
                    contenders,
                    latency_ms,
                    stragglers,
                })
            }
            None => {
                warn!(postal_code, budget_ms, "no backend answered before the deadline");
                Err(RaceTimeout {
                    budget_ms,
                    contenders,
                    latency_ms,
                    stragglers,
                })
            }
        }
    }
}

/// Run one source against the shared token and deliver without blocking.
///
/// Every failure is swallowed here: it is logged and returned as a tagged
/// [`Delivery`], but nothing is ever sent on `results` for it.
pub async fn contend(
    source: &dyn AddressSource,
    postal_code: &str,
    cancel: &CancellationToken,
    results: &mpsc::Sender<Address>,
) -> Delivery {
    let provider = source.id();
    if cancel.is_cancelled() {
        debug!(%provider, postal_code, "contender skipped, race already over");
        return Delivery::Failed(FetchError::Cancelled);
    }

    // A response that completes on the same poll as the deadline is kept.
    let fetched = tokio::select! {
        biased;
        fetched = source.fetch(postal_code) => fetched,
        () = cancel.cancelled() => Err(FetchError::Cancelled),
    };

    let address = match fetched {
        Ok(address) => address,
        Err(error) => {
            debug!(%provider, postal_code, %error, "contender produced no address");
            return Delivery::Failed(error);
        }
    };

    match results.try_send(address) {
        Ok(()) => {
            debug!(%provider, postal_code, "contender delivered");
            Delivery::Delivered
        }
        // Full only happens if the buffer is smaller than the contender
        // count, which `channel_capacity` rules out.
        Err(TrySendError::Closed(_) | TrySendError::Full(_)) => {
            debug!(%provider, postal_code, "late address discarded");
            Delivery::Discarded
        }
    }
}

/// Buffer size that lets every contender send without a reader.
pub fn channel_capacity(contenders: usize) -> usize {
    contenders.max(MIN_CHANNEL_CAPACITY)
}

fn deadline_token(deadline: Instant) -> CancellationToken {
    let token = CancellationToken::new();
    let watchdog = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = tokio::time::sleep_until(deadline) => watchdog.cancel(),
            () = watchdog.cancelled() => {}
        }
    });
    token
}

fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis().min(u128::from(u64::MAX)) as u64
}

fn elapsed_ms(started: Instant) -> u64 {
    duration_ms(started.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{ScriptedHttpClient, ScriptedReply};

    const BRASILAPI_URL: &str = "http://brasilapi.test/api/cep/v1/01001000";
    const VIACEP_URL: &str = "http://viacep.test/ws/01001000/json/";
    const BRASILAPI_BODY: &str = r#"{"cep":"01001000","city":"São Paulo","state":"SP"}"#;
    const VIACEP_BODY: &str = r#"{"cep":"01001-000","localidade":"São Paulo","uf":"SP"}"#;

    fn config() -> LookupConfig {
        LookupConfig::default()
            .with_postal_code("01001000")
            .with_brasilapi_base_url("http://brasilapi.test")
            .with_viacep_base_url("http://viacep.test")
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn capacity_never_drops_below_two() {
        assert_eq!(channel_capacity(0), 2);
        assert_eq!(channel_capacity(1), 2);
        assert_eq!(channel_capacity(2), 2);
        assert_eq!(channel_capacity(5), 5);
    }

    #[test]
    fn coordinator_registers_both_backends() {
        let coordinator =
            RaceCoordinator::with_http_client(&config(), Arc::new(ScriptedHttpClient::new()));

        assert_eq!(
            coordinator.contenders(),
            vec![ProviderId::BrasilApi, ProviderId::ViaCep]
        );
        assert_eq!(coordinator.sources()[1].endpoint("01001000"), VIACEP_URL);
    }

    #[tokio::test(start_paused = true)]
    async fn first_arrival_wins() {
        let client = ScriptedHttpClient::new()
            .with_reply(BRASILAPI_URL, ScriptedReply::json(ms(300), BRASILAPI_BODY))
            .with_reply(VIACEP_URL, ScriptedReply::json(ms(120), VIACEP_BODY));
        let coordinator = RaceCoordinator::with_http_client(&config(), Arc::new(client));

        let success = coordinator
            .race("01001000", ms(1_000))
            .await
            .expect("viacep answers in time");

        assert_eq!(success.winner, ProviderId::ViaCep);
        assert_eq!(success.address.region, "SP");
        assert!(success.latency_ms >= 120 && success.latency_ms < 300);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_coordinator_times_out() {
        let coordinator = RaceCoordinator::new(Vec::new());

        let timeout = coordinator
            .race("01001000", ms(50))
            .await
            .expect_err("nobody to answer");

        assert!(timeout.contenders.is_empty());
        assert!(timeout.stragglers.is_empty());
        assert_eq!(
            timeout.to_string(),
            "timed out after 50ms waiting for an address"
        );
    }

    #[tokio::test]
    async fn contend_discards_when_receiver_is_gone() {
        let client = ScriptedHttpClient::new()
            .with_reply(VIACEP_URL, ScriptedReply::json(Duration::ZERO, VIACEP_BODY));
        let adapter = ViaCepAdapter::new(Arc::new(client), "http://viacep.test");
        let (results, inbox) = mpsc::channel(2);
        drop(inbox);

        let delivery = contend(&adapter, "01001000", &CancellationToken::new(), &results).await;

        assert_eq!(delivery, Delivery::Discarded);
    }

    #[tokio::test]
    async fn contend_skips_request_once_cancelled() {
        let client = Arc::new(
            ScriptedHttpClient::new()
                .with_reply(VIACEP_URL, ScriptedReply::json(Duration::ZERO, VIACEP_BODY)),
        );
        let transport: Arc<dyn HttpClient> = client.clone();
        let adapter = ViaCepAdapter::new(transport, "http://viacep.test");
        let (results, mut inbox) = mpsc::channel(2);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let delivery = contend(&adapter, "01001000", &cancel, &results).await;

        assert_eq!(delivery, Delivery::Failed(FetchError::Cancelled));
        assert_eq!(client.calls(), 0);
        assert!(inbox.try_recv().is_err());
    }

    /// Source whose answer lands on the same poll that fires the deadline.
    struct AnswersAtDeadline {
        deadline: CancellationToken,
    }

    impl AddressSource for AnswersAtDeadline {
        fn id(&self) -> ProviderId {
            ProviderId::BrasilApi
        }

        fn endpoint(&self, postal_code: &str) -> String {
            format!("http://brasilapi.test/api/cep/v1/{postal_code}")
        }

        fn fetch<'a>(&'a self, postal_code: &'a str) -> crate::FetchFuture<'a> {
            Box::pin(async move {
                self.deadline.cancel();
                Ok(Address {
                    postal_code: postal_code.to_owned(),
                    street: String::from("Praça da Sé"),
                    neighborhood: String::from("Sé"),
                    city: String::from("São Paulo"),
                    region: String::from("SP"),
                    source: ProviderId::BrasilApi,
                })
            })
        }
    }

    #[tokio::test]
    async fn contend_keeps_a_response_completed_alongside_the_deadline() {
        let cancel = CancellationToken::new();
        let source = AnswersAtDeadline {
            deadline: cancel.clone(),
        };
        let (results, mut inbox) = mpsc::channel(2);

        let delivery = contend(&source, "01001000", &cancel, &results).await;

        assert!(cancel.is_cancelled());
        assert_eq!(delivery, Delivery::Delivered);
        let address = inbox.try_recv().expect("address was delivered");
        assert_eq!(address.city, "São Paulo");
    }

    #[tokio::test]
    async fn contend_sends_nothing_on_failure() {
        let client = ScriptedHttpClient::new().with_reply(
            VIACEP_URL,
            ScriptedReply::json(Duration::ZERO, r#"{"erro":true}"#),
        );
        let adapter = ViaCepAdapter::new(Arc::new(client), "http://viacep.test");
        let (results, mut inbox) = mpsc::channel(2);

        let delivery = contend(&adapter, "01001000", &CancellationToken::new(), &results).await;

        assert_eq!(delivery, Delivery::Failed(FetchError::NotFound));
        assert!(inbox.try_recv().is_err());
    }

    #[test]
    fn delivery_serializes_with_status_tag() {
        let value = serde_json::to_value(ContenderReport {
            provider: ProviderId::BrasilApi,
            delivery: Delivery::Failed(FetchError::Status(404)),
        })
        .expect("serializable");

        assert_eq!(value["provider"], "brasilapi");
        assert_eq!(value["delivery"]["status"], "failed");
        assert_eq!(value["delivery"]["detail"], "upstream returned status 404");
    }
}
