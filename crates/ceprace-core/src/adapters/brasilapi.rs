use std::sync::Arc;

use serde::Deserialize;

use super::{decode_object, fetch_body, join_url, DEFAULT_REQUEST_TIMEOUT_MS};
use crate::data_source::{AddressSource, FetchFuture};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::{Address, FetchError, ProviderId};

/// BrasilAPI CEP v1 adapter.
///
/// BrasilAPI answers an unknown CEP with a 404, which surfaces as
/// [`FetchError::Status`].
#[derive(Clone)]
pub struct BrasilApiAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl Default for BrasilApiAdapter {
    fn default() -> Self {
        Self::new(Arc::new(ReqwestHttpClient::new()), Self::DEFAULT_BASE_URL)
    }
}

impl BrasilApiAdapter {
    pub const DEFAULT_BASE_URL: &'static str = "https://brasilapi.com.br";

    pub fn new(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn parse(body: &str) -> Result<Address, FetchError> {
        let payload: BrasilApiPayload = decode_object(body)?;
        Ok(payload.normalize())
    }
}

impl AddressSource for BrasilApiAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::BrasilApi
    }

    fn endpoint(&self, postal_code: &str) -> String {
        join_url(
            &self.base_url,
            &format!("/api/cep/v1/{}", urlencoding::encode(postal_code)),
        )
    }

    fn fetch<'a>(&'a self, postal_code: &'a str) -> FetchFuture<'a> {
        Box::pin(async move {
            let body = fetch_body(
                self.http_client.as_ref(),
                self.endpoint(postal_code),
                self.timeout_ms,
            )
            .await?;
            Self::parse(&body)
        })
    }
}

// BrasilAPI wire format. Nulls and missing keys both become empty strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct BrasilApiPayload {
    cep: Option<String>,
    street: Option<String>,
    neighborhood: Option<String>,
    city: Option<String>,
    state: Option<String>,
}

impl BrasilApiPayload {
    fn normalize(self) -> Address {
        Address {
            postal_code: self.cep.unwrap_or_default(),
            street: self.street.unwrap_or_default(),
            neighborhood: self.neighborhood.unwrap_or_default(),
            city: self.city.unwrap_or_default(),
            region: self.state.unwrap_or_default(),
            source: ProviderId::BrasilApi,
        }
    }
}
