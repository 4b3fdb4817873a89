use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use super::{decode_object, fetch_body, join_url, DEFAULT_REQUEST_TIMEOUT_MS};
use crate::data_source::{AddressSource, FetchFuture};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::{Address, FetchError, ProviderId};

/// ViaCEP JSON adapter.
///
/// ViaCEP answers an unknown CEP with `200 {"erro": true}` rather than a 404.
#[derive(Clone)]
pub struct ViaCepAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl Default for ViaCepAdapter {
    fn default() -> Self {
        Self::new(Arc::new(ReqwestHttpClient::new()), Self::DEFAULT_BASE_URL)
    }
}

impl ViaCepAdapter {
    pub const DEFAULT_BASE_URL: &'static str = "http://viacep.com.br";

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
        let payload: ViaCepPayload = decode_object(body)?;
        if payload.is_not_found() {
            return Err(FetchError::NotFound);
        }
        Ok(payload.normalize())
    }
}

impl AddressSource for ViaCepAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::ViaCep
    }

    fn endpoint(&self, postal_code: &str) -> String {
        join_url(
            &self.base_url,
            &format!("/ws/{}/json/", urlencoding::encode(postal_code)),
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

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ViaCepPayload {
    cep: Option<String>,
    logradouro: Option<String>,
    bairro: Option<String>,
    localidade: Option<String>,
    uf: Option<String>,
    // Older deployments send the string "true".
    erro: Option<Value>,
}

impl ViaCepPayload {
    fn is_not_found(&self) -> bool {
        match &self.erro {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    fn normalize(self) -> Address {
        Address {
            postal_code: self.cep.unwrap_or_default(),
            street: self.logradouro.unwrap_or_default(),
            neighborhood: self.bairro.unwrap_or_default(),
            city: self.localidade.unwrap_or_default(),
            region: self.uf.unwrap_or_default(),
            source: ProviderId::ViaCep,
        }
    }
}
