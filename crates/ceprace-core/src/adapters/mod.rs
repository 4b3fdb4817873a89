//! Backend adapters.
//!
//! | Adapter | Backend | Path template |
//! |---------|---------|---------------|
//! | [`BrasilApiAdapter`] | BrasilAPI | `/api/cep/v1/{cep}` |
//! | [`ViaCepAdapter`] | ViaCEP | `/ws/{cep}/json/` |

mod brasilapi;
mod viacep;

pub use brasilapi::BrasilApiAdapter;
pub use viacep::ViaCepAdapter;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::http_client::{HttpClient, HttpRequest};
use crate::FetchError;

/// Per-request transport timeout when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 1_000;

/// Issue the GET and hand back the body of a 2xx response.
async fn fetch_body(
    http_client: &dyn HttpClient,
    url: String,
    timeout_ms: u64,
) -> Result<String, FetchError> {
    let request = HttpRequest::get(url)
        .with_header("accept", "application/json")
        .with_timeout_ms(timeout_ms);

    let response = http_client
        .execute(request)
        .await
        .map_err(|error| FetchError::Transport(error.message().to_owned()))?;

    if !response.is_success() {
        return Err(FetchError::Status(response.status));
    }

    Ok(response.body)
}

/// Decode a body that must be a JSON object.
///
/// Derived struct deserializers also accept arrays by position, so the shape
/// is checked on the untyped value before the payload is built.
fn decode_object<T: DeserializeOwned>(body: &str) -> Result<T, FetchError> {
    let value: Value = serde_json::from_str(body)?;
    if !value.is_object() {
        return Err(FetchError::Decode(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    }
    Ok(serde_json::from_value(value)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn objects_decode_into_the_target_type() {
        let decoded: HashMap<String, String> =
            decode_object(r#"{"cep":"01001000"}"#).expect("object decodes");
        assert_eq!(decoded.get("cep").map(String::as_str), Some("01001000"));
    }

    #[test]
    fn non_object_json_is_rejected_before_typed_decoding() {
        for body in ["[]", r#"["54325-251"]"#, "null", "42", r#""cep""#, "true"] {
            let result = decode_object::<HashMap<String, Value>>(body);
            assert!(
                matches!(&result, Err(FetchError::Decode(detail)) if detail.starts_with("expected a JSON object")),
                "{body} should be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn trailing_slash_on_base_url_is_trimmed() {
        assert_eq!(
            join_url("http://viacep.test/", "/ws/1/json/"),
            "http://viacep.test/ws/1/json/"
        );
    }
}
