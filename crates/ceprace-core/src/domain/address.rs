use serde::{Serialize, Serializer};

use crate::ProviderId;

/// Address resolved from a postal code, independent of the backend.
///
/// `city` and `region` each come from exactly one backend field: BrasilAPI's
/// `city`/`state` or ViaCEP's `localidade`/`uf`. Adapters build this from
/// their own wire payload, so a foreign backend's field names never leak in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub postal_code: String,
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub region: String,
    #[serde(rename = "source_label", serialize_with = "serialize_label")]
    pub source: ProviderId,
}

impl Address {
    pub fn source_label(&self) -> &'static str {
        self.source.label()
    }

    /// `"{city}/{region}"`, or whichever half is present.
    pub fn city_and_state(&self) -> String {
        match (self.city.is_empty(), self.region.is_empty()) {
            (false, false) => format!("{}/{}", self.city, self.region),
            (false, true) => self.city.clone(),
            (true, false) => self.region.clone(),
            (true, true) => String::new(),
        }
    }
}

fn serialize_label<S>(source: &ProviderId, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(source.label())
}
