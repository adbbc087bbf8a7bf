//! Raw provider record shapes.
//!
//! These map directly to the provider JSON. Provider A omits fields freely,
//! so most descriptive fields default to empty.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// A station as published by provider A.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderARecord {
    pub id: u64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: ProviderAState,
    #[serde(default)]
    pub vehicles: Vec<ProviderAVehicle>,
}

/// Operational state of a provider A station.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderAState {
    #[serde(default)]
    pub name: String,
}

/// A single vehicle parked at a provider A station.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderAVehicle {
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
}

/// Vehicle type, e.g. `"Velo"` or `"E-Bike"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleType {
    pub name: String,
}

impl ProviderAVehicle {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            vehicle_type: VehicleType {
                name: type_name.into(),
            },
        }
    }

    /// Whether this vehicle is electrically assisted.
    pub fn is_electric(&self) -> bool {
        let name: String = self
            .vehicle_type
            .name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        name.eq_ignore_ascii_case("ebike")
    }
}

/// A station as published by provider B.
///
/// Every numeric field arrives as text and is only parsed during the merge,
/// so a bad value drops one record rather than the whole feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderBRecord {
    #[serde(deserialize_with = "text_or_number")]
    pub station_id: String,
    #[serde(default)]
    pub station_name: String,
    #[serde(deserialize_with = "text_or_number")]
    pub lat: String,
    #[serde(deserialize_with = "text_or_number")]
    pub lng: String,
    #[serde(default)]
    pub station_address: String,
    #[serde(rename = "totalElectricalBike", deserialize_with = "text_or_number")]
    pub total_electrical_bike: String,
    #[serde(rename = "totalNonElectricalBike", deserialize_with = "text_or_number")]
    pub total_non_electrical_bike: String,
}

/// A feed entry that could not be decoded as a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    pub provider: &'static str,
    /// The entry's id if it has one, otherwise its position in the feed
    pub record: String,
    pub message: String,
}

/// The records of one feed, decoded entry by entry.
#[derive(Debug, Clone)]
pub struct FeedBatch<R> {
    pub records: Vec<R>,
    pub rejected: Vec<RejectedRecord>,
}

impl<R> FeedBatch<R> {
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<R> From<Vec<R>> for FeedBatch<R> {
    fn from(records: Vec<R>) -> Self {
        Self {
            records,
            rejected: Vec::new(),
        }
    }
}

impl<R: DeserializeOwned> FeedBatch<R> {
    /// Decode each entry separately so one bad entry only loses itself.
    ///
    /// `id_field` names the entry's id, used to label rejected entries.
    pub fn decode(provider: &'static str, entries: Vec<Value>, id_field: &str) -> Self {
        let mut batch = Self::empty();

        for (index, entry) in entries.into_iter().enumerate() {
            let record = match entry.get(id_field) {
                Some(Value::String(id)) => id.clone(),
                Some(Value::Number(id)) => id.to_string(),
                _ => format!("#{index}"),
            };

            match serde_json::from_value(entry) {
                Ok(decoded) => batch.records.push(decoded),
                Err(e) => {
                    warn!(provider, %record, error = %e, "dropping undecodable feed entry");
                    batch.rejected.push(RejectedRecord {
                        provider,
                        record,
                        message: e.to_string(),
                    });
                }
            }
        }

        batch
    }
}

/// Accept either a JSON string or a bare JSON number, keeping the text.
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(s) => s,
        TextOrNumber::Number(n) => n.to_string(),
    })
}
