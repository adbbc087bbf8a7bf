//! Merging of the two provider feeds into one canonical station set.
//!
//! Stations are matched on their [`MergeKey`]: coordinates rounded to three
//! decimal degrees. Provider A is scanned first and owns the identity and
//! descriptive fields of any dock both providers report; provider B only
//! contributes its bike counts to such docks.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::domain::{BikeCounts, MergeKey, Point, Source, Station, StationId};
use crate::feeds::{ProviderARecord, ProviderBRecord, RejectedRecord};

/// Status given to provider B stations, which report none.
pub const DEFAULT_STATUS: &str = "Active";

/// Canonical stations keyed by id.
pub type StationSet = HashMap<StationId, Station>;

/// A provider record that could not be turned into a station.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedRecord {
    /// A numeric text field did not parse
    #[error("record {record}: field {field} is not a valid number: {value:?}")]
    InvalidNumber {
        record: String,
        field: &'static str,
        value: String,
    },

    /// Coordinates are NaN or infinite
    #[error("record {record}: coordinates are not finite")]
    NonFiniteCoordinates { record: String },

    /// The feed entry did not decode at all
    #[error("{provider} record {record}: {message}")]
    Undecodable {
        provider: &'static str,
        record: String,
        message: String,
    },
}

impl From<RejectedRecord> for MalformedRecord {
    fn from(rejected: RejectedRecord) -> Self {
        MalformedRecord::Undecodable {
            provider: rejected.provider,
            record: rejected.record,
            message: rejected.message,
        }
    }
}

/// Result of a merge: the station set plus every record that was dropped.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub stations: StationSet,
    pub dropped: Vec<MalformedRecord>,
}

impl MergeOutcome {
    /// Count stations reported by the given source.
    pub fn count_by_source(&self, source: Source) -> usize {
        self.stations
            .values()
            .filter(|s| s.source == source)
            .count()
    }
}

/// Merge provider A and provider B records into one station set.
///
/// Provider A records are inserted first, bike counts taken from their
/// vehicle lists. Each provider B record then either adds its counts to the
/// station already on its grid cell (marking it [`Source::Both`]) or becomes
/// a new provider B station. Records that fail validation are dropped and
/// logged without affecting the rest of the merge.
///
/// Two provider A stations on one grid cell: the later one wins.
pub fn merge_stations(
    provider_a: impl IntoIterator<Item = ProviderARecord>,
    provider_b: impl IntoIterator<Item = ProviderBRecord>,
) -> MergeOutcome {
    let mut by_key: HashMap<MergeKey, Station> = HashMap::new();
    let mut dropped = Vec::new();

    for record in provider_a {
        match station_from_provider_a(record) {
            Ok(station) => {
                let key = station.location.merge_key();
                if let Some(previous) = by_key.insert(key, station) {
                    debug!(replaced = %previous.id, %key, "provider A stations share a grid cell");
                }
            }
            Err(e) => {
                warn!(error = %e, "dropping malformed provider A record");
                dropped.push(e);
            }
        }
    }

    for record in provider_b {
        let parsed = match ParsedProviderB::parse(&record) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "dropping malformed provider B record");
                dropped.push(e);
                continue;
            }
        };

        let key = parsed.location.merge_key();
        match by_key.get_mut(&key) {
            Some(existing) => {
                existing.bikes = existing.bikes + parsed.bikes;
                if existing.source != Source::ProviderB {
                    existing.source = Source::Both;
                }
            }
            None => {
                by_key.insert(key, parsed.into_station(record));
            }
        }
    }

    let stations = by_key
        .into_values()
        .map(|station| (station.id.clone(), station))
        .collect();

    MergeOutcome { stations, dropped }
}

fn station_from_provider_a(record: ProviderARecord) -> Result<Station, MalformedRecord> {
    let location = Point::new(record.latitude, record.longitude);
    if !location.is_finite() {
        return Err(MalformedRecord::NonFiniteCoordinates {
            record: record.id.to_string(),
        });
    }

    let ebikes = record.vehicles.iter().filter(|v| v.is_electric()).count() as u32;
    let regular = record.vehicles.len() as u32 - ebikes;

    Ok(Station {
        id: StationId::provider_a(record.id),
        location,
        name: record.name,
        address: record.address,
        status: record.state.name,
        bikes: BikeCounts::new(ebikes, regular),
        source: Source::ProviderA,
    })
}

/// The numeric content of a provider B record, once parsed.
struct ParsedProviderB {
    location: Point,
    bikes: BikeCounts,
}

impl ParsedProviderB {
    fn parse(record: &ProviderBRecord) -> Result<Self, MalformedRecord> {
        let id = &record.station_id;
        let location = Point::new(
            parse_field(id, "lat", &record.lat)?,
            parse_field(id, "lng", &record.lng)?,
        );
        if !location.is_finite() {
            return Err(MalformedRecord::NonFiniteCoordinates { record: id.clone() });
        }

        let bikes = BikeCounts::new(
            parse_field(id, "totalElectricalBike", &record.total_electrical_bike)?,
            parse_field(id, "totalNonElectricalBike", &record.total_non_electrical_bike)?,
        );

        Ok(Self { location, bikes })
    }

    fn into_station(self, record: ProviderBRecord) -> Station {
        Station {
            id: StationId::provider_b(&record.station_id),
            location: self.location,
            name: record.station_name,
            address: record.station_address,
            status: DEFAULT_STATUS.to_string(),
            bikes: self.bikes,
            source: Source::ProviderB,
        }
    }
}

fn parse_field<T: std::str::FromStr>(
    record: &str,
    field: &'static str,
    value: &str,
) -> Result<T, MalformedRecord> {
    value
        .trim()
        .parse()
        .map_err(|_| MalformedRecord::InvalidNumber {
            record: record.to_string(),
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::{ProviderAState, ProviderAVehicle};

    fn record_a(id: u64, lat: f64, lng: f64, vehicles: &[&str]) -> ProviderARecord {
        ProviderARecord {
            id,
            latitude: lat,
            longitude: lng,
            name: format!("Station {id}"),
            address: format!("Street {id}"),
            zip: "8001".to_string(),
            city: "Zürich".to_string(),
            state: ProviderAState {
                name: "Active".to_string(),
            },
            vehicles: vehicles.iter().map(|v| ProviderAVehicle::new(*v)).collect(),
        }
    }

    fn record_b(id: &str, lat: &str, lng: &str, electric: &str, regular: &str) -> ProviderBRecord {
        ProviderBRecord {
            station_id: id.to_string(),
            station_name: format!("B {id}"),
            lat: lat.to_string(),
            lng: lng.to_string(),
            station_address: format!("B street {id}"),
            total_electrical_bike: electric.to_string(),
            total_non_electrical_bike: regular.to_string(),
        }
    }

    #[test]
    fn same_dock_from_both_providers_is_unioned() {
        let a = record_a(1, 47.3769, 8.5417, &["Velo", "Velo"]);
        let b = record_b("v1", "47.3770", "8.5416", "1", "1");

        let outcome = merge_stations(vec![a], vec![b]);
        assert_eq!(outcome.stations.len(), 1);
        assert!(outcome.dropped.is_empty());

        let station = &outcome.stations[&StationId::provider_a(1)];
        assert_eq!(station.source, Source::Both);
        assert_eq!(station.ebikes(), 1);
        assert_eq!(station.regular_bikes(), 3);
        assert_eq!(station.total_bikes(), 4);
        // Provider A keeps identity and description
        assert_eq!(station.name, "Station 1");
        assert_eq!(station.address, "Street 1");
        assert_eq!(station.location, Point::new(47.3769, 8.5417));
    }

    #[test]
    fn provider_b_only_station_gets_default_status() {
        let b = record_b("v9", "46.9480", "7.4474", "2", "5");
        let outcome = merge_stations(Vec::new(), vec![b]);

        let station = &outcome.stations[&StationId::provider_b("v9")];
        assert_eq!(station.source, Source::ProviderB);
        assert_eq!(station.status, DEFAULT_STATUS);
        assert_eq!(station.name, "B v9");
        assert_eq!(station.total_bikes(), 7);
    }

    #[test]
    fn provider_a_counts_electric_vehicles() {
        let a = record_a(3, 47.0, 8.0, &["E-Bike", "Velo", "E-Bike"]);
        let outcome = merge_stations(vec![a], Vec::new());

        let station = &outcome.stations[&StationId::provider_a(3)];
        assert_eq!(station.source, Source::ProviderA);
        assert_eq!(station.ebikes(), 2);
        assert_eq!(station.regular_bikes(), 1);
        assert_eq!(station.status, "Active");
    }

    #[test]
    fn malformed_record_is_dropped_and_merge_continues() {
        let bad = record_b("bad", "47.1", "8.1", "abc", "1");
        let good = record_b("good", "47.2", "8.2", "1", "1");

        let outcome = merge_stations(Vec::new(), vec![bad, good]);
        assert_eq!(outcome.stations.len(), 1);
        assert!(outcome.stations.contains_key(&StationId::provider_b("good")));
        assert_eq!(
            outcome.dropped,
            vec![MalformedRecord::InvalidNumber {
                record: "bad".to_string(),
                field: "totalElectricalBike",
                value: "abc".to_string(),
            }]
        );
    }

    #[test]
    fn malformed_coordinates_are_dropped() {
        let bad_text = record_b("x", "north", "8.1", "1", "1");
        let not_finite = record_b("y", "NaN", "8.1", "1", "1");
        let bad_a = record_a(4, f64::INFINITY, 8.0, &[]);

        let outcome = merge_stations(vec![bad_a], vec![bad_text, not_finite]);
        assert!(outcome.stations.is_empty());
        assert_eq!(outcome.dropped.len(), 3);
    }

    #[test]
    fn dropped_b_record_does_not_touch_matching_a_station() {
        let a = record_a(1, 47.3769, 8.5417, &["Velo"]);
        let bad = record_b("v1", "47.3770", "8.5416", "1", "-2");

        let outcome = merge_stations(vec![a], vec![bad]);
        let station = &outcome.stations[&StationId::provider_a(1)];
        assert_eq!(station.source, Source::ProviderA);
        assert_eq!(station.total_bikes(), 1);
        assert_eq!(outcome.dropped.len(), 1);
    }

    #[test]
    fn duplicate_provider_a_cell_last_write_wins() {
        let first = record_a(1, 47.3769, 8.5417, &["Velo"]);
        let second = record_a(2, 47.3771, 8.5418, &["Velo", "Velo"]);

        let outcome = merge_stations(vec![first, second], Vec::new());
        assert_eq!(outcome.stations.len(), 1);
        assert!(outcome.stations.contains_key(&StationId::provider_a(2)));
    }

    #[test]
    fn repeated_provider_b_cell_sums_counts_without_claiming_both() {
        let first = record_b("v1", "47.5", "8.5", "1", "0");
        let second = record_b("v2", "47.5001", "8.5001", "0", "2");

        let outcome = merge_stations(Vec::new(), vec![first, second]);
        assert_eq!(outcome.stations.len(), 1);
        let station = &outcome.stations[&StationId::provider_b("v1")];
        assert_eq!(station.source, Source::ProviderB);
        assert_eq!(station.bikes, BikeCounts::new(1, 2));
    }

    #[test]
    fn whitespace_around_numbers_is_tolerated() {
        let b = record_b("v1", " 47.5 ", "8.5", " 3", "4 ");
        let outcome = merge_stations(Vec::new(), vec![b]);
        assert_eq!(outcome.stations[&StationId::provider_b("v1")].total_bikes(), 7);
    }

    #[test]
    fn counts_by_source() {
        let outcome = merge_stations(
            vec![
                record_a(1, 47.3769, 8.5417, &[]),
                record_a(2, 46.0, 7.0, &[]),
            ],
            vec![
                record_b("v1", "47.3770", "8.5416", "0", "0"),
                record_b("v2", "45.0", "6.0", "0", "0"),
            ],
        );

        assert_eq!(outcome.count_by_source(Source::Both), 1);
        assert_eq!(outcome.count_by_source(Source::ProviderA), 1);
        assert_eq!(outcome.count_by_source(Source::ProviderB), 1);
    }
}
