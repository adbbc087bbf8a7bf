//! Application configuration from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{InvalidBudget, ReachabilityBudget};
use crate::route::{InvalidRemovalPolicy, RemovalPolicy, RouteConfig};

/// Default port for the HTTP API.
const DEFAULT_PORT: u16 = 3000;

/// Default interval between station catalog refreshes (5 minutes).
const DEFAULT_REFRESH_SECS: u64 = 5 * 60;

/// Errors reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} is invalid: {message}")]
    Invalid { name: &'static str, message: String },

    #[error("ROUTE_BUDGET_MINUTES: {0}")]
    Budget(#[from] InvalidBudget),

    #[error("ROUTE_REMOVAL_POLICY: {0}")]
    RemovalPolicy(#[from] InvalidRemovalPolicy),
}

/// Everything the server binary needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mapbox_api_key: String,
    /// Mapbox routing profile, `cycling` unless overridden
    pub mapbox_profile: Option<String>,
    /// Cap on concurrent Mapbox requests
    pub mapbox_max_concurrent: Option<usize>,
    pub port: u16,
    pub provider_a_url: Option<String>,
    pub provider_b_url: Option<String>,
    pub provider_b_api_key: Option<String>,
    pub refresh_interval: Duration,
    pub snapshot_path: Option<PathBuf>,
    pub route: RouteConfig,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, treating blank values as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mapbox_api_key = get("MAPBOX_API_KEY").ok_or(ConfigError::Missing("MAPBOX_API_KEY"))?;

        let port = match get("PORT") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                message: format!("not a port number: {v}"),
            })?,
            None => DEFAULT_PORT,
        };

        let mapbox_max_concurrent = match get("MAPBOX_MAX_CONCURRENT") {
            Some(v) => match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => Some(n),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "MAPBOX_MAX_CONCURRENT",
                        message: format!("not a positive number: {v}"),
                    });
                }
            },
            None => None,
        };

        let refresh_secs: u64 = match get("STATION_REFRESH_SECS") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "STATION_REFRESH_SECS",
                message: format!("not a number of seconds: {v}"),
            })?,
            None => DEFAULT_REFRESH_SECS,
        };
        if refresh_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "STATION_REFRESH_SECS",
                message: "must be positive".to_string(),
            });
        }

        let budget_limit = match get("ROUTE_BUDGET_MINUTES") {
            Some(v) => {
                let minutes: u32 = v.trim().parse().map_err(|_| ConfigError::Invalid {
                    name: "ROUTE_BUDGET_MINUTES",
                    message: format!("not a number of minutes: {v}"),
                })?;
                ReachabilityBudget::new(minutes)?
            }
            None => ReachabilityBudget::DEFAULT_POLICY,
        };

        let removal_policy = match get("ROUTE_REMOVAL_POLICY") {
            Some(v) => v.parse::<RemovalPolicy>()?,
            None => RemovalPolicy::default(),
        };

        Ok(Self {
            mapbox_api_key,
            mapbox_profile: get("MAPBOX_PROFILE").map(|v| v.trim().to_string()),
            mapbox_max_concurrent,
            port,
            provider_a_url: get("PROVIDER_A_URL"),
            provider_b_url: get("PROVIDER_B_URL"),
            provider_b_api_key: get("PROVIDER_B_API_KEY"),
            refresh_interval: Duration::from_secs(refresh_secs),
            snapshot_path: get("STATION_SNAPSHOT_PATH").map(PathBuf::from),
            route: RouteConfig::new(budget_limit, removal_policy),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[("MAPBOX_API_KEY", "pk.test")]).unwrap();

        assert_eq!(config.mapbox_api_key, "pk.test");
        assert_eq!(config.port, 3000);
        assert_eq!(config.refresh_interval, Duration::from_secs(300));
        assert!(config.provider_a_url.is_none());
        assert!(config.provider_b_url.is_none());
        assert!(config.snapshot_path.is_none());
        assert!(config.mapbox_profile.is_none());
        assert!(config.mapbox_max_concurrent.is_none());
        assert_eq!(config.route.budget_limit.minutes(), 30);
        assert_eq!(config.route.removal_policy, RemovalPolicy::Soft);
    }

    #[test]
    fn api_key_required() {
        assert!(matches!(
            config(&[]),
            Err(ConfigError::Missing("MAPBOX_API_KEY"))
        ));
        assert!(matches!(
            config(&[("MAPBOX_API_KEY", "  ")]),
            Err(ConfigError::Missing(_))
        ));
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("MAPBOX_API_KEY", "pk.test"),
            ("PORT", "8080"),
            ("PROVIDER_B_URL", "http://b.example/stations"),
            ("STATION_REFRESH_SECS", "60"),
            ("ROUTE_BUDGET_MINUTES", "20"),
            ("ROUTE_REMOVAL_POLICY", "revalidate"),
            ("STATION_SNAPSHOT_PATH", "/tmp/stations.json"),
            ("MAPBOX_PROFILE", "cycling-electric"),
            ("MAPBOX_MAX_CONCURRENT", "8"),
        ])
        .unwrap();

        assert_eq!(config.mapbox_profile.as_deref(), Some("cycling-electric"));
        assert_eq!(config.mapbox_max_concurrent, Some(8));

        assert_eq!(config.port, 8080);
        assert_eq!(
            config.provider_b_url.as_deref(),
            Some("http://b.example/stations")
        );
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
        assert_eq!(config.route.budget_limit.minutes(), 20);
        assert_eq!(config.route.removal_policy, RemovalPolicy::Revalidate);
        assert_eq!(
            config.snapshot_path,
            Some(PathBuf::from("/tmp/stations.json"))
        );
    }

    #[test]
    fn invalid_values_rejected() {
        let base = ("MAPBOX_API_KEY", "pk.test");
        assert!(config(&[base, ("PORT", "http")]).is_err());
        assert!(config(&[base, ("STATION_REFRESH_SECS", "0")]).is_err());
        assert!(config(&[base, ("MAPBOX_MAX_CONCURRENT", "0")]).is_err());
        assert!(config(&[base, ("MAPBOX_MAX_CONCURRENT", "many")]).is_err());
        assert!(matches!(
            config(&[base, ("ROUTE_BUDGET_MINUTES", "90")]),
            Err(ConfigError::Budget(_))
        ));
        assert!(matches!(
            config(&[base, ("ROUTE_REMOVAL_POLICY", "strict")]),
            Err(ConfigError::RemovalPolicy(_))
        ));
    }
}
