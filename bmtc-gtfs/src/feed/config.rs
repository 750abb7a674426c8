//! build configuration: agency identity, service window, fare constants,
//! and synthesizer tuning. every field has a stock value, so a build runs
//! with no file at all; a TOML file overrides selectively.
use chrono::NaiveDate;
use config::Config;
use serde::{Deserialize, Serialize};

use crate::feed::entity::{Agency, Calendar};
use crate::feed::feed_error::FeedError;
use crate::feed::synth::SynthesisParams;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub agency: AgencyConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub fares: FareConfig,
    #[serde(default)]
    pub synthesis: SynthesisParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgencyConfig {
    #[serde(default = "default_agency_id")]
    pub agency_id: String,
    #[serde(default = "default_agency_name")]
    pub agency_name: String,
    #[serde(default = "default_agency_url")]
    pub agency_url: String,
    #[serde(default = "default_agency_timezone")]
    pub agency_timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// the single all-week service id stamped on every trip.
    #[serde(default = "default_service_id")]
    pub service_id: String,
    #[serde(default = "default_service_start")]
    pub start_date: NaiveDate,
    #[serde(default = "default_service_end")]
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
    /// 0 = fare is paid on board.
    #[serde(default)]
    pub payment_method: u8,
    /// None leaves the transfers column empty (unlimited).
    #[serde(default)]
    pub transfers: Option<u8>,
}

fn default_agency_id() -> String {
    "1".to_string()
}

fn default_agency_name() -> String {
    "BMTC".to_string()
}

fn default_agency_url() -> String {
    "https://mybmtc.karnataka.gov.in/english".to_string()
}

fn default_agency_timezone() -> String {
    "Asia/Kolkata".to_string()
}

fn default_service_id() -> String {
    "1".to_string()
}

fn default_service_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 16).expect("valid stock start date")
}

fn default_service_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 16).expect("valid stock end date")
}

fn default_currency() -> String {
    "INR".to_string()
}

impl Default for AgencyConfig {
    fn default() -> Self {
        AgencyConfig {
            agency_id: default_agency_id(),
            agency_name: default_agency_name(),
            agency_url: default_agency_url(),
            agency_timezone: default_agency_timezone(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            service_id: default_service_id(),
            start_date: default_service_start(),
            end_date: default_service_end(),
        }
    }
}

impl Default for FareConfig {
    fn default() -> Self {
        FareConfig {
            currency: default_currency(),
            payment_method: 0,
            transfers: None,
        }
    }
}

impl FeedConfig {
    /// reads a TOML overrides file into a [FeedConfig].
    pub fn from_file(filepath: &str) -> Result<Self, FeedError> {
        let file = config::File::new(filepath, config::FileFormat::Toml);
        let config = Config::builder().add_source(file).build().map_err(|e| {
            FeedError::ConfigReadError {
                msg: format!("failed reading '{filepath}'"),
                source: e,
            }
        })?;
        config
            .try_deserialize::<FeedConfig>()
            .map_err(|e| FeedError::ConfigReadError {
                msg: format!("failed interpreting '{filepath}' as a feed configuration"),
                source: e,
            })
    }

    /// the static agency row.
    pub fn agency_row(&self) -> Agency {
        Agency {
            agency_id: self.agency.agency_id.clone(),
            agency_name: self.agency.agency_name.clone(),
            agency_url: self.agency.agency_url.clone(),
            agency_timezone: self.agency.agency_timezone.clone(),
        }
    }

    /// the static all-week calendar row over the service window.
    pub fn calendar_row(&self) -> Calendar {
        Calendar {
            service_id: self.service.service_id.clone(),
            monday: 1,
            tuesday: 1,
            wednesday: 1,
            thursday: 1,
            friday: 1,
            saturday: 1,
            sunday: 1,
            start_date: self.service.start_date,
            end_date: self.service.end_date,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_stock_configuration() {
        let config = FeedConfig::default();
        assert_eq!(config.agency.agency_name, "BMTC");
        assert_eq!(config.service.service_id, "1");
        assert_eq!(config.fares.currency, "INR");
        assert_eq!(config.fares.transfers, None);
        assert_eq!(config.synthesis.max_speed_kmh, 75.0);
        assert_eq!(config.synthesis.default_segment_km, 0.5);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let toml = r#"
            [agency]
            agency_name = "Example Transit"

            [synthesis]
            max_speed_kmh = 60.0

            [service]
            start_date = "2026-01-01"
        "#;
        let config = Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .expect("toml should load")
            .try_deserialize::<FeedConfig>()
            .expect("overrides should deserialize");
        assert_eq!(config.agency.agency_name, "Example Transit");
        // untouched sections keep their stock values
        assert_eq!(config.agency.agency_timezone, "Asia/Kolkata");
        assert_eq!(config.synthesis.max_speed_kmh, 60.0);
        assert_eq!(config.synthesis.default_segment_km, 0.5);
        assert_eq!(
            config.service.start_date,
            NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date")
        );
        assert_eq!(config.service.end_date, default_service_end());
    }

    #[test]
    fn test_calendar_row_spans_all_week() {
        let row = FeedConfig::default().calendar_row();
        assert_eq!(
            (row.monday, row.sunday, row.service_id.as_str()),
            (1, 1, "1")
        );
    }
}
