use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Data source configuration
    pub data_source_mode: DataSourceMode,
    pub status_url: Option<String>,
    pub data_file: Option<String>,
    pub max_applications: Option<u32>,
    pub output_directory: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DataSourceMode {
    #[serde(rename = "manual")]
    Manual,
    #[serde(rename = "internet")]
    Internet,
    #[serde(rename = "local")]
    Local,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_source_mode: DataSourceMode::Manual,
            status_url: Some("https://example.com/ipo-subscription-status".to_string()),
            data_file: Some("data-source/subscription_status.html".to_string()),
            // Note: set a value here to skip the interactive prompt
            max_applications: None,
            output_directory: Some("output".to_string()),
        }
    }
}

impl Config {
    pub fn load_from_file(file_path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(file_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, file_path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(file_path, content)?;
        Ok(())
    }
}

/// One line of the probability table: how likely `applications` separate
/// applications are to win nothing versus at least one lot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbabilityRow {
    pub applications: u32,
    pub no_allotment_pct: f64,
    pub at_least_one_pct: f64,
}

/// Subscription figures scraped from a public status page.
#[derive(Debug, Clone)]
pub struct SubscriptionStatus {
    pub rii_subscription: f64,
    pub issue_open: NaiveDate,
    pub issue_close: NaiveDate,
}

impl SubscriptionStatus {
    /// The issue window is inclusive on both ends.
    pub fn is_open_on(&self, date: NaiveDate) -> bool {
        date >= self.issue_open && date <= self.issue_close
    }
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("{field}: '{raw}' is not a number")]
    NotANumber { field: &'static str, raw: String },
    #[error("{field}: {reason}")]
    OutOfRange {
        field: &'static str,
        reason: &'static str,
    },
}

/// Parse an oversubscription factor from user or page text.
/// Accepts a trailing multiplier suffix as printed on status pages ("4.56x").
pub fn parse_subscription_factor(raw: &str) -> Result<f64, InputError> {
    let cleaned = raw.trim().trim_end_matches(['x', 'X']).trim();
    cleaned
        .parse::<f64>()
        .map_err(|_| InputError::NotANumber {
            field: "oversubscription factor",
            raw: raw.trim().to_string(),
        })
}

pub fn parse_max_applications(raw: &str) -> Result<u32, InputError> {
    let value = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| InputError::NotANumber {
            field: "maximum applications",
            raw: raw.trim().to_string(),
        })?;

    if value <= 0 {
        return Err(InputError::OutOfRange {
            field: "maximum applications",
            reason: "must be a positive integer",
        });
    }
    if value > u32::MAX as i64 {
        return Err(InputError::OutOfRange {
            field: "maximum applications",
            reason: "is too large",
        });
    }

    Ok(value as u32)
}

/// Parse an issue date in the "Month DD, YYYY" form used by the status page.
pub fn parse_issue_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%B %d, %Y").ok()
}
