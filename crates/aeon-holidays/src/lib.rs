//! Public holiday lookup for the aeon time tracker.
//!
//! Holidays come from the [OpenHolidays API](https://openholidaysapi.org/).
//! A lookup returns a [`HolidayCalendar`] for one country and year, with
//! multi-day holidays expanded to one entry per date.

use std::fmt;
use std::time::Duration;

use aeon_core::{Holiday, HolidayCalendar};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_API_URL: &str = "https://openholidaysapi.org/PublicHolidays";

/// Holiday lookup errors.
#[derive(Debug, Error)]
pub enum HolidayError {
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("invalid API URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API answered with a non-success status.
    #[error("holiday API returned status {status}: {body}")]
    Api { status: u16, body: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Where and for which country holidays are looked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicHolidaysConfig {
    /// Whether holidays are looked up at all.
    pub enabled: bool,
    /// ISO 3166-1 country code, e.g. `DE`.
    pub country: String,
    /// Subdivision code, e.g. `DE-BY`. Without one every holiday is kept.
    pub region: Option<String>,
    pub api_url: String,
}

impl Default for PublicHolidaysConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            country: "DE".to_string(),
            region: None,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

/// OpenHolidays API client.
///
/// # Thread Safety
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

impl Client {
    pub fn new() -> Result<Self, HolidayError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(HolidayError::ClientBuild)?;
        Ok(Self { http })
    }

    /// Looks up the public holidays of `year` for the configured country.
    ///
    /// Holidays limited to other subdivisions than the configured region are
    /// dropped.
    pub async fn lookup(
        &self,
        config: &PublicHolidaysConfig,
        year: i32,
    ) -> Result<HolidayCalendar, HolidayError> {
        let url = request_url(config, year)?;
        tracing::debug!(%url, "requesting public holidays");

        let response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(HolidayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let calendar = parse_holidays(&body, config.region.as_deref())?;
        tracing::info!(
            country = %config.country,
            region = config.region.as_deref().unwrap_or("-"),
            year,
            holidays = calendar.len(),
            "loaded public holidays"
        );
        Ok(calendar)
    }
}

/// Builds the query for all holidays of `year` in the configured country.
fn request_url(config: &PublicHolidaysConfig, year: i32) -> Result<reqwest::Url, HolidayError> {
    let params = [
        ("countryIsoCode", config.country.clone()),
        ("validFrom", format!("{year:04}-01-01")),
        ("validTo", format!("{year:04}-12-31")),
    ];
    reqwest::Url::parse_with_params(&config.api_url, &params).map_err(|err| {
        HolidayError::InvalidUrl {
            url: config.api_url.clone(),
            reason: err.to_string(),
        }
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HolidayResponse {
    start_date: String,
    end_date: String,
    #[serde(default)]
    name: Vec<LocalizedText>,
    #[serde(default)]
    nationwide: bool,
    #[serde(default)]
    subdivisions: Vec<Subdivision>,
}

#[derive(Debug, Deserialize)]
struct LocalizedText {
    text: String,
}

#[derive(Debug, Deserialize)]
struct Subdivision {
    code: String,
}

/// Parses an API response body into a calendar of the holidays observed in
/// `region`.
///
/// Every date from `startDate` to `endDate` inclusive gets an entry. Localized
/// names are joined with `", "`. Nationwide holidays carry no regions. Holidays
/// sharing a date are merged.
pub fn parse_holidays(
    body: &str,
    region: Option<&str>,
) -> Result<HolidayCalendar, HolidayError> {
    let holidays: Vec<HolidayResponse> =
        serde_json::from_str(body).map_err(|err| HolidayError::InvalidResponse(err.to_string()))?;

    let mut calendar = HolidayCalendar::new();
    for holiday in holidays {
        let start = parse_date(&holiday.start_date)?;
        let end = parse_date(&holiday.end_date)?;
        if end < start {
            return Err(HolidayError::InvalidResponse(format!(
                "holiday ends on {end} before it starts on {start}"
            )));
        }

        let name = holiday
            .name
            .iter()
            .map(|name| name.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        if name.is_empty() {
            return Err(HolidayError::InvalidResponse(format!("holiday on {start} has no name")));
        }
        let regions: Vec<String> = if holiday.nationwide {
            Vec::new()
        } else {
            holiday.subdivisions.into_iter().map(|s| s.code).collect()
        };
        let holiday = Holiday { name, regions };
        if !holiday.applies_to(region) {
            continue;
        }

        for date in start.iter_days().take_while(|date| *date <= end) {
            calendar.insert(date, holiday.clone());
        }
    }
    Ok(calendar)
}

fn parse_date(value: &str) -> Result<NaiveDate, HolidayError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| HolidayError::InvalidResponse(format!("invalid date {value:?}: {err}")))
}
