//! World Bank Indicators API (v2) integration.
//!
//! All countries and indicators go into a single request path
//! (`country/JPN;USA/indicator/A;B`), which the API serves from source 2
//! (World Development Indicators) as a long list of observations.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::data::source::IndicatorSource;
use crate::domain::{CountryCodeFormat, LoadRequest, ObservationRecord, RawObservations};
use crate::error::LoadError;

pub const DEFAULT_BASE_URL: &str = "https://api.worldbank.org/v2";
const WDI_SOURCE: &str = "2";
const PER_PAGE: usize = 20000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct WorldBankSource {
    client: Client,
    base_url: String,
}

impl WorldBankSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self, LoadError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("econ-monitor/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LoadError::Fetch(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn fetch_page(&self, request: &LoadRequest, page: u32) -> Result<Page, LoadError> {
        let url = observations_url(&self.base_url, request);
        let date = format!("{}:{}", request.years.start(), request.years.end());

        debug!(%url, page, "requesting World Bank observations");
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("source", WDI_SOURCE),
                ("date", date.as_str()),
                ("format", "json"),
                ("per_page", &PER_PAGE.to_string()),
                ("page", &page.to_string()),
            ])
            .send()
            .map_err(|e| LoadError::Fetch(format!("World Bank request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(LoadError::Fetch(format!(
                "World Bank request failed with status {}.",
                resp.status()
            )));
        }

        let body: Value = resp
            .json()
            .map_err(|e| LoadError::Fetch(format!("Failed to parse World Bank response: {e}")))?;

        parse_page(body, request.countries.format())
    }
}

impl IndicatorSource for WorldBankSource {
    fn fetch(&self, request: &LoadRequest) -> Result<RawObservations, LoadError> {
        let mut page = self.fetch_page(request, 1)?;
        let mut records = std::mem::take(&mut page.records);

        // Pages beyond the first belong to the same bulk query.
        let pages = page.pages;
        for n in 2..=pages {
            let mut next = self.fetch_page(request, n)?;
            records.append(&mut next.records);
        }

        info!(
            records = records.len(),
            pages,
            countries = request.countries.len(),
            indicators = request.indicators.len(),
            "fetched World Bank observations"
        );
        Ok(RawObservations::Long(records))
    }

    fn name(&self) -> &str {
        "World Bank"
    }
}

fn observations_url(base_url: &str, request: &LoadRequest) -> String {
    let countries = request.countries.codes().join(";");
    let indicators: Vec<&str> = request.indicators.codes().collect();
    format!("{base_url}/country/{countries}/indicator/{}", indicators.join(";"))
}

#[derive(Debug)]
struct Page {
    pages: u32,
    records: Vec<ObservationRecord>,
}

#[derive(Debug, Deserialize)]
struct PageMeta {
    #[serde(default = "one")]
    pages: u32,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct ProviderMessage {
    #[serde(default)]
    message: Vec<MessageEntry>,
}

#[derive(Debug, Deserialize)]
struct MessageEntry {
    #[serde(default)]
    key: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct Observation {
    indicator: Reference,
    country: Reference,
    #[serde(default)]
    countryiso3code: String,
    date: String,
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Reference {
    id: String,
}

/// Decode one `[meta, data]` page body.
fn parse_page(body: Value, format: CountryCodeFormat) -> Result<Page, LoadError> {
    let Value::Array(mut parts) = body else {
        return Err(LoadError::Fetch("World Bank response is not a JSON array.".to_string()));
    };

    if parts.len() == 1 {
        // Error bodies are `[{"message": [{"id": ..., "key": ..., "value": ...}]}]`.
        let msg: ProviderMessage = serde_json::from_value(parts.remove(0))
            .map_err(|e| LoadError::Fetch(format!("Unexpected World Bank response: {e}")))?;
        let text = msg
            .message
            .iter()
            .map(|m| format!("{}: {}", m.key, m.value))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(LoadError::Fetch(format!("World Bank returned an error: {text}")));
    }
    if parts.len() != 2 {
        return Err(LoadError::Fetch(format!(
            "World Bank response has {} parts, expected 2.",
            parts.len()
        )));
    }

    let data = parts.pop().unwrap_or(Value::Null);
    let meta: PageMeta = serde_json::from_value(parts.remove(0))
        .map_err(|e| LoadError::Fetch(format!("Invalid World Bank page metadata: {e}")))?;

    let observations: Vec<Observation> = match data {
        Value::Null => Vec::new(),
        other => serde_json::from_value(other)
            .map_err(|e| LoadError::Fetch(format!("Invalid World Bank observations: {e}")))?,
    };

    let records = observations
        .into_iter()
        .map(|obs| {
            let country = match format {
                CountryCodeFormat::Iso2 => obs.country.id,
                CountryCodeFormat::Iso3 => obs.countryiso3code,
            };
            ObservationRecord {
                country,
                indicator: obs.indicator.id,
                period: obs.date,
                value: obs.value,
            }
        })
        .collect();

    Ok(Page {
        pages: meta.pages.max(1),
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CountrySet, IndicatorSpec, YearRange, INFLATION_CODE};
    use httpmock::prelude::*;
    use serde_json::json;

    fn body() -> Value {
        json!([
            {"page": 1, "pages": 1, "per_page": 20000, "total": 2, "sourceid": "2"},
            [
                {
                    "indicator": {"id": "FP.CPI.TOTL.ZG", "value": "Inflation, consumer prices (annual %)"},
                    "country": {"id": "JP", "value": "Japan"},
                    "countryiso3code": "JPN",
                    "date": "2022",
                    "value": 2.497,
                    "unit": "", "obs_status": "", "decimal": 1
                },
                {
                    "indicator": {"id": "FP.CPI.TOTL.ZG", "value": "Inflation, consumer prices (annual %)"},
                    "country": {"id": "JP", "value": "Japan"},
                    "countryiso3code": "JPN",
                    "date": "2023",
                    "value": null,
                    "unit": "", "obs_status": "", "decimal": 1
                }
            ]
        ])
    }

    #[test]
    fn parses_long_observations_in_requested_format() {
        let page = parse_page(body(), CountryCodeFormat::Iso3).unwrap();
        assert_eq!(page.pages, 1);
        assert_eq!(
            page.records[0],
            ObservationRecord::new("JPN", "FP.CPI.TOTL.ZG", "2022", Some(2.497))
        );
        assert_eq!(page.records[1].value, None);

        let page = parse_page(body(), CountryCodeFormat::Iso2).unwrap();
        assert_eq!(page.records[0].country, "JP");
    }

    #[test]
    fn null_data_is_empty() {
        let page = parse_page(json!([{"page": 1, "pages": 0}, null]), CountryCodeFormat::Iso3).unwrap();
        assert!(page.records.is_empty());
        assert_eq!(page.pages, 1);
    }

    #[test]
    fn error_body_is_fetch_failure() {
        let body = json!([{"message": [{"id": "120", "key": "Invalid value", "value": "The provided parameter value is not valid"}]}]);
        match parse_page(body, CountryCodeFormat::Iso3) {
            Err(LoadError::Fetch(msg)) => assert!(msg.contains("Invalid value")),
            other => panic!("expected fetch failure, got {other:?}"),
        }
        assert!(parse_page(json!({"oops": true}), CountryCodeFormat::Iso3).is_err());
    }

    fn inflation_request() -> LoadRequest {
        LoadRequest::new(
            IndicatorSpec::new([(INFLATION_CODE, "Inflation")]).unwrap(),
            CountrySet::new(CountryCodeFormat::Iso3, ["JPN", "USA"]).unwrap(),
            YearRange::new(2021, 2022).unwrap(),
        )
    }

    fn observation(iso2: &str, iso3: &str, date: &str, value: Option<f64>) -> Value {
        json!({
            "indicator": {"id": INFLATION_CODE, "value": "Inflation, consumer prices (annual %)"},
            "country": {"id": iso2, "value": ""},
            "countryiso3code": iso3,
            "date": date,
            "value": value
        })
    }

    #[test]
    fn fetch_follows_pages_into_one_bulk_result() {
        let server = MockServer::start();
        let path = format!("/country/JPN;USA/indicator/{INFLATION_CODE}");

        let first = server.mock(|when, then| {
            when.method(GET)
                .path(path.as_str())
                .query_param("source", "2")
                .query_param("date", "2021:2022")
                .query_param("format", "json")
                .query_param("page", "1");
            then.status(200).json_body(json!([
                {"page": 1, "pages": 2, "per_page": 2, "total": 3},
                [
                    observation("JP", "JPN", "2022", Some(2.5)),
                    observation("JP", "JPN", "2021", Some(-0.2)),
                ]
            ]));
        });
        let second = server.mock(|when, then| {
            when.method(GET).path(path.as_str()).query_param("page", "2");
            then.status(200).json_body(json!([
                {"page": 2, "pages": 2, "per_page": 2, "total": 3},
                [observation("US", "USA", "2022", Some(8.0))]
            ]));
        });

        let source = WorldBankSource::new(server.base_url()).unwrap();
        let raw = source.fetch(&inflation_request()).unwrap();
        first.assert();
        second.assert();

        let RawObservations::Long(records) = raw else {
            panic!("expected long observations");
        };
        assert_eq!(records.len(), 3);
        assert_eq!(records[2], ObservationRecord::new("USA", INFLATION_CODE, "2022", Some(8.0)));
    }

    #[test]
    fn server_error_is_fetch_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET);
            then.status(500).body("internal error");
        });

        let source = WorldBankSource::new(server.base_url()).unwrap();
        match source.fetch(&inflation_request()) {
            Err(LoadError::Fetch(msg)) => assert!(msg.contains("500")),
            other => panic!("expected fetch failure, got {other:?}"),
        }
    }

    #[test]
    fn url_batches_all_codes() {
        let request = LoadRequest::new(
            IndicatorSpec::macro_default(),
            CountrySet::new(CountryCodeFormat::Iso3, ["JPN", "USA"]).unwrap(),
            YearRange::new(2010, 2020).unwrap(),
        );
        assert_eq!(
            observations_url("https://api.worldbank.org/v2", &request),
            "https://api.worldbank.org/v2/country/JPN;USA/indicator/FP.CPI.TOTL.ZG;NY.GDP.MKTP.KD.ZG;SL.UEM.TOTL.ZS"
        );
    }
}
