//! `IndicatorLoader`: bulk fetch -> normalize -> session cache.

use std::sync::Arc;

use tracing::{info, warn};

use crate::data::cache::RequestCache;
use crate::data::reshape::normalize;
use crate::data::source::IndicatorSource;
use crate::domain::{IndicatorTable, LoadRequest};
use crate::error::LoadError;

/// Result of the never-failing `load` boundary.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub table: Arc<IndicatorTable>,
    /// Set when the table is empty because the load faulted.
    pub diagnostic: Option<String>,
}

pub struct IndicatorLoader<S> {
    source: S,
    cache: RequestCache<LoadRequest, IndicatorTable>,
}

impl<S: IndicatorSource> IndicatorLoader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: RequestCache::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Load the canonical table, keeping fetch and reshape faults distinct.
    ///
    /// Successful results are memoized per request; an identical later
    /// request is served without touching the provider.
    pub fn try_load(&self, request: &LoadRequest) -> Result<Arc<IndicatorTable>, LoadError> {
        if let Some(hit) = self.cache.get(request) {
            return Ok(hit);
        }
        self.cache.get_or_try_insert_with(request, || {
            let raw = self.source.fetch(request)?;
            let table = normalize(raw, request)?;
            info!(
                source = self.source.name(),
                rows = table.len(),
                start = request.years.start(),
                end = request.years.end(),
                "loaded indicator table"
            );
            Ok(table)
        })
    }

    /// Load the canonical table, degrading any fault to the empty table.
    pub fn load(&self, request: &LoadRequest) -> LoadOutcome {
        match self.try_load(request) {
            Ok(table) => LoadOutcome {
                table,
                diagnostic: None,
            },
            Err(err) => {
                warn!(source = self.source.name(), error = %err, "indicator load failed");
                LoadOutcome {
                    table: Arc::new(IndicatorTable::empty()),
                    diagnostic: Some(err.to_string()),
                }
            }
        }
    }

    /// Drop every memoized table (forces the next load to fetch).
    pub fn invalidate(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::domain::{
        CountryCodeFormat, CountrySet, IndicatorSpec, ObservationRecord, RawObservations, YearRange,
    };

    /// In-memory provider that counts bulk fetches.
    struct FakeSource {
        calls: Cell<usize>,
        response: RefCell<Result<RawObservations, LoadError>>,
    }

    impl FakeSource {
        fn new(response: Result<RawObservations, LoadError>) -> Self {
            Self {
                calls: Cell::new(0),
                response: RefCell::new(response),
            }
        }
    }

    impl IndicatorSource for FakeSource {
        fn fetch(&self, _request: &LoadRequest) -> Result<RawObservations, LoadError> {
            self.calls.set(self.calls.get() + 1);
            self.response.borrow().clone()
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn request(start: i32, end: i32) -> LoadRequest {
        LoadRequest::new(
            IndicatorSpec::new([("X.1", "Inflation")]).unwrap(),
            CountrySet::unchecked(CountryCodeFormat::Iso2, ["A", "B"]),
            YearRange::new(start, end).unwrap(),
        )
    }

    fn scenario() -> RawObservations {
        RawObservations::Long(vec![
            ObservationRecord::new("A", "X.1", "YR2020", Some(2.0)),
            ObservationRecord::new("B", "X.1", "YR2020", Some(1.0)),
            ObservationRecord::new("A", "X.1", "YR2021", Some(3.0)),
        ])
    }

    #[test]
    fn identical_requests_fetch_once() {
        let loader = IndicatorLoader::new(FakeSource::new(Ok(scenario())));

        let first = loader.load(&request(2020, 2021));
        let second = loader.load(&request(2020, 2021));
        assert_eq!(loader.source().calls.get(), 1);
        assert!(Arc::ptr_eq(&first.table, &second.table));

        loader.load(&request(2019, 2021));
        assert_eq!(loader.source().calls.get(), 2);
    }

    #[test]
    fn end_to_end_scenario() {
        let loader = IndicatorLoader::new(FakeSource::new(Ok(scenario())));
        let outcome = loader.load(&request(2020, 2021));
        assert!(outcome.diagnostic.is_none());

        let t = &outcome.table;
        assert_eq!(t.len(), 4);
        assert_eq!(t.value("A", 2020, "Inflation"), Some(2.0));
        assert_eq!(t.value("B", 2020, "Inflation"), Some(1.0));
        assert_eq!(t.value("A", 2021, "Inflation"), Some(3.0));
        assert_eq!(t.value("B", 2021, "Inflation"), None);
        assert!(t.rows().iter().any(|r| r.country == "B" && r.year == 2021));
    }

    #[test]
    fn fetch_fault_degrades_to_empty_with_diagnostic() {
        let loader = IndicatorLoader::new(FakeSource::new(Err(LoadError::Fetch("timeout".into()))));
        let outcome = loader.load(&request(2020, 2021));
        assert!(outcome.table.is_empty());
        assert!(outcome.diagnostic.as_deref().unwrap_or("").contains("timeout"));

        assert_eq!(
            loader.try_load(&request(2020, 2021)).unwrap_err(),
            LoadError::Fetch("timeout".into())
        );
        // Failures are not memoized.
        assert_eq!(loader.source().calls.get(), 2);
    }

    #[test]
    fn malformed_input_is_reshape_error_and_empty_table() {
        let raw = RawObservations::Long(vec![ObservationRecord::new("A", "X.1", "n/a", Some(1.0))]);
        let loader = IndicatorLoader::new(FakeSource::new(Ok(raw)));
        assert!(matches!(loader.try_load(&request(2020, 2021)), Err(LoadError::Reshape(_))));
        assert!(loader.load(&request(2020, 2021)).table.is_empty());
    }

    #[test]
    fn empty_input_is_empty_table_without_diagnostic() {
        let loader = IndicatorLoader::new(FakeSource::new(Ok(RawObservations::Long(Vec::new()))));
        let outcome = loader.load(&request(2020, 2021));
        assert!(outcome.table.is_empty());
        assert!(outcome.diagnostic.is_none());
    }

    #[test]
    fn invalidate_forces_refetch() {
        let loader = IndicatorLoader::new(FakeSource::new(Ok(scenario())));
        loader.load(&request(2020, 2021));
        loader.invalidate();
        loader.load(&request(2020, 2021));
        assert_eq!(loader.source().calls.get(), 2);
    }
}
