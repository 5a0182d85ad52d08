//! Provider seam for indicator observations.

use crate::domain::{LoadRequest, RawObservations};
use crate::error::LoadError;

/// A statistics provider that answers a whole `LoadRequest` in one bulk fetch.
///
/// Implementations must not fan out into one call per indicator or country;
/// the loader counts one `fetch` as one round-trip to the provider.
pub trait IndicatorSource {
    fn fetch(&self, request: &LoadRequest) -> Result<RawObservations, LoadError>;

    /// Short provider name for diagnostics.
    fn name(&self) -> &str;
}

impl<S: IndicatorSource + ?Sized> IndicatorSource for Box<S> {
    fn fetch(&self, request: &LoadRequest) -> Result<RawObservations, LoadError> {
        (**self).fetch(request)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
