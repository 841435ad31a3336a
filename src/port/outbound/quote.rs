//! Upstream dividend source port.

use async_trait::async_trait;

use crate::domain::{Dividends, QueryKey};
use crate::error::Result;

/// Slow, rate-limited chain query for dividend values.
///
/// Implementations return [`Dividends::Single`] for a fully specified key and
/// [`Dividends::Aggregate`] for wildcard keys. Malformed upstream payloads
/// must be rejected as [`Error::Upstream`](crate::error::Error::Upstream)
/// rather than passed inward.
///
/// Callers bound every call with a timeout, so implementations need not.
#[async_trait]
pub trait UpstreamQuoteSource: Send + Sync {
    /// Return the source name for logging.
    fn name(&self) -> &'static str;

    /// Fetch dividend values for the scope described by `key`.
    async fn fetch(&self, key: &QueryKey) -> Result<Dividends>;
}
