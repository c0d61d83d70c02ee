use crate::model::{PriceSeries, ProviderError};

/// Lookup of a symbol's price history, owned by the calling layer.
#[async_trait::async_trait]
pub trait SeriesProvider: Send + Sync {
    async fn series(&self, symbol: &str) -> Result<PriceSeries, ProviderError>;
}
