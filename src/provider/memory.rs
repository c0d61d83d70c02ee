use crate::model::{PriceSeries, ProviderError};
use crate::provider::SeriesProvider;
use std::collections::HashMap;

/// Already-materialized series keyed by symbol.
#[derive(Debug, Default, Clone)]
pub struct MemoryProvider {
    series: HashMap<String, PriceSeries>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, series: PriceSeries) {
        self.series.insert(series.symbol().to_string(), series);
    }

    pub fn remove(&mut self, symbol: &str) -> Option<PriceSeries> {
        self.series.remove(symbol)
    }
}

impl FromIterator<PriceSeries> for MemoryProvider {
    fn from_iter<I: IntoIterator<Item = PriceSeries>>(iter: I) -> Self {
        let mut provider = Self::new();
        for series in iter {
            provider.insert(series);
        }
        provider
    }
}

#[async_trait::async_trait]
impl SeriesProvider for MemoryProvider {
    async fn series(&self, symbol: &str) -> Result<PriceSeries, ProviderError> {
        self.series
            .get(symbol)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))
    }
}
