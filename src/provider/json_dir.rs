use crate::model::{PriceBar, PriceSeries, ProviderError};
use crate::provider::SeriesProvider;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads `<dir>/<SYMBOL>.json`, an array of daily bar records.
pub struct JsonDirProvider {
    dir: PathBuf,
}

/// Bar record as found on disk. Capitalised column names are accepted too.
#[derive(Debug, Deserialize)]
struct RawBar {
    #[serde(alias = "Date")]
    date: String,
    #[serde(alias = "Open")]
    open: Option<f64>,
    #[serde(alias = "High")]
    high: Option<f64>,
    #[serde(alias = "Low")]
    low: Option<f64>,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: f64,
}

impl JsonDirProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.json", symbol.to_uppercase()))
    }
}

#[async_trait::async_trait]
impl SeriesProvider for JsonDirProvider {
    async fn series(&self, symbol: &str) -> Result<PriceSeries, ProviderError> {
        let path = self.path_for(symbol);
        debug!("Reading price history from {}", path.display());
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => ProviderError::NotFound(symbol.to_string()),
            _ => ProviderError::Io(format!("{}: {}", path.display(), e)),
        })?;
        parse_series(symbol, &content, &path)
    }
}

fn parse_series(symbol: &str, content: &str, path: &Path) -> Result<PriceSeries, ProviderError> {
    let raw: Vec<RawBar> =
        serde_json::from_str(content).map_err(|e| ProviderError::Parse(format!("{}: {}", path.display(), e)))?;

    let bars = raw
        .into_iter()
        .map(|r| {
            let date = parse_date(&r.date)
                .ok_or_else(|| ProviderError::Parse(format!("{}: bad date '{}'", path.display(), r.date)))?;
            Ok(PriceBar {
                date,
                open: r.open.unwrap_or(r.close),
                high: r.high.unwrap_or(r.close),
                low: r.low.unwrap_or(r.close),
                close: r.close,
                volume: r.volume,
            })
        })
        .collect::<Result<Vec<_>, ProviderError>>()?;

    Ok(PriceSeries::new(symbol, bars)?)
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (the local date is kept).
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnalysisError;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_date("2024-03-15"), Some(expected));
        assert_eq!(parse_date("2024-03-15T00:00:00-04:00"), Some(expected));
        assert!(parse_date("15/03/2024").is_none());
    }

    #[tokio::test]
    async fn test_reads_symbol_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("AAPL.json"),
            r#"[
                {"Date": "2024-01-02", "Open": 1.0, "High": 2.0, "Low": 0.5, "Close": 1.5, "Volume": 100},
                {"date": "2024-01-03", "close": 1.6}
            ]"#,
        )
        .unwrap();

        let provider = JsonDirProvider::new(dir.path());
        let series = provider.series("aapl").await.unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[0].high, 2.0);
        assert_eq!(series.latest().open, 1.6);
        assert_eq!(series.latest().volume, 0.0);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonDirProvider::new(dir.path()).series("MSFT").await.unwrap_err();
        assert_eq!(err, ProviderError::NotFound("MSFT".into()));
    }

    #[tokio::test]
    async fn test_unordered_file_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("BAD.json"),
            r#"[{"date": "2024-01-03", "close": 1.0}, {"date": "2024-01-02", "close": 1.0}]"#,
        )
        .unwrap();
        let err = JsonDirProvider::new(dir.path()).series("BAD").await.unwrap_err();
        assert!(matches!(err, ProviderError::Invalid(AnalysisError::InvalidSeries { .. })));
    }

    #[tokio::test]
    async fn test_garbage_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ZZZ.json"), "not json").unwrap();
        let err = JsonDirProvider::new(dir.path()).series("ZZZ").await.unwrap_err();
        assert!(matches!(err, ProviderError::Parse(_)));
    }
}
