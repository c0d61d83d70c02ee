pub mod format;
pub mod sender;

use crate::analyzer::BatchReport;
use crate::model::NotifyError;
use reqwest::Client;
use tracing::{info, warn};

/// Pushes batch summaries to a single Telegram chat.
pub struct TelegramNotifier {
    pub bot_token: String,
    pub chat_id: i64,
    pub client: Client,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: i64) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::ApiError(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            bot_token,
            chat_id,
            client,
        })
    }

    pub async fn notify_text(&self, text: &str) -> Result<(), NotifyError> {
        sender::send_text(self, text).await
    }

    /// Sends the signal summary, then one message per top buy signal.
    pub async fn notify_report(&self, report: &BatchReport, top_n: usize) -> Result<(), NotifyError> {
        self.notify_text(&format::format_summary(report)).await?;

        let buys = report.top_buys(top_n);
        if buys.is_empty() {
            info!("No buy signals to report.");
            return self.notify_text("📊 No buy signals found right now.").await;
        }

        self.notify_text(&format::format_top_list(&buys)).await?;
        for result in buys {
            if let Err(e) = self.notify_text(&format::format_result(result)).await {
                warn!("Failed to send analysis for {}: {}", result.symbol, e);
            }
        }
        Ok(())
    }
}
