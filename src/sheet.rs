// Remote sale log: one fire-and-forget POST per confirmed sale.
//
// The webhook is pure telemetry. Failures, delays, and ordering relative to
// subsequent commits never touch in-process state; errors are logged and
// dropped, never retried, never surfaced to the operator.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use crate::auction::ledger::SaleRecord;
use crate::config::Config;

/// Wire payload for the sale webhook.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalePayload {
    pub player_name: String,
    pub team_name: String,
    pub base_price: u32,
    pub sold_price: u32,
    pub category: String,
    pub role: String,
    pub timestamp: String,
}

impl SalePayload {
    pub fn from_record(sale: &SaleRecord) -> Self {
        SalePayload {
            player_name: sale.player_name.clone(),
            team_name: sale.team_name.clone(),
            base_price: sale.base_price,
            sold_price: sale.price,
            category: sale.category.clone(),
            role: sale.role.clone(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Anything that can receive a confirmed sale.
#[async_trait]
pub trait SaleSink: Send + Sync {
    async fn record_sale(&self, sale: &SaleRecord);
}

/// The configured webhook client, or a no-op when no URL is configured.
pub enum SheetClient {
    Active(ActiveSheet),
    Disabled,
}

pub struct ActiveSheet {
    http: reqwest::Client,
    url: String,
}

impl SheetClient {
    /// Build the client from config. No URL means the sink is disabled.
    pub fn from_config(config: &Config) -> Self {
        match &config.sheet.webhook_url {
            Some(url) if !url.trim().is_empty() => SheetClient::Active(ActiveSheet {
                http: reqwest::Client::new(),
                url: url.clone(),
            }),
            _ => SheetClient::Disabled,
        }
    }
}

#[async_trait]
impl SaleSink for SheetClient {
    async fn record_sale(&self, sale: &SaleRecord) {
        let sheet = match self {
            SheetClient::Active(sheet) => sheet,
            SheetClient::Disabled => {
                debug!("sale webhook disabled; skipping {}", sale.player_name);
                return;
            }
        };

        let payload = SalePayload::from_record(sale);
        match sheet.http.post(&sheet.url).json(&payload).send().await {
            Ok(response) => {
                if let Err(e) = response.error_for_status() {
                    warn!("sale webhook rejected {}: {e}", sale.player_name);
                }
            }
            Err(e) => {
                warn!("sale webhook failed for {}: {e}", sale.player_name);
            }
        }
    }
}
