//! Stock alert webhook notifier
//!
//! Optional HTTP push of newly created alerts to a configured webhook. The
//! payload carries an HMAC-SHA256 signature header so the receiver can
//! verify origin. Delivery failures are logged and never surfaced to the
//! mutating call.

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use shared::models::StockAlert;

use crate::config::AlertsConfig;

type HmacSha256 = Hmac<Sha256>;

/// Webhook client for pushing stock alerts
#[derive(Clone)]
pub struct AlertNotifier {
    http_client: reqwest::Client,
    webhook_url: Option<String>,
    signing_secret: Option<String>,
}

impl AlertNotifier {
    pub fn new(config: &AlertsConfig) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            webhook_url: config.webhook_url.clone(),
            signing_secret: config.signing_secret.clone(),
        }
    }

    /// A notifier that never sends anything (tests, webhook unset)
    pub fn disabled() -> Self {
        Self {
            http_client: reqwest::Client::new(),
            webhook_url: None,
            signing_secret: None,
        }
    }

    /// Push alerts in the background; fire and forget
    ///
    /// Called after the mutating request has released its stock locks.
    pub fn dispatch(&self, alerts: Vec<StockAlert>) {
        if alerts.is_empty() || self.webhook_url.is_none() {
            return;
        }
        let notifier = self.clone();
        tokio::spawn(async move {
            for alert in &alerts {
                notifier.push_alert(alert).await;
            }
        });
    }

    async fn push_alert(&self, alert: &StockAlert) {
        let Some(url) = &self.webhook_url else {
            return;
        };

        let body = match serde_json::to_vec(alert) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Failed to serialize alert payload: {}", e);
                return;
            }
        };

        let mut request = self
            .http_client
            .post(url)
            .header("content-type", "application/json")
            .body(body.clone());

        if let Some(signature) = self.sign(&body) {
            request = request.header("x-kmp-signature", signature);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(alert_id = %alert.id, "Alert webhook delivered");
            }
            Ok(response) => {
                tracing::warn!(
                    alert_id = %alert.id,
                    status = %response.status(),
                    "Alert webhook rejected"
                );
            }
            Err(e) => {
                tracing::warn!(alert_id = %alert.id, "Alert webhook failed: {}", e);
            }
        }
    }

    /// Base64 HMAC-SHA256 of the payload, when a secret is configured
    fn sign(&self, body: &[u8]) -> Option<String> {
        let secret = self.signing_secret.as_ref()?;
        let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return None,
        };
        mac.update(body);
        Some(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }
}
