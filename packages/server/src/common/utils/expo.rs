use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::kernel::BasePushNotificationService;

const EXPO_PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";

/// Expo push client used by the push notification channel
pub struct ExpoClient {
    client: Client,
    access_token: Option<String>,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct ExpoMessage<'a> {
    to: &'a str,
    title: &'a str,
    body: &'a str,
    data: &'a serde_json::Value,
    sound: &'static str,
    #[serde(rename = "channelId")]
    channel_id: &'static str,
}

#[derive(Debug, Deserialize)]
struct ExpoResponse {
    data: ExpoTicket,
}

#[derive(Debug, Deserialize)]
struct ExpoTicket {
    status: String,
    message: Option<String>,
    #[allow(dead_code)]
    details: Option<serde_json::Value>,
}

impl ExpoClient {
    pub fn new(access_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            access_token,
            endpoint: EXPO_PUSH_URL.to_string(),
        }
    }

    /// Point the client at a different push endpoint (staging relays, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Expo tokens look like `ExponentPushToken[...]` or `ExpoPushToken[...]`.
    pub fn is_expo_token(token: &str) -> bool {
        (token.starts_with("ExponentPushToken[") || token.starts_with("ExpoPushToken["))
            && token.ends_with(']')
    }
}

#[async_trait]
impl BasePushNotificationService for ExpoClient {
    async fn send_notification(
        &self,
        push_token: &str,
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) -> Result<()> {
        if !Self::is_expo_token(push_token) {
            anyhow::bail!("Not an Expo push token: {}", push_token);
        }

        let message = ExpoMessage {
            to: push_token,
            title,
            body,
            data: &data,
            sound: "default",
            channel_id: "matches",
        };

        let mut request = self.client.post(&self.endpoint).json(&message);

        // Access token only raises rate limits; anonymous sends work too
        if let Some(token) = &self.access_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        debug!("Sending Expo push notification to: {}", push_token);

        let response = request.send().await.context("Expo push request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Expo push failed {}: {}", status, body);
            anyhow::bail!("Expo push API error {}: {}", status, body);
        }

        let expo_response: ExpoResponse = response
            .json()
            .await
            .context("Unreadable Expo push response")?;

        if expo_response.data.status == "error" {
            anyhow::bail!(
                "Expo ticket error: {}",
                expo_response
                    .data
                    .message
                    .unwrap_or_else(|| "unknown".to_string())
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_expo_tokens() {
        assert!(ExpoClient::is_expo_token("ExponentPushToken[abc123]"));
        assert!(ExpoClient::is_expo_token("ExpoPushToken[abc123]"));
        assert!(!ExpoClient::is_expo_token("fcm:abc123"));
        assert!(!ExpoClient::is_expo_token("ExponentPushToken[abc123"));
    }

    #[tokio::test]
    async fn rejects_foreign_tokens_without_a_request() {
        let client = ExpoClient::new(None).with_endpoint("http://127.0.0.1:9/unreachable");
        let result = client
            .send_notification("apns:device", "Kickoff", "body", serde_json::json!({}))
            .await;

        assert!(result.unwrap_err().to_string().contains("Not an Expo push token"));
    }

    #[tokio::test]
    #[ignore] // Requires valid Expo push token
    async fn sends_to_a_real_device() {
        let client = ExpoClient::new(None);
        let token = std::env::var("TEST_EXPO_TOKEN").expect("TEST_EXPO_TOKEN not set");

        let result = client
            .send_notification(
                &token,
                "Availability reminder",
                "Are you in for Saturday?",
                serde_json::json!({"test": true}),
            )
            .await;

        assert!(result.is_ok());
    }
}
