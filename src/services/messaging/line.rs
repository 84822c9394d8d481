use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use super::MessagingProvider;
use crate::services::directory::IdentityResolver;

const API_BASE: &str = "https://api.line.me/v2/bot";

/// Name used in confirmations when the profile lookup fails.
const FALLBACK_DISPLAY_NAME: &str = "Customer";

pub struct LineMessagingProvider {
    channel_access_token: String,
    client: reqwest::Client,
}

impl LineMessagingProvider {
    pub fn new(channel_access_token: String) -> Self {
        Self {
            channel_access_token,
            client: reqwest::Client::new(),
        }
    }

    async fn send(&self, endpoint: &str, payload: serde_json::Value) -> anyhow::Result<()> {
        self.client
            .post(format!("{API_BASE}/message/{endpoint}"))
            .bearer_auth(&self.channel_access_token)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("failed to call LINE {endpoint} API"))?
            .error_for_status()
            .with_context(|| format!("LINE {endpoint} API returned error"))?;
        Ok(())
    }
}

#[async_trait]
impl MessagingProvider for LineMessagingProvider {
    async fn reply_message(&self, reply_token: &str, body: &str) -> anyhow::Result<()> {
        self.send(
            "reply",
            serde_json::json!({
                "replyToken": reply_token,
                "messages": [{ "type": "text", "text": body }],
            }),
        )
        .await
    }

    async fn push_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        self.send(
            "push",
            serde_json::json!({
                "to": to,
                "messages": [{ "type": "text", "text": body }],
            }),
        )
        .await
    }
}

pub struct LineIdentityResolver {
    channel_access_token: String,
    client: reqwest::Client,
}

impl LineIdentityResolver {
    pub fn new(channel_access_token: String) -> Self {
        Self {
            channel_access_token,
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_profile(&self, user_id: &str) -> anyhow::Result<String> {
        #[derive(Deserialize)]
        struct Profile {
            #[serde(rename = "displayName")]
            display_name: String,
        }

        let profile: Profile = self
            .client
            .get(format!("{API_BASE}/profile/{user_id}"))
            .bearer_auth(&self.channel_access_token)
            .send()
            .await
            .context("failed to call LINE profile API")?
            .error_for_status()
            .context("LINE profile API returned error")?
            .json()
            .await
            .context("failed to decode LINE profile response")?;
        Ok(profile.display_name)
    }
}

#[async_trait]
impl IdentityResolver for LineIdentityResolver {
    async fn display_name(&self, user_id: &str) -> String {
        match self.fetch_profile(user_id).await {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(error = %e, user = %user_id, "profile lookup failed, using fallback name");
                FALLBACK_DISPLAY_NAME.to_string()
            }
        }
    }
}
