pub mod line;

use async_trait::async_trait;

#[async_trait]
pub trait MessagingProvider: Send + Sync {
    /// Answer the message that carried `reply_token`.
    async fn reply_message(&self, reply_token: &str, body: &str) -> anyhow::Result<()>;

    /// Send a message outside a reply window (team alerts, staff pings).
    async fn push_message(&self, to: &str, body: &str) -> anyhow::Result<()>;
}
