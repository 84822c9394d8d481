use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub line_channel_access_token: String,
    /// Empty secret disables webhook signature checks (dev mode).
    pub line_channel_secret: String,
    /// Chat id that receives team alerts on commits. Empty disables alerts.
    pub team_alert_to: String,
    /// Optional path to a business profile JSON; empty uses built-ins.
    pub profile_path: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "salonbook.db".to_string()),
            line_channel_access_token: env::var("LINE_CHANNEL_ACCESS_TOKEN").unwrap_or_default(),
            line_channel_secret: env::var("LINE_CHANNEL_SECRET").unwrap_or_default(),
            team_alert_to: env::var("TEAM_ALERT_TO").unwrap_or_default(),
            profile_path: env::var("PROFILE_PATH").unwrap_or_default(),
        }
    }
}
