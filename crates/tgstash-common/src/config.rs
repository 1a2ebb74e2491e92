//! Application configuration loaded from environment variables and config files.
//!
//! Supports `.env` files for development and environment variables for production.
//! Config precedence: flat deployment vars (`TG_BOT_TOKEN`, `BASIC_USER`, ...) >
//! `TGSTASH_<SECTION>__<KEY>` env vars > config.toml > defaults
//!
//! The loaded [`AppConfig`] is owned by the caller and handed to the router state;
//! nothing here is global.

use serde::Deserialize;

/// Default upload ceiling: 45 MiB, a margin below Telegram's 50 MiB bot document limit.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 45 * 1024 * 1024;

/// Flat environment variables used by existing deployments, mapped onto config keys.
const FLAT_OVERRIDES: &[(&str, &str)] = &[
    ("TG_BOT_TOKEN", "telegram.bot_token"),
    ("TG_CHAT_ID", "telegram.chat_id"),
    ("BASIC_USER", "admin.user"),
    ("BASIC_PASS", "admin.pass"),
    ("PUBLIC_BASE_URL", "server.public_base_url"),
    ("REDIS_URL", "store.redis_url"),
    ("DISABLE_TELEMETRY", "telemetry.disable_telemetry"),
    ("disable_telemetry", "telemetry.disable_telemetry"),
];

/// Load configuration from the process environment.
///
/// Should be called once at application startup.
pub fn load() -> Result<AppConfig, config::ConfigError> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    build(|name| std::env::var(name).ok())
}

/// Build configuration, resolving the flat deployment variables through `lookup`.
pub fn build(lookup: impl Fn(&str) -> Option<String>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder()
        // Defaults
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("server.assets_dir", "./public")?
        .set_default("telegram.api_base", "https://api.telegram.org")?
        .set_default("telegram.timeout_secs", 60)?
        .set_default("limits.max_upload_bytes", DEFAULT_MAX_UPLOAD_BYTES)?
        // Optional config file
        .add_source(config::File::with_name("config").required(false))
        // Environment variables (TGSTASH_SERVER__PORT, TGSTASH_TELEGRAM__API_BASE, etc.)
        .add_source(
            config::Environment::with_prefix("TGSTASH")
                .separator("__")
                .try_parsing(true),
        );

    for (var, key) in FLAT_OVERRIDES {
        builder = builder.set_override_option(*key, lookup(var))?;
    }

    builder.build()?.try_deserialize()
}

/// A deployment flag counts as set unless it is absent, empty, or `"false"` (any case).
pub fn is_truthy(value: Option<&str>) -> bool {
    match value {
        Some(v) => !v.is_empty() && !v.eq_ignore_ascii_case("false"),
        None => false,
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub store: StoreConfig,
    pub limits: LimitsConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Surfaced by `/api/ping`; has no other effect.
    pub fn telemetry_disabled(&self) -> bool {
        is_truthy(self.telemetry.disable_telemetry.as_deref())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base used for generated file URLs. Falls back to the request origin when unset.
    pub public_base_url: Option<String>,
    /// Directory served by the static passthrough (admin UI, front page).
    pub assets_dir: String,
}

impl ServerConfig {
    pub fn public_base_url(&self) -> Option<&str> {
        self.public_base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    /// Chat the bot posts documents into.
    pub chat_id: Option<String>,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: "https://api.telegram.org".into(),
            timeout_secs: 60,
        }
    }
}

impl TelegramConfig {
    /// `(bot_token, chat_id)` when both are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let token = self.bot_token.as_deref();
        let chat = self.chat_id.as_deref();
        if is_truthy(token) && is_truthy(chat) {
            Some((token?, chat?))
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AdminConfig {
    pub user: Option<String>,
    pub pass: Option<String>,
}

impl AdminConfig {
    /// `(user, pass)` when the admin gate is enabled, `None` when it is open.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let user = self.user.as_deref();
        let pass = self.pass.as_deref();
        if is_truthy(user) && is_truthy(pass) {
            Some((user?, pass?))
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// Redis connection URL — optional; omit for lite / in-process-only mode.
    pub redis_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    pub max_upload_bytes: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct TelemetryConfig {
    pub disable_telemetry: Option<String>,
}
