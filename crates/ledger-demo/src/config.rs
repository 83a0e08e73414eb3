//! Demo configuration loaded from environment variables.

use std::str::FromStr;

use ledger::{ClientId, ClientSeed, DEFAULT_DATABASE_URL, ORDER_PRICE, OrderId};

/// How checkpoints are written to standard output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable status lines.
    #[default]
    Text,
    /// One JSON object per checkpoint.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

/// Demo configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `LEDGER_DATABASE_URL` — SQLite URL (default: `"sqlite::memory:"`)
/// - `LEDGER_CLIENT_ID` — client the scenario works on (default: `1`)
/// - `LEDGER_ORDER_ID` — order the items are added to (default: `1`)
/// - `LEDGER_CLIENT_LOGIN` — login of the seeded client (default: `"test"`)
/// - `LEDGER_INITIAL_BALANCE` — seeded account balance (default: `675`)
/// - `LEDGER_ORDER_PRICE` — price charged per item (default: `50`)
/// - `LEDGER_OUTPUT` — `text` or `json` (default: `text`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
///
/// Values that fail to parse fall back to their defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub client_id: ClientId,
    pub order_id: OrderId,
    pub client_login: String,
    pub initial_balance: i64,
    pub order_price: i64,
    pub output: OutputFormat,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<i64>().ok());

        Self {
            database_url: lookup("LEDGER_DATABASE_URL").unwrap_or(defaults.database_url),
            client_id: parsed("LEDGER_CLIENT_ID")
                .map(ClientId::new)
                .unwrap_or(defaults.client_id),
            order_id: parsed("LEDGER_ORDER_ID")
                .map(OrderId::new)
                .unwrap_or(defaults.order_id),
            client_login: lookup("LEDGER_CLIENT_LOGIN").unwrap_or(defaults.client_login),
            initial_balance: parsed("LEDGER_INITIAL_BALANCE").unwrap_or(defaults.initial_balance),
            order_price: parsed("LEDGER_ORDER_PRICE").unwrap_or(defaults.order_price),
            output: lookup("LEDGER_OUTPUT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.output),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    /// Returns the client fixture the scenario starts from.
    pub fn client_seed(&self) -> ClientSeed {
        ClientSeed::new(self.client_id, &self.client_login, self.initial_balance)
    }
}

impl Default for Config {
    fn default() -> Self {
        let seed = ClientSeed::default();
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            client_id: seed.id,
            order_id: OrderId::new(1),
            client_login: seed.login,
            initial_balance: seed.account,
            order_price: ORDER_PRICE,
            output: OutputFormat::Text,
            log_level: "info".to_string(),
        }
    }
}
