use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub google: GoogleSheetsConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub draw: DrawConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Which persistent store backs the inventory and the entry ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Sheets,
    Database,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "sheets" | "google" | "spreadsheet" => Ok(StorageBackend::Sheets),
            "database" | "db" | "postgres" => Ok(StorageBackend::Database),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// JSON inventory document used by the file backend
    #[serde(default = "default_prizes_file")]
    pub prizes_file: String,
    /// JSON-lines entry ledger used by the file backend
    #[serde(default = "default_entries_file")]
    pub entries_file: String,
}

fn default_prizes_file() -> String {
    "server/data/prizes.json".to_string()
}

fn default_entries_file() -> String {
    "server/data/entries.jsonl".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            prizes_file: default_prizes_file(),
            entries_file: default_entries_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleSheetsConfig {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default)]
    pub client_email: String,
    /// PEM encoded RSA key of the service account
    #[serde(default)]
    pub private_key: String,
    /// Pre-issued OAuth token; skips the service-account exchange when set
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_sheets_api_base")]
    pub api_base_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_inventory_tab")]
    pub inventory_tab: String,
    #[serde(default = "default_entries_range")]
    pub entries_range: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_sheets_api_base() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_inventory_tab() -> String {
    "Inventory".to_string()
}

fn default_entries_range() -> String {
    "Sheet1!A:G".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for GoogleSheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            client_email: String::new(),
            private_key: String::new(),
            access_token: None,
            api_base_url: default_sheets_api_base(),
            token_url: default_token_url(),
            inventory_tab: default_inventory_tab(),
            entries_range: default_entries_range(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
        }
    }
}

/// 单项权重上限, 保证权重求和不溢出
pub const MAX_DRAW_WEIGHT: u64 = 1_000_000_000;

/// Weighting constants of the draw policy and the read deadline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawConfig {
    #[serde(default = "default_baseline_weight")]
    pub baseline_weight: u64,
    #[serde(default = "default_unlimited_weight")]
    pub unlimited_weight: u64,
    #[serde(default = "default_max_tier_weight")]
    pub max_tier_weight: u64,
    #[serde(default = "default_list_timeout_ms")]
    pub list_timeout_ms: u64,
}

fn default_baseline_weight() -> u64 {
    1000
}

fn default_unlimited_weight() -> u64 {
    1
}

fn default_max_tier_weight() -> u64 {
    1000
}

fn default_list_timeout_ms() -> u64 {
    5_000
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            baseline_weight: default_baseline_weight(),
            unlimited_weight: default_unlimited_weight(),
            max_tier_weight: default_max_tier_weight(),
            list_timeout_ms: default_list_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdminConfig {
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // Missing file: fall back to defaults, env overrides below fill the rest
        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::parse(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Config::default(),
            Err(e) => {
                return Err(format!("Failed to read config file {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn parse(config_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        toml::from_str(config_str).map_err(|e| format!("Failed to parse config file: {e}").into())
    }

    fn apply_env_overrides(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }

        if let Ok(v) = env::var("STORAGE_BACKEND") {
            self.storage.backend = v.parse()?;
        }
        if let Ok(v) = env::var("PRIZES_FILE") {
            self.storage.prizes_file = v;
        }
        if let Ok(v) = env::var("ENTRIES_FILE") {
            self.storage.entries_file = v;
        }

        if let Ok(v) = env::var("GOOGLE_SHEETS_SPREADSHEET_ID") {
            self.google.spreadsheet_id = v;
        }
        if let Ok(v) = env::var("GOOGLE_SERVICE_ACCOUNT_EMAIL") {
            self.google.client_email = v;
        }
        if let Ok(v) = env::var("GOOGLE_SERVICE_ACCOUNT_PRIVATE_KEY") {
            self.google.private_key = v;
        }
        if let Ok(v) = env::var("GOOGLE_SHEETS_ACCESS_TOKEN") {
            self.google.access_token = Some(v);
        }
        // keys pasted into env files usually carry literal "\n"
        self.google.private_key = self.google.private_key.replace("\\n", "\n");

        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }

        if let Ok(v) = env::var("DRAW_BASELINE_WEIGHT")
            && let Ok(n) = v.parse()
        {
            self.draw.baseline_weight = n;
        }
        if let Ok(v) = env::var("DRAW_UNLIMITED_WEIGHT")
            && let Ok(n) = v.parse()
        {
            self.draw.unlimited_weight = n;
        }
        if let Ok(v) = env::var("DRAW_MAX_TIER_WEIGHT")
            && let Ok(n) = v.parse()
        {
            self.draw.max_tier_weight = n;
        }
        if let Ok(v) = env::var("DRAW_LIST_TIMEOUT_MS")
            && let Ok(n) = v.parse()
        {
            self.draw.list_timeout_ms = n;
        }

        if let Ok(v) = env::var("ADMIN_API_KEY")
            && !v.is_empty()
        {
            self.admin.api_key = Some(v);
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        match self.storage.backend {
            StorageBackend::Sheets => {
                if self.google.spreadsheet_id.is_empty() {
                    return Err("Missing GOOGLE_SHEETS_SPREADSHEET_ID".into());
                }
                let has_account =
                    !self.google.client_email.is_empty() && !self.google.private_key.is_empty();
                if !has_account && self.google.access_token.is_none() {
                    return Err("Missing Google service account env vars".into());
                }
            }
            StorageBackend::Database => {
                if self.database.url.is_empty() {
                    return Err("Missing DATABASE_URL for the database storage backend".into());
                }
            }
            StorageBackend::File | StorageBackend::Memory => {}
        }
        if self.draw.max_tier_weight == 0 {
            return Err("draw.max_tier_weight must be at least 1".into());
        }
        for (name, weight) in [
            ("baseline_weight", self.draw.baseline_weight),
            ("unlimited_weight", self.draw.unlimited_weight),
            ("max_tier_weight", self.draw.max_tier_weight),
        ] {
            if weight > MAX_DRAW_WEIGHT {
                return Err(format!("draw.{name} must be at most {MAX_DRAW_WEIGHT}").into());
            }
        }
        if self.draw.list_timeout_ms == 0 {
            return Err("draw.list_timeout_ms must be at least 1".into());
        }
        Ok(())
    }
}
