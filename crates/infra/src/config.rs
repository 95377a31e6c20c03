//! Ledger configuration (where durable state lives).

use std::path::PathBuf;

use serde::Deserialize;

/// Environment variable naming the data directory.
pub const DATA_DIR_ENV: &str = "BANKLEDGER_DATA_DIR";

/// Storage configuration for a file-backed ledger.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LedgerConfig {
    /// Directory holding the three collection files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_customers_file")]
    pub customers_file: String,
    #[serde(default = "default_accounts_file")]
    pub accounts_file: String,
    #[serde(default = "default_activity_file")]
    pub activity_file: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_customers_file() -> String {
    "customers.json".to_string()
}

fn default_accounts_file() -> String {
    "accounts.json".to_string()
}

fn default_activity_file() -> String {
    "transactions.json".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            customers_file: default_customers_file(),
            accounts_file: default_accounts_file(),
            activity_file: default_activity_file(),
        }
    }
}

impl LedgerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup(DATA_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            Some(dir) => Self {
                data_dir: PathBuf::from(dir),
                ..Self::default()
            },
            None => {
                tracing::warn!("{DATA_DIR_ENV} not set; storing ledger data in the working directory");
                Self::default()
            }
        }
    }

    pub fn customers_path(&self) -> PathBuf {
        self.data_dir.join(&self.customers_file)
    }

    pub fn accounts_path(&self) -> PathBuf {
        self.data_dir.join(&self.accounts_file)
    }

    pub fn activity_path(&self) -> PathBuf {
        self.data_dir.join(&self.activity_file)
    }
}
