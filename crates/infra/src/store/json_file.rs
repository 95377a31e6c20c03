//! JSON file ledger store.
//!
//! Layout: three pretty-printed JSON arrays in one data directory.
//!
//! ```text
//! <data_dir>/customers.json      [{id, name, address, account_ids}]
//! <data_dir>/accounts.json       [{id, owner_id, balance, kind, interest_rate | overdraft_limit}]
//! <data_dir>/transactions.json   [{kind, ..., timestamp}]
//! ```
//!
//! Every commit rewrites all three files. All of them are serialized before
//! any byte hits the disk, each is written and fsynced to a `.tmp` sibling,
//! and the live files are hard-linked to `.bak` siblings. Only then are the
//! temp files renamed over the live ones. If any rename fails, the renames
//! already done are undone from the backups, so a failed commit leaves all
//! three files as they were and no `.tmp`/`.bak` files behind.
//!
//! Files written by the older layout (`customer_id`, `account_numbers`,
//! `account_number`, `account_holder_id`, a `type` tag, local timestamps
//! without offset) are read too; the next commit rewrites them in the current
//! layout.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use bankledger_banking::{Account, ActivityRecord, Customer};

use crate::config::LedgerConfig;

use super::records::{self, AccountRecord, CustomerRecord};
use super::r#trait::{LedgerSnapshot, LedgerStore, StoreError};

const CUSTOMERS: &str = "customers";
const ACCOUNTS: &str = "accounts";
const ACTIVITY: &str = "activity";

/// File-backed store writing one JSON document per collection.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    customers_path: PathBuf,
    accounts_path: PathBuf,
    activity_path: PathBuf,
}

impl JsonFileStore {
    /// Store using the default file names inside `data_dir` (created if missing).
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let config = LedgerConfig {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..LedgerConfig::default()
        };
        Self::from_config(&config)
    }

    pub fn from_config(config: &LedgerConfig) -> Result<Self, StoreError> {
        fs::create_dir_all(&config.data_dir)
            .map_err(|e| StoreError::io(&config.data_dir, e))?;

        Ok(Self {
            customers_path: config.customers_path(),
            accounts_path: config.accounts_path(),
            activity_path: config.activity_path(),
        })
    }

    pub fn customers_path(&self) -> &Path {
        &self.customers_path
    }

    pub fn accounts_path(&self) -> &Path {
        &self.accounts_path
    }

    pub fn activity_path(&self) -> &Path {
        &self.activity_path
    }

    fn load_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let raw: Vec<serde_json::Value> = read_collection(&self.accounts_path, ACCOUNTS)?;

        let mut accounts = Vec::with_capacity(raw.len());
        for mut value in raw {
            records::upgrade_account(&mut value);
            if AccountRecord::kind_of(&value).is_none() {
                tracing::warn!(
                    path = %self.accounts_path.display(),
                    record = %value,
                    "skipping account record with unrecognized kind"
                );
                continue;
            }
            let record: AccountRecord =
                serde_json::from_value(value).map_err(|source| StoreError::Serialization {
                    collection: ACCOUNTS,
                    source,
                })?;
            accounts.push(Account::from(record));
        }
        Ok(accounts)
    }

    fn load_activity(&self) -> Result<Vec<ActivityRecord>, StoreError> {
        let raw: Vec<serde_json::Value> = read_collection(&self.activity_path, ACTIVITY)?;

        raw.into_iter()
            .map(|mut value| {
                records::upgrade_activity(&mut value);
                serde_json::from_value(value).map_err(|source| StoreError::Serialization {
                    collection: ACTIVITY,
                    source,
                })
            })
            .collect()
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> Result<LedgerSnapshot, StoreError> {
        let customers: Vec<CustomerRecord> = read_collection(&self.customers_path, CUSTOMERS)?;
        let accounts = self.load_accounts()?;
        let activity = self.load_activity()?;

        tracing::debug!(
            customers = customers.len(),
            accounts = accounts.len(),
            activity = activity.len(),
            "loaded ledger snapshot from disk"
        );

        Ok(LedgerSnapshot {
            customers: customers.into_iter().map(Customer::from).collect(),
            accounts,
            activity,
        })
    }

    fn commit(&self, snapshot: &LedgerSnapshot) -> Result<(), StoreError> {
        let customers: Vec<CustomerRecord> =
            snapshot.customers.iter().map(CustomerRecord::from).collect();
        let accounts: Vec<AccountRecord> =
            snapshot.accounts.iter().map(AccountRecord::from).collect();

        let staged = [
            (&self.customers_path, to_json(&customers, CUSTOMERS)?),
            (&self.accounts_path, to_json(&accounts, ACCOUNTS)?),
            (&self.activity_path, to_json(&snapshot.activity, ACTIVITY)?),
        ];

        let mut written: Vec<PathBuf> = Vec::with_capacity(staged.len());
        for (path, bytes) in &staged {
            let tmp = tmp_path(path);
            if let Err(e) = write_synced(&tmp, bytes) {
                discard(&written);
                let _ = fs::remove_file(&tmp);
                return Err(e);
            }
            written.push(tmp);
        }

        let live: Vec<&Path> = staged.iter().map(|(path, _)| path.as_path()).collect();
        let backups = match back_up(&live) {
            Ok(backups) => backups,
            Err(e) => {
                discard(&written);
                return Err(e);
            }
        };

        for (done, (path, tmp)) in live.iter().zip(&written).enumerate() {
            if let Err(e) = fs::rename(tmp, path) {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "rename failed; rolling back commit"
                );
                restore(&live[..done], &backups[..done]);
                discard(&written[done..]);
                discard(backups.iter().flatten());
                return Err(StoreError::io(*path, e));
            }
        }

        discard(backups.iter().flatten());
        Ok(())
    }
}

fn read_collection<T: DeserializeOwned>(
    path: &Path,
    collection: &'static str,
) -> Result<Vec<T>, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::io(path, e)),
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(StoreError::Corrupt {
            collection,
            message: format!("{} is empty", path.display()),
        });
    }

    serde_json::from_slice(&bytes).map_err(|source| StoreError::Serialization { collection, source })
}

fn to_json<T: Serialize + ?Sized>(value: &T, collection: &'static str) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec_pretty(value).map_err(|source| StoreError::Serialization { collection, source })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut file = File::create(path).map_err(|e| StoreError::io(path, e))?;
    file.write_all(bytes).map_err(|e| StoreError::io(path, e))?;
    file.sync_all().map_err(|e| StoreError::io(path, e))
}

fn bak_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

/// Hard-link (or, failing that, copy) every existing live file to its `.bak`
/// sibling. `None` marks a file that did not exist yet.
fn back_up(live: &[&Path]) -> Result<Vec<Option<PathBuf>>, StoreError> {
    let mut backups = Vec::with_capacity(live.len());
    for path in live {
        if !path.is_file() {
            backups.push(None);
            continue;
        }

        let bak = bak_path(path);
        let _ = fs::remove_file(&bak);
        let linked = fs::hard_link(path, &bak).or_else(|_| fs::copy(path, &bak).map(|_| ()));
        if let Err(e) = linked {
            discard(backups.iter().flatten());
            return Err(StoreError::io(&bak, e));
        }
        backups.push(Some(bak));
    }
    Ok(backups)
}

/// Put the backed-up files back over `live`; files that had no backup did not
/// exist before the commit and are removed.
fn restore(live: &[&Path], backups: &[Option<PathBuf>]) {
    for (path, backup) in live.iter().zip(backups) {
        let result = match backup {
            Some(bak) => fs::rename(bak, path),
            None => fs::remove_file(path),
        };
        if let Err(e) = result {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "could not roll back ledger file"
            );
        }
    }
}

fn discard<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) {
    for path in paths {
        let _ = fs::remove_file(path);
    }
}
