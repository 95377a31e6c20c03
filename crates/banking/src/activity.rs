//! Append-only activity history.
//!
//! Records are facts: once appended they are never changed or removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bankledger_core::{AccountId, Money};

/// What a committed balance-affecting operation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Activity {
    Deposit {
        account: AccountId,
        amount: Money,
    },
    Withdraw {
        account: AccountId,
        amount: Money,
    },
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: Money,
    },
    InterestApplied,
}

impl Activity {
    /// Stable name of the activity kind (matches the persisted `kind` tag).
    pub fn kind(&self) -> &'static str {
        match self {
            Activity::Deposit { .. } => "deposit",
            Activity::Withdraw { .. } => "withdraw",
            Activity::Transfer { .. } => "transfer",
            Activity::InterestApplied => "interest_applied",
        }
    }

    /// Whether the activity moved money in or out of `account`.
    pub fn touches(&self, account: &AccountId) -> bool {
        match self {
            Activity::Deposit { account: a, .. } | Activity::Withdraw { account: a, .. } => {
                a == account
            }
            Activity::Transfer { from, to, .. } => from == account || to == account,
            Activity::InterestApplied => false,
        }
    }
}

/// One entry of the activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    #[serde(flatten)]
    pub activity: Activity,
    /// Assigned when the operation is committed.
    pub timestamp: DateTime<Utc>,
}

impl ActivityRecord {
    pub fn new(activity: Activity, timestamp: DateTime<Utc>) -> Self {
        Self {
            activity,
            timestamp,
        }
    }
}

/// The ledger's activity history, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityLog {
    records: Vec<ActivityRecord>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<ActivityRecord>) -> Self {
        Self { records }
    }

    pub fn append(&mut self, record: ActivityRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[ActivityRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActivityRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records that moved money in or out of `account`, oldest first.
    pub fn for_account<'a>(
        &'a self,
        account: &'a AccountId,
    ) -> impl Iterator<Item = &'a ActivityRecord> + 'a {
        self.records.iter().filter(move |r| r.activity.touches(account))
    }
}
