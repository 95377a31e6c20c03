//! On-disk record shapes.
//!
//! Domain types stay free of serde; these records are the persisted schema and
//! convert to and from the domain through its constructors, so clamping rules
//! apply to loaded data exactly as they do to new data.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use bankledger_banking::{
    Account, AccountKind, AccountPolicy, Customer, DEFAULT_INTEREST_RATE,
};
use bankledger_core::{AccountId, CustomerId, Money};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CustomerRecord {
    #[serde(alias = "customer_id")]
    pub id: CustomerId,
    pub name: String,
    pub address: String,
    #[serde(default, alias = "account_numbers")]
    pub account_ids: Vec<AccountId>,
}

impl From<&Customer> for CustomerRecord {
    fn from(c: &Customer) -> Self {
        Self {
            id: c.id_typed().clone(),
            name: c.name().to_string(),
            address: c.address().to_string(),
            account_ids: c.account_ids().to_vec(),
        }
    }
}

impl From<CustomerRecord> for Customer {
    fn from(r: CustomerRecord) -> Self {
        Customer::restore(r.id, r.name, r.address, r.account_ids)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub(crate) enum PolicyRecord {
    Savings {
        #[serde(default = "default_interest_rate")]
        interest_rate: Decimal,
    },
    Current {
        #[serde(default)]
        overdraft_limit: Money,
    },
}

fn default_interest_rate() -> Decimal {
    DEFAULT_INTEREST_RATE
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct AccountRecord {
    #[serde(alias = "account_number")]
    pub id: AccountId,
    #[serde(alias = "account_holder_id")]
    pub owner_id: CustomerId,
    #[serde(default)]
    pub balance: Money,
    #[serde(flatten)]
    pub policy: PolicyRecord,
}

impl AccountRecord {
    /// Reads the `kind` tag of a raw account record without decoding the rest.
    ///
    /// `None` means the record carries no kind this version understands.
    pub fn kind_of(raw: &Value) -> Option<AccountKind> {
        raw.get("kind")?.as_str()?.parse().ok()
    }
}

/// Rewrite an account record of the older layout, which tagged the variant
/// with `type`, in place. Current records are left untouched.
pub(crate) fn upgrade_account(raw: &mut Value) {
    if let Some(fields) = raw.as_object_mut() {
        rename_field(fields, "type", "kind");
    }
}

/// Rewrite an activity record of the older layout in place: `type` tag,
/// `apply_interest` kind, `from_account`/`to_account`, and timestamps without
/// an offset (read as UTC).
pub(crate) fn upgrade_activity(raw: &mut Value) {
    let Some(fields) = raw.as_object_mut() else {
        return;
    };

    rename_field(fields, "type", "kind");
    rename_field(fields, "from_account", "from");
    rename_field(fields, "to_account", "to");

    if fields.get("kind").and_then(Value::as_str) == Some("apply_interest") {
        fields.insert("kind".to_string(), Value::from("interest_applied"));
    }

    let naive = fields
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(|ts| ts.parse::<NaiveDateTime>().ok());
    if let Some(naive) = naive {
        fields.insert(
            "timestamp".to_string(),
            Value::from(naive.and_utc().to_rfc3339()),
        );
    }
}

fn rename_field(fields: &mut Map<String, Value>, from: &str, to: &str) {
    if fields.contains_key(to) {
        return;
    }
    if let Some(value) = fields.remove(from) {
        fields.insert(to.to_string(), value);
    }
}

impl From<&Account> for AccountRecord {
    fn from(a: &Account) -> Self {
        let policy = match a.policy() {
            AccountPolicy::Savings { interest_rate } => PolicyRecord::Savings { interest_rate },
            AccountPolicy::Current { overdraft_limit } => {
                PolicyRecord::Current { overdraft_limit }
            }
        };
        Self {
            id: a.id_typed().clone(),
            owner_id: a.owner_id().clone(),
            balance: a.balance(),
            policy,
        }
    }
}

impl From<AccountRecord> for Account {
    fn from(r: AccountRecord) -> Self {
        let policy = match r.policy {
            PolicyRecord::Savings { interest_rate } => AccountPolicy::Savings { interest_rate },
            PolicyRecord::Current { overdraft_limit } => {
                AccountPolicy::Current { overdraft_limit }
            }
        };
        Account::restore(r.id, r.owner_id, r.balance, policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankledger_banking::{Activity, ActivityRecord};
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn account_record_layout_is_flat_with_kind_tag() {
        let record = AccountRecord {
            id: AccountId::parse("0a1b2c3d").unwrap(),
            owner_id: CustomerId::parse("123456789").unwrap(),
            balance: Money::new(dec!(100.00)),
            policy: PolicyRecord::Savings {
                interest_rate: dec!(0.05),
            },
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "0a1b2c3d",
                "owner_id": "123456789",
                "balance": "100.00",
                "kind": "savings",
                "interest_rate": "0.05"
            })
        );
    }

    #[test]
    fn missing_fields_take_defaults_and_negatives_are_clamped() {
        let raw = json!({"id": "a", "owner_id": "123456789", "kind": "savings"});
        let account: Account = serde_json::from_value::<AccountRecord>(raw).unwrap().into();
        assert_eq!(account.balance(), Money::ZERO);
        assert_eq!(account.interest_rate(), Some(DEFAULT_INTEREST_RATE));

        let raw = json!({
            "id": "b",
            "owner_id": "123456789",
            "balance": 12.5,
            "kind": "current",
            "overdraft_limit": -3
        });
        let account: Account = serde_json::from_value::<AccountRecord>(raw).unwrap().into();
        assert_eq!(account.balance(), Money::new(dec!(12.5)));
        assert_eq!(account.overdraft_limit(), Some(Money::ZERO));
    }

    #[test]
    fn older_layout_reads_into_current_records() {
        let customer: CustomerRecord = serde_json::from_value(json!({
            "customer_id": "123456789",
            "name": "A",
            "address": "X",
            "account_numbers": ["0a1b2c3d"]
        }))
        .unwrap();
        assert_eq!(customer.id.as_str(), "123456789");
        assert_eq!(customer.account_ids, vec![AccountId::parse("0a1b2c3d").unwrap()]);

        let mut raw = json!({
            "account_number": "0a1b2c3d",
            "balance": 105.0,
            "account_holder_id": "123456789",
            "type": "savings",
            "interest_rate": 0.05
        });
        upgrade_account(&mut raw);
        let account: Account = serde_json::from_value::<AccountRecord>(raw).unwrap().into();
        assert_eq!(account.id_typed().as_str(), "0a1b2c3d");
        assert_eq!(account.balance(), Money::new(dec!(105)));
        assert_eq!(account.interest_rate(), Some(dec!(0.05)));
    }

    #[test]
    fn older_activity_records_are_upgraded() {
        let mut interest = json!({"type": "apply_interest", "timestamp": "2024-03-01T09:30:00.250000"});
        upgrade_activity(&mut interest);
        assert_eq!(interest["kind"], "interest_applied");
        assert_eq!(interest["timestamp"], "2024-03-01T09:30:00.250+00:00");

        let mut transfer = json!({
            "type": "transfer",
            "from_account": "aaaa0001",
            "to_account": "bbbb0001",
            "amount": 10.0,
            "timestamp": "2024-03-01T09:30:00"
        });
        upgrade_activity(&mut transfer);
        let record: ActivityRecord = serde_json::from_value(transfer).unwrap();
        assert_eq!(
            record.activity,
            Activity::Transfer {
                from: AccountId::parse("aaaa0001").unwrap(),
                to: AccountId::parse("bbbb0001").unwrap(),
                amount: Money::from(10),
            }
        );

        // current records pass through unchanged
        let current = json!({"kind": "deposit", "account": "a", "amount": "1", "timestamp": "2024-03-01T09:30:00Z"});
        let mut upgraded = current.clone();
        upgrade_activity(&mut upgraded);
        assert_eq!(upgraded, current);
    }

    #[test]
    fn kind_of_reports_unknown_kinds() {
        assert_eq!(
            AccountRecord::kind_of(&json!({"kind": "current"})),
            Some(AccountKind::Current)
        );
        assert_eq!(AccountRecord::kind_of(&json!({"kind": "brokerage"})), None);
        assert_eq!(AccountRecord::kind_of(&json!({"id": "x"})), None);
    }
}
