//! Ledger coordinator (application-level orchestration).
//!
//! The `Ledger` owns every customer, account and activity record, and is the
//! only way to change them. Each public mutation follows the same pipeline:
//!
//! ```text
//! call
//!   ↓
//! 1. Take the state write lock (one coarse lock; operations are serialized)
//!   ↓
//! 2. Stage a copy of the current state
//!   ↓
//! 3. Validate + mutate the staged copy (domain rules live in bankledger-banking)
//!   ↓
//! 4. Append the activity record, if the operation moves money
//!   ↓
//! 5. Commit the staged snapshot through the LedgerStore
//!   ↓
//! 6. Install the staged copy as the live state, return
//! ```
//!
//! A rejection at step 3 or a failure at step 5 discards the staged copy, so the
//! live state is never partially updated and never ahead of durable storage.
//! Queries take the read lock and hand out clones, never references into the
//! live maps.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;

use bankledger_banking::{
    Account, AccountTerms, Activity, ActivityLog, ActivityRecord, Customer,
};
use bankledger_core::{AccountId, CustomerId, DomainError, DomainResult, Entity, Money};

use crate::config::LedgerConfig;
use crate::store::{
    JsonFileStore, LedgerSnapshot, LedgerStore, StoreError, prune_dangling_references,
};

/// Attempts at drawing an unused account id before giving up.
const MAX_ID_ATTEMPTS: usize = 16;

/// Failure of a ledger operation.
///
/// - `Rejected`: the request broke a business rule. Nothing changed.
/// - `Persistence`: the store could not record the change. Nothing changed in
///   memory either, but the caller must treat this as a fatal I/O condition.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("operation rejected: {0}")]
    Rejected(#[from] DomainError),

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl LedgerError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, LedgerError::Rejected(_))
    }

    pub fn is_durability(&self) -> bool {
        matches!(self, LedgerError::Persistence(_))
    }

    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            LedgerError::Rejected(e) => Some(e),
            LedgerError::Persistence(_) => None,
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Clone, Default)]
struct LedgerState {
    customers: BTreeMap<CustomerId, Customer>,
    accounts: BTreeMap<AccountId, Account>,
    activity: ActivityLog,
}

fn index_by_id<E: Entity>(items: Vec<E>) -> BTreeMap<E::Id, E> {
    items.into_iter().map(|item| (item.id().clone(), item)).collect()
}

impl LedgerState {
    fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            customers: index_by_id(snapshot.customers),
            accounts: index_by_id(snapshot.accounts),
            activity: ActivityLog::from_records(snapshot.activity),
        }
    }

    fn to_snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            customers: self.customers.values().cloned().collect(),
            accounts: self.accounts.values().cloned().collect(),
            activity: self.activity.records().to_vec(),
        }
    }

    fn customer_mut(&mut self, id: &CustomerId) -> DomainResult<&mut Customer> {
        self.customers
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found(format!("customer {id}")))
    }

    fn account_mut(&mut self, id: &AccountId) -> DomainResult<&mut Account> {
        self.accounts
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found(format!("account {id}")))
    }

    fn ensure_account(&self, id: &AccountId) -> DomainResult<()> {
        if self.accounts.contains_key(id) {
            Ok(())
        } else {
            Err(DomainError::not_found(format!("account {id}")))
        }
    }

    fn fresh_account_id(&self) -> DomainResult<AccountId> {
        (0..MAX_ID_ATTEMPTS)
            .map(|_| AccountId::generate())
            .find(|id| !self.accounts.contains_key(id))
            .ok_or_else(|| DomainError::conflict("could not allocate a unique account id"))
    }

    fn record(&mut self, activity: Activity) {
        self.activity.append(ActivityRecord::new(activity, Utc::now()));
    }
}

/// The ledger engine: customers, accounts and their activity, kept durable
/// through a [`LedgerStore`].
///
/// `Ledger` is `Send + Sync` whenever its store is; share it behind an `Arc`.
///
/// The backing store is not reachable from outside the crate, so durable state
/// can only change through ledger operations:
///
/// ```compile_fail
/// use bankledger_infra::{InMemoryLedgerStore, Ledger, LedgerSnapshot, LedgerStore};
///
/// let ledger = Ledger::open(InMemoryLedgerStore::new()).unwrap();
/// ledger.store().commit(&LedgerSnapshot::default()).unwrap();
/// ```
#[derive(Debug)]
pub struct Ledger<S> {
    store: S,
    state: RwLock<LedgerState>,
}

impl Ledger<JsonFileStore> {
    /// Open a file-backed ledger as described by `config`.
    pub fn open_json(config: &LedgerConfig) -> Result<Self, StoreError> {
        Ledger::open(JsonFileStore::from_config(config)?)
    }
}

impl<S: LedgerStore> Ledger<S> {
    /// Load state from `store`, repair dangling customer → account references,
    /// and start serving operations.
    ///
    /// Repairs are applied in memory only; they reach storage with the next
    /// successful commit.
    pub fn open(store: S) -> Result<Self, StoreError> {
        let mut snapshot = store.load()?;
        let repairs = prune_dangling_references(&mut snapshot);

        tracing::info!(
            customers = snapshot.customers.len(),
            accounts = snapshot.accounts.len(),
            activity = snapshot.activity.len(),
            repairs = repairs.len(),
            "ledger opened"
        );

        Ok(Self {
            store,
            state: RwLock::new(LedgerState::from_snapshot(snapshot)),
        })
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LedgerState>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Poisoned("ledger state".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LedgerState>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Poisoned("ledger state".to_string()))
    }

    /// Run one all-or-nothing mutation: stage, apply `f`, commit, install.
    fn mutate<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut LedgerState) -> DomainResult<T>,
    ) -> LedgerResult<T> {
        let mut live = self.write()?;
        let mut staged = LedgerState::clone(&live);

        let out = match f(&mut staged) {
            Ok(out) => out,
            Err(err) => {
                tracing::debug!(operation, error = %err, "operation rejected");
                return Err(err.into());
            }
        };

        if let Err(err) = self.store.commit(&staged.to_snapshot()) {
            tracing::error!(operation, error = %err, "commit failed; in-memory state unchanged");
            return Err(err.into());
        }

        *live = staged;
        Ok(out)
    }

    // ---------------------------------------------------------------------
    // Customers
    // ---------------------------------------------------------------------

    /// Register a customer. `id` must be exactly nine digits and unused.
    pub fn add_customer(
        &self,
        id: &str,
        name: impl Into<String>,
        address: impl Into<String>,
    ) -> LedgerResult<Customer> {
        let (name, address) = (name.into(), address.into());
        self.mutate("add_customer", |state| {
            let id = CustomerId::parse(id)?;
            if state.customers.contains_key(&id) {
                return Err(DomainError::conflict(format!("customer {id} already exists")));
            }

            let customer = Customer::new(id.clone(), name, address);
            state.customers.insert(id.clone(), customer.clone());
            tracing::info!(customer_id = %id, "customer added");
            Ok(customer)
        })
    }

    /// Remove a customer that owns no accounts.
    pub fn remove_customer(&self, id: &CustomerId) -> LedgerResult<()> {
        self.mutate("remove_customer", |state| {
            let customer = state.customer_mut(id)?;
            if customer.has_accounts() {
                return Err(DomainError::invariant(format!(
                    "customer {id} still owns {} account(s)",
                    customer.account_ids().len()
                )));
            }

            state.customers.remove(id);
            tracing::info!(customer_id = %id, "customer removed");
            Ok(())
        })
    }

    pub fn update_customer_address(
        &self,
        id: &CustomerId,
        address: impl Into<String>,
    ) -> LedgerResult<Customer> {
        let address = address.into();
        self.mutate("update_customer_address", |state| {
            let customer = state.customer_mut(id)?;
            customer.set_address(address);
            tracing::info!(customer_id = %id, "customer address updated");
            Ok(customer.clone())
        })
    }

    // ---------------------------------------------------------------------
    // Accounts
    // ---------------------------------------------------------------------

    /// Open an account for an existing customer under a freshly generated id.
    pub fn create_account(
        &self,
        customer_id: &CustomerId,
        terms: AccountTerms,
        initial_balance: Money,
    ) -> LedgerResult<Account> {
        self.mutate("create_account", |state| {
            state.customer_mut(customer_id)?;
            let account_id = state.fresh_account_id()?;

            let account = Account::open(
                account_id.clone(),
                customer_id.clone(),
                initial_balance,
                terms,
            );
            state.accounts.insert(account_id.clone(), account.clone());
            state.customer_mut(customer_id)?.add_account_id(account_id.clone());

            tracing::info!(
                customer_id = %customer_id,
                account_id = %account_id,
                kind = %account.kind(),
                balance = %initial_balance,
                "account created"
            );
            Ok(account)
        })
    }

    /// Delete an account and unlink it from its owner.
    ///
    /// The balance is not checked; settling it is the caller's business.
    pub fn delete_account(&self, id: &AccountId) -> LedgerResult<Account> {
        self.mutate("delete_account", |state| {
            let account = state
                .accounts
                .remove(id)
                .ok_or_else(|| DomainError::not_found(format!("account {id}")))?;

            if let Some(owner) = state.customers.get_mut(account.owner_id()) {
                owner.remove_account_id(id);
            }

            tracing::info!(
                account_id = %id,
                customer_id = %account.owner_id(),
                balance = %account.balance(),
                "account deleted"
            );
            Ok(account)
        })
    }

    pub fn set_interest_rate(&self, id: &AccountId, rate: Decimal) -> LedgerResult<Account> {
        self.mutate("set_interest_rate", |state| {
            let account = state.account_mut(id)?;
            if !account.set_interest_rate(rate)? {
                tracing::debug!(account_id = %id, %rate, "interest rate unchanged");
            }
            Ok(account.clone())
        })
    }

    pub fn set_overdraft_limit(&self, id: &AccountId, limit: Money) -> LedgerResult<Account> {
        self.mutate("set_overdraft_limit", |state| {
            let account = state.account_mut(id)?;
            if !account.set_overdraft_limit(limit)? {
                tracing::debug!(account_id = %id, %limit, "overdraft limit unchanged");
            }
            Ok(account.clone())
        })
    }

    // ---------------------------------------------------------------------
    // Money movement
    // ---------------------------------------------------------------------

    pub fn deposit(&self, id: &AccountId, amount: Money) -> LedgerResult<Account> {
        self.mutate("deposit", |state| {
            let account = state.account_mut(id)?;
            account.deposit(amount)?;
            let updated = account.clone();

            state.record(Activity::Deposit {
                account: id.clone(),
                amount,
            });
            tracing::info!(account_id = %id, %amount, balance = %updated.balance(), "deposit");
            Ok(updated)
        })
    }

    pub fn withdraw(&self, id: &AccountId, amount: Money) -> LedgerResult<Account> {
        self.mutate("withdraw", |state| {
            let account = state.account_mut(id)?;
            account.withdraw(amount)?;
            let updated = account.clone();

            state.record(Activity::Withdraw {
                account: id.clone(),
                amount,
            });
            tracing::info!(account_id = %id, %amount, balance = %updated.balance(), "withdraw");
            Ok(updated)
        })
    }

    /// Move `amount` from one account to another as a single logged operation.
    ///
    /// If the destination refuses the credit after the source was debited, the
    /// source is re-credited (compensating deposit) and the transfer fails.
    pub fn transfer(&self, from: &AccountId, to: &AccountId, amount: Money) -> LedgerResult<()> {
        self.mutate("transfer", |state| {
            state.ensure_account(from)?;
            state.ensure_account(to)?;
            if !amount.is_positive() {
                return Err(DomainError::validation("amount must be positive"));
            }

            state.account_mut(from)?.withdraw(amount)?;

            if let Err(err) = state.account_mut(to)?.deposit(amount) {
                tracing::warn!(
                    from = %from,
                    to = %to,
                    %amount,
                    error = %err,
                    "transfer credit refused; compensating deposit into source"
                );
                state.account_mut(from)?.deposit(amount)?;
                return Err(err);
            }

            state.record(Activity::Transfer {
                from: from.clone(),
                to: to.clone(),
                amount,
            });
            tracing::info!(from = %from, to = %to, %amount, "transfer");
            Ok(())
        })
    }

    /// Credit one period of interest to every savings account.
    ///
    /// Always logs exactly one `interest_applied` record and commits, even when
    /// no savings account exists. Returns the number of accounts credited.
    ///
    /// If any account's balance would overflow, the whole run is rejected and
    /// no account is credited.
    pub fn apply_interest_to_all(&self) -> LedgerResult<usize> {
        self.mutate("apply_interest_to_all", |state| {
            let mut credited = 0;
            for (id, account) in state.accounts.iter_mut() {
                let applied = account.apply_interest().inspect_err(|err| {
                    tracing::warn!(account_id = %id, error = %err, "interest run rejected");
                })?;
                if applied {
                    credited += 1;
                }
            }

            state.record(Activity::InterestApplied);
            tracing::info!(credited, "interest applied");
            Ok(credited)
        })
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn customer(&self, id: &CustomerId) -> LedgerResult<Option<Customer>> {
        Ok(self.read()?.customers.get(id).cloned())
    }

    pub fn account(&self, id: &AccountId) -> LedgerResult<Option<Account>> {
        Ok(self.read()?.accounts.get(id).cloned())
    }

    /// All customers, ordered by id.
    pub fn customers(&self) -> LedgerResult<Vec<Customer>> {
        Ok(self.read()?.customers.values().cloned().collect())
    }

    /// All accounts, ordered by id.
    pub fn accounts(&self) -> LedgerResult<Vec<Account>> {
        Ok(self.read()?.accounts.values().cloned().collect())
    }

    /// Accounts of a customer in the order they were opened.
    ///
    /// Ids that no longer resolve are skipped; an unknown customer yields an
    /// empty list.
    pub fn accounts_for(&self, customer_id: &CustomerId) -> LedgerResult<Vec<Account>> {
        let state = self.read()?;
        let Some(customer) = state.customers.get(customer_id) else {
            return Ok(Vec::new());
        };

        Ok(customer
            .account_ids()
            .iter()
            .filter_map(|id| state.accounts.get(id).cloned())
            .collect())
    }

    /// Full activity history, oldest first.
    pub fn activity(&self) -> LedgerResult<Vec<ActivityRecord>> {
        Ok(self.read()?.activity.records().to_vec())
    }

    /// Activity that moved money in or out of one account, oldest first.
    pub fn activity_for(&self, id: &AccountId) -> LedgerResult<Vec<ActivityRecord>> {
        Ok(self.read()?.activity.for_account(id).cloned().collect())
    }
}
