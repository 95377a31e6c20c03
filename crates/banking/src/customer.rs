use bankledger_core::{AccountId, CustomerId, Entity};

/// A bank customer and the ordered set of accounts they own.
///
/// Account ids are kept in creation order and never duplicated. Whether they
/// refer to live accounts is the ledger's concern, not this type's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    id: CustomerId,
    name: String,
    address: String,
    account_ids: Vec<AccountId>,
}

impl Customer {
    pub fn new(id: CustomerId, name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            address: address.into(),
            account_ids: Vec::new(),
        }
    }

    /// Rebuild a customer from persisted state, dropping repeated account ids.
    pub fn restore(
        id: CustomerId,
        name: impl Into<String>,
        address: impl Into<String>,
        account_ids: impl IntoIterator<Item = AccountId>,
    ) -> Self {
        let mut customer = Self::new(id, name, address);
        for account_id in account_ids {
            customer.add_account_id(account_id);
        }
        customer
    }

    pub fn id_typed(&self) -> &CustomerId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn set_address(&mut self, address: impl Into<String>) {
        self.address = address.into();
    }

    pub fn account_ids(&self) -> &[AccountId] {
        &self.account_ids
    }

    pub fn owns(&self, account_id: &AccountId) -> bool {
        self.account_ids.contains(account_id)
    }

    pub fn has_accounts(&self) -> bool {
        !self.account_ids.is_empty()
    }

    /// No-op when the id is already present.
    pub fn add_account_id(&mut self, account_id: AccountId) {
        if !self.owns(&account_id) {
            self.account_ids.push(account_id);
        }
    }

    /// No-op when the id is absent.
    pub fn remove_account_id(&mut self, account_id: &AccountId) {
        self.account_ids.retain(|id| id != account_id);
    }

    /// Keep only the account ids matching `keep`; returns the ones dropped.
    pub fn retain_account_ids(
        &mut self,
        mut keep: impl FnMut(&AccountId) -> bool,
    ) -> Vec<AccountId> {
        let (kept, dropped): (Vec<_>, Vec<_>) =
            self.account_ids.drain(..).partition(|id| keep(id));
        self.account_ids = kept;
        dropped
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl core::fmt::Display for Customer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Address: {}", self.address)?;
        write!(f, "Accounts: {}", self.account_ids.len())
    }
}
