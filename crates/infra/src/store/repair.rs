//! Referential repair of loaded state.
//!
//! A customer may only list accounts that exist and that it owns. Anything
//! else found on load is dropped and logged; it is never reported as an error.

use std::collections::HashMap;

use bankledger_core::{AccountId, CustomerId};

use super::r#trait::LedgerSnapshot;

/// One dropped customer → account reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repair {
    pub customer_id: CustomerId,
    pub account_id: AccountId,
    pub reason: RepairReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairReason {
    /// The account no longer exists.
    MissingAccount,
    /// The account exists but belongs to another customer.
    ForeignOwner,
}

/// Prune dangling account references in place and report what was dropped.
pub fn prune_dangling_references(snapshot: &mut LedgerSnapshot) -> Vec<Repair> {
    let owners: HashMap<&AccountId, &CustomerId> = snapshot
        .accounts
        .iter()
        .map(|a| (a.id_typed(), a.owner_id()))
        .collect();

    let mut repairs = Vec::new();
    for customer in &mut snapshot.customers {
        let customer_id = customer.id_typed().clone();
        let mut reasons = Vec::new();
        let dropped = customer.retain_account_ids(|account_id| match owners.get(account_id) {
            Some(owner) if **owner == customer_id => true,
            Some(_) => {
                reasons.push(RepairReason::ForeignOwner);
                false
            }
            None => {
                reasons.push(RepairReason::MissingAccount);
                false
            }
        });

        for (account_id, reason) in dropped.into_iter().zip(reasons) {
            tracing::warn!(
                customer_id = %customer_id,
                account_id = %account_id,
                ?reason,
                "repaired dangling account reference"
            );
            repairs.push(Repair {
                customer_id: customer_id.clone(),
                account_id,
                reason,
            });
        }
    }

    repairs
}
