use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use bankledger_core::{AccountId, CustomerId, DomainError, DomainResult, Entity, Money};

/// Interest rate given to savings accounts opened without one (1%).
pub const DEFAULT_INTEREST_RATE: Decimal = dec!(0.01);

/// Overdraft limit given to current accounts opened without one.
pub const DEFAULT_OVERDRAFT_LIMIT: Money = Money::ZERO;

/// The fixed set of account variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Savings,
    Current,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Savings => "savings",
            AccountKind::Current => "current",
        }
    }
}

impl core::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "savings" => Ok(AccountKind::Savings),
            "current" => Ok(AccountKind::Current),
            other => Err(DomainError::validation(format!(
                "unrecognized account kind: {other:?}"
            ))),
        }
    }
}

/// Variant-specific balance policy of an account.
///
/// Values held here are always non-negative; constructors clamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountPolicy {
    Savings { interest_rate: Decimal },
    Current { overdraft_limit: Money },
}

impl AccountPolicy {
    pub fn savings(interest_rate: Decimal) -> Self {
        AccountPolicy::Savings {
            interest_rate: clamp_rate(interest_rate),
        }
    }

    pub fn current(overdraft_limit: Money) -> Self {
        AccountPolicy::Current {
            overdraft_limit: clamp_limit(overdraft_limit),
        }
    }

    pub fn kind(&self) -> AccountKind {
        match self {
            AccountPolicy::Savings { .. } => AccountKind::Savings,
            AccountPolicy::Current { .. } => AccountKind::Current,
        }
    }

    /// Lowest balance a withdrawal may leave behind.
    pub fn balance_floor(&self) -> Money {
        match self {
            AccountPolicy::Savings { .. } => Money::ZERO,
            AccountPolicy::Current { overdraft_limit } => -*overdraft_limit,
        }
    }

    fn normalized(self) -> Self {
        match self {
            AccountPolicy::Savings { interest_rate } => Self::savings(interest_rate),
            AccountPolicy::Current { overdraft_limit } => Self::current(overdraft_limit),
        }
    }
}

/// Terms requested when opening an account. Missing parameters take the
/// variant default; negative ones are replaced by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountTerms {
    Savings { interest_rate: Option<Decimal> },
    Current { overdraft_limit: Option<Money> },
}

impl AccountTerms {
    /// Default terms for a kind, e.g. after parsing a kind name.
    pub fn defaults_for(kind: AccountKind) -> Self {
        match kind {
            AccountKind::Savings => AccountTerms::Savings { interest_rate: None },
            AccountKind::Current => AccountTerms::Current {
                overdraft_limit: None,
            },
        }
    }

    pub fn kind(&self) -> AccountKind {
        match self {
            AccountTerms::Savings { .. } => AccountKind::Savings,
            AccountTerms::Current { .. } => AccountKind::Current,
        }
    }

    pub fn into_policy(self) -> AccountPolicy {
        match self {
            AccountTerms::Savings { interest_rate } => {
                AccountPolicy::savings(interest_rate.unwrap_or(DEFAULT_INTEREST_RATE))
            }
            AccountTerms::Current { overdraft_limit } => {
                AccountPolicy::current(overdraft_limit.unwrap_or(DEFAULT_OVERDRAFT_LIMIT))
            }
        }
    }
}

fn clamp_rate(rate: Decimal) -> Decimal {
    if rate < Decimal::ZERO {
        DEFAULT_INTEREST_RATE
    } else {
        rate
    }
}

fn clamp_limit(limit: Money) -> Money {
    if limit.is_negative() {
        DEFAULT_OVERDRAFT_LIMIT
    } else {
        limit
    }
}

/// A customer-owned account: savings or current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    owner_id: CustomerId,
    balance: Money,
    policy: AccountPolicy,
}

impl Account {
    /// Open a new account with the requested terms.
    ///
    /// The initial balance is taken as given; only later withdrawals are
    /// checked against the balance floor.
    pub fn open(
        id: AccountId,
        owner_id: CustomerId,
        initial_balance: Money,
        terms: AccountTerms,
    ) -> Self {
        Self {
            id,
            owner_id,
            balance: initial_balance,
            policy: terms.into_policy(),
        }
    }

    /// Rebuild an account from persisted state. Negative policy parameters are
    /// clamped the same way [`Account::open`] clamps them.
    pub fn restore(
        id: AccountId,
        owner_id: CustomerId,
        balance: Money,
        policy: AccountPolicy,
    ) -> Self {
        Self {
            id,
            owner_id,
            balance,
            policy: policy.normalized(),
        }
    }

    pub fn id_typed(&self) -> &AccountId {
        &self.id
    }

    pub fn owner_id(&self) -> &CustomerId {
        &self.owner_id
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn policy(&self) -> AccountPolicy {
        self.policy
    }

    pub fn kind(&self) -> AccountKind {
        self.policy.kind()
    }

    pub fn interest_rate(&self) -> Option<Decimal> {
        match self.policy {
            AccountPolicy::Savings { interest_rate } => Some(interest_rate),
            AccountPolicy::Current { .. } => None,
        }
    }

    pub fn overdraft_limit(&self) -> Option<Money> {
        match self.policy {
            AccountPolicy::Savings { .. } => None,
            AccountPolicy::Current { overdraft_limit } => Some(overdraft_limit),
        }
    }

    pub fn deposit(&mut self, amount: Money) -> DomainResult<()> {
        ensure_positive(amount)?;
        self.balance = self.balance.checked_add(amount).ok_or_else(overflow)?;
        Ok(())
    }

    pub fn withdraw(&mut self, amount: Money) -> DomainResult<()> {
        ensure_positive(amount)?;

        let remaining = self.balance.checked_sub(amount).ok_or_else(overflow)?;
        if remaining < self.policy.balance_floor() {
            return Err(match self.policy {
                AccountPolicy::Savings { .. } => DomainError::invariant("insufficient funds"),
                AccountPolicy::Current { .. } => {
                    DomainError::invariant("overdraft limit exceeded")
                }
            });
        }

        self.balance = remaining;
        Ok(())
    }

    /// Credit one period of flat-rate interest. Returns `Ok(false)` (and does
    /// nothing) for current accounts; the balance is untouched on overflow.
    pub fn apply_interest(&mut self) -> DomainResult<bool> {
        match self.policy {
            AccountPolicy::Savings { interest_rate } => {
                let interest = self
                    .balance
                    .checked_scaled_by(interest_rate)
                    .ok_or_else(overflow)?;
                self.balance = self.balance.checked_add(interest).ok_or_else(overflow)?;
                Ok(true)
            }
            AccountPolicy::Current { .. } => Ok(false),
        }
    }

    /// Change the interest rate of a savings account.
    ///
    /// Negative rates are ignored. Returns whether the rate changed.
    pub fn set_interest_rate(&mut self, rate: Decimal) -> DomainResult<bool> {
        match &mut self.policy {
            AccountPolicy::Savings { interest_rate } => {
                if rate < Decimal::ZERO || *interest_rate == rate {
                    return Ok(false);
                }
                *interest_rate = rate;
                Ok(true)
            }
            AccountPolicy::Current { .. } => Err(DomainError::validation(
                "interest rate only applies to savings accounts",
            )),
        }
    }

    /// Change the overdraft limit of a current account.
    ///
    /// Negative limits are ignored. Returns whether the limit changed.
    pub fn set_overdraft_limit(&mut self, limit: Money) -> DomainResult<bool> {
        match &mut self.policy {
            AccountPolicy::Current { overdraft_limit } => {
                if limit.is_negative() || *overdraft_limit == limit {
                    return Ok(false);
                }
                *overdraft_limit = limit;
                Ok(true)
            }
            AccountPolicy::Savings { .. } => Err(DomainError::validation(
                "overdraft limit only applies to current accounts",
            )),
        }
    }
}

fn overflow() -> DomainError {
    DomainError::validation("amount overflow")
}

fn ensure_positive(amount: Money) -> DomainResult<()> {
    if !amount.is_positive() {
        return Err(DomainError::validation("amount must be positive"));
    }
    Ok(())
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl core::fmt::Display for Account {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} [{}] balance {}", self.id, self.kind(), self.balance)?;
        match self.policy {
            AccountPolicy::Savings { interest_rate } => {
                write!(f, ", interest rate {:.2}%", interest_rate * dec!(100))
            }
            AccountPolicy::Current { overdraft_limit } => {
                write!(f, ", overdraft limit {overdraft_limit}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn owner() -> CustomerId {
        CustomerId::parse("123456789").unwrap()
    }

    fn savings(balance: Decimal, rate: Decimal) -> Account {
        Account::open(
            AccountId::parse("sav00001").unwrap(),
            owner(),
            Money::new(balance),
            AccountTerms::Savings {
                interest_rate: Some(rate),
            },
        )
    }

    fn current(balance: Decimal, limit: Decimal) -> Account {
        Account::open(
            AccountId::parse("cur00001").unwrap(),
            owner(),
            Money::new(balance),
            AccountTerms::Current {
                overdraft_limit: Some(Money::new(limit)),
            },
        )
    }

    #[test]
    fn deposit_rejects_non_positive_amounts() {
        let mut acc = savings(dec!(10), dec!(0.01));
        assert!(matches!(
            acc.deposit(Money::ZERO),
            Err(DomainError::Validation(_))
        ));
        assert!(acc.deposit(Money::new(dec!(-5))).is_err());
        assert_eq!(acc.balance(), Money::new(dec!(10)));

        acc.deposit(Money::new(dec!(2.5))).unwrap();
        assert_eq!(acc.balance(), Money::new(dec!(12.5)));
    }

    #[test]
    fn savings_withdrawal_cannot_overdraw() {
        let mut acc = savings(dec!(100), dec!(0.05));
        let err = acc.withdraw(Money::new(dec!(150))).unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) if msg.contains("insufficient funds") => {}
            other => panic!("expected insufficient funds, got {other:?}"),
        }
        assert_eq!(acc.balance(), Money::new(dec!(100)));

        acc.withdraw(Money::new(dec!(100))).unwrap();
        assert_eq!(acc.balance(), Money::ZERO);
    }

    #[test]
    fn current_withdrawal_stops_at_overdraft_limit() {
        let mut acc = current(dec!(0), dec!(50));
        acc.withdraw(Money::new(dec!(50))).unwrap();
        assert_eq!(acc.balance(), Money::new(dec!(-50)));

        let err = acc.withdraw(Money::new(dec!(0.01))).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(acc.balance(), Money::new(dec!(-50)));
    }

    #[test]
    fn interest_only_applies_to_savings() {
        let mut sav = savings(dec!(100), dec!(0.05));
        assert_eq!(sav.apply_interest(), Ok(true));
        assert_eq!(sav.balance(), Money::new(dec!(105)));

        let mut cur = current(dec!(100), dec!(0));
        assert_eq!(cur.apply_interest(), Ok(false));
        assert_eq!(cur.balance(), Money::new(dec!(100)));
    }

    #[test]
    fn overflowing_deposit_is_rejected_and_balance_kept() {
        let mut acc = savings(Decimal::MAX, dec!(0.01));
        let err = acc.deposit(Money::from(1)).unwrap_err();
        assert_eq!(err, DomainError::validation("amount overflow"));
        assert_eq!(acc.balance(), Money::new(Decimal::MAX));
    }

    #[test]
    fn overflowing_interest_is_rejected_and_balance_kept() {
        let mut acc = savings(Decimal::MAX, dec!(1));
        assert!(matches!(acc.apply_interest(), Err(DomainError::Validation(_))));
        assert_eq!(acc.balance(), Money::new(Decimal::MAX));
    }

    #[test]
    fn withdrawal_near_the_minimum_reports_overflow() {
        let mut acc = current(Decimal::MIN, Decimal::MAX);
        let err = acc.withdraw(Money::from(1)).unwrap_err();
        assert_eq!(err, DomainError::validation("amount overflow"));
    }

    #[test]
    fn negative_terms_fall_back_to_defaults() {
        let sav = savings(dec!(0), dec!(-0.2));
        assert_eq!(sav.interest_rate(), Some(DEFAULT_INTEREST_RATE));

        let cur = current(dec!(0), dec!(-10));
        assert_eq!(cur.overdraft_limit(), Some(DEFAULT_OVERDRAFT_LIMIT));

        let restored = Account::restore(
            AccountId::parse("cur00002").unwrap(),
            owner(),
            Money::ZERO,
            AccountPolicy::Current {
                overdraft_limit: Money::new(dec!(-1)),
            },
        );
        assert_eq!(restored.overdraft_limit(), Some(Money::ZERO));
    }

    #[test]
    fn missing_terms_use_defaults() {
        let policy = AccountTerms::defaults_for(AccountKind::Savings).into_policy();
        assert_eq!(
            policy,
            AccountPolicy::Savings {
                interest_rate: dec!(0.01)
            }
        );
        let policy = AccountTerms::defaults_for(AccountKind::Current).into_policy();
        assert_eq!(policy.balance_floor(), Money::ZERO);
    }

    #[test]
    fn policy_setters_ignore_negative_values_and_wrong_variant() {
        let mut sav = savings(dec!(0), dec!(0.01));
        assert_eq!(sav.set_interest_rate(dec!(-1)), Ok(false));
        assert_eq!(sav.set_interest_rate(dec!(0.03)), Ok(true));
        assert_eq!(sav.interest_rate(), Some(dec!(0.03)));
        assert!(sav.set_overdraft_limit(Money::from(10)).is_err());

        let mut cur = current(dec!(0), dec!(0));
        assert_eq!(cur.set_overdraft_limit(Money::from(-5)), Ok(false));
        assert_eq!(cur.set_overdraft_limit(Money::from(25)), Ok(true));
        assert_eq!(cur.overdraft_limit(), Some(Money::from(25)));
        assert!(cur.set_interest_rate(dec!(0.02)).is_err());
    }

    #[test]
    fn kind_parsing_is_case_insensitive_and_rejects_unknown() {
        assert_eq!("Savings".parse::<AccountKind>(), Ok(AccountKind::Savings));
        assert_eq!(" current ".parse::<AccountKind>(), Ok(AccountKind::Current));
        assert!("checking".parse::<AccountKind>().is_err());
    }

    #[test]
    fn display_summarizes_policy() {
        let sav = savings(dec!(105), dec!(0.05));
        assert_eq!(
            sav.to_string(),
            "sav00001 [savings] balance 105.00, interest rate 5.00%"
        );
        let cur = current(dec!(-20), dec!(50));
        assert_eq!(
            cur.to_string(),
            "cur00001 [current] balance -20.00, overdraft limit 50.00"
        );
    }

    #[derive(Debug, Clone)]
    enum Op {
        Deposit(i64),
        Withdraw(i64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (-500i64..5_000).prop_map(Op::Deposit),
            (-500i64..5_000).prop_map(Op::Withdraw),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: the balance equals the opening balance plus the signed
        /// effect of every successful operation, and never drops below the
        /// variant's floor through a withdrawal.
        #[test]
        fn balance_tracks_successful_effects(
            opening in 0i64..1_000,
            limit in 0i64..1_000,
            is_savings in any::<bool>(),
            ops in prop::collection::vec(op_strategy(), 1..40)
        ) {
            // amounts are in cents to exercise fractional balances
            let cents = |v: i64| Money::new(Decimal::new(v, 2));
            let mut acc = if is_savings {
                savings(Decimal::new(opening, 2), dec!(0.01))
            } else {
                current(Decimal::new(opening, 2), Decimal::new(limit, 2))
            };
            let floor = acc.policy().balance_floor();
            let mut expected = cents(opening);

            for op in ops {
                match op {
                    Op::Deposit(v) => {
                        if acc.deposit(cents(v)).is_ok() {
                            expected = expected.checked_add(cents(v)).unwrap();
                        } else {
                            prop_assert!(v <= 0);
                        }
                    }
                    Op::Withdraw(v) => {
                        if acc.withdraw(cents(v)).is_ok() {
                            expected = expected.checked_sub(cents(v)).unwrap();
                        }
                        prop_assert!(acc.balance() >= floor);
                    }
                }
                prop_assert_eq!(acc.balance(), expected);
            }
        }
    }
}
