//! Net balance computation.
//!
//! [`BalanceEngine`] folds a ledger snapshot into one signed balance per
//! member: positive means the member is owed money, negative means the
//! member owes money.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;

use crate::{Expense, Member, MemberSet, MoneyCents, Settlement};

/// Ordered mapping from member to signed balance.
///
/// Every group member has an entry, in group order, even with no activity.
/// There is no implicit "missing key means zero": [`BalanceVector::get`]
/// returns `None` for unknown members.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BalanceVector {
    entries: Vec<(Member, MoneyCents)>,
}

impl BalanceVector {
    /// A vector with every member of `members` at zero.
    pub fn zeroed(members: &MemberSet) -> Self {
        Self {
            entries: members.iter().map(|m| (m.clone(), MoneyCents::ZERO)).collect(),
        }
    }

    pub fn get(&self, member: &Member) -> Option<MoneyCents> {
        self.entries
            .iter()
            .find_map(|(m, balance)| (m == member).then_some(*balance))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Member, MoneyCents)> + '_ {
        self.entries.iter().map(|(m, balance)| (m, *balance))
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> + '_ {
        self.entries.iter().map(|(m, _)| m)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all entries. Zero up to one cent per member of rounding.
    pub fn sum(&self) -> MoneyCents {
        self.entries.iter().map(|(_, balance)| *balance).sum()
    }

    /// `true` when every balance is exactly zero.
    pub fn is_settled(&self) -> bool {
        self.entries.iter().all(|(_, balance)| balance.is_zero())
    }

    /// Sets the balance of `member`, appending an entry if it is unknown.
    pub fn set(&mut self, member: &Member, balance: MoneyCents) {
        match self.entries.iter_mut().find(|(m, _)| m == member) {
            Some((_, current)) => *current = balance,
            None => self.entries.push((member.clone(), balance)),
        }
    }

    /// Applies a payment: the debtor's balance rises and the creditor's
    /// balance falls by the settled amount.
    pub fn apply(&mut self, settlement: &Settlement) {
        let from = self.get(&settlement.from).unwrap_or_default();
        self.set(&settlement.from, from + settlement.amount);
        let to = self.get(&settlement.to).unwrap_or_default();
        self.set(&settlement.to, to - settlement.amount);
    }
}

impl FromIterator<(Member, MoneyCents)> for BalanceVector {
    /// Later entries for the same member overwrite earlier ones and keep the
    /// first position.
    fn from_iter<T: IntoIterator<Item = (Member, MoneyCents)>>(iter: T) -> Self {
        let mut vector = Self::default();
        for (member, balance) in iter {
            vector.set(&member, balance);
        }
        vector
    }
}

/// Result of a balance recompute.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BalanceReport {
    pub balances: BalanceVector,
    /// Sum of every expense amount in the ledger.
    pub total: MoneyCents,
}

/// Per-member running totals.
///
/// Shares are kept as integer cent sums grouped by split size, and divided
/// only once at the end. The outcome is independent of expense order.
#[derive(Default)]
struct Accumulator {
    paid: MoneyCents,
    owed_by_split_size: BTreeMap<usize, MoneyCents>,
}

impl Accumulator {
    fn settle(&self) -> MoneyCents {
        let owed = self
            .owed_by_split_size
            .iter()
            .fold(Decimal::ZERO, |acc, (size, cents)| {
                acc + cents.to_decimal_cents() / Decimal::from(*size as u64)
            });
        MoneyCents::from_decimal_cents(self.paid.to_decimal_cents() - owed)
    }
}

/// Folds expense records into per-member net balances.
#[derive(Clone, Copy, Debug, Default)]
pub struct BalanceEngine;

impl BalanceEngine {
    /// Computes the balance of every member from the full ledger.
    ///
    /// For each expense the payer is credited the full amount and every split
    /// member is debited `amount / |split_between|`; a payer who is also in
    /// the split gets both. Final balances are rounded to whole cents, half
    /// away from zero.
    ///
    /// Expenses with an empty split only count toward the total. Members
    /// unknown to `members` get an entry appended after the group members.
    pub fn compute<'a, I>(&self, members: &MemberSet, expenses: I) -> BalanceReport
    where
        I: IntoIterator<Item = &'a Expense>,
    {
        let mut order: Vec<Member> = members.iter().cloned().collect();
        let mut index: HashMap<Member, usize> = order
            .iter()
            .enumerate()
            .map(|(i, m)| (m.clone(), i))
            .collect();
        let mut accumulators: Vec<Accumulator> =
            order.iter().map(|_| Accumulator::default()).collect();

        let mut slot = |member: &Member| -> usize {
            if let Some(&i) = index.get(member) {
                return i;
            }
            tracing::warn!(%member, "expense references a member outside the group");
            order.push(member.clone());
            accumulators.push(Accumulator::default());
            let i = order.len() - 1;
            index.insert(member.clone(), i);
            i
        };

        let mut total = MoneyCents::ZERO;
        let mut updates: Vec<(usize, Option<usize>, MoneyCents)> = Vec::new();
        for expense in expenses {
            total += expense.amount;

            let split_size = expense.split_between.len();
            if split_size == 0 {
                continue;
            }

            updates.push((slot(&expense.paid_by), None, expense.amount));
            for member in &expense.split_between {
                updates.push((slot(member), Some(split_size), expense.amount));
            }
        }

        for (i, split_size, amount) in updates {
            let acc = &mut accumulators[i];
            match split_size {
                None => acc.paid += amount,
                Some(size) => *acc.owed_by_split_size.entry(size).or_default() += amount,
            }
        }

        let balances = order
            .into_iter()
            .zip(accumulators.iter().map(Accumulator::settle))
            .collect();

        BalanceReport { balances, total }
    }
}
