//! Settlement planning.
//!
//! [`SettlementPlanner`] turns a balance vector into directed payment
//! instructions. Each debtor's debt is spread over the creditors in
//! proportion to their outstanding credit: every share is floored to the
//! cent, then the leftover cents go to the creditors with the largest
//! fractional remainders.

use std::collections::HashMap;

use crate::{BalanceVector, Member, MoneyCents};

/// `from` owes `to` the given amount.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Settlement {
    pub from: Member,
    pub to: Member,
    pub amount: MoneyCents,
}

/// Creditor working state, mutated while debtors are processed.
struct Creditor<'a> {
    member: &'a Member,
    outstanding: MoneyCents,
}

/// Collects settlements, merging repeated `(from, to)` pairs in
/// first-occurrence order.
#[derive(Default)]
struct SettlementBook {
    settlements: Vec<Settlement>,
    index: HashMap<(Member, Member), usize>,
}

impl SettlementBook {
    fn record(&mut self, from: &Member, to: &Member, amount: MoneyCents) {
        let key = (from.clone(), to.clone());
        match self.index.get(&key) {
            Some(&i) => self.settlements[i].amount += amount,
            None => {
                self.index.insert(key, self.settlements.len());
                self.settlements.push(Settlement {
                    from: from.clone(),
                    to: to.clone(),
                    amount,
                });
            }
        }
    }

    fn finish(self) -> Vec<Settlement> {
        self.settlements
            .into_iter()
            .filter(|s| s.amount.is_positive() && s.from != s.to)
            .collect()
    }
}

/// Computes who pays whom.
///
/// The planner does not minimize the number of payments: every debtor pays
/// every creditor that still has outstanding credit, proportionally.
#[derive(Clone, Copy, Debug, Default)]
pub struct SettlementPlanner;

impl SettlementPlanner {
    /// Plans the payments that zero out `balances`.
    ///
    /// Debtors are processed in balance-vector order, and each one settles
    /// against what is still owed to creditors after the previous debtors.
    /// The result is deterministic for a given input.
    ///
    /// A creditor's outstanding credit never drops below zero: on input that
    /// does not sum to zero, a debtor paying more than the remaining credit
    /// leaves creditors at zero instead of negative.
    pub fn plan(&self, balances: &BalanceVector) -> Vec<Settlement> {
        let mut debtors = Vec::new();
        let mut creditors = Vec::new();
        for (member, balance) in balances.iter() {
            if balance.is_negative() {
                debtors.push((member, balance.abs()));
            } else if balance.is_positive() {
                creditors.push(Creditor {
                    member,
                    outstanding: balance,
                });
            }
        }

        if debtors.is_empty() || creditors.is_empty() {
            return Vec::new();
        }

        let mut book = SettlementBook::default();
        for (debtor, owed) in debtors {
            let shares = allocate(owed, &creditors);
            for (creditor, share) in creditors.iter_mut().zip(shares) {
                if !share.is_positive() {
                    continue;
                }
                book.record(debtor, creditor.member, share);
                creditor.outstanding = (creditor.outstanding - share).max(MoneyCents::ZERO);
            }
        }

        book.finish()
    }
}

/// Splits `owed` over `creditors` proportionally to their outstanding
/// credit. The returned shares, aligned with `creditors`, sum to `owed`
/// exactly.
fn allocate(owed: MoneyCents, creditors: &[Creditor<'_>]) -> Vec<MoneyCents> {
    let owed = i128::from(owed.cents());
    let credit_total: i128 = creditors
        .iter()
        .map(|c| i128::from(c.outstanding.cents()))
        .sum();

    let mut shares = vec![0_i128; creditors.len()];
    let mut remainders = vec![0_i128; creditors.len()];
    if credit_total > 0 {
        for (i, creditor) in creditors.iter().enumerate() {
            let numerator = owed * i128::from(creditor.outstanding.cents());
            shares[i] = numerator / credit_total;
            remainders[i] = numerator % credit_total;
        }
    }

    // Flooring never overshoots, so the leftover is a non-negative number
    // of cents.
    let mut leftover = owed - shares.iter().sum::<i128>();

    // Largest fractional part first; the stable sort keeps creditor order on
    // ties.
    let mut ranking: Vec<usize> = (0..creditors.len()).collect();
    ranking.sort_by(|&a, &b| remainders[b].cmp(&remainders[a]));

    for &i in ranking.iter().cycle() {
        if leftover <= 0 {
            break;
        }
        shares[i] += 1;
        leftover -= 1;
    }

    shares
        .into_iter()
        .map(|cents| MoneyCents::new(i64::try_from(cents).unwrap_or(i64::MAX)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(entries: &[(&str, i64)]) -> BalanceVector {
        entries
            .iter()
            .map(|(m, cents)| (Member::from(*m), MoneyCents::new(*cents)))
            .collect()
    }

    fn plan(entries: &[(&str, i64)]) -> Vec<(String, String, i64)> {
        let mut out: Vec<_> = SettlementPlanner
            .plan(&vector(entries))
            .into_iter()
            .map(|s| (s.from.to_string(), s.to.to_string(), s.amount.cents()))
            .collect();
        out.sort();
        out
    }

    fn s(from: &str, to: &str, cents: i64) -> (String, String, i64) {
        (from.to_string(), to.to_string(), cents)
    }

    #[test]
    fn one_payer_three_way_split() {
        let got = plan(&[("Alice", 200_00), ("Bob", -100_00), ("Carol", -100_00)]);
        assert_eq!(got, vec![s("Bob", "Alice", 100_00), s("Carol", "Alice", 100_00)]);
    }

    #[test]
    fn single_creditor_takes_every_debt() {
        let got = plan(&[
            ("Alice", 100_00),
            ("Bob", -33_00),
            ("Carol", -33_00),
            ("Dave", -34_00),
        ]);
        assert_eq!(
            got,
            vec![
                s("Bob", "Alice", 33_00),
                s("Carol", "Alice", 33_00),
                s("Dave", "Alice", 34_00),
            ]
        );
    }

    #[test]
    fn debt_is_split_proportionally_to_credit() {
        let got = plan(&[("Alice", 2_00), ("Bob", 1_00), ("Carol", -3_00)]);
        assert_eq!(got, vec![s("Carol", "Alice", 2_00), s("Carol", "Bob", 1_00)]);
    }

    #[test]
    fn settled_group_needs_no_payments() {
        assert!(plan(&[("Alice", 0), ("Bob", 0), ("Carol", 0)]).is_empty());
        assert!(plan(&[]).is_empty());
    }

    #[test]
    fn only_creditors_or_only_debtors_yield_nothing() {
        assert!(plan(&[("Alice", 5_00), ("Bob", 0)]).is_empty());
        assert!(plan(&[("Alice", -5_00), ("Bob", 0)]).is_empty());
    }

    #[test]
    fn one_debtor_one_creditor() {
        let got = plan(&[("Alice", -12_34), ("Bob", 12_34)]);
        assert_eq!(got, vec![s("Alice", "Bob", 12_34)]);
    }

    #[test]
    fn leftover_cent_goes_to_first_creditor_on_ties() {
        let settlements = SettlementPlanner.plan(&vector(&[
            ("A", 1_00),
            ("B", 1_00),
            ("C", 1_00),
            ("X", -1_00),
            ("Y", -2_00),
        ]));
        let got: Vec<_> = settlements
            .iter()
            .map(|s| (s.from.as_str(), s.to.as_str(), s.amount.cents()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("X", "A", 34),
                ("X", "B", 33),
                ("X", "C", 33),
                ("Y", "A", 66),
                ("Y", "B", 67),
                ("Y", "C", 67),
            ]
        );
    }

    #[test]
    fn leftover_cent_goes_to_largest_remainder() {
        let got = plan(&[("A", 1_00), ("B", 2_00), ("X", -1_00), ("Y", -2_00)]);
        // X: exact shares 33.33 / 66.67, B has the larger fraction.
        assert_eq!(
            got,
            vec![
                s("X", "A", 33),
                s("X", "B", 67),
                s("Y", "A", 67),
                s("Y", "B", 1_33),
            ]
        );
    }

    #[test]
    fn exhausted_credit_still_places_the_leftover_cents() {
        // Off by one cent of rounding: credit runs out before the last debtor.
        let got = plan(&[("A", 1_00), ("B", -1_00), ("C", -1)]);
        assert_eq!(got, vec![s("B", "A", 1_00), s("C", "A", 1)]);
    }

    #[test]
    fn tiny_shares_are_fixed_by_cent_distribution() {
        let got = plan(&[("A", 1), ("B", 1), ("C", 1), ("D", -3)]);
        assert_eq!(got, vec![s("D", "A", 1), s("D", "B", 1), s("D", "C", 1)]);
    }

    #[test]
    fn plan_zeroes_balances() {
        let mut balances = vector(&[
            ("A", 66_67),
            ("B", -33_33),
            ("C", -33_33),
            ("D", 17_50),
            ("E", -17_51),
        ]);
        for settlement in SettlementPlanner.plan(&balances) {
            assert_ne!(settlement.from, settlement.to);
            assert!(settlement.amount.is_positive());
            balances.apply(&settlement);
        }
        for (_, balance) in balances.iter() {
            assert!(balance.cents().abs() <= 1, "residual {balance}");
        }
    }

    #[test]
    fn plan_is_deterministic() {
        let balances = vector(&[("A", 3_01), ("B", 2_00), ("C", -1_67), ("D", -3_34)]);
        assert_eq!(
            SettlementPlanner.plan(&balances),
            SettlementPlanner.plan(&balances)
        );
    }
}
