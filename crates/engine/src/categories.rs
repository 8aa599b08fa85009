//! Per-category settlement reports.

use std::collections::BTreeMap;

use crate::{
    BalanceEngine, BalanceVector, Category, Expense, MemberSet, MoneyCents, Settlement,
    SettlementPlanner,
};

/// Balances and payments for one slice of the ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryReport {
    pub total: MoneyCents,
    pub balances: BalanceVector,
    pub settlements: Vec<Settlement>,
}

/// Whole-group report plus one report per category that has expenses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryBreakdown {
    pub overall: CategoryReport,
    pub categories: BTreeMap<Category, CategoryReport>,
}

/// Runs the balance and settlement pipeline once per expense category.
#[derive(Clone, Copy, Debug, Default)]
pub struct CategoryAggregator {
    balances: BalanceEngine,
    planner: SettlementPlanner,
}

impl CategoryAggregator {
    /// One report per distinct category, sorted by label.
    ///
    /// Each partition is computed only from its own expenses but seeded with
    /// every group member. Categories without expenses are absent.
    pub fn by_category(
        &self,
        members: &MemberSet,
        expenses: &[Expense],
    ) -> BTreeMap<Category, CategoryReport> {
        let mut partitions: BTreeMap<Category, Vec<&Expense>> = BTreeMap::new();
        for expense in expenses {
            partitions
                .entry(expense.category.clone())
                .or_default()
                .push(expense);
        }

        partitions
            .into_iter()
            .map(|(category, slice)| {
                let report = self.report(members, slice);
                (category, report)
            })
            .collect()
    }

    /// The per-category reports together with the report over the full
    /// ledger.
    pub fn breakdown(&self, members: &MemberSet, expenses: &[Expense]) -> CategoryBreakdown {
        CategoryBreakdown {
            overall: self.report(members, expenses),
            categories: self.by_category(members, expenses),
        }
    }

    fn report<'a, I>(&self, members: &MemberSet, expenses: I) -> CategoryReport
    where
        I: IntoIterator<Item = &'a Expense>,
    {
        let computed = self.balances.compute(members, expenses);
        let settlements = self.planner.plan(&computed.balances);
        CategoryReport {
            total: computed.total,
            balances: computed.balances,
            settlements,
        }
    }
}
