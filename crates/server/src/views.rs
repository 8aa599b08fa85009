//! Mapping from engine records to API bodies.

use std::collections::BTreeMap;

use api_types::{
    expense::ExpenseView,
    group::{GroupView, MemberBalance},
    settlement::{CategoryBreakdownView, CategoryReportView, SettlementView},
};
use engine::{BalanceVector, CategoryBreakdown, CategoryReport, Expense, Group, Settlement};

pub(crate) fn balances(balances: &BalanceVector) -> Vec<MemberBalance> {
    balances
        .iter()
        .map(|(member, balance)| MemberBalance {
            member: member.to_string(),
            balance_minor: balance.cents(),
        })
        .collect()
}

pub(crate) fn group(group: &Group) -> GroupView {
    GroupView {
        id: group.id,
        name: group.name.clone(),
        members: group.members.iter().map(ToString::to_string).collect(),
        balances: balances(&group.balances),
        total_minor: group.total.cents(),
        created_at: group.created_at,
    }
}

pub(crate) fn expense(expense: &Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        group_id: expense.group_id,
        title: expense.title.clone(),
        amount_minor: expense.amount.cents(),
        paid_by: expense.paid_by.to_string(),
        split_between: expense.split_between.iter().map(ToString::to_string).collect(),
        category: expense.category.to_string(),
        created_at: expense.created_at,
    }
}

pub(crate) fn settlement(settlement: &Settlement) -> SettlementView {
    SettlementView {
        from: settlement.from.to_string(),
        to: settlement.to.to_string(),
        amount_minor: settlement.amount.cents(),
    }
}

fn category_report(report: &CategoryReport) -> CategoryReportView {
    CategoryReportView {
        total_minor: report.total.cents(),
        balances: balances(&report.balances),
        settlements: report.settlements.iter().map(settlement).collect(),
    }
}

pub(crate) fn breakdown(breakdown: &CategoryBreakdown) -> CategoryBreakdownView {
    let categories: BTreeMap<String, CategoryReportView> = breakdown
        .categories
        .iter()
        .map(|(category, report)| (category.to_string(), category_report(report)))
        .collect();

    CategoryBreakdownView {
        overall: category_report(&breakdown.overall),
        categories,
    }
}
