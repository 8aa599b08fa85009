//! Request and response bodies of the SettleUp HTTP API.
//!
//! Money is always an integer number of cents in `*_minor` fields.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod health {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Health {
        pub ok: bool,
    }
}

pub mod group {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupNew {
        pub name: String,
        /// At least two distinct names; blank entries are ignored.
        pub members: Vec<String>,
    }

    /// A member's net balance: positive when owed money, negative when owing.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MemberBalance {
        pub member: String,
        pub balance_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupView {
        pub id: Uuid,
        pub name: String,
        pub members: Vec<String>,
        /// Persisted balances, in member order.
        pub balances: Vec<MemberBalance>,
        pub total_minor: i64,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupList {
        pub groups: Vec<GroupView>,
    }
}

pub mod expense {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub title: String,
        /// Must be > 0.
        pub amount_minor: i64,
        pub paid_by: String,
        pub split_between: Vec<String>,
        /// Defaults to `General` when absent or blank.
        pub category: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub group_id: Uuid,
        pub title: String,
        pub amount_minor: i64,
        pub paid_by: String,
        pub split_between: Vec<String>,
        pub category: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseList {
        pub expenses: Vec<ExpenseView>,
    }
}

pub mod settlement {
    use super::*;
    use crate::group::MemberBalance;

    /// `from` pays `to`.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SettlementView {
        pub from: String,
        pub to: String,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementList {
        pub settlements: Vec<SettlementView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryReportView {
        pub total_minor: i64,
        pub balances: Vec<MemberBalance>,
        pub settlements: Vec<SettlementView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryBreakdownView {
        /// The whole ledger, all categories together.
        pub overall: CategoryReportView,
        /// Keyed by category label; categories without expenses are absent.
        pub categories: BTreeMap<String, CategoryReportView>,
    }
}
