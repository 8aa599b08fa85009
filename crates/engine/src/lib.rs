//! Shared expense ledger and settlement engine.
//!
//! The pure pipeline is:
//!
//! ```text
//! expenses ──BalanceEngine──▶ BalanceVector ──SettlementPlanner──▶ Vec<Settlement>
//! ```
//!
//! [`CategoryAggregator`] runs the same pipeline once per expense category.
//! [`Engine`] stores groups and expenses with sea-orm and recomputes a
//! group's balances after every ledger change.

pub use balances::{BalanceEngine, BalanceReport, BalanceVector};
pub use categories::{CategoryAggregator, CategoryBreakdown, CategoryReport};
pub use error::EngineError;
pub use expenses::{Category, DEFAULT_CATEGORY, Expense, MAX_EXPENSE_AMOUNT, NewExpense};
pub use groups::Group;
pub use members::{MIN_GROUP_MEMBERS, Member, MemberSet};
pub use money::MoneyCents;
pub use ops::{Engine, EngineBuilder};
pub use settlement::{Settlement, SettlementPlanner};
pub use util::parse_id;

mod balances;
mod categories;
mod error;
mod expense_splits;
mod expenses;
mod group_members;
mod groups;
mod members;
mod money;
mod ops;
mod settlement;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
