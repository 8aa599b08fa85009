//! The module contains the error the engine can throw.
//!
//! The pure computations ([`BalanceEngine`], [`SettlementPlanner`],
//! [`CategoryAggregator`]) never fail. Errors come from input validation and
//! from the database:
//!
//! - [`InvalidMember`] thrown when an expense references a member outside
//!   the group, or a group is created with a bad member list.
//! - [`EmptySplit`] thrown when an expense has no split participants.
//! - [`KeyNotFound`] thrown when a group or an expense does not exist.
//!
//!  [`InvalidMember`]: EngineError::InvalidMember
//!  [`EmptySplit`]: EngineError::EmptySplit
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`BalanceEngine`]: crate::BalanceEngine
//!  [`SettlementPlanner`]: crate::SettlementPlanner
//!  [`CategoryAggregator`]: crate::CategoryAggregator
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid member: {0}")]
    InvalidMember(String),
    #[error("Empty split: {0}")]
    EmptySplit(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidMember(a), Self::InvalidMember(b)) => a == b,
            (Self::EmptySplit(a), Self::EmptySplit(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
