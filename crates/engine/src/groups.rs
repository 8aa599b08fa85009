//! The module contains the `Group` type and its storage model.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{BalanceVector, Member, MemberSet, MoneyCents, group_members};

/// A group of members sharing expenses.
///
/// `balances` and `total` are the state persisted by the last recompute,
/// not a live view of the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub members: MemberSet,
    pub balances: BalanceVector,
    pub total: MoneyCents,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub total_minor: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group_members::Entity")]
    Members,
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
}

impl Related<super::group_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<(Model, Vec<group_members::Model>)> for Group {
    fn from((model, mut rows): (Model, Vec<group_members::Model>)) -> Self {
        rows.sort_by_key(|row| row.position);
        let members = MemberSet::from_members(
            rows.iter()
                .map(|row| Member::from_stored(row.member.clone())),
        );
        let balances = rows
            .into_iter()
            .map(|row| {
                (
                    Member::from_stored(row.member),
                    MoneyCents::new(row.balance_minor),
                )
            })
            .collect();

        Self {
            id: model.id,
            name: model.name,
            members,
            balances,
            total: MoneyCents::new(model.total_minor),
            created_at: model.created_at,
        }
    }
}
