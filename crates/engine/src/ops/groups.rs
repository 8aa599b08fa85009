use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    BalanceVector, EngineError, Group, MemberSet, MoneyCents, ResultEngine, expense_splits,
    expenses, group_members, groups,
};

use super::{Engine, normalize_required_name, storage_position, with_tx};

/// Loads a group with its members and persisted balances.
pub(super) async fn load_group<C: ConnectionTrait>(db: &C, group_id: Uuid) -> ResultEngine<Group> {
    let model = groups::Entity::find_by_id(group_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("group not exists".to_string()))?;
    let rows = group_members::Entity::find()
        .filter(group_members::Column::GroupId.eq(group_id))
        .order_by_asc(group_members::Column::Position)
        .all(db)
        .await?;
    Ok(Group::from((model, rows)))
}

impl Engine {
    /// Creates a group. Every member starts with a zero balance.
    ///
    /// Member names are trimmed and blank ones dropped; duplicates and groups
    /// with fewer than two members are rejected.
    pub async fn create_group<I, S>(&self, name: &str, members: I) -> ResultEngine<Group>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = normalize_required_name(name, "group")?;
        let members = MemberSet::try_new(members)?;
        let group = Group {
            id: Uuid::new_v4(),
            name,
            balances: BalanceVector::zeroed(&members),
            members,
            total: MoneyCents::ZERO,
            created_at: Utc::now(),
        };

        with_tx!(self, |db_tx| {
            groups::ActiveModel {
                id: ActiveValue::Set(group.id),
                name: ActiveValue::Set(group.name.clone()),
                total_minor: ActiveValue::Set(0),
                created_at: ActiveValue::Set(group.created_at),
            }
            .insert(&db_tx)
            .await?;

            for (position, member) in group.members.iter().enumerate() {
                group_members::ActiveModel {
                    group_id: ActiveValue::Set(group.id),
                    member: ActiveValue::Set(member.to_string()),
                    position: ActiveValue::Set(storage_position(position)?),
                    balance_minor: ActiveValue::Set(0),
                }
                .insert(&db_tx)
                .await?;
            }

            tracing::info!(group_id = %group.id, members = group.members.len(), "group created");
            Ok(group)
        })
    }

    /// Every group, newest first.
    pub async fn list_groups(&self) -> ResultEngine<Vec<Group>> {
        let models = groups::Entity::find()
            .order_by_desc(groups::Column::CreatedAt)
            .all(&self.database)
            .await?;
        let ids: Vec<Uuid> = models.iter().map(|model| model.id).collect();

        let mut rows_by_group: HashMap<Uuid, Vec<group_members::Model>> = HashMap::new();
        for row in group_members::Entity::find()
            .filter(group_members::Column::GroupId.is_in(ids))
            .all(&self.database)
            .await?
        {
            rows_by_group.entry(row.group_id).or_default().push(row);
        }

        Ok(models
            .into_iter()
            .map(|model| {
                let rows = rows_by_group.remove(&model.id).unwrap_or_default();
                Group::from((model, rows))
            })
            .collect())
    }

    /// A group with its last persisted balances.
    pub async fn group(&self, group_id: Uuid) -> ResultEngine<Group> {
        load_group(&self.database, group_id).await
    }

    /// Deletes a group together with its members and expenses.
    pub async fn delete_group(&self, group_id: Uuid) -> ResultEngine<()> {
        let lock = self.locks.get(group_id);
        let _guard = lock.lock().await;

        let result: ResultEngine<()> = with_tx!(self, |db_tx| {
            groups::Entity::find_by_id(group_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("group not exists".to_string()))?;

            let expense_ids: Vec<Uuid> = expenses::Entity::find()
                .filter(expenses::Column::GroupId.eq(group_id))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| model.id)
                .collect();

            expense_splits::Entity::delete_many()
                .filter(expense_splits::Column::ExpenseId.is_in(expense_ids))
                .exec(&db_tx)
                .await?;
            expenses::Entity::delete_many()
                .filter(expenses::Column::GroupId.eq(group_id))
                .exec(&db_tx)
                .await?;
            group_members::Entity::delete_many()
                .filter(group_members::Column::GroupId.eq(group_id))
                .exec(&db_tx)
                .await?;
            groups::Entity::delete_by_id(group_id).exec(&db_tx).await?;

            Ok(())
        });
        result?;

        self.locks.forget(group_id);
        tracing::info!(%group_id, "group deleted");
        Ok(())
    }

    /// Marks a group as settled by resetting every persisted balance to zero.
    ///
    /// Expenses and the group total are kept; the next ledger change
    /// recomputes balances from the full ledger again.
    pub async fn settle_group(&self, group_id: Uuid) -> ResultEngine<Group> {
        let lock = self.locks.get(group_id);
        let _guard = lock.lock().await;

        with_tx!(self, |db_tx| {
            load_group(&db_tx, group_id).await?;
            group_members::Entity::update_many()
                .col_expr(group_members::Column::BalanceMinor, Expr::value(0_i64))
                .filter(group_members::Column::GroupId.eq(group_id))
                .exec(&db_tx)
                .await?;

            tracing::info!(%group_id, "group balances reset");
            load_group(&db_tx, group_id).await
        })
    }
}
