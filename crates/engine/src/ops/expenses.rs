use std::collections::HashMap;

use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    BalanceEngine, BalanceReport, EngineError, Expense, Group, NewExpense, ResultEngine,
    expense_splits, expenses, group_members, groups,
};

use super::{Engine, groups::load_group, storage_position, with_tx};

/// Loads a group's ledger, newest first.
pub(super) async fn load_expenses<C: ConnectionTrait>(
    db: &C,
    group_id: Uuid,
) -> ResultEngine<Vec<Expense>> {
    let models = expenses::Entity::find()
        .filter(expenses::Column::GroupId.eq(group_id))
        .order_by_desc(expenses::Column::CreatedAt)
        .order_by_desc(expenses::Column::Id)
        .all(db)
        .await?;
    let ids: Vec<Uuid> = models.iter().map(|model| model.id).collect();

    let mut splits_by_expense: HashMap<Uuid, Vec<expense_splits::Model>> = HashMap::new();
    for split in expense_splits::Entity::find()
        .filter(expense_splits::Column::ExpenseId.is_in(ids))
        .all(db)
        .await?
    {
        splits_by_expense
            .entry(split.expense_id)
            .or_default()
            .push(split);
    }

    Ok(models
        .into_iter()
        .map(|model| {
            let splits = splits_by_expense.remove(&model.id).unwrap_or_default();
            Expense::from((model, splits))
        })
        .collect())
}

/// Recomputes the group's balances from its full ledger and persists them.
///
/// Must run inside the transaction that changed the ledger, with the group
/// lock held.
async fn recompute_in_tx(db_tx: &DatabaseTransaction, group: &Group) -> ResultEngine<BalanceReport> {
    let ledger = load_expenses(db_tx, group.id).await?;
    let report = BalanceEngine.compute(&group.members, &ledger);

    for (member, balance) in report.balances.iter() {
        // Validation keeps foreign members out of the ledger; an ad-hoc
        // entry here has no row to persist into.
        if !group.members.contains(member) {
            tracing::warn!(group_id = %group.id, %member, "skipping balance of non-member");
            continue;
        }
        group_members::ActiveModel {
            group_id: ActiveValue::Set(group.id),
            member: ActiveValue::Set(member.to_string()),
            balance_minor: ActiveValue::Set(balance.cents()),
            ..Default::default()
        }
        .update(db_tx)
        .await?;
    }

    groups::ActiveModel {
        id: ActiveValue::Set(group.id),
        total_minor: ActiveValue::Set(report.total.cents()),
        ..Default::default()
    }
    .update(db_tx)
    .await?;

    tracing::debug!(
        group_id = %group.id,
        expenses = ledger.len(),
        total = %report.total,
        "balances recomputed"
    );
    Ok(report)
}

impl Engine {
    /// Validates and records an expense, then recomputes the group balances.
    pub async fn add_expense(&self, group_id: Uuid, input: NewExpense) -> ResultEngine<Expense> {
        let lock = self.locks.get(group_id);
        let _guard = lock.lock().await;

        with_tx!(self, |db_tx| {
            let group = load_group(&db_tx, group_id).await?;
            let expense = input.validate(group.id, &group.members)?;
            if group.total.checked_add(expense.amount).is_none() {
                return Err(EngineError::InvalidAmount(
                    "group total would overflow".to_string(),
                ));
            }

            expenses::ActiveModel::from(&expense).insert(&db_tx).await?;
            for (position, member) in expense.split_between.iter().enumerate() {
                expense_splits::ActiveModel {
                    expense_id: ActiveValue::Set(expense.id),
                    member: ActiveValue::Set(member.to_string()),
                    position: ActiveValue::Set(storage_position(position)?),
                }
                .insert(&db_tx)
                .await?;
            }

            recompute_in_tx(&db_tx, &group).await?;
            tracing::info!(%group_id, expense_id = %expense.id, amount = %expense.amount, "expense added");
            Ok(expense)
        })
    }

    /// Removes an expense from a group, then recomputes the group balances.
    pub async fn delete_expense(&self, group_id: Uuid, expense_id: Uuid) -> ResultEngine<()> {
        let lock = self.locks.get(group_id);
        let _guard = lock.lock().await;

        with_tx!(self, |db_tx| {
            let group = load_group(&db_tx, group_id).await?;
            expenses::Entity::find_by_id(expense_id)
                .filter(expenses::Column::GroupId.eq(group_id))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;

            expense_splits::Entity::delete_many()
                .filter(expense_splits::Column::ExpenseId.eq(expense_id))
                .exec(&db_tx)
                .await?;
            expenses::Entity::delete_by_id(expense_id)
                .exec(&db_tx)
                .await?;

            recompute_in_tx(&db_tx, &group).await?;
            tracing::info!(%group_id, %expense_id, "expense deleted");
            Ok(())
        })
    }

    /// The group's expenses, newest first.
    pub async fn list_expenses(&self, group_id: Uuid) -> ResultEngine<Vec<Expense>> {
        load_group(&self.database, group_id).await?;
        load_expenses(&self.database, group_id).await
    }

    /// Forces a full recompute of the group's persisted balances.
    pub async fn recompute_balances(&self, group_id: Uuid) -> ResultEngine<BalanceReport> {
        let lock = self.locks.get(group_id);
        let _guard = lock.lock().await;

        with_tx!(self, |db_tx| {
            let group = load_group(&db_tx, group_id).await?;
            recompute_in_tx(&db_tx, &group).await
        })
    }
}
