//! Expense API endpoints

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use api_types::expense::{ExpenseList, ExpenseNew, ExpenseView};
use engine::{MoneyCents, NewExpense};

use crate::{ServerError, server::ServerState, views};

pub async fn list(
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<ExpenseList>, ServerError> {
    let group_id = engine::parse_id(&group_id, "group")?;
    let expenses = state
        .engine
        .list_expenses(group_id)
        .await?
        .iter()
        .map(views::expense)
        .collect();

    Ok(Json(ExpenseList { expenses }))
}

/// Handle requests for adding an expense; balances are recomputed before
/// the response is sent
pub async fn create(
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseView>), ServerError> {
    let group_id = engine::parse_id(&group_id, "group")?;
    let input = NewExpense {
        title: payload.title,
        amount: MoneyCents::new(payload.amount_minor),
        paid_by: payload.paid_by,
        split_between: payload.split_between,
        category: payload.category,
    };
    let expense = state.engine.add_expense(group_id, input).await?;

    Ok((StatusCode::CREATED, Json(views::expense(&expense))))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path((group_id, expense_id)): Path<(String, String)>,
) -> Result<StatusCode, ServerError> {
    let group_id = engine::parse_id(&group_id, "group")?;
    let expense_id = engine::parse_id(&expense_id, "expense")?;
    state.engine.delete_expense(group_id, expense_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
