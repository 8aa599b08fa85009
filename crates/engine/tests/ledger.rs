use std::sync::Arc;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    BalanceEngine, Category, Engine, EngineError, Group, MAX_EXPENSE_AMOUNT, Member, MoneyCents,
    NewExpense, Settlement,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn trip(engine: &Engine) -> Group {
    engine
        .create_group("Trip", ["Alice", "Bob", "Carol"])
        .await
        .unwrap()
}

fn new_expense(title: &str, cents: i64, paid_by: &str, split: &[&str]) -> NewExpense {
    NewExpense {
        title: title.to_string(),
        amount: MoneyCents::new(cents),
        paid_by: paid_by.to_string(),
        split_between: split.iter().map(|m| m.to_string()).collect(),
        category: None,
    }
}

fn balance(group: &Group, member: &str) -> i64 {
    group
        .balances
        .get(&Member::from(member))
        .unwrap_or_default()
        .cents()
}

fn settlement(from: &str, to: &str, cents: i64) -> Settlement {
    Settlement {
        from: Member::from(from),
        to: Member::from(to),
        amount: MoneyCents::new(cents),
    }
}

#[tokio::test]
async fn create_group_starts_with_zero_balances() {
    let (engine, _db) = engine_with_db().await;

    let group = engine
        .create_group("  Trip ", [" Alice", "Bob", "", "Carol "])
        .await
        .unwrap();

    assert_eq!(group.name, "Trip");
    let members: Vec<&str> = group.members.iter().map(Member::as_str).collect();
    assert_eq!(members, vec!["Alice", "Bob", "Carol"]);
    assert!(group.balances.is_settled());
    assert_eq!(group.balances.len(), 3);
    assert_eq!(group.total, MoneyCents::ZERO);

    let stored = engine.group(group.id).await.unwrap();
    assert_eq!(stored.members, group.members);
    assert_eq!(stored.balances, group.balances);
}

#[tokio::test]
async fn create_group_rejects_bad_input() {
    let (engine, _db) = engine_with_db().await;

    let err = engine.create_group(" ", ["Alice", "Bob"]).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidName("group name must not be empty".to_string())
    );

    let err = engine.create_group("Solo", ["Alice"]).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidMember(_)));

    let err = engine
        .create_group("Twins", ["Alice", "Alice"])
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidMember("duplicate member: Alice".to_string())
    );

    assert!(engine.list_groups().await.unwrap().is_empty());
}

#[tokio::test]
async fn list_and_delete_groups() {
    let (engine, _db) = engine_with_db().await;
    let first = trip(&engine).await;
    let second = engine.create_group("Flat", ["Dan", "Eve"]).await.unwrap();
    engine
        .add_expense(first.id, new_expense("Dinner", 30_00, "Alice", &["Alice", "Bob"]))
        .await
        .unwrap();

    let ids: Vec<Uuid> = engine
        .list_groups()
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.id)
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&first.id) && ids.contains(&second.id));

    engine.delete_group(first.id).await.unwrap();

    let err = engine.group(first.id).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("group not exists".to_string()));
    let err = engine.list_expenses(first.id).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("group not exists".to_string()));
    let err = engine.delete_group(first.id).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("group not exists".to_string()));

    let left = engine.list_groups().await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].id, second.id);
}

#[tokio::test]
async fn add_expense_persists_recomputed_balances() {
    let (engine, _db) = engine_with_db().await;
    let group = trip(&engine).await;

    let expense = engine
        .add_expense(
            group.id,
            new_expense(" Hotel ", 300_00, "Alice", &["Alice", "Bob", "Carol"]),
        )
        .await
        .unwrap();
    assert_eq!(expense.title, "Hotel");
    assert_eq!(expense.category.as_str(), "General");

    let group = engine.group(group.id).await.unwrap();
    assert_eq!(balance(&group, "Alice"), 200_00);
    assert_eq!(balance(&group, "Bob"), -100_00);
    assert_eq!(balance(&group, "Carol"), -100_00);
    assert_eq!(group.total.cents(), 300_00);

    let settlements = engine.settlements(group.id).await.unwrap();
    assert_eq!(
        settlements,
        vec![
            settlement("Bob", "Alice", 100_00),
            settlement("Carol", "Alice", 100_00),
        ]
    );
}

#[tokio::test]
async fn stored_balances_match_a_fresh_recompute() {
    let (engine, _db) = engine_with_db().await;
    let group = trip(&engine).await;

    engine
        .add_expense(group.id, new_expense("Taxi", 10_00, "Bob", &["Alice", "Bob", "Carol"]))
        .await
        .unwrap();
    let museum = engine
        .add_expense(group.id, new_expense("Museum", 12_00, "Carol", &["Bob", "Carol"]))
        .await
        .unwrap();
    engine
        .add_expense(group.id, new_expense("Lunch", 7_01, "Alice", &["Alice", "Carol"]))
        .await
        .unwrap();
    engine.delete_expense(group.id, museum.id).await.unwrap();

    let stored = engine.group(group.id).await.unwrap();
    let ledger = engine.list_expenses(group.id).await.unwrap();
    assert_eq!(ledger.len(), 2);
    assert!(ledger.iter().all(|e| e.id != museum.id));

    let fresh = BalanceEngine.compute(&stored.members, &ledger);
    assert_eq!(stored.balances, fresh.balances);
    assert_eq!(stored.total, fresh.total);
    assert_eq!(stored.total.cents(), 17_01);

    // Taxi: Bob +6.67, Alice -3.33, Carol -3.33; Lunch: Alice +3.505, Carol -3.505.
    assert_eq!(balance(&stored, "Alice"), 17);
    assert_eq!(balance(&stored, "Bob"), 6_67);
    assert_eq!(balance(&stored, "Carol"), -6_84);

    assert_eq!(engine.recompute_balances(group.id).await.unwrap(), fresh);
}

#[tokio::test]
async fn delete_last_expense_resets_balances() {
    let (engine, _db) = engine_with_db().await;
    let group = trip(&engine).await;
    let expense = engine
        .add_expense(group.id, new_expense("Snacks", 9_00, "Carol", &["Alice", "Bob"]))
        .await
        .unwrap();

    engine.delete_expense(group.id, expense.id).await.unwrap();

    let group = engine.group(group.id).await.unwrap();
    assert!(group.balances.is_settled());
    assert_eq!(group.total, MoneyCents::ZERO);
    assert!(engine.settlements(group.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_expense_checks_ownership() {
    let (engine, _db) = engine_with_db().await;
    let trip = trip(&engine).await;
    let flat = engine.create_group("Flat", ["Alice", "Bob"]).await.unwrap();
    let expense = engine
        .add_expense(trip.id, new_expense("Fuel", 40_00, "Alice", &["Alice", "Bob"]))
        .await
        .unwrap();

    let err = engine.delete_expense(flat.id, expense.id).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("expense not exists".to_string()));
    let err = engine
        .delete_expense(trip.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("expense not exists".to_string()));

    assert_eq!(engine.list_expenses(trip.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_expenses_leave_the_ledger_unchanged() {
    let (engine, _db) = engine_with_db().await;
    let group = trip(&engine).await;
    engine
        .add_expense(group.id, new_expense("Hotel", 90_00, "Alice", &["Alice", "Bob", "Carol"]))
        .await
        .unwrap();
    let before = engine.group(group.id).await.unwrap();

    let cases = [
        (
            new_expense("  ", 10_00, "Alice", &["Bob"]),
            EngineError::InvalidName("expense title is required".to_string()),
        ),
        (
            new_expense("Gift", 0, "Alice", &["Bob"]),
            EngineError::InvalidAmount("amount must be > 0".to_string()),
        ),
        (
            new_expense("Gift", 10_00, "Mallory", &["Bob"]),
            EngineError::InvalidMember("paid_by must be a group member: Mallory".to_string()),
        ),
        (
            new_expense("Gift", 10_00, "Alice", &[]),
            EngineError::EmptySplit("split_between must have at least 1 member".to_string()),
        ),
        (
            new_expense("Gift", 10_00, "Alice", &["Bob", "Mallory"]),
            EngineError::InvalidMember("invalid split member: Mallory".to_string()),
        ),
        (
            new_expense("Gift", 10_00, "Alice", &["Bob", "Bob"]),
            EngineError::InvalidMember("duplicate split member: Bob".to_string()),
        ),
    ];
    for (input, expected) in cases {
        let err = engine.add_expense(group.id, input).await.unwrap_err();
        assert_eq!(err, expected);
    }

    let after = engine.group(group.id).await.unwrap();
    assert_eq!(after.balances, before.balances);
    assert_eq!(after.total, before.total);
    assert_eq!(engine.list_expenses(group.id).await.unwrap().len(), 1);

    let err = engine
        .add_expense(Uuid::new_v4(), new_expense("Gift", 1_00, "Alice", &["Bob"]))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("group not exists".to_string()));
}

#[tokio::test]
async fn oversized_amounts_are_rejected() {
    let (engine, db) = engine_with_db().await;
    let group = trip(&engine).await;

    let err = engine
        .add_expense(
            group.id,
            new_expense("Yacht", i64::MAX / 2 + 1, "Alice", &["Bob"]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    // A group whose stored total is already near the limit cannot grow past it.
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE groups SET total_minor = ? WHERE id = ?",
        vec![(i64::MAX - 1).into(), group.id.into()],
    ))
    .await
    .unwrap();
    let err = engine
        .add_expense(
            group.id,
            new_expense("Yacht", MAX_EXPENSE_AMOUNT.cents(), "Alice", &["Bob"]),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("group total would overflow".to_string())
    );
    assert!(engine.list_expenses(group.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn settle_group_resets_balances_only() {
    let (engine, _db) = engine_with_db().await;
    let group = trip(&engine).await;
    engine
        .add_expense(group.id, new_expense("Hotel", 60_00, "Bob", &["Alice", "Bob", "Carol"]))
        .await
        .unwrap();

    let settled = engine.settle_group(group.id).await.unwrap();

    assert!(settled.balances.is_settled());
    assert_eq!(settled.total.cents(), 60_00);
    assert_eq!(engine.list_expenses(group.id).await.unwrap().len(), 1);
    assert!(engine.settlements(group.id).await.unwrap().is_empty());

    // The next ledger change recomputes from every expense again.
    engine
        .add_expense(group.id, new_expense("Tea", 3_00, "Carol", &["Carol"]))
        .await
        .unwrap();
    let group = engine.group(group.id).await.unwrap();
    assert_eq!(balance(&group, "Bob"), 40_00);
    assert_eq!(balance(&group, "Alice"), -20_00);
    assert_eq!(balance(&group, "Carol"), -20_00);
}

#[tokio::test]
async fn settlements_by_category_splits_the_ledger() {
    let (engine, _db) = engine_with_db().await;
    let group = trip(&engine).await;
    let mut food = new_expense("Dinner", 30_00, "Alice", &["Alice", "Bob", "Carol"]);
    food.category = Some("Food".to_string());
    engine.add_expense(group.id, food).await.unwrap();
    engine
        .add_expense(group.id, new_expense("Tickets", 20_00, "Bob", &["Bob", "Carol"]))
        .await
        .unwrap();

    let breakdown = engine.settlements_by_category(group.id).await.unwrap();

    let labels: Vec<&str> = breakdown.categories.keys().map(|c| c.as_str()).collect();
    assert_eq!(labels, vec!["Food", "General"]);

    let food = &breakdown.categories[&Category::from("Food")];
    assert_eq!(food.total.cents(), 30_00);
    assert_eq!(
        food.settlements,
        vec![
            settlement("Bob", "Alice", 10_00),
            settlement("Carol", "Alice", 10_00),
        ]
    );

    let general = &breakdown.categories[&Category::default()];
    assert_eq!(general.total.cents(), 20_00);
    assert_eq!(general.balances.get(&Member::from("Alice")), Some(MoneyCents::ZERO));
    assert_eq!(general.settlements, vec![settlement("Carol", "Bob", 10_00)]);

    assert_eq!(breakdown.overall.total.cents(), 50_00);
    assert_eq!(
        breakdown.overall.settlements,
        engine.settlements(group.id).await.unwrap()
    );
}

#[tokio::test]
async fn concurrent_additions_all_land() {
    let (engine, _db) = engine_with_db().await;
    let engine = Arc::new(engine);
    let group_id = trip(&engine).await.id;

    let mut handles = Vec::new();
    for i in 0..12 {
        let engine = Arc::clone(&engine);
        let payer = ["Alice", "Bob", "Carol"][i % 3];
        handles.push(tokio::spawn(async move {
            engine
                .add_expense(
                    group_id,
                    new_expense(&format!("Round {i}"), 3_00, payer, &["Alice", "Bob", "Carol"]),
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let group = engine.group(group_id).await.unwrap();
    assert_eq!(engine.list_expenses(group_id).await.unwrap().len(), 12);
    assert_eq!(group.total.cents(), 36_00);
    assert!(group.balances.is_settled());
}
