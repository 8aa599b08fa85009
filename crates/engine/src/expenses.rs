//! The module contains the `Expense` record and its storage model.

use std::{collections::HashSet, fmt};

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{EngineError, Member, MemberSet, MoneyCents, ResultEngine, expense_splits};

/// Label used for expenses without an explicit category.
pub const DEFAULT_CATEGORY: &str = "General";

/// Largest accepted expense amount: 100 billion in major units.
pub const MAX_EXPENSE_AMOUNT: MoneyCents = MoneyCents::new(10_000_000_000_000);

/// Expense category label.
///
/// Absent or blank labels normalize to [`DEFAULT_CATEGORY`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Category(String);

impl Category {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|s| !s.is_empty()) {
            Some(label) => Self(label.to_string()),
            None => Self::default(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Category {
    fn default() -> Self {
        Self(DEFAULT_CATEGORY.to_string())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Self::parse(Some(value))
    }
}

/// A shared expense: `paid_by` paid `amount`, owed equally by every member
/// of `split_between`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expense {
    pub id: Uuid,
    pub group_id: Uuid,
    pub title: String,
    pub amount: MoneyCents,
    pub paid_by: Member,
    pub split_between: Vec<Member>,
    pub category: Category,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        group_id: Uuid,
        title: impl Into<String>,
        amount: MoneyCents,
        paid_by: Member,
        split_between: Vec<Member>,
        category: Category,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            title: title.into(),
            amount,
            paid_by,
            split_between,
            category,
            created_at: Utc::now(),
        }
    }
}

/// Unvalidated input for a new expense.
#[derive(Clone, Debug)]
pub struct NewExpense {
    pub title: String,
    pub amount: MoneyCents,
    pub paid_by: String,
    pub split_between: Vec<String>,
    pub category: Option<String>,
}

impl NewExpense {
    /// Checks the expense against the group's member set and builds the
    /// record to store.
    ///
    /// This is the validation boundary: the balance computation trusts its
    /// input, so every member reference is resolved here.
    pub fn validate(self, group_id: Uuid, members: &MemberSet) -> ResultEngine<Expense> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(EngineError::InvalidName(
                "expense title is required".to_string(),
            ));
        }
        if !self.amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }
        if self.amount > MAX_EXPENSE_AMOUNT {
            return Err(EngineError::InvalidAmount(format!(
                "amount must be <= {MAX_EXPENSE_AMOUNT}"
            )));
        }

        let paid_by = Member::parse(&self.paid_by)?;
        if !members.contains(&paid_by) {
            return Err(EngineError::InvalidMember(format!(
                "paid_by must be a group member: {paid_by}"
            )));
        }

        if self.split_between.is_empty() {
            return Err(EngineError::EmptySplit(
                "split_between must have at least 1 member".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        let mut split_between = Vec::with_capacity(self.split_between.len());
        for raw in &self.split_between {
            let member = Member::parse(raw)?;
            if !members.contains(&member) {
                return Err(EngineError::InvalidMember(format!(
                    "invalid split member: {member}"
                )));
            }
            if !seen.insert(member.clone()) {
                return Err(EngineError::InvalidMember(format!(
                    "duplicate split member: {member}"
                )));
            }
            split_between.push(member);
        }

        Ok(Expense::new(
            group_id,
            title,
            self.amount,
            paid_by,
            split_between,
            Category::parse(self.category.as_deref()),
        ))
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub group_id: Uuid,
    pub title: String,
    pub amount_minor: i64,
    pub paid_by: String,
    pub category: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Groups,
    #[sea_orm(has_many = "super::expense_splits::Entity")]
    Splits,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl Related<super::expense_splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Splits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<(Model, Vec<expense_splits::Model>)> for Expense {
    fn from((model, mut splits): (Model, Vec<expense_splits::Model>)) -> Self {
        splits.sort_by_key(|split| split.position);
        Self {
            id: model.id,
            group_id: model.group_id,
            title: model.title,
            amount: MoneyCents::new(model.amount_minor),
            paid_by: Member::from_stored(model.paid_by),
            split_between: splits
                .into_iter()
                .map(|split| Member::from_stored(split.member))
                .collect(),
            category: Category::parse(Some(&model.category)),
            created_at: model.created_at,
        }
    }
}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        use sea_orm::ActiveValue;

        Self {
            id: ActiveValue::Set(expense.id),
            group_id: ActiveValue::Set(expense.group_id),
            title: ActiveValue::Set(expense.title.clone()),
            amount_minor: ActiveValue::Set(expense.amount.cents()),
            paid_by: ActiveValue::Set(expense.paid_by.to_string()),
            category: ActiveValue::Set(expense.category.to_string()),
            created_at: ActiveValue::Set(expense.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members() -> MemberSet {
        MemberSet::try_new(["Alice", "Bob", "Carol"]).unwrap()
    }

    fn new_expense() -> NewExpense {
        NewExpense {
            title: "  Dinner ".to_string(),
            amount: MoneyCents::new(30_00),
            paid_by: "Alice".to_string(),
            split_between: vec!["Alice".to_string(), " Bob ".to_string()],
            category: None,
        }
    }

    #[test]
    fn category_defaults_to_general() {
        assert_eq!(Category::parse(None).as_str(), "General");
        assert_eq!(Category::parse(Some("   ")).as_str(), "General");
        assert_eq!(Category::parse(Some(" Food ")).as_str(), "Food");
    }

    #[test]
    fn validate_normalizes_fields() {
        let group_id = Uuid::new_v4();
        let expense = new_expense().validate(group_id, &members()).unwrap();
        assert_eq!(expense.group_id, group_id);
        assert_eq!(expense.title, "Dinner");
        assert_eq!(
            expense.split_between,
            vec![Member::from("Alice"), Member::from("Bob")]
        );
        assert_eq!(expense.category, Category::default());
    }

    #[test]
    fn validate_rejects_non_positive_amount() {
        let mut input = new_expense();
        input.amount = MoneyCents::ZERO;
        let err = input.validate(Uuid::new_v4(), &members()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }

    #[test]
    fn validate_bounds_the_amount() {
        let mut input = new_expense();
        input.amount = MAX_EXPENSE_AMOUNT;
        assert!(input.clone().validate(Uuid::new_v4(), &members()).is_ok());

        input.amount = MoneyCents::new(i64::MAX / 2 + 1);
        let err = input.validate(Uuid::new_v4(), &members()).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidAmount("amount must be <= 100000000000.00".to_string())
        );
    }

    #[test]
    fn validate_rejects_unknown_payer() {
        let mut input = new_expense();
        input.paid_by = "Mallory".to_string();
        let err = input.validate(Uuid::new_v4(), &members()).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidMember("paid_by must be a group member: Mallory".to_string())
        );
    }

    #[test]
    fn validate_rejects_empty_and_foreign_split() {
        let mut input = new_expense();
        input.split_between.clear();
        let err = input.validate(Uuid::new_v4(), &members()).unwrap_err();
        assert!(matches!(err, EngineError::EmptySplit(_)));

        let mut input = new_expense();
        input.split_between.push("Dave".to_string());
        let err = input.validate(Uuid::new_v4(), &members()).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidMember("invalid split member: Dave".to_string())
        );
    }

    #[test]
    fn validate_rejects_duplicate_split_member() {
        let mut input = new_expense();
        input.split_between.push("Bob".to_string());
        let err = input.validate(Uuid::new_v4(), &members()).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidMember("duplicate split member: Bob".to_string())
        );
    }

    #[test]
    fn validate_requires_title() {
        let mut input = new_expense();
        input.title = "   ".to_string();
        let err = input.validate(Uuid::new_v4(), &members()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidName(_)));
    }
}
