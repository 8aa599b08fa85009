use uuid::Uuid;

use crate::{CategoryAggregator, CategoryBreakdown, ResultEngine, Settlement, SettlementPlanner};

use super::{Engine, expenses::load_expenses, groups::load_group};

impl Engine {
    /// Who pays whom, planned from the group's persisted balances.
    ///
    /// Never stored: every call plans again from the latest balances.
    pub async fn settlements(&self, group_id: Uuid) -> ResultEngine<Vec<Settlement>> {
        let group = load_group(&self.database, group_id).await?;
        Ok(SettlementPlanner.plan(&group.balances))
    }

    /// Per-category balances and settlements computed from the live ledger,
    /// plus the whole-group report.
    pub async fn settlements_by_category(&self, group_id: Uuid) -> ResultEngine<CategoryBreakdown> {
        let group = load_group(&self.database, group_id).await?;
        let ledger = load_expenses(&self.database, group_id).await?;
        Ok(CategoryAggregator::default().breakdown(&group.members, &ledger))
    }
}
