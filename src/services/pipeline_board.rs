// src/services/pipeline_board.rs

use std::future::Future;

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::crm::{Deal, DealStage},
};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PipelineColumn {
    pub stage: DealStage,
    #[schema(example = "Quote Sent")]
    pub title: String,
    pub deal_count: usize,
    pub total_value: Decimal,
    pub deals: Vec<Deal>,
}

impl PipelineColumn {
    fn new(stage: DealStage) -> Self {
        Self {
            stage,
            title: stage.display_name().to_string(),
            deal_count: 0,
            total_value: Decimal::ZERO,
            deals: Vec::new(),
        }
    }

    fn refresh_totals(&mut self) {
        self.deal_count = self.deals.len();
        self.total_value = self.deals.iter().map(|d| d.value).sum();
    }
}

/// Board state captured before a move, used to undo it.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSnapshot(Vec<PipelineColumn>);

/// Kanban view of the deal pipeline: one column per canonical stage.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PipelineBoard {
    pub columns: Vec<PipelineColumn>,
}

impl PipelineBoard {
    /// Groups deals by stage, keeping their incoming order inside each column.
    pub fn from_deals(deals: impl IntoIterator<Item = Deal>) -> Self {
        let mut columns: Vec<PipelineColumn> =
            DealStage::ALL.into_iter().map(PipelineColumn::new).collect();

        for deal in deals {
            if let Some(column) = columns.iter_mut().find(|c| c.stage == deal.stage) {
                column.deals.push(deal);
            }
        }
        columns.iter_mut().for_each(PipelineColumn::refresh_totals);

        Self { columns }
    }

    pub fn total_deals(&self) -> usize {
        self.columns.iter().map(|c| c.deal_count).sum()
    }

    pub fn total_value(&self) -> Decimal {
        self.columns.iter().map(|c| c.total_value).sum()
    }

    pub fn column(&self, stage: DealStage) -> Option<&PipelineColumn> {
        self.columns.iter().find(|c| c.stage == stage)
    }

    /// Case-insensitive match on title, lead name, lead email or lead phone.
    /// An empty query keeps every deal.
    pub fn search(&self, query: &str) -> PipelineBoard {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.clone();
        }

        let matches = |deal: &Deal| {
            let field = |v: Option<&str>| v.is_some_and(|v| v.to_lowercase().contains(&needle));
            field(Some(&deal.title))
                || field(deal.lead_name.as_deref())
                || field(deal.lead_email.as_deref())
                || field(deal.lead_phone.as_deref())
        };

        let columns = self
            .columns
            .iter()
            .map(|column| {
                let mut filtered = PipelineColumn::new(column.stage);
                filtered.deals = column.deals.iter().filter(|d| matches(*d)).cloned().collect();
                filtered.refresh_totals();
                filtered
            })
            .collect();

        PipelineBoard { columns }
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot(self.columns.clone())
    }

    pub fn restore(&mut self, snapshot: BoardSnapshot) {
        self.columns = snapshot.0;
    }

    /// Moves a deal to the top of the `to` column, applying the same
    /// status/probability rules as the server. Returns the pre-move state.
    pub fn move_deal(&mut self, deal_id: Uuid, to: DealStage) -> Result<BoardSnapshot, AppError> {
        let snapshot = self.snapshot();

        let (from_idx, deal_idx) = self
            .columns
            .iter()
            .enumerate()
            .find_map(|(ci, c)| c.deals.iter().position(|d| d.id == deal_id).map(|di| (ci, di)))
            .ok_or_else(|| AppError::ResourceNotFound(format!("Deal {} is not on the board", deal_id)))?;

        if self.columns[from_idx].stage == to {
            return Ok(snapshot);
        }

        let mut deal = self.columns[from_idx].deals.remove(deal_idx);
        self.columns[from_idx].refresh_totals();

        deal.stage = to;
        deal.status = to.status();
        if let Some(probability) = to.forced_probability() {
            deal.probability = probability;
        }

        if let Some(target) = self.columns.iter_mut().find(|c| c.stage == to) {
            target.deals.insert(0, deal);
            target.refresh_totals();
        }

        Ok(snapshot)
    }

    /// Applies the move locally, then awaits `commit`. On failure the board
    /// goes back to its pre-move state and the commit error is returned as is.
    pub async fn move_optimistically<T, F, Fut>(
        &mut self,
        deal_id: Uuid,
        to: DealStage,
        commit: F,
    ) -> Result<T, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let snapshot = self.move_deal(deal_id, to)?;

        match commit().await {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(%deal_id, stage = %to, "Stage change rejected, restoring board: {}", e);
                self.restore(snapshot);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::crm::DealStatus;
    use chrono::Utc;

    fn deal(title: &str, stage: DealStage, value: i64) -> Deal {
        let now = Utc::now();
        Deal {
            id: Uuid::new_v4(),
            title: title.to_string(),
            value: Decimal::from(value),
            probability: 40,
            stage,
            status: stage.status(),
            lead_score: 60,
            expected_close_date: None,
            lead_id: None,
            owner_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            lead_name: Some(format!("{} Lead", title)),
            lead_email: Some(format!("{}@example.com", title.to_lowercase())),
            lead_phone: Some("0400 111 222".to_string()),
        }
    }

    fn board() -> (PipelineBoard, Uuid) {
        let a = deal("Smith", DealStage::NewLead, 9_000);
        let b = deal("Jones", DealStage::QuoteSent, 12_500);
        let c = deal("Brown", DealStage::QuoteSent, 7_500);
        let id = b.id;
        (PipelineBoard::from_deals(vec![a, b, c]), id)
    }

    #[test]
    fn groups_into_every_stage_in_board_order() {
        let (board, _) = board();

        let stages: Vec<_> = board.columns.iter().map(|c| c.stage).collect();
        assert_eq!(stages, DealStage::ALL.to_vec());

        let quotes = board.column(DealStage::QuoteSent).unwrap();
        assert_eq!(quotes.deal_count, 2);
        assert_eq!(quotes.total_value, Decimal::from(20_000));
        assert_eq!(board.column(DealStage::Won).unwrap().deal_count, 0);
        assert_eq!(board.total_deals(), 3);
        assert_eq!(board.total_value(), Decimal::from(29_000));
    }

    #[test]
    fn search_matches_lead_fields_case_insensitively() {
        let (board, _) = board();

        assert_eq!(board.search("JONES@EXAMPLE").total_deals(), 1);
        assert_eq!(board.search("brown lead").total_deals(), 1);
        assert_eq!(board.search("0400").total_deals(), 3);
        assert_eq!(board.search("  ").total_deals(), 3);
        assert_eq!(board.search("nobody").total_deals(), 0);
    }

    #[test]
    fn move_to_won_forces_status_and_probability_and_restore_undoes_it() {
        let (mut board, id) = board();
        let before = board.clone();

        let snapshot = board.move_deal(id, DealStage::Won).unwrap();

        let won = board.column(DealStage::Won).unwrap();
        assert_eq!(won.deal_count, 1);
        assert_eq!(won.deals[0].status, DealStatus::Won);
        assert_eq!(won.deals[0].probability, 100);
        assert_eq!(board.column(DealStage::QuoteSent).unwrap().total_value, Decimal::from(7_500));

        board.restore(snapshot);
        assert_eq!(board, before);
    }

    #[test]
    fn moving_an_unknown_deal_fails_without_changes() {
        let (mut board, _) = board();
        let before = board.clone();

        let err = board.move_deal(Uuid::new_v4(), DealStage::Lost).unwrap_err();
        assert!(matches!(err, AppError::ResourceNotFound(_)));
        assert_eq!(board, before);
    }

    #[tokio::test]
    async fn failed_commit_restores_the_snapshot() {
        let (mut board, id) = board();
        let before = board.clone();

        let result: Result<(), AppError> = board
            .move_optimistically(id, DealStage::Lost, || async {
                Err(AppError::BadRequest("rejected".into()))
            })
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(ref m)) if m == "rejected"));
        assert_eq!(board, before);
    }

    #[tokio::test]
    async fn successful_commit_keeps_the_move() {
        let (mut board, id) = board();

        let value = board
            .move_optimistically(id, DealStage::Negotiation, || async { Ok(42) })
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(board.column(DealStage::Negotiation).unwrap().deals[0].id, id);
    }
}
