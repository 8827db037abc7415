// src/services/crm_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CrmRepository,
    models::crm::{
        ActivityType, Deal, DealActivity, DealChanges, DealDraft, DealFilter, DealList,
        DealMetrics, DealStage, Lead, LeadDraft, StageTransition,
    },
    services::pipeline_board::PipelineBoard,
};

/// Number of entries returned by the global activity feed.
pub const RECENT_ACTIVITY_LIMIT: i64 = 50;

// Starting values for a deal created from a lead.
const CONVERTED_DEAL_PROBABILITY: i32 = 10;
const CONVERTED_DEAL_LEAD_SCORE: i32 = 50;

fn deal_not_found(id: Uuid) -> AppError {
    AppError::ResourceNotFound(format!("Deal {} not found", id))
}

fn lead_not_found(id: Uuid) -> AppError {
    AppError::ResourceNotFound(format!("Lead {} not found", id))
}

fn unknown_owner(id: Uuid) -> AppError {
    AppError::BadRequest(format!("Owner {} is not a known user.", id))
}

/// Applies the probability a closing stage forces.
fn normalize_draft(mut draft: DealDraft) -> DealDraft {
    if let Some(probability) = draft.stage.forced_probability() {
        draft.probability = probability;
    }
    draft
}

fn stage_change_description(from: DealStage, to: DealStage) -> String {
    format!("Stage changed from {} to {}", from.display_name(), to.display_name())
}

#[derive(Clone)]
pub struct CrmService {
    repo: CrmRepository,
}

impl CrmService {
    pub fn new(repo: CrmRepository) -> Self {
        Self { repo }
    }

    // =========================================================================
    //  STAGE TRANSITION
    // =========================================================================

    /// Moves a deal to `to` inside one transaction: lock the row, update
    /// stage/status/probability, append a STAGE_CHANGE activity and recompute
    /// the pipeline metrics. A drop onto the current stage writes nothing.
    pub async fn transition_stage<'e, E>(
        &self,
        executor: E,
        deal_id: Uuid,
        to: DealStage,
        user_id: Uuid,
    ) -> Result<StageTransition, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self
            .repo
            .lock_deal(&mut *tx, deal_id)
            .await?
            .ok_or_else(|| deal_not_found(deal_id))?;

        if current.stage == to {
            let metrics = DealMetrics::from_rows(&self.repo.stage_aggregates(&mut *tx).await?);
            tx.commit().await?;
            return Ok(StageTransition {
                deal: current,
                activity: None,
                metrics,
            });
        }

        let probability = to.forced_probability().unwrap_or(current.probability);
        let deal = self
            .repo
            .update_stage(&mut *tx, deal_id, to, to.status(), probability)
            .await?;

        let activity = self
            .repo
            .insert_activity(
                &mut *tx,
                deal_id,
                ActivityType::StageChange,
                &stage_change_description(current.stage, to),
                Some(current.stage),
                Some(to),
                Some(user_id),
            )
            .await?;

        let metrics = DealMetrics::from_rows(&self.repo.stage_aggregates(&mut *tx).await?);

        tx.commit().await?;

        tracing::info!(
            %deal_id,
            %user_id,
            from = %current.stage,
            to = %to,
            "Deal stage changed"
        );

        Ok(StageTransition {
            deal,
            activity: Some(activity),
            metrics,
        })
    }

    // =========================================================================
    //  DEALS
    // =========================================================================

    pub async fn list_deals<'e, E>(&self, executor: E, filter: &DealFilter) -> Result<DealList, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let deals = self.repo.list_deals(&mut *conn, filter).await?;
        let metrics = DealMetrics::from_rows(&self.repo.stage_aggregates(&mut *conn).await?);

        Ok(DealList { deals, metrics })
    }

    pub async fn pipeline_board<'e, E>(
        &self,
        executor: E,
        search: Option<&str>,
    ) -> Result<PipelineBoard, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deals = self.repo.list_deals(executor, &DealFilter::default()).await?;
        let board = PipelineBoard::from_deals(deals);

        Ok(match search {
            Some(query) => board.search(query),
            None => board,
        })
    }

    pub async fn get_deal<'e, E>(&self, executor: E, id: Uuid) -> Result<Deal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_deal(executor, id)
            .await?
            .ok_or_else(|| deal_not_found(id))
    }

    pub async fn create_deal<'e, E>(&self, executor: E, draft: DealDraft) -> Result<Deal, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let draft = normalize_draft(draft);
        let mut tx = executor.begin().await?;

        if let Some(lead_id) = draft.lead_id {
            self.repo
                .find_lead(&mut *tx, lead_id)
                .await?
                .ok_or_else(|| lead_not_found(lead_id))?;
        }
        if !self.repo.user_exists(&mut *tx, draft.owner_id).await? {
            return Err(unknown_owner(draft.owner_id));
        }

        let deal = self.repo.create_deal(&mut *tx, &draft).await?;
        self.repo
            .insert_activity(
                &mut *tx,
                deal.id,
                ActivityType::Note,
                "Deal created",
                None,
                Some(deal.stage),
                Some(draft.owner_id),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(deal_id = %deal.id, stage = %deal.stage, "Deal created");
        Ok(deal)
    }

    /// Form edit merged over the locked row. A stage change made here is
    /// audited like a board move.
    pub async fn update_deal<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        changes: DealChanges,
        user_id: Uuid,
    ) -> Result<Deal, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self
            .repo
            .lock_deal(&mut *tx, id)
            .await?
            .ok_or_else(|| deal_not_found(id))?;

        let draft = normalize_draft(changes.apply_to(&current));

        if let Some(lead_id) = draft.lead_id.filter(|lead_id| Some(*lead_id) != current.lead_id) {
            self.repo
                .find_lead(&mut *tx, lead_id)
                .await?
                .ok_or_else(|| lead_not_found(lead_id))?;
        }
        if draft.owner_id != current.owner_id
            && !self.repo.user_exists(&mut *tx, draft.owner_id).await?
        {
            return Err(unknown_owner(draft.owner_id));
        }

        let deal = self
            .repo
            .update_deal(&mut *tx, id, &draft)
            .await?
            .ok_or_else(|| deal_not_found(id))?;

        if current.stage != deal.stage {
            self.repo
                .insert_activity(
                    &mut *tx,
                    id,
                    ActivityType::StageChange,
                    &stage_change_description(current.stage, deal.stage),
                    Some(current.stage),
                    Some(deal.stage),
                    Some(user_id),
                )
                .await?;
        }

        tx.commit().await?;
        Ok(deal)
    }

    pub async fn delete_deal<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.repo.delete_deal(executor, id).await? {
            return Err(deal_not_found(id));
        }
        tracing::info!(deal_id = %id, "Deal deleted");
        Ok(())
    }

    // =========================================================================
    //  ACTIVITIES
    // =========================================================================

    pub async fn list_activities<'e, E>(
        &self,
        executor: E,
        deal_id: Uuid,
    ) -> Result<Vec<DealActivity>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        self.repo
            .find_deal(&mut *conn, deal_id)
            .await?
            .ok_or_else(|| deal_not_found(deal_id))?;

        self.repo.list_activities(&mut *conn, deal_id).await
    }

    pub async fn recent_activities<'e, E>(&self, executor: E) -> Result<Vec<DealActivity>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .list_recent_activities(executor, RECENT_ACTIVITY_LIMIT)
            .await
    }

    /// Logs a manual note/call/email/meeting. Stage changes are only recorded
    /// by the stage transition itself.
    pub async fn add_activity<'e, E>(
        &self,
        executor: E,
        deal_id: Uuid,
        activity_type: ActivityType,
        description: &str,
        user_id: Uuid,
    ) -> Result<DealActivity, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if activity_type == ActivityType::StageChange {
            return Err(AppError::BadRequest(
                "Stage changes are recorded through the stage endpoint.".into(),
            ));
        }

        let mut conn = executor.acquire().await?;

        self.repo
            .find_deal(&mut *conn, deal_id)
            .await?
            .ok_or_else(|| deal_not_found(deal_id))?;

        self.repo
            .insert_activity(
                &mut *conn,
                deal_id,
                activity_type,
                description,
                None,
                None,
                Some(user_id),
            )
            .await
    }

    // =========================================================================
    //  LEADS
    // =========================================================================

    pub async fn list_leads<'e, E>(&self, executor: E) -> Result<Vec<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_leads(executor).await
    }

    pub async fn get_lead<'e, E>(&self, executor: E, id: Uuid) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_lead(executor, id)
            .await?
            .ok_or_else(|| lead_not_found(id))
    }

    pub async fn create_lead<'e, E>(&self, executor: E, draft: &LeadDraft) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.create_lead(executor, draft).await
    }

    /// Marks the lead CONVERTED and opens a NEW_LEAD deal for it.
    pub async fn convert_lead<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Deal, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let lead = match self.repo.mark_lead_converted(&mut *tx, lead_id).await? {
            Some(lead) => lead,
            None => {
                return match self.repo.find_lead(&mut *tx, lead_id).await? {
                    Some(_) => Err(AppError::UniqueConstraintViolation(format!(
                        "Lead {} has already been converted",
                        lead_id
                    ))),
                    None => Err(lead_not_found(lead_id)),
                };
            }
        };

        let title = match lead.system_size_kw {
            Some(kw) => format!("{} - {}kW solar", lead.name, kw.normalize()),
            None => lead.name.clone(),
        };

        let draft = DealDraft {
            title,
            value: Default::default(),
            probability: CONVERTED_DEAL_PROBABILITY,
            stage: DealStage::NewLead,
            lead_score: CONVERTED_DEAL_LEAD_SCORE,
            expected_close_date: None,
            lead_id: Some(lead.id),
            owner_id,
        };

        let deal = self.repo.create_deal(&mut *tx, &draft).await?;
        self.repo
            .insert_activity(
                &mut *tx,
                deal.id,
                ActivityType::Note,
                &format!("Converted from lead {}", lead.name),
                None,
                Some(DealStage::NewLead),
                Some(owner_id),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(%lead_id, deal_id = %deal.id, "Lead converted");
        Ok(deal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn draft(stage: DealStage, probability: i32) -> DealDraft {
        DealDraft {
            title: "Nguyen - 10kW".into(),
            value: Decimal::from(14_000),
            probability,
            stage,
            lead_score: 70,
            expected_close_date: None,
            lead_id: None,
            owner_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn closing_stages_force_probability() {
        assert_eq!(normalize_draft(draft(DealStage::Won, 35)).probability, 100);
        assert_eq!(normalize_draft(draft(DealStage::Lost, 35)).probability, 0);
        assert_eq!(normalize_draft(draft(DealStage::Negotiation, 35)).probability, 35);
        assert_eq!(normalize_draft(draft(DealStage::OnHold, 35)).probability, 35);
    }

    #[test]
    fn missing_references_are_caller_errors() {
        let id = Uuid::new_v4();
        assert_eq!(unknown_owner(id).status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(lead_not_found(id).status_code(), axum::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn omitted_stage_does_not_reopen_a_won_deal() {
        let mut current_draft = draft(DealStage::Won, 100);
        current_draft.lead_id = Some(Uuid::new_v4());
        let now = chrono::Utc::now();
        let current = Deal {
            id: Uuid::new_v4(),
            title: current_draft.title.clone(),
            value: current_draft.value,
            probability: 100,
            stage: DealStage::Won,
            status: DealStage::Won.status(),
            lead_score: 70,
            expected_close_date: None,
            lead_id: current_draft.lead_id,
            owner_id: current_draft.owner_id,
            created_at: now,
            updated_at: now,
            lead_name: None,
            lead_email: None,
            lead_phone: None,
        };

        let changes = DealChanges {
            value: Some(Decimal::from(15_500)),
            ..Default::default()
        };
        let merged = normalize_draft(changes.apply_to(&current));

        assert_eq!(merged.stage, DealStage::Won);
        assert_eq!(merged.probability, 100);
        assert_eq!(merged.owner_id, current.owner_id);
        assert_eq!(merged.value, Decimal::from(15_500));
    }

    #[test]
    fn stage_change_description_uses_column_titles() {
        assert_eq!(
            stage_change_description(DealStage::Contacted, DealStage::QuoteSent),
            "Stage changed from Contacted to Quote Sent"
        );
    }
}
