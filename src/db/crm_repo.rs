// src/db/crm_repo.rs

use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::crm::{
        ActivityType, Deal, DealActivity, DealDraft, DealFilter, DealStage, DealStatus, Lead,
        LeadDraft, LeadStatus, StageAggregateRow,
    },
};

// Deal columns plus the joined lead contact, for the dynamic list query.
const DEAL_COLUMNS: &str = r#"
    d.id, d.title, d.value, d.probability, d.stage, d.status, d.lead_score,
    d.expected_close_date, d.lead_id, d.owner_id, d.created_at, d.updated_at,
    l.name AS lead_name, l.email AS lead_email, l.phone AS lead_phone
"#;

const DEAL_REFERENCE_ERROR: &str = "The deal's owner or lead does not exist.";

#[derive(Clone, Default)]
pub struct CrmRepository;

impl CrmRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  DEALS
    // =========================================================================

    pub async fn list_deals<'e, E>(
        &self,
        executor: E,
        filter: &DealFilter,
    ) -> Result<Vec<Deal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM deals d LEFT JOIN leads l ON l.id = d.lead_id WHERE TRUE",
            DEAL_COLUMNS
        ));

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search);
            qb.push(" AND (d.title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR l.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR l.email ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR l.phone ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(stage) = filter.stage {
            qb.push(" AND d.stage = ").push_bind(stage);
        }
        if let Some(status) = filter.status {
            qb.push(" AND d.status = ").push_bind(status);
        }

        // Column and keyword come from closed enums, never from user text.
        qb.push(format!(
            " ORDER BY {} {}, d.id",
            filter.sort_by.column(),
            filter.sort_order.keyword()
        ));

        let deals = qb.build_query_as::<Deal>().fetch_all(executor).await?;
        Ok(deals)
    }

    pub async fn find_deal<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Deal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deal = sqlx::query_as!(
            Deal,
            r#"
            SELECT
                d.id as "id!", d.title as "title!", d.value as "value!",
                d.probability as "probability!",
                d.stage as "stage!: DealStage", d.status as "status!: DealStatus",
                d.lead_score as "lead_score!", d.expected_close_date, d.lead_id,
                d.owner_id as "owner_id!", d.created_at as "created_at!",
                d.updated_at as "updated_at!",
                l.name as "lead_name?", l.email as "lead_email?", l.phone as "lead_phone?"
            FROM deals d
            LEFT JOIN leads l ON l.id = d.lead_id
            WHERE d.id = $1
            "#,
            id
        )
        .fetch_optional(executor)
        .await?;
        Ok(deal)
    }

    /// Same as `find_deal` but locks the deal row until the transaction ends.
    pub async fn lock_deal<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Deal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deal = sqlx::query_as!(
            Deal,
            r#"
            SELECT
                d.id as "id!", d.title as "title!", d.value as "value!",
                d.probability as "probability!",
                d.stage as "stage!: DealStage", d.status as "status!: DealStatus",
                d.lead_score as "lead_score!", d.expected_close_date, d.lead_id,
                d.owner_id as "owner_id!", d.created_at as "created_at!",
                d.updated_at as "updated_at!",
                l.name as "lead_name?", l.email as "lead_email?", l.phone as "lead_phone?"
            FROM deals d
            LEFT JOIN leads l ON l.id = d.lead_id
            WHERE d.id = $1
            FOR UPDATE OF d
            "#,
            id
        )
        .fetch_optional(executor)
        .await?;
        Ok(deal)
    }

    pub async fn create_deal<'e, E>(&self, executor: E, draft: &DealDraft) -> Result<Deal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deal = sqlx::query_as!(
            Deal,
            r#"
            WITH d AS (
                INSERT INTO deals (
                    title, value, probability, stage, status, lead_score,
                    expected_close_date, lead_id, owner_id
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
            )
            SELECT
                d.id as "id!", d.title as "title!", d.value as "value!",
                d.probability as "probability!",
                d.stage as "stage!: DealStage", d.status as "status!: DealStatus",
                d.lead_score as "lead_score!", d.expected_close_date, d.lead_id,
                d.owner_id as "owner_id!", d.created_at as "created_at!",
                d.updated_at as "updated_at!",
                l.name as "lead_name?", l.email as "lead_email?", l.phone as "lead_phone?"
            FROM d
            LEFT JOIN leads l ON l.id = d.lead_id
            "#,
            draft.title,
            draft.value,
            draft.probability,
            draft.stage as DealStage,
            draft.stage.status() as DealStatus,
            draft.lead_score,
            draft.expected_close_date,
            draft.lead_id,
            draft.owner_id
        )
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_foreign_key_violation(e, DEAL_REFERENCE_ERROR))?;
        Ok(deal)
    }

    pub async fn update_deal<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        draft: &DealDraft,
    ) -> Result<Option<Deal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deal = sqlx::query_as!(
            Deal,
            r#"
            WITH d AS (
                UPDATE deals
                SET title = $2, value = $3, probability = $4, stage = $5, status = $6,
                    lead_score = $7, expected_close_date = $8, lead_id = $9, owner_id = $10,
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT
                d.id as "id!", d.title as "title!", d.value as "value!",
                d.probability as "probability!",
                d.stage as "stage!: DealStage", d.status as "status!: DealStatus",
                d.lead_score as "lead_score!", d.expected_close_date, d.lead_id,
                d.owner_id as "owner_id!", d.created_at as "created_at!",
                d.updated_at as "updated_at!",
                l.name as "lead_name?", l.email as "lead_email?", l.phone as "lead_phone?"
            FROM d
            LEFT JOIN leads l ON l.id = d.lead_id
            "#,
            id,
            draft.title,
            draft.value,
            draft.probability,
            draft.stage as DealStage,
            draft.stage.status() as DealStatus,
            draft.lead_score,
            draft.expected_close_date,
            draft.lead_id,
            draft.owner_id
        )
        .fetch_optional(executor)
        .await
        .map_err(|e| AppError::from_foreign_key_violation(e, DEAL_REFERENCE_ERROR))?;
        Ok(deal)
    }

    pub async fn update_stage<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        stage: DealStage,
        status: DealStatus,
        probability: i32,
    ) -> Result<Deal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deal = sqlx::query_as!(
            Deal,
            r#"
            WITH d AS (
                UPDATE deals
                SET stage = $2, status = $3, probability = $4, updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT
                d.id as "id!", d.title as "title!", d.value as "value!",
                d.probability as "probability!",
                d.stage as "stage!: DealStage", d.status as "status!: DealStatus",
                d.lead_score as "lead_score!", d.expected_close_date, d.lead_id,
                d.owner_id as "owner_id!", d.created_at as "created_at!",
                d.updated_at as "updated_at!",
                l.name as "lead_name?", l.email as "lead_email?", l.phone as "lead_phone?"
            FROM d
            LEFT JOIN leads l ON l.id = d.lead_id
            "#,
            id,
            stage as DealStage,
            status as DealStatus,
            probability
        )
        .fetch_one(executor)
        .await?;
        Ok(deal)
    }

    pub async fn delete_deal<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query!("DELETE FROM deals WHERE id = $1", id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count and value per (stage, status) pair.
    pub async fn stage_aggregates<'e, E>(
        &self,
        executor: E,
    ) -> Result<Vec<StageAggregateRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as!(
            StageAggregateRow,
            r#"
            SELECT stage as "stage!: DealStage", status as "status!: DealStatus",
                   COUNT(*) as "deal_count!",
                   COALESCE(SUM(value), 0) as "total_value!"
            FROM deals
            GROUP BY stage, status
            "#
        )
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn user_exists<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar!(
            r#"SELECT EXISTS(SELECT 1 FROM users WHERE id = $1) as "exists!""#,
            id
        )
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    // =========================================================================
    //  ACTIVITIES
    // =========================================================================

    pub async fn insert_activity<'e, E>(
        &self,
        executor: E,
        deal_id: Uuid,
        activity_type: ActivityType,
        description: &str,
        from_stage: Option<DealStage>,
        to_stage: Option<DealStage>,
        user_id: Option<Uuid>,
    ) -> Result<DealActivity, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let activity = sqlx::query_as!(
            DealActivity,
            r#"
            INSERT INTO deal_activities (
                deal_id, activity_type, description, from_stage, to_stage, user_id
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING
                id, deal_id,
                activity_type as "activity_type: ActivityType",
                description,
                from_stage as "from_stage: DealStage",
                to_stage as "to_stage: DealStage",
                user_id, created_at
            "#,
            deal_id,
            activity_type as ActivityType,
            description,
            from_stage as Option<DealStage>,
            to_stage as Option<DealStage>,
            user_id
        )
        .fetch_one(executor)
        .await?;
        Ok(activity)
    }

    pub async fn list_activities<'e, E>(
        &self,
        executor: E,
        deal_id: Uuid,
    ) -> Result<Vec<DealActivity>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let activities = sqlx::query_as!(
            DealActivity,
            r#"
            SELECT
                id, deal_id,
                activity_type as "activity_type: ActivityType",
                description,
                from_stage as "from_stage: DealStage",
                to_stage as "to_stage: DealStage",
                user_id, created_at
            FROM deal_activities
            WHERE deal_id = $1
            ORDER BY created_at DESC
            "#,
            deal_id
        )
        .fetch_all(executor)
        .await?;
        Ok(activities)
    }

    pub async fn list_recent_activities<'e, E>(
        &self,
        executor: E,
        limit: i64,
    ) -> Result<Vec<DealActivity>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let activities = sqlx::query_as!(
            DealActivity,
            r#"
            SELECT
                id, deal_id,
                activity_type as "activity_type: ActivityType",
                description,
                from_stage as "from_stage: DealStage",
                to_stage as "to_stage: DealStage",
                user_id, created_at
            FROM deal_activities
            ORDER BY created_at DESC
            LIMIT $1
            "#,
            limit
        )
        .fetch_all(executor)
        .await?;
        Ok(activities)
    }

    // =========================================================================
    //  LEADS
    // =========================================================================

    pub async fn list_leads<'e, E>(&self, executor: E) -> Result<Vec<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let leads = sqlx::query_as!(
            Lead,
            r#"
            SELECT
                id, name, email, phone, address, system_size_kw, battery_size_kwh,
                status as "status: LeadStatus",
                created_at, updated_at
            FROM leads
            ORDER BY created_at DESC
            "#
        )
        .fetch_all(executor)
        .await?;
        Ok(leads)
    }

    pub async fn find_lead<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as!(
            Lead,
            r#"
            SELECT
                id, name, email, phone, address, system_size_kw, battery_size_kwh,
                status as "status: LeadStatus",
                created_at, updated_at
            FROM leads
            WHERE id = $1
            "#,
            id
        )
        .fetch_optional(executor)
        .await?;
        Ok(lead)
    }

    pub async fn create_lead<'e, E>(&self, executor: E, draft: &LeadDraft) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as!(
            Lead,
            r#"
            INSERT INTO leads (name, email, phone, address, system_size_kw, battery_size_kwh)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING
                id, name, email, phone, address, system_size_kw, battery_size_kwh,
                status as "status: LeadStatus",
                created_at, updated_at
            "#,
            draft.name,
            draft.email.as_deref(),
            draft.phone.as_deref(),
            draft.address.as_deref(),
            draft.system_size_kw,
            draft.battery_size_kwh
        )
        .fetch_one(executor)
        .await?;
        Ok(lead)
    }

    /// Flags the lead as converted. Returns `None` when it was already
    /// converted (or does not exist), so two conversions cannot both win.
    pub async fn mark_lead_converted<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as!(
            Lead,
            r#"
            UPDATE leads
            SET status = 'CONVERTED', updated_at = NOW()
            WHERE id = $1 AND status <> 'CONVERTED'
            RETURNING
                id, name, email, phone, address, system_size_kw, battery_size_kwh,
                status as "status: LeadStatus",
                created_at, updated_at
            "#,
            id
        )
        .fetch_optional(executor)
        .await?;
        Ok(lead)
    }
}
