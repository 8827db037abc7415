// src/db/staff_repo.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{is_foreign_key_violation, AppError},
    models::staff::{
        CecAccreditationType, CertificationRecord, Certifications, EmploymentType,
        PerformanceReview, ReviewDraft, Staff, StaffDraft, Team,
    },
};

// One `staff_certifications` row, as the query macros see it.
struct CertificationRow {
    staff_id: Uuid,
    cec_accreditation_number: Option<String>,
    cec_accreditation_type: Option<CecAccreditationType>,
    cec_issue_date: Option<NaiveDate>,
    cec_expiry_date: Option<NaiveDate>,
    electrical_license_number: Option<String>,
    electrical_license_state: Option<String>,
    electrical_license_class: Option<String>,
    license_expiry_date: Option<NaiveDate>,
    white_card_number: Option<String>,
    white_card_issue_date: Option<NaiveDate>,
    working_at_heights: bool,
    working_at_heights_issue: Option<NaiveDate>,
    working_at_heights_expiry: Option<NaiveDate>,
    first_aid_cert: bool,
    first_aid_level: Option<String>,
    first_aid_expiry: Option<NaiveDate>,
    battery_install_cert: bool,
    battery_install_provider: Option<String>,
    battery_install_expiry: Option<NaiveDate>,
    ev_charger_cert: bool,
    ev_charger_provider: Option<String>,
    ev_charger_expiry: Option<NaiveDate>,
    solar_design_cert: bool,
    solar_design_provider: Option<String>,
    solar_design_expiry: Option<NaiveDate>,
    updated_at: DateTime<Utc>,
}

impl From<CertificationRow> for CertificationRecord {
    fn from(row: CertificationRow) -> Self {
        Self {
            staff_id: row.staff_id,
            details: Certifications {
                cec_accreditation_number: row.cec_accreditation_number,
                cec_accreditation_type: row.cec_accreditation_type,
                cec_issue_date: row.cec_issue_date,
                cec_expiry_date: row.cec_expiry_date,
                electrical_license_number: row.electrical_license_number,
                electrical_license_state: row.electrical_license_state,
                electrical_license_class: row.electrical_license_class,
                license_expiry_date: row.license_expiry_date,
                white_card_number: row.white_card_number,
                white_card_issue_date: row.white_card_issue_date,
                working_at_heights: row.working_at_heights,
                working_at_heights_issue: row.working_at_heights_issue,
                working_at_heights_expiry: row.working_at_heights_expiry,
                first_aid_cert: row.first_aid_cert,
                first_aid_level: row.first_aid_level,
                first_aid_expiry: row.first_aid_expiry,
                battery_install_cert: row.battery_install_cert,
                battery_install_provider: row.battery_install_provider,
                battery_install_expiry: row.battery_install_expiry,
                ev_charger_cert: row.ev_charger_cert,
                ev_charger_provider: row.ev_charger_provider,
                ev_charger_expiry: row.ev_charger_expiry,
                solar_design_cert: row.solar_design_cert,
                solar_design_provider: row.solar_design_provider,
                solar_design_expiry: row.solar_design_expiry,
            },
            updated_at: row.updated_at,
        }
    }
}

/// Staff writes can trip the email unique key or the team/user foreign keys.
fn staff_write_error(e: sqlx::Error, email: &str) -> AppError {
    if is_foreign_key_violation(&e) {
        return AppError::BadRequest("The linked user or team does not exist.".into());
    }
    AppError::from_unique_violation(
        e,
        format!("A staff member with email '{}' already exists.", email),
    )
}

#[derive(Clone, Default)]
pub struct StaffRepository;

impl StaffRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  STAFF
    // =========================================================================

    pub async fn list_staff<'e, E>(
        &self,
        executor: E,
        include_inactive: bool,
    ) -> Result<Vec<Staff>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let staff = sqlx::query_as!(
            Staff,
            r#"
            SELECT
                id, user_id, first_name, last_name, email, phone, position,
                employment_type as "employment_type: EmploymentType",
                hourly_rate, cost_multiplier, team_id, is_active, start_date,
                created_at, updated_at
            FROM staff
            WHERE is_active OR $1
            ORDER BY last_name ASC, first_name ASC
            "#,
            include_inactive
        )
        .fetch_all(executor)
        .await?;
        Ok(staff)
    }

    pub async fn find_staff<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Staff>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let staff = sqlx::query_as!(
            Staff,
            r#"
            SELECT
                id, user_id, first_name, last_name, email, phone, position,
                employment_type as "employment_type: EmploymentType",
                hourly_rate, cost_multiplier, team_id, is_active, start_date,
                created_at, updated_at
            FROM staff
            WHERE id = $1
            "#,
            id
        )
        .fetch_optional(executor)
        .await?;
        Ok(staff)
    }

    pub async fn create_staff<'e, E>(&self, executor: E, draft: &StaffDraft) -> Result<Staff, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as!(
            Staff,
            r#"
            INSERT INTO staff (
                user_id, first_name, last_name, email, phone, position,
                employment_type, hourly_rate, team_id, start_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING
                id, user_id, first_name, last_name, email, phone, position,
                employment_type as "employment_type: EmploymentType",
                hourly_rate, cost_multiplier, team_id, is_active, start_date,
                created_at, updated_at
            "#,
            draft.user_id,
            draft.first_name,
            draft.last_name,
            draft.email,
            draft.phone.as_deref(),
            draft.position,
            draft.employment_type as EmploymentType,
            draft.hourly_rate,
            draft.team_id,
            draft.start_date
        )
        .fetch_one(executor)
        .await
        .map_err(|e| staff_write_error(e, &draft.email))
    }

    pub async fn update_staff<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        draft: &StaffDraft,
    ) -> Result<Option<Staff>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as!(
            Staff,
            r#"
            UPDATE staff
            SET user_id = $2, first_name = $3, last_name = $4, email = $5, phone = $6,
                position = $7, employment_type = $8, hourly_rate = $9, team_id = $10,
                start_date = $11, updated_at = NOW()
            WHERE id = $1
            RETURNING
                id, user_id, first_name, last_name, email, phone, position,
                employment_type as "employment_type: EmploymentType",
                hourly_rate, cost_multiplier, team_id, is_active, start_date,
                created_at, updated_at
            "#,
            id,
            draft.user_id,
            draft.first_name,
            draft.last_name,
            draft.email,
            draft.phone.as_deref(),
            draft.position,
            draft.employment_type as EmploymentType,
            draft.hourly_rate,
            draft.team_id,
            draft.start_date
        )
        .fetch_optional(executor)
        .await
        .map_err(|e| staff_write_error(e, &draft.email))
    }

    /// Soft delete.
    pub async fn deactivate_staff<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query!(
            "UPDATE staff SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
            id
        )
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update_compensation<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        hourly_rate: Decimal,
        cost_multiplier: Option<Decimal>,
    ) -> Result<Option<Staff>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let staff = sqlx::query_as!(
            Staff,
            r#"
            UPDATE staff
            SET hourly_rate = $2, cost_multiplier = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING
                id, user_id, first_name, last_name, email, phone, position,
                employment_type as "employment_type: EmploymentType",
                hourly_rate, cost_multiplier, team_id, is_active, start_date,
                created_at, updated_at
            "#,
            id,
            hourly_rate,
            cost_multiplier
        )
        .fetch_optional(executor)
        .await?;
        Ok(staff)
    }

    pub async fn assign_team<'e, E>(
        &self,
        executor: E,
        staff_id: Uuid,
        team_id: Option<Uuid>,
    ) -> Result<Option<Staff>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let staff = sqlx::query_as!(
            Staff,
            r#"
            UPDATE staff
            SET team_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING
                id, user_id, first_name, last_name, email, phone, position,
                employment_type as "employment_type: EmploymentType",
                hourly_rate, cost_multiplier, team_id, is_active, start_date,
                created_at, updated_at
            "#,
            staff_id,
            team_id
        )
        .fetch_optional(executor)
        .await?;
        Ok(staff)
    }

    // =========================================================================
    //  TEAMS
    // =========================================================================

    pub async fn list_teams<'e, E>(&self, executor: E) -> Result<Vec<Team>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let teams = sqlx::query_as!(
            Team,
            r#"
            SELECT id, name, description, leader_id, created_at, updated_at
            FROM teams
            ORDER BY name ASC
            "#
        )
        .fetch_all(executor)
        .await?;
        Ok(teams)
    }

    pub async fn find_team<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Team>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let team = sqlx::query_as!(
            Team,
            r#"
            SELECT id, name, description, leader_id, created_at, updated_at
            FROM teams
            WHERE id = $1
            "#,
            id
        )
        .fetch_optional(executor)
        .await?;
        Ok(team)
    }

    pub async fn create_team<'e, E>(
        &self,
        executor: E,
        name: &str,
        description: Option<&str>,
        leader_id: Option<Uuid>,
    ) -> Result<Team, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as!(
            Team,
            r#"
            INSERT INTO teams (name, description, leader_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, leader_id, created_at, updated_at
            "#,
            name,
            description,
            leader_id
        )
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, format!("Team '{}' already exists.", name)))
    }

    pub async fn update_team<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
        description: Option<&str>,
        leader_id: Option<Uuid>,
    ) -> Result<Option<Team>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as!(
            Team,
            r#"
            UPDATE teams
            SET name = $2, description = $3, leader_id = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, leader_id, created_at, updated_at
            "#,
            id,
            name,
            description,
            leader_id
        )
        .fetch_optional(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, format!("Team '{}' already exists.", name)))
    }

    pub async fn delete_team<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query!("DELETE FROM teams WHERE id = $1", id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_team_members<'e, E>(
        &self,
        executor: E,
        team_id: Uuid,
    ) -> Result<Vec<Staff>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let members = sqlx::query_as!(
            Staff,
            r#"
            SELECT
                id, user_id, first_name, last_name, email, phone, position,
                employment_type as "employment_type: EmploymentType",
                hourly_rate, cost_multiplier, team_id, is_active, start_date,
                created_at, updated_at
            FROM staff
            WHERE team_id = $1 AND is_active
            ORDER BY last_name ASC, first_name ASC
            "#,
            team_id
        )
        .fetch_all(executor)
        .await?;
        Ok(members)
    }

    // =========================================================================
    //  CERTIFICATIONS
    // =========================================================================

    pub async fn find_certifications<'e, E>(
        &self,
        executor: E,
        staff_id: Uuid,
    ) -> Result<Option<CertificationRecord>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as!(
            CertificationRow,
            r#"
            SELECT
                staff_id,
                cec_accreditation_number,
                cec_accreditation_type as "cec_accreditation_type: CecAccreditationType",
                cec_issue_date, cec_expiry_date,
                electrical_license_number, electrical_license_state, electrical_license_class,
                license_expiry_date,
                white_card_number, white_card_issue_date,
                working_at_heights, working_at_heights_issue, working_at_heights_expiry,
                first_aid_cert, first_aid_level, first_aid_expiry,
                battery_install_cert, battery_install_provider, battery_install_expiry,
                ev_charger_cert, ev_charger_provider, ev_charger_expiry,
                solar_design_cert, solar_design_provider, solar_design_expiry,
                updated_at
            FROM staff_certifications
            WHERE staff_id = $1
            "#,
            staff_id
        )
        .fetch_optional(executor)
        .await?;
        Ok(row.map(CertificationRecord::from))
    }

    pub async fn list_certifications<'e, E>(
        &self,
        executor: E,
    ) -> Result<Vec<CertificationRecord>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as!(
            CertificationRow,
            r#"
            SELECT
                staff_id,
                cec_accreditation_number,
                cec_accreditation_type as "cec_accreditation_type: CecAccreditationType",
                cec_issue_date, cec_expiry_date,
                electrical_license_number, electrical_license_state, electrical_license_class,
                license_expiry_date,
                white_card_number, white_card_issue_date,
                working_at_heights, working_at_heights_issue, working_at_heights_expiry,
                first_aid_cert, first_aid_level, first_aid_expiry,
                battery_install_cert, battery_install_provider, battery_install_expiry,
                ev_charger_cert, ev_charger_provider, ev_charger_expiry,
                solar_design_cert, solar_design_provider, solar_design_expiry,
                updated_at
            FROM staff_certifications
            "#
        )
        .fetch_all(executor)
        .await?;
        Ok(rows.into_iter().map(CertificationRecord::from).collect())
    }

    /// Insert or replace the whole certification record of a staff member.
    pub async fn upsert_certifications<'e, E>(
        &self,
        executor: E,
        staff_id: Uuid,
        c: &Certifications,
    ) -> Result<CertificationRecord, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as!(
            CertificationRow,
            r#"
            INSERT INTO staff_certifications (
                staff_id,
                cec_accreditation_number, cec_accreditation_type, cec_issue_date, cec_expiry_date,
                electrical_license_number, electrical_license_state, electrical_license_class,
                license_expiry_date,
                white_card_number, white_card_issue_date,
                working_at_heights, working_at_heights_issue, working_at_heights_expiry,
                first_aid_cert, first_aid_level, first_aid_expiry,
                battery_install_cert, battery_install_provider, battery_install_expiry,
                ev_charger_cert, ev_charger_provider, ev_charger_expiry,
                solar_design_cert, solar_design_provider, solar_design_expiry
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26
            )
            ON CONFLICT (staff_id) DO UPDATE SET
                cec_accreditation_number = EXCLUDED.cec_accreditation_number,
                cec_accreditation_type = EXCLUDED.cec_accreditation_type,
                cec_issue_date = EXCLUDED.cec_issue_date,
                cec_expiry_date = EXCLUDED.cec_expiry_date,
                electrical_license_number = EXCLUDED.electrical_license_number,
                electrical_license_state = EXCLUDED.electrical_license_state,
                electrical_license_class = EXCLUDED.electrical_license_class,
                license_expiry_date = EXCLUDED.license_expiry_date,
                white_card_number = EXCLUDED.white_card_number,
                white_card_issue_date = EXCLUDED.white_card_issue_date,
                working_at_heights = EXCLUDED.working_at_heights,
                working_at_heights_issue = EXCLUDED.working_at_heights_issue,
                working_at_heights_expiry = EXCLUDED.working_at_heights_expiry,
                first_aid_cert = EXCLUDED.first_aid_cert,
                first_aid_level = EXCLUDED.first_aid_level,
                first_aid_expiry = EXCLUDED.first_aid_expiry,
                battery_install_cert = EXCLUDED.battery_install_cert,
                battery_install_provider = EXCLUDED.battery_install_provider,
                battery_install_expiry = EXCLUDED.battery_install_expiry,
                ev_charger_cert = EXCLUDED.ev_charger_cert,
                ev_charger_provider = EXCLUDED.ev_charger_provider,
                ev_charger_expiry = EXCLUDED.ev_charger_expiry,
                solar_design_cert = EXCLUDED.solar_design_cert,
                solar_design_provider = EXCLUDED.solar_design_provider,
                solar_design_expiry = EXCLUDED.solar_design_expiry,
                updated_at = NOW()
            RETURNING
                staff_id,
                cec_accreditation_number,
                cec_accreditation_type as "cec_accreditation_type: CecAccreditationType",
                cec_issue_date, cec_expiry_date,
                electrical_license_number, electrical_license_state, electrical_license_class,
                license_expiry_date,
                white_card_number, white_card_issue_date,
                working_at_heights, working_at_heights_issue, working_at_heights_expiry,
                first_aid_cert, first_aid_level, first_aid_expiry,
                battery_install_cert, battery_install_provider, battery_install_expiry,
                ev_charger_cert, ev_charger_provider, ev_charger_expiry,
                solar_design_cert, solar_design_provider, solar_design_expiry,
                updated_at
            "#,
            staff_id,
            c.cec_accreditation_number.as_deref(),
            c.cec_accreditation_type as Option<CecAccreditationType>,
            c.cec_issue_date,
            c.cec_expiry_date,
            c.electrical_license_number.as_deref(),
            c.electrical_license_state.as_deref(),
            c.electrical_license_class.as_deref(),
            c.license_expiry_date,
            c.white_card_number.as_deref(),
            c.white_card_issue_date,
            c.working_at_heights,
            c.working_at_heights_issue,
            c.working_at_heights_expiry,
            c.first_aid_cert,
            c.first_aid_level.as_deref(),
            c.first_aid_expiry,
            c.battery_install_cert,
            c.battery_install_provider.as_deref(),
            c.battery_install_expiry,
            c.ev_charger_cert,
            c.ev_charger_provider.as_deref(),
            c.ev_charger_expiry,
            c.solar_design_cert,
            c.solar_design_provider.as_deref(),
            c.solar_design_expiry
        )
        .fetch_one(executor)
        .await?;
        Ok(row.into())
    }

    // =========================================================================
    //  PERFORMANCE REVIEWS
    // =========================================================================

    pub async fn create_review<'e, E>(
        &self,
        executor: E,
        staff_id: Uuid,
        draft: &ReviewDraft,
        overall_rating: Decimal,
    ) -> Result<PerformanceReview, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let review = sqlx::query_as!(
            PerformanceReview,
            r#"
            INSERT INTO performance_reviews (
                staff_id, reviewer_id, period_start, period_end,
                quality, productivity, safety, teamwork, overall_rating, comments
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING
                id, staff_id, reviewer_id, period_start, period_end,
                quality, productivity, safety, teamwork, overall_rating, comments,
                created_at
            "#,
            staff_id,
            draft.reviewer_id,
            draft.period_start,
            draft.period_end,
            draft.quality,
            draft.productivity,
            draft.safety,
            draft.teamwork,
            overall_rating,
            draft.comments.as_deref()
        )
        .fetch_one(executor)
        .await?;
        Ok(review)
    }

    pub async fn list_reviews<'e, E>(
        &self,
        executor: E,
        staff_id: Uuid,
    ) -> Result<Vec<PerformanceReview>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reviews = sqlx::query_as!(
            PerformanceReview,
            r#"
            SELECT
                id, staff_id, reviewer_id, period_start, period_end,
                quality, productivity, safety, teamwork, overall_rating, comments,
                created_at
            FROM performance_reviews
            WHERE staff_id = $1
            ORDER BY period_end DESC
            "#,
            staff_id
        )
        .fetch_all(executor)
        .await?;
        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::tests::db_error;
    use sqlx::error::ErrorKind;

    #[test]
    fn unknown_team_or_user_is_a_bad_request() {
        let err = staff_write_error(db_error(ErrorKind::ForeignKeyViolation), "liam@example.com");
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn duplicate_staff_email_is_a_conflict() {
        let err = staff_write_error(db_error(ErrorKind::UniqueViolation), "liam@example.com");
        assert!(
            matches!(err, AppError::UniqueConstraintViolation(ref m) if m.contains("liam@example.com"))
        );
    }
}
