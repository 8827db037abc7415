// src/services/staff_service.rs

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::StaffRepository,
    models::staff::{
        Certifications, Compensation, PerformanceReview, ReviewDraft, Staff, StaffCertifications,
        StaffComplianceSummary, StaffDraft, Team, TeamWithMembers, AU_STATES,
    },
    services::{
        compensation::{employment_cost, quick_true_cost, DEFAULT_COST_MULTIPLIER},
        compliance::compute_compliance_score,
    },
};

fn staff_not_found(id: Uuid) -> AppError {
    AppError::ResourceNotFound(format!("Staff member {} not found", id))
}

fn team_not_found(id: Uuid) -> AppError {
    AppError::ResourceNotFound(format!("Team {} not found", id))
}

/// Mean of the four ratings, two decimal places.
pub fn overall_rating(draft: &ReviewDraft) -> Decimal {
    let sum = i64::from(draft.quality)
        + i64::from(draft.productivity)
        + i64::from(draft.safety)
        + i64::from(draft.teamwork);
    (Decimal::from(sum) / Decimal::from(4)).round_dp(2)
}

fn check_certifications(c: &Certifications) -> Result<(), AppError> {
    if let Some(state) = c.electrical_license_state.as_deref() {
        if !AU_STATES.contains(&state) {
            return Err(AppError::BadRequest(format!(
                "Unknown license state '{}'. Expected one of {}",
                state,
                AU_STATES.join(", ")
            )));
        }
    }

    let ordered = |label: &str, issued: Option<NaiveDate>, expires: Option<NaiveDate>| {
        match (issued, expires) {
            (Some(i), Some(e)) if e < i => Err(AppError::BadRequest(format!(
                "{} expiry date is before its issue date",
                label
            ))),
            _ => Ok(()),
        }
    };
    ordered("CEC accreditation", c.cec_issue_date, c.cec_expiry_date)?;
    ordered(
        "Working at heights",
        c.working_at_heights_issue,
        c.working_at_heights_expiry,
    )?;
    Ok(())
}

#[derive(Clone)]
pub struct StaffService {
    repo: StaffRepository,
}

impl StaffService {
    pub fn new(repo: StaffRepository) -> Self {
        Self { repo }
    }

    // =========================================================================
    //  STAFF
    // =========================================================================

    pub async fn list_staff<'e, E>(&self, executor: E, include_inactive: bool) -> Result<Vec<Staff>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_staff(executor, include_inactive).await
    }

    pub async fn get_staff<'e, E>(&self, executor: E, id: Uuid) -> Result<Staff, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_staff(executor, id)
            .await?
            .ok_or_else(|| staff_not_found(id))
    }

    pub async fn create_staff<'e, E>(&self, executor: E, draft: &StaffDraft) -> Result<Staff, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        self.check_team(&mut *conn, draft.team_id).await?;
        let staff = self.repo.create_staff(&mut *conn, draft).await?;
        tracing::info!(staff_id = %staff.id, "Staff member created");
        Ok(staff)
    }

    pub async fn update_staff<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        draft: &StaffDraft,
    ) -> Result<Staff, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        self.check_team(&mut *conn, draft.team_id).await?;
        self.repo
            .update_staff(&mut *conn, id, draft)
            .await?
            .ok_or_else(|| staff_not_found(id))
    }

    async fn check_team(
        &self,
        conn: &mut PgConnection,
        team_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        if let Some(team_id) = team_id {
            self.repo
                .find_team(&mut *conn, team_id)
                .await?
                .ok_or_else(|| team_not_found(team_id))?;
        }
        Ok(())
    }

    pub async fn deactivate_staff<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.repo.deactivate_staff(executor, id).await? {
            return Err(staff_not_found(id));
        }
        tracing::info!(staff_id = %id, "Staff member deactivated");
        Ok(())
    }

    // =========================================================================
    //  TEAMS
    // =========================================================================

    pub async fn list_teams<'e, E>(&self, executor: E) -> Result<Vec<Team>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_teams(executor).await
    }

    pub async fn get_team<'e, E>(&self, executor: E, id: Uuid) -> Result<TeamWithMembers, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let team = self
            .repo
            .find_team(&mut *conn, id)
            .await?
            .ok_or_else(|| team_not_found(id))?;
        let members = self.repo.list_team_members(&mut *conn, id).await?;

        Ok(TeamWithMembers { team, members })
    }

    pub async fn create_team<'e, E>(
        &self,
        executor: E,
        name: &str,
        description: Option<&str>,
        leader_id: Option<Uuid>,
    ) -> Result<Team, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        if let Some(leader_id) = leader_id {
            self.repo
                .find_staff(&mut *conn, leader_id)
                .await?
                .ok_or_else(|| staff_not_found(leader_id))?;
        }

        self.repo
            .create_team(&mut *conn, name, description, leader_id)
            .await
    }

    pub async fn update_team<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
        description: Option<&str>,
        leader_id: Option<Uuid>,
    ) -> Result<Team, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        if let Some(leader_id) = leader_id {
            self.repo
                .find_staff(&mut *conn, leader_id)
                .await?
                .ok_or_else(|| staff_not_found(leader_id))?;
        }

        self.repo
            .update_team(&mut *conn, id, name, description, leader_id)
            .await?
            .ok_or_else(|| team_not_found(id))
    }

    pub async fn delete_team<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.repo.delete_team(executor, id).await? {
            return Err(team_not_found(id));
        }
        Ok(())
    }

    /// Puts a staff member on a team, or takes them off any team with `None`.
    pub async fn assign_team<'e, E>(
        &self,
        executor: E,
        staff_id: Uuid,
        team_id: Option<Uuid>,
    ) -> Result<Staff, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        if let Some(team_id) = team_id {
            self.repo
                .find_team(&mut *conn, team_id)
                .await?
                .ok_or_else(|| team_not_found(team_id))?;
        }

        self.repo
            .assign_team(&mut *conn, staff_id, team_id)
            .await?
            .ok_or_else(|| staff_not_found(staff_id))
    }

    // =========================================================================
    //  CERTIFICATIONS & COMPLIANCE
    // =========================================================================

    pub async fn get_certifications<'e, E>(
        &self,
        executor: E,
        staff_id: Uuid,
    ) -> Result<StaffCertifications, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        self.repo
            .find_staff(&mut *conn, staff_id)
            .await?
            .ok_or_else(|| staff_not_found(staff_id))?;

        let record = self.repo.find_certifications(&mut *conn, staff_id).await?;
        let details = record.as_ref().map(|r| r.details.clone()).unwrap_or_default();

        Ok(StaffCertifications {
            success: true,
            compliance_score: compute_compliance_score(&details, Utc::now().date_naive()),
            certifications: record,
        })
    }

    pub async fn save_certifications<'e, E>(
        &self,
        executor: E,
        staff_id: Uuid,
        details: &Certifications,
    ) -> Result<StaffCertifications, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        check_certifications(details)?;

        let mut tx = executor.begin().await?;

        self.repo
            .find_staff(&mut *tx, staff_id)
            .await?
            .ok_or_else(|| staff_not_found(staff_id))?;

        let record = self
            .repo
            .upsert_certifications(&mut *tx, staff_id, details)
            .await?;

        tx.commit().await?;

        let score = compute_compliance_score(&record.details, Utc::now().date_naive());
        tracing::info!(
            %staff_id,
            overall = score.overall,
            status = ?score.status,
            "Certifications updated"
        );

        Ok(StaffCertifications {
            success: true,
            certifications: Some(record),
            compliance_score: score,
        })
    }

    /// Compliance of every active staff member, lowest score first.
    pub async fn compliance_overview<'e, E>(
        &self,
        executor: E,
    ) -> Result<Vec<StaffComplianceSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let staff = self.repo.list_staff(&mut *conn, false).await?;
        let mut records: HashMap<Uuid, Certifications> = self
            .repo
            .list_certifications(&mut *conn)
            .await?
            .into_iter()
            .map(|r| (r.staff_id, r.details))
            .collect();

        let today = Utc::now().date_naive();
        let mut summaries: Vec<StaffComplianceSummary> = staff
            .into_iter()
            .map(|member| {
                let details = records.remove(&member.id).unwrap_or_default();
                StaffComplianceSummary {
                    staff_id: member.id,
                    name: member.full_name(),
                    position: member.position,
                    compliance_score: compute_compliance_score(&details, today),
                }
            })
            .collect();

        summaries.sort_by(|a, b| {
            a.compliance_score
                .overall
                .cmp(&b.compliance_score.overall)
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(summaries)
    }

    // =========================================================================
    //  REVIEWS & COMPENSATION
    // =========================================================================

    pub async fn list_reviews<'e, E>(
        &self,
        executor: E,
        staff_id: Uuid,
    ) -> Result<Vec<PerformanceReview>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        self.repo
            .find_staff(&mut *conn, staff_id)
            .await?
            .ok_or_else(|| staff_not_found(staff_id))?;

        self.repo.list_reviews(&mut *conn, staff_id).await
    }

    pub async fn create_review<'e, E>(
        &self,
        executor: E,
        staff_id: Uuid,
        draft: &ReviewDraft,
    ) -> Result<PerformanceReview, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if draft.period_end < draft.period_start {
            return Err(AppError::BadRequest(
                "Review period ends before it starts".into(),
            ));
        }

        let mut conn = executor.acquire().await?;

        self.repo
            .find_staff(&mut *conn, staff_id)
            .await?
            .ok_or_else(|| staff_not_found(staff_id))?;

        self.repo
            .create_review(&mut *conn, staff_id, draft, overall_rating(draft))
            .await
    }

    pub async fn get_compensation<'e, E>(
        &self,
        executor: E,
        staff_id: Uuid,
    ) -> Result<Compensation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let staff = self.get_staff(executor, staff_id).await?;
        Ok(compensation_for(&staff))
    }

    pub async fn update_compensation<'e, E>(
        &self,
        executor: E,
        staff_id: Uuid,
        hourly_rate: Decimal,
        cost_multiplier: Option<Decimal>,
    ) -> Result<Compensation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let staff = self
            .repo
            .update_compensation(executor, staff_id, hourly_rate, cost_multiplier)
            .await?
            .ok_or_else(|| staff_not_found(staff_id))?;

        tracing::info!(%staff_id, %hourly_rate, "Compensation updated");
        Ok(compensation_for(&staff))
    }
}

fn compensation_for(staff: &Staff) -> Compensation {
    Compensation {
        staff_id: staff.id,
        hourly_rate: staff.hourly_rate,
        cost_multiplier: staff.cost_multiplier.unwrap_or(DEFAULT_COST_MULTIPLIER),
        quick_true_cost: quick_true_cost(staff.hourly_rate, staff.cost_multiplier),
        breakdown: employment_cost(staff.hourly_rate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(q: i16, p: i16, s: i16, t: i16) -> ReviewDraft {
        ReviewDraft {
            reviewer_id: None,
            period_start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            quality: q,
            productivity: p,
            safety: s,
            teamwork: t,
            comments: None,
        }
    }

    #[test]
    fn overall_rating_is_the_mean() {
        assert_eq!(overall_rating(&review(5, 4, 4, 4)), "4.25".parse::<Decimal>().unwrap());
        assert_eq!(overall_rating(&review(3, 3, 3, 3)), Decimal::from(3));
    }

    #[test]
    fn unknown_license_state_is_rejected() {
        let certs = Certifications {
            electrical_license_state: Some("XX".into()),
            ..Default::default()
        };
        assert!(matches!(check_certifications(&certs), Err(AppError::BadRequest(_))));

        let certs = Certifications {
            electrical_license_state: Some("QLD".into()),
            ..Default::default()
        };
        assert!(check_certifications(&certs).is_ok());
    }

    #[test]
    fn expiry_before_issue_is_rejected() {
        let certs = Certifications {
            cec_issue_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            cec_expiry_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            ..Default::default()
        };
        assert!(check_certifications(&certs).is_err());
    }
}
