// src/handlers/staff.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::{error::AppError, extract::{AppJson, AppPath, AppQuery}},
    config::AppState,
    middleware::rbac::{AdminOrManager, RequireRole},
    models::staff::{
        Certifications, Compensation, EmploymentType, PerformanceReview, ReviewDraft, Staff,
        StaffCertifications, StaffComplianceSummary, StaffDraft, Team, TeamWithMembers,
    },
};

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        return Err(ValidationError::new("negative").with_message("Must not be negative.".into()));
    }
    Ok(())
}

// =============================================================================
//  STAFF
// =============================================================================

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct StaffListQuery {
    /// Include deactivated staff.
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffPayload {
    pub user_id: Option<Uuid>,

    #[validate(length(min = 1, max = 100, message = "First name is required."))]
    #[schema(example = "Liam")]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name is required."))]
    #[schema(example = "O'Connor")]
    pub last_name: String,

    #[validate(email(message = "The email address is invalid."))]
    #[schema(example = "liam@sunrise-solar.com.au")]
    pub email: String,

    pub phone: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Position is required."))]
    #[schema(example = "Lead Installer")]
    pub position: String,

    pub employment_type: EmploymentType,

    #[validate(custom(function = "non_negative"))]
    #[schema(example = "42.50")]
    pub hourly_rate: Decimal,

    pub team_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
}

impl From<StaffPayload> for StaffDraft {
    fn from(p: StaffPayload) -> Self {
        StaffDraft {
            user_id: p.user_id,
            first_name: p.first_name,
            last_name: p.last_name,
            email: p.email,
            phone: p.phone,
            position: p.position,
            employment_type: p.employment_type,
            hourly_rate: p.hourly_rate,
            team_id: p.team_id,
            start_date: p.start_date,
        }
    }
}

// GET /api/admin/staff
#[utoipa::path(
    get,
    path = "/api/admin/staff",
    tag = "Staff",
    params(StaffListQuery),
    responses((status = 200, description = "Staff members", body = Vec<Staff>)),
    security(("api_jwt" = []))
)]
pub async fn list_staff(
    State(app_state): State<AppState>,
    _manager: RequireRole<AdminOrManager>,
    AppQuery(query): AppQuery<StaffListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let staff = app_state
        .staff_service
        .list_staff(&app_state.db_pool, query.include_inactive)
        .await?;
    Ok(Json(staff))
}

// POST /api/admin/staff
#[utoipa::path(
    post,
    path = "/api/admin/staff",
    tag = "Staff",
    request_body = StaffPayload,
    responses(
        (status = 201, description = "Staff member created", body = Staff),
        (status = 409, description = "Email already in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_staff(
    State(app_state): State<AppState>,
    _manager: RequireRole<AdminOrManager>,
    AppJson(payload): AppJson<StaffPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let staff = app_state
        .staff_service
        .create_staff(&app_state.db_pool, &payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(staff)))
}

// GET /api/admin/staff/{id}
#[utoipa::path(
    get,
    path = "/api/admin/staff/{id}",
    tag = "Staff",
    params(("id" = Uuid, Path, description = "Staff id")),
    responses(
        (status = 200, description = "Staff member", body = Staff),
        (status = 404, description = "Unknown staff member")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_staff(
    State(app_state): State<AppState>,
    _manager: RequireRole<AdminOrManager>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let staff = app_state.staff_service.get_staff(&app_state.db_pool, id).await?;
    Ok(Json(staff))
}

// PUT /api/admin/staff/{id}
#[utoipa::path(
    put,
    path = "/api/admin/staff/{id}",
    tag = "Staff",
    params(("id" = Uuid, Path, description = "Staff id")),
    request_body = StaffPayload,
    responses(
        (status = 200, description = "Staff member updated", body = Staff),
        (status = 404, description = "Unknown staff member")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_staff(
    State(app_state): State<AppState>,
    _manager: RequireRole<AdminOrManager>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<StaffPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let staff = app_state
        .staff_service
        .update_staff(&app_state.db_pool, id, &payload.into())
        .await?;

    Ok(Json(staff))
}

// DELETE /api/admin/staff/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/staff/{id}",
    tag = "Staff",
    params(("id" = Uuid, Path, description = "Staff id")),
    responses(
        (status = 204, description = "Staff member deactivated"),
        (status = 404, description = "Unknown staff member")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_staff(
    State(app_state): State<AppState>,
    _manager: RequireRole<AdminOrManager>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .staff_service
        .deactivate_staff(&app_state.db_pool, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  CERTIFICATIONS & COMPLIANCE
// =============================================================================

// GET /api/admin/staff/{id}/certifications
#[utoipa::path(
    get,
    path = "/api/admin/staff/{id}/certifications",
    tag = "Compliance",
    params(("id" = Uuid, Path, description = "Staff id")),
    responses(
        (status = 200, description = "Certifications and compliance score", body = StaffCertifications),
        (status = 404, description = "Unknown staff member")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_certifications(
    State(app_state): State<AppState>,
    _manager: RequireRole<AdminOrManager>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let result = app_state
        .staff_service
        .get_certifications(&app_state.db_pool, id)
        .await?;
    Ok(Json(result))
}

// PUT /api/admin/staff/{id}/certifications
#[utoipa::path(
    put,
    path = "/api/admin/staff/{id}/certifications",
    tag = "Compliance",
    params(("id" = Uuid, Path, description = "Staff id")),
    request_body = Certifications,
    responses(
        (status = 200, description = "Certifications saved", body = StaffCertifications),
        (status = 400, description = "Unknown license state or inconsistent dates"),
        (status = 404, description = "Unknown staff member")
    ),
    security(("api_jwt" = []))
)]
pub async fn save_certifications(
    State(app_state): State<AppState>,
    _manager: RequireRole<AdminOrManager>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<Certifications>,
) -> Result<impl IntoResponse, AppError> {
    let result = app_state
        .staff_service
        .save_certifications(&app_state.db_pool, id, &payload)
        .await?;
    Ok(Json(result))
}

// GET /api/admin/staff/compliance
#[utoipa::path(
    get,
    path = "/api/admin/staff/compliance",
    tag = "Compliance",
    responses((status = 200, description = "Active staff, lowest score first", body = Vec<StaffComplianceSummary>)),
    security(("api_jwt" = []))
)]
pub async fn compliance_overview(
    State(app_state): State<AppState>,
    _manager: RequireRole<AdminOrManager>,
) -> Result<impl IntoResponse, AppError> {
    let overview = app_state
        .staff_service
        .compliance_overview(&app_state.db_pool)
        .await?;
    Ok(Json(overview))
}

// =============================================================================
//  TEAMS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamPayload {
    #[validate(length(min = 2, max = 100, message = "Team name must have 2 to 100 characters."))]
    #[schema(example = "North Metro Crew")]
    pub name: String,
    pub description: Option<String>,
    pub leader_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberPayload {
    pub staff_id: Uuid,
}

// GET /api/admin/teams
#[utoipa::path(
    get,
    path = "/api/admin/teams",
    tag = "Staff",
    responses((status = 200, description = "Teams", body = Vec<Team>)),
    security(("api_jwt" = []))
)]
pub async fn list_teams(
    State(app_state): State<AppState>,
    _manager: RequireRole<AdminOrManager>,
) -> Result<impl IntoResponse, AppError> {
    let teams = app_state.staff_service.list_teams(&app_state.db_pool).await?;
    Ok(Json(teams))
}

// POST /api/admin/teams
#[utoipa::path(
    post,
    path = "/api/admin/teams",
    tag = "Staff",
    request_body = TeamPayload,
    responses(
        (status = 201, description = "Team created", body = Team),
        (status = 409, description = "Team name in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_team(
    State(app_state): State<AppState>,
    _manager: RequireRole<AdminOrManager>,
    AppJson(payload): AppJson<TeamPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let team = app_state
        .staff_service
        .create_team(
            &app_state.db_pool,
            &payload.name,
            payload.description.as_deref(),
            payload.leader_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(team)))
}

// GET /api/admin/teams/{id}
#[utoipa::path(
    get,
    path = "/api/admin/teams/{id}",
    tag = "Staff",
    params(("id" = Uuid, Path, description = "Team id")),
    responses(
        (status = 200, description = "Team with its members", body = TeamWithMembers),
        (status = 404, description = "Unknown team")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_team(
    State(app_state): State<AppState>,
    _manager: RequireRole<AdminOrManager>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let team = app_state.staff_service.get_team(&app_state.db_pool, id).await?;
    Ok(Json(team))
}

// PUT /api/admin/teams/{id}
#[utoipa::path(
    put,
    path = "/api/admin/teams/{id}",
    tag = "Staff",
    params(("id" = Uuid, Path, description = "Team id")),
    request_body = TeamPayload,
    responses(
        (status = 200, description = "Team updated", body = Team),
        (status = 404, description = "Unknown team")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_team(
    State(app_state): State<AppState>,
    _manager: RequireRole<AdminOrManager>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<TeamPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let team = app_state
        .staff_service
        .update_team(
            &app_state.db_pool,
            id,
            &payload.name,
            payload.description.as_deref(),
            payload.leader_id,
        )
        .await?;

    Ok(Json(team))
}

// DELETE /api/admin/teams/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/teams/{id}",
    tag = "Staff",
    params(("id" = Uuid, Path, description = "Team id")),
    responses(
        (status = 204, description = "Team deleted, members unassigned"),
        (status = 404, description = "Unknown team")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_team(
    State(app_state): State<AppState>,
    _manager: RequireRole<AdminOrManager>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.staff_service.delete_team(&app_state.db_pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/admin/teams/{id}/members
#[utoipa::path(
    post,
    path = "/api/admin/teams/{id}/members",
    tag = "Staff",
    params(("id" = Uuid, Path, description = "Team id")),
    request_body = TeamMemberPayload,
    responses(
        (status = 200, description = "Staff member assigned", body = Staff),
        (status = 404, description = "Unknown team or staff member")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_team_member(
    State(app_state): State<AppState>,
    _manager: RequireRole<AdminOrManager>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<TeamMemberPayload>,
) -> Result<impl IntoResponse, AppError> {
    let staff = app_state
        .staff_service
        .assign_team(&app_state.db_pool, payload.staff_id, Some(id))
        .await?;
    Ok(Json(staff))
}

// DELETE /api/admin/teams/{id}/members/{staff_id}
#[utoipa::path(
    delete,
    path = "/api/admin/teams/{id}/members/{staff_id}",
    tag = "Staff",
    params(
        ("id" = Uuid, Path, description = "Team id"),
        ("staff_id" = Uuid, Path, description = "Staff id")
    ),
    responses(
        (status = 200, description = "Staff member removed from the team", body = Staff),
        (status = 400, description = "Staff member is not on this team"),
        (status = 404, description = "Unknown staff member")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_team_member(
    State(app_state): State<AppState>,
    _manager: RequireRole<AdminOrManager>,
    AppPath((id, staff_id)): AppPath<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let member = app_state
        .staff_service
        .get_staff(&app_state.db_pool, staff_id)
        .await?;
    if member.team_id != Some(id) {
        return Err(AppError::BadRequest(format!(
            "{} is not a member of this team.",
            member.full_name()
        )));
    }

    let staff = app_state
        .staff_service
        .assign_team(&app_state.db_pool, staff_id, None)
        .await?;
    Ok(Json(staff))
}

// =============================================================================
//  REVIEWS & COMPENSATION
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPayload {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,

    #[validate(range(min = 1, max = 5, message = "Ratings go from 1 to 5."))]
    pub quality: i16,
    #[validate(range(min = 1, max = 5, message = "Ratings go from 1 to 5."))]
    pub productivity: i16,
    #[validate(range(min = 1, max = 5, message = "Ratings go from 1 to 5."))]
    pub safety: i16,
    #[validate(range(min = 1, max = 5, message = "Ratings go from 1 to 5."))]
    pub teamwork: i16,

    pub comments: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompensationPayload {
    #[validate(custom(function = "non_negative"))]
    #[schema(example = "42.50")]
    pub hourly_rate: Decimal,

    /// Leave empty to quote with the default multiplier.
    #[schema(example = "1.45")]
    pub cost_multiplier: Option<Decimal>,
}

// GET /api/admin/staff/{id}/reviews
#[utoipa::path(
    get,
    path = "/api/admin/staff/{id}/reviews",
    tag = "Staff",
    params(("id" = Uuid, Path, description = "Staff id")),
    responses(
        (status = 200, description = "Reviews, newest period first", body = Vec<PerformanceReview>),
        (status = 404, description = "Unknown staff member")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_reviews(
    State(app_state): State<AppState>,
    _manager: RequireRole<AdminOrManager>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let reviews = app_state
        .staff_service
        .list_reviews(&app_state.db_pool, id)
        .await?;
    Ok(Json(reviews))
}

// POST /api/admin/staff/{id}/reviews
#[utoipa::path(
    post,
    path = "/api/admin/staff/{id}/reviews",
    tag = "Staff",
    params(("id" = Uuid, Path, description = "Staff id")),
    request_body = ReviewPayload,
    responses(
        (status = 201, description = "Review recorded", body = PerformanceReview),
        (status = 404, description = "Unknown staff member")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_review(
    State(app_state): State<AppState>,
    RequireRole(reviewer, _): RequireRole<AdminOrManager>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<ReviewPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let draft = ReviewDraft {
        reviewer_id: Some(reviewer.id),
        period_start: payload.period_start,
        period_end: payload.period_end,
        quality: payload.quality,
        productivity: payload.productivity,
        safety: payload.safety,
        teamwork: payload.teamwork,
        comments: payload.comments,
    };
    let review = app_state
        .staff_service
        .create_review(&app_state.db_pool, id, &draft)
        .await?;

    Ok((StatusCode::CREATED, Json(review)))
}

// GET /api/admin/staff/{id}/compensation
#[utoipa::path(
    get,
    path = "/api/admin/staff/{id}/compensation",
    tag = "Staff",
    params(("id" = Uuid, Path, description = "Staff id")),
    responses(
        (status = 200, description = "True employment cost", body = Compensation),
        (status = 404, description = "Unknown staff member")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_compensation(
    State(app_state): State<AppState>,
    _manager: RequireRole<AdminOrManager>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let compensation = app_state
        .staff_service
        .get_compensation(&app_state.db_pool, id)
        .await?;
    Ok(Json(compensation))
}

// PUT /api/admin/staff/{id}/compensation
#[utoipa::path(
    put,
    path = "/api/admin/staff/{id}/compensation",
    tag = "Staff",
    params(("id" = Uuid, Path, description = "Staff id")),
    request_body = CompensationPayload,
    responses(
        (status = 200, description = "Rate updated", body = Compensation),
        (status = 404, description = "Unknown staff member")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_compensation(
    State(app_state): State<AppState>,
    _manager: RequireRole<AdminOrManager>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<CompensationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if payload
        .cost_multiplier
        .is_some_and(|m| m <= Decimal::ONE)
    {
        return Err(AppError::BadRequest(
            "Cost multiplier must be greater than 1.".into(),
        ));
    }

    let compensation = app_state
        .staff_service
        .update_compensation(&app_state.db_pool, id, payload.hourly_rate, payload.cost_multiplier)
        .await?;

    Ok(Json(compensation))
}
