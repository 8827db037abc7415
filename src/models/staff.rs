// src/models/staff.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// =========================================================================
//  STAFF & TEAMS
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "employment_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Casual,
    Contractor,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    #[schema(example = "Liam")]
    pub first_name: String,
    #[schema(example = "O'Connor")]
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    #[schema(example = "Lead Installer")]
    pub position: String,
    pub employment_type: EmploymentType,
    #[schema(example = "42.50")]
    pub hourly_rate: Decimal,
    #[schema(example = "1.45")]
    pub cost_multiplier: Option<Decimal>,
    pub team_id: Option<Uuid>,
    pub is_active: bool,
    pub start_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Staff {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone)]
pub struct StaffDraft {
    pub user_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub position: String,
    pub employment_type: EmploymentType,
    pub hourly_rate: Decimal,
    pub team_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: Uuid,
    #[schema(example = "North Metro Crew")]
    pub name: String,
    pub description: Option<String>,
    pub leader_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamWithMembers {
    #[serde(flatten)]
    pub team: Team,
    pub members: Vec<Staff>,
}

// =========================================================================
//  CERTIFICATIONS
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "cec_accreditation_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CecAccreditationType {
    DesignInstallGrid,
    DesignInstallStandalone,
    BatteryStorage,
    DesignOnly,
    InstallOnly,
}

/// Certification details held for one staff member. Every field is optional
/// or defaults to "not held".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Certifications {
    #[schema(example = "A1234567")]
    pub cec_accreditation_number: Option<String>,
    pub cec_accreditation_type: Option<CecAccreditationType>,
    pub cec_issue_date: Option<NaiveDate>,
    pub cec_expiry_date: Option<NaiveDate>,

    #[schema(example = "EC123456")]
    pub electrical_license_number: Option<String>,
    #[schema(example = "WA")]
    pub electrical_license_state: Option<String>,
    #[schema(example = "A Grade")]
    pub electrical_license_class: Option<String>,
    pub license_expiry_date: Option<NaiveDate>,

    pub white_card_number: Option<String>,
    pub white_card_issue_date: Option<NaiveDate>,
    pub working_at_heights: bool,
    pub working_at_heights_issue: Option<NaiveDate>,
    pub working_at_heights_expiry: Option<NaiveDate>,
    pub first_aid_cert: bool,
    #[schema(example = "HLTAID011")]
    pub first_aid_level: Option<String>,
    pub first_aid_expiry: Option<NaiveDate>,

    pub battery_install_cert: bool,
    pub battery_install_provider: Option<String>,
    pub battery_install_expiry: Option<NaiveDate>,
    pub ev_charger_cert: bool,
    pub ev_charger_provider: Option<String>,
    pub ev_charger_expiry: Option<NaiveDate>,
    pub solar_design_cert: bool,
    pub solar_design_provider: Option<String>,
    pub solar_design_expiry: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificationRecord {
    pub staff_id: Uuid,
    #[serde(flatten)]
    pub details: Certifications,
    pub updated_at: DateTime<Utc>,
}

pub const AU_STATES: [&str; 8] = ["WA", "VIC", "NSW", "QLD", "SA", "TAS", "NT", "ACT"];

// =========================================================================
//  COMPLIANCE
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpiryStatus {
    Valid,
    ExpiringSoon,
    Expired,
    NotRecorded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    AtRisk,
    NonCompliant,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceBreakdown {
    pub cec_accreditation: u32,
    pub electrical_license: u32,
    pub safety_certifications: u32,
    pub specialized_training: u32,
}

impl ComplianceBreakdown {
    pub fn total(&self) -> u32 {
        self.cec_accreditation
            + self.electrical_license
            + self.safety_certifications
            + self.specialized_training
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceScore {
    #[schema(example = 92)]
    pub overall: u32,
    pub breakdown: ComplianceBreakdown,
    pub status: ComplianceStatus,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffCertifications {
    pub success: bool,
    pub certifications: Option<CertificationRecord>,
    pub compliance_score: ComplianceScore,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffComplianceSummary {
    pub staff_id: Uuid,
    pub name: String,
    pub position: String,
    pub compliance_score: ComplianceScore,
}

// =========================================================================
//  PERFORMANCE & COMPENSATION
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReview {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub reviewer_id: Option<Uuid>,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    #[schema(example = 4)]
    pub quality: i16,
    pub productivity: i16,
    pub safety: i16,
    pub teamwork: i16,
    #[schema(example = "4.25")]
    pub overall_rating: Decimal,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ReviewDraft {
    pub reviewer_id: Option<Uuid>,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub quality: i16,
    pub productivity: i16,
    pub safety: i16,
    pub teamwork: i16,
    pub comments: Option<String>,
}

/// Hourly employment cost, broken down into on-costs.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmploymentCostBreakdown {
    pub base_wage: Decimal,
    pub superannuation: Decimal,
    pub workers_comp: Decimal,
    pub annual_leave: Decimal,
    pub sick_leave: Decimal,
    pub public_holidays: Decimal,
    pub long_service_leave: Decimal,
    pub tool_allowance: Decimal,
    pub training: Decimal,
    pub overhead: Decimal,
    pub total_cost: Decimal,
    pub cost_multiplier: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Compensation {
    pub staff_id: Uuid,
    pub hourly_rate: Decimal,
    /// Multiplier used for quick quoting (stored value or the default).
    pub cost_multiplier: Decimal,
    pub quick_true_cost: Decimal,
    pub breakdown: EmploymentCostBreakdown,
}
