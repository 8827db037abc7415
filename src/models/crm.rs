// src/models/crm.rs

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

// =========================================================================
//  STAGES
// =========================================================================

/// Canonical pipeline stage. Declaration order is the board's column order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
    ToSchema,
)]
#[sqlx(type_name = "deal_stage", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DealStage {
    NewLead,
    Contacted,
    QuoteSent,
    FollowUp,
    Negotiation,
    Won,
    Lost,
    OnHold,
}

impl DealStage {
    pub const ALL: [DealStage; 8] = [
        DealStage::NewLead,
        DealStage::Contacted,
        DealStage::QuoteSent,
        DealStage::FollowUp,
        DealStage::Negotiation,
        DealStage::Won,
        DealStage::Lost,
        DealStage::OnHold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DealStage::NewLead => "NEW_LEAD",
            DealStage::Contacted => "CONTACTED",
            DealStage::QuoteSent => "QUOTE_SENT",
            DealStage::FollowUp => "FOLLOW_UP",
            DealStage::Negotiation => "NEGOTIATION",
            DealStage::Won => "WON",
            DealStage::Lost => "LOST",
            DealStage::OnHold => "ON_HOLD",
        }
    }

    /// Human readable column title.
    pub fn display_name(&self) -> &'static str {
        match self {
            DealStage::NewLead => "New Lead",
            DealStage::Contacted => "Contacted",
            DealStage::QuoteSent => "Quote Sent",
            DealStage::FollowUp => "Follow Up",
            DealStage::Negotiation => "Negotiation",
            DealStage::Won => "Won",
            DealStage::Lost => "Lost",
            DealStage::OnHold => "On Hold",
        }
    }

    /// Status implied by landing in this stage.
    pub fn status(&self) -> DealStatus {
        match self {
            DealStage::Won => DealStatus::Won,
            DealStage::Lost => DealStatus::Lost,
            DealStage::OnHold => DealStatus::OnHold,
            _ => DealStatus::Open,
        }
    }

    /// Probability forced by a closing stage, if any.
    pub fn forced_probability(&self) -> Option<i32> {
        match self {
            DealStage::Won => Some(100),
            DealStage::Lost => Some(0),
            _ => None,
        }
    }

    /// Maps labels from the older list-page and board vocabularies onto the
    /// canonical enum. Canonical labels map to themselves.
    pub fn from_legacy_label(label: &str) -> Option<DealStage> {
        if let Ok(stage) = label.parse::<DealStage>() {
            return Some(stage);
        }

        let stage = match label.trim().to_ascii_uppercase().as_str() {
            "LEAD" => DealStage::NewLead,
            "QUALIFIED" => DealStage::Contacted,
            "PROPOSAL" | "INITIAL_QUOTE_SENT" | "FINAL_PROPOSAL_SENT" => DealStage::QuoteSent,
            "SITE_VISIT_SCHEDULED" | "SITE_VISIT_COMPLETE" => DealStage::FollowUp,
            "PROPOSAL_ACCEPTED" | "DEPOSIT_PAID" => DealStage::Won,
            _ => return None,
        };
        Some(stage)
    }
}

impl fmt::Display for DealStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse: only canonical labels are accepted.
impl FromStr for DealStage {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DealStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| AppError::InvalidStage(s.to_string()))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
    ToSchema,
)]
#[sqlx(type_name = "deal_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DealStatus {
    Open,
    Won,
    Lost,
    OnHold,
}

impl DealStatus {
    pub const ALL: [DealStatus; 4] = [
        DealStatus::Open,
        DealStatus::Won,
        DealStatus::Lost,
        DealStatus::OnHold,
    ];
}

// =========================================================================
//  DEALS
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: Uuid,
    #[schema(example = "6.6kW + 10kWh battery, Joondalup")]
    pub title: String,
    #[schema(example = "14500.00")]
    pub value: Decimal,
    #[schema(example = 40)]
    pub probability: i32,
    pub stage: DealStage,
    pub status: DealStatus,
    #[schema(example = 72)]
    pub lead_score: i32,
    pub expected_close_date: Option<NaiveDate>,
    pub lead_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // Joined from the lead, for list and board views.
    pub lead_name: Option<String>,
    pub lead_email: Option<String>,
    pub lead_phone: Option<String>,
}

/// Fields accepted when creating or editing a deal.
#[derive(Debug, Clone)]
pub struct DealDraft {
    pub title: String,
    pub value: Decimal,
    pub probability: i32,
    pub stage: DealStage,
    pub lead_score: i32,
    pub expected_close_date: Option<NaiveDate>,
    pub lead_id: Option<Uuid>,
    pub owner_id: Uuid,
}

/// Form edit of a deal. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct DealChanges {
    pub title: Option<String>,
    pub value: Option<Decimal>,
    pub probability: Option<i32>,
    pub stage: Option<DealStage>,
    pub lead_score: Option<i32>,
    pub expected_close_date: Option<NaiveDate>,
    pub lead_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
}

impl DealChanges {
    pub fn apply_to(self, current: &Deal) -> DealDraft {
        DealDraft {
            title: self.title.unwrap_or_else(|| current.title.clone()),
            value: self.value.unwrap_or(current.value),
            probability: self.probability.unwrap_or(current.probability),
            stage: self.stage.unwrap_or(current.stage),
            lead_score: self.lead_score.unwrap_or(current.lead_score),
            expected_close_date: self.expected_close_date.or(current.expected_close_date),
            lead_id: self.lead_id.or(current.lead_id),
            owner_id: self.owner_id.unwrap_or(current.owner_id),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum DealSortField {
    #[default]
    UpdatedAt,
    CreatedAt,
    Value,
    Probability,
    LeadScore,
    Title,
}

impl DealSortField {
    pub fn column(&self) -> &'static str {
        match self {
            DealSortField::UpdatedAt => "d.updated_at",
            DealSortField::CreatedAt => "d.created_at",
            DealSortField::Value => "d.value",
            DealSortField::Probability => "d.probability",
            DealSortField::LeadScore => "d.lead_score",
            DealSortField::Title => "d.title",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DealFilter {
    pub search: Option<String>,
    pub stage: Option<DealStage>,
    pub status: Option<DealStatus>,
    pub sort_by: DealSortField,
    pub sort_order: SortOrder,
}

// =========================================================================
//  METRICS
// =========================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricBucket {
    pub count: i64,
    pub value: Decimal,
}

/// One `GROUP BY stage, status` row.
#[derive(Debug, Clone, FromRow)]
pub struct StageAggregateRow {
    pub stage: DealStage,
    pub status: DealStatus,
    pub deal_count: i64,
    pub total_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DealMetrics {
    pub total_deals: i64,
    pub total_value: Decimal,
    pub by_stage: BTreeMap<DealStage, MetricBucket>,
    pub by_status: BTreeMap<DealStatus, MetricBucket>,
}

impl DealMetrics {
    /// Folds aggregate rows into totals. Every stage and status is present,
    /// zeroed when no deal sits there.
    pub fn from_rows(rows: &[StageAggregateRow]) -> Self {
        let mut by_stage: BTreeMap<DealStage, MetricBucket> = DealStage::ALL
            .into_iter()
            .map(|s| (s, MetricBucket::default()))
            .collect();
        let mut by_status: BTreeMap<DealStatus, MetricBucket> = DealStatus::ALL
            .into_iter()
            .map(|s| (s, MetricBucket::default()))
            .collect();

        let mut total_deals = 0;
        let mut total_value = Decimal::ZERO;

        for row in rows {
            total_deals += row.deal_count;
            total_value += row.total_value;

            let stage = by_stage.entry(row.stage).or_default();
            stage.count += row.deal_count;
            stage.value += row.total_value;

            let status = by_status.entry(row.status).or_default();
            status.count += row.deal_count;
            status.value += row.total_value;
        }

        Self {
            total_deals,
            total_value,
            by_stage,
            by_status,
        }
    }
}

// =========================================================================
//  ACTIVITIES
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "activity_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    StageChange,
    Note,
    Call,
    Email,
    Meeting,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DealActivity {
    pub id: Uuid,
    pub deal_id: Uuid,
    pub activity_type: ActivityType,
    #[schema(example = "Stage changed from Contacted to Quote Sent")]
    pub description: String,
    pub from_stage: Option<DealStage>,
    pub to_stage: Option<DealStage>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Result of a stage change: the updated deal, the audit entry (absent when
/// the deal was already in that stage) and fresh aggregates.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageTransition {
    pub deal: Deal,
    pub activity: Option<DealActivity>,
    pub metrics: DealMetrics,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DealList {
    pub deals: Vec<Deal>,
    pub metrics: DealMetrics,
}

// =========================================================================
//  LEADS
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
    New,
    Contacted,
    Converted,
    Lost,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    #[schema(example = "Priya Sharma")]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[schema(example = "6.6")]
    pub system_size_kw: Option<Decimal>,
    #[schema(example = "10.0")]
    pub battery_size_kwh: Option<Decimal>,
    pub status: LeadStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LeadDraft {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub system_size_kw: Option<Decimal>,
    pub battery_size_kwh: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn canonical_labels_parse_and_others_are_rejected() {
        for stage in DealStage::ALL {
            assert_eq!(stage.as_str().parse::<DealStage>().unwrap(), stage);
        }

        let err = "QUALIFIED".parse::<DealStage>().unwrap_err();
        assert!(matches!(err, AppError::InvalidStage(ref s) if s == "QUALIFIED"));
        assert!("new_lead".parse::<DealStage>().is_err());
        assert!("".parse::<DealStage>().is_err());
    }

    #[test]
    fn legacy_labels_map_onto_the_canonical_enum() {
        assert_eq!(DealStage::from_legacy_label("LEAD"), Some(DealStage::NewLead));
        assert_eq!(DealStage::from_legacy_label("QUALIFIED"), Some(DealStage::Contacted));
        assert_eq!(
            DealStage::from_legacy_label("INITIAL_QUOTE_SENT"),
            Some(DealStage::QuoteSent)
        );
        assert_eq!(
            DealStage::from_legacy_label("site_visit_complete"),
            Some(DealStage::FollowUp)
        );
        assert_eq!(DealStage::from_legacy_label("DEPOSIT_PAID"), Some(DealStage::Won));
        assert_eq!(DealStage::from_legacy_label("ON_HOLD"), Some(DealStage::OnHold));
        assert_eq!(DealStage::from_legacy_label("SHIPPED"), None);
    }

    #[test]
    fn closing_stages_drive_status_and_probability() {
        assert_eq!(DealStage::Won.status(), DealStatus::Won);
        assert_eq!(DealStage::Lost.status(), DealStatus::Lost);
        assert_eq!(DealStage::OnHold.status(), DealStatus::OnHold);
        assert_eq!(DealStage::Negotiation.status(), DealStatus::Open);

        assert_eq!(DealStage::Won.forced_probability(), Some(100));
        assert_eq!(DealStage::Lost.forced_probability(), Some(0));
        assert_eq!(DealStage::QuoteSent.forced_probability(), None);
    }

    #[test]
    fn metrics_fold_rows_and_keep_empty_buckets() {
        let rows = vec![
            StageAggregateRow {
                stage: DealStage::QuoteSent,
                status: DealStatus::Open,
                deal_count: 3,
                total_value: dec("30000.00"),
            },
            StageAggregateRow {
                stage: DealStage::Won,
                status: DealStatus::Won,
                deal_count: 2,
                total_value: dec("21000.50"),
            },
            StageAggregateRow {
                stage: DealStage::NewLead,
                status: DealStatus::Open,
                deal_count: 1,
                total_value: dec("8000.00"),
            },
        ];

        let metrics = DealMetrics::from_rows(&rows);

        assert_eq!(metrics.total_deals, 6);
        assert_eq!(metrics.total_value, dec("59000.50"));
        assert_eq!(metrics.by_stage.len(), DealStage::ALL.len());
        assert_eq!(metrics.by_status.len(), DealStatus::ALL.len());
        assert_eq!(metrics.by_stage[&DealStage::QuoteSent].count, 3);
        assert_eq!(metrics.by_stage[&DealStage::Lost], MetricBucket::default());
        assert_eq!(metrics.by_status[&DealStatus::Open].count, 4);
        assert_eq!(metrics.by_status[&DealStatus::Open].value, dec("38000.00"));
        assert_eq!(metrics.by_status[&DealStatus::Won].value, dec("21000.50"));
    }

    fn stored_deal() -> Deal {
        let now = Utc::now();
        Deal {
            id: Uuid::new_v4(),
            title: "Nguyen - 10kW + battery".into(),
            value: dec("18250.00"),
            probability: 60,
            stage: DealStage::Negotiation,
            status: DealStatus::Open,
            lead_score: 72,
            expected_close_date: NaiveDate::from_ymd_opt(2026, 11, 30),
            lead_id: Some(Uuid::new_v4()),
            owner_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            lead_name: Some("Tran Nguyen".into()),
            lead_email: None,
            lead_phone: None,
        }
    }

    #[test]
    fn empty_changes_keep_every_stored_field() {
        let deal = stored_deal();
        let draft = DealChanges::default().apply_to(&deal);

        assert_eq!(draft.title, deal.title);
        assert_eq!(draft.value, deal.value);
        assert_eq!(draft.probability, 60);
        assert_eq!(draft.stage, DealStage::Negotiation);
        assert_eq!(draft.lead_score, 72);
        assert_eq!(draft.expected_close_date, deal.expected_close_date);
        assert_eq!(draft.lead_id, deal.lead_id);
        assert_eq!(draft.owner_id, deal.owner_id);
    }

    #[test]
    fn changes_override_only_the_fields_they_carry() {
        let deal = stored_deal();
        let draft = DealChanges {
            title: Some("Nguyen - 13kW + battery".into()),
            probability: Some(80),
            ..Default::default()
        }
        .apply_to(&deal);

        assert_eq!(draft.title, "Nguyen - 13kW + battery");
        assert_eq!(draft.probability, 80);
        assert_eq!(draft.stage, deal.stage);
        assert_eq!(draft.owner_id, deal.owner_id);
    }

    #[test]
    fn metrics_serialize_with_stage_labels_as_keys() {
        let metrics = DealMetrics::from_rows(&[]);
        let json = serde_json::to_value(&metrics).unwrap();

        assert_eq!(json["totalDeals"], 0);
        assert!(json["byStage"].get("NEW_LEAD").is_some());
        assert!(json["byStage"].get("ON_HOLD").is_some());
        assert!(json["byStatus"].get("OPEN").is_some());
    }
}
