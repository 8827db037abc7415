// src/services/compliance.rs

use chrono::NaiveDate;

use crate::models::staff::{
    Certifications, ComplianceBreakdown, ComplianceScore, ComplianceStatus, ExpiryStatus,
};

pub const CEC_WEIGHT: u32 = 30;
pub const LICENSE_WEIGHT: u32 = 30;
pub const SAFETY_WEIGHT: u32 = 20;
pub const TRAINING_WEIGHT: u32 = 20;

/// Days before expiry (inclusive) at which an item counts as expiring soon.
pub const EXPIRY_WARNING_DAYS: i64 = 30;

const COMPLIANT_THRESHOLD: u32 = 90;

pub fn expiry_status(expiry: Option<NaiveDate>, as_of: NaiveDate) -> ExpiryStatus {
    match expiry {
        None => ExpiryStatus::NotRecorded,
        Some(date) if date < as_of => ExpiryStatus::Expired,
        Some(date) if (date - as_of).num_days() <= EXPIRY_WARNING_DAYS => {
            ExpiryStatus::ExpiringSoon
        }
        Some(_) => ExpiryStatus::Valid,
    }
}

fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

fn days_left(expiry: Option<NaiveDate>, as_of: NaiveDate) -> i64 {
    expiry.map(|date| (date - as_of).num_days()).unwrap_or_default()
}

/// Scores a mandatory accreditation (CEC or electrical license): half the
/// weight for holding a number, the other half for a valid expiry.
/// The flag is true when the item blocks compliance outright.
fn score_accreditation(
    label: &str,
    number: Option<&str>,
    expiry: Option<NaiveDate>,
    weight: u32,
    as_of: NaiveDate,
    issues: &mut Vec<String>,
) -> (u32, bool) {
    if !has_text(number) {
        issues.push(format!("{} missing", label));
        return (0, true);
    }

    let held = weight / 2;
    let dated = weight - held;
    match expiry_status(expiry, as_of) {
        ExpiryStatus::Valid => (weight, false),
        ExpiryStatus::ExpiringSoon => {
            issues.push(format!("{} expires in {} days", label, days_left(expiry, as_of)));
            (held + dated / 2, false)
        }
        ExpiryStatus::NotRecorded => {
            issues.push(format!("{} expiry date not recorded", label));
            (held, false)
        }
        ExpiryStatus::Expired => {
            issues.push(format!("{} expired", label));
            (0, true)
        }
    }
}

/// Scores an optional ticket that carries its own expiry date.
fn score_dated_item(
    label: &str,
    held: bool,
    expiry: Option<NaiveDate>,
    weight: u32,
    as_of: NaiveDate,
    issues: &mut Vec<String>,
) -> u32 {
    if !held {
        issues.push(format!("{} missing", label));
        return 0;
    }

    match expiry_status(expiry, as_of) {
        ExpiryStatus::Valid => weight,
        ExpiryStatus::ExpiringSoon => {
            issues.push(format!("{} expires in {} days", label, days_left(expiry, as_of)));
            weight / 2
        }
        ExpiryStatus::NotRecorded => {
            issues.push(format!("{} expiry date not recorded", label));
            0
        }
        ExpiryStatus::Expired => {
            issues.push(format!("{} expired", label));
            0
        }
    }
}

/// Derives the 0..=100 compliance score of one staff member as of `as_of`.
///
/// Buckets: CEC accreditation 30, electrical license 30, safety tickets 20,
/// specialised training 20. A missing or expired CEC accreditation or
/// electrical license makes the member non-compliant whatever the total.
pub fn compute_compliance_score(record: &Certifications, as_of: NaiveDate) -> ComplianceScore {
    let mut issues = Vec::new();

    let (cec_accreditation, cec_blocking) = score_accreditation(
        "CEC accreditation",
        record.cec_accreditation_number.as_deref(),
        record.cec_expiry_date,
        CEC_WEIGHT,
        as_of,
        &mut issues,
    );

    let (electrical_license, license_blocking) = score_accreditation(
        "Electrical license",
        record.electrical_license_number.as_deref(),
        record.license_expiry_date,
        LICENSE_WEIGHT,
        as_of,
        &mut issues,
    );

    // White card never expires.
    let white_card = if has_text(record.white_card_number.as_deref()) {
        10
    } else {
        issues.push("White card missing".to_string());
        0
    };
    let safety_certifications = white_card
        + score_dated_item(
            "Working at heights certification",
            record.working_at_heights,
            record.working_at_heights_expiry,
            5,
            as_of,
            &mut issues,
        )
        + score_dated_item(
            "First aid certificate",
            record.first_aid_cert,
            record.first_aid_expiry,
            5,
            as_of,
            &mut issues,
        );

    let specialized_training = score_dated_item(
        "Battery installation certification",
        record.battery_install_cert,
        record.battery_install_expiry,
        7,
        as_of,
        &mut issues,
    ) + score_dated_item(
        "EV charger certification",
        record.ev_charger_cert,
        record.ev_charger_expiry,
        6,
        as_of,
        &mut issues,
    ) + score_dated_item(
        "Solar design certification",
        record.solar_design_cert,
        record.solar_design_expiry,
        7,
        as_of,
        &mut issues,
    );

    let breakdown = ComplianceBreakdown {
        cec_accreditation,
        electrical_license,
        safety_certifications,
        specialized_training,
    };
    let overall = breakdown.total().min(100);

    let status = if cec_blocking || license_blocking {
        ComplianceStatus::NonCompliant
    } else if overall >= COMPLIANT_THRESHOLD {
        ComplianceStatus::Compliant
    } else {
        ComplianceStatus::AtRisk
    };

    ComplianceScore {
        overall,
        breakdown,
        status,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn fully_certified() -> Certifications {
        let far = today() + Duration::days(400);
        Certifications {
            cec_accreditation_number: Some("A1234567".into()),
            cec_expiry_date: Some(far),
            electrical_license_number: Some("EC123456".into()),
            electrical_license_state: Some("WA".into()),
            license_expiry_date: Some(far),
            white_card_number: Some("WC-998877".into()),
            working_at_heights: true,
            working_at_heights_expiry: Some(far),
            first_aid_cert: true,
            first_aid_expiry: Some(far),
            battery_install_cert: true,
            battery_install_expiry: Some(far),
            ev_charger_cert: true,
            ev_charger_expiry: Some(far),
            solar_design_cert: true,
            solar_design_expiry: Some(far),
            ..Default::default()
        }
    }

    #[test]
    fn fully_valid_record_scores_100() {
        let score = compute_compliance_score(&fully_certified(), today());

        assert_eq!(score.overall, 100);
        assert_eq!(score.status, ComplianceStatus::Compliant);
        assert!(score.issues.is_empty());
        assert_eq!(
            score.breakdown,
            ComplianceBreakdown {
                cec_accreditation: 30,
                electrical_license: 30,
                safety_certifications: 20,
                specialized_training: 20,
            }
        );
    }

    #[test]
    fn expired_cec_costs_exactly_its_bucket() {
        let mut record = fully_certified();
        record.cec_expiry_date = Some(today() - Duration::days(1));

        let baseline = compute_compliance_score(&fully_certified(), today());
        let score = compute_compliance_score(&record, today());

        assert_eq!(score.breakdown.cec_accreditation, 0);
        assert_eq!(baseline.overall - score.overall, CEC_WEIGHT);
        assert_eq!(score.issues.len(), 1);
        assert!(score.issues[0].contains("CEC"));
        assert_eq!(score.status, ComplianceStatus::NonCompliant);
    }

    #[test]
    fn expiring_in_15_days_gets_partial_credit() {
        let mut record = fully_certified();
        record.cec_expiry_date = Some(today() + Duration::days(15));

        let score = compute_compliance_score(&record, today());

        assert!(score.breakdown.cec_accreditation > 0);
        assert!(score.breakdown.cec_accreditation < CEC_WEIGHT);
        assert_eq!(score.issues, vec!["CEC accreditation expires in 15 days".to_string()]);
        assert_ne!(score.status, ComplianceStatus::NonCompliant);
    }

    #[test]
    fn missing_license_is_non_compliant_regardless_of_the_rest() {
        let mut record = fully_certified();
        record.electrical_license_number = None;

        let score = compute_compliance_score(&record, today());

        assert_eq!(score.breakdown.electrical_license, 0);
        assert_eq!(score.overall, 70);
        assert_eq!(score.status, ComplianceStatus::NonCompliant);

        record.electrical_license_number = Some("   ".into());
        let score = compute_compliance_score(&record, today());
        assert_eq!(score.status, ComplianceStatus::NonCompliant);
    }

    #[test]
    fn weights_sum_to_100_and_buckets_stay_within_them() {
        assert_eq!(CEC_WEIGHT + LICENSE_WEIGHT + SAFETY_WEIGHT + TRAINING_WEIGHT, 100);

        let soon = today() + Duration::days(10);
        let past = today() - Duration::days(10);
        let mut partial = fully_certified();
        partial.license_expiry_date = Some(soon);
        partial.first_aid_expiry = Some(past);
        partial.ev_charger_expiry = None;

        for record in [Certifications::default(), fully_certified(), partial] {
            let score = compute_compliance_score(&record, today());
            assert!(score.breakdown.cec_accreditation <= CEC_WEIGHT);
            assert!(score.breakdown.electrical_license <= LICENSE_WEIGHT);
            assert!(score.breakdown.safety_certifications <= SAFETY_WEIGHT);
            assert!(score.breakdown.specialized_training <= TRAINING_WEIGHT);
            assert_eq!(score.overall, score.breakdown.total());
            assert!(score.overall <= 100);
        }
    }

    #[test]
    fn empty_record_lists_every_gap() {
        let score = compute_compliance_score(&Certifications::default(), today());

        assert_eq!(score.overall, 0);
        assert_eq!(score.status, ComplianceStatus::NonCompliant);
        assert_eq!(score.issues.len(), 8);
    }

    #[test]
    fn expiry_boundaries() {
        let as_of = today();
        assert_eq!(expiry_status(None, as_of), ExpiryStatus::NotRecorded);
        assert_eq!(expiry_status(Some(as_of - Duration::days(1)), as_of), ExpiryStatus::Expired);
        assert_eq!(expiry_status(Some(as_of), as_of), ExpiryStatus::ExpiringSoon);
        assert_eq!(
            expiry_status(Some(as_of + Duration::days(30)), as_of),
            ExpiryStatus::ExpiringSoon
        );
        assert_eq!(expiry_status(Some(as_of + Duration::days(31)), as_of), ExpiryStatus::Valid);
    }

    #[test]
    fn optional_tickets_score_half_when_expiring_and_zero_without_date() {
        let mut record = fully_certified();
        record.working_at_heights_expiry = Some(today() + Duration::days(5));
        record.battery_install_expiry = None;

        let score = compute_compliance_score(&record, today());

        // 10 + 2 + 5
        assert_eq!(score.breakdown.safety_certifications, 17);
        // 0 + 6 + 7
        assert_eq!(score.breakdown.specialized_training, 13);
        assert_eq!(score.overall, 90);
        assert_eq!(score.status, ComplianceStatus::Compliant);
        assert_eq!(score.issues.len(), 2);
    }

    #[test]
    fn accreditation_without_expiry_keeps_holding_credit() {
        let mut record = fully_certified();
        record.license_expiry_date = None;

        let score = compute_compliance_score(&record, today());

        assert_eq!(score.breakdown.electrical_license, 15);
        assert_eq!(score.status, ComplianceStatus::AtRisk);
        assert_eq!(score.issues, vec!["Electrical license expiry date not recorded".to_string()]);
    }
}
