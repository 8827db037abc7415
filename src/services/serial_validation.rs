// src/services/serial_validation.rs

use std::sync::LazyLock;

use regex::Regex;

use crate::models::installer::{EquipmentType, SerialValidation};

// A bare "SN" only counts as a label when a separator follows it.
static SERIAL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(S/N\s*[:#]?|SN\s*[:#]|SN\s+)\s*").expect("serial prefix pattern")
});

static SERIAL_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9-]{6,30}$").expect("serial format pattern"));

/// Known manufacturer prefixes. Longer prefixes are listed before any
/// shorter prefix they start with.
const PREFIXES: &[(&str, EquipmentType, &str)] = &[
    ("TSLA", EquipmentType::Battery, "Tesla"),
    ("BYD", EquipmentType::Battery, "BYD"),
    ("LGC", EquipmentType::Battery, "LG Energy Solution"),
    ("JKM", EquipmentType::Panel, "Jinko Solar"),
    ("TSM", EquipmentType::Panel, "Trina Solar"),
    ("REC", EquipmentType::Panel, "REC"),
    ("LR", EquipmentType::Panel, "LONGi"),
    ("CS", EquipmentType::Panel, "Canadian Solar"),
    ("QC", EquipmentType::Panel, "Qcells"),
    ("FRO", EquipmentType::Inverter, "Fronius"),
    ("SE", EquipmentType::Inverter, "SolarEdge"),
    ("GW", EquipmentType::Inverter, "GoodWe"),
    ("SG", EquipmentType::Inverter, "Sungrow"),
    ("ENP", EquipmentType::Inverter, "Enphase"),
];

/// Trims, strips a `S/N:` or `SN` label, uppercases and drops inner whitespace.
pub fn normalize_serial(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = SERIAL_PREFIX.replace(trimmed, "");
    stripped
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

pub fn detect_equipment(serial: &str) -> Option<(EquipmentType, &'static str)> {
    PREFIXES
        .iter()
        .find(|(prefix, _, _)| serial.starts_with(prefix))
        .map(|(_, kind, manufacturer)| (*kind, *manufacturer))
}

pub fn validate_serial(
    raw: &str,
    existing: &[String],
    expected_type: Option<EquipmentType>,
) -> SerialValidation {
    let serial = normalize_serial(raw);
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if serial.is_empty() {
        errors.push("Serial number is empty".to_string());
    } else if !SERIAL_FORMAT.is_match(&serial) {
        errors.push(
            "Serial number must be 6 to 30 characters of letters, digits or dashes".to_string(),
        );
    }
    if !serial.is_empty() && !serial.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Serial number must contain at least one digit".to_string());
    }

    let detected = detect_equipment(&serial);
    match (detected, expected_type) {
        (Some((kind, manufacturer)), Some(expected)) if kind != expected => {
            warnings.push(format!(
                "Serial looks like a {} {:?}, expected {:?}",
                manufacturer, kind, expected
            ));
        }
        (None, _) if !serial.is_empty() => {
            warnings.push("Manufacturer not recognised from serial prefix".to_string());
        }
        _ => {}
    }

    let duplicate = !serial.is_empty() && existing.iter().any(|s| normalize_serial(s) == serial);
    if duplicate {
        errors.push(format!("Serial number {} has already been recorded", serial));
    }

    SerialValidation {
        is_valid: errors.is_empty(),
        serial,
        errors,
        warnings,
        detected_type: detected.map(|(kind, _)| kind),
        manufacturer: detected.map(|(_, name)| name.to_string()),
        duplicate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalisation_strips_labels_and_spaces() {
        assert_eq!(normalize_serial("  s/n: jkm 2024 a001  "), "JKM2024A001");
        assert_eq!(normalize_serial("SN 7E1234-56"), "7E1234-56");
        assert_eq!(normalize_serial("SN#ab12 34cd"), "AB1234CD");
        assert_eq!(normalize_serial("LR5-54HIH"), "LR5-54HIH");
    }

    #[test]
    fn serials_starting_with_sn_keep_their_prefix() {
        assert_eq!(normalize_serial("SNX1234567"), "SNX1234567");
        assert_eq!(normalize_serial("sn4455667788"), "SN4455667788");
        assert_eq!(normalize_serial("SN: SNX1234567"), "SNX1234567");
        assert_eq!(normalize_serial("S/N X1234567"), "X1234567");
        assert_eq!(normalize_serial("S/NX1234567"), "X1234567");
    }

    #[test]
    fn valid_panel_serial_with_detected_manufacturer() {
        let result = validate_serial("JKM2024A0012345", &[], Some(EquipmentType::Panel));

        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
        assert_eq!(result.detected_type, Some(EquipmentType::Panel));
        assert_eq!(result.manufacturer.as_deref(), Some("Jinko Solar"));
        assert!(!result.duplicate);
    }

    #[test]
    fn format_errors() {
        assert!(!validate_serial("AB12", &[], None).is_valid);
        assert!(!validate_serial(&"A1".repeat(16), &[], None).is_valid);
        assert!(!validate_serial("JKM2024_001", &[], None).is_valid);
        assert!(!validate_serial("", &[], None).is_valid);

        let no_digit = validate_serial("ABCDEFGH", &[], None);
        assert!(!no_digit.is_valid);
        assert_eq!(no_digit.errors.len(), 1);
    }

    #[test]
    fn duplicates_are_case_insensitive() {
        let existing = vec!["sn: tsla-0099887".to_string()];
        let result = validate_serial("TSLA-0099887", &existing, Some(EquipmentType::Battery));

        assert!(result.duplicate);
        assert!(!result.is_valid);
    }

    #[test]
    fn type_mismatch_is_only_a_warning() {
        let result = validate_serial("SE7600H-12345", &[], Some(EquipmentType::Panel));

        assert!(result.is_valid);
        assert_eq!(result.detected_type, Some(EquipmentType::Inverter));
        assert_eq!(result.warnings.len(), 1);
    }
}
