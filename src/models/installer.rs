// src/models/installer.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentType {
    Panel,
    Inverter,
    Battery,
}

/// Outcome of checking one scanned or typed serial number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SerialValidation {
    /// Normalised form of the input.
    #[schema(example = "JKM2024A0012345")]
    pub serial: String,
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub detected_type: Option<EquipmentType>,
    #[schema(example = "Jinko Solar")]
    pub manufacturer: Option<String>,
    pub duplicate: bool,
}
