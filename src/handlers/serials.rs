// src/handlers/serials.rs

use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::{error::AppError, extract::AppJson},
    middleware::rbac::{FieldAccess, RequireRole},
    models::installer::{EquipmentType, SerialValidation},
    services::serial_validation::validate_serial,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateSerialPayload {
    #[validate(length(min = 1, max = 100, message = "Serial number is required."))]
    #[schema(example = "S/N: JKM2024A0012345")]
    pub serial: String,

    /// Serials already recorded on the job.
    #[serde(default)]
    pub existing_serials: Vec<String>,

    pub expected_type: Option<EquipmentType>,
}

// POST /api/installer/serials/validate
#[utoipa::path(
    post,
    path = "/api/installer/serials/validate",
    tag = "Installer",
    request_body = ValidateSerialPayload,
    responses(
        (status = 200, description = "Validation result", body = SerialValidation),
        (status = 400, description = "Empty serial")
    ),
    security(("api_jwt" = []))
)]
pub async fn validate_serial_number(
    _installer: RequireRole<FieldAccess>,
    AppJson(payload): AppJson<ValidateSerialPayload>,
) -> Result<Json<SerialValidation>, AppError> {
    payload.validate()?;

    let result = validate_serial(
        &payload.serial,
        &payload.existing_serials,
        payload.expected_type,
    );

    if !result.is_valid {
        tracing::debug!(serial = %result.serial, errors = ?result.errors, "Serial rejected");
    }
    Ok(Json(result))
}
