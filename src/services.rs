pub mod auth;
pub mod compensation;
pub mod compliance;
pub mod content_service;
pub mod crm_service;
pub mod pipeline_board;
pub mod serial_validation;
pub mod staff_service;
pub mod user_service;
