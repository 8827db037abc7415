pub mod auth;
pub mod content;
pub mod crm;
pub mod installer;
pub mod staff;
