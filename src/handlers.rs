pub mod auth;
pub mod content;
pub mod crm;
pub mod public;
pub mod serials;
pub mod staff;
pub mod users;
