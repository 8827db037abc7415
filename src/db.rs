pub mod user_repo;
pub use user_repo::UserRepository;
pub mod crm_repo;
pub use crm_repo::CrmRepository;
pub mod staff_repo;
pub use staff_repo::StaffRepository;
pub mod content_repo;
pub use content_repo::ContentRepository;
