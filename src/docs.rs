// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth & users ---
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::reset_password,

        // --- CRM ---
        handlers::crm::change_stage,
        handlers::crm::get_pipeline,
        handlers::crm::list_deals,
        handlers::crm::create_deal,
        handlers::crm::get_deal,
        handlers::crm::update_deal,
        handlers::crm::delete_deal,
        handlers::crm::list_deal_activities,
        handlers::crm::add_deal_activity,
        handlers::crm::list_recent_activities,
        handlers::crm::list_leads,
        handlers::crm::create_lead,
        handlers::crm::get_lead,
        handlers::crm::convert_lead,

        // --- Staff & compliance ---
        handlers::staff::list_staff,
        handlers::staff::create_staff,
        handlers::staff::get_staff,
        handlers::staff::update_staff,
        handlers::staff::deactivate_staff,
        handlers::staff::get_certifications,
        handlers::staff::save_certifications,
        handlers::staff::compliance_overview,
        handlers::staff::list_teams,
        handlers::staff::create_team,
        handlers::staff::get_team,
        handlers::staff::update_team,
        handlers::staff::delete_team,
        handlers::staff::add_team_member,
        handlers::staff::remove_team_member,
        handlers::staff::list_reviews,
        handlers::staff::create_review,
        handlers::staff::get_compensation,
        handlers::staff::update_compensation,

        // --- Website admin ---
        handlers::content::list_posts,
        handlers::content::create_post,
        handlers::content::get_post,
        handlers::content::update_post,
        handlers::content::delete_post,
        handlers::content::list_testimonials,
        handlers::content::create_testimonial,
        handlers::content::update_testimonial,
        handlers::content::delete_testimonial,
        handlers::content::list_slides,
        handlers::content::create_slide,
        handlers::content::update_slide,
        handlers::content::delete_slide,
        handlers::content::reorder_slides,
        handlers::content::get_about,
        handlers::content::save_about,

        // --- Public site ---
        handlers::public::list_published_posts,
        handlers::public::get_published_post,
        handlers::public::list_approved_testimonials,
        handlers::public::list_active_slides,
        handlers::public::get_public_about,

        // --- Installer ---
        handlers::serials::validate_serial_number,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            handlers::users::CreateUserPayload,
            handlers::users::UpdateUserPayload,
            handlers::users::ResetPasswordPayload,

            // --- CRM ---
            models::crm::DealStage,
            models::crm::DealStatus,
            models::crm::Deal,
            models::crm::DealSortField,
            models::crm::SortOrder,
            models::crm::MetricBucket,
            models::crm::DealMetrics,
            models::crm::ActivityType,
            models::crm::DealActivity,
            models::crm::StageTransition,
            models::crm::DealList,
            models::crm::LeadStatus,
            models::crm::Lead,
            services::pipeline_board::PipelineColumn,
            services::pipeline_board::PipelineBoard,
            handlers::crm::StageChangePayload,
            handlers::crm::DealPayload,
            handlers::crm::DealUpdatePayload,
            handlers::crm::ActivityPayload,
            handlers::crm::LeadPayload,

            // --- Staff ---
            models::staff::EmploymentType,
            models::staff::Staff,
            models::staff::Team,
            models::staff::TeamWithMembers,
            models::staff::CecAccreditationType,
            models::staff::Certifications,
            models::staff::CertificationRecord,
            models::staff::ExpiryStatus,
            models::staff::ComplianceStatus,
            models::staff::ComplianceBreakdown,
            models::staff::ComplianceScore,
            models::staff::StaffCertifications,
            models::staff::StaffComplianceSummary,
            models::staff::PerformanceReview,
            models::staff::EmploymentCostBreakdown,
            models::staff::Compensation,
            handlers::staff::StaffPayload,
            handlers::staff::TeamPayload,
            handlers::staff::TeamMemberPayload,
            handlers::staff::ReviewPayload,
            handlers::staff::CompensationPayload,

            // --- Website ---
            models::content::PostStatus,
            models::content::BlogPost,
            models::content::Testimonial,
            models::content::HeroSlide,
            models::content::AboutPage,
            handlers::content::BlogPostPayload,
            handlers::content::TestimonialPayload,
            handlers::content::HeroSlidePayload,
            handlers::content::ReorderSlidesPayload,
            handlers::content::AboutPagePayload,

            // --- Installer ---
            models::installer::EquipmentType,
            models::installer::SerialValidation,
            handlers::serials::ValidateSerialPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Sign-in and current user"),
        (name = "Users", description = "Back-office user accounts"),
        (name = "CRM", description = "Deals, pipeline board, activities and leads"),
        (name = "Staff", description = "Staff, teams, reviews and compensation"),
        (name = "Compliance", description = "Certifications and compliance scoring"),
        (name = "Website", description = "Marketing site content management"),
        (name = "Public", description = "Marketing site public reads"),
        (name = "Installer", description = "Field tools for installers")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_stage_endpoint_with_bearer_scheme() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/crm/deals/{id}/stage"));
        assert!(doc.paths.paths.contains_key("/api/public/blog/{slug}"));
        let schemes = &doc.components.as_ref().unwrap().security_schemes;
        assert!(schemes.contains_key("api_jwt"));
    }
}
