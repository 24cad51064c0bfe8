// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::vendor_login,
        handlers::auth::distributor_login,
        handlers::auth::admin_login,
        handlers::auth::whoami,

        // --- Captcha ---
        handlers::captcha::request_captcha,

        // --- Users ---
        handlers::users::register_status,
        handlers::users::register,
        handlers::users::reset_password_status,
        handlers::users::reset_password,
        handlers::users::get_me,
        handlers::users::get_address,
        handlers::users::put_address,
        handlers::users::list_collections,
        handlers::users::add_collection,
        handlers::users::remove_collection,

        // --- Vendors ---
        handlers::vendors::register_status,
        handlers::vendors::register,
        handlers::vendors::get_profile,
        handlers::vendors::list_distributors,
        handlers::vendors::create_distributor,
        handlers::vendors::update_distributor_address,
        handlers::vendors::request_revocation,

        // --- Distributors ---
        handlers::distributors::get_profile,

        // --- Items ---
        handlers::items::list_items,
        handlers::items::get_item,
        handlers::items::list_choices,
        handlers::items::list_own_items,
        handlers::items::create_item,
        handlers::items::add_component,
        handlers::items::delete_item,

        // --- Areas ---
        handlers::areas::list_provinces,
        handlers::areas::get_area,
        handlers::areas::list_children,
        handlers::areas::get_chain,
        handlers::areas::city_distributors,

        // --- Admin ---
        handlers::admin::get_statistics,
        handlers::admin::list_vendors,
        handlers::admin::list_pending_vendors,
        handlers::admin::confirm_vendor,
        handlers::admin::reject_vendor,
        handlers::admin::list_distributors,
        handlers::admin::list_revocations,
        handlers::admin::approve_revocation,
        handlers::admin::list_items,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::LoginPayload,
            models::auth::ContactStepPayload,
            models::auth::UserDetailsPayload,
            models::auth::ResetPasswordPayload,
            models::auth::AuthResponse,

            // --- Workflow ---
            models::workflow::CaptchaAction,
            models::workflow::CaptchaRequest,
            models::workflow::StepAccepted,
            models::workflow::StepStatus,
            models::workflow::StepRedirect,

            // --- Areas ---
            models::area::Area,
            models::address::FormattedAddress,
            models::address::AddressPayload,

            // --- Vendors ---
            models::vendor::Vendor,
            models::vendor::VendorProfile,
            models::vendor::VendorDetailsPayload,
            models::vendor::RejectVendorPayload,

            // --- Distributors ---
            models::distributor::Distributor,
            models::distributor::DistributorProfile,
            models::distributor::DistributorRevocation,
            models::distributor::CreateDistributorPayload,
            models::distributor::RevocationPayload,
            models::distributor::CityDistributors,

            // --- Items ---
            models::item::Item,
            models::item::ItemAttribute,
            models::item::ItemAttributes,
            models::item::ItemSummary,
            models::item::ItemDetail,
            models::item::ItemPayload,
            models::item::LookupRow,
            models::collection::CollectionPayload,

            // --- Admin ---
            models::admin::Statistics,
        )
    ),
    tags(
        (name = "Auth", description = "Sign-in for every account kind"),
        (name = "Captcha", description = "One-time codes for the two-step flows"),
        (name = "Users", description = "Registration, password reset, address and collections"),
        (name = "Vendors", description = "Vendor registration, profile and distributors"),
        (name = "Distributors", description = "Distributor profile"),
        (name = "Items", description = "Catalog and vendor item management"),
        (name = "Areas", description = "Province, city and district lookup"),
        (name = "Admin", description = "Back-office review and tables")
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
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_the_flows_and_the_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
        assert!(doc.paths.paths.contains_key("/api/users/register"));
        assert!(doc.paths.paths.contains_key("/api/admin/revocations/{id}/approve"));
    }
}
