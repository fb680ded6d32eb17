use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers::{
    ChangePasswordRequest, CreateBookingRequest, LoginRequest, RefreshRequest, RegisterRequest,
    UpdateDetailsRequest, UpdateRoleRequest,
};
use crate::models::{Booking, BookingView, ClassFields, GymClass, PublicUser, Role};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz_live,
        crate::handlers::healthz_ready,
        crate::handlers::register,
        crate::handlers::login,
        crate::handlers::logout,
        crate::handlers::refresh_token,
        crate::handlers::change_password,
        crate::handlers::current_user,
        crate::handlers::update_user,
        crate::handlers::update_role,
        crate::handlers::get_all_trainers,
        crate::handlers::create_booking,
        crate::handlers::get_user_bookings,
        crate::handlers::get_class_bookings,
        crate::handlers::get_all_bookings,
        crate::handlers::export_bookings,
        crate::handlers::delete_booking,
        crate::handlers::create_class,
        crate::handlers::get_all_classes,
        crate::handlers::get_single_class,
        crate::handlers::update_class,
        crate::handlers::delete_class
    ),
    components(schemas(
        Role,
        PublicUser,
        GymClass,
        ClassFields,
        Booking,
        BookingView,
        RegisterRequest,
        LoginRequest,
        RefreshRequest,
        ChangePasswordRequest,
        UpdateDetailsRequest,
        UpdateRoleRequest,
        CreateBookingRequest
    )),
    tags(
        (name = "service", description = "Service info and health"),
        (name = "users", description = "Accounts, sessions and roles"),
        (name = "class", description = "Class schedule management"),
        (name = "booking", description = "Class booking admission")
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;
