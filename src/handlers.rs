use axum::extract::{FromRequest, FromRequestParts, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{Admin, AuthUser};
use crate::error::ApiError;
use crate::models::{ClassFields, Role};
use crate::AppState;

/// JSON body extractor whose rejection is rendered as the failure envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Path extractor whose rejection is rendered as the failure envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiSuccess<T> {
    success: bool,
    status_code: u16,
    data: T,
    message: String,
}

fn envelope<T: Serialize>(status: StatusCode, data: T, message: &str) -> Response {
    let body = ApiSuccess {
        success: true,
        status_code: status.as_u16(),
        data,
        message: message.to_string(),
    };
    (status, axum::Json(body)).into_response()
}

#[derive(Debug, serde::Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, serde::Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, serde::Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, serde::Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, serde::Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDetailsRequest {
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, serde::Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleRequest {
    pub user_id: Uuid,
    pub new_role: Role,
}

#[derive(Debug, serde::Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub class_id: Uuid,
}

#[utoipa::path(get, path = "/", tag = "service")]
pub async fn root() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "message": "Gym Class Scheduling API",
        "endpoints": {
            "/users": "Registration, login and account management",
            "/class": "Class schedule management (admin)",
            "/booking": "Class bookings"
        }
    }))
}

#[utoipa::path(get, path = "/healthz/live", tag = "service")]
pub async fn healthz_live() -> impl IntoResponse {
    axum::Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(get, path = "/healthz/ready", tag = "service")]
pub async fn healthz_ready() -> impl IntoResponse {
    axum::Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(
    post,
    path = "/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered"),
        (status = 400, description = "Missing or malformed fields"),
        (status = 409, description = "Email already registered")
    ),
    tag = "users"
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<Response, ApiError> {
    let user = state
        .identity
        .register(&payload.full_name, &payload.email, &payload.password)
        .await?;
    Ok(envelope(
        StatusCode::CREATED,
        user,
        "User registered successfully",
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    user: crate::models::PublicUser,
    access_token: String,
    refresh_token: String,
}

#[utoipa::path(
    post,
    path = "/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in"),
        (status = 401, description = "Invalid credentials"),
        (status = 404, description = "User does not exist")
    ),
    tag = "users"
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Response, ApiError> {
    let logged_in = state.identity.login(&payload.email, &payload.password).await?;
    let data = LoginData {
        user: logged_in.user,
        access_token: logged_in.access_token,
        refresh_token: logged_in.refresh_token,
    };
    Ok(envelope(StatusCode::OK, data, "User logged in successfully"))
}

#[utoipa::path(
    post,
    path = "/users/logout",
    responses((status = 200, description = "Logged out")),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, ApiError> {
    state.identity.logout(user.id).await?;
    Ok(envelope(
        StatusCode::OK,
        serde_json::json!({}),
        "User logged out successfully",
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenPairData {
    access_token: String,
    refresh_token: String,
}

#[utoipa::path(
    post,
    path = "/users/refresh-token",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens rotated"),
        (status = 401, description = "Invalid or reused refresh token")
    ),
    tag = "users"
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> Result<Response, ApiError> {
    let pair = state.identity.refresh(&payload.refresh_token).await?;
    let data = TokenPairData {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    };
    Ok(envelope(StatusCode::OK, data, "Access token refreshed"))
}

#[utoipa::path(
    post,
    path = "/users/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Invalid old password")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<Response, ApiError> {
    state
        .identity
        .change_password(user.id, &payload.old_password, &payload.new_password)
        .await?;
    Ok(envelope(
        StatusCode::OK,
        serde_json::json!({}),
        "Password changed successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/users/current-user",
    responses((status = 200, description = "Current user", body = crate::models::PublicUser)),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn current_user(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, ApiError> {
    let current = state.identity.current_user(user.id).await?;
    Ok(envelope(StatusCode::OK, current, "User fetched successfully"))
}

#[utoipa::path(
    patch,
    path = "/users/update-user",
    request_body = UpdateDetailsRequest,
    responses(
        (status = 200, description = "Details updated", body = crate::models::PublicUser),
        (status = 400, description = "Missing or malformed fields"),
        (status = 409, description = "Email already registered")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<UpdateDetailsRequest>,
) -> Result<Response, ApiError> {
    let updated = state
        .identity
        .update_details(user.id, &payload.full_name, &payload.email)
        .await?;
    Ok(envelope(
        StatusCode::OK,
        updated,
        "Account details updated successfully",
    ))
}

#[utoipa::path(
    patch,
    path = "/users/update-role",
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated"),
        (status = 403, description = "Admins only"),
        (status = 404, description = "User does not exist")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_role(
    State(state): State<AppState>,
    Admin(_): Admin,
    AppJson(payload): AppJson<UpdateRoleRequest>,
) -> Result<Response, ApiError> {
    let user = state
        .identity
        .update_role(payload.user_id, payload.new_role)
        .await?;
    Ok(envelope(StatusCode::OK, user, "User role updated successfully"))
}

#[utoipa::path(
    get,
    path = "/users/get-all-trainers",
    responses(
        (status = 200, description = "Trainers", body = [crate::models::PublicUser]),
        (status = 404, description = "No trainers found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_all_trainers(
    State(state): State<AppState>,
    Admin(_): Admin,
) -> Result<Response, ApiError> {
    let trainers = state.identity.list_trainers().await?;
    Ok(envelope(
        StatusCode::OK,
        trainers,
        "Trainers fetched successfully",
    ))
}

#[utoipa::path(
    post,
    path = "/booking/create-booking",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking admitted", body = crate::models::Booking),
        (status = 404, description = "Class not found"),
        (status = 409, description = "Already booked or class full")
    ),
    security(("bearer_auth" = [])),
    tag = "booking"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateBookingRequest>,
) -> Result<Response, ApiError> {
    let booking = state.booking.create(user.id, payload.class_id).await?;
    Ok(envelope(
        StatusCode::CREATED,
        booking,
        "Booking created successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/booking/get-user-bookings",
    responses((status = 200, description = "Caller's bookings", body = [crate::models::BookingView])),
    security(("bearer_auth" = [])),
    tag = "booking"
)]
pub async fn get_user_bookings(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, ApiError> {
    let bookings = state.booking.user_bookings(user.id).await?;
    Ok(envelope(
        StatusCode::OK,
        bookings,
        "User bookings fetched successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/booking/get-class-bookings/{class_id}",
    params(("class_id" = Uuid, Path, description = "Class id")),
    responses((status = 200, description = "Bookings for the class", body = [crate::models::BookingView])),
    security(("bearer_auth" = [])),
    tag = "booking"
)]
pub async fn get_class_bookings(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(class_id): AppPath<Uuid>,
) -> Result<Response, ApiError> {
    let bookings = state.booking.class_bookings(class_id).await?;
    Ok(envelope(
        StatusCode::OK,
        bookings,
        "Class bookings fetched successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/booking/get-all-bookings",
    responses(
        (status = 200, description = "All bookings", body = [crate::models::BookingView]),
        (status = 403, description = "Admins only")
    ),
    security(("bearer_auth" = [])),
    tag = "booking"
)]
pub async fn get_all_bookings(
    State(state): State<AppState>,
    Admin(_): Admin,
) -> Result<Response, ApiError> {
    let bookings = state.booking.all_bookings().await?;
    Ok(envelope(
        StatusCode::OK,
        bookings,
        "All bookings fetched successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/booking/export-bookings",
    responses(
        (status = 200, description = "iCal file", content_type = "text/calendar"),
        (status = 404, description = "No bookings found")
    ),
    security(("bearer_auth" = [])),
    tag = "booking"
)]
pub async fn export_bookings(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, ApiError> {
    let bookings = state.booking.user_bookings(user.id).await?;
    if bookings.is_empty() {
        return Err(ApiError::NotFound("No bookings found".into()));
    }

    let body = state.exporter.generate(&bookings);
    Ok((
        StatusCode::OK,
        [
            ("content-type", "text/calendar"),
            ("content-disposition", "attachment; filename=bookings.ics"),
        ],
        body,
    )
        .into_response())
}

#[utoipa::path(
    delete,
    path = "/booking/delete-booking/{booking_id}",
    params(("booking_id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking deleted"),
        (status = 403, description = "Not the owner and not an admin"),
        (status = 404, description = "Booking not found")
    ),
    security(("bearer_auth" = [])),
    tag = "booking"
)]
pub async fn delete_booking(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(booking_id): AppPath<Uuid>,
) -> Result<Response, ApiError> {
    state.booking.delete(booking_id, user).await?;
    Ok(envelope(
        StatusCode::OK,
        serde_json::json!({}),
        "Booking deleted successfully",
    ))
}

#[utoipa::path(
    post,
    path = "/class/create-class",
    request_body = ClassFields,
    responses(
        (status = 201, description = "Class scheduled", body = crate::models::GymClass),
        (status = 400, description = "Missing or malformed fields"),
        (status = 409, description = "Day full or duplicate schedule")
    ),
    security(("bearer_auth" = [])),
    tag = "class"
)]
pub async fn create_class(
    State(state): State<AppState>,
    Admin(_): Admin,
    AppJson(payload): AppJson<ClassFields>,
) -> Result<Response, ApiError> {
    let class = state.scheduling.create(payload).await?;
    Ok(envelope(
        StatusCode::CREATED,
        class,
        "Class schedule created successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/class/get-all-classes",
    responses((status = 200, description = "All classes", body = [crate::models::GymClass])),
    security(("bearer_auth" = [])),
    tag = "class"
)]
pub async fn get_all_classes(
    State(state): State<AppState>,
    Admin(_): Admin,
) -> Result<Response, ApiError> {
    let classes = state.scheduling.list().await?;
    Ok(envelope(
        StatusCode::OK,
        classes,
        "Class schedules retrieved successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/class/get-single-class/{id}",
    params(("id" = Uuid, Path, description = "Class id")),
    responses(
        (status = 200, description = "Class", body = crate::models::GymClass),
        (status = 404, description = "Class schedule not found")
    ),
    security(("bearer_auth" = [])),
    tag = "class"
)]
pub async fn get_single_class(
    State(state): State<AppState>,
    Admin(_): Admin,
    AppPath(id): AppPath<Uuid>,
) -> Result<Response, ApiError> {
    let class = state.scheduling.get(id).await?;
    Ok(envelope(
        StatusCode::OK,
        class,
        "Class schedule retrieved successfully",
    ))
}

#[utoipa::path(
    put,
    path = "/class/update-class/{id}",
    params(("id" = Uuid, Path, description = "Class id")),
    request_body = ClassFields,
    responses(
        (status = 200, description = "Class updated", body = crate::models::GymClass),
        (status = 404, description = "Class schedule not found")
    ),
    security(("bearer_auth" = [])),
    tag = "class"
)]
pub async fn update_class(
    State(state): State<AppState>,
    Admin(_): Admin,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<ClassFields>,
) -> Result<Response, ApiError> {
    let class = state.scheduling.update(id, payload).await?;
    Ok(envelope(
        StatusCode::OK,
        class,
        "Class schedule updated successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/class/delete-class/{id}",
    params(("id" = Uuid, Path, description = "Class id")),
    responses(
        (status = 200, description = "Class deleted"),
        (status = 404, description = "Class schedule not found")
    ),
    security(("bearer_auth" = [])),
    tag = "class"
)]
pub async fn delete_class(
    State(state): State<AppState>,
    Admin(_): Admin,
    AppPath(id): AppPath<Uuid>,
) -> Result<Response, ApiError> {
    state.scheduling.delete(id).await?;
    Ok(envelope(
        StatusCode::OK,
        serde_json::Value::Null,
        "Class schedule deleted successfully",
    ))
}
