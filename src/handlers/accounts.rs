use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};

use crate::{
    auth::{AuthUser, Role},
    handlers::{AppJson, AppPath},
    services::accounts::{
        LoginInput, LoginResponse, ProducerProfile, RegisterProducerInput,
        RegisterTransporterInput, TransporterProfile, UpdateProducerInput,
    },
    ApiCreated, ApiResponse, ApiResult, AppState,
};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/cadastro-produtor", post(register_producer))
        .route("/login-produtor", post(login_producer))
        .route("/cadastro-transportador", post(register_transporter))
        .route("/login-transportador", post(login_transporter))
        .route("/login-admin", post(login_admin))
        .route("/produtor/:id", get(get_producer).put(update_producer))
        .route("/transportadores", get(list_transporters))
}

#[utoipa::path(
    post,
    path = "/api/cadastro-produtor",
    request_body = RegisterProducerInput,
    responses(
        (status = 201, description = "Producer registered", body = ApiResponse<ProducerProfile>),
        (status = 400, description = "Missing or invalid fields", body = crate::errors::ErrorResponse),
        (status = 409, description = "National ID already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "accounts"
)]
pub async fn register_producer(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterProducerInput>,
) -> ApiCreated<ProducerProfile> {
    let profile = state.services.accounts.register_producer(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(profile).with_message("Producer registered")),
    ))
}

#[utoipa::path(
    post,
    path = "/api/cadastro-transportador",
    request_body = RegisterTransporterInput,
    responses(
        (status = 201, description = "Transporter registered", body = ApiResponse<TransporterProfile>),
        (status = 400, description = "Missing or invalid fields", body = crate::errors::ErrorResponse),
        (status = 409, description = "National ID already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "accounts"
)]
pub async fn register_transporter(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterTransporterInput>,
) -> ApiCreated<TransporterProfile> {
    let profile = state.services.accounts.register_transporter(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(profile).with_message("Transporter registered")),
    ))
}

#[utoipa::path(
    post,
    path = "/api/login-produtor",
    request_body = LoginInput,
    responses(
        (status = 200, description = "Session opened", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse)
    ),
    tag = "accounts"
)]
pub async fn login_producer(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginInput>,
) -> ApiResult<LoginResponse> {
    login(state, Role::Producer, payload).await
}

#[utoipa::path(
    post,
    path = "/api/login-transportador",
    request_body = LoginInput,
    responses(
        (status = 200, description = "Session opened", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse)
    ),
    tag = "accounts"
)]
pub async fn login_transporter(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginInput>,
) -> ApiResult<LoginResponse> {
    login(state, Role::Transporter, payload).await
}

#[utoipa::path(
    post,
    path = "/api/login-admin",
    request_body = LoginInput,
    responses(
        (status = 200, description = "Session opened", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse)
    ),
    tag = "accounts"
)]
pub async fn login_admin(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginInput>,
) -> ApiResult<LoginResponse> {
    login(state, Role::Admin, payload).await
}

async fn login(state: AppState, role: Role, payload: LoginInput) -> ApiResult<LoginResponse> {
    let session = state.services.accounts.login(role, payload).await?;
    Ok(Json(ApiResponse::success(session).with_message("Login successful")))
}

#[utoipa::path(
    get,
    path = "/api/produtor/{id}",
    params(("id" = i32, Path, description = "Producer ID")),
    responses(
        (status = 200, description = "Producer profile", body = ApiResponse<ProducerProfile>),
        (status = 401, description = "Missing or invalid token", body = crate::errors::ErrorResponse),
        (status = 403, description = "Another producer's profile", body = crate::errors::ErrorResponse),
        (status = 404, description = "Producer not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "accounts"
)]
pub async fn get_producer(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i32>,
) -> ApiResult<ProducerProfile> {
    user.require_producer_or_admin(id)?;
    let profile = state.services.accounts.get_producer(id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

#[utoipa::path(
    put,
    path = "/api/produtor/{id}",
    params(("id" = i32, Path, description = "Producer ID")),
    request_body = UpdateProducerInput,
    responses(
        (status = 200, description = "Producer profile updated", body = ApiResponse<ProducerProfile>),
        (status = 403, description = "Another producer's profile", body = crate::errors::ErrorResponse),
        (status = 404, description = "Producer not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "accounts"
)]
pub async fn update_producer(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateProducerInput>,
) -> ApiResult<ProducerProfile> {
    user.require_producer_or_admin(id)?;
    let profile = state.services.accounts.update_producer(id, payload).await?;
    Ok(Json(ApiResponse::success(profile).with_message("Profile updated")))
}

#[utoipa::path(
    get,
    path = "/api/transportadores",
    responses(
        (status = 200, description = "Transporter directory", body = ApiResponse<Vec<TransporterProfile>>),
        (status = 401, description = "Missing or invalid token", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "accounts"
)]
pub async fn list_transporters(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<Vec<TransporterProfile>> {
    let transporters = state.services.accounts.list_transporters().await?;
    Ok(Json(ApiResponse::success(transporters)))
}
