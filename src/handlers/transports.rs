use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};

use crate::{
    auth::{AuthUser, Role},
    errors::ServiceError,
    handlers::{AppJson, AppPath},
    models::lot,
    services::tracking::{
        CreateTransportByNationalIdInput, CreateTransportInput, TransportFilter, TransportSummary,
        UpdateTransportStatusInput,
    },
    ApiCreated, ApiResponse, ApiResult, AppState,
};

pub fn transport_routes() -> Router<AppState> {
    Router::new()
        .route("/transportes", post(create_transport))
        .route("/transportes/novo", post(create_transport_by_national_id))
        .route("/transportes/:id", get(get_transport))
        .route("/transportes/:id/lotes", get(list_lots_for_transport))
        .route(
            "/transportes/:id/status",
            put(update_transport_status).patch(update_transport_status),
        )
        .route(
            "/transportes/transportador/:id",
            get(list_transporter_transports),
        )
        .route("/transportes/produtor/:id", get(list_producer_transports))
        .route(
            "/meus-transportes-produtor/:cpf",
            get(list_transports_by_national_id),
        )
        .route("/admin/transportes", get(list_all_transports))
}

#[utoipa::path(
    post,
    path = "/api/transportes/novo",
    request_body = CreateTransportByNationalIdInput,
    responses(
        (status = 201, description = "Transport opened in PREPARING", body = ApiResponse<TransportSummary>),
        (status = 400, description = "Missing fields or lot of another producer", body = crate::errors::ErrorResponse),
        (status = 403, description = "Transport for another transporter", body = crate::errors::ErrorResponse),
        (status = 404, description = "Producer, transporter or lot not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transports"
)]
pub async fn create_transport_by_national_id(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(mut payload): AppJson<CreateTransportByNationalIdInput>,
) -> ApiCreated<TransportSummary> {
    if payload.transporter_id.is_none() && user.role == Role::Transporter {
        payload.transporter_id = Some(user.account_id);
    }
    match payload.transporter_id {
        Some(transporter_id) => user.require_transporter_or_admin(transporter_id)?,
        None => user.require_admin()?,
    }

    let transport = state
        .services
        .tracking
        .create_transport_by_national_id(payload)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(transport).with_message("Transport created")),
    ))
}

#[utoipa::path(
    post,
    path = "/api/transportes",
    request_body = CreateTransportInput,
    responses(
        (status = 201, description = "Transport opened with its manifest", body = ApiResponse<TransportSummary>),
        (status = 400, description = "Missing fields, empty manifest or foreign lot", body = crate::errors::ErrorResponse),
        (status = 403, description = "Transport for another producer", body = crate::errors::ErrorResponse),
        (status = 404, description = "Producer, transporter or lot not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transports"
)]
pub async fn create_transport(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(mut payload): AppJson<CreateTransportInput>,
) -> ApiCreated<TransportSummary> {
    if payload.producer_id.is_none() && user.role == Role::Producer {
        payload.producer_id = Some(user.account_id);
    }
    match payload.producer_id {
        Some(producer_id) => user.require_producer_or_admin(producer_id)?,
        None => user.require_admin()?,
    }

    let transport = state.services.tracking.create_transport(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(transport).with_message("Transport created")),
    ))
}

#[utoipa::path(
    get,
    path = "/api/transportes/{id}",
    params(("id" = i32, Path, description = "Transport ID")),
    responses(
        (status = 200, description = "Transport with parties and manifest", body = ApiResponse<TransportSummary>),
        (status = 401, description = "Missing or invalid token", body = crate::errors::ErrorResponse),
        (status = 404, description = "Transport not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transports"
)]
pub async fn get_transport(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(id): AppPath<i32>,
) -> ApiResult<TransportSummary> {
    let transport = state.services.tracking.get_transport(id).await?;
    Ok(Json(ApiResponse::success(transport)))
}

#[utoipa::path(
    get,
    path = "/api/transportes/{id}/lotes",
    params(("id" = i32, Path, description = "Transport ID")),
    responses(
        (status = 200, description = "Lots on the manifest", body = ApiResponse<Vec<lot::Model>>),
        (status = 404, description = "Transport not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transports"
)]
pub async fn list_lots_for_transport(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(id): AppPath<i32>,
) -> ApiResult<Vec<lot::Model>> {
    let lots = state.services.tracking.list_lots_for_transport(id).await?;
    Ok(Json(ApiResponse::success(lots)))
}

#[utoipa::path(
    put,
    path = "/api/transportes/{id}/status",
    params(("id" = i32, Path, description = "Transport ID")),
    request_body = UpdateTransportStatusInput,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<TransportSummary>),
        (status = 400, description = "Unknown status", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller is not a party to the transport", body = crate::errors::ErrorResponse),
        (status = 404, description = "Transport not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transports"
)]
pub async fn update_transport_status(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateTransportStatusInput>,
) -> ApiResult<TransportSummary> {
    let current = state.services.tracking.get_transport(id).await?;
    if !(user.is_admin()
        || user.is_transporter(current.transporter.id)
        || user.is_producer(current.producer.id))
    {
        return Err(ServiceError::Forbidden(
            "only the parties to a transport may change its status".to_string(),
        ));
    }

    let updated = state
        .services
        .tracking
        .update_transport_status(id, payload)
        .await?;
    Ok(Json(ApiResponse::success(updated).with_message("Transport status updated")))
}

#[utoipa::path(
    get,
    path = "/api/transportes/transportador/{id}",
    params(("id" = i32, Path, description = "Transporter ID")),
    responses(
        (status = 200, description = "Transports assigned to the transporter", body = ApiResponse<Vec<TransportSummary>>),
        (status = 403, description = "Another transporter's transports", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transports"
)]
pub async fn list_transporter_transports(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(transporter_id): AppPath<i32>,
) -> ApiResult<Vec<TransportSummary>> {
    user.require_transporter_or_admin(transporter_id)?;
    list(state, TransportFilter::Transporter(transporter_id)).await
}

#[utoipa::path(
    get,
    path = "/api/transportes/produtor/{id}",
    params(("id" = i32, Path, description = "Producer ID")),
    responses(
        (status = 200, description = "Transports opened for the producer", body = ApiResponse<Vec<TransportSummary>>),
        (status = 403, description = "Another producer's transports", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transports"
)]
pub async fn list_producer_transports(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(producer_id): AppPath<i32>,
) -> ApiResult<Vec<TransportSummary>> {
    user.require_producer_or_admin(producer_id)?;
    list(state, TransportFilter::Producer(producer_id)).await
}

#[utoipa::path(
    get,
    path = "/api/meus-transportes-produtor/{cpf}",
    params(("cpf" = String, Path, description = "Producer national ID")),
    responses(
        (status = 200, description = "Transports of the producer; empty for an unknown national ID", body = ApiResponse<Vec<TransportSummary>>),
        (status = 403, description = "Another producer's transports", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transports"
)]
pub async fn list_transports_by_national_id(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(national_id): AppPath<String>,
) -> ApiResult<Vec<TransportSummary>> {
    if !user.is_admin() {
        let owns = user.role == Role::Producer
            && state
                .services
                .accounts
                .get_producer(user.account_id)
                .await?
                .national_id
                == national_id.trim();
        if !owns {
            return Err(ServiceError::Forbidden(
                "insufficient permissions for this resource".to_string(),
            ));
        }
    }
    list(state, TransportFilter::ProducerNationalId(national_id)).await
}

#[utoipa::path(
    get,
    path = "/api/admin/transportes",
    responses(
        (status = 200, description = "Every transport", body = ApiResponse<Vec<TransportSummary>>),
        (status = 403, description = "Administrators only", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transports"
)]
pub async fn list_all_transports(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<TransportSummary>> {
    user.require_admin()?;
    list(state, TransportFilter::All).await
}

async fn list(state: AppState, filter: TransportFilter) -> ApiResult<Vec<TransportSummary>> {
    let transports = state.services.tracking.list_transports(filter).await?;
    Ok(Json(ApiResponse::success(transports)))
}
