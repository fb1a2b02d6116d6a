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
    models::{lot, tracking_event},
    services::{
        lots::{DeletedLot, LotDetail, UpdateLotInput},
        tracking::{AppendEventInput, RegisterLotInput, RegisteredLot, TransportSummary},
    },
    ApiCreated, ApiResponse, ApiResult, AppState,
};

pub fn lot_routes() -> Router<AppState> {
    Router::new()
        .route("/lotes", post(register_lot))
        .route("/lotes/produtor/:id", get(list_producer_lots))
        .route(
            "/lotes/:id",
            get(get_lot).put(update_lot).delete(delete_lot),
        )
        .route("/lotes/:id/status", post(append_tracking_event))
        .route("/lotes/:id/historico", get(lot_history))
        .route("/lotes/:id/transportes", get(list_transports_for_lot))
}

#[utoipa::path(
    post,
    path = "/api/lotes",
    request_body = RegisterLotInput,
    responses(
        (status = 201, description = "Lot registered with its first tracking event", body = ApiResponse<RegisteredLot>),
        (status = 400, description = "Missing or invalid fields", body = crate::errors::ErrorResponse),
        (status = 403, description = "Lot for another producer", body = crate::errors::ErrorResponse),
        (status = 404, description = "Producer not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "lots"
)]
pub async fn register_lot(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(mut payload): AppJson<RegisterLotInput>,
) -> ApiCreated<RegisteredLot> {
    if payload.producer_id.is_none() && user.role == Role::Producer {
        payload.producer_id = Some(user.account_id);
    }
    if let Some(producer_id) = payload.producer_id {
        user.require_producer_or_admin(producer_id)?;
    } else {
        user.require_admin()?;
    }

    let registered = state.services.tracking.register_lot(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(registered).with_message("Lot registered")),
    ))
}

#[utoipa::path(
    get,
    path = "/api/lotes/produtor/{id}",
    params(("id" = i32, Path, description = "Producer ID")),
    responses(
        (status = 200, description = "Producer's lots, most recent harvest first", body = ApiResponse<Vec<lot::Model>>),
        (status = 403, description = "Another producer's lots", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "lots"
)]
pub async fn list_producer_lots(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(producer_id): AppPath<i32>,
) -> ApiResult<Vec<lot::Model>> {
    user.require_producer_or_admin(producer_id)?;
    let lots = state.services.lots.list_for_producer(producer_id).await?;
    Ok(Json(ApiResponse::success(lots)))
}

#[utoipa::path(
    get,
    path = "/api/lotes/{id}",
    params(("id" = i32, Path, description = "Lot ID")),
    responses(
        (status = 200, description = "Lot with its timeline", body = ApiResponse<LotDetail>),
        (status = 404, description = "Lot not found", body = crate::errors::ErrorResponse)
    ),
    tag = "lots"
)]
pub async fn get_lot(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> ApiResult<LotDetail> {
    let detail = state.services.lots.detail(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

#[utoipa::path(
    put,
    path = "/api/lotes/{id}",
    params(("id" = i32, Path, description = "Lot ID")),
    request_body = UpdateLotInput,
    responses(
        (status = 200, description = "Lot updated", body = ApiResponse<lot::Model>),
        (status = 400, description = "Blank or invalid fields", body = crate::errors::ErrorResponse),
        (status = 403, description = "Lot owned by another producer", body = crate::errors::ErrorResponse),
        (status = 404, description = "Lot not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "lots"
)]
pub async fn update_lot(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateLotInput>,
) -> ApiResult<lot::Model> {
    let current = state.services.lots.get(id).await?;
    user.require_producer_or_admin(current.producer_id)?;

    let updated = state.services.lots.update(id, payload).await?;
    Ok(Json(ApiResponse::success(updated).with_message("Lot updated")))
}

#[utoipa::path(
    delete,
    path = "/api/lotes/{id}",
    params(("id" = i32, Path, description = "Lot ID")),
    responses(
        (status = 200, description = "Lot and its timeline removed", body = ApiResponse<DeletedLot>),
        (status = 403, description = "Lot owned by another producer", body = crate::errors::ErrorResponse),
        (status = 404, description = "Lot not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Lot is listed on a transport", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "lots"
)]
pub async fn delete_lot(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i32>,
) -> ApiResult<DeletedLot> {
    let current = state.services.lots.get(id).await?;
    user.require_producer_or_admin(current.producer_id)?;

    let deleted = state.services.lots.delete(id).await?;
    Ok(Json(ApiResponse::success(deleted).with_message("Lot deleted")))
}

#[utoipa::path(
    post,
    path = "/api/lotes/{id}/status",
    params(("id" = i32, Path, description = "Lot ID")),
    request_body = AppendEventInput,
    responses(
        (status = 201, description = "Tracking event appended", body = ApiResponse<tracking_event::Model>),
        (status = 400, description = "Unknown status or missing location", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller may not update this lot", body = crate::errors::ErrorResponse),
        (status = 404, description = "Lot or transporter not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "lots"
)]
pub async fn append_tracking_event(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<i32>,
    AppJson(mut payload): AppJson<AppendEventInput>,
) -> ApiCreated<tracking_event::Model> {
    match user.role {
        Role::Admin => {}
        Role::Transporter => match payload.transporter_id {
            None => payload.transporter_id = Some(user.account_id),
            Some(transporter_id) => user.require_transporter_or_admin(transporter_id)?,
        },
        Role::Producer => {
            let lot = state.services.lots.get(id).await?;
            user.require_producer_or_admin(lot.producer_id)?;
        }
    }

    let event = state
        .services
        .tracking
        .append_tracking_event(id, payload)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(event).with_message("Tracking event recorded")),
    ))
}

#[utoipa::path(
    get,
    path = "/api/lotes/{id}/historico",
    params(("id" = i32, Path, description = "Lot ID")),
    responses(
        (status = 200, description = "Timeline, oldest first", body = ApiResponse<Vec<tracking_event::Model>>)
    ),
    tag = "lots"
)]
pub async fn lot_history(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> ApiResult<Vec<tracking_event::Model>> {
    let history = state.services.tracking.lot_history(id).await?;
    Ok(Json(ApiResponse::success(history)))
}

#[utoipa::path(
    get,
    path = "/api/lotes/{id}/transportes",
    params(("id" = i32, Path, description = "Lot ID")),
    responses(
        (status = 200, description = "Transports carrying the lot", body = ApiResponse<Vec<TransportSummary>>),
        (status = 401, description = "Missing or invalid token", body = crate::errors::ErrorResponse),
        (status = 404, description = "Lot not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "lots"
)]
pub async fn list_transports_for_lot(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(id): AppPath<i32>,
) -> ApiResult<Vec<TransportSummary>> {
    let transports = state.services.tracking.list_transports_for_lot(id).await?;
    Ok(Json(ApiResponse::success(transports)))
}
