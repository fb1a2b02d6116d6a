use axum::{
    extract::State,
    response::Json,
    routing::get,
    Router,
};

use crate::{
    auth::{AuthUser, Role},
    handlers::AppQuery,
    services::reports::{ProductionReportQuery, ProductionReportRow},
    ApiResponse, ApiResult, AppState,
};

pub fn report_routes() -> Router<AppState> {
    Router::new().route("/relatorios/producao", get(production_report))
}

/// Production totals per product for a producer over a harvest-date range.
#[utoipa::path(
    get,
    path = "/api/relatorios/producao",
    params(ProductionReportQuery),
    responses(
        (status = 200, description = "Totals per product", body = ApiResponse<Vec<ProductionReportRow>>),
        (status = 400, description = "Missing parameters or start after end", body = crate::errors::ErrorResponse),
        (status = 403, description = "Another producer's report", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn production_report(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(mut query): AppQuery<ProductionReportQuery>,
) -> ApiResult<Vec<ProductionReportRow>> {
    if query.producer_id.is_none() && user.role == Role::Producer {
        query.producer_id = Some(user.account_id);
    }
    if let Some(producer_id) = query.producer_id {
        user.require_producer_or_admin(producer_id)?;
    }

    let rows = state.services.reports.production_report(query).await?;
    Ok(Json(ApiResponse::success(rows)))
}
