pub mod accounts;
pub mod lots;
pub mod reports;
pub mod transports;

use std::sync::Arc;

use axum::extract::{FromRequest, FromRequestParts};

use crate::{
    auth::AuthService,
    db::DbPool,
    errors::ServiceError,
    services::{
        accounts::AccountService, lots::LotService, reports::ReportService,
        tracking::TrackingService,
    },
};

/// JSON body whose rejections render as `ErrorResponse`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ServiceError))]
pub struct AppJson<T>(pub T);

/// Path parameters whose rejections render as `ErrorResponse`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ServiceError))]
pub struct AppPath<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ServiceError))]
pub struct AppQuery<T>(pub T);

/// Services shared by every handler.
#[derive(Clone)]
pub struct AppServices {
    pub tracking: Arc<TrackingService>,
    pub lots: Arc<LotService>,
    pub accounts: Arc<AccountService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        auth_service: Arc<AuthService>,
        lot_reference_prefix: impl Into<String>,
    ) -> Self {
        let tracking = Arc::new(TrackingService::new(db_pool.clone(), lot_reference_prefix));
        let lots = Arc::new(LotService::new(db_pool.clone(), tracking.clone()));
        let accounts = Arc::new(AccountService::new(db_pool.clone(), auth_service));
        let reports = Arc::new(ReportService::new(db_pool));

        Self {
            tracking,
            lots,
            accounts,
            reports,
        }
    }
}
