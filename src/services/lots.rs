use std::{sync::Arc, time::Instant};

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::{observe_transaction, DbPool},
    errors::ServiceError,
    models::{lot, tracking_event, transport_lot},
    services::{
        tracking::{find_lot, TrackingService},
        transaction_error,
    },
};

/// Partial edit of a lot; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLotInput {
    #[serde(alias = "produto")]
    #[validate(length(max = 200))]
    pub product: Option<String>,
    #[serde(alias = "quantidade")]
    pub quantity: Option<f64>,
    #[serde(alias = "data_colheita")]
    pub harvest_date: Option<NaiveDate>,
    #[serde(alias = "local_producao")]
    #[validate(length(max = 500))]
    pub production_location: Option<String>,
}

/// A lot with its full timeline.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LotDetail {
    pub lot: lot::Model,
    pub history: Vec<tracking_event::Model>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeletedLot {
    pub lot_id: i32,
    /// Number of timeline events removed with the lot
    pub removed_events: u64,
}

#[derive(Clone)]
pub struct LotService {
    db: Arc<DbPool>,
    tracking: Arc<TrackingService>,
}

impl LotService {
    pub fn new(db: Arc<DbPool>, tracking: Arc<TrackingService>) -> Self {
        Self { db, tracking }
    }

    /// A producer's lots, most recent harvest first.
    #[instrument(skip(self))]
    pub async fn list_for_producer(&self, producer_id: i32) -> Result<Vec<lot::Model>, ServiceError> {
        let lots = lot::Entity::find()
            .filter(lot::Column::ProducerId.eq(producer_id))
            .order_by_desc(lot::Column::HarvestDate)
            .order_by_desc(lot::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(lots)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, lot_id: i32) -> Result<lot::Model, ServiceError> {
        find_lot(&*self.db, lot_id).await
    }

    #[instrument(skip(self))]
    pub async fn detail(&self, lot_id: i32) -> Result<LotDetail, ServiceError> {
        let lot = self.get(lot_id).await?;
        let history = self.tracking.lot_history(lot_id).await?;
        Ok(LotDetail { lot, history })
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, lot_id: i32, input: UpdateLotInput) -> Result<lot::Model, ServiceError> {
        input.validate()?;

        let db = &*self.db;
        let current = find_lot(db, lot_id).await?;
        let mut active: lot::ActiveModel = current.into();

        if let Some(product) = input.product {
            let product = product.trim();
            if product.is_empty() {
                return Err(ServiceError::ValidationError(
                    "product must not be blank".to_string(),
                ));
            }
            active.product = Set(product.to_string());
        }
        if let Some(quantity) = input.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(harvest_date) = input.harvest_date {
            active.harvest_date = Set(harvest_date);
        }
        if let Some(location) = input.production_location {
            let location = location.trim();
            if location.is_empty() {
                return Err(ServiceError::ValidationError(
                    "production_location must not be blank".to_string(),
                ));
            }
            active.production_location = Set(Some(location.to_string()));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await?;
        info!(lot_id, "lot updated");
        Ok(updated)
    }

    /// Removes a lot and its timeline. Lots listed on a transport manifest stay.
    #[instrument(skip(self))]
    pub async fn delete(&self, lot_id: i32) -> Result<DeletedLot, ServiceError> {
        let started = Instant::now();
        let result = self
            .db
            .transaction::<_, u64, ServiceError>(|txn| {
                Box::pin(async move {
                    find_lot(txn, lot_id).await?;

                    let manifests = transport_lot::Entity::find()
                        .filter(transport_lot::Column::LotId.eq(lot_id))
                        .count(txn)
                        .await?;
                    if manifests > 0 {
                        return Err(ServiceError::Conflict(format!(
                            "Lot {lot_id} is listed on {manifests} transport(s) and cannot be deleted"
                        )));
                    }

                    let removed = tracking_event::Entity::delete_many()
                        .filter(tracking_event::Column::LotId.eq(lot_id))
                        .exec(txn)
                        .await?
                        .rows_affected;

                    lot::Entity::delete_by_id(lot_id).exec(txn).await?;
                    Ok(removed)
                })
            })
            .await;
        observe_transaction("delete_lot", started, result.is_ok());

        let removed_events = result.map_err(transaction_error)?;
        info!(lot_id, removed_events, "lot deleted");
        Ok(DeletedLot {
            lot_id,
            removed_events,
        })
    }
}
