use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::{
    sea_query::Expr, ColumnTrait, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::{
    db::DbPool,
    errors::ServiceError,
    models::lot,
    services::{optional_text, required},
};

/// Query string of the production report.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductionReportQuery {
    #[serde(alias = "produtor_id")]
    pub producer_id: Option<i32>,
    /// First harvest date included
    #[serde(alias = "inicio", alias = "data_inicio")]
    pub start: Option<NaiveDate>,
    /// Last harvest date included
    #[serde(alias = "fim", alias = "data_fim")]
    pub end: Option<NaiveDate>,
    #[serde(alias = "produto")]
    pub product: Option<String>,
}

/// Harvest totals for one product.
#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult, ToSchema)]
pub struct ProductionReportRow {
    pub product: String,
    pub total_quantity: f64,
    pub lot_count: i64,
}

/// Aggregations over registered lots.
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Total quantity and lot count per product for one producer, over an inclusive
    /// range of harvest dates.
    #[instrument(skip(self))]
    pub async fn production_report(
        &self,
        query: ProductionReportQuery,
    ) -> Result<Vec<ProductionReportRow>, ServiceError> {
        let producer_id = required(query.producer_id, "producer_id")?;
        let start = required(query.start, "start")?;
        let end = required(query.end, "end")?;
        if start > end {
            return Err(ServiceError::ValidationError(
                "start must not be after end".to_string(),
            ));
        }

        let mut select = lot::Entity::find()
            .select_only()
            .column(lot::Column::Product)
            .column_as(Expr::col(lot::Column::Quantity).sum(), "total_quantity")
            .column_as(Expr::col(lot::Column::Id).count(), "lot_count")
            .filter(lot::Column::ProducerId.eq(producer_id))
            .filter(lot::Column::HarvestDate.between(start, end));

        if let Some(product) = optional_text(query.product) {
            select = select.filter(lot::Column::Product.eq(product));
        }

        let rows = select
            .group_by(lot::Column::Product)
            .order_by_asc(lot::Column::Product)
            .into_model::<ProductionReportRow>()
            .all(&*self.db)
            .await?;

        info!(producer_id, products = rows.len(), "production report generated");
        Ok(rows)
    }
}
