use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A harvest lot (batch) registered by a producer.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "lots")]
#[schema(as = Lot)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub producer_id: i32,
    #[schema(example = "Arabica coffee")]
    pub product: String,
    #[schema(example = 1200.5)]
    pub quantity: f64,
    pub harvest_date: NaiveDate,
    pub production_location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::producer::Entity",
        from = "Column::ProducerId",
        to = "super::producer::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Producer,
    #[sea_orm(has_many = "super::tracking_event::Entity")]
    TrackingEvents,
    #[sea_orm(has_many = "super::transport_lot::Entity")]
    TransportLots,
}

impl Related<super::producer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Producer.def()
    }
}

impl Related<super::tracking_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrackingEvents.def()
    }
}

impl Related<super::transport::Entity> for Entity {
    fn to() -> RelationDef {
        super::transport_lot::Relation::Transport.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::transport_lot::Relation::Lot.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
