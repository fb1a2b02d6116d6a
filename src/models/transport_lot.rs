use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Manifest link between a transport and one of the lots it carries.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transport_lots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub transport_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub lot_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transport::Entity",
        from = "Column::TransportId",
        to = "super::transport::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Transport,
    #[sea_orm(
        belongs_to = "super::lot::Entity",
        from = "Column::LotId",
        to = "super::lot::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Lot,
}

impl Related<super::transport::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transport.def()
    }
}

impl Related<super::lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
