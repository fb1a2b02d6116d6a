use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

use super::{normalize_label, UnknownStatus};

/// Lifecycle of a transport. Any status may follow any other; `Delivered` is the
/// only one with a side effect (it stamps the arrival time once).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportStatus {
    #[sea_orm(string_value = "PREPARING")]
    Preparing,
    #[sea_orm(string_value = "LOADING")]
    Loading,
    #[sea_orm(string_value = "IN_TRANSIT")]
    InTransit,
    #[sea_orm(string_value = "UNLOADING")]
    Unloading,
    #[sea_orm(string_value = "DELIVERED")]
    Delivered,
}

impl TransportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportStatus::Preparing => "PREPARING",
            TransportStatus::Loading => "LOADING",
            TransportStatus::InTransit => "IN_TRANSIT",
            TransportStatus::Unloading => "UNLOADING",
            TransportStatus::Delivered => "DELIVERED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TransportStatus::Delivered)
    }
}

impl fmt::Display for TransportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize_label(raw).as_str() {
            "PREPARING" | "EM_PREPARO" | "PREPARANDO" => Ok(TransportStatus::Preparing),
            "LOADING" | "CARREGANDO" => Ok(TransportStatus::Loading),
            "IN_TRANSIT" | "EM_TRANSPORTE" | "EM_TRANSITO" => Ok(TransportStatus::InTransit),
            "UNLOADING" | "DESCARREGANDO" => Ok(TransportStatus::Unloading),
            "DELIVERED" | "ENTREGUE" | "CONCLUIDO" | "COMPLETED" => Ok(TransportStatus::Delivered),
            _ => Err(UnknownStatus(raw.trim().to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transports")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub producer_id: i32,
    pub transporter_id: i32,
    pub destination: String,
    pub status: TransportStatus,
    pub departed_at: DateTime<Utc>,
    pub arrived_at: Option<DateTime<Utc>>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
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
    #[sea_orm(
        belongs_to = "super::transporter::Entity",
        from = "Column::TransporterId",
        to = "super::transporter::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Transporter,
    #[sea_orm(has_many = "super::transport_lot::Entity")]
    TransportLots,
}

impl Related<super::producer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Producer.def()
    }
}

impl Related<super::transporter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transporter.def()
    }
}

impl Related<super::lot::Entity> for Entity {
    fn to() -> RelationDef {
        super::transport_lot::Relation::Lot.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::transport_lot::Relation::Transport.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("EM PREPARO", TransportStatus::Preparing)]
    #[case("carregando", TransportStatus::Loading)]
    #[case("LOADING", TransportStatus::Loading)]
    #[case("EM TRANSPORTE", TransportStatus::InTransit)]
    #[case("EM_TRANSITO", TransportStatus::InTransit)]
    #[case("in transit", TransportStatus::InTransit)]
    #[case("Descarregando", TransportStatus::Unloading)]
    #[case("entregue", TransportStatus::Delivered)]
    #[case("CONCLUIDO", TransportStatus::Delivered)]
    #[case("completed", TransportStatus::Delivered)]
    fn parses_both_label_conventions(#[case] raw: &str, #[case] expected: TransportStatus) {
        assert_eq!(raw.parse::<TransportStatus>(), Ok(expected));
    }

    #[test]
    fn rejects_unknown_labels() {
        assert!("PARKED".parse::<TransportStatus>().is_err());
        assert!("   ".parse::<TransportStatus>().is_err());
    }

    #[test]
    fn only_delivered_is_terminal() {
        assert!(TransportStatus::Delivered.is_terminal());
        assert!(!TransportStatus::Unloading.is_terminal());
        assert!(!TransportStatus::InTransit.is_terminal());
    }
}
