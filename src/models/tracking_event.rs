use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

use super::{normalize_label, UnknownStatus};

/// Stage of a lot in its own timeline, independent of any transport.
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
pub enum TrackingStatus {
    #[sea_orm(string_value = "REGISTERED")]
    Registered,
    #[sea_orm(string_value = "STORED")]
    Stored,
    #[sea_orm(string_value = "IN_TRANSIT")]
    InTransit,
    #[sea_orm(string_value = "DELIVERED")]
    Delivered,
}

impl TrackingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingStatus::Registered => "REGISTERED",
            TrackingStatus::Stored => "STORED",
            TrackingStatus::InTransit => "IN_TRANSIT",
            TrackingStatus::Delivered => "DELIVERED",
        }
    }
}

impl fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackingStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize_label(raw).as_str() {
            "REGISTERED" | "REGISTERED_BY_PRODUCER" | "REGISTRADO" | "REGISTRADO_PELO_PRODUTOR" => {
                Ok(TrackingStatus::Registered)
            }
            "STORED" | "ARMAZENADO" | "EM_ESTOQUE" => Ok(TrackingStatus::Stored),
            "IN_TRANSIT" | "EM_TRANSPORTE" | "EM_TRANSITO" => Ok(TrackingStatus::InTransit),
            "DELIVERED" | "ENTREGUE" => Ok(TrackingStatus::Delivered),
            _ => Err(UnknownStatus(raw.trim().to_string())),
        }
    }
}

/// One entry of a lot's append-only timeline.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "tracking_events")]
#[schema(as = TrackingEvent)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub lot_id: i32,
    pub status: TrackingStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub location: String,
    pub transporter_id: Option<i32>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::lot::Entity",
        from = "Column::LotId",
        to = "super::lot::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Lot,
    #[sea_orm(
        belongs_to = "super::transporter::Entity",
        from = "Column::TransporterId",
        to = "super::transporter::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Transporter,
}

impl Related<super::lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("REGISTERED", TrackingStatus::Registered)]
    #[case("Registrado pelo produtor", TrackingStatus::Registered)]
    #[case("armazenado", TrackingStatus::Stored)]
    #[case("Em trânsito", TrackingStatus::InTransit)]
    #[case("in-transit", TrackingStatus::InTransit)]
    #[case("ENTREGUE", TrackingStatus::Delivered)]
    fn parses_known_labels(#[case] raw: &str, #[case] expected: TrackingStatus) {
        assert_eq!(raw.parse::<TrackingStatus>(), Ok(expected));
    }

    #[test]
    fn rejects_unknown_labels() {
        assert_eq!(
            "lost at sea".parse::<TrackingStatus>(),
            Err(UnknownStatus("lost at sea".into()))
        );
        assert!("".parse::<TrackingStatus>().is_err());
    }

    #[test]
    fn serializes_canonical_names() {
        assert_eq!(
            serde_json::to_string(&TrackingStatus::InTransit).unwrap(),
            "\"IN_TRANSIT\""
        );
        assert_eq!(TrackingStatus::Registered.to_string(), "REGISTERED");
    }
}
