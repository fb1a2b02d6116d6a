//! Lot timelines and the transport lifecycle.
//!
//! Every write that touches more than one row (lot + initial event, transport +
//! manifest) runs inside a single database transaction.

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
    time::Instant,
};

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::{observe_transaction, DbPool},
    errors::ServiceError,
    models::{
        lot, producer, tracking_event, transport, transport_lot, transporter, TrackingStatus,
        TransportStatus,
    },
    services::{optional_text, required, required_text, transaction_error},
};

/// Description of the event recorded when a lot is created.
pub const REGISTERED_DESCRIPTION: &str = "Registered by producer";
/// Location recorded when the producer did not provide one.
pub const UNKNOWN_LOCATION: &str = "Production location not provided";

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct RegisterLotInput {
    #[serde(alias = "produtor_id")]
    #[schema(example = 1)]
    pub producer_id: Option<i32>,
    #[serde(alias = "produto")]
    #[validate(length(max = 200))]
    #[schema(example = "Arabica coffee")]
    pub product: Option<String>,
    #[serde(alias = "quantidade")]
    #[schema(example = 1200.5)]
    pub quantity: Option<f64>,
    #[serde(alias = "data_colheita")]
    #[schema(example = "2024-05-20")]
    pub harvest_date: Option<NaiveDate>,
    #[serde(alias = "local_producao")]
    #[validate(length(max = 500))]
    #[schema(example = "Fazenda Boa Vista, MG")]
    pub production_location: Option<String>,
}

/// Scannable reference for a lot; `url` is meant to be encoded in a QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LotReference {
    pub lot_id: i32,
    #[schema(example = "/lote/17")]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegisteredLot {
    pub lot: lot::Model,
    pub reference: LotReference,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct AppendEventInput {
    #[schema(example = "IN_TRANSIT")]
    pub status: Option<String>,
    #[serde(alias = "local")]
    #[validate(length(max = 500))]
    #[schema(example = "Warehouse 3, Santos")]
    pub location: Option<String>,
    #[serde(alias = "transportador_id")]
    pub transporter_id: Option<i32>,
    #[serde(alias = "descricao")]
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

/// Body of `POST /transportes/novo`: the producer is identified by national ID.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateTransportByNationalIdInput {
    #[serde(alias = "transportador_id")]
    pub transporter_id: Option<i32>,
    #[serde(alias = "cpf_produtor")]
    #[schema(example = "12345678901")]
    pub producer_national_id: Option<String>,
    #[serde(alias = "destino")]
    #[validate(length(max = 500))]
    pub destination: Option<String>,
    #[serde(alias = "descricao")]
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(alias = "lotes_ids")]
    pub lot_ids: Option<Vec<i32>>,
}

/// Body of `POST /transportes`: the producer is identified by id and the manifest is
/// mandatory.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateTransportInput {
    #[serde(alias = "produtor_id")]
    pub producer_id: Option<i32>,
    #[serde(alias = "transportador_id")]
    pub transporter_id: Option<i32>,
    #[serde(alias = "destino")]
    #[validate(length(max = 500))]
    pub destination: Option<String>,
    #[serde(alias = "descricao")]
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// Initial status; defaults to `LOADING`
    #[schema(example = "LOADING")]
    pub status: Option<String>,
    #[serde(alias = "lotes_ids")]
    pub lot_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateTransportStatusInput {
    #[schema(example = "ENTREGUE")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ManifestLot {
    pub id: i32,
    pub product: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ProducerRef {
    pub id: i32,
    pub name: String,
    pub national_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TransporterRef {
    pub id: i32,
    pub name: String,
    pub phone: Option<String>,
}

/// Read-only projection of a transport with its parties and manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TransportSummary {
    pub id: i32,
    pub status: TransportStatus,
    pub destination: String,
    pub description: Option<String>,
    pub departed_at: DateTime<Utc>,
    pub arrived_at: Option<DateTime<Utc>>,
    pub producer: ProducerRef,
    pub transporter: TransporterRef,
    pub lots: Vec<ManifestLot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFilter {
    All,
    Producer(i32),
    ProducerNationalId(String),
    Transporter(i32),
}

pub(crate) async fn find_producer<C: ConnectionTrait>(
    conn: &C,
    producer_id: i32,
) -> Result<producer::Model, ServiceError> {
    producer::Entity::find_by_id(producer_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Producer", producer_id))
}

pub(crate) async fn find_transporter<C: ConnectionTrait>(
    conn: &C,
    transporter_id: i32,
) -> Result<transporter::Model, ServiceError> {
    transporter::Entity::find_by_id(transporter_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Transporter", transporter_id))
}

pub(crate) async fn find_lot<C: ConnectionTrait>(
    conn: &C,
    lot_id: i32,
) -> Result<lot::Model, ServiceError> {
    lot::Entity::find_by_id(lot_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Lot", lot_id))
}

pub(crate) async fn find_transport<C: ConnectionTrait>(
    conn: &C,
    transport_id: i32,
) -> Result<transport::Model, ServiceError> {
    transport::Entity::find_by_id(transport_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Transport", transport_id))
}

/// Service owning lot timelines and transports.
#[derive(Clone)]
pub struct TrackingService {
    db: Arc<DbPool>,
    lot_reference_prefix: String,
}

impl TrackingService {
    pub fn new(db: Arc<DbPool>, lot_reference_prefix: impl Into<String>) -> Self {
        Self {
            db,
            lot_reference_prefix: lot_reference_prefix.into(),
        }
    }

    pub fn lot_reference(&self, lot_id: i32) -> LotReference {
        LotReference {
            lot_id,
            url: format!(
                "{}/{}",
                self.lot_reference_prefix.trim_end_matches('/'),
                lot_id
            ),
        }
    }

    /// Creates a lot together with its initial `REGISTERED` event.
    #[instrument(skip(self, input))]
    pub async fn register_lot(&self, input: RegisterLotInput) -> Result<RegisteredLot, ServiceError> {
        input.validate()?;
        let producer_id = required(input.producer_id, "producer_id")?;
        let product = required_text(input.product, "product")?;
        let quantity = required(input.quantity, "quantity")?;
        let harvest_date = required(input.harvest_date, "harvest_date")?;
        let location = optional_text(input.production_location);

        let started = Instant::now();
        let result = self
            .db
            .transaction::<_, lot::Model, ServiceError>(|txn| {
                Box::pin(async move {
                    find_producer(txn, producer_id).await?;

                    let now = Utc::now();
                    let lot = lot::ActiveModel {
                        producer_id: Set(producer_id),
                        product: Set(product),
                        quantity: Set(quantity),
                        harvest_date: Set(harvest_date),
                        production_location: Set(location.clone()),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    tracking_event::ActiveModel {
                        lot_id: Set(lot.id),
                        status: Set(TrackingStatus::Registered),
                        description: Set(Some(REGISTERED_DESCRIPTION.to_string())),
                        location: Set(location.unwrap_or_else(|| UNKNOWN_LOCATION.to_string())),
                        transporter_id: Set(None),
                        recorded_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    Ok(lot)
                })
            })
            .await;
        observe_transaction("register_lot", started, result.is_ok());

        let lot = result.map_err(transaction_error)?;
        info!(lot_id = lot.id, producer_id, "lot registered");

        Ok(RegisteredLot {
            reference: self.lot_reference(lot.id),
            lot,
        })
    }

    /// Appends one event to a lot's timeline. Earlier events are never touched.
    #[instrument(skip(self, input))]
    pub async fn append_tracking_event(
        &self,
        lot_id: i32,
        input: AppendEventInput,
    ) -> Result<tracking_event::Model, ServiceError> {
        input.validate()?;
        let status: TrackingStatus = required_text(input.status, "status")?.parse()?;
        let location = required_text(input.location, "location")?;

        let db = &*self.db;
        find_lot(db, lot_id).await?;
        if let Some(transporter_id) = input.transporter_id {
            find_transporter(db, transporter_id).await?;
        }

        let event = tracking_event::ActiveModel {
            lot_id: Set(lot_id),
            status: Set(status),
            description: Set(optional_text(input.description)),
            location: Set(location),
            transporter_id: Set(input.transporter_id),
            recorded_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(lot_id, event_id = event.id, status = %event.status, "tracking event appended");
        Ok(event)
    }

    /// Timeline of a lot, oldest first. Empty when the lot has no events.
    #[instrument(skip(self))]
    pub async fn lot_history(&self, lot_id: i32) -> Result<Vec<tracking_event::Model>, ServiceError> {
        let events = tracking_event::Entity::find()
            .filter(tracking_event::Column::LotId.eq(lot_id))
            .order_by_asc(tracking_event::Column::RecordedAt)
            .order_by_asc(tracking_event::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(events)
    }

    /// Opens a transport for the producer identified by `producer_national_id`.
    /// Starts in `PREPARING`; the manifest is optional.
    #[instrument(skip(self, input))]
    pub async fn create_transport_by_national_id(
        &self,
        input: CreateTransportByNationalIdInput,
    ) -> Result<TransportSummary, ServiceError> {
        input.validate()?;
        let transporter_id = required(input.transporter_id, "transporter_id")?;
        let national_id = required_text(input.producer_national_id, "producer_national_id")?;
        let destination = required_text(input.destination, "destination")?;
        let description = optional_text(input.description);
        let lot_ids = input.lot_ids.unwrap_or_default();

        let started = Instant::now();
        let result = self
            .db
            .transaction::<_, transport::Model, ServiceError>(|txn| {
                Box::pin(async move {
                    let producer = producer::Entity::find()
                        .filter(producer::Column::NationalId.eq(national_id.as_str()))
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "No producer registered with national ID {national_id}"
                            ))
                        })?;

                    open_transport(
                        txn,
                        &producer,
                        transporter_id,
                        destination,
                        description,
                        TransportStatus::Preparing,
                        lot_ids,
                    )
                    .await
                })
            })
            .await;
        observe_transaction("create_transport", started, result.is_ok());

        let created = result.map_err(transaction_error)?;
        self.get_transport(created.id).await
    }

    /// Opens a transport for `producer_id` with a non-empty manifest. Starts in the
    /// given status, `LOADING` when none is given.
    #[instrument(skip(self, input))]
    pub async fn create_transport(
        &self,
        input: CreateTransportInput,
    ) -> Result<TransportSummary, ServiceError> {
        input.validate()?;
        let producer_id = required(input.producer_id, "producer_id")?;
        let transporter_id = required(input.transporter_id, "transporter_id")?;
        let destination = required_text(input.destination, "destination")?;
        let description = optional_text(input.description);
        let lot_ids = input.lot_ids.unwrap_or_default();
        if lot_ids.is_empty() {
            return Err(ServiceError::ValidationError(
                "lot_ids must contain at least one lot".to_string(),
            ));
        }
        let status = match optional_text(input.status) {
            Some(raw) => raw.parse::<TransportStatus>()?,
            None => TransportStatus::Loading,
        };

        let started = Instant::now();
        let result = self
            .db
            .transaction::<_, transport::Model, ServiceError>(|txn| {
                Box::pin(async move {
                    let producer = find_producer(txn, producer_id).await?;
                    open_transport(
                        txn,
                        &producer,
                        transporter_id,
                        destination,
                        description,
                        status,
                        lot_ids,
                    )
                    .await
                })
            })
            .await;
        observe_transaction("create_transport", started, result.is_ok());

        let created = result.map_err(transaction_error)?;
        self.get_transport(created.id).await
    }

    /// Moves a transport to a new status. The first move to `DELIVERED` stamps the
    /// arrival time; later ones leave it alone.
    #[instrument(skip(self, input))]
    pub async fn update_transport_status(
        &self,
        transport_id: i32,
        input: UpdateTransportStatusInput,
    ) -> Result<TransportSummary, ServiceError> {
        let status: TransportStatus = required_text(input.status, "status")?.parse()?;

        let db = &*self.db;
        let current = find_transport(db, transport_id).await?;
        let previous = current.status;
        let stamp_arrival = status.is_terminal() && current.arrived_at.is_none();

        let mut active: transport::ActiveModel = current.into();
        active.status = Set(status);
        if stamp_arrival {
            active.arrived_at = Set(Some(Utc::now()));
        }
        active.update(db).await?;

        info!(transport_id, from = %previous, to = %status, "transport status updated");
        self.get_transport(transport_id).await
    }

    #[instrument(skip(self))]
    pub async fn get_transport(&self, transport_id: i32) -> Result<TransportSummary, ServiceError> {
        let db = &*self.db;
        let transport = find_transport(db, transport_id).await?;
        let mut summaries = summarize(db, vec![transport]).await?;
        summaries
            .pop()
            .ok_or_else(|| ServiceError::not_found("Transport", transport_id))
    }

    /// Transports matching `filter`, most recent departure first.
    #[instrument(skip(self))]
    pub async fn list_transports(
        &self,
        filter: TransportFilter,
    ) -> Result<Vec<TransportSummary>, ServiceError> {
        let db = &*self.db;
        let query = match filter {
            TransportFilter::All => transport::Entity::find(),
            TransportFilter::Producer(producer_id) => transport::Entity::find()
                .filter(transport::Column::ProducerId.eq(producer_id)),
            TransportFilter::Transporter(transporter_id) => transport::Entity::find()
                .filter(transport::Column::TransporterId.eq(transporter_id)),
            TransportFilter::ProducerNationalId(national_id) => {
                let Some(producer) = producer::Entity::find()
                    .filter(producer::Column::NationalId.eq(national_id.trim()))
                    .one(db)
                    .await?
                else {
                    return Ok(Vec::new());
                };
                transport::Entity::find().filter(transport::Column::ProducerId.eq(producer.id))
            }
        };

        let transports = query
            .order_by_desc(transport::Column::DepartedAt)
            .order_by_desc(transport::Column::Id)
            .all(db)
            .await?;

        summarize(db, transports).await
    }

    /// Lots on a transport's manifest, by id.
    #[instrument(skip(self))]
    pub async fn list_lots_for_transport(
        &self,
        transport_id: i32,
    ) -> Result<Vec<lot::Model>, ServiceError> {
        let db = &*self.db;
        let transport = find_transport(db, transport_id).await?;
        let lots = transport
            .find_related(lot::Entity)
            .order_by_asc(lot::Column::Id)
            .all(db)
            .await?;
        Ok(lots)
    }

    /// Transports that carried (or carry) a lot, most recent departure first.
    #[instrument(skip(self))]
    pub async fn list_transports_for_lot(
        &self,
        lot_id: i32,
    ) -> Result<Vec<TransportSummary>, ServiceError> {
        let db = &*self.db;
        let lot = find_lot(db, lot_id).await?;
        let transports = lot
            .find_related(transport::Entity)
            .order_by_desc(transport::Column::DepartedAt)
            .order_by_desc(transport::Column::Id)
            .all(db)
            .await?;
        summarize(db, transports).await
    }
}

/// Inserts the transport row and its manifest links. Must run inside the caller's
/// transaction so a failing link rolls the transport back.
async fn open_transport(
    txn: &DatabaseTransaction,
    producer: &producer::Model,
    transporter_id: i32,
    destination: String,
    description: Option<String>,
    status: TransportStatus,
    lot_ids: Vec<i32>,
) -> Result<transport::Model, ServiceError> {
    find_transporter(txn, transporter_id).await?;

    let lot_ids: BTreeSet<i32> = lot_ids.into_iter().collect();
    if !lot_ids.is_empty() {
        let owners: HashMap<i32, i32> = lot::Entity::find()
            .filter(lot::Column::Id.is_in(lot_ids.iter().copied()))
            .all(txn)
            .await?
            .into_iter()
            .map(|lot| (lot.id, lot.producer_id))
            .collect();

        for lot_id in &lot_ids {
            match owners.get(lot_id) {
                None => return Err(ServiceError::not_found("Lot", lot_id)),
                Some(owner) if *owner != producer.id => {
                    return Err(ServiceError::ValidationError(format!(
                        "Lot {lot_id} does not belong to producer {}",
                        producer.id
                    )))
                }
                Some(_) => {}
            }
        }
    }

    let transport = transport::ActiveModel {
        producer_id: Set(producer.id),
        transporter_id: Set(transporter_id),
        destination: Set(destination),
        status: Set(status),
        departed_at: Set(Utc::now()),
        arrived_at: Set(None),
        description: Set(description),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    if !lot_ids.is_empty() {
        transport_lot::Entity::insert_many(lot_ids.iter().map(|&lot_id| {
            transport_lot::ActiveModel {
                transport_id: Set(transport.id),
                lot_id: Set(lot_id),
            }
        }))
        .exec_without_returning(txn)
        .await?;
    }

    info!(
        transport_id = transport.id,
        producer_id = producer.id,
        transporter_id,
        lots = lot_ids.len(),
        status = %status,
        "transport created"
    );
    Ok(transport)
}

/// Joins transports with their producer, transporter and manifest.
async fn summarize<C: ConnectionTrait>(
    conn: &C,
    transports: Vec<transport::Model>,
) -> Result<Vec<TransportSummary>, ServiceError> {
    if transports.is_empty() {
        return Ok(Vec::new());
    }

    let producer_ids: BTreeSet<i32> = transports.iter().map(|t| t.producer_id).collect();
    let transporter_ids: BTreeSet<i32> = transports.iter().map(|t| t.transporter_id).collect();
    let transport_ids: Vec<i32> = transports.iter().map(|t| t.id).collect();

    let producers: HashMap<i32, producer::Model> = producer::Entity::find()
        .filter(producer::Column::Id.is_in(producer_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let transporters: HashMap<i32, transporter::Model> = transporter::Entity::find()
        .filter(transporter::Column::Id.is_in(transporter_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    let mut manifests: HashMap<i32, Vec<ManifestLot>> = HashMap::new();
    let links = transport_lot::Entity::find()
        .filter(transport_lot::Column::TransportId.is_in(transport_ids))
        .order_by_asc(transport_lot::Column::LotId)
        .find_also_related(lot::Entity)
        .all(conn)
        .await?;
    for (link, lot) in links {
        if let Some(lot) = lot {
            manifests
                .entry(link.transport_id)
                .or_default()
                .push(ManifestLot {
                    id: lot.id,
                    product: lot.product,
                });
        }
    }

    Ok(transports
        .into_iter()
        .map(|t| {
            let producer = producers.get(&t.producer_id);
            let transporter = transporters.get(&t.transporter_id);
            TransportSummary {
                id: t.id,
                status: t.status,
                destination: t.destination,
                description: t.description,
                departed_at: t.departed_at,
                arrived_at: t.arrived_at,
                producer: ProducerRef {
                    id: t.producer_id,
                    name: producer.map(|p| p.name.clone()).unwrap_or_default(),
                    national_id: producer.map(|p| p.national_id.clone()).unwrap_or_default(),
                },
                transporter: TransporterRef {
                    id: t.transporter_id,
                    name: transporter.map(|tr| tr.name.clone()).unwrap_or_default(),
                    phone: transporter.and_then(|tr| tr.phone.clone()),
                },
                lots: manifests.remove(&t.id).unwrap_or_default(),
            }
        })
        .collect())
}
