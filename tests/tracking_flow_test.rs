mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use common::TestApp;
use harvest_trace::{
    errors::ServiceError,
    models::{transport, transport_lot, TrackingStatus, TransportStatus},
    services::tracking::{
        AppendEventInput, CreateTransportByNationalIdInput, CreateTransportInput,
        RegisterLotInput, TransportFilter, UpdateTransportStatusInput, REGISTERED_DESCRIPTION,
        UNKNOWN_LOCATION,
    },
};
use sea_orm::{EntityTrait, PaginatorTrait};

fn lot_input(producer_id: i32, product: &str, date: (i32, u32, u32)) -> RegisterLotInput {
    RegisterLotInput {
        producer_id: Some(producer_id),
        product: Some(product.to_string()),
        quantity: Some(250.0),
        harvest_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2),
        production_location: Some("Sitio Alegre".to_string()),
    }
}

#[tokio::test]
async fn registering_a_lot_records_the_initial_event() {
    let app = TestApp::new().await;
    let producer = app.register_producer("Ana", "11111111111").await;
    let tracking = app.state.services.tracking.clone();

    let registered = tracking
        .register_lot(lot_input(producer.id as i32, "Coffee", (2024, 5, 20)))
        .await
        .unwrap();
    assert_eq!(registered.reference.url, format!("/lote/{}", registered.lot.id));

    let history = tracking.lot_history(registered.lot.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, TrackingStatus::Registered);
    assert_eq!(history[0].description.as_deref(), Some(REGISTERED_DESCRIPTION));
    assert_eq!(history[0].location, "Sitio Alegre");
    assert_eq!(history[0].recorded_at, registered.lot.created_at);
}

#[tokio::test]
async fn missing_location_uses_placeholder() {
    let app = TestApp::new().await;
    let producer = app.register_producer("Ana", "11111111111").await;
    let tracking = app.state.services.tracking.clone();

    let mut input = lot_input(producer.id as i32, "Beans", (2024, 1, 2));
    input.production_location = Some("   ".to_string());
    let registered = tracking.register_lot(input).await.unwrap();

    assert_eq!(registered.lot.production_location, None);
    let history = tracking.lot_history(registered.lot.id).await.unwrap();
    assert_eq!(history[0].location, UNKNOWN_LOCATION);
}

#[tokio::test]
async fn lot_for_unknown_producer_is_not_created() {
    let app = TestApp::new().await;
    let result = app
        .state
        .services
        .tracking
        .register_lot(lot_input(999, "Coffee", (2024, 5, 20)))
        .await;

    assert_matches!(result, Err(ServiceError::NotFound(_)));
    let lots = harvest_trace::models::lot::Entity::find()
        .count(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(lots, 0);
}

#[tokio::test]
async fn events_append_in_order_and_never_rewrite_history() {
    let app = TestApp::new().await;
    let producer = app.register_producer("Ana", "11111111111").await;
    let carrier = app.register_transporter("Rota Sul", "22222222222").await;
    let tracking = app.state.services.tracking.clone();
    let lot = tracking
        .register_lot(lot_input(producer.id as i32, "Coffee", (2024, 5, 20)))
        .await
        .unwrap()
        .lot;

    for (status, location) in [("ARMAZENADO", "Silo 4"), ("em transporte", "BR-381")] {
        tracking
            .append_tracking_event(
                lot.id,
                AppendEventInput {
                    status: Some(status.to_string()),
                    location: Some(location.to_string()),
                    transporter_id: Some(carrier.id as i32),
                    description: None,
                },
            )
            .await
            .unwrap();
    }

    let history = tracking.lot_history(lot.id).await.unwrap();
    let statuses: Vec<_> = history.iter().map(|e| e.status).collect();
    assert_eq!(
        statuses,
        vec![
            TrackingStatus::Registered,
            TrackingStatus::Stored,
            TrackingStatus::InTransit
        ]
    );
    assert_eq!(history[0].transporter_id, None);
    assert_eq!(history[2].transporter_id, Some(carrier.id as i32));
    assert!(history.windows(2).all(|w| w[0].recorded_at <= w[1].recorded_at));
}

#[tokio::test]
async fn appending_rejects_unknown_lot_and_status() {
    let app = TestApp::new().await;
    let producer = app.register_producer("Ana", "11111111111").await;
    let tracking = app.state.services.tracking.clone();
    let lot = tracking
        .register_lot(lot_input(producer.id as i32, "Coffee", (2024, 5, 20)))
        .await
        .unwrap()
        .lot;

    let missing_lot = tracking
        .append_tracking_event(
            lot.id + 100,
            AppendEventInput {
                status: Some("STORED".into()),
                location: Some("Silo".into()),
                ..Default::default()
            },
        )
        .await;
    assert_matches!(missing_lot, Err(ServiceError::NotFound(_)));

    let bad_status = tracking
        .append_tracking_event(
            lot.id,
            AppendEventInput {
                status: Some("LOST".into()),
                location: Some("Silo".into()),
                ..Default::default()
            },
        )
        .await;
    assert_matches!(bad_status, Err(ServiceError::ValidationError(_)));

    let no_location = tracking
        .append_tracking_event(
            lot.id,
            AppendEventInput {
                status: Some("STORED".into()),
                ..Default::default()
            },
        )
        .await;
    assert_matches!(no_location, Err(ServiceError::ValidationError(_)));

    assert_eq!(tracking.lot_history(lot.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn transport_by_national_id_starts_preparing_with_deduplicated_manifest() {
    let app = TestApp::new().await;
    let producer = app.register_producer("Ana", "11111111111").await;
    let carrier = app.register_transporter("Rota Sul", "22222222222").await;
    let tracking = app.state.services.tracking.clone();
    let first = tracking
        .register_lot(lot_input(producer.id as i32, "Coffee", (2024, 5, 20)))
        .await
        .unwrap()
        .lot;
    let second = tracking
        .register_lot(lot_input(producer.id as i32, "Corn", (2024, 5, 21)))
        .await
        .unwrap()
        .lot;

    let summary = tracking
        .create_transport_by_national_id(CreateTransportByNationalIdInput {
            transporter_id: Some(carrier.id as i32),
            producer_national_id: Some("11111111111".into()),
            destination: Some("Porto de Santos".into()),
            description: None,
            lot_ids: Some(vec![second.id, first.id, first.id]),
        })
        .await
        .unwrap();

    assert_eq!(summary.status, TransportStatus::Preparing);
    assert_eq!(summary.arrived_at, None);
    assert_eq!(summary.producer.national_id, "11111111111");
    assert_eq!(summary.transporter.phone.as_deref(), Some("+55 31 99999-0000"));
    let manifest: Vec<i32> = summary.lots.iter().map(|l| l.id).collect();
    assert_eq!(manifest, vec![first.id, second.id]);

    let links = transport_lot::Entity::find()
        .count(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(links, 2);
}

#[tokio::test]
async fn failed_manifest_leaves_no_transport_behind() {
    let app = TestApp::new().await;
    let producer = app.register_producer("Ana", "11111111111").await;
    let other = app.register_producer("Bia", "33333333333").await;
    let carrier = app.register_transporter("Rota Sul", "22222222222").await;
    let tracking = app.state.services.tracking.clone();
    let own = tracking
        .register_lot(lot_input(producer.id as i32, "Coffee", (2024, 5, 20)))
        .await
        .unwrap()
        .lot;
    let foreign = tracking
        .register_lot(lot_input(other.id as i32, "Corn", (2024, 5, 20)))
        .await
        .unwrap()
        .lot;

    let missing = tracking
        .create_transport(CreateTransportInput {
            producer_id: Some(producer.id as i32),
            transporter_id: Some(carrier.id as i32),
            destination: Some("Santos".into()),
            lot_ids: Some(vec![own.id, 9_999]),
            ..Default::default()
        })
        .await;
    assert_matches!(missing, Err(ServiceError::NotFound(_)));

    let not_owned = tracking
        .create_transport(CreateTransportInput {
            producer_id: Some(producer.id as i32),
            transporter_id: Some(carrier.id as i32),
            destination: Some("Santos".into()),
            lot_ids: Some(vec![own.id, foreign.id]),
            ..Default::default()
        })
        .await;
    assert_matches!(not_owned, Err(ServiceError::ValidationError(_)));

    let empty = tracking
        .create_transport(CreateTransportInput {
            producer_id: Some(producer.id as i32),
            transporter_id: Some(carrier.id as i32),
            destination: Some("Santos".into()),
            lot_ids: Some(vec![]),
            ..Default::default()
        })
        .await;
    assert_matches!(empty, Err(ServiceError::ValidationError(_)));

    let unknown_producer = tracking
        .create_transport_by_national_id(CreateTransportByNationalIdInput {
            transporter_id: Some(carrier.id as i32),
            producer_national_id: Some("99999999999".into()),
            destination: Some("Santos".into()),
            ..Default::default()
        })
        .await;
    assert_matches!(unknown_producer, Err(ServiceError::NotFound(_)));

    let db = &*app.state.db;
    assert_eq!(transport::Entity::find().count(db).await.unwrap(), 0);
    assert_eq!(transport_lot::Entity::find().count(db).await.unwrap(), 0);
}

#[tokio::test]
async fn delivery_stamps_arrival_once() {
    let app = TestApp::new().await;
    let producer = app.register_producer("Ana", "11111111111").await;
    let carrier = app.register_transporter("Rota Sul", "22222222222").await;
    let tracking = app.state.services.tracking.clone();
    let lot = tracking
        .register_lot(lot_input(producer.id as i32, "Coffee", (2024, 5, 20)))
        .await
        .unwrap()
        .lot;

    let created = tracking
        .create_transport(CreateTransportInput {
            producer_id: Some(producer.id as i32),
            transporter_id: Some(carrier.id as i32),
            destination: Some("Santos".into()),
            lot_ids: Some(vec![lot.id]),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created.status, TransportStatus::Loading);

    let status = |s: &str| UpdateTransportStatusInput {
        status: Some(s.to_string()),
    };

    let moving = tracking
        .update_transport_status(created.id, status("EM TRANSPORTE"))
        .await
        .unwrap();
    assert_eq!(moving.status, TransportStatus::InTransit);
    assert_eq!(moving.arrived_at, None);

    let delivered = tracking
        .update_transport_status(created.id, status("ENTREGUE"))
        .await
        .unwrap();
    let arrived_at = delivered.arrived_at.expect("arrival stamped");

    let again = tracking
        .update_transport_status(created.id, status("CONCLUIDO"))
        .await
        .unwrap();
    assert_eq!(again.status, TransportStatus::Delivered);
    assert_eq!(again.arrived_at, Some(arrived_at));

    let back_on_road = tracking
        .update_transport_status(created.id, status("EM TRANSPORTE"))
        .await
        .unwrap();
    assert_eq!(back_on_road.status, TransportStatus::InTransit);
    assert_eq!(back_on_road.arrived_at, Some(arrived_at));

    let unknown = tracking
        .update_transport_status(created.id, status("TELEPORTED"))
        .await;
    assert_matches!(unknown, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn transports_are_listed_by_party_and_by_lot() {
    let app = TestApp::new().await;
    let producer = app.register_producer("Ana", "11111111111").await;
    let carrier = app.register_transporter("Rota Sul", "22222222222").await;
    let tracking = app.state.services.tracking.clone();
    let lot = tracking
        .register_lot(lot_input(producer.id as i32, "Coffee", (2024, 5, 20)))
        .await
        .unwrap()
        .lot;

    let mut ids = Vec::new();
    for destination in ["Santos", "Vitoria"] {
        let summary = tracking
            .create_transport(CreateTransportInput {
                producer_id: Some(producer.id as i32),
                transporter_id: Some(carrier.id as i32),
                destination: Some(destination.into()),
                lot_ids: Some(vec![lot.id]),
                ..Default::default()
            })
            .await
            .unwrap();
        ids.push(summary.id);
    }

    let by_producer = tracking
        .list_transports(TransportFilter::Producer(producer.id as i32))
        .await
        .unwrap();
    assert_eq!(by_producer.len(), 2);
    assert!(by_producer[0].departed_at >= by_producer[1].departed_at);

    let by_carrier = tracking
        .list_transports(TransportFilter::Transporter(carrier.id as i32))
        .await
        .unwrap();
    assert_eq!(by_carrier.len(), 2);

    let by_national_id = tracking
        .list_transports(TransportFilter::ProducerNationalId("11111111111".into()))
        .await
        .unwrap();
    assert_eq!(by_national_id.len(), 2);

    let unknown = tracking
        .list_transports(TransportFilter::ProducerNationalId("00000000001".into()))
        .await
        .unwrap();
    assert!(unknown.is_empty());

    let for_lot = tracking.list_transports_for_lot(lot.id).await.unwrap();
    let mut for_lot_ids: Vec<i32> = for_lot.iter().map(|t| t.id).collect();
    for_lot_ids.sort_unstable();
    assert_eq!(for_lot_ids, ids);

    let lots = tracking.list_lots_for_transport(ids[0]).await.unwrap();
    assert_eq!(lots.len(), 1);
    assert_eq!(lots[0].id, lot.id);

    assert_matches!(
        tracking.list_lots_for_transport(9_999).await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        tracking.list_transports_for_lot(9_999).await,
        Err(ServiceError::NotFound(_))
    );
}
