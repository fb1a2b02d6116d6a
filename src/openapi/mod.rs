use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Harvest Trace API",
        version = "0.1.0",
        description = r#"
# Harvest Trace

Traceability for agricultural lots from the farm to their destination.

- **Lots**: producers register harvested lots; each lot carries an append-only
  tracking timeline and a scannable reference.
- **Transports**: transporters carry manifests of lots through
  `PREPARING → LOADING → IN_TRANSIT → UNLOADING → DELIVERED`.
- **Reports**: production totals per product over a harvest-date range.

## Authentication

Login endpoints return a session token. Send it on protected routes:

```
Authorization: Bearer <token>
```

Lot detail and history are public.
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers((url = "http://localhost:3001", description = "Local development")),
    tags(
        (name = "accounts", description = "Producer, transporter and administrator accounts"),
        (name = "lots", description = "Lots and their tracking timeline"),
        (name = "transports", description = "Transports and their manifests"),
        (name = "reports", description = "Production reports")
    ),
    paths(
        crate::handlers::accounts::register_producer,
        crate::handlers::accounts::register_transporter,
        crate::handlers::accounts::login_producer,
        crate::handlers::accounts::login_transporter,
        crate::handlers::accounts::login_admin,
        crate::handlers::accounts::get_producer,
        crate::handlers::accounts::update_producer,
        crate::handlers::accounts::list_transporters,

        crate::handlers::lots::register_lot,
        crate::handlers::lots::list_producer_lots,
        crate::handlers::lots::get_lot,
        crate::handlers::lots::update_lot,
        crate::handlers::lots::delete_lot,
        crate::handlers::lots::append_tracking_event,
        crate::handlers::lots::lot_history,
        crate::handlers::lots::list_transports_for_lot,

        crate::handlers::transports::create_transport_by_national_id,
        crate::handlers::transports::create_transport,
        crate::handlers::transports::get_transport,
        crate::handlers::transports::list_lots_for_transport,
        crate::handlers::transports::update_transport_status,
        crate::handlers::transports::list_transporter_transports,
        crate::handlers::transports::list_producer_transports,
        crate::handlers::transports::list_transports_by_national_id,
        crate::handlers::transports::list_all_transports,

        crate::handlers::reports::production_report,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::ResponseMeta,
            crate::errors::ErrorResponse,
            crate::auth::Role,
            crate::auth::SessionToken,
            crate::models::TrackingStatus,
            crate::models::TransportStatus,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url(OPENAPI_JSON_PATH, ApiDoc::openapi())
}
