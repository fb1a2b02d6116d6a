use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    auth::{AuthService, Role, SessionToken},
    db::DbPool,
    errors::ServiceError,
    models::{administrator, producer, transporter},
    services::{optional_text, required_text, tracking::find_producer},
};

const INVALID_LOGIN: &str = "Invalid national ID or password";

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct RegisterProducerInput {
    #[serde(alias = "nome")]
    #[validate(length(max = 200))]
    #[schema(example = "Maria Souza")]
    pub name: Option<String>,
    #[serde(alias = "cpf")]
    #[validate(length(max = 32))]
    #[schema(example = "123.456.789-00")]
    pub national_id: Option<String>,
    #[serde(alias = "senha")]
    #[validate(length(min = 4, max = 128))]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct RegisterTransporterInput {
    #[serde(alias = "nome")]
    #[validate(length(max = 200))]
    pub name: Option<String>,
    #[serde(alias = "cpf")]
    #[validate(length(max = 32))]
    pub national_id: Option<String>,
    #[serde(alias = "senha")]
    #[validate(length(min = 4, max = 128))]
    pub password: Option<String>,
    #[serde(alias = "telefone")]
    pub phone: Option<String>,
    #[serde(alias = "veiculo_tipo", alias = "tipo_veiculo")]
    pub vehicle_type: Option<String>,
    #[serde(alias = "placa")]
    pub plate: Option<String>,
    #[serde(alias = "capacidade")]
    pub capacity: Option<String>,
    #[serde(alias = "cidade_atendimento", alias = "cidade")]
    pub service_city: Option<String>,
    #[serde(alias = "uf_atendimento", alias = "estado")]
    pub service_state: Option<String>,
    #[serde(alias = "observacoes")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct LoginInput {
    #[serde(alias = "cpf")]
    pub national_id: Option<String>,
    #[serde(alias = "senha")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProducerInput {
    #[serde(alias = "nome")]
    #[validate(length(max = 200))]
    pub name: Option<String>,
    #[serde(alias = "senha")]
    #[validate(length(min = 4, max = 128))]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ProducerProfile {
    pub id: i32,
    pub name: String,
    pub national_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<producer::Model> for ProducerProfile {
    fn from(model: producer::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            national_id: model.national_id,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TransporterProfile {
    pub id: i32,
    pub name: String,
    pub national_id: String,
    pub phone: Option<String>,
    pub vehicle_type: Option<String>,
    pub plate: Option<String>,
    pub capacity: Option<String>,
    pub service_city: Option<String>,
    pub service_state: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<transporter::Model> for TransporterProfile {
    fn from(model: transporter::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            national_id: model.national_id,
            phone: model.phone,
            vehicle_type: model.vehicle_type,
            plate: model.plate,
            capacity: model.capacity,
            service_city: model.service_city,
            service_state: model.service_state,
            notes: model.notes,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AdminProfile {
    pub id: i32,
    pub name: String,
    pub national_id: String,
}

impl From<administrator::Model> for AdminProfile {
    fn from(model: administrator::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            national_id: model.national_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum AccountProfile {
    Producer(ProducerProfile),
    Transporter(TransporterProfile),
    Admin(AdminProfile),
}

impl AccountProfile {
    pub fn id(&self) -> i32 {
        match self {
            AccountProfile::Producer(p) => p.id,
            AccountProfile::Transporter(t) => t.id,
            AccountProfile::Admin(a) => a.id,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub role: Role,
    pub account: AccountProfile,
    pub token: SessionToken,
}

/// Stored credentials for one account, independent of its table.
struct Credentials {
    password_hash: String,
    profile: AccountProfile,
}

/// Registration, login and profile management for the three account kinds.
#[derive(Clone)]
pub struct AccountService {
    db: Arc<DbPool>,
    auth: Arc<AuthService>,
}

impl AccountService {
    pub fn new(db: Arc<DbPool>, auth: Arc<AuthService>) -> Self {
        Self { db, auth }
    }

    #[instrument(skip(self, input))]
    pub async fn register_producer(
        &self,
        input: RegisterProducerInput,
    ) -> Result<ProducerProfile, ServiceError> {
        input.validate()?;
        let name = required_text(input.name, "name")?;
        let national_id = required_text(input.national_id, "national_id")?;
        let password = required_text(input.password, "password")?;

        let db = &*self.db;
        let taken = producer::Entity::find()
            .filter(producer::Column::NationalId.eq(national_id.as_str()))
            .one(db)
            .await?
            .is_some();
        if taken {
            return Err(duplicate_national_id("producer"));
        }

        let password_hash = self.auth.passwords().hash(&password)?;
        let model = producer::ActiveModel {
            name: Set(name),
            national_id: Set(national_id),
            password_hash: Set(password_hash),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::conflict_on_unique(e, duplicate_message("producer")))?;

        info!(producer_id = model.id, "producer registered");
        Ok(model.into())
    }

    #[instrument(skip(self, input))]
    pub async fn register_transporter(
        &self,
        input: RegisterTransporterInput,
    ) -> Result<TransporterProfile, ServiceError> {
        input.validate()?;
        let name = required_text(input.name, "name")?;
        let national_id = required_text(input.national_id, "national_id")?;
        let password = required_text(input.password, "password")?;

        let db = &*self.db;
        let taken = transporter::Entity::find()
            .filter(transporter::Column::NationalId.eq(national_id.as_str()))
            .one(db)
            .await?
            .is_some();
        if taken {
            return Err(duplicate_national_id("transporter"));
        }

        let password_hash = self.auth.passwords().hash(&password)?;
        let model = transporter::ActiveModel {
            name: Set(name),
            national_id: Set(national_id),
            password_hash: Set(password_hash),
            phone: Set(optional_text(input.phone)),
            vehicle_type: Set(optional_text(input.vehicle_type)),
            plate: Set(optional_text(input.plate)),
            capacity: Set(optional_text(input.capacity)),
            service_city: Set(optional_text(input.service_city)),
            service_state: Set(optional_text(input.service_state)),
            notes: Set(optional_text(input.notes)),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::conflict_on_unique(e, duplicate_message("transporter")))?;

        info!(transporter_id = model.id, "transporter registered");
        Ok(model.into())
    }

    /// Checks credentials against the table for `role` and issues a session token.
    ///
    /// Unknown accounts and wrong passwords produce the same error.
    #[instrument(skip(self, input))]
    pub async fn login(&self, role: Role, input: LoginInput) -> Result<LoginResponse, ServiceError> {
        let national_id = required_text(input.national_id, "national_id")?;
        let password = input
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ServiceError::missing_field("password"))?;

        let Some(credentials) = self.credentials(role, &national_id).await? else {
            warn!(%role, "login for unknown account");
            return Err(ServiceError::Unauthorized(INVALID_LOGIN.to_string()));
        };

        if !self
            .auth
            .passwords()
            .verify(&password, &credentials.password_hash)?
        {
            warn!(%role, account_id = credentials.profile.id(), "login with wrong password");
            return Err(ServiceError::Unauthorized(INVALID_LOGIN.to_string()));
        }

        let token = self.auth.issue_token(role, credentials.profile.id())?;
        info!(%role, account_id = credentials.profile.id(), "login succeeded");
        Ok(LoginResponse {
            role,
            account: credentials.profile,
            token,
        })
    }

    async fn credentials(
        &self,
        role: Role,
        national_id: &str,
    ) -> Result<Option<Credentials>, ServiceError> {
        let db = &*self.db;
        let credentials = match role {
            Role::Producer => producer::Entity::find()
                .filter(producer::Column::NationalId.eq(national_id))
                .one(db)
                .await?
                .map(|m| Credentials {
                    password_hash: m.password_hash.clone(),
                    profile: AccountProfile::Producer(m.into()),
                }),
            Role::Transporter => transporter::Entity::find()
                .filter(transporter::Column::NationalId.eq(national_id))
                .one(db)
                .await?
                .map(|m| Credentials {
                    password_hash: m.password_hash.clone(),
                    profile: AccountProfile::Transporter(m.into()),
                }),
            Role::Admin => administrator::Entity::find()
                .filter(administrator::Column::NationalId.eq(national_id))
                .one(db)
                .await?
                .map(|m| Credentials {
                    password_hash: m.password_hash.clone(),
                    profile: AccountProfile::Admin(m.into()),
                }),
        };
        Ok(credentials)
    }

    #[instrument(skip(self))]
    pub async fn get_producer(&self, producer_id: i32) -> Result<ProducerProfile, ServiceError> {
        Ok(find_producer(&*self.db, producer_id).await?.into())
    }

    #[instrument(skip(self, input))]
    pub async fn update_producer(
        &self,
        producer_id: i32,
        input: UpdateProducerInput,
    ) -> Result<ProducerProfile, ServiceError> {
        input.validate()?;
        let db = &*self.db;
        let mut active: producer::ActiveModel = find_producer(db, producer_id).await?.into();

        if let Some(name) = input.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(ServiceError::ValidationError(
                    "name must not be blank".to_string(),
                ));
            }
            active.name = Set(name.to_string());
        }
        if let Some(password) = input.password {
            active.password_hash = Set(self.auth.passwords().hash(&password)?);
        }

        let updated = active.update(db).await?;
        info!(producer_id, "producer profile updated");
        Ok(updated.into())
    }

    /// All transporters, alphabetically.
    #[instrument(skip(self))]
    pub async fn list_transporters(&self) -> Result<Vec<TransporterProfile>, ServiceError> {
        let transporters = transporter::Entity::find()
            .order_by_asc(transporter::Column::Name)
            .order_by_asc(transporter::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(transporters.into_iter().map(Into::into).collect())
    }

    /// Creates the configured administrator unless one with that national ID exists.
    /// Returns whether a row was inserted.
    #[instrument(skip(self, password))]
    pub async fn ensure_bootstrap_admin(
        &self,
        national_id: &str,
        password: &str,
        name: &str,
    ) -> Result<bool, ServiceError> {
        let db = &*self.db;
        if admin_exists(db, national_id).await? {
            return Ok(false);
        }

        let password_hash = self.auth.passwords().hash(password)?;
        administrator::ActiveModel {
            name: Set(name.to_string()),
            national_id: Set(national_id.to_string()),
            password_hash: Set(password_hash),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!("bootstrap administrator created");
        Ok(true)
    }
}

async fn admin_exists<C: ConnectionTrait>(conn: &C, national_id: &str) -> Result<bool, ServiceError> {
    Ok(administrator::Entity::find()
        .filter(administrator::Column::NationalId.eq(national_id))
        .one(conn)
        .await?
        .is_some())
}

fn duplicate_message(kind: &str) -> String {
    format!("A {kind} with this national ID is already registered")
}

fn duplicate_national_id(kind: &str) -> ServiceError {
    ServiceError::Conflict(duplicate_message(kind))
}
