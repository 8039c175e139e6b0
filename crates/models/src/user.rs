use std::{fmt, str::FromStr};

use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

pub const DEFAULT_LOCATION: &str = "Unspecified";
pub const MIN_PASSWORD_LEN: usize = 6;

/// Account role. Stored lowercase, which is also the wire form.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "technician")]
    Technician,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Technician => "technician",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Role {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "user" => Ok(Role::User),
            "technician" => Ok(Role::Technician),
            "admin" => Ok(Role::Admin),
            other => Err(ModelError::validation(format!("invalid role: {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub location: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef { match *self {} }
}

impl ActiveModelBehavior for ActiveModel {}

/// Input for [`create`]; the password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub location: Option<String>,
}

/// Trim and lowercase, then check the `local@domain.tld` shape.
pub fn normalize_email(email: &str) -> Result<String, ModelError> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain
                    .rsplit_once('.')
                    .map(|(host, tld)| !host.is_empty() && !tld.is_empty())
                    .unwrap_or(false)
        }
        None => false,
    };
    if !valid { return Err(ModelError::validation("please fill a valid email address")); }
    Ok(email)
}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    if name.trim().is_empty() { return Err(ModelError::validation("name required")); }
    if name.trim().chars().count() > 128 {
        return Err(ModelError::validation("name too long (<=128)"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ModelError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        let msg = format!("password must be at least {MIN_PASSWORD_LEN} characters long");
        return Err(ModelError::validation(msg));
    }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(db: &C, input: NewUser) -> Result<Model, ModelError> {
    validate_name(&input.name)?;
    let email = normalize_email(&input.email)?;
    if input.password_hash.trim().is_empty() {
        return Err(ModelError::validation("password hash required"));
    }
    let location = input
        .location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| DEFAULT_LOCATION.to_string());
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(input.name.trim().to_string()),
        email: Set(email),
        password_hash: Set(input.password_hash),
        role: Set(input.role),
        location: Set(location),
        created_at: Set(Utc::now().into()),
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> Result<Option<Model>, ModelError> {
    let email = email.trim().to_lowercase();
    Ok(Entity::find().filter(Column::Email.eq(email)).one(db).await?)
}

pub async fn set_role<C: ConnectionTrait>(
    db: &C,
    user: Model,
    role: Role,
) -> Result<Model, ModelError> {
    let mut am: ActiveModel = user.into();
    am.role = Set(role);
    Ok(am.update(db).await?)
}

/// Public projection embedded in technician, booking and review listings.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl From<&Model> for UserSummary {
    fn from(u: &Model) -> Self {
        Self { id: u.id, name: u.name.clone(), email: u.email.clone(), role: None }
    }
}

impl UserSummary {
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }
}
