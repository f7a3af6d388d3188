use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Owner-scoped secret record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Credential {
    pub id: Uuid,
    #[serde(rename = "user_id")]
    pub owner_id: Uuid,
    pub data: String,
    pub meta: String,
}

/// Body of `POST /credentials`
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialPayload {
    pub data: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub meta: String,
}

/// Body of `POST /edit-credentials`
#[derive(Debug, Clone, Deserialize)]
pub struct EditCredentialPayload {
    pub id: String,
    pub data: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub meta: String,
}

/// `meta` is nullable on the wire; an explicit `null` reads as empty
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
