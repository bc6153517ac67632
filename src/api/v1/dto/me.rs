use serde::Serialize;

use crate::services::auth::{Identity, PermissionSet};

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub permissions: PermissionSet,
}

impl From<Identity> for MeResponse {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.user_id,
            name: identity.name,
            email: identity.email,
            permissions: identity.permissions,
        }
    }
}
