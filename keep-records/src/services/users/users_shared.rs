use chrono::{DateTime, Utc};
use keep_core::{Entity, IntoUpdateMap, KeepResult, Patch, UpdateMap};
use serde::{Deserialize, Serialize};

/// Persisted field that links a user to their federated identity.
pub const EXTERNAL_ID_FIELD: &str = "firebase_id";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub firebase_id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for User {
    const CREATED_AT: Option<&'static str> = Some("created_at");
    const UPDATED_AT: Option<&'static str> = Some("updated_at");

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub building_number: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default, rename = "zip_code")]
    pub post_code: String,
    #[serde(default)]
    pub country: String,
}

/// Fields a caller supplies when registering a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub firebase_id: String,
}

impl NewUser {
    pub(crate) fn into_user(self, id: String) -> User {
        User {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            firebase_id: self.firebase_id,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Partial update of a [`User`]. Timestamps and the id are not patchable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub first_name: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub last_name: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub email: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub phone: Patch<String>,
    #[serde(default)]
    pub address: AddressPatch,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub firebase_id: Patch<String>,
}

impl UserPatch {
    /// Treat every non-empty field of `user` as a change.
    pub fn from_sparse(user: &User) -> Self {
        Self {
            first_name: Patch::from_sparse(user.first_name.clone()),
            last_name: Patch::from_sparse(user.last_name.clone()),
            email: Patch::from_sparse(user.email.clone()),
            phone: Patch::from_sparse(user.phone.clone()),
            address: AddressPatch::from_sparse(&user.address),
            firebase_id: Patch::from_sparse(user.firebase_id.clone()),
        }
    }
}

impl IntoUpdateMap for UserPatch {
    fn to_update_map(&self) -> KeepResult<UpdateMap> {
        let mut map = UpdateMap::new();
        map.apply("first_name", &self.first_name)?
            .apply("last_name", &self.last_name)?
            .apply("email", &self.email)?
            .apply("phone", &self.phone)?
            .apply("firebase_id", &self.firebase_id)?;
        map.nest("address", self.address.to_update_map()?);
        Ok(map)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressPatch {
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub building_number: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub street: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub city: Patch<String>,
    #[serde(default, rename = "zip_code", skip_serializing_if = "Patch::is_unchanged")]
    pub post_code: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub country: Patch<String>,
}

impl AddressPatch {
    pub fn from_sparse(address: &Address) -> Self {
        Self {
            building_number: Patch::from_sparse(address.building_number.clone()),
            street: Patch::from_sparse(address.street.clone()),
            city: Patch::from_sparse(address.city.clone()),
            post_code: Patch::from_sparse(address.post_code.clone()),
            country: Patch::from_sparse(address.country.clone()),
        }
    }
}

impl IntoUpdateMap for AddressPatch {
    fn to_update_map(&self) -> KeepResult<UpdateMap> {
        let mut map = UpdateMap::new();
        map.apply("building_number", &self.building_number)?
            .apply("street", &self.street)?
            .apply("city", &self.city)?
            .apply("zip_code", &self.post_code)?
            .apply("country", &self.country)?;
        Ok(map)
    }
}
