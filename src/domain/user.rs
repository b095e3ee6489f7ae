//! Users, roles and the authenticated actor

use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use super::DomainError;
use crate::models::user;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Role {
    ChefProjet,
    Supplier,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity and role of the caller, as carried by a verified JWT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: i32,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_supplier(&self, supplier_id: Option<i32>) -> bool {
        self.role == Role::Supplier && supplier_id == Some(self.id)
    }

    pub fn is_chef_of(&self, chef_projet_id: i32) -> bool {
        self.role == Role::ChefProjet && self.id == chef_projet_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierDetails {
    pub contact: String,
    pub phone: String,
    pub address: String,
}

/// Role-specific attributes. Only suppliers carry extra fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role")]
pub enum UserProfile {
    ChefProjet,
    Admin,
    Supplier(SupplierDetails),
}

impl UserProfile {
    pub fn role(&self) -> Role {
        match self {
            UserProfile::ChefProjet => Role::ChefProjet,
            UserProfile::Admin => Role::Admin,
            UserProfile::Supplier(_) => Role::Supplier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    #[serde(flatten)]
    pub profile: UserProfile,
}

impl User {
    pub fn role(&self) -> Role {
        self.profile.role()
    }
}

impl TryFrom<user::Model> for User {
    type Error = DomainError;

    fn try_from(model: user::Model) -> Result<Self, Self::Error> {
        let role: Role = model.role.parse().map_err(|_| {
            DomainError::Integrity(format!("User {} has unknown role '{}'", model.id, model.role))
        })?;

        let profile = match role {
            Role::ChefProjet => UserProfile::ChefProjet,
            Role::Admin => UserProfile::Admin,
            Role::Supplier => match (model.contact, model.phone, model.address) {
                (Some(contact), Some(phone), Some(address)) => {
                    UserProfile::Supplier(SupplierDetails {
                        contact,
                        phone,
                        address,
                    })
                }
                _ => {
                    return Err(DomainError::Integrity(format!(
                        "Supplier {} is missing contact details",
                        model.id
                    )))
                }
            },
        };

        Ok(User {
            id: model.id,
            username: model.username,
            email: model.email,
            profile,
        })
    }
}

/// Input for registering an account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub profile: UserProfile,
}
