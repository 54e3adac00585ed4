use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::{ROLE_ADMIN, ROLE_CLIENT, ROLE_PROVIDER};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub account_id: String,
    pub sub: String,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    /// Check if user has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Check if user is a service provider (can report location, receive dispatches)
    pub fn is_provider(&self) -> bool {
        self.has_role(ROLE_PROVIDER)
    }

    /// Check if user is a client (can post gigs and emergency requests)
    #[allow(dead_code)]
    pub fn is_client(&self) -> bool {
        self.has_role(ROLE_CLIENT)
    }

    /// Check if user has platform admin access
    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomClaims {
    #[serde(default)]
    pub roles: Vec<String>,
}
