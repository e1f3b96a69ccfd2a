use crate::token::{AccessToken, RefreshToken};

use super::{Permissions, Roles, UserProfile};

/// Body of a successful login response from the auth backend
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct LoginResult {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub user_info: UserProfile,
    #[serde(default)]
    pub permissions: Permissions,
    #[serde(default)]
    pub roles: Roles,
}
