//! The session value and the pure transition function that drives it.
//!
//! Nothing in here touches storage or logging so every transition can be
//! tested on its own. [`crate::SessionManager`] performs the side effects and
//! then dispatches one [`Action`].

use authgate_shared::{
    token::{AccessToken, RefreshToken},
    uac::{LoginResult, Permissions, Roles, UserProfile},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub user: Option<UserProfile>,
    pub access_token: Option<AccessToken>,
    pub refresh_token: Option<RefreshToken>,
    pub permissions: Permissions,
    pub roles: Roles,
    pub error: Option<String>,
}

/// Observable state derived from the fields of a [`Session`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Loading,
    Unauthenticated,
    Authenticated,
    /// Behaves as [`SessionStatus::Unauthenticated`] but an error message is
    /// available until cleared
    LoginFailed,
}

/// What restore reads back from client storage. Unlike [`LoginResult`] the
/// refresh token is optional as only the access token and user are required
/// to consider a stored session valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub access_token: AccessToken,
    pub refresh_token: Option<RefreshToken>,
    pub user: UserProfile,
    pub permissions: Permissions,
    pub roles: Roles,
}

/// Everything that can happen to a session
#[derive(Debug, Clone)]
pub enum Action {
    /// Stored session found during restore
    Restored(Box<StoredSession>),
    /// Restore found nothing usable
    RestoreEmpty,
    LoginStart,
    LoginSuccess(Box<LoginResult>),
    LoginFailure(String),
    Logout,
    UpdateUser(Box<UserProfile>),
    ClearError,
}

impl Default for Session {
    /// State at process start, before the stored session was looked at
    fn default() -> Self {
        Self {
            is_authenticated: false,
            is_loading: true,
            user: None,
            access_token: None,
            refresh_token: None,
            permissions: Default::default(),
            roles: Default::default(),
            error: None,
        }
    }
}

impl Session {
    /// Logged out shape, not loading
    pub fn unauthenticated() -> Self {
        Self {
            is_loading: false,
            ..Default::default()
        }
    }

    fn authenticated(stored: StoredSession) -> Self {
        let StoredSession {
            access_token,
            refresh_token,
            user,
            permissions,
            roles,
        } = stored;
        Self {
            is_authenticated: true,
            is_loading: false,
            user: Some(user),
            access_token: Some(access_token),
            refresh_token,
            permissions,
            roles,
            error: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        if self.is_authenticated {
            SessionStatus::Authenticated
        } else if self.is_loading {
            SessionStatus::Loading
        } else if self.error.is_some() {
            SessionStatus::LoginFailed
        } else {
            SessionStatus::Unauthenticated
        }
    }

    pub fn check_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn check_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn has_any_permission<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        self.permissions.includes_any(permissions)
    }

    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        self.roles.includes_any(roles)
    }

    pub fn has_all_permissions<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        self.permissions.includes_all(permissions)
    }

    pub fn has_all_roles<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        self.roles.includes_all(roles)
    }

    /// Checks that `is_authenticated` is only set with both a user and a token
    pub fn is_consistent(&self) -> bool {
        !self.is_authenticated || (self.user.is_some() && self.access_token.is_some())
    }
}

impl From<LoginResult> for StoredSession {
    fn from(value: LoginResult) -> Self {
        Self {
            access_token: value.access_token,
            refresh_token: Some(value.refresh_token),
            user: value.user_info,
            permissions: value.permissions,
            roles: value.roles,
        }
    }
}

/// Computes the state that follows `state` once `action` has happened
pub fn reduce(state: &Session, action: Action) -> Session {
    let next = match action {
        Action::Restored(stored) => Session::authenticated(*stored),
        Action::LoginSuccess(result) => Session::authenticated((*result).into()),
        Action::RestoreEmpty | Action::Logout => Session::unauthenticated(),
        Action::LoginStart => Session {
            is_loading: true,
            error: None,
            ..state.clone()
        },
        Action::LoginFailure(msg) => Session {
            error: Some(msg),
            ..Session::unauthenticated()
        },
        Action::UpdateUser(profile) => Session {
            user: Some(*profile),
            ..state.clone()
        },
        Action::ClearError => Session {
            error: None,
            ..state.clone()
        },
    };
    debug_assert!(next.is_consistent(), "inconsistent session: {next:?}");
    next
}
