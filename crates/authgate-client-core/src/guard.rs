//! Pure predicates that decide whether guarded content may be shown. They do
//! not know how anything is rendered or how a redirect happens, the caller
//! acts on the answer.

use crate::session::Session;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Passes if any one requirement is met
    #[default]
    Any,
    /// Passes only if every requirement is met
    All,
}

/// Gate over required permissions and/or roles.
///
/// A gate without requirements allows everything. Otherwise an
/// unauthenticated session is never allowed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PermissionGate {
    permissions: Vec<String>,
    roles: Vec<String>,
    mode: MatchMode,
}

impl PermissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn permission<S: Into<String>>(mut self, permission: S) -> Self {
        self.permissions.push(permission.into());
        self
    }

    pub fn permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    pub fn role<S: Into<String>>(mut self, role: S) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn has_requirements(&self) -> bool {
        !self.permissions.is_empty() || !self.roles.is_empty()
    }

    pub fn allows(&self, session: &Session) -> bool {
        if !self.has_requirements() {
            return true;
        }
        if !session.is_authenticated {
            return false;
        }
        match self.mode {
            MatchMode::Any => {
                session.has_any_permission(&self.permissions)
                    || session.has_any_role(&self.roles)
            }
            MatchMode::All => {
                session.has_all_permissions(&self.permissions)
                    && session.has_all_roles(&self.roles)
            }
        }
    }

    /// Returns `content` if allowed otherwise `fallback`
    pub fn select<T>(&self, session: &Session, content: T, fallback: T) -> T {
        if self.allows(session) {
            content
        } else {
            fallback
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Session is still being restored, show a placeholder
    Pending,
    Render,
    /// Not logged in, send the user to this path
    Redirect(String),
    /// Logged in but the route's gate does not allow it
    Forbidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    redirect_to: String,
    gate: Option<PermissionGate>,
}

impl RouteGuard {
    pub fn new<S: Into<String>>(redirect_to: S) -> Self {
        Self {
            redirect_to: redirect_to.into(),
            gate: None,
        }
    }

    pub fn with_gate(mut self, gate: PermissionGate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn redirect_to(&self) -> &str {
        &self.redirect_to
    }

    #[tracing::instrument(level = "debug", skip(session), ret)]
    pub fn decide(&self, session: &Session) -> RouteDecision {
        if session.is_authenticated {
            match &self.gate {
                Some(gate) if !gate.allows(session) => RouteDecision::Forbidden,
                _ => RouteDecision::Render,
            }
        } else if session.is_loading {
            RouteDecision::Pending
        } else {
            RouteDecision::Redirect(self.redirect_to.clone())
        }
    }
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new(authgate_shared::const_config::client::CLIENT_DEFAULT_LOGIN_REDIRECT)
    }
}
