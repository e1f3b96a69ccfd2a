//! Makes one session reachable from anywhere below a provider without
//! passing it around explicitly

use std::{
    cell::RefCell,
    sync::{Arc, Mutex, MutexGuard},
};

use authgate_shared::{
    token::AccessToken,
    uac::{LoginResult, UserProfile},
};

use crate::{
    guard::{PermissionGate, RouteDecision, RouteGuard},
    session::{Session, SessionStatus},
    storage::ClientStorage,
    SessionManager,
};

pub type DynSessionManager = SessionManager<Box<dyn ClientStorage>>;

/// Cheap to clone, every clone refers to the same session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<DynSessionManager>>,
}

#[derive(Debug, thiserror::Error)]
#[error("session used outside of a SessionProvider scope. Wrap the caller in `SessionProvider::scope`")]
pub struct NoSessionProviderError;

thread_local! {
    static PROVIDED: RefCell<Vec<SessionHandle>> = const { RefCell::new(Vec::new()) };
}

impl SessionHandle {
    pub fn new<S: ClientStorage + 'static>(storage: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionManager::new(Box::new(storage)))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DynSessionManager> {
        self.inner.lock().expect("session mutex poisoned")
    }

    /// Copy of the current session
    pub fn session(&self) -> Session {
        self.lock().session().clone()
    }

    /// Reads the session without copying it
    pub fn with_session<R, F: FnOnce(&Session) -> R>(&self, f: F) -> R {
        f(self.lock().session())
    }

    pub fn status(&self) -> SessionStatus {
        self.lock().status()
    }

    pub fn is_authenticated(&self) -> bool {
        self.with_session(|x| x.is_authenticated)
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.with_session(|x| x.user.clone())
    }

    pub fn access_token(&self) -> Option<AccessToken> {
        self.lock().access_token().ok().cloned()
    }

    pub fn login(&self, result: LoginResult) {
        self.lock().login(result);
    }

    pub fn begin_login(&self) {
        self.lock().begin_login();
    }

    pub fn login_failed(&self, msg: String) {
        self.lock().login_failed(msg);
    }

    pub fn logout(&self) {
        self.lock().logout();
    }

    pub fn restore_session(&self) {
        self.lock().restore_session();
    }

    pub fn has_restored(&self) -> bool {
        self.lock().has_restored()
    }

    /// Restores unless that already happened. Check and restore share one
    /// lock so concurrent callers restore at most once.
    pub fn restore_once(&self) {
        let mut manager = self.lock();
        if !manager.has_restored() {
            manager.restore_session();
        }
    }

    pub fn update_user(&self, profile: UserProfile) {
        self.lock().update_user(profile);
    }

    pub fn clear_error(&self) {
        self.lock().clear_error();
    }

    pub fn check_permission(&self, permission: &str) -> bool {
        self.lock().check_permission(permission)
    }

    pub fn check_role(&self, role: &str) -> bool {
        self.lock().check_role(role)
    }

    pub fn has_any_permission<T: AsRef<str>>(&self, permissions: &[T]) -> bool {
        self.lock().has_any_permission(permissions)
    }

    pub fn has_any_role<T: AsRef<str>>(&self, roles: &[T]) -> bool {
        self.lock().has_any_role(roles)
    }

    pub fn has_all_permissions<T: AsRef<str>>(&self, permissions: &[T]) -> bool {
        self.lock().has_all_permissions(permissions)
    }

    pub fn has_all_roles<T: AsRef<str>>(&self, roles: &[T]) -> bool {
        self.lock().has_all_roles(roles)
    }

    pub fn allows(&self, gate: &PermissionGate) -> bool {
        self.with_session(|x| gate.allows(x))
    }

    pub fn decide(&self, guard: &RouteGuard) -> RouteDecision {
        self.with_session(|x| guard.decide(x))
    }
}

/// Owns the mounting of a session. Code run inside [`Self::scope`] can reach
/// the session through [`use_session`].
#[derive(Debug)]
pub struct SessionProvider {
    handle: SessionHandle,
}

impl SessionProvider {
    /// Restores the stored session unless that already happened for this
    /// handle
    #[tracing::instrument(skip(handle))]
    pub fn mount(handle: SessionHandle) -> Self {
        handle.restore_once();
        Self { handle }
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Runs `f` with this provider's session as the innermost one
    pub fn scope<R, F: FnOnce() -> R>(&self, f: F) -> R {
        PROVIDED.with_borrow_mut(|stack| stack.push(self.handle.clone()));
        let _pop_on_exit = ScopeExit;
        f()
    }
}

/// Pops the provider stack even if the scope unwinds
struct ScopeExit;

impl Drop for ScopeExit {
    fn drop(&mut self) {
        PROVIDED.with_borrow_mut(|stack| {
            stack.pop();
        });
    }
}

pub fn try_use_session() -> Result<SessionHandle, NoSessionProviderError> {
    PROVIDED.with_borrow(|stack| stack.last().cloned().ok_or(NoSessionProviderError))
}

/// Session of the innermost enclosing provider.
///
/// # Panics
///
/// Panics when called outside of every [`SessionProvider::scope`]. That is an
/// integration bug and should surface immediately.
#[track_caller]
pub fn use_session() -> SessionHandle {
    match try_use_session() {
        Ok(handle) => handle,
        Err(e) => panic!("{e}"),
    }
}
