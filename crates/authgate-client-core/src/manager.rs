use anyhow::Context as _;
use authgate_shared::{
    const_config::storage::StorageKey,
    errors::{NotLoggedInError, RestoreError, StorageError},
    log_err_as_error, log_err_as_warn,
    token::AccessToken,
    uac::{LoginResult, Permissions, Roles, UserProfile},
};
use serde::de::DeserializeOwned;
use strum::IntoEnumIterator as _;
use tracing::{info, instrument, warn};

use crate::{
    session::{reduce, Action, Session, SessionStatus, StoredSession},
    storage::ClientStorage,
};

/// Owns the current [`Session`] and keeps client storage in step with it.
///
/// Storage is written through on every mutation but the in memory session is
/// what everybody reads. A failed storage write is logged and otherwise
/// ignored.
#[derive(Debug)]
pub struct SessionManager<S> {
    state: Session,
    storage: S,
    has_restored: bool,
}

impl<S: ClientStorage> SessionManager<S> {
    /// Starts in the loading state, call [`Self::restore_session`] next
    pub fn new(storage: S) -> Self {
        Self {
            state: Session::default(),
            storage,
            has_restored: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// True once [`Self::restore_session`] has run
    pub fn has_restored(&self) -> bool {
        self.has_restored
    }

    #[instrument(skip(self))]
    fn dispatch(&mut self, action: Action) {
        let before = self.state.status();
        self.state = reduce(&self.state, action);
        let after = self.state.status();
        if before != after {
            info!(?before, ?after, "session status changed");
        }
    }

    #[instrument(skip(self, result), fields(username = %result.user_info.username))]
    pub fn login(&mut self, result: LoginResult) {
        self.persist_login(&result);
        self.dispatch(Action::LoginSuccess(Box::new(result)));
    }

    /// Marks a login request as in flight
    #[instrument(skip(self))]
    pub fn begin_login(&mut self) {
        self.dispatch(Action::LoginStart);
    }

    /// Ends the attempt logged out. Anything stored from an earlier session
    /// is removed too so a reload agrees with memory.
    #[instrument(skip(self))]
    pub fn login_failed(&mut self, msg: String) {
        self.clear_storage();
        self.dispatch(Action::LoginFailure(msg));
    }

    /// Safe to call when already logged out
    #[instrument(skip(self))]
    pub fn logout(&mut self) {
        self.clear_storage();
        self.dispatch(Action::Logout);
    }

    /// Loads whatever session was saved in storage. Never fails, anything
    /// unreadable is logged and treated as no session.
    #[instrument(skip(self))]
    pub fn restore_session(&mut self) {
        self.has_restored = true;
        match self.read_stored_session() {
            Ok(Some(stored)) => {
                info!(username = %stored.user.username, "stored session restored");
                self.dispatch(Action::Restored(Box::new(stored)));
            }
            Ok(None) => {
                info!("no stored session found");
                self.dispatch(Action::RestoreEmpty);
            }
            Err(err) => {
                warn!(?err, "failed to restore session, continuing as logged out");
                self.dispatch(Action::RestoreEmpty);
            }
        }
    }

    #[instrument(skip(self, profile), fields(username = %profile.username))]
    pub fn update_user(&mut self, profile: UserProfile) {
        self.write_json(StorageKey::UserInfo, &profile);
        self.dispatch(Action::UpdateUser(Box::new(profile)));
    }

    pub fn clear_error(&mut self) {
        self.dispatch(Action::ClearError);
    }

    pub fn check_permission(&self, permission: &str) -> bool {
        self.state.check_permission(permission)
    }

    pub fn check_role(&self, role: &str) -> bool {
        self.state.check_role(role)
    }

    pub fn has_any_permission<T: AsRef<str>>(&self, permissions: &[T]) -> bool {
        self.state.has_any_permission(permissions)
    }

    pub fn has_any_role<T: AsRef<str>>(&self, roles: &[T]) -> bool {
        self.state.has_any_role(roles)
    }

    pub fn has_all_permissions<T: AsRef<str>>(&self, permissions: &[T]) -> bool {
        self.state.has_all_permissions(permissions)
    }

    pub fn has_all_roles<T: AsRef<str>>(&self, roles: &[T]) -> bool {
        self.state.has_all_roles(roles)
    }

    pub fn access_token(&self) -> Result<&AccessToken, NotLoggedInError> {
        match (&self.state.access_token, self.state.is_authenticated) {
            (Some(token), true) => Ok(token),
            _ => Err(NotLoggedInError),
        }
    }

    fn clear_storage(&mut self) {
        for key in StorageKey::iter() {
            log_err_as_warn!(self.storage.remove(key));
        }
    }

    fn persist_login(&mut self, result: &LoginResult) {
        log_err_as_warn!(self
            .storage
            .set(StorageKey::AccessToken, result.access_token.expose_secret()));
        log_err_as_warn!(self
            .storage
            .set(StorageKey::RefreshToken, result.refresh_token.expose_secret()));
        self.write_json(StorageKey::UserInfo, &result.user_info);
        self.write_json(StorageKey::Permissions, &result.permissions);
        self.write_json(StorageKey::Roles, &result.roles);
    }

    fn write_json<T: serde::Serialize>(&mut self, key: StorageKey, value: &T) {
        let text = match serde_json::to_string(value) {
            Ok(text) => text,
            Err(source) => {
                // Our own types always serialize
                log_err_as_error!(Err::<(), _>(StorageError::Write {
                    key: key.as_str(),
                    source: source.into(),
                }));
                return;
            }
        };
        log_err_as_warn!(self.storage.set(key, &text));
    }

    fn read_stored_session(&self) -> Result<Option<StoredSession>, RestoreError> {
        let access_token = self.storage.get(StorageKey::AccessToken)?;
        let user: Option<UserProfile> = self.read_json(StorageKey::UserInfo)?;
        let (Some(access_token), Some(user)) = (access_token, user) else {
            return Ok(None);
        };
        let refresh_token = self.storage.get(StorageKey::RefreshToken)?;
        let permissions: Permissions = self
            .read_json(StorageKey::Permissions)?
            .unwrap_or_default();
        let roles: Roles = self.read_json(StorageKey::Roles)?.unwrap_or_default();
        Ok(Some(StoredSession {
            access_token: access_token.into(),
            refresh_token: refresh_token.map(Into::into),
            user,
            permissions,
            roles,
        }))
    }

    fn read_json<T: DeserializeOwned>(&self, key: StorageKey) -> Result<Option<T>, RestoreError> {
        let Some(text) = self.storage.get(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&text)
            .with_context(|| format!("stored text: {text:?}"))
            .map(Some)
            .map_err(|source| RestoreError::Malformed {
                key: key.as_str(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        session::tests::{login_result, profile},
        storage::{tests::BrokenStorage, MemoryStorage},
    };
    use rstest::rstest;

    fn restored(storage: &MemoryStorage) -> SessionManager<MemoryStorage> {
        let mut result = SessionManager::new(storage.clone());
        result.restore_session();
        result
    }

    fn logged_in(storage: &MemoryStorage) -> SessionManager<MemoryStorage> {
        let mut result = restored(storage);
        result.login(login_result(
            "admin",
            &["system:user:list", "system:user:edit"],
            &["admin"],
        ));
        result
    }

    fn stored(storage: &MemoryStorage, key: StorageKey) -> Option<String> {
        storage.get(key).unwrap()
    }

    #[test]
    fn login_authenticates_and_persists() {
        // Arrange
        let storage = MemoryStorage::new();
        let mut manager = restored(&storage);
        let result = login_result("admin", &["system:user:list"], &["admin"]);

        // Act
        manager.login(result.clone());

        // Assert
        let session = manager.session();
        assert!(session.is_authenticated);
        assert_eq!(session.user.as_ref(), Some(&result.user_info));
        assert_eq!(
            stored(&storage, StorageKey::AccessToken).as_deref(),
            Some(result.access_token.expose_secret())
        );
        assert_eq!(
            stored(&storage, StorageKey::RefreshToken).as_deref(),
            Some(result.refresh_token.expose_secret())
        );
        assert_eq!(
            stored(&storage, StorageKey::Permissions).as_deref(),
            Some(r#"["system:user:list"]"#)
        );
        assert_eq!(
            stored(&storage, StorageKey::Roles).as_deref(),
            Some(r#"["admin"]"#)
        );
        assert!(stored(&storage, StorageKey::UserInfo).is_some());
    }

    #[test]
    fn logout_clears_everything() {
        // Arrange
        let storage = MemoryStorage::new();
        let mut manager = logged_in(&storage);

        // Act
        manager.logout();

        // Assert
        assert!(!manager.session().is_authenticated);
        assert!(manager.session().user.is_none());
        assert_eq!(manager.status(), SessionStatus::Unauthenticated);
        for key in StorageKey::iter() {
            assert!(stored(&storage, key).is_none(), "{key} was not cleared");
        }
        assert!(storage.is_empty());
    }

    #[test]
    fn logout_twice_same_as_once() {
        let storage = MemoryStorage::new();
        let mut manager = logged_in(&storage);

        manager.logout();
        let once = manager.session().clone();
        manager.logout();

        assert_eq!(manager.session(), &once);
        assert!(storage.is_empty());
    }

    #[test]
    fn logout_before_restore_ends_loading() {
        let mut manager = SessionManager::new(MemoryStorage::new());

        manager.logout();

        assert_eq!(manager.session(), &Session::unauthenticated());
    }

    #[test]
    fn restore_brings_back_stored_values() {
        // Arrange
        let storage = MemoryStorage::new();
        let before = logged_in(&storage).session().clone();

        // Act - Simulate reload
        let after = restored(&storage);

        // Assert
        assert_eq!(after.session(), &before);
        assert!(!after.session().is_loading);
    }

    #[rstest]
    #[case::empty(&[])]
    #[case::token_only(&[StorageKey::AccessToken])]
    #[case::user_only(&[StorageKey::UserInfo, StorageKey::Permissions])]
    #[case::no_access_token(&[StorageKey::RefreshToken, StorageKey::UserInfo, StorageKey::Roles])]
    fn restore_partial_storage_is_unauthenticated(#[case] keep: &[StorageKey]) {
        // Arrange
        let mut storage = MemoryStorage::new();
        drop(logged_in(&storage));
        for key in StorageKey::iter().filter(|x| !keep.contains(x)) {
            storage.remove(key).unwrap();
        }

        // Act
        let manager = restored(&storage);

        // Assert
        assert_eq!(manager.status(), SessionStatus::Unauthenticated);
        assert!(!manager.session().is_loading);
    }

    #[test]
    fn restore_without_collections_gives_empty_collections() {
        // Arrange
        let mut storage = MemoryStorage::new();
        drop(logged_in(&storage));
        storage.remove(StorageKey::Permissions).unwrap();
        storage.remove(StorageKey::Roles).unwrap();

        // Act
        let manager = restored(&storage);

        // Assert
        assert!(manager.session().is_authenticated);
        assert!(manager.session().permissions.is_empty());
        assert!(manager.session().roles.is_empty());
    }

    #[rstest]
    #[case::user(StorageKey::UserInfo, "{not json")]
    #[case::user_missing_fields(StorageKey::UserInfo, "{}")]
    #[case::permissions(StorageKey::Permissions, "42")]
    #[case::roles(StorageKey::Roles, r#"[""]"#)]
    fn restore_corrupt_value_is_unauthenticated(#[case] key: StorageKey, #[case] value: &str) {
        // Arrange
        let mut storage = MemoryStorage::new();
        drop(logged_in(&storage));
        storage.set(key, value).unwrap();

        // Act
        let manager = restored(&storage);

        // Assert
        assert_eq!(manager.status(), SessionStatus::Unauthenticated);
        assert!(manager.session().user.is_none());
    }

    #[test]
    fn restore_with_unreadable_storage_is_unauthenticated() {
        let mut manager = SessionManager::new(BrokenStorage);

        manager.restore_session();

        assert_eq!(manager.session(), &Session::unauthenticated());
    }

    #[test]
    fn login_with_unwritable_storage_still_authenticates() {
        let mut manager = SessionManager::new(BrokenStorage);
        manager.restore_session();

        manager.login(login_result("admin", &[], &[]));

        assert!(manager.session().is_authenticated);
    }

    #[test]
    fn update_user_round_trips_through_restore() {
        // Arrange
        let storage = MemoryStorage::new();
        let mut manager = logged_in(&storage);
        let token_before = manager.session().access_token.clone();
        let mut new_profile = profile("admin");
        new_profile.email = Some("new@example.com".to_string());

        // Act
        manager.update_user(new_profile.clone());
        let reloaded = restored(&storage);

        // Assert
        assert_eq!(manager.session().user.as_ref(), Some(&new_profile));
        assert_eq!(manager.session().access_token, token_before);
        assert_eq!(reloaded.session().user.as_ref(), Some(&new_profile));
    }

    #[test]
    fn failed_login_then_clear_error() {
        // Arrange
        let mut manager = restored(&MemoryStorage::new());

        // Act
        manager.begin_login();
        let during = manager.status();
        manager.login_failed("Invalid username or password".to_string());
        let failed = manager.session().clone();
        manager.clear_error();

        // Assert
        assert_eq!(during, SessionStatus::Loading);
        assert_eq!(failed.status(), SessionStatus::LoginFailed);
        assert_eq!(failed.error.as_deref(), Some("Invalid username or password"));
        assert_eq!(manager.status(), SessionStatus::Unauthenticated);
    }

    #[test]
    fn failed_relogin_does_not_come_back_on_reload() {
        // Arrange
        let storage = MemoryStorage::new();
        let mut manager = logged_in(&storage);

        // Act
        manager.begin_login();
        manager.login_failed("bad password".to_string());
        let reloaded = restored(&storage);

        // Assert
        assert_eq!(manager.status(), SessionStatus::LoginFailed);
        assert_eq!(reloaded.status(), SessionStatus::Unauthenticated);
        assert!(storage.is_empty());
    }

    #[test]
    fn access_token_requires_login() {
        let storage = MemoryStorage::new();
        let mut manager = logged_in(&storage);
        assert_eq!(
            manager.access_token().unwrap().expose_secret(),
            "access-admin"
        );

        manager.logout();

        assert!(manager.access_token().is_err());
    }

    #[test]
    fn queries_follow_current_collections() {
        let manager = logged_in(&MemoryStorage::new());

        assert!(manager.check_permission("system:user:edit"));
        assert!(!manager.check_permission("system:user:remove"));
        assert!(manager.check_role("admin"));
        assert!(manager.has_any_permission(&["x", "system:user:list"]));
        assert!(!manager.has_any_role::<&str>(&[]));
        assert!(manager.has_all_permissions(&["system:user:list", "system:user:edit"]));
        assert!(!manager.has_all_roles(&["admin", "auditor"]));
    }
}
