//! Stores settings that are not expected to need to change but grouped together
//! for discoverability and reuse. Each constant should be prefixed by the module
//! name to allow importing the constant only and still be readable

pub const PANIC_ON_RARE_ERR: bool = true;

pub mod client {
    /// Where a route guard sends an unauthenticated user if nothing else is
    /// configured
    pub const CLIENT_DEFAULT_LOGIN_REDIRECT: &str = "/login";
    pub const CLIENT_DEFAULT_SERVER_ADDRESS: &str = "http://localhost:8789";
    pub const CLIENT_STORAGE_FILENAME: &str = "session.json";
}

pub mod storage {
    //! Keys used to persist the session in client storage. Changing any of
    //! these silently logs every user out after an upgrade.

    #[derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        Hash,
        PartialOrd,
        Ord,
        strum::Display,
        strum::EnumCount,
        strum::EnumIter,
        strum::IntoStaticStr,
    )]
    #[strum(serialize_all = "snake_case")]
    pub enum StorageKey {
        AccessToken,
        RefreshToken,
        /// JSON encoded user profile
        UserInfo,
        /// JSON array of strings
        Permissions,
        /// JSON array of strings
        Roles,
    }

    impl StorageKey {
        pub fn as_str(self) -> &'static str {
            self.into()
        }
    }
}

pub mod path {
    mod path_spec;
    pub use path_spec::PathSpec;
    pub const PATH_HEALTH_CHECK: PathSpec = PathSpec::get("/health_check");
    pub const PATH_LOGIN: PathSpec = PathSpec::post("/auth/login");
    pub const PATH_LOGOUT: PathSpec = PathSpec::post("/auth/logout");
}

#[cfg(test)]
mod tests {
    use super::storage::StorageKey;
    use static_assertions::const_assert_eq;
    use strum::{EnumCount as _, IntoEnumIterator as _};

    const_assert_eq!(StorageKey::COUNT, 5);

    #[test]
    fn storage_key_names_are_stable() {
        let actual: Vec<&str> = StorageKey::iter().map(StorageKey::as_str).collect();
        assert_eq!(
            actual,
            [
                "access_token",
                "refresh_token",
                "user_info",
                "permissions",
                "roles"
            ]
        );
        assert_eq!(StorageKey::UserInfo.to_string(), "user_info");
    }
}
