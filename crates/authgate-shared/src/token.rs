//! Bearer tokens handed out by the auth backend. The contents are wrapped in
//! [`SecretString`] so they never show up in `Debug` output or traces.

use secrecy::{ExposeSecret, SecretString};

macro_rules! secret_token {
    ($name: ident) => {
        #[derive(Clone, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(SecretString);

        impl $name {
            pub fn expose_secret(&self) -> &str {
                self.0.expose_secret()
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value.into())
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.into())
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.expose_secret() == other.expose_secret()
            }
        }

        impl Eq for $name {}

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_tuple(stringify!($name)).field(&"[REDACTED]").finish()
            }
        }
    };
}

secret_token!(AccessToken);
secret_token!(RefreshToken);

impl AccessToken {
    /// Value for an `Authorization` header
    pub fn as_bearer(&self) -> String {
        format!("Bearer {}", self.expose_secret())
    }
}
