use std::{
    collections::BTreeSet,
    fmt::{Debug, Display},
};

use crate::errors::ConversionError;

/// A capability token as issued by the backend, for example
/// `system:user:edit`. Constrained to not be an empty string.
#[derive(
    Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Clone,
)]
#[serde(try_from = "String", into = "String")]
pub struct Permission(String);

impl Permission {
    pub const MAX_LENGTH: usize = 100;
}

impl TryFrom<String> for Permission {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(ConversionError::Empty);
        }
        if value.len() > Self::MAX_LENGTH {
            return Err(ConversionError::MaxExceeded {
                max: Self::MAX_LENGTH,
                actual: value.len(),
            });
        }
        Ok(Self(value))
    }
}

impl TryFrom<&str> for Permission {
    type Error = ConversionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.to_string().try_into()
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        value.0
    }
}

impl AsRef<str> for Permission {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The permissions held by the current user. Always present, possibly empty.
#[derive(serde::Serialize, serde::Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Permissions(pub BTreeSet<Permission>);

impl Permissions {
    pub fn contains(&self, permission: &str) -> bool {
        self.0.iter().any(|x| x.as_ref() == permission)
    }

    /// True if at least one of `perms` is held. An empty list never matches.
    pub fn includes_any<S: AsRef<str>>(&self, perms: &[S]) -> bool {
        perms.iter().any(|x| self.contains(x.as_ref()))
    }

    /// True if every one of `perms` is held. An empty list always matches.
    pub fn includes_all<S: AsRef<str>>(&self, perms: &[S]) -> bool {
        perms.iter().all(|x| self.contains(x.as_ref()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }
}

impl From<Vec<Permission>> for Permissions {
    fn from(value: Vec<Permission>) -> Self {
        Self(value.into_iter().collect())
    }
}

impl TryFrom<Vec<String>> for Permissions {
    type Error = ConversionError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        value
            .into_iter()
            .map(Permission::try_from)
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }
}

impl Debug for Permissions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Permissions")
            .field(&self.0.iter().map(|x| x.as_ref()).collect::<Vec<_>>())
            .finish()
    }
}
