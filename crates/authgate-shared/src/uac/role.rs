use std::{collections::BTreeSet, fmt::Debug, ops::Deref};

use serde::{Deserialize, Serialize};

use crate::{errors::ConversionError, id::DbId};

/// Machine name of a role such as `admin` or `auditor`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct RoleKey(String);

impl RoleKey {
    pub const MAX_LENGTH: usize = 50;
}

/// A role as listed on the user profile. The backend sends these in display
/// order so they are kept as a `Vec`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AssignedRole {
    pub role_id: DbId,
    pub role_key: RoleKey,
    #[serde(default)]
    pub role_name: String,
}

/// Role keys held by the current user. Always present, possibly empty.
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Roles(pub BTreeSet<RoleKey>);

impl TryFrom<String> for RoleKey {
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

impl TryFrom<&str> for RoleKey {
    type Error = ConversionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.to_string().try_into()
    }
}

impl From<RoleKey> for String {
    fn from(value: RoleKey) -> Self {
        value.0
    }
}

impl Deref for RoleKey {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0[..]
    }
}

impl AsRef<str> for RoleKey {
    fn as_ref(&self) -> &str {
        self
    }
}

impl Roles {
    pub fn contains(&self, role: &str) -> bool {
        self.0.iter().any(|x| &**x == role)
    }

    /// True if at least one of `roles` is held. An empty list never matches.
    pub fn includes_any<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        roles.iter().any(|x| self.contains(x.as_ref()))
    }

    /// True if every one of `roles` is held. An empty list always matches.
    pub fn includes_all<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        roles.iter().all(|x| self.contains(x.as_ref()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoleKey> {
        self.0.iter()
    }
}

impl From<Vec<RoleKey>> for Roles {
    fn from(value: Vec<RoleKey>) -> Self {
        Self(value.into_iter().collect())
    }
}

impl TryFrom<Vec<String>> for Roles {
    type Error = ConversionError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        value
            .into_iter()
            .map(RoleKey::try_from)
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }
}

/// Every role listed on a profile, useful when the backend leaves the
/// separate role list empty
impl From<&[AssignedRole]> for Roles {
    fn from(value: &[AssignedRole]) -> Self {
        Self(value.iter().map(|x| x.role_key.clone()).collect())
    }
}

impl Debug for Roles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Roles")
            .field(&self.0.iter().map(|x| &x[..]).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn held(list: &[&str]) -> Roles {
        list.iter()
            .map(|x| x.to_string())
            .collect::<Vec<_>>()
            .try_into()
            .unwrap()
    }

    #[rstest]
    #[case::empty("", ConversionError::Empty)]
    #[case::too_long("r".repeat(51), ConversionError::MaxExceeded{max:50, actual:51})]
    fn illegal_role_key(#[case] value: String, #[case] expect: ConversionError) {
        let actual: Result<RoleKey, ConversionError> = value.try_into();
        assert_eq!(actual.unwrap_err(), expect);
    }

    #[rstest]
    #[case::match_one(&["admin", "auditor"], &["guest", "auditor"], true)]
    #[case::no_match(&["admin"], &["guest"], false)]
    #[case::nothing_requested(&["admin"], &[], false)]
    fn includes_any(#[case] list: &[&str], #[case] query: &[&str], #[case] expected: bool) {
        assert_eq!(held(list).includes_any(query), expected);
    }

    #[rstest]
    #[case::both(&["admin", "auditor"], &["admin", "auditor"], true)]
    #[case::one_missing(&["admin"], &["admin", "auditor"], false)]
    #[case::nothing_requested(&[], &[], true)]
    fn includes_all(#[case] list: &[&str], #[case] query: &[&str], #[case] expected: bool) {
        assert_eq!(held(list).includes_all(query), expected);
    }

    #[test]
    fn roles_from_assigned_roles() {
        // Arrange
        let assigned = vec![
            AssignedRole {
                role_id: 2.into(),
                role_key: "editor".try_into().unwrap(),
                role_name: "Editor".to_string(),
            },
            AssignedRole {
                role_id: 1.into(),
                role_key: "admin".try_into().unwrap(),
                role_name: "Administrator".to_string(),
            },
        ];

        // Act
        let actual: Roles = assigned.as_slice().into();

        // Assert
        assert_eq!(actual, held(&["admin", "editor"]));
    }
}
