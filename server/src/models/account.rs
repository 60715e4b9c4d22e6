use std::collections::BTreeSet;

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccountRole {
    Admin,
    User,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Admin => "ADMIN",
            AccountRole::User => "USER",
        }
    }

    /// Authority name handed to access checks, e.g. `ROLE_ADMIN`.
    pub fn authority(&self) -> String {
        format!("ROLE_{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown account role '{0}'")]
pub struct UnknownAccountRole(String);

impl std::str::FromStr for AccountRole {
    type Err = UnknownAccountRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(AccountRole::Admin),
            "USER" => Ok(AccountRole::User),
            other => Err(UnknownAccountRole(other.to_string())),
        }
    }
}

/// A user that can obtain tokens and manage events.
///
/// `password` holds the bcrypt hash once the account has been saved through
/// the account service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub roles: BTreeSet<AccountRole>,
}

impl Account {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        roles: impl IntoIterator<Item = AccountRole>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            password: password.into(),
            roles: roles.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_authorities_are_prefixed() {
        assert_eq!(AccountRole::Admin.authority(), "ROLE_ADMIN");
        assert_eq!(AccountRole::User.authority(), "ROLE_USER");
    }

    #[test]
    fn test_role_parses_from_stored_name() {
        assert_eq!("ADMIN".parse::<AccountRole>().unwrap(), AccountRole::Admin);
        assert!("admin".parse::<AccountRole>().is_err());
    }

    #[test]
    fn test_duplicate_roles_collapse() {
        let account = Account::new(
            "user@email.com",
            "secret",
            [AccountRole::User, AccountRole::User],
        );
        assert_eq!(account.roles.len(), 1);
    }
}
