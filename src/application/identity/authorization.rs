//! Authorization gate
//!
//! Runs only after the caller's credentials were verified and the account
//! was re-read from the identity provider.

use tracing::debug;

use crate::domain::{Account, DomainError, DomainResult};

/// The owner may read their own profile; admins may read any.
pub fn authorize_profile_access(caller: &Account, owner_uid: &str) -> DomainResult<()> {
    if caller.uid == owner_uid || caller.is_admin() {
        return Ok(());
    }
    debug!(caller = %caller.uid, owner = %owner_uid, "Profile access denied");
    Err(DomainError::Forbidden(
        "You can only view your own profile".into(),
    ))
}

pub fn require_admin(caller: &Account) -> DomainResult<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(DomainError::Forbidden("Admin privileges required".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountMetadata, CustomClaims};
    use serde_json::json;

    fn account(uid: &str, admin: Option<bool>) -> Account {
        let mut custom_claims = CustomClaims::new();
        if let Some(flag) = admin {
            custom_claims.insert("admin".into(), json!(flag));
        }
        Account {
            uid: uid.into(),
            email: None,
            email_verified: false,
            display_name: None,
            disabled: false,
            metadata: AccountMetadata::default(),
            custom_claims,
        }
    }

    #[test]
    fn owner_is_allowed() {
        assert!(authorize_profile_access(&account("a", None), "a").is_ok());
    }

    #[test]
    fn stranger_is_forbidden() {
        let err = authorize_profile_access(&account("b", Some(false)), "a").unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[test]
    fn admin_sees_everyone() {
        assert!(authorize_profile_access(&account("b", Some(true)), "a").is_ok());
        assert!(require_admin(&account("b", Some(true))).is_ok());
        assert!(require_admin(&account("b", None)).is_err());
    }
}
