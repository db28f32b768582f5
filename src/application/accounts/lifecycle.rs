//! Account lifecycle shared by self-service and admin deletion

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::profile::{HandleRepositoryInterface, ProfileRepositoryInterface};
use crate::domain::{Account, DomainResult, IdentityProvider};

pub struct AccountLifecycle {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileRepositoryInterface>,
    handles: Arc<dyn HandleRepositoryInterface>,
}

impl AccountLifecycle {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileRepositoryInterface>,
        handles: Arc<dyn HandleRepositoryInterface>,
    ) -> Self {
        Self {
            identity,
            profiles,
            handles,
        }
    }

    /// `UserNotFound` when no account has this email.
    pub async fn resolve_by_email(&self, email: &str) -> DomainResult<Account> {
        Ok(self.identity.get_user_by_email(email).await?)
    }

    /// Deletes the account, its handle mapping and its profile, in that
    /// order. A failure part-way leaves the remaining records behind.
    pub async fn delete(&self, account: &Account) -> DomainResult<()> {
        let uid = account.uid.as_str();
        let handle = match self.profiles.find(uid).await? {
            Some(profile) => Some(profile.username),
            None => {
                warn!(uid, "Deleting account without a stored profile");
                None
            }
        };

        self.identity.delete_user(uid).await?;

        if let Some(handle) = handle.filter(|h| !h.is_empty()) {
            // The mapping may have been re-claimed by someone else.
            match self.handles.find_uid(&handle).await? {
                Some(owner) if owner == uid => self.handles.release(&handle).await?,
                Some(owner) => {
                    warn!(uid, handle = %handle, owner = %owner, "Handle now maps to another account; keeping it")
                }
                None => {}
            }
        }

        self.profiles.delete(uid).await?;

        info!(uid, email = ?account.email, "Account deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::CreateAccountDto;
    use crate::domain::{DomainError, Profile};
    use crate::infrastructure::memory::{InMemoryDocumentStore, InMemoryIdentityProvider};
    use crate::infrastructure::repositories::{HandleRepository, ProfileRepository};

    struct Fixture {
        identity: Arc<InMemoryIdentityProvider>,
        profiles: Arc<ProfileRepository>,
        handles: Arc<HandleRepository>,
        lifecycle: AccountLifecycle,
    }

    fn fixture() -> Fixture {
        let identity = Arc::new(InMemoryIdentityProvider::with_bcrypt_cost(4));
        let documents = Arc::new(InMemoryDocumentStore::new());
        let profiles = Arc::new(ProfileRepository::new(documents.clone()));
        let handles = Arc::new(HandleRepository::new(documents));
        let lifecycle = AccountLifecycle::new(identity.clone(), profiles.clone(), handles.clone());
        Fixture {
            identity,
            profiles,
            handles,
            lifecycle,
        }
    }

    async fn seed(f: &Fixture, handle: &str, email: &str) -> Account {
        let account = f
            .identity
            .create_user(&CreateAccountDto {
                email: email.into(),
                password: "secret1".into(),
                display_name: Some(handle.into()),
            })
            .await
            .unwrap();
        f.handles.claim(handle, &account.uid).await.unwrap();
        f.profiles
            .create(&account.uid, &Profile::new(handle, email, "2024-01-01T00:00:00Z"))
            .await
            .unwrap();
        account
    }

    #[tokio::test]
    async fn delete_removes_all_three_records() {
        let f = fixture();
        let account = seed(&f, "ada", "ada@example.com").await;

        f.lifecycle.delete(&account).await.unwrap();

        assert!(f.identity.is_empty());
        assert!(f.handles.find_uid("ada").await.unwrap().is_none());
        assert!(f.profiles.find(&account.uid).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_email_is_user_not_found() {
        let f = fixture();
        let err = f
            .lifecycle
            .resolve_by_email("ghost@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::UserNotFound));
    }

    #[tokio::test]
    async fn reclaimed_handle_survives() {
        let f = fixture();
        let account = seed(&f, "ada", "ada@example.com").await;
        f.handles.release("ada").await.unwrap();
        f.handles.claim("ada", "someone-else").await.unwrap();

        f.lifecycle.delete(&account).await.unwrap();

        assert_eq!(
            f.handles.find_uid("ada").await.unwrap().as_deref(),
            Some("someone-else")
        );
    }
}
