//! In-memory identity provider for development and testing

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use validator::ValidateEmail;

use crate::domain::account::{
    Account, AccountMetadata, AccountPage, CreateAccountDto, CustomClaims, SignInResult,
    UpdateAccountDto,
};
use crate::domain::ports::{CredentialExchange, IdentityProvider};
use crate::infrastructure::crypto::jwt::{create_id_token, verify_id_token, IdTokenConfig};
use crate::infrastructure::crypto::password::{hash_password, verify_password, DEFAULT_COST};
use crate::shared::{ProviderError, ProviderResult, PASSWORD_MIN_LEN};

struct StoredAccount {
    account: Account,
    password_hash: String,
}

/// Accounts keyed by uid plus a lowercase email index.
///
/// Pages are ordered by uid and the page token is the last uid served, so
/// listing is stable while accounts are added.
pub struct InMemoryIdentityProvider {
    accounts: DashMap<String, StoredAccount>,
    emails: DashMap<String, String>,
    bcrypt_cost: u32,
    tokens: IdTokenConfig,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::with_bcrypt_cost(DEFAULT_COST)
    }

    /// Tests use the minimum cost (4) to keep bulk registration fast.
    pub fn with_bcrypt_cost(bcrypt_cost: u32) -> Self {
        Self {
            accounts: DashMap::new(),
            emails: DashMap::new(),
            bcrypt_cost,
            tokens: IdTokenConfig::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn account(&self, uid: &str) -> ProviderResult<Account> {
        self.accounts
            .get(uid)
            .map(|stored| stored.account.clone())
            .ok_or(ProviderError::UserNotFound)
    }

    fn uid_for_email(&self, email: &str) -> ProviderResult<String> {
        self.emails
            .get(&email.trim().to_lowercase())
            .map(|uid| uid.value().clone())
            .ok_or(ProviderError::UserNotFound)
    }
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn new_uid() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn create_user(&self, dto: &CreateAccountDto) -> ProviderResult<Account> {
        let email = dto.email.trim().to_lowercase();
        if !email.validate_email() {
            return Err(ProviderError::InvalidEmail);
        }
        if dto.password.chars().count() < PASSWORD_MIN_LEN {
            return Err(ProviderError::WeakPassword(format!(
                "Password should be at least {} characters",
                PASSWORD_MIN_LEN
            )));
        }

        let password_hash = hash_password(&dto.password, self.bcrypt_cost)
            .map_err(|e| ProviderError::Unexpected {
                status: 500,
                code: e.to_string(),
            })?;

        let uid = new_uid();
        match self.emails.entry(email.clone()) {
            Entry::Occupied(_) => return Err(ProviderError::EmailExists),
            Entry::Vacant(slot) => {
                slot.insert(uid.clone());
            }
        }

        let account = Account {
            uid: uid.clone(),
            email: Some(email),
            email_verified: false,
            display_name: dto.display_name.clone(),
            disabled: false,
            metadata: AccountMetadata {
                creation_time: Some(Utc::now()),
                last_sign_in_time: None,
            },
            custom_claims: CustomClaims::new(),
        };
        self.accounts.insert(
            uid,
            StoredAccount {
                account: account.clone(),
                password_hash,
            },
        );
        Ok(account)
    }

    async fn get_user(&self, uid: &str) -> ProviderResult<Account> {
        self.account(uid)
    }

    async fn get_user_by_email(&self, email: &str) -> ProviderResult<Account> {
        let uid = self.uid_for_email(email)?;
        self.account(&uid)
    }

    async fn list_users(
        &self,
        page_size: usize,
        page_token: Option<&str>,
    ) -> ProviderResult<AccountPage> {
        let mut uids: Vec<String> = self
            .accounts
            .iter()
            .map(|entry| entry.key().clone())
            .filter(|uid| page_token.map_or(true, |after| uid.as_str() > after))
            .collect();
        uids.sort();

        let has_more = uids.len() > page_size;
        uids.truncate(page_size);

        let accounts: Vec<Account> = uids
            .iter()
            .filter_map(|uid| self.accounts.get(uid).map(|s| s.account.clone()))
            .collect();
        let next_page_token = if has_more {
            uids.last().cloned()
        } else {
            None
        };

        Ok(AccountPage {
            accounts,
            next_page_token,
        })
    }

    async fn set_custom_user_claims(
        &self,
        uid: &str,
        claims: &CustomClaims,
    ) -> ProviderResult<()> {
        let mut stored = self
            .accounts
            .get_mut(uid)
            .ok_or(ProviderError::UserNotFound)?;
        stored.account.custom_claims = claims.clone();
        Ok(())
    }

    async fn update_user(&self, uid: &str, dto: &UpdateAccountDto) -> ProviderResult<Account> {
        let mut stored = self
            .accounts
            .get_mut(uid)
            .ok_or(ProviderError::UserNotFound)?;

        if let Some(display_name) = &dto.display_name {
            stored.account.display_name = if display_name.is_empty() {
                None
            } else {
                Some(display_name.clone())
            };
        }
        if let Some(disabled) = dto.disabled {
            stored.account.disabled = disabled;
        }
        if let Some(claims) = &dto.custom_claims {
            stored.account.custom_claims = claims.clone();
        }
        Ok(stored.account.clone())
    }

    async fn delete_user(&self, uid: &str) -> ProviderResult<()> {
        let (_, stored) = self
            .accounts
            .remove(uid)
            .ok_or(ProviderError::UserNotFound)?;
        if let Some(email) = stored.account.email {
            self.emails.remove(&email);
        }
        Ok(())
    }

    async fn verify_id_token(&self, id_token: &str) -> ProviderResult<String> {
        let claims =
            verify_id_token(id_token, &self.tokens).map_err(|_| ProviderError::InvalidIdToken)?;
        let account = self
            .account(&claims.sub)
            .map_err(|_| ProviderError::InvalidIdToken)?;
        if account.disabled {
            return Err(ProviderError::UserDisabled);
        }
        Ok(account.uid)
    }
}

#[async_trait]
impl CredentialExchange for InMemoryIdentityProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> ProviderResult<SignInResult> {
        let uid = self.uid_for_email(email)?;
        let mut stored = self
            .accounts
            .get_mut(&uid)
            .ok_or(ProviderError::UserNotFound)?;

        let matches = verify_password(password, &stored.password_hash)
            .map_err(|_| ProviderError::InvalidPassword)?;
        if !matches {
            return Err(ProviderError::InvalidPassword);
        }
        if stored.account.disabled {
            return Err(ProviderError::UserDisabled);
        }

        stored.account.metadata.last_sign_in_time = Some(Utc::now());
        let id_token = create_id_token(&uid, stored.account.email.as_deref(), &self.tokens)
            .map_err(|e| ProviderError::Unexpected {
                status: 500,
                code: e.to_string(),
            })?;

        Ok(SignInResult {
            uid,
            id_token,
            expires_in: self.tokens.ttl_secs.max(0) as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> InMemoryIdentityProvider {
        InMemoryIdentityProvider::with_bcrypt_cost(4)
    }

    fn dto(email: &str) -> CreateAccountDto {
        CreateAccountDto {
            email: email.into(),
            password: "secret1".into(),
            display_name: Some("ada".into()),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let provider = provider();
        provider.create_user(&dto("ada@example.com")).await.unwrap();
        let err = provider.create_user(&dto("ADA@example.com")).await.unwrap_err();
        assert!(matches!(err, ProviderError::EmailExists));
        assert_eq!(provider.len(), 1);
    }

    #[tokio::test]
    async fn weak_password_is_rejected() {
        let provider = provider();
        let mut request = dto("ada@example.com");
        request.password = "123".into();
        let err = provider.create_user(&request).await.unwrap_err();
        assert!(matches!(err, ProviderError::WeakPassword(_)));
    }

    #[tokio::test]
    async fn sign_in_checks_password_and_disabled_flag() {
        let provider = provider();
        let account = provider.create_user(&dto("ada@example.com")).await.unwrap();

        let ok = provider
            .sign_in_with_password("ada@example.com", "secret1")
            .await
            .unwrap();
        assert_eq!(ok.uid, account.uid);
        assert_eq!(
            provider.verify_id_token(&ok.id_token).await.unwrap(),
            account.uid
        );

        let wrong = provider
            .sign_in_with_password("ada@example.com", "nope!!")
            .await
            .unwrap_err();
        assert!(matches!(wrong, ProviderError::InvalidPassword));

        provider
            .update_user(
                &account.uid,
                &UpdateAccountDto {
                    disabled: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let disabled = provider
            .sign_in_with_password("ada@example.com", "secret1")
            .await
            .unwrap_err();
        assert!(matches!(disabled, ProviderError::UserDisabled));
    }

    #[tokio::test]
    async fn pages_cover_every_account_once() {
        let provider = provider();
        for i in 0..7 {
            provider
                .create_user(&dto(&format!("user{}@example.com", i)))
                .await
                .unwrap();
        }

        let mut seen = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = provider.list_users(3, token.as_deref()).await.unwrap();
            assert!(page.accounts.len() <= 3);
            seen.extend(page.accounts.into_iter().map(|a| a.uid));
            match page.next_page_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 7);
    }

    #[tokio::test]
    async fn delete_frees_the_email() {
        let provider = provider();
        let account = provider.create_user(&dto("ada@example.com")).await.unwrap();
        provider.delete_user(&account.uid).await.unwrap();
        assert!(provider.is_empty());
        provider.create_user(&dto("ada@example.com")).await.unwrap();
    }
}
