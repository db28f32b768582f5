use async_trait::async_trait;

use crate::domain::account::{
    Account, AccountPage, CreateAccountDto, CustomClaims, SignInResult, UpdateAccountDto,
};
use crate::shared::ProviderResult;

/// Account management on the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_user(&self, dto: &CreateAccountDto) -> ProviderResult<Account>;

    async fn get_user(&self, uid: &str) -> ProviderResult<Account>;
    async fn get_user_by_email(&self, email: &str) -> ProviderResult<Account>;

    /// One page of at most `page_size` accounts, starting after `page_token`.
    async fn list_users(
        &self,
        page_size: usize,
        page_token: Option<&str>,
    ) -> ProviderResult<AccountPage>;

    /// Replaces the whole claim set.
    async fn set_custom_user_claims(&self, uid: &str, claims: &CustomClaims)
        -> ProviderResult<()>;
    async fn update_user(&self, uid: &str, dto: &UpdateAccountDto) -> ProviderResult<Account>;
    async fn delete_user(&self, uid: &str) -> ProviderResult<()>;

    /// Returns the uid the token was issued to.
    async fn verify_id_token(&self, id_token: &str) -> ProviderResult<String>;
}

/// Password sign-in against the provider's token-issuing endpoint.
#[async_trait]
pub trait CredentialExchange: Send + Sync {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> ProviderResult<SignInResult>;
}
