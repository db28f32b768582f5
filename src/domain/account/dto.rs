use super::{Account, CustomClaims};

/// Input for `IdentityProvider::create_user`.
#[derive(Debug, Clone)]
pub struct CreateAccountDto {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

/// Partial account update. `None` leaves the attribute untouched; an empty
/// display name clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountDto {
    pub display_name: Option<String>,
    pub disabled: Option<bool>,
    pub custom_claims: Option<CustomClaims>,
}

impl UpdateAccountDto {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.disabled.is_none() && self.custom_claims.is_none()
    }
}

/// One page of `list_users`. A missing token means the listing is complete.
#[derive(Debug, Clone, Default)]
pub struct AccountPage {
    pub accounts: Vec<Account>,
    pub next_page_token: Option<String>,
}

/// Result of a successful password sign-in exchange.
#[derive(Debug, Clone)]
pub struct SignInResult {
    pub uid: String,
    pub id_token: String,
    pub expires_in: u64,
}
