use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claim that grants access to the admin endpoints and to any profile.
pub const ADMIN_CLAIM: &str = "admin";

/// Names the identity provider reserves for its own token claims.
pub const RESERVED_CLAIMS: &[&str] = &[
    "acr", "amr", "at_hash", "aud", "auth_time", "azp", "cnf", "c_hash", "exp", "firebase",
    "iat", "iss", "jti", "nbf", "nonce", "sub",
];

pub type CustomClaims = Map<String, Value>;

/// Provider-managed account record. Never stored by this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub display_name: Option<String>,
    pub disabled: bool,
    pub metadata: AccountMetadata,
    #[serde(default)]
    pub custom_claims: CustomClaims,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMetadata {
    pub creation_time: Option<DateTime<Utc>>,
    pub last_sign_in_time: Option<DateTime<Utc>>,
}

impl Account {
    /// Only a literal boolean `true` counts; `"true"` or `1` do not.
    pub fn is_admin(&self) -> bool {
        matches!(self.custom_claims.get(ADMIN_CLAIM), Some(Value::Bool(true)))
    }
}

/// Applies `patch` on top of `existing`. A `null` value removes the key.
pub fn merge_claims(existing: &CustomClaims, patch: &CustomClaims) -> CustomClaims {
    let mut merged = existing.clone();
    for (key, value) in patch {
        if value.is_null() {
            merged.remove(key);
        } else {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// First reserved claim name found in `claims`, if any.
pub fn find_reserved_claim(claims: &CustomClaims) -> Option<&str> {
    claims
        .keys()
        .map(String::as_str)
        .find(|key| RESERVED_CLAIMS.contains(key))
}
