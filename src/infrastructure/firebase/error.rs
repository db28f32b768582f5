//! Google API error translation
//!
//! Identity Toolkit reports failures as `{"error": {"message": "EMAIL_EXISTS"}}`
//! (sometimes `"WEAK_PASSWORD : Password should be..."`); Firestore uses the
//! canonical `status` field (`ALREADY_EXISTS`, `NOT_FOUND`, ...).

use serde::Deserialize;

use crate::shared::ProviderError;

#[derive(Debug, Default, Deserialize)]
struct GoogleErrorBody {
    #[serde(default)]
    error: GoogleError,
}

#[derive(Debug, Default, Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

pub fn translate(status: u16, body: &str) -> ProviderError {
    let error = serde_json::from_str::<GoogleErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_default();

    let code = error
        .message
        .split(|c: char| c == ' ' || c == ':')
        .next()
        .unwrap_or_default()
        .trim();

    match code {
        "EMAIL_EXISTS" | "DUPLICATE_EMAIL" => ProviderError::EmailExists,
        "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => ProviderError::UserNotFound,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => ProviderError::InvalidPassword,
        "INVALID_EMAIL" => ProviderError::InvalidEmail,
        "WEAK_PASSWORD" => ProviderError::WeakPassword(error.message.clone()),
        "USER_DISABLED" => ProviderError::UserDisabled,
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "USER_TOKEN_EXPIRED" => {
            ProviderError::InvalidIdToken
        }
        "TOO_MANY_ATTEMPTS_TRY_LATER" => ProviderError::TooManyAttempts,
        "CONFIGURATION_NOT_FOUND" | "PROJECT_NOT_FOUND" | "API_KEY_INVALID" => {
            ProviderError::NotConfigured(code.to_string())
        }
        _ => match error.status.as_str() {
            "ALREADY_EXISTS" => ProviderError::AlreadyExists,
            "NOT_FOUND" => ProviderError::DocumentNotFound,
            "PERMISSION_DENIED" => ProviderError::PermissionDenied(error.message),
            "UNAUTHENTICATED" => ProviderError::Unauthenticated(error.message),
            "UNAVAILABLE" | "DEADLINE_EXCEEDED" => ProviderError::Unavailable(error.status.clone()),
            "" if code.is_empty() => ProviderError::Unexpected {
                status,
                code: "EMPTY_ERROR_BODY".to_string(),
            },
            "" => ProviderError::Unexpected {
                status,
                code: code.to_string(),
            },
            other => ProviderError::Unexpected {
                status,
                code: other.to_string(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(message: &str, status: &str) -> String {
        serde_json::json!({"error": {"code": 400, "message": message, "status": status}})
            .to_string()
    }

    #[test]
    fn identity_toolkit_codes() {
        assert!(matches!(
            translate(400, &body("EMAIL_EXISTS", "INVALID_ARGUMENT")),
            ProviderError::EmailExists
        ));
        assert!(matches!(
            translate(400, &body("INVALID_LOGIN_CREDENTIALS", "")),
            ProviderError::InvalidPassword
        ));
        assert!(matches!(
            translate(
                400,
                &body("WEAK_PASSWORD : Password should be at least 6 characters", "")
            ),
            ProviderError::WeakPassword(_)
        ));
        assert!(matches!(
            translate(400, &body("USER_NOT_FOUND", "")),
            ProviderError::UserNotFound
        ));
    }

    #[test]
    fn firestore_statuses() {
        assert!(matches!(
            translate(409, &body("Document already exists: projects/p/x", "ALREADY_EXISTS")),
            ProviderError::AlreadyExists
        ));
        assert!(matches!(
            translate(404, &body("No document to update: projects/p/x", "NOT_FOUND")),
            ProviderError::DocumentNotFound
        ));
    }

    #[test]
    fn unreachable_firestore_is_unavailable() {
        assert!(matches!(
            translate(503, &body("The service is currently unavailable.", "UNAVAILABLE")),
            ProviderError::Unavailable(ref s) if s == "UNAVAILABLE"
        ));
        assert!(matches!(
            translate(504, &body("Deadline exceeded.", "DEADLINE_EXCEEDED")),
            ProviderError::Unavailable(_)
        ));
    }

    #[test]
    fn unparseable_body_is_unexpected() {
        match translate(502, "<html>bad gateway</html>") {
            ProviderError::Unexpected { status, .. } => assert_eq!(status, 502),
            other => panic!("unexpected {:?}", other),
        }
    }
}
