//! Input rules shared by the HTTP DTOs and the services.

use std::borrow::Cow;

use validator::{ValidationError, ValidationErrors};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 50;
pub const PASSWORD_MIN_LEN: usize = 6;

/// Handles double as document ids in the `usernames` collection, so they
/// must be path-safe. Length is checked by the `length` rule next to it.
pub fn validate_handle_chars(username: &str) -> Result<(), ValidationError> {
    let problem = if username.contains('/') {
        "must not contain '/'"
    } else if username.trim() != username {
        "must not start or end with whitespace"
    } else if username == "."
        || username == ".."
        || (username.starts_with("__") && username.ends_with("__"))
    {
        "is reserved"
    } else {
        return Ok(());
    };
    Err(ValidationError::new("handle").with_message(Cow::Borrowed(problem)))
}

/// Whether `handle` could ever have been registered.
pub fn is_registrable_handle(handle: &str) -> bool {
    let len = handle.chars().count();
    (USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) && validate_handle_chars(handle).is_ok()
}

/// Flattens `validator` output into `field: message` pairs joined by `; `.
pub fn describe_validation_errors(errors: &ValidationErrors) -> String {
    let mut field_errors: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{}: {}", field, msg)
            })
        })
        .collect();
    field_errors.sort();

    if field_errors.is_empty() {
        "Validation failed".to_string()
    } else {
        field_errors.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Handle {
        #[validate(
            length(min = 3, max = 50, message = "length"),
            custom(function = "validate_handle_chars")
        )]
        username: String,
    }

    fn handle_ok(username: &str) -> bool {
        Handle {
            username: username.to_string(),
        }
        .validate()
        .is_ok()
    }

    #[test]
    fn username_rules() {
        assert!(handle_ok("ada"));
        assert!(!handle_ok("ab"));
        assert!(!handle_ok("a/b/c"));
        assert!(!handle_ok("__ada__"));
        assert!(!handle_ok(" ada"));
        assert!(!handle_ok(&"x".repeat(51)));
    }

    #[test]
    fn dot_segments_are_never_registrable() {
        assert!(!is_registrable_handle(".."));
        assert!(!is_registrable_handle("."));
        assert!(!is_registrable_handle("a/b"));
        assert!(is_registrable_handle("ada"));
    }

    #[test]
    fn custom_rule_messages_are_described() {
        let errors = Handle {
            username: "a/b".into(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            describe_validation_errors(&errors),
            "username: must not contain '/'"
        );
    }
}
