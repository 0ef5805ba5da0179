//! Login and registration forms.

use crate::forms::{clean_required_secret, clean_required_text, Form, FormErrors};
use crate::model::user::USERNAME_MAX_CHARS;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username regex"));

pub(crate) const MSG_INVALID_USERNAME: &str = "Enter a valid username. This value may contain \
only letters, numbers, and @/./+/-/_ characters.";
pub(crate) const MSG_PASSWORD_MISMATCH: &str = "The two password fields didn’t match.";

/// Raw login submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: Option<String>,
    /// Never echoed back to the client.
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

/// Cleaned login credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Form for LoginForm {
    type Cleaned = Credentials;

    fn validate(&self) -> Result<Credentials, FormErrors> {
        let mut errors = FormErrors::new();
        let username = clean_required_text(
            &mut errors,
            "username",
            self.username.as_deref(),
            USERNAME_MAX_CHARS,
        );
        let password = clean_required_secret(&mut errors, "password", self.password.as_deref());

        match (username, password) {
            (Some(username), Some(password)) => Ok(Credentials { username, password }),
            _ => Err(errors),
        }
    }
}

/// Raw registration submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    #[serde(skip_serializing)]
    pub password_confirm: Option<String>,
}

impl Form for RegisterForm {
    type Cleaned = Credentials;

    fn validate(&self) -> Result<Credentials, FormErrors> {
        let mut errors = FormErrors::new();
        let username = clean_required_text(
            &mut errors,
            "username",
            self.username.as_deref(),
            USERNAME_MAX_CHARS,
        )
        .filter(|username| {
            let valid = USERNAME_RE.is_match(username);
            if !valid {
                errors.add("username", MSG_INVALID_USERNAME);
            }
            valid
        });
        let password = clean_required_secret(&mut errors, "password", self.password.as_deref());
        let confirm = clean_required_secret(
            &mut errors,
            "password_confirm",
            self.password_confirm.as_deref(),
        );

        if let (Some(password), Some(confirm)) = (password.as_deref(), confirm.as_deref()) {
            if password != confirm {
                errors.add("password_confirm", MSG_PASSWORD_MISMATCH);
            }
        }

        match (username, password) {
            (Some(username), Some(password)) if errors.is_empty() => {
                Ok(Credentials { username, password })
            }
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LoginForm, RegisterForm, MSG_INVALID_USERNAME, MSG_PASSWORD_MISMATCH};
    use crate::forms::{Form, MSG_REQUIRED};

    fn register(username: &str, password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            password_confirm: Some(confirm.to_string()),
        }
    }

    #[test]
    fn login_requires_both_fields_and_keeps_password_verbatim() {
        let errors = LoginForm::default().validate().expect_err("empty login");
        assert_eq!(errors.field("username"), [MSG_REQUIRED.to_string()]);
        assert_eq!(errors.field("password"), [MSG_REQUIRED.to_string()]);

        let credentials = LoginForm {
            username: Some(" alice ".to_string()),
            password: Some(" pw1 ".to_string()),
        }
        .validate()
        .expect("valid login");
        assert_eq!(credentials.username, "alice");
        assert_eq!(credentials.password, " pw1 ");
    }

    #[test]
    fn register_accepts_short_passwords_when_confirmed() {
        let credentials = register("alice", "pw1", "pw1").validate().expect("valid");
        assert_eq!(credentials.username, "alice");
        assert_eq!(credentials.password, "pw1");
    }

    #[test]
    fn register_rejects_mismatched_confirmation() {
        let errors = register("alice", "pw1", "pw2")
            .validate()
            .expect_err("mismatch must fail");
        assert_eq!(
            errors.field("password_confirm"),
            [MSG_PASSWORD_MISMATCH.to_string()]
        );
    }

    #[test]
    fn register_rejects_usernames_with_spaces_or_symbols() {
        for username in ["al ice", "bob!", "a/b"] {
            let errors = register(username, "pw", "pw")
                .validate()
                .expect_err("invalid username must fail");
            assert_eq!(
                errors.field("username"),
                [MSG_INVALID_USERNAME.to_string()],
                "{username}"
            );
        }
        register("user.name+tag@host_-1", "pw", "pw")
            .validate()
            .expect("allowed punctuation should pass");
    }

    #[test]
    fn password_fields_are_not_serialized() {
        let json = serde_json::to_value(register("alice", "secret", "secret")).unwrap();
        assert_eq!(json["username"], "alice");
        assert!(json.get("password").is_none());
        assert!(json.get("password_confirm").is_none());
    }
}
