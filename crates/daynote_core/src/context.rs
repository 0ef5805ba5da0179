//! Per-request state passed explicitly into every controller operation.
//!
//! # Responsibility
//! - Carry the acting user and the flash-message queue for one request.
//! - Define the outcome shapes returned by controller operations.
//!
//! # Invariants
//! - Controllers never read session state from anywhere but `RequestContext`.
//! - Messages queued here are persisted by the caller after the operation.

use crate::forms::FormErrors;
use crate::model::todo::TodoId;
use crate::model::user::User;
use serde::{Deserialize, Serialize};

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashLevel {
    Debug,
    Info,
    Success,
    Warning,
    Error,
}

impl FlashLevel {
    /// Stable storage/tag value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "success" => Some(Self::Success),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// One-time notification shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

impl FlashMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            text: text.into(),
        }
    }
}

/// Where the presentation layer should send the client after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    /// The note editing page.
    EditPage,
    /// The note editing page, focused on one note.
    EditPageFor(TodoId),
}

/// Successful operation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    pub value: T,
    pub redirect: Redirect,
    /// Notification emitted by the operation, also queued on the context.
    pub message: Option<FlashMessage>,
}

/// Result of a form submission.
///
/// Invalid input is an ordinary value, not an error: callers re-render the
/// form with the returned field errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission<T> {
    Accepted(Outcome<T>),
    Invalid(FormErrors),
}

impl<T> Submission<T> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// Returns the accepted outcome, if any.
    pub fn accepted(self) -> Option<Outcome<T>> {
        match self {
            Self::Accepted(outcome) => Some(outcome),
            Self::Invalid(_) => None,
        }
    }

    /// Returns the form errors of a rejected submission, if any.
    pub fn errors(&self) -> Option<&FormErrors> {
        match self {
            Self::Accepted(_) => None,
            Self::Invalid(errors) => Some(errors),
        }
    }
}

/// Acting user and flash queue for one request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    user: Option<User>,
    messages: Vec<FlashMessage>,
    auth_changed: bool,
}

impl RequestContext {
    /// Context for a request without an authenticated user.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context for a request authenticated as `user`.
    pub fn authenticated(user: User) -> Self {
        Self {
            user: Some(user),
            ..Self::default()
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Binds `user` to this request. The session layer persists the change.
    pub fn log_in(&mut self, user: User) {
        self.user = Some(user);
        self.auth_changed = true;
    }

    /// Drops the authenticated user from this request.
    pub fn log_out(&mut self) {
        self.user = None;
        self.auth_changed = true;
    }

    /// Whether `log_in`/`log_out` ran during this request.
    pub fn auth_changed(&self) -> bool {
        self.auth_changed
    }

    /// Queues a flash message for the next rendered page.
    pub fn notify(&mut self, message: FlashMessage) {
        self.messages.push(message);
    }

    pub fn pending_messages(&self) -> &[FlashMessage] {
        &self.messages
    }

    /// Drains queued messages for persistence.
    pub fn take_messages(&mut self) -> Vec<FlashMessage> {
        std::mem::take(&mut self.messages)
    }
}

#[cfg(test)]
mod tests {
    use super::{FlashLevel, FlashMessage, RequestContext};
    use crate::model::user::User;

    fn user(id: i64) -> User {
        User {
            id,
            username: format!("user{id}"),
            password_hash: String::new(),
            date_joined: 0,
            last_login: None,
        }
    }

    #[test]
    fn flash_level_round_trips_storage_values() {
        for level in [
            FlashLevel::Debug,
            FlashLevel::Info,
            FlashLevel::Success,
            FlashLevel::Warning,
            FlashLevel::Error,
        ] {
            assert_eq!(FlashLevel::parse(level.as_str()), Some(level));
        }
        assert_eq!(FlashLevel::parse("SUCCESS"), None);
    }

    #[test]
    fn take_messages_drains_queue_in_order() {
        let mut ctx = RequestContext::anonymous();
        ctx.notify(FlashMessage::success("first"));
        ctx.notify(FlashMessage::success("second"));

        let drained = ctx.take_messages();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].text, "first");
        assert!(ctx.pending_messages().is_empty());
    }

    #[test]
    fn log_in_and_out_mark_auth_change() {
        let mut ctx = RequestContext::authenticated(user(1));
        assert!(!ctx.auth_changed());

        ctx.log_out();
        assert!(!ctx.is_authenticated());
        assert!(ctx.auth_changed());

        ctx.log_in(user(2));
        assert_eq!(ctx.user().map(|u| u.id), Some(2));
    }
}
