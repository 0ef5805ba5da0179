//! Session/auth controller: login, logout and register-with-auto-login.
//!
//! # Invariants
//! - Credential failures are form errors, never process errors.
//! - A freshly registered user is authenticated with the submitted
//!   credentials before being bound to the context.

use crate::auth::password::{Argon2Hasher, PasswordError, PasswordHasher};
use crate::context::{FlashMessage, Outcome, Redirect, RequestContext, Submission};
use crate::forms::auth_forms::{LoginForm, RegisterForm};
use crate::forms::{Form, FormErrors};
use crate::model::user::{User, UserId};
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MSG_USER_CREATED: &str = "Пользователь успешно создан";
pub const MSG_INVALID_LOGIN: &str = "Please enter a correct username and password. Note that \
both fields may be case-sensitive.";
pub const MSG_USERNAME_TAKEN: &str = "A user with that username already exists.";

pub type AuthResult<T> = Result<T, AuthError>;

/// Failure of an auth operation that is not a form error.
#[derive(Debug)]
pub enum AuthError {
    Repo(RepoError),
    Password(PasswordError),
    InconsistentState(&'static str),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Password(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent account state: {details}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Password(err) => Some(err),
            Self::InconsistentState(_) => None,
        }
    }
}

impl From<RepoError> for AuthError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<PasswordError> for AuthError {
    fn from(value: PasswordError) -> Self {
        Self::Password(value)
    }
}

/// Auth controller over a user repository and a password hasher.
pub struct AuthService<U: UserRepository, H: PasswordHasher = Argon2Hasher> {
    repo: U,
    hasher: H,
}

impl<U: UserRepository> AuthService<U> {
    /// Creates a service hashing with Argon2.
    pub fn new(repo: U) -> Self {
        Self::with_hasher(repo, Argon2Hasher)
    }
}

impl<U: UserRepository, H: PasswordHasher> AuthService<U, H> {
    pub fn with_hasher(repo: U, hasher: H) -> Self {
        Self { repo, hasher }
    }

    /// Resolves the user bound to a session.
    pub fn current_user(&self, user_id: UserId) -> AuthResult<Option<User>> {
        Ok(self.repo.get_user(user_id)?)
    }

    /// Checks credentials and returns the matching user.
    pub fn authenticate(&self, username: &str, password: &str) -> AuthResult<Option<User>> {
        let Some(user) = self.repo.find_by_username(username)? else {
            // Hash anyway so unknown usernames cost the same as wrong passwords.
            self.hasher.hash(password)?;
            return Ok(None);
        };

        if self.hasher.verify(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Validates the login form and binds the user to the context.
    pub fn login(
        &self,
        ctx: &mut RequestContext,
        form: &LoginForm,
    ) -> AuthResult<Submission<User>> {
        let credentials = match form.validate() {
            Ok(credentials) => credentials,
            Err(errors) => return Ok(Submission::Invalid(errors)),
        };

        let Some(user) = self.authenticate(&credentials.username, &credentials.password)? else {
            warn!("event=auth_login module=auth status=denied");
            let mut errors = FormErrors::new();
            errors.add_non_field(MSG_INVALID_LOGIN);
            return Ok(Submission::Invalid(errors));
        };

        self.repo.touch_last_login(user.id)?;
        let user = self
            .repo
            .get_user(user.id)?
            .ok_or(AuthError::InconsistentState("logged-in user vanished"))?;
        info!("event=auth_login module=auth status=ok user_id={}", user.id);

        ctx.log_in(user.clone());
        Ok(Submission::Accepted(Outcome {
            value: user,
            redirect: Redirect::EditPage,
            message: None,
        }))
    }

    /// Ends the authenticated session.
    pub fn logout(&self, ctx: &mut RequestContext) -> Outcome<()> {
        if let Some(user) = ctx.user() {
            info!("event=auth_logout module=auth status=ok user_id={}", user.id);
        }
        ctx.log_out();
        Outcome {
            value: (),
            redirect: Redirect::EditPage,
            message: None,
        }
    }

    /// Creates an account and logs it in immediately.
    pub fn register(
        &self,
        ctx: &mut RequestContext,
        form: &RegisterForm,
    ) -> AuthResult<Submission<User>> {
        let credentials = match form.validate() {
            Ok(credentials) => credentials,
            Err(errors) => return Ok(Submission::Invalid(errors)),
        };

        if self.repo.username_taken(&credentials.username)? {
            return Ok(Submission::Invalid(username_taken()));
        }

        let password_hash = self.hasher.hash(&credentials.password)?;
        let created = match self.repo.create_user(&credentials.username, &password_hash) {
            Ok(user) => user,
            Err(RepoError::Conflict(_)) => return Ok(Submission::Invalid(username_taken())),
            Err(err) => return Err(err.into()),
        };
        info!("event=auth_register module=auth status=ok user_id={}", created.id);

        let user = self
            .authenticate(&credentials.username, &credentials.password)?
            .ok_or(AuthError::InconsistentState(
                "registered user failed to authenticate",
            ))?;
        self.repo.touch_last_login(user.id)?;
        let user = self
            .repo
            .get_user(user.id)?
            .ok_or(AuthError::InconsistentState("registered user vanished"))?;

        let message = FlashMessage::success(MSG_USER_CREATED);
        ctx.log_in(user.clone());
        ctx.notify(message.clone());
        Ok(Submission::Accepted(Outcome {
            value: user,
            redirect: Redirect::EditPage,
            message: Some(message),
        }))
    }
}

fn username_taken() -> FormErrors {
    let mut errors = FormErrors::new();
    errors.add("username", MSG_USERNAME_TAKEN);
    errors
}
