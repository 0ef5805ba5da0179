//! Mapping of controller results onto HTTP responses.
//!
//! # Responsibility
//! - Render page contexts as JSON envelopes for the presentation layer.
//! - Translate redirects and workflow failures into status codes.
//!
//! # Invariants
//! - Rendering a page drains the session's flash queue.
//! - Authorization failures never render the protected page.

use crate::session::RequestSession;
use actix_web::http::header::LOCATION;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder, ResponseError};
use daynote_core::{
    AuthError, FlashMessage, Redirect, RepoError, User, WorkflowError, WorkflowResult,
};
use log::error;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt::{Display, Formatter};

pub const LOGIN_PATH: &str = "/login";
pub const EDIT_PAGE_PATH: &str = "/note/create";

/// Failure that aborts a request with `500`.
#[derive(Debug)]
pub enum ApiError {
    Internal(String),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Internal(details) => write!(f, "internal error: {details}"),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        error!("event=request_failed module=web status=error error={self}");
        HttpResponse::InternalServerError().json(json!({ "error": "internal" }))
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<WorkflowError> for ApiError {
    fn from(value: WorkflowError) -> Self {
        Self::Internal(value.to_string())
    }
}

/// A rendered page: template name plus its context data.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub template: &'static str,
    pub context: Value,
}

impl Page {
    pub fn new(template: &'static str, context: Value) -> Self {
        Self { template, context }
    }
}

#[derive(Serialize)]
struct UserSummary<'a> {
    id: i64,
    username: &'a str,
}

#[derive(Serialize)]
struct PageBody<'a> {
    template: &'static str,
    context: Value,
    messages: Vec<FlashMessage>,
    user: Option<UserSummary<'a>>,
}

/// What a handler wants sent back.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Page(Page),
    Redirect(String),
    LoginRequired { next: String },
    Forbidden,
    NotFound,
}

impl Reply {
    pub fn redirect(target: Redirect) -> Self {
        Self::Redirect(redirect_path(target))
    }

    /// Maps a workflow failure; storage failures become `ApiError`.
    pub fn from_workflow_error(err: WorkflowError, path: &str) -> Result<Self, ApiError> {
        match err {
            WorkflowError::LoginRequired => Ok(Self::LoginRequired {
                next: path.to_string(),
            }),
            WorkflowError::PermissionDenied(_) => Ok(Self::Forbidden),
            WorkflowError::NotFound(_) => Ok(Self::NotFound),
            other => Err(ApiError::Internal(other.to_string())),
        }
    }

    /// Runs `on_ok` for a successful result, mapping failures otherwise.
    pub fn from_result<T>(
        result: WorkflowResult<T>,
        path: &str,
        on_ok: impl FnOnce(T) -> Result<Reply, ApiError>,
    ) -> Result<Self, ApiError> {
        match result {
            Ok(value) => on_ok(value),
            Err(err) => Self::from_workflow_error(err, path),
        }
    }
}

/// URL for a controller redirect target.
pub fn redirect_path(target: Redirect) -> String {
    match target {
        Redirect::EditPage => EDIT_PAGE_PATH.to_string(),
        Redirect::EditPageFor(id) => format!("{EDIT_PAGE_PATH}?id={id}"),
    }
}

/// Path plus query string of `req`, as the client requested it.
pub fn request_target(req: &HttpRequest) -> String {
    match req.query_string() {
        "" => req.path().to_string(),
        query => format!("{}?{query}", req.path()),
    }
}

/// Login URL that returns the client to `next` afterwards.
pub fn login_location(next: &str) -> String {
    format!("{LOGIN_PATH}?next={}", urlencoding::encode(next))
}

/// Persists session changes and builds the HTTP response for `reply`.
pub fn finish(
    conn: &mut Connection,
    mut session: RequestSession,
    reply: Reply,
    ttl: std::time::Duration,
) -> Result<HttpResponse, ApiError> {
    let body = match &reply {
        Reply::Page(page) => {
            let messages = session.take_messages(conn)?;
            let user = session.context().user().map(summarize);
            Some(serde_json::to_value(PageBody {
                template: page.template,
                context: page.context.clone(),
                messages,
                user,
            })
            .map_err(|err| ApiError::Internal(err.to_string()))?)
        }
        _ => None,
    };
    let cookie = session.commit(conn, ttl)?;

    let mut builder = match &reply {
        Reply::Page(_) => HttpResponse::Ok(),
        Reply::Redirect(location) => see_other(location),
        Reply::LoginRequired { next } => see_other(&login_location(next)),
        Reply::Forbidden => HttpResponse::Forbidden(),
        Reply::NotFound => HttpResponse::NotFound(),
    };
    if let Some(cookie) = cookie {
        builder.cookie(cookie);
    }

    Ok(match reply {
        Reply::Page(_) => builder.json(body.unwrap_or(Value::Null)),
        Reply::Redirect(_) | Reply::LoginRequired { .. } => builder.finish(),
        Reply::Forbidden => builder.json(json!({ "error": "permission_denied" })),
        Reply::NotFound => builder.json(json!({ "error": "not_found" })),
    })
}

fn see_other(location: &str) -> HttpResponseBuilder {
    let mut builder = HttpResponse::SeeOther();
    builder.insert_header((LOCATION, location.to_string()));
    builder
}

fn summarize(user: &User) -> UserSummary<'_> {
    UserSummary {
        id: user.id,
        username: &user.username,
    }
}
