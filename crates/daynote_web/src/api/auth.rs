//! Login, logout and registration routes.

use crate::reply::{finish, ApiError, Page, Reply};
use crate::session::RequestSession;
use crate::state::AppState;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use daynote_core::{LoginForm, RegisterForm, Submission};
use serde_json::json;

const LOGIN_PAGE: &str = "todo_app/login.html";
const REGISTER_PAGE: &str = "todo_app/register_page.html";

#[get("/login")]
pub async fn login_page(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    state.with_conn(|conn| {
        let session = RequestSession::load(conn, &req)?;
        let reply = Reply::Page(Page::new(
            LOGIN_PAGE,
            json!({ "form": LoginForm::default() }),
        ));
        finish(conn, session, reply, state.session_ttl())
    })
}

#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, ApiError> {
    state.with_conn(|conn| {
        let mut session = RequestSession::load(conn, &req)?;
        let submission = state.auth(conn)?.login(session.context_mut(), &form)?;
        let reply = match submission {
            Submission::Accepted(outcome) => Reply::redirect(outcome.redirect),
            Submission::Invalid(errors) => Reply::Page(Page::new(
                LOGIN_PAGE,
                json!({ "form": &*form, "errors": errors }),
            )),
        };
        finish(conn, session, reply, state.session_ttl())
    })
}

async fn logout(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    state.with_conn(|conn| {
        let mut session = RequestSession::load(conn, &req)?;
        let outcome = state.auth(conn)?.logout(session.context_mut());
        finish(
            conn,
            session,
            Reply::redirect(outcome.redirect),
            state.session_ttl(),
        )
    })
}

#[get("/register")]
pub async fn register_page(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    state.with_conn(|conn| {
        let session = RequestSession::load(conn, &req)?;
        let reply = Reply::Page(Page::new(
            REGISTER_PAGE,
            json!({ "form": RegisterForm::default() }),
        ));
        finish(conn, session, reply, state.session_ttl())
    })
}

#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse, ApiError> {
    state.with_conn(|conn| {
        let mut session = RequestSession::load(conn, &req)?;
        let submission = state.auth(conn)?.register(session.context_mut(), &form)?;
        let reply = match submission {
            Submission::Accepted(outcome) => Reply::redirect(outcome.redirect),
            Submission::Invalid(errors) => Reply::Page(Page::new(
                REGISTER_PAGE,
                json!({ "form": &*form, "errors": errors }),
            )),
        };
        finish(conn, session, reply, state.session_ttl())
    })
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(login_page)
        .service(login)
        .service(
            web::resource("/logout")
                .route(web::get().to(logout))
                .route(web::post().to(logout)),
        )
        .service(register_page)
        .service(register);
}
