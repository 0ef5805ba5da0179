//! Note pages and note mutations.

use crate::reply::{finish, request_target, ApiError, Page, Reply};
use crate::session::RequestSession;
use crate::state::AppState;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use daynote_core::{NoteForm, Submission, TodoId};
use serde_json::json;

const ALL_DAYS: &str = "todo_app/all_days.html";
const ONE_DAY: &str = "todo_app/one_day.html";
const EDIT_PAGE: &str = "todo_app/edit_page.html";
const CALENDAR: &str = "todo_app/calendar.html";

#[get("/")]
pub async fn list(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    state.with_conn(|conn| {
        let session = RequestSession::load(conn, &req)?;
        let result = state.workflow(conn)?.list();
        let reply = Reply::from_result(result, &request_target(&req), |todos| {
            Ok(Reply::Page(Page::new(ALL_DAYS, json!({ "todo": todos }))))
        })?;
        finish(conn, session, reply, state.session_ttl())
    })
}

#[get("/calendar")]
pub async fn calendar(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    state.with_conn(|conn| {
        let session = RequestSession::load(conn, &req)?;
        let reply = Reply::Page(Page::new(CALENDAR, json!({})));
        finish(conn, session, reply, state.session_ttl())
    })
}

#[get("/note/create")]
pub async fn create_page(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    state.with_conn(|conn| {
        let session = RequestSession::load(conn, &req)?;
        let result = state.workflow(conn)?.create_page(session.context());
        let reply = Reply::from_result(result, &request_target(&req), |todos| {
            Ok(Reply::Page(Page::new(
                EDIT_PAGE,
                json!({ "example": todos, "form": NoteForm::default() }),
            )))
        })?;
        finish(conn, session, reply, state.session_ttl())
    })
}

#[post("/note/create")]
pub async fn create(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<NoteForm>,
) -> Result<HttpResponse, ApiError> {
    state.with_conn(|conn| {
        let mut session = RequestSession::load(conn, &req)?;
        let reply = {
            let workflow = state.workflow(conn)?;
            let result = workflow.create(session.context_mut(), &form);
            Reply::from_result(result, &request_target(&req), |submission| match submission {
                Submission::Accepted(outcome) => Ok(Reply::redirect(outcome.redirect)),
                Submission::Invalid(errors) => Ok(Reply::Page(Page::new(
                    EDIT_PAGE,
                    json!({
                        "example": workflow.list()?,
                        "form": &*form,
                        "errors": errors,
                    }),
                ))),
            })?
        };
        finish(conn, session, reply, state.session_ttl())
    })
}

#[get("/note/{id}")]
pub async fn detail(
    state: web::Data<AppState>,
    req: HttpRequest,
    id: web::Path<TodoId>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    state.with_conn(|conn| {
        let session = RequestSession::load(conn, &req)?;
        let result = state.workflow(conn)?.detail(id);
        let reply = Reply::from_result(result, &request_target(&req), |todo| {
            Ok(Reply::Page(Page::new(ONE_DAY, json!({ "example": todo }))))
        })?;
        finish(conn, session, reply, state.session_ttl())
    })
}

#[get("/note/{id}/edit")]
pub async fn edit_page(
    state: web::Data<AppState>,
    req: HttpRequest,
    id: web::Path<TodoId>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    state.with_conn(|conn| {
        let session = RequestSession::load(conn, &req)?;
        let result = state.workflow(conn)?.edit_page(session.context(), id);
        let reply = Reply::from_result(result, &request_target(&req), |todo| {
            let form = NoteForm::from_todo(&todo);
            Ok(Reply::Page(Page::new(
                EDIT_PAGE,
                json!({ "object": todo, "form": form, "update": true }),
            )))
        })?;
        finish(conn, session, reply, state.session_ttl())
    })
}

#[post("/note/{id}/edit")]
pub async fn update(
    state: web::Data<AppState>,
    req: HttpRequest,
    id: web::Path<TodoId>,
    form: web::Form<NoteForm>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    state.with_conn(|conn| {
        let mut session = RequestSession::load(conn, &req)?;
        let reply = {
            let workflow = state.workflow(conn)?;
            let result = workflow.update(session.context_mut(), id, &form);
            Reply::from_result(result, &request_target(&req), |submission| match submission {
                Submission::Accepted(outcome) => Ok(Reply::redirect(outcome.redirect)),
                Submission::Invalid(errors) => Ok(Reply::Page(Page::new(
                    EDIT_PAGE,
                    json!({
                        "object": workflow.detail(id)?,
                        "form": &*form,
                        "errors": errors,
                        "update": true,
                    }),
                ))),
            })?
        };
        finish(conn, session, reply, state.session_ttl())
    })
}

#[get("/note/{id}/delete")]
pub async fn delete_page(
    state: web::Data<AppState>,
    req: HttpRequest,
    id: web::Path<TodoId>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    state.with_conn(|conn| {
        let session = RequestSession::load(conn, &req)?;
        let result = state.workflow(conn)?.delete_page(session.context(), id);
        let reply = Reply::from_result(result, &request_target(&req), |todo| {
            Ok(Reply::Page(Page::new(EDIT_PAGE, json!({ "object": todo }))))
        })?;
        finish(conn, session, reply, state.session_ttl())
    })
}

#[post("/note/{id}/delete")]
pub async fn delete(
    state: web::Data<AppState>,
    req: HttpRequest,
    id: web::Path<TodoId>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    state.with_conn(|conn| {
        let mut session = RequestSession::load(conn, &req)?;
        let result = state.workflow(conn)?.delete(session.context_mut(), id);
        let reply = Reply::from_result(result, &request_target(&req), |outcome| {
            Ok(Reply::redirect(outcome.redirect))
        })?;
        finish(conn, session, reply, state.session_ttl())
    })
}
