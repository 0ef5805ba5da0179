//! HTTP routes.

pub mod auth;
pub mod notes;

use actix_web::{get, web, HttpResponse, Responder};
use serde::Serialize;

#[derive(Serialize)]
pub struct Response {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<&'static str>,
}

#[get("/health")]
pub async fn healthcheck() -> impl Responder {
    let response = Response {
        message: "Everything is working fine".to_string(),
        version: Some(daynote_core::core_version()),
    };
    HttpResponse::Ok().json(response)
}

pub async fn not_found() -> actix_web::Result<HttpResponse> {
    let response = Response {
        message: "Resource not found".to_string(),
        version: None,
    };
    Ok(HttpResponse::NotFound().json(response))
}

/// Registers every route. `/note/create` must precede `/note/{id}`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(healthcheck)
        .service(notes::list)
        .service(notes::calendar)
        .service(notes::create_page)
        .service(notes::create)
        .service(notes::detail)
        .service(notes::edit_page)
        .service(notes::update)
        .service(notes::delete_page)
        .service(notes::delete)
        .configure(auth::config);
}
