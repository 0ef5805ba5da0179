//! Cookie-bound session handling for one HTTP request.
//!
//! # Responsibility
//! - Resolve the `sessionid` cookie into a `RequestContext`.
//! - Persist login/logout transitions and queued flash messages afterwards.
//!
//! # Invariants
//! - Logging in always issues a fresh session key.
//! - Logging out deletes the server-side session.
//! - Anonymous requests only get a session once they have something to store.

use crate::reply::ApiError;
use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpRequest;
use daynote_core::{
    FlashMessage, RequestContext, SessionRecord, SessionRepository, SqliteSessionRepository,
    SqliteUserRepository, UserRepository,
};
use log::debug;
use rusqlite::Connection;
use std::time::Duration;

pub const SESSION_COOKIE: &str = "sessionid";

/// Session state loaded for one request.
pub struct RequestSession {
    record: Option<SessionRecord>,
    ctx: RequestContext,
}

impl RequestSession {
    /// Loads the session named by the request cookie, if it is still live.
    pub fn load(conn: &mut Connection, req: &HttpRequest) -> Result<Self, ApiError> {
        let record = match req.cookie(SESSION_COOKIE) {
            Some(cookie) => SqliteSessionRepository::try_new(conn)?.load_session(cookie.value())?,
            None => None,
        };

        let user = match record.as_ref().and_then(|record| record.user_id) {
            Some(user_id) => SqliteUserRepository::try_new(conn)?.get_user(user_id)?,
            None => None,
        };
        let ctx = match user {
            Some(user) => RequestContext::authenticated(user),
            None => RequestContext::anonymous(),
        };

        Ok(Self { record, ctx })
    }

    pub fn context(&self) -> &RequestContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut RequestContext {
        &mut self.ctx
    }

    /// Drains stored messages followed by the ones queued during this request.
    pub fn take_messages(&mut self, conn: &mut Connection) -> Result<Vec<FlashMessage>, ApiError> {
        let mut messages = match &self.record {
            Some(record) => {
                SqliteSessionRepository::try_new(conn)?.take_messages(&record.session_key)?
            }
            None => Vec::new(),
        };
        messages.extend(self.ctx.take_messages());
        Ok(messages)
    }

    /// Writes session changes back and returns the cookie to send, if any.
    pub fn commit(
        mut self,
        conn: &mut Connection,
        ttl: Duration,
    ) -> Result<Option<Cookie<'static>>, ApiError> {
        let pending = self.ctx.take_messages();
        let mut repo = SqliteSessionRepository::try_new(conn)?;
        let old_key = self.record.as_ref().map(|record| record.session_key.as_str());

        if self.ctx.auth_changed() {
            if let Some(user) = self.ctx.user() {
                let rotated = repo.rotate_session(old_key, Some(user.id), ttl)?;
                repo.push_messages(&rotated.session_key, &pending)?;
                debug!("event=session_rotate module=web status=ok user_id={}", user.id);
                return Ok(Some(session_cookie(rotated.session_key, ttl)));
            }

            if let Some(old_key) = old_key {
                repo.delete_session(old_key)?;
                debug!("event=session_flush module=web status=ok");
            }
            if pending.is_empty() {
                return Ok(Some(removal_cookie()));
            }
            let fresh = repo.create_session(None, ttl)?;
            repo.push_messages(&fresh.session_key, &pending)?;
            return Ok(Some(session_cookie(fresh.session_key, ttl)));
        }

        if pending.is_empty() {
            return Ok(None);
        }
        match old_key {
            Some(key) => {
                repo.push_messages(key, &pending)?;
                Ok(None)
            }
            None => {
                let fresh = repo.create_session(None, ttl)?;
                repo.push_messages(&fresh.session_key, &pending)?;
                Ok(Some(session_cookie(fresh.session_key, ttl)))
            }
        }
    }
}

fn session_cookie(session_key: String, ttl: Duration) -> Cookie<'static> {
    let max_age = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    Cookie::build(SESSION_COOKIE, session_key)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(max_age))
        .finish()
}

fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::{removal_cookie, session_cookie, SESSION_COOKIE};
    use actix_web::cookie::SameSite;
    use std::time::Duration;

    #[test]
    fn session_cookie_is_http_only_and_lax() {
        let cookie = session_cookie("abc".to_string(), Duration::from_secs(60));
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn removal_cookie_is_empty_and_expired() {
        let cookie = removal_cookie();
        assert_eq!(cookie.value(), "");
        assert!(cookie.max_age().is_some_and(|age| age.is_zero()));
    }
}
