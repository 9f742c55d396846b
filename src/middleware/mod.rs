use actix_session::{Session, SessionExt};
use actix_web::{dev, error::InternalError, guard, http::header, web, FromRequest, HttpRequest, HttpResponse};
use serde::Serialize;
use std::future::{ready, Ready};

use crate::error::BlogError;
use crate::helper::urls;
use crate::models::db_operations::users_db_operations;
use crate::models::User;
use crate::DbPool;

const USER_ID_KEY: &str = "user_id";

/// The signed-in user, loaded fresh from the users table on every request.
///
/// The session only records the account id, so a rename or a change of staff
/// status made from another session shows up immediately. Extracting it on a
/// handler makes the route login-required: anonymous requests are redirected
/// to the login page with `next` pointing back.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub username: String,
    pub is_staff: bool,
}

impl From<&User> for AuthenticatedUser {
    fn from(user: &User) -> Self {
        AuthenticatedUser { id: user.id, username: user.username.clone(), is_staff: user.is_staff }
    }
}

impl AuthenticatedUser {
    /// Resolves the session's account. A session pointing at a deleted
    /// account is purged and treated as anonymous.
    pub fn from_session(session: &Session, pool: &DbPool) -> Result<Option<Self>, BlogError> {
        let Some(user_id) = session.get::<i64>(USER_ID_KEY).unwrap_or(None) else {
            return Ok(None);
        };
        let conn = pool.get()?;
        match users_db_operations::read_user_by_id(&conn, user_id)? {
            Some(user) => Ok(Some(AuthenticatedUser::from(&user))),
            None => {
                log::warn!("Session for user id {} points at a missing account; purging it.", user_id);
                session.purge();
                Ok(None)
            }
        }
    }

    pub fn store_in(&self, session: &Session) -> Result<(), actix_session::SessionInsertError> {
        session.insert(USER_ID_KEY, self.id)
    }
}

fn current_user(req: &HttpRequest) -> Result<Option<AuthenticatedUser>, actix_web::Error> {
    let pool = req.app_data::<web::Data<DbPool>>().ok_or_else(|| {
        log::error!("Database pool is not registered as app data.");
        actix_web::error::ErrorInternalServerError("Database pool unavailable.")
    })?;
    AuthenticatedUser::from_session(&req.get_session(), pool).map_err(actix_web::Error::from)
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        match current_user(req) {
            Ok(Some(user)) => ready(Ok(user)),
            Ok(None) => {
                let next = req
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| req.path().to_string());
                let response = HttpResponse::Found()
                    .append_header((header::LOCATION, urls::login_url(&next)))
                    .finish();
                ready(Err(InternalError::from_response("Login required.", response).into()))
            }
            Err(e) => ready(Err(e)),
        }
    }
}

/// Whoever is looking at the page; anonymous visitors are `Viewer(None)`.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<AuthenticatedUser>);

impl Viewer {
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        self.0.as_ref()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.0.as_ref().map(|user| user.id)
    }
}

impl FromRequest for Viewer {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        ready(current_user(req).map(Viewer))
    }
}

/// Admits only accounts whose staff flag is set right now.
pub fn staff_guard(ctx: &guard::GuardContext) -> bool {
    let Some(pool) = ctx.app_data::<web::Data<DbPool>>() else {
        return false;
    };
    match AuthenticatedUser::from_session(&ctx.get_session(), pool) {
        Ok(user) => user.map_or(false, |user| user.is_staff),
        Err(e) => {
            log::error!("Could not resolve the session user for the admin scope: {}", e);
            false
        }
    }
}

/// Restricts the admin scope to a comma separated list of client IPs, or `*`.
pub fn ip_guard(ctx: &guard::GuardContext, allowed_ips: &str) -> bool {
    if allowed_ips.trim() == "*" {
        return true;
    }

    let request_ip = ctx.head().headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| ctx.head().peer_addr.map(|addr| addr.ip().to_string()));

    let peer_addr = match request_ip {
        Some(ip) => ip,
        None => {
            log::warn!("Could not determine peer IP address for admin request.");
            return false;
        }
    };

    let is_allowed = allowed_ips.split(',').any(|ip| ip.trim() == peer_addr);
    if !is_allowed {
        log::warn!("Blocked admin request from unauthorized IP: {}", peer_addr);
    }
    is_allowed
}
