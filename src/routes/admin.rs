use crate::error::BlogError;
use crate::helper::admin_helpers::{self, AdminHelperError};
use crate::helper::form_helpers::{self, FieldErrors, GuardedForm};
use crate::helper::render;
use crate::middleware::AuthenticatedUser;
use crate::models::Notification;
use crate::DbPool;
use actix_csrf::extractor::CsrfToken;
use actix_session::Session;
use actix_web::{web, HttpResponse};
use tera::Tera;

const DASHBOARD_URL: &str = "/admin/";

pub fn config_admin(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(show_admin_dashboard))
        .route("/categories", web::post().to(create_category_action))
        .route("/categories/{category_id}", web::post().to(update_category_action))
        .route("/categories/{category_id}/delete", web::post().to(delete_category_action))
        .route("/locations", web::post().to(create_location_action))
        .route("/locations/{location_id}", web::post().to(update_location_action))
        .route("/locations/{location_id}/delete", web::post().to(delete_location_action))
        .route("/posts/{post_id}", web::post().to(update_post_action));
}

fn set_notification(session: &Session, message: &str, r#type: &str) {
    let notification = Notification { message: message.to_string(), r#type: r#type.to_string() };
    if let Err(e) = session.insert("notification", &notification) {
        log::error!("Could not store admin notification in session: {}", e);
    }
}

fn notify_form_errors(session: &Session, errors: &FieldErrors) {
    let message = errors
        .iter()
        .map(|(name, msg)| format!("{}: {}", name, msg))
        .collect::<Vec<_>>()
        .join(" ");
    set_notification(session, &message, "error");
}

fn notify_outcome(session: &Session, result: Result<(), AdminHelperError>, success: &str) {
    match result {
        Ok(()) => set_notification(session, success, "success"),
        Err(e) => {
            log::error!("Admin action failed: {}", e);
            set_notification(session, e.user_message(), "error");
        }
    }
}

fn to_dashboard() -> HttpResponse {
    render::redirect(DASHBOARD_URL)
}

async fn show_admin_dashboard(
    user: AuthenticatedUser,
    session: Session,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    token: CsrfToken,
) -> Result<HttpResponse, BlogError> {
    let mut ctx = render::base_context(Some(&user), token.get());

    if let Ok(Some(notification)) = session.get::<Notification>("notification") {
        ctx.insert("notification", &notification);
        session.remove("notification");
    }

    let dashboard = admin_helpers::fetch_dashboard(&pool).map_err(|e| match e {
        AdminHelperError::Database(db) => BlogError::Database(db),
        AdminHelperError::Pool(pool_err) => BlogError::Pool(pool_err),
        AdminHelperError::NotFound => BlogError::NotFound,
    })?;
    ctx.insert("categories", &dashboard.categories);
    ctx.insert("locations", &dashboard.locations);
    ctx.insert("posts", &dashboard.posts);
    render::render(&tera, "admin/dashboard.html", &ctx)
}

async fn create_category_action(
    session: Session,
    pool: web::Data<DbPool>,
    form: GuardedForm,
) -> HttpResponse {
    let parsed = form_helpers::accepted(form).fields;
    match form_helpers::clean_category(&parsed) {
        Ok(draft) => {
            let result = admin_helpers::create_category(&pool, &draft).map(|_| ());
            notify_outcome(&session, result, &format!("Category '{}' created.", draft.title));
        }
        Err(errors) => notify_form_errors(&session, &errors),
    }
    to_dashboard()
}

async fn update_category_action(
    session: Session,
    category_id: web::Path<i64>,
    pool: web::Data<DbPool>,
    form: GuardedForm,
) -> HttpResponse {
    let parsed = form_helpers::accepted(form).fields;
    match form_helpers::clean_category(&parsed) {
        Ok(draft) => {
            let result = admin_helpers::update_category(&pool, *category_id, &draft);
            notify_outcome(&session, result, &format!("Category '{}' updated.", draft.title));
        }
        Err(errors) => notify_form_errors(&session, &errors),
    }
    to_dashboard()
}

async fn delete_category_action(
    session: Session,
    category_id: web::Path<i64>,
    pool: web::Data<DbPool>,
    _form: GuardedForm,
) -> HttpResponse {
    let result = admin_helpers::delete_category(&pool, *category_id);
    notify_outcome(&session, result, "Category deleted. Its posts are now uncategorised.");
    to_dashboard()
}

async fn create_location_action(
    session: Session,
    pool: web::Data<DbPool>,
    form: GuardedForm,
) -> HttpResponse {
    let parsed = form_helpers::accepted(form).fields;
    match form_helpers::clean_location(&parsed) {
        Ok(draft) => {
            let result = admin_helpers::create_location(&pool, &draft).map(|_| ());
            notify_outcome(&session, result, &format!("Location '{}' created.", draft.name));
        }
        Err(errors) => notify_form_errors(&session, &errors),
    }
    to_dashboard()
}

async fn update_location_action(
    session: Session,
    location_id: web::Path<i64>,
    pool: web::Data<DbPool>,
    form: GuardedForm,
) -> HttpResponse {
    let parsed = form_helpers::accepted(form).fields;
    match form_helpers::clean_location(&parsed) {
        Ok(draft) => {
            let result = admin_helpers::update_location(&pool, *location_id, &draft);
            notify_outcome(&session, result, &format!("Location '{}' updated.", draft.name));
        }
        Err(errors) => notify_form_errors(&session, &errors),
    }
    to_dashboard()
}

async fn delete_location_action(
    session: Session,
    location_id: web::Path<i64>,
    pool: web::Data<DbPool>,
    _form: GuardedForm,
) -> HttpResponse {
    let result = admin_helpers::delete_location(&pool, *location_id);
    notify_outcome(&session, result, "Location deleted.");
    to_dashboard()
}

/// Inline toggle of a post's publication flag; an absent checkbox unpublishes.
async fn update_post_action(
    session: Session,
    post_id: web::Path<i64>,
    pool: web::Data<DbPool>,
    form: GuardedForm,
) -> HttpResponse {
    let parsed = form_helpers::accepted(form).fields;
    let is_published = parsed.contains_key("is_published");
    let result = admin_helpers::set_post_published(&pool, *post_id, is_published);
    let message = if is_published { "Post published." } else { "Post hidden." };
    notify_outcome(&session, result, message);
    to_dashboard()
}
