use crate::config::Config;
use crate::error::BlogError;
use crate::helper::form_helpers::{self, FieldErrors, GuardedForm, RegistrationForm};
use crate::helper::render;
use crate::helper::urls;
use crate::middleware::{AuthenticatedUser, Viewer};
use crate::models::db_operations::users_db_operations;
use crate::models::NewUser;
use crate::DbPool;
use actix_csrf::extractor::CsrfToken;
use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tera::Tera;

const INVALID_LOGIN: &str = "Please enter a correct username and password. Note that both fields may be case-sensitive.";

#[derive(Deserialize)]
pub struct NextQuery {
    next: Option<String>,
}

pub fn config_auth(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth/login/", web::get().to(show_login_form))
        .route("/auth/login/", web::post().to(handle_login))
        .route("/auth/logout/", web::post().to(handle_logout))
        .route("/auth/registration/", web::get().to(show_registration_form))
        .route("/auth/registration/", web::post().to(handle_registration));
}

fn render_login(
    tera: &Tera,
    viewer: &Viewer,
    csrf_token: &str,
    username: &str,
    next: Option<&str>,
    error: Option<&str>,
) -> Result<HttpResponse, BlogError> {
    let mut ctx = render::base_context(viewer.user(), csrf_token);
    ctx.insert("username", username);
    ctx.insert("next", &urls::safe_next(next));
    ctx.insert("error", &error);
    render::render(tera, "registration/login.html", &ctx)
}

async fn show_login_form(
    viewer: Viewer,
    tera: web::Data<Tera>,
    query: web::Query<NextQuery>,
    token: CsrfToken,
) -> Result<HttpResponse, BlogError> {
    render_login(&tera, &viewer, token.get(), "", query.next.as_deref(), None)
}

async fn handle_login(
    viewer: Viewer,
    session: Session,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    form: GuardedForm,
) -> Result<HttpResponse, BlogError> {
    let submitted = form_helpers::accepted(form);
    let fields = &submitted.fields;
    let username = fields.get("username").map(|s| s.trim()).unwrap_or("");
    let password = fields.get("password").map(|s| s.as_str()).unwrap_or("");
    let next = fields.get("next").map(|s| s.as_str());

    let conn = pool.get()?;
    let user = match users_db_operations::verify_credentials(&conn, username, password)? {
        Some(user) => user,
        None => {
            log::warn!("Failed login attempt for username '{}'", username);
            return render_login(&tera, &viewer, submitted.token(), username, next, Some(INVALID_LOGIN));
        }
    };

    session.renew();
    AuthenticatedUser::from(&user).store_in(&session)?;
    users_db_operations::update_last_login(&conn, user.id)?;
    log::info!("User '{}' logged in", user.username);

    Ok(render::redirect(urls::safe_next(next).unwrap_or("/")))
}

async fn handle_logout(session: Session, _form: GuardedForm) -> HttpResponse {
    session.purge();
    render::redirect("/")
}

fn render_registration(
    tera: &Tera,
    viewer: &Viewer,
    csrf_token: &str,
    form: &RegistrationForm,
    errors: &FieldErrors,
) -> Result<HttpResponse, BlogError> {
    let mut ctx = render::base_context(viewer.user(), csrf_token);
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    render::render(tera, "registration/registration_form.html", &ctx)
}

async fn show_registration_form(
    viewer: Viewer,
    tera: web::Data<Tera>,
    token: CsrfToken,
) -> Result<HttpResponse, BlogError> {
    render_registration(&tera, &viewer, token.get(), &RegistrationForm::default(), &FieldErrors::new())
}

async fn handle_registration(
    viewer: Viewer,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    form: GuardedForm,
) -> Result<HttpResponse, BlogError> {
    let submitted = form_helpers::accepted(form);
    let form = RegistrationForm::from_fields(&submitted.fields);
    let registration = match form.clean() {
        Ok(registration) => registration,
        Err(errors) => return render_registration(&tera, &viewer, submitted.token(), &form, &errors),
    };

    let conn = pool.get()?;
    let new_user = NewUser {
        username: registration.username,
        password: registration.password,
        email: registration.email,
        first_name: String::new(),
        last_name: String::new(),
        is_staff: false,
    };
    match users_db_operations::create_user(&conn, &new_user, config.bcrypt_cost) {
        Ok(user_id) => {
            log::info!("Registered user '{}' (id {})", new_user.username, user_id);
            Ok(render::redirect("/auth/login/"))
        }
        Err(e) if e.is_unique_violation() => {
            let mut errors = FieldErrors::new();
            errors.insert("username", "A user with that username already exists.".to_string());
            render_registration(&tera, &viewer, submitted.token(), &form, &errors)
        }
        Err(e) => Err(e.into()),
    }
}
