use crate::error::BlogError;
use crate::helper::form_helpers::{self, FieldErrors, GuardedForm, ProfileForm};
use crate::helper::render;
use crate::helper::urls;
use crate::middleware::AuthenticatedUser;
use crate::models::db_operations::users_db_operations;
use crate::DbPool;
use actix_csrf::extractor::CsrfToken;
use actix_web::{web, HttpResponse};
use tera::Tera;

pub fn config_profile(cfg: &mut web::ServiceConfig) {
    cfg.route("/profile/edit/", web::get().to(show_profile_form))
        .route("/profile/edit/", web::post().to(update_profile_action));
}

fn render_profile_form(
    tera: &Tera,
    user: &AuthenticatedUser,
    csrf_token: &str,
    form: &ProfileForm,
    errors: &FieldErrors,
) -> Result<HttpResponse, BlogError> {
    let mut ctx = render::base_context(Some(user), csrf_token);
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    render::render(tera, "blog/user.html", &ctx)
}

async fn show_profile_form(
    user: AuthenticatedUser,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    token: CsrfToken,
) -> Result<HttpResponse, BlogError> {
    let conn = pool.get()?;
    let account = users_db_operations::read_user_by_id(&conn, user.id)?.ok_or(BlogError::NotFound)?;
    render_profile_form(&tera, &user, token.get(), &ProfileForm::from_user(&account), &FieldErrors::new())
}

async fn update_profile_action(
    user: AuthenticatedUser,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    form: GuardedForm,
) -> Result<HttpResponse, BlogError> {
    let submitted = form_helpers::accepted(form);
    let form = ProfileForm::from_fields(&submitted.fields);
    let changes = match form.clean() {
        Ok(changes) => changes,
        Err(errors) => return render_profile_form(&tera, &user, submitted.token(), &form, &errors),
    };

    let conn = pool.get()?;
    match users_db_operations::update_profile(&conn, user.id, &changes) {
        Ok(_) => {}
        Err(e) if e.is_unique_violation() => {
            let mut errors = FieldErrors::new();
            errors.insert("username", "A user with that username already exists.".to_string());
            return render_profile_form(&tera, &user, submitted.token(), &form, &errors);
        }
        Err(e) => return Err(e.into()),
    }

    log::info!("User {} updated their profile", user.id);
    Ok(render::redirect(&urls::profile_url(&changes.username)))
}
