use actix_web::HttpResponse;
use std::collections::HashMap;
use tera::{Context, Tera, Value};

use crate::error::BlogError;
use crate::middleware::AuthenticatedUser;

/// Loads the templates matching `glob` and registers the blog's filters.
pub fn build_tera(glob: &str) -> Result<Tera, tera::Error> {
    let mut tera = Tera::new(glob)?;
    tera.register_filter("linebreaksbr", linebreaksbr);
    Ok(tera)
}

/// Escapes the text and turns newlines into `<br>`; pair it with `| safe`.
pub fn linebreaksbr(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = tera::try_get_value!("linebreaksbr", "value", String, value);
    let escaped = html_escape::encode_text(&text.replace("\r\n", "\n")).to_string();
    Ok(Value::String(escaped.replace('\n', "<br>")))
}

/// Every page gets the signed-in user for the navigation bar and the CSRF
/// token its forms submit.
pub fn base_context(user: Option<&AuthenticatedUser>, csrf_token: &str) -> Context {
    let mut ctx = Context::new();
    ctx.insert("csrf_token", csrf_token);
    if let Some(user) = user {
        ctx.insert("current_user", user);
    }
    ctx
}

pub fn render(tera: &Tera, template: &str, ctx: &Context) -> Result<HttpResponse, BlogError> {
    let rendered = tera.render(template, ctx).map_err(|err| {
        log::error!("Template rendering error in '{}': {:?}", template, err);
        err
    })?;
    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(rendered))
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found().append_header(("location", location)).finish()
}
