use actix_csrf::extractor::{Csrf, CsrfGuarded, CsrfToken};
use actix_web::web;
use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use crate::models::{
    Category, CategoryDraft, Location, LocationDraft, Post, PostDraft, ProfileChanges, User,
};

const MAX_TITLE_LEN: usize = 256;
const MAX_USERNAME_LEN: usize = 150;
const MIN_PASSWORD_LEN: usize = 8;
pub const DATETIME_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Field name to error message, rendered next to the offending input.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// An URL-encoded POST body: the CSRF token plus whatever fields the form has.
#[derive(Deserialize)]
pub struct GuardedFields {
    csrf_token: CsrfToken,
    #[serde(flatten)]
    pub fields: HashMap<String, String>,
}

impl CsrfGuarded for GuardedFields {
    fn csrf_token(&self) -> &CsrfToken {
        &self.csrf_token
    }
}

impl GuardedFields {
    /// The accepted token, handed back to a form rendered again after errors.
    pub fn token(&self) -> &str {
        self.csrf_token.get()
    }
}

/// Extractor for every state-changing POST. A missing or mismatched token
/// rejects the request before the handler runs.
pub type GuardedForm = Csrf<web::Form<GuardedFields>>;

/// Unwraps an accepted [`GuardedForm`].
pub fn accepted(form: GuardedForm) -> GuardedFields {
    form.into_inner().into_inner()
}

fn field(fields: &HashMap<String, String>, name: &str) -> String {
    fields.get(name).map(|s| s.trim().to_string()).unwrap_or_default()
}

// An HTML checkbox is only submitted when ticked.
fn checkbox(fields: &HashMap<String, String>, name: &str) -> bool {
    fields.contains_key(name)
}

fn slug_regex() -> &'static Regex {
    static SLUG: OnceLock<Regex> = OnceLock::new();
    SLUG.get_or_init(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid slug regex"))
}

fn username_regex() -> &'static Regex {
    static USERNAME: OnceLock<Regex> = OnceLock::new();
    USERNAME.get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("valid username regex"))
}

fn check_required(errors: &mut FieldErrors, name: &'static str, value: &str) {
    if value.is_empty() {
        errors.insert(name, "This field is required.".to_string());
    }
}

fn check_title(errors: &mut FieldErrors, name: &'static str, value: &str) {
    check_required(errors, name, value);
    if value.chars().count() > MAX_TITLE_LEN {
        errors.insert(name, format!("Ensure this value has at most {} characters.", MAX_TITLE_LEN));
    }
}

fn check_username(errors: &mut FieldErrors, value: &str) {
    if value.is_empty() {
        errors.insert("username", "This field is required.".to_string());
    } else if value.chars().count() > MAX_USERNAME_LEN || !username_regex().is_match(value) {
        errors.insert(
            "username",
            "Enter a valid username of letters, digits and @/./+/-/_ only.".to_string(),
        );
    }
}

fn check_email(errors: &mut FieldErrors, value: &str) {
    let valid = value.is_empty()
        || value
            .split_once('@')
            .map_or(false, |(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        errors.insert("email", "Enter a valid email address.".to_string());
    }
}

fn parse_optional_id(
    errors: &mut FieldErrors,
    name: &'static str,
    raw: &str,
    known: impl Fn(i64) -> bool,
) -> Option<i64> {
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<i64>() {
        Ok(id) if known(id) => Some(id),
        _ => {
            errors.insert(name, "Select a valid choice.".to_string());
            None
        }
    }
}

/// Parses a `datetime-local` input value, read as UTC. Only four-digit years
/// are accepted, so stored timestamps keep sorting as text.
pub fn parse_datetime_input(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, DATETIME_INPUT_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .filter(|naive| (1..=9999).contains(&naive.year()))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

pub fn format_datetime_input(value: &DateTime<Utc>) -> String {
    value.format(DATETIME_INPUT_FORMAT).to_string()
}

// --- Post ---

#[derive(Debug, Clone, Default, Serialize)]
pub struct PostForm {
    pub title: String,
    pub text: String,
    pub pub_date: String,
    pub category: String,
    pub location: String,
    pub is_published: bool,
}

impl PostForm {
    pub fn blank(now: DateTime<Utc>) -> Self {
        PostForm {
            pub_date: format_datetime_input(&now),
            is_published: true,
            ..PostForm::default()
        }
    }

    pub fn from_post(post: &Post) -> Self {
        PostForm {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: format_datetime_input(&post.pub_date),
            category: post.category_id.map(|id| id.to_string()).unwrap_or_default(),
            location: post.location_id.map(|id| id.to_string()).unwrap_or_default(),
            is_published: post.is_published,
        }
    }

    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        PostForm {
            title: field(fields, "title"),
            // Body text keeps its inner whitespace; only the edges are trimmed.
            text: field(fields, "text"),
            pub_date: field(fields, "pub_date"),
            category: field(fields, "category"),
            location: field(fields, "location"),
            is_published: checkbox(fields, "is_published"),
        }
    }

    /// Validates against the categories and locations offered by the form.
    /// An empty publication date means "now".
    pub fn clean(
        &self,
        categories: &[Category],
        locations: &[Location],
        now: DateTime<Utc>,
    ) -> Result<PostDraft, FieldErrors> {
        let mut errors = FieldErrors::new();
        check_title(&mut errors, "title", &self.title);
        check_required(&mut errors, "text", &self.text);

        let pub_date = if self.pub_date.is_empty() {
            Some(now)
        } else {
            let parsed = parse_datetime_input(&self.pub_date);
            if parsed.is_none() {
                errors.insert("pub_date", "Enter a valid date/time.".to_string());
            }
            parsed
        };

        let category_id = parse_optional_id(&mut errors, "category", &self.category, |id| {
            categories.iter().any(|c| c.id == id)
        });
        let location_id = parse_optional_id(&mut errors, "location", &self.location, |id| {
            locations.iter().any(|l| l.id == id)
        });

        match pub_date {
            Some(pub_date) if errors.is_empty() => Ok(PostDraft {
                title: self.title.clone(),
                text: self.text.clone(),
                pub_date,
                is_published: self.is_published,
                category_id,
                location_id,
            }),
            _ => Err(errors),
        }
    }
}

// --- Comment ---

#[derive(Debug, Clone, Default, Serialize)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        CommentForm { text: field(fields, "text") }
    }

    pub fn clean(&self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        check_required(&mut errors, "text", &self.text);
        if errors.is_empty() {
            Ok(self.text.clone())
        } else {
            Err(errors)
        }
    }
}

// --- Profile ---

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl ProfileForm {
    pub fn from_user(user: &User) -> Self {
        ProfileForm {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }

    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        ProfileForm {
            username: field(fields, "username"),
            first_name: field(fields, "first_name"),
            last_name: field(fields, "last_name"),
            email: field(fields, "email"),
        }
    }

    pub fn clean(&self) -> Result<ProfileChanges, FieldErrors> {
        let mut errors = FieldErrors::new();
        check_username(&mut errors, &self.username);
        check_email(&mut errors, &self.email);
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(ProfileChanges {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
        })
    }
}

// --- Authentication ---

#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password1: String,
    #[serde(skip_serializing)]
    pub password2: String,
}

/// Username and password accepted by the registration form.
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegistrationForm {
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        RegistrationForm {
            username: field(fields, "username"),
            email: field(fields, "email"),
            // Passwords are taken verbatim.
            password1: fields.get("password1").cloned().unwrap_or_default(),
            password2: fields.get("password2").cloned().unwrap_or_default(),
        }
    }

    pub fn clean(&self) -> Result<Registration, FieldErrors> {
        let mut errors = FieldErrors::new();
        check_username(&mut errors, &self.username);
        check_email(&mut errors, &self.email);
        if self.password1.chars().count() < MIN_PASSWORD_LEN {
            errors.insert(
                "password1",
                format!("This password is too short. It must contain at least {} characters.", MIN_PASSWORD_LEN),
            );
        }
        if self.password1 != self.password2 {
            errors.insert("password2", "The two password fields didn't match.".to_string());
        }
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Registration {
            username: self.username.clone(),
            email: self.email.clone(),
            password: self.password1.clone(),
        })
    }
}

// --- Administration ---

pub fn clean_category(fields: &HashMap<String, String>) -> Result<CategoryDraft, FieldErrors> {
    let mut errors = FieldErrors::new();
    let title = field(fields, "title");
    let slug = field(fields, "slug");
    check_title(&mut errors, "title", &title);
    if slug.is_empty() {
        errors.insert("slug", "This field is required.".to_string());
    } else if !slug_regex().is_match(&slug) {
        errors.insert(
            "slug",
            "Identifier may contain only Latin letters, digits, hyphens and underscores.".to_string(),
        );
    }
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(CategoryDraft {
        title,
        description: field(fields, "description"),
        slug,
        is_published: checkbox(fields, "is_published"),
    })
}

pub fn clean_location(fields: &HashMap<String, String>) -> Result<LocationDraft, FieldErrors> {
    let mut errors = FieldErrors::new();
    let name = field(fields, "name");
    check_title(&mut errors, "name", &name);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(LocationDraft { name, is_published: checkbox(fields, "is_published") })
}
