#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::test::TestRequest;
use blogicum::config::{Config, WebConfig};
use blogicum::helper::render;
use blogicum::models::db_operations::{posts_db_operations, taxonomy_db_operations, users_db_operations};
use blogicum::models::{CategoryDraft, NewUser, PostDraft};
use blogicum::setup::db_setup;
use blogicum::{open_pool, DbPool};
use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use tempfile::TempDir;
use tera::Tera;

pub const PASSWORD: &str = "correct-horse";

/// A blog backed by a throwaway SQLite file.
pub struct TestBlog {
    _dir: TempDir,
    pub pool: DbPool,
    pub tera: Tera,
    pub config: Config,
}

impl TestBlog {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("blog.db");
        let mut conn = Connection::open(&db_path).unwrap();
        db_setup::setup_blog_db(&mut conn).unwrap();

        let tera = render::build_tera(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*.html")).unwrap();
        let config = Config {
            web: WebConfig { host: "127.0.0.1".to_string(), port: 8080 },
            posts_per_page: 10,
            bcrypt_cost: 4,
            database_path: dir.path().display().to_string(),
            static_path: "./static".to_string(),
            allowed_origins: String::new(),
            log_level: "info".to_string(),
            session_secret_key: "07".repeat(64),
            admin_allowed_ips: "*".to_string(),
            use_secure_cookies: false,
        };

        TestBlog { pool: open_pool(&db_path).unwrap(), _dir: dir, tera, config }
    }

    pub fn conn(&self) -> r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager> {
        self.pool.get().unwrap()
    }

    pub fn user(&self, username: &str) -> i64 {
        self.create_user(username, false)
    }

    pub fn staff(&self, username: &str) -> i64 {
        self.create_user(username, true)
    }

    fn create_user(&self, username: &str, is_staff: bool) -> i64 {
        let new_user = NewUser {
            username: username.to_string(),
            password: PASSWORD.to_string(),
            email: format!("{}@example.com", username),
            first_name: String::new(),
            last_name: String::new(),
            is_staff,
        };
        users_db_operations::create_user(&self.conn(), &new_user, 4).unwrap()
    }

    pub fn category(&self, slug: &str, is_published: bool) -> i64 {
        let draft = CategoryDraft {
            title: format!("Category {}", slug),
            description: String::new(),
            slug: slug.to_string(),
            is_published,
        };
        taxonomy_db_operations::create_category(&self.conn(), &draft).unwrap()
    }

    /// A published, uncategorised post dated `hours_ago` hours in the past.
    pub fn post(&self, author_id: i64, title: &str, hours_ago: i64) -> i64 {
        self.post_with(author_id, title, Utc::now() - Duration::hours(hours_ago), true, None)
    }

    pub fn post_with(
        &self,
        author_id: i64,
        title: &str,
        pub_date: DateTime<Utc>,
        is_published: bool,
        category_id: Option<i64>,
    ) -> i64 {
        let draft = PostDraft {
            title: title.to_string(),
            text: format!("Body of {}", title),
            pub_date,
            is_published,
            category_id,
            location_id: None,
        };
        posts_db_operations::create_post(&self.conn(), author_id, &draft).unwrap()
    }
}

/// Someone browsing the app under test: the CSRF cookie and token handed out
/// by a form page, plus the session cookie once logged in.
pub struct Visitor {
    pub session: Option<Cookie<'static>>,
    csrf_cookie: Cookie<'static>,
    csrf_token: String,
}

impl Visitor {
    pub fn new(csrf_cookie: Cookie<'static>, form_page: &str) -> Self {
        Visitor { session: None, csrf_cookie, csrf_token: csrf_token_in(form_page) }
    }

    pub fn get(&self, uri: &str) -> TestRequest {
        self.with_cookies(TestRequest::get().uri(uri))
    }

    /// A form submission carrying the visitor's CSRF token.
    pub fn post(&self, uri: &str, fields: &[(&str, &str)]) -> TestRequest {
        let mut form = fields.to_vec();
        form.push(("csrf_token", self.csrf_token.as_str()));
        self.with_cookies(TestRequest::post().uri(uri)).set_form(form)
    }

    /// A form submission that leaves the CSRF token out.
    pub fn post_without_token(&self, uri: &str, fields: &[(&str, &str)]) -> TestRequest {
        self.with_cookies(TestRequest::post().uri(uri)).set_form(fields.to_vec())
    }

    /// Picks up the session cookie a response set or refreshed.
    pub fn keep_session<B>(&mut self, resp: &ServiceResponse<B>) {
        if let Some(cookie) = resp.response().cookies().find(|c| c.name() == "id") {
            self.session = Some(cookie.into_owned());
        }
    }

    fn with_cookies(&self, req: TestRequest) -> TestRequest {
        let req = req.cookie(self.csrf_cookie.clone());
        match &self.session {
            Some(session) => req.cookie(session.clone()),
            None => req,
        }
    }
}

/// Reads the value of the first `csrf_token` hidden input on a page.
pub fn csrf_token_in(html: &str) -> String {
    let marker = "name=\"csrf_token\" value=\"";
    let start = html.find(marker).expect("csrf_token input") + marker.len();
    let end = start + html[start..].find('"').expect("closing quote");
    html[start..end].replace("&#x2F;", "/").replace("&amp;", "&")
}

/// Builds the app under test around a `TestBlog`.
#[allow(unused_macros)]
macro_rules! test_app {
    ($blog:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(blogicum::csrf_middleware())
                .wrap(blogicum::session_middleware(actix_web::cookie::Key::from(&[7u8; 64]), false))
                .app_data(actix_web::web::Data::new($blog.config.clone()))
                .app_data(actix_web::web::Data::new($blog.tera.clone()))
                .app_data(actix_web::web::Data::new($blog.pool.clone()))
                .configure(|cfg| blogicum::routes::config_routes(cfg, "*".to_string())),
        )
        .await
    };
}

/// An anonymous visitor who has opened the login page.
#[allow(unused_macros)]
macro_rules! visitor {
    ($app:expr) => {{
        let req = actix_web::test::TestRequest::get().uri("/auth/login/").to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
        let csrf_cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() != "id")
            .expect("csrf cookie")
            .into_owned();
        let body = actix_web::test::read_body(resp).await;
        common::Visitor::new(csrf_cookie, std::str::from_utf8(&body).unwrap())
    }};
}

/// Logs `$username` in and yields the signed-in visitor.
#[allow(unused_macros)]
macro_rules! login {
    ($app:expr, $username:expr) => {{
        let mut visitor = visitor!($app);
        let req = visitor
            .post("/auth/login/", &[("username", $username), ("password", common::PASSWORD)])
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::FOUND, "login failed for {}", $username);
        visitor.keep_session(&resp);
        assert!(visitor.session.is_some(), "no session cookie for {}", $username);
        visitor
    }};
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(actix_web::http::header::LOCATION)
        .expect("Location header")
        .to_str()
        .unwrap()
        .to_string()
}
