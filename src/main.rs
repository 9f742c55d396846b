use actix_cors::Cors;
use actix_web::{web, App, HttpServer, middleware::{Logger, DefaultHeaders}, cookie::Key};
use blogicum::{config::Config, csrf_middleware, helper::render, routes, open_pool, session_middleware};
use clap::Parser;
use std::convert::TryFrom;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "blogicum_server", author, version, about = "Starts the Blogicum web server.")]
struct Cli {
    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

fn build_cors(allowed_origins: &str) -> Cors {
    let cors = if allowed_origins.trim() == "*" {
        Cors::default().allow_any_origin()
    } else {
        allowed_origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };
    cors.allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![actix_web::http::header::ACCEPT, actix_web::http::header::CONTENT_TYPE])
        .supports_credentials()
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    let tera = render::build_tera("templates/**/*.html").expect("Tera initialization failed");

    let db_path = config.blog_db_path();
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).expect("Failed to create database directory");
    }
    if !db_path.exists() {
        log::warn!(
            "No blog database at '{}'. Run 'setup_cli --env-file <path> db setup' first.",
            db_path.display()
        );
    }
    let pool = open_pool(&db_path).expect("FATAL: Failed to create Rusqlite connection pool.");

    let session_key_bytes = hex::decode(&config.session_secret_key)
        .expect("FATAL: SESSION_SECRET_KEY in .env is not a valid hex string.");
    let session_key = Key::try_from(session_key_bytes.as_slice())
        .expect("FATAL: The decoded SESSION_SECRET_KEY is not long enough (minimum 64 bytes required).");

    let server_address = format!("{}:{}", config.web.host, config.web.port);
    log::info!("Server starting at http://{}", server_address);

    HttpServer::new(move || {
        let admin_allowed_ips = config.admin_allowed_ips.clone();

        App::new()
            .wrap(csrf_middleware())
            .wrap(session_middleware(session_key.clone(), config.use_secure_cookies))
            .wrap(build_cors(&config.allowed_origins))
            .wrap(Logger::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block"))
            )
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(tera.clone()))
            .app_data(web::Data::new(pool.clone()))
            .service(actix_files::Files::new("/static", &config.static_path))
            .configure(|cfg| routes::config_routes(cfg, admin_allowed_ips))
    })
    .bind(server_address)?
    .run()
    .await
}
