use blogicum::config::Config;
use blogicum::models::db_operations::users_db_operations;
use blogicum::models::NewUser;
use blogicum::setup::db_setup;
use clap::{Parser, Subcommand};
use rand::RngCore;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "setup_cli", author, version, about = "A CLI for initial Blogicum setup.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the .env configuration file. Required by every command except `key generate`.
    #[arg(long, global = true, value_name = "FILE")]
    env_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    Staff {
        #[command(subcommand)]
        action: StaffAction,
    },
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Subcommand, Debug)]
enum DbAction {
    Setup,
}

#[derive(Subcommand, Debug)]
enum StaffAction {
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        email: String,
    },
    List,
    ChangePassword {
        #[arg(long)]
        username: String,
        #[arg(long)]
        new_password: String,
    },
}

#[derive(Subcommand, Debug)]
enum KeyAction {
    /// Prints a fresh SESSION_SECRET_KEY value.
    Generate,
}

fn load_config(env_file: &Option<PathBuf>) -> Config {
    let path = env_file
        .as_ref()
        .expect("FATAL: --env-file <FILE> is required for this command.");
    Config::from_env(path).expect("FATAL: Failed to load or parse configuration.")
}

fn main() {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Key { action: KeyAction::Generate } => generate_session_key(),
        Commands::Db { action: DbAction::Setup } => setup_blog_database(&load_config(&cli.env_file)),
        Commands::Staff { action } => {
            let config = load_config(&cli.env_file);
            match action {
                StaffAction::Create { username, password, email } => {
                    create_staff_user(&config, username, password, email)
                }
                StaffAction::List => list_staff_users(&config),
                StaffAction::ChangePassword { username, new_password } => {
                    change_password(&config, username, new_password)
                }
            }
        }
    }
}

fn generate_session_key() {
    let mut bytes = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut bytes);
    println!("SESSION_SECRET_KEY={}", hex::encode(bytes));
}

fn setup_blog_database(config: &Config) {
    let db_path = config.blog_db_path();
    if db_path.exists() {
        println!("ℹ️ Blog database already exists at '{}'. Skipping creation.", db_path.display());
        return;
    }
    println!("\nSetting up blog database at '{}'...", db_path.display());

    if let Some(parent_dir) = db_path.parent() {
        fs::create_dir_all(parent_dir).expect("Could not create database directory.");
    }

    let mut conn = Connection::open(&db_path).expect("Could not create blog database file.");
    match db_setup::setup_blog_db(&mut conn) {
        Ok(_) => println!("✅ Blog database setup completed successfully."),
        Err(e) => eprintln!("❌ Error setting up blog database: {}", e),
    }
}

fn open_existing(config: &Config) -> Option<Connection> {
    let db_path = config.blog_db_path();
    if !db_path.exists() {
        eprintln!(
            "❌ Error: Blog database not found at '{}'. Please run `setup_cli db setup` first.",
            db_path.display()
        );
        return None;
    }
    match Connection::open(&db_path) {
        Ok(conn) => Some(conn),
        Err(e) => {
            eprintln!("❌ Error opening blog database: {}", e);
            None
        }
    }
}

fn create_staff_user(config: &Config, username: &str, password: &str, email: &str) {
    let Some(conn) = open_existing(config) else { return };
    let new_user = NewUser {
        username: username.to_string(),
        password: password.to_string(),
        email: email.to_string(),
        first_name: String::new(),
        last_name: String::new(),
        is_staff: true,
    };
    match users_db_operations::create_user(&conn, &new_user, config.bcrypt_cost) {
        Ok(_) => println!("✅ Staff user '{}' created successfully.", username),
        Err(e) if e.is_unique_violation() => {
            eprintln!("❌ Error: a user named '{}' already exists.", username)
        }
        Err(e) => eprintln!("❌ Error creating staff user: {}", e),
    }
}

fn list_staff_users(config: &Config) {
    let Some(conn) = open_existing(config) else { return };
    match users_db_operations::read_staff_users(&conn) {
        Ok(users) => {
            println!("Listing Staff Users:");
            for user in users {
                println!("- {}", user.username);
            }
        }
        Err(e) => eprintln!("❌ Error fetching staff users: {}", e),
    }
}

fn change_password(config: &Config, username: &str, new_password: &str) {
    let Some(conn) = open_existing(config) else { return };
    match users_db_operations::set_password(&conn, username, new_password, config.bcrypt_cost) {
        Ok(0) => eprintln!("❌ Error: No user named '{}' found.", username),
        Ok(_) => println!("✅ Password for '{}' changed successfully.", username),
        Err(e) => eprintln!("❌ Error updating password: {}", e),
    }
}
