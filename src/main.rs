#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_web::{http::header, middleware::Logger, web, App, HttpResponse, HttpServer};
use twitter_login::{settings::LoginSettings, LoginSession, TwitterLogin, UserProfile};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also initializes the logger
    let settings = LoginSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;
    settings
        .validate()
        .map_err(|e| std::io::Error::other(format!("Invalid settings: {e}")))?;

    let twitter_login = TwitterLogin::from_settings(&settings)
        .map_err(|e| std::io::Error::other(format!("Failed to initialize Twitter client: {e}")))?;

    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    let consumer = web::Data::from(twitter_login.consumer());

    HttpServer::new(move || {
        App::new()
            .app_data(consumer.clone())
            .wrap(twitter_login.clone())
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/logout", web::get().to(logout))
        .default_service(web::to(not_found));
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().finish()
}

async fn index(login: LoginSession) -> HttpResponse {
    let body = greeting(
        login.is_logged_in(),
        login.twitter_user().as_ref(),
        login.last_error().is_some(),
    );
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

fn greeting(logged_in: bool, user: Option<&UserProfile>, declined: bool) -> String {
    let screen_name = user
        .and_then(UserProfile::screen_name)
        .filter(|name| !name.is_empty());
    match screen_name {
        Some(name) => format!("Hello, @{name}! <a href=\"/logout\">Log out</a>"),
        // Profile lookup failed during login
        None if logged_in => {
            "You are signed in with Twitter. <a href=\"/logout\">Log out</a>".to_string()
        }
        None if declined => {
            "You declined to sign in. <a href=\"/login\">Try again</a>".to_string()
        }
        None => "<a href=\"/login\">Sign in with Twitter</a>".to_string(),
    }
}

async fn logout(login: LoginSession) -> HttpResponse {
    login.logout();
    HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .finish()
}

fn print_startup_info(bind_address: &str, settings: &LoginSettings) {
    println!("Starting Twitter login demo on http://{bind_address}");
    println!();
    println!("Endpoints:");
    println!("  GET  /        - Greeting or sign-in link");
    println!("  GET  {}   - Sign in with Twitter", settings.login.login_path);
    println!("  GET  /logout  - Forget the Twitter session");
    println!();
    println!("Provider: {}{}", settings.twitter.site, settings.twitter.authorize_path);
    println!("Return path after login: {}", settings.login.return_to);
}
