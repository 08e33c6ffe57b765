use std::env;

use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

mod auth;
mod bookings;
mod db;
mod errors;
mod geo;
mod mailer;
mod models;
mod payments;
mod providers;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use state::{AppState, GeoConfig, JwtConfig, MailConfig, PaymentConfig};

#[actix_web::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("startup failed: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let db_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./data/servicefinder.db".to_string());
    db::ensure_sqlite_dir(&db_url)?;

    let options: SqliteConnectOptions = db_url.parse::<SqliteConnectOptions>()?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    db::run_migrations(&pool).await?;
    db::seed_admin(&pool).await?;

    let state = AppState {
        db: pool,
        http: reqwest::Client::new(),
        jwt: JwtConfig::from_env(),
        mail: MailConfig::from_env(),
        geo: GeoConfig::from_env(),
        payments: PaymentConfig::from_env(),
    };

    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8080);

    log::info!("listening on 0.0.0.0:{port}");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Logger::default())
            .configure(routes::auth::configure)
            .configure(routes::user::configure)
            .configure(routes::provider::configure)
            .configure(routes::admin::configure)
            .configure(routes::payment::configure)
            .configure(routes::chatbot::configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    Ok(())
}
