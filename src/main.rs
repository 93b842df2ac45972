use dotenvy::dotenv;
use evently_api::config::Config;
use evently_api::{build, db};
use rocket::{Build, Rocket, launch};

#[launch]
fn rocket() -> Rocket<Build> {
    dotenv().ok();
    env_logger::init();

    let figment = Config::figment();
    let port: u16 = figment.extract_inner("port").unwrap_or(4000);

    log::info!("🚀 Evently API starting on port {}", port);
    log::info!("📚 Swagger UI → http://localhost:{}/api/docs", port);

    build(figment).attach(db::init())
}
