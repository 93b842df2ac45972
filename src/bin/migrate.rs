//! `migrate [status|up|down]`, defaulting to `status`.

use dotenvy::dotenv;
use log::error;

use evently_api::config::Config;
use evently_api::db;
use evently_api::migrations::{Command, MigrationError, Migrator};

async fn run(command: &str) -> Result<(), MigrationError> {
    let command: Command = command.parse()?;
    let config = Config::load()?;
    let database = db::connect(&config).await?;

    match command {
        Command::Status => {
            println!("{:<40} APPLIED", "MIGRATION");
            for (name, applied) in Migrator::status(&database).await? {
                println!("{:<40} {}", name, if applied { "yes" } else { "no" });
            }
        }
        Command::Up => {
            let applied = Migrator::up(&database, &config).await?;
            if applied.is_empty() {
                println!("Nothing to apply.");
            }
            for name in applied {
                println!("Applied: {}", name);
            }
        }
        Command::Down => match Migrator::down(&database, &config).await? {
            Some(name) => println!("Reverted: {}", name),
            None => println!("No migrations applied."),
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let command = std::env::args().nth(1).unwrap_or_else(|| "status".to_string());

    if let Err(e) = run(&command).await {
        error!("{}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
