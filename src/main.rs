use std::collections::HashMap;

use anyhow::Result;
use clap::Parser;
use log::info;

use odb_telemetry::cli::{Cli, Command};
use odb_telemetry::controllers::odb::SessionController;
use odb_telemetry::{AuthController, Config, OdbController, SqliteManager, UserController};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load_or_create(&cli.config)?;
    let manager = SqliteManager::new(&config.database).await?;

    let result = run(&cli, &config, &manager).await;
    manager.close().await;
    result
}

async fn run(cli: &Cli, config: &Config, manager: &SqliteManager) -> Result<()> {
    match &cli.command {
        Command::AddUser {
            email,
            password,
            first_name,
            last_name,
        } => {
            let mut conn = manager.pool().acquire().await?;
            let user = UserController::create(
                &mut conn,
                email,
                password,
                first_name,
                last_name,
                config.auth.bcrypt_cost,
            )
            .await?;
            println!("Created user {}: {}", user.id, user.to_json());
        }

        Command::Login { email, password } => {
            let mut data = HashMap::new();
            data.insert("email".to_string(), email.clone());
            data.insert("password".to_string(), password.clone());

            let mut conn = manager.pool().acquire().await?;
            let user = AuthController::login(&mut conn, &data).await?;
            println!("Authenticated: {}", user.to_json());
        }

        Command::Live { params } => {
            let data: HashMap<String, String> = params.iter().cloned().collect();
            let mut conn = manager.pool().acquire().await?;
            OdbController::process_sensor_params(&mut conn, &data).await?;
        }

        Command::IngestCsv { email, file } => {
            let mut conn = manager.pool().acquire().await?;
            let user = UserController::find_by_email(&mut conn, email)
                .await?
                .ok_or_else(|| anyhow::anyhow!("no user with email {}", email))?;
            drop(conn);

            let bytes = tokio::fs::read(file).await?;
            let text = String::from_utf8(bytes)
                .map_err(|_| anyhow::anyhow!("{} is not valid UTF-8", file.display()))?;

            info!("Ingesting {} for user {}", file.display(), user.id);
            let outcome = OdbController::process_csv(manager.pool(), &user, &text).await?;
            println!("{:?}", outcome);
        }

        Command::Sessions { email } => {
            let mut conn = manager.pool().acquire().await?;
            let user = UserController::find_by_email(&mut conn, email)
                .await?
                .ok_or_else(|| anyhow::anyhow!("no user with email {}", email))?;

            let sessions = SessionController::for_user(&mut conn, user.id).await?;
            if sessions.is_empty() {
                println!("No sessions recorded for {}", email);
            }
            for session in sessions {
                println!("{}", session.to_json());
            }
        }

        Command::Stats => {
            let stats = manager.stats().await?;
            println!("Users:                {}", stats.total_users);
            println!("Sessions:             {}", stats.total_sessions);
            println!("GPS readings:         {}", stats.gps_readings);
            println!("Engine load readings: {}", stats.engine_load_readings);
            println!("Engine RPM readings:  {}", stats.engine_rpm_readings);
            println!("Speed readings:       {}", stats.speed_readings);
            println!("Fuel level readings:  {}", stats.fuel_level_readings);
            println!("Total readings:       {}", stats.total_readings());
        }
    }

    Ok(())
}
