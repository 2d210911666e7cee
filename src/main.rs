use clap::Parser;
use db_walkthrough::{
    cli::{Cli, lesson_listing},
    config::{seed::load_seed, settings::load_app_configuration},
    errors::Result,
    lessons::{self, LessonContext},
};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables can also be set externally
    dotenv().ok();

    let cli = Cli::parse();
    if cli.list {
        println!("{}", lesson_listing());
        return Ok(());
    }

    // 3. Settings: file, then environment, then flags
    let config = load_app_configuration(cli.config.as_deref())
        .map(|config| cli.apply(config))
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    info!(url = %config.database_url, "Configuration loaded");

    // 4. Seed rows for the example tables
    let seed = load_seed(config.seed_path.as_deref())
        .inspect_err(|e| error!("Failed to load seed data: {}", e))?;

    // 5. Run the requested lessons
    let ctx = LessonContext::new(config, seed);
    for lesson in cli.lessons() {
        lessons::run(lesson, &ctx).await?;
    }
    Ok(())
}
