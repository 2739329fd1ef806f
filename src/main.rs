//! Scorecast entry point

use clap::Parser;
use scorecast::cli::{cmd_predict, cmd_serve, cmd_train, Cli, Commands};
use scorecast::StudentRecord;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scorecast=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { data, artifacts_dir } => {
            cmd_train(&data, &artifacts_dir)?;
        }
        Commands::Predict {
            gender,
            race_ethnicity,
            parental_level_of_education,
            lunch,
            test_preparation_course,
            reading_score,
            writing_score,
            artifacts_dir,
        } => {
            let record = StudentRecord {
                gender,
                race_ethnicity,
                parental_level_of_education,
                lunch,
                test_preparation_course,
                reading_score,
                writing_score,
            };
            cmd_predict(record, &artifacts_dir)?;
        }
        Commands::Serve {
            host,
            port,
            artifacts_dir,
        } => {
            cmd_serve(&host, port, &artifacts_dir).await?;
        }
    }

    Ok(())
}
