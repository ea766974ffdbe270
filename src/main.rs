//! Kolosal CV - Main Entry Point
//!
//! Repeated, parallel cross-validation of classifiers from the command line.

use clap::Parser;
use kolosal_cv::cli::{build_config, cmd_grid, cmd_run, Cli, Commands, RunOverrides};
use kolosal_cv::data::DataLoader;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kolosal_cv=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            files,
            model,
            grid_search,
            feature_selection,
            trials,
            splits,
            param_search_splits,
            header,
            answer,
            ignore,
            seed,
            config,
            output_json,
            output_csv,
        } => {
            let config = build_config(
                config.as_ref(),
                RunOverrides {
                    model,
                    grid_search,
                    feature_selection,
                    trials,
                    splits,
                    param_search_splits,
                    seed,
                },
            )?;

            let mut loader = DataLoader::new().with_header(header).with_ignore_columns(ignore);
            if let Some(column) = answer {
                loader = loader.with_answer_column(column);
            }

            cmd_run(&files, &loader, config, output_json.as_ref(), output_csv.as_ref())?;
        }
        Commands::Grid { model, trials } => {
            cmd_grid(&model, trials)?;
        }
    }

    Ok(())
}
