use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use serde::Serialize;
use trendscope_common::observability::{LogConfig, init_logging};
use trendscope_config::{TrendscopeConfig, TrendscopeConfigLoader, default_config_path};
use trendscope_session::{RegionOptions, TrendsSession};
mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // An explicit file must exist; the default location is optional.
    let loader = TrendscopeConfigLoader::new();
    let loader = match (&cli.config, default_config_path()) {
        (Some(path), _) => loader.with_file(path),
        (None, Some(path)) => loader.with_optional_file(path),
        (None, None) => loader,
    };
    let cfg: TrendscopeConfig = loader.load().context("failed to load configuration")?;

    let log_path = init_logging(LogConfig {
        app_name: "trendscope",
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cli.verbose || cfg.logging.stderr,
        format: cfg.logging.format,
        default_filter: cfg
            .logging
            .filter
            .clone()
            .unwrap_or_else(|| "info".to_string()),
    })?;
    tracing::debug!(log_path = %log_path.display(), "app.logging.ready");

    let query = cli.query.resolve(cfg.query.as_ref())?;
    let session = TrendsSession::connect(query, &cfg.client)
        .await
        .context("failed to open trends session")?;

    match cli.command {
        Command::InterestOverTime => print_json(&session.interest_over_time().await?),
        Command::Historical {
            start,
            end,
            hour_start,
            hour_end,
        } => print_json(
            &session
                .historical_hourly_interest_between(&start, &end, hour_start, hour_end)
                .await?,
        ),
        Command::ByRegion {
            resolution,
            low_volume,
            no_geo_code,
        } => {
            let options = RegionOptions {
                include_low_volume: low_volume,
                include_geo_code: !no_geo_code,
            };
            print_json(&session.interest_by_region(resolution, options).await?)
        }
        Command::RelatedTopics => print_json(&session.related_topics().await?),
        Command::RelatedQueries { category_override } => {
            print_json(&session.related_queries(category_override).await?)
        }
        Command::Trending { country } => print_json(&session.trending_searches(&country).await?),
        Command::TopCharts { year } => print_json(&session.top_charts(year).await?),
        Command::Suggestions => print_json(&session.suggestions().await?),
        Command::Categories => print_json(&session.categories().await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to encode result")?;
    println!("{out}");
    Ok(())
}
