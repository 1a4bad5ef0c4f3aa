//! jobwatch entry point.
//!
//! One-shot: load configuration, prepare and seed the site registry, run a
//! single monitoring pass and exit. Logging goes to stderr as JSON lines;
//! stdout is reserved for `--list-sites` output.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use jobwatch_client::{Capturer, FetchClient, FetchConfig, PageScraper, TelegramConfig, TelegramNotifier};
use jobwatch_core::{AppConfig, SiteDb};
use tracing_subscriber::EnvFilter;

mod pipeline;

use pipeline::Monitor;

/// Watch job-listing pages and report changes to Telegram.
#[derive(Debug, Parser)]
#[command(name = "jobwatch", version)]
struct Cli {
    /// TOML configuration file (takes precedence over JOBWATCH_CONFIG_FILE).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the site registry and exit without monitoring.
    #[arg(long)]
    list_sites: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    if cli.list_sites {
        return list_sites(cli.config).await;
    }

    let config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    run(&config).await
}

async fn run(config: &AppConfig) -> Result<()> {
    let db = SiteDb::open(config.db_path()?).await.context("opening site registry")?;
    let inserted = db.seed(&config.sites).await.context("seeding site registry")?;
    tracing::info!(inserted, path = %db.path().display(), "site registry ready");

    let scraper = PageScraper::new(FetchClient::new(FetchConfig::from(config))?);
    let notifier = TelegramNotifier::new(TelegramConfig::try_from(config)?)?;
    let capturer = capturer(config);

    let monitor = Monitor::new(db, &scraper, capturer.as_ref(), &notifier, config.screenshot_dir.clone());
    let result = monitor.run().await;
    capturer.shutdown().await;

    result.context("monitoring run failed")?;
    Ok(())
}

/// Print every registered site. Needs only the database settings, so the
/// Telegram credentials are not validated here.
async fn list_sites(config_file: Option<PathBuf>) -> Result<()> {
    let config: AppConfig = AppConfig::figment(config_file.as_deref())
        .extract()
        .context("loading configuration")?;
    let db = SiteDb::open(config.db_path()?).await.context("opening site registry")?;
    write_sites(&db, &mut std::io::stdout().lock()).await
}

/// One tab-separated row per site, then a total line.
async fn write_sites(db: &SiteDb, out: &mut impl Write) -> Result<()> {
    for site in db.list_sites().await? {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            site.url,
            site.kind,
            site.last_content_hash.as_ref().map(|f| f.as_str()).unwrap_or("-"),
            site.hash_updated_at.as_deref().unwrap_or("-"),
        )?;
    }
    writeln!(out, "{} site(s)", db.count_sites().await?)?;
    Ok(())
}

#[cfg(feature = "render")]
fn capturer(config: &AppConfig) -> Box<dyn Capturer> {
    Box::new(jobwatch_client::HeadlessCapturer::new(jobwatch_client::CaptureOptions::from(config)))
}

#[cfg(not(feature = "render"))]
fn capturer(_config: &AppConfig) -> Box<dyn Capturer> {
    struct Disabled;

    #[async_trait::async_trait]
    impl Capturer for Disabled {
        async fn capture(
            &self, _url: &str, _destination: &std::path::Path, _selector: Option<&str>,
        ) -> Result<(), jobwatch_client::RenderError> {
            Err(jobwatch_client::RenderError::BrowserLaunch("built without the render feature".into()))
        }
    }

    Box::new(Disabled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobwatch_core::{SiteKind, SiteSeed};

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from(["jobwatch", "--list-sites", "--config", "jobwatch.toml"]).unwrap();
        assert!(cli.list_sites);
        assert_eq!(cli.config, Some(PathBuf::from("jobwatch.toml")));

        let cli = Cli::try_parse_from(["jobwatch"]).unwrap();
        assert!(!cli.list_sites);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_rejects_unknown_flag() {
        assert!(Cli::try_parse_from(["jobwatch", "--watch"]).is_err());
    }

    #[tokio::test]
    async fn test_write_sites_prints_rows_and_total() {
        let dir = tempfile::tempdir().unwrap();
        let db = SiteDb::open(dir.path().join("jobs.db")).await.unwrap();
        let seeds = vec![
            SiteSeed::new("https://a.example/jobs", SiteKind::Occupop),
            SiteSeed::new("https://b.example/jobs", SiteKind::Rezoomo),
        ];
        db.seed(&seeds).await.unwrap();

        let mut out = Vec::new();
        write_sites(&db, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("https://a.example/jobs\t"));
        assert!(lines[0].ends_with("\t-\t-"));
        assert!(lines[1].starts_with("https://b.example/jobs\t"));
        assert_eq!(lines[2], "2 site(s)");
    }

    #[tokio::test]
    async fn test_write_sites_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let db = SiteDb::open(dir.path().join("jobs.db")).await.unwrap();

        let mut out = Vec::new();
        write_sites(&db, &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0 site(s)\n");
    }
}
