use anyhow::{bail, Context, Result};
use clap::Parser;
use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;

use appcast::config::Config;
use appcast::{
    Appcast, Channel, ChecksumAlgorithm, Fetcher, LocalFile, Provider, Release, Releases,
    RemoteUrl, SortOrder, Source,
};

/// Get the default config file path (~/.config/appcast/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("appcast")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(
    name = "appcast",
    version,
    about = "List releases from Sparkle, SourceForge and GitHub appcast feeds"
)]
struct Args {
    /// Feed URL (http/https) or local file path
    #[arg(value_name = "SOURCE")]
    source: String,

    /// Config file (default: ~/.config/appcast/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Skip detection and treat the feed as this provider
    #[arg(long, value_name = "PROVIDER")]
    provider: Option<Provider>,

    /// Sort order: asc or desc
    #[arg(long, value_name = "ORDER")]
    sort: Option<SortOrder>,

    /// Keep releases whose title matches REGEX
    #[arg(long, value_name = "REGEX")]
    title: Option<Regex>,

    /// Keep releases with a download whose media type matches REGEX
    #[arg(long, value_name = "REGEX")]
    media_type: Option<Regex>,

    /// Keep releases with a download whose URL matches REGEX
    #[arg(long, value_name = "REGEX")]
    url: Option<Regex>,

    /// Invert the --title, --media-type and --url filters
    #[arg(long)]
    invert: bool,

    /// Only list stable releases
    #[arg(long, conflicts_with = "prerelease")]
    stable: bool,

    /// Only list prereleases
    #[arg(long)]
    prerelease: bool,

    /// Uncomment a Sparkle feed before reading it
    #[arg(long)]
    uncomment: bool,

    /// Checksum algorithm: sha256, md5 or sparkle-sha256
    #[arg(long, value_name = "ALGORITHM")]
    checksum: Option<ChecksumAlgorithm>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    provider: Provider,
    location: Option<&'a str>,
    checksum: String,
    channel: Option<&'a Channel>,
    releases: Vec<&'a Release>,
}

async fn load_source<F: Fetcher>(fetcher: &F) -> Result<Source> {
    Source::load(fetcher)
        .await
        .with_context(|| format!("Failed to load appcast from {}", fetcher.location()))
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn apply_filters(releases: &mut Releases, args: &Args, config: &Config) {
    if let Some(pattern) = &args.title {
        releases.filter_by_title(pattern, args.invert);
    }
    if let Some(pattern) = &args.media_type {
        releases.filter_by_media_type(pattern, args.invert);
    }
    if let Some(pattern) = &args.url {
        releases.filter_by_url(pattern, args.invert);
    }

    if args.prerelease {
        releases.filter_by_prerelease(false);
    } else if args.stable || !config.include_prereleases {
        releases.filter_by_prerelease(true);
    }

    releases.sort_by_versions(args.sort.unwrap_or(config.sort));
}

fn print_table(appcast: &Appcast, releases: &Releases) {
    let source = appcast.source();
    println!("Provider: {}", appcast.provider());
    if let Some(location) = source.location() {
        println!("Source:   {}", location);
    }
    println!("Checksum: {}", source.checksum());
    if let Some(channel) = appcast.channel() {
        if !channel.title.is_empty() {
            println!("Channel:  {}", channel.title);
        }
    }
    println!();

    if releases.is_empty() {
        println!("No releases");
        return;
    }

    for release in releases.filtered() {
        let published = release
            .published()
            .map(|p| p.to_utc().format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let url = release
            .primary_download()
            .map(|d| d.url.as_str())
            .unwrap_or("-");
        let marker = if release.is_prerelease() { " (pre)" } else { "" };
        println!(
            "{:<20} {:<10} {}{}  {}",
            release.version_or_build(),
            published,
            release.title(),
            marker,
            url
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging goes to stderr, controlled by RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let mut source = if is_remote(&args.source) {
        let fetcher = RemoteUrl::new(&args.source)
            .with_context(|| format!("Invalid feed URL '{}'", args.source))?
            .with_timeout(config.timeout())
            .with_max_size(config.max_feed_size);
        load_source(&fetcher).await?
    } else {
        let fetcher = LocalFile::new(&args.source).with_max_size(config.max_feed_size);
        load_source(&fetcher).await?
    };

    if let Some(provider) = args.provider {
        source.set_provider(provider);
    }

    if args.uncomment {
        source.uncomment().context("Cannot uncomment this feed")?;
    } else if config.uncomment && source.provider() == Provider::SparkleRss {
        source.uncomment()?;
    }

    source.generate_checksum(args.checksum.unwrap_or(config.checksum));

    let mut appcast = Appcast::new(source);
    if appcast.provider() == Provider::Unknown {
        bail!(
            "Could not detect the feed type of '{}' (use --provider to set it)",
            args.source
        );
    }
    let provider = appcast.provider();
    appcast
        .unmarshal()
        .with_context(|| format!("Failed to read {}", provider))?;

    if let Some(releases) = appcast.releases_mut() {
        apply_filters(releases, &args, &config);
    }

    let Some(releases) = appcast.releases() else {
        bail!("No releases were unmarshalled");
    };

    if args.json {
        let report = Report {
            provider: appcast.provider(),
            location: appcast.source().location(),
            checksum: appcast.source().checksum().to_string(),
            channel: appcast.channel(),
            releases: releases.filtered().collect(),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize releases")?
        );
    } else {
        print_table(&appcast, releases);
    }

    Ok(())
}
