use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use base64::Engine;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use shortlink_core::validate::{discard_blank, first_invalid, is_valid_expiration, is_valid_url};
use shortlink_core::{
    bulk_results_file_name, export_file_name, export_to_delimited_text, parse_delimited_import,
    ApiService, LinkCache, LinkEntry, LinkFilter, ShortLink, StatusFilter, Transport,
    IMPORT_TEMPLATE, IMPORT_TEMPLATE_FILE_NAME,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod table;
mod transport;

use transport::UreqTransport;

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum Status {
    /// Every link (default)
    #[default]
    All,
    /// Links without a past expiration
    Active,
    /// Links whose expiration has passed
    Expired,
}

impl From<Status> for StatusFilter {
    fn from(status: Status) -> Self {
        match status {
            Status::All => StatusFilter::All,
            Status::Active => StatusFilter::Active,
            Status::Expired => StatusFilter::Expired,
        }
    }
}

#[derive(Parser)]
#[command(name = "shortlink")]
#[command(about = "Short-link service client", long_about = None)]
struct Cli {
    /// Base URL of the short-link API
    #[arg(long, env = "SHORTLINK_API_URL", default_value = "http://localhost:5000", global = true)]
    api_url: String,

    /// File holding the last fetched link list
    #[arg(long, env = "SHORTLINK_CACHE_FILE", global = true)]
    cache_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shorten one URL
    Shorten {
        /// Absolute http(s) URL
        url: String,
        /// Expiration date (YYYY-MM-DD or RFC 3339)
        #[arg(short, long)]
        expires: Option<String>,
        /// Category label
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Shorten every URL listed in a delimited file
    Bulk {
        /// File with `url,expiresAt,category` rows
        file: PathBuf,
        /// Also save the created links as delimited text
        #[arg(long)]
        export: bool,
        /// Where to save the created links (implies `--export`; defaults to
        /// `shortened-urls-<date>.csv`)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Write a starter file for `bulk`
    Template {
        /// Output path (defaults to `bulk-url-template.csv`)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// List links
    List {
        #[command(flatten)]
        filter: FilterArgs,
        /// Show the cached list without contacting the backend
        #[arg(long)]
        cached: bool,
    },
    /// List the categories in use
    Categories,
    /// Show click analytics for a link
    Analytics {
        /// Short code
        code: String,
    },
    /// Delete a link
    Delete {
        /// Short code
        code: String,
    },
    /// Save the QR code of a link as an SVG file
    Qrcode {
        /// Short code
        code: String,
        /// Output path (defaults to `<code>.svg`)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Set or clear the expiration of a link
    Expire {
        /// Short code
        code: String,
        /// New expiration date
        #[arg(required_unless_present = "clear")]
        date: Option<String>,
        /// Remove the expiration instead
        #[arg(long, conflicts_with = "date")]
        clear: bool,
    },
    /// Export links as delimited text
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        /// Output path (defaults to `urls-export-<date>.csv`)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Check backend health
    Health,
}

#[derive(clap::Args)]
struct FilterArgs {
    /// Only links in this category
    #[arg(long)]
    category: Option<String>,
    /// Only links with this status
    #[arg(long, value_enum, default_value_t = Status::All)]
    status: Status,
}

impl FilterArgs {
    fn to_filter(&self) -> LinkFilter {
        LinkFilter {
            category: self.category.clone(),
            status: self.status.into(),
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let api = ApiService::new(&cli.api_url, UreqTransport::new());
    let mut cache = cli.cache_file.map(LinkCache::load);

    match cli.command {
        Commands::Shorten {
            url,
            expires,
            category,
        } => {
            if !is_valid_url(&url) {
                bail!("Invalid URL: {url}");
            }
            if let Some(date) = &expires {
                if !is_valid_expiration(date, Utc::now().date_naive()) {
                    bail!("Invalid expiration date: {date}");
                }
            }
            let link = api
                .submit_url(&url, expires.as_deref(), category.as_deref())
                .into_result()
                .map_err(|e| anyhow!(e))
                .context("Failed to shorten URL")?;
            println!("{}", link.short_url);
        }

        Commands::Bulk { file, export, out } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let entries = bulk_entries(&text)?;
            let outcome = api
                .submit_bulk(&entries)
                .into_result()
                .map_err(|e| anyhow!(e))
                .context("Bulk shorten failed")?;
            for link in &outcome.successful {
                println!("{}\t{}", link.short_url, link.original_url);
            }
            for failure in &outcome.failed {
                eprintln!("failed\t{}\t{}", failure.original_url, failure.error);
            }
            info!(
                successful = outcome.successful.len(),
                failed = outcome.failed.len(),
                "bulk shorten finished"
            );
            if export || out.is_some() {
                if outcome.successful.is_empty() {
                    bail!("No successful URLs to export");
                }
                let out = out.unwrap_or_else(|| {
                    PathBuf::from(bulk_results_file_name(Utc::now().date_naive()))
                });
                write_file(&out, export_to_delimited_text(&outcome.successful).as_bytes())?;
                println!("{}", out.display());
            }
        }

        Commands::Template { out } => {
            let out = out.unwrap_or_else(|| PathBuf::from(IMPORT_TEMPLATE_FILE_NAME));
            write_file(&out, IMPORT_TEMPLATE.as_bytes())?;
            println!("{}", out.display());
        }

        Commands::List { filter, cached } => {
            let links = if cached {
                cached_links(cache.as_ref(), Utc::now())
            } else {
                refresh_links(&api, cache.as_mut(), Utc::now())?
            };
            let shown = filter.to_filter().apply(&links);
            println!("{}", table::format_links_table(&shown));
        }

        Commands::Categories => {
            for category in api.list_categories() {
                println!("{category}");
            }
        }

        Commands::Analytics { code } => {
            let summary = api
                .fetch_analytics(&code)
                .ok_or_else(|| anyhow!("No analytics for {code}"))?;
            println!("{}", table::format_analytics(&summary));
        }

        Commands::Delete { code } => {
            if !api.delete_url(&code) {
                bail!("Failed to delete {code}");
            }
            if let Some(cache) = cache.as_mut() {
                if cache.remove(&code) {
                    cache.save().context("Failed to save cache")?;
                }
            }
            println!("Deleted {code}");
        }

        Commands::Qrcode { code, out } => {
            let qr = api
                .fetch_qr_code(&code)
                .into_result()
                .map_err(|e| anyhow!(e))
                .context("Failed to fetch QR code")?;
            let bytes = decode_data_url(&qr.qr_code)?;
            let out = out.unwrap_or_else(|| PathBuf::from(format!("{code}.svg")));
            write_file(&out, &bytes)?;
            println!("{}", out.display());
        }

        Commands::Expire { code, date, clear } => {
            let date = if clear { None } else { date };
            if let Some(date) = &date {
                if !is_valid_expiration(date, Utc::now().date_naive()) {
                    bail!("Invalid expiration date: {date}");
                }
            }
            api.update_expiration(&code, date.as_deref())
                .into_result()
                .map_err(|e| anyhow!(e))
                .context("Failed to update expiration")?;
            match date {
                Some(date) => println!("{code} expires {date}"),
                None => println!("{code} no longer expires"),
            }
        }

        Commands::Export { filter, out } => {
            let links = refresh_links(&api, cache.as_mut(), Utc::now())?;
            let text = export_selection(&links, &filter.to_filter())?;
            let out = out.unwrap_or_else(|| PathBuf::from(export_file_name(Utc::now().date_naive())));
            write_file(&out, text.as_bytes())?;
            println!("{}", out.display());
        }

        Commands::Health => {
            let health = api.check_health();
            println!("{}", serde_json::to_string_pretty(&health)?);
            if health.status != "OK" {
                bail!("Backend is unhealthy");
            }
        }
    }

    Ok(())
}

fn cached_links(cache: Option<&LinkCache>, now: DateTime<Utc>) -> Vec<ShortLink> {
    match cache {
        Some(cache) => cache.links_at(now),
        None => {
            warn!("no cache file configured");
            Vec::new()
        }
    }
}

/// Fetch the link list. Only a successful fetch replaces the cache; a failed
/// one falls back to the cached list.
fn refresh_links<T: Transport>(
    api: &ApiService<T>,
    cache: Option<&mut LinkCache>,
    now: DateTime<Utc>,
) -> Result<Vec<ShortLink>> {
    match (api.try_list_urls(), cache) {
        (Ok(links), Some(cache)) => {
            cache.replace(links, now);
            cache.save().context("Failed to save cache")?;
            Ok(cache.links().to_vec())
        }
        (Ok(mut links), None) => {
            for link in &mut links {
                link.mark_expired(now);
            }
            Ok(links)
        }
        (Err(error), Some(cache)) => {
            warn!(path = %cache.path().display(), %error, "fetch failed, using cached links");
            Ok(cache.links_at(now))
        }
        (Err(error), None) => Err(anyhow!(error.user_message())).context("Failed to fetch links"),
    }
}

/// Entries of a bulk import file, rejected as a whole when it has no URLs or
/// any entry is invalid.
fn bulk_entries(text: &str) -> Result<Vec<LinkEntry>> {
    let entries = discard_blank(parse_delimited_import(text));
    if entries.is_empty() {
        bail!("No valid URLs found in the file");
    }
    if let Some((entry, reason)) = first_invalid(&entries) {
        bail!("{reason}: {}", entry.original_url);
    }
    Ok(entries)
}

fn export_selection(links: &[ShortLink], filter: &LinkFilter) -> Result<String> {
    let selected: Vec<ShortLink> = filter.apply(links).into_iter().cloned().collect();
    if selected.is_empty() {
        bail!("No URLs to export");
    }
    Ok(export_to_delimited_text(&selected))
}

/// Decode a `data:<mime>;base64,<payload>` URL into raw bytes.
fn decode_data_url(data_url: &str) -> Result<Vec<u8>> {
    let (meta, payload) = data_url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| anyhow!("QR code is not a data URL"))?;
    if !meta.ends_with(";base64") {
        bail!("QR code data URL is not base64 encoded");
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .context("QR code payload is not valid base64")
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}
