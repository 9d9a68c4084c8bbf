use anyhow::{Context, Result};
use blockscope_core::detail::BlockDetail;
use blockscope_core::overlay::{OverlayRefresher, RefreshTrigger, StaticLayout};
use blockscope_core::report::{ReportFormat, generate_report, save_report};
use blockscope_core::{EngineConfig, Session};
use blockscope_fetch::{ResourceNames, collect_resource_names};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use scraper::Html;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Load resource URLs, one per line. Blank lines and `#` comments are skipped.
pub fn load_resource_urls_from_file(path: &PathBuf) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read resources file {}: {}", path.display(), e))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_resource_line)
        .collect())
}

/// Accept absolute URLs and root-relative paths; anything else is skipped.
pub fn parse_resource_line(line: &str) -> Option<String> {
    if Url::parse(line).is_ok() || line.starts_with('/') {
        return Some(line.to_string());
    }

    eprintln!("⚠️  Skipping invalid resource URL '{}'", line);
    None
}

/// Engine configuration from `--config`, or the defaults.
pub fn load_config(path: Option<&String>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let expanded = shellexpand::tilde(path);
    debug!("Loading engine config from {}", expanded);
    Ok(EngineConfig::load(Path::new(expanded.as_ref()))?)
}

fn read_live_snapshot(path: &Path) -> Result<String> {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).to_string();
    fs::read_to_string(&expanded).with_context(|| format!("Failed to read live DOM {}", expanded))
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message.to_string());
    spinner
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Everything the subcommands share: a session with its SSR documents
/// loaded, the live snapshot and the resource names.
async fn prepare_session(sub_matches: &ArgMatches) -> Result<(Session, String, ResourceNames)> {
    let url = sub_matches
        .get_one::<Url>("url")
        .context("--url is required")?;
    let live_path = sub_matches
        .get_one::<PathBuf>("live")
        .context("--live is required")?;
    let config = load_config(sub_matches.get_one::<String>("config"))?;

    let live_html = read_live_snapshot(live_path)?;
    let resource_urls = match sub_matches.get_one::<PathBuf>("resources") {
        Some(path) => load_resource_urls_from_file(path).map_err(anyhow::Error::msg)?,
        None => Vec::new(),
    };

    let mut session = Session::new(url.as_str(), config)?;
    let progress = spinner(&format!("Fetching server-rendered markup for {}", url));
    let document_count = session.load_documents().await?.len();
    progress.finish_and_clear();
    println!(
        "{} {} server-rendered document(s) loaded",
        "✓".green().bold(),
        document_count
    );

    let names = collect_resource_names(
        &resource_urls,
        &Html::parse_document(&live_html),
        session.page_url(),
    );
    info!(
        "{} block name(s) and {} icon name(s) from {} resource URL(s)",
        names.block_names.len(),
        names.icon_names.len(),
        resource_urls.len()
    );
    Ok((session, live_html, names))
}

pub async fn handle_analyze(sub_matches: &ArgMatches) -> Result<()> {
    init_logging();

    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);
    let output = sub_matches.get_one::<PathBuf>("output");

    let (mut session, live_html, names) = prepare_session(sub_matches).await?;
    let result = session.run_analysis(&live_html, &names).await?;
    let report = generate_report(result, format)?;

    match output {
        Some(path) => {
            save_report(&report, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!(
                "{} Report saved to {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => print!("{}", report),
    }

    session.dispose();
    Ok(())
}

pub async fn handle_detail(sub_matches: &ArgMatches) -> Result<()> {
    init_logging();

    let id = sub_matches
        .get_one::<String>("id")
        .context("--id is required")?;

    let (mut session, live_html, names) = prepare_session(sub_matches).await?;
    session.run_analysis(&live_html, &names).await?;
    let detail = session.block_detail(id)?;
    print!("{}", format_detail(&detail));

    session.dispose();
    Ok(())
}

pub fn format_detail(detail: &BlockDetail) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", detail.id.cyan().bold(), detail.name.bold()));
    out.push_str(&format!(
        "  Source: {}\n\n",
        detail.source_document_url.as_deref().unwrap_or("-")
    ));

    out.push_str(&format!("{}\n{}\n\n", "## Live markup".bright_blue().bold(), detail.live_markup));
    match &detail.ssr_markup {
        Some(markup) => {
            out.push_str(&format!("{}\n{}\n\n", "## Server-rendered markup".bright_blue().bold(), markup))
        }
        None => out.push_str(&format!("{}\n", "No server-rendered counterpart".yellow())),
    }

    if !detail.assets.is_empty() {
        out.push_str(&format!("{}\n", "## Assets".bright_blue().bold()));
        for asset in &detail.assets {
            out.push_str(&format!("  {}\n", asset));
        }
    }
    out
}

pub async fn handle_overlay(sub_matches: &ArgMatches) -> Result<()> {
    init_logging();

    let layout_path = sub_matches
        .get_one::<PathBuf>("layout")
        .context("--layout is required")?;
    let layout_json = fs::read_to_string(layout_path)
        .with_context(|| format!("Failed to read layout {}", layout_path.display()))?;
    let layout = StaticLayout::from_json(&layout_json).context("Invalid layout capture")?;

    let (mut session, live_html, names) = prepare_session(sub_matches).await?;
    let probe_timeout = session.config().probe_timeout();
    let result = session.run_analysis(&live_html, &names).await?;

    let mut refresher = OverlayRefresher::new(probe_timeout);
    let frame = refresher
        .handle(RefreshTrigger::AnalysisComplete, result, &layout)
        .await;
    println!("{}", serde_json::to_string_pretty(frame)?);

    session.dispose();
    Ok(())
}
