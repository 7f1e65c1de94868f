//! The `reports` command: history-report links for saved listings.

use std::path::Path;

use carscout_core::{AppConfig, SearchConfig};
use carscout_scraper::ReportLinkScraper;

use crate::search::parse_saved_listings;
use crate::ReportsArgs;

pub(crate) async fn run_reports(
    app: &AppConfig,
    config: &SearchConfig,
    args: &ReportsArgs,
) -> anyhow::Result<()> {
    let input = args
        .input
        .clone()
        .unwrap_or_else(|| config.output_config.filename.clone().into());
    let text = tokio::fs::read_to_string(&input)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", input.display()))?;
    let listings = parse_saved_listings(&text)?;

    let scraper = ReportLinkScraper::new(config.scraping_config.timeout_seconds, &app.user_agent)
        .map_err(|e| anyhow::anyhow!("failed to build report scraper: {e}"))?;
    let links = scraper
        .enrich_reports(&listings, args.limit, config.scraping_config.delay())
        .await;

    write_links(&args.output, &links).await?;
    println!(
        "Found {} report links in the first {} listings; saved to {}",
        links.len(),
        args.limit.min(listings.len()),
        args.output.display()
    );
    for link in &links {
        println!("  {}  {}", link.vin, link.report_url);
    }
    Ok(())
}

async fn write_links(path: &Path, links: &[carscout_scraper::ReportLink]) -> anyhow::Result<()> {
    let body = serde_json::to_vec_pretty(links)?;
    tokio::fs::write(path, body)
        .await
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))
}
