//! The `search` command: one aggregation session driven by the search
//! configuration document plus command-line overrides.

use carscout_core::{AppConfig, Listing, SearchConfig};
use carscout_scraper::{AggregationOutcome, AggregationSession, JsonFileSink, ListingClient};

use crate::SearchArgs;

/// Listings echoed to stdout after a run.
const SUMMARY_ROWS: usize = 10;

/// Folds command-line overrides into the loaded document.
pub(crate) fn apply_overrides(config: &mut SearchConfig, args: &SearchArgs) {
    if let Some(make) = &args.make {
        config.search_config.make.clone_from(make);
    }
    if let Some(model) = &args.model {
        config.search_config.model.clone_from(model);
    }
    if let Some(max_pages) = args.max_pages {
        config.search_config.max_pages = max_pages;
    }
    if let Some(rows) = args.rows {
        config.search_config.rows_per_page = rows;
    }
    if args.no_save {
        config.output_config.save_to_json = false;
    }
    if let Some(output) = &args.output {
        config.output_config.filename = output.display().to_string();
    }
}

/// # Errors
///
/// Returns an error if the paging overrides are zero or the HTTP client
/// cannot be built. Fetch and persist failures are reported in the summary.
pub(crate) async fn run_search(
    app: &AppConfig,
    mut config: SearchConfig,
    args: &SearchArgs,
) -> anyhow::Result<()> {
    apply_overrides(&mut config, args);
    let query = config.to_query()?;
    let client = ListingClient::from_config(app, &config.scraping_config)
        .map_err(|e| anyhow::anyhow!("failed to build listing client: {e}"))?;

    println!(
        "Searching {} {} within {} miles of {} ({}, {})",
        query.make(),
        query.model(),
        query.radius_miles(),
        query.zip_code(),
        config.location_config.city,
        config.location_config.state,
    );

    let session = AggregationSession::new(client, config.scraping_config.delay());
    let outcome = if config.output_config.save_to_json {
        session
            .with_sink(JsonFileSink::new(&config.output_config.filename))
            .run(&query)
            .await
    } else {
        session.run(&query).await
    };

    print_summary(&outcome);
    Ok(())
}

fn print_summary(outcome: &AggregationOutcome) {
    println!(
        "Found {} unique listings across {} page requests (stopped: {:?})",
        outcome.listings.len(),
        outcome.pages_fetched,
        outcome.stop_reason,
    );
    for (i, listing) in outcome.listings.iter().take(SUMMARY_ROWS).enumerate() {
        println!("{:>3}. {}", i + 1, listing.summary_line());
    }
    if outcome.listings.len() > SUMMARY_ROWS {
        println!("     ... and {} more", outcome.listings.len() - SUMMARY_ROWS);
    }
    match (&outcome.persisted_to, &outcome.persist_error) {
        (Some(path), _) => println!("Saved to {path}"),
        (None, Some(error)) => println!("Could not save results: {error}"),
        (None, None) => {}
    }
}

/// Parses a results file written by a previous `search` run.
pub(crate) fn parse_saved_listings(text: &str) -> anyhow::Result<Vec<Listing>> {
    Ok(serde_json::from_str(text)?)
}
