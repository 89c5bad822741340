use anyhow::{Context, Result};
use replaylens::config::{load_config, LensConfig, RunOptions};
use replaylens::engine::LensEngine;
use replaylens::feed::FeedReader;
use replaylens::report::Report;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "replaylens=info".into()),
        )
        .init();

    info!("replaylens starting...");

    let opts = RunOptions::from_env();
    let feed_path = opts
        .feed_path
        .clone()
        .context("REPLAYLENS_FEED is not set")?;

    let mut config = match &opts.config_path {
        Some(path) => load_config(path)?,
        None => LensConfig::default(),
    };
    if let Some(max_matches) = opts.max_matches {
        config.filter.max_matches = max_matches;
    }

    info!(
        feed = %feed_path.display(),
        report = %opts.report_path.display(),
        max_matches = config.filter.max_matches,
        "Configuration loaded"
    );

    let mut engine = LensEngine::new(&config);

    // Print correlations as they are emitted
    let mut correlations = BroadcastStream::new(engine.subscribe());
    let printer = tokio::spawn(async move {
        while let Some(item) = correlations.next().await {
            match item {
                Ok(record) => info!(
                    owner_key = record.owner_key,
                    owner_class = %record.owner_class,
                    usage = record.usage_sequence,
                    timestamp = record.timestamp,
                    reference_time = record.reference_time,
                    kind = %record.kind,
                    "Power treads toggle"
                ),
                Err(e) => warn!(error = %e, "Correlation printer lagged"),
            }
        }
    });

    // Engine is synchronous; keep it off the async workers
    let report = tokio::task::spawn_blocking(move || -> Result<Report> {
        let mut feed = FeedReader::open(&feed_path)?;
        engine.run(&mut feed)?;
        Ok(engine.finish())
    })
    .await
    .context("Engine task panicked")??;

    // Engine dropped with the blocking task, which closes the channel
    printer.await.context("Correlation printer panicked")?;

    for row in &report.histogram {
        info!(class = %row.class, count = row.count, "Entity class");
    }
    for usage in &report.usages {
        info!(
            sequence = usage.sequence,
            timestamp = usage.timestamp,
            attacker = %usage.subject_name,
            target = %usage.target_name,
            inflictor = %usage.inflictor_name,
            health = ?usage.subject_vitals.as_ref().and_then(|v| v.health),
            mana = ?usage.subject_vitals.as_ref().and_then(|v| v.mana),
            "Usage"
        );
    }
    for (handle, class) in &report.handle_lookups {
        info!(handle, class = %class, "Handle lookup");
    }

    report.save_to_file(&opts.report_path)?;
    info!(
        path = %opts.report_path.display(),
        usages = report.usages.len(),
        correlations = report.correlations.len(),
        "Report saved"
    );

    Ok(())
}
