//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use futures::StreamExt;
use tracing::warn;

use waste_catalog::CategoryCatalog;
use waste_classifier::client::{ClassificationClient, HttpClassificationClient};
use waste_classifier::history::{InMemoryBlobStore, InMemoryHistoryStore};
use waste_classifier::{
    ClassificationRecord, ClassificationWorkflow, ClientConfig, FileImageSource, Identity,
    StatsAggregator, StatsSummary, TimeoutClient, WorkflowEvent,
};

/// Build the inference client, wrapped with a deadline when configured.
fn build_client(config: &ClientConfig) -> anyhow::Result<Arc<dyn ClassificationClient>> {
    let client = HttpClassificationClient::new(config.clone())?;
    Ok(match config.timeout() {
        Some(timeout) => Arc::new(TimeoutClient::new(client, timeout)),
        None => Arc::new(client),
    })
}

pub async fn labels(config: &ClientConfig) -> anyhow::Result<()> {
    let labels = build_client(config)?.list_labels().await?;
    println!("Labels: {}", labels.join(", "));
    Ok(())
}

pub async fn health(config: &ClientConfig) -> anyhow::Result<()> {
    let report = HttpClassificationClient::new(config.clone())?.health().await?;
    println!("Status: {}", report.status);
    println!("Model loaded: {}", report.model_loaded);
    if let Some(name) = &report.model_name {
        println!("Model: {}", name);
    }
    if !report.is_healthy() {
        bail!("endpoint is not healthy");
    }
    Ok(())
}

pub async fn classify(
    config: &ClientConfig,
    catalog: CategoryCatalog,
    image: &Path,
    user: Option<String>,
    user_name: Option<String>,
) -> anyhow::Result<()> {
    let client = build_client(config)?;
    let catalog = Arc::new(catalog);

    let identity = user.map(|id| Identity::new(id, user_name.unwrap_or_default()));
    let workflow = match identity {
        Some(_) => ClassificationWorkflow::with_persistence(
            client,
            catalog,
            Arc::new(InMemoryBlobStore::new()),
            Arc::new(InMemoryHistoryStore::new()),
        ),
        None => ClassificationWorkflow::new(client, catalog),
    };

    let source = FileImageSource::new(image);
    let mut events = workflow.capture_and_submit(&source, identity.clone()).await?;

    while let Some(event) = events.next().await {
        match event {
            WorkflowEvent::Started { submission_id } => {
                println!("Uploading {} ({})", image.display(), submission_id);
            }
            WorkflowEvent::Predicted(result) => {
                println!("Label: {}", result.prediction.label());
                println!("Category: {}", result.category.display_name);
                println!("Confidence: {:.2}%", result.prediction.score_percent());
                println!("Inference time: {} ms", result.prediction.inference_time_ms());
                for alt in result.prediction.alternatives() {
                    println!("  candidate {} ({:.2}%)", alt.label, alt.score * 100.0);
                }
                println!("Disposal: {}", result.category.disposal_instructions);
            }
            WorkflowEvent::Persisted { record_id } => {
                println!("Saved as {}", record_id);
            }
            WorkflowEvent::Failed { kind, message } => {
                warn!(%kind, "Submission failed");
                bail!("{}: {}", kind, message);
            }
        }
    }

    if let Some(identity) = &identity {
        print_summary(&workflow.stats(identity).await?);
    }

    Ok(())
}

pub fn stats(records: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(records)
        .with_context(|| format!("reading {}", records.display()))?;
    let records: Vec<ClassificationRecord> =
        serde_json::from_str(&content).context("parsing records")?;

    print_summary(&StatsAggregator::compute(&records));
    Ok(())
}

fn print_summary(summary: &StatsSummary) {
    println!("Total: {}", summary.total);
    for item in &summary.items {
        println!("{:<20} {:>5} {:>6.1}%", item.label, item.count, item.percentage);
    }
}
