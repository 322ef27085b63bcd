mod bootstrap;
mod report;

use std::sync::Arc;

use anyhow::Result;
use insights_core::coercion::RandomDateSource;
use insights_core::error::InsightsError;
use insights_core::settings::Settings;
use insights_data::tokenizer::{find_export_files, CsvTokenizer};
use insights_runtime::dashboard::Dashboard;
use insights_runtime::pipeline::IngestionPipeline;
use insights_runtime::store::RecordStore;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Field Insights v{} starting", env!("CARGO_PKG_VERSION"));

    let tokenizer = CsvTokenizer::new(&settings.encoding)
        .map_err(|e| InsightsError::Config(e.to_string()))?;
    tracing::info!("Reading exports as {}", tokenizer.encoding_name());

    let files = find_export_files(&settings.paths);
    if files.is_empty() {
        return Err(InsightsError::NoInputFiles.into());
    }

    let pipeline = IngestionPipeline::new(Arc::new(tokenizer), Arc::new(RandomDateSource))
        .sequential(settings.sequential);

    let mut store = RecordStore::new();
    let ingest = pipeline.ingest(files, &mut store).await;

    let mut dashboard = Dashboard::new();
    dashboard.set_location_filter(settings.location.clone());
    if let Some(producer) = &settings.producer {
        dashboard.select_producer(producer.clone());
    }

    let detail = dashboard.producer_detail(&store);
    let view = dashboard.view().clone();
    let snapshot = dashboard.snapshot(&store);

    if settings.json_output() {
        let json = report::render_json(&ingest, &view, snapshot, detail.as_ref())
            .map_err(InsightsError::from)?;
        println!("{json}");
    } else {
        print!("{}", report::render_text(&ingest, snapshot, detail.as_ref()));
    }

    Ok(())
}
