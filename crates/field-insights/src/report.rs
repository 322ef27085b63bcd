use std::fmt::Write;

use insights_data::aggregator::ProducerDetail;
use insights_runtime::dashboard::{DashboardSnapshot, DashboardView};
use insights_runtime::pipeline::IngestReport;
use serde::Serialize;

const TOP_ROWS: usize = 10;

// ── JSON ───────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct JsonReport<'a> {
    ingest: &'a IngestReport,
    view: &'a DashboardView,
    dashboard: &'a DashboardSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    producer_detail: Option<&'a ProducerDetail>,
}

pub fn render_json(
    ingest: &IngestReport,
    view: &DashboardView,
    dashboard: &DashboardSnapshot,
    detail: Option<&ProducerDetail>,
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        ingest,
        view,
        dashboard,
        producer_detail: detail,
    })
}

// ── Text ───────────────────────────────────────────────────────────────────────

/// Plain-text rendering of one ingestion batch and the current view.
pub fn render_text(
    ingest: &IngestReport,
    dashboard: &DashboardSnapshot,
    detail: Option<&ProducerDetail>,
) -> String {
    let mut out = String::new();
    write_ingest(&mut out, ingest);
    match detail {
        Some(detail) => write_detail(&mut out, detail),
        None => write_dashboard(&mut out, dashboard),
    }
    out
}

fn write_ingest(out: &mut String, ingest: &IngestReport) {
    let _ = writeln!(out, "Files");
    for file in &ingest.files {
        let header = file
            .header_row
            .map(|row| format!("header row {}", row + 1))
            .unwrap_or_else(|| "no header".to_string());
        let _ = writeln!(
            out,
            "  {:<32} {:<14} {:<14} {:>5} visits {:>5} items",
            file.file,
            file.kind.to_string(),
            header,
            file.visits,
            file.inventory_items
        );
        if let Some(notice) = &file.notice {
            let _ = writeln!(out, "    ! {}", notice.message);
        }
    }
    let _ = writeln!(out, "  {} visits added", ingest.visits_added);
    if let Some(items) = ingest.inventory_replaced {
        let _ = writeln!(out, "  inventory replaced ({items} items)");
    }
    let _ = writeln!(out);
}

fn write_dashboard(out: &mut String, snapshot: &DashboardSnapshot) {
    let _ = writeln!(
        out,
        "Dashboard ({}, {} visits)",
        snapshot.location_filter, snapshot.visit_count
    );
    let _ = writeln!(out, "  Locations available: {}", snapshot.available_locations.join(", "));

    section(out, "Visits by location");
    for row in snapshot.locations.iter().take(TOP_ROWS) {
        let _ = writeln!(out, "  {:<32} {:>8}", row.location, row.total);
    }

    section(out, "Timeline");
    for row in &snapshot.timeline {
        let _ = writeln!(out, "  {:<12} {:>8}", row.date, row.quantity);
    }

    section(out, "Service mix");
    for row in snapshot.service_mix.iter().take(TOP_ROWS) {
        let _ = writeln!(out, "  {:<32} {:>8}", row.service, row.total);
    }

    section(out, "Producer ranking");
    for row in snapshot.producer_ranking.iter().take(TOP_ROWS) {
        let _ = writeln!(
            out,
            "  {:<32} {:>8} {:>5} visits {:>8.2} h  {}",
            row.producer, row.quantity, row.visits, row.hours, row.last_location
        );
    }

    section(out, "Regional champions");
    for row in &snapshot.regional_champions {
        let _ = writeln!(out, "  {:<24} {:<32} {:>8}", row.location, row.producer, row.quantity);
    }

    if !snapshot.producers_in_region.is_empty() {
        section(out, "Producers in region");
        for row in &snapshot.producers_in_region {
            let _ = writeln!(out, "  {:<32} {:>8}", row.producer, row.total);
        }
    }

    section(out, "Inventory value");
    for row in &snapshot.inventory {
        let _ = writeln!(
            out,
            "  {:<32} {:>8.2} x {:>10.2} = {:>12.2}",
            row.name, row.quantity, row.unit_cost, row.total_value
        );
    }

    section(out, "Genetics doses");
    for row in &snapshot.genetics {
        let _ = writeln!(out, "  {:<32} {:>8}", row.breed, row.dose_count);
    }
}

fn write_detail(out: &mut String, detail: &ProducerDetail) {
    let _ = writeln!(out, "Producer {}", detail.producer);
    let _ = writeln!(
        out,
        "  {} visits, {:.2} h total, {:.2} h average",
        detail.visits, detail.total_hours, detail.average_hours
    );
    let _ = writeln!(out, "  Locations: {}", detail.locations.join(", "));

    section(out, "Services");
    for row in &detail.services {
        let _ = writeln!(out, "  {:<32} {:>5}", row.service, row.visits);
    }

    section(out, "Timeline");
    for row in &detail.timeline {
        let _ = writeln!(out, "  {:<12} {:>8}", row.date, row.quantity);
    }

    section(out, "Diary");
    for visit in &detail.diary {
        let _ = writeln!(
            out,
            "  {}  {:<24} {:<24} {:>5} {:>6.2} h",
            visit.date, visit.location, visit.service_type, visit.quantity, visit.duration_hours
        );
    }
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{title}");
}

// ── Tests ──────────────────────────────────────────────────────────────────────
