//! Table formatting utilities for structured output.

use std::time::Duration;

use comfy_table::{
    Attribute, Cell, CellAlignment, Color, Table, modifiers::UTF8_ROUND_CORNERS,
    presets::UTF8_FULL,
};

use crate::error::VectorResult;
use crate::vector::{EngineStats, QuantizedVector, SearchResult};

/// Quantized codes shown before the table elides the rest.
const MAX_QUANTIZED_ROWS: usize = 16;

/// Builder for creating formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    /// Create a new table builder.
    pub fn new() -> Self {
        Self { table: base_table() }
    }

    /// Set the table headers.
    pub fn set_headers(mut self, headers: Vec<&str>) -> Self {
        self.table.set_header(bold_header(headers));
        self
    }

    /// Add a row to the table.
    pub fn add_row(mut self, row: Vec<String>) -> Self {
        self.table.add_row(row);
        self
    }

    /// Build and return the formatted table.
    pub fn build(self) -> String {
        self.table.to_string()
    }
}

fn base_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    // Apply rounded corners
    table.apply_modifier(UTF8_ROUND_CORNERS);
    table
}

fn bold_header(headers: Vec<&str>) -> Vec<Cell> {
    headers
        .into_iter()
        .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
        .collect()
}

fn similarity_color(similarity: f32) -> Color {
    if similarity >= 0.75 {
        Color::Green
    } else if similarity >= 0.4 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Ranked search results, one row per match.
pub fn create_results_table(results: &[SearchResult]) -> String {
    let mut table = base_table();
    table.set_header(bold_header(vec!["Rank", "Document", "Similarity"]));

    for (rank, result) in results.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1).set_alignment(CellAlignment::Right),
            Cell::new(result.id).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.4}", result.similarity))
                .fg(similarity_color(result.similarity))
                .set_alignment(CellAlignment::Right),
        ]);
    }

    if results.is_empty() {
        table.add_row(vec![Cell::new("-"), Cell::new("no matches"), Cell::new("-")]);
    }

    table.to_string()
}

/// One row per query: best match, or the error that query produced.
pub fn create_batch_table(results: &[VectorResult<Vec<SearchResult>>]) -> String {
    let mut table = base_table();
    table.set_header(bold_header(vec!["Query", "Matches", "Best", "Similarity"]));

    for (index, result) in results.iter().enumerate() {
        match result {
            Ok(matches) => {
                let (best, similarity) = match matches.first() {
                    Some(top) => (
                        Cell::new(top.id),
                        Cell::new(format!("{:.4}", top.similarity))
                            .fg(similarity_color(top.similarity)),
                    ),
                    None => (Cell::new("-"), Cell::new("-")),
                };
                table.add_row(vec![
                    Cell::new(index),
                    Cell::new(matches.len()),
                    best,
                    similarity,
                ]);
            }
            Err(e) => {
                table.add_row(vec![
                    Cell::new(index),
                    Cell::new(e.status_code()).fg(Color::Red),
                    Cell::new("-"),
                    Cell::new("-"),
                ]);
            }
        }
    }

    table.to_string()
}

/// Engine size and shape.
pub fn create_stats_table(stats: &EngineStats) -> String {
    TableBuilder::new()
        .set_headers(vec!["Metric", "Value"])
        .add_row(vec!["Documents".into(), stats.document_count.to_string()])
        .add_row(vec!["Unique ids".into(), stats.unique_ids.to_string()])
        .add_row(vec!["Dimension".into(), stats.dimension.to_string()])
        .add_row(vec![
            "Memory estimate".into(),
            format_bytes(stats.memory_estimate_bytes),
        ])
        .add_row(vec![
            "Worker threads".into(),
            stats.worker_threads.to_string(),
        ])
        .build()
}

/// Quantization parameters followed by the leading codes.
pub fn create_quantize_table(source: &[f32], quantized: &QuantizedVector) -> String {
    let mut table = base_table();
    table.set_header(bold_header(vec!["Index", "Value", "Code", "Restored"]));

    let restored = quantized.dequantize();
    for (index, ((value, code), back)) in source
        .iter()
        .zip(quantized.values())
        .zip(&restored)
        .enumerate()
        .take(MAX_QUANTIZED_ROWS)
    {
        table.add_row(vec![
            Cell::new(index),
            Cell::new(format!("{value:.6}")),
            Cell::new(code).set_alignment(CellAlignment::Right),
            Cell::new(format!("{back:.6}")),
        ]);
    }

    if quantized.len() > MAX_QUANTIZED_ROWS {
        table.add_row(vec![
            Cell::new("…"),
            Cell::new(format!("{} more", quantized.len() - MAX_QUANTIZED_ROWS)),
            Cell::new(""),
            Cell::new(""),
        ]);
    }

    table.add_row(vec![
        Cell::new("min").add_attribute(Attribute::Bold),
        Cell::new(format!("{:.6}", quantized.min())),
        Cell::new("scale").add_attribute(Attribute::Bold),
        Cell::new(format!("{:.4}", quantized.scale())),
    ]);

    table.to_string()
}

/// Create a benchmark results table.
pub fn create_benchmark_table(
    documents: usize,
    dimension: usize,
    queries: usize,
    avg_time: Duration,
    threads: usize,
) -> String {
    let mut table = base_table();

    table.set_header(bold_header(vec!["Metric", "Value"]));

    // Add rows without ANSI colors (comfy-table doesn't handle them well)
    table.add_row(vec!["Documents", &documents.to_string()]);
    table.add_row(vec!["Dimension", &dimension.to_string()]);
    table.add_row(vec!["Queries", &queries.to_string()]);
    table.add_row(vec!["Worker threads", &threads.to_string()]);
    table.add_row(vec!["Average query time", &format!("{avg_time:?}")]);

    let rate = if avg_time.as_secs_f64() > 0.0 {
        documents as f64 / avg_time.as_secs_f64()
    } else {
        0.0
    };
    table.add_row(vec!["Scan rate", &format!("{rate:.0} vectors/second")]);

    // Performance indicator with color
    let target_ms = 10.0;
    let avg_ms = avg_time.as_secs_f64() * 1000.0;
    let (performance_text, color) = if avg_ms <= target_ms {
        (format!("✓ {avg_ms:.2}ms within {target_ms}ms target"), Color::Green)
    } else {
        (format!("⚠ {avg_ms:.2}ms over {target_ms}ms target"), Color::Yellow)
    };

    table.add_row(vec![
        Cell::new("Latency"),
        Cell::new(performance_text)
            .fg(color)
            .add_attribute(Attribute::Bold),
    ]);

    table.to_string()
}

fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
