//! Terminal table rendering for CLI output.

pub mod tables;

pub use tables::{
    TableBuilder, create_batch_table, create_benchmark_table, create_quantize_table,
    create_results_table, create_stats_table,
};
