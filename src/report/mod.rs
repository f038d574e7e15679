//! Rendering of aggregation results and status reports.

pub mod generator;

pub use generator::{emit, render_csv, render_json, render_sprints, render_status, render_table};
