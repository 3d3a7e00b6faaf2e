//! Content host, algorithm framework, and built-in algorithms for pfcontent.
//!
//! This crate provides:
//! - [`EventContent`]: in-memory host owning one event's objects and lists
//! - [`Algorithm`], [`AlgorithmRegistry`], [`Settings`]: the plugin contract
//!   and how configured algorithms are built
//! - [`algorithms`]: the built-in list-access and clustering algorithms
//! - [`Pipeline`]: runs a configured algorithm sequence over events

pub mod algorithm;
pub mod algorithms;
pub mod content;
pub mod helper;
mod lists;
pub mod pipeline;
pub mod settings;

pub use algorithm::{Algorithm, AlgorithmFactory, AlgorithmRegistry};
pub use content::{EventContent, INPUT_LIST_NAME, NULL_LIST_NAME, ObjectKind};
pub use pipeline::{EventSummary, Pipeline, load_events, parse_events};
pub use settings::Settings;
