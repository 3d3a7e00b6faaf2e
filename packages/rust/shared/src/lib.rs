//! Shared types, error model, and configuration for pfcontent.
//!
//! This crate is the foundation depended on by all other pfcontent crates.
//! It provides:
//! - [`PfContentError`] and [`StatusCode`]: the unified error type
//! - Domain types ([`CaloHit`], [`Track`], [`McParticle`], [`Cluster`],
//!   [`Vertex`], [`Pfo`]) and the [`EventInput`] file format
//! - Configuration ([`AppConfig`], [`AlgorithmConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AlgorithmConfig, AppConfig, RunConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from, parse_config, validate_config,
};
pub use error::{PfContentError, Result, StatusCode};
pub use types::{
    CURRENT_SCHEMA_VERSION, CaloHit, CaloHitId, CaloHitParameters, CartesianVector, Cluster,
    ClusterId, ClusterParameters, EventFile, EventInput, HitType, McParticle, McParticleId,
    McParticleParameters, Pfo, PfoId, PfoParameters, Track, TrackId, TrackParameters, Vertex,
    VertexId, VertexLabel, VertexParameters,
};
