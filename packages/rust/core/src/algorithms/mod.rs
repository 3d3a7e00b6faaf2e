//! Built-in algorithms.
//!
//! - [`AccessListsAlgorithm`]: read-only pass over every current list
//! - [`CreateClustersAlgorithm`]: parent that runs a clustering daughter and
//!   saves its output
//! - [`CreateClustersDaughterAlgorithm`]: seeds clusters and grows them with
//!   the closest available hits

mod access_lists;
mod create_clusters;
mod create_clusters_daughter;

pub use access_lists::{AccessListsAlgorithm, ListInspection};
pub use create_clusters::CreateClustersAlgorithm;
pub use create_clusters_daughter::CreateClustersDaughterAlgorithm;
