//! Cluster formation run as a daughter of a list-managing parent.
//!
//! The first `NClustersToMake` available hits of the current calo-hit list
//! each seed a single-hit cluster. Every later available hit joins the
//! closest existing cluster. Clusters land in the current cluster list,
//! normally a temporary list made by the parent, which decides whether to
//! keep them.

use tracing::{debug, instrument};

use pfcontent_shared::{ClusterParameters, PfContentError, Result};

use crate::algorithm::Algorithm;
use crate::content::EventContent;
use crate::helper::find_closest_cluster;
use crate::settings::Settings;

/// Seeds clusters from calo hits and grows them by proximity.
#[derive(Debug)]
pub struct CreateClustersDaughterAlgorithm {
    n_clusters_to_make: usize,
}

impl Default for CreateClustersDaughterAlgorithm {
    fn default() -> Self {
        Self {
            n_clusters_to_make: 1,
        }
    }
}

impl CreateClustersDaughterAlgorithm {
    pub const TYPE_NAME: &'static str = "CreateClustersDaughter";

    pub fn new(n_clusters_to_make: usize) -> Self {
        Self { n_clusters_to_make }
    }

    pub fn n_clusters_to_make(&self) -> usize {
        self.n_clusters_to_make
    }
}

impl Algorithm for CreateClustersDaughterAlgorithm {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn read_settings(&mut self, settings: &Settings<'_>) -> Result<()> {
        if let Some(n) = settings.read_optional::<usize>("NClustersToMake")? {
            if n == 0 {
                return Err(PfContentError::invalid_parameter(
                    "NClustersToMake must be at least 1",
                ));
            }
            self.n_clusters_to_make = n;
        }
        Ok(())
    }

    #[instrument(skip_all, fields(n_clusters_to_make = self.n_clusters_to_make))]
    fn run(&mut self, content: &mut EventContent) -> Result<()> {
        let calo_hits = content.current_calo_hit_list()?.to_vec();

        if !content.current_cluster_list()?.is_empty() {
            return Err(PfContentError::not_allowed(
                "current cluster list must be empty before cluster formation",
            ));
        }

        let mut n_seeded = 0;
        let mut n_added = 0;

        for hit in calo_hits {
            if !content.is_calo_hit_available(hit)? {
                continue;
            }

            let clusters = content.current_cluster_list()?;
            if clusters.len() >= self.n_clusters_to_make {
                let closest = find_closest_cluster(content, hit, clusters, f32::MAX)?;
                content.add_to_cluster(closest, hit)?;
                n_added += 1;
            } else {
                content.create_cluster(ClusterParameters {
                    calo_hits: vec![hit],
                })?;
                n_seeded += 1;
            }
        }

        debug!(n_seeded, n_added, "clusters formed");
        Ok(())
    }
}
