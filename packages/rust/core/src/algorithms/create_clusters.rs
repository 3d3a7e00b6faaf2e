//! Parent algorithm owning the list bookkeeping around cluster formation.
//!
//! The daughter only creates clusters. This algorithm gives it a temporary
//! cluster list to fill, then saves whatever it produced under
//! `OutputClusterListName` and, unless told otherwise, makes that list
//! current for the algorithms that follow.

use tracing::{debug, info, instrument};

use pfcontent_shared::{PfContentError, Result};

use crate::algorithm::Algorithm;
use crate::content::EventContent;
use crate::settings::Settings;

/// Runs a cluster-formation daughter and keeps its clusters.
#[derive(Default)]
pub struct CreateClustersAlgorithm {
    daughter: Option<Box<dyn Algorithm>>,
    output_cluster_list_name: String,
    replace_current_cluster_list: bool,
}

impl CreateClustersAlgorithm {
    pub const TYPE_NAME: &'static str = "CreateClusters";

    /// Daughter role looked up in the settings.
    pub const CLUSTER_FORMATION: &'static str = "ClusterFormation";

    pub fn new(
        daughter: Box<dyn Algorithm>,
        output_cluster_list_name: impl Into<String>,
        replace_current_cluster_list: bool,
    ) -> Self {
        Self {
            daughter: Some(daughter),
            output_cluster_list_name: output_cluster_list_name.into(),
            replace_current_cluster_list,
        }
    }
}

impl Algorithm for CreateClustersAlgorithm {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn read_settings(&mut self, settings: &Settings<'_>) -> Result<()> {
        self.daughter = Some(settings.create_daughter(Self::CLUSTER_FORMATION)?);
        self.output_cluster_list_name = settings.read_value("OutputClusterListName")?;
        if self.output_cluster_list_name.is_empty() {
            return Err(PfContentError::invalid_parameter(
                "OutputClusterListName must not be empty",
            ));
        }
        self.replace_current_cluster_list = settings
            .read_optional("ReplaceCurrentClusterList")?
            .unwrap_or(true);
        Ok(())
    }

    #[instrument(skip_all, fields(output_list = %self.output_cluster_list_name))]
    fn run(&mut self, content: &mut EventContent) -> Result<()> {
        let daughter = self
            .daughter
            .as_mut()
            .ok_or_else(|| PfContentError::not_initialized("cluster formation daughter"))?;

        let temporary = content.create_temporary_cluster_list()?;
        content.run_algorithm(daughter.as_mut())?;

        let n_clusters = content.current_cluster_list()?.len();
        if n_clusters == 0 {
            debug!("daughter made no clusters, nothing to save");
            return Ok(());
        }

        content.save_cluster_list(&temporary, &self.output_cluster_list_name)?;
        if self.replace_current_cluster_list {
            content.replace_current_cluster_list(&self.output_cluster_list_name)?;
        }

        info!(
            n_clusters,
            replaced_current = self.replace_current_cluster_list,
            "clusters saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::AlgorithmRegistry;
    use crate::algorithms::CreateClustersDaughterAlgorithm;
    use crate::content::tests::content_with_hits;
    use crate::content::{NULL_LIST_NAME, ObjectKind};
    use pfcontent_shared::{AlgorithmConfig, CaloHitId, ClusterParameters, StatusCode};

    /// Creates one cluster from the first hit, then fails.
    struct FailingAfterClustering;

    impl Algorithm for FailingAfterClustering {
        fn type_name(&self) -> &'static str {
            "FailingAfterClustering"
        }

        fn read_settings(&mut self, _settings: &Settings<'_>) -> Result<()> {
            Ok(())
        }

        fn run(&mut self, content: &mut EventContent) -> Result<()> {
            content.create_cluster(ClusterParameters {
                calo_hits: vec![CaloHitId(0)],
            })?;
            Err(PfContentError::failure("boom"))
        }
    }

    fn parent(n: usize, replace: bool) -> CreateClustersAlgorithm {
        CreateClustersAlgorithm::new(
            Box::new(CreateClustersDaughterAlgorithm::new(n)),
            "SeededClusters",
            replace,
        )
    }

    #[test]
    fn saves_and_replaces_current_list() {
        let mut content = content_with_hits(&[0.0, 50.0, 1.0, 51.0]);
        let mut algorithm = parent(2, true);
        content.run_algorithm(&mut algorithm).expect("run");

        assert_eq!(
            content.current_list_name(ObjectKind::Cluster).expect("name"),
            "SeededClusters"
        );
        let clusters = content.current_cluster_list().expect("clusters");
        assert_eq!(clusters.len(), 2);
        for hit in 0..4 {
            assert!(!content.is_calo_hit_available(CaloHitId(hit)).expect("flag"));
        }
        // Only the saved list and the null list remain.
        assert_eq!(
            content.list_names(ObjectKind::Cluster),
            vec![NULL_LIST_NAME.to_string(), "SeededClusters".to_string()]
        );
    }

    #[test]
    fn saved_list_without_replacing_current() {
        let mut content = content_with_hits(&[0.0, 50.0]);
        let mut algorithm = parent(1, false);
        content.run_algorithm(&mut algorithm).expect("run");

        assert_eq!(
            content.current_list_name(ObjectKind::Cluster).expect("name"),
            NULL_LIST_NAME
        );
        assert_eq!(content.cluster_list("SeededClusters").expect("saved").len(), 1);
    }

    #[test]
    fn no_hits_no_list() {
        let mut content = content_with_hits(&[]);
        let mut algorithm = parent(1, true);
        content.run_algorithm(&mut algorithm).expect("run");
        assert!(content.cluster_list("SeededClusters").is_err());
        assert!(content.current_cluster_list().expect("current").is_empty());
    }

    #[test]
    fn second_run_clusters_nothing_new() {
        let mut content = content_with_hits(&[0.0, 50.0]);
        let mut algorithm = parent(1, true);
        content.run_algorithm(&mut algorithm).expect("first run");
        // Every hit is already clustered, so the fresh temporary list stays empty.
        content.run_algorithm(&mut algorithm).expect("second run");
        assert_eq!(content.current_cluster_list().expect("clusters").len(), 1);
    }

    #[test]
    fn daughter_failure_propagates_and_cleans_up() {
        let mut content = content_with_hits(&[0.0]);
        content.drop_current_list(ObjectKind::CaloHit);
        let mut algorithm = parent(1, true);
        let err = content.run_algorithm(&mut algorithm).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NotInitialized);
        assert_eq!(content.list_names(ObjectKind::Cluster), vec![NULL_LIST_NAME]);
    }

    #[test]
    fn daughter_failure_after_clustering_releases_hits() {
        let mut content = content_with_hits(&[0.0, 1.0]);
        let mut algorithm =
            CreateClustersAlgorithm::new(Box::new(FailingAfterClustering), "SeededClusters", true);
        let err = content.run_algorithm(&mut algorithm).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::Failure);
        assert_eq!(err.to_string(), "failure: boom");

        assert!(content.is_calo_hit_available(CaloHitId(0)).expect("flag"));
        assert!(content.cluster_list("SeededClusters").is_err());
        assert_eq!(content.list_names(ObjectKind::Cluster), vec![NULL_LIST_NAME]);
    }

    #[test]
    fn null_list_is_not_an_output_list() {
        let mut content = content_with_hits(&[0.0, 1.0]);
        let mut algorithm = CreateClustersAlgorithm::new(
            Box::new(CreateClustersDaughterAlgorithm::new(1)),
            NULL_LIST_NAME,
            false,
        );
        let err = content.run_algorithm(&mut algorithm).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NotAllowed);

        assert!(content.cluster_list(NULL_LIST_NAME).expect("null list").is_empty());
        assert!(content.current_cluster_list().expect("current").is_empty());
        assert!(content.is_calo_hit_available(CaloHitId(0)).expect("flag"));
        assert!(content.is_calo_hit_available(CaloHitId(1)).expect("flag"));
    }

    #[test]
    fn unconfigured_parent_not_initialized() {
        let mut content = content_with_hits(&[0.0]);
        let mut algorithm = CreateClustersAlgorithm::default();
        let err = content.run_algorithm(&mut algorithm).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NotInitialized);
    }

    #[test]
    fn built_from_settings() {
        let entry: AlgorithmConfig = toml::from_str(
            r#"
type = "CreateClusters"
[settings]
OutputClusterListName = "Mine"
[[daughters]]
type = "CreateClustersDaughter"
description = "ClusterFormation"
[daughters.settings]
NClustersToMake = 2
"#,
        )
        .expect("parse");
        let mut algorithm = AlgorithmRegistry::new().create(&entry).expect("create");

        let mut content = content_with_hits(&[0.0, 50.0, 1.0]);
        content.run_algorithm(algorithm.as_mut()).expect("run");
        assert_eq!(
            content.current_list_name(ObjectKind::Cluster).expect("name"),
            "Mine"
        );
        assert_eq!(content.current_cluster_list().expect("clusters").len(), 2);
    }

    #[test]
    fn output_list_name_is_mandatory() {
        let entry: AlgorithmConfig = toml::from_str(
            r#"
type = "CreateClusters"
[[daughters]]
type = "CreateClustersDaughter"
"#,
        )
        .expect("parse");
        let err = AlgorithmRegistry::new().create(&entry).err().expect("missing name");
        assert_eq!(err.status_code(), StatusCode::NotFound);
    }
}
