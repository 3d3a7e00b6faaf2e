//! Read-only inspection of every current object list.
//!
//! Calo hits, tracks and MC particles are input objects supplied with the
//! event. Clusters, vertices and pfos are algorithm objects and only exist
//! once some algorithm has made them; their current lists may well be empty.

use tracing::{debug, instrument};

use pfcontent_shared::Result;

use crate::algorithm::Algorithm;
use crate::content::EventContent;
use crate::settings::Settings;

/// Sizes seen by the most recent run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListInspection {
    pub calo_hits: usize,
    /// Hits with positive electromagnetic energy.
    pub electromagnetic_calo_hits: usize,
    pub mc_particles: usize,
    pub tracks: usize,
    pub clusters: usize,
    pub vertices: usize,
    pub pfos: usize,
    /// Size of the requested named calo-hit list, when one was requested.
    pub named_calo_hits: Option<usize>,
}

/// Fetches the current list of each object kind and, optionally, a named
/// calo-hit list. Creates and modifies nothing.
#[derive(Debug, Default)]
pub struct AccessListsAlgorithm {
    requested_calo_hit_list_name: String,
    last_inspection: Option<ListInspection>,
}

impl AccessListsAlgorithm {
    pub const TYPE_NAME: &'static str = "AccessLists";

    pub fn with_requested_list(name: impl Into<String>) -> Self {
        Self {
            requested_calo_hit_list_name: name.into(),
            last_inspection: None,
        }
    }

    pub fn last_inspection(&self) -> Option<&ListInspection> {
        self.last_inspection.as_ref()
    }
}

impl Algorithm for AccessListsAlgorithm {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn read_settings(&mut self, settings: &Settings<'_>) -> Result<()> {
        if let Some(name) = settings.read_optional("RequestedCaloHitListName")? {
            self.requested_calo_hit_list_name = name;
        }
        Ok(())
    }

    #[instrument(skip_all, fields(requested_list = %self.requested_calo_hit_list_name))]
    fn run(&mut self, content: &mut EventContent) -> Result<()> {
        self.last_inspection = None;

        let calo_hits = content.current_calo_hit_list()?;
        let mut electromagnetic_calo_hits = 0;
        for &id in calo_hits {
            if content.calo_hit(id)?.electromagnetic_energy > 0.0 {
                electromagnetic_calo_hits += 1;
            }
        }

        let mut inspection = ListInspection {
            calo_hits: calo_hits.len(),
            electromagnetic_calo_hits,
            mc_particles: content.current_mc_particle_list()?.len(),
            tracks: content.current_track_list()?.len(),
            clusters: content.current_cluster_list()?.len(),
            vertices: content.current_vertex_list()?.len(),
            pfos: content.current_pfo_list()?.len(),
            named_calo_hits: None,
        };

        if !self.requested_calo_hit_list_name.is_empty() {
            let named = content.calo_hit_list(&self.requested_calo_hit_list_name)?;
            inspection.named_calo_hits = Some(named.len());
        }

        debug!(
            calo_hits = inspection.calo_hits,
            electromagnetic_calo_hits = inspection.electromagnetic_calo_hits,
            mc_particles = inspection.mc_particles,
            tracks = inspection.tracks,
            clusters = inspection.clusters,
            vertices = inspection.vertices,
            pfos = inspection.pfos,
            named_calo_hits = ?inspection.named_calo_hits,
            "lists accessed"
        );

        self.last_inspection = Some(inspection);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::AlgorithmRegistry;
    use crate::content::ObjectKind;
    use crate::content::tests::hit_at;
    use pfcontent_shared::{AlgorithmConfig, EventInput, StatusCode};

    fn event() -> EventContent {
        let mut input = EventInput {
            calo_hits: vec![hit_at(0.0, 0.5), hit_at(1.0, 0.0), hit_at(2.0, 1.5)],
            ..Default::default()
        };
        input.calo_hit_lists.insert("EcalBarrel".into(), vec![0, 2]);
        EventContent::from_input(&input).expect("load")
    }

    #[test]
    fn inspects_all_current_lists() {
        let mut content = event();
        let mut algorithm = AccessListsAlgorithm::default();
        content.run_algorithm(&mut algorithm).expect("run");

        let inspection = algorithm.last_inspection().expect("inspection");
        assert_eq!(inspection.calo_hits, 3);
        assert_eq!(inspection.electromagnetic_calo_hits, 2);
        assert_eq!(inspection.clusters, 0);
        assert_eq!(inspection.named_calo_hits, None);
    }

    #[test]
    fn missing_current_list_fails_with_host_code() {
        for kind in ObjectKind::ALL {
            let mut content = event();
            content.drop_current_list(kind);
            let expected = content.current_list_name(kind).unwrap_err();

            let mut algorithm = AccessListsAlgorithm::default();
            let err = content.run_algorithm(&mut algorithm).unwrap_err();
            assert_eq!(err, expected, "dropped {kind} list");
            assert_eq!(err.status_code(), StatusCode::NotInitialized);
            assert!(algorithm.last_inspection().is_none());
        }
    }

    #[test]
    fn reads_requested_named_list() {
        let mut content = event();
        let mut algorithm = AccessListsAlgorithm::with_requested_list("EcalBarrel");
        content.run_algorithm(&mut algorithm).expect("run");
        assert_eq!(
            algorithm.last_inspection().expect("inspection").named_calo_hits,
            Some(2)
        );
    }

    #[test]
    fn missing_named_list_fails() {
        let mut content = event();
        let mut algorithm = AccessListsAlgorithm::with_requested_list("HcalEndcap");
        let err = content.run_algorithm(&mut algorithm).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NotFound);
    }

    #[test]
    fn list_name_setting_is_optional() {
        let registry = AlgorithmRegistry::new();
        let mut algorithm = registry
            .create(&AlgorithmConfig::of_type(AccessListsAlgorithm::TYPE_NAME))
            .expect("create without settings");
        let mut content = event();
        content.run_algorithm(algorithm.as_mut()).expect("run");
    }

    #[test]
    fn list_name_setting_must_be_a_string() {
        let entry: AlgorithmConfig = toml::from_str(
            r#"
type = "AccessLists"
[settings]
RequestedCaloHitListName = 42
"#,
        )
        .expect("parse");
        let err = AlgorithmRegistry::new().create(&entry).err().expect("bad type");
        assert_eq!(err.status_code(), StatusCode::InvalidParameter);
    }
}
