//! Event loop: input file → event content → algorithm sequence → summary.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, instrument, warn};

use pfcontent_shared::{
    AppConfig, ClusterId, EventFile, EventInput, PfContentError, Result, validate_config,
};

use crate::algorithm::{Algorithm, AlgorithmRegistry};
use crate::content::{EventContent, ObjectKind};

/// Current list of one object kind after the sequence ran.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentListSummary {
    pub name: String,
    pub size: usize,
}

/// One cluster of the current cluster list.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    pub id: ClusterId,
    pub calo_hits: Vec<u32>,
    pub electromagnetic_energy: f32,
    pub hadronic_energy: f32,
}

/// Result of processing one event.
#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_number: Option<u64>,
    /// Current list per object kind; kinds without a current list are omitted.
    pub current_lists: BTreeMap<String, CurrentListSummary>,
    /// Every cluster list by name, with its size.
    pub cluster_lists: BTreeMap<String, usize>,
    pub clusters: Vec<ClusterSummary>,
    pub elapsed_ms: u128,
}

impl EventSummary {
    fn collect(content: &EventContent, event_number: Option<u64>, started: Instant) -> Result<Self> {
        let mut current_lists = BTreeMap::new();
        for kind in ObjectKind::ALL {
            let Ok(name) = content.current_list_name(kind) else {
                continue;
            };
            let size = match kind {
                ObjectKind::CaloHit => content.current_calo_hit_list()?.len(),
                ObjectKind::Track => content.current_track_list()?.len(),
                ObjectKind::McParticle => content.current_mc_particle_list()?.len(),
                ObjectKind::Cluster => content.current_cluster_list()?.len(),
                ObjectKind::Vertex => content.current_vertex_list()?.len(),
                ObjectKind::Pfo => content.current_pfo_list()?.len(),
            };
            current_lists.insert(
                kind.to_string(),
                CurrentListSummary {
                    name: name.to_string(),
                    size,
                },
            );
        }

        let mut cluster_lists = BTreeMap::new();
        for name in content.list_names(ObjectKind::Cluster) {
            let size = content.cluster_list(&name)?.len();
            cluster_lists.insert(name, size);
        }

        let mut clusters = Vec::new();
        if let Ok(ids) = content.current_cluster_list() {
            for id in ids {
                let cluster = content.cluster(*id)?;
                clusters.push(ClusterSummary {
                    id: *id,
                    calo_hits: cluster.calo_hits().iter().map(|hit| hit.0).collect(),
                    electromagnetic_energy: cluster.electromagnetic_energy(),
                    hadronic_energy: cluster.hadronic_energy(),
                });
            }
        }

        Ok(Self {
            event_number,
            current_lists,
            cluster_lists,
            clusters,
            elapsed_ms: started.elapsed().as_millis(),
        })
    }
}

/// A configured top-level algorithm sequence.
pub struct Pipeline {
    algorithms: Vec<Box<dyn Algorithm>>,
}

impl Pipeline {
    /// Build every configured algorithm and read its settings.
    pub fn from_config(config: &AppConfig, registry: &AlgorithmRegistry) -> Result<Self> {
        validate_config(config)?;
        let algorithms = config
            .algorithms
            .iter()
            .map(|entry| registry.create(entry))
            .collect::<Result<Vec<_>>>()?;

        info!(algorithms = algorithms.len(), "pipeline configured");
        Ok(Self { algorithms })
    }

    /// Build a pipeline from already-configured algorithms.
    pub fn from_algorithms(algorithms: Vec<Box<dyn Algorithm>>) -> Self {
        Self { algorithms }
    }

    /// Type names of the top-level algorithms, in run order.
    pub fn algorithm_names(&self) -> Vec<&'static str> {
        self.algorithms.iter().map(|a| a.type_name()).collect()
    }

    /// Load one event and run every algorithm on it in order.
    ///
    /// The first failing algorithm aborts the event; its error is returned
    /// unchanged.
    #[instrument(skip_all, fields(event = ?input.event_number))]
    pub fn process_event(&mut self, input: &EventInput) -> Result<EventSummary> {
        let started = Instant::now();
        let mut content = EventContent::from_input(input)?;

        for algorithm in &mut self.algorithms {
            if let Err(e) = content.run_algorithm(algorithm.as_mut()) {
                warn!(
                    algorithm = algorithm.type_name(),
                    status = %e.status_code(),
                    "event aborted"
                );
                return Err(e);
            }
        }

        EventSummary::collect(&content, input.event_number, started)
    }
}

/// Read every event from a JSON events file.
pub fn load_events(path: &Path) -> Result<Vec<EventInput>> {
    let content = std::fs::read_to_string(path).map_err(|e| PfContentError::io(path, e))?;
    parse_events(&content)
        .map_err(|e| PfContentError::parse(format!("{}: {e}", path.display())))
}

/// Parse a JSON document holding one event or an array of events.
pub fn parse_events(json: &str) -> Result<Vec<EventInput>> {
    let file: EventFile =
        serde_json::from_str(json).map_err(|e| PfContentError::parse(e.to_string()))?;
    Ok(file.into_events())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::AccessListsAlgorithm;
    use pfcontent_shared::{StatusCode, load_config_from, parse_config};

    fn fixture_pipeline() -> Pipeline {
        let config = load_config_from(Path::new("../../../fixtures/toml/pfcontent.fixture.toml"))
            .expect("load config fixture");
        Pipeline::from_config(&config, &AlgorithmRegistry::new()).expect("pipeline")
    }

    fn fixture_events() -> Vec<EventInput> {
        load_events(Path::new("../../../fixtures/json/events.fixture.json"))
            .expect("load events fixture")
    }

    #[test]
    fn fixture_events_cluster_into_two_groups() {
        let mut pipeline = fixture_pipeline();
        assert_eq!(
            pipeline.algorithm_names(),
            vec!["CreateClusters", "AccessLists"]
        );

        let events = fixture_events();
        let summary = pipeline.process_event(&events[0]).expect("event 1");
        assert_eq!(summary.event_number, Some(1));
        assert_eq!(summary.current_lists["cluster"].name, "SeededClusters");
        assert_eq!(summary.current_lists["cluster"].size, 2);
        assert_eq!(summary.cluster_lists["SeededClusters"], 2);

        let hits: Vec<_> = summary.clusters.iter().map(|c| c.calo_hits.clone()).collect();
        assert_eq!(hits, vec![vec![0, 2, 4], vec![1, 3, 5]]);
        assert!((summary.clusters[0].electromagnetic_energy - 1.4).abs() < 1e-5);

        let summary = pipeline.process_event(&events[1]).expect("event 2");
        assert_eq!(summary.clusters.len(), 2);
        assert_eq!(summary.current_lists["calo hit"].size, 3);
    }

    #[test]
    fn events_are_independent() {
        let mut pipeline = fixture_pipeline();
        let events = fixture_events();
        let first = pipeline.process_event(&events[0]).expect("first pass");
        let again = pipeline.process_event(&events[0]).expect("second pass");
        assert_eq!(first.cluster_lists, again.cluster_lists);
    }

    #[test]
    fn failing_algorithm_aborts_event() {
        let config = parse_config(
            r#"
[[algorithms]]
type = "AccessLists"
[algorithms.settings]
RequestedCaloHitListName = "NotThere"
"#,
        )
        .expect("config");
        let mut pipeline =
            Pipeline::from_config(&config, &AlgorithmRegistry::new()).expect("pipeline");
        let err = pipeline.process_event(&EventInput::default()).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NotFound);
    }

    #[test]
    fn unknown_algorithm_fails_configuration() {
        let config = parse_config("[[algorithms]]\ntype = \"Missing\"\n").expect("config");
        let err = Pipeline::from_config(&config, &AlgorithmRegistry::new())
            .err()
            .expect("unknown type");
        assert_eq!(err.status_code(), StatusCode::NotFound);
    }

    #[test]
    fn pipeline_from_prebuilt_algorithms() {
        let mut pipeline =
            Pipeline::from_algorithms(vec![Box::new(AccessListsAlgorithm::default())]);
        let summary = pipeline.process_event(&EventInput::default()).expect("run");
        assert!(summary.clusters.is_empty());
        assert_eq!(summary.current_lists["cluster"].name, "NullList");
    }

    #[test]
    fn malformed_events_rejected() {
        let err = parse_events("{ \"calo_hits\": 3 }").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::Failure);
        assert!(err.to_string().starts_with("parse error"));
    }
}
