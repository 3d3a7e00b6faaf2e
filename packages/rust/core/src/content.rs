//! In-memory content host for one event.
//!
//! [`EventContent`] owns every object of an event and the named lists that
//! group them. Algorithms never hold objects directly: they ask the host for
//! lists of ids, check availability, and create or extend algorithm objects
//! through the calls below, each of which reports failure as a
//! [`PfContentError`] carrying the host status code.
//!
//! Running an algorithm through [`EventContent::run_algorithm`] opens an
//! algorithm scope. When the scope closes:
//! - temporary lists created inside it are deleted along with any objects
//!   still in them (clustered hits become available again);
//! - every kind's current list reverts to the one current when the scope
//!   opened, unless a `replace_current_*` call moved it on.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, instrument, trace, warn};

use pfcontent_shared::{
    CaloHit, CaloHitId, Cluster, ClusterId, ClusterParameters, EventInput, McParticle,
    McParticleId, PfContentError, Pfo, PfoId, PfoParameters, Result, Track, TrackId, Vertex,
    VertexId, VertexParameters,
};

use crate::algorithm::Algorithm;
use crate::lists::ListManager;

/// Name of the list holding every input object of a kind.
pub const INPUT_LIST_NAME: &str = "Input";

/// Name of the empty list current for algorithm objects before any is chosen.
pub const NULL_LIST_NAME: &str = "NullList";

/// Kinds of object managed by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectKind {
    CaloHit,
    Track,
    McParticle,
    Cluster,
    Vertex,
    Pfo,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 6] = [
        Self::CaloHit,
        Self::Track,
        Self::McParticle,
        Self::Cluster,
        Self::Vertex,
        Self::Pfo,
    ];
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CaloHit => "calo hit",
            Self::Track => "track",
            Self::McParticle => "MC particle",
            Self::Cluster => "cluster",
            Self::Vertex => "vertex",
            Self::Pfo => "pfo",
        };
        f.write_str(s)
    }
}

/// Current list name of every kind, recorded when a scope opens.
type CurrentListNames = BTreeMap<ObjectKind, Option<String>>;

/// Bookkeeping for one running algorithm.
#[derive(Debug)]
struct AlgorithmScope {
    algorithm: String,
    entry_lists: CurrentListNames,
    temporary_lists: Vec<(ObjectKind, String)>,
}

/// Objects and lists of one event.
#[derive(Debug)]
pub struct EventContent {
    calo_hits: Vec<CaloHit>,
    calo_hit_available: Vec<bool>,
    calo_hit_lists: ListManager<CaloHitId>,

    tracks: Vec<Track>,
    track_available: Vec<bool>,
    track_lists: ListManager<TrackId>,

    mc_particles: Vec<McParticle>,
    mc_particle_lists: ListManager<McParticleId>,

    clusters: BTreeMap<ClusterId, Cluster>,
    unavailable_clusters: BTreeSet<ClusterId>,
    next_cluster_id: u32,
    cluster_lists: ListManager<ClusterId>,

    vertices: BTreeMap<VertexId, Vertex>,
    next_vertex_id: u32,
    vertex_lists: ListManager<VertexId>,

    pfos: BTreeMap<PfoId, Pfo>,
    next_pfo_id: u32,
    pfo_lists: ListManager<PfoId>,

    scopes: Vec<AlgorithmScope>,
    temporary_list_counter: u32,
}

impl Default for EventContent {
    fn default() -> Self {
        Self::new()
    }
}

impl EventContent {
    /// An event with no objects: empty `Input` lists for input kinds and
    /// empty `NullList` lists for algorithm-object kinds, all current.
    pub fn new() -> Self {
        Self {
            calo_hits: Vec::new(),
            calo_hit_available: Vec::new(),
            calo_hit_lists: ListManager::new(ObjectKind::CaloHit, INPUT_LIST_NAME),
            tracks: Vec::new(),
            track_available: Vec::new(),
            track_lists: ListManager::new(ObjectKind::Track, INPUT_LIST_NAME),
            mc_particles: Vec::new(),
            mc_particle_lists: ListManager::new(ObjectKind::McParticle, INPUT_LIST_NAME),
            clusters: BTreeMap::new(),
            unavailable_clusters: BTreeSet::new(),
            next_cluster_id: 0,
            cluster_lists: ListManager::new(ObjectKind::Cluster, NULL_LIST_NAME),
            vertices: BTreeMap::new(),
            next_vertex_id: 0,
            vertex_lists: ListManager::new(ObjectKind::Vertex, NULL_LIST_NAME),
            pfos: BTreeMap::new(),
            next_pfo_id: 0,
            pfo_lists: ListManager::new(ObjectKind::Pfo, NULL_LIST_NAME),
            scopes: Vec::new(),
            temporary_list_counter: 0,
        }
    }

    /// Load the input objects of one event.
    ///
    /// Hit-to-MC links and the extra named calo-hit lists refer to objects by
    /// index and are checked here.
    #[instrument(skip_all, fields(event = ?input.event_number))]
    pub fn from_input(input: &EventInput) -> Result<Self> {
        let mut content = Self::new();

        for (i, params) in input.mc_particles.iter().enumerate() {
            let id = McParticleId(index_to_id(i)?);
            content
                .mc_particles
                .push(McParticle::new(id, params.clone()));
            content.mc_particle_lists.add_to_current(id)?;
        }

        for (i, params) in input.calo_hits.iter().enumerate() {
            if let Some(mc) = params
                .mc_particle
                .filter(|mc| *mc as usize >= input.mc_particles.len())
            {
                return Err(PfContentError::parse(format!(
                    "calo hit {i} refers to MC particle {mc}, event has {}",
                    input.mc_particles.len()
                )));
            }
            let id = CaloHitId(index_to_id(i)?);
            content.calo_hits.push(CaloHit::new(id, params.clone()));
            content.calo_hit_available.push(true);
            content.calo_hit_lists.add_to_current(id)?;
        }

        for (i, params) in input.tracks.iter().enumerate() {
            let id = TrackId(index_to_id(i)?);
            content.tracks.push(Track::new(id, params.clone()));
            content.track_available.push(true);
            content.track_lists.add_to_current(id)?;
        }

        for (name, indices) in &input.calo_hit_lists {
            let mut ids = Vec::with_capacity(indices.len());
            for &index in indices {
                if index as usize >= content.calo_hits.len() {
                    return Err(PfContentError::parse(format!(
                        "calo hit list '{name}' refers to hit {index}, event has {}",
                        content.calo_hits.len()
                    )));
                }
                ids.push(CaloHitId(index));
            }
            content.calo_hit_lists.insert_list(name, ids)?;
        }

        debug!(
            calo_hits = content.calo_hits.len(),
            tracks = content.tracks.len(),
            mc_particles = content.mc_particles.len(),
            named_calo_hit_lists = input.calo_hit_lists.len(),
            "event content loaded"
        );

        Ok(content)
    }

    // -----------------------------------------------------------------------
    // Algorithm scopes
    // -----------------------------------------------------------------------

    /// Run an algorithm inside its own scope.
    ///
    /// Parent algorithms call this to run their daughters. The scope is
    /// closed whether or not the algorithm succeeds; its error is returned
    /// unchanged.
    #[instrument(skip_all, fields(algorithm = algorithm.type_name(), depth = self.scopes.len()))]
    pub fn run_algorithm(&mut self, algorithm: &mut dyn Algorithm) -> Result<()> {
        self.enter_algorithm(algorithm.type_name());
        let result = algorithm.run(self);
        self.exit_algorithm();

        match &result {
            Ok(()) => debug!("algorithm finished"),
            Err(e) => warn!(error = %e, status = %e.status_code(), "algorithm failed"),
        }
        result
    }

    pub(crate) fn enter_algorithm(&mut self, name: &str) {
        let entry_lists = self.current_list_names();
        self.scopes.push(AlgorithmScope {
            algorithm: name.to_string(),
            entry_lists,
            temporary_lists: Vec::new(),
        });
    }

    pub(crate) fn exit_algorithm(&mut self) {
        let Some(scope) = self.scopes.pop() else {
            return;
        };

        for (kind, name) in &scope.temporary_lists {
            self.delete_temporary_list(*kind, name);
        }

        for (kind, name) in scope.entry_lists {
            match kind {
                ObjectKind::CaloHit => self.calo_hit_lists.set_current(name),
                ObjectKind::Track => self.track_lists.set_current(name),
                ObjectKind::McParticle => self.mc_particle_lists.set_current(name),
                ObjectKind::Cluster => self.cluster_lists.set_current(name),
                ObjectKind::Vertex => self.vertex_lists.set_current(name),
                ObjectKind::Pfo => self.pfo_lists.set_current(name),
            }
        }

        trace!(algorithm = %scope.algorithm, "algorithm scope closed");
    }

    fn current_list_names(&self) -> CurrentListNames {
        ObjectKind::ALL
            .iter()
            .map(|kind| (*kind, self.current_name(*kind).map(String::from)))
            .collect()
    }

    fn current_name(&self, kind: ObjectKind) -> Option<&str> {
        match kind {
            ObjectKind::CaloHit => self.calo_hit_lists.current_name(),
            ObjectKind::Track => self.track_lists.current_name(),
            ObjectKind::McParticle => self.mc_particle_lists.current_name(),
            ObjectKind::Cluster => self.cluster_lists.current_name(),
            ObjectKind::Vertex => self.vertex_lists.current_name(),
            ObjectKind::Pfo => self.pfo_lists.current_name(),
        }
    }

    /// Name of the current list of `kind`.
    pub fn current_list_name(&self, kind: ObjectKind) -> Result<&str> {
        self.current_name(kind)
            .ok_or_else(|| PfContentError::not_initialized(format!("current {kind} list")))
    }

    /// Names of every list of `kind`, in name order.
    pub fn list_names(&self, kind: ObjectKind) -> Vec<String> {
        let names: Vec<&str> = match kind {
            ObjectKind::CaloHit => self.calo_hit_lists.list_names().collect(),
            ObjectKind::Track => self.track_lists.list_names().collect(),
            ObjectKind::McParticle => self.mc_particle_lists.list_names().collect(),
            ObjectKind::Cluster => self.cluster_lists.list_names().collect(),
            ObjectKind::Vertex => self.vertex_lists.list_names().collect(),
            ObjectKind::Pfo => self.pfo_lists.list_names().collect(),
        };
        names.into_iter().map(String::from).collect()
    }

    /// Unset the current list of `kind`; later current-list fetches fail
    /// with `NotInitialized` until another list is made current.
    pub fn drop_current_list(&mut self, kind: ObjectKind) {
        match kind {
            ObjectKind::CaloHit => self.calo_hit_lists.drop_current(),
            ObjectKind::Track => self.track_lists.drop_current(),
            ObjectKind::McParticle => self.mc_particle_lists.drop_current(),
            ObjectKind::Cluster => self.cluster_lists.drop_current(),
            ObjectKind::Vertex => self.vertex_lists.drop_current(),
            ObjectKind::Pfo => self.pfo_lists.drop_current(),
        }
    }

    fn next_temporary_list_name(&mut self) -> Result<String> {
        let scope = self.scopes.last().ok_or_else(|| {
            PfContentError::not_allowed("temporary lists can only be created by a running algorithm")
        })?;
        self.temporary_list_counter += 1;
        Ok(format!(
            "{}_{}_{}",
            scope.algorithm,
            self.scopes.len(),
            self.temporary_list_counter
        ))
    }

    fn register_temporary_list(&mut self, kind: ObjectKind, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.temporary_lists.push((kind, name.to_string()));
        }
    }

    /// Point every open scope's recorded entry list for `kind` at `name`, so
    /// the replacement survives the scopes closing.
    fn promote_current_list(&mut self, kind: ObjectKind, name: &str) {
        for scope in &mut self.scopes {
            scope.entry_lists.insert(kind, Some(name.to_string()));
        }
    }

    fn delete_temporary_list(&mut self, kind: ObjectKind, name: &str) {
        match kind {
            ObjectKind::Cluster => {
                for id in self.cluster_lists.delete_temporary(name) {
                    self.delete_cluster(id);
                }
            }
            ObjectKind::Vertex => {
                for id in self.vertex_lists.delete_temporary(name) {
                    self.vertices.remove(&id);
                    self.vertex_lists.remove_id(id);
                }
            }
            ObjectKind::Pfo => {
                for id in self.pfo_lists.delete_temporary(name) {
                    self.delete_pfo(id);
                }
            }
            ObjectKind::CaloHit | ObjectKind::Track | ObjectKind::McParticle => {}
        }
    }

    // -----------------------------------------------------------------------
    // Calo hits
    // -----------------------------------------------------------------------

    pub fn current_calo_hit_list(&self) -> Result<&[CaloHitId]> {
        self.calo_hit_lists.current_list()
    }

    pub fn calo_hit_list(&self, name: &str) -> Result<&[CaloHitId]> {
        self.calo_hit_lists.list(name)
    }

    pub fn calo_hit(&self, id: CaloHitId) -> Result<&CaloHit> {
        self.calo_hits
            .get(id.index())
            .ok_or_else(|| PfContentError::not_found(id.to_string()))
    }

    /// Whether the hit has not yet been placed in a cluster.
    pub fn is_calo_hit_available(&self, id: CaloHitId) -> Result<bool> {
        self.calo_hit_available
            .get(id.index())
            .copied()
            .ok_or_else(|| PfContentError::not_found(id.to_string()))
    }

    /// Save a subset of calo hits under a list name, appending if it exists.
    pub fn save_calo_hit_list(&mut self, name: &str, ids: &[CaloHitId]) -> Result<()> {
        for id in ids {
            self.calo_hit(*id)?;
        }
        self.calo_hit_lists.save_ids(name, ids)
    }

    pub fn replace_current_calo_hit_list(&mut self, name: &str) -> Result<()> {
        self.calo_hit_lists.replace_current(name)?;
        self.promote_current_list(ObjectKind::CaloHit, name);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Tracks and MC particles
    // -----------------------------------------------------------------------

    pub fn current_track_list(&self) -> Result<&[TrackId]> {
        self.track_lists.current_list()
    }

    pub fn track_list(&self, name: &str) -> Result<&[TrackId]> {
        self.track_lists.list(name)
    }

    pub fn track(&self, id: TrackId) -> Result<&Track> {
        self.tracks
            .get(id.index())
            .ok_or_else(|| PfContentError::not_found(id.to_string()))
    }

    /// Whether the track has not yet been used by a pfo.
    pub fn is_track_available(&self, id: TrackId) -> Result<bool> {
        self.track_available
            .get(id.index())
            .copied()
            .ok_or_else(|| PfContentError::not_found(id.to_string()))
    }

    pub fn current_mc_particle_list(&self) -> Result<&[McParticleId]> {
        self.mc_particle_lists.current_list()
    }

    pub fn mc_particle_list(&self, name: &str) -> Result<&[McParticleId]> {
        self.mc_particle_lists.list(name)
    }

    pub fn mc_particle(&self, id: McParticleId) -> Result<&McParticle> {
        self.mc_particles
            .get(id.index())
            .ok_or_else(|| PfContentError::not_found(id.to_string()))
    }

    // -----------------------------------------------------------------------
    // Clusters
    // -----------------------------------------------------------------------

    pub fn current_cluster_list(&self) -> Result<&[ClusterId]> {
        self.cluster_lists.current_list()
    }

    pub fn cluster_list(&self, name: &str) -> Result<&[ClusterId]> {
        self.cluster_lists.list(name)
    }

    pub fn cluster(&self, id: ClusterId) -> Result<&Cluster> {
        self.clusters
            .get(&id)
            .ok_or_else(|| PfContentError::not_found(id.to_string()))
    }

    /// Whether the cluster has not yet been used by a pfo.
    pub fn is_cluster_available(&self, id: ClusterId) -> Result<bool> {
        self.cluster(id)?;
        Ok(!self.unavailable_clusters.contains(&id))
    }

    /// Create a temporary cluster list owned by the running algorithm and
    /// make it current. Returns its name.
    pub fn create_temporary_cluster_list(&mut self) -> Result<String> {
        let name = self.next_temporary_list_name()?;
        self.cluster_lists.create_temporary(&name)?;
        self.register_temporary_list(ObjectKind::Cluster, &name);
        debug!(list = %name, "temporary cluster list created");
        Ok(name)
    }

    /// Move the clusters of the temporary list `source` into the saved list
    /// `target`, leaving `source` empty. Saving into `NullList` or into
    /// another temporary list is `NotAllowed`.
    pub fn save_cluster_list(&mut self, source: &str, target: &str) -> Result<()> {
        self.cluster_lists.save(source, target)?;
        debug!(source, target, "cluster list saved");
        Ok(())
    }

    pub fn replace_current_cluster_list(&mut self, name: &str) -> Result<()> {
        self.cluster_lists.replace_current(name)?;
        self.promote_current_list(ObjectKind::Cluster, name);
        Ok(())
    }

    /// Create a cluster from available hits in the current (temporary)
    /// cluster list. The hits become unavailable.
    pub fn create_cluster(&mut self, params: ClusterParameters) -> Result<ClusterId> {
        if params.calo_hits.is_empty() {
            return Err(PfContentError::invalid_parameter(
                "a cluster needs at least one calo hit",
            ));
        }

        let list = self.cluster_lists.current_list_name()?;
        if !self.cluster_lists.is_temporary(list) {
            return Err(PfContentError::not_allowed(format!(
                "clusters can only be created in a temporary list, current list is '{list}'"
            )));
        }

        for (i, hit) in params.calo_hits.iter().enumerate() {
            if !self.is_calo_hit_available(*hit)? || params.calo_hits[..i].contains(hit) {
                return Err(PfContentError::not_allowed(format!("{hit} is not available")));
            }
        }

        let id = ClusterId(self.next_cluster_id);
        self.next_cluster_id += 1;

        let mut cluster = Cluster::new(id);
        for hit in &params.calo_hits {
            cluster.add_calo_hit(&self.calo_hits[hit.index()]);
            self.calo_hit_available[hit.index()] = false;
        }
        self.clusters.insert(id, cluster);
        self.cluster_lists.add_to_current(id)?;

        trace!(cluster = %id, hits = params.calo_hits.len(), "cluster created");
        Ok(id)
    }

    /// Add an available hit to an existing cluster.
    pub fn add_to_cluster(&mut self, cluster: ClusterId, hit: CaloHitId) -> Result<()> {
        if !self.is_calo_hit_available(hit)? {
            return Err(PfContentError::not_allowed(format!("{hit} is not available")));
        }
        let target = self
            .clusters
            .get_mut(&cluster)
            .ok_or_else(|| PfContentError::not_found(cluster.to_string()))?;

        target.add_calo_hit(&self.calo_hits[hit.index()]);
        self.calo_hit_available[hit.index()] = false;
        trace!(%cluster, %hit, "hit added to cluster");
        Ok(())
    }

    fn delete_cluster(&mut self, id: ClusterId) {
        if let Some(cluster) = self.clusters.remove(&id) {
            for hit in cluster.calo_hits() {
                if let Some(flag) = self.calo_hit_available.get_mut(hit.index()) {
                    *flag = true;
                }
            }
        }
        self.unavailable_clusters.remove(&id);
        self.cluster_lists.remove_id(id);
    }

    // -----------------------------------------------------------------------
    // Vertices
    // -----------------------------------------------------------------------

    pub fn current_vertex_list(&self) -> Result<&[VertexId]> {
        self.vertex_lists.current_list()
    }

    pub fn vertex_list(&self, name: &str) -> Result<&[VertexId]> {
        self.vertex_lists.list(name)
    }

    pub fn vertex(&self, id: VertexId) -> Result<&Vertex> {
        self.vertices
            .get(&id)
            .ok_or_else(|| PfContentError::not_found(id.to_string()))
    }

    pub fn create_temporary_vertex_list(&mut self) -> Result<String> {
        let name = self.next_temporary_list_name()?;
        self.vertex_lists.create_temporary(&name)?;
        self.register_temporary_list(ObjectKind::Vertex, &name);
        Ok(name)
    }

    /// Move the vertices of a temporary list into a saved list.
    pub fn save_vertex_list(&mut self, source: &str, target: &str) -> Result<()> {
        self.vertex_lists.save(source, target)
    }

    pub fn replace_current_vertex_list(&mut self, name: &str) -> Result<()> {
        self.vertex_lists.replace_current(name)?;
        self.promote_current_list(ObjectKind::Vertex, name);
        Ok(())
    }

    /// Create a vertex in the current (temporary) vertex list.
    pub fn create_vertex(&mut self, params: VertexParameters) -> Result<VertexId> {
        let list = self.vertex_lists.current_list_name()?;
        if !self.vertex_lists.is_temporary(list) {
            return Err(PfContentError::not_allowed(format!(
                "vertices can only be created in a temporary list, current list is '{list}'"
            )));
        }

        let id = VertexId(self.next_vertex_id);
        self.next_vertex_id += 1;
        self.vertices.insert(
            id,
            Vertex {
                id,
                position: params.position,
                label: params.label,
            },
        );
        self.vertex_lists.add_to_current(id)?;
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Pfos
    // -----------------------------------------------------------------------

    pub fn current_pfo_list(&self) -> Result<&[PfoId]> {
        self.pfo_lists.current_list()
    }

    pub fn pfo_list(&self, name: &str) -> Result<&[PfoId]> {
        self.pfo_lists.list(name)
    }

    pub fn pfo(&self, id: PfoId) -> Result<&Pfo> {
        self.pfos
            .get(&id)
            .ok_or_else(|| PfContentError::not_found(id.to_string()))
    }

    pub fn create_temporary_pfo_list(&mut self) -> Result<String> {
        let name = self.next_temporary_list_name()?;
        self.pfo_lists.create_temporary(&name)?;
        self.register_temporary_list(ObjectKind::Pfo, &name);
        Ok(name)
    }

    /// Move the pfos of a temporary list into a saved list.
    pub fn save_pfo_list(&mut self, source: &str, target: &str) -> Result<()> {
        self.pfo_lists.save(source, target)
    }

    pub fn replace_current_pfo_list(&mut self, name: &str) -> Result<()> {
        self.pfo_lists.replace_current(name)?;
        self.promote_current_list(ObjectKind::Pfo, name);
        Ok(())
    }

    /// Create a pfo in the current (temporary) pfo list. Its clusters and
    /// tracks must be available and become unavailable.
    pub fn create_pfo(&mut self, params: PfoParameters) -> Result<PfoId> {
        let list = self.pfo_lists.current_list_name()?;
        if !self.pfo_lists.is_temporary(list) {
            return Err(PfContentError::not_allowed(format!(
                "pfos can only be created in a temporary list, current list is '{list}'"
            )));
        }

        for cluster in &params.clusters {
            if !self.is_cluster_available(*cluster)? {
                return Err(PfContentError::not_allowed(format!(
                    "{cluster} is not available"
                )));
            }
        }
        for track in &params.tracks {
            if !self.is_track_available(*track)? {
                return Err(PfContentError::not_allowed(format!("{track} is not available")));
            }
        }
        for vertex in &params.vertices {
            self.vertex(*vertex)?;
        }

        let id = PfoId(self.next_pfo_id);
        self.next_pfo_id += 1;

        for cluster in &params.clusters {
            self.unavailable_clusters.insert(*cluster);
        }
        for track in &params.tracks {
            self.track_available[track.index()] = false;
        }
        self.pfos.insert(id, Pfo::new(id, params));
        self.pfo_lists.add_to_current(id)?;
        Ok(id)
    }

    fn delete_pfo(&mut self, id: PfoId) {
        if let Some(pfo) = self.pfos.remove(&id) {
            for cluster in &pfo.clusters {
                self.unavailable_clusters.remove(cluster);
            }
            for track in &pfo.tracks {
                if let Some(flag) = self.track_available.get_mut(track.index()) {
                    *flag = true;
                }
            }
        }
        self.pfo_lists.remove_id(id);
    }
}

fn index_to_id(index: usize) -> Result<u32> {
    u32::try_from(index)
        .map_err(|_| PfContentError::parse(format!("object index {index} exceeds id range")))
}
