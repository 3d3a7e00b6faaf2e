//! Core domain types for particle-flow event content.
//!
//! Objects are owned by the content host and referenced by algorithms through
//! the copyable id newtypes defined here. Input objects (calo hits, tracks,
//! MC particles) are read from an [`EventInput`]; algorithm objects
//! (clusters, vertices, pfos) are created while algorithms run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Current schema version for the event input format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

macro_rules! object_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Position of the object in the host's store.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

object_id!(
    /// Identifier of a calorimeter hit.
    CaloHitId,
    "hit#"
);
object_id!(
    /// Identifier of a track.
    TrackId,
    "track#"
);
object_id!(
    /// Identifier of a Monte Carlo particle.
    McParticleId,
    "mc#"
);
object_id!(
    /// Identifier of a cluster.
    ClusterId,
    "cluster#"
);
object_id!(
    /// Identifier of a vertex.
    VertexId,
    "vertex#"
);
object_id!(
    /// Identifier of a particle-flow object.
    PfoId,
    "pfo#"
);

// ---------------------------------------------------------------------------
// CartesianVector
// ---------------------------------------------------------------------------

/// A position or momentum in detector coordinates (mm, GeV).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CartesianVector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl CartesianVector {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn magnitude(&self) -> f32 {
        self.magnitude_squared().sqrt()
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &CartesianVector) -> f32 {
        CartesianVector::new(self.x - other.x, self.y - other.y, self.z - other.z).magnitude()
    }
}

// ---------------------------------------------------------------------------
// Input objects
// ---------------------------------------------------------------------------

/// Calorimeter region a hit was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitType {
    #[default]
    Ecal,
    Hcal,
    Muon,
    Other,
}

/// Parameters describing a calorimeter hit, as supplied by the event input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaloHitParameters {
    pub position: CartesianVector,
    /// Energy as reported by the detector readout.
    #[serde(default)]
    pub input_energy: f32,
    #[serde(default)]
    pub electromagnetic_energy: f32,
    #[serde(default)]
    pub hadronic_energy: f32,
    #[serde(default)]
    pub time: f32,
    #[serde(default)]
    pub pseudo_layer: u32,
    #[serde(default)]
    pub hit_type: HitType,
    /// Index into the event's MC particles of the main contributor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mc_particle: Option<u32>,
}

/// An immutable calorimeter energy deposit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaloHit {
    pub id: CaloHitId,
    pub position: CartesianVector,
    pub input_energy: f32,
    pub electromagnetic_energy: f32,
    pub hadronic_energy: f32,
    pub time: f32,
    pub pseudo_layer: u32,
    pub hit_type: HitType,
    pub mc_particle: Option<McParticleId>,
}

impl CaloHit {
    pub fn new(id: CaloHitId, params: CaloHitParameters) -> Self {
        Self {
            id,
            position: params.position,
            input_energy: params.input_energy,
            electromagnetic_energy: params.electromagnetic_energy,
            hadronic_energy: params.hadronic_energy,
            time: params.time,
            pseudo_layer: params.pseudo_layer,
            hit_type: params.hit_type,
            mc_particle: params.mc_particle.map(McParticleId),
        }
    }
}

/// Parameters describing a reconstructed track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackParameters {
    pub momentum_at_dca: CartesianVector,
    #[serde(default)]
    pub charge: i32,
    #[serde(default)]
    pub mass: f32,
    #[serde(default)]
    pub d0: f32,
    #[serde(default)]
    pub z0: f32,
}

/// A reconstructed charged-particle track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub id: TrackId,
    pub momentum_at_dca: CartesianVector,
    pub charge: i32,
    pub mass: f32,
    pub d0: f32,
    pub z0: f32,
}

impl Track {
    pub fn new(id: TrackId, params: TrackParameters) -> Self {
        Self {
            id,
            momentum_at_dca: params.momentum_at_dca,
            charge: params.charge,
            mass: params.mass,
            d0: params.d0,
            z0: params.z0,
        }
    }
}

/// Parameters describing a Monte Carlo truth particle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McParticleParameters {
    pub pdg_code: i32,
    pub energy: f32,
    #[serde(default)]
    pub momentum: CartesianVector,
    #[serde(default)]
    pub vertex: CartesianVector,
    #[serde(default)]
    pub endpoint: CartesianVector,
}

/// A Monte Carlo truth particle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct McParticle {
    pub id: McParticleId,
    pub pdg_code: i32,
    pub energy: f32,
    pub momentum: CartesianVector,
    pub vertex: CartesianVector,
    pub endpoint: CartesianVector,
}

impl McParticle {
    pub fn new(id: McParticleId, params: McParticleParameters) -> Self {
        Self {
            id,
            pdg_code: params.pdg_code,
            energy: params.energy,
            momentum: params.momentum,
            vertex: params.vertex,
            endpoint: params.endpoint,
        }
    }
}

// ---------------------------------------------------------------------------
// Algorithm objects
// ---------------------------------------------------------------------------

/// Parameters for creating a cluster: the hits it starts with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterParameters {
    pub calo_hits: Vec<CaloHitId>,
}

/// A mutable container of calorimeter hits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub id: ClusterId,
    calo_hits: Vec<CaloHitId>,
    electromagnetic_energy: f32,
    hadronic_energy: f32,
}

impl Cluster {
    /// An empty cluster; the host adds the seed hits straight after.
    pub fn new(id: ClusterId) -> Self {
        Self {
            id,
            calo_hits: Vec::new(),
            electromagnetic_energy: 0.0,
            hadronic_energy: 0.0,
        }
    }

    /// Append a hit and update the energy sums.
    pub fn add_calo_hit(&mut self, hit: &CaloHit) {
        self.calo_hits.push(hit.id);
        self.electromagnetic_energy += hit.electromagnetic_energy;
        self.hadronic_energy += hit.hadronic_energy;
    }

    pub fn calo_hits(&self) -> &[CaloHitId] {
        &self.calo_hits
    }

    pub fn n_calo_hits(&self) -> usize {
        self.calo_hits.len()
    }

    pub fn electromagnetic_energy(&self) -> f32 {
        self.electromagnetic_energy
    }

    pub fn hadronic_energy(&self) -> f32 {
        self.hadronic_energy
    }
}

/// Role of a reconstructed vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexLabel {
    #[default]
    Interaction,
    Decay,
    Conversion,
}

/// Parameters for creating a vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexParameters {
    pub position: CartesianVector,
    pub label: VertexLabel,
}

/// A reconstructed vertex.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vertex {
    pub id: VertexId,
    pub position: CartesianVector,
    pub label: VertexLabel,
}

/// Parameters for creating a particle-flow object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PfoParameters {
    pub pdg_code: i32,
    pub charge: i32,
    pub mass: f32,
    pub energy: f32,
    pub momentum: CartesianVector,
    pub clusters: Vec<ClusterId>,
    pub tracks: Vec<TrackId>,
    pub vertices: Vec<VertexId>,
}

/// A particle-flow object: clusters, tracks and vertices plus particle metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pfo {
    pub id: PfoId,
    pub pdg_code: i32,
    pub charge: i32,
    pub mass: f32,
    pub energy: f32,
    pub momentum: CartesianVector,
    pub clusters: Vec<ClusterId>,
    pub tracks: Vec<TrackId>,
    pub vertices: Vec<VertexId>,
}

impl Pfo {
    pub fn new(id: PfoId, params: PfoParameters) -> Self {
        Self {
            id,
            pdg_code: params.pdg_code,
            charge: params.charge,
            mass: params.mass,
            energy: params.energy,
            momentum: params.momentum,
            clusters: params.clusters,
            tracks: params.tracks,
            vertices: params.vertices,
        }
    }
}

// ---------------------------------------------------------------------------
// EventInput
// ---------------------------------------------------------------------------

/// One event as read from an input JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventInput {
    /// Schema version for forward compatibility.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Optional caller-assigned event number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_number: Option<u64>,
    #[serde(default)]
    pub calo_hits: Vec<CaloHitParameters>,
    #[serde(default)]
    pub tracks: Vec<TrackParameters>,
    #[serde(default)]
    pub mc_particles: Vec<McParticleParameters>,
    /// Extra named calo-hit lists: list name to indices into `calo_hits`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub calo_hit_lists: BTreeMap<String, Vec<u32>>,
}

fn default_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

/// An events file holds either a single event or an array of events.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EventFile {
    Many(Vec<EventInput>),
    One(Box<EventInput>),
}

impl EventFile {
    pub fn into_events(self) -> Vec<EventInput> {
        match self {
            Self::Many(events) => events,
            Self::One(event) => vec![*event],
        }
    }
}
