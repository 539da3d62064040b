use abutters_core::error::Result;
use abutters_core::models::{
    BufferSpec, Generation, Geometry, LngLat, Parcel, ParcelId, QueryClass, QueryKind,
};
use abutters_service::FieldEquals;
use serde::{Deserialize, Serialize};
use std::fmt;

/// External event fed to the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// Map click or geocoder result
    Locate(LngLat),

    /// Parcel-ID search
    SearchPid(String),

    /// Buffer the current selection by a distance in feet
    ApplyBuffer(f64),

    /// Click on empty space or explicit reset
    Clear,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Locate(point) => write!(f, "locate {}", point),
            Trigger::SearchPid(pid) => write!(f, "search {}", pid),
            Trigger::ApplyBuffer(feet) => write!(f, "buffer {} ft", feet),
            Trigger::Clear => write!(f, "clear"),
        }
    }
}

/// Orchestrator phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Idle,
    ResolvingSelection,
    SelectionResolved,
    ResolvingBuffer,
    BufferResolved,
}

impl Phase {
    /// Whether a query is outstanding
    pub fn is_resolving(&self) -> bool {
        matches!(self, Phase::ResolvingSelection | Phase::ResolvingBuffer)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::ResolvingSelection => "resolving selection",
            Phase::SelectionResolved => "selection resolved",
            Phase::ResolvingBuffer => "resolving buffer",
            Phase::BufferResolved => "buffer resolved",
        };
        write!(f, "{}", name)
    }
}

/// A query the orchestrator wants issued, tagged with its generation
#[derive(Debug, Clone, PartialEq)]
pub enum QueryRequest {
    Contains {
        generation: Generation,
        point: LngLat,
    },
    Attribute {
        generation: Generation,
        predicate: FieldEquals,
    },
    Intersects {
        generation: Generation,
        /// Selection the buffer polygon was computed around
        source: ParcelId,
        /// Committed only if the query resolves
        spec: BufferSpec,
        polygon: Geometry,
    },
}

impl QueryRequest {
    pub fn generation(&self) -> Generation {
        match self {
            QueryRequest::Contains { generation, .. }
            | QueryRequest::Attribute { generation, .. }
            | QueryRequest::Intersects { generation, .. } => *generation,
        }
    }

    pub fn kind(&self) -> QueryKind {
        match self {
            QueryRequest::Contains { .. } => QueryKind::Contains,
            QueryRequest::Attribute { .. } => QueryKind::Attribute,
            QueryRequest::Intersects { .. } => QueryKind::Intersects,
        }
    }

    pub fn class(&self) -> QueryClass {
        self.kind().class()
    }
}

/// Successful answer from the feature service
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResponse {
    Selection(Option<Parcel>),
    Buffer(Vec<Parcel>),
}

/// A finished query, carrying back the request it answers
#[derive(Debug)]
pub struct Completion {
    pub request: QueryRequest,
    pub result: Result<QueryResponse>,
}

impl Completion {
    pub fn new(request: QueryRequest, result: Result<QueryResponse>) -> Self {
        Self { request, result }
    }
}
