//! Selection and buffer state machine.
//!
//! [`QueryOrchestrator`] is synchronous: triggers and completions go in,
//! [`QueryRequest`]s come out. Running the requests is the caller's job (see
//! [`crate::runtime`]), which keeps every transition testable without a
//! feature service.

use abutters_core::error::{AbuttersError, ErrorKind, Result};
use abutters_core::models::{BufferSpec, DistanceUnit, Generation, LngLat, QueryClass};
use abutters_geo::compute_buffer;
use abutters_service::FieldEquals;

use crate::models::{Completion, Phase, QueryRequest, QueryResponse, Trigger};
use crate::publisher::PublishedState;
use crate::state::SelectionState;

pub struct QueryOrchestrator {
    state: SelectionState,
    pid_field: String,
    last_error: Option<ErrorKind>,
    selection_pending: bool,
    buffer_pending: bool,
}

impl QueryOrchestrator {
    /// Create an idle orchestrator resolving parcel-ID searches on `pid_field`
    pub fn new(pid_field: impl Into<String>) -> Self {
        Self {
            state: SelectionState::new(),
            pid_field: pid_field.into(),
            last_error: None,
            selection_pending: false,
            buffer_pending: false,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    /// Current phase. An outstanding selection query takes precedence over
    /// an outstanding buffer query.
    pub fn phase(&self) -> Phase {
        if self.selection_pending {
            Phase::ResolvingSelection
        } else if self.buffer_pending {
            Phase::ResolvingBuffer
        } else if self.state.buffer_result().is_some() {
            Phase::BufferResolved
        } else if !self.state.selection().is_empty() {
            Phase::SelectionResolved
        } else {
            Phase::Idle
        }
    }

    /// Accept a trigger, returning the query to issue, if any.
    ///
    /// Rejected triggers record their error kind in `last_error` and leave
    /// selection, buffer result and generations untouched.
    pub fn handle_trigger(&mut self, trigger: Trigger) -> Result<Option<QueryRequest>> {
        tracing::debug!(trigger = %trigger, "Handling trigger");
        self.last_error = None;

        let outcome = match trigger {
            Trigger::Locate(point) => self.locate(point).map(Some),
            Trigger::SearchPid(pid) => Ok(Some(self.search(&pid))),
            Trigger::ApplyBuffer(feet) => self.apply_buffer(feet).map(Some),
            Trigger::Clear => {
                self.clear();
                Ok(None)
            }
        };

        if let Err(e) = &outcome {
            tracing::warn!(error = %e, "Trigger rejected");
            self.last_error = e.kind();
        }
        outcome
    }

    fn locate(&mut self, point: LngLat) -> Result<QueryRequest> {
        if !point.is_finite() {
            return Err(AbuttersError::invalid_geometry(format!(
                "location {} has non-finite coordinates",
                point
            )));
        }
        let generation = self.begin_selection();
        Ok(QueryRequest::Contains { generation, point })
    }

    fn search(&mut self, pid: &str) -> QueryRequest {
        let generation = self.begin_selection();
        QueryRequest::Attribute {
            generation,
            predicate: FieldEquals::new(self.pid_field.as_str(), pid.trim()),
        }
    }

    /// Start a new selection generation. A buffer in flight was computed
    /// around the selection being replaced, so it is superseded as well.
    fn begin_selection(&mut self) -> Generation {
        self.state.next_generation(QueryClass::Buffer);
        self.buffer_pending = false;
        self.selection_pending = true;
        self.state.next_generation(QueryClass::Selection)
    }

    fn apply_buffer(&mut self, feet: f64) -> Result<QueryRequest> {
        let parcel = self.state.selection().parcel().ok_or(AbuttersError::NoSelection)?;
        let spec = BufferSpec::new(feet)?;

        let polygon = compute_buffer(&parcel.geometry, spec.feet(), DistanceUnit::Feet)?;
        let source = parcel.pid.clone();

        let generation = self.state.next_generation(QueryClass::Buffer);
        self.buffer_pending = true;
        Ok(QueryRequest::Intersects { generation, source, spec, polygon })
    }

    fn clear(&mut self) {
        self.state.next_generation(QueryClass::Selection);
        self.state.next_generation(QueryClass::Buffer);
        self.selection_pending = false;
        self.buffer_pending = false;
        self.state.clear();
        tracing::info!("Selection cleared");
    }

    /// Apply a finished query.
    ///
    /// Returns [`AbuttersError::StaleResult`] when the result was discarded:
    /// its generation was superseded, or the selection it was buffered
    /// around is gone. Discards change nothing.
    pub fn handle_completion(&mut self, completion: Completion) -> Result<()> {
        let Completion { request, result } = completion;
        let kind = request.kind();
        let class = request.class();
        let generation = request.generation();

        if let Err(stale) = self.state.check_current(class, generation) {
            tracing::debug!(query = %kind, generation = %generation, "Discarding stale result");
            return Err(stale);
        }

        match class {
            QueryClass::Selection => self.selection_pending = false,
            QueryClass::Buffer => self.buffer_pending = false,
        }

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(query = %kind, error = %e, "Query failed");
                self.last_error = Some(e.kind().unwrap_or(ErrorKind::QueryFailed(kind)));
                return Ok(());
            }
        };

        match (request, response) {
            (_, QueryResponse::Selection(parcel)) if class == QueryClass::Selection => {
                match &parcel {
                    Some(p) => tracing::info!(pid = %p.pid, "Selection resolved"),
                    None => tracing::info!(query = %kind, "No parcel matched"),
                }
                self.state.set_selection(parcel);
            }
            (
                QueryRequest::Intersects { source, spec, polygon, .. },
                QueryResponse::Buffer(parcels),
            ) => {
                let count = parcels.len();
                if !self.state.set_buffer_result(&source, spec, polygon, parcels) {
                    tracing::debug!(source = %source, "Discarding buffer for replaced selection");
                    return Err(AbuttersError::StaleResult { class, generation });
                }
                tracing::info!(source = %source, parcels = count, "Buffer resolved");
            }
            _ => {
                tracing::error!(query = %kind, "Response does not match request");
                self.last_error = Some(ErrorKind::QueryFailed(kind));
            }
        }
        Ok(())
    }

    /// Snapshot for publication. The publisher assigns the revision.
    pub fn snapshot(&self) -> PublishedState {
        let buffer = self.state.buffer_result();
        PublishedState {
            selection: self.state.selection().parcel().cloned(),
            buffer_distance: self.state.buffer_spec().feet(),
            buffer_parcels: buffer.map(|b| b.parcels.clone()).unwrap_or_default(),
            buffer_polygon: buffer.map(|b| b.polygon.clone()),
            last_error: self.last_error,
            phase: self.phase(),
            revision: 0,
        }
    }
}
