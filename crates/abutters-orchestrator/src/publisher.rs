//! Published state and its subscription channel.

use abutters_core::error::ErrorKind;
use abutters_core::models::{Geometry, Parcel};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::models::Phase;

/// Read-only snapshot handed to consumers (renderers, export panels)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PublishedState {
    pub selection: Option<Parcel>,

    /// Requested buffer distance in feet
    pub buffer_distance: f64,

    /// Parcels intersecting the buffer, in service order
    pub buffer_parcels: Vec<Parcel>,

    pub buffer_polygon: Option<Geometry>,

    pub last_error: Option<ErrorKind>,

    pub phase: Phase,

    /// Increments on every publish
    pub revision: u64,
}

impl PublishedState {
    /// Whether a mailing list can be exported from this state
    pub fn has_abutters(&self) -> bool {
        !self.buffer_parcels.is_empty()
    }
}

/// Pushes snapshots to subscribers over a watch channel.
///
/// Subscribers always see the latest snapshot; intermediate ones may be
/// skipped by slow readers.
#[derive(Debug)]
pub struct ResultPublisher {
    sender: watch::Sender<PublishedState>,
    revision: u64,
}

impl Default for ResultPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultPublisher {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(PublishedState::default());
        Self { sender, revision: 0 }
    }

    pub fn subscribe(&self) -> watch::Receiver<PublishedState> {
        self.sender.subscribe()
    }

    /// Latest published snapshot
    pub fn current(&self) -> PublishedState {
        self.sender.borrow().clone()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Stamp `state` with the next revision and notify subscribers
    pub fn publish(&mut self, mut state: PublishedState) -> u64 {
        self.revision += 1;
        state.revision = self.revision;
        tracing::debug!(revision = self.revision, phase = %state.phase, "Publishing state");
        // Succeeds without subscribers
        self.sender.send_replace(state);
        self.revision
    }
}
