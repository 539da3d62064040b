use crate::models::{Geometry, GeometryExt};
use rstar::{RTree, RTreeObject, AABB};

/// Geometry envelope tagged with its insertion slot
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedEnvelope {
    /// Position of the geometry in its owning collection
    pub slot: usize,

    envelope: AABB<[f64; 2]>,
}

impl IndexedEnvelope {
    /// Returns None for geometries without a bounding box
    pub fn new(slot: usize, geometry: &Geometry) -> Option<Self> {
        let [min_x, min_y, max_x, max_y] = geometry.bbox()?;
        Some(Self { slot, envelope: AABB::from_corners([min_x, min_y], [max_x, max_y]) })
    }
}

impl RTreeObject for IndexedEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Bounding-box prefilter over a slot-addressed geometry collection
#[derive(Debug, Default)]
pub struct EnvelopeIndex {
    tree: RTree<IndexedEnvelope>,
}

impl EnvelopeIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Build an index from geometries addressed by their position
    pub fn from_geometries<'a>(geometries: impl IntoIterator<Item = &'a Geometry>) -> Self {
        let entries: Vec<IndexedEnvelope> = geometries
            .into_iter()
            .enumerate()
            .filter_map(|(slot, geometry)| IndexedEnvelope::new(slot, geometry))
            .collect();
        Self { tree: RTree::bulk_load(entries) }
    }

    /// Insert a geometry under a slot
    pub fn insert(&mut self, slot: usize, geometry: &Geometry) {
        if let Some(entry) = IndexedEnvelope::new(slot, geometry) {
            self.tree.insert(entry);
        }
    }

    /// Slots whose envelope intersects the given geometry's envelope, ascending
    pub fn candidates(&self, geometry: &Geometry) -> Vec<usize> {
        let Some([min_x, min_y, max_x, max_y]) = geometry.bbox() else {
            return Vec::new();
        };
        let query = AABB::from_corners([min_x, min_y], [max_x, max_y]);
        let mut slots: Vec<usize> =
            self.tree.locate_in_envelope_intersecting(&query).map(|e| e.slot).collect();
        slots.sort_unstable();
        slots
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
