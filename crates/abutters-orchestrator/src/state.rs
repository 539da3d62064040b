//! Authoritative selection state.
//!
//! `SelectionState` has a single writer: the
//! [`QueryOrchestrator`](crate::machine::QueryOrchestrator) that owns it.
//! Consumers only ever see published snapshots.

use abutters_core::error::{AbuttersError, Result};
use abutters_core::models::{
    BufferResult, BufferSpec, Generation, Geometry, Parcel, ParcelId, QueryClass, Selection,
};

#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    selection: Selection,
    buffer_spec: BufferSpec,
    buffer_result: Option<BufferResult>,
    selection_generation: Generation,
    buffer_generation: Generation,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Spec of the last buffer that resolved. Kept across selection changes
    /// and clears; rejected or failed buffers never reach it.
    pub fn buffer_spec(&self) -> BufferSpec {
        self.buffer_spec
    }

    pub fn buffer_result(&self) -> Option<&BufferResult> {
        self.buffer_result.as_ref()
    }

    /// Replace the selection. Any buffer result belonged to the old
    /// selection and is cleared.
    pub fn set_selection(&mut self, parcel: Option<Parcel>) {
        self.selection = Selection::from(parcel);
        self.buffer_result = None;
    }

    /// Replace the buffer result computed around `source` with `spec`,
    /// committing `spec` as the current buffer spec.
    ///
    /// Returns false, leaving state untouched, when `source` is no longer
    /// the selected parcel.
    pub fn set_buffer_result(
        &mut self,
        source: &ParcelId,
        spec: BufferSpec,
        polygon: Geometry,
        parcels: Vec<Parcel>,
    ) -> bool {
        if self.selection.pid() != Some(source) {
            return false;
        }
        self.buffer_spec = spec;
        self.buffer_result =
            Some(BufferResult { source: source.clone(), spec, polygon, parcels });
        true
    }

    /// Drop selection and buffer result
    pub fn clear(&mut self) {
        self.set_selection(None);
    }

    pub fn generation(&self, class: QueryClass) -> Generation {
        match class {
            QueryClass::Selection => self.selection_generation,
            QueryClass::Buffer => self.buffer_generation,
        }
    }

    /// Advance the generation of `class`, superseding every query issued
    /// under an older one
    pub fn next_generation(&mut self, class: QueryClass) -> Generation {
        let counter = match class {
            QueryClass::Selection => &mut self.selection_generation,
            QueryClass::Buffer => &mut self.buffer_generation,
        };
        *counter = counter.next();
        *counter
    }

    /// Fail with [`AbuttersError::StaleResult`] unless `generation` is the
    /// current generation of `class`
    pub fn check_current(&self, class: QueryClass, generation: Generation) -> Result<()> {
        if self.generation(class) != generation {
            return Err(AbuttersError::StaleResult { class, generation });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abutters_core::models::Attributes;

    fn spec(feet: f64) -> BufferSpec {
        BufferSpec::new(feet).unwrap()
    }

    fn parcel(pid: &str) -> Parcel {
        Parcel::new(
            pid,
            Geometry::polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]),
            Attributes::new(),
        )
    }

    #[test]
    fn test_new_selection_clears_buffer_result() {
        let mut state = SelectionState::new();
        state.set_selection(Some(parcel("A")));
        assert!(state.set_buffer_result(
            &ParcelId::from("A"),
            spec(100.0),
            Geometry::point(0.0, 0.0),
            vec![]
        ));
        assert!(state.buffer_result().is_some());

        state.set_selection(Some(parcel("B")));
        assert!(state.buffer_result().is_none());
        assert_eq!(state.selection().pid(), Some(&ParcelId::from("B")));
    }

    #[test]
    fn test_buffer_result_for_other_selection_is_rejected() {
        let mut state = SelectionState::new();
        state.set_selection(Some(parcel("B")));

        let accepted = state.set_buffer_result(
            &ParcelId::from("A"),
            spec(100.0),
            Geometry::point(0.0, 0.0),
            vec![],
        );
        assert!(!accepted);
        assert!(state.buffer_result().is_none());
        assert_eq!(state.buffer_spec(), BufferSpec::default());
    }

    #[test]
    fn test_buffer_result_without_selection_is_rejected() {
        let mut state = SelectionState::new();
        assert!(!state.set_buffer_result(
            &ParcelId::from("A"),
            spec(100.0),
            Geometry::point(0.0, 0.0),
            vec![]
        ));
    }

    #[test]
    fn test_buffer_result_records_spec() {
        let mut state = SelectionState::new();
        state.set_selection(Some(parcel("A")));
        state.set_buffer_result(
            &ParcelId::from("A"),
            spec(250.0),
            Geometry::point(0.0, 0.0),
            vec![parcel("C")],
        );

        let result = state.buffer_result().unwrap();
        assert_eq!(result.spec.feet(), 250.0);
        assert_eq!(result.parcels.len(), 1);
        assert_eq!(state.buffer_spec().feet(), 250.0);
    }

    #[test]
    fn test_generations_are_per_class() {
        let mut state = SelectionState::new();
        let first = state.next_generation(QueryClass::Selection);
        let second = state.next_generation(QueryClass::Selection);
        assert!(second > first);

        assert_eq!(state.generation(QueryClass::Buffer), Generation::default());
        assert!(state.check_current(QueryClass::Selection, second).is_ok());
        assert!(matches!(
            state.check_current(QueryClass::Selection, first),
            Err(AbuttersError::StaleResult { class: QueryClass::Selection, .. })
        ));
    }

    #[test]
    fn test_clear() {
        let mut state = SelectionState::new();
        state.set_selection(Some(parcel("A")));
        state.clear();
        assert!(state.selection().is_empty());
        assert!(state.buffer_result().is_none());
    }
}
