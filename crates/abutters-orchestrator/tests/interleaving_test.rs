//! Property tests: arbitrary interleavings of triggers and out-of-order
//! completions never let a superseded result reach the published state.

use abutters_core::error::AbuttersError;
use abutters_core::models::{Attributes, Geometry, LngLat, Parcel, QueryClass};
use abutters_orchestrator::{Completion, QueryOrchestrator, QueryRequest, QueryResponse, Trigger};
use proptest::prelude::*;

const LOTS: usize = 4;

fn lot(index: usize) -> Parcel {
    let x = index as f64 * 0.01;
    Parcel::new(
        format!("P{}", index),
        Geometry::polygon(vec![vec![
            [x, 0.0],
            [x + 0.001, 0.0],
            [x + 0.001, 0.001],
            [x, 0.001],
            [x, 0.0],
        ]]),
        Attributes::new(),
    )
}

fn point_for(index: usize) -> LngLat {
    LngLat::new(index as f64 * 0.01 + 0.0005, 0.0005)
}

/// What a consistent feature service would answer
fn answer(request: &QueryRequest) -> QueryResponse {
    match request {
        QueryRequest::Contains { point, .. } => {
            let index = (point.lon / 0.01).floor() as usize;
            QueryResponse::Selection((index < LOTS).then(|| lot(index)))
        }
        QueryRequest::Attribute { predicate, .. } => {
            let cell = predicate.value.to_cell();
            QueryResponse::Selection((0..LOTS).map(lot).find(|p| p.pid.as_str() == cell))
        }
        QueryRequest::Intersects { .. } => QueryResponse::Buffer(vec![lot(0), lot(1)]),
    }
}

#[derive(Debug, Clone)]
enum Step {
    Locate(usize),
    Search(usize),
    Buffer(u32),
    Clear,
    /// Complete the outstanding request at this position (modulo count)
    Complete(usize),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0..LOTS + 1).prop_map(Step::Locate),
        (0..LOTS).prop_map(Step::Search),
        (0u32..2000).prop_map(Step::Buffer),
        Just(Step::Clear),
        any::<usize>().prop_map(Step::Complete),
        any::<usize>().prop_map(Step::Complete),
    ]
}

fn expected_selection(request: &QueryRequest) -> Option<Parcel> {
    match answer(request) {
        QueryResponse::Selection(parcel) => parcel,
        QueryResponse::Buffer(_) => None,
    }
}

proptest! {
    #[test]
    fn prop_only_latest_selection_is_applied(steps in prop::collection::vec(step(), 1..40)) {
        let mut machine = QueryOrchestrator::new("PID_LONG");
        let mut outstanding: Vec<QueryRequest> = Vec::new();
        let mut latest_selection: Option<QueryRequest> = None;
        let mut selection_cleared = false;

        for step in steps {
            let trigger = match step {
                Step::Locate(i) => Trigger::Locate(point_for(i)),
                Step::Search(i) => Trigger::SearchPid(format!("P{}", i)),
                Step::Buffer(feet) => Trigger::ApplyBuffer(feet as f64),
                Step::Clear => Trigger::Clear,
                Step::Complete(pick) => {
                    if outstanding.is_empty() {
                        continue;
                    }
                    let request = outstanding.remove(pick % outstanding.len());
                    let class = request.class();
                    let is_latest = class == QueryClass::Selection
                        && latest_selection.as_ref() == Some(&request)
                        && !selection_cleared;
                    let before = machine.snapshot();
                    let response = answer(&request);

                    let result = machine.handle_completion(Completion::new(request.clone(), Ok(response)));

                    if class == QueryClass::Selection {
                        prop_assert_eq!(result.is_ok(), is_latest);
                        if is_latest {
                            prop_assert_eq!(
                                machine.snapshot().selection,
                                expected_selection(&request)
                            );
                        }
                    }
                    if let Err(AbuttersError::StaleResult { .. }) = result {
                        let after = machine.snapshot();
                        prop_assert_eq!(after.selection, before.selection);
                        prop_assert_eq!(after.buffer_parcels, before.buffer_parcels);
                    }
                    continue;
                }
            };

            if matches!(trigger, Trigger::Clear) {
                selection_cleared = true;
            }
            if let Ok(Some(request)) = machine.handle_trigger(trigger) {
                if request.class() == QueryClass::Selection {
                    latest_selection = Some(request.clone());
                    selection_cleared = false;
                }
                outstanding.push(request);
            }

            // A buffer result always belongs to the selection on display
            let snapshot = machine.snapshot();
            if snapshot.buffer_polygon.is_some() {
                prop_assert!(snapshot.selection.is_some());
            }
        }

        // Drain in arrival order; the final selection is the latest answer
        for request in outstanding.drain(..) {
            let response = answer(&request);
            let _ = machine.handle_completion(Completion::new(request, Ok(response)));
        }
        if let (Some(latest), false) = (&latest_selection, selection_cleared) {
            prop_assert_eq!(machine.snapshot().selection, expected_selection(latest));
        }
        prop_assert!(!machine.phase().is_resolving());
    }
}
