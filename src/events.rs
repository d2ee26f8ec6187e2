//! Event detection and correction during integration.
//!
//! Events are predicates evaluated after every step (every accepted step, for
//! the adaptive sequencer) that can rewrite the post-step state or terminate
//! the run. The canonical use is a collision: detect that a position estimate
//! has crossed a moving boundary, then reflect the velocity and clamp the
//! position back onto the boundary.
//!
//! # Ordering
//!
//! Events run in registration order. Each event sees the output of the
//! previous event's handler, so a chain of corrections composes left to
//! right. A kill event terminates the pass immediately; later events in
//! that pass are never consulted.
//!
//! # Handler contract
//!
//! A handler's output must not be immediately re-detected by the same event.
//! For a boundary collision this means clamping the position to the boundary
//! plus a small epsilon offset, so the next pass starts on the allowed side.
//! The integrators do not guard against handlers that violate this.

/// Snapshot of one trial step, handed to events after the stage sweep.
#[derive(Debug, Clone, Copy)]
pub struct StepSnapshot<const N: usize> {
    /// Time at the end of the step.
    pub t: f64,
    /// 4th-order solution estimate.
    pub y_low: [f64; N],
    /// 5th-order solution estimate.
    pub y_high: [f64; N],
    /// RMS difference between the two estimates.
    pub error: f64,
}

/// A detection predicate plus a correction handler.
///
/// Methods take `&mut self` so an event may carry state (hysteresis,
/// crossing counters). Implementations are owned by a single integration
/// run and are never shared.
pub trait Event<const N: usize> {
    /// Decide whether this event fires for the given step.
    fn detect(&mut self, snapshot: &StepSnapshot<N>) -> bool;

    /// Rewrite the detected step. Only invoked when [`detect`](Event::detect)
    /// returned `true` and [`kill`](Event::kill) is `false`. May change the
    /// time as well as both solution estimates.
    fn handle(&mut self, snapshot: StepSnapshot<N>) -> StepSnapshot<N>;

    /// When `true`, a positive detection terminates the run instead of
    /// invoking [`handle`](Event::handle). Defaults to `false`.
    fn kill(&self) -> bool {
        false
    }
}

/// Outcome of running the event chain over one step.
#[derive(Debug)]
pub enum ChainOutcome<const N: usize> {
    /// The run continues with the (possibly corrected) snapshot.
    Advance {
        /// Snapshot after all handlers in the chain have been applied.
        snapshot: StepSnapshot<N>,
        /// Whether any handler fired. When `true` the corrected snapshot is
        /// authoritative and the sequencer carries its `y_low` forward.
        corrected: bool,
    },
    /// A kill event fired; the run terminates with no further yields.
    Kill,
}

/// Ordered collection of events owned by one integration run.
#[derive(Default)]
pub struct EventSet<const N: usize> {
    events: Vec<Box<dyn Event<N>>>,
}

impl<const N: usize> EventSet<N> {
    /// Create an empty event set.
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Append an event. Events are evaluated in insertion order.
    pub fn push(&mut self, event: Box<dyn Event<N>>) {
        self.events.push(event);
    }

    /// Number of registered events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are registered.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Run the chain over one step snapshot.
    pub fn apply(&mut self, snapshot: StepSnapshot<N>) -> ChainOutcome<N> {
        let mut snap = snapshot;
        let mut corrected = false;
        for event in &mut self.events {
            if event.detect(&snap) {
                if event.kill() {
                    return ChainOutcome::Kill;
                }
                snap = event.handle(snap);
                corrected = true;
            }
        }
        ChainOutcome::Advance {
            snapshot: snap,
            corrected,
        }
    }
}
