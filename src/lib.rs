//! # RK45: Embedded Runge-Kutta 4(5) Integration with Events
//!
//! An adaptive embedded Runge-Kutta integrator for simulating small
//! dynamical systems — driven pendulums, bouncing balls, orbital toys —
//! with discrete event handling mid-integration.
//!
//! ## Features
//!
//! - 5(4) embedded pairs: Dormand-Prince (default) and Cash-Karp
//! - Fixed-step and adaptive-step sequencers over the same step evaluator
//! - Adaptive error control with bounded, loop-based retry of rejected steps
//! - Pluggable events: detect a threshold crossing (e.g. a collision),
//!   rewrite the post-step state (e.g. a bounce), or terminate the run
//! - Lazy pull-based output: one `(time, state)` pair per accepted step,
//!   suitable for animation loops and per-point accumulation
//! - Minimal dependencies (no external linear algebra required)
//!
//! ## Basic Usage
//!
//! ```rust
//! use rk45::{FixedIntegrator, OdeSystem};
//!
//! // Define your ODE system
//! struct Pendulum {
//!     omega2: f64, // g / l
//! }
//!
//! impl OdeSystem<2> for Pendulum {
//!     fn rhs(&self, _t: f64, y: &[f64; 2], dydt: &mut [f64; 2]) {
//!         dydt[0] = y[1];
//!         dydt[1] = -self.omega2 * y[0].sin();
//!     }
//! }
//!
//! let sys = Pendulum { omega2: 1.0 };
//! let mut run = FixedIntegrator::new(sys, 0.0, [0.4, 0.0], 10.0, 1e-3).unwrap();
//! while let Some((t, y)) = run.advance() {
//!     // plot or accumulate (t, y) here
//!     let _ = (t, y);
//! }
//! ```
//!
//! Closures work too, and the adaptive sequencer takes a tolerance plus an
//! initial trial step:
//!
//! ```rust
//! use rk45::{AdaptiveIntegrator, Termination};
//!
//! let f = |_t: f64, y: &[f64; 2], dydt: &mut [f64; 2]| {
//!     dydt[0] = y[1];
//!     dydt[1] = -y[0];
//! };
//! let tau = std::f64::consts::TAU;
//! let mut run = AdaptiveIntegrator::new(f, 0.0, [1.0, 0.0], tau, 0.1, 1e-8).unwrap();
//!
//! let mut last = (0.0, [0.0_f64; 2]);
//! while let Some(p) = run.advance() {
//!     last = p;
//! }
//! assert_eq!(run.termination(), Some(Termination::Completed));
//! assert!((last.1[0] - 1.0).abs() < 1e-6); // cos(2π) ≈ 1
//! ```
//!
//! ## Events
//!
//! An [`Event`] pairs a detection predicate with a correction handler and
//! runs after every (accepted) step. The classic use is a ball bouncing on
//! a vibrating racket: detect that the position estimate dropped below the
//! racket surface, then reflect the velocity (adding the racket's own
//! velocity) and clamp the position just above the surface so the event
//! does not immediately re-fire. A kill event terminates the run instead.
//! See `demos/pingpong.rs` for the full scenario.
//!
//! ## Accepted-state convention
//!
//! The fixed sequencer advances the 4th-order estimate; the adaptive
//! sequencer advances the 5th-order estimate on acceptance, except that a
//! fired event handler's output (applied to the 4th-order estimate) is
//! authoritative. This mirrors the reference behavior of the simulations
//! this crate was built for; see the module docs in [`solver`].
//!
//! ## References
//!
//! 1. Dormand, J.R. & Prince, P.J. (1980). "A family of embedded
//!    Runge-Kutta formulae". J. Comp. Appl. Math. 6(1), 19-26.
//! 2. Cash, J.R. & Karp, A.H. (1990). "A variable order Runge-Kutta
//!    method for initial value problems with rapidly varying right-hand
//!    sides". ACM TOMS 16(3), 201-222.
//! 3. Press, W.H. et al. (1992). "Numerical Recipes in C", 2nd ed.,
//!    §16.2 (adaptive step-size control for Runge-Kutta).

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod coefficients;
pub mod events;
pub mod solver;

pub use coefficients::{Tableau, CASH_KARP, DORMAND_PRINCE};
pub use events::{ChainOutcome, Event, EventSet, StepSnapshot};
pub use solver::{
    AdaptiveIntegrator, ConfigError, FixedIntegrator, OdeSystem, Stats, StepEstimate, Stepper,
    Termination,
};
