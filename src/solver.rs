//! Embedded Runge-Kutta 4(5) step evaluation and sequencing.
//!
//! [`Stepper`] computes one trial step: the staged derivative sweep, both
//! solution estimates, and the RMS error norm between them. Two sequencers
//! drive it:
//!
//! - [`FixedIntegrator`] — a deterministic grid of `floor((t1 - t0)/h)`
//!   steps. Every step is accepted; the error norm only feeds events. The
//!   lower-order estimate advances the state.
//! - [`AdaptiveIntegrator`] — error-controlled step-size adaptation.
//!   Rejected trials are retried with a smaller step inside an explicit
//!   loop. The higher-order estimate advances the state on acceptance.
//!
//! Both expose a pull-based `advance()` returning `Option<(t, y)>` and
//! implement [`Iterator`], so a caller can redraw or accumulate after each
//! accepted point. A run is single-threaded and owns all of its state;
//! instantiate one per worker for parallel parameter sweeps.

use crate::coefficients::{Tableau, DORMAND_PRINCE};
use crate::events::{ChainOutcome, Event, EventSet, StepSnapshot};

/// System of ordinary differential equations: dy/dt = f(t, y)
pub trait OdeSystem<const N: usize> {
    /// Evaluate the right-hand side of the ODE system.
    ///
    /// # Arguments
    /// * `t` - Current time
    /// * `y` - Current state vector
    /// * `dydt` - Output: derivative dy/dt
    fn rhs(&self, t: f64, y: &[f64; N], dydt: &mut [f64; N]);
}

/// Plain closures are systems too: `|t, y, dydt| ...`.
impl<F, const N: usize> OdeSystem<N> for F
where
    F: Fn(f64, &[f64; N], &mut [f64; N]),
{
    fn rhs(&self, t: f64, y: &[f64; N], dydt: &mut [f64; N]) {
        self(t, y, dydt)
    }
}

/// Result of one trial step: both embedded estimates and their distance.
#[derive(Debug, Clone, Copy)]
pub struct StepEstimate<const N: usize> {
    /// 4th-order solution estimate.
    pub y_low: [f64; N],
    /// 5th-order solution estimate.
    pub y_high: [f64; N],
    /// `||y_high - y_low||₂ / sqrt(N)` — RMS of the per-component difference.
    pub error: f64,
}

/// Single-step evaluator for an `S`-stage embedded pair.
///
/// Owns the tableau and the pre-allocated stage workspace; the workspace is
/// overwritten on every [`step`](Stepper::step) call and never escapes it.
pub struct Stepper<const N: usize, const S: usize> {
    tableau: Tableau<S>,
    /// Stage derivative workspace, k[i] = f at stage i.
    k: [[f64; N]; S],
}

impl<const N: usize, const S: usize> Stepper<N, S> {
    /// Create an evaluator, validating the tableau.
    pub fn new(tableau: Tableau<S>) -> Result<Self, ConfigError> {
        tableau.validate()?;
        Ok(Self {
            tableau,
            k: [[0.0; N]; S],
        })
    }

    /// Evaluate one trial step of size `h` from `(t, y)`.
    ///
    /// The sign of `h` sets the direction of integration. Stage 0 is always
    /// `f(t, y)`; stage `i` combines only stages `j < i`. `y` is not
    /// mutated. Non-finite derivative values propagate un-sanitized into
    /// the estimates and the error norm.
    #[allow(clippy::needless_range_loop)]
    pub fn step<Sys: OdeSystem<N>>(
        &mut self,
        sys: &Sys,
        t: f64,
        y: &[f64; N],
        h: f64,
    ) -> StepEstimate<N> {
        sys.rhs(t, y, &mut self.k[0]);

        let mut y_stage = [0.0; N];
        for i in 1..S {
            for n in 0..N {
                let mut acc = 0.0;
                for j in 0..i {
                    acc += self.tableau.a[i][j] * self.k[j][n];
                }
                y_stage[n] = y[n] + h * acc;
            }
            sys.rhs(t + self.tableau.c[i] * h, &y_stage, &mut self.k[i]);
        }

        let mut y_low = *y;
        let mut y_high = *y;
        let mut sq = 0.0;
        for n in 0..N {
            let mut low = 0.0;
            let mut high = 0.0;
            for i in 0..S {
                low += self.tableau.b_low[i] * self.k[i][n];
                high += self.tableau.b_high[i] * self.k[i][n];
            }
            y_low[n] += h * low;
            y_high[n] += h * high;
            let d = y_high[n] - y_low[n];
            sq += d * d;
        }

        StepEstimate {
            y_low,
            y_high,
            error: (sq / N as f64).sqrt(),
        }
    }
}

/// Why a sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The time interval was exhausted.
    Completed,
    /// A kill event fired.
    Killed,
    /// The adaptive trial step fell below `min_step`: the run cannot proceed
    /// within tolerance (stiffness or divergence). The caller detects the
    /// truncation by comparing the final time against the requested endpoint.
    StepUnderflow,
    /// The adaptive trial step exceeded `max_step`.
    StepOverflow,
}

/// Integration statistics for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    /// Total number of derivative evaluations.
    pub fn_evals: u64,
    /// Number of accepted steps.
    pub accepted_steps: u64,
    /// Number of rejected trial steps (adaptive only).
    pub rejected_steps: u64,
}

/// Errors rejected at construction.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// A coefficient table violates a structural invariant.
    InvalidTableau {
        /// Description of the violated invariant.
        message: String,
    },
    /// Invalid run parameters (step size, bounds, tolerance, initial state).
    InvalidInput {
        /// Description of the invalid input.
        message: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidTableau { message } => {
                write!(f, "Invalid tableau: {}", message)
            }
            ConfigError::InvalidInput { message } => {
                write!(f, "Invalid input: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn ensure_finite_state<const N: usize>(y0: &[f64; N]) -> Result<(), ConfigError> {
    for (i, &v) in y0.iter().enumerate() {
        if !v.is_finite() {
            return Err(ConfigError::InvalidInput {
                message: format!("y0[{}] is not finite", i),
            });
        }
    }
    Ok(())
}

fn ensure_direction(t0: f64, t1: f64, h: f64) -> Result<(), ConfigError> {
    if !t0.is_finite() || !t1.is_finite() || !h.is_finite() {
        return Err(ConfigError::InvalidInput {
            message: "t0, t1, and the step size must be finite".to_string(),
        });
    }
    if h == 0.0 {
        return Err(ConfigError::InvalidInput {
            message: "step size must be non-zero".to_string(),
        });
    }
    if t1 != t0 && (t1 - t0).signum() != h.signum() {
        return Err(ConfigError::InvalidInput {
            message: "step sign must match integration direction (t1 - t0)".to_string(),
        });
    }
    Ok(())
}

/// Upper bound on the per-step growth factor. A zero error (locally exact
/// solution, e.g. a flat segment of the field) would otherwise send the
/// trial step to infinity, where the shrink rule cannot recover it.
const MAX_GROWTH: f64 = 5.0;

/// Step growth after an accepted adaptive trial.
///
/// The growth factor is capped at [`MAX_GROWTH`] (covering `error == 0`,
/// where the tolerance ratio overflows) and the result at `max_step`, so an
/// accepted step always yields a finite next trial.
fn grow_step(step: f64, tol: f64, error: f64, max_step: f64) -> f64 {
    let factor = if error == 0.0 {
        MAX_GROWTH
    } else {
        (0.9 * (tol / error).powf(0.2)).min(MAX_GROWTH)
    };
    (step * factor).min(max_step)
}

/// Step shrink after a rejected adaptive trial.
///
/// Strictly smaller than `step`: the factor is at most 0.9 (error > tol)
/// and floored at 0.1. A NaN error (divergent derivative) also lands on the
/// 0.1 floor, so a diverging run walks down to `min_step` and terminates.
fn shrink_step(step: f64, tol: f64, error: f64) -> f64 {
    (0.1 * step).max(step * 0.9 * (tol / error).powf(0.25))
}

/// Fixed-step RK45 sequencer.
///
/// Deterministic grid: `n = floor((t1 - t0)/h)` steps of size `h`, every one
/// accepted. The lower-order estimate advances the state; the error norm is
/// computed but only feeds the event layer.
///
/// The clock moves to the yield point before the stage sweep, so events see
/// the post-step time.
pub struct FixedIntegrator<Sys, const N: usize, const S: usize = 7> {
    sys: Sys,
    stepper: Stepper<N, S>,
    events: EventSet<N>,
    t0: f64,
    h: f64,
    t: f64,
    y: [f64; N],
    count: u64,
    total: u64,
    termination: Option<Termination>,
    stats: Stats,
}

impl<Sys: OdeSystem<N>, const N: usize> FixedIntegrator<Sys, N, 7> {
    /// Create a fixed-step run with the default Dormand-Prince tableau.
    ///
    /// `h` may be negative for backward integration; its sign must match
    /// `t1 - t0`.
    pub fn new(sys: Sys, t0: f64, y0: [f64; N], t1: f64, h: f64) -> Result<Self, ConfigError> {
        Self::with_tableau(sys, t0, y0, t1, h, DORMAND_PRINCE)
    }
}

impl<Sys: OdeSystem<N>, const N: usize, const S: usize> FixedIntegrator<Sys, N, S> {
    /// Create a fixed-step run with an explicit tableau.
    pub fn with_tableau(
        sys: Sys,
        t0: f64,
        y0: [f64; N],
        t1: f64,
        h: f64,
        tableau: Tableau<S>,
    ) -> Result<Self, ConfigError> {
        ensure_direction(t0, t1, h)?;
        ensure_finite_state(&y0)?;
        let stepper = Stepper::new(tableau)?;
        let total = ((t1 - t0) / h).floor() as u64;
        Ok(Self {
            sys,
            stepper,
            events: EventSet::new(),
            t0,
            h,
            t: t0,
            y: y0,
            count: 0,
            total,
            termination: None,
            stats: Stats::default(),
        })
    }

    /// Register an event, evaluated after every step in registration order.
    pub fn add_event(&mut self, event: Box<dyn Event<N>>) {
        self.events.push(event);
    }

    /// Produce the next `(time, state)` pair, or `None` when the grid is
    /// exhausted or a kill event has fired.
    pub fn advance(&mut self) -> Option<(f64, [f64; N])> {
        if self.termination.is_some() {
            return None;
        }
        if self.count >= self.total {
            self.termination = Some(Termination::Completed);
            return None;
        }

        self.count += 1;
        self.t = self.t0 + self.count as f64 * self.h;

        let est = self.stepper.step(&self.sys, self.t, &self.y, self.h);
        self.stats.fn_evals += S as u64;

        let snapshot = StepSnapshot {
            t: self.t,
            y_low: est.y_low,
            y_high: est.y_high,
            error: est.error,
        };
        match self.events.apply(snapshot) {
            ChainOutcome::Kill => {
                self.termination = Some(Termination::Killed);
                None
            }
            ChainOutcome::Advance { snapshot, .. } => {
                self.stats.accepted_steps += 1;
                self.t = snapshot.t;
                self.y = snapshot.y_low;
                Some((self.t, self.y))
            }
        }
    }

    /// Current time.
    pub fn time(&self) -> f64 {
        self.t
    }

    /// Current state vector.
    pub fn state(&self) -> &[f64; N] {
        &self.y
    }

    /// Why the sequence ended, once it has.
    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    /// Run statistics so far.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }
}

impl<Sys: OdeSystem<N>, const N: usize, const S: usize> Iterator for FixedIntegrator<Sys, N, S> {
    type Item = (f64, [f64; N]);

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}

/// Adaptive-step RK45 sequencer.
///
/// Holds a positive trial step magnitude bounded to `[min_step, max_step]`
/// (defaults 1e-12 and +inf); the direction comes from the sign of
/// `t1 - t0`. Accepted steps carry the higher-order estimate; rejected
/// trials shrink the step and retry inside `advance` — a loop, never
/// recursion, so sustained rejection near a stiff region cannot exhaust
/// the stack.
///
/// Events run on accepted steps only. When a handler fires, its corrected
/// `y_low` is authoritative and is carried into the next step in place of
/// the higher-order estimate.
pub struct AdaptiveIntegrator<Sys, const N: usize, const S: usize = 7> {
    sys: Sys,
    stepper: Stepper<N, S>,
    events: EventSet<N>,
    t1: f64,
    direction: f64,
    t: f64,
    y: [f64; N],
    step: f64,
    tol: f64,
    min_step: f64,
    max_step: f64,
    termination: Option<Termination>,
    stats: Stats,
}

impl<Sys: OdeSystem<N>, const N: usize> AdaptiveIntegrator<Sys, N, 7> {
    /// Create an adaptive run with the default Dormand-Prince tableau.
    ///
    /// `h0` is the initial trial step; its sign must match `t1 - t0`
    /// (the magnitude is what adapts). `tol` is the acceptance threshold
    /// on the RMS error norm.
    pub fn new(
        sys: Sys,
        t0: f64,
        y0: [f64; N],
        t1: f64,
        h0: f64,
        tol: f64,
    ) -> Result<Self, ConfigError> {
        Self::with_tableau(sys, t0, y0, t1, h0, tol, DORMAND_PRINCE)
    }
}

impl<Sys: OdeSystem<N>, const N: usize, const S: usize> AdaptiveIntegrator<Sys, N, S> {
    /// Create an adaptive run with an explicit tableau.
    pub fn with_tableau(
        sys: Sys,
        t0: f64,
        y0: [f64; N],
        t1: f64,
        h0: f64,
        tol: f64,
        tableau: Tableau<S>,
    ) -> Result<Self, ConfigError> {
        ensure_direction(t0, t1, h0)?;
        ensure_finite_state(&y0)?;
        if !tol.is_finite() || tol <= 0.0 {
            return Err(ConfigError::InvalidInput {
                message: format!("tolerance must be positive and finite (got {})", tol),
            });
        }
        let stepper = Stepper::new(tableau)?;
        Ok(Self {
            sys,
            stepper,
            events: EventSet::new(),
            t1,
            direction: if t1 >= t0 { 1.0 } else { -1.0 },
            t: t0,
            y: y0,
            step: h0.abs(),
            tol,
            min_step: 1e-12,
            max_step: f64::INFINITY,
            termination: None,
            stats: Stats::default(),
        })
    }

    /// Set the trial-step bounds. `min_step` must be positive and finite;
    /// `max_step` may be infinite but not below `min_step`.
    pub fn set_step_limits(&mut self, min_step: f64, max_step: f64) -> Result<(), ConfigError> {
        if !min_step.is_finite() || min_step <= 0.0 {
            return Err(ConfigError::InvalidInput {
                message: format!("min_step must be positive and finite (got {})", min_step),
            });
        }
        if max_step.is_nan() || max_step < min_step {
            return Err(ConfigError::InvalidInput {
                message: format!(
                    "max_step ({}) must be at least min_step ({})",
                    max_step, min_step
                ),
            });
        }
        self.min_step = min_step;
        self.max_step = max_step;
        Ok(())
    }

    /// Register an event, evaluated after every accepted step in
    /// registration order.
    pub fn add_event(&mut self, event: Box<dyn Event<N>>) {
        self.events.push(event);
    }

    /// Produce the next accepted `(time, state)` pair.
    ///
    /// Returns `None` once the interval is exhausted, a kill event fires,
    /// or the trial step escapes its bounds; [`termination`](Self::termination)
    /// says which.
    pub fn advance(&mut self) -> Option<(f64, [f64; N])> {
        if self.termination.is_some() {
            return None;
        }

        loop {
            let remaining = (self.t1 - self.t) * self.direction;
            if remaining <= 0.0 {
                self.termination = Some(Termination::Completed);
                return None;
            }
            if self.step < self.min_step {
                self.termination = Some(Termination::StepUnderflow);
                return None;
            }
            if self.step > self.max_step {
                self.termination = Some(Termination::StepOverflow);
                return None;
            }

            // Land exactly on the endpoint rather than overshoot it.
            let h_try = self.step.min(remaining);
            let est = self
                .stepper
                .step(&self.sys, self.t, &self.y, h_try * self.direction);
            self.stats.fn_evals += S as u64;

            if est.error < self.tol {
                let t_new = if h_try >= remaining {
                    self.t1
                } else {
                    self.t + h_try * self.direction
                };

                let snapshot = StepSnapshot {
                    t: t_new,
                    y_low: est.y_low,
                    y_high: est.y_high,
                    error: est.error,
                };
                match self.events.apply(snapshot) {
                    ChainOutcome::Kill => {
                        // killed trials do not count as accepted, matching
                        // the fixed sequencer's bookkeeping
                        self.termination = Some(Termination::Killed);
                        return None;
                    }
                    ChainOutcome::Advance {
                        snapshot,
                        corrected,
                    } => {
                        self.stats.accepted_steps += 1;
                        self.step = grow_step(self.step, self.tol, est.error, self.max_step);
                        self.t = snapshot.t;
                        self.y = if corrected {
                            snapshot.y_low
                        } else {
                            snapshot.y_high
                        };
                        return Some((self.t, self.y));
                    }
                }
            } else {
                self.stats.rejected_steps += 1;
                self.step = shrink_step(self.step, self.tol, est.error);
            }
        }
    }

    /// Current time.
    pub fn time(&self) -> f64 {
        self.t
    }

    /// Current state vector.
    pub fn state(&self) -> &[f64; N] {
        &self.y
    }

    /// Current trial step magnitude.
    pub fn step_size(&self) -> f64 {
        self.step
    }

    /// Why the sequence ended, once it has.
    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    /// Run statistics so far.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }
}

impl<Sys: OdeSystem<N>, const N: usize, const S: usize> Iterator
    for AdaptiveIntegrator<Sys, N, S>
{
    type Item = (f64, [f64; N]);

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}
