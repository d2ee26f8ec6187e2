//! Ball bouncing on a vibrating racket.
//!
//! Gravity plus linear drag, with the racket surface at A·sin(ωt). A bounce
//! event reflects the velocity, adds the racket's surface velocity, and
//! clamps the ball just above the surface so the event does not re-fire on
//! the same step. Collisions are recorded caller-side from the velocity
//! sign flip, and the fixed and adaptive sequencers are compared.
//!
//! Run with:
//!   cargo run --example pingpong

use rk45::{AdaptiveIntegrator, Event, FixedIntegrator, OdeSystem, StepSnapshot};

const G: f64 = 10.0;
const GAMMA: f64 = 0.02;
const A: f64 = 0.02;
const W: f64 = 4.0 * std::f64::consts::PI;

/// Falling ball with linear drag. State: [y, y'].
struct Ball;

impl OdeSystem<2> for Ball {
    fn rhs(&self, _t: f64, y: &[f64; 2], dydt: &mut [f64; 2]) {
        dydt[0] = y[1];
        dydt[1] = -G - GAMMA * y[1];
    }
}

/// Reflect off the racket surface A·sin(ωt).
struct RacketBounce;

impl Event<2> for RacketBounce {
    fn detect(&mut self, snap: &StepSnapshot<2>) -> bool {
        snap.y_low[0] < A * (W * snap.t).sin()
    }

    fn handle(&mut self, mut snap: StepSnapshot<2>) -> StepSnapshot<2> {
        // elastic reflection in the racket frame: v' = -v + 2·v_racket
        snap.y_low[1] = -snap.y_low[1] + 2.0 * A * W * (W * snap.t).cos();
        // epsilon offset keeps the corrected state off the surface
        snap.y_low[0] = A * (W * snap.t).sin() + 1e-8;
        snap
    }
}

fn main() {
    let y0 = [1.0, 0.0];
    let t_end = 50.0;

    // Fixed grid at 1 ms
    let mut fixed = FixedIntegrator::new(Ball, 0.0, y0, t_end, 1e-3)
        .expect("valid fixed-step configuration");
    fixed.add_event(Box::new(RacketBounce));

    let mut bounces = 0u32;
    let mut prev_v = y0[1];
    let mut last = (0.0, y0);
    while let Some((t, y)) = fixed.advance() {
        if prev_v < 0.0 && y[1] > 0.0 {
            bounces += 1;
        }
        prev_v = y[1];
        last = (t, y);
    }

    println!("fixed    h = 1e-3:");
    println!("  bounces:      {bounces}");
    println!("  final state:  y = {:.5} m, v = {:.5} m/s", last.1[0], last.1[1]);
    println!("  stats:        {:?}", fixed.stats());
    println!();

    // Adaptive, capped so the bounce resolution stays comparable
    let mut adaptive = AdaptiveIntegrator::new(Ball, 0.0, y0, t_end, 1e-3, 1e-9)
        .expect("valid adaptive configuration");
    adaptive.set_step_limits(1e-12, 5e-3).expect("valid step limits");
    adaptive.add_event(Box::new(RacketBounce));

    let mut bounces = 0u32;
    let mut prev_v = y0[1];
    let mut last = (0.0, y0);
    while let Some((t, y)) = adaptive.advance() {
        if prev_v < 0.0 && y[1] > 0.0 {
            bounces += 1;
        }
        prev_v = y[1];
        last = (t, y);
    }

    println!("adaptive tol = 1e-9, max step 5e-3:");
    println!("  bounces:      {bounces}");
    println!("  final state:  y = {:.5} m, v = {:.5} m/s", last.1[0], last.1[1]);
    println!("  stats:        {:?}", adaptive.stats());
}
