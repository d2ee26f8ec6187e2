//! Driven (Kapitza) pendulum on the fixed-step sequencer.
//!
//! Integrates θ'' = (-g/l + a·ω²/l · cos(ωt)) · sin θ and sweeps the drive
//! frequency, printing the final angle for each run. With a fast enough
//! drive the inverted position stabilizes.
//!
//! Run with:
//!   cargo run --example kapitza

use rk45::{FixedIntegrator, OdeSystem};

/// Pendulum with a vertically vibrating pivot. State: [θ, θ'].
struct Kapitza {
    g: f64,
    l: f64,
    /// Drive amplitude.
    a: f64,
    /// Drive angular frequency.
    w: f64,
}

impl OdeSystem<2> for Kapitza {
    fn rhs(&self, t: f64, y: &[f64; 2], dydt: &mut [f64; 2]) {
        dydt[0] = y[1];
        dydt[1] = (-self.g / self.l + self.a * self.w * self.w / self.l * (self.w * t).cos())
            * y[0].sin();
    }
}

/// Wrap an angle into (-π, π].
fn wrap_angle(theta: f64) -> f64 {
    use std::f64::consts::PI;
    let mut th = (theta + PI) % (2.0 * PI);
    if th <= 0.0 {
        th += 2.0 * PI;
    }
    th - PI
}

fn main() {
    let theta0 = std::f64::consts::PI * 4.0 / 5.0; // start near inverted
    let dt = 1e-3;
    let t_end = 10.0;

    println!("Kapitza pendulum: θ₀ = {theta0:.4} rad, {t_end} s at h = {dt}");
    println!();
    println!("{:>6}  {:>12}  {:>12}", "ω", "θ(10s)", "θ'(10s)");

    for w in (5..30).step_by(5) {
        let sys = Kapitza {
            g: 1.0,
            l: 1.0,
            a: 0.1,
            w: w as f64,
        };
        let mut run = FixedIntegrator::new(sys, 0.0, [theta0, 0.0], t_end, dt)
            .expect("valid fixed-step configuration");

        let mut last = (0.0, [theta0, 0.0]);
        while let Some(p) = run.advance() {
            last = p;
        }

        println!(
            "{:>6}  {:>12.6}  {:>12.6}",
            w,
            wrap_angle(last.1[0]),
            last.1[1]
        );
    }
}
