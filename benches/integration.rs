use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rk45::{AdaptiveIntegrator, FixedIntegrator, OdeSystem, CASH_KARP};

/// Harmonic oscillator (2-state)
struct HarmonicOscillator {
    omega: f64,
}

impl OdeSystem<2> for HarmonicOscillator {
    fn rhs(&self, _t: f64, y: &[f64; 2], dydt: &mut [f64; 2]) {
        dydt[0] = y[1];
        dydt[1] = -self.omega * self.omega * y[0];
    }
}

/// Driven pendulum (2-state, non-autonomous)
struct DrivenPendulum {
    a: f64,
    w: f64,
}

impl OdeSystem<2> for DrivenPendulum {
    fn rhs(&self, t: f64, y: &[f64; 2], dydt: &mut [f64; 2]) {
        dydt[0] = y[1];
        dydt[1] = (-1.0 + self.a * self.w * self.w * (self.w * t).cos()) * y[0].sin();
    }
}

fn bench_fixed_pendulum(c: &mut Criterion) {
    c.bench_function("fixed_pendulum_10s_h1e-3", |b| {
        b.iter(|| {
            let sys = DrivenPendulum { a: 0.1, w: 20.0 };
            let mut run =
                FixedIntegrator::new(sys, 0.0, [2.5, 0.0], 10.0, 1e-3).unwrap();
            let mut last = (0.0, [0.0; 2]);
            while let Some(p) = run.advance() {
                last = p;
            }
            black_box(last)
        })
    });
}

fn bench_adaptive_oscillator(c: &mut Criterion) {
    let tau = 2.0 * std::f64::consts::PI;

    c.bench_function("adaptive_oscillator_dp_tol1e-8", |b| {
        b.iter(|| {
            let sys = HarmonicOscillator { omega: 1.0 };
            let mut run =
                AdaptiveIntegrator::new(sys, 0.0, [1.0, 0.0], tau, 0.1, 1e-8).unwrap();
            let mut last = (0.0, [0.0; 2]);
            while let Some(p) = run.advance() {
                last = p;
            }
            black_box(last)
        })
    });

    c.bench_function("adaptive_oscillator_ck_tol1e-8", |b| {
        b.iter(|| {
            let sys = HarmonicOscillator { omega: 1.0 };
            let mut run = AdaptiveIntegrator::with_tableau(
                sys,
                0.0,
                [1.0, 0.0],
                tau,
                0.1,
                1e-8,
                CASH_KARP,
            )
            .unwrap();
            let mut last = (0.0, [0.0; 2]);
            while let Some(p) = run.advance() {
                last = p;
            }
            black_box(last)
        })
    });
}

criterion_group!(benches, bench_fixed_pendulum, bench_adaptive_oscillator);
criterion_main!(benches);
