//! Embedded Runge-Kutta 4(5) coefficient tables.
//!
//! Each method is a Butcher tableau for a six- or seven-stage embedded pair:
//! a 5th-order solution used for propagation plus a 4th-order companion whose
//! difference from it gives the local error estimate.
//!
//! Two classic pairs are provided:
//!
//! - [`DORMAND_PRINCE`] — Dormand & Prince (1980), the default. Seven stages;
//!   the last stage is the FSAL evaluation `f(t + h, y_high)`, carried so
//!   that the 4th-order weights form a complete (sum-to-one) combination.
//! - [`CASH_KARP`] — Cash & Karp (1990). Six stages.
//!
//! References:
//!
//! 1. Dormand, J.R. & Prince, P.J. (1980). "A family of embedded
//!    Runge-Kutta formulae". J. Comp. Appl. Math. 6(1), 19-26.
//! 2. Cash, J.R. & Karp, A.H. (1990). "A variable order Runge-Kutta method
//!    for initial value problems with rapidly varying right-hand sides".
//!    ACM TOMS 16(3), 201-222.

use crate::solver::ConfigError;

/// Butcher tableau for an embedded Runge-Kutta 4(5) pair with `S` stages.
///
/// The tables are plain data; [`Tableau::validate`] checks the structural
/// invariants and is called whenever a tableau enters a
/// [`Stepper`](crate::Stepper) or integrator.
#[derive(Debug, Clone, Copy)]
pub struct Tableau<const S: usize> {
    /// Node offsets `c[i]`: stage `i` samples the derivative at `t + c[i]*h`.
    pub c: [f64; S],
    /// Stage-coupling matrix `a[i][j]`, strictly lower triangular:
    /// stage `i` combines the derivatives of stages `j < i` only.
    pub a: [[f64; S]; S],
    /// Weights of the 4th-order solution estimate.
    pub b_low: [f64; S],
    /// Weights of the 5th-order solution estimate.
    pub b_high: [f64; S],
}

/// Tolerance on the weight-vector sums (each must combine to exactly one
/// up to floating-point rounding of the rational coefficients).
const WEIGHT_SUM_TOL: f64 = 1e-12;

impl<const S: usize> Tableau<S> {
    /// Check the structural invariants of the tableau.
    ///
    /// - `c[0]` must be zero (stage 0 is always `f(t, y)`)
    /// - `a` must be strictly lower triangular
    /// - `b_low` and `b_high` must each sum to 1 within 1e-12
    ///
    /// Returns [`ConfigError::InvalidTableau`] naming the violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.c[0] != 0.0 {
            return Err(ConfigError::InvalidTableau {
                message: format!("c[0] must be 0 (got {})", self.c[0]),
            });
        }
        for i in 0..S {
            for j in i..S {
                if self.a[i][j] != 0.0 {
                    return Err(ConfigError::InvalidTableau {
                        message: format!(
                            "coupling matrix must be strictly lower triangular: a[{}][{}] = {}",
                            i, j, self.a[i][j]
                        ),
                    });
                }
            }
        }
        let sum_low: f64 = self.b_low.iter().sum();
        if (sum_low - 1.0).abs() > WEIGHT_SUM_TOL {
            return Err(ConfigError::InvalidTableau {
                message: format!("4th-order weights sum to {}, expected 1", sum_low),
            });
        }
        let sum_high: f64 = self.b_high.iter().sum();
        if (sum_high - 1.0).abs() > WEIGHT_SUM_TOL {
            return Err(ConfigError::InvalidTableau {
                message: format!("5th-order weights sum to {}, expected 1", sum_high),
            });
        }
        Ok(())
    }
}

/// Dormand-Prince 5(4) coefficients (RK45, seven stages).
///
/// Stage 6 is the FSAL evaluation at `(t + h, y_high)`; it carries weight
/// zero in the 5th-order combination and 1/40 in the 4th-order one.
pub const DORMAND_PRINCE: Tableau<7> = Tableau {
    c: [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0],
    a: [
        [0.0; 7],
        [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0, 0.0],
        [
            19372.0 / 6561.0,
            -25360.0 / 2187.0,
            64448.0 / 6561.0,
            -212.0 / 729.0,
            0.0,
            0.0,
            0.0,
        ],
        [
            9017.0 / 3168.0,
            -355.0 / 33.0,
            46732.0 / 5247.0,
            49.0 / 176.0,
            -5103.0 / 18656.0,
            0.0,
            0.0,
        ],
        [
            35.0 / 384.0,
            0.0,
            500.0 / 1113.0,
            125.0 / 192.0,
            -2187.0 / 6784.0,
            11.0 / 84.0,
            0.0,
        ],
    ],
    b_low: [
        5179.0 / 57600.0,
        0.0,
        7571.0 / 16695.0,
        393.0 / 640.0,
        -92097.0 / 339200.0,
        187.0 / 2100.0,
        1.0 / 40.0,
    ],
    b_high: [
        35.0 / 384.0,
        0.0,
        500.0 / 1113.0,
        125.0 / 192.0,
        -2187.0 / 6784.0,
        11.0 / 84.0,
        0.0,
    ],
};

/// Cash-Karp 5(4) coefficients (six stages).
pub const CASH_KARP: Tableau<6> = Tableau {
    c: [0.0, 1.0 / 5.0, 3.0 / 10.0, 3.0 / 5.0, 1.0, 7.0 / 8.0],
    a: [
        [0.0; 6],
        [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0],
        [3.0 / 10.0, -9.0 / 10.0, 6.0 / 5.0, 0.0, 0.0, 0.0],
        [-11.0 / 54.0, 5.0 / 2.0, -70.0 / 27.0, 35.0 / 27.0, 0.0, 0.0],
        [
            1631.0 / 55296.0,
            175.0 / 512.0,
            575.0 / 13824.0,
            44275.0 / 110592.0,
            253.0 / 4096.0,
            0.0,
        ],
    ],
    b_low: [
        2825.0 / 27648.0,
        0.0,
        18575.0 / 48384.0,
        13525.0 / 55296.0,
        277.0 / 14336.0,
        1.0 / 4.0,
    ],
    b_high: [
        37.0 / 378.0,
        0.0,
        250.0 / 621.0,
        125.0 / 594.0,
        0.0,
        512.0 / 1771.0,
    ],
};
