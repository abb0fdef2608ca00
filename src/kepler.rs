//! # Kepler equation solvers
//!
//! Two families of solvers live here:
//!
//! - [`solve_kepler_equation`]: classical elliptic Kepler equation `M = E − e·sin(E)`
//!   solved by Newton iteration, used when placing catalogue bodies on their orbits.
//! - [`kepler_drift`]: two-body propagation of a Cartesian state over an arbitrary
//!   time step with **universal variables**, valid for elliptic and hyperbolic
//!   orbits. This is the drift operator of the Wisdom–Holman engine.
//!
//! The universal formulation solves
//!
//! ```text
//! r0·s1(ψ) + σ0·s2(ψ) + μ·s3(ψ) = Δt
//! ```
//!
//! for the universal anomaly `ψ`, where `σ0 = r0·v0`, `α = v0² − 2μ/r0` (twice the
//! specific energy) and `s0..s3` are Stumpff-type series in `β = α·ψ²`. The
//! propagated state then follows from the Lagrange `f`, `g` coefficients.
use nalgebra::Vector3;
use std::f64::consts::PI;
use tracing::warn;

use crate::constants::{DPI, KEPLER_MAX_ITER, KEPLER_TOLERANCE};

/// Return the principal value of an angle in radians, in `[0, 2π)`.
#[inline]
pub fn principal_angle(a: f64) -> f64 {
    let r = a.rem_euclid(DPI);
    // rem_euclid rounds tiny negative inputs up to exactly 2π
    if r >= DPI {
        0.0
    } else {
        r
    }
}

/// Return the principal difference between two angles, in `[-π, π]`.
fn angle_diff(a: f64, b: f64) -> f64 {
    let mut diff = principal_angle(a) - principal_angle(b);

    if diff > PI {
        diff -= DPI;
    } else if diff < -PI {
        diff += DPI;
    }

    diff
}

/// Outcome of the elliptic Kepler solver.
///
/// The solver never fails: when the iteration cap is reached without meeting the
/// tolerance, the last iterate is returned with `converged == false`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeplerSolution {
    /// Eccentric anomaly E (radians)
    pub eccentric_anomaly: f64,
    /// Number of Newton iterations performed
    pub iterations: usize,
    /// Whether the last Newton step was below the tolerance
    pub converged: bool,
}

/// Solve the elliptic Kepler equation `M = E − e·sin(E)` for the eccentric anomaly.
///
/// Newton's method is started from `E₀ = M` for `e < 0.8` and from `E₀ = π` for
/// more eccentric orbits, and stops once `|ΔE| < 1e-14` or after 50 iterations.
///
/// Arguments
/// ---------
/// * `mean_anomaly`: mean anomaly M (radians, any range).
/// * `eccentricity`: eccentricity, `0 ≤ e < 1`.
///
/// Return
/// ------
/// * A [`KeplerSolution`]. A shortfall is reported through `converged` and logged
///   as a warning, never raised.
pub fn solve_kepler_equation(mean_anomaly: f64, eccentricity: f64) -> KeplerSolution {
    let mut ecc_anom = if eccentricity < 0.8 { mean_anomaly } else { PI };

    for iter in 1..=KEPLER_MAX_ITER {
        let fun = ecc_anom - eccentricity * ecc_anom.sin() - mean_anomaly;
        let funp = 1.0 - eccentricity * ecc_anom.cos();
        let delta = fun / funp;
        ecc_anom -= delta;

        if delta.abs() < KEPLER_TOLERANCE {
            return KeplerSolution {
                eccentric_anomaly: ecc_anom,
                iterations: iter,
                converged: true,
            };
        }
    }

    warn!(
        mean_anomaly,
        eccentricity,
        "Kepler equation did not converge within {KEPLER_MAX_ITER} iterations; using best estimate"
    );
    KeplerSolution {
        eccentric_anomaly: ecc_anom,
        iterations: KEPLER_MAX_ITER,
        converged: false,
    }
}

/// Stumpff-type functions `(s0, s1, s2, s3)` of the universal anomaly `psi` for a
/// given `alpha = v² − 2μ/r`.
fn s_funct(psi: f64, alpha: f64) -> (f64, f64, f64, f64) {
    const JMAX: usize = 70;
    const HALFMAX: usize = 30;
    const BETACONTR: f64 = 100.0;

    let epsilon = f64::EPSILON;
    let contr = 100.0 * epsilon;
    let overfl = 1.0 / epsilon;

    let beta = alpha * psi.powi(2);
    let mut s0: f64;
    let mut s1: f64;
    let s2: f64;
    let s3: f64;

    if beta.abs() < BETACONTR {
        // series expansion of s2 and s3
        let mut term2 = psi.powi(2) / 2.0;
        let mut term3 = term2 * psi / 3.0;
        let mut sum2 = term2;
        let mut sum3 = term3;

        for j in 1..=JMAX {
            term2 *= beta / ((2.0 * j as f64 + 1.0) * (2.0 * j as f64 + 2.0));
            sum2 += term2;
            if term2.abs() < contr || term2.abs() > overfl {
                break;
            }
        }

        for j in 1..=JMAX {
            term3 *= beta / ((2.0 * j as f64 + 2.0) * (2.0 * j as f64 + 3.0));
            sum3 += term3;
            if term3.abs() < contr || term3.abs() > overfl {
                break;
            }
        }

        s2 = sum2;
        s3 = sum3;
        s1 = psi + alpha * s3;
        s0 = 1.0 + alpha * s2;
    } else {
        // halve psi until the series is well conditioned
        let mut psi2 = psi;
        let mut nhalf = 0;
        let mut beta_half = beta;

        for _ in 0..HALFMAX {
            psi2 *= 0.5;
            nhalf += 1;
            beta_half = alpha * psi2.powi(2);
            if beta_half.abs() < BETACONTR {
                break;
            }
        }

        let mut term0 = 1.0;
        let mut term1 = psi2;
        s0 = 1.0;
        s1 = psi2;

        for j in 1..=JMAX {
            term0 *= beta_half / ((2 * j - 1) as f64 * (2 * j) as f64);
            s0 += term0;
            if term0.abs() < contr || term0.abs() > overfl {
                break;
            }
        }

        for j in 1..=JMAX {
            term1 *= beta_half / ((2 * j) as f64 * (2 * j + 1) as f64);
            s1 += term1;
            if term1.abs() < contr || term1.abs() > overfl {
                break;
            }
        }

        // duplication formulas back to the original psi
        for _ in 0..nhalf {
            let s02 = 2.0 * s0.powi(2) - 1.0;
            let s12 = 2.0 * s0 * s1;
            s0 = s02;
            s1 = s12;
        }

        s3 = (s1 - psi) / alpha;
        s2 = (s0 - 1.0) / alpha;
    }

    (s0, s1, s2, s3)
}

/// Initial guess of the universal anomaly from the classical anomalies.
///
/// Returns `None` for an exactly parabolic `alpha`, where the caller keeps the
/// crude `Δt / r0` guess.
fn prelim_kepuni(
    dt: f64,
    r0: f64,
    sig0: f64,
    mu: f64,
    alpha: f64,
    e0: f64,
    contr: f64,
) -> Option<f64> {
    const ITX: usize = 20;

    if alpha < 0.0 {
        // elliptic case
        let a0 = -mu / alpha;
        let enne = (-alpha.powi(3)).sqrt() / mu;
        let (u0, u) = if e0 < contr {
            (0.0, enne * dt)
        } else {
            let cosu0 = (1.0 - r0 / a0) / e0;
            let mut u0 = if cosu0.abs() <= 1.0 {
                cosu0.acos()
            } else if cosu0 >= 1.0 {
                0.0
            } else {
                PI
            };

            if sig0 < 0.0 {
                u0 = -u0;
            }

            u0 = principal_angle(u0);
            let ell0 = principal_angle(u0 - e0 * u0.sin());
            let ell = principal_angle(ell0 + enne * dt);
            let mut u = PI;

            for _ in 0..ITX {
                let du = -(u - e0 * u.sin() - ell) / (1.0 - e0 * u.cos());
                u += du;
                if du.abs() < contr * 1e3 {
                    break;
                }
            }
            (u0, u)
        };

        // restore the whole revolutions lost by the angle reduction
        let base = angle_diff(u, u0);
        let revs = ((enne * dt - base) / DPI).round();
        Some((base + revs * DPI) / (-alpha).sqrt())
    } else if alpha > 0.0 {
        // hyperbolic case
        let a0 = -mu / alpha;
        let enne = alpha.powi(3).sqrt() / mu;
        let coshf0 = (1.0 - r0 / a0) / e0;
        let mut f0 = if coshf0 > 1.0 {
            (coshf0 + (coshf0.powi(2) - 1.0).sqrt()).ln()
        } else {
            0.0
        };

        if sig0 < 0.0 {
            f0 = -f0;
        }

        let ell0 = e0 * f0.sinh() - f0;
        let ell = ell0 + enne * dt;
        let mut f: f64 = 0.0;

        for _ in 0..ITX {
            let df = if f.abs() < 15.0 {
                let df = -(e0 * f.sinh() - f - ell) / (e0 * f.cosh() - 1.0);
                let ff = f + df;
                let next = if f * ff < 0.0 { f / 2.0 } else { ff };
                let step = next - f;
                f = next;
                step
            } else {
                f /= 2.0;
                f
            };
            if df.abs() < contr * 1e3 {
                break;
            }
        }

        Some((f - f0) / alpha.sqrt())
    } else {
        None
    }
}

/// Solve the universal Kepler equation with Newton's method.
///
/// Return
/// ------
/// * `Some((psi, s0, s1, s2, s3))` on convergence, `None` if the iteration diverges
///   or does not converge.
fn solve_kepuni(
    dt: f64,
    r0: f64,
    sig0: f64,
    mu: f64,
    alpha: f64,
    e0: f64,
) -> Option<(f64, f64, f64, f64, f64)> {
    const JMAX: usize = 100;
    let epsilon = f64::EPSILON;
    let contr = 100.0 * epsilon;

    let mut psi = prelim_kepuni(dt, r0, sig0, mu, alpha, e0, contr).unwrap_or(dt / r0);

    for _ in 0..JMAX {
        let (s0, s1, s2, s3) = s_funct(psi, alpha);

        let fun = r0 * s1 + sig0 * s2 + mu * s3 - dt;
        let funp = r0 * s0 + sig0 * s1 + mu * s2;

        let dpsi = -fun / funp;

        if s3.abs() > 1e-2 / epsilon {
            return None;
        }

        let psi1 = psi + dpsi;
        psi = if psi1 * psi < 0.0 { psi / 2.0 } else { psi1 };

        if dpsi.abs() < contr || dpsi.abs() < contr * 10.0 * psi.abs() {
            let (s0, s1, s2, s3) = s_funct(psi, alpha);
            return Some((psi, s0, s1, s2, s3));
        }
    }

    None
}

/// Propagate a two-body state over `dt` using universal variables.
///
/// Arguments
/// ---------
/// * `position`, `velocity`: state relative to the attracting mass.
/// * `mu`: gravitational parameter `G·(m_central + m_body)`.
/// * `dt`: time step (may be negative).
///
/// Return
/// ------
/// * `Some((position, velocity))` after `dt`, or `None` if the universal Kepler
///   equation could not be solved.
pub fn kepler_drift(
    position: &Vector3<f64>,
    velocity: &Vector3<f64>,
    mu: f64,
    dt: f64,
) -> Option<(Vector3<f64>, Vector3<f64>)> {
    if dt == 0.0 {
        return Some((*position, *velocity));
    }

    let r0 = position.norm();
    let sig0 = position.dot(velocity);
    let alpha = velocity.norm_squared() - 2.0 * mu / r0;

    let ecc_vec = (velocity.norm_squared() / mu - 1.0 / r0) * position - (sig0 / mu) * velocity;
    let e0 = ecc_vec.norm();

    let (_psi, s0, s1, s2, s3) = solve_kepuni(dt, r0, sig0, mu, alpha, e0)?;

    let r = r0 * s0 + sig0 * s1 + mu * s2;
    let f = 1.0 - mu * s2 / r0;
    let g = dt - mu * s3;
    let fdot = -mu * s1 / (r0 * r);
    let gdot = 1.0 - mu * s2 / r;

    let new_position = f * position + g * velocity;
    let new_velocity = fdot * position + gdot * velocity;
    Some((new_position, new_velocity))
}
