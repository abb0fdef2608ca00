//! Accelerations and potentials evaluated by the engine.
//!
//! Everything is computed in the inertial frame on the live particle list.
//! Optional forces are sourced by particle 0 and the reaction on the source is
//! applied so that total momentum is preserved.
use nalgebra::Vector3;

use crate::engine::{ForceModel, Particle};

/// Direct O(N²) point-mass gravity.
pub(crate) fn newtonian_accelerations(g: f64, particles: &[Particle]) -> Vec<Vector3<f64>> {
    let mut acc = vec![Vector3::zeros(); particles.len()];

    for i in 0..particles.len() {
        for j in (i + 1)..particles.len() {
            let dr = particles[j].position - particles[i].position;
            let r2 = dr.norm_squared();
            let inv_r3 = 1.0 / (r2 * r2.sqrt());

            acc[i] += g * particles[j].mass * inv_r3 * dr;
            acc[j] -= g * particles[i].mass * inv_r3 * dr;
        }
    }
    acc
}

/// Newtonian potential energy `−Σ G·m_i·m_j / r_ij`.
pub(crate) fn newtonian_potential(g: f64, particles: &[Particle]) -> f64 {
    let mut pot = 0.0;
    for i in 0..particles.len() {
        for j in (i + 1)..particles.len() {
            let r = (particles[j].position - particles[i].position).norm();
            pot -= g * particles[i].mass * particles[j].mass / r;
        }
    }
    pot
}

/// Add the accelerations of an optional force to `acc`.
pub(crate) fn add_force_accelerations(
    force: &ForceModel,
    g: f64,
    particles: &[Particle],
    acc: &mut [Vector3<f64>],
) {
    let Some((source, others)) = particles.split_first() else {
        return;
    };
    let gm = g * source.mass;

    for (k, p) in others.iter().enumerate() {
        let i = k + 1;
        let dr = p.position - source.position;
        let r2 = dr.norm_squared();

        let a = match *force {
            ForceModel::GeneralRelativity { c } => {
                // a = −6 (GM)² r / (c² r⁴)
                -6.0 * gm * gm / (c * c * r2 * r2) * dr
            }
            ForceModel::SolarOblateness { j2, radius } => {
                let r = r2.sqrt();
                let z2_r2 = dr.z * dr.z / r2;
                let prefac = -1.5 * j2 * gm * radius * radius / (r2 * r2 * r);
                Vector3::new(
                    prefac * dr.x * (1.0 - 5.0 * z2_r2),
                    prefac * dr.y * (1.0 - 5.0 * z2_r2),
                    prefac * dr.z * (3.0 - 5.0 * z2_r2),
                )
            }
        };

        acc[i] += a;
        if source.mass > 0.0 {
            acc[0] -= p.mass / source.mass * a;
        }
    }
}

/// Potential energy associated with an optional force.
pub(crate) fn force_potential(force: &ForceModel, g: f64, particles: &[Particle]) -> f64 {
    let Some((source, others)) = particles.split_first() else {
        return 0.0;
    };
    let gm = g * source.mass;

    others
        .iter()
        .map(|p| {
            let dr = p.position - source.position;
            let r2 = dr.norm_squared();
            match *force {
                ForceModel::GeneralRelativity { c } => -3.0 * gm * gm * p.mass / (c * c * r2),
                ForceModel::SolarOblateness { j2, radius } => {
                    let r3 = r2 * r2.sqrt();
                    gm * p.mass * j2 * radius * radius * (3.0 * dr.z * dr.z / r2 - 1.0)
                        / (2.0 * r3)
                }
            }
        })
        .sum()
}

#[cfg(test)]
mod forces_test {
    use super::*;
    use crate::constants::GRAV_CONSTANT;
    use approx::assert_relative_eq;

    fn particle(mass: f64, position: Vector3<f64>) -> Particle {
        Particle {
            mass,
            position,
            velocity: Vector3::zeros(),
        }
    }

    fn total_momentum_rate(particles: &[Particle], acc: &[Vector3<f64>]) -> Vector3<f64> {
        particles
            .iter()
            .zip(acc)
            .map(|(p, a)| p.mass * a)
            .sum()
    }

    #[test]
    fn test_newtonian_two_body() {
        let particles = [
            particle(1.0, Vector3::zeros()),
            particle(1e-3, Vector3::new(2.0, 0.0, 0.0)),
        ];
        let acc = newtonian_accelerations(GRAV_CONSTANT, &particles);
        assert_relative_eq!(acc[1].x, -GRAV_CONSTANT / 4.0, max_relative = 1e-14);
        assert_relative_eq!(acc[0].x, GRAV_CONSTANT * 1e-3 / 4.0, max_relative = 1e-14);
        assert_relative_eq!(
            newtonian_potential(GRAV_CONSTANT, &particles),
            -GRAV_CONSTANT * 1e-3 / 2.0,
            max_relative = 1e-14
        );
    }

    #[test]
    fn test_optional_forces_conserve_momentum() {
        let particles = [
            particle(1.0, Vector3::new(0.01, 0.0, 0.0)),
            particle(1e-3, Vector3::new(1.0, 0.5, 0.3)),
            particle(2e-4, Vector3::new(-3.0, 0.2, -0.4)),
        ];
        for force in [
            ForceModel::GeneralRelativity { c: 100.0 },
            ForceModel::SolarOblateness {
                j2: 1e-3,
                radius: 0.1,
            },
        ] {
            let mut acc = vec![Vector3::zeros(); particles.len()];
            add_force_accelerations(&force, GRAV_CONSTANT, &particles, &mut acc);
            assert!(total_momentum_rate(&particles, &acc).norm() < 1e-18);
            assert!(acc[1].norm() > 0.0);
        }
    }

    #[test]
    fn test_force_acceleration_is_potential_gradient() {
        let force = ForceModel::SolarOblateness {
            j2: 1e-3,
            radius: 0.1,
        };
        let base = Vector3::new(0.8, -0.3, 0.4);
        let h = 1e-6;

        let mut acc = vec![Vector3::zeros(); 2];
        let particles = [particle(1.0, Vector3::zeros()), particle(1.0, base)];
        add_force_accelerations(&force, GRAV_CONSTANT, &particles, &mut acc);

        for axis in 0..3 {
            let mut plus = base;
            let mut minus = base;
            plus[axis] += h;
            minus[axis] -= h;
            let pot = |pos| {
                force_potential(
                    &force,
                    GRAV_CONSTANT,
                    &[particle(1.0, Vector3::zeros()), particle(1.0, pos)],
                )
            };
            let grad = (pot(plus) - pot(minus)) / (2.0 * h);
            assert_relative_eq!(acc[1][axis], -grad, max_relative = 1e-6);
        }
    }
}
