use std::collections::HashSet;

use nalgebra::Vector3;

use crate::{
    engine::{
        forces::{add_force_accelerations, force_potential, newtonian_accelerations, newtonian_potential},
        ForceKind, ForceModel, Particle, PhysicsEngine,
    },
    flyby_errors::{FlybyError, Result},
    kepler::kepler_drift,
};

/// Maximum number of times a failing Kepler drift is split in halves.
const MAX_DRIFT_SPLIT: u32 = 8;

/// Fixed-step Wisdom–Holman mapping in Jacobi coordinates.
///
/// Each step is a drift-kick-drift composition:
///
/// 1. every Jacobi coordinate `i ≥ 1` follows a Keplerian orbit around the mass
///    `η_i = Σ_{k≤i} m_k` for `dt/2`, the Jacobi centre of mass drifts linearly,
/// 2. the velocities receive the interaction kick: inertial accelerations (gravity plus
///    registered forces) transformed to Jacobi coordinates, minus the Keplerian part
///    already accounted for by the drift,
/// 3. a second half drift.
///
/// The Keplerian drift uses the universal-variable solver of [`kepler_drift`], so any
/// conic section is handled. For an isolated two-body system the kick vanishes and the
/// mapping is exact to round-off.
///
/// Bodies are expected in hierarchical order, the most massive first. Satellites listed
/// after their primary (the Moon) are treated in the interaction part and require a
/// step small compared to their orbital period.
#[derive(Debug, Clone)]
pub struct WisdomHolman {
    g: f64,
    dt: f64,
    time: f64,
    particles: Vec<Particle>,
    forces: Vec<ForceModel>,
    supported: HashSet<ForceKind>,
}

impl WisdomHolman {
    /// Build an empty engine supporting every [`ForceModel`].
    ///
    /// Arguments
    /// ---------
    /// * `g`: gravitational constant (AU³ Msun⁻¹ yr⁻²).
    /// * `dt`: maximum internal step (yr). The last step of an `integrate_to` call is
    ///   shortened to land exactly on the requested time.
    pub fn new(g: f64, dt: f64) -> Self {
        Self::with_supported_forces(
            g,
            dt,
            &[ForceKind::GeneralRelativity, ForceKind::SolarOblateness],
        )
    }

    /// Build an engine that only accepts the listed optional forces.
    pub fn with_supported_forces(g: f64, dt: f64, supported: &[ForceKind]) -> Self {
        WisdomHolman {
            g,
            dt: dt.abs(),
            time: 0.0,
            particles: Vec::new(),
            forces: Vec::new(),
            supported: supported.iter().copied().collect(),
        }
    }

    /// Internal step (yr).
    pub fn step_size(&self) -> f64 {
        self.dt
    }

    /// Optional forces currently registered.
    pub fn forces(&self) -> &[ForceModel] {
        &self.forces
    }

    fn masses(&self) -> Vec<f64> {
        self.particles.iter().map(|p| p.mass).collect()
    }

    fn accelerations(&self) -> Vec<Vector3<f64>> {
        let mut acc = newtonian_accelerations(self.g, &self.particles);
        for force in &self.forces {
            add_force_accelerations(force, self.g, &self.particles, &mut acc);
        }
        acc
    }

    fn step(&mut self, h: f64) -> Result<()> {
        let masses = self.masses();
        let (mut rj, mut vj) = to_jacobi(&masses, &self.particles);

        self.drift(&masses, &mut rj, &mut vj, h / 2.0)?;
        self.sync_positions(&masses, &rj);

        let acc = self.accelerations();
        let aj = inertial_to_jacobi(&masses, &acc);
        let mut eta = masses[0];
        for i in 1..masses.len() {
            eta += masses[i];
            let r = rj[i].norm();
            let kepler_term = self.g * eta / (r * r * r) * rj[i];
            vj[i] += h * (aj[i] + kepler_term);
        }

        self.drift(&masses, &mut rj, &mut vj, h / 2.0)?;
        self.particles = from_jacobi(&masses, &rj, &vj);
        Ok(())
    }

    fn drift(
        &self,
        masses: &[f64],
        rj: &mut [Vector3<f64>],
        vj: &mut [Vector3<f64>],
        h: f64,
    ) -> Result<()> {
        rj[0] += h * vj[0];
        let mut eta = masses[0];
        for i in 1..masses.len() {
            eta += masses[i];
            let (r, v) = split_drift(&rj[i], &vj[i], self.g * eta, h, MAX_DRIFT_SPLIT)?;
            rj[i] = r;
            vj[i] = v;
        }
        Ok(())
    }

    fn sync_positions(&mut self, masses: &[f64], rj: &[Vector3<f64>]) {
        let positions = jacobi_to_inertial(masses, rj);
        for (p, r) in self.particles.iter_mut().zip(positions) {
            p.position = r;
        }
    }
}

fn split_drift(
    position: &Vector3<f64>,
    velocity: &Vector3<f64>,
    mu: f64,
    h: f64,
    depth: u32,
) -> Result<(Vector3<f64>, Vector3<f64>)> {
    if let Some(state) = kepler_drift(position, velocity, mu, h) {
        return Ok(state);
    }
    if depth == 0 {
        return Err(FlybyError::KeplerDriftFailed { dt: h });
    }
    let (r, v) = split_drift(position, velocity, mu, h / 2.0, depth - 1)?;
    split_drift(&r, &v, mu, h / 2.0, depth - 1)
}

/// Jacobi transform of a set of vectors: entry `i ≥ 1` is relative to the centre of
/// mass of bodies `0..i`, entry 0 is the total centre of mass.
fn inertial_to_jacobi(masses: &[f64], vectors: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
    let mut out = vec![Vector3::zeros(); vectors.len()];
    if vectors.is_empty() {
        return out;
    }

    let mut eta = masses[0];
    let mut weighted = masses[0] * vectors[0];
    for i in 1..vectors.len() {
        out[i] = vectors[i] - weighted / eta;
        weighted += masses[i] * vectors[i];
        eta += masses[i];
    }
    out[0] = weighted / eta;
    out
}

/// Inverse of [`inertial_to_jacobi`].
fn jacobi_to_inertial(masses: &[f64], jacobi: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
    let mut out = vec![Vector3::zeros(); jacobi.len()];
    if jacobi.is_empty() {
        return out;
    }

    let mut eta: f64 = masses.iter().sum();
    // centre of mass of bodies 0..=i, walking down from the full system
    let mut com = jacobi[0];
    for i in (1..jacobi.len()).rev() {
        let inner = com - masses[i] / eta * jacobi[i];
        out[i] = jacobi[i] + inner;
        com = inner;
        eta -= masses[i];
    }
    out[0] = com;
    out
}

fn to_jacobi(masses: &[f64], particles: &[Particle]) -> (Vec<Vector3<f64>>, Vec<Vector3<f64>>) {
    let positions: Vec<_> = particles.iter().map(|p| p.position).collect();
    let velocities: Vec<_> = particles.iter().map(|p| p.velocity).collect();
    (
        inertial_to_jacobi(masses, &positions),
        inertial_to_jacobi(masses, &velocities),
    )
}

fn from_jacobi(masses: &[f64], rj: &[Vector3<f64>], vj: &[Vector3<f64>]) -> Vec<Particle> {
    jacobi_to_inertial(masses, rj)
        .into_iter()
        .zip(jacobi_to_inertial(masses, vj))
        .zip(masses)
        .map(|((position, velocity), &mass)| Particle {
            mass,
            position,
            velocity,
        })
        .collect()
}

impl PhysicsEngine for WisdomHolman {
    fn add_body(&mut self, mass: f64, position: Vector3<f64>, velocity: Vector3<f64>) {
        self.particles.push(Particle {
            mass,
            position,
            velocity,
        });
    }

    fn integrate_to(&mut self, t: f64) -> Result<()> {
        if self.particles.len() < 2 || self.dt == 0.0 {
            self.time = t;
            return Ok(());
        }

        let tolerance = self.dt * 1e-9;
        loop {
            let remaining = t - self.time;
            if remaining.abs() <= tolerance {
                break;
            }
            let h = remaining.signum() * remaining.abs().min(self.dt);
            self.step(h)?;
            self.time += h;
        }
        Ok(())
    }

    fn time(&self) -> f64 {
        self.time
    }

    fn particles(&self) -> &[Particle] {
        &self.particles
    }

    fn gravitational_constant(&self) -> f64 {
        self.g
    }

    fn energy(&self) -> f64 {
        let kinetic: f64 = self
            .particles
            .iter()
            .map(|p| 0.5 * p.mass * p.velocity.norm_squared())
            .sum();
        let extra: f64 = self
            .forces
            .iter()
            .map(|f| force_potential(f, self.g, &self.particles))
            .sum();
        kinetic + newtonian_potential(self.g, &self.particles) + extra
    }

    fn angular_momentum(&self) -> Vector3<f64> {
        self.particles
            .iter()
            .map(|p| p.mass * p.position.cross(&p.velocity))
            .sum()
    }

    fn move_to_com(&mut self) {
        let total: f64 = self.masses().iter().sum();
        if total <= 0.0 {
            return;
        }
        let com_r = self
            .particles
            .iter()
            .map(|p| p.mass * p.position)
            .sum::<Vector3<f64>>()
            / total;
        let com_v = self
            .particles
            .iter()
            .map(|p| p.mass * p.velocity)
            .sum::<Vector3<f64>>()
            / total;
        for p in self.particles.iter_mut() {
            p.position -= com_r;
            p.velocity -= com_v;
        }
    }

    fn add_force(&mut self, force: ForceModel) -> Result<()> {
        if !self.supported.contains(&force.kind()) {
            return Err(FlybyError::OptionalForceUnavailable(force));
        }
        self.forces.retain(|f| f.kind() != force.kind());
        self.forces.push(force);
        Ok(())
    }
}

#[cfg(test)]
mod whfast_test {
    use super::*;
    use crate::constants::{C_AU_PER_YR, DPI, EARTH_MASS, GRAV_CONSTANT, J2_SUN_DEFAULT, R_SUN_AU};
    use crate::engine::try_add_force;
    use approx::assert_relative_eq;

    fn sun_earth(dt: f64) -> WisdomHolman {
        let mut engine = WisdomHolman::new(GRAV_CONSTANT, dt);
        engine.add_body(1.0, Vector3::zeros(), Vector3::zeros());
        engine.add_body(
            EARTH_MASS,
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, DPI, 0.0),
        );
        engine.move_to_com();
        engine
    }

    #[test]
    fn test_jacobi_round_trip() {
        let masses = [1.0, 1e-3, 3e-6, 0.0];
        let vectors = [
            Vector3::new(0.01, -0.02, 0.0),
            Vector3::new(5.2, 0.1, -0.1),
            Vector3::new(-1.0, 0.3, 0.02),
            Vector3::new(30.0, 2.0, 1.0),
        ];
        let back = jacobi_to_inertial(&masses, &inertial_to_jacobi(&masses, &vectors));
        for (a, b) in vectors.iter().zip(&back) {
            assert_relative_eq!(*a, *b, epsilon = 1e-13);
        }
    }

    #[test]
    fn test_move_to_com() {
        let engine = sun_earth(0.01);
        let momentum: Vector3<f64> = engine
            .particles()
            .iter()
            .map(|p| p.mass * p.velocity)
            .sum();
        assert!(momentum.norm() < 1e-18);
    }

    #[test]
    fn test_two_body_conservation() {
        let mut engine = sun_earth(0.01);
        let e0 = engine.energy();
        let l0 = engine.angular_momentum().norm();

        engine.integrate_to(10.0).unwrap();

        assert_relative_eq!(engine.time(), 10.0, epsilon = 1e-9);
        assert!(((engine.energy() - e0) / e0).abs() < 1e-11);
        assert!(((engine.angular_momentum().norm() - l0) / l0).abs() < 1e-11);
    }

    #[test]
    fn test_integrate_lands_on_target() {
        let mut engine = sun_earth(0.1);
        engine.integrate_to(0.25).unwrap();
        assert_relative_eq!(engine.time(), 0.25, epsilon = 1e-12);

        // a quarter of the orbit: Earth close to +Y
        let earth = engine.particles()[1].position - engine.particles()[0].position;
        assert_relative_eq!(earth.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(earth.y, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_backward_integration_restores_state() {
        let mut engine = sun_earth(0.01);
        let start = engine.particles()[1];
        engine.integrate_to(1.3).unwrap();
        engine.integrate_to(0.0).unwrap();
        assert_relative_eq!(engine.particles()[1].position, start.position, epsilon = 1e-10);
    }

    #[test]
    fn test_three_body_energy_bounded() {
        let mut engine = WisdomHolman::new(GRAV_CONSTANT, 0.01);
        engine.add_body(1.0, Vector3::zeros(), Vector3::zeros());
        engine.add_body(
            EARTH_MASS,
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, DPI, 0.0),
        );
        let v_jup = DPI / 5.2_f64.sqrt();
        engine.add_body(
            9.5e-4,
            Vector3::new(0.0, 5.2, 0.0),
            Vector3::new(-v_jup, 0.0, 0.0),
        );
        engine.move_to_com();
        let e0 = engine.energy();

        engine.integrate_to(20.0).unwrap();
        assert!(((engine.energy() - e0) / e0).abs() < 1e-6);
    }

    #[test]
    fn test_optional_forces_registration() {
        let mut engine = sun_earth(0.01);
        let gr = ForceModel::GeneralRelativity { c: C_AU_PER_YR };
        engine.add_force(gr).unwrap();
        engine
            .add_force(ForceModel::SolarOblateness {
                j2: J2_SUN_DEFAULT,
                radius: R_SUN_AU,
            })
            .unwrap();
        // registering again replaces the previous instance
        engine.add_force(gr).unwrap();
        assert_eq!(engine.forces().len(), 2);

        let e0 = engine.energy();
        engine.integrate_to(2.0).unwrap();
        assert!(((engine.energy() - e0) / e0).abs() < 1e-8);
    }

    #[test]
    fn test_unsupported_force() {
        let mut engine =
            WisdomHolman::with_supported_forces(GRAV_CONSTANT, 0.01, &[ForceKind::SolarOblateness]);
        let gr = ForceModel::GeneralRelativity { c: C_AU_PER_YR };

        assert_eq!(
            engine.add_force(gr),
            Err(FlybyError::OptionalForceUnavailable(gr))
        );
        assert!(!try_add_force(&mut engine, gr).unwrap());
        assert!(engine.forces().is_empty());
    }
}
