use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use solar_flyby::constants::MU_SUN;
use solar_flyby::kepler::{kepler_drift, solve_kepler_equation};
use solar_flyby::orbit_type::state_vector::elements_to_state;

/// Uniform random in [0, 2π)
#[inline]
fn rand_angle(rng: &mut StdRng) -> f64 {
    rng.random::<f64>() * std::f64::consts::TAU
}

fn bench_eccentricity_range(c: &mut Criterion, name: &str, seed: u64, e_min: f64, e_max: f64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let samples = 10_000usize;

    c.bench_function(name, |b| {
        b.iter_batched(
            || {
                // Pre-generate inputs to avoid RNG cost in the timed section
                (0..samples)
                    .map(|_| (rand_angle(&mut rng), rng.random_range(e_min..=e_max)))
                    .collect::<Vec<_>>()
            },
            |cases| {
                for (mean_anomaly, e) in cases {
                    let sol = solve_kepler_equation(black_box(mean_anomaly), black_box(e));
                    black_box(sol);
                }
            },
            BatchSize::LargeInput,
        )
    });
}

/// Typical regime: e ∈ [0.0, 0.7]
fn bench_typical(c: &mut Criterion) {
    bench_eccentricity_range(c, "solve_kepler_equation/typical_e<=0.7", 0xDEADBEEF, 0.0, 0.7);
}

/// High eccentricity, switches to the E₀ = π start: e ∈ [0.8, 0.99]
fn bench_high_e(c: &mut Criterion) {
    bench_eccentricity_range(c, "solve_kepler_equation/high_e_0.8..0.99", 0xBADF00D, 0.8, 0.99);
}

/// One Wisdom–Holman half step for an Earth-like orbit.
fn bench_kepler_drift(c: &mut Criterion) {
    let state = elements_to_state(1.0, 0.0167, 0.0, 0.0, 1.8, 0.3, MU_SUN);

    c.bench_function("kepler_drift/earth_half_step", |b| {
        b.iter(|| {
            let out = kepler_drift(
                black_box(&state.position),
                black_box(&state.velocity),
                MU_SUN,
                black_box(0.005),
            );
            black_box(out.map(|(r, _): (Vector3<f64>, _)| r));
        })
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_typical, bench_high_e, bench_kepler_drift
);
criterion_main!(benches);
