// In hijet-core/benches/event_bench.rs

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use hijet::background::CsSubtractor;
use hijet::clustering::{ClusterSequence, GhostedAreaSpec, JetDefinition};
use hijet::config::HiJetConfig;
use hijet::event::{EventInput, EventProcessor};
use hijet::matching::JetMatcher;
use hijet::types::{Jet, Origin, Particle};

// --- Toy event generation ---

/// A soft thermal-like background over |y| < `rap_max` plus one hard
/// two-prong signal jet.
fn generate_event(n_background: usize, rap_max: f64, seed: u64) -> EventInput {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut particles: Vec<Particle> = (0..n_background)
        .map(|_| {
            let pt = -0.7 * (1.0 - rng.random::<f64>()).ln();
            let y = rng.random_range(-rap_max..rap_max);
            let phi = rng.random_range(0.0..std::f64::consts::TAU);
            Particle::massless(pt, y, phi, Origin::Background)
        })
        .collect();
    particles.push(Particle::massless(60.0, 0.1, 1.0, Origin::Signal));
    particles.push(Particle::massless(25.0, 0.2, 1.15, Origin::Signal));
    EventInput::new(particles)
}

/// Jets scattered around the detector with a small smear per copy, so that
/// matching sees realistic near-neighbours.
fn generate_jets(n_jets: usize, smear: f64, seed: u64) -> Vec<Jet> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n_jets)
        .map(|k| {
            let y = -2.0 + 4.0 * (k as f64 + 0.5) / n_jets as f64 + rng.random_range(-smear..smear);
            let phi = (k as f64 * 2.399).rem_euclid(std::f64::consts::TAU);
            let pt = rng.random_range(10.0..100.0);
            Jet::from_constituents(vec![Particle::massless(pt, y, phi, Origin::Background)], 0.5)
        })
        .collect()
}

fn bench_config() -> HiJetConfig {
    let mut config = HiJetConfig::default();
    config.ghost.ghost_rap_max = 1.5;
    config.ghost.ghost_area = 0.02;
    config.jet_rap_max = 1.0;
    config
}

// --- Benchmark Suite ---

fn bench_clustering(c: &mut Criterion) {
    let event = generate_event(400, 1.5, 3);
    let reduced = GhostedAreaSpec::new(1.5, 0.02);
    let full = GhostedAreaSpec::new(6.0, 0.005);

    let mut group = c.benchmark_group("Clustering");
    group.sample_size(10);

    group.bench_function("anti-kt R=0.4, no ghosts (400 particles)", |b| {
        b.iter(|| black_box(ClusterSequence::new(black_box(&event.particles), JetDefinition::anti_kt(0.4), None).unwrap()))
    });
    group.bench_function("anti-kt R=0.4, ghosts |y|<1.5 area 0.02", |b| {
        b.iter(|| {
            black_box(ClusterSequence::new(black_box(&event.particles), JetDefinition::anti_kt(0.4), Some(&reduced)).unwrap())
        })
    });
    group.bench_function("kt R=0.4, ghosts |y|<6 area 0.005", |b| {
        b.iter(|| black_box(ClusterSequence::new(black_box(&event.particles), JetDefinition::kt(0.4), Some(&full)).unwrap()))
    });

    group.finish();
}

fn bench_matching(c: &mut Criterion) {
    let matcher = JetMatcher::new(0.4).unwrap();
    let base = generate_jets(60, 0.05, 5);
    let tag = generate_jets(40, 0.05, 6);

    let mut group = c.benchmark_group("Matching");
    group.bench_function("Greedy dR (60 base x 40 tag)", |b| {
        b.iter(|| black_box(matcher.match_jets(black_box(&base), black_box(&tag))))
    });
    group.finish();
}

fn bench_event(c: &mut Criterion) {
    let config = bench_config();
    let processor = EventProcessor::new(&config).unwrap();
    let subtractor = CsSubtractor::new(&config).unwrap();
    let event = generate_event(400, 1.5, 7);

    let default_processor = EventProcessor::new(&HiJetConfig::default()).unwrap();
    let wide_event = generate_event(2000, 3.0, 11);

    let mut group = c.benchmark_group("Event Processing");
    group.sample_size(10);

    group.bench_function("Constituent subtraction (400 particles)", |b| {
        b.iter(|| black_box(subtractor.do_subtraction(black_box(&event.particles)).unwrap()))
    });
    group.bench_function("Full event (400 particles)", |b| {
        b.iter(|| black_box(processor.process(black_box(&event)).unwrap()))
    });
    group.bench_function("Full event, default config (2000 particles)", |b| {
        b.iter(|| black_box(default_processor.process(black_box(&wide_event)).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_clustering, bench_matching, bench_event);
criterion_main!(benches);
