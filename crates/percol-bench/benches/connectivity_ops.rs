//! Criterion micro-benchmarks for the connectivity engine: full rebuild,
//! incremental activation, and cluster extraction on the 512-site
//! reference lattice.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use percol_bench::{reference_config, reference_lattice};
use percol_core::SiteId;
use percol_sim::{Occupancy, Percolator, SpeciesClasses};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

fn bench_rebuild(c: &mut Criterion) {
    let (lattice, species) = reference_lattice();
    let config = reference_config();
    let classes = SpeciesClasses::from_config(&config, &species).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let occupancy = Occupancy::sample(&lattice, &config, &species, &mut rng).unwrap();
    let mut engine = Percolator::new(Arc::clone(&lattice), classes);

    c.bench_function("rebuild_512_sites", |b| {
        b.iter(|| {
            engine.rebuild(black_box(&occupancy));
            black_box(engine.active_bond_count())
        })
    });
}

fn bench_incremental_activation(c: &mut Criterion) {
    let (lattice, species) = reference_lattice();
    let config = reference_config();
    let classes = SpeciesClasses::from_config(&config, &species).unwrap();
    let li = species.get("Li").unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let base = Occupancy::sample(&lattice, &config, &species, &mut rng).unwrap();
    let mut engine = Percolator::new(Arc::clone(&lattice), classes);

    // activate 8 fresh sites per iteration against a rebuilt baseline
    let targets: Vec<SiteId> = (0..8u32).map(|i| SiteId(i * 61 % 512)).collect();
    c.bench_function("activate_8_of_512", |b| {
        b.iter(|| {
            engine.rebuild(&base);
            let mut occupancy = base.clone();
            for &site in &targets {
                occupancy.set(site, li);
            }
            black_box(engine.update(black_box(&occupancy), &targets))
        })
    });
}

fn bench_cluster_extraction(c: &mut Criterion) {
    let (lattice, species) = reference_lattice();
    let config = reference_config();
    let classes = SpeciesClasses::from_config(&config, &species).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let occupancy = Occupancy::sample(&lattice, &config, &species, &mut rng).unwrap();
    let mut engine = Percolator::new(lattice, classes);
    engine.rebuild(&occupancy);

    c.bench_function("clusters_512_sites", |b| {
        b.iter(|| black_box(engine.clusters()).len())
    });
}

criterion_group!(
    benches,
    bench_rebuild,
    bench_incremental_activation,
    bench_cluster_extraction
);
criterion_main!(benches);
