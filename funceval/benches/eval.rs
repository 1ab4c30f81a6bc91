use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use funceval::{
    fmax, metric_curve, seq_cm, term_cm, AnnotationKind, AnnotationSet, AvgMode, EvalConfig,
    MetricKind, Ontology, TermWeights,
};
use funceval_core::SparseMatrix;

fn random_uniform(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            (state >> 11) as f64 / (1u64 << 53) as f64
        })
        .collect()
}

/// Flat ontology with `n_terms` terms under a single root.
fn flat_ontology(n_terms: usize) -> Arc<Ontology> {
    let terms: Vec<String> = (0..n_terms).map(|t| format!("GO:{t:07}")).collect();
    let mut parents = vec![Vec::new(); n_terms];
    for p in parents.iter_mut().skip(1) {
        p.push(0);
    }
    Arc::new(Ontology::with_parents(terms, parents).unwrap())
}

/// Sparse random structure: each cell is stored with probability `density`.
fn random_set(
    ontology: &Arc<Ontology>,
    n_objects: usize,
    density: f64,
    kind: AnnotationKind,
    seed: u64,
) -> AnnotationSet {
    let n_terms = ontology.len();
    let coin = random_uniform(n_objects * n_terms, seed);
    let score = random_uniform(n_objects * n_terms, seed ^ 0x9e37_79b9);
    let (mut rows, mut cols, mut values) = (Vec::new(), Vec::new(), Vec::new());
    for i in 0..n_objects {
        for t in 0..n_terms {
            let k = i * n_terms + t;
            if t == 0 || coin[k] < density {
                rows.push(i);
                cols.push(t);
                values.push(match kind {
                    AnnotationKind::Binary => 1.0,
                    AnnotationKind::Score => score[k],
                });
            }
        }
    }
    let objects = (0..n_objects).map(|i| format!("P{i:05}")).collect();
    let matrix = SparseMatrix::from_triplets(rows, cols, values, n_objects, n_terms).unwrap();
    AnnotationSet::new(objects, ontology.clone(), matrix, kind).unwrap()
}

fn bench_term_cm(c: &mut Criterion) {
    let mut group = c.benchmark_group("term_cm");

    let go = flat_ontology(500);
    let truth = random_set(&go, 2_000, 0.02, AnnotationKind::Binary, 42);
    let pred = random_set(&go, 2_000, 0.05, AnnotationKind::Score, 7);
    let targets = truth.objects().to_vec();
    let config = EvalConfig::default();

    group.bench_function("2k_obj_500_terms", |b| {
        b.iter(|| term_cm(black_box(&targets), &pred, &truth, &config))
    });

    group.finish();
}

fn bench_seq_cm(c: &mut Criterion) {
    let mut group = c.benchmark_group("seq_cm");

    let go = flat_ontology(500);
    let truth = random_set(&go, 2_000, 0.02, AnnotationKind::Binary, 42);
    let pred = random_set(&go, 2_000, 0.05, AnnotationKind::Score, 7);
    let targets = truth.objects().to_vec();

    let config = EvalConfig::default();
    group.bench_function("2k_obj_500_terms", |b| {
        b.iter(|| seq_cm(black_box(&targets), &pred, &truth, &config))
    });

    let weighted = EvalConfig::default().with_weight(TermWeights::InformationAccretion);
    group.bench_function("2k_obj_500_terms_ia", |b| {
        b.iter(|| seq_cm(black_box(&targets), &pred, &truth, &weighted))
    });

    group.finish();
}

fn bench_averaging(c: &mut Criterion) {
    let mut group = c.benchmark_group("averaging");

    let go = flat_ontology(500);
    let truth = random_set(&go, 2_000, 0.02, AnnotationKind::Binary, 42);
    let pred = random_set(&go, 2_000, 0.05, AnnotationKind::Score, 7);
    let targets = truth.objects().to_vec();
    let config = EvalConfig::default();
    let result = seq_cm(&targets, &pred, &truth, &config).unwrap();
    let micro = config.clone().with_avg_mode(AvgMode::Micro);

    group.bench_function("macro_pr", |b| {
        b.iter(|| metric_curve(black_box(&result), MetricKind::PrecisionRecall, &config))
    });
    group.bench_function("micro_pr", |b| {
        b.iter(|| metric_curve(black_box(&result), MetricKind::PrecisionRecall, &micro))
    });
    group.bench_function("fmax", |b| b.iter(|| fmax(black_box(&result), &config)));

    group.finish();
}

criterion_group!(benches, bench_term_cm, bench_seq_cm, bench_averaging);
criterion_main!(benches);
