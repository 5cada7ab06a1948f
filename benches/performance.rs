//! Performance benchmarks for vela.
//!
//! Run with: cargo bench
//!
//! Target performance:
//! - Ranking 500 candidates: < 5ms
//! - Empty-query pass-through: < 100us

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vela::config::ScoringConfig;
use vela::core::matcher::Matcher;
use vela::core::result::{Candidate, ResultKind};

fn synthetic_candidates(count: usize) -> Vec<Candidate> {
    (0..count)
        .map(|i| {
            let kind = match i % 4 {
                0 => ResultKind::App,
                1 => ResultKind::File,
                2 => ResultKind::Bookmark,
                _ => ResultKind::History,
            };
            Candidate::new(
                format!("item-{i}"),
                format!("Application {i} - Test Entry for Benchmarking"),
                kind,
            )
            .with_frequency((i % 100) as f64)
        })
        .collect()
}

/// Benchmark the primary matching pass across query shapes.
fn bench_rank_queries(c: &mut Criterion) {
    let matcher = Matcher::new(ScoringConfig::default());
    let candidates = synthetic_candidates(500);

    let queries = ["app", "test", "application 50", "bench"];

    let mut group = c.benchmark_group("rank_queries");

    for query in queries {
        group.bench_with_input(BenchmarkId::from_parameter(query), &query, |b, query| {
            b.iter(|| black_box(matcher.rank(black_box(&candidates), query, 100)))
        });
    }

    group.finish();
}

/// Benchmark ranking against growing candidate sets.
fn bench_rank_candidate_counts(c: &mut Criterion) {
    let matcher = Matcher::new(ScoringConfig::default());

    let mut group = c.benchmark_group("rank_candidate_counts");

    for count in [100, 500, 2000] {
        let candidates = synthetic_candidates(count);
        group.bench_with_input(
            BenchmarkId::from_parameter(count),
            &candidates,
            |b, candidates| b.iter(|| black_box(matcher.rank(candidates, "appl", 100))),
        );
    }

    group.finish();
}

/// Benchmark the fallback heuristics (initials and subsequence matching).
fn bench_fallback_heuristics(c: &mut Criterion) {
    let matcher = Matcher::new(ScoringConfig::default());

    // Multiword titles where short queries only land via initials or an
    // ordered subsequence.
    let candidates: Vec<Candidate> = (0..300)
        .map(|i| {
            Candidate::new(
                format!("tool-{i}"),
                format!("Video Lan Client {i}"),
                ResultKind::App,
            )
        })
        .collect();

    c.bench_function("fallback_initials", |b| {
        b.iter(|| black_box(matcher.rank(black_box(&candidates), "vlc", 100)))
    });
}

/// Benchmark the empty-query pass-through path.
fn bench_empty_query(c: &mut Criterion) {
    let matcher = Matcher::new(ScoringConfig::default());
    let candidates = synthetic_candidates(1000);

    c.bench_function("empty_query_passthrough", |b| {
        b.iter(|| black_box(matcher.rank(black_box(&candidates), "", 100)))
    });
}

criterion_group!(
    benches,
    bench_rank_queries,
    bench_rank_candidate_counts,
    bench_fallback_heuristics,
    bench_empty_query,
);

criterion_main!(benches);
