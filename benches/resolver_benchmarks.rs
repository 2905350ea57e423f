//! # muse-voice Performance Benchmarks
//!
//! Transcripts are resolved on every final result while a session is open,
//! so normalization and resolution should stay well under a millisecond.
//!
//! ## Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Run a specific group
//! cargo bench resolver
//! cargo bench normalizer
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use muse_voice::config::{FuzzyPolicy, ResolverConfig};
use muse_voice::normalizer::WakeWord;
use muse_voice::registry::CommandRegistry;
use muse_voice::resolver::Resolver;
use std::hint::black_box;

/// One transcript per resolution path.
const TRANSCRIPTS: [(&str, &str); 6] = [
    ("exact", "next song"),
    ("search", "play believer by imagine dragons"),
    ("numeric", "set the volume to 85 please"),
    ("fuzzy", "could you turn up the volume"),
    ("filler", "play music"),
    ("unmatched", "the quick brown fox jumps over the lazy dog"),
];

fn resolver(policy: FuzzyPolicy) -> Resolver {
    let config = ResolverConfig {
        fuzzy_policy: policy,
        ..ResolverConfig::default()
    };
    Resolver::new(CommandRegistry::with_default_commands(), &config)
}

fn benchmark_resolver(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolver");

    for (name, policy) in [("first_match", FuzzyPolicy::FirstMatch), ("most_specific", FuzzyPolicy::MostSpecific)] {
        let resolver = resolver(policy);
        for (kind, transcript) in TRANSCRIPTS {
            group.bench_with_input(BenchmarkId::new(name, kind), &transcript, |b, transcript| {
                b.iter(|| resolver.resolve(black_box(transcript)))
            });
        }
    }

    group.bench_function("registry_build", |b| {
        b.iter(CommandRegistry::with_default_commands)
    });

    group.finish();
}

fn benchmark_normalizer(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalizer");
    let wake = WakeWord::new("computer").expect("valid wake word");

    group.bench_function("detect_hit", |b| {
        b.iter(|| wake.detect(black_box("okay computer what's playing")))
    });
    group.bench_function("detect_miss", |b| {
        b.iter(|| wake.detect(black_box("and then the chorus comes in again")))
    });
    group.bench_function("normalize", |b| {
        b.iter(|| wake.normalize(black_box("Hey Computer   play the one")))
    });

    group.finish();
}

criterion_group!(benches, benchmark_resolver, benchmark_normalizer);
criterion_main!(benches);
