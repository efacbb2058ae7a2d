use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use suffixient::suffixient_index::{BuildConfig, SuffixientIndex};
use suffixient::suffixient_set::{build_suffixient_set, NaiveSaLcpBwtSource};

fn generate_text(size: usize) -> Vec<u8> {
    let words = [
        "the ", "quick ", "brown ", "fox ", "jumps ", "over ", "lazy ", "dog ", "alice ", "bob ",
        "server ", "request ", "response ", "error ", "data ", "cache ", "index ", "search ",
        "query ", "result ",
    ];
    let mut text = Vec::with_capacity(size);
    let mut i = 0;
    while text.len() < size {
        let word = words[i % words.len()].as_bytes();
        text.extend_from_slice(word);
        i += 1;
    }
    text.truncate(size);
    text
}

fn bench_build_suffixient_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_suffixient_set");

    for size in [1_000, 5_000, 20_000] {
        let text = generate_text(size);
        group.bench_with_input(BenchmarkId::new("bytes", size), &text, |b, text| {
            b.iter(|| {
                let source = NaiveSaLcpBwtSource::build(black_box(text));
                build_suffixient_set(&source, 128)
            })
        });
    }
    group.finish();
}

fn bench_build_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_index");

    for size in [1_000, 5_000, 20_000] {
        let text = generate_text(size);
        let source = NaiveSaLcpBwtSource::build(&text);
        let positions = build_suffixient_set(&source, 128);

        group.bench_with_input(
            BenchmarkId::new("bytes", size),
            &(text, positions),
            |b, (text, positions)| {
                b.iter(|| {
                    SuffixientIndex::build_plain(
                        black_box(text),
                        black_box(positions),
                        &BuildConfig::default(),
                    )
                    .unwrap()
                })
            },
        );
    }
    group.finish();
}

fn bench_find_mems(c: &mut Criterion) {
    let text = generate_text(20_000);
    let source = NaiveSaLcpBwtSource::build(&text);
    let positions = build_suffixient_set(&source, 128);
    let index = SuffixientIndex::build_plain(&text, &positions, &BuildConfig::default()).unwrap();

    let mut group = c.benchmark_group("find_mems");

    for pattern in ["fox", "the quick", "server request response"] {
        group.bench_with_input(
            BenchmarkId::new("pattern", pattern),
            pattern.as_bytes(),
            |b, pat| b.iter(|| index.find_mems(black_box(pat)).unwrap()),
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_build_suffixient_set,
    bench_build_index,
    bench_find_mems,
);
criterion_main!(benches);
