use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use soulstat_report::{CATALOG, segment};
use std::hint::black_box;

fn generate_report(paragraphs_per_chapter: usize) -> String {
    let mut report = String::from("# Book of Destiny\n\n");
    for def in &CATALOG {
        report.push_str(&format!("## {} {}\n\n", def.glyph, def.title));
        for i in 0..paragraphs_per_chapter {
            report.push_str(&format!(
                "Paragraph {i}: the flow of qi bends like water around stone.\n\n"
            ));
        }
    }
    report
}

fn segment_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment");

    for paragraphs in [1, 10, 100] {
        let report = generate_report(paragraphs);
        group.bench_with_input(
            BenchmarkId::new("paragraphs_per_chapter", paragraphs),
            &report,
            |b, report| {
                b.iter(|| segment(black_box(report)));
            },
        );
    }

    group.finish();
}

fn segment_fallback(c: &mut Criterion) {
    let plain = "The spirits remained silent. ".repeat(1_000);
    c.bench_function("segment_fallback", |b| {
        b.iter(|| segment(black_box(&plain)));
    });
}

criterion_group!(benches, segment_bench, segment_fallback);
criterion_main!(benches);
