//! Benchmarks for template matching and instantiation.
//!
//! - Compilation: building templates, cold and through [`TemplateCache`]
//! - Matching: scanning whole files for matches
//! - Instantiation: rendering, attributing and splicing
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use jtemplate::{Coordinates, JavaTemplate, SourceFile, TemplateCache};
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

/// A class with `methods` methods, each appending to a builder.
fn synthetic_source(methods: usize) -> String {
    let mut source = String::from("import java.util.*;\n\nclass Generated {\n");
    for i in 0..methods {
        source.push_str(&format!(
            "    void m{i}(StringBuilder sb, int n, List<String> names) {{\n        sb.append(n + {i});\n        if (n > {i}) {{\n            names.add(\"v{i}\");\n        }}\n    }}\n\n"
        ));
    }
    source.push_str("}\n");
    source
}

fn compilation_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("template/compile");
    let source = "#{sb:any(java.lang.StringBuilder)}.append(#{n:any(int)} + #{k:literal(int)})";

    group.bench_function("cold", |b| {
        b.iter(|| {
            let template = JavaTemplate::builder(black_box(source)).build().unwrap();
            end_profiling_frame();
            black_box(template.parameter_count())
        });
    });

    let cache = TemplateCache::new();
    group.bench_function("cached", |b| {
        b.iter(|| {
            let template = cache.get_or_compile(JavaTemplate::builder(black_box(source))).unwrap();
            black_box(template.parameter_count())
        });
    });

    group.finish();
}

fn matching_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("template/match");
    let template = JavaTemplate::builder("#{any(java.lang.StringBuilder)}.append(#{any(int)})")
        .build()
        .unwrap();

    for methods in [10, 100, 500] {
        let source = synthetic_source(methods);
        let file = SourceFile::parse(&source).unwrap();
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_function(format!("find_matches_{methods}_methods"), |b| {
            b.iter(|| {
                let found = template.find_matches(black_box(&file));
                end_profiling_frame();
                black_box(found.len())
            });
        });
    }

    group.finish();
}

fn instantiation_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("template/apply");
    let file = SourceFile::parse(&synthetic_source(100)).unwrap();

    let pattern = JavaTemplate::builder("#{any(java.lang.StringBuilder)}.append(#{any(int)})")
        .build()
        .unwrap();
    let rewrite = JavaTemplate::builder("#{any(java.lang.StringBuilder)}.append(#{any(int)}).append(';')")
        .build()
        .unwrap();
    let cursor = file.find_expr("sb.append(n + 50)").unwrap();
    let found = pattern.matches(&cursor).unwrap();
    let args = found.substitutions();
    group.bench_function("replace_expression", |b| {
        b.iter(|| {
            let applied = rewrite.apply(black_box(&cursor), Coordinates::Replace, &args).unwrap();
            end_profiling_frame();
            black_box(applied)
        });
    });

    let method = file.find_method("m50").unwrap();
    let log = JavaTemplate::builder("System.out.println(\"entering\");").build().unwrap();
    group.bench_function("first_statement", |b| {
        b.iter(|| {
            let applied = log.apply(black_box(&method), Coordinates::FirstStatement, &[]).unwrap();
            end_profiling_frame();
            black_box(applied)
        });
    });

    group.finish();
}

criterion_group!(benches, compilation_benchmarks, matching_benchmarks, instantiation_benchmarks);

criterion_main!(benches);
