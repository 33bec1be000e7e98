use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;
use pqplot::{
    ColorScale, DatasetSet, NormalizationBound, ParameterMesh, RenderPolicy, SurfaceRenderer,
    TimingDataset, Variant,
};

fn synthetic(mesh: &ParameterMesh, variant: Variant, peak: f64) -> TimingDataset {
    let (rows, cols) = mesh.shape();
    let span = (rows + cols - 2) as f64;
    TimingDataset::new(
        variant,
        Array2::from_shape_fn(mesh.shape(), |(i, j)| peak * (i + j) as f64 / span),
    )
}

fn bench_surface(c: &mut Criterion) {
    let mesh = ParameterMesh::default();
    let scale = ColorScale::default();
    let dataset = synthetic(&mesh, Variant::PqcTls, 4000.0);
    let renderer = SurfaceRenderer::new(
        &mesh,
        &scale,
        NormalizationBound::new(4000.0),
        RenderPolicy::default(),
    );

    c.bench_function("surface_build", |b| b.iter(|| renderer.render(&dataset)));
}

fn bench_bound(c: &mut Criterion) {
    let mesh = ParameterMesh::default();
    let set: DatasetSet = Variant::ALL
        .iter()
        .enumerate()
        .map(|(k, &v)| synthetic(&mesh, v, 1000.0 * (k + 1) as f64))
        .collect();

    for excluded in [vec![], vec![Variant::ClientCachingTls]] {
        c.bench_with_input(
            BenchmarkId::new("bound_excluding", excluded.len()),
            &excluded,
            |b, excluded| b.iter(|| NormalizationBound::resolve_excluding(&set, excluded)),
        );
    }
}

criterion_group!(bench_all, bench_surface, bench_bound);
criterion_main!(bench_all);
