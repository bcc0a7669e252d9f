//! Throughput benchmarks for the message codec and file serializers
//!
//! Measures:
//! - Scalar messages through an unbound codec
//! - Arrays of increasing length through a bound codec
//! - Nested maps
//! - PLY merge on append

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;
use yggcomm::datatypes::{NdArray, Ply, Scalar, TypeDefinition, TypeRegistry, Value, ValueMap, Vertex};
use yggcomm::serialization::{Codec, FormatSerializer, PlySerializer};

fn mesh(vertices: usize) -> Ply {
    let mut mesh = Ply::new();
    for index in 0..vertices {
        let x = index as f64;
        mesh.vertices.push(Vertex::new(x, x * 0.5, 0.0).with_color([255, 128, 0]));
    }
    for index in 0..vertices.saturating_sub(2) {
        mesh.add_face([index, index + 1, index + 2]).unwrap();
    }
    mesh
}

/// Benchmark a scalar through serialize and deserialize
fn bench_scalar(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec_scalar");
    group.throughput(Throughput::Elements(1));
    group.measurement_time(Duration::from_secs(5));

    let codec = Codec::new(TypeRegistry::global());
    let value = Value::from(Scalar::float64(9.81).with_units("m/s**2"));
    group.bench_function("round_trip_float64", |b| {
        b.iter(|| {
            let message = codec.serialize(black_box(&value)).unwrap();
            black_box(codec.decode_value(&message).unwrap());
        });
    });

    group.finish();
}

/// Benchmark arrays of increasing length through a bound codec
fn bench_arrays(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec_array");
    let definition = TypeDefinition::new("1darray").with("subtype", "float").with("precision", 64);
    let codec = Codec::bound(TypeRegistry::global(), definition).unwrap();

    for length in [16usize, 1024, 65536].iter() {
        group.throughput(Throughput::Bytes((*length * 8) as u64));
        let value = Value::from(NdArray::from_data((0..*length).map(|i| i as f64).collect::<Vec<_>>()));
        group.bench_with_input(BenchmarkId::from_parameter(length), &value, |b, value| {
            b.iter(|| {
                let message = codec.serialize(black_box(value)).unwrap();
                black_box(codec.decode_value(&message).unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark a nested map, the shape of a typical model state message
fn bench_nested_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec_map");
    group.throughput(Throughput::Elements(1));

    let codec = Codec::new(TypeRegistry::global());
    let state = ValueMap::new()
        .with("time", Scalar::float64(3600.0).with_units("s"))
        .with("step", 42i64)
        .with("label", "canopy")
        .with("leaf_area", NdArray::from_data(vec![0.5; 128]).with_units("m**2"));
    let value = Value::from(ValueMap::new().with("state", state).with("worker", "w-3"));
    group.bench_function("round_trip_state", |b| {
        b.iter(|| {
            let message = codec.serialize(black_box(&value)).unwrap();
            black_box(codec.decode_value(&message).unwrap());
        });
    });

    group.finish();
}

/// Benchmark merging meshes the way an appending PLY file does
fn bench_ply_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("ply_merge");

    for vertices in [64usize, 4096].iter() {
        group.throughput(Throughput::Elements(*vertices as u64 * 2));
        let existing = Value::from(mesh(*vertices));
        let incoming = Value::from(mesh(*vertices));
        group.bench_with_input(BenchmarkId::from_parameter(vertices), vertices, |b, _| {
            let mut serializer = PlySerializer;
            b.iter(|| {
                let merged = serializer.merge(&[existing.clone(), incoming.clone()]).unwrap();
                black_box(serializer.serialize(&merged).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_scalar, bench_arrays, bench_nested_map, bench_ply_merge);
criterion_main!(benches);
