//! Frame and message codec benchmarks

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use filestream_core::{Chunk, Frame, Message};

fn bench_chunk_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_encode");

    for size in [1024usize, 64 * 1024, 1024 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));
        let message = Message::Chunk(Chunk::new("bench.bin", vec![0xAB; size]));

        group.bench_with_input(BenchmarkId::from_parameter(size), &message, |b, message| {
            b.iter(|| black_box(message.to_frame().unwrap().encode()));
        });
    }

    group.finish();
}

fn bench_chunk_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_decode");

    for size in [1024usize, 64 * 1024, 1024 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));
        let encoded = Message::Chunk(Chunk::new("bench.bin", vec![0xCD; size]))
            .to_frame()
            .unwrap()
            .encode();

        group.bench_with_input(BenchmarkId::from_parameter(size), &encoded, |b, encoded| {
            b.iter(|| {
                let frame = Frame::parse(black_box(encoded)).unwrap();
                black_box(Message::from_frame(&frame).unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_chunk_encode, bench_chunk_decode);
criterion_main!(benches);
