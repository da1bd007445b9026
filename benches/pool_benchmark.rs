/*!
 * Pool Allocation Benchmarks
 *
 * Compare pool recycling against direct general-allocator round trips
 */

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use memkit::{FixedPool, GrowBuf};

fn bench_block_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_allocation");

    group.bench_function("pool_recycle", |b| {
        let mut pool = FixedPool::new(1).unwrap();
        b.iter(|| {
            let block = pool.allocate().unwrap();
            black_box(block.address());
            pool.deallocate(block).unwrap();
        });
    });

    group.bench_function("general_allocator", |b| {
        b.iter(|| {
            let block = vec![0u8; 32].into_boxed_slice();
            black_box(block.as_ptr());
        });
    });

    group.finish();
}

fn bench_buffer_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_push");

    group.bench_function("growbuf", |b| {
        b.iter(|| {
            let mut buf = GrowBuf::new().unwrap();
            for i in 0..1024u64 {
                buf.push(black_box(i)).unwrap();
            }
            black_box(buf.len());
        });
    });

    group.bench_function("std_vec", |b| {
        b.iter(|| {
            let mut buf = Vec::with_capacity(2);
            for i in 0..1024u64 {
                buf.push(black_box(i));
            }
            black_box(buf.len());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_block_allocation, bench_buffer_push);
criterion_main!(benches);
