use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use fanbuf::{BufferConfig, PipelineBuffer, Reading};
use std::time::Duration;

const RECORDS: u64 = 100_000;

/// Full record lifecycle on one thread: insert, both takes, reclaim.
fn bench_sequential_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential");
    group.throughput(Throughput::Elements(RECORDS));

    group.bench_function("insert_take_take_reclaim", |b| {
        b.iter(|| {
            let buffer = PipelineBuffer::new(BufferConfig::default());
            for i in 0..RECORDS {
                buffer
                    .insert(Reading::new((i % 64) as u16, 21.5, i as i64))
                    .unwrap();
            }
            for _ in 0..RECORDS {
                black_box(buffer.take_next_to_process().unwrap());
                black_box(buffer.take_next_to_store().unwrap());
                black_box(buffer.reclaim_one().unwrap());
            }
            assert!(buffer.is_empty());
        });
    });

    group.finish();
}

/// The gateway topology: one producer, both consumers and the reclaimer
/// on their own threads, drained by a close.
fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.throughput(Throughput::Elements(RECORDS));
    group.sample_size(10);

    group.bench_function("producer_two_consumers_reclaimer", |b| {
        b.iter(|| {
            let buffer = PipelineBuffer::new(
                BufferConfig::default().with_wait_timeout(Duration::from_millis(100)),
            );

            crossbeam_utils::thread::scope(|s| {
                let buffer = &buffer;

                let processor = s.spawn(|_| {
                    let mut seen = 0u64;
                    while let Some(snapshot) = buffer.take_next_to_process() {
                        black_box(snapshot);
                        seen += 1;
                    }
                    seen
                });
                let storer = s.spawn(|_| {
                    let mut seen = 0u64;
                    while let Some(snapshot) = buffer.take_next_to_store() {
                        black_box(snapshot);
                        seen += 1;
                    }
                    seen
                });
                let reclaimer = s.spawn(|_| {
                    let mut freed = 0u64;
                    while buffer.reclaim_one().is_some() {
                        freed += 1;
                    }
                    freed
                });

                for i in 0..RECORDS {
                    buffer
                        .insert(Reading::new((i % 64) as u16, 21.5, i as i64))
                        .unwrap();
                }
                buffer.close();

                assert_eq!(processor.join().unwrap(), RECORDS);
                assert_eq!(storer.join().unwrap(), RECORDS);
                assert_eq!(reclaimer.join().unwrap(), RECORDS);
            })
            .unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_sequential_cycle, bench_pipeline);
criterion_main!(benches);
