use std::{hint::black_box, io::Cursor};

use cir_core::{encode_record, AccumulatorReader, RecordReader, RecordWriter, ACC_CHUNK};
use cir_hal::{bring_up, LoadMode, SimEvent, SimulatedDevice, UwbDevice};
use cir_types::{CirBuffer, CirSample, RadioConfig, SysStatus, CIR_SAMPLES_PRF64};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;

fn random_cir(n: usize) -> CirBuffer {
    let mut rng = rand::thread_rng();
    let samples: Vec<CirSample> = (0..n)
        .map(|_| CirSample::new(rng.gen(), rng.gen()))
        .collect();

    CirBuffer::from_samples(&samples)
}

/// Симулятор с принятым кадром: аккумулятор заполнен.
fn loaded_device() -> SimulatedDevice {
    let mut dev = SimulatedDevice::scripted([SimEvent::radar(1, 1)]);
    dev.polls_until_event = 0;

    bring_up(&mut dev, &RadioConfig::default(), LoadMode::Ucode).unwrap();
    dev.rx_enable().unwrap();
    assert!(dev.read_status().unwrap().intersects(SysStatus::RXFCG));

    dev
}

fn accumulator_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulator read");
    group.throughput(Throughput::Bytes((CIR_SAMPLES_PRF64 * 4) as u64));

    for chunk in [16, 32, ACC_CHUNK] {
        let mut dev = loaded_device();
        dev.max_transfer = chunk;

        let mut reader = AccumulatorReader::new(chunk).unwrap();
        let mut cir = CirBuffer::new(CIR_SAMPLES_PRF64).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(chunk), &chunk, |b, _| {
            b.iter(|| reader.read_cir(&mut dev, black_box(0), &mut cir).unwrap())
        });
    }

    group.finish();
}

fn record_benchmark(c: &mut Criterion) {
    let cir = random_cir(CIR_SAMPLES_PRF64);

    c.bench_function("encode record", |b| {
        b.iter(|| encode_record(black_box(-1), black_box(0xFF_FFFF_FFFF), black_box(&cir)))
    });

    let mut writer = RecordWriter::new(Vec::with_capacity(64 * 4_076), CIR_SAMPLES_PRF64);
    for i in 0..64 {
        writer.write(i, i as u64, &cir).unwrap();
    }
    let stream = writer.into_inner();

    c.bench_function("read 64 records", |b| {
        b.iter(|| {
            let mut reader = RecordReader::new(Cursor::new(black_box(&stream)), CIR_SAMPLES_PRF64);
            for _ in 0..64 {
                black_box(reader.read().unwrap());
            }
        })
    });
}

criterion_group!(benches, accumulator_benchmark, record_benchmark);
criterion_main!(benches);
