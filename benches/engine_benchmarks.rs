use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nutrirs::analysis::{AnalysisRequest, GlucoseAnalyzer};
use nutrirs::events::{DetectionThresholds, EventDetector};
use nutrirs::models::Reading;
use nutrirs::range::{time_in_range, RangeBand};
use nutrirs::ClockTime;
use rust_decimal_macros::dec;

/// Performance benchmarks for the glucose analysis engine
///
/// A CGM reporting every five minutes yields 288 readings a day; the larger
/// sizes stand in for multi-sensor or higher-frequency exports.

fn create_readings(count: usize) -> Vec<Reading> {
    (0..count)
        .map(|i| {
            let minute_of_day = ((i * 5) % (24 * 60)) as u32;
            let time = ClockTime::new(minute_of_day / 60, minute_of_day % 60).unwrap();
            // Sawtooth with a 35 mg/dL jump every 12 readings and a dip below 70
            let glucose = match i % 12 {
                0 => 65,
                1 => 100,
                n => 100 + (n as i32) * 3,
            };
            Reading::new(time, glucose)
        })
        .collect()
}

fn bench_event_detection(c: &mut Criterion) {
    let detector = EventDetector::with_thresholds(DetectionThresholds::default());
    let mut group = c.benchmark_group("Event Detection");

    for &size in &[24, 288, 2880] {
        let readings = create_readings(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("detect", size), &readings, |b, readings| {
            b.iter(|| detector.detect(black_box(readings)));
        });
    }

    group.finish();
}

fn bench_time_in_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("Time In Range");

    for &size in &[24, 288, 2880] {
        let readings = create_readings(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("time_in_range", size), &readings, |b, readings| {
            b.iter(|| time_in_range(black_box(readings), RangeBand::default()));
        });
    }

    group.finish();
}

fn bench_full_analysis(c: &mut Criterion) {
    let analyzer = GlucoseAnalyzer::default();
    let mut group = c.benchmark_group("Full Analysis");

    for &size in &[24, 288] {
        let request = AnalysisRequest::new(create_readings(size), dec!(75), "maintain");

        group.bench_with_input(BenchmarkId::new("analyze", size), &request, |b, request| {
            b.iter(|| analyzer.analyze(black_box(request)));
        });
    }

    for &days in &[7, 30, 90] {
        let requests: Vec<AnalysisRequest> = (0..days)
            .map(|_| AnalysisRequest::new(create_readings(288), dec!(75), "cut"))
            .collect();

        group.throughput(Throughput::Elements(days as u64));
        group.bench_with_input(BenchmarkId::new("analyze_batch", days), &requests, |b, requests| {
            b.iter(|| analyzer.analyze_batch(black_box(requests)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_event_detection,
    bench_time_in_range,
    bench_full_analysis
);
criterion_main!(benches);
