//! 도메인 타입 벤치마크
//!
//! LogEntry 생성, 직렬화, 상태 코드 조회 성능을 측정합니다.

use chrono::DateTime;
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use logport_core::types::{HttpMethod, HttpStatus, LogEntry};

fn create_full_entry() -> LogEntry {
    let timestamp =
        DateTime::parse_from_str("19/Oct/2008:19:45:38 -0700", "%d/%b/%Y:%H:%M:%S %z").unwrap();
    LogEntry {
        remote_host: Some("192.168.123.12".to_owned()),
        remote_user: Some("frank".to_owned()),
        timestamp: Some(timestamp),
        method: Some(HttpMethod::Get),
        path: Some("/search".to_owned()),
        query: Some("q1=foo&st=bar".to_owned()),
        protocol: Some("HTTP/1.1".to_owned()),
        status: Some(HttpStatus::Ok),
        bytes_sent: Some(323),
        referer: Some("-".to_owned()),
        user_agent: Some("Mozilla/5.0 (X11; U; Linux i686; en-US)".to_owned()),
        server_name: Some("www.example.com".to_owned()),
    }
}

fn bench_status_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("status_lookup");
    group.throughput(Throughput::Elements(1));

    group.bench_function("from_code_known", |b| {
        b.iter(|| HttpStatus::from_code(black_box(404)))
    });

    group.bench_function("from_code_unknown", |b| {
        b.iter(|| HttpStatus::from_code(black_box(599)))
    });

    group.bench_function("method_from_token", |b| {
        b.iter(|| HttpMethod::from_token(black_box("POST")))
    });

    group.finish();
}

fn bench_entry_serialization(c: &mut Criterion) {
    let empty = LogEntry::default();
    let full = create_full_entry();

    let mut group = c.benchmark_group("entry_serialization");
    group.throughput(Throughput::Elements(1));

    group.bench_function("serialize_empty", |b| {
        b.iter(|| serde_json::to_string(black_box(&empty)).unwrap())
    });

    group.bench_function("serialize_full", |b| {
        b.iter(|| serde_json::to_string(black_box(&full)).unwrap())
    });

    let json = serde_json::to_string(&full).unwrap();
    group.bench_function("deserialize_full", |b| {
        b.iter(|| serde_json::from_str::<LogEntry>(black_box(&json)).unwrap())
    });

    group.finish();
}

fn bench_entry_cloning(c: &mut Criterion) {
    let empty = LogEntry::default();
    let full = create_full_entry();

    let mut group = c.benchmark_group("entry_cloning");

    group.bench_function("clone_empty", |b| {
        b.iter(|| {
            let _ = black_box(&empty).clone();
        })
    });

    group.bench_function("clone_full", |b| {
        b.iter(|| {
            let _ = black_box(&full).clone();
        })
    });

    group.bench_function("display_full", |b| {
        b.iter(|| black_box(&full).to_string())
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_status_lookup,
    bench_entry_serialization,
    bench_entry_cloning
);
criterion_main!(benches);
