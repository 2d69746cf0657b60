//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logport_`
//! - 모듈명: `ingest_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(logport_core::metrics::INGEST_ENTRIES_ENQUEUED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

/// 저장소 이름 레이블 키
pub const LABEL_STORE: &str = "store";

// ─── Ingest 메트릭 ──────────────────────────────────────────────────

/// Ingest: 큐에 넣은 전체 엔트리 수 (counter)
pub const INGEST_ENTRIES_ENQUEUED_TOTAL: &str = "logport_ingest_entries_enqueued_total";

/// Ingest: 저장소에 기록된 엔트리 수 (counter)
pub const INGEST_ENTRIES_PERSISTED_TOTAL: &str = "logport_ingest_entries_persisted_total";

/// Ingest: 저장 실패로 폐기된 엔트리 수 (counter)
pub const INGEST_ENTRIES_DROPPED_TOTAL: &str = "logport_ingest_entries_dropped_total";

/// Ingest: 엔트리 큐 내 엔트리 수 (gauge)
pub const INGEST_QUEUE_DEPTH: &str = "logport_ingest_queue_depth";

/// Ingest: 파일 큐 내 대기 파일 수 (gauge)
pub const INGEST_FILE_QUEUE_DEPTH: &str = "logport_ingest_file_queue_depth";

/// Ingest: 배치 플러시 수 (counter, label: result)
pub const INGEST_FLUSHES_TOTAL: &str = "logport_ingest_flushes_total";

/// Ingest: 배치 플러시 소요 시간 (histogram, 초)
pub const INGEST_FLUSH_DURATION_SECONDS: &str = "logport_ingest_flush_duration_seconds";

/// Ingest: 끝까지 처리된 파일 수 (counter)
pub const INGEST_FILES_IMPORTED_TOTAL: &str = "logport_ingest_files_imported_total";

/// Ingest: 건너뛴 라인 수 (counter)
pub const INGEST_LINES_SKIPPED_TOTAL: &str = "logport_ingest_lines_skipped_total";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 배치 플러시 소요 시간 히스토그램 버킷 (초)
///
/// 100us ~ 10s 범위, 로그 단위 분포
pub const FLUSH_DURATION_BUCKETS: [f64; 10] = [
    0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 10.0,
];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// `metrics::describe_counter!()`, `describe_gauge!()`, `describe_histogram!()`을
/// 호출하여 HELP 텍스트를 설정합니다.
///
/// 이 함수는 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        INGEST_ENTRIES_ENQUEUED_TOTAL,
        "Total number of log entries put into the ingestion queue"
    );
    describe_counter!(
        INGEST_ENTRIES_PERSISTED_TOTAL,
        "Total number of log entries written to the store"
    );
    describe_counter!(
        INGEST_ENTRIES_DROPPED_TOTAL,
        "Total number of log entries discarded after a failed batch write"
    );
    describe_gauge!(
        INGEST_QUEUE_DEPTH,
        "Current number of log entries in the ingestion queue"
    );
    describe_gauge!(
        INGEST_FILE_QUEUE_DEPTH,
        "Current number of files waiting in the import queue"
    );
    describe_counter!(
        INGEST_FLUSHES_TOTAL,
        "Total number of batch flushes by result (success, failure)"
    );
    describe_histogram!(
        INGEST_FLUSH_DURATION_SECONDS,
        "Time to persist a single batch in seconds"
    );
    describe_counter!(
        INGEST_FILES_IMPORTED_TOTAL,
        "Total number of log files processed to completion"
    );
    describe_counter!(
        INGEST_LINES_SKIPPED_TOTAL,
        "Total number of malformed lines skipped during import"
    );
}
