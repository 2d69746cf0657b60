//! 임포트 통계 -- 파일별 처리 결과 수집
//!
//! [`ImportStats`]는 파일 하나가 끝까지 처리될 때마다 기록 하나를 추가하는
//! append-only 수집기입니다. 전역 싱글턴이 아니라 명시적으로 생성하여
//! 파이프라인에 주입합니다. 여러 워커에서 동시 기록이 가능합니다.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 파일 하나의 임포트 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRecord {
    /// 처리된 파일 경로
    pub path: PathBuf,
    /// 저장 큐에 넣은 엔트리 수
    pub entries: u64,
    /// 파일 열기부터 마지막 줄까지 걸린 시간
    pub elapsed: Duration,
}

impl fmt::Display for ImportRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} entries in {}ms",
            self.path.display(),
            self.entries,
            self.elapsed.as_millis(),
        )
    }
}

/// 임포트 통계 수집기
///
/// # 사용 예시
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use logport_core::stats::ImportStats;
///
/// let stats = Arc::new(ImportStats::new());
/// stats.record("/var/log/access.log", 1024, Duration::from_millis(42));
///
/// assert_eq!(stats.file_count(), 1);
/// assert_eq!(stats.total_entries(), 1024);
/// ```
#[derive(Debug, Default)]
pub struct ImportStats {
    records: Mutex<Vec<ImportRecord>>,
}

impl ImportStats {
    /// 빈 수집기를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 파일 하나의 처리 결과를 기록합니다.
    pub fn record(&self, path: impl Into<PathBuf>, entries: u64, elapsed: Duration) {
        self.lock().push(ImportRecord {
            path: path.into(),
            entries,
            elapsed,
        });
    }

    /// 현재까지의 기록 사본을 반환합니다.
    pub fn snapshot(&self) -> Vec<ImportRecord> {
        self.lock().clone()
    }

    /// 기록된 파일 수를 반환합니다.
    pub fn file_count(&self) -> usize {
        self.lock().len()
    }

    /// 모든 파일의 엔트리 수 합계를 반환합니다.
    pub fn total_entries(&self) -> u64 {
        self.lock().iter().map(|r| r.entries).sum()
    }

    /// 기록 벡터에는 불변식이 없으므로 중독된 락도 그대로 복구합니다.
    fn lock(&self) -> MutexGuard<'_, Vec<ImportRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
