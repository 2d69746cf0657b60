//! 스토리지 trait -- 로그 엔트리 영속화 경계
//!
//! [`LogStore`]는 파싱된 엔트리를 저장하는 외부 협력자의 인터페이스입니다.
//! 실제 저장소 구현(데이터베이스, 파일 등)은 이 크레이트 밖에 있습니다.
//!
//! `LogStore`는 RPITIT를 사용하므로 `dyn LogStore`가 불가합니다.
//! [`DynLogStore`]는 [`BoxFuture`]를 반환하여 `Arc<dyn DynLogStore>`로
//! 저장소를 주입할 수 있게 합니다.

use std::future::Future;

use crate::error::LogportError;
use crate::pipeline::BoxFuture;
use crate::types::LogEntry;

// ─── LogStore Trait ──────────────────────────────────────────────────

/// 로그 엔트리 저장소 trait
///
/// 구현체는 여러 워커에서의 동시 `create_batch` 호출을 허용해야 합니다.
///
/// # 구현 예시
/// ```ignore
/// struct JsonlStore {
///     path: PathBuf,
/// }
///
/// impl LogStore for JsonlStore {
///     fn name(&self) -> &str { "jsonl" }
///
///     async fn create(&self, entry: &LogEntry) -> Result<(), LogportError> {
///         self.append_line(entry).await
///     }
///     async fn create_batch(&self, entries: &[LogEntry]) -> Result<(), LogportError> {
///         self.append_lines(entries).await
///     }
/// }
/// ```
pub trait LogStore: Send + Sync {
    /// 저장소 이름 (로그 식별용)
    fn name(&self) -> &str;

    /// 엔트리 하나를 저장합니다.
    fn create(&self, entry: &LogEntry) -> impl Future<Output = Result<(), LogportError>> + Send;

    /// 엔트리 배치를 하나의 벌크 연산으로 저장합니다.
    ///
    /// 빈 배치는 no-op으로 성공해야 합니다.
    fn create_batch(
        &self,
        entries: &[LogEntry],
    ) -> impl Future<Output = Result<(), LogportError>> + Send;
}

// ─── DynLogStore Trait ───────────────────────────────────────────────

/// dyn-compatible 저장소 trait
pub trait DynLogStore: Send + Sync {
    /// 저장소 이름 (로그 식별용)
    fn name(&self) -> &str;

    /// 엔트리 하나를 저장합니다.
    fn create<'a>(&'a self, entry: &'a LogEntry) -> BoxFuture<'a, Result<(), LogportError>>;

    /// 엔트리 배치를 하나의 벌크 연산으로 저장합니다.
    fn create_batch<'a>(
        &'a self,
        entries: &'a [LogEntry],
    ) -> BoxFuture<'a, Result<(), LogportError>>;
}

/// LogStore를 구현한 타입은 자동으로 DynLogStore도 구현됩니다.
impl<T: LogStore> DynLogStore for T {
    fn name(&self) -> &str {
        LogStore::name(self)
    }

    fn create<'a>(&'a self, entry: &'a LogEntry) -> BoxFuture<'a, Result<(), LogportError>> {
        Box::pin(LogStore::create(self, entry))
    }

    fn create_batch<'a>(
        &'a self,
        entries: &'a [LogEntry],
    ) -> BoxFuture<'a, Result<(), LogportError>> {
        Box::pin(LogStore::create_batch(self, entries))
    }
}
