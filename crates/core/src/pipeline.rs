//! 파이프라인 trait -- 모듈 생명주기 확장 포인트
//!
//! 백그라운드 워커를 가진 모듈은 [`Pipeline`]을 구현하여
//! 시작/정지/상태 점검을 공통 형태로 노출합니다.
//!
//! # 생명주기
//! ```text
//! Created → start() → Running → stop() → Stopped
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::LogportError;

/// dyn trait에서 사용하는 boxed future 타입
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ─── HealthStatus ────────────────────────────────────────────────────

/// 파이프라인 건강 상태
///
/// [`Pipeline::health_check`]의 반환값입니다.
/// `Degraded`와 `Unhealthy`는 사유 문자열을 포함합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// 정상 동작 중
    Healthy,
    /// 동작하지만 주의 필요 (예: 큐 포화 임박)
    Degraded(String),
    /// 동작 불가
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태이면 `true`를 반환합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 동작 불가 상태이면 `true`를 반환합니다.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
            Self::Unhealthy(reason) => write!(f, "unhealthy: {reason}"),
        }
    }
}

// ─── Pipeline Trait ──────────────────────────────────────────────────

/// 백그라운드 워커를 가진 모듈의 생명주기 trait
///
/// # 구현 예시
/// ```ignore
/// struct MyPipeline {
///     running: bool,
/// }
///
/// impl Pipeline for MyPipeline {
///     async fn start(&mut self) -> Result<(), LogportError> {
///         self.running = true;
///         Ok(())
///     }
///     async fn stop(&mut self) -> Result<(), LogportError> {
///         self.running = false;
///         Ok(())
///     }
///     async fn health_check(&self) -> HealthStatus {
///         HealthStatus::Healthy
///     }
/// }
/// ```
pub trait Pipeline: Send + Sync {
    /// 파이프라인을 시작합니다.
    ///
    /// 워커 태스크를 생성합니다. 이미 실행 중이면 에러를 반환합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), LogportError>> + Send;

    /// 파이프라인을 정지합니다.
    ///
    /// Graceful shutdown을 수행합니다. 처리 중인 데이터는 플러시됩니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), LogportError>> + Send;

    /// 파이프라인의 건강 상태를 확인합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}
