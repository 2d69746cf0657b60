//! 인제스트 파이프라인 설정
//!
//! [`IngestConfig`]는 core의 [`IngestSectionConfig`](logport_core::config::IngestSectionConfig)를
//! 기반으로 인제스트 파이프라인 전용 설정을 제공합니다. 숫자 범위 검증은
//! 이 타입의 [`validate`](IngestConfig::validate)가 담당합니다.
//!
//! # 사용 예시
//! ```ignore
//! use logport_core::config::LogportConfig;
//! use logport_ingest::config::IngestConfig;
//!
//! let core_config = LogportConfig::default();
//! let config = IngestConfig::from_core(&core_config.ingest);
//! config.validate()?;
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::IngestError;

/// 인제스트 파이프라인 설정
///
/// core의 `IngestSectionConfig`에서 파생됩니다. `flush_workers`가 0이면
/// [`effective_flush_workers`](Self::effective_flush_workers)가 코어 수 기반으로
/// 워커 수를 산정합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// 엔트리 큐 용량 (가득 차면 생산자가 대기)
    pub queue_capacity: usize,
    /// 배치 플러시 크기 (이 개수만큼 쌓이면 플러시)
    pub batch_size: usize,
    /// 플러시 워커 수 (0이면 `max(1, cores/4)` 자동 산정)
    pub flush_workers: usize,
    /// 파일 큐 용량
    pub file_queue_capacity: usize,
    /// 플러시 신호 후 드레인 전 대기 시간 (밀리초)
    pub flush_settle_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 10_000,
            batch_size: 1_000,
            flush_workers: 0,
            file_queue_capacity: 1_024,
            flush_settle_ms: 50,
        }
    }
}

impl IngestConfig {
    /// core의 `IngestSectionConfig`에서 인제스트 설정을 생성합니다.
    pub fn from_core(core: &logport_core::config::IngestSectionConfig) -> Self {
        Self {
            queue_capacity: core.queue_capacity,
            batch_size: core.batch_size,
            flush_workers: core.flush_workers,
            file_queue_capacity: core.file_queue_capacity,
            flush_settle_ms: core.flush_settle_ms,
        }
    }

    /// 실제로 기동할 플러시 워커 수를 반환합니다.
    ///
    /// `flush_workers`가 0이면 `max(1, 가용 코어 수 / 4)`로 산정합니다.
    pub fn effective_flush_workers(&self) -> usize {
        if self.flush_workers > 0 {
            return self.flush_workers;
        }
        let cores = std::thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(1);
        (cores / 4).max(1)
    }

    /// 플러시 신호 후 드레인 전 대기 시간을 반환합니다.
    pub fn flush_settle(&self) -> Duration {
        Duration::from_millis(self.flush_settle_ms)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), IngestError> {
        const MAX_QUEUE_CAPACITY: usize = 10_000_000;
        const MAX_BATCH_SIZE: usize = 100_000;
        const MAX_FLUSH_WORKERS: usize = 256;
        const MAX_FILE_QUEUE_CAPACITY: usize = 100_000;
        const MAX_FLUSH_SETTLE_MS: u64 = 10_000; // 10 seconds

        if self.queue_capacity == 0 || self.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(IngestError::Config {
                field: "queue_capacity".to_owned(),
                reason: format!("must be 1-{}", MAX_QUEUE_CAPACITY),
            });
        }

        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(IngestError::Config {
                field: "batch_size".to_owned(),
                reason: format!("must be 1-{}", MAX_BATCH_SIZE),
            });
        }

        if self.batch_size > self.queue_capacity {
            return Err(IngestError::Config {
                field: "batch_size".to_owned(),
                reason: format!(
                    "must not exceed queue_capacity ({})",
                    self.queue_capacity
                ),
            });
        }

        // flush_workers 0은 자동 산정을 의미하므로 허용
        if self.flush_workers > MAX_FLUSH_WORKERS {
            return Err(IngestError::Config {
                field: "flush_workers".to_owned(),
                reason: format!("must be 0-{}", MAX_FLUSH_WORKERS),
            });
        }

        if self.file_queue_capacity == 0 || self.file_queue_capacity > MAX_FILE_QUEUE_CAPACITY {
            return Err(IngestError::Config {
                field: "file_queue_capacity".to_owned(),
                reason: format!("must be 1-{}", MAX_FILE_QUEUE_CAPACITY),
            });
        }

        if self.flush_settle_ms > MAX_FLUSH_SETTLE_MS {
            return Err(IngestError::Config {
                field: "flush_settle_ms".to_owned(),
                reason: format!("must be 0-{}", MAX_FLUSH_SETTLE_MS),
            });
        }

        Ok(())
    }
}

/// 인제스트 설정 빌더
///
/// 3개 이상의 설정 필드가 있으므로 빌더 패턴을 사용합니다.
#[derive(Default)]
pub struct IngestConfigBuilder {
    config: IngestConfig,
}

impl IngestConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 엔트리 큐 용량을 설정합니다.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// 배치 플러시 크기를 설정합니다.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// 플러시 워커 수를 설정합니다.
    pub fn flush_workers(mut self, workers: usize) -> Self {
        self.config.flush_workers = workers;
        self
    }

    /// 파일 큐 용량을 설정합니다.
    pub fn file_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.file_queue_capacity = capacity;
        self
    }

    /// 플러시 신호 후 대기 시간(밀리초)을 설정합니다.
    pub fn flush_settle_ms(mut self, ms: u64) -> Self {
        self.config.flush_settle_ms = ms;
        self
    }

    /// 설정을 검증하고 `IngestConfig`를 생성합니다.
    pub fn build(self) -> Result<IngestConfig, IngestError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
