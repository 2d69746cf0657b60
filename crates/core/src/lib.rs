#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod stats;
pub mod store;
pub mod types;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{ConfigError, LogportError, PipelineError, StorageError};

// 설정
pub use config::LogportConfig;

// 파이프라인 trait
pub use pipeline::{BoxFuture, HealthStatus, Pipeline};

// 저장소 trait
pub use store::{DynLogStore, LogStore};

// 임포트 통계
pub use stats::{ImportRecord, ImportStats};

// 도메인 타입
pub use types::{HttpMethod, HttpStatus, LogEntry};
