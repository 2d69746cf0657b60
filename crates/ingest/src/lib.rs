#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`format`]: 포맷 명세 컴파일러와 프리셋 (`common`, `combined`, `common_with_vhost`)
//! - [`tokenizer`]: 대괄호/따옴표 인식 단일 패스 토크나이저
//! - [`mapper`]: 토큰 열을 [`LogEntry`](logport_core::types::LogEntry)로 변환
//! - [`reader`]: 로그 파일 한 줄 단위 읽기
//! - [`queue`]: backpressure를 주는 관찰 가능한 유계 큐
//! - [`persister`]: 플러시 신호 기반 배치 영속화 워커 풀
//! - [`importer`]: 파일 큐, 중복 제거, 임포트 워커
//! - [`pipeline`]: 전체 파이프라인 오케스트레이션 (Pipeline trait 구현)
//! - [`config`]: 수집 파이프라인 설정
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! import_files() -> FileImporter -> LogFileReader -> ObservableQueue -> PersisterPool -> LogStore
//!                       |               |                  |                 |
//!                   중복 제거      tokenize + map      FlushTrigger      배치 단위 저장
//! ```

pub mod config;
pub mod error;
pub mod pipeline;

pub mod format;
pub mod mapper;
pub mod tokenizer;

pub mod importer;
pub mod persister;
pub mod queue;
pub mod reader;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{IngestPipeline, IngestPipelineBuilder};

// 설정
pub use config::{IngestConfig, IngestConfigBuilder};

// 에러
pub use error::IngestError;

// 포맷/파싱
pub use format::{CaptureKind, LogField, LogFormat};
pub use mapper::map_entry;
pub use tokenizer::tokenize;

// 파일 읽기
pub use reader::{LogFile, LogFileReader};

// 큐
pub use queue::{ObservableQueue, QueueObserver};

// 영속화
pub use persister::{FlushOutcome, FlushTrigger, PersisterPool};

// 임포터
pub use importer::FileImporter;
