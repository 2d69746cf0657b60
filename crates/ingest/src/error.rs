//! 인제스트 파이프라인 에러 타입
//!
//! [`IngestError`]는 포맷 컴파일, 라인 매핑, 파일 읽기, 큐/채널 통신 등
//! 인제스트 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<IngestError> for LogportError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use logport_core::error::{LogportError, PipelineError};

/// 인제스트 도메인 에러
///
/// 복구 범위가 에러마다 다릅니다. [`IngestError::InvalidFormat`]은
/// 컴파일 자체가 불가능한 치명적 에러이고,
/// [`IngestError::FieldCountMismatch`]와 [`IngestError::MalformedLine`]은
/// 해당 라인만 건너뛰면 되는 복구 가능 에러입니다.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// 포맷 명세 컴파일 실패
    #[error("invalid log format spec '{spec}': {reason}")]
    InvalidFormat {
        /// 문제가 된 포맷 명세 문자열
        spec: String,
        /// 실패 사유
        reason: String,
    },

    /// 토큰 수와 포맷 필드 수 불일치
    #[error("field count mismatch: format expects {expected} tokens, line has {actual}")]
    FieldCountMismatch {
        /// 포맷이 기대하는 토큰 수
        expected: usize,
        /// 라인에서 얻은 토큰 수
        actual: usize,
    },

    /// 매핑 불가능한 라인 (라인 번호 포함)
    #[error("line {line}: {reason}")]
    MalformedLine {
        /// 1부터 시작하는 라인 번호
        line: usize,
        /// 실패 사유
        reason: String,
    },

    /// 파일 열기/읽기 실패 (해당 파일에 대해 치명적)
    #[error("file read error: {path}: {reason}")]
    FileRead {
        /// 파일 경로
        path: String,
        /// 에러 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 큐/채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IngestError> for LogportError {
    fn from(err: IngestError) -> Self {
        LogportError::Pipeline(PipelineError::InitFailed(err.to_string()))
    }
}
