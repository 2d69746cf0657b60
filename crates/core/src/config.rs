//! 설정 관리 -- logport.toml 파싱 및 런타임 설정
//!
//! [`LogportConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`LOGPORT_INGEST_BATCH_SIZE=500` 형식)
//! 2. 설정 파일 (`logport.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logport_core::error::LogportError> {
//! use logport_core::config::LogportConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogportConfig::load("logport.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogportConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogportError};

/// Logport 통합 설정
///
/// `logport.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogportConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 인제스트 파이프라인 설정
    #[serde(default)]
    pub ingest: IngestSectionConfig,
}

impl LogportConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogportError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogportError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogportError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogportError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogportError> {
        toml::from_str(toml_str).map_err(|e| {
            LogportError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGPORT_{SECTION}_{FIELD}`
    /// 예: `LOGPORT_INGEST_BATCH_SIZE=500`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGPORT_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGPORT_GENERAL_LOG_FORMAT");

        // Ingest
        override_usize(
            &mut self.ingest.queue_capacity,
            "LOGPORT_INGEST_QUEUE_CAPACITY",
        );
        override_usize(&mut self.ingest.batch_size, "LOGPORT_INGEST_BATCH_SIZE");
        override_usize(
            &mut self.ingest.flush_workers,
            "LOGPORT_INGEST_FLUSH_WORKERS",
        );
        override_usize(
            &mut self.ingest.file_queue_capacity,
            "LOGPORT_INGEST_FILE_QUEUE_CAPACITY",
        );
        override_u64(
            &mut self.ingest.flush_settle_ms,
            "LOGPORT_INGEST_FLUSH_SETTLE_MS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 숫자 범위 검증은 인제스트 크레이트의 `IngestConfig::validate`가
    /// 담당하고, 여기서는 열거형 문자열 필드만 확인합니다.
    pub fn validate(&self) -> Result<(), LogportError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        Ok(())
    }
}

// Default는 derive 매크로로 자동 생성 (각 필드가 Default를 구현하므로)

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 인제스트 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSectionConfig {
    /// 엔트리 큐 용량
    pub queue_capacity: usize,
    /// 배치 플러시 크기
    pub batch_size: usize,
    /// 플러시 워커 수 (0이면 `max(1, cores/4)` 자동 산정)
    pub flush_workers: usize,
    /// 파일 큐 용량
    pub file_queue_capacity: usize,
    /// 플러시 신호 후 드레인 전 대기 시간 (밀리초)
    pub flush_settle_ms: u64,
}

impl Default for IngestSectionConfig {
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

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
