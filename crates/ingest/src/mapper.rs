//! 토큰-엔트리 매퍼
//!
//! 토크나이저가 만든 원시 토큰 시퀀스를 [`LogFormat`]의 디스크립터에
//! 위치 기반으로 결합해 [`LogEntry`]를 생성합니다. 토큰 수와 필드 수가
//! 다르면 라인 전체가 실패하지만, 개별 필드의 파싱 실패는 해당 속성만
//! 비워 두고 매핑 자체는 성공합니다.
//!
//! # 규칙 적용 순서
//! ```text
//! 1. %h %u        원격 호스트 / 사용자 (그대로 복사, `-`도 보존)
//! 2. %t           타임스탬프 (dd/MMM/yyyy:HH:mm:ss Z)
//! 3. %r           요청 첫 줄 (메서드 / 요청 대상 / 프로토콜)
//! 4. %m %U        전용 디렉티브가 %r의 결과를 덮어씀
//! 5. %>s, %s      상태 코드 (%>s 우선)
//! 6. %B, %b       응답 바이트 (%B 우선, %b는 `-` → 0)
//! 7. %{..}i %v    리퍼러 / 유저 에이전트 / 서버 이름 (그대로 복사)
//! ```
//!
//! `%l`은 토큰 위치만 소비하고 어떤 속성에도 매핑되지 않습니다.
//!
//! # 사용 예시
//! ```ignore
//! use logport_ingest::{format::LogFormat, mapper::map_entry, tokenizer::tokenize};
//!
//! let format = LogFormat::compile("common")?;
//! let tokens = tokenize(line);
//! let entry = map_entry(&format, &tokens)?;
//! ```

use std::collections::HashMap;

use chrono::DateTime;
use logport_core::types::{HttpMethod, HttpStatus, LogEntry};

use crate::error::IngestError;
use crate::format::{LogField, LogFormat};

/// `%t` 토큰의 고정 파싱 패턴 (영문 월 약자, 예: `19/Oct/2008:19:45:38 -0700`)
const TIMESTAMP_PATTERN: &str = "%d/%b/%Y:%H:%M:%S %z";

/// 토큰 시퀀스를 포맷에 맞춰 로그 엔트리로 매핑합니다.
///
/// 토큰은 디스크립터에 위치 기반으로 결합됩니다. `None` 자리 표시자는
/// 토큰을 소비하되 무시되고, 중복 디렉티브는 마지막 토큰이 이깁니다.
///
/// # Errors
/// 토큰 수가 포맷의 필드 수와 다르면
/// [`IngestError::FieldCountMismatch`]를 반환합니다. 개별 필드의 파싱
/// 실패는 오류가 아니며 해당 속성만 비워 둡니다.
pub fn map_entry(format: &LogFormat, tokens: &[String]) -> Result<LogEntry, IngestError> {
    if tokens.len() != format.field_count() {
        return Err(IngestError::FieldCountMismatch {
            expected: format.field_count(),
            actual: tokens.len(),
        });
    }

    let mut table: HashMap<LogField, &str> = HashMap::new();
    for (field, token) in format.fields().iter().zip(tokens) {
        if let Some(field) = field {
            table.insert(*field, token.as_str());
        }
    }

    let mut entry = LogEntry::default();

    if let Some(token) = table.get(&LogField::RemoteHost) {
        entry.remote_host = Some((*token).to_owned());
    }
    if let Some(token) = table.get(&LogField::RemoteUser) {
        entry.remote_user = Some((*token).to_owned());
    }

    if let Some(token) = table.get(&LogField::Timestamp) {
        entry.timestamp = DateTime::parse_from_str(token, TIMESTAMP_PATTERN).ok();
    }

    if let Some(token) = table.get(&LogField::RequestLine) {
        apply_request_line(&mut entry, token);
    }

    // 전용 디렉티브는 %r에서 얻은 값을 덮어씁니다. 파싱에 실패한 규칙은
    // 기존 값을 지우지 않습니다.
    if let Some(method) = table
        .get(&LogField::Method)
        .and_then(|token| HttpMethod::from_token(token))
    {
        entry.method = Some(method);
    }
    if let Some(token) = table.get(&LogField::UrlPath) {
        entry.path = Some((*token).to_owned());
    }

    // 상태 코드: %>s가 %s보다 우선하며, %>s가 있으면 %s는 참조하지 않습니다.
    if let Some(token) = table
        .get(&LogField::LastStatus)
        .or_else(|| table.get(&LogField::Status))
    {
        entry.status = token.parse::<u16>().ok().and_then(HttpStatus::from_code);
    }

    // 응답 바이트: %B가 %b보다 우선합니다. %b만 CLF의 `-` → 0 규칙을
    // 적용합니다.
    if let Some(token) = table.get(&LogField::Bytes) {
        entry.bytes_sent = token.parse().ok();
    } else if let Some(token) = table.get(&LogField::BytesClf) {
        entry.bytes_sent = if *token == "-" {
            Some(0)
        } else {
            token.parse().ok()
        };
    }

    if let Some(token) = table.get(&LogField::Referer) {
        entry.referer = Some((*token).to_owned());
    }
    if let Some(token) = table.get(&LogField::UserAgent) {
        entry.user_agent = Some((*token).to_owned());
    }
    if let Some(token) = table.get(&LogField::ServerName) {
        entry.server_name = Some((*token).to_owned());
    }

    Ok(entry)
}

/// `%r` 요청 첫 줄을 분해합니다: `메서드 요청-대상 프로토콜`.
///
/// 각 부분은 독립적으로 적용되며, 누락되거나 파싱할 수 없는 부분은
/// 건너뜁니다.
fn apply_request_line(entry: &mut LogEntry, token: &str) {
    let mut parts = token.split_whitespace();

    if let Some(method) = parts.next().and_then(HttpMethod::from_token) {
        entry.method = Some(method);
    }
    if let Some(target) = parts.next() {
        apply_request_target(entry, target);
    }
    if let Some(protocol) = parts.next() {
        entry.protocol = Some(protocol.to_owned());
    }
}

/// 요청 대상을 `path`/`query`로 분해합니다.
///
/// origin 형식은 `?`에서 분리하고, 절대 형식은 스킴과 권한부를 건너뛴 뒤
/// 첫 `/`부터 해석합니다. `*`(asterisk 형식)는 조용히 비워 두고, 제어
/// 문자나 깨진 퍼센트 이스케이프가 있는 대상은 경고 후 비워 둡니다.
/// 어느 경우든 매핑 전체는 계속 진행됩니다.
fn apply_request_target(entry: &mut LogEntry, target: &str) {
    if target == "*" {
        return;
    }
    if target.chars().any(char::is_control) || has_broken_escape(target) {
        tracing::warn!(target = %target, "malformed request target, path left unset");
        return;
    }

    let origin = if target.starts_with('/') {
        target
    } else if let Some((_, rest)) = target.split_once("://") {
        match rest.find('/') {
            Some(slash) => &rest[slash..],
            None => return,
        }
    } else {
        target
    };

    match origin.split_once('?') {
        Some((path, query)) => {
            entry.path = Some(path.to_owned());
            entry.query = Some(query.to_owned());
        }
        None => entry.path = Some(origin.to_owned()),
    }
}

/// `%`가 16진수 두 자리로 이어지지 않는 퍼센트 이스케이프를 찾습니다.
fn has_broken_escape(target: &str) -> bool {
    let bytes = target.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            match bytes.get(i + 1).zip(bytes.get(i + 2)) {
                Some((hi, lo)) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => i += 3,
                _ => return true,
            }
        } else {
            i += 1;
        }
    }
    false
}
