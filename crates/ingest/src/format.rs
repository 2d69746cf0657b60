//! 로그 포맷 스펙 컴파일러
//!
//! Apache/NCSA 액세스 로그의 디렉티브 문자열(예: `%h %l %u %t "%r" %>s %b`)을
//! 필드 디스크립터 시퀀스 [`LogFormat`]으로 컴파일합니다.
//!
//! # 디렉티브 카탈로그
//! ```text
//! %h   원격 호스트          %l   원격 로그네임        %u   원격 사용자
//! %t   요청 시각 [...]      %r   요청 첫 줄 "..."     %s   상태 코드
//! %>s  최종 상태 코드       %b   응답 바이트 (CLF)    %B   응답 바이트
//! %m   메서드               %U   URL 경로             %v   정식 서버 이름
//! %{Referer}i 리퍼러        %{User-agent}i 유저 에이전트
//! ```
//!
//! # 사용 예시
//! ```ignore
//! use logport_ingest::format::LogFormat;
//!
//! let format = LogFormat::compile("combined")?;
//! assert_eq!(format.field_count(), 9);
//! ```

use std::fmt;

use crate::error::IngestError;

/// `common` 프리셋의 전개 형태 (NCSA Common Log Format)
pub const COMMON_FORMAT: &str = "%h %l %u %t \"%r\" %>s %b";

/// `combined` 프리셋의 전개 형태 (common + 리퍼러 + 유저 에이전트)
pub const COMBINED_FORMAT: &str = "%h %l %u %t \"%r\" %>s %b \"%{Referer}i\" \"%{User-agent}i\"";

/// `common_with_vhost` 프리셋의 전개 형태 (`%v` 접두 common)
pub const COMMON_WITH_VHOST_FORMAT: &str = "%v %h %l %u %t \"%r\" %>s %b";

/// 토큰 추출 방식
///
/// 디렉티브가 로그 라인에서 어떤 구분자로 감싸여 기록되는지를 나타냅니다.
/// 토크나이저는 포맷과 무관하게 라인 전체를 스캔하므로 이 값은
/// 디스크립터의 메타데이터이며, 매핑 규칙에는 영향을 주지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    /// 공백으로 구분되는 일반 토큰
    Plain,
    /// `"..."`로 감싸인 토큰
    Quoted,
    /// `[...]`로 감싸인 토큰
    Bracketed,
}

/// 필드 디스크립터
///
/// 알려진 디렉티브의 고정 카탈로그입니다. 각 변형은 디렉티브 리터럴과
/// 추출 방식을 보고하는 프로세스 전역 불변 플라이웨이트입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogField {
    /// `%h` 원격 호스트
    RemoteHost,
    /// `%l` 원격 로그네임 (identd) -- 토큰 위치만 차지하고 매핑되지 않음
    RemoteLogname,
    /// `%u` 원격 사용자
    RemoteUser,
    /// `%t` 요청 시각
    Timestamp,
    /// `%r` 요청 첫 줄 (`메서드 경로 프로토콜`)
    RequestLine,
    /// `%s` 상태 코드
    Status,
    /// `%>s` 최종 상태 코드
    LastStatus,
    /// `%b` 응답 바이트 (CLF: `-`는 0)
    BytesClf,
    /// `%B` 응답 바이트
    Bytes,
    /// `%m` 요청 메서드
    Method,
    /// `%U` URL 경로
    UrlPath,
    /// `%v` 정식 서버 이름
    ServerName,
    /// `%{Referer}i` 리퍼러 헤더
    Referer,
    /// `%{User-agent}i` 유저 에이전트 헤더
    UserAgent,
}

impl LogField {
    /// 카탈로그의 모든 디스크립터
    pub const ALL: [LogField; 14] = [
        LogField::RemoteHost,
        LogField::RemoteLogname,
        LogField::RemoteUser,
        LogField::Timestamp,
        LogField::RequestLine,
        LogField::Status,
        LogField::LastStatus,
        LogField::BytesClf,
        LogField::Bytes,
        LogField::Method,
        LogField::UrlPath,
        LogField::ServerName,
        LogField::Referer,
        LogField::UserAgent,
    ];

    /// 디렉티브 리터럴을 반환합니다.
    pub fn directive(self) -> &'static str {
        match self {
            LogField::RemoteHost => "%h",
            LogField::RemoteLogname => "%l",
            LogField::RemoteUser => "%u",
            LogField::Timestamp => "%t",
            LogField::RequestLine => "%r",
            LogField::Status => "%s",
            LogField::LastStatus => "%>s",
            LogField::BytesClf => "%b",
            LogField::Bytes => "%B",
            LogField::Method => "%m",
            LogField::UrlPath => "%U",
            LogField::ServerName => "%v",
            LogField::Referer => "%{Referer}i",
            LogField::UserAgent => "%{User-agent}i",
        }
    }

    /// 이 디스크립터의 토큰 추출 방식을 반환합니다.
    pub fn capture(self) -> CaptureKind {
        match self {
            LogField::RequestLine | LogField::Referer | LogField::UserAgent => CaptureKind::Quoted,
            LogField::Timestamp => CaptureKind::Bracketed,
            _ => CaptureKind::Plain,
        }
    }
}

impl fmt::Display for LogField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.directive())
    }
}

/// 컴파일된 로그 포맷
///
/// 필드 디스크립터의 순서 있는 시퀀스입니다. 중복 디렉티브가 허용되며,
/// `None`은 매핑에서 건너뛰는 자리 표시자로 필드 수에는 포함됩니다.
/// [`compile`](Self::compile)로 한 번 생성되면 불변이고, 동등성은
/// 시퀀스 단위 구조적 비교입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFormat {
    fields: Vec<Option<LogField>>,
}

impl LogFormat {
    /// 디렉티브 문자열 또는 프리셋 이름을 컴파일합니다.
    ///
    /// 프리셋 이름(`common`, `combined`, `common_with_vhost`)은 대소문자를
    /// 구분하며 일반 스캔보다 먼저 해석됩니다. 디렉티브 사이의 공백과 기타
    /// 문자는 컴파일 결과에 영향을 주지 않고(`%l%u` ≡ `%l %u`), 알 수 없는
    /// 디렉티브는 조용히 건너뜁니다.
    ///
    /// # Errors
    /// 스펙이 비어 있거나 인식 가능한 디렉티브가 하나도 없으면
    /// [`IngestError::InvalidFormat`]을 반환합니다.
    pub fn compile(spec: &str) -> Result<Self, IngestError> {
        let expanded = match spec {
            "common" => COMMON_FORMAT,
            "combined" => COMBINED_FORMAT,
            "common_with_vhost" => COMMON_WITH_VHOST_FORMAT,
            other => other,
        };

        if expanded.trim().is_empty() {
            return Err(IngestError::InvalidFormat {
                spec: spec.to_owned(),
                reason: "format spec is empty".to_owned(),
            });
        }

        let fields = Self::scan(expanded);
        if fields.is_empty() {
            return Err(IngestError::InvalidFormat {
                spec: spec.to_owned(),
                reason: "no recognizable directive".to_owned(),
            });
        }

        Ok(Self {
            fields: fields.into_iter().map(Some).collect(),
        })
    }

    /// 디스크립터 시퀀스로 포맷을 직접 생성합니다.
    ///
    /// `None` 자리 표시자는 토큰 위치를 소비하되 어떤 속성에도 매핑되지
    /// 않습니다.
    pub fn from_fields(fields: Vec<Option<LogField>>) -> Self {
        Self { fields }
    }

    /// 필드 디스크립터 시퀀스를 반환합니다.
    pub fn fields(&self) -> &[Option<LogField>] {
        &self.fields
    }

    /// 필드 수를 반환합니다. 라인의 토큰 수가 이 값과 같아야 매핑이
    /// 성공합니다.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// 전개된 스펙 문자열에서 `%...` 시퀀스를 직접 패턴 매칭으로
    /// 스캔합니다.
    fn scan(expanded: &str) -> Vec<LogField> {
        let mut fields = Vec::new();
        let mut rest = expanded;

        while let Some(pos) = rest.find('%') {
            rest = &rest[pos + 1..];
            if let Some((field, consumed)) = Self::match_directive(rest) {
                fields.push(field);
                rest = &rest[consumed..];
            }
            // 매칭 실패 시 '%' 다음 위치부터 스캔을 계속합니다.
        }

        fields
    }

    /// `%` 바로 뒤부터 시작하는 디렉티브 본문을 매칭합니다.
    ///
    /// 반환값은 (디스크립터, 소비한 바이트 수)이며, 알 수 없는 디렉티브는
    /// `None`입니다. 두 글자 디렉티브(`%>s`)를 한 글자 디렉티브(`%s`)보다
    /// 먼저 시도합니다.
    fn match_directive(rest: &str) -> Option<(LogField, usize)> {
        if rest.starts_with(">s") {
            return Some((LogField::LastStatus, 2));
        }

        match rest.chars().next()? {
            'h' => Some((LogField::RemoteHost, 1)),
            'l' => Some((LogField::RemoteLogname, 1)),
            'u' => Some((LogField::RemoteUser, 1)),
            't' => Some((LogField::Timestamp, 1)),
            'r' => Some((LogField::RequestLine, 1)),
            's' => Some((LogField::Status, 1)),
            'b' => Some((LogField::BytesClf, 1)),
            'B' => Some((LogField::Bytes, 1)),
            'm' => Some((LogField::Method, 1)),
            'U' => Some((LogField::UrlPath, 1)),
            'v' => Some((LogField::ServerName, 1)),
            '{' => Self::match_header_directive(rest),
            _ => None,
        }
    }

    /// `%{Name}i` 형태의 요청 헤더 디렉티브를 매칭합니다.
    ///
    /// `Referer`와 `User-agent`만 전용 디스크립터로 연결되며, 다른 헤더
    /// 이름은 알 수 없는 디렉티브로 취급해 건너뜁니다.
    fn match_header_directive(rest: &str) -> Option<(LogField, usize)> {
        let close = rest.find('}')?;
        let name = &rest[1..close];
        if !rest[close + 1..].starts_with('i') {
            return None;
        }

        let field = match name {
            "Referer" => LogField::Referer,
            "User-agent" => LogField::UserAgent,
            _ => return None,
        };
        Some((field, close + 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_common_preset() {
        let format = LogFormat::compile("common").unwrap();
        assert_eq!(format.field_count(), 7);
        assert_eq!(
            format.fields(),
            &[
                Some(LogField::RemoteHost),
                Some(LogField::RemoteLogname),
                Some(LogField::RemoteUser),
                Some(LogField::Timestamp),
                Some(LogField::RequestLine),
                Some(LogField::LastStatus),
                Some(LogField::BytesClf),
            ]
        );
    }

    #[test]
    fn compile_combined_preset() {
        let format = LogFormat::compile("combined").unwrap();
        assert_eq!(format.field_count(), 9);
        assert_eq!(format.fields()[7], Some(LogField::Referer));
        assert_eq!(format.fields()[8], Some(LogField::UserAgent));
    }

    #[test]
    fn compile_common_with_vhost_preset() {
        let format = LogFormat::compile("common_with_vhost").unwrap();
        assert_eq!(format.field_count(), 8);
        assert_eq!(format.fields()[0], Some(LogField::ServerName));
    }

    #[test]
    fn presets_match_literal_expansions() {
        assert_eq!(
            LogFormat::compile("common").unwrap(),
            LogFormat::compile(COMMON_FORMAT).unwrap()
        );
        assert_eq!(
            LogFormat::compile("combined").unwrap(),
            LogFormat::compile(COMBINED_FORMAT).unwrap()
        );
        assert_eq!(
            LogFormat::compile("common_with_vhost").unwrap(),
            LogFormat::compile(COMMON_WITH_VHOST_FORMAT).unwrap()
        );
    }

    #[test]
    fn presets_are_pairwise_distinct() {
        let common = LogFormat::compile("common").unwrap();
        let combined = LogFormat::compile("combined").unwrap();
        let vhost = LogFormat::compile("common_with_vhost").unwrap();
        assert_ne!(common, combined);
        assert_ne!(common, vhost);
        assert_ne!(combined, vhost);
    }

    #[test]
    fn preset_names_are_case_sensitive() {
        assert!(LogFormat::compile("COMMON").is_err());
        assert!(LogFormat::compile("Combined").is_err());
    }

    #[test]
    fn compile_empty_spec_fails() {
        let err = LogFormat::compile("").unwrap_err();
        assert!(matches!(err, IngestError::InvalidFormat { .. }));
    }

    #[test]
    fn compile_whitespace_only_spec_fails() {
        assert!(LogFormat::compile("   \t  ").is_err());
    }

    #[test]
    fn compile_no_directives_fails() {
        let err = LogFormat::compile("hello world").unwrap_err();
        assert!(err.to_string().contains("no recognizable directive"));
    }

    #[test]
    fn whitespace_between_directives_is_insignificant() {
        let packed = LogFormat::compile("%l%u").unwrap();
        let spaced = LogFormat::compile("%l %u").unwrap();
        assert_eq!(packed, spaced);
        assert_eq!(packed.field_count(), 2);
    }

    #[test]
    fn unknown_directive_is_skipped() {
        let format = LogFormat::compile("%h %q %u").unwrap();
        assert_eq!(
            format.fields(),
            &[Some(LogField::RemoteHost), Some(LogField::RemoteUser)]
        );
    }

    #[test]
    fn last_status_matches_before_status() {
        let format = LogFormat::compile("%>s").unwrap();
        assert_eq!(format.fields(), &[Some(LogField::LastStatus)]);

        let both = LogFormat::compile("%>s %s").unwrap();
        assert_eq!(
            both.fields(),
            &[Some(LogField::LastStatus), Some(LogField::Status)]
        );
    }

    #[test]
    fn bytes_directives_are_case_distinct() {
        let clf = LogFormat::compile("%b").unwrap();
        let plain = LogFormat::compile("%B").unwrap();
        assert_eq!(clf.fields(), &[Some(LogField::BytesClf)]);
        assert_eq!(plain.fields(), &[Some(LogField::Bytes)]);
    }

    #[test]
    fn header_directives_resolve() {
        let format = LogFormat::compile("%{Referer}i %{User-agent}i").unwrap();
        assert_eq!(
            format.fields(),
            &[Some(LogField::Referer), Some(LogField::UserAgent)]
        );
    }

    #[test]
    fn unknown_header_name_is_skipped() {
        let format = LogFormat::compile("%{X-Forwarded-For}i %h").unwrap();
        assert_eq!(format.fields(), &[Some(LogField::RemoteHost)]);
        assert!(LogFormat::compile("%{X-Forwarded-For}i").is_err());
    }

    #[test]
    fn header_directive_without_close_is_skipped() {
        let format = LogFormat::compile("%{Referer %h").unwrap();
        assert_eq!(format.fields(), &[Some(LogField::RemoteHost)]);
    }

    #[test]
    fn header_directive_without_i_suffix_is_skipped() {
        let format = LogFormat::compile("%{Referer}x %h").unwrap();
        assert_eq!(format.fields(), &[Some(LogField::RemoteHost)]);
    }

    #[test]
    fn duplicate_directives_are_allowed() {
        let format = LogFormat::compile("%h %h").unwrap();
        assert_eq!(format.field_count(), 2);
    }

    #[test]
    fn every_directive_literal_compiles_to_itself() {
        for field in LogField::ALL {
            let format = LogFormat::compile(field.directive()).unwrap();
            assert_eq!(format.fields(), &[Some(field)], "directive {}", field);
        }
    }

    #[test]
    fn capture_kinds() {
        assert_eq!(LogField::RemoteHost.capture(), CaptureKind::Plain);
        assert_eq!(LogField::Timestamp.capture(), CaptureKind::Bracketed);
        assert_eq!(LogField::RequestLine.capture(), CaptureKind::Quoted);
        assert_eq!(LogField::Referer.capture(), CaptureKind::Quoted);
        assert_eq!(LogField::UserAgent.capture(), CaptureKind::Quoted);
    }

    #[test]
    fn from_fields_counts_none_placeholders() {
        let format = LogFormat::from_fields(vec![
            Some(LogField::RemoteHost),
            None,
            Some(LogField::RemoteUser),
        ]);
        assert_eq!(format.field_count(), 3);
    }

    #[test]
    fn display_prints_directive_literal() {
        assert_eq!(LogField::LastStatus.to_string(), "%>s");
        assert_eq!(LogField::UserAgent.to_string(), "%{User-agent}i");
    }

    // === Edge Case Tests ===

    #[test]
    fn compile_lone_percent_fails() {
        assert!(LogFormat::compile("%").is_err());
    }

    #[test]
    fn compile_trailing_percent_is_ignored() {
        let format = LogFormat::compile("%h %").unwrap();
        assert_eq!(format.fields(), &[Some(LogField::RemoteHost)]);
    }

    #[test]
    fn compile_double_percent_skips_first() {
        let format = LogFormat::compile("%%h").unwrap();
        assert_eq!(format.fields(), &[Some(LogField::RemoteHost)]);
    }

    #[test]
    fn compile_with_unicode_separators() {
        let format = LogFormat::compile("%h 한글 구분자 %u").unwrap();
        assert_eq!(format.field_count(), 2);
    }

    #[test]
    fn compile_with_arbitrary_separators() {
        let format = LogFormat::compile("%h|%u|%b").unwrap();
        assert_eq!(format.field_count(), 3);
    }

    // Property-based tests using proptest
    #[cfg(test)]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn compile_arbitrary_string_does_not_panic(spec in ".{0,200}") {
                let _ = LogFormat::compile(&spec);
                // Should never panic
            }

            #[test]
            fn field_count_equals_directive_occurrences(
                fields in prop::collection::vec(
                    prop::sample::select(LogField::ALL.to_vec()),
                    1..20,
                ),
                sep in prop::sample::select(vec![" ", "", "\t", " | ", "\""]),
            ) {
                let spec = fields
                    .iter()
                    .map(|f| f.directive())
                    .collect::<Vec<_>>()
                    .join(sep);
                let format = LogFormat::compile(&spec).unwrap();
                prop_assert_eq!(format.field_count(), fields.len());
            }

            #[test]
            fn compile_is_deterministic(spec in ".{1,100}") {
                let first = LogFormat::compile(&spec);
                let second = LogFormat::compile(&spec);
                match (first, second) {
                    (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
                    (Err(_), Err(_)) => {}
                    _ => prop_assert!(false, "compile not deterministic"),
                }
            }
        }
    }
}
