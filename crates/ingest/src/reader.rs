//! 로그 파일 리더
//!
//! [`LogFile`]은 포맷과 파일 경로의 불변 쌍이고, [`LogFileReader`]는 그
//! 파일을 라인 버퍼로 스트리밍하며 토크나이저와 매퍼를 거쳐 한 번에 한
//! 엔트리씩 돌려줍니다.
//!
//! # 실패 격리
//! - 필드 수 불일치는 라인 단위로 복구 가능합니다. 리더는 라인 번호를
//!   붙여 [`IngestError::MalformedLine`]으로 보고하고, 파일을 닫거나
//!   중단하지 않습니다. 건너뛸지는 호출자가 결정합니다.
//! - 스트림 중간의 I/O 오류는 해당 파일에 대해 종결적입니다. `error!`로
//!   기록하고 이후는 EOF로 취급하며, 호출자에게 전파하지 않습니다.
//!
//! # 사용 예시
//! ```ignore
//! use logport_ingest::{format::LogFormat, reader::{LogFile, LogFileReader}};
//!
//! let file = LogFile::new("/var/log/access.log", LogFormat::compile("common")?)?;
//! let mut reader = LogFileReader::open(file).await?;
//! while let Some(entry) = reader.read_entry().await? {
//!     println!("{entry}");
//! }
//! ```

use std::path::{Path, PathBuf};

use logport_core::types::LogEntry;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

use crate::error::IngestError;
use crate::format::LogFormat;
use crate::mapper::map_entry;
use crate::tokenizer::tokenize;

/// 포맷과 파일 경로의 불변 쌍
///
/// 동등성은 경로와 포맷이 모두 같을 때 성립합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    path: PathBuf,
    format: LogFormat,
}

impl LogFile {
    /// 새 로그 파일을 생성합니다.
    ///
    /// # Errors
    /// 경로가 디렉토리를 가리키면 [`IngestError::FileRead`]를 반환합니다.
    /// 존재하지 않는 파일은 생성 시점이 아니라 열 때 실패합니다.
    pub fn new(path: impl Into<PathBuf>, format: LogFormat) -> Result<Self, IngestError> {
        let path = path.into();
        if path.is_dir() {
            return Err(IngestError::FileRead {
                path: path.display().to_string(),
                reason: "path is a directory".to_owned(),
            });
        }
        Ok(Self { path, format })
    }

    /// 파일 경로를 반환합니다.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 이 파일에 적용할 포맷을 반환합니다.
    pub fn format(&self) -> &LogFormat {
        &self.format
    }
}

/// 한 로그 파일을 엔트리 스트림으로 읽는 리더
#[derive(Debug)]
pub struct LogFileReader {
    file: LogFile,
    lines: Lines<BufReader<File>>,
    /// 1부터 시작하는 현재 라인 번호
    line_number: usize,
    /// 지금까지 성공적으로 매핑한 엔트리 수
    entries_read: u64,
    /// 스트림 I/O 오류 이후 EOF로 고정
    stream_failed: bool,
}

impl LogFileReader {
    /// 로그 파일을 엽니다.
    ///
    /// # Errors
    /// 파일을 열 수 없으면 [`IngestError::FileRead`]를 반환합니다.
    pub async fn open(file: LogFile) -> Result<Self, IngestError> {
        let handle = File::open(file.path())
            .await
            .map_err(|e| IngestError::FileRead {
                path: file.path().display().to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            file,
            lines: BufReader::new(handle).lines(),
            line_number: 0,
            entries_read: 0,
            stream_failed: false,
        })
    }

    /// 다음 엔트리를 읽습니다.
    ///
    /// 파일 끝에 도달하면 `Ok(None)`을 반환합니다.
    ///
    /// # Errors
    /// 토큰 수가 포맷과 맞지 않는 라인은 라인 번호를 붙인
    /// [`IngestError::MalformedLine`]으로 보고합니다. 리더는 그대로 다음
    /// 라인으로 진행할 수 있는 상태를 유지합니다.
    pub async fn read_entry(&mut self) -> Result<Option<LogEntry>, IngestError> {
        if self.stream_failed {
            return Ok(None);
        }

        let line = match self.lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return Ok(None),
            Err(e) => {
                tracing::error!(
                    path = %self.file.path().display(),
                    error = %e,
                    "stream error, treating file as ended"
                );
                self.stream_failed = true;
                return Ok(None);
            }
        };
        self.line_number += 1;

        let tokens = tokenize(&line);
        match map_entry(self.file.format(), &tokens) {
            Ok(entry) => {
                self.entries_read += 1;
                Ok(Some(entry))
            }
            Err(err @ IngestError::FieldCountMismatch { .. }) => {
                Err(IngestError::MalformedLine {
                    line: self.line_number,
                    reason: err.to_string(),
                })
            }
            Err(other) => Err(other),
        }
    }

    /// 최대 `count`개의 엔트리를 읽습니다.
    ///
    /// 파일 끝에서 일찍 멈추고, 잘못된 라인은 경고 후 건너뜁니다.
    pub async fn read(&mut self, count: usize) -> Vec<LogEntry> {
        let mut entries = Vec::with_capacity(count.min(1_024));
        while entries.len() < count {
            match self.read_entry().await {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(
                        path = %self.file.path().display(),
                        error = %e,
                        "skipping malformed line"
                    );
                    metrics::counter!(logport_core::metrics::INGEST_LINES_SKIPPED_TOTAL)
                        .increment(1);
                }
            }
        }
        entries
    }

    /// 읽고 있는 로그 파일을 반환합니다.
    pub fn file(&self) -> &LogFile {
        &self.file
    }

    /// 지금까지 성공적으로 매핑한 엔트리 수를 반환합니다.
    pub fn entries_read(&self) -> u64 {
        self.entries_read
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const COMMON_LINE: &str =
        r#"192.168.123.12 - frank [19/Oct/2008:19:45:38 -0700] "GET /index.html HTTP/1.1" 200 1024"#;

    fn common_format() -> LogFormat {
        LogFormat::compile("common").unwrap()
    }

    fn write_temp(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(tmp, "{line}").unwrap();
        }
        tmp.flush().unwrap();
        tmp
    }

    #[test]
    fn log_file_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = LogFile::new(dir.path(), common_format()).unwrap_err();
        assert!(matches!(err, IngestError::FileRead { .. }));
        assert!(err.to_string().contains("directory"));
    }

    #[test]
    fn log_file_equality_includes_format() {
        let a = LogFile::new("/tmp/access.log", common_format()).unwrap();
        let b = LogFile::new("/tmp/access.log", common_format()).unwrap();
        let c = LogFile::new("/tmp/other.log", common_format()).unwrap();
        let d = LogFile::new(
            "/tmp/access.log",
            LogFormat::compile("combined").unwrap(),
        )
        .unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[tokio::test]
    async fn open_missing_file_fails() {
        let file = LogFile::new("/nonexistent/access.log", common_format()).unwrap();
        let err = LogFileReader::open(file).await.unwrap_err();
        assert!(matches!(err, IngestError::FileRead { .. }));
    }

    #[tokio::test]
    async fn read_entry_streams_until_eof() {
        let tmp = write_temp(&[COMMON_LINE, COMMON_LINE, COMMON_LINE]);
        let file = LogFile::new(tmp.path(), common_format()).unwrap();
        let mut reader = LogFileReader::open(file).await.unwrap();

        for _ in 0..3 {
            let entry = reader.read_entry().await.unwrap().unwrap();
            assert_eq!(entry.remote_host.as_deref(), Some("192.168.123.12"));
            assert_eq!(entry.remote_user.as_deref(), Some("frank"));
        }
        assert!(reader.read_entry().await.unwrap().is_none());
        assert_eq!(reader.entries_read(), 3);
    }

    #[tokio::test]
    async fn malformed_line_is_recoverable() {
        let tmp = write_temp(&[COMMON_LINE, "short line", COMMON_LINE]);
        let file = LogFile::new(tmp.path(), common_format()).unwrap();
        let mut reader = LogFileReader::open(file).await.unwrap();

        assert!(reader.read_entry().await.unwrap().is_some());

        let err = reader.read_entry().await.unwrap_err();
        assert!(matches!(err, IngestError::MalformedLine { line: 2, .. }));
        assert!(err.to_string().contains("line 2"));

        // 리더는 중단되지 않고 다음 라인을 계속 읽습니다.
        assert!(reader.read_entry().await.unwrap().is_some());
        assert!(reader.read_entry().await.unwrap().is_none());
        assert_eq!(reader.entries_read(), 2);
    }

    #[tokio::test]
    async fn line_numbers_are_one_based() {
        let tmp = write_temp(&["bad"]);
        let file = LogFile::new(tmp.path(), common_format()).unwrap();
        let mut reader = LogFileReader::open(file).await.unwrap();

        let err = reader.read_entry().await.unwrap_err();
        assert!(matches!(err, IngestError::MalformedLine { line: 1, .. }));
    }

    #[tokio::test]
    async fn read_stops_at_count_then_at_eof() {
        let tmp = write_temp(&[COMMON_LINE; 5]);
        let file = LogFile::new(tmp.path(), common_format()).unwrap();
        let mut reader = LogFileReader::open(file).await.unwrap();

        assert_eq!(reader.read(3).await.len(), 3);
        assert_eq!(reader.read(10).await.len(), 2);
        assert!(reader.read(10).await.is_empty());
    }

    #[tokio::test]
    async fn read_skips_malformed_lines() {
        let tmp = write_temp(&[COMMON_LINE, "broken", COMMON_LINE, "also broken", COMMON_LINE]);
        let file = LogFile::new(tmp.path(), common_format()).unwrap();
        let mut reader = LogFileReader::open(file).await.unwrap();

        let entries = reader.read(10).await;
        assert_eq!(entries.len(), 3);
    }

    #[tokio::test]
    async fn empty_file_is_immediate_eof() {
        let tmp = write_temp(&[]);
        let file = LogFile::new(tmp.path(), common_format()).unwrap();
        let mut reader = LogFileReader::open(file).await.unwrap();

        assert!(reader.read_entry().await.unwrap().is_none());
        assert_eq!(reader.entries_read(), 0);
    }

    #[tokio::test]
    async fn empty_lines_are_malformed_not_fatal() {
        let tmp = write_temp(&["", COMMON_LINE]);
        let file = LogFile::new(tmp.path(), common_format()).unwrap();
        let mut reader = LogFileReader::open(file).await.unwrap();

        assert!(reader.read_entry().await.is_err());
        assert!(reader.read_entry().await.unwrap().is_some());
    }
}
