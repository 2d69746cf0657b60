//! 파일 임포터 -- 파일 큐와 단일 임포트 워커
//!
//! 임포트할 파일을 유계 큐에 쌓고, 백그라운드 워커 하나가 한 번에 한
//! 파일씩 꺼내 끝까지 읽습니다. 파싱된 엔트리는 공유 수집 큐로 들어가고,
//! 저장은 영속화 풀이 병렬로 처리합니다. 파일 읽기 자체는 항상 순차입니다.
//!
//! ```text
//! enqueue(format, paths) ──> 파일 큐 ──> ImportWorker ──> LogFileReader
//!                                             |
//!                                        수집 큐.put()
//!                                             |
//!                                 파일 완료: 통계 기록 + 드레인 신호
//! ```
//!
//! 디렉토리 인자는 enqueue 시점에 안에 든 파일들로 펼쳐집니다
//! (`recursive`면 하위 디렉토리 포함). 이미 큐에 있는 경로는 에러가 아니라
//! 로그 한 줄을 남기고 건너뜁니다.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use logport_core::metrics as m;
use logport_core::stats::ImportStats;
use logport_core::types::LogEntry;

use crate::error::IngestError;
use crate::format::LogFormat;
use crate::queue::{ObservableQueue, QueueDepthObserver};
use crate::reader::{LogFile, LogFileReader};

/// 경로 집합 잠금. 집합에는 불변식이 없으므로 중독된 락도 복구합니다.
fn lock_paths(paths: &Mutex<HashSet<PathBuf>>) -> MutexGuard<'_, HashSet<PathBuf>> {
    paths.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 파일 임포터
///
/// `enqueue`는 경로를 펼쳐 파일 큐에 넣고 바로 돌아옵니다. 실제 읽기는
/// [`start`](Self::start)로 띄운 워커가 수행합니다. 파일 하나가 끝까지
/// 처리되면 통계 수집기에 기록하고, 잔여 배치가 큐에 남지 않도록 플러시
/// 신호를 한 번 보냅니다.
pub struct FileImporter {
    /// 임포트 대기 중인 파일 큐
    file_queue: Arc<ObservableQueue<LogFile>>,
    /// 큐에 들어 있는 경로 집합 (중복 스킵용)
    queued_paths: Arc<Mutex<HashSet<PathBuf>>>,
    /// 파싱된 엔트리가 들어가는 수집 큐
    entry_queue: Arc<ObservableQueue<LogEntry>>,
    /// 파일 완료 시 보내는 플러시 신호 송신단
    flush_tx: mpsc::UnboundedSender<()>,
    /// 임포트 통계 수집기
    stats: Arc<ImportStats>,
    /// 종료 토큰
    cancel: CancellationToken,
    /// 워커 태스크 핸들
    worker: Option<JoinHandle<()>>,
}

impl FileImporter {
    /// 새 임포터를 생성합니다.
    ///
    /// `flush_tx`는 영속화 풀이 받는 신호 채널의 송신단입니다. 파일 하나가
    /// 끝날 때마다 신호를 보내 `batch_size`에 못 미친 잔여 엔트리도
    /// 저장되게 합니다.
    pub fn new(
        entry_queue: Arc<ObservableQueue<LogEntry>>,
        flush_tx: mpsc::UnboundedSender<()>,
        stats: Arc<ImportStats>,
        file_queue_capacity: usize,
    ) -> Self {
        let mut file_queue = ObservableQueue::new(file_queue_capacity);
        file_queue.subscribe(Arc::new(QueueDepthObserver::new(m::INGEST_FILE_QUEUE_DEPTH)));

        Self {
            file_queue: Arc::new(file_queue),
            queued_paths: Arc::new(Mutex::new(HashSet::new())),
            entry_queue,
            flush_tx,
            stats,
            cancel: CancellationToken::new(),
            worker: None,
        }
    }

    /// 임포트 대기 중인 파일 수를 반환합니다.
    pub fn pending_files(&self) -> usize {
        self.file_queue.len()
    }

    /// 경로들을 파일 큐에 넣습니다. 넣은 파일 수를 반환합니다.
    ///
    /// 디렉토리는 안에 든 파일들로 펼칩니다 (`recursive`면 하위 디렉토리
    /// 포함). 읽을 수 없는 디렉토리는 경고만 남기고 다음 인자로
    /// 넘어갑니다. 존재하지 않는 파일은 여기서 거르지 않습니다. 열기
    /// 실패는 워커가 해당 파일만 건너뛰는 것으로 처리합니다.
    ///
    /// # Errors
    /// 파일 큐가 닫혀 더 넣을 수 없으면 [`IngestError::Channel`]을
    /// 반환합니다.
    pub async fn enqueue(
        &self,
        format: &LogFormat,
        paths: &[PathBuf],
        recursive: bool,
    ) -> Result<usize, IngestError> {
        let mut enqueued = 0usize;

        for arg in paths {
            let files = if arg.is_dir() {
                match expand_directory(arg, recursive).await {
                    Ok(files) => files,
                    Err(e) => {
                        warn!(path = %arg.display(), error = %e, "cannot list directory, skipping");
                        continue;
                    }
                }
            } else {
                vec![arg.clone()]
            };

            for path in files {
                if !lock_paths(&self.queued_paths).insert(path.clone()) {
                    info!(path = %path.display(), "file already queued, skipping");
                    continue;
                }

                let file = match LogFile::new(path.clone(), format.clone()) {
                    Ok(file) => file,
                    Err(e) => {
                        lock_paths(&self.queued_paths).remove(&path);
                        warn!(path = %path.display(), error = %e, "not importable, skipping");
                        continue;
                    }
                };

                if let Err(e) = self.file_queue.put(file).await {
                    lock_paths(&self.queued_paths).remove(&path);
                    return Err(e);
                }
                enqueued += 1;
            }
        }

        debug!(enqueued, "files enqueued for import");
        Ok(enqueued)
    }

    /// 임포트 워커를 스폰합니다.
    pub fn start(&mut self) {
        if self.worker.is_some() {
            warn!("file importer already started");
            return;
        }

        info!("starting file import worker");
        let worker = ImportWorker {
            file_queue: Arc::clone(&self.file_queue),
            queued_paths: Arc::clone(&self.queued_paths),
            entry_queue: Arc::clone(&self.entry_queue),
            flush_tx: self.flush_tx.clone(),
            stats: Arc::clone(&self.stats),
            cancel: self.cancel.clone(),
        };
        self.worker = Some(tokio::spawn(worker.run()));
    }

    /// 워커를 종료합니다. 처리 중이던 파일은 현재 위치에서 중단됩니다.
    ///
    /// 종료된 임포터는 재시작할 수 없습니다.
    pub async fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        info!("stopping file import worker");
        self.cancel.cancel();
        if let Err(e) = worker.await {
            warn!(error = %e, "file import worker terminated abnormally");
        }
        info!(
            files_imported = self.stats.file_count(),
            "file import worker stopped"
        );
    }
}

/// 디렉토리 안의 파일 경로를 모읍니다.
///
/// `recursive`가 아니면 바로 아래의 파일만 모으고 하위 디렉토리는
/// 무시합니다.
async fn expand_directory(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, IngestError> {
    let read_failed = |e: std::io::Error, path: &Path| IngestError::FileRead {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current)
            .await
            .map_err(|e| read_failed(e, &current))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| read_failed(e, &current))?
        {
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(|e| read_failed(e, &path))?;
            if file_type.is_dir() {
                if recursive {
                    pending.push(path);
                }
            } else {
                files.push(path);
            }
        }
    }

    Ok(files)
}

// ─── ImportWorker ────────────────────────────────────────────────────

/// 파일 큐를 소비하는 단일 워커
struct ImportWorker {
    file_queue: Arc<ObservableQueue<LogFile>>,
    queued_paths: Arc<Mutex<HashSet<PathBuf>>>,
    entry_queue: Arc<ObservableQueue<LogEntry>>,
    flush_tx: mpsc::UnboundedSender<()>,
    stats: Arc<ImportStats>,
    cancel: CancellationToken,
}

impl ImportWorker {
    async fn run(self) {
        debug!("file import worker started");
        loop {
            let file = tokio::select! {
                file = self.file_queue.take() => file,
                _ = self.cancel.cancelled() => {
                    debug!("file import worker received shutdown signal");
                    return;
                }
            };

            match file {
                Ok(file) => {
                    // 처리에 들어간 파일은 다시 enqueue할 수 있습니다.
                    lock_paths(&self.queued_paths).remove(file.path());
                    self.import_file(file).await;
                }
                Err(e) => {
                    error!(error = %e, "file queue closed, stopping import worker");
                    return;
                }
            }
        }
    }

    /// 파일 하나를 끝까지 읽어 수집 큐에 넣습니다.
    ///
    /// 줄 단위 실패는 건너뛰고 계속합니다. 파일을 열 수 없거나 스트림이
    /// 깨지면 해당 파일만 중단합니다. 어느 경우에도 다음 파일 처리는
    /// 계속됩니다.
    async fn import_file(&self, file: LogFile) {
        let path = file.path().to_path_buf();
        let started = Instant::now();

        let mut reader = match LogFileReader::open(file).await {
            Ok(reader) => reader,
            Err(e) => {
                error!(path = %path.display(), error = %e, "cannot open log file, skipping");
                return;
            }
        };

        let mut entries = 0u64;
        let mut skipped = 0u64;
        loop {
            match reader.read_entry().await {
                Ok(Some(entry)) => {
                    // put은 수집 큐가 가득 차면 대기합니다. 종료 신호가
                    // 오면 현재 파일을 그 자리에서 중단합니다.
                    let accepted = tokio::select! {
                        result = self.entry_queue.put(entry) => result,
                        _ = self.cancel.cancelled() => {
                            info!(path = %path.display(), entries, "shutdown during import, aborting file");
                            return;
                        }
                    };
                    if let Err(e) = accepted {
                        error!(path = %path.display(), error = %e, "entry queue closed, aborting file");
                        return;
                    }
                    entries += 1;
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping malformed line");
                    metrics::counter!(m::INGEST_LINES_SKIPPED_TOTAL).increment(1);
                    skipped += 1;
                }
            }
        }

        let elapsed = started.elapsed();
        self.stats.record(path.clone(), entries, elapsed);
        metrics::counter!(m::INGEST_FILES_IMPORTED_TOTAL).increment(1);

        // 파일이 끝났으니 batch_size에 못 미친 잔여 엔트리를 드레인합니다.
        if self.flush_tx.send(()).is_err() {
            debug!("flush signal dropped, persister pool gone");
        }

        info!(
            path = %path.display(),
            entries,
            skipped,
            elapsed = ?elapsed,
            "file import complete"
        );
    }
}
