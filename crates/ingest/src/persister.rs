//! 배치 영속화 -- 플러시 트리거와 워커 풀
//!
//! 수집 큐에 쌓인 엔트리를 배치로 모아 저장소의 벌크 쓰기로 기록합니다.
//! 플러시는 두 가지 신호로 시작됩니다.
//!
//! ```text
//! ObservableQueue ──on_added/on_empty──> FlushTrigger
//!                                            |
//!                                       신호 채널 (mpsc)
//!                                            |
//!                                    PersisterPool 워커 N개
//!                                            |
//!                                    LogStore.create_batch()
//! ```
//!
//! 신호를 받은 워커는 정착 지연(`flush_settle_ms`) 동안 막 추가되던
//! 엔트리가 도착하기를 기다린 뒤, 큐를 논블로킹으로 `batch_size + 1`개까지
//! 비우고 한 번의 벌크 쓰기로 저장합니다. 여러 신호가 겹쳐 빈 큐를
//! 드레인하는 워커는 no-op으로 끝납니다.
//!
//! 저장 실패 시 배치는 배치 id와 내용 전체를 로그로 남긴 뒤 폐기합니다.
//! 재시도하거나 큐에 되돌리지 않습니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use logport_core::metrics as m;
use logport_core::store::DynLogStore;
use logport_core::types::LogEntry;

use crate::config::IngestConfig;
use crate::queue::{ObservableQueue, QueueObserver};

// ─── FlushOutcome ────────────────────────────────────────────────────

/// 플러시 한 번의 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// 큐가 비어 있어 저장소를 호출하지 않았습니다.
    Idle,
    /// 배치가 저장소에 기록되었습니다. 값은 엔트리 수입니다.
    Persisted(usize),
    /// 저장 실패로 배치를 폐기했습니다. 값은 잃은 엔트리 수입니다.
    Dropped(usize),
}

// ─── FlushTrigger ────────────────────────────────────────────────────

/// 큐 이벤트를 플러시 신호로 변환하는 관찰자
///
/// 공유 카운터를 `batch_size`로 초기화하고 `on_added`마다 감소시킵니다.
/// 0 이하로 내려가면 카운터를 되돌리고 신호를 보냅니다. `on_empty`는
/// 조건 없이 신호를 보내 `batch_size`에 못 미친 잔여 배치가 큐에
/// 남지 않게 합니다.
///
/// 추가가 리셋과 경합하면 신호가 한 번 더 갈 수 있습니다. 빈 큐
/// 드레인은 no-op이므로 중복 신호는 허용됩니다.
pub struct FlushTrigger {
    /// 다음 크기 신호까지 남은 추가 횟수
    remaining: AtomicI64,
    /// 카운터 리셋 값
    batch_size: i64,
    /// 플러시 신호 송신단
    signal_tx: mpsc::UnboundedSender<()>,
}

impl FlushTrigger {
    /// 새 트리거를 생성합니다.
    ///
    /// 송신단은 [`PersisterPool`]에 넘긴 수신단과 같은 채널이어야 합니다.
    pub fn new(batch_size: usize, signal_tx: mpsc::UnboundedSender<()>) -> Self {
        let batch_size = i64::try_from(batch_size).unwrap_or(i64::MAX);
        Self {
            remaining: AtomicI64::new(batch_size),
            batch_size,
            signal_tx,
        }
    }

    /// 다음 크기 신호까지 남은 추가 횟수를 반환합니다.
    pub fn remaining(&self) -> i64 {
        self.remaining.load(Ordering::SeqCst)
    }

    fn submit(&self, reason: &'static str) {
        if self.signal_tx.send(()).is_ok() {
            debug!(reason, "flush signal submitted");
        } else {
            // 풀이 내려간 뒤의 신호는 버립니다.
            debug!(reason, "flush signal dropped, persister pool gone");
        }
    }
}

impl QueueObserver<LogEntry> for FlushTrigger {
    fn on_added(&self, _queue: &ObservableQueue<LogEntry>, _item: &LogEntry) {
        let prev = self.remaining.fetch_sub(1, Ordering::SeqCst);
        if prev <= 1 {
            self.remaining.store(self.batch_size, Ordering::SeqCst);
            self.submit("batch size reached");
        }
    }

    fn on_empty(&self, _queue: &ObservableQueue<LogEntry>) {
        self.submit("queue drained");
    }
}

// ─── PersisterPool ───────────────────────────────────────────────────

/// 배치 영속화 워커 풀
///
/// `flush_workers`개의 워커가 하나의 신호 채널을 나눠 받습니다. 신호
/// 하나당 플러시 한 번이며, 정착 지연과 드레인은 각 워커가 독립적으로
/// 수행합니다. `stop`은 워커에게 종료를 알리고 큐에 남은 엔트리를 모두
/// 드레인한 뒤 돌아옵니다.
///
/// 신호 채널은 조립하는 쪽에서 만듭니다. 송신단은 [`FlushTrigger`]와
/// 파일 임포터에, 수신단은 이 풀에 전달합니다.
///
/// # 사용 예시
/// ```ignore
/// let (signal_tx, signal_rx) = tokio::sync::mpsc::unbounded_channel();
/// let mut queue = ObservableQueue::new(config.queue_capacity);
/// queue.subscribe(Arc::new(FlushTrigger::new(config.batch_size, signal_tx)));
/// let queue = Arc::new(queue);
///
/// let mut pool = PersisterPool::new(Arc::clone(&queue), store, &config, signal_rx);
/// pool.start();
/// ```
pub struct PersisterPool {
    /// 엔트리 큐 (워커와 공유)
    queue: Arc<ObservableQueue<LogEntry>>,
    /// 저장소 협력자
    store: Arc<dyn DynLogStore>,
    /// 플러시당 최대 배치 크기
    batch_size: usize,
    /// 드레인 전 정착 지연
    settle: Duration,
    /// 워커 수
    worker_count: usize,
    /// 플러시 신호 수신단 (워커들이 공유)
    signal_rx: Arc<Mutex<mpsc::UnboundedReceiver<()>>>,
    /// 종료 토큰
    cancel: CancellationToken,
    /// 워커 태스크 핸들
    workers: Vec<JoinHandle<()>>,
    /// 저장된 엔트리 누계
    entries_persisted: Arc<AtomicU64>,
    /// 폐기된 배치 누계
    batches_dropped: Arc<AtomicU64>,
}

impl PersisterPool {
    /// 새 풀을 생성합니다. 워커는 [`start`](Self::start) 전까지 돌지 않습니다.
    pub fn new(
        queue: Arc<ObservableQueue<LogEntry>>,
        store: Arc<dyn DynLogStore>,
        config: &IngestConfig,
        signal_rx: mpsc::UnboundedReceiver<()>,
    ) -> Self {
        Self {
            queue,
            store,
            batch_size: config.batch_size,
            settle: config.flush_settle(),
            worker_count: config.effective_flush_workers(),
            signal_rx: Arc::new(Mutex::new(signal_rx)),
            cancel: CancellationToken::new(),
            workers: Vec::new(),
            entries_persisted: Arc::new(AtomicU64::new(0)),
            batches_dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 워커 수를 반환합니다.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// 지금까지 저장된 엔트리 수를 반환합니다.
    pub fn entries_persisted(&self) -> u64 {
        self.entries_persisted.load(Ordering::Relaxed)
    }

    /// 저장 실패로 폐기된 배치 수를 반환합니다.
    pub fn batches_dropped(&self) -> u64 {
        self.batches_dropped.load(Ordering::Relaxed)
    }

    /// 워커 태스크를 스폰합니다.
    pub fn start(&mut self) {
        if !self.workers.is_empty() {
            warn!("persister pool already started");
            return;
        }

        info!(
            workers = self.worker_count,
            batch_size = self.batch_size,
            settle_ms = self.settle.as_millis() as u64,
            store = self.store.name(),
            "starting persister pool"
        );

        for worker_id in 0..self.worker_count {
            let worker = PersisterWorker {
                worker_id,
                queue: Arc::clone(&self.queue),
                store: Arc::clone(&self.store),
                signal_rx: Arc::clone(&self.signal_rx),
                batch_size: self.batch_size,
                settle: self.settle,
                entries_persisted: Arc::clone(&self.entries_persisted),
                batches_dropped: Arc::clone(&self.batches_dropped),
            };
            let cancel = self.cancel.clone();
            self.workers.push(tokio::spawn(worker.run(cancel)));
        }
    }

    /// 워커를 종료하고 큐에 남은 엔트리를 모두 드레인합니다.
    ///
    /// 종료된 풀은 재시작할 수 없습니다. 다시 시작하려면 새 풀을
    /// 생성해야 합니다.
    pub async fn stop(&mut self) {
        if self.workers.is_empty() {
            return;
        }

        info!("stopping persister pool");
        self.cancel.cancel();
        for worker in self.workers.drain(..) {
            if let Err(e) = worker.await {
                warn!(error = %e, "persister worker terminated abnormally");
            }
        }
        info!(
            entries_persisted = self.entries_persisted(),
            batches_dropped = self.batches_dropped(),
            "persister pool stopped"
        );
    }
}

// ─── PersisterWorker ─────────────────────────────────────────────────

/// 플러시 신호를 처리하는 단일 워커
struct PersisterWorker {
    worker_id: usize,
    queue: Arc<ObservableQueue<LogEntry>>,
    store: Arc<dyn DynLogStore>,
    signal_rx: Arc<Mutex<mpsc::UnboundedReceiver<()>>>,
    batch_size: usize,
    settle: Duration,
    entries_persisted: Arc<AtomicU64>,
    batches_dropped: Arc<AtomicU64>,
}

impl PersisterWorker {
    async fn run(self, cancel: CancellationToken) {
        debug!(worker_id = self.worker_id, "persister worker started");
        loop {
            let signal = tokio::select! {
                signal = Self::recv_signal(&self.signal_rx) => signal,
                _ = cancel.cancelled() => {
                    self.drain_remaining().await;
                    debug!(worker_id = self.worker_id, "persister worker stopped");
                    return;
                }
            };

            match signal {
                Some(()) => {
                    self.flush(self.settle).await;
                }
                None => {
                    // 송신단이 모두 닫혔으므로 더 올 신호가 없습니다.
                    self.drain_remaining().await;
                    debug!(
                        worker_id = self.worker_id,
                        "flush signal channel closed, persister worker stopped"
                    );
                    return;
                }
            }
        }
    }

    /// 공유 수신단에서 신호 하나를 꺼냅니다.
    ///
    /// 잠금은 신호를 받는 동안만 유지합니다. 플러시 중에는 다른 워커가
    /// 다음 신호를 가져갈 수 있습니다.
    async fn recv_signal(signal_rx: &Mutex<mpsc::UnboundedReceiver<()>>) -> Option<()> {
        signal_rx.lock().await.recv().await
    }

    /// 정착 지연 후 큐를 드레인하고 배치를 저장소에 기록합니다.
    async fn flush(&self, settle: Duration) -> FlushOutcome {
        if !settle.is_zero() {
            // 신호 직전까지 추가되던 엔트리가 같은 배치에 실리게 합니다.
            tokio::time::sleep(settle).await;
        }

        let mut batch = Vec::with_capacity(self.batch_size + 1);
        while batch.len() <= self.batch_size {
            match self.queue.poll() {
                Some(entry) => batch.push(entry),
                None => break,
            }
        }

        if batch.is_empty() {
            return FlushOutcome::Idle;
        }

        let count = batch.len();
        let started = Instant::now();
        match self.store.create_batch(&batch).await {
            Ok(()) => {
                let elapsed = started.elapsed();
                self.entries_persisted
                    .fetch_add(count as u64, Ordering::Relaxed);
                metrics::counter!(m::INGEST_ENTRIES_PERSISTED_TOTAL).increment(count as u64);
                metrics::counter!(
                    m::INGEST_FLUSHES_TOTAL,
                    m::LABEL_RESULT => "ok",
                    m::LABEL_STORE => self.store.name().to_owned()
                )
                .increment(1);
                metrics::histogram!(m::INGEST_FLUSH_DURATION_SECONDS).record(elapsed.as_secs_f64());
                debug!(
                    worker_id = self.worker_id,
                    count,
                    elapsed = ?elapsed,
                    "batch persisted"
                );
                FlushOutcome::Persisted(count)
            }
            Err(e) => {
                self.batches_dropped.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(m::INGEST_ENTRIES_DROPPED_TOTAL).increment(count as u64);
                metrics::counter!(
                    m::INGEST_FLUSHES_TOTAL,
                    m::LABEL_RESULT => "error",
                    m::LABEL_STORE => self.store.name().to_owned()
                )
                .increment(1);

                // 폐기 전에 배치 내용을 통째로 남겨 사후 복구를 가능하게 합니다.
                let batch_id = Uuid::new_v4();
                let contents = serde_json::to_string(&batch)
                    .unwrap_or_else(|_| format!("<{count} entries, render failed>"));
                error!(
                    worker_id = self.worker_id,
                    store = self.store.name(),
                    batch_id = %batch_id,
                    count,
                    error = %e,
                    batch = %contents,
                    "batch write failed, dropping batch"
                );
                FlushOutcome::Dropped(count)
            }
        }
    }

    /// 큐가 빌 때까지 정착 지연 없이 반복 드레인합니다.
    async fn drain_remaining(&self) {
        loop {
            match self.flush(Duration::ZERO).await {
                FlushOutcome::Idle => break,
                FlushOutcome::Persisted(_) | FlushOutcome::Dropped(_) => {}
            }
        }
    }
}
