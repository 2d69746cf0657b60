//! 수집 파이프라인 오케스트레이션 -- 파일 임포트부터 저장까지의 전체 흐름
//!
//! [`IngestPipeline`]은 core의 [`Pipeline`](logport_core::pipeline::Pipeline)
//! trait을 구현하여 임베딩하는 쪽에서 공통 생명주기(start/stop/health_check)로
//! 관리됩니다.
//!
//! # 내부 아키텍처
//! ```text
//! import_files() -> 파일 큐 -> ImportWorker -> 수집 큐 -> PersisterPool -> LogStore
//!                                                |
//!                                          FlushTrigger
//!                                     (크기/드레인 신호 발행)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use logport_core::error::{LogportError, PipelineError};
use logport_core::metrics as m;
use logport_core::pipeline::{HealthStatus, Pipeline};
use logport_core::stats::{ImportRecord, ImportStats};
use logport_core::store::DynLogStore;
use logport_core::types::LogEntry;

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::format::LogFormat;
use crate::importer::FileImporter;
use crate::persister::{FlushTrigger, PersisterPool};
use crate::queue::{ObservableQueue, QueueDepthObserver, QueueObserver, TotalEnqueuedObserver};

/// 파이프라인 실행 상태
#[derive(Debug, Clone, PartialEq, Eq)]
enum PipelineState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// 수집 파이프라인 -- 파일 임포트, 파싱, 배치 저장의 전체 흐름을 관리합니다.
///
/// # 사용 예시
/// ```ignore
/// use logport_ingest::{IngestPipelineBuilder, format::LogFormat};
/// use logport_core::pipeline::Pipeline;
///
/// let mut pipeline = IngestPipelineBuilder::new()
///     .config(config)
///     .store(store)
///     .build()?;
///
/// pipeline.start().await?;
/// let format = LogFormat::compile("combined")?;
/// pipeline.import_files(&format, &paths, false).await?;
/// ```
pub struct IngestPipeline {
    /// 파이프라인 설정
    config: IngestConfig,
    /// 현재 상태
    state: PipelineState,
    /// 수집 큐 (임포터와 영속화 풀이 공유)
    entry_queue: Arc<ObservableQueue<LogEntry>>,
    /// 총 유입 엔트리 관찰자
    enqueued: Arc<TotalEnqueuedObserver>,
    /// 배치 영속화 풀
    persister: PersisterPool,
    /// 파일 임포터
    importer: FileImporter,
    /// 임포트 통계 수집기
    stats: Arc<ImportStats>,
}

impl IngestPipeline {
    /// 현재 상태명을 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            PipelineState::Initialized => "initialized",
            PipelineState::Running => "running",
            PipelineState::Stopped => "stopped",
        }
    }

    /// 파이프라인 설정을 반환합니다.
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// 수집 큐 사용률을 반환합니다 (0.0 ~ 1.0).
    pub fn queue_utilization(&self) -> f64 {
        self.entry_queue.utilization()
    }

    /// 수집 큐에 현재 쌓인 엔트리 수를 반환합니다.
    pub fn queue_depth(&self) -> usize {
        self.entry_queue.len()
    }

    /// 지금까지 수집 큐에 들어간 엔트리 누계를 반환합니다.
    pub fn entries_enqueued(&self) -> u64 {
        self.enqueued.total()
    }

    /// 저장소에 기록된 엔트리 누계를 반환합니다.
    pub fn entries_persisted(&self) -> u64 {
        self.persister.entries_persisted()
    }

    /// 저장 실패로 폐기된 배치 수를 반환합니다.
    pub fn batches_dropped(&self) -> u64 {
        self.persister.batches_dropped()
    }

    /// 임포트 대기 중인 파일 수를 반환합니다.
    pub fn pending_files(&self) -> usize {
        self.importer.pending_files()
    }

    /// 파일별 임포트 통계 스냅샷을 반환합니다.
    pub fn statistics(&self) -> Vec<ImportRecord> {
        self.stats.snapshot()
    }

    /// 경로들을 임포트 대기열에 넣습니다. 넣은 파일 수를 반환합니다.
    ///
    /// 넣기만 하고 바로 돌아옵니다. 실제 처리는 백그라운드 임포트 워커가
    /// 수행하므로, 파이프라인이 실행 중이 아니면 파일은 큐에만 쌓입니다.
    /// 디렉토리는 안에 든 파일들로 펼쳐지고, 이미 대기 중인 경로는
    /// 건너뜁니다.
    ///
    /// # Errors
    /// 파일 큐가 닫혔으면 [`IngestError::Channel`]을 반환합니다.
    pub async fn import_files(
        &self,
        format: &LogFormat,
        paths: &[PathBuf],
        recursive: bool,
    ) -> Result<usize, IngestError> {
        self.importer.enqueue(format, paths, recursive).await
    }
}

impl Pipeline for IngestPipeline {
    async fn start(&mut self) -> Result<(), LogportError> {
        match self.state {
            PipelineState::Running => {
                return Err(PipelineError::InvalidState("already running".to_owned()).into());
            }
            PipelineState::Stopped => {
                return Err(PipelineError::InvalidState(
                    "stopped, build a new pipeline to restart".to_owned(),
                )
                .into());
            }
            PipelineState::Initialized => {}
        }

        info!(
            queue_capacity = self.config.queue_capacity,
            batch_size = self.config.batch_size,
            flush_workers = self.persister.worker_count(),
            "starting ingest pipeline"
        );

        // 1. 영속화 풀 기동
        self.persister.start();

        // 2. 파일 임포트 워커 기동
        self.importer.start();

        self.state = PipelineState::Running;
        info!("ingest pipeline started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), LogportError> {
        if self.state != PipelineState::Running {
            return Err(PipelineError::InvalidState("not running".to_owned()).into());
        }

        info!("stopping ingest pipeline");

        // 1. 임포터를 먼저 멈춰 새 엔트리 유입을 끊습니다.
        self.importer.stop().await;

        // 2. 풀 종료가 수집 큐의 잔여 엔트리를 드레인합니다.
        self.persister.stop().await;

        self.state = PipelineState::Stopped;
        info!(
            entries_persisted = self.persister.entries_persisted(),
            files_imported = self.stats.file_count(),
            "ingest pipeline stopped"
        );
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            PipelineState::Running => {
                let utilization = self.entry_queue.utilization();
                if utilization > 0.9 {
                    HealthStatus::Degraded(format!(
                        "queue utilization high: {:.1}%",
                        utilization * 100.0
                    ))
                } else {
                    HealthStatus::Healthy
                }
            }
            PipelineState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            PipelineState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

// ─── IngestPipelineBuilder ───────────────────────────────────────────

/// 수집 파이프라인 빌더
///
/// 큐, 플러시 신호 채널, 관찰자를 생성해 구성 요소를 연결합니다.
pub struct IngestPipelineBuilder {
    config: IngestConfig,
    store: Option<Arc<dyn DynLogStore>>,
    stats: Option<Arc<ImportStats>>,
}

impl IngestPipelineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: IngestConfig::default(),
            store: None,
            stats: None,
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: IngestConfig) -> Self {
        self.config = config;
        self
    }

    /// 저장소 협력자를 지정합니다. 필수입니다.
    pub fn store(mut self, store: Arc<dyn DynLogStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// 통계 수집기를 지정합니다.
    ///
    /// 지정하지 않으면 빌더가 새로 생성합니다. 여러 파이프라인이 하나의
    /// 수집기를 공유하려면 같은 `Arc`를 넘깁니다.
    pub fn stats(mut self, stats: Arc<ImportStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// 파이프라인을 빌드합니다.
    ///
    /// # Errors
    /// 설정이 유효하지 않거나 저장소가 지정되지 않으면
    /// [`IngestError::Config`]를 반환합니다.
    pub fn build(self) -> Result<IngestPipeline, IngestError> {
        self.config.validate()?;

        let store = self.store.ok_or_else(|| IngestError::Config {
            field: "store".to_owned(),
            reason: "log store must be provided".to_owned(),
        })?;
        let stats = self.stats.unwrap_or_else(|| Arc::new(ImportStats::new()));

        let (flush_tx, flush_rx) = mpsc::unbounded_channel();

        let enqueued = Arc::new(TotalEnqueuedObserver::new(m::INGEST_ENTRIES_ENQUEUED_TOTAL));
        let mut entry_queue = ObservableQueue::new(self.config.queue_capacity);
        entry_queue.subscribe(Arc::new(FlushTrigger::new(
            self.config.batch_size,
            flush_tx.clone(),
        )));
        entry_queue.subscribe(Arc::new(QueueDepthObserver::new(m::INGEST_QUEUE_DEPTH)));
        entry_queue.subscribe(Arc::clone(&enqueued) as Arc<dyn QueueObserver<LogEntry>>);
        let entry_queue = Arc::new(entry_queue);

        let persister = PersisterPool::new(
            Arc::clone(&entry_queue),
            store,
            &self.config,
            flush_rx,
        );
        let importer = FileImporter::new(
            Arc::clone(&entry_queue),
            flush_tx,
            Arc::clone(&stats),
            self.config.file_queue_capacity,
        );

        Ok(IngestPipeline {
            config: self.config,
            state: PipelineState::Initialized,
            entry_queue,
            enqueued,
            persister,
            importer,
            stats,
        })
    }
}

impl Default for IngestPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
