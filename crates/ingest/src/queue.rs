//! 관찰 가능한 유계 큐
//!
//! [`ObservableQueue`]는 파일 읽기와 저장 쓰기를 분리하는 유계 FIFO
//! 큐입니다. 용량이 가득 차면 생산자의 `put`이 대기(backpressure)하고,
//! 추가/제거/비움 이벤트마다 구독된 [`QueueObserver`]에게 알립니다.
//!
//! 내부는 `VecDeque`와 두 개의 세마포어(남은 공간, 소비 가능한 아이템)로
//! 구성됩니다. 잠금은 await 지점을 넘어 유지되지 않으며, 관찰자 콜백은
//! 항상 잠금 밖에서 호출됩니다.
//!
//! # 사용 예시
//! ```ignore
//! use std::sync::Arc;
//! use logport_ingest::queue::{ObservableQueue, TotalEnqueuedObserver};
//!
//! let mut queue = ObservableQueue::new(10_000);
//! queue.subscribe(Arc::new(TotalEnqueuedObserver::new(
//!     logport_core::metrics::INGEST_ENTRIES_ENQUEUED_TOTAL,
//! )));
//! let queue = Arc::new(queue);
//! queue.put(entry).await?;
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::error::IngestError;

/// 큐 이벤트 관찰자
///
/// 모든 콜백의 기본 구현은 no-op이므로 필요한 이벤트만 구현하면 됩니다.
/// 콜백은 큐 내부 잠금이 풀린 상태에서 호출되며, 아이템을 변경할 수
/// 없습니다.
pub trait QueueObserver<T>: Send + Sync {
    /// 아이템이 큐에 추가될 때 호출됩니다.
    fn on_added(&self, queue: &ObservableQueue<T>, item: &T) {
        let _ = (queue, item);
    }

    /// 아이템이 큐에서 제거될 때 호출됩니다.
    fn on_removed(&self, queue: &ObservableQueue<T>, item: &T) {
        let _ = (queue, item);
    }

    /// 제거 결과 큐가 비었을 때 호출됩니다.
    fn on_empty(&self, queue: &ObservableQueue<T>) {
        let _ = queue;
    }
}

/// 관찰 가능한 유계 FIFO 큐
///
/// 불변식: 큐 길이는 용량을 초과하지 않습니다. 가득 찬 큐에 대한 `put`은
/// 드롭 대신 공간이 생길 때까지 대기합니다.
///
/// 관찰자 목록은 큐가 소유하는 구독 상태입니다. [`subscribe`](Self::subscribe)는
/// `&mut self`를 요구하므로 큐를 `Arc`로 공유하기 전에 구독을 마쳐야
/// 합니다.
pub struct ObservableQueue<T> {
    items: Mutex<VecDeque<T>>,
    /// 남은 용량 퍼밋
    space: Semaphore,
    /// 소비 가능한 아이템 퍼밋
    available: Semaphore,
    capacity: usize,
    observers: Vec<Arc<dyn QueueObserver<T>>>,
}

impl<T> ObservableQueue<T> {
    /// 지정한 용량의 빈 큐를 생성합니다. 용량 검증은 설정 계층의 몫입니다.
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity.min(10_000))),
            space: Semaphore::new(capacity),
            available: Semaphore::new(0),
            capacity,
            observers: Vec::new(),
        }
    }

    /// 관찰자를 구독 목록에 추가합니다.
    pub fn subscribe(&mut self, observer: Arc<dyn QueueObserver<T>>) {
        self.observers.push(observer);
    }

    /// 아이템을 큐에 추가합니다. 큐가 가득 차 있으면 공간이 생길 때까지
    /// 대기합니다.
    pub async fn put(&self, item: T) -> Result<(), IngestError> {
        let permit = self
            .space
            .acquire()
            .await
            .map_err(|e| IngestError::Channel(format!("queue space semaphore closed: {e}")))?;
        permit.forget();

        // 공간 퍼밋을 확보한 뒤에는 추가가 더 이상 실패하지 않으므로,
        // 잠금 밖에서 관찰자에게 먼저 알립니다.
        self.notify_added(&item);

        {
            let mut items = self.lock_items();
            items.push_back(item);
        }
        self.available.add_permits(1);
        Ok(())
    }

    /// 아이템 하나를 꺼냅니다. 큐가 비어 있으면 아이템이 들어올 때까지
    /// 대기합니다.
    pub async fn take(&self) -> Result<T, IngestError> {
        let permit = self
            .available
            .acquire()
            .await
            .map_err(|e| IngestError::Channel(format!("queue item semaphore closed: {e}")))?;
        permit.forget();
        self.remove_committed()
    }

    /// 비차단으로 아이템 하나를 꺼냅니다. 큐가 비어 있으면 `None`.
    pub fn poll(&self) -> Option<T> {
        let permit = self.available.try_acquire().ok()?;
        permit.forget();
        self.remove_committed().ok()
    }

    /// 지정한 시간 동안만 대기하며 아이템 하나를 꺼냅니다.
    pub async fn poll_timeout(&self, dur: Duration) -> Option<T> {
        match tokio::time::timeout(dur, self.take()).await {
            Ok(Ok(item)) => Some(item),
            _ => None,
        }
    }

    /// 현재 큐에 있는 아이템 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.lock_items().len()
    }

    /// 큐가 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.lock_items().is_empty()
    }

    /// 큐 용량을 반환합니다.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 큐 사용률을 0.0~1.0 범위로 반환합니다.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        f64::from(u32::try_from(self.len()).unwrap_or(u32::MAX))
            / f64::from(u32::try_from(self.capacity).unwrap_or(u32::MAX))
    }

    /// 아이템 퍼밋을 소비한 뒤의 공통 제거 경로입니다.
    fn remove_committed(&self) -> Result<T, IngestError> {
        let (item, now_empty) = {
            let mut items = self.lock_items();
            let item = items.pop_front();
            let now_empty = items.is_empty();
            (item, now_empty)
        };

        // 퍼밋 회계상 아이템은 반드시 존재합니다.
        let item = item.ok_or_else(|| {
            IngestError::Channel("queue item permit without matching entry".to_owned())
        })?;

        self.space.add_permits(1);
        self.notify_removed(&item);
        if now_empty {
            self.notify_empty();
        }
        Ok(item)
    }

    fn lock_items(&self) -> MutexGuard<'_, VecDeque<T>> {
        // 잠금 구간은 짧고 패닉하지 않으므로, 중독된 잠금은 복구해서
        // 계속 사용합니다.
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify_added(&self, item: &T) {
        for observer in &self.observers {
            observer.on_added(self, item);
        }
    }

    fn notify_removed(&self, item: &T) {
        for observer in &self.observers {
            observer.on_removed(self, item);
        }
    }

    fn notify_empty(&self) {
        for observer in &self.observers {
            observer.on_empty(self);
        }
    }
}

// ─── 카운팅 관찰자 ───────────────────────────────────────────────

/// 현재 큐 깊이를 추적하는 관찰자
///
/// 추가/제거 이벤트로 유지되는 실행 카운트를 게이지 메트릭으로
/// 내보냅니다. 아이템은 읽지도 변경하지도 않습니다.
pub struct QueueDepthObserver {
    depth: AtomicI64,
    metric: &'static str,
}

impl QueueDepthObserver {
    /// 지정한 게이지 메트릭 이름으로 관찰자를 생성합니다.
    pub fn new(metric: &'static str) -> Self {
        Self {
            depth: AtomicI64::new(0),
            metric,
        }
    }

    /// 현재 추적 중인 큐 깊이를 반환합니다.
    pub fn depth(&self) -> i64 {
        self.depth.load(Ordering::SeqCst)
    }
}

impl<T> QueueObserver<T> for QueueDepthObserver {
    fn on_added(&self, _queue: &ObservableQueue<T>, _item: &T) {
        let depth = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
        #[allow(clippy::cast_precision_loss)]
        metrics::gauge!(self.metric).set(depth as f64);
    }

    fn on_removed(&self, _queue: &ObservableQueue<T>, _item: &T) {
        let depth = self.depth.fetch_sub(1, Ordering::SeqCst) - 1;
        #[allow(clippy::cast_precision_loss)]
        metrics::gauge!(self.metric).set(depth as f64);
    }
}

/// 총 유입 아이템 수를 추적하는 관찰자
pub struct TotalEnqueuedObserver {
    total: AtomicU64,
    metric: &'static str,
}

impl TotalEnqueuedObserver {
    /// 지정한 카운터 메트릭 이름으로 관찰자를 생성합니다.
    pub fn new(metric: &'static str) -> Self {
        Self {
            total: AtomicU64::new(0),
            metric,
        }
    }

    /// 지금까지 큐에 추가된 총 아이템 수를 반환합니다.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }
}

impl<T> QueueObserver<T> for TotalEnqueuedObserver {
    fn on_added(&self, _queue: &ObservableQueue<T>, _item: &T) {
        self.total.fetch_add(1, Ordering::SeqCst);
        metrics::counter!(self.metric).increment(1);
    }
}
