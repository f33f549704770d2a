use super::{PersistenceEvent, SharedStore};
use crate::scheme::SchemeDocument;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 디바운스 타이머 상태.
#[derive(Debug, Default)]
enum TimerState {
    /// 대기 중인 저장이 없다.
    #[default]
    Idle,
    /// 타이머가 걸려 있다. 토큰을 취소하면 저장이 생략된다.
    Pending(CancellationToken),
}

/// 편집이 잠잠해진 뒤 한 번만 자동 저장하는 스케줄러이다.
///
/// 새 변경이 들어오면 걸려 있던 타이머를 취소하고 다시 건다. 이미 시작된 쓰기는
/// 취소하지 않으며, 실패한 저장은 다음 변경의 타이머가 자연스럽게 다시 시도한다.
pub struct AutosaveScheduler {
    store: SharedStore,
    debounce: Duration,
    handle: Handle,
    events: UnboundedSender<PersistenceEvent>,
    state: TimerState,
}

impl AutosaveScheduler {
    /// 스케줄러를 만든다. 작업은 `handle`의 런타임에서 실행된다.
    pub fn new(
        store: SharedStore,
        debounce: Duration,
        handle: Handle,
        events: UnboundedSender<PersistenceEvent>,
    ) -> Self {
        Self {
            store,
            debounce,
            handle,
            events,
            state: TimerState::Idle,
        }
    }

    /// 타이머가 걸려 있고 아직 발화하지 않았는지 확인한다.
    pub fn is_pending(&self) -> bool {
        matches!(&self.state, TimerState::Pending(token) if !token.is_cancelled())
    }

    /// 걸려 있던 타이머를 취소하고 `doc` 저장 타이머를 새로 건다.
    pub fn schedule(&mut self, revision: u64, doc: SchemeDocument) {
        self.cancel();
        let token = CancellationToken::new();
        let timer = token.clone();
        let store = self.store.clone();
        let events = self.events.clone();
        let debounce = self.debounce;
        self.handle.spawn(async move {
            tokio::select! {
                _ = timer.cancelled() => {
                    debug!(revision = revision, "새 변경으로 대체된 자동 저장");
                    return;
                }
                _ = tokio::time::sleep(debounce) => {}
            }
            // 발화한 타이머는 더 이상 취소 대상이 아니다.
            timer.cancel();
            match store.save_autosave(&doc).await {
                Ok(()) => {
                    info!(revision = revision, "자동 저장 완료");
                    let _ = events.send(PersistenceEvent::AutosaveSaved { revision });
                }
                Err(err) => {
                    warn!(revision = revision, "자동 저장 실패: {err}");
                    let _ = events.send(PersistenceEvent::Failed {
                        action: "자동 저장",
                        message: err.to_string(),
                    });
                }
            }
        });
        self.state = TimerState::Pending(token);
    }

    /// 걸려 있는 타이머를 취소한다. 진행 중인 쓰기에는 영향이 없다.
    pub fn cancel(&mut self) {
        if let TimerState::Pending(token) = std::mem::take(&mut self.state) {
            token.cancel();
        }
    }
}

impl Drop for AutosaveScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{DocumentStore, PersistenceError, SchemeSummary};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    /// 저장 호출을 기록하는 테스트용 저장소.
    #[derive(Default)]
    struct RecordingStore {
        saved: Mutex<Vec<String>>,
        failures_left: AtomicUsize,
        write_delay: Duration,
    }

    #[async_trait]
    impl DocumentStore for RecordingStore {
        async fn load_autosave(&self) -> Result<Option<SchemeDocument>, PersistenceError> {
            Ok(None)
        }

        async fn save_autosave(&self, doc: &SchemeDocument) -> Result<(), PersistenceError> {
            if !self.write_delay.is_zero() {
                tokio::time::sleep(self.write_delay).await;
            }
            let failing = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(PersistenceError::Io(std::io::Error::other("저장소 응답 없음")));
            }
            self.saved.lock().expect("잠금 실패").push(doc.name.clone());
            Ok(())
        }

        async fn list_schemes(&self) -> Result<Vec<SchemeSummary>, PersistenceError> {
            Ok(Vec::new())
        }

        async fn save_scheme(
            &self,
            doc: &SchemeDocument,
        ) -> Result<SchemeSummary, PersistenceError> {
            Ok(SchemeSummary {
                id: "x".into(),
                name: doc.name.clone(),
                created_at_ms: 0,
            })
        }

        async fn load_scheme(&self, id: &str) -> Result<SchemeDocument, PersistenceError> {
            Err(PersistenceError::NotFound(id.to_string()))
        }

        async fn delete_scheme(&self, id: &str) -> Result<(), PersistenceError> {
            Err(PersistenceError::NotFound(id.to_string()))
        }
    }

    fn doc(name: &str) -> SchemeDocument {
        SchemeDocument {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn scheduler(
        store: Arc<RecordingStore>,
    ) -> (AutosaveScheduler, mpsc::UnboundedReceiver<PersistenceEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler =
            AutosaveScheduler::new(store, Duration::from_millis(1000), Handle::current(), tx);
        (scheduler, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn bursts_of_edits_are_coalesced_into_one_write() {
        let store = Arc::new(RecordingStore::default());
        let (mut scheduler, mut rx) = scheduler(store.clone());

        scheduler.schedule(1, doc("v1"));
        tokio::time::sleep(Duration::from_millis(300)).await;
        scheduler.schedule(2, doc("v2"));
        tokio::time::sleep(Duration::from_millis(300)).await;
        scheduler.schedule(3, doc("v3"));
        assert!(scheduler.is_pending());

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(*store.saved.lock().expect("잠금 실패"), vec!["v3".to_string()]);
        assert!(matches!(
            rx.try_recv(),
            Ok(PersistenceEvent::AutosaveSaved { revision: 3 })
        ));
        assert!(!scheduler.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_writes_are_reported_and_retried_by_the_next_change() {
        let store = Arc::new(RecordingStore {
            failures_left: AtomicUsize::new(1),
            ..Default::default()
        });
        let (mut scheduler, mut rx) = scheduler(store.clone());

        scheduler.schedule(1, doc("lost"));
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(matches!(rx.try_recv(), Ok(PersistenceEvent::Failed { .. })));

        scheduler.schedule(2, doc("kept"));
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(*store.saved.lock().expect("잠금 실패"), vec!["kept".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_writes_are_never_cancelled() {
        let store = Arc::new(RecordingStore {
            write_delay: Duration::from_millis(500),
            ..Default::default()
        });
        let (mut scheduler, _rx) = scheduler(store.clone());

        scheduler.schedule(1, doc("first"));
        tokio::time::sleep(Duration::from_millis(1100)).await;
        scheduler.schedule(2, doc("second"));
        tokio::time::sleep(Duration::from_millis(2000)).await;

        assert_eq!(
            *store.saved.lock().expect("잠금 실패"),
            vec!["first".to_string(), "second".to_string()]
        );
    }
}
