use crate::config::AppConfig;
use crate::editor::model::PanelState;
use crate::editor::{
    CanvasState, EditorSession, LoadedTree, SchemaTree, scheme_to_tree, tree_to_scheme,
};
use crate::persistence::{
    AutosaveScheduler, PersistenceError, PersistenceEvent, SchemeSummary, SharedStore,
};
use crate::scheme::{SchemeDocument, load_scheme_from_reader};
use crate::theme::Theme;
use anyhow::Context;
use eframe::egui;
use std::fs::File;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

/// egui 애플리케이션의 전체 상태를 보관한다.
pub struct SnnFlowApp {
    /// UI 테마 정보.
    pub(crate) theme: Theme,
    /// 편집 세션.
    pub(crate) session: EditorSession,
    /// 캔버스 상호작용 상태.
    pub(crate) canvas: CanvasState,
    /// Tokio 런타임.
    runtime: Runtime,
    /// 문서 저장소.
    store: SharedStore,
    /// 디바운스 자동 저장.
    autosave: AutosaveScheduler,
    /// 저장소 작업 결과 송신 채널.
    events_tx: UnboundedSender<PersistenceEvent>,
    /// 저장소 작업 결과 수신 채널.
    pub(crate) events_rx: Option<UnboundedReceiver<PersistenceEvent>>,
    /// 시작 시 자동 저장 슬롯을 읽었는지 여부.
    pub(crate) loaded: bool,
    /// 자동 저장을 예약한 마지막 revision.
    observed_revision: u64,
    /// 마지막으로 저장이 끝난 revision.
    pub(crate) saved_revision: Option<u64>,
    /// 마지막 안내 메시지.
    pub(crate) notice: Option<String>,
    /// 마지막 오류 메시지.
    pub(crate) last_error: Option<String>,
    /// 스키마 목록 창 표시 여부.
    pub(crate) schemes_open: bool,
    /// 저장소의 스키마 목록.
    pub(crate) schemes: Vec<SchemeSummary>,
    /// 새 문서에 쓰는 기본 설정.
    config: AppConfig,
}

impl SnnFlowApp {
    /// egui Context를 받아 초기 상태를 구성하고 자동 저장 슬롯을 읽기 시작한다.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        runtime: Runtime,
        store: SharedStore,
    ) -> Self {
        let theme = Theme::default();
        theme.apply(&cc.egui_ctx);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let autosave = AutosaveScheduler::new(
            store.clone(),
            Duration::from_millis(config.autosave_debounce_ms),
            runtime.handle().clone(),
            events_tx.clone(),
        );
        let session = EditorSession::new(Self::blank_tree(&config));
        let canvas = CanvasState::new(session.current_level().viewport);
        let app = Self {
            theme,
            session,
            canvas,
            runtime,
            store,
            autosave,
            events_tx,
            events_rx: Some(events_rx),
            loaded: false,
            observed_revision: 0,
            saved_revision: None,
            notice: None,
            last_error: None,
            schemes_open: false,
            schemes: Vec::new(),
            config,
        };
        let ctx = cc.egui_ctx.clone();
        app.spawn_store_task(ctx, "자동 저장 불러오기", |store| async move {
            store
                .load_autosave()
                .await
                .map(PersistenceEvent::AutosaveLoaded)
        });
        app
    }

    fn blank_tree(config: &AppConfig) -> SchemaTree {
        SchemaTree {
            panel_state: PanelState {
                collapsed: false,
                width: config.default_panel_width,
            },
            ..SchemaTree::new(config.document_name.clone())
        }
    }

    /// 저장소 작업을 런타임에 띄우고 결과를 이벤트 채널로 돌려받는다.
    fn spawn_store_task<F, Fut>(&self, ctx: egui::Context, action: &'static str, task: F)
    where
        F: FnOnce(SharedStore) -> Fut,
        Fut: Future<Output = Result<PersistenceEvent, PersistenceError>> + Send + 'static,
    {
        let tx = self.events_tx.clone();
        let work = task(self.store.clone());
        self.runtime.spawn(async move {
            let event = match work.await {
                Ok(event) => event,
                Err(err) => {
                    warn!(action = action, "저장소 작업 실패: {err}");
                    PersistenceEvent::Failed {
                        action,
                        message: err.to_string(),
                    }
                }
            };
            let _ = tx.send(event);
            ctx.request_repaint();
        });
    }

    /// 저장소 이벤트를 모두 소비하여 UI 상태를 동기화한다.
    pub(super) fn drain_events(&mut self) {
        if let Some(mut rx) = self.events_rx.take() {
            while let Ok(event) = rx.try_recv() {
                self.handle_event(event);
            }
            self.events_rx = Some(rx);
        }
    }

    fn handle_event(&mut self, event: PersistenceEvent) {
        match event {
            PersistenceEvent::AutosaveLoaded(doc) => {
                if let Some(doc) = doc {
                    self.apply_document(&doc, "자동 저장본을 불러왔습니다.");
                }
                self.finish_initial_load();
            }
            PersistenceEvent::AutosaveSaved { revision } => {
                self.saved_revision = Some(revision);
            }
            PersistenceEvent::SchemesListed(schemes) => {
                self.schemes = schemes;
            }
            PersistenceEvent::SchemeSaved(summary) => {
                self.notice = Some(format!("'{}' 스키마를 저장했습니다.", summary.name));
                self.schemes.insert(0, summary);
            }
            PersistenceEvent::SchemeLoaded(doc) => {
                self.apply_document(&doc, "스키마를 불러왔습니다.");
                self.schemes_open = false;
            }
            PersistenceEvent::SchemeDeleted(id) => {
                self.schemes.retain(|scheme| scheme.id != id);
            }
            PersistenceEvent::Failed { action, message } => {
                self.last_error = Some(format!("{action} 실패: {message}"));
                if !self.loaded {
                    self.finish_initial_load();
                }
            }
        }
    }

    /// 첫 로드가 끝난 뒤부터 변경을 자동 저장한다.
    fn finish_initial_load(&mut self) {
        self.loaded = true;
        self.observed_revision = self.session.revision();
    }

    /// 문서를 트리로 바꿔 세션에 적용한다. 보정된 항목은 안내 메시지로 남긴다.
    fn apply_document(&mut self, doc: &SchemeDocument, message: &str) {
        let LoadedTree { tree, issues } = scheme_to_tree(doc);
        self.session.replace_tree(tree);
        self.canvas.switch_level(self.session.current_level().viewport);
        self.notice = Some(if issues.is_empty() {
            message.to_string()
        } else {
            format!("{message} 문제 항목 {}개를 건너뛰었습니다.", issues.len())
        });
        self.last_error = None;
    }

    /// 트리가 바뀌었으면 자동 저장을 다시 예약한다.
    pub(super) fn sync_autosave(&mut self) {
        let revision = self.session.revision();
        if !self.loaded || revision == self.observed_revision {
            return;
        }
        self.observed_revision = revision;
        self.autosave
            .schedule(revision, tree_to_scheme(self.session.tree()));
    }

    /// 자동 저장 대기 여부.
    pub(super) fn autosave_pending(&self) -> bool {
        self.autosave.is_pending()
    }

    /// 자동 저장 디바운스 간격.
    pub(super) fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.config.autosave_debounce_ms)
    }

    /// 문서를 빈 루트로 되돌린다.
    pub(super) fn clear_document(&mut self) {
        self.session.clear();
        self.canvas.switch_level(self.session.current_level().viewport);
        self.notice = Some("문서를 초기화했습니다.".into());
    }

    /// 스키마 목록 창을 열고 목록을 새로 읽는다.
    pub(super) fn open_schemes(&mut self, ctx: &egui::Context) {
        self.schemes_open = true;
        self.spawn_store_task(ctx.clone(), "스키마 목록", |store| async move {
            store.list_schemes().await.map(PersistenceEvent::SchemesListed)
        });
    }

    /// 현재 문서를 새 스키마로 저장한다.
    pub(super) fn save_current_scheme(&mut self, ctx: &egui::Context) {
        let doc = tree_to_scheme(self.session.tree());
        self.spawn_store_task(ctx.clone(), "스키마 저장", move |store| async move {
            store.save_scheme(&doc).await.map(PersistenceEvent::SchemeSaved)
        });
    }

    /// 스키마를 읽어 현재 문서를 교체한다.
    pub(super) fn load_scheme(&mut self, ctx: &egui::Context, id: String) {
        self.spawn_store_task(ctx.clone(), "스키마 불러오기", move |store| async move {
            store.load_scheme(&id).await.map(PersistenceEvent::SchemeLoaded)
        });
    }

    /// 스키마를 지운다.
    pub(super) fn delete_scheme(&mut self, ctx: &egui::Context, id: String) {
        self.spawn_store_task(ctx.clone(), "스키마 삭제", move |store| async move {
            store.delete_scheme(&id).await?;
            Ok(PersistenceEvent::SchemeDeleted(id))
        });
    }

    /// 파일 다이얼로그로 JSON 문서를 가져온다.
    pub(super) fn import_from_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .pick_file()
        {
            match Self::read_document(&path) {
                Ok(doc) => {
                    info!(path = %path.display(), "문서 가져오기");
                    self.apply_document(&doc, "파일에서 문서를 가져왔습니다.");
                }
                Err(err) => {
                    warn!(path = %path.display(), "문서 가져오기 실패: {err:#}");
                    self.last_error = Some(format!("{err:#}"));
                }
            }
        }
    }

    /// 파일 다이얼로그로 현재 문서를 JSON으로 내보낸다.
    pub(super) fn export_to_dialog(&mut self) {
        let file_name = format!("{}.json", self.session.tree().name);
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_file_name(file_name)
            .save_file()
        {
            let doc = tree_to_scheme(self.session.tree());
            match Self::write_document(&path, &doc) {
                Ok(()) => {
                    info!(path = %path.display(), "문서 내보내기");
                    self.notice = Some(format!("내보냄 · {}", path.display()));
                }
                Err(err) => {
                    warn!(path = %path.display(), "문서 내보내기 실패: {err:#}");
                    self.last_error = Some(format!("{err:#}"));
                }
            }
        }
    }

    fn read_document(path: &Path) -> anyhow::Result<SchemeDocument> {
        let mut file = File::open(path)
            .with_context(|| format!("파일 열기 실패: {}", path.display()))?;
        load_scheme_from_reader(&mut file)
            .with_context(|| format!("스키마 문서 해석 실패: {}", path.display()))
    }

    fn write_document(path: &Path, doc: &SchemeDocument) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(doc).context("문서 직렬화 실패")?;
        std::fs::write(path, json)
            .with_context(|| format!("파일 쓰기 실패: {}", path.display()))
    }
}
