use crate::config::StorageConfig;
use crate::scheme::SchemeDocument;
use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

mod autosave;
mod file;
mod postgres;

pub use autosave::AutosaveScheduler;
pub use file::FileStore;
pub use postgres::PostgresStore;

/// 저장소 작업 중 발생 가능한 오류이다.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// 파일 입출력 실패.
    #[error("파일 입출력 실패: {0}")]
    Io(#[from] std::io::Error),
    /// 문서 JSON 변환 실패.
    #[error("문서 JSON 처리 실패: {0}")]
    Json(#[from] serde_json::Error),
    /// PostgreSQL 쿼리 실패.
    #[error("PostgreSQL 쿼리 실패: {0}")]
    Postgres(#[from] tokio_postgres::Error),
    /// 커넥션 풀에서 연결을 얻지 못했다.
    #[error("PostgreSQL 커넥션 획득 실패: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    /// 요청한 스키마가 없다.
    #[error("스키마를 찾을 수 없습니다: {0}")]
    NotFound(String),
}

/// 저장된 스키마 목록 항목.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemeSummary {
    /// 저장소가 발급한 ID.
    pub id: String,
    /// 문서 이름.
    pub name: String,
    /// 생성 시각(UNIX epoch ms).
    pub created_at_ms: i64,
}

/// 스키마 문서 저장소 추상화.
///
/// 자동 저장용 단일 슬롯과 이름 붙은 스키마 목록을 제공한다.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 자동 저장 슬롯을 읽는다. 비어 있으면 `None`이다.
    async fn load_autosave(&self) -> Result<Option<SchemeDocument>, PersistenceError>;
    /// 자동 저장 슬롯을 덮어쓴다.
    async fn save_autosave(&self, doc: &SchemeDocument) -> Result<(), PersistenceError>;
    /// 이름 붙은 스키마 목록을 최신순으로 반환한다.
    async fn list_schemes(&self) -> Result<Vec<SchemeSummary>, PersistenceError>;
    /// 문서를 새 스키마로 저장한다.
    async fn save_scheme(&self, doc: &SchemeDocument) -> Result<SchemeSummary, PersistenceError>;
    /// ID로 스키마를 읽는다.
    async fn load_scheme(&self, id: &str) -> Result<SchemeDocument, PersistenceError>;
    /// ID로 스키마를 지운다.
    async fn delete_scheme(&self, id: &str) -> Result<(), PersistenceError>;
}

/// DocumentStore를 공유하기 위한 Arc 타입 별칭이다.
pub type SharedStore = Arc<dyn DocumentStore>;

/// 비동기 저장소 작업 결과를 UI로 전달하는 이벤트.
#[derive(Debug, Clone)]
pub enum PersistenceEvent {
    /// 시작 시 자동 저장 슬롯을 읽었다.
    AutosaveLoaded(Option<SchemeDocument>),
    /// 자동 저장이 끝났다.
    AutosaveSaved { revision: u64 },
    /// 이름 붙은 스키마 목록을 받았다.
    SchemesListed(Vec<SchemeSummary>),
    /// 새 스키마를 저장했다.
    SchemeSaved(SchemeSummary),
    /// 스키마를 읽었다.
    SchemeLoaded(SchemeDocument),
    /// 스키마를 지웠다.
    SchemeDeleted(String),
    /// 작업이 실패했다. 편집 상태는 바뀌지 않는다.
    Failed { action: &'static str, message: String },
}

/// 설정에 따라 저장소 구현을 만든다.
pub async fn open_store(config: &StorageConfig) -> anyhow::Result<SharedStore> {
    match config {
        StorageConfig::File { dir } => {
            let store = FileStore::open(dir.clone())
                .await
                .with_context(|| format!("파일 저장소 초기화 실패: {}", dir.display()))?;
            Ok(Arc::new(store) as SharedStore)
        }
        StorageConfig::Postgres {
            dsn,
            user,
            password,
        } => {
            let store = PostgresStore::connect(dsn.clone(), user.clone(), password.clone()).await?;
            Ok(Arc::new(store) as SharedStore)
        }
    }
}

/// 현재 시각을 UNIX epoch 밀리초로 반환한다.
pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}
