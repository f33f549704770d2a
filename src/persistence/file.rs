use super::{DocumentStore, PersistenceError, SchemeSummary, now_millis};
use crate::scheme::SchemeDocument;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

const AUTOSAVE_FILE: &str = "autosave.json";
const SCHEMES_DIR: &str = "schemes";

/// 스키마 파일 하나의 저장 형태.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredScheme {
    id: String,
    created_at_ms: i64,
    document: SchemeDocument,
}

impl StoredScheme {
    fn summary(&self) -> SchemeSummary {
        SchemeSummary {
            id: self.id.clone(),
            name: self.document.name.clone(),
            created_at_ms: self.created_at_ms,
        }
    }
}

/// 로컬 디렉터리에 JSON 파일로 문서를 보관하는 저장소.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileStore {
    /// 디렉터리를 만들고 저장소를 연다.
    pub async fn open(root: PathBuf) -> Result<Self, PersistenceError> {
        fs::create_dir_all(root.join(SCHEMES_DIR)).await?;
        Ok(Self {
            root,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn autosave_path(&self) -> PathBuf {
        self.root.join(AUTOSAVE_FILE)
    }

    fn scheme_path(&self, id: &str) -> Result<PathBuf, PersistenceError> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(PersistenceError::NotFound(id.to_string()));
        }
        Ok(self.root.join(SCHEMES_DIR).join(format!("{id}.json")))
    }

    /// 임시 파일에 쓴 뒤 이름을 바꿔 부분 기록을 남기지 않는다.
    ///
    /// 쓰기는 호출 순서대로 하나씩 진행되고, 임시 파일 이름은 호출마다 다르다.
    async fn write_atomic(&self, path: &Path, bytes: Vec<u8>) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().await;
        let tmp = path.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));
        fs::write(&tmp, bytes).await?;
        if let Err(err) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(err.into());
        }
        Ok(())
    }

    async fn read_stored(path: &Path) -> Result<StoredScheme, PersistenceError> {
        let bytes = fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn load_autosave(&self) -> Result<Option<SchemeDocument>, PersistenceError> {
        match fs::read(self.autosave_path()).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("자동 저장 파일 없음");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn save_autosave(&self, doc: &SchemeDocument) -> Result<(), PersistenceError> {
        let bytes = serde_json::to_vec_pretty(doc)?;
        self.write_atomic(&self.autosave_path(), bytes).await
    }

    async fn list_schemes(&self) -> Result<Vec<SchemeSummary>, PersistenceError> {
        let mut entries = fs::read_dir(self.root.join(SCHEMES_DIR)).await?;
        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match Self::read_stored(&path).await {
                Ok(stored) => summaries.push(stored.summary()),
                Err(err) => warn!(path = %path.display(), "스키마 파일을 읽을 수 없어 건너뜀: {err}"),
            }
        }
        summaries.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
        Ok(summaries)
    }

    async fn save_scheme(&self, doc: &SchemeDocument) -> Result<SchemeSummary, PersistenceError> {
        let stored = StoredScheme {
            id: Uuid::new_v4().simple().to_string(),
            created_at_ms: now_millis(),
            document: doc.clone(),
        };
        let path = self.scheme_path(&stored.id)?;
        self.write_atomic(&path, serde_json::to_vec_pretty(&stored)?).await?;
        Ok(stored.summary())
    }

    async fn load_scheme(&self, id: &str) -> Result<SchemeDocument, PersistenceError> {
        let path = self.scheme_path(id)?;
        match Self::read_stored(&path).await {
            Ok(stored) => Ok(stored.document),
            Err(PersistenceError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(PersistenceError::NotFound(id.to_string()))
            }
            Err(err) => Err(err),
        }
    }

    async fn delete_scheme(&self, id: &str) -> Result<(), PersistenceError> {
        let path = self.scheme_path(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(PersistenceError::NotFound(id.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("snnflow-{tag}-{}", Uuid::new_v4().simple()))
    }

    fn named(name: &str) -> SchemeDocument {
        SchemeDocument {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn autosave_slot_starts_empty_and_is_overwritten() {
        let root = temp_root("autosave");
        let store = FileStore::open(root.clone()).await.expect("저장소 열기 실패");

        assert!(store.load_autosave().await.expect("읽기 실패").is_none());
        store.save_autosave(&named("first")).await.expect("저장 실패");
        store.save_autosave(&named("second")).await.expect("저장 실패");

        let loaded = store.load_autosave().await.expect("읽기 실패");
        assert_eq!(loaded.map(|doc| doc.name), Some("second".to_string()));
        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn overlapping_autosaves_all_succeed_and_leave_no_temp_files() {
        let root = temp_root("overlap");
        let store = FileStore::open(root.clone()).await.expect("저장소 열기 실패");
        let mut big = named("big");
        big.flow_history_stack = (0..20_000).map(|i| format!("group-{i}")).collect();

        for round in 0..20 {
            let first = {
                let store = store.clone();
                let doc = big.clone();
                tokio::spawn(async move { store.save_autosave(&doc).await })
            };
            let second = {
                let store = store.clone();
                let doc = named(&format!("round-{round}"));
                tokio::spawn(async move { store.save_autosave(&doc).await })
            };
            first.await.expect("작업 실패").expect("저장 실패");
            second.await.expect("작업 실패").expect("저장 실패");

            let loaded = store
                .load_autosave()
                .await
                .expect("읽기 실패")
                .expect("자동 저장 없음");
            assert!(loaded.name == "big" || loaded.name == format!("round-{round}"));
        }

        let mut entries = std::fs::read_dir(&root)
            .expect("디렉터리 읽기 실패")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"));
        assert!(entries.next().is_none());
        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn named_schemes_can_be_listed_loaded_and_deleted() {
        let root = temp_root("schemes");
        let store = FileStore::open(root.clone()).await.expect("저장소 열기 실패");

        let saved = store.save_scheme(&named("cortex")).await.expect("저장 실패");
        let listed = store.list_schemes().await.expect("목록 실패");
        assert_eq!(listed, vec![saved.clone()]);

        let loaded = store.load_scheme(&saved.id).await.expect("읽기 실패");
        assert_eq!(loaded.name, "cortex");

        store.delete_scheme(&saved.id).await.expect("삭제 실패");
        assert!(matches!(
            store.delete_scheme(&saved.id).await,
            Err(PersistenceError::NotFound(_))
        ));
        assert!(matches!(
            store.load_scheme(&saved.id).await,
            Err(PersistenceError::NotFound(_))
        ));
        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn path_like_ids_are_rejected() {
        let root = temp_root("ids");
        let store = FileStore::open(root.clone()).await.expect("저장소 열기 실패");
        assert!(matches!(
            store.load_scheme("../autosave").await,
            Err(PersistenceError::NotFound(_))
        ));
        let _ = std::fs::remove_dir_all(root);
    }
}
