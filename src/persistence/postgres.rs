use super::{DocumentStore, PersistenceError, SchemeSummary, now_millis};
use crate::scheme::SchemeDocument;
use anyhow::{Context, Result};
use async_trait::async_trait;
use deadpool_postgres::{Config as PoolConfig, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use uuid::Uuid;

const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS snnflow_autosave (
    id SMALLINT PRIMARY KEY,
    body TEXT NOT NULL,
    updated_at_ms BIGINT NOT NULL
);
CREATE TABLE IF NOT EXISTS snnflow_schemes (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at_ms BIGINT NOT NULL
);";

/// PostgreSQL 연결 풀을 통해 문서를 보관하는 저장소.
#[derive(Clone)]
pub struct PostgresStore {
    /// deadpool 기반 연결 풀이다.
    pool: Pool,
}

impl PostgresStore {
    /// 주어진 접속 정보를 기반으로 연결 풀을 만들고 테이블을 준비한다.
    ///
    /// # 매개변수
    /// - `dsn`: `host`, `port`, `dbname` 등이 포함된 PostgreSQL DSN 문자열.
    /// - `user`: 데이터베이스 사용자명.
    /// - `password`: 해당 사용자 비밀번호.
    ///
    /// # 반환값
    /// 초기화된 `PostgresStore` 인스턴스를 포함한 [`Result`]를 반환한다.
    pub async fn connect(
        dsn: impl Into<String>,
        user: Option<String>,
        password: Option<String>,
    ) -> Result<Self> {
        let mut config = PoolConfig::new();
        config.url = Some(dsn.into());
        config.user = user;
        config.password = password;
        config.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .context("PostgreSQL 커넥션 풀 생성 실패")?;
        let client = pool.get().await.context("PostgreSQL 커넥션 획득 실패")?;
        client
            .batch_execute(CREATE_TABLES)
            .await
            .context("스키마 테이블 생성 실패")?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn load_autosave(&self) -> Result<Option<SchemeDocument>, PersistenceError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt("SELECT body FROM snnflow_autosave WHERE id = 1", &[])
            .await?;
        match row {
            Some(row) => {
                let body: String = row.get(0);
                Ok(Some(serde_json::from_str(&body)?))
            }
            None => Ok(None),
        }
    }

    async fn save_autosave(&self, doc: &SchemeDocument) -> Result<(), PersistenceError> {
        let body = serde_json::to_string(doc)?;
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO snnflow_autosave (id, body, updated_at_ms) VALUES (1, $1, $2)
                 ON CONFLICT (id) DO UPDATE SET body = EXCLUDED.body, updated_at_ms = EXCLUDED.updated_at_ms",
                &[&body, &now_millis()],
            )
            .await?;
        Ok(())
    }

    async fn list_schemes(&self) -> Result<Vec<SchemeSummary>, PersistenceError> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT id, name, created_at_ms FROM snnflow_schemes ORDER BY created_at_ms DESC",
                &[],
            )
            .await?;
        Ok(rows
            .iter()
            .map(|row| SchemeSummary {
                id: row.get(0),
                name: row.get(1),
                created_at_ms: row.get(2),
            })
            .collect())
    }

    async fn save_scheme(&self, doc: &SchemeDocument) -> Result<SchemeSummary, PersistenceError> {
        let summary = SchemeSummary {
            id: Uuid::new_v4().simple().to_string(),
            name: doc.name.clone(),
            created_at_ms: now_millis(),
        };
        let body = serde_json::to_string(doc)?;
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO snnflow_schemes (id, name, body, created_at_ms) VALUES ($1, $2, $3, $4)",
                &[&summary.id, &summary.name, &body, &summary.created_at_ms],
            )
            .await?;
        Ok(summary)
    }

    async fn load_scheme(&self, id: &str) -> Result<SchemeDocument, PersistenceError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt("SELECT body FROM snnflow_schemes WHERE id = $1", &[&id])
            .await?
            .ok_or_else(|| PersistenceError::NotFound(id.to_string()))?;
        let body: String = row.get(0);
        Ok(serde_json::from_str(&body)?)
    }

    async fn delete_scheme(&self, id: &str) -> Result<(), PersistenceError> {
        let client = self.pool.get().await?;
        let deleted = client
            .execute("DELETE FROM snnflow_schemes WHERE id = $1", &[&id])
            .await?;
        if deleted == 0 {
            return Err(PersistenceError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
