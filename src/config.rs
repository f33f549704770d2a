use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

/// 설정 파일 경로를 지정하는 환경 변수 이름.
pub const CONFIG_ENV: &str = "SNNFLOW_CONFIG";
/// 환경 변수가 없을 때 찾는 기본 설정 파일.
pub const DEFAULT_CONFIG_FILE: &str = "snnflow.yaml";

/// 애플리케이션 설정이다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 문서 저장소 선택.
    pub storage: StorageConfig,
    /// 마지막 변경 후 자동 저장까지 기다리는 시간(ms).
    pub autosave_debounce_ms: u64,
    /// 설정 패널 기본 너비.
    pub default_panel_width: f32,
    /// 새 문서의 이름.
    pub document_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            autosave_debounce_ms: 1000,
            default_panel_width: 300.0,
            document_name: "Untitled".to_string(),
        }
    }
}

/// 문서 저장소 종류와 접속 정보.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageConfig {
    /// 로컬 디렉터리에 JSON 파일로 저장한다.
    File {
        #[serde(default = "default_data_dir")]
        dir: PathBuf,
    },
    /// PostgreSQL 테이블에 저장한다.
    Postgres {
        dsn: String,
        #[serde(default)]
        user: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::File {
            dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    /// 로그에 남기는 저장소 종류 이름.
    pub fn kind(&self) -> &'static str {
        match self {
            StorageConfig::File { .. } => "file",
            StorageConfig::Postgres { .. } => "postgres",
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./snnflow-data")
}

impl AppConfig {
    /// 환경 변수 또는 기본 경로에서 설정을 읽는다. 파일이 없으면 기본값이다.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from_path(&path)
    }

    /// 지정한 경로에서 설정을 읽는다.
    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "설정 파일이 없어 기본값 사용");
            return Ok(Self::default());
        }
        let mut file = File::open(path)
            .with_context(|| format!("설정 파일 열기 실패: {}", path.display()))?;
        Self::from_reader(&mut file)
            .with_context(|| format!("설정 파일 해석 실패: {}", path.display()))
    }

    /// Reader에서 YAML을 읽어 설정으로 파싱한다.
    pub fn from_reader<R: Read>(reader: &mut R) -> anyhow::Result<Self> {
        let mut buf = String::new();
        reader.read_to_string(&mut buf)?;
        if buf.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: AppConfig = serde_yaml::from_str(&buf)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = AppConfig::from_reader(&mut "autosave_debounce_ms: 250\n".as_bytes())
            .expect("파싱 실패");
        assert_eq!(config.autosave_debounce_ms, 250);
        assert_eq!(config.default_panel_width, 300.0);
        assert_eq!(config.document_name, "Untitled");
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn postgres_storage_is_parsed_from_tagged_yaml() {
        let yaml = "storage:\n  kind: postgres\n  dsn: host=localhost dbname=snn\n  user: editor\n";
        let config = AppConfig::from_reader(&mut yaml.as_bytes()).expect("파싱 실패");
        assert_eq!(
            config.storage,
            StorageConfig::Postgres {
                dsn: "host=localhost dbname=snn".to_string(),
                user: Some("editor".to_string()),
                password: None,
            }
        );
    }

    #[test]
    fn file_storage_without_dir_uses_default_directory() {
        let yaml = "storage:\n  kind: file\n";
        let config = AppConfig::from_reader(&mut yaml.as_bytes()).expect("파싱 실패");
        assert_eq!(config.storage, StorageConfig::default());
        assert_eq!(config.storage.kind(), "file");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("snnflow-config-that-does-not-exist.yaml");
        let config = AppConfig::load_from_path(&path).expect("기본값이어야 함");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn unknown_storage_kind_is_an_error() {
        let yaml = "storage:\n  kind: redis\n";
        assert!(AppConfig::from_reader(&mut yaml.as_bytes()).is_err());
    }
}
