#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod config;
mod editor;
mod persistence;
mod scheme;
mod theme;

use anyhow::Context;
use app::SnnFlowApp;
use config::{AppConfig, StorageConfig};
use eframe::egui;
use persistence::{SharedStore, open_store};
use tokio::runtime::Runtime;
use tracing::{error, info};

/// egui 애플리케이션을 초기화하고 실행하는 진입점입니다.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = AppConfig::load()?;
    let runtime = Runtime::new().context("Tokio 런타임 생성 실패")?;
    let store = runtime.block_on(open_configured_store(&config))?;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_app_id("SNN Flow Editor")
            .with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "SNN Flow Editor",
        native_options,
        Box::new(move |cc| Box::new(SnnFlowApp::new(cc, config, runtime, store))),
    )
    .map_err(|err| anyhow::anyhow!("UI 실행 실패: {err}"))
}

/// 설정된 저장소를 연다. PostgreSQL 연결에 실패하면 기본 파일 저장소로 대신한다.
async fn open_configured_store(config: &AppConfig) -> anyhow::Result<SharedStore> {
    match open_store(&config.storage).await {
        Ok(store) => {
            info!(storage = config.storage.kind(), "문서 저장소 준비 완료");
            Ok(store)
        }
        Err(err) if matches!(config.storage, StorageConfig::Postgres { .. }) => {
            error!("PostgreSQL 저장소를 열 수 없어 파일 저장소를 사용합니다: {err:#}");
            open_store(&StorageConfig::default()).await
        }
        Err(err) => Err(err),
    }
}
