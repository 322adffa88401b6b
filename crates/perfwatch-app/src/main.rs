//! # perfwatch-app
//!
//! PERFWATCH 에이전트 바이너리 진입점.
//! 설정 로드, 호스트 기능 조립, 에이전트 실행, 세션 재생과 종료 처리.

mod lifecycle;
mod offline;
mod replay;

use anyhow::{Context, Result};
use clap::Parser;
use perfwatch_agent::TelemetryAgent;
use perfwatch_core::config::AppConfig;
use perfwatch_core::config_manager::ConfigManager;
use perfwatch_core::ports::transport::MetricsTransport;
use perfwatch_monitor::heap::SysInfoHeapProbe;
use perfwatch_monitor::host::ChannelHost;
use perfwatch_network::dispatcher::Dispatcher;
use perfwatch_network::http_client::HttpCollectorClient;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::lifecycle::LifecycleManager;
use crate::offline::LogOnlyTransport;
use crate::replay::ReplaySession;

/// 기본 클라이언트 식별 문자열
const DEFAULT_CLIENT_CONTEXT: &str = concat!("perfwatch/", env!("CARGO_PKG_VERSION"));

/// PERFWATCH 텔레메트리 에이전트
///
/// 페이지 세션의 성능 지표를 수집해 수집 서버로 전송한다.
#[derive(Parser, Debug)]
#[command(name = "perfwatch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 수집 서버 URL (기본: 설정 파일 값)
    #[arg(long, short = 'c')]
    collector: Option<String>,

    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 재생할 세션 파일 (기본: 내장 데모 세션)
    #[arg(long, short = 'r')]
    replay: Option<PathBuf>,

    /// 실행 시간 (초). 지정하지 않으면 재생이 끝날 때 종료
    #[arg(long)]
    duration_secs: Option<u64>,

    /// 오프라인 모드 (전송 대신 로그 출력)
    #[arg(long, short = 'o')]
    offline: bool,
}

/// 설정 관리자 생성 (CLI 경로 → 플랫폼 설정 디렉토리 → 현재 디렉토리)
fn open_config(path: Option<PathBuf>) -> Result<ConfigManager> {
    if let Some(path) = path {
        return ConfigManager::with_path(path).context("설정 파일 열기 실패");
    }

    match ConfigManager::new() {
        Ok(manager) => Ok(manager),
        Err(e) => {
            warn!("설정 관리자 초기화 실패, 현재 디렉토리 사용: {e}");
            ConfigManager::with_path(PathBuf::from("perfwatch-config.json"))
                .context("설정 관리자 생성 실패")
        }
    }
}

/// CLI 인자로 설정값 덮어쓰기
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(ref collector) = args.collector {
        config.collector.base_url = collector.clone();
    }
}

fn build_transport(config: &AppConfig, offline: bool) -> Result<Arc<dyn MetricsTransport>> {
    if offline {
        info!("오프라인 모드: 페이로드를 로그로만 출력");
        return Ok(Arc::new(LogOnlyTransport));
    }

    let client = HttpCollectorClient::from_config(&config.collector)
        .context("수집 서버 클라이언트 생성 실패")?;
    info!("수집 서버: {}", client.endpoint());
    Ok(Arc::new(client))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "perfwatch={lvl},perfwatch_app={lvl},perfwatch_core={lvl},perfwatch_monitor={lvl},perfwatch_network={lvl},perfwatch_agent={lvl}",
        lvl = args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    info!("PERFWATCH v{} 시작", env!("CARGO_PKG_VERSION"));

    let config_manager = open_config(args.config.clone())?;
    info!("설정 파일: {:?}", config_manager.config_path());
    let mut config = config_manager.get();
    apply_overrides(&mut config, &args);
    config.validate().context("설정값 검증 실패")?;

    let session = match args.replay {
        Some(ref path) => ReplaySession::load(path).context("세션 파일 로드 실패")?,
        None => {
            info!("세션 파일 없음, 내장 데모 세션 재생");
            ReplaySession::builtin()
        }
    };

    // ── 호스트 기능 조립 ──
    let host = Arc::new(ChannelHost::new());
    session.prepare(&host);

    let client_context = config
        .collector
        .client_context
        .clone()
        .or_else(|| session.user_agent.clone())
        .unwrap_or_else(|| DEFAULT_CLIENT_CONTEXT.to_string());
    let mut capabilities = host.capabilities(client_context);
    match SysInfoHeapProbe::current_process() {
        Some(probe) => capabilities = capabilities.with_heap(Arc::new(probe)),
        None => warn!("힙 프로브 없음, 메모리 수집 생략"),
    }
    info!("호스트 기능: {capabilities:?}");

    let transport = build_transport(&config, args.offline)?;
    let dispatcher = Dispatcher::new(transport, capabilities.client_context.clone());
    let agent = TelemetryAgent::start(capabilities, dispatcher, &config)
        .context("에이전트 시작 실패")?;

    // ── 실행 ──
    let lifecycle = Arc::new(LifecycleManager::new());
    {
        let lifecycle = lifecycle.clone();
        tokio::spawn(async move { lifecycle.wait_for_signal().await });
    }

    let replay = {
        let host = host.clone();
        let shutdown = lifecycle.subscribe();
        tokio::spawn(async move { session.play(&host, shutdown).await })
    };

    let mut shutdown = lifecycle.subscribe();
    match args.duration_secs {
        Some(secs) => {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                    info!("실행 시간 {secs}초 경과");
                }
                _ = shutdown.wait_for(|stop| *stop) => {}
            }
        }
        None => match replay.await {
            Ok(true) => {}
            Ok(false) => info!("재생 중단"),
            Err(e) => warn!("재생 태스크 실패: {e}"),
        },
    }
    lifecycle.shutdown();

    // ── 종료 ──
    agent.stop();
    if !agent
        .dispatcher()
        .wait_idle(config.request_timeout())
        .await
    {
        warn!("전송 완료 대기 시간 초과");
    }
    let stats = agent.dispatcher().stats();
    info!(
        "전송 통계: 성공 {}, 실패 {}, 진행 중 {}",
        stats.sent, stats.failed, stats.in_flight
    );

    let snapshot = serde_json::to_string_pretty(&agent.metrics()).context("지표 직렬화 실패")?;
    println!("{snapshot}");

    info!("PERFWATCH 종료");
    Ok(())
}
