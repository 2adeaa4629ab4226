use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use log::{error, info, warn};

use ankle_hub::api::{create_router, AppState};
use ankle_hub::config::{ConfigManager, ServerConfig};
use ankle_hub::dashboard::run_dashboard;
use ankle_hub::database::{spawn_store, DatabaseManager, StoreHandle};
use ankle_hub::logger;

/// Ankle sensor ingestion server with a live analytics dashboard.
#[derive(Parser, Debug)]
#[command(name = "ankle-hub", version)]
struct Args {
    /// 配置文件路径，不存在时使用默认配置
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// 只运行 HTTP 服务，不打开仪表盘
    #[arg(long)]
    headless: bool,

    /// 打印所有派生记录后退出
    #[arg(long)]
    dump: bool,
}

fn main() {
    logger::init_logger();
    let args = Args::parse();
    info!("Application starting");

    let manager = match ConfigManager::load_or_default(&args.config) {
        Ok(manager) => manager,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    let config = manager.get_config().clone();

    let db_manager = match DatabaseManager::open(config.get_database_path(), config.database.auto_create_dir) {
        Ok(db_manager) => db_manager,
        Err(e) => {
            error!("Failed to open database {}: {}", config.database.path, e);
            std::process::exit(1);
        }
    };

    let shutdown_signal = Arc::new(AtomicBool::new(false));
    let (store, db_handle) = spawn_store(
        db_manager,
        config.database.channel_capacity,
        Arc::clone(&shutdown_signal),
    );

    if args.dump {
        let result = dump_database(&store);
        stop_database(store, &shutdown_signal, db_handle);
        if let Err(e) = result {
            error!("Dump failed: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let server_store = store.clone();
    let server_config = config.server.clone();
    let server_shutdown = Arc::clone(&shutdown_signal);
    let server_handle = thread::spawn(move || run_server(server_store, server_config, server_shutdown));

    if config.dashboard.enabled && !args.headless {
        // eframe 必须运行在主线程
        if let Err(e) = run_dashboard(store.clone(), &config.dashboard, Arc::clone(&shutdown_signal)) {
            error!("GUI failed: {}", e);
        }
        info!("Dashboard closed, signaling server to shutdown");
        shutdown_signal.store(true, Ordering::Relaxed);
    } else {
        info!("Running headless, press Ctrl-C to stop");
    }

    let server_ok = match server_handle.join() {
        Ok(Ok(())) => {
            info!("Server shut down gracefully");
            true
        }
        Ok(Err(e)) => {
            error!("Server failed: {}", e);
            false
        }
        Err(_) => {
            error!("Server thread panicked");
            false
        }
    };

    stop_database(store, &shutdown_signal, db_handle);

    if !server_ok {
        std::process::exit(1);
    }
}

fn stop_database(store: StoreHandle, shutdown_signal: &AtomicBool, db_handle: thread::JoinHandle<()>) {
    shutdown_signal.store(true, Ordering::Relaxed);
    drop(store);

    match db_handle.join() {
        Ok(()) => info!("Database thread shut down gracefully"),
        Err(e) => error!("Database thread panicked: {:?}", e),
    }
}

fn run_server(store: StoreHandle, config: ServerConfig, shutdown_signal: Arc<AtomicBool>) -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
        info!("Server listening on http://{}", listener.local_addr()?);

        let app = create_router(AppState::new(store));
        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown_signal))
            .await
    })
}

/// Ctrl-C 或仪表盘关闭（信号置位）时返回
async fn wait_for_shutdown(shutdown_signal: Arc<AtomicBool>) {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ctrl_c_active = true;
    let mut ticker = tokio::time::interval(Duration::from_millis(200));

    loop {
        tokio::select! {
            result = &mut ctrl_c, if ctrl_c_active => match result {
                Ok(()) => {
                    info!("Ctrl-C received, shutting down");
                    shutdown_signal.store(true, Ordering::Relaxed);
                    break;
                }
                Err(e) => {
                    // 只依赖关闭信号
                    warn!("Failed to listen for Ctrl-C: {}", e);
                    ctrl_c_active = false;
                }
            },
            _ = ticker.tick() => {
                if shutdown_signal.load(Ordering::Relaxed) {
                    break;
                }
            }
        }
    }
}

/// 每条派生记录一行 JSON，最后输出两张表的记录数
fn dump_database(store: &StoreHandle) -> Result<(), Box<dyn std::error::Error>> {
    let records = store.all_derived_blocking()?;
    let (raw_count, derived_count) = store.stats_blocking()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for metrics in &records {
        writeln!(out, "{}", serde_json::to_string(metrics)?)?;
    }
    writeln!(out, "raw_sensor_data: {} records", raw_count)?;
    writeln!(out, "processed_metrics: {} records", derived_count)?;

    Ok(())
}
