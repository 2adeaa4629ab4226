use std::path::PathBuf;

use clap::Parser;
use log::{error, info};

use ankle_hub::config::ConfigManager;
use ankle_hub::forwarder::run_forwarder;
use ankle_hub::logger;

/// Forward JSON frames from the ankle sensor's serial port to the hub.
#[derive(Parser, Debug)]
#[command(name = "ankle-forwarder", version)]
struct Args {
    /// 配置文件路径
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// 覆盖配置中的数据源，"-" 表示标准输入
    #[arg(short, long)]
    source: Option<String>,

    /// 覆盖配置中的串口波特率
    #[arg(short, long)]
    baud_rate: Option<u32>,

    /// 覆盖配置中的目标地址
    #[arg(short, long)]
    endpoint: Option<String>,
}

fn main() {
    logger::init_logger();
    let args = Args::parse();

    let manager = match ConfigManager::load_or_default(&args.config) {
        Ok(manager) => manager,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let mut config = manager.get_config().forwarder.clone();
    if let Some(source) = args.source {
        config.source = source;
    }
    if let Some(baud_rate) = args.baud_rate {
        config.baud_rate = baud_rate;
    }
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        tokio::select! {
            result = run_forwarder(&config) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        }
    });

    match result {
        Some(Ok(_)) => info!("Forwarder finished"),
        Some(Err(e)) => {
            error!("Forwarder failed: {}", e);
            std::process::exit(1);
        }
        None => info!("Stopping the forwarder"),
    }
}
