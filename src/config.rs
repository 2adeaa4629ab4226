use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 应用配置管理模块
/// 集中管理所有配置项，提供默认值和配置验证

/// 主配置结构
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub dashboard: DashboardConfig,
    pub forwarder: ForwarderConfig,
}

/// HTTP 服务配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 数据库配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    /// 数据库任务队列容量，队列满时请求直接失败
    pub channel_capacity: usize,
    pub auto_create_dir: bool,
}

/// 仪表盘配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub title: String,
    pub width: f32,
    pub height: f32,
    pub refresh_interval_ms: u64,
    /// 每次刷新拉取的最近记录条数
    pub window_size: usize,
    pub histogram_bins: usize,
}

/// 串口转发配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwarderConfig {
    /// 串口设备路径，"-" 表示从标准输入读取
    pub source: String,
    pub baud_rate: u32,
    pub endpoint: String,
    pub pause_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/ankle_sensor.db".to_string(),
            channel_capacity: 100,
            auto_create_dir: true,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            title: "Real-Time Football Analytics Dashboard".to_string(),
            width: 1280.0,
            height: 900.0,
            refresh_interval_ms: 2000,
            window_size: 100,
            histogram_bins: 10,
        }
    }
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            source: "/dev/tty.HC-05".to_string(),
            baud_rate: 9600,
            endpoint: "http://127.0.0.1:5001/api/data".to_string(),
            pause_ms: 1000,
            request_timeout_ms: 5000,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DashboardConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

impl ForwarderConfig {
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl AppConfig {
    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::IoError)?;

        let config: AppConfig = toml::from_str(&content).map_err(ConfigError::ParseError)?;

        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::SerializeError)?;

        std::fs::write(path, content).map_err(ConfigError::IoError)?;

        Ok(())
    }

    /// 用环境变量覆盖文件中的配置（.env 由调用方提前加载）
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = env::var("ANKLE_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("ANKLE_PORT") {
            self.server.port = port.parse::<u16>().map_err(|e| {
                ConfigError::ValidationError(format!("ANKLE_PORT is not a valid port: {}", e))
            })?;
        }
        if let Ok(path) = env::var("ANKLE_DB_PATH") {
            self.database.path = path;
        }
        if let Ok(url) = env::var("ANKLE_FORWARD_URL") {
            self.forwarder.endpoint = url;
        }
        if let Ok(source) = env::var("ANKLE_SERIAL_PORT") {
            self.forwarder.source = source;
        }
        self.validate()
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError("Server port must be positive".to_string()));
        }

        if self.database.path.trim().is_empty() {
            return Err(ConfigError::ValidationError("Database path must not be empty".to_string()));
        }

        if self.database.channel_capacity == 0 {
            return Err(ConfigError::ValidationError("Database channel capacity must be positive".to_string()));
        }

        if self.dashboard.width <= 0.0 || self.dashboard.height <= 0.0 {
            return Err(ConfigError::ValidationError("Dashboard dimensions must be positive".to_string()));
        }

        if self.dashboard.refresh_interval_ms == 0 {
            return Err(ConfigError::ValidationError("Dashboard refresh interval must be positive".to_string()));
        }

        if self.dashboard.window_size == 0 {
            return Err(ConfigError::ValidationError("Dashboard window size must be positive".to_string()));
        }

        if self.dashboard.histogram_bins == 0 {
            return Err(ConfigError::ValidationError("Histogram bin count must be positive".to_string()));
        }

        if self.forwarder.baud_rate == 0 {
            return Err(ConfigError::ValidationError("Forwarder baud rate must be positive".to_string()));
        }

        if self.forwarder.endpoint.trim().is_empty() {
            return Err(ConfigError::ValidationError("Forwarder endpoint must not be empty".to_string()));
        }

        Ok(())
    }

    /// 获取数据库文件路径
    pub fn get_database_path(&self) -> PathBuf {
        PathBuf::from(&self.database.path)
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(toml::de::Error),
    #[error("Serialize error: {0}")]
    SerializeError(toml::ser::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// 配置管理器
pub struct ConfigManager {
    config: AppConfig,
}

impl ConfigManager {
    /// 创建配置管理器
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = AppConfig::load_from_file(path)?;
        Ok(Self { config })
    }

    /// 文件存在时加载，否则使用默认配置；随后应用环境变量覆盖
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut manager = if path.as_ref().exists() {
            Self::load_from_file(&path)?
        } else {
            log::info!("Config file {} not found, using defaults", path.as_ref().display());
            Self::new()
        };
        manager.config.apply_env_overrides()?;
        Ok(manager)
    }

    /// 获取当前配置
    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
