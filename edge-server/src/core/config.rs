use std::path::PathBuf;
use std::time::Duration;

use crate::auth::{DEV_JWT_SECRET, JwtConfig};
use crate::orders::DelayThresholds;

/// 服务器配置 - 边缘节点的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖 (`.env` 由 `main` 通过 dotenv 加载)：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (redb 数据文件) |
/// | HTTP_PORT | 9625 | HTTP / WebSocket 端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 默认日志级别 (RUST_LOG 优先) |
/// | LOG_JSON | false | JSON 日志输出 |
/// | LOG_DIR | - | 设置后按天滚动写入日志文件 |
/// | JWT_SECRET | 开发密钥 | HS256 签名密钥 |
/// | JWT_EXPIRATION_MINUTES | 720 | 令牌有效期 |
/// | LOCK_TIMEOUT_MS | 2000 | 桌台锁等待上限 |
/// | SESSION_QUEUE_CAPACITY | 256 | 每个连接的发送队列长度 |
/// | DELAY_CHECK_INTERVAL_SECS | 30 | 出餐延迟扫描周期 |
/// | DELAY_WARNING_MINUTES | 15 | warning 告警阈值 |
/// | DELAY_CRITICAL_MINUTES | 30 | critical 告警阈值 |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | 优雅关闭超时 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/pos HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存放数据库文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 桌台锁等待上限 (毫秒)
    pub lock_timeout_ms: u64,
    /// 每个实时连接的发送队列长度
    pub session_queue_capacity: usize,
    pub delay_check_interval_secs: u64,
    pub delay_warning_minutes: u64,
    pub delay_critical_minutes: u64,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.into()),
            expiration_minutes: env_or("JWT_EXPIRATION_MINUTES", 720),
            ..JwtConfig::default()
        };

        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: env_or("HTTP_PORT", 9625),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_or("LOG_JSON", false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            jwt,
            lock_timeout_ms: env_or("LOCK_TIMEOUT_MS", 2000),
            session_queue_capacity: env_or("SESSION_QUEUE_CAPACITY", 256),
            delay_check_interval_secs: env_or("DELAY_CHECK_INTERVAL_SECS", 30),
            delay_warning_minutes: env_or("DELAY_WARNING_MINUTES", 15),
            delay_critical_minutes: env_or("DELAY_CRITICAL_MINUTES", 30),
            shutdown_timeout_ms: env_or("SHUTDOWN_TIMEOUT_MS", 10000),
        }
    }

    /// 测试用配置：不读取环境变量，开发环境
    pub fn for_tests(work_dir: impl Into<String>) -> Self {
        Self {
            work_dir: work_dir.into(),
            http_port: 0,
            environment: "development".into(),
            log_level: "debug".into(),
            log_json: false,
            log_dir: None,
            jwt: JwtConfig::default(),
            lock_timeout_ms: 2000,
            session_queue_capacity: 256,
            delay_check_interval_secs: 30,
            delay_warning_minutes: 15,
            delay_critical_minutes: 30,
            shutdown_timeout_ms: 1000,
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// 数据库文件路径
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("pos.redb")
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    pub fn delay_interval(&self) -> Duration {
        Duration::from_secs(self.delay_check_interval_secs.max(1))
    }

    pub fn delay_thresholds(&self) -> DelayThresholds {
        DelayThresholds {
            warning: Duration::from_secs(self.delay_warning_minutes * 60),
            critical: Duration::from_secs(self.delay_critical_minutes * 60),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
