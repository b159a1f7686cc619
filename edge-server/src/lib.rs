//! POS Edge Server - 桌台与订单生命周期协调
//!
//! # 架构概述
//!
//! - **存储** (`store`): redb 嵌入式实体存储，版本号 + 原子批量提交
//! - **订单** (`orders`): 状态机、桌台锁、生命周期协调器、出餐延迟监控
//! - **实时** (`realtime`): 房间路由、连接网关、WebSocket 传输
//! - **认证** (`auth`): JWT 员工身份
//! - **HTTP API** (`api`): 每个协调器操作一个接口
//!
//! # 模块结构
//!
//! ```text
//! edge-server/src/
//! ├── core/          # 配置、状态、服务器、后台任务
//! ├── auth/          # JWT 认证
//! ├── api/           # HTTP 路由和处理器
//! ├── orders/        # 状态机 + 协调器
//! ├── realtime/      # 房间、网关、WebSocket
//! ├── store/         # 实体存储
//! └── utils/         # 日志
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod orders;
pub mod realtime;
pub mod store;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use orders::{CoordinatorError, LifecycleCoordinator};
pub use realtime::{RealtimeGateway, Session, SessionInfo};
pub use store::{EntityStore, RedbEntityStore};

// Re-export unified error types from shared
pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

// Security logging macro - 记录到 `security` target
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 加载 `.env` 并初始化日志
pub fn setup_environment() -> anyhow::Result<Config> {
    if let Err(e) = dotenv::dotenv() {
        // .env 是可选的
        eprintln!("No .env loaded: {}", e);
    }
    let config = Config::from_env();
    init_logger_with_file(&config.log_level, config.log_json, config.log_dir.as_deref())?;
    if config.jwt.secret == auth::DEV_JWT_SECRET {
        if config.is_production() {
            anyhow::bail!("JWT_SECRET must be set in production");
        }
        tracing::warn!("JWT_SECRET not set, using the development secret");
    }
    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
    ____  ____  _____    ______    __
   / __ \/ __ \/ ___/   / ____/___/ /___ ____
  / /_/ / / / /\__ \   / __/ / __  / __ `/ _ \
 / ____/ /_/ /___/ /  / /___/ /_/ / /_/ /  __/
/_/    \____//____/  /_____/\__,_/\__, /\___/
                                 /____/
    "#
    );
}
