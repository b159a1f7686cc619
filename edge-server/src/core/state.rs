use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::auth::JwtService;
use crate::core::{Config, Result};
use crate::orders::LifecycleCoordinator;
use crate::realtime::RealtimeGateway;
use crate::store::{EntityStore, RedbEntityStore};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，作为 axum 的 `State` 注入每个处理器。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | coordinator | Arc<LifecycleCoordinator> | 唯一写入者 |
/// | gateway | Arc<RealtimeGateway> | 实时推送 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | shutdown | CancellationToken | 关闭信号 (WebSocket 连接监听) |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub coordinator: Arc<LifecycleCoordinator>,
    pub gateway: Arc<RealtimeGateway>,
    pub jwt_service: Arc<JwtService>,
    pub shutdown: CancellationToken,
}

impl ServerState {
    /// 组装服务 (存储已打开)
    pub fn new(config: Config, store: Arc<dyn EntityStore>) -> Result<Self> {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone())?);
        let gateway = Arc::new(RealtimeGateway::new(config.session_queue_capacity));
        let coordinator = Arc::new(LifecycleCoordinator::new(
            store,
            gateway.clone(),
            config.lock_timeout(),
        ));

        Ok(Self {
            config,
            coordinator,
            gateway,
            jwt_service,
            shutdown: CancellationToken::new(),
        })
    }

    /// 初始化服务器状态
    ///
    /// 1. 确保工作目录存在
    /// 2. 打开 `{work_dir}/pos.redb`
    /// 3. 组装协调器与实时网关
    pub fn initialize(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        let path = config.database_path();
        tracing::info!(path = %path.display(), "Opening entity store");
        let store = RedbEntityStore::open(&path)?;
        Self::new(config.clone(), Arc::new(store))
    }

    /// 内存存储的状态，用于测试
    pub fn in_memory(config: Config) -> Result<Self> {
        let store = RedbEntityStore::open_in_memory()?;
        Self::new(config, Arc::new(store))
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub fn coordinator(&self) -> &LifecycleCoordinator {
        &self.coordinator
    }

    pub fn gateway(&self) -> &Arc<RealtimeGateway> {
        &self.gateway
    }
}
