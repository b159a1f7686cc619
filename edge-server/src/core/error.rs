use thiserror::Error;

use crate::auth::JwtError;
use crate::store::StoreError;

/// 启动与运行期错误 (非请求级)
///
/// 请求级错误走 [`shared::error::AppError`]
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("存储初始化失败: {0}")]
    Store(#[from] StoreError),

    #[error("认证配置错误: {0}")]
    Auth(#[from] JwtError),

    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("内部服务器错误")]
    Internal(#[from] anyhow::Error),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, ServerError>;
