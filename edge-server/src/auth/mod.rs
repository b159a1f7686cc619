//! 认证模块
//!
//! - [`JwtService`] - JWT 令牌服务
//! - [`CurrentUser`] - 当前员工上下文 (axum 提取器)
//! - [`require_auth`] - 员工路由认证中间件
//!
//! 角色授权由协调器按操作执行，这里只负责身份。

pub mod extractor;
pub mod jwt;
pub mod middleware;

pub use extractor::authenticate;
pub use jwt::{Claims, CurrentUser, DEV_JWT_SECRET, JwtConfig, JwtError, JwtService};
pub use middleware::require_auth;
