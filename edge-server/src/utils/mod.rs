//! 工具模块
//!
//! - [`logger`] - 日志初始化 (控制台 + 按天滚动文件)

pub mod logger;
