use thiserror::Error;

use crate::core::SourceVariant;

#[derive(Error, Debug)]
pub enum KioskError {
    #[error("播放列表为空，无法开始轮播")]
    EmptyPlaylist,

    #[error("配置错误: {0}")]
    Config(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{variant} 源不支持操作: {operation}")]
    Unsupported {
        operation: &'static str,
        variant: SourceVariant,
    },

    #[error("渲染表面错误: {0}")]
    Surface(String),
}

pub type Result<T> = std::result::Result<T, KioskError>;
