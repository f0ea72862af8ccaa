// 核心数据结构和类型定义

pub mod types;
pub mod clock;
pub mod config;
pub mod error;
pub mod timer;

pub use types::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use timer::*;
