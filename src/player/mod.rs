// 播放器核心模块

pub mod surface;         // 渲染表面抽象接口
pub mod source;          // 播放源能力契约
pub mod local_source;
pub mod embedded_source;
pub mod fit;
pub mod preload;
pub mod transition;      // 结束画面序列
pub mod controller;

#[cfg(test)]
pub mod testing;

pub use surface::RenderSurface;
pub use source::{PlaybackSource, RestartOutcome, SourceAdapter, SourceContext, SourceSignal};
pub use local_source::LocalFileSource;
pub use embedded_source::EmbeddedSource;
pub use preload::{PreloadManager, PreloadRequest};
pub use transition::{Chooser, EndScreenSequencer, RandomChooser};
pub use controller::PlaylistController;
