use crate::core::{FitMode, Generation, OverlayUpdate, PreloadHandle, Result};

/// 渲染表面抽象接口
///
/// 由外部协作者实现（浏览器页面、控制台模拟器、测试桩）。
/// 同一时刻只有一个播放源占用表面；切换时先 `clear` 再显示新源。
///
/// 异步结果（元数据就绪、播放开始、播放被拒绝、结束、错误、图片加载）
/// 通过 `MediaEvent` 回报，并带上显示时传入的 `Generation`。
pub trait RenderSurface {
    /// 显示本地视频；`warmed` 为已预热的资源（如有）
    fn show_local(&mut self, generation: Generation, path: &str, warmed: Option<PreloadHandle>);

    /// 创建沙箱化的嵌入播放器（原生控件、相关推荐、快捷键全部关闭）
    fn show_embedded(&mut self, generation: Generation, url: &str);

    /// 拆除当前播放源
    fn clear(&mut self);

    /// 请求播放；结果以 PlaybackStarted / PlayRejected 回报
    fn play(&mut self);

    fn pause(&mut self);

    fn is_paused(&self) -> bool;

    fn seek(&mut self, position_secs: f64);

    fn set_muted(&mut self, muted: bool);

    /// 音量 0.0 - 1.0
    fn set_volume(&mut self, volume: f32);

    /// 本地视频的原始尺寸
    fn intrinsic_dimensions(&self) -> Option<(u32, u32)>;

    /// 可视区域尺寸
    fn viewport(&self) -> (u32, u32);

    fn apply_fit(&mut self, fit: FitMode);

    /// 返回切换后是否处于全屏
    fn toggle_fullscreen(&mut self) -> Result<bool>;

    /// 嵌入文档的标题；跨域限制下可能拿不到
    fn embedded_document_title(&self) -> Option<String>;

    /// 隐藏、静音、只取元数据的预取；结果以 PreloadEvent 回报
    fn begin_preload(&mut self, handle: PreloadHandle, path: &str);

    fn release_preload(&mut self, handle: PreloadHandle);

    /// 加载结束画面图片；结果以 InterstitialLoaded / InterstitialFailed 回报
    fn load_interstitial_image(&mut self, generation: Generation, src: &str);

    fn overlay(&mut self, update: OverlayUpdate);
}
