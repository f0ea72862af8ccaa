use crate::core::{
    FitMode, Generation, KioskConfig, MediaEventKind, PlaylistEntry, PreloadHandle, Result,
    SourceVariant, TimerKind, TimerQueue,
};
use crate::player::embedded_source::EmbeddedSource;
use crate::player::local_source::LocalFileSource;
use crate::player::RenderSurface;

/// 播放源操作时需要的上下文（由控制器借出）
pub struct SourceContext<'a> {
    pub surface: &'a mut dyn RenderSurface,
    pub timers: &'a mut TimerQueue,
    pub config: &'a KioskConfig,
    pub now_ms: u64,
    pub generation: Generation,
    /// 用户最后设置的音量 0-100
    pub volume: u8,
    pub autoplay: bool,
    pub has_user_interacted: bool,
    /// 本次会话第一次加载本地视频
    pub is_first_local_load: bool,
}

impl SourceContext<'_> {
    pub fn schedule(&mut self, delay_ms: u64, kind: TimerKind) {
        self.timers
            .schedule(self.now_ms, delay_ms, Some(self.generation), kind);
    }
}

/// 播放源回报给控制器的信号
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSignal {
    /// 无需控制器处理
    Idle,
    /// 本地视频元数据就绪
    Ready { width: u32, height: u32 },
    Started,
    Paused,
    /// 自然播放结束
    EndOfPlayback,
    /// 可恢复的播放失败
    Failure { reason: String },
    /// 自动播放被浏览器策略拒绝，已放弃重试
    AutoplayBlocked,
}

/// 重启结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartOutcome {
    /// 已回到开头继续播放
    Rewound,
    /// 没有 seek 能力，需要整体重新加载
    ReloadRequired,
}

/// 播放源能力契约
///
/// 每种源只实现自己真正支持的操作，不支持的操作返回 `KioskError::Unsupported`
pub trait SourceAdapter {
    fn variant(&self) -> SourceVariant;

    fn load(&mut self, cx: &mut SourceContext<'_>, warmed: Option<PreloadHandle>);

    fn play(&mut self, cx: &mut SourceContext<'_>) -> Result<()>;

    fn pause(&mut self, cx: &mut SourceContext<'_>) -> Result<()>;

    fn restart(&mut self, cx: &mut SourceContext<'_>) -> RestartOutcome;

    /// 拆除：切换到下一个源之前调用
    fn teardown(&mut self, surface: &mut dyn RenderSurface) {
        surface.clear();
    }

    /// 是否可以在外部暂停
    fn supports_pause(&self) -> bool;

    fn is_playing(&self, surface: &dyn RenderSurface) -> bool;

    /// 仅本地视频可用
    fn intrinsic_dimensions(&self) -> Option<(u32, u32)>;

    /// 手动切换画面适配
    fn cycle_fit(&mut self, surface: &mut dyn RenderSurface) -> Result<FitMode>;

    /// 失败后跳过前的宽限期
    fn failure_grace_ms(&self, config: &KioskConfig) -> u64;

    fn on_media_event(&mut self, cx: &mut SourceContext<'_>, kind: &MediaEventKind) -> SourceSignal;

    fn on_timer(&mut self, cx: &mut SourceContext<'_>, kind: TimerKind) -> SourceSignal;

    /// 用户第一次交互（可以解除自动播放静音）
    fn on_user_interaction(&mut self, _cx: &mut SourceContext<'_>) {}
}

/// 当前活动的播放源
pub enum PlaybackSource {
    Local(LocalFileSource),
    Embedded(EmbeddedSource),
}

impl PlaybackSource {
    pub fn for_entry(entry: &PlaylistEntry) -> Self {
        match entry.variant {
            SourceVariant::LocalFile => PlaybackSource::Local(LocalFileSource::new(&entry.source_id)),
            SourceVariant::Embedded => PlaybackSource::Embedded(EmbeddedSource::new(&entry.source_id)),
        }
    }

    pub fn adapter(&self) -> &dyn SourceAdapter {
        match self {
            PlaybackSource::Local(source) => source,
            PlaybackSource::Embedded(source) => source,
        }
    }

    pub fn adapter_mut(&mut self) -> &mut dyn SourceAdapter {
        match self {
            PlaybackSource::Local(source) => source,
            PlaybackSource::Embedded(source) => source,
        }
    }

    pub fn variant(&self) -> SourceVariant {
        self.adapter().variant()
    }
}
