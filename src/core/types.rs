use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{KioskError, Result};

/// 播放源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceVariant {
    /// 第三方嵌入播放器（无法暂停 / seek / 获取精确结束时间）
    #[serde(alias = "youtube")]
    Embedded,

    /// 本地托管的视频文件（完整的客户端播放控制）
    #[serde(rename = "local")]
    LocalFile,
}

impl SourceVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceVariant::Embedded => "embedded",
            SourceVariant::LocalFile => "local",
        }
    }
}

impl fmt::Display for SourceVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 播放列表条目（启动时构造，之后不可变）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistEntry {
    pub variant: SourceVariant,
    /// 嵌入播放器 ID 或本地文件路径
    pub source_id: String,
    pub brand: String,
    pub model: String,
    pub display_name: String,
}

impl PlaylistEntry {
    pub fn local(path: &str, brand: &str, model: &str) -> Self {
        Self::new(SourceVariant::LocalFile, path, brand, model)
    }

    pub fn embedded(id: &str, brand: &str, model: &str) -> Self {
        Self::new(SourceVariant::Embedded, id, brand, model)
    }

    fn new(variant: SourceVariant, source_id: &str, brand: &str, model: &str) -> Self {
        Self {
            variant,
            source_id: source_id.to_string(),
            brand: brand.to_string(),
            model: model.to_string(),
            display_name: format!("{} {}", brand, model),
        }
    }

    pub fn is_local(&self) -> bool {
        self.variant == SourceVariant::LocalFile
    }
}

/// 播放列表状态 - 只由 PlaylistController 修改，其他组件通过访问器读取
#[derive(Debug, Clone)]
pub struct PlaylistState {
    entries: Vec<PlaylistEntry>,
    current_index: usize,
    autoplay_enabled: bool,
    has_user_interacted: bool,
}

impl PlaylistState {
    /// 空播放列表是致命的配置错误
    pub fn new(entries: Vec<PlaylistEntry>, autoplay_enabled: bool) -> Result<Self> {
        if entries.is_empty() {
            return Err(KioskError::EmptyPlaylist);
        }
        Ok(Self {
            entries,
            current_index: 0,
            autoplay_enabled,
            has_user_interacted: false,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> &PlaylistEntry {
        &self.entries[self.current_index]
    }

    /// 与当前条目的类型保持一致
    pub fn active_variant(&self) -> SourceVariant {
        self.current().variant
    }

    /// 下一个条目的索引（循环）
    pub fn next_index(&self) -> usize {
        (self.current_index + 1) % self.entries.len()
    }

    pub fn autoplay_enabled(&self) -> bool {
        self.autoplay_enabled
    }

    pub fn has_user_interacted(&self) -> bool {
        self.has_user_interacted
    }

    pub(crate) fn advance(&mut self) -> usize {
        self.current_index = self.next_index();
        self.current_index
    }

    pub(crate) fn retreat(&mut self) -> usize {
        let len = self.entries.len();
        self.current_index = (self.current_index + len - 1) % len;
        self.current_index
    }

    pub(crate) fn set_autoplay(&mut self, enabled: bool) {
        self.autoplay_enabled = enabled;
    }

    /// 返回 true 表示这是第一次用户交互
    pub(crate) fn mark_interacted(&mut self) -> bool {
        let first = !self.has_user_interacted;
        self.has_user_interacted = true;
        first
    }
}

/// 加载代数 - 每次加载分配一个新值，用于让延迟回调识别自己是否已过期
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}

/// 预加载资源句柄（对控制器不透明）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreloadHandle(pub u64);

/// 画面适配策略
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitMode {
    /// 裁剪铺满，可附带轻微放大（去黑边）
    Cover { scale_x: f32, scale_y: f32 },
    /// 拉伸填满（可能变形）
    Fill,
    /// 完整显示（可能有黑边）
    Contain,
}

impl FitMode {
    pub const COVER: FitMode = FitMode::Cover { scale_x: 1.0, scale_y: 1.0 };
    pub const COVER_ZOOM: FitMode = FitMode::Cover { scale_x: 1.1, scale_y: 1.1 };

    pub fn label(&self) -> &'static str {
        match self {
            FitMode::Cover { scale_x, scale_y } if *scale_x > 1.0 || *scale_y > 1.0 => "Cover + Zoom",
            FitMode::Cover { .. } => "Cover",
            FitMode::Fill => "Fill (Stretch)",
            FitMode::Contain => "Contain (Full Video)",
        }
    }
}

impl Default for FitMode {
    fn default() -> Self {
        FitMode::COVER
    }
}

/// 音量图标档位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeTier {
    Muted,
    Low,
    Medium,
    High,
}

impl VolumeTier {
    /// 滑块值 0-100 -> 图标档位
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => VolumeTier::Muted,
            1..=29 => VolumeTier::Low,
            30..=69 => VolumeTier::Medium,
            _ => VolumeTier::High,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            VolumeTier::Muted => "🔇",
            VolumeTier::Low => "🔈",
            VolumeTier::Medium => "🔉",
            VolumeTier::High => "🔊",
        }
    }
}

/// 分辨率标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityLabel {
    FullHd,
    Hd,
    Sd,
}

impl QualityLabel {
    pub fn from_width(width: u32) -> Self {
        if width >= 1920 {
            QualityLabel::FullHd
        } else if width >= 1280 {
            QualityLabel::Hd
        } else {
            QualityLabel::Sd
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLabel::FullHd => "Full HD",
            QualityLabel::Hd => "HD Quality",
            QualityLabel::Sd => "SD Quality",
        }
    }
}

/// 播放/暂停按钮显示的图标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayButton {
    /// 显示 ⏸（看起来在播放）
    ShowsPause,
    /// 显示 ▶（看起来已暂停）
    ShowsPlay,
}

impl PlayButton {
    pub fn glyph(&self) -> &'static str {
        match self {
            PlayButton::ShowsPause => "⏸",
            PlayButton::ShowsPlay => "▶",
        }
    }
}

/// 屏幕上的临时提示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Indicator {
    Autoplay,
    Quality,
    Buffer,
    Status,
    Failure,
}

/// 结束画面的显示内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndScreenView {
    Hidden,
    Image { src: String, animation: String },
    /// 图片全部加载失败时的纯色背景
    Blank,
}

/// 发往渲染表面的 UI 更新
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayUpdate {
    EntryInfo { brand: String, model: String },
    PlayButton(PlayButton),
    VolumeIcon(VolumeTier),
    Progress { percent: f64 },
    TimeDisplay(String),
    Indicator { indicator: Indicator, text: Option<String> },
    /// None 表示隐藏加载提示
    Loading(Option<String>),
    Controls(bool),
    Cursor(bool),
    EndScreen(EndScreenView),
}

/// 交互层转发的离散命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    TogglePlayPause,
    Restart,
    SetVolume(u8),
    ToggleFullscreen,
    ToggleAutoplay,
    CycleFit,
    /// 指针/触摸活动，只用于保持 UI 可见
    PointerActivity,
}

/// 触摸滑动判定阈值（像素）
pub const SWIPE_THRESHOLD_PX: f32 = 50.0;

impl Command {
    /// 键盘按键 -> 命令
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowRight" => Some(Command::Next),
            "ArrowLeft" => Some(Command::Previous),
            " " => Some(Command::TogglePlayPause),
            "r" => Some(Command::Restart),
            "f" => Some(Command::ToggleFullscreen),
            "a" => Some(Command::ToggleAutoplay),
            "z" => Some(Command::CycleFit),
            _ => None,
        }
    }

    /// 竖直滑动：向上 -> 下一个，向下 -> 上一个
    pub fn from_swipe(start_y: f32, end_y: f32) -> Option<Self> {
        let diff = start_y - end_y;
        if diff.abs() <= SWIPE_THRESHOLD_PX {
            return None;
        }
        if diff > 0.0 {
            Some(Command::Next)
        } else {
            Some(Command::Previous)
        }
    }

    /// 是否算作一次用户交互（解锁有声自动播放）
    pub fn is_user_gesture(&self) -> bool {
        !matches!(self, Command::PointerActivity)
    }
}

/// 渲染表面回报的媒体事件（带加载代数）
#[derive(Debug, Clone, PartialEq)]
pub struct MediaEvent {
    pub generation: Generation,
    pub kind: MediaEventKind,
}

impl MediaEvent {
    pub fn new(generation: Generation, kind: MediaEventKind) -> Self {
        Self { generation, kind }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaEventKind {
    MetadataReady { width: u32, height: u32 },
    CanPlay,
    PlaybackStarted,
    PlayRejected,
    Paused,
    Waiting,
    TimeUpdate { position_secs: f64, duration_secs: f64 },
    Ended,
    Failed { reason: String },
    InterstitialLoaded,
    InterstitialFailed,
}

/// 预加载请求的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreloadOutcome {
    MetadataReady,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreloadEvent {
    pub handle: PreloadHandle,
    pub outcome: PreloadOutcome,
}

/// 秒 -> "MM:SS"
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "00:00".to_string();
    }
    let mins = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{:02}:{:02}", mins, secs)
}
