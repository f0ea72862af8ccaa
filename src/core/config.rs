use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::{KioskError, PlaylistEntry, Result};

/// 轮播器配置（JSON）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskConfig {
    pub playlist: Vec<PlaylistEntry>,
    pub playback: PlaybackConfig,
    pub embed: EmbedConfig,
    pub end_screen: EndScreenConfig,
    pub preload: PreloadConfig,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            playlist: default_playlist(),
            playback: PlaybackConfig::default(),
            embed: EmbedConfig::default(),
            end_screen: EndScreenConfig::default(),
            preload: PreloadConfig::default(),
        }
    }
}

/// 播放控制相关的时间常量（毫秒）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub autoplay: bool,
    /// 初始音量 0-100
    pub initial_volume: u8,
    pub post_load_preload_delay_ms: u64,
    pub initial_preload_delay_ms: u64,
    pub local_failure_grace_ms: u64,
    pub embedded_failure_grace_ms: u64,
    pub autoplay_retry_base_ms: u64,
    pub autoplay_max_attempts: u32,
    /// 视频与屏幕宽高比差异超过该值时放大裁剪
    pub fit_aspect_threshold: f64,
    pub autoplay_indicator_ms: u64,
    pub quality_indicator_ms: u64,
    pub status_message_ms: u64,
    pub controls_hide_ms: u64,
    pub cursor_hide_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            autoplay: true,
            initial_volume: 100,
            post_load_preload_delay_ms: 1000,
            initial_preload_delay_ms: 3000,
            local_failure_grace_ms: 1000,
            embedded_failure_grace_ms: 2000,
            autoplay_retry_base_ms: 100,
            autoplay_max_attempts: 3,
            fit_aspect_threshold: 0.1,
            autoplay_indicator_ms: 2000,
            quality_indicator_ms: 3000,
            status_message_ms: 2000,
            controls_hide_ms: 4000,
            cursor_hide_ms: 3000,
        }
    }
}

/// 嵌入播放器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedConfig {
    pub player_base_url: String,
    /// 没有可靠的结束信号，用固定时长模拟（近似值，不是真实时长）
    pub simulated_duration_ms: u64,
    pub availability_probe_delay_ms: u64,
    /// 文档标题包含这些词（不区分大小写）视为不可用
    pub unavailable_markers: Vec<String>,
    pub widget_referrer: Option<String>,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            player_base_url: "https://www.youtube.com/embed".to_string(),
            simulated_duration_ms: 150_000,
            availability_probe_delay_ms: 5000,
            unavailable_markers: vec!["unavailable".to_string(), "private".to_string()],
            widget_referrer: None,
        }
    }
}

/// 结束画面配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndScreenConfig {
    pub images: Vec<String>,
    pub default_image: String,
    pub animations: Vec<String>,
    pub dwell_ms: u64,
}

impl Default for EndScreenConfig {
    fn default() -> Self {
        Self {
            images: vec![
                "END SCREEN/end1.jpg".to_string(),
                "END SCREEN/end2.jpg".to_string(),
            ],
            default_image: "END SCREEN/default.jpg".to_string(),
            animations: vec![
                "endScreenAnimation".to_string(),
                "endScreenSlideIn".to_string(),
                "endScreenZoomIn".to_string(),
            ],
            dwell_ms: 4000,
        }
    }
}

/// 预加载缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreloadConfig {
    /// 缓存上限，超过后按插入顺序淘汰
    pub capacity: usize,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self { capacity: 2 }
    }
}

impl KioskConfig {
    /// 从 JSON 文件加载并校验
    pub fn load(path: &Path) -> Result<Self> {
        info!("📄 加载配置文件: {}", path.display());
        let text = fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        info!("✅ 配置加载完成: {} 个视频", config.playlist.len());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: KioskConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.playlist.is_empty() {
            return Err(KioskError::EmptyPlaylist);
        }
        if self.preload.capacity == 0 {
            return Err(KioskError::Config("preload.capacity 必须大于 0".to_string()));
        }
        if self.end_screen.images.is_empty() {
            return Err(KioskError::Config("end_screen.images 不能为空".to_string()));
        }
        if self.end_screen.animations.is_empty() {
            return Err(KioskError::Config("end_screen.animations 不能为空".to_string()));
        }
        if self.playback.initial_volume > 100 {
            return Err(KioskError::Config(format!(
                "playback.initial_volume 超出范围: {}",
                self.playback.initial_volume
            )));
        }
        if self.playback.autoplay_max_attempts == 0 {
            return Err(KioskError::Config(
                "playback.autoplay_max_attempts 必须大于 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// 内置演示播放列表
fn default_playlist() -> Vec<PlaylistEntry> {
    vec![
        PlaylistEntry::embedded("XHTrLYShBRQ", "Apple", "iPhone 15"),
        PlaylistEntry::embedded("xqyUdNxWazA", "Apple", "iPhone 16"),
        PlaylistEntry::embedded("U4lz0LkBdXQ", "Samsung", "Galaxy S24"),
        PlaylistEntry::embedded("Bt9zSfinwFA", "OPPO", "A3 Pro"),
        PlaylistEntry::embedded("YEb3Pxws6x4", "OPPO", "Reno12 Pro"),
        PlaylistEntry::embedded("bNXiJcP5u8A", "Realme", "GT 7 Pro"),
        PlaylistEntry::embedded("HNMq5248cZg", "OPPO", "Find X8"),
        PlaylistEntry::embedded("kJQP7kiw5Fk", "OPPO", "F27 Pro+"),
        PlaylistEntry::embedded("jNQXAC9IVRw", "Demo", "Sample Video"),
    ]
}
