use crossbeam_channel::Sender;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::app::AppEvent;
use crate::core::{
    FitMode, Generation, KioskError, MediaEvent, MediaEventKind, OverlayUpdate, PreloadEvent,
    PreloadHandle, PreloadOutcome, Result,
};
use crate::player::RenderSurface;

/// 控制台上无法读取视频头，统一按 1080p 回报
const ASSUMED_DIMENSIONS: (u32, u32) = (1920, 1080);

enum Showing {
    Nothing,
    Local { generation: Generation, exists: bool },
    Embedded,
}

/// 控制台渲染表面 - 无界面运行
///
/// 把所有渲染操作打印到日志，并按浏览器的行为合成媒体事件送回事件队列：
/// 本地文件存在时回报元数据/可播放/开始播放，不存在时回报错误。
pub struct ConsoleSurface {
    events_tx: Sender<AppEvent>,
    media_root: PathBuf,
    viewport: (u32, u32),
    showing: Showing,
    paused: bool,
}

impl ConsoleSurface {
    pub fn new(events_tx: Sender<AppEvent>, media_root: PathBuf) -> Self {
        Self {
            events_tx,
            media_root,
            viewport: ASSUMED_DIMENSIONS,
            showing: Showing::Nothing,
            paused: true,
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.media_root.join(path)
        }
    }

    fn emit(&self, event: AppEvent) {
        if self.events_tx.send(event).is_err() {
            warn!("⚠️  事件队列已关闭，丢弃事件");
        }
    }

    fn emit_media(&self, generation: Generation, kind: MediaEventKind) {
        self.emit(AppEvent::Media(MediaEvent::new(generation, kind)));
    }
}

impl RenderSurface for ConsoleSurface {
    fn show_local(&mut self, generation: Generation, path: &str, warmed: Option<PreloadHandle>) {
        let resolved = self.resolve(path);
        let exists = resolved.is_file();
        info!("📺 [表面] 显示本地视频: {} (预热: {:?})", resolved.display(), warmed);
        self.showing = Showing::Local { generation, exists };
        self.paused = true;

        if exists {
            let (width, height) = ASSUMED_DIMENSIONS;
            self.emit_media(generation, MediaEventKind::MetadataReady { width, height });
            self.emit_media(generation, MediaEventKind::CanPlay);
        } else {
            self.emit_media(
                generation,
                MediaEventKind::Failed { reason: format!("file not found: {}", resolved.display()) },
            );
        }
    }

    fn show_embedded(&mut self, _generation: Generation, url: &str) {
        info!("📺 [表面] 嵌入播放器: {}", url);
        self.showing = Showing::Embedded;
        self.paused = false;
    }

    fn clear(&mut self) {
        debug!("📺 [表面] 清除");
        self.showing = Showing::Nothing;
        self.paused = true;
    }

    fn play(&mut self) {
        if let Showing::Local { generation, exists: true } = self.showing {
            self.paused = false;
            self.emit_media(generation, MediaEventKind::PlaybackStarted);
        }
    }

    fn pause(&mut self) {
        if let Showing::Local { generation, .. } = self.showing {
            self.paused = true;
            self.emit_media(generation, MediaEventKind::Paused);
        }
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn seek(&mut self, position_secs: f64) {
        debug!("📺 [表面] 跳转到 {:.1}s", position_secs);
    }

    fn set_muted(&mut self, muted: bool) {
        debug!("📺 [表面] 静音: {}", muted);
    }

    fn set_volume(&mut self, volume: f32) {
        debug!("📺 [表面] 音量: {:.2}", volume);
    }

    fn intrinsic_dimensions(&self) -> Option<(u32, u32)> {
        match self.showing {
            Showing::Local { exists: true, .. } => Some(ASSUMED_DIMENSIONS),
            _ => None,
        }
    }

    fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    fn apply_fit(&mut self, fit: FitMode) {
        info!("📺 [表面] 画面适配: {}", fit.label());
    }

    fn toggle_fullscreen(&mut self) -> Result<bool> {
        Err(KioskError::Surface("控制台没有全屏模式".to_string()))
    }

    fn embedded_document_title(&self) -> Option<String> {
        // 嵌入文档跨域，读不到标题
        None
    }

    fn begin_preload(&mut self, handle: PreloadHandle, path: &str) {
        let outcome = if self.resolve(path).is_file() {
            PreloadOutcome::MetadataReady
        } else {
            PreloadOutcome::Failed
        };
        debug!("📺 [表面] 预取 {:?}: {} -> {:?}", handle, path, outcome);
        self.emit(AppEvent::Preload(PreloadEvent { handle, outcome }));
    }

    fn release_preload(&mut self, handle: PreloadHandle) {
        debug!("📺 [表面] 释放预取 {:?}", handle);
    }

    fn load_interstitial_image(&mut self, generation: Generation, src: &str) {
        let kind = if self.resolve(src).is_file() {
            MediaEventKind::InterstitialLoaded
        } else {
            MediaEventKind::InterstitialFailed
        };
        self.emit_media(generation, kind);
    }

    fn overlay(&mut self, update: OverlayUpdate) {
        match &update {
            OverlayUpdate::Progress { .. } | OverlayUpdate::TimeDisplay(_) => {
                debug!("🖼️  [界面] {:?}", update)
            }
            _ => info!("🖼️  [界面] {}", describe_overlay(&update)),
        }
    }
}

/// 界面更新的可读描述
fn describe_overlay(update: &OverlayUpdate) -> String {
    let shown = |visible: bool| if visible { "显示" } else { "隐藏" };
    match update {
        OverlayUpdate::EntryInfo { brand, model } => format!("{} {}", brand, model),
        OverlayUpdate::PlayButton(button) => format!("按钮 {}", button.glyph()),
        OverlayUpdate::VolumeIcon(tier) => format!("音量 {}", tier.icon()),
        OverlayUpdate::Progress { percent } => format!("进度 {:.1}%", percent),
        OverlayUpdate::TimeDisplay(text) => text.clone(),
        OverlayUpdate::Indicator { indicator, text: Some(text) } => {
            format!("{:?}: {}", indicator, text)
        }
        OverlayUpdate::Indicator { indicator, text: None } => format!("{:?}: (隐藏)", indicator),
        OverlayUpdate::Loading(Some(text)) => format!("提示: {}", text),
        OverlayUpdate::Loading(None) => "提示: (隐藏)".to_string(),
        OverlayUpdate::Controls(visible) => format!("控件 {}", shown(*visible)),
        OverlayUpdate::Cursor(visible) => format!("光标 {}", shown(*visible)),
        OverlayUpdate::EndScreen(view) => format!("结束画面 {:?}", view),
    }
}
