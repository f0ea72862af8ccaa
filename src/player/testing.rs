// 测试用的渲染表面桩和确定性选择器

use crate::core::{
    EndScreenView, FitMode, Generation, Indicator, KioskError, OverlayUpdate, PlayButton,
    PreloadHandle, Result,
};
use crate::player::transition::Chooser;
use crate::player::RenderSurface;

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    ShowLocal(Generation, String, Option<PreloadHandle>),
    ShowEmbedded(Generation, String),
    Clear,
    Play,
    Pause,
    Seek(f64),
    SetMuted(bool),
    SetVolume(f32),
    ApplyFit(FitMode),
    ToggleFullscreen,
    BeginPreload(PreloadHandle, String),
    ReleasePreload(PreloadHandle),
    LoadInterstitial(Generation, String),
    Overlay(OverlayUpdate),
}

/// 记录所有调用的渲染表面
pub struct RecordingSurface {
    pub calls: Vec<SurfaceCall>,
    pub paused: bool,
    pub viewport: (u32, u32),
    pub dimensions: Option<(u32, u32)>,
    pub embedded_title: Option<String>,
    pub fit: Option<FitMode>,
    pub fullscreen: bool,
    pub fullscreen_supported: bool,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            paused: true,
            viewport: (1920, 1080),
            dimensions: None,
            embedded_title: None,
            fit: None,
            fullscreen: false,
            fullscreen_supported: true,
        }
    }

    pub fn overlays(&self) -> impl Iterator<Item = &OverlayUpdate> {
        self.calls.iter().filter_map(|call| match call {
            SurfaceCall::Overlay(update) => Some(update),
            _ => None,
        })
    }

    pub fn last_end_screen(&self) -> Option<EndScreenView> {
        self.overlays()
            .filter_map(|update| match update {
                OverlayUpdate::EndScreen(view) => Some(view.clone()),
                _ => None,
            })
            .last()
    }

    pub fn last_play_button(&self) -> Option<PlayButton> {
        self.overlays()
            .filter_map(|update| match update {
                OverlayUpdate::PlayButton(button) => Some(*button),
                _ => None,
            })
            .last()
    }

    /// 某个提示最后一次的文本（None 表示已隐藏或从未出现）
    pub fn indicator_text(&self, indicator: Indicator) -> Option<String> {
        self.overlays()
            .filter_map(|update| match update {
                OverlayUpdate::Indicator { indicator: i, text } if *i == indicator => Some(text.clone()),
                _ => None,
            })
            .last()
            .flatten()
    }

    pub fn count(&self, predicate: impl Fn(&SurfaceCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }
}

impl RenderSurface for RecordingSurface {
    fn show_local(&mut self, generation: Generation, path: &str, warmed: Option<PreloadHandle>) {
        self.paused = true;
        self.calls
            .push(SurfaceCall::ShowLocal(generation, path.to_string(), warmed));
    }

    fn show_embedded(&mut self, generation: Generation, url: &str) {
        self.calls.push(SurfaceCall::ShowEmbedded(generation, url.to_string()));
    }

    fn clear(&mut self) {
        self.calls.push(SurfaceCall::Clear);
    }

    fn play(&mut self) {
        self.paused = false;
        self.calls.push(SurfaceCall::Play);
    }

    fn pause(&mut self) {
        self.paused = true;
        self.calls.push(SurfaceCall::Pause);
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn seek(&mut self, position_secs: f64) {
        self.calls.push(SurfaceCall::Seek(position_secs));
    }

    fn set_muted(&mut self, muted: bool) {
        self.calls.push(SurfaceCall::SetMuted(muted));
    }

    fn set_volume(&mut self, volume: f32) {
        self.calls.push(SurfaceCall::SetVolume(volume));
    }

    fn intrinsic_dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    fn apply_fit(&mut self, fit: FitMode) {
        self.fit = Some(fit);
        self.calls.push(SurfaceCall::ApplyFit(fit));
    }

    fn toggle_fullscreen(&mut self) -> Result<bool> {
        self.calls.push(SurfaceCall::ToggleFullscreen);
        if !self.fullscreen_supported {
            return Err(KioskError::Surface("fullscreen not supported".to_string()));
        }
        self.fullscreen = !self.fullscreen;
        Ok(self.fullscreen)
    }

    fn embedded_document_title(&self) -> Option<String> {
        self.embedded_title.clone()
    }

    fn begin_preload(&mut self, handle: PreloadHandle, path: &str) {
        self.calls.push(SurfaceCall::BeginPreload(handle, path.to_string()));
    }

    fn release_preload(&mut self, handle: PreloadHandle) {
        self.calls.push(SurfaceCall::ReleasePreload(handle));
    }

    fn load_interstitial_image(&mut self, generation: Generation, src: &str) {
        self.calls
            .push(SurfaceCall::LoadInterstitial(generation, src.to_string()));
    }

    fn overlay(&mut self, update: OverlayUpdate) {
        self.calls.push(SurfaceCall::Overlay(update));
    }
}

/// 按给定顺序循环返回下标
pub struct FixedChooser {
    picks: Vec<usize>,
    next: usize,
}

impl FixedChooser {
    pub fn new(picks: Vec<usize>) -> Self {
        Self { picks, next: 0 }
    }
}

impl Chooser for FixedChooser {
    fn choose(&mut self, len: usize) -> usize {
        if self.picks.is_empty() || len == 0 {
            return 0;
        }
        let pick = self.picks[self.next % self.picks.len()];
        self.next += 1;
        pick % len
    }
}
