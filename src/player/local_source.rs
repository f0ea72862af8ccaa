use log::{debug, info, warn};

use crate::core::{
    FitMode, KioskConfig, MediaEventKind, PreloadHandle, Result, SourceVariant, TimerKind,
};
use crate::player::fit::{auto_fit, next_manual_fit};
use crate::player::source::{RestartOutcome, SourceAdapter, SourceContext, SourceSignal};
use crate::player::RenderSurface;

/// 本地视频源 - 完整的播放控制
///
/// # 自动播放策略
/// 浏览器不允许未经用户交互的有声自动播放，所以：
/// - 先静音播放，确认开始后（且用户已交互）再恢复用户音量
/// - 被拒绝时按递增延迟重试，最多 `autoplay_max_attempts` 次，之后静默放弃，
///   只留下“点击播放”的提示
/// - 第一次加载的本地视频在用户交互之前只尝试一次有声播放
/// - 可播放时的额外静音播放每次加载只推一次，不计入重试次数
pub struct LocalFileSource {
    path: String,
    attempts: u32,
    retry_pending: bool,
    allow_retry: bool,
    muted_for_autoplay: bool,
    started: bool,
    gave_up: bool,
    nudged: bool,
    dimensions: Option<(u32, u32)>,
    fit: FitMode,
}

impl LocalFileSource {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            attempts: 0,
            retry_pending: false,
            allow_retry: true,
            muted_for_autoplay: false,
            started: false,
            gave_up: false,
            nudged: false,
            dimensions: None,
            fit: FitMode::COVER,
        }
    }

    pub fn is_muted_for_autoplay(&self) -> bool {
        self.muted_for_autoplay
    }

    pub fn autoplay_attempts(&self) -> u32 {
        self.attempts
    }

    /// 静音发起一次自动播放（计入重试次数）
    fn attempt_muted_play(&mut self, cx: &mut SourceContext<'_>) {
        self.attempts += 1;
        self.muted_play(cx);
        debug!("▶️  静音自动播放尝试 {}: {}", self.attempts, self.path);
    }

    fn muted_play(&mut self, cx: &mut SourceContext<'_>) {
        self.muted_for_autoplay = true;
        cx.surface.set_muted(true);
        cx.surface.play();
    }

    /// 恢复用户设置的音量
    fn restore_volume(&mut self, cx: &mut SourceContext<'_>) {
        self.muted_for_autoplay = false;
        cx.surface.set_volume(f32::from(cx.volume) / 100.0);
        cx.surface.set_muted(cx.volume == 0);
        debug!("🔊 恢复音量: {}", cx.volume);
    }

    fn on_play_rejected(&mut self, cx: &mut SourceContext<'_>) -> SourceSignal {
        if self.retry_pending || self.started {
            return SourceSignal::Idle;
        }
        let max_attempts = cx.config.playback.autoplay_max_attempts;
        if self.allow_retry && self.attempts < max_attempts {
            let delay = cx.config.playback.autoplay_retry_base_ms * u64::from(self.attempts.max(1));
            self.retry_pending = true;
            cx.schedule(delay, TimerKind::AutoplayRetry { attempt: self.attempts + 1 });
            debug!("⏳ 自动播放被拒绝，{}ms 后重试 ({}/{})", delay, self.attempts, max_attempts);
            return SourceSignal::Idle;
        }
        if !self.gave_up {
            self.gave_up = true;
            info!("⏸️  自动播放被阻止，等待用户点击播放: {}", self.path);
            return SourceSignal::AutoplayBlocked;
        }
        SourceSignal::Idle
    }
}

impl SourceAdapter for LocalFileSource {
    fn variant(&self) -> SourceVariant {
        SourceVariant::LocalFile
    }

    fn load(&mut self, cx: &mut SourceContext<'_>, warmed: Option<PreloadHandle>) {
        info!("📁 加载本地视频: {} ({})", self.path, cx.generation);
        if warmed.is_some() {
            info!("🔥 使用已预加载的资源: {}", self.path);
        }
        cx.surface.show_local(cx.generation, &self.path, warmed);
        cx.surface.set_volume(f32::from(cx.volume) / 100.0);
        cx.surface.set_muted(cx.volume == 0);

        if !cx.autoplay {
            return;
        }

        if cx.is_first_local_load && !cx.has_user_interacted {
            // 首个视频：只尝试一次，被拒绝就显示提示
            self.allow_retry = false;
            self.attempts = 1;
            cx.surface.play();
        } else {
            self.attempt_muted_play(cx);
        }
    }

    fn play(&mut self, cx: &mut SourceContext<'_>) -> Result<()> {
        cx.surface.play();
        Ok(())
    }

    fn pause(&mut self, cx: &mut SourceContext<'_>) -> Result<()> {
        cx.surface.pause();
        Ok(())
    }

    fn restart(&mut self, cx: &mut SourceContext<'_>) -> RestartOutcome {
        cx.surface.seek(0.0);
        cx.surface.play();
        RestartOutcome::Rewound
    }

    fn teardown(&mut self, surface: &mut dyn RenderSurface) {
        debug!("🧹 拆除本地视频: {}", self.path);
        surface.pause();
        surface.clear();
    }

    fn supports_pause(&self) -> bool {
        true
    }

    fn is_playing(&self, surface: &dyn RenderSurface) -> bool {
        !surface.is_paused()
    }

    fn intrinsic_dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    fn cycle_fit(&mut self, surface: &mut dyn RenderSurface) -> Result<FitMode> {
        self.fit = next_manual_fit(self.fit);
        surface.apply_fit(self.fit);
        Ok(self.fit)
    }

    fn failure_grace_ms(&self, config: &KioskConfig) -> u64 {
        config.playback.local_failure_grace_ms
    }

    fn on_media_event(&mut self, cx: &mut SourceContext<'_>, kind: &MediaEventKind) -> SourceSignal {
        match kind {
            MediaEventKind::MetadataReady { width, height } => {
                self.dimensions = Some((*width, *height));
                let viewport = cx.surface.viewport();
                self.fit = auto_fit(
                    (*width, *height),
                    viewport,
                    cx.config.playback.fit_aspect_threshold,
                );
                cx.surface.apply_fit(self.fit);
                info!(
                    "📐 视频: {}x{}, 屏幕: {}x{}, 适配: {}",
                    width,
                    height,
                    viewport.0,
                    viewport.1,
                    self.fit.label()
                );
                SourceSignal::Ready { width: *width, height: *height }
            }
            MediaEventKind::CanPlay => {
                // 用户交互过之后，可播放时立即再推一次静音播放
                let idle = !self.started && !self.retry_pending && !self.nudged;
                if cx.autoplay && cx.has_user_interacted && idle {
                    self.nudged = true;
                    self.muted_play(cx);
                    debug!("▶️  可播放，追加一次静音播放: {}", self.path);
                }
                SourceSignal::Idle
            }
            MediaEventKind::PlaybackStarted => {
                self.started = true;
                self.gave_up = false;
                if self.muted_for_autoplay && cx.has_user_interacted {
                    self.restore_volume(cx);
                }
                SourceSignal::Started
            }
            MediaEventKind::PlayRejected => self.on_play_rejected(cx),
            MediaEventKind::Paused => {
                self.started = false;
                SourceSignal::Paused
            }
            MediaEventKind::Ended => SourceSignal::EndOfPlayback,
            MediaEventKind::Failed { reason } => {
                warn!("❌ 本地视频播放失败: {} ({})", self.path, reason);
                SourceSignal::Failure { reason: reason.clone() }
            }
            _ => SourceSignal::Idle,
        }
    }

    fn on_timer(&mut self, cx: &mut SourceContext<'_>, kind: TimerKind) -> SourceSignal {
        if let TimerKind::AutoplayRetry { attempt } = kind {
            self.retry_pending = false;
            if self.started {
                return SourceSignal::Idle;
            }
            self.attempts = attempt - 1;
            self.attempt_muted_play(cx);
        }
        SourceSignal::Idle
    }

    fn on_user_interaction(&mut self, cx: &mut SourceContext<'_>) {
        if self.muted_for_autoplay && self.started {
            self.restore_volume(cx);
        }
    }
}
