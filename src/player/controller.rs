use log::{debug, info, warn};
use std::collections::BTreeMap;

use crate::core::{
    format_time, Command, Generation, Indicator, KioskClock, KioskConfig, MediaEvent,
    MediaEventKind, OverlayUpdate, PlayButton, PlaylistState, PreloadEvent, QualityLabel, Result,
    SourceVariant, Timer, TimerKind, TimerQueue, VolumeTier,
};
use crate::player::preload::PreloadManager;
use crate::player::source::{PlaybackSource, RestartOutcome, SourceAdapter, SourceContext, SourceSignal};
use crate::player::transition::{Chooser, EndScreenSequencer};
use crate::player::RenderSurface;

/// 自动播放被阻止时的提示
const PRESS_PLAY_HINT: &str = "Click play to start";

/// 播放列表控制器 - 整体控制轮播流程
///
/// 拥有播放列表状态、当前播放源、预加载缓存、结束画面序列器和定时器队列。
/// 所有输入（命令、媒体事件、预加载结果、定时器）都在同一个线程里串行处理。
///
/// # 过期回调
/// 每次加载分配新的 `Generation`。带代数的定时器和媒体事件在处理前
/// 与当前代数比较，不一致的直接丢弃，所以快速连续切换后旧的定时器
/// （模拟结束、重试、停留、失败跳过）不会再次修改 `current_index`。
pub struct PlaylistController<S: RenderSurface> {
    state: PlaylistState,
    config: KioskConfig,
    surface: S,
    clock: KioskClock,
    timers: TimerQueue,
    generation: Generation,
    source: Option<PlaybackSource>,
    preload: PreloadManager,
    sequencer: EndScreenSequencer,
    volume: u8,
    play_button: PlayButton,
    halted: bool,
    /// 还没有加载过本地视频
    first_local_pending: bool,
    ui_seq: u64,
    indicator_seq: BTreeMap<Indicator, u64>,
    controls_seq: u64,
    cursor_seq: u64,
}

impl<S: RenderSurface> PlaylistController<S> {
    pub fn new(config: KioskConfig, surface: S, clock: KioskClock, chooser: Box<dyn Chooser>) -> Result<Self> {
        config.validate()?;
        let state = PlaylistState::new(config.playlist.clone(), config.playback.autoplay)?;
        info!("🎮 创建播放列表控制器: {} 个视频", state.len());

        Ok(Self {
            state,
            preload: PreloadManager::new(config.preload.capacity),
            sequencer: EndScreenSequencer::new(config.end_screen.clone(), chooser),
            volume: config.playback.initial_volume,
            config,
            surface,
            clock,
            timers: TimerQueue::new(),
            generation: Generation::default(),
            source: None,
            play_button: PlayButton::ShowsPlay,
            halted: false,
            first_local_pending: true,
            ui_seq: 0,
            indicator_seq: BTreeMap::new(),
            controls_seq: 0,
            cursor_seq: 0,
        })
    }

    // ==================== 访问器 ====================

    pub fn state(&self) -> &PlaylistState {
        &self.state
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn preload(&self) -> &PreloadManager {
        &self.preload
    }

    pub fn sequencer(&self) -> &EndScreenSequencer {
        &self.sequencer
    }

    pub fn active_variant(&self) -> Option<SourceVariant> {
        self.source.as_ref().map(|source| source.variant())
    }

    pub fn play_button(&self) -> PlayButton {
        self.play_button
    }

    /// 失败后停在当前条目（自动播放关闭时）
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    // ==================== 播放列表操作 ====================

    /// 开始轮播：加载第一个条目，稍后做首次预加载
    pub fn start(&mut self) {
        info!("🚀 开始轮播");
        self.surface
            .overlay(OverlayUpdate::VolumeIcon(VolumeTier::from_level(self.volume)));
        self.load_current();
        self.schedule_preload_pass(self.config.playback.initial_preload_delay_ms);
    }

    pub fn advance(&mut self) {
        let index = self.state.advance();
        info!("⏭️  下一个: #{}", index);
        self.load_current();
        self.schedule_preload_pass(self.config.playback.post_load_preload_delay_ms);
    }

    pub fn retreat(&mut self) {
        let index = self.state.retreat();
        info!("⏮️  上一个: #{}", index);
        self.load_current();
        self.schedule_preload_pass(self.config.playback.post_load_preload_delay_ms);
    }

    /// 从头播放当前条目；嵌入播放器没有 seek，只能整体重新加载
    pub fn restart(&mut self) {
        let outcome = self.with_source(|source, cx| source.restart(cx));
        match outcome {
            Some(RestartOutcome::Rewound) => {
                info!("🔁 重新播放: #{}", self.current_index());
                self.clear_failure();
                self.set_play_button(PlayButton::ShowsPause);
            }
            Some(RestartOutcome::ReloadRequired) | None => {
                info!("🔁 重新加载: #{}", self.current_index());
                self.load_current();
            }
        }
    }

    /// 播放/暂停
    ///
    /// 嵌入播放器无法外部暂停，改为：界面看起来已暂停时重新开始，否则跳到下一个
    pub fn toggle_play_pause(&mut self) {
        let Some(source) = self.source.as_ref() else {
            return;
        };

        if source.adapter().supports_pause() {
            let playing = source.adapter().is_playing(&self.surface);
            let result = self.with_source(|source, cx| {
                if playing {
                    source.pause(cx)
                } else {
                    source.play(cx)
                }
            });
            if let Some(Err(e)) = result {
                warn!("⚠️  播放/暂停失败: {}", e);
                return;
            }
            if playing {
                info!("⏸️  暂停");
                self.set_play_button(PlayButton::ShowsPlay);
            } else {
                info!("▶️  播放");
                self.clear_failure();
                self.set_play_button(PlayButton::ShowsPause);
                self.surface.overlay(OverlayUpdate::Loading(None));
            }
        } else if self.play_button == PlayButton::ShowsPlay {
            self.restart();
            self.set_play_button(PlayButton::ShowsPause);
        } else {
            self.advance();
        }
    }

    pub fn set_autoplay(&mut self, enabled: bool) {
        self.state.set_autoplay(enabled);
        info!("🔄 自动播放: {}", if enabled { "开启" } else { "关闭" });
        let text = if enabled { "Auto-Play ON" } else { "Auto-Play OFF" };
        self.show_indicator(
            Indicator::Autoplay,
            text.to_string(),
            Some(self.config.playback.autoplay_indicator_ms),
        );
    }

    pub fn toggle_autoplay(&mut self) {
        self.set_autoplay(!self.state.autoplay_enabled());
    }

    /// 设置音量 0-100，0 强制静音
    pub fn set_volume(&mut self, level: u8) {
        let level = level.min(100);
        self.volume = level;
        self.surface.set_volume(f32::from(level) / 100.0);
        self.surface.set_muted(level == 0);
        self.surface
            .overlay(OverlayUpdate::VolumeIcon(VolumeTier::from_level(level)));
        debug!("🔊 音量: {}", level);
    }

    pub fn toggle_fullscreen(&mut self) {
        match self.surface.toggle_fullscreen() {
            Ok(true) => info!("🖥️  进入全屏"),
            Ok(false) => info!("🖥️  退出全屏"),
            Err(e) => warn!("⚠️  全屏不可用: {}", e),
        }
    }

    /// 手动切换画面适配（只对本地视频有效）
    pub fn cycle_fit(&mut self) {
        let result = self.with_source(|source, cx| source.cycle_fit(&mut *cx.surface));
        let text = match result {
            Some(Ok(fit)) => format!("Video Fit: {}", fit.label()),
            Some(Err(e)) => {
                debug!("📐 {}", e);
                "Video Fit: not available for embedded video".to_string()
            }
            None => return,
        };
        self.show_indicator(Indicator::Status, text, Some(self.config.playback.status_message_ms));
    }

    /// 指针/触摸活动：显示控件和光标，一段时间无活动后隐藏
    pub fn pointer_activity(&mut self) {
        let now = self.clock.now_ms();
        self.surface.overlay(OverlayUpdate::Controls(true));
        self.surface.overlay(OverlayUpdate::Cursor(true));
        self.controls_seq += 1;
        self.cursor_seq += 1;
        self.timers.schedule(
            now,
            self.config.playback.controls_hide_ms,
            None,
            TimerKind::HideControls { seq: self.controls_seq },
        );
        self.timers.schedule(
            now,
            self.config.playback.cursor_hide_ms,
            None,
            TimerKind::HideCursor { seq: self.cursor_seq },
        );
    }

    pub fn handle_command(&mut self, command: Command) {
        debug!("⌨️  命令: {:?}", command);
        if command.is_user_gesture() {
            self.note_user_interaction();
        }
        match command {
            Command::Next => self.advance(),
            Command::Previous => self.retreat(),
            Command::TogglePlayPause => self.toggle_play_pause(),
            Command::Restart => self.restart(),
            Command::SetVolume(level) => self.set_volume(level),
            Command::ToggleFullscreen => self.toggle_fullscreen(),
            Command::ToggleAutoplay => self.toggle_autoplay(),
            Command::CycleFit => self.cycle_fit(),
            Command::PointerActivity => self.pointer_activity(),
        }
    }

    // ==================== 事件处理 ====================

    /// 处理渲染表面回报的媒体事件
    pub fn on_media_event(&mut self, event: MediaEvent) {
        if event.generation != self.generation {
            debug!("🗑️  丢弃过期媒体事件 {:?} ({} != {})", event.kind, event.generation, self.generation);
            return;
        }

        let now = self.clock.now_ms();
        match &event.kind {
            MediaEventKind::InterstitialLoaded => {
                let preload_next =
                    self.sequencer
                        .on_image_loaded(event.generation, &mut self.surface, &mut self.timers, now);
                if preload_next {
                    self.preload_next_in_background();
                }
                return;
            }
            MediaEventKind::InterstitialFailed => {
                self.sequencer
                    .on_image_failed(event.generation, &mut self.surface, &mut self.timers, now);
                return;
            }
            MediaEventKind::Waiting => {
                self.show_indicator(Indicator::Buffer, "Buffering".to_string(), None);
                return;
            }
            MediaEventKind::CanPlay => self.hide_indicator(Indicator::Buffer),
            MediaEventKind::TimeUpdate { position_secs, duration_secs } => {
                self.update_progress(*position_secs, *duration_secs);
                return;
            }
            _ => {}
        }

        if let Some(signal) = self.with_source(|source, cx| source.on_media_event(cx, &event.kind)) {
            self.handle_signal(signal);
        }
    }

    pub fn on_preload_event(&mut self, event: PreloadEvent) {
        self.preload.on_preload_event(event, &mut self.surface);
    }

    /// 触发所有到期的定时器
    pub fn run_due_timers(&mut self) {
        let now = self.clock.now_ms();
        while let Some(timer) = self.timers.pop_due(now) {
            self.dispatch_timer(timer);
        }
    }

    fn dispatch_timer(&mut self, timer: Timer) {
        if let Some(generation) = timer.generation {
            if generation != self.generation {
                debug!("🗑️  丢弃过期定时器 {:?} ({} != {})", timer.kind, generation, self.generation);
                return;
            }
        }
        debug!("⏰ 定时器触发: {:?}", timer.kind);

        match timer.kind {
            TimerKind::PreloadPass => self.preload_pass(),
            TimerKind::FailureSkip => {
                info!("⏭️  播放失败，跳到下一个");
                self.advance();
            }
            TimerKind::EndScreenDwell => {
                if self.sequencer.on_dwell_elapsed(self.generation, &mut self.surface) {
                    self.advance();
                }
            }
            TimerKind::AutoplayRetry { .. } | TimerKind::SimulatedEnd | TimerKind::AvailabilityProbe => {
                if let Some(signal) = self.with_source(|source, cx| source.on_timer(cx, timer.kind)) {
                    self.handle_signal(signal);
                }
            }
            TimerKind::HideIndicator { indicator, seq } => {
                if self.indicator_seq.get(&indicator) == Some(&seq) {
                    self.hide_indicator(indicator);
                }
            }
            TimerKind::HideControls { seq } => {
                if seq == self.controls_seq && !self.local_paused() {
                    self.surface.overlay(OverlayUpdate::Controls(false));
                }
            }
            TimerKind::HideCursor { seq } => {
                if seq == self.cursor_seq && !self.local_paused() {
                    self.surface.overlay(OverlayUpdate::Cursor(false));
                }
            }
        }
    }

    fn handle_signal(&mut self, signal: SourceSignal) {
        match signal {
            SourceSignal::Idle => {}
            SourceSignal::Ready { width, .. } => {
                self.hide_indicator(Indicator::Buffer);
                self.show_indicator(
                    Indicator::Quality,
                    QualityLabel::from_width(width).as_str().to_string(),
                    Some(self.config.playback.quality_indicator_ms),
                );
            }
            SourceSignal::Started => {
                self.hide_indicator(Indicator::Buffer);
                self.surface.overlay(OverlayUpdate::Loading(None));
                self.set_play_button(PlayButton::ShowsPause);
            }
            SourceSignal::Paused => self.set_play_button(PlayButton::ShowsPlay),
            SourceSignal::EndOfPlayback => self.on_end_of_playback(),
            SourceSignal::Failure { reason } => self.on_failure(reason),
            SourceSignal::AutoplayBlocked => {
                self.set_play_button(PlayButton::ShowsPlay);
                self.surface
                    .overlay(OverlayUpdate::Loading(Some(PRESS_PLAY_HINT.to_string())));
            }
        }
    }

    /// 自然播放结束：自动播放时进入结束画面，否则停在最后一帧
    fn on_end_of_playback(&mut self) {
        if self.state.autoplay_enabled() {
            info!("🏁 播放结束: {}", self.state.current().display_name);
            self.sequencer.begin(self.generation, &mut self.surface);
        } else {
            info!("🏁 播放结束（自动播放关闭，停在最后一帧）");
            self.set_play_button(PlayButton::ShowsPlay);
        }
    }

    /// 可恢复的播放失败：自动播放时宽限后跳过，否则停下并显示提示
    fn on_failure(&mut self, reason: String) {
        let entry = self.state.current().display_name.clone();
        if self.state.autoplay_enabled() {
            let grace = self
                .source
                .as_ref()
                .map(|source| source.adapter().failure_grace_ms(&self.config))
                .unwrap_or(self.config.playback.local_failure_grace_ms);
            warn!("⚠️  播放失败: {} ({})，{}ms 后跳过", entry, reason, grace);
            let now = self.clock.now_ms();
            self.timers
                .schedule(now, grace, Some(self.generation), TimerKind::FailureSkip);
        } else {
            warn!("⚠️  播放失败: {} ({})，自动播放关闭，停在当前条目", entry, reason);
            self.halted = true;
            self.set_play_button(PlayButton::ShowsPlay);
            self.show_indicator(Indicator::Failure, format!("Unable to play {}", entry), None);
        }
    }

    // ==================== 内部实现 ====================

    /// 加载当前条目：先拆除旧源，再构造新源
    fn load_current(&mut self) {
        self.generation = self.generation.next();
        self.sequencer.supersede(&mut self.surface);

        if let Some(mut previous) = self.source.take() {
            previous.adapter_mut().teardown(&mut self.surface);
        }
        self.clear_failure();

        let index = self.state.current_index();
        let entry = self.state.current().clone();
        info!("🎞️  加载 #{} {} [{}] ({})", index, entry.display_name, entry.variant, self.generation);

        self.surface.overlay(OverlayUpdate::EntryInfo {
            brand: entry.brand.clone(),
            model: entry.model.clone(),
        });
        self.surface.overlay(OverlayUpdate::Loading(None));

        let warmed = if entry.is_local() { self.preload.take(index) } else { None };
        self.source = Some(PlaybackSource::for_entry(&entry));
        self.with_source(|source, cx| source.load(cx, warmed));
        if entry.is_local() {
            self.first_local_pending = false;
        }

        let button = match entry.variant {
            SourceVariant::Embedded => PlayButton::ShowsPause,
            SourceVariant::LocalFile => PlayButton::ShowsPlay,
        };
        self.set_play_button(button);
        self.surface
            .overlay(OverlayUpdate::VolumeIcon(VolumeTier::from_level(self.volume)));
    }

    fn schedule_preload_pass(&mut self, delay_ms: u64) {
        let now = self.clock.now_ms();
        self.timers
            .schedule(now, delay_ms, Some(self.generation), TimerKind::PreloadPass);
    }

    /// 预加载下一个条目并清理多余缓存
    fn preload_pass(&mut self) {
        let next = self.state.next_index();
        let request = self
            .preload
            .request_preload(next, self.state.entries(), &mut self.surface);
        debug!("📥 预加载 #{}: {:?}", next, request);
        self.preload.evict_excess(&mut self.surface);
    }

    /// 结束画面显示期间在后台预加载下一个条目
    fn preload_next_in_background(&mut self) {
        let next = self.state.next_index();
        let request = self
            .preload
            .request_preload(next, self.state.entries(), &mut self.surface);
        debug!("📥 结束画面期间预加载 #{}: {:?}", next, request);
    }

    fn note_user_interaction(&mut self) {
        if self.state.mark_interacted() {
            info!("👆 首次用户交互，允许有声自动播放");
        }
        self.with_source(|source, cx| source.on_user_interaction(cx));
    }

    fn update_progress(&mut self, position_secs: f64, duration_secs: f64) {
        if duration_secs.is_finite() && duration_secs > 0.0 {
            let percent = (position_secs / duration_secs * 100.0).clamp(0.0, 100.0);
            self.surface.overlay(OverlayUpdate::Progress { percent });
        }
        self.surface.overlay(OverlayUpdate::TimeDisplay(format!(
            "{} / {}",
            format_time(position_secs),
            format_time(duration_secs)
        )));
    }

    fn local_paused(&self) -> bool {
        self.active_variant() == Some(SourceVariant::LocalFile) && self.surface.is_paused()
    }

    fn set_play_button(&mut self, button: PlayButton) {
        self.play_button = button;
        self.surface.overlay(OverlayUpdate::PlayButton(button));
    }

    fn clear_failure(&mut self) {
        if self.halted {
            self.halted = false;
            self.hide_indicator(Indicator::Failure);
        }
    }

    fn show_indicator(&mut self, indicator: Indicator, text: String, hide_after_ms: Option<u64>) {
        self.ui_seq += 1;
        self.indicator_seq.insert(indicator, self.ui_seq);
        self.surface.overlay(OverlayUpdate::Indicator { indicator, text: Some(text) });
        if let Some(delay) = hide_after_ms {
            let now = self.clock.now_ms();
            self.timers.schedule(
                now,
                delay,
                None,
                TimerKind::HideIndicator { indicator, seq: self.ui_seq },
            );
        }
    }

    fn hide_indicator(&mut self, indicator: Indicator) {
        self.surface
            .overlay(OverlayUpdate::Indicator { indicator, text: None });
    }

    /// 借出当前播放源和它的上下文
    fn with_source<R>(
        &mut self,
        f: impl FnOnce(&mut dyn SourceAdapter, &mut SourceContext<'_>) -> R,
    ) -> Option<R> {
        let now_ms = self.clock.now_ms();
        let source = self.source.as_mut()?;
        let mut cx = SourceContext {
            surface: &mut self.surface,
            timers: &mut self.timers,
            config: &self.config,
            now_ms,
            generation: self.generation,
            volume: self.volume,
            autoplay: self.state.autoplay_enabled(),
            has_user_interacted: self.state.has_user_interacted(),
            is_first_local_load: self.first_local_pending,
        };
        Some(f(source.adapter_mut(), &mut cx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EndScreenView, PlaylistEntry, PreloadHandle, PreloadOutcome};
    use crate::player::testing::{FixedChooser, RecordingSurface, SurfaceCall};

    fn controller(entries: Vec<PlaylistEntry>, autoplay: bool) -> (PlaylistController<RecordingSurface>, KioskClock) {
        let mut config = KioskConfig::default();
        config.playlist = entries;
        config.playback.autoplay = autoplay;
        let clock = KioskClock::manual();
        let mut controller = PlaylistController::new(
            config,
            RecordingSurface::new(),
            clock.clone(),
            Box::new(FixedChooser::new(vec![0])),
        )
        .unwrap();
        controller.start();
        (controller, clock)
    }

    fn tick(controller: &mut PlaylistController<RecordingSurface>, clock: &KioskClock, ms: u64) {
        clock.advance(ms);
        controller.run_due_timers();
    }

    fn event(controller: &mut PlaylistController<RecordingSurface>, kind: MediaEventKind) {
        let generation = controller.generation();
        controller.on_media_event(MediaEvent::new(generation, kind));
    }

    fn mixed() -> Vec<PlaylistEntry> {
        vec![
            PlaylistEntry::local("video/a.mp4", "Apple", "A"),
            PlaylistEntry::embedded("yt-b", "OPPO", "B"),
            PlaylistEntry::local("video/c.mp4", "TECNO", "C"),
        ]
    }

    fn locals(n: usize) -> Vec<PlaylistEntry> {
        (0..n)
            .map(|i| PlaylistEntry::local(&format!("video/{}.mp4", i), "Demo", &i.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_playlist_is_fatal() {
        let mut config = KioskConfig::default();
        config.playlist.clear();
        let result = PlaylistController::new(
            config,
            RecordingSurface::new(),
            KioskClock::manual(),
            Box::new(FixedChooser::new(vec![0])),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_advance_n_times_returns_to_start() {
        for n in 1..=4 {
            let (mut c, _clock) = controller(locals(n), true);
            for _ in 0..n {
                c.advance();
            }
            assert_eq!(c.current_index(), 0);
        }
    }

    #[test]
    fn test_retreat_then_advance_restores_index() {
        let (mut c, _clock) = controller(mixed(), true);
        c.retreat();
        assert_eq!(c.current_index(), 2);
        c.advance();
        assert_eq!(c.current_index(), 0);
    }

    #[test]
    fn test_each_load_bumps_generation_and_tears_down_previous() {
        let (mut c, _clock) = controller(mixed(), true);
        let first = c.generation();
        c.advance();
        assert_eq!(c.generation(), first.next());
        assert_eq!(c.active_variant(), Some(SourceVariant::Embedded));
        assert_eq!(c.surface().count(|call| *call == SurfaceCall::Clear), 1);
        assert!(c.surface().overlays().any(|u| *u
            == OverlayUpdate::EntryInfo { brand: "OPPO".to_string(), model: "B".to_string() }));
    }

    #[test]
    fn test_toggle_play_pause_local() {
        let (mut c, _clock) = controller(locals(2), true);
        c.surface_mut().paused = false;
        c.toggle_play_pause();
        assert!(c.surface().is_paused());
        assert_eq!(c.play_button(), PlayButton::ShowsPlay);

        c.toggle_play_pause();
        assert!(!c.surface().is_paused());
        assert_eq!(c.play_button(), PlayButton::ShowsPause);
        assert_eq!(c.current_index(), 0);
    }

    #[test]
    fn test_toggle_play_pause_embedded_never_pauses() {
        let entries = vec![
            PlaylistEntry::embedded("yt-0", "A", "0"),
            PlaylistEntry::embedded("yt-1", "A", "1"),
        ];
        let (mut c, _clock) = controller(entries, true);
        assert_eq!(c.play_button(), PlayButton::ShowsPause);

        c.toggle_play_pause();
        assert_eq!(c.current_index(), 1);
        assert_eq!(c.surface().count(|call| *call == SurfaceCall::Pause), 0);
        assert_eq!(c.play_button(), PlayButton::ShowsPause);
    }

    #[test]
    fn test_toggle_on_ended_embedded_restarts() {
        let entries = vec![
            PlaylistEntry::embedded("yt-0", "A", "0"),
            PlaylistEntry::embedded("yt-1", "A", "1"),
        ];
        let (mut c, clock) = controller(entries, false);
        tick(&mut c, &clock, 150_000);
        assert_eq!(c.play_button(), PlayButton::ShowsPlay);
        assert_eq!(c.current_index(), 0);

        let before = c.generation();
        c.toggle_play_pause();
        assert_eq!(c.current_index(), 0);
        assert_eq!(c.generation(), before.next());
        assert_eq!(c.play_button(), PlayButton::ShowsPause);
        assert_eq!(c.surface().count(|call| *call == SurfaceCall::Pause), 0);
    }

    #[test]
    fn test_restart_local_rewinds_without_reload() {
        let (mut c, _clock) = controller(locals(2), true);
        let generation = c.generation();
        c.restart();
        assert_eq!(c.generation(), generation);
        assert!(c.surface().calls.ends_with(&[
            SurfaceCall::Seek(0.0),
            SurfaceCall::Play,
            SurfaceCall::Overlay(OverlayUpdate::PlayButton(PlayButton::ShowsPause)),
        ]));
    }

    #[test]
    fn test_natural_end_without_autoplay_stays_put() {
        let (mut c, clock) = controller(locals(2), false);
        event(&mut c, MediaEventKind::Ended);
        assert!(c.sequencer().is_idle());
        tick(&mut c, &clock, 10_000);
        assert_eq!(c.current_index(), 0);
        assert_eq!(c.play_button(), PlayButton::ShowsPlay);
    }

    #[test]
    fn test_failure_without_autoplay_halts_with_indicator() {
        let (mut c, clock) = controller(locals(2), false);
        event(&mut c, MediaEventKind::Failed { reason: "decode error".to_string() });
        tick(&mut c, &clock, 10_000);
        assert_eq!(c.current_index(), 0);
        assert!(c.is_halted());
        assert_eq!(
            c.surface().indicator_text(Indicator::Failure),
            Some("Unable to play Demo 0".to_string())
        );

        c.advance();
        assert!(!c.is_halted());
        assert_eq!(c.surface().indicator_text(Indicator::Failure), None);
    }

    #[test]
    fn test_local_failure_skips_after_grace() {
        let (mut c, clock) = controller(locals(3), true);
        event(&mut c, MediaEventKind::Failed { reason: "file not found".to_string() });
        tick(&mut c, &clock, 999);
        assert_eq!(c.current_index(), 0);
        tick(&mut c, &clock, 1);
        assert_eq!(c.current_index(), 1);
        assert!(c.sequencer().is_idle());
    }

    #[test]
    fn test_end_to_end_mixed_playlist() {
        let (mut c, clock) = controller(mixed(), true);
        assert_eq!(c.current_index(), 0);
        let gen_a = c.generation();

        // A 自然结束 -> 结束画面
        event(&mut c, MediaEventKind::Ended);
        assert!(c
            .surface()
            .calls
            .contains(&SurfaceCall::LoadInterstitial(gen_a, "END SCREEN/end1.jpg".to_string())));
        event(&mut c, MediaEventKind::InterstitialLoaded);
        assert!(matches!(c.surface().last_end_screen(), Some(EndScreenView::Image { .. })));

        tick(&mut c, &clock, 3999);
        assert_eq!(c.current_index(), 0);
        tick(&mut c, &clock, 1);
        assert_eq!(c.current_index(), 1);
        assert_eq!(c.surface().last_end_screen(), Some(EndScreenView::Hidden));
        assert_eq!(c.active_variant(), Some(SourceVariant::Embedded));
        let gen_b = c.generation();
        assert!(c
            .surface()
            .calls
            .iter()
            .any(|call| matches!(call, SurfaceCall::ShowEmbedded(g, url) if *g == gen_b && url.contains("yt-b"))));

        // B 在检测窗口内被判定不可用 -> 宽限后直接跳到 C，不经过结束画面
        c.surface_mut().embedded_title = Some("Video unavailable".to_string());
        tick(&mut c, &clock, 5000);
        assert_eq!(c.current_index(), 1);
        tick(&mut c, &clock, 2000);
        assert_eq!(c.current_index(), 2);
        assert_eq!(c.active_variant(), Some(SourceVariant::LocalFile));
        assert!(!c
            .surface()
            .calls
            .iter()
            .any(|call| matches!(call, SurfaceCall::LoadInterstitial(g, _) if *g == gen_b)));

        // B 的模拟结束定时器过期后不再生效
        tick(&mut c, &clock, 150_000);
        assert_eq!(c.current_index(), 2);
    }

    #[test]
    fn test_manual_next_supersedes_end_screen_dwell() {
        let (mut c, clock) = controller(mixed(), true);
        event(&mut c, MediaEventKind::Ended);
        event(&mut c, MediaEventKind::InterstitialLoaded);

        c.handle_command(Command::Next);
        assert_eq!(c.current_index(), 1);
        assert!(c.sequencer().is_idle());
        assert_eq!(c.surface().last_end_screen(), Some(EndScreenView::Hidden));

        tick(&mut c, &clock, 4000);
        assert_eq!(c.current_index(), 1);
    }

    #[test]
    fn test_manual_previous_supersedes_simulated_end() {
        let (mut c, clock) = controller(mixed(), true);
        c.advance();
        assert_eq!(c.active_variant(), Some(SourceVariant::Embedded));

        c.handle_command(Command::Previous);
        assert_eq!(c.current_index(), 0);
        tick(&mut c, &clock, 150_000);
        assert_eq!(c.current_index(), 0);
        assert!(c.sequencer().is_idle());
    }

    #[test]
    fn test_stale_media_events_are_dropped() {
        let (mut c, clock) = controller(locals(3), true);
        let stale = c.generation();
        c.advance();
        c.on_media_event(MediaEvent::new(stale, MediaEventKind::Ended));
        c.on_media_event(MediaEvent::new(stale, MediaEventKind::Failed { reason: "x".to_string() }));
        tick(&mut c, &clock, 10_000);
        assert_eq!(c.current_index(), 1);
        assert!(c.sequencer().is_idle());
    }

    #[test]
    fn test_preload_pass_warms_next_local_and_load_uses_it() {
        let (mut c, clock) = controller(locals(3), true);
        tick(&mut c, &clock, 3000);
        let handle = c
            .surface()
            .calls
            .iter()
            .find_map(|call| match call {
                SurfaceCall::BeginPreload(handle, path) if path == "video/1.mp4" => Some(*handle),
                _ => None,
            })
            .expect("preload of next entry");
        c.on_preload_event(PreloadEvent { handle, outcome: PreloadOutcome::MetadataReady });
        assert!(c.preload().contains(1));

        c.advance();
        assert!(c
            .surface()
            .calls
            .contains(&SurfaceCall::ShowLocal(c.generation(), "video/1.mp4".to_string(), Some(handle))));
        assert!(!c.preload().contains(1));
    }

    #[test]
    fn test_preload_cache_stays_bounded_across_advances() {
        let (mut c, clock) = controller(locals(5), true);
        for _ in 0..8 {
            tick(&mut c, &clock, 3000);
            let pending: Vec<PreloadHandle> = c
                .surface()
                .calls
                .iter()
                .filter_map(|call| match call {
                    SurfaceCall::BeginPreload(handle, _) => Some(*handle),
                    _ => None,
                })
                .collect();
            if let Some(handle) = pending.last() {
                c.on_preload_event(PreloadEvent { handle: *handle, outcome: PreloadOutcome::MetadataReady });
            }
            assert!(c.preload().len() <= 2);
            c.advance();
        }
    }

    #[test]
    fn test_volume_zero_forces_mute_and_icon_tiers() {
        let (mut c, _clock) = controller(locals(2), true);
        c.set_volume(70);
        c.set_volume(0);
        assert!(c.surface().calls.ends_with(&[
            SurfaceCall::SetVolume(0.0),
            SurfaceCall::SetMuted(true),
            SurfaceCall::Overlay(OverlayUpdate::VolumeIcon(VolumeTier::Muted)),
        ]));

        for (level, tier) in [
            (29, VolumeTier::Low),
            (30, VolumeTier::Medium),
            (69, VolumeTier::Medium),
            (70, VolumeTier::High),
            (100, VolumeTier::High),
        ] {
            c.set_volume(level);
            assert!(c.surface().calls.ends_with(&[
                SurfaceCall::SetMuted(false),
                SurfaceCall::Overlay(OverlayUpdate::VolumeIcon(tier)),
            ]));
        }
    }

    #[test]
    fn test_autoplay_toggle_shows_transient_indicator() {
        let (mut c, clock) = controller(locals(2), true);
        c.handle_command(Command::ToggleAutoplay);
        assert!(!c.state().autoplay_enabled());
        assert_eq!(c.surface().indicator_text(Indicator::Autoplay), Some("Auto-Play OFF".to_string()));
        tick(&mut c, &clock, 2000);
        assert_eq!(c.surface().indicator_text(Indicator::Autoplay), None);
    }

    #[test]
    fn test_blocked_autoplay_shows_press_play_affordance() {
        let (mut c, _clock) = controller(locals(2), true);
        // 首个条目，用户尚未交互：只尝试一次
        event(&mut c, MediaEventKind::PlayRejected);
        assert_eq!(c.play_button(), PlayButton::ShowsPlay);
        assert!(c
            .surface()
            .overlays()
            .any(|u| *u == OverlayUpdate::Loading(Some(PRESS_PLAY_HINT.to_string()))));
        assert!(!c.is_halted());
    }

    #[test]
    fn test_unattended_wrap_to_first_entry_keeps_muted_retry_chain() {
        let (mut c, clock) = controller(locals(2), true);
        c.advance();
        c.advance();
        assert_eq!(c.current_index(), 0);
        assert!(!c.state().has_user_interacted());

        let generation = c.generation();
        let load = c
            .surface()
            .calls
            .iter()
            .position(|call| matches!(call, SurfaceCall::ShowLocal(g, _, _) if *g == generation))
            .unwrap();
        let after_load = &c.surface().calls[load..];
        let muted = after_load.iter().position(|call| *call == SurfaceCall::SetMuted(true)).unwrap();
        let play = after_load.iter().position(|call| *call == SurfaceCall::Play).unwrap();
        assert!(muted < play);

        event(&mut c, MediaEventKind::PlayRejected);
        let plays_before = c.surface().count(|call| *call == SurfaceCall::Play);
        tick(&mut c, &clock, 100);
        assert_eq!(c.surface().count(|call| *call == SurfaceCall::Play), plays_before + 1);
        assert!(!c
            .surface()
            .overlays()
            .any(|u| *u == OverlayUpdate::Loading(Some(PRESS_PLAY_HINT.to_string()))));
    }

    #[test]
    fn test_first_local_load_policy_follows_leading_embedded_entry() {
        let entries = vec![
            PlaylistEntry::embedded("yt-0", "A", "0"),
            PlaylistEntry::local("video/1.mp4", "A", "1"),
        ];
        let (mut c, _clock) = controller(entries, true);
        c.advance();
        // 第一次加载本地视频：只尝试一次有声播放
        assert!(!c.surface().calls.contains(&SurfaceCall::SetMuted(true)));
        event(&mut c, MediaEventKind::PlayRejected);
        assert_eq!(c.surface().last_play_button(), Some(PlayButton::ShowsPlay));
        assert!(c
            .surface()
            .overlays()
            .any(|u| *u == OverlayUpdate::Loading(Some(PRESS_PLAY_HINT.to_string()))));
    }

    #[test]
    fn test_first_interaction_unmutes_autoplaying_video() {
        let (mut c, _clock) = controller(locals(3), true);
        c.advance();
        event(&mut c, MediaEventKind::PlaybackStarted);
        assert!(!c.state().has_user_interacted());

        c.handle_command(Command::SetVolume(50));
        assert!(c.state().has_user_interacted());
        assert!(c.surface().calls.contains(&SurfaceCall::SetVolume(0.5)));
        assert_eq!(c.surface().calls.last(), Some(&SurfaceCall::Overlay(OverlayUpdate::VolumeIcon(VolumeTier::Medium))));
    }

    #[test]
    fn test_metadata_shows_quality_and_cycle_fit_status() {
        let (mut c, _clock) = controller(locals(2), true);
        event(&mut c, MediaEventKind::MetadataReady { width: 1280, height: 720 });
        assert_eq!(c.surface().indicator_text(Indicator::Quality), Some("HD Quality".to_string()));

        c.handle_command(Command::CycleFit);
        assert_eq!(
            c.surface().indicator_text(Indicator::Status),
            Some("Video Fit: Fill (Stretch)".to_string())
        );
    }

    #[test]
    fn test_time_update_drives_progress() {
        let (mut c, _clock) = controller(locals(2), true);
        event(&mut c, MediaEventKind::TimeUpdate { position_secs: 30.0, duration_secs: 120.0 });
        assert!(c.surface().overlays().any(|u| *u == OverlayUpdate::Progress { percent: 25.0 }));
        assert!(c
            .surface()
            .overlays()
            .any(|u| *u == OverlayUpdate::TimeDisplay("00:30 / 02:00".to_string())));
    }

    #[test]
    fn test_pointer_activity_hides_controls_unless_paused() {
        let (mut c, clock) = controller(locals(2), true);
        c.surface_mut().paused = false;
        c.handle_command(Command::PointerActivity);
        assert!(!c.state().has_user_interacted());
        tick(&mut c, &clock, 4000);
        assert!(c.surface().calls.contains(&SurfaceCall::Overlay(OverlayUpdate::Controls(false))));
        assert!(c.surface().calls.contains(&SurfaceCall::Overlay(OverlayUpdate::Cursor(false))));
    }

    #[test]
    fn test_fullscreen_refusal_is_not_fatal() {
        let (mut c, _clock) = controller(locals(2), true);
        c.surface_mut().fullscreen_supported = false;
        c.handle_command(Command::ToggleFullscreen);
        assert_eq!(c.current_index(), 0);
    }
}
