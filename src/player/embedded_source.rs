use log::{debug, info, warn};

use crate::core::{
    EmbedConfig, FitMode, KioskConfig, KioskError, MediaEventKind, PreloadHandle, Result,
    SourceVariant, TimerKind,
};
use crate::player::source::{RestartOutcome, SourceAdapter, SourceContext, SourceSignal};
use crate::player::RenderSurface;

/// 嵌入播放器参数：自动播放，关闭控件、相关推荐、注释、字幕、全屏按钮和键盘快捷键
const EMBED_PARAMS: &str = "autoplay=1&controls=0&mute=0&rel=0&showinfo=0&modestbranding=1\
&iv_load_policy=3&cc_load_policy=0&fs=0&disablekb=1&playsinline=1";

/// 嵌入播放器源 - 无法在外部暂停或 seek
///
/// # 已知限制
/// - 没有可靠的 "ended" 信号，结束由固定时长定时器模拟，不代表真实时长
/// - 可用性检测依赖读取嵌入文档标题：跨域托管时可能读不到（漏报），
///   也可能加载成功却静默卡住（同样漏报）。只作为尽力而为的手段
pub struct EmbeddedSource {
    source_id: String,
}

impl EmbeddedSource {
    pub fn new(source_id: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
        }
    }

    fn unsupported(operation: &'static str) -> KioskError {
        KioskError::Unsupported {
            operation,
            variant: SourceVariant::Embedded,
        }
    }

    /// 检查嵌入文档标题是否表明视频不可用
    fn probe_availability(&self, cx: &mut SourceContext<'_>) -> SourceSignal {
        let Some(title) = cx.surface.embedded_document_title() else {
            debug!("🔍 无法读取嵌入文档标题，视为可用: {}", self.source_id);
            return SourceSignal::Idle;
        };
        if title_indicates_unavailable(&title, &cx.config.embed.unavailable_markers) {
            warn!("🚫 嵌入视频不可用: {} (标题: {})", self.source_id, title);
            return SourceSignal::Failure {
                reason: format!("embedded video unavailable: {}", title),
            };
        }
        SourceSignal::Idle
    }
}

/// 构造嵌入播放器地址
pub fn embed_url(config: &EmbedConfig, source_id: &str) -> String {
    let base = config.player_base_url.trim_end_matches('/');
    match &config.widget_referrer {
        Some(referrer) => format!("{}/{}?{}&widget_referrer={}", base, source_id, EMBED_PARAMS, referrer),
        None => format!("{}/{}?{}", base, source_id, EMBED_PARAMS),
    }
}

pub fn title_indicates_unavailable(title: &str, markers: &[String]) -> bool {
    let title = title.to_lowercase();
    markers
        .iter()
        .any(|marker| title.contains(&marker.to_lowercase()))
}

impl SourceAdapter for EmbeddedSource {
    fn variant(&self) -> SourceVariant {
        SourceVariant::Embedded
    }

    fn load(&mut self, cx: &mut SourceContext<'_>, _warmed: Option<PreloadHandle>) {
        let url = embed_url(&cx.config.embed, &self.source_id);
        info!("🌐 加载嵌入视频: {} ({})", self.source_id, cx.generation);
        cx.surface.show_embedded(cx.generation, &url);

        let duration = cx.config.embed.simulated_duration_ms;
        let probe_delay = cx.config.embed.availability_probe_delay_ms;
        cx.schedule(duration, TimerKind::SimulatedEnd);
        cx.schedule(probe_delay, TimerKind::AvailabilityProbe);
        debug!("⏱️  模拟结束 {}ms 后，可用性检测 {}ms 后", duration, probe_delay);
    }

    fn play(&mut self, _cx: &mut SourceContext<'_>) -> Result<()> {
        Err(Self::unsupported("play"))
    }

    fn pause(&mut self, _cx: &mut SourceContext<'_>) -> Result<()> {
        Err(Self::unsupported("pause"))
    }

    fn restart(&mut self, _cx: &mut SourceContext<'_>) -> RestartOutcome {
        RestartOutcome::ReloadRequired
    }

    fn supports_pause(&self) -> bool {
        false
    }

    fn is_playing(&self, _surface: &dyn RenderSurface) -> bool {
        true
    }

    fn intrinsic_dimensions(&self) -> Option<(u32, u32)> {
        None
    }

    fn cycle_fit(&mut self, _surface: &mut dyn RenderSurface) -> Result<FitMode> {
        Err(Self::unsupported("cycle-fit"))
    }

    fn failure_grace_ms(&self, config: &KioskConfig) -> u64 {
        config.playback.embedded_failure_grace_ms
    }

    fn on_media_event(&mut self, _cx: &mut SourceContext<'_>, kind: &MediaEventKind) -> SourceSignal {
        match kind {
            MediaEventKind::Failed { reason } => {
                warn!("❌ 嵌入播放器加载失败: {} ({})", self.source_id, reason);
                SourceSignal::Failure { reason: reason.clone() }
            }
            _ => SourceSignal::Idle,
        }
    }

    fn on_timer(&mut self, cx: &mut SourceContext<'_>, kind: TimerKind) -> SourceSignal {
        match kind {
            TimerKind::SimulatedEnd => {
                info!("⏹️  嵌入视频模拟播放结束: {}", self.source_id);
                SourceSignal::EndOfPlayback
            }
            TimerKind::AvailabilityProbe => self.probe_availability(cx),
            _ => SourceSignal::Idle,
        }
    }
}
