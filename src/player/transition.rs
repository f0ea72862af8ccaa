use log::{debug, info, warn};
use rand::Rng;

use crate::core::{EndScreenConfig, EndScreenView, Generation, OverlayUpdate, TimerKind, TimerQueue};
use crate::player::RenderSurface;

/// 从有限集合中均匀选择一个下标（测试中可注入确定性实现）
pub trait Chooser {
    fn choose(&mut self, len: usize) -> usize;
}

/// 基于线程随机数的均匀选择
#[derive(Debug, Default)]
pub struct RandomChooser;

impl Chooser for RandomChooser {
    fn choose(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        rand::rng().random_range(0..len)
    }
}

/// 结束画面图片的回退阶段：随机图 -> 默认图 -> 纯色背景
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStage {
    Primary,
    Default,
    Blank,
}

/// 单次结束画面的临时状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionState {
    pub image: String,
    pub animation: String,
    pub visible: bool,
    pub stage: ImageStage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequencerPhase {
    Idle,
    ShowingInterstitial { generation: Generation, transition: TransitionState },
    Committing { generation: Generation },
}

/// 结束画面序列器：Idle -> ShowingInterstitial -> Committing -> Idle
///
/// 只在自动播放开启且当前源自然结束时进入。图片确认加载后才显示，
/// 同时在后台预加载下一个条目并启动停留定时器；图片加载失败时按
/// 默认图、纯色背景依次回退，保证序列不会卡住。
pub struct EndScreenSequencer {
    config: EndScreenConfig,
    chooser: Box<dyn Chooser>,
    phase: SequencerPhase,
}

impl EndScreenSequencer {
    pub fn new(config: EndScreenConfig, chooser: Box<dyn Chooser>) -> Self {
        Self {
            config,
            chooser,
            phase: SequencerPhase::Idle,
        }
    }

    pub fn phase(&self) -> &SequencerPhase {
        &self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == SequencerPhase::Idle
    }

    pub fn transition(&self) -> Option<&TransitionState> {
        match &self.phase {
            SequencerPhase::ShowingInterstitial { transition, .. } => Some(transition),
            _ => None,
        }
    }

    /// 视频自然结束：随机选择图片和动画，开始加载图片
    pub fn begin(&mut self, generation: Generation, surface: &mut dyn RenderSurface) -> bool {
        if !self.is_idle() {
            debug!("🎞️  结束画面已在进行中，忽略 ({})", generation);
            return false;
        }

        let (image, stage) = if self.config.images.is_empty() {
            (self.config.default_image.clone(), ImageStage::Default)
        } else {
            let index = self.chooser.choose(self.config.images.len());
            (self.config.images[index.min(self.config.images.len() - 1)].clone(), ImageStage::Primary)
        };
        let animation = if self.config.animations.is_empty() {
            String::new()
        } else {
            let index = self.chooser.choose(self.config.animations.len());
            self.config.animations[index.min(self.config.animations.len() - 1)].clone()
        };

        info!("🎬 显示结束画面: {} ({})", image, animation);
        surface.load_interstitial_image(generation, &image);
        self.phase = SequencerPhase::ShowingInterstitial {
            generation,
            transition: TransitionState {
                image,
                animation,
                visible: false,
                stage,
            },
        };
        true
    }

    /// 图片加载完成：全屏显示并启动停留定时器
    ///
    /// 返回 true 表示调用方应在后台预加载下一个条目
    pub fn on_image_loaded(
        &mut self,
        generation: Generation,
        surface: &mut dyn RenderSurface,
        timers: &mut TimerQueue,
        now_ms: u64,
    ) -> bool {
        let SequencerPhase::ShowingInterstitial { generation: current, transition } = &mut self.phase else {
            return false;
        };
        if *current != generation || transition.visible {
            return false;
        }

        transition.visible = true;
        surface.overlay(OverlayUpdate::EndScreen(EndScreenView::Image {
            src: transition.image.clone(),
            animation: transition.animation.clone(),
        }));
        timers.schedule(now_ms, self.config.dwell_ms, Some(generation), TimerKind::EndScreenDwell);
        debug!("🖼️  结束画面已显示，{}ms 后切换", self.config.dwell_ms);
        true
    }

    /// 图片加载失败：先回退到默认图，再回退到纯色背景
    pub fn on_image_failed(
        &mut self,
        generation: Generation,
        surface: &mut dyn RenderSurface,
        timers: &mut TimerQueue,
        now_ms: u64,
    ) {
        let SequencerPhase::ShowingInterstitial { generation: current, transition } = &mut self.phase else {
            return;
        };
        if *current != generation || transition.visible {
            return;
        }

        match transition.stage {
            ImageStage::Primary if transition.image != self.config.default_image => {
                warn!("⚠️  结束画面图片加载失败: {}，改用默认图片", transition.image);
                transition.stage = ImageStage::Default;
                transition.image = self.config.default_image.clone();
                surface.load_interstitial_image(generation, &transition.image);
            }
            _ => {
                warn!("⚠️  默认结束画面也加载失败，显示纯色背景");
                transition.stage = ImageStage::Blank;
                transition.visible = true;
                surface.overlay(OverlayUpdate::EndScreen(EndScreenView::Blank));
                timers.schedule(now_ms, self.config.dwell_ms, Some(generation), TimerKind::EndScreenDwell);
            }
        }
    }

    /// 停留结束：隐藏结束画面，返回 true 表示调用方应切换到下一个
    pub fn on_dwell_elapsed(&mut self, generation: Generation, surface: &mut dyn RenderSurface) -> bool {
        match &self.phase {
            SequencerPhase::ShowingInterstitial { generation: current, transition }
                if *current == generation && transition.visible => {}
            _ => return false,
        }
        surface.overlay(OverlayUpdate::EndScreen(EndScreenView::Hidden));
        self.phase = SequencerPhase::Committing { generation };
        info!("➡️  结束画面停留结束，切换下一个 ({})", generation);
        true
    }

    /// 新的加载取代了当前序列（包括提交时的切换本身）
    pub fn supersede(&mut self, surface: &mut dyn RenderSurface) {
        match &self.phase {
            SequencerPhase::Idle => {}
            SequencerPhase::ShowingInterstitial { generation, .. } => {
                info!("⏭️  手动切换打断结束画面 ({})", generation);
                surface.overlay(OverlayUpdate::EndScreen(EndScreenView::Hidden));
            }
            SequencerPhase::Committing { .. } => {}
        }
        self.phase = SequencerPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::testing::{FixedChooser, RecordingSurface, SurfaceCall};

    fn sequencer(picks: Vec<usize>) -> EndScreenSequencer {
        EndScreenSequencer::new(EndScreenConfig::default(), Box::new(FixedChooser::new(picks)))
    }

    #[test]
    fn test_random_chooser_stays_in_range() {
        let mut chooser = RandomChooser;
        for _ in 0..100 {
            assert!(chooser.choose(3) < 3);
        }
        assert_eq!(chooser.choose(1), 0);
    }

    #[test]
    fn test_full_sequence_with_injected_choice() {
        let mut surface = RecordingSurface::new();
        let mut timers = TimerQueue::new();
        let mut seq = sequencer(vec![1, 2]);
        let gen = Generation(3);

        assert!(seq.begin(gen, &mut surface));
        assert!(surface.calls.contains(&SurfaceCall::LoadInterstitial(gen, "END SCREEN/end2.jpg".to_string())));
        let transition = seq.transition().unwrap();
        assert_eq!(transition.animation, "endScreenZoomIn");
        assert!(!transition.visible);
        assert!(timers.is_empty());

        assert!(seq.on_image_loaded(gen, &mut surface, &mut timers, 10));
        assert!(seq.transition().unwrap().visible);
        let dwell = timers.pop_due(u64::MAX).unwrap();
        assert_eq!((dwell.deadline_ms, dwell.kind), (4010, TimerKind::EndScreenDwell));

        assert!(seq.on_dwell_elapsed(gen, &mut surface));
        assert_eq!(seq.phase(), &SequencerPhase::Committing { generation: gen });
        assert_eq!(surface.last_end_screen(), Some(EndScreenView::Hidden));
        seq.supersede(&mut surface);
        assert!(seq.is_idle());
    }

    #[test]
    fn test_fallback_to_default_then_blank() {
        let mut surface = RecordingSurface::new();
        let mut timers = TimerQueue::new();
        let mut seq = sequencer(vec![0, 0]);
        let gen = Generation(1);
        seq.begin(gen, &mut surface);

        seq.on_image_failed(gen, &mut surface, &mut timers, 0);
        assert_eq!(seq.transition().unwrap().stage, ImageStage::Default);
        assert!(surface
            .calls
            .contains(&SurfaceCall::LoadInterstitial(gen, "END SCREEN/default.jpg".to_string())));
        assert!(timers.is_empty());

        seq.on_image_failed(gen, &mut surface, &mut timers, 0);
        assert_eq!(seq.transition().unwrap().stage, ImageStage::Blank);
        assert_eq!(surface.last_end_screen(), Some(EndScreenView::Blank));
        assert_eq!(timers.len(), 1);
        assert!(seq.on_dwell_elapsed(gen, &mut surface));
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let mut surface = RecordingSurface::new();
        let mut timers = TimerQueue::new();
        let mut seq = sequencer(vec![0, 0]);
        seq.begin(Generation(2), &mut surface);
        assert!(!seq.begin(Generation(2), &mut surface));
        assert!(!seq.on_image_loaded(Generation(1), &mut surface, &mut timers, 0));
        assert!(!seq.on_dwell_elapsed(Generation(2), &mut surface));

        seq.supersede(&mut surface);
        assert!(seq.is_idle());
        assert_eq!(surface.last_end_screen(), Some(EndScreenView::Hidden));
    }
}
