pub mod console_surface;

pub use console_surface::ConsoleSurface;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, info, warn};
use std::io::BufRead;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use crate::core::{Command, KioskClock, KioskConfig, MediaEvent, MediaEventKind, PreloadEvent, Result, SourceVariant};
use crate::player::{PlaylistController, RandomChooser};

/// 没有待触发定时器时的最长等待
const IDLE_WAIT: Duration = Duration::from_millis(500);

/// 事件队列中的事件
#[derive(Debug)]
pub enum AppEvent {
    Command(Command),
    Media(MediaEvent),
    Preload(PreloadEvent),
    /// 模拟当前本地视频自然播放结束
    SimulateEnd,
    Quit,
}

/// 无界面的展台运行时
///
/// 控制器、渲染表面和定时器都在主线程；stdin 读取线程只负责把输入
/// 转成 `AppEvent` 放进同一个事件队列。
pub struct KioskApp {
    controller: PlaylistController<ConsoleSurface>,
    clock: KioskClock,
    events_tx: Sender<AppEvent>,
    events_rx: Receiver<AppEvent>,
}

impl KioskApp {
    pub fn new(config: KioskConfig, media_root: PathBuf) -> Result<Self> {
        info!("🎮 初始化 KioskApp");
        let (events_tx, events_rx) = unbounded();
        let clock = KioskClock::system();
        let surface = ConsoleSurface::new(events_tx.clone(), media_root);
        let controller = PlaylistController::new(config, surface, clock.clone(), Box::new(RandomChooser))?;

        Ok(Self {
            controller,
            clock,
            events_tx,
            events_rx,
        })
    }

    pub fn sender(&self) -> Sender<AppEvent> {
        self.events_tx.clone()
    }

    /// 启动 stdin 读取线程
    pub fn spawn_stdin_reader(&self) -> Result<()> {
        let events_tx = self.sender();
        thread::Builder::new()
            .name("stdin-reader".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            warn!("⚠️  读取输入失败: {}", e);
                            break;
                        }
                    };
                    match parse_line(&line) {
                        Some(event) => {
                            if events_tx.send(event).is_err() {
                                break;
                            }
                        }
                        None => warn!("❓ 未知命令: {:?}", line.trim()),
                    }
                }
                info!("⌨️  输入已关闭，继续无人值守轮播");
            })?;
        Ok(())
    }

    /// 主循环：等到下一个定时器到期或有新事件
    pub fn run(&mut self) -> Result<()> {
        self.controller.start();

        loop {
            let timeout = match self.controller.next_deadline() {
                Some(deadline) => Duration::from_millis(deadline.saturating_sub(self.clock.now_ms())),
                None => IDLE_WAIT,
            };

            match self.events_rx.recv_timeout(timeout) {
                Ok(AppEvent::Quit) => break,
                Ok(event) => self.handle_event(event),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            self.controller.run_due_timers();
        }

        info!("🔚 KioskApp 退出");
        Ok(())
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Command(command) => self.controller.handle_command(command),
            AppEvent::Media(event) => self.controller.on_media_event(event),
            AppEvent::Preload(event) => self.controller.on_preload_event(event),
            AppEvent::SimulateEnd => {
                if self.controller.active_variant() == Some(SourceVariant::LocalFile) {
                    let generation = self.controller.generation();
                    self.controller
                        .on_media_event(MediaEvent::new(generation, MediaEventKind::Ended));
                } else {
                    debug!("⏭️  嵌入视频的结束由定时器模拟，忽略");
                }
            }
            AppEvent::Quit => {}
        }
    }
}

/// 把一行输入转成事件
pub fn parse_line(line: &str) -> Option<AppEvent> {
    if line == " " {
        return Some(AppEvent::Command(Command::TogglePlayPause));
    }
    let mut parts = line.split_whitespace();
    let head = parts.next()?;

    let command = match head.to_lowercase().as_str() {
        "n" | "next" => Command::Next,
        "p" | "prev" | "previous" => Command::Previous,
        "space" | "toggle" => Command::TogglePlayPause,
        "r" | "restart" => Command::Restart,
        "v" | "volume" => {
            let level: u8 = parts.next()?.parse().ok()?;
            Command::SetVolume(level.min(100))
        }
        "f" | "fullscreen" => Command::ToggleFullscreen,
        "a" | "autoplay" => Command::ToggleAutoplay,
        "z" | "fit" => Command::CycleFit,
        "m" | "mouse" => Command::PointerActivity,
        "swipe" => {
            let start_y: f32 = parts.next()?.parse().ok()?;
            let end_y: f32 = parts.next()?.parse().ok()?;
            Command::from_swipe(start_y, end_y)?
        }
        "end" => return Some(AppEvent::SimulateEnd),
        "q" | "quit" | "exit" => return Some(AppEvent::Quit),
        _ => return Command::from_key(head).map(AppEvent::Command),
    };
    Some(AppEvent::Command(command))
}
