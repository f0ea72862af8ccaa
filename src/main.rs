use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;

mod app;
mod core;
mod player;

use crate::app::KioskApp;
use crate::core::KioskConfig;

/// 展台视频轮播器（无界面运行，stdin 输入命令）
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON 配置文件；不指定时使用内置播放列表
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// 关闭自动播放
    #[arg(long = "no-autoplay")]
    no_autoplay: bool,

    /// 初始音量 0-100
    #[arg(long = "volume", value_name = "0-100", value_parser = clap::value_parser!(u8).range(0..=100))]
    volume: Option<u8>,

    /// 本地视频和结束画面图片的根目录
    #[arg(long = "media-root", value_name = "DIR", default_value = ".")]
    media_root: PathBuf,

    /// 日志级别 (error, warn, info, debug, trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: log::LevelFilter,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志（RUST_LOG 优先）
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .parse_default_env()
        .init();

    info!("🎬 展台视频轮播器启动");

    let mut config = match &args.config {
        Some(path) => KioskConfig::load(path)
            .with_context(|| format!("加载配置失败: {}", path.display()))?,
        None => {
            warn!("⚠️  未指定配置文件，使用内置播放列表");
            KioskConfig::default()
        }
    };
    if args.no_autoplay {
        config.playback.autoplay = false;
    }
    if let Some(volume) = args.volume {
        config.playback.initial_volume = volume;
    }
    config.validate().context("配置无效")?;

    let mut app = KioskApp::new(config, args.media_root).context("初始化失败")?;
    app.spawn_stdin_reader().context("启动输入线程失败")?;
    app.run().context("运行失败")?;

    Ok(())
}
