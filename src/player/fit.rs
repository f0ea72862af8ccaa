// 画面适配策略（仅本地视频）

use crate::core::FitMode;

/// 宽视频放大系数
const WIDE_ZOOM: f32 = 1.1;
/// 窄视频横向拉伸系数
const NARROW_STRETCH_X: f32 = 1.05;

/// 根据视频和屏幕宽高比自动选择适配方式
///
/// 差异超过阈值时在 cover 基础上轻微放大（≤10%）以消除黑边，否则使用普通 cover
pub fn auto_fit(video: (u32, u32), viewport: (u32, u32), threshold: f64) -> FitMode {
    let (vw, vh) = video;
    let (sw, sh) = viewport;
    if vw == 0 || vh == 0 || sw == 0 || sh == 0 {
        return FitMode::COVER;
    }

    let video_aspect = vw as f64 / vh as f64;
    let screen_aspect = sw as f64 / sh as f64;

    if (video_aspect - screen_aspect).abs() > threshold {
        if video_aspect > screen_aspect {
            FitMode::Cover { scale_x: WIDE_ZOOM, scale_y: WIDE_ZOOM }
        } else {
            FitMode::Cover { scale_x: NARROW_STRETCH_X, scale_y: 1.0 }
        }
    } else {
        FitMode::COVER
    }
}

/// 手动切换：cover -> fill -> contain -> cover+zoom -> fill ...
pub fn next_manual_fit(current: FitMode) -> FitMode {
    match current {
        FitMode::Cover { .. } => FitMode::Fill,
        FitMode::Fill => FitMode::Contain,
        FitMode::Contain => FitMode::COVER_ZOOM,
    }
}
