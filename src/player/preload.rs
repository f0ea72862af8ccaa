use log::{debug, info, warn};
use std::collections::VecDeque;

use crate::core::{PlaylistEntry, PreloadEvent, PreloadHandle, PreloadOutcome, SourceVariant};
use crate::player::RenderSurface;

/// 预加载请求结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreloadRequest {
    Started(PreloadHandle),
    AlreadyCached,
    SingleEntry,
    /// 嵌入视频没有客户端预取手段
    Embedded,
    /// 已有预加载在进行中
    InFlight,
    OutOfRange,
}

struct InFlight {
    index: usize,
    handle: PreloadHandle,
}

/// 预加载管理器
///
/// - 只缓存本地视频，按播放列表索引存放
/// - 按插入顺序淘汰（FIFO，不是 LRU），超过容量时移除最早插入的条目
/// - 单飞保护：同一时间只允许一个预加载，请求结束（成功或失败）即复位，
///   失败不会自动重试
/// - 尽力而为，不阻塞也不拖慢当前播放
pub struct PreloadManager {
    capacity: usize,
    cache: VecDeque<(usize, PreloadHandle)>,
    in_flight: Option<InFlight>,
    next_handle: u64,
}

impl PreloadManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            cache: VecDeque::new(),
            in_flight: None,
            next_handle: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.cache.iter().any(|(i, _)| *i == index)
    }

    /// 缓存中的索引（按插入顺序）
    pub fn cached_indices(&self) -> Vec<usize> {
        self.cache.iter().map(|(i, _)| *i).collect()
    }

    pub fn is_preloading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// 请求预加载指定索引的条目
    pub fn request_preload(
        &mut self,
        index: usize,
        entries: &[PlaylistEntry],
        surface: &mut dyn RenderSurface,
    ) -> PreloadRequest {
        let Some(entry) = entries.get(index) else {
            return PreloadRequest::OutOfRange;
        };
        if self.contains(index) {
            return PreloadRequest::AlreadyCached;
        }
        if entries.len() == 1 {
            return PreloadRequest::SingleEntry;
        }
        if entry.variant == SourceVariant::Embedded {
            debug!("⏭️  跳过嵌入视频的预加载: {}", entry.display_name);
            return PreloadRequest::Embedded;
        }
        if self.in_flight.is_some() {
            return PreloadRequest::InFlight;
        }

        let handle = PreloadHandle(self.next_handle);
        self.next_handle += 1;
        self.in_flight = Some(InFlight { index, handle });
        surface.begin_preload(handle, &entry.source_id);
        info!("📥 开始预加载: {} (#{})", entry.display_name, index);
        PreloadRequest::Started(handle)
    }

    /// 处理预加载结果；元数据就绪时存入缓存并淘汰多余条目
    pub fn on_preload_event(&mut self, event: PreloadEvent, surface: &mut dyn RenderSurface) {
        let index = match &self.in_flight {
            Some(flight) if flight.handle == event.handle => flight.index,
            _ => {
                debug!("🗑️  忽略未知的预加载结果: {:?}", event.handle);
                surface.release_preload(event.handle);
                return;
            }
        };
        self.in_flight = None;

        match event.outcome {
            PreloadOutcome::MetadataReady => {
                self.cache.push_back((index, event.handle));
                info!("✅ 预加载完成: #{}", index);
                self.evict_excess(surface);
            }
            PreloadOutcome::Failed => {
                warn!("⚠️  预加载失败: #{}（不自动重试）", index);
                surface.release_preload(event.handle);
            }
        }
    }

    /// 超过容量时移除最早插入的条目，返回被移除的索引
    pub fn evict_excess(&mut self, surface: &mut dyn RenderSurface) -> Vec<usize> {
        let mut evicted = Vec::new();
        while self.cache.len() > self.capacity {
            if let Some((index, handle)) = self.cache.pop_front() {
                surface.release_preload(handle);
                debug!("🧹 清理预加载: #{}", index);
                evicted.push(index);
            }
        }
        evicted
    }

    /// 取出已预热的资源交给当前播放使用
    pub fn take(&mut self, index: usize) -> Option<PreloadHandle> {
        let position = self.cache.iter().position(|(i, _)| *i == index)?;
        self.cache.remove(position).map(|(_, handle)| handle)
    }
}
