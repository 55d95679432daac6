//! 协作式取消 - 工具层
//!
//! 用显式句柄取代全局可变标志：GUI / 控制线程持有一个克隆，
//! 主循环在每个迭代间隙和每次长睡眠里检查它。停止请求最多
//! 一个节奏间隔内生效，不会打断进行中的手势。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// 暂停/停止控制句柄
#[derive(Clone, Default)]
pub struct ControlHandle {
    inner: Arc<Flags>,
}

#[derive(Default)]
struct Flags {
    pause: AtomicBool,
    stop: AtomicBool,
}

/// 检查间隔：睡眠切成这么大的片，每片之间看一眼标志
const CHECK_SLICE: Duration = Duration::from_millis(200);

impl ControlHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_pause(&self, paused: bool) {
        self.inner.pause.store(paused, Ordering::SeqCst);
    }

    pub fn request_stop(&self) {
        self.inner.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.inner.pause.load(Ordering::SeqCst)
    }

    pub fn should_stop(&self) -> bool {
        self.inner.stop.load(Ordering::SeqCst)
    }

    /// 可取消睡眠：收到停止请求就提前醒来
    ///
    /// 返回 false 表示是被停止打断的。
    pub async fn sleep_cancellable(&self, duration: Duration) -> bool {
        let mut remaining = duration;
        while remaining > Duration::ZERO {
            if self.should_stop() {
                return false;
            }
            let slice = remaining.min(CHECK_SLICE);
            sleep(slice).await;
            remaining = remaining.saturating_sub(slice);
        }
        !self.should_stop()
    }

    /// 暂停期间原地等待（停止请求优先于暂停）
    pub async fn wait_if_paused(&self) {
        while self.is_paused() && !self.should_stop() {
            sleep(Duration::from_millis(500)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stop_interrupts_sleep() {
        let control = ControlHandle::new();
        control.request_stop();
        let completed = control.sleep_cancellable(Duration::from_secs(60)).await;
        assert!(!completed);
    }

    #[tokio::test]
    async fn test_sleep_completes_without_stop() {
        let control = ControlHandle::new();
        let completed = control
            .sleep_cancellable(Duration::from_millis(10))
            .await;
        assert!(completed);
    }

    #[tokio::test]
    async fn test_pause_then_resume() {
        let control = ControlHandle::new();
        control.request_pause(true);
        assert!(control.is_paused());
        let clone = control.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            clone.request_pause(false);
        });
        control.wait_if_paused().await;
        assert!(!control.is_paused());
    }
}
