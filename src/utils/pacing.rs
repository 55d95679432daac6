//! 节奏模拟 - 工具层
//!
//! 所有"像人"的延迟都从这里取样。随机性不是正确性机制，
//! 只是节奏特征：区间可配置，测试可以注入零区间。

use rand::Rng;
use std::time::Duration;

/// 节奏参数
#[derive(Debug, Clone)]
pub struct Pacing {
    /// 题间最小延迟（秒）
    pub min_delay: f64,
    /// 题间最大延迟（秒）
    pub max_delay: f64,
    /// 模拟阅读速度（每分钟词数）
    pub reading_wpm: u32,
    /// 阅读速度浮动
    pub reading_wpm_variance: u32,
    /// 击键间隔下界（秒）
    pub type_min_delay: f64,
    /// 击键间隔上界（秒）
    pub type_max_delay: f64,
    /// 悬停-点击间隔下界（秒）
    pub click_hover_min: f64,
    /// 悬停-点击间隔上界（秒）
    pub click_hover_max: f64,
}

impl Pacing {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            min_delay: config.min_delay,
            max_delay: config.max_delay,
            reading_wpm: config.reading_wpm,
            reading_wpm_variance: config.reading_wpm_variance,
            type_min_delay: config.type_min_delay,
            type_max_delay: config.type_max_delay,
            click_hover_min: config.click_hover_min,
            click_hover_max: config.click_hover_max,
        }
    }

    /// 零区间节奏（测试用：所有取样返回 0）
    pub fn fixed_zero() -> Self {
        Self {
            min_delay: 0.0,
            max_delay: 0.0,
            reading_wpm: u32::MAX / 2,
            reading_wpm_variance: 0,
            type_min_delay: 0.0,
            type_max_delay: 0.0,
            click_hover_min: 0.0,
            click_hover_max: 0.0,
        }
    }

    /// 在 [min, max] 秒内取样一个时长
    pub fn sample(&self, min_s: f64, max_s: f64) -> Duration {
        Duration::from_secs_f64(sample_range(min_s, max_s))
    }

    /// 题间延迟取样
    pub fn question_delay(&self) -> Duration {
        self.sample(self.min_delay, self.max_delay)
    }

    /// 悬停-点击间隔取样
    pub fn hover_delay(&self) -> Duration {
        self.sample(self.click_hover_min, self.click_hover_max)
    }

    /// 击键间隔取样
    pub fn keystroke_delay(&self) -> Duration {
        self.sample(self.type_min_delay, self.type_max_delay)
    }

    /// 按词数模拟阅读时间，限制在 [1, 15] 秒
    pub fn reading_time(&self, text: &str) -> Duration {
        let words = text.split_whitespace().count().max(1) as f64;
        let mut rng = rand::rng();
        let variance = self.reading_wpm_variance as i64;
        let wpm_offset = if variance > 0 {
            rng.random_range(-variance..=variance)
        } else {
            0
        };
        let wpm = ((self.reading_wpm as i64 + wpm_offset).max(100)) as f64;
        let mut secs = words / wpm * 60.0;
        secs *= rng.random_range(0.8..=1.2);
        Duration::from_secs_f64(secs.clamp(1.0, 15.0))
    }
}

/// 在 [min, max] 内取样（区间为零或倒置时直接返回 min）
fn sample_range(min_s: f64, max_s: f64) -> f64 {
    if max_s <= min_s {
        return min_s.max(0.0);
    }
    rand::rng().random_range(min_s..=max_s)
}

/// 是否应当故意答错（掷点超过目标正确率）
pub fn should_miss(target_accuracy: f64) -> bool {
    rand::rng().random_range(0.0..1.0) > target_accuracy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_within_bounds() {
        let pacing = Pacing::fixed_zero();
        for _ in 0..50 {
            let d = pacing.sample(0.1, 0.3);
            assert!(d >= Duration::from_secs_f64(0.1));
            assert!(d <= Duration::from_secs_f64(0.3));
        }
    }

    #[test]
    fn test_zero_range_is_deterministic() {
        let pacing = Pacing::fixed_zero();
        assert_eq!(pacing.question_delay(), Duration::ZERO);
        assert_eq!(pacing.hover_delay(), Duration::ZERO);
        assert_eq!(pacing.keystroke_delay(), Duration::ZERO);
    }

    #[test]
    fn test_reading_time_clamped() {
        let pacing = Pacing {
            min_delay: 0.0,
            max_delay: 0.0,
            reading_wpm: 250,
            reading_wpm_variance: 50,
            type_min_delay: 0.0,
            type_max_delay: 0.0,
            click_hover_min: 0.0,
            click_hover_max: 0.0,
        };
        // 一个词也至少读 1 秒
        assert!(pacing.reading_time("word") >= Duration::from_secs(1));
        // 超长文本封顶 15 秒
        let long_text = "word ".repeat(10_000);
        assert!(pacing.reading_time(&long_text) <= Duration::from_secs(15));
    }

    #[test]
    fn test_should_miss_extremes() {
        // 正确率 1.0 永不故意答错，0.0 永远答错
        for _ in 0..100 {
            assert!(!should_miss(1.0));
            assert!(should_miss(0.0));
        }
    }
}
