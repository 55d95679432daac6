use serde::Deserialize;
use std::path::Path;

use crate::error::{AppError, AppResult};

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- Oracle 服务配置 ---
    /// 答题服务器地址
    pub server_url: String,
    /// 访问密钥
    pub access_key: String,
    /// 推理模型
    pub model: String,
    /// 推理温度
    pub temperature: f64,
    // --- 浏览器配置 ---
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 用于定位目标标签页的 URL 关键字
    pub tab_url_keywords: Vec<String>,
    // --- 节奏配置（秒） ---
    /// 题间最小延迟
    pub min_delay: f64,
    /// 题间最大延迟
    pub max_delay: f64,
    /// 模拟阅读速度（每分钟词数）
    pub reading_wpm: u32,
    /// 阅读速度随机浮动
    pub reading_wpm_variance: u32,
    /// 单次击键最小间隔
    pub type_min_delay: f64,
    /// 单次击键最大间隔
    pub type_max_delay: f64,
    /// 悬停到点击的最小间隔
    pub click_hover_min: f64,
    /// 悬停到点击的最大间隔
    pub click_hover_max: f64,
    // --- 行为配置 ---
    /// 目标正确率（低于 1.0 时故意答错一部分）
    pub target_accuracy: f64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".to_string(),
            access_key: String::new(),
            model: "gpt-4o".to_string(),
            temperature: 0.0,
            browser_debug_port: 9222,
            tab_url_keywords: vec![
                "mcgraw".to_string(),
                "smartbook".to_string(),
                "connect".to_string(),
                "mheducation".to_string(),
            ],
            min_delay: 2.0,
            max_delay: 5.0,
            reading_wpm: 250,
            reading_wpm_variance: 50,
            type_min_delay: 0.05,
            type_max_delay: 0.15,
            click_hover_min: 0.2,
            click_hover_max: 0.6,
            target_accuracy: 0.90,
            verbose_logging: false,
            output_log_file: "solver_run.log".to_string(),
        }
    }
}

/// solver.toml 文件结构（全部字段可选，缺省沿用默认值）
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    server_url: Option<String>,
    access_key: Option<String>,
    model: Option<String>,
    temperature: Option<f64>,
    browser_debug_port: Option<u16>,
    tab_url_keywords: Option<Vec<String>>,
    speed: Option<String>,
    min_delay: Option<f64>,
    max_delay: Option<f64>,
    target_accuracy: Option<f64>,
    verbose_logging: Option<bool>,
    output_log_file: Option<String>,
}

impl Config {
    /// 从环境变量加载配置（缺省使用默认值）
    pub fn from_env() -> Self {
        Self::overlay_env(Self::default())
    }

    /// 加载配置：先读 solver.toml（存在的话），再叠加环境变量
    pub fn load() -> Self {
        let base = match Self::from_file(Path::new("solver.toml")) {
            Ok(config) => config,
            Err(_) => Self::default(),
        };
        Self::overlay_env(base)
    }

    /// 从 TOML 文件加载配置
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&content)
            .map_err(|e| AppError::config(format!("解析 {} 失败: {}", path.display(), e)))?;

        let mut config = Self::default();
        if let Some(v) = file.server_url {
            config.server_url = v;
        }
        if let Some(v) = file.access_key {
            config.access_key = v;
        }
        if let Some(v) = file.model {
            config.model = v;
        }
        if let Some(v) = file.temperature {
            config.temperature = v;
        }
        if let Some(v) = file.browser_debug_port {
            config.browser_debug_port = v;
        }
        if let Some(v) = file.tab_url_keywords {
            config.tab_url_keywords = v;
        }
        if let Some(preset) = file.speed {
            if let Some((min, max)) = speed_preset(&preset) {
                config.min_delay = min;
                config.max_delay = max;
            }
        }
        // 显式给出的上下界覆盖预设
        if let Some(v) = file.min_delay {
            config.min_delay = v;
        }
        if let Some(v) = file.max_delay {
            config.max_delay = v;
        }
        if let Some(v) = file.target_accuracy {
            config.target_accuracy = v;
        }
        if let Some(v) = file.verbose_logging {
            config.verbose_logging = v;
        }
        if let Some(v) = file.output_log_file {
            config.output_log_file = v;
        }
        Ok(config)
    }

    /// 把环境变量叠加到已有配置上（解析失败的值忽略）
    fn overlay_env(mut base: Self) -> Self {
        if let Ok(v) = std::env::var("SOLVER_SERVER_URL") {
            base.server_url = v;
        }
        if let Ok(v) = std::env::var("SOLVER_ACCESS_KEY") {
            base.access_key = v;
        }
        if let Ok(v) = std::env::var("SOLVER_MODEL") {
            base.model = v;
        }
        if let Some(v) = env_parse("SOLVER_TEMPERATURE") {
            base.temperature = v;
        }
        if let Some(v) = env_parse("BROWSER_DEBUG_PORT") {
            base.browser_debug_port = v;
        }
        if let Some(v) = env_parse("MIN_DELAY") {
            base.min_delay = v;
        }
        if let Some(v) = env_parse("MAX_DELAY") {
            base.max_delay = v;
        }
        if let Some(v) = env_parse("TARGET_ACCURACY") {
            base.target_accuracy = v;
        }
        if let Some(v) = env_parse("VERBOSE_LOGGING") {
            base.verbose_logging = v;
        }
        if let Ok(v) = std::env::var("OUTPUT_LOG_FILE") {
            base.output_log_file = v;
        }
        base
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// 速度预设 (min_delay, max_delay)
pub fn speed_preset(name: &str) -> Option<(f64, f64)> {
    match name.to_lowercase().as_str() {
        "slow" => Some((4.0, 8.0)),
        "normal" => Some((2.0, 5.0)),
        "fast" => Some((1.0, 3.0)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.browser_debug_port, 9222);
        assert!(config.min_delay < config.max_delay);
        assert_eq!(config.target_accuracy, 0.90);
    }

    #[test]
    fn test_speed_presets() {
        assert_eq!(speed_preset("Slow"), Some((4.0, 8.0)));
        assert_eq!(speed_preset("normal"), Some((2.0, 5.0)));
        assert_eq!(speed_preset("Fast"), Some((1.0, 3.0)));
        assert_eq!(speed_preset("ludicrous"), None);
    }

    #[test]
    fn test_from_file_partial_overrides() {
        let dir = std::env::temp_dir().join("quiz_auto_solver_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("solver.toml");
        std::fs::write(
            &path,
            r#"
access_key = "test-key"
speed = "fast"
target_accuracy = 0.8
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.access_key, "test-key");
        assert_eq!(config.min_delay, 1.0);
        assert_eq!(config.max_delay, 3.0);
        assert_eq!(config.target_accuracy, 0.8);
        // 未给出的字段沿用默认值
        assert_eq!(config.model, "gpt-4o");
    }
}
