//! DOM 查询门面 - 基础设施层
//!
//! 持有唯一的 Page 资源，只暴露"查询/执行"能力。
//!
//! 职责：
//! - 持有唯一的 Page
//! - 所有页面操作都经过 JS 求值完成
//! - 查询失败视为"元素不存在"，不向上抛错
//! - 维护当前帧上下文（iframe 索引路径），脚本在活动文档内执行
//! - 不认识 QuestionData / Action，不处理业务流程

use anyhow::Result;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::debug;

use crate::models::ElementRef;

/// 把 Rust 字符串编码成 JS 字符串字面量
pub fn js_str(s: &str) -> String {
    JsonValue::String(s.to_string()).to_string()
}

/// DOM 查询门面
pub struct DomQuery {
    page: Page,
    /// 当前帧上下文：依次进入的 iframe 序号（最多两层）
    frame_path: Mutex<Vec<usize>>,
}

impl DomQuery {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            frame_path: Mutex::new(Vec::new()),
        }
    }

    /// 获取 page 的引用（用于导航等门面外操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    // ========== 帧上下文 ==========

    /// 进入指定 iframe（路径为嵌套序号），后续查询都在帧内文档执行
    pub fn enter_frame(&self, path: Vec<usize>) {
        let mut current = self.frame_path.lock().expect("frame path lock");
        debug!("进入帧上下文: {:?}", path);
        *current = path;
    }

    /// 回到顶层文档
    pub fn reset_frame(&self) {
        let mut current = self.frame_path.lock().expect("frame path lock");
        if !current.is_empty() {
            debug!("退出帧上下文: {:?}", current);
        }
        current.clear();
    }

    pub fn frame_path(&self) -> Vec<usize> {
        self.frame_path.lock().expect("frame path lock").clone()
    }

    pub fn in_frame(&self) -> bool {
        !self.frame_path.lock().expect("frame path lock").is_empty()
    }

    // ========== 脚本执行 ==========

    /// 执行 JS 代码并返回 JSON 结果（页面顶层上下文）
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 在活动文档内执行脚本体
    ///
    /// `body` 可以使用 `doc` 变量（当前帧的 document）。任何失败
    /// （帧不存在、跨域、脚本异常、CDP 错误）都返回 None。
    pub async fn eval_in_doc(&self, body: &str) -> Option<JsonValue> {
        let script = self.wrap_in_doc(body);
        match self.eval(script).await {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("脚本执行失败（按元素不存在处理）: {}", e);
                None
            }
        }
    }

    /// 在活动文档内执行脚本体并反序列化为指定类型
    pub async fn eval_in_doc_as<T: DeserializeOwned>(&self, body: &str) -> Option<T> {
        let value = self.eval_in_doc(body).await?;
        serde_json::from_value(value).ok()
    }

    /// 把脚本体包进帧解析外壳
    fn wrap_in_doc(&self, body: &str) -> String {
        let path = self.frame_path();
        let mut hops = String::new();
        for idx in path {
            hops.push_str(&format!(
                "frames = doc.querySelectorAll('iframe');\n\
                 if ({idx} >= frames.length) return null;\n\
                 try {{ doc = frames[{idx}].contentDocument; }} catch (e) {{ return null; }}\n\
                 if (!doc) return null;\n"
            ));
        }
        format!(
            "(function() {{\n\
             var doc = document;\n\
             var frames;\n\
             {hops}\
             try {{\n\
             var __r = (function(doc) {{\n{body}\n}})(doc);\n\
             return __r === undefined ? null : __r;\n\
             }} catch (e) {{ return null; }}\n\
             }})()"
        )
    }

    // ========== 查询能力 ==========

    /// 页面是否加载完成
    pub async fn is_ready(&self) -> bool {
        self.eval_in_doc_as::<String>("return doc.readyState;")
            .await
            .map(|state| state == "complete")
            .unwrap_or(false)
    }

    /// 匹配元素个数（失败返回 0）
    pub async fn count(&self, selector: &str) -> usize {
        if selector.is_empty() {
            return 0;
        }
        let body = format!(
            "return doc.querySelectorAll({}).length;",
            js_str(selector)
        );
        self.eval_in_doc_as::<usize>(&body).await.unwrap_or(0)
    }

    /// 是否存在匹配元素
    pub async fn exists(&self, selector: &str) -> bool {
        self.count(selector).await > 0
    }

    /// 查找所有匹配元素，返回可重解析引用（失败返回空列表，不抛错）
    pub async fn find_all(&self, selector: &str) -> Vec<ElementRef> {
        let n = self.count(selector).await;
        (0..n).map(|i| ElementRef::new(selector, i)).collect()
    }

    /// 所有匹配元素的文本（trim 后，与 find_all 同序）
    pub async fn texts_of(&self, selector: &str) -> Vec<String> {
        if selector.is_empty() {
            return Vec::new();
        }
        let body = format!(
            "var els = doc.querySelectorAll({});\n\
             var out = [];\n\
             for (var i = 0; i < els.length; i++) out.push((els[i].textContent || '').trim());\n\
             return out;",
            js_str(selector)
        );
        self.eval_in_doc_as::<Vec<String>>(&body)
            .await
            .unwrap_or_default()
    }

    /// 单个引用的文本（失效返回空串）
    pub async fn element_text(&self, element: &ElementRef) -> String {
        let body = format!(
            "var el = doc.querySelectorAll({})[{}];\n\
             if (!el) return '';\n\
             return (el.textContent || '').trim();",
            js_str(&element.selector),
            element.index
        );
        self.eval_in_doc_as::<String>(&body)
            .await
            .unwrap_or_default()
    }

    /// 等待一个可见且可点击的匹配元素出现
    ///
    /// 每 200ms 轮询一次，超时返回 None。
    pub async fn wait_for_clickable(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Option<ElementRef> {
        if selector.is_empty() {
            return None;
        }
        let body = format!(
            "var els = doc.querySelectorAll({});\n\
             for (var i = 0; i < els.length; i++) {{\n\
             var el = els[i];\n\
             if (el.offsetParent === null) continue;\n\
             if (el.disabled) continue;\n\
             return i;\n\
             }}\n\
             return -1;",
            js_str(selector)
        );
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(index) = self.eval_in_doc_as::<i64>(&body).await {
                if index >= 0 {
                    return Some(ElementRef::new(selector, index as usize));
                }
            }
            if Instant::now() >= deadline {
                return None;
            }
            sleep(Duration::from_millis(200)).await;
        }
    }

    /// 页面滚动（失败静默忽略）
    pub async fn scroll_by(&self, dy: i64) {
        let body = format!(
            "var win = doc.defaultView || window;\n\
             win.scrollBy(0, {dy});\n\
             return true;"
        );
        let _ = self.eval_in_doc(&body).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_str_escapes_quotes() {
        assert_eq!(js_str("input[type='radio']"), r#""input[type='radio']""#);
        assert_eq!(js_str(r#"a"b"#), r#""a\"b""#);
    }
}
