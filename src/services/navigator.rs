//! 页面推进服务 - 业务能力层
//!
//! 负责"答完之后怎么往前走"：信心按钮提交、下一题、
//! 过渡页 Continue、概念资源页的强制复习绕行。
//! 所有操作都是尽力而为，返回 bool，不抛错。

use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::infrastructure::{dom_query::js_str, DomQuery};
use crate::models::ElementRef;
use crate::selectors::sel;
use crate::utils::Pacing;

/// 页面推进服务
pub struct Navigator {
    pacing: Pacing,
}

impl Navigator {
    pub fn new(pacing: Pacing) -> Self {
        Self { pacing }
    }

    /// 点一个信心按钮提交答案
    ///
    /// 按 高 60% / 中 30% / 低 10% 加权随机挑选。
    pub async fn submit_with_confidence(&self, dom: &DomQuery) -> bool {
        let roll: f64 = rand::rng().random_range(0.0..1.0);
        let (selector, level) = if roll < 0.6 {
            (sel("confidence_high"), "High")
        } else if roll < 0.9 {
            (sel("confidence_medium"), "Medium")
        } else {
            (sel("confidence_low"), "Low")
        };

        if let Some(button) = dom
            .wait_for_clickable(selector, Duration::from_secs(10))
            .await
        {
            sleep(self.pacing.sample(0.3, 1.0)).await;
            self.click(dom, &button).await;
            info!("以 {} 信心提交", level);
            return true;
        }

        // 兜底：任何一个信心按钮都行
        if let Some(button) = dom
            .wait_for_clickable(sel("confidence_any"), Duration::from_secs(5))
            .await
        {
            sleep(self.pacing.sample(0.3, 1.0)).await;
            self.click(dom, &button).await;
            info!("以兜底信心按钮提交");
            return true;
        }

        warn!("找不到任何信心按钮");
        false
    }

    /// 尽力推进页面：先试信心按钮，再扫所有按钮的文本
    pub async fn click_next_button(&self, dom: &DomQuery) -> bool {
        if self.submit_with_confidence(dom).await {
            return true;
        }

        let advance_words = [
            "next",
            "continue",
            "submit",
            "done",
            "ok",
            "check my work",
            "check answer",
            "check",
        ];
        if let Some(text) = self
            .click_first_by_text(dom, "button", &advance_words, true)
            .await
        {
            info!("点击按钮: {}", text);
            return true;
        }

        warn!("找不到可以推进的按钮");
        false
    }

    /// 点"下一题"按钮（答完之后出现）
    pub async fn click_next_question(&self, dom: &DomQuery) -> bool {
        if let Some(button) = dom
            .wait_for_clickable(sel("next_question"), Duration::from_secs(10))
            .await
        {
            sleep(self.pacing.sample(0.3, 1.0)).await;
            self.click(dom, &button).await;
            info!("点击下一题按钮");
            return true;
        }

        let next_words = ["next", "next question", "next >", ">"];
        if let Some(text) = self
            .click_first_by_text(dom, "a, button", &next_words, true)
            .await
        {
            info!("点击导航: '{}'", text);
            return true;
        }

        warn!("找不到下一题按钮");
        false
    }

    /// 点过渡内容页的 Continue（子串匹配，文本须短于 50 字符）
    pub async fn click_continue(&self, dom: &DomQuery) -> bool {
        let body = r#"
var els = doc.querySelectorAll("button, a, div[role='button']");
for (var i = 0; i < els.length; i++) {
    var el = els[i];
    if (el.offsetParent === null) continue;
    if (el.disabled) continue;
    var text = (el.textContent || '').trim();
    if (text.toLowerCase().indexOf('continue') !== -1 && text.length < 50) {
        el.click();
        return text;
    }
}
return null;"#;
        sleep(self.pacing.sample(0.5, 1.5)).await;
        if let Some(text) = dom
            .eval_in_doc_as::<Option<String>>(body)
            .await
            .flatten()
        {
            info!("点击 Continue 按钮: '{}'", text);
            return true;
        }

        warn!("找不到 Continue 按钮");
        false
    }

    /// 处理概念资源页：打开阅读，装模作样滚两下，再回到题目
    pub async fn handle_recharge_page(&self, dom: &DomQuery) -> bool {
        // 第一步：点"Read About the Concept"（优先点它的父元素）
        let body = format!(
            r#"
var links = doc.querySelectorAll({});
for (var i = 0; i < links.length; i++) {{
    var el = links[i];
    var text = (el.textContent || '').trim().toLowerCase();
    if (text.indexOf('read about') !== -1) {{
        (el.parentElement || el).click();
        return true;
    }}
}}
var fallback = doc.querySelectorAll('a, button, span');
for (var i = 0; i < fallback.length; i++) {{
    var text = (fallback[i].textContent || '').trim().toLowerCase();
    if (text.indexOf('read about') !== -1) {{
        fallback[i].click();
        return true;
    }}
}}
return false;"#,
            js_str(sel("read_about_concept"))
        );
        sleep(self.pacing.sample(1.0, 2.0)).await;
        if dom.eval_in_doc_as::<bool>(&body).await != Some(true) {
            warn!("找不到 'Read About the Concept' 入口");
            return false;
        }
        info!("打开概念阅读页");

        // 第二步：等阅读页出现
        sleep(Duration::from_secs(3)).await;

        // 第三步：滚动模拟阅读
        dom.scroll_by(400).await;
        sleep(self.pacing.sample(2.0, 4.0)).await;
        dom.scroll_by(400).await;
        sleep(self.pacing.sample(1.0, 3.0)).await;

        // 第四步：点"To Questions"回到题目
        if let Some(button) = dom
            .wait_for_clickable(sel("to_questions_button"), Duration::from_secs(10))
            .await
        {
            sleep(self.pacing.sample(1.0, 2.0)).await;
            self.click(dom, &button).await;
            info!("点击 'To Questions' 返回题目");
            sleep(Duration::from_secs(2)).await;
            return true;
        }

        if let Some(text) = self
            .click_first_by_text(dom, "button", &["question"], false)
            .await
        {
            info!("点击兜底按钮: '{}'", text);
            sleep(Duration::from_secs(2)).await;
            return true;
        }

        warn!("找不到 'To Questions' 按钮");
        false
    }

    // ========== 内部辅助 ==========

    /// 点击一个引用指向的元素
    async fn click(&self, dom: &DomQuery, target: &ElementRef) {
        let body = format!(
            r#"
var el = doc.querySelectorAll({})[{}];
if (!el) return false;
el.click();
return true;"#,
            js_str(&target.selector),
            target.index
        );
        if dom.eval_in_doc_as::<bool>(&body).await != Some(true) {
            debug!("点击失效引用: {}", target);
        }
    }

    /// 扫描候选元素，点击第一个文本命中的；返回命中的文本
    ///
    /// `exact` 为真时要求整句相等（不区分大小写），否则子串包含。
    async fn click_first_by_text(
        &self,
        dom: &DomQuery,
        candidates: &str,
        words: &[&str],
        exact: bool,
    ) -> Option<String> {
        let words_json = serde_json::to_string(words).ok()?;
        let body = format!(
            r#"
var words = {words_json};
var els = doc.querySelectorAll({});
for (var i = 0; i < els.length; i++) {{
    var el = els[i];
    if (el.offsetParent === null) continue;
    if (el.disabled) continue;
    var text = (el.textContent || '').trim();
    var lower = text.toLowerCase();
    for (var j = 0; j < words.length; j++) {{
        var hit = {} ? lower === words[j] : lower.indexOf(words[j]) !== -1;
        if (hit) {{
            el.click();
            return text;
        }}
    }}
}}
return null;"#,
            js_str(candidates),
            if exact { "true" } else { "false" }
        );
        sleep(self.pacing.sample(0.3, 1.0)).await;
        dom.eval_in_doc_as::<Option<String>>(&body).await.flatten()
    }
}
