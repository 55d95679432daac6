//! 页面状态分类器 - 业务能力层
//!
//! 只回答"现在是什么页面"。判定顺序是承载语义的：多个状态的
//! 表面信号会互相重叠，先到先得。
//!
//! 职责：
//! - classify：返回一个 PageState
//! - 查询失败一律按"信号不存在"处理，绝不抛错
//! - 除进入 iframe 外没有副作用

use tracing::{debug, info};

use crate::infrastructure::{dom_query::js_str, DomQuery};
use crate::models::PageState;
use crate::selectors::sel;

/// 页面状态分类器
pub struct PageClassifier;

impl PageClassifier {
    pub fn new() -> Self {
        Self
    }

    /// 判定当前页面状态
    ///
    /// 判定顺序：loading → complete → recharge → question → reading
    /// → content → iframe 探测 → unknown。
    pub async fn classify(&self, dom: &DomQuery) -> PageState {
        if !dom.is_ready().await {
            return PageState::Loading;
        }

        if dom.exists(sel("loading_spinner")).await {
            return PageState::Loading;
        }

        if dom.exists(sel("complete_indicator")).await {
            return PageState::Complete;
        }

        if self.is_recharge_page(dom).await {
            return PageState::Recharge;
        }

        if self.has_question_signals(dom).await {
            return PageState::Question;
        }

        if dom.exists(sel("nav_bar")).await && dom.exists(sel("reading_button")).await {
            return PageState::Reading;
        }

        // 过渡内容页（视频/导语，带 Continue 按钮）
        if self.is_content_page(dom).await {
            return PageState::Content;
        }

        // 最后尝试进入 iframe 寻找题目
        if self.try_enter_question_frame(dom).await {
            return PageState::Question;
        }

        self.log_page_census(dom).await;
        // 帧内什么都认不出来就回到顶层，下次轮询从头判定
        if dom.in_frame() {
            dom.reset_frame();
        }
        PageState::Unknown
    }

    /// 当前页面是否要求复习概念资源（提交后可能弹出的强制绕行）
    pub async fn needs_resource_review(&self, dom: &DomQuery) -> bool {
        self.is_recharge_page(dom).await
    }

    /// 题目信号：答题容器 / 选择题 fieldset / 文本输入 / 单选 / 多选
    async fn has_question_signals(&self, dom: &DomQuery) -> bool {
        dom.exists(sel("responses_container")).await
            || dom.exists(sel("question_fieldset")).await
            || dom.exists(sel("text_input")).await
            || dom.exists(sel("radio_any")).await
            || dom.exists(sel("checkbox_any")).await
    }

    /// 资源托盘按钮存在且可见文本里带 "continue"
    ///
    /// 托盘和常驻的"需要帮助"入口长得很像，区分点只有这句话。
    async fn is_recharge_page(&self, dom: &DomQuery) -> bool {
        dom.texts_of(sel("recharge_tray_button"))
            .await
            .iter()
            .any(|text| text.to_lowercase().contains("continue"))
    }

    /// 过渡内容页：有显眼的 Continue 控件，但没有任何题目信号
    async fn is_content_page(&self, dom: &DomQuery) -> bool {
        let body = r#"
var els = doc.querySelectorAll("button, a, div[role='button']");
for (var i = 0; i < els.length; i++) {
    var el = els[i];
    if (el.offsetParent === null) continue;
    if (el.disabled) continue;
    var text = (el.textContent || '').trim().toLowerCase();
    if (text.indexOf('continue') !== -1 && text.length < 50) return true;
}
return false;"#;
        let has_continue = dom
            .eval_in_doc_as::<bool>(body)
            .await
            .unwrap_or(false);
        if !has_continue {
            return false;
        }

        let is_content = !self.has_question_signals(dom).await;
        if is_content {
            info!("检测到带 Continue 按钮的过渡内容页");
        }
        is_content
    }

    /// 尝试进入包含题目的同源 iframe（含一层嵌套）
    ///
    /// 命中后把门面留在帧内，后续的提取和执行都在帧内进行。
    async fn try_enter_question_frame(&self, dom: &DomQuery) -> bool {
        // 只在顶层文档发起探测
        if dom.in_frame() {
            return false;
        }

        let frame_count = dom.count("iframe").await;
        if frame_count == 0 {
            return false;
        }

        for i in 0..frame_count {
            dom.enter_frame(vec![i]);
            if self.has_question_signals(dom).await {
                info!("在 iframe[{}] 中找到题目内容", i);
                return true;
            }

            // 检查一层嵌套
            let nested_count = dom.count("iframe").await;
            for j in 0..nested_count {
                dom.enter_frame(vec![i, j]);
                if dom.exists(sel("responses_container")).await
                    || dom.exists(sel("radio_any")).await
                {
                    info!("在嵌套 iframe[{},{}] 中找到题目内容", i, j);
                    return true;
                }
                dom.enter_frame(vec![i]);
            }

            dom.reset_frame();
        }

        dom.reset_frame();
        false
    }

    /// unknown 时输出一行页面元素普查，方便排查改版
    async fn log_page_census(&self, dom: &DomQuery) {
        let body = format!(
            r#"
var win = doc.defaultView || window;
return {{
    url: win.location ? win.location.href : '',
    title: doc.title || '',
    iframes: doc.querySelectorAll('iframe').length,
    radios: doc.querySelectorAll({}).length,
    checkboxes: doc.querySelectorAll({}).length,
    textInputs: doc.querySelectorAll("input[type='text']").length,
    buttons: doc.querySelectorAll('button').length,
    responsesContainer: doc.querySelectorAll({}).length,
    choiceRow: doc.querySelectorAll({}).length,
    prompt: doc.querySelectorAll({}).length
}};"#,
            js_str(sel("radio_any")),
            js_str(sel("checkbox_any")),
            js_str(sel("responses_container")),
            js_str(sel("choice_row")),
            js_str(sel("question_prompt")),
        );
        if let Some(census) = dom.eval_in_doc(&body).await {
            info!("页面普查: {}", census);
        } else {
            debug!("页面普查脚本执行失败");
        }
    }
}

impl Default for PageClassifier {
    fn default() -> Self {
        Self::new()
    }
}
