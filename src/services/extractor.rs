//! 题目提取器 - 业务能力层
//!
//! 只在页面状态为 question 时调用，把当前页面变成一个
//! 结构化的 QuestionData。
//!
//! 职责：
//! - 题干级联提取（专用元素 → 容器外段落 → 输入附近的标题）
//! - 阅读材料提取（高亮 + 阅读窗格，去重、截断）
//! - 按优先级判定题型：ordering → matching → mc_multi →
//!   mc_single → fill → dropdown → unknown
//! - 任何子提取失败都只产生空字段，绝不抛错

use tracing::{info, warn};

use crate::infrastructure::{dom_query::js_str, DomQuery};
use crate::models::question::choice_label;
use crate::models::{Choice, DropdownSelect, ElementRef, QuestionBody, QuestionData};
use crate::selectors::sel;
use crate::utils::logging::truncate_text;

/// 阅读材料长度上限（字符）
const CONTEXT_MAX_CHARS: usize = 2000;

/// 题目提取器
pub struct QuestionExtractor;

impl QuestionExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 提取当前页面的题目结构
    pub async fn extract(&self, dom: &DomQuery) -> QuestionData {
        let prompt_text = self.extract_question_text(dom).await;
        let context_text = self.extract_page_context(dom).await;

        let body = self.extract_body(dom).await;

        let qd = QuestionData {
            prompt_text,
            context_text,
            body,
        };
        info!(
            "解析完成: 类型={}, 题干='{}'",
            qd.kind(),
            truncate_text(&qd.prompt_text, 60)
        );
        qd
    }

    /// 按优先级判定题型并提取类型专属数据
    async fn extract_body(&self, dom: &DomQuery) -> QuestionBody {
        // 排序题优先
        if dom.exists(sel("sortable_component")).await {
            let (items, item_refs) = self.extract_sortable_items(dom).await;
            info!("排序题: {} 个列表项", items.len());
            return QuestionBody::Ordering { items, item_refs };
        }

        // 连线题其次
        if dom.exists(sel("matching_component")).await {
            return self.extract_matching(dom).await;
        }

        let choice_rows = dom.count(sel("choice_row")).await;
        let checkboxes = dom.count(sel("choice_checkbox")).await;
        let radios = dom.count(sel("choice_radio")).await;
        let text_inputs = dom.count(sel("text_input")).await;
        let dropdowns = dom.count(sel("dropdown_select")).await;

        if checkboxes > 0 {
            let choices = self
                .extract_choices(dom, sel("choice_checkbox"), checkboxes, choice_rows)
                .await;
            return QuestionBody::McMulti { choices };
        }

        if radios > 0 {
            let choices = self
                .extract_choices(dom, sel("choice_radio"), radios, choice_rows)
                .await;
            return QuestionBody::McSingle { choices };
        }

        if text_inputs > 0 {
            let input_refs = dom.find_all(sel("text_input")).await;
            return QuestionBody::Fill {
                blank_count: input_refs.len(),
                input_refs,
            };
        }

        if dropdowns > 0 {
            let selects = self.extract_dropdown_options(dom).await;
            return QuestionBody::Dropdown { selects };
        }

        warn!("未找到可识别的答题控件");
        QuestionBody::Unknown
    }

    // ========== 题干提取 ==========

    /// 题干级联提取（首个非空结果胜出）
    async fn extract_question_text(&self, dom: &DomQuery) -> String {
        // 1. 专用题干元素
        for text in dom.texts_of(sel("question_prompt")).await {
            if !text.is_empty() {
                return text;
            }
        }

        // 2. 答题容器外的兄弟段落
        let body = format!(
            r#"
var responses = doc.querySelector({});
if (!responses) return '';
var parent = responses.parentElement;
if (!parent) return '';
var texts = [];
var allP = parent.querySelectorAll('p');
for (var i = 0; i < allP.length; i++) {{
    var p = allP[i];
    if (responses.contains(p)) continue;
    if (p.classList.contains('_visuallyHidden')) continue;
    var text = p.textContent.trim();
    if (text) texts.push(text);
}}
return texts.join(' ');"#,
            js_str(sel("responses_container"))
        );
        if let Some(text) = dom.eval_in_doc_as::<String>(&body).await {
            let text = text.trim().to_string();
            if !text.is_empty() {
                return text;
            }
        }

        // 3. 宽泛兜底：第一个单选/多选附近的标题或 legend
        let body = r#"
var inputs = doc.querySelectorAll("input[type='radio'], input[type='checkbox']");
if (inputs.length === 0) return '';
var first = inputs[0];
var container = first.closest('form') || first.closest('[class*="question"]')
    || first.closest('fieldset')
    || (first.parentElement && first.parentElement.parentElement
        ? first.parentElement.parentElement.parentElement : null);
if (!container) return '';
var selectors = ['.question-text', '.question-stem', 'legend', '.stem',
                 '[class*="question-prompt"]', '[class*="stem"]',
                 '.question_text', 'h3', 'h4'];
for (var i = 0; i < selectors.length; i++) {
    var el = container.querySelector(selectors[i]);
    if (el) {
        var t = el.textContent.trim();
        if (t && t.length > 10) return t;
    }
}
return '';"#;
        if let Some(text) = dom.eval_in_doc_as::<String>(body).await {
            let text = text.trim().to_string();
            if !text.is_empty() {
                return text;
            }
        }

        String::new()
    }

    /// 提取页面上可见的阅读材料（高亮、阅读窗格、课文段落）
    async fn extract_page_context(&self, dom: &DomQuery) -> String {
        let mut parts: Vec<String> = Vec::new();

        // 高亮文本 + 阅读窗格
        let body = r#"
var texts = [];
var marks = doc.querySelectorAll('mark, .highlight, [class*="highlight"], .marked-text');
for (var i = 0; i < marks.length; i++) {
    var t = marks[i].textContent.trim();
    if (t && t.length > 10) texts.push(t);
}
var readingPane = doc.querySelector('.reading-pane, .reader-content, [class*="reader"], [class*="reading-content"]');
if (readingPane) {
    var pTags = readingPane.querySelectorAll('p');
    for (var j = 0; j < pTags.length; j++) {
        var pt = pTags[j].textContent.trim();
        if (pt && pt.length > 20) texts.push(pt);
    }
}
return texts;"#;
        if let Some(texts) = dom.eval_in_doc_as::<Vec<String>>(body).await {
            parts.extend(texts);
        }

        // 课文容器里、答题区外的段落
        let body = format!(
            r#"
var texts = [];
var viewContainer = doc.querySelector('.view-container');
if (viewContainer) {{
    var lesson = viewContainer.querySelector('.dlc_question');
    if (lesson) {{
        var responses = lesson.querySelector({});
        var allP = lesson.querySelectorAll('p');
        for (var i = 0; i < allP.length; i++) {{
            var p = allP[i];
            if (responses && responses.contains(p)) continue;
            if (p.classList.contains('_visuallyHidden')) continue;
            if (p.closest({})) continue;
            if (p.closest('.choices-container')) continue;
            var t = p.textContent.trim();
            if (t && t.length > 15) texts.push(t);
        }}
    }}
}}
return texts;"#,
            js_str(sel("responses_container")),
            js_str(sel("responses_container"))
        );
        if let Some(texts) = dom.eval_in_doc_as::<Vec<String>>(&body).await {
            parts.extend(texts);
        }

        // 精确去重，保持出现顺序
        let mut seen = std::collections::HashSet::new();
        let unique: Vec<String> = parts
            .into_iter()
            .filter(|part| seen.insert(part.clone()))
            .collect();

        let context = unique.join("\n");
        let context = if context.chars().count() > CONTEXT_MAX_CHARS {
            truncate_text(&context, CONTEXT_MAX_CHARS)
        } else {
            context
        };

        if !context.is_empty() {
            info!("提取到 {} 字符的阅读材料", context.chars().count());
        }
        context
    }

    // ========== 选项提取 ==========

    /// 提取选择题的选项
    ///
    /// 有行容器时第 i 行配第 i 个输入；没有时走通用标签回退。
    async fn extract_choices(
        &self,
        dom: &DomQuery,
        input_selector: &str,
        input_count: usize,
        choice_rows: usize,
    ) -> Vec<Choice> {
        let texts = if choice_rows > 0 {
            self.choice_texts_from_rows(dom).await
        } else {
            self.choice_texts_generic(dom, input_selector).await
        };

        let count = if choice_rows > 0 {
            choice_rows
        } else {
            input_count
        };

        (0..count)
            .map(|i| {
                let target = if i < input_count {
                    ElementRef::new(input_selector, i)
                } else {
                    // 行数多于输入时退回点击整行
                    ElementRef::new(sel("choice_row"), i)
                };
                Choice {
                    label: choice_label(i),
                    text: texts.get(i).cloned().unwrap_or_default(),
                    target,
                }
            })
            .collect()
    }

    /// 行容器模式：专用文本子元素，缺失时取整行文本
    async fn choice_texts_from_rows(&self, dom: &DomQuery) -> Vec<String> {
        let body = format!(
            r#"
var rows = doc.querySelectorAll({});
var out = [];
for (var i = 0; i < rows.length; i++) {{
    var textEl = rows[i].querySelector({});
    var text = textEl ? textEl.textContent.trim() : '';
    if (!text) text = rows[i].textContent.trim();
    out.push(text);
}}
return out;"#,
            js_str(sel("choice_row")),
            js_str(sel("choice_text"))
        );
        dom.eval_in_doc_as::<Vec<String>>(&body)
            .await
            .unwrap_or_default()
    }

    /// 通用回退：label[for=id] → 包裹 label → 去掉隐藏后代的父元素 → 下一个兄弟
    async fn choice_texts_generic(&self, dom: &DomQuery, input_selector: &str) -> Vec<String> {
        let body = format!(
            r#"
var inputs = doc.querySelectorAll({});
var out = [];
for (var i = 0; i < inputs.length; i++) {{
    var inp = inputs[i];
    var text = '';
    if (inp.id) {{
        var lab = doc.querySelector('label[for="' + CSS.escape(inp.id) + '"]');
        if (lab) text = lab.textContent.trim();
    }}
    if (!text) {{
        var parent = inp.closest('label') || inp.parentElement;
        if (parent) {{
            var clone = parent.cloneNode(true);
            var hidden = clone.querySelectorAll('[style*="display:none"], [style*="display: none"], ._visuallyHidden');
            for (var h = 0; h < hidden.length; h++) hidden[h].remove();
            text = clone.textContent.trim();
        }}
    }}
    if (!text) {{
        var sib = inp.nextElementSibling;
        while (sib) {{
            var t = sib.textContent.trim();
            if (t) {{ text = t; break; }}
            sib = sib.nextElementSibling;
        }}
    }}
    out.push(text);
}}
return out;"#,
            js_str(input_selector)
        );
        dom.eval_in_doc_as::<Vec<String>>(&body)
            .await
            .unwrap_or_default()
    }

    /// 提取每个下拉框的候选项
    async fn extract_dropdown_options(&self, dom: &DomQuery) -> Vec<DropdownSelect> {
        let selector = sel("dropdown_select");
        let body = format!(
            r#"
var selects = doc.querySelectorAll({});
var out = [];
for (var i = 0; i < selects.length; i++) {{
    var opts = [];
    var options = selects[i].querySelectorAll('option');
    for (var j = 0; j < options.length; j++) {{
        var t = options[j].textContent.trim();
        if (t) opts.push(t);
    }}
    out.push(opts);
}}
return out;"#,
            js_str(selector)
        );
        let option_lists = dom
            .eval_in_doc_as::<Vec<Vec<String>>>(&body)
            .await
            .unwrap_or_default();

        option_lists
            .into_iter()
            .enumerate()
            .map(|(i, options)| DropdownSelect {
                options,
                target: ElementRef::new(selector, i),
            })
            .collect()
    }

    // ========== 排序 / 连线提取 ==========

    /// 排序题：抓取当前屏幕顺序作为重排基准
    async fn extract_sortable_items(&self, dom: &DomQuery) -> (Vec<String>, Vec<ElementRef>) {
        let body = format!(
            r#"
var items = doc.querySelectorAll({});
var out = [];
for (var i = 0; i < items.length; i++) {{
    var textEl = items[i].querySelector({});
    var text = textEl ? textEl.textContent.trim() : '';
    if (!text) text = items[i].textContent.trim();
    if (text) out.push(text);
}}
return out;"#,
            js_str(sel("sortable_item")),
            js_str(sel("sortable_item_text"))
        );
        let items = dom
            .eval_in_doc_as::<Vec<String>>(&body)
            .await
            .unwrap_or_default();
        let item_refs = dom.find_all(sel("sortable_item")).await;
        (items, item_refs)
    }

    /// 连线题：左侧标签、投放区、右侧可拖拽选项
    async fn extract_matching(&self, dom: &DomQuery) -> QuestionBody {
        let source_labels: Vec<String> = dom
            .texts_of(sel("matching_label"))
            .await
            .into_iter()
            .filter(|text| !text.is_empty())
            .collect();
        let source_refs = dom.find_all(sel("matching_drop_zone")).await;

        let body = format!(
            r#"
var choices = doc.querySelectorAll({});
var out = [];
for (var i = 0; i < choices.length; i++) {{
    var textEl = choices[i].querySelector({});
    var text = textEl ? textEl.textContent.trim() : '';
    if (!text) text = choices[i].textContent.trim();
    out.push(text);
}}
return out;"#,
            js_str(sel("matching_choice")),
            js_str(sel("matching_choice_text"))
        );
        let target_labels = dom
            .eval_in_doc_as::<Vec<String>>(&body)
            .await
            .unwrap_or_default();
        let target_refs = dom.find_all(sel("matching_choice")).await;

        info!(
            "连线题: {} 个标签, {} 个选项, {} 个投放区",
            source_labels.len(),
            target_labels.len(),
            source_refs.len()
        );

        QuestionBody::Matching {
            source_labels,
            target_labels,
            source_refs,
            target_refs,
        }
    }
}

impl Default for QuestionExtractor {
    fn default() -> Self {
        Self::new()
    }
}
