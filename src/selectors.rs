//! 页面选择器表
//!
//! 目标应用的所有 CSS 选择器集中在这里，与解析逻辑分离，
//! 页面改版时只需要改这一个文件。

use phf::phf_map;

/// 选择器静态表（逻辑名 -> CSS 选择器）
static SELECTORS: phf::Map<&'static str, &'static str> = phf_map! {
    // 题目元素
    "question_prompt" => ".prompt",
    "responses_container" => ".responses-container",
    "question_fieldset" => ".multiple-choice-fieldset, .true-false-fieldset",
    "choice_row" => ".choice-row",
    "choice_radio" => "input.form-check-input[type='radio']",
    "choice_checkbox" => "input.form-check-input[type='checkbox']",
    "choice_text" => ".choiceText",
    "radio_any" => "input[type='radio']",
    "checkbox_any" => "input[type='checkbox']",

    // 填空题
    "text_input" => "input[type='text'], textarea, input.form-control, input.fitb-input",
    "dropdown_select" => "select, select.form-select",

    // 排序题（react-beautiful-dnd 列表）
    "sortable_component" => ".sortable-component, [class*='probe-type-sortable']",
    "sortable_item" => ".sortable-component .responses-container .choice-item[data-react-beautiful-dnd-draggable]",
    "sortable_item_text" => ".content p",

    // 连线题（拖拽匹配）
    "matching_component" => ".matching-component, [class*='probe-type-matching'], [class*='probe-type-categorize']",
    "matching_label" => ".matching-component .match-row .match-prompt-label .content p",
    "matching_drop_zone" => ".matching-component .match-row .match-single-response-wrapper",
    "matching_choice" => ".matching-component .choices-container .choice-item-wrapper",
    "matching_choice_text" => ".content p",

    // 信心按钮（兼做提交 + 下一步）
    "confidence_high" => "button.btn-confidence:nth-child(1)",
    "confidence_medium" => "button.btn-confidence:nth-child(2)",
    "confidence_low" => "button.btn-confidence:nth-child(3)",
    "confidence_any" => "button.btn-confidence",

    // 阅读页按钮
    "reading_button" => "button.reading-button",

    // 概念资源页（recharge）
    "recharge_tray_button" => "button[data-automation-id='lr-tray_button'], button.lr-tray-expand-button",
    "read_about_concept" => ".lr__action-label",
    "to_questions_button" => "button[data-automation-id='reading-questions-button']",

    // 页面状态指示
    "complete_indicator" => "[class*='score-summary'], [class*='assignment-complete'], [class*='completion'], [class*='results-container']",
    "loading_spinner" => "[class*='spinner'], .loader, [class*='loading-indicator']",

    // 导航栏（答题期间始终存在）
    "nav_bar" => "awd-navigation-bar, .main-container__navigation-bar",

    // 下一题按钮（答完后出现）
    "next_question" => "button.next-button, button.btn-primary.next-button",
};

/// 按逻辑名查选择器，未登记的名字返回空串（视为"元素不存在"）
pub fn sel(name: &str) -> &'static str {
    SELECTORS.get(name).copied().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_selector() {
        assert_eq!(sel("question_prompt"), ".prompt");
        assert!(sel("sortable_item").contains("data-react-beautiful-dnd-draggable"));
    }

    #[test]
    fn test_unknown_selector_is_empty() {
        assert_eq!(sel("no_such_name"), "");
    }

    #[test]
    fn test_all_selectors_nonempty() {
        for (name, css) in SELECTORS.entries() {
            assert!(!css.is_empty(), "选择器 {} 为空", name);
        }
    }
}
