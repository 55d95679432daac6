use serde::{Deserialize, Serialize};

use crate::models::ElementRef;

/// 题目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    /// 单选
    McSingle,
    /// 多选
    McMulti,
    /// 填空
    Fill,
    /// 下拉选择
    Dropdown,
    /// 排序
    Ordering,
    /// 连线匹配
    Matching,
    /// 无法识别
    Unknown,
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            QuestionKind::McSingle => "mc_single",
            QuestionKind::McMulti => "mc_multi",
            QuestionKind::Fill => "fill",
            QuestionKind::Dropdown => "dropdown",
            QuestionKind::Ordering => "ordering",
            QuestionKind::Matching => "matching",
            QuestionKind::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// 单个选项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// 选项标号（A、B、C……超过 J 后用数字）
    pub label: String,
    /// 选项文本
    pub text: String,
    /// 可点击目标
    pub target: ElementRef,
}

/// 一个下拉框及其候选项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropdownSelect {
    pub options: Vec<String>,
    pub target: ElementRef,
}

/// 题目的类型专属数据
///
/// 每个变体只携带本类型需要的字段，其他类型的字段不可表达。
#[derive(Debug, Clone)]
pub enum QuestionBody {
    McSingle {
        choices: Vec<Choice>,
    },
    McMulti {
        choices: Vec<Choice>,
    },
    Fill {
        input_refs: Vec<ElementRef>,
        blank_count: usize,
    },
    Dropdown {
        selects: Vec<DropdownSelect>,
    },
    Ordering {
        /// 当前屏幕上的顺序（重排基准）
        items: Vec<String>,
        item_refs: Vec<ElementRef>,
    },
    Matching {
        /// 左侧固定标签
        source_labels: Vec<String>,
        /// 右侧可拖拽选项文本
        target_labels: Vec<String>,
        /// 投放区引用（与 source_labels 对齐）
        source_refs: Vec<ElementRef>,
        /// 可拖拽元素引用（与 target_labels 对齐）
        target_refs: Vec<ElementRef>,
    },
    Unknown,
}

/// 一道题的结构化描述
///
/// 由提取器创建，经 Oracle 和解释器消费，答完即丢弃。
#[derive(Debug, Clone)]
pub struct QuestionData {
    /// 题干文本（可能为空）
    pub prompt_text: String,
    /// 配套阅读材料，去重后截断到 2000 字符
    pub context_text: String,
    pub body: QuestionBody,
}

impl QuestionData {
    pub fn unknown() -> Self {
        Self {
            prompt_text: String::new(),
            context_text: String::new(),
            body: QuestionBody::Unknown,
        }
    }

    pub fn kind(&self) -> QuestionKind {
        match &self.body {
            QuestionBody::McSingle { .. } => QuestionKind::McSingle,
            QuestionBody::McMulti { .. } => QuestionKind::McMulti,
            QuestionBody::Fill { .. } => QuestionKind::Fill,
            QuestionBody::Dropdown { .. } => QuestionKind::Dropdown,
            QuestionBody::Ordering { .. } => QuestionKind::Ordering,
            QuestionBody::Matching { .. } => QuestionKind::Matching,
            QuestionBody::Unknown => QuestionKind::Unknown,
        }
    }

    /// 取选择题的选项列表（其他类型返回空）
    pub fn choices(&self) -> &[Choice] {
        match &self.body {
            QuestionBody::McSingle { choices } | QuestionBody::McMulti { choices } => choices,
            _ => &[],
        }
    }
}

/// 选项标号序列：A、B、…、J，之后退化为 11、12、…
pub fn choice_label(index: usize) -> String {
    const LABELS: &[u8] = b"ABCDEFGHIJ";
    if index < LABELS.len() {
        (LABELS[index] as char).to_string()
    } else {
        (index + 1).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_defaults() {
        let qd = QuestionData::unknown();
        assert_eq!(qd.kind(), QuestionKind::Unknown);
        assert!(qd.prompt_text.is_empty());
        assert!(qd.choices().is_empty());
    }

    #[test]
    fn test_kind_matches_body() {
        let qd = QuestionData {
            prompt_text: "test".into(),
            context_text: String::new(),
            body: QuestionBody::Fill {
                input_refs: vec![ElementRef::new("input", 0)],
                blank_count: 1,
            },
        };
        assert_eq!(qd.kind(), QuestionKind::Fill);
    }

    #[test]
    fn test_choice_labels() {
        assert_eq!(choice_label(0), "A");
        assert_eq!(choice_label(9), "J");
        assert_eq!(choice_label(10), "11");
    }
}
