use serde::{Deserialize, Serialize};

/// 可重解析的元素引用
///
/// 不持有任何活动节点句柄，只记录"选择器 + 位置序号"，
/// 使用时重新查询。页面重渲染后旧引用依然可以解析到
/// 同一逻辑位置的元素。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRef {
    /// CSS 选择器
    pub selector: String,
    /// 在 querySelectorAll 结果中的序号
    pub index: usize,
}

impl ElementRef {
    pub fn new(selector: impl Into<String>, index: usize) -> Self {
        Self {
            selector: selector.into(),
            index,
        }
    }
}

impl std::fmt::Display for ElementRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.selector, self.index)
    }
}
