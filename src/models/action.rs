use serde::{Deserialize, Serialize};

use crate::models::ElementRef;

/// 动作类型（用于日志和分发）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Click,
    MultiClick,
    Type,
    MultiType,
    Dropdown,
    Ordering,
    Matching,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActionKind::Click => "click",
            ActionKind::MultiClick => "multi_click",
            ActionKind::Type => "type",
            ActionKind::MultiType => "multi_type",
            ActionKind::Dropdown => "dropdown",
            ActionKind::Ordering => "ordering",
            ActionKind::Matching => "matching",
        };
        write!(f, "{}", name)
    }
}

/// 连线题的一组配对
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPair {
    pub source: String,
    pub target: String,
}

/// 动作的类型专属载荷
#[derive(Debug, Clone)]
pub enum ActionOp {
    /// 点击单个目标
    Click { targets: Vec<ElementRef> },
    /// 依次点击多个目标
    MultiClick { targets: Vec<ElementRef> },
    /// 向单个输入框写入
    Type {
        targets: Vec<ElementRef>,
        values: Vec<String>,
    },
    /// 向多个输入框依次写入
    MultiType {
        targets: Vec<ElementRef>,
        values: Vec<String>,
    },
    /// 下拉框选择
    Dropdown {
        targets: Vec<ElementRef>,
        values: Vec<String>,
    },
    /// 列表重排
    Ordering {
        /// 期望的文本顺序（来自 Oracle）
        ordered_items: Vec<String>,
        /// 提取时的基准顺序
        original_items: Vec<String>,
        /// 列表项引用（执行时重新查询）
        item_refs: Vec<ElementRef>,
    },
    /// 拖拽配对
    Matching {
        matches: Vec<MatchPair>,
        /// 左侧标签文本（与投放区对齐）
        source_labels: Vec<String>,
        /// 投放区引用
        drop_zones: Vec<ElementRef>,
    },
}

/// 解释器产出的可执行动作
///
/// `targets`/`item_refs` 里只有引用，底层元素可能已被重渲染，
/// 执行器必须容忍失效并重新查询。
#[derive(Debug, Clone)]
pub struct Action {
    /// 人类可读的答案摘要（用于日志）
    pub answer_text: String,
    pub op: ActionOp,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match &self.op {
            ActionOp::Click { .. } => ActionKind::Click,
            ActionOp::MultiClick { .. } => ActionKind::MultiClick,
            ActionOp::Type { .. } => ActionKind::Type,
            ActionOp::MultiType { .. } => ActionKind::MultiType,
            ActionOp::Dropdown { .. } => ActionKind::Dropdown,
            ActionOp::Ordering { .. } => ActionKind::Ordering,
            ActionOp::Matching { .. } => ActionKind::Matching,
        }
    }

    /// 动作是否没有任何可执行内容（循环据此跳过）
    pub fn is_empty(&self) -> bool {
        match &self.op {
            ActionOp::Click { targets } | ActionOp::MultiClick { targets } => targets.is_empty(),
            ActionOp::Type { targets, values }
            | ActionOp::MultiType { targets, values }
            | ActionOp::Dropdown { targets, values } => targets.is_empty() || values.is_empty(),
            ActionOp::Ordering { ordered_items, .. } => ordered_items.is_empty(),
            ActionOp::Matching { matches, .. } => matches.is_empty(),
        }
    }
}
