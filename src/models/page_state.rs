use std::fmt;

/// 页面状态
///
/// 每次轮询重新计算，不携带任何身份信息。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    /// 页面加载中
    Loading,
    /// 作业已完成（出现成绩总结）
    Complete,
    /// 强制复习概念资源页
    Recharge,
    /// 阅读页（导航栏 + 阅读按钮）
    Reading,
    /// 过渡内容页（视频/导语，带 Continue 按钮）
    Content,
    /// 题目页
    Question,
    /// 无法识别
    Unknown,
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageState::Loading => "loading",
            PageState::Complete => "complete",
            PageState::Recharge => "recharge",
            PageState::Reading => "reading",
            PageState::Content => "content",
            PageState::Question => "question",
            PageState::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}
