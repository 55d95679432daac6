//! 故意答错注入器 - 业务能力层
//!
//! 按目标正确率掷点，偶尔把正确动作换成错误的，让答题记录
//! 看起来像真人。

use rand::prelude::IndexedRandom;
use rand::Rng;
use tracing::info;

use crate::models::{Action, ActionOp, QuestionBody, QuestionData};
use crate::utils::pacing::should_miss;

/// 故意答错注入器
pub struct ErrorInjector {
    target_accuracy: f64,
}

impl ErrorInjector {
    pub fn new(target_accuracy: f64) -> Self {
        Self { target_accuracy }
    }

    /// 可能把正确动作换成错误的
    ///
    /// 返回 (动作, 是否故意答错)。只改单选和多选，其他题型原样返回。
    pub fn maybe_inject(&self, action: Action, qd: &QuestionData) -> (Action, bool) {
        if !should_miss(self.target_accuracy) {
            return (action, false);
        }
        self.inject(action, qd)
    }

    fn inject(&self, mut action: Action, qd: &QuestionData) -> (Action, bool) {
        match &qd.body {
            QuestionBody::McSingle { choices } if choices.len() > 1 => {
                let correct_letter = action.answer_text.clone();
                let wrong_choices: Vec<_> = choices
                    .iter()
                    .filter(|c| c.label.to_uppercase() != correct_letter)
                    .collect();
                if let Some(wrong) = wrong_choices.choose(&mut rand::rng()) {
                    info!("故意答错: {} -> {}", correct_letter, wrong.label);
                    action.answer_text = wrong.label.clone();
                    action.op = ActionOp::Click {
                        targets: vec![wrong.target.clone()],
                    };
                    return (action, true);
                }
                (action, false)
            }
            QuestionBody::McMulti { choices } if choices.len() > 1 => {
                if let ActionOp::MultiClick { targets } = &mut action.op {
                    if targets.len() > 1 && rand::rng().random_range(0.0..1.0) < 0.5 {
                        let idx = rand::rng().random_range(0..targets.len());
                        targets.remove(idx);
                        info!("故意答错: 从多选中去掉一个正确选项");
                        return (action, true);
                    }
                }
                (action, false)
            }
            _ => (action, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Choice, ElementRef};

    fn mc_single_question() -> QuestionData {
        QuestionData {
            prompt_text: "Test".into(),
            context_text: String::new(),
            body: QuestionBody::McSingle {
                choices: ["A", "B", "C"]
                    .iter()
                    .enumerate()
                    .map(|(i, label)| Choice {
                        label: label.to_string(),
                        text: format!("Choice {}", label),
                        target: ElementRef::new("input", i),
                    })
                    .collect(),
            },
        }
    }

    fn correct_action() -> Action {
        Action {
            answer_text: "B".into(),
            op: ActionOp::Click {
                targets: vec![ElementRef::new("input", 1)],
            },
        }
    }

    #[test]
    fn test_full_accuracy_never_misses() {
        let injector = ErrorInjector::new(1.0);
        for _ in 0..100 {
            let (action, missed) = injector.maybe_inject(correct_action(), &mc_single_question());
            assert!(!missed);
            assert_eq!(action.answer_text, "B");
        }
    }

    #[test]
    fn test_zero_accuracy_always_swaps_single_choice() {
        let injector = ErrorInjector::new(-1.0);
        for _ in 0..100 {
            let (action, missed) = injector.maybe_inject(correct_action(), &mc_single_question());
            assert!(missed);
            // 换上的一定是错误选项
            assert_ne!(action.answer_text, "B");
            match action.op {
                ActionOp::Click { targets } => {
                    assert_eq!(targets.len(), 1);
                    assert_ne!(targets[0].index, 1);
                }
                _ => panic!("应该还是 Click 动作"),
            }
        }
    }

    #[test]
    fn test_non_choice_kinds_untouched() {
        let injector = ErrorInjector::new(-1.0);
        let qd = QuestionData {
            prompt_text: "Fill".into(),
            context_text: String::new(),
            body: QuestionBody::Fill {
                input_refs: vec![ElementRef::new("input", 0)],
                blank_count: 1,
            },
        };
        let action = Action {
            answer_text: "mitosis".into(),
            op: ActionOp::MultiType {
                targets: vec![ElementRef::new("input", 0)],
                values: vec!["mitosis".into()],
            },
        };
        let (result, missed) = injector.maybe_inject(action, &qd);
        assert!(!missed);
        assert_eq!(result.answer_text, "mitosis");
    }
}
