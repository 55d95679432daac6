//! 浏览器联动集成测试
//!
//! 需要一个开着调试端口的 Chrome：
//! `chrome --remote-debugging-port=9222`
//! 然后手动运行：`cargo test -- --ignored`
//!
//! 用合成页面验证分类器优先级、提取器互斥性和多选题全流程。

use chromiumoxide::{Browser, Page};
use futures::StreamExt;

use quiz_auto_solver::infrastructure::DomQuery;
use quiz_auto_solver::models::{ActionOp, PageState, QuestionBody, QuestionKind};
use quiz_auto_solver::services::interpreter::interpret;
use quiz_auto_solver::services::{ActionExecutor, PageClassifier, QuestionExtractor};
use quiz_auto_solver::utils::Pacing;

/// 连接调试端口上的浏览器并建一个空白测试页
async fn new_test_page(html: &str) -> (Browser, DomQuery) {
    let (browser, mut handler) = Browser::connect("http://localhost:9222")
        .await
        .expect("连接浏览器失败，请先以 --remote-debugging-port=9222 启动 Chrome");

    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    let page: Page = browser
        .new_page("about:blank")
        .await
        .expect("创建页面失败");
    page.set_content(html).await.expect("写入页面内容失败");

    (browser, DomQuery::new(page))
}

// ========== 分类器优先级 ==========

#[tokio::test]
#[ignore]
async fn test_recharge_beats_reading() {
    // 同时摆出资源托盘（带 continue 文案）和导航栏 + 阅读按钮，
    // recharge 必须赢
    let html = r#"
        <html><body>
            <button data-automation-id="lr-tray_button">Continue to concept</button>
            <awd-navigation-bar></awd-navigation-bar>
            <button class="reading-button">Next</button>
        </body></html>"#;
    let (_browser, dom) = new_test_page(html).await;

    let state = PageClassifier::new().classify(&dom).await;
    assert_eq!(state, PageState::Recharge);
}

#[tokio::test]
#[ignore]
async fn test_question_beats_reading() {
    // 题目信号（radio）优先于导航栏 + 阅读按钮
    let html = r#"
        <html><body>
            <awd-navigation-bar></awd-navigation-bar>
            <button class="reading-button">Next</button>
            <div class="responses-container">
                <input type="radio" name="q"><label>Yes</label>
            </div>
        </body></html>"#;
    let (_browser, dom) = new_test_page(html).await;

    let state = PageClassifier::new().classify(&dom).await;
    assert_eq!(state, PageState::Question);
}

#[tokio::test]
#[ignore]
async fn test_content_page_detected() {
    // 只有显眼的 Continue 按钮、没有题目信号 → content
    let html = r#"
        <html><body>
            <h2>Key Terms</h2>
            <button class="btn-primary">Continue</button>
        </body></html>"#;
    let (_browser, dom) = new_test_page(html).await;

    let state = PageClassifier::new().classify(&dom).await;
    assert_eq!(state, PageState::Content);
}

#[tokio::test]
#[ignore]
async fn test_loading_beats_everything() {
    let html = r#"
        <html><body>
            <div class="loader"></div>
            <input type="radio" name="q">
            <button class="btn-primary">Continue</button>
        </body></html>"#;
    let (_browser, dom) = new_test_page(html).await;

    let state = PageClassifier::new().classify(&dom).await;
    assert_eq!(state, PageState::Loading);
}

// ========== 提取器互斥性 ==========

#[tokio::test]
#[ignore]
async fn test_extractor_mc_single_exclusive() {
    let html = r#"
        <html><body>
            <div class="prompt">Which planet is closest to the sun?</div>
            <div class="responses-container">
                <div class="choice-row">
                    <input class="form-check-input" type="radio" name="q">
                    <span class="choiceText">Venus</span>
                </div>
                <div class="choice-row">
                    <input class="form-check-input" type="radio" name="q">
                    <span class="choiceText">Mercury</span>
                </div>
            </div>
        </body></html>"#;
    let (_browser, dom) = new_test_page(html).await;

    let qd = QuestionExtractor::new().extract(&dom).await;
    assert_eq!(qd.kind(), QuestionKind::McSingle);
    assert_eq!(qd.prompt_text, "Which planet is closest to the sun?");
    match &qd.body {
        QuestionBody::McSingle { choices } => {
            assert_eq!(choices.len(), 2);
            assert_eq!(choices[0].label, "A");
            assert_eq!(choices[0].text, "Venus");
            assert_eq!(choices[1].label, "B");
            assert_eq!(choices[1].text, "Mercury");
        }
        other => panic!("应该是 McSingle，实际是 {:?}", other),
    }
}

#[tokio::test]
#[ignore]
async fn test_extractor_ordering_wins_over_choices() {
    // 排序容器存在时即使页面上还有别的输入，也判为 ordering
    let html = r#"
        <html><body>
            <div class="sortable-component">
                <div class="responses-container">
                    <div class="choice-item" data-react-beautiful-dnd-draggable="0">
                        <div class="content"><p>First step</p></div>
                    </div>
                    <div class="choice-item" data-react-beautiful-dnd-draggable="0">
                        <div class="content"><p>Second step</p></div>
                    </div>
                </div>
            </div>
            <input type="text" class="form-control">
        </body></html>"#;
    let (_browser, dom) = new_test_page(html).await;

    let qd = QuestionExtractor::new().extract(&dom).await;
    assert_eq!(qd.kind(), QuestionKind::Ordering);
    match &qd.body {
        QuestionBody::Ordering { items, item_refs } => {
            assert_eq!(items, &vec!["First step".to_string(), "Second step".to_string()]);
            assert_eq!(item_refs.len(), 2);
        }
        other => panic!("应该是 Ordering，实际是 {:?}", other),
    }
}

#[tokio::test]
#[ignore]
async fn test_extractor_fill_blanks() {
    let html = r#"
        <html><body>
            <div class="prompt">Fill in the two blanks.</div>
            <input type="text" class="form-control">
            <input type="text" class="form-control">
        </body></html>"#;
    let (_browser, dom) = new_test_page(html).await;

    let qd = QuestionExtractor::new().extract(&dom).await;
    assert_eq!(qd.kind(), QuestionKind::Fill);
    match &qd.body {
        QuestionBody::Fill {
            input_refs,
            blank_count,
        } => {
            assert_eq!(*blank_count, 2);
            assert_eq!(input_refs.len(), 2);
        }
        other => panic!("应该是 Fill，实际是 {:?}", other),
    }
}

// ========== 多选题全流程 ==========

#[tokio::test]
#[ignore]
async fn test_mc_multi_end_to_end() {
    let html = r#"
        <html><body>
            <div class="prompt">Select all prime numbers.</div>
            <div class="responses-container">
                <div class="choice-row">
                    <input class="form-check-input" type="checkbox" id="c0">
                    <span class="choiceText">Four</span>
                </div>
                <div class="choice-row">
                    <input class="form-check-input" type="checkbox" id="c1">
                    <span class="choiceText">Five</span>
                </div>
                <div class="choice-row">
                    <input class="form-check-input" type="checkbox" id="c2">
                    <span class="choiceText">Six</span>
                </div>
                <div class="choice-row">
                    <input class="form-check-input" type="checkbox" id="c3">
                    <span class="choiceText">Seven</span>
                </div>
            </div>
        </body></html>"#;
    let (_browser, dom) = new_test_page(html).await;

    // 提取
    let qd = QuestionExtractor::new().extract(&dom).await;
    assert_eq!(qd.kind(), QuestionKind::McMulti);

    // 解释带思维链的回复
    let action = interpret("Thinking...\nANSWER: B, D", &qd);
    match &action.op {
        ActionOp::MultiClick { targets } => {
            assert_eq!(targets.len(), 2);
            assert_eq!(targets[0].index, 1);
            assert_eq!(targets[1].index, 3);
        }
        other => panic!("应该是 MultiClick，实际是 {:?}", other),
    }

    // 执行后 B、D 两个勾选框应当被选中
    let executor = ActionExecutor::new(Pacing::fixed_zero());
    executor.execute(&action, &dom).await;

    let checked = dom
        .eval_in_doc_as::<Vec<bool>>(
            r#"
var inputs = doc.querySelectorAll("input[type='checkbox']");
var out = [];
for (var i = 0; i < inputs.length; i++) out.push(inputs[i].checked);
return out;"#,
        )
        .await
        .expect("读取勾选状态失败");
    assert_eq!(checked, vec![false, true, false, true]);
}
