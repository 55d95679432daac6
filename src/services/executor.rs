//! 动作执行器 - 业务能力层
//!
//! 把 Action 变成页面上的一串具体交互。目标前端只认特定的
//! 原生事件序列（框架的事件 zone 会拦截普通的程序化赋值），
//! 所以每类控件都有自己固定的合成事件序列：
//! - 点击类：pointerdown → mousedown → pointerup → mouseup → click
//! - 输入类：原生 setter 赋值 + input/change/keyup/blur
//! - 下拉类：选中 option + input/change
//!
//! 单项失败（引用失效、匹配不上）记日志后跳过，
//! 不影响同一动作里的其余条目。

use tokio::time::sleep;
use tracing::{info, warn};

use crate::infrastructure::{dom_query::js_str, DomQuery};
use crate::models::{Action, ActionOp, ElementRef, MatchPair};
use crate::selectors::sel;
use crate::utils::Pacing;

/// 重排时标记被拖拽元素用的属性（按住期间列表会重排，
/// 序号会失效，属性不会）
const DRAG_MARK_ATTR: &str = "data-reorder-active";

/// 动作执行器
pub struct ActionExecutor {
    pacing: Pacing,
}

impl ActionExecutor {
    pub fn new(pacing: Pacing) -> Self {
        Self { pacing }
    }

    /// 执行一个动作（尽力而为，不向上抛错）
    pub async fn execute(&self, action: &Action, dom: &DomQuery) {
        match &action.op {
            ActionOp::Click { targets } => {
                if let Some(target) = targets.first() {
                    self.click_choice(dom, target).await;
                }
            }
            ActionOp::MultiClick { targets } => {
                for target in targets {
                    self.click_choice(dom, target).await;
                    sleep(self.pacing.sample(0.3, 0.8)).await;
                }
            }
            ActionOp::Type { targets, values } | ActionOp::MultiType { targets, values } => {
                self.type_values(dom, targets, values).await;
            }
            ActionOp::Dropdown { targets, values } => {
                self.select_dropdowns(dom, targets, values).await;
            }
            ActionOp::Ordering {
                ordered_items,
                original_items,
                item_refs,
            } => {
                self.reorder(dom, ordered_items, original_items, item_refs)
                    .await;
            }
            ActionOp::Matching {
                matches,
                source_labels,
                drop_zones,
            } => {
                self.match_pairs(dom, matches, source_labels, drop_zones)
                    .await;
            }
        }
    }

    // ========== 点击 ==========

    /// 点击一个选项：完整的合成鼠标序列 + checked 兜底 + zone 激活
    async fn click_choice(&self, dom: &DomQuery, target: &ElementRef) {
        sleep(self.pacing.sample(0.2, 0.5)).await;
        let body = format!(
            r#"
var el = doc.querySelectorAll({})[{}];
if (!el) return false;
var win = doc.defaultView || window;
var input = el;
if (el.tagName !== 'INPUT') {{
    input = el.querySelector("input[type='radio'], input[type='checkbox']");
}}
var label = null;
if (input && input.id) {{
    label = doc.querySelector('label[for="' + CSS.escape(input.id) + '"]');
}}
if (!label && input) {{
    label = input.closest('label');
}}
var choice = el.closest('.choice') || el.closest('.choice-row');
var clickTarget = label || choice || input || el;

var rect = clickTarget.getBoundingClientRect();
var opts = {{bubbles: true, cancelable: true, view: win,
            clientX: rect.left + rect.width / 2,
            clientY: rect.top + rect.height / 2, button: 0}};
clickTarget.dispatchEvent(new win.PointerEvent('pointerdown', opts));
clickTarget.dispatchEvent(new win.MouseEvent('mousedown', opts));
clickTarget.dispatchEvent(new win.PointerEvent('pointerup', opts));
clickTarget.dispatchEvent(new win.MouseEvent('mouseup', opts));
clickTarget.dispatchEvent(new win.MouseEvent('click', opts));

if (input && !input.checked) {{
    input.checked = true;
    input.dispatchEvent(new win.Event('change', {{ bubbles: true }}));
    input.dispatchEvent(new win.Event('input', {{ bubbles: true }}));
}}
try {{
    var testabilities = win.getAllAngularTestabilities && win.getAllAngularTestabilities();
    if (testabilities && testabilities.length > 0) {{
        testabilities[0]._ngZone.run(function() {{}});
    }}
}} catch (e) {{}}
return true;"#,
            js_str(&target.selector),
            target.index
        );
        match dom.eval_in_doc_as::<bool>(&body).await {
            Some(true) => {}
            _ => warn!("点击目标失效，跳过: {}", target),
        }
    }

    // ========== 输入 ==========

    /// 向一组输入框依次写入
    async fn type_values(&self, dom: &DomQuery, targets: &[ElementRef], values: &[String]) {
        let count = targets.len().min(values.len());
        for i in 0..count {
            let target = &targets[i];
            let value = &values[i];

            let focus_body = format!(
                r#"
var el = doc.querySelectorAll({})[{}];
if (!el) return false;
el.focus();
el.click();
return true;"#,
                js_str(&target.selector),
                target.index
            );
            if dom.eval_in_doc_as::<bool>(&focus_body).await != Some(true) {
                warn!("输入目标失效，跳过: {}", target);
                continue;
            }
            sleep(self.pacing.sample(0.3, 0.6)).await;

            // 原生 setter 赋值，绕过框架对 value 属性的包装
            let write_body = format!(
                r#"
var el = doc.querySelectorAll({})[{}];
if (!el) return false;
var win = doc.defaultView || window;
var text = {};
el.value = '';
var proto = el.tagName === 'TEXTAREA'
    ? win.HTMLTextAreaElement.prototype
    : win.HTMLInputElement.prototype;
var setter = Object.getOwnPropertyDescriptor(proto, 'value').set;
setter.call(el, text);
el.dispatchEvent(new win.Event('input', {{ bubbles: true }}));
el.dispatchEvent(new win.Event('change', {{ bubbles: true }}));
el.dispatchEvent(new win.KeyboardEvent('keyup', {{ bubbles: true }}));
el.dispatchEvent(new win.Event('blur', {{ bubbles: true }}));
return true;"#,
                js_str(&target.selector),
                target.index,
                js_str(value)
            );
            if dom.eval_in_doc_as::<bool>(&write_body).await != Some(true) {
                warn!("写入 '{}' 失败，跳过", value);
            }

            if i < count - 1 {
                sleep(self.pacing.sample(0.5, 1.2)).await;
            }
        }
    }

    // ========== 下拉 ==========

    /// 按可见文本选中每个下拉框的选项（精确匹配优先，失败再做包含匹配）
    async fn select_dropdowns(&self, dom: &DomQuery, targets: &[ElementRef], values: &[String]) {
        let count = targets.len().min(values.len());
        for i in 0..count {
            let target = &targets[i];
            let value = &values[i];
            let body = format!(
                r#"
var el = doc.querySelectorAll({})[{}];
if (!el || el.tagName !== 'SELECT') return false;
var win = doc.defaultView || window;
var value = {};
var lower = value.toLowerCase();
var matched = -1;
for (var j = 0; j < el.options.length; j++) {{
    if (el.options[j].text.trim() === value) {{ matched = j; break; }}
}}
if (matched === -1) {{
    for (var j = 0; j < el.options.length; j++) {{
        if (el.options[j].text.trim().toLowerCase().indexOf(lower) !== -1) {{
            matched = j;
            break;
        }}
    }}
}}
if (matched === -1) return false;
el.selectedIndex = matched;
el.dispatchEvent(new win.Event('input', {{ bubbles: true }}));
el.dispatchEvent(new win.Event('change', {{ bubbles: true }}));
return true;"#,
                js_str(&target.selector),
                target.index,
                js_str(value)
            );
            if dom.eval_in_doc_as::<bool>(&body).await != Some(true) {
                warn!("下拉框选不到 '{}'，跳过", value);
            }
            if i < count - 1 {
                sleep(self.pacing.sample(0.3, 0.8)).await;
            }
        }
    }

    // ========== 重排 ==========

    /// 用键盘"拿起/移动/放下"协议重排列表
    async fn reorder(
        &self,
        dom: &DomQuery,
        ordered_items: &[String],
        original_items: &[String],
        item_refs: &[ElementRef],
    ) {
        if ordered_items.is_empty() || item_refs.is_empty() {
            warn!("排序: 没有可重排的列表项");
            return;
        }

        let desired_order = match build_desired_order(ordered_items, original_items) {
            Some(order) => order,
            None => {
                warn!(
                    "排序: 匹配不完整（{} 项里匹配到 {} 项），放弃重排",
                    original_items.len(),
                    count_matched(ordered_items, original_items)
                );
                return;
            }
        };

        if is_identity(&desired_order) {
            info!("排序: 当前顺序已经正确");
            return;
        }

        let (moves, _) = plan_moves(&desired_order);
        for step in &moves {
            if !self.perform_move(dom, step).await {
                warn!("排序: 位置 {} 的移动失败，继续后面的移动", step.from_slot);
            }
            info!("排序: 从位置 {} 移到位置 {}", step.from_slot, step.to_slot);
        }

        info!("排序: 重排 {} 项完成", desired_order.len());
    }

    /// 执行一次单项移动（拿起 → N 步 → 放下）
    ///
    /// 前面的移动会挪动别的元素，所以每次都重新查询当前列表；
    /// 拿起期间用属性标记元素，拖拽过程中序号会变而属性不变。
    async fn perform_move(&self, dom: &DomQuery, step: &MoveStep) -> bool {
        let selector = sel("sortable_item");
        let acquire = format!(
            r#"
var items = doc.querySelectorAll({});
if ({} >= items.length) return false;
var el = items[{}];
el.setAttribute('{}', '1');
el.focus();
return true;"#,
            js_str(selector),
            step.from_slot,
            step.from_slot,
            DRAG_MARK_ATTR
        );
        if dom.eval_in_doc_as::<bool>(&acquire).await != Some(true) {
            return false;
        }
        sleep(self.pacing.sample(0.2, 0.4)).await;

        // 拿起
        if !self.press_marked_key(dom, " ", "Space", 32).await {
            self.clear_drag_mark(dom).await;
            return false;
        }
        sleep(self.pacing.sample(0.3, 0.6)).await;

        // 逐步移动
        let (key, code, key_code) = if step.from_slot > step.to_slot {
            ("ArrowUp", "ArrowUp", 38)
        } else {
            ("ArrowDown", "ArrowDown", 40)
        };
        for _ in 0..step.distance() {
            self.press_marked_key(dom, key, code, key_code).await;
            sleep(self.pacing.sample(0.15, 0.35)).await;
        }

        // 放下
        self.press_marked_key(dom, " ", "Space", 32).await;
        sleep(self.pacing.sample(0.3, 0.7)).await;

        self.clear_drag_mark(dom).await;
        true
    }

    /// 向被标记的元素派发一次按键
    async fn press_marked_key(&self, dom: &DomQuery, key: &str, code: &str, key_code: u32) -> bool {
        let body = format!(
            r#"
var el = doc.querySelector('[{}="1"]');
if (!el) return false;
var win = doc.defaultView || window;
var opts = {{bubbles: true, cancelable: true,
            key: {}, code: {}, keyCode: {}, which: {}}};
el.dispatchEvent(new win.KeyboardEvent('keydown', opts));
el.dispatchEvent(new win.KeyboardEvent('keyup', opts));
return true;"#,
            DRAG_MARK_ATTR,
            js_str(key),
            js_str(code),
            key_code,
            key_code
        );
        dom.eval_in_doc_as::<bool>(&body).await == Some(true)
    }

    async fn clear_drag_mark(&self, dom: &DomQuery) {
        let body = format!(
            r#"
var el = doc.querySelector('[{}="1"]');
if (el) el.removeAttribute('{}');
return true;"#,
            DRAG_MARK_ATTR, DRAG_MARK_ATTR
        );
        let _ = dom.eval_in_doc(&body).await;
    }

    // ========== 连线 ==========

    /// 把每个选项拖到对应的投放区
    async fn match_pairs(
        &self,
        dom: &DomQuery,
        matches: &[MatchPair],
        source_labels: &[String],
        drop_zones: &[ElementRef],
    ) {
        if matches.is_empty() || drop_zones.is_empty() {
            warn!("连线: 没有配对或投放区");
            return;
        }

        for pair in matches {
            // 用左侧标签定位投放区
            let drop_idx = match fuzzy_contain(&pair.source, source_labels) {
                Some(idx) if idx < drop_zones.len() => idx,
                _ => {
                    warn!("连线: 找不到 '{}' 的投放区，跳过", pair.source);
                    continue;
                }
            };

            // 每次拖拽后剩余选项会重渲染，必须重新查询
            let fresh_texts = self.fresh_choice_texts(dom).await;
            let choice_idx = match fuzzy_contain(&pair.target, &fresh_texts) {
                Some(idx) => idx,
                None => {
                    warn!("连线: 找不到选项 '{}'，跳过", pair.target);
                    continue;
                }
            };

            if self
                .drag_choice_to_zone(dom, choice_idx, &drop_zones[drop_idx])
                .await
            {
                sleep(self.pacing.sample(0.5, 1.2)).await;
                info!("连线: '{}' -> '{}'", pair.target, pair.source);
            } else {
                warn!("连线: '{}' 的拖拽失败，跳过", pair.source);
            }
        }

        info!("连线: 处理 {} 组配对完成", matches.len());
    }

    /// 重新查询当前的可拖拽选项文本
    async fn fresh_choice_texts(&self, dom: &DomQuery) -> Vec<String> {
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
        dom.eval_in_doc_as::<Vec<String>>(&body)
            .await
            .unwrap_or_default()
    }

    /// 模拟人手拖拽：移入 → 按住 → 轻微上移 → 移到目标 → 松开
    async fn drag_choice_to_zone(
        &self,
        dom: &DomQuery,
        choice_idx: usize,
        drop_zone: &ElementRef,
    ) -> bool {
        // 先取两端中心坐标
        let body = format!(
            r#"
var choice = doc.querySelectorAll({})[{}];
var zone = doc.querySelectorAll({})[{}];
if (!choice || !zone) return null;
var cr = choice.getBoundingClientRect();
var zr = zone.getBoundingClientRect();
return {{
    sx: cr.left + cr.width / 2, sy: cr.top + cr.height / 2,
    tx: zr.left + zr.width / 2, ty: zr.top + zr.height / 2
}};"#,
            js_str(sel("matching_choice")),
            choice_idx,
            js_str(&drop_zone.selector),
            drop_zone.index
        );
        let coords = match dom
            .eval_in_doc_as::<serde_json::Value>(&body)
            .await
            .filter(|v| !v.is_null())
        {
            Some(v) => v,
            None => return false,
        };
        let (sx, sy) = (coords["sx"].as_f64().unwrap_or(0.0), coords["sy"].as_f64().unwrap_or(0.0));
        let (tx, ty) = (coords["tx"].as_f64().unwrap_or(0.0), coords["ty"].as_f64().unwrap_or(0.0));

        // 移到起点
        self.fire_mouse(dom, "mousemove", choice_idx, sx, sy).await;
        sleep(self.pacing.sample(0.15, 0.3)).await;
        // 按住
        if !self.fire_press(dom, choice_idx, sx, sy).await {
            return false;
        }
        sleep(self.pacing.sample(0.3, 0.5)).await;
        // 轻微上移，触发拖拽阈值
        self.fire_window_move(dom, sx, sy - 10.0).await;
        sleep(self.pacing.sample(0.15, 0.3)).await;
        // 移到目标
        self.fire_window_move(dom, tx, ty).await;
        sleep(self.pacing.sample(0.25, 0.4)).await;
        // 松开
        self.fire_release(dom, tx, ty).await;
        true
    }

    async fn fire_mouse(&self, dom: &DomQuery, event: &str, choice_idx: usize, x: f64, y: f64) {
        let body = format!(
            r#"
var el = doc.querySelectorAll({})[{}];
if (!el) return false;
var win = doc.defaultView || window;
var opts = {{bubbles: true, cancelable: true, view: win,
            clientX: {x}, clientY: {y}, button: 0}};
el.dispatchEvent(new win.MouseEvent({}, opts));
return true;"#,
            js_str(sel("matching_choice")),
            choice_idx,
            js_str(event)
        );
        let _ = dom.eval_in_doc(&body).await;
    }

    async fn fire_press(&self, dom: &DomQuery, choice_idx: usize, x: f64, y: f64) -> bool {
        let body = format!(
            r#"
var el = doc.querySelectorAll({})[{}];
if (!el) return false;
var win = doc.defaultView || window;
var opts = {{bubbles: true, cancelable: true, view: win,
            clientX: {x}, clientY: {y}, button: 0}};
el.dispatchEvent(new win.PointerEvent('pointerdown', opts));
el.dispatchEvent(new win.MouseEvent('mousedown', opts));
return true;"#,
            js_str(sel("matching_choice")),
            choice_idx
        );
        dom.eval_in_doc_as::<bool>(&body).await == Some(true)
    }

    async fn fire_window_move(&self, dom: &DomQuery, x: f64, y: f64) {
        let body = format!(
            r#"
var win = doc.defaultView || window;
var opts = {{bubbles: true, cancelable: true, view: win,
            clientX: {x}, clientY: {y}, button: 0}};
win.dispatchEvent(new win.PointerEvent('pointermove', opts));
win.dispatchEvent(new win.MouseEvent('mousemove', opts));
return true;"#
        );
        let _ = dom.eval_in_doc(&body).await;
    }

    async fn fire_release(&self, dom: &DomQuery, x: f64, y: f64) {
        let body = format!(
            r#"
var win = doc.defaultView || window;
var opts = {{bubbles: true, cancelable: true, view: win,
            clientX: {x}, clientY: {y}, button: 0}};
win.dispatchEvent(new win.PointerEvent('pointerup', opts));
win.dispatchEvent(new win.MouseEvent('mouseup', opts));
return true;"#
        );
        let _ = dom.eval_in_doc(&body).await;
    }
}

// ========== 纯逻辑部分（与页面无关，可独立测试） ==========

/// 一次单项移动
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveStep {
    /// 移动前所在槽位
    pub from_slot: usize,
    /// 目标槽位
    pub to_slot: usize,
}

impl MoveStep {
    pub fn distance(&self) -> usize {
        self.from_slot.abs_diff(self.to_slot)
    }
}

/// 模糊匹配：大小写不敏感的精确命中直接返回；否则双向包含按
/// `min(len)/max(len)` 打分，取 0.5 以上的最高分
pub fn fuzzy_match(needle: &str, haystack: &[String]) -> Option<usize> {
    let needle_lower = needle.to_lowercase().trim().to_string();
    let mut best_idx = None;
    let mut best_ratio = 0.0_f64;

    for (i, candidate) in haystack.iter().enumerate() {
        let candidate_lower = candidate.to_lowercase().trim().to_string();
        if needle_lower == candidate_lower {
            return Some(i);
        }
        if needle_lower.contains(&candidate_lower) || candidate_lower.contains(&needle_lower) {
            let shorter = needle_lower.chars().count().min(candidate_lower.chars().count());
            let longer = needle_lower.chars().count().max(candidate_lower.chars().count());
            if longer == 0 {
                continue;
            }
            let ratio = shorter as f64 / longer as f64;
            if ratio > best_ratio {
                best_ratio = ratio;
                best_idx = Some(i);
            }
        }
    }

    if best_ratio > 0.5 {
        best_idx
    } else {
        None
    }
}

/// 宽松的双向包含匹配（连线题用，不打分，先到先得）
fn fuzzy_contain(needle: &str, haystack: &[String]) -> Option<usize> {
    let needle_lower = needle.to_lowercase().trim().to_string();
    if needle_lower.is_empty() {
        return None;
    }
    haystack.iter().position(|candidate| {
        let candidate_lower = candidate.to_lowercase().trim().to_string();
        !candidate_lower.is_empty()
            && (needle_lower.contains(&candidate_lower)
                || candidate_lower.contains(&needle_lower))
    })
}

/// desired_order[目标位置] = 原始序号
///
/// 每个原始项必须恰好匹配一次，否则返回 None（调用方放弃重排）。
pub fn build_desired_order(
    ordered_items: &[String],
    original_items: &[String],
) -> Option<Vec<usize>> {
    let mut desired_order = Vec::new();
    for item_text in ordered_items {
        if let Some(idx) = fuzzy_match(item_text, original_items) {
            if !desired_order.contains(&idx) {
                desired_order.push(idx);
            }
        }
    }
    if desired_order.len() == original_items.len() {
        Some(desired_order)
    } else {
        None
    }
}

fn count_matched(ordered_items: &[String], original_items: &[String]) -> usize {
    let mut seen = Vec::new();
    for item_text in ordered_items {
        if let Some(idx) = fuzzy_match(item_text, original_items) {
            if !seen.contains(&idx) {
                seen.push(idx);
            }
        }
    }
    seen.len()
}

fn is_identity(order: &[usize]) -> bool {
    order.iter().enumerate().all(|(i, &v)| i == v)
}

/// 把期望排列翻译成单项移动序列，并维护位置表
///
/// current_positions[原始序号] = 当前槽位。每移动一项：向上移时
/// `[p, cur)` 里的项都下移一位（+1），向下移时 `(cur, p]` 里的项
/// 都上移一位（-1）。这条索引平移规则让位置表和物理列表在每次
/// 移动后保持一致，不需要每一步都回读页面。
///
/// 返回 (移动序列, 最终位置表)。
pub fn plan_moves(desired_order: &[usize]) -> (Vec<MoveStep>, Vec<usize>) {
    let n = desired_order.len();
    let mut current_positions: Vec<usize> = (0..n).collect();
    let mut moves = Vec::new();

    for target_pos in 0..n {
        let origin = desired_order[target_pos];
        let current_pos = current_positions[origin];
        if current_pos == target_pos {
            continue;
        }

        moves.push(MoveStep {
            from_slot: current_pos,
            to_slot: target_pos,
        });

        if current_pos > target_pos {
            // 向上移：挤下去的项 +1
            for pos in current_positions.iter_mut() {
                if *pos >= target_pos && *pos < current_pos {
                    *pos += 1;
                }
            }
        } else {
            // 向下移：补上来的项 -1
            for pos in current_positions.iter_mut() {
                if *pos > current_pos && *pos <= target_pos {
                    *pos -= 1;
                }
            }
        }
        current_positions[origin] = target_pos;
    }

    (moves, current_positions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    // ========== 模糊匹配 ==========

    #[test]
    fn test_fuzzy_exact_match_wins() {
        let haystack = strings(&["Alpha", "Beta"]);
        assert_eq!(fuzzy_match("beta", &haystack), Some(1));
    }

    #[test]
    fn test_fuzzy_containment_above_threshold() {
        // 8/14 ≈ 0.57 > 0.5
        let haystack = strings(&["photosynthesis", "respiration"]);
        assert_eq!(fuzzy_match("photosyn", &haystack), Some(0));
    }

    #[test]
    fn test_fuzzy_containment_below_threshold() {
        // 2/8 = 0.25 ≤ 0.5
        let haystack = strings(&["abcxydef"]);
        assert_eq!(fuzzy_match("xy", &haystack), None);
    }

    #[test]
    fn test_fuzzy_no_containment() {
        let haystack = strings(&["Alpha", "Beta"]);
        assert_eq!(fuzzy_match("Gamma", &haystack), None);
    }

    #[test]
    fn test_fuzzy_best_score_wins() {
        let haystack = strings(&["cell membrane structure", "cell membrane"]);
        // "cell membrane" 精确命中第二项
        assert_eq!(fuzzy_match("cell membrane", &haystack), Some(1));
    }

    // ========== 期望排列构建 ==========

    #[test]
    fn test_build_desired_order_complete() {
        let original = strings(&["Alpha", "Beta", "Gamma"]);
        let ordered = strings(&["Gamma", "Alpha", "Beta"]);
        assert_eq!(build_desired_order(&ordered, &original), Some(vec![2, 0, 1]));
    }

    #[test]
    fn test_build_desired_order_incomplete_aborts() {
        let original = strings(&["Alpha", "Beta", "Gamma"]);
        let ordered = strings(&["Gamma", "Delta", "Beta"]);
        assert_eq!(build_desired_order(&ordered, &original), None);
    }

    #[test]
    fn test_build_desired_order_duplicate_match_aborts() {
        // 两行都匹配到同一个原始项时计数对不上，放弃重排
        let original = strings(&["Alpha", "Beta"]);
        let ordered = strings(&["Alpha", "Alpha"]);
        assert_eq!(build_desired_order(&ordered, &original), None);
    }

    // ========== 移动规划 ==========

    #[test]
    fn test_identity_order_plans_no_moves() {
        let (moves, positions) = plan_moves(&[0, 1, 2, 3]);
        assert!(moves.is_empty());
        assert_eq!(positions, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_plan_moves_reference_permutation() {
        // 原始 [A,B,C,D]，期望 [C,A,D,B]：
        // 最终 原始序号 -> 槽位 应为 [1, 3, 0, 2]
        let (moves, positions) = plan_moves(&[2, 0, 3, 1]);
        assert_eq!(positions, vec![1, 3, 0, 2]);
        assert!(!moves.is_empty());
    }

    #[test]
    fn test_plan_moves_single_swap_shift_rule() {
        // 期望 [B,A]：把位置 1 的 B 上移到 0，A 被挤到 1
        let (moves, positions) = plan_moves(&[1, 0]);
        assert_eq!(
            moves,
            vec![MoveStep {
                from_slot: 1,
                to_slot: 0
            }]
        );
        assert_eq!(positions, vec![1, 0]);
    }

    #[test]
    fn test_plan_moves_each_step_obeys_shift_rule() {
        // 逐步重放移动序列，验证位置表和"物理列表"始终一致
        let desired = vec![2usize, 0, 3, 1];
        let (moves, final_positions) = plan_moves(&desired);

        // 物理列表：slots[槽位] = 原始序号
        let mut slots: Vec<usize> = (0..desired.len()).collect();
        for step in &moves {
            let item = slots.remove(step.from_slot);
            slots.insert(step.to_slot, item);
        }

        // 物理列表最终应该就是期望排列
        assert_eq!(slots, desired);
        // 位置表与物理列表互为逆排列
        for (slot, &origin) in slots.iter().enumerate() {
            assert_eq!(final_positions[origin], slot);
        }
    }

    #[test]
    fn test_plan_moves_reverse_order() {
        // 完全倒序 [D,C,B,A]
        let (moves, positions) = plan_moves(&[3, 2, 1, 0]);
        let mut slots: Vec<usize> = vec![0, 1, 2, 3];
        for step in &moves {
            let item = slots.remove(step.from_slot);
            slots.insert(step.to_slot, item);
        }
        assert_eq!(slots, vec![3, 2, 1, 0]);
        assert_eq!(positions, vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_move_distance() {
        let step = MoveStep {
            from_slot: 3,
            to_slot: 1,
        };
        assert_eq!(step.distance(), 2);
    }
}
