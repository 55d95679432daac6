use anyhow::Result;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// 连接到已运行的浏览器并定位目标标签页
///
/// 用户需要先用调试端口启动 Chrome 并登录目标站点；
/// 按 URL 关键字挑选标签页，找不到就留在第一个标签页上。
pub async fn connect_to_browser_and_page(
    port: u16,
    url_keywords: &[String],
) -> Result<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        e
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let pages = browser.pages().await?;
    debug!("获取到 {} 个页面", pages.len());
    if pages.is_empty() {
        anyhow::bail!("浏览器没有打开任何标签页");
    }

    // 按 URL 关键字查找目标标签页
    for p in pages.iter() {
        if let Ok(url) = p.url().await {
            let url = url.unwrap_or_default().to_lowercase();
            debug!("检查标签页: {}", url);
            if url_keywords.iter().any(|kw| url.contains(&kw.to_lowercase())) {
                info!("✓ 找到目标标签页: {}", url);
                return Ok((browser, p.clone()));
            }
        }
    }

    // 没找到就留在第一个标签页上
    warn!("未找到匹配的标签页，使用当前标签页");
    let page = pages[0].clone();
    Ok((browser, page))
}
