//! Chromium session over the DevTools protocol.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig as LaunchConfig, Handler, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use csindex_shared::{BrowserConfig, CsIndexError, Result};

use crate::page::{ScrollTarget, TablePage};

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A launched browser with one working tab.
///
/// Owned by a single run; [`ChromeSession::close`] must be called on every
/// path once launch succeeded.
pub struct ChromeSession {
    browser: Browser,
    page: ChromePage,
    handler_task: JoinHandle<()>,
}

impl ChromeSession {
    /// Launch Chromium and open a blank tab.
    #[instrument(skip_all, fields(headless = config.headless))]
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let mut builder = LaunchConfig::builder()
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={}", config.user_agent))
            .request_timeout(Duration::from_secs(config.load_timeout_secs));
        if !config.headless {
            builder = builder.with_head();
        }
        let launch_config = builder
            .build()
            .map_err(|e| CsIndexError::Browser(format!("invalid launch options: {e}")))?;

        let (mut browser, handler) = Browser::launch(launch_config)
            .await
            .map_err(|e| CsIndexError::Browser(format!("failed to launch Chromium: {e}")))?;
        let handler_task = spawn_handler(handler);

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                shutdown(&mut browser, &handler_task).await;
                return Err(CsIndexError::Browser(format!("failed to open a tab: {e}")));
            }
        };

        info!("browser launched");
        Ok(Self {
            browser,
            page: ChromePage { page },
            handler_task,
        })
    }

    /// Navigate to the list page, bounded by the load timeout, then let the
    /// table render.
    #[instrument(skip_all, fields(url = %config.list_url))]
    pub async fn open(&self, config: &BrowserConfig) -> Result<()> {
        let timeout = Duration::from_secs(config.load_timeout_secs);

        match tokio::time::timeout(timeout, self.page.page.goto(config.list_url.as_str())).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(CsIndexError::Browser(format!(
                    "{}: navigation failed: {e}",
                    config.list_url
                )));
            }
            Err(_) => {
                return Err(CsIndexError::Browser(format!(
                    "{}: page load timed out after {}s",
                    config.list_url, config.load_timeout_secs
                )));
            }
        }

        info!("list page loaded");
        self.page
            .wait(Duration::from_millis(config.initial_wait_ms))
            .await;
        Ok(())
    }

    pub fn page(&self) -> &ChromePage {
        &self.page
    }

    /// Close the browser and stop the event handler.
    pub async fn close(mut self) {
        shutdown(&mut self.browser, &self.handler_task).await;
        info!("browser closed");
    }
}

fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!(error = %e, "browser handler event error");
            }
        }
    })
}

async fn shutdown(browser: &mut Browser, handler_task: &JoinHandle<()>) {
    if let Err(e) = browser.close().await {
        warn!(error = %e, "failed to close browser");
    }
    if let Err(e) = browser.wait().await {
        debug!(error = %e, "browser process did not exit cleanly");
    }
    handler_task.abort();
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// [`TablePage`] backed by a Chromium tab. DOM work runs as injected scripts.
pub struct ChromePage {
    page: Page,
}

impl ChromePage {
    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| CsIndexError::Browser(format!("script evaluation failed: {e}")))?
            .into_value::<T>()
            .map_err(|e| CsIndexError::Browser(format!("unexpected script result: {e}")))
    }
}

#[async_trait]
impl TablePage for ChromePage {
    async fn rendered_html(&self) -> Result<String> {
        self.eval("document.documentElement.outerHTML".to_string())
            .await
    }

    async fn is_actionable(&self, selector: &str) -> Result<bool> {
        self.eval(actionable_script(selector)).await
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        self.eval(format!(
            "document.querySelectorAll({}).length",
            js_str(selector)
        ))
        .await
    }

    async fn click_nth(&self, selector: &str, index: usize) -> Result<bool> {
        self.eval(click_nth_script(selector, index)).await
    }

    async fn click_by_text(&self, selector: &str, text: &str) -> Result<bool> {
        self.eval(click_by_text_script(selector, text)).await
    }

    async fn set_input_and_submit(&self, selector: &str, value: &str) -> Result<bool> {
        self.eval(set_input_script(selector, value)).await
    }

    async fn scroll(&self, target: ScrollTarget) -> Result<()> {
        let y = match target {
            ScrollTarget::Top => "0",
            ScrollTarget::Bottom => "document.body.scrollHeight",
        };
        let _: bool = self
            .eval(format!("(() => {{ window.scrollTo(0, {y}); return true; }})()"))
            .await?;
        Ok(())
    }

    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// ---------------------------------------------------------------------------
// Scripts
// ---------------------------------------------------------------------------

/// JavaScript string literal for `s`.
fn js_str(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

/// Shared predicate: rendered, and not disabled by attribute or class.
const USABLE_FN: &str = "const usable = (el) => {
    const style = window.getComputedStyle(el);
    if (style.display === 'none' || style.visibility === 'hidden') return false;
    if (el.getClientRects().length === 0) return false;
    if (el.disabled === true || el.getAttribute('aria-disabled') === 'true') return false;
    return !String(el.className).includes('disabled');
};";

fn actionable_script(selector: &str) -> String {
    format!(
        "(() => {{ {USABLE_FN}
            const el = document.querySelector({sel});
            return el ? usable(el) : false;
        }})()",
        sel = js_str(selector)
    )
}

fn click_nth_script(selector: &str, index: usize) -> String {
    format!(
        "(() => {{
            const el = document.querySelectorAll({sel})[{index}];
            if (!el) return false;
            el.scrollIntoView({{ block: 'center' }});
            el.click();
            return true;
        }})()",
        sel = js_str(selector)
    )
}

fn click_by_text_script(selector: &str, text: &str) -> String {
    format!(
        "(() => {{ {USABLE_FN}
            for (const el of document.querySelectorAll({sel})) {{
                const label = el.innerText || el.textContent || '';
                if (label.includes({text}) && usable(el)) {{
                    el.click();
                    return true;
                }}
            }}
            return false;
        }})()",
        sel = js_str(selector),
        text = js_str(text)
    )
}

fn set_input_script(selector: &str, value: &str) -> String {
    format!(
        "(() => {{
            const input = document.querySelector({sel});
            if (!input) return false;
            input.value = {value};
            input.dispatchEvent(new Event('input', {{ bubbles: true }}));
            input.dispatchEvent(new KeyboardEvent('keydown', {{
                bubbles: true,
                key: 'Enter',
                code: 'Enter',
                keyCode: 13
            }}));
            return true;
        }})()",
        sel = js_str(selector),
        value = js_str(value)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_strings_are_escaped() {
        assert_eq!(js_str(".ivu-page-next"), "\".ivu-page-next\"");
        assert_eq!(js_str(r#"a[title="x"]"#), r#""a[title=\"x\"]""#);
        assert_eq!(js_str("下一页"), "\"下一页\"");
    }

    #[test]
    fn scripts_embed_quoted_arguments() {
        let script = click_nth_script(".ivu-page-item", 3);
        assert!(script.contains("querySelectorAll(\".ivu-page-item\")[3]"));

        let script = set_input_script(".ivu-page-options input", "4");
        assert!(script.contains("input.value = \"4\""));
        assert!(script.contains("key: 'Enter'"));

        let script = click_by_text_script("button", "下一页");
        assert!(script.contains("label.includes(\"下一页\")"));
        assert!(script.contains("const usable"));
    }

    #[test]
    fn actionable_checks_disabled_state() {
        let script = actionable_script(".ivu-page-next");
        assert!(script.contains("document.querySelector(\".ivu-page-next\")"));
        assert!(script.contains("includes('disabled')"));
    }
}
