use std::sync::Arc;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions, Tab};

use super::{best_effort, CellElement, GamePage};
use crate::error::DriverError;

/// Collects `{id, class}` for every cell. Returned as a JSON string so the
/// value survives the DevTools round trip without object previews.
const CELL_QUERY_JS: &str = r#"
(() => {
    const cells = document.querySelectorAll("[id^='cell_']");
    return JSON.stringify(Array.from(cells, c => ({ id: c.id, class: c.className })));
})()
"#;

const RIGHT_CLICK_JS: &str = r#"
function() {
    const opts = { bubbles: true, cancelable: true, button: 2, buttons: 2 };
    this.dispatchEvent(new MouseEvent("mousedown", opts));
    this.dispatchEvent(new MouseEvent("mouseup", opts));
    this.dispatchEvent(new MouseEvent("contextmenu", opts));
}
"#;

/// Launch settings for [`ChromePage`].
#[derive(Debug, Clone)]
pub struct ChromeOptions {
    pub headless: bool,
    pub window_size: (u32, u32),
    pub idle_timeout: Duration,
}

/// A Chrome tab driven over the DevTools protocol.
pub struct ChromePage {
    // Dropping the browser kills the process, so it must outlive the tab.
    browser: Option<Browser>,
    tab: Arc<Tab>,
}

impl ChromePage {
    pub fn launch(options: &ChromeOptions) -> Result<Self, DriverError> {
        let launch = LaunchOptions::default_builder()
            .headless(options.headless)
            .window_size(Some(options.window_size))
            .idle_browser_timeout(options.idle_timeout)
            .build()
            .map_err(|e| DriverError::Launch(e.to_string()))?;
        let browser = Browser::new(launch).map_err(|e| DriverError::Launch(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| DriverError::Launch(e.to_string()))?;
        tracing::info!(headless = options.headless, "browser launched");
        Ok(ChromePage {
            browser: Some(browser),
            tab,
        })
    }
}

fn interaction(selector: &str, e: impl ToString) -> DriverError {
    DriverError::Interaction {
        selector: selector.to_string(),
        reason: e.to_string(),
    }
}

impl GamePage for ChromePage {
    fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| DriverError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn click(&mut self, selector: &str) -> Result<(), DriverError> {
        let element = self
            .tab
            .wait_for_element(selector)
            .map_err(|_| DriverError::ElementNotFound(selector.to_string()))?;
        element.click().map_err(|e| interaction(selector, e))?;
        Ok(())
    }

    fn right_click(&mut self, selector: &str) -> Result<(), DriverError> {
        let element = self
            .tab
            .wait_for_element(selector)
            .map_err(|_| DriverError::ElementNotFound(selector.to_string()))?;
        element
            .call_js_fn(RIGHT_CLICK_JS, vec![], false)
            .map_err(|e| interaction(selector, e))?;
        Ok(())
    }

    fn class_of(&mut self, selector: &str) -> Result<String, DriverError> {
        let element = self
            .tab
            .wait_for_element(selector)
            .map_err(|_| DriverError::ElementNotFound(selector.to_string()))?;
        let class = element
            .get_attribute_value("class")
            .map_err(|e| interaction(selector, e))?;
        Ok(class.unwrap_or_default())
    }

    fn cell_elements(&mut self) -> Result<Vec<CellElement>, DriverError> {
        let result = self
            .tab
            .evaluate(CELL_QUERY_JS, false)
            .map_err(|e| DriverError::Script(e.to_string()))?;
        let json = match result.value {
            Some(serde_json::Value::String(s)) => s,
            other => {
                return Err(DriverError::Script(format!(
                    "cell query returned {other:?}"
                )))
            }
        };
        serde_json::from_str(&json).map_err(|e| DriverError::Script(e.to_string()))
    }

    fn pause(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }

    fn close(&mut self) -> Result<(), DriverError> {
        // The browser process goes with the drop either way.
        best_effort("closing tab", self.tab.close(false));
        self.browser.take();
        Ok(())
    }
}
