//! Real browser sessions over the Chrome DevTools Protocol.
//!
//! Compiled behind the `browser` feature. [`ChromiumSession`] implements
//! [`UiDriver`] with chromiumoxide: element state is probed through a page
//! evaluation (one round trip, no stale handles), while clicks and typing go
//! through native element handles so the application sees trusted input.

use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::element::Element as CdpElement;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::Deserialize;
use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use crate::driver::{DriverConfig, ElementHandle, UiDriver};
use crate::locator::{Locator, Strategy};
use crate::result::{CatadorError, CatadorResult};

/// Element state reported by the in-page probe
#[derive(Debug, Deserialize)]
struct ProbeState {
    tag: String,
    text: Option<String>,
    enabled: bool,
    displayed: bool,
    attrs: HashMap<String, String>,
}

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// JS expression that resolves the locator to an element (or null)
fn js_query(locator: &Locator) -> String {
    let expr = locator.expression();
    match locator.strategy() {
        Strategy::Css => format!("document.querySelector({})", js_string(expr)),
        Strategy::XPath => format!(
            "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
            js_string(expr)
        ),
        Strategy::TestId => format!(
            "document.querySelector('[data-testid=' + CSS.escape({}) + ']')",
            js_string(expr)
        ),
        Strategy::LinkText => format!(
            "Array.from(document.querySelectorAll('a')).find(a => a.textContent.trim() === {}) ?? null",
            js_string(expr)
        ),
    }
}

/// Full probe: element state as a JSON object, or null when absent
fn js_probe(locator: &Locator) -> String {
    format!(
        "(() => {{ \
            const el = {query}; \
            if (!el) return null; \
            const attrs = {{}}; \
            for (const a of el.attributes) attrs[a.name] = a.value; \
            const rect = el.getBoundingClientRect(); \
            const style = window.getComputedStyle(el); \
            return {{ \
                tag: el.tagName.toLowerCase(), \
                text: el.textContent, \
                enabled: !el.disabled, \
                displayed: rect.width > 0 && rect.height > 0 && style.visibility !== 'hidden', \
                attrs \
            }}; \
        }})()",
        query = js_query(locator)
    )
}

/// A live browser session implementing the driver seam
pub struct ChromiumSession {
    browser: CdpBrowser,
    page: CdpPage,
    #[allow(dead_code)]
    handler: tokio::task::JoinHandle<()>,
}

impl std::fmt::Debug for ChromiumSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromiumSession").finish_non_exhaustive()
    }
}

impl ChromiumSession {
    /// Launch a browser and open one page
    pub async fn launch(config: &DriverConfig) -> CatadorResult<Self> {
        let mut builder = CdpConfig::builder()
            .window_size(config.viewport_width, config.viewport_height);
        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.browser_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder.build().map_err(|e| CatadorError::SessionLaunch {
            message: e.to_string(),
        })?;

        let (browser, mut events) =
            CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| CatadorError::SessionLaunch {
                    message: e.to_string(),
                })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| CatadorError::SessionLaunch {
                message: e.to_string(),
            })?;

        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    async fn resolve(&self, locator: &Locator) -> CatadorResult<CdpElement> {
        let result = match locator.strategy() {
            Strategy::Css => self.page.find_element(locator.expression()).await,
            Strategy::XPath => self.page.find_xpath(locator.expression()).await,
            Strategy::TestId => {
                self.page
                    .find_element(format!("[data-testid=\"{}\"]", locator.expression()))
                    .await
            }
            Strategy::LinkText => {
                self.page
                    .find_xpath(format!(
                        "//a[normalize-space(text())={}]",
                        xpath_literal(locator.expression())
                    ))
                    .await
            }
        };
        result.map_err(|e| CatadorError::driver(format!("resolving {locator}: {e}")))
    }
}

/// Quote a string as an XPath literal, splitting when it holds both quote kinds
fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{value}'")
    } else if !value.contains('"') {
        format!("\"{value}\"")
    } else {
        let parts: Vec<String> = value
            .split('\'')
            .map(|part| format!("'{part}'"))
            .collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

#[async_trait]
impl UiDriver for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> CatadorResult<()> {
        debug!(url, "navigating");
        self.page
            .goto(url)
            .await
            .map_err(|e| CatadorError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn find(&mut self, locator: &Locator) -> CatadorResult<Option<ElementHandle>> {
        let probe = self
            .page
            .evaluate(js_probe(locator))
            .await
            .map_err(|e| CatadorError::driver(format!("probing {locator}: {e}")))?;
        let state: Option<ProbeState> = probe
            .into_value()
            .map_err(|e| CatadorError::driver(format!("decoding probe of {locator}: {e}")))?;
        Ok(state.map(|s| ElementHandle {
            id: locator.query_key(),
            tag_name: s.tag,
            text: s.text,
            enabled: s.enabled,
            displayed: s.displayed,
            attributes: s.attrs,
        }))
    }

    async fn click(&mut self, locator: &Locator) -> CatadorResult<()> {
        let element = self.resolve(locator).await?;
        element
            .click()
            .await
            .map_err(|e| CatadorError::driver(format!("clicking {locator}: {e}")))?;
        Ok(())
    }

    async fn type_text(&mut self, locator: &Locator, text: &str) -> CatadorResult<()> {
        let element = self.resolve(locator).await?;
        element
            .click()
            .await
            .map_err(|e| CatadorError::driver(format!("focusing {locator}: {e}")))?;
        element
            .type_str(text)
            .await
            .map_err(|e| CatadorError::driver(format!("typing into {locator}: {e}")))?;
        Ok(())
    }

    async fn clear(&mut self, locator: &Locator) -> CatadorResult<()> {
        let script = format!(
            "(() => {{ const el = {query}; if (el) {{ el.value = ''; \
             el.dispatchEvent(new Event('input', {{bubbles: true}})); }} }})()",
            query = js_query(locator)
        );
        self.page
            .evaluate(script)
            .await
            .map_err(|e| CatadorError::driver(format!("clearing {locator}: {e}")))?;
        Ok(())
    }

    async fn refresh(&mut self) -> CatadorResult<()> {
        self.page
            .reload()
            .await
            .map_err(|e| CatadorError::driver(format!("reloading: {e}")))?;
        Ok(())
    }

    async fn current_url(&mut self) -> CatadorResult<String> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| CatadorError::driver(format!("reading URL: {e}")))?;
        Ok(url.unwrap_or_default())
    }

    async fn close(&mut self) -> CatadorResult<()> {
        self.browser
            .close()
            .await
            .map_err(|e| CatadorError::driver(format!("closing browser: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_probe_uses_query_selector() {
        let locator = Locator::css("#save", "the Save button");
        assert!(js_query(&locator).contains("document.querySelector(\"#save\")"));
    }

    #[test]
    fn xpath_probe_uses_document_evaluate() {
        let locator = Locator::xpath("//a[@id='new']", "the New link");
        let query = js_query(&locator);
        assert!(query.contains("document.evaluate"));
        assert!(query.contains("FIRST_ORDERED_NODE_TYPE"));
    }

    #[test]
    fn probe_expressions_escape_quotes() {
        let locator = Locator::css("a[title=\"x\"]", "a quoted selector");
        assert!(js_query(&locator).contains("\\\""));
    }

    #[test]
    fn xpath_literals_handle_apostrophes() {
        assert_eq!(xpath_literal("plain"), "'plain'");
        assert_eq!(xpath_literal("it's"), "\"it's\"");
        assert!(xpath_literal("both \" and '").starts_with("concat("));
    }
}
