//! Low-level page actions shared by every session operation.
//!
//! The executor wraps a [`Page`] with the session's wait policy and exposes
//! the handful of primitives the higher-level flows are built from: navigate,
//! wait for a selector, click, type, and read text or attributes out of the
//! DOM. Everything selector-shaped goes through [`js_string`] so arbitrary
//! selectors cannot break out of the generated JavaScript.

use std::time::{Duration, Instant};

use {
    chromiumoxide::{
        Page,
        cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType},
    },
    tracing::debug,
};

use crate::error::{BrowserError, Result};

/// How long a character's worth of typed input may take to land in the DOM.
const TYPE_SETTLE: Duration = Duration::from_secs(2);

/// Polling policy for selector waits.
///
/// `timeout: None` waits forever; the config maps `wait_timeout_ms = 0` to
/// that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub poll: Duration,
    pub timeout: Option<Duration>,
}

impl WaitPolicy {
    pub fn from_config(config: &warble_config::BrowserConfig) -> Self {
        Self {
            poll: Duration::from_millis(config.wait_poll_ms.max(1)),
            timeout: match config.wait_timeout_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
        }
    }

    fn deadline(&self, now: Instant) -> Option<Instant> {
        self.timeout.map(|t| now + t)
    }
}

/// Escape a string for embedding in generated JavaScript.
pub(crate) fn js_string(s: &str) -> Result<String> {
    serde_json::to_string(s).map_err(|e| BrowserError::Cdp(e.to_string()))
}

/// Compare URLs ignoring a trailing slash.
pub fn urls_equal(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

/// Page actions bound to one page and one wait policy.
pub struct Executor<'a> {
    page: &'a Page,
    policy: WaitPolicy,
}

impl<'a> Executor<'a> {
    pub fn new(page: &'a Page, policy: WaitPolicy) -> Self {
        Self { page, policy }
    }

    /// Navigate and wait for the load to settle.
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::NavigationFailed(e.to_string()))?;
        let _ = self.page.wait_for_navigation().await;
        debug!(url, "navigated");
        Ok(())
    }

    /// The current page URL, empty when the target has none yet.
    pub async fn current_url(&self) -> String {
        self.page.url().await.ok().flatten().unwrap_or_default()
    }

    /// Evaluate JavaScript and deserialize its completion value.
    pub async fn eval<T: serde::de::DeserializeOwned>(&self, code: &str) -> Result<T> {
        self.page
            .evaluate(code)
            .await
            .map_err(|e| BrowserError::JsEvalFailed(e.to_string()))?
            .into_value()
            .map_err(|e| BrowserError::JsEvalFailed(format!("{e:?}")))
    }

    /// One-shot presence check for a selector.
    pub async fn exists(&self, selector: &str) -> Result<bool> {
        let check = format!("document.querySelector({}) !== null", js_string(selector)?);
        self.eval(&check).await
    }

    /// Poll until the selector matches something or the policy deadline hits.
    pub async fn wait_for(&self, selector: &str) -> Result<()> {
        let check = format!("document.querySelector({}) !== null", js_string(selector)?);
        let start = Instant::now();
        let deadline = self.policy.deadline(start);

        loop {
            let found: bool = self
                .page
                .evaluate(check.as_str())
                .await
                .map_err(|e| BrowserError::JsEvalFailed(e.to_string()))?
                .into_value()
                .unwrap_or(false);

            if found {
                debug!(selector, "element found");
                return Ok(());
            }

            if let Some(deadline) = deadline
                && Instant::now() >= deadline
            {
                return Err(BrowserError::SelectorNotFound {
                    selector: selector.to_owned(),
                    waited_ms: start.elapsed().as_millis() as u64,
                });
            }

            tokio::time::sleep(self.policy.poll).await;
        }
    }

    /// Click the first match, scrolling it into view first.
    pub async fn click(&self, selector: &str) -> Result<()> {
        let sel = js_string(selector)?;
        let js = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return false;
                el.scrollIntoView({{ block: 'center' }});
                el.click();
                return true;
            }})()"#
        );
        let clicked: bool = self.eval(&js).await?;
        if !clicked {
            return Err(BrowserError::SelectorNotFound {
                selector: selector.to_owned(),
                waited_ms: 0,
            });
        }
        debug!(selector, "clicked element");
        Ok(())
    }

    /// Click every match, swallowing per-element failures. Returns how many
    /// clicks landed.
    pub async fn click_all(&self, selector: &str) -> Result<u64> {
        let sel = js_string(selector)?;
        let js = format!(
            r#"(() => {{
                let clicked = 0;
                document.querySelectorAll({sel}).forEach((el) => {{
                    try {{ el.click(); clicked += 1; }} catch (e) {{}}
                }});
                return clicked;
            }})()"#
        );
        let clicked: u64 = self.eval(&js).await?;
        debug!(selector, clicked, "clicked all matches");
        Ok(clicked)
    }

    /// Focus the element and type `text` through real key events.
    ///
    /// Waits afterwards until the field reports the full text, since key
    /// events are dispatched ahead of the page committing them.
    pub async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        let sel = js_string(selector)?;
        let focus = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return false;
                el.focus();
                return true;
            }})()"#
        );
        let focused: bool = self.eval(&focus).await?;
        if !focused {
            return Err(BrowserError::SelectorNotFound {
                selector: selector.to_owned(),
                waited_ms: 0,
            });
        }

        for c in text.chars() {
            let key_down = DispatchKeyEventParams::builder()
                .r#type(DispatchKeyEventType::KeyDown)
                .text(c.to_string())
                .build()
                .map_err(|e| BrowserError::Cdp(e.to_string()))?;
            self.page
                .execute(key_down)
                .await
                .map_err(|e| BrowserError::Cdp(e.to_string()))?;

            let key_up = DispatchKeyEventParams::builder()
                .r#type(DispatchKeyEventType::KeyUp)
                .text(c.to_string())
                .build()
                .map_err(|e| BrowserError::Cdp(e.to_string()))?;
            self.page
                .execute(key_up)
                .await
                .map_err(|e| BrowserError::Cdp(e.to_string()))?;
        }

        self.wait_for_committed(selector, &sel, text).await?;
        debug!(selector, chars = text.chars().count(), "typed text");
        Ok(())
    }

    /// Poll until the field's value (or text content) holds the typed text.
    async fn wait_for_committed(&self, selector: &str, sel: &str, text: &str) -> Result<()> {
        // JS string lengths count UTF-16 code units.
        let expected = text.encode_utf16().count();
        let length_js = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return -1;
                const v = el.value !== undefined ? el.value : el.textContent;
                return v === null ? -1 : v.length;
            }})()"#
        );

        let deadline = Instant::now() + TYPE_SETTLE;
        while Instant::now() < deadline {
            let committed: i64 = self.eval(&length_js).await?;
            if committed >= 0 && committed as usize >= expected {
                return Ok(());
            }
            tokio::time::sleep(self.policy.poll).await;
        }

        Err(BrowserError::TypeLagged {
            selector: selector.to_owned(),
            expected,
        })
    }

    /// Trimmed text content of the first match, `None` when absent.
    pub async fn text_of(&self, selector: &str) -> Result<Option<String>> {
        let sel = js_string(selector)?;
        let js = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                return el && el.textContent !== null ? el.textContent.trim() : null;
            }})()"#
        );
        self.eval(&js).await
    }

    /// Trimmed text content of every match.
    pub async fn texts_of(&self, selector: &str) -> Result<Vec<String>> {
        let sel = js_string(selector)?;
        let js = format!(
            r#"(() => {{
                return Array.from(document.querySelectorAll({sel}))
                    .map((el) => (el.textContent || '').trim());
            }})()"#
        );
        self.eval(&js).await
    }

    /// An attribute of the first match, `None` when the element or the
    /// attribute is absent.
    pub async fn attr_of(&self, selector: &str, attribute: &str) -> Result<Option<String>> {
        let sel = js_string(selector)?;
        let attr = js_string(attribute)?;
        let js = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                return el ? el.getAttribute({attr}) : null;
            }})()"#
        );
        self.eval(&js).await
    }

    /// The attribute's value across every match that carries it.
    pub async fn attrs_of(&self, selector: &str, attribute: &str) -> Result<Vec<String>> {
        let sel = js_string(selector)?;
        let attr = js_string(attribute)?;
        let js = format!(
            r#"(() => {{
                return Array.from(document.querySelectorAll({sel}))
                    .map((el) => el.getAttribute({attr}))
                    .filter((v) => v !== null);
            }})()"#
        );
        self.eval(&js).await
    }
}
