//! Session registry: one live browser per API key.
//!
//! Each key maps to a `OnceCell`-guarded session so concurrent first requests
//! for the same key provision exactly one browser; a failed provisioning
//! leaves the cell empty and the next request retries. Calls on one session
//! serialize through its async mutex, sessions of different keys run fully in
//! parallel. Revocation removes the map entry first, then takes the session
//! lock so in-flight work drains before the browser goes away.

use std::{sync::Arc, time::Duration};

use {
    chromiumoxide::{
        Browser, BrowserConfig as CdpBrowserConfig, Page,
        cdp::browser_protocol::page::{
            EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
        },
    },
    dashmap::DashMap,
    futures::StreamExt,
    tempfile::TempDir,
    tokio::{
        sync::{Mutex, MutexGuard, OnceCell},
        task::JoinHandle,
    },
    tracing::{debug, info, trace},
};

use crate::{
    detect::{detect_browser, install_instructions},
    device::DeviceProfile,
    error::{BrowserError, Context, Result},
    executor::WaitPolicy,
    filter::install_request_filter,
    session::CoreSession,
};

/// Everything a live session owns. The browser process and the profile
/// directory die with this struct.
#[derive(Debug)]
pub struct SessionInner {
    pub session: CoreSession,
    tasks: Vec<JoinHandle<()>>,
    _browser: Browser,
    _profile_dir: TempDir,
}

/// Shared handle to one key's session.
#[derive(Debug)]
pub struct SessionHandle {
    /// Redacted key, only for logs.
    key_tag: String,
    inner: Mutex<SessionInner>,
}

impl SessionHandle {
    /// Serialize a caller onto this session's page.
    pub async fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().await
    }

    async fn shutdown(&self) {
        // Taking the lock drains whatever call is still running.
        let mut inner = self.inner.lock().await;
        for task in inner.tasks.drain(..) {
            task.abort();
        }
        info!(key = %self.key_tag, "session torn down");
    }
}

/// Key-addressed collection of live sessions.
pub struct SessionRegistry {
    config: warble_config::BrowserConfig,
    policy: WaitPolicy,
    device: DeviceProfile,
    sessions: DashMap<String, Arc<OnceCell<Arc<SessionHandle>>>>,
}

impl SessionRegistry {
    pub fn new(config: warble_config::BrowserConfig) -> Self {
        Self {
            policy: WaitPolicy::from_config(&config),
            device: DeviceProfile::from_config(&config),
            sessions: DashMap::new(),
            config,
        }
    }

    /// The session for `key`, provisioning a browser on first use.
    pub async fn resolve(&self, key: &str) -> Result<Arc<SessionHandle>> {
        let cell = self
            .sessions
            .entry(key.to_owned())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();
        let handle = cell.get_or_try_init(|| self.provision(key)).await?;
        Ok(Arc::clone(handle))
    }

    /// Tear down `key`'s session. Returns whether one was live.
    pub async fn revoke(&self, key: &str) -> bool {
        let Some((_, cell)) = self.sessions.remove(key) else {
            return false;
        };
        let Some(handle) = cell.get() else {
            return false;
        };
        handle.shutdown().await;
        true
    }

    /// Tear down every session. Called once at process shutdown.
    pub async fn shutdown(&self) {
        let keys: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        for key in keys {
            self.revoke(&key).await;
        }
    }

    /// How many sessions finished provisioning and are still registered.
    pub fn live_sessions(&self) -> usize {
        self.sessions
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    async fn provision(&self, key: &str) -> Result<Arc<SessionHandle>> {
        let key_tag = warble_common::redact_key(key);
        let live = self.live_sessions();
        if live >= self.config.max_sessions {
            return Err(BrowserError::SessionLimit(live));
        }

        let detection = detect_browser(self.config.executable.as_deref());
        let Some(executable) = detection.path else {
            return Err(BrowserError::LaunchFailed(format!(
                "Chrome/Chromium not found. {}",
                detection.install_hint
            )));
        };

        // Each session gets its own profile directory, so cookies and login
        // state never leak between keys.
        let profile_dir = tempfile::Builder::new()
            .prefix("warble-session-")
            .tempdir()
            .context("failed to create session profile dir")?;

        let mut builder = CdpBrowserConfig::builder();

        // chromiumoxide runs headless unless with_head() is called
        if !self.config.headless {
            builder = builder.with_head();
        }

        builder = builder
            .viewport(self.device.viewport())
            .user_data_dir(profile_dir.path())
            .chrome_executable(&executable)
            .arg(format!("--user-agent={}", self.device.user_agent));

        if self.config.wait_timeout_ms > 0 {
            builder = builder.request_timeout(Duration::from_millis(self.config.wait_timeout_ms));
        }

        builder = builder
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox");

        let cdp_config = builder.build().map_err(|e| {
            BrowserError::LaunchFailed(format!("failed to build browser config: {e}"))
        })?;

        let (browser, mut handler) = Browser::launch(cdp_config).await.map_err(|e| {
            let install_hint = install_instructions();
            BrowserError::LaunchFailed(format!("browser launch failed: {e}\n\n{install_hint}"))
        })?;

        let handler_tag = key_tag.clone();
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                trace!(key = %handler_tag, ?event, "browser event");
            }
        });

        let page = browser.new_page("about:blank").await?;
        let filter_task = install_request_filter(&page, &self.config.stylesheet_allowlist).await?;
        let dialog_task = install_dialog_autoaccept(&page).await?;

        let session = CoreSession::new(page, self.policy, self.config.base_url.clone());
        info!(
            key = %key_tag,
            executable = %executable.display(),
            headless = self.config.headless,
            "session provisioned"
        );

        Ok(Arc::new(SessionHandle {
            key_tag,
            inner: Mutex::new(SessionInner {
                session,
                tasks: vec![handler_task, filter_task, dialog_task],
                _browser: browser,
                _profile_dir: profile_dir,
            }),
        }))
    }
}

/// Auto-accept JavaScript dialogs so a stray confirm() can never wedge the
/// page mid-action.
async fn install_dialog_autoaccept(page: &Page) -> Result<JoinHandle<()>> {
    let mut events = page.event_listener::<EventJavascriptDialogOpening>().await?;
    let page = page.clone();
    Ok(tokio::spawn(async move {
        while let Some(event) = events.next().await {
            debug!(message = %event.message, "auto-accepting page dialog");
            let params = match HandleJavaScriptDialogParams::builder().accept(true).build() {
                Ok(params) => params,
                Err(error) => {
                    debug!(error = %error, "failed to build dialog response");
                    continue;
                },
            };
            if let Err(error) = page.execute(params).await {
                debug!(error = %error, "failed to answer page dialog");
            }
        }
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn revoke_unknown_key_is_false() {
        let registry = SessionRegistry::new(warble_config::BrowserConfig::default());
        assert!(!registry.revoke("no-such-key").await);
    }

    #[tokio::test]
    async fn fresh_registry_has_no_live_sessions() {
        let registry = SessionRegistry::new(warble_config::BrowserConfig::default());
        assert_eq!(registry.live_sessions(), 0);
        registry.shutdown().await;
        assert_eq!(registry.live_sessions(), 0);
    }
}
