//! Network request filtering for session pages.
//!
//! Every session page intercepts requests through the CDP fetch domain and
//! drops the heavy resource classes the flows never look at: images, fonts,
//! and any stylesheet not on the configured allowlist. The page still needs
//! the core stylesheet, since several controls stay hidden until it applies.

use {
    chromiumoxide::{
        Page,
        cdp::browser_protocol::{
            fetch::{
                ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams,
                RequestPattern, RequestStage,
            },
            network::{ErrorReason, ResourceType},
        },
    },
    futures::StreamExt,
    tokio::task::JoinHandle,
    tracing::debug,
};

use crate::error::Result;

/// What to do with a paused request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    Allow,
    Block,
}

/// Classify a paused request by resource type and URL.
pub(crate) fn classify(
    resource_type: &ResourceType,
    url: &str,
    stylesheet_allowlist: &[String],
) -> FilterDecision {
    match resource_type {
        ResourceType::Image | ResourceType::Font => FilterDecision::Block,
        ResourceType::Stylesheet => {
            if stylesheet_allowlist.iter().any(|frag| url.contains(frag.as_str())) {
                FilterDecision::Allow
            } else {
                FilterDecision::Block
            }
        },
        _ => FilterDecision::Allow,
    }
}

async fn respond(
    page: &Page,
    event: &EventRequestPaused,
    decision: FilterDecision,
) -> std::result::Result<(), String> {
    match decision {
        FilterDecision::Block => {
            let params = FailRequestParams::builder()
                .request_id(event.request_id.clone())
                .error_reason(ErrorReason::Aborted)
                .build()?;
            page.execute(params).await.map_err(|e| e.to_string())?;
        },
        FilterDecision::Allow => {
            let params = ContinueRequestParams::builder()
                .request_id(event.request_id.clone())
                .build()?;
            page.execute(params).await.map_err(|e| e.to_string())?;
        },
    }
    Ok(())
}

/// Enable fetch interception on the page and spawn the responder task.
///
/// The task runs until the page's event stream closes. A paused request must
/// always be answered or the page hangs, so responder failures are logged and
/// the loop moves on.
pub async fn install_request_filter(
    page: &Page,
    stylesheet_allowlist: &[String],
) -> Result<JoinHandle<()>> {
    let enable = EnableParams {
        patterns: Some(vec![RequestPattern {
            url_pattern: Some("*".into()),
            resource_type: None,
            request_stage: Some(RequestStage::Request),
        }]),
        handle_auth_requests: None,
    };
    page.execute(enable).await?;

    let mut events = page.event_listener::<EventRequestPaused>().await?;
    let page = page.clone();
    let allowlist = stylesheet_allowlist.to_vec();

    Ok(tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let decision = classify(&event.resource_type, &event.request.url, &allowlist);
            if let Err(error) = respond(&page, &event, decision).await {
                debug!(error, "request filter response failed");
            }
        }
    }))
}
