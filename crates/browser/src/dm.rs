//! Direct-messaging actions: inbox listing, conversations, send and delete.
//!
//! Same legacy-markup selector discipline as [`crate::profile`]. Threads are
//! addressed by the `data-thread-id` the inbox rows carry; opening one means
//! navigating to the inbox and clicking its row, there is no per-thread URL.

use {
    serde::{Deserialize, Serialize},
    serde_json::{Value, json},
    tracing::info,
};

use crate::{error::Result, executor::Executor, outcome::Outcome};

// ── Selectors ───────────────────────────────────────────────────────────────

const INBOX_ANCHOR: &str = ".DMInbox";
const INBOX_ITEM: &str = ".DMInbox-conversationItem";
const COMPOSE_BUTTON: &str = ".DMComposeButton";
const RECIPIENT_INPUT: &str = ".DMTypeahead .twttr-directmessage-input";
const NEXT_BUTTON: &str = ".dm-initiate-conversation";
const COMPOSER: &str = ".DMComposer-editor";
const SEND_BUTTON: &str = ".DMComposer-send";
const CONVERSATION: &str = ".DMConversation";
const MESSAGE_ITEM: &str = ".DirectMessage";
const SETTINGS_BUTTON: &str = ".DMConversation-settings";
const DELETE_ACTION: &str = ".js-actionDeleteConversation";
const DELETE_CONFIRM: &str = "#confirm_dialog_submit_button";

const MESSAGE_SENT: &str = "Message sent";
const CONVERSATION_DELETED: &str = "Conversation deleted";

fn suggestion_selector(username: &str) -> String {
    format!(r#".DMTypeahead-typeaheadResults .js-typeahead-item[data-screen-name="{username}"]"#)
}

fn thread_item_selector(thread_id: &str) -> String {
    format!(r#".DMInboxItem[data-thread-id="{thread_id}"]"#)
}

/// One inbox row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub full_name: String,
    pub username: String,
    pub thread_id: Option<String>,
    pub last_message_id: Option<u64>,
    pub is_muted: bool,
    pub timestamp: Option<u64>,
}

/// One message inside an open conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub content: String,
    /// `"sent"` or `"received"`, from the viewer's side.
    pub status: String,
}

/// Direct-message actions bound to one session's page.
pub struct DirectMessaging<'a> {
    exec: Executor<'a>,
    base_url: &'a str,
}

impl<'a> DirectMessaging<'a> {
    pub(crate) fn new(exec: Executor<'a>, base_url: &'a str) -> Self {
        Self { exec, base_url }
    }

    fn inbox_url(&self) -> String {
        format!("{}/messages", self.base_url)
    }

    /// Navigate to the inbox, open the thread's row, wait for `anchor`.
    async fn open_thread(&self, thread_id: &str, anchor: &str) -> Result<()> {
        self.exec.goto(&self.inbox_url()).await?;
        self.exec.wait_for(INBOX_ITEM).await?;
        self.exec.click(&thread_item_selector(thread_id)).await?;
        self.exec.wait_for(anchor).await?;
        Ok(())
    }

    /// List the inbox, newest thread first as the page renders them.
    pub async fn list(&self) -> Outcome {
        Outcome::from_result(self.list_inner().await)
    }

    async fn list_inner(&self) -> Result<Value> {
        self.exec.goto(&self.inbox_url()).await?;
        self.exec.wait_for(INBOX_ITEM).await?;

        let js = r#"(() => {
            return Array.from(document.querySelectorAll('.DMInbox-conversationItem')).map((item) => {
                const row = item.querySelector('.DMInboxItem');
                const fullName = item.querySelector('.fullname');
                const username = item.querySelector('.username');
                const stamp = item.querySelector('.DMInboxItem-timestamp ._timestamp');
                const lastId = row ? row.getAttribute('data-last-message-id') : null;
                const time = stamp ? stamp.getAttribute('data-time') : null;
                return {
                    full_name: fullName ? fullName.textContent.trim() : '',
                    username: username ? username.textContent.trim().replace(/^@/, '') : '',
                    thread_id: row ? row.getAttribute('data-thread-id') : null,
                    last_message_id: lastId !== null ? Number(lastId) : null,
                    is_muted: row ? row.getAttribute('data-is-muted') === 'true' : false,
                    timestamp: time !== null ? Number(time) : null,
                };
            });
        })()"#;
        let threads: Vec<ThreadSummary> = self.exec.eval(js).await?;

        info!(threads = threads.len(), "listed inbox");
        Ok(json!(threads))
    }

    /// Start a conversation with one or more recipients and send `text`.
    ///
    /// Every recipient must resolve through the typeahead; the first one that
    /// does not aborts the whole operation with a soft status and nothing is
    /// sent.
    pub async fn create(&self, text: &str, usernames: &[String]) -> Outcome {
        Outcome::from_result(self.create_inner(text, usernames).await)
    }

    async fn create_inner(&self, text: &str, usernames: &[String]) -> Result<Value> {
        self.exec.goto(&self.inbox_url()).await?;
        self.exec.wait_for(INBOX_ANCHOR).await?;
        self.exec.wait_for(COMPOSE_BUTTON).await?;
        self.exec.click(COMPOSE_BUTTON).await?;
        self.exec.wait_for(RECIPIENT_INPUT).await?;

        for username in usernames {
            self.exec.type_text(RECIPIENT_INPUT, username).await?;
            let suggestion = suggestion_selector(username);
            if self.exec.wait_for(&suggestion).await.is_err() {
                info!(username, "dm recipient did not resolve");
                return Ok(json!({
                    "status": format!("Recipient not found: {username}"),
                    "recipients": usernames,
                    "thread_id": null,
                }));
            }
            self.exec.click(&suggestion).await?;
        }

        self.exec.click(NEXT_BUTTON).await?;
        self.exec.wait_for(COMPOSER).await?;
        self.exec.type_text(COMPOSER, text).await?;
        self.exec.click(SEND_BUTTON).await?;
        self.exec.wait_for(CONVERSATION).await?;
        let thread_id = self.exec.attr_of(CONVERSATION, "data-thread-id").await?;

        info!(recipients = usernames.len(), ?thread_id, "dm conversation created");
        Ok(json!({
            "status": MESSAGE_SENT,
            "recipients": usernames,
            "thread_id": thread_id,
        }))
    }

    /// Send `text` into an existing thread.
    pub async fn reply(&self, text: &str, thread_id: &str) -> Outcome {
        Outcome::from_result(self.reply_inner(text, thread_id).await)
    }

    async fn reply_inner(&self, text: &str, thread_id: &str) -> Result<Value> {
        self.open_thread(thread_id, COMPOSER).await?;
        self.exec.type_text(COMPOSER, text).await?;
        self.exec.click(SEND_BUTTON).await?;

        info!(thread_id, "dm reply sent");
        Ok(json!({ "status": MESSAGE_SENT, "thread_id": thread_id }))
    }

    /// All messages of a thread, oldest first as the page renders them.
    pub async fn messages(&self, thread_id: &str) -> Outcome {
        Outcome::from_result(self.messages_inner(thread_id).await)
    }

    async fn messages_inner(&self, thread_id: &str) -> Result<Value> {
        self.open_thread(thread_id, MESSAGE_ITEM).await?;

        let js = r#"(() => {
            return Array.from(document.querySelectorAll('.DirectMessage')).map((el) => {
                const text = el.querySelector('.DirectMessage-text');
                return {
                    content: text && text.textContent !== null ? text.textContent.trim() : '',
                    status: el.classList.contains('DirectMessage--sent') ? 'sent' : 'received',
                };
            });
        })()"#;
        let messages: Vec<ThreadMessage> = self.exec.eval(js).await?;

        info!(thread_id, messages = messages.len(), "read thread");
        Ok(json!(messages))
    }

    /// Delete a whole conversation through its settings menu.
    pub async fn delete(&self, thread_id: &str) -> Outcome {
        Outcome::from_result(self.delete_inner(thread_id).await)
    }

    async fn delete_inner(&self, thread_id: &str) -> Result<Value> {
        self.open_thread(thread_id, SETTINGS_BUTTON).await?;
        self.exec.click(SETTINGS_BUTTON).await?;
        self.exec.wait_for(DELETE_ACTION).await?;
        self.exec.click(DELETE_ACTION).await?;
        self.exec.wait_for(DELETE_CONFIRM).await?;
        self.exec.click(DELETE_CONFIRM).await?;
        self.exec.wait_for(INBOX_ANCHOR).await?;

        info!(thread_id, "dm conversation deleted");
        Ok(json!({ "status": CONVERSATION_DELETED, "thread_id": thread_id }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn suggestion_selector_targets_the_screen_name() {
        assert_eq!(
            suggestion_selector("birdwatcher"),
            r#".DMTypeahead-typeaheadResults .js-typeahead-item[data-screen-name="birdwatcher"]"#
        );
    }

    #[test]
    fn thread_item_selector_targets_the_thread() {
        assert_eq!(
            thread_item_selector("77123"),
            r#".DMInboxItem[data-thread-id="77123"]"#
        );
    }

    #[test]
    fn thread_summary_tolerates_missing_fields() {
        let raw = json!({
            "full_name": "Bird Watcher",
            "username": "birdwatcher",
            "thread_id": null,
            "last_message_id": null,
            "is_muted": false,
            "timestamp": null,
        });
        let summary: ThreadSummary = serde_json::from_value(raw).unwrap();
        assert_eq!(summary.username, "birdwatcher");
        assert!(summary.thread_id.is_none());
        assert!(summary.last_message_id.is_none());
    }

    #[test]
    fn thread_message_round_trips() {
        let message = ThreadMessage {
            content: "hello".into(),
            status: "sent".into(),
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value, json!({ "content": "hello", "status": "sent" }));
    }
}
