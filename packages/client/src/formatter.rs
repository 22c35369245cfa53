//! Message formatting utilities for client display.

use pairline_server::domain::UserId;
use pairline_shared::time::timestamp_to_clock_time;

use crate::{
    conversation::{DeliveryState, TimelineEntry},
    directory::DirectoryEntry,
};

const RULE: &str = "============================================================";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the user list with online markers and unread counts
    ///
    /// # Arguments
    ///
    /// * `entries` - Known users (self excluded)
    /// * `unread` - Unread count lookup per user
    pub fn format_users(entries: &[DirectoryEntry], unread: impl Fn(UserId) -> usize) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n{}\nUsers:\n", RULE));

        if entries.is_empty() {
            output.push_str("(No other users)\n");
        } else {
            for entry in entries {
                let marker = if entry.is_online { "●" } else { "○" };
                let status = if entry.is_online { "online" } else { "offline" };
                output.push_str(&format!(
                    "{} {} (#{}) - {}",
                    marker, entry.user.username, entry.user.id, status
                ));
                match unread(entry.user.id) {
                    0 => {}
                    count => output.push_str(&format!(" [{} unread]", count)),
                }
                output.push('\n');
            }
        }

        output.push_str(RULE);
        output.push('\n');
        output
    }

    /// Format the whole timeline of the opened conversation
    pub fn format_timeline(
        entries: &[TimelineEntry],
        self_id: UserId,
        self_name: &str,
        peer_name: &str,
    ) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n{}\nConversation with @{}\n", RULE, peer_name));
        if entries.is_empty() {
            output.push_str("(No messages yet)\n");
        }
        for entry in entries {
            let name = if entry.message.sender_id == self_id {
                self_name
            } else {
                peer_name
            };
            output.push_str(&Self::format_entry(entry, name));
        }
        output.push_str(RULE);
        output.push('\n');
        output
    }

    /// Format a single timeline line: `[HH:MM:SS] @name: content (state)`
    pub fn format_entry(entry: &TimelineEntry, sender_name: &str) -> String {
        let suffix = match entry.delivery {
            DeliveryState::Confirmed => "",
            DeliveryState::Pending => " (sending...)",
            DeliveryState::Failed => " (failed)",
        };
        format!(
            "[{}] @{}: {}{}\n",
            timestamp_to_clock_time(entry.message.created_at.value()),
            sender_name,
            entry.message.content.as_str(),
            suffix
        )
    }

    /// Format a notice for a message from a conversation that is not open
    pub fn format_unread_notice(sender_name: &str, count: usize) -> String {
        format!(
            "\n* {} unread from @{} (/open {})\n",
            count, sender_name, sender_name
        )
    }

    pub fn format_presence(online_count: usize) -> String {
        format!("\n~ {} user(s) online\n", online_count)
    }

    pub fn format_error(message: &str) -> String {
        format!("\n! {}\n", message)
    }

    pub fn format_help() -> String {
        let mut output = String::new();
        output.push_str("\nCommands:\n");
        output.push_str("  /users            list users and who is online\n");
        output.push_str("  /open <id|name>   open the conversation with a user\n");
        output.push_str("  /reconnect        connect again after the connection was lost\n");
        output.push_str("  /help             show this help\n");
        output.push_str("  /quit             leave the chat\n");
        output.push_str("Any other line is sent to the open conversation.\n");
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairline_server::domain::{DirectMessage, MessageContent, Timestamp, User, Username};

    fn entry(id: i64, name: &str, is_online: bool) -> DirectoryEntry {
        DirectoryEntry {
            user: User::new(
                UserId::new(id).unwrap(),
                Username::new(name.to_string()).unwrap(),
            ),
            is_online,
        }
    }

    fn timeline_entry(sender: i64, content: &str, delivery: DeliveryState) -> TimelineEntry {
        TimelineEntry {
            message: DirectMessage::new(
                UserId::new(sender).unwrap(),
                UserId::new(3 - sender).unwrap(),
                MessageContent::new(content.to_string()).unwrap(),
                Timestamp::new(1_700_000_000_000),
                None,
            ),
            delivery,
        }
    }

    #[test]
    fn test_format_users_with_empty_list() {
        // テスト項目: ユーザーがいない場合、適切なメッセージが表示される
        // given (前提条件):
        let entries = vec![];

        // when (操作):
        let result = MessageFormatter::format_users(&entries, |_| 0);

        // then (期待する結果):
        assert!(result.contains("Users:"));
        assert!(result.contains("(No other users)"));
    }

    #[test]
    fn test_format_users_with_online_state_and_unread() {
        // テスト項目: オンライン状態と未読数が表示される
        // given (前提条件):
        let entries = vec![entry(2, "bob", true), entry(3, "carol", false)];

        // when (操作):
        let result = MessageFormatter::format_users(&entries, |id| {
            if id.value() == 3 { 4 } else { 0 }
        });

        // then (期待する結果):
        assert!(result.contains("● bob (#2) - online\n"));
        assert!(result.contains("○ carol (#3) - offline [4 unread]"));
    }

    #[test]
    fn test_format_timeline_marks_delivery_state() {
        // テスト項目: 送信中・失敗の項目に状態が付き、送信者名が解決される
        // given (前提条件):
        let entries = vec![
            timeline_entry(2, "hello", DeliveryState::Confirmed),
            timeline_entry(1, "hi", DeliveryState::Pending),
            timeline_entry(1, "again", DeliveryState::Failed),
        ];

        // when (操作):
        let result =
            MessageFormatter::format_timeline(&entries, UserId::new(1).unwrap(), "alice", "bob");

        // then (期待する結果):
        assert!(result.contains("Conversation with @bob"));
        assert!(result.contains("[22:13:20] @bob: hello\n"));
        assert!(result.contains("@alice: hi (sending...)"));
        assert!(result.contains("@alice: again (failed)"));
    }

    #[test]
    fn test_format_unread_notice() {
        // テスト項目: 未読通知に送信者と開き方が含まれる
        // given (前提条件):
        let sender = "carol";

        // when (操作):
        let result = MessageFormatter::format_unread_notice(sender, 2);

        // then (期待する結果):
        assert!(result.contains("2 unread from @carol"));
        assert!(result.contains("/open carol"));
    }
}
