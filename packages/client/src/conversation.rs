//! Conversation View Model
//!
//! Merges History Service results with live Presence Channel events into one
//! ordered, de-duplicated timeline for the selected peer.
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - 状態遷移: NoPeerSelected → LoadingHistory → Active / HistoryFailed
//! - 履歴とライブメッセージのマージ（重複排除、createdAt 昇順、同時刻は到着順）
//! - 古い履歴レスポンスの破棄（ピア + 世代番号）
//! - 楽観的追加と配信状態（Pending → Confirmed / Failed）
//!
//! ### なぜこのテストが必要か
//! - 同じメッセージが 2 回表示されること、別の会話が混ざることを防ぐ

use std::{collections::HashMap, sync::Arc};

use pairline_server::domain::{
    ClientMessageId, DirectMessage, MessageContent, Timestamp, UserId,
};
use pairline_shared::time::Clock;
use uuid::Uuid;

use crate::{error::ClientError, presence_channel::MessageSink};

/// Delivery state of a timeline entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    /// Sent locally, no echo from the server yet
    Pending,
    /// Persisted by the server (echoed, received live, or returned by history)
    Confirmed,
    /// Could not be sent, or rejected by the server
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    pub message: DirectMessage,
    pub delivery: DeliveryState,
}

impl TimelineEntry {
    fn confirmed(message: DirectMessage) -> Self {
        Self {
            message,
            delivery: DeliveryState::Confirmed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    NoPeerSelected,
    LoadingHistory { peer: UserId },
    Active { peer: UserId },
    HistoryFailed { peer: UserId, reason: String },
}

/// Identifies one history request; only the latest ticket may be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryTicket {
    pub peer: UserId,
    generation: u64,
}

/// What a live message did to the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveUpdate {
    /// Inserted into the rendered timeline
    Appended,
    /// Own optimistic entry confirmed by its echo
    Confirmed,
    /// Already in the rendered timeline
    Duplicate,
    /// Kept until the peer's history is merged
    Buffered,
    /// From a peer that is not rendered
    Unread { peer: UserId, count: usize },
    /// Not addressed to this session
    Ignored,
}

pub struct ConversationView {
    self_id: UserId,
    clock: Arc<dyn Clock>,
    state: ViewState,
    generation: u64,
    timeline: Vec<TimelineEntry>,
    /// Live messages per peer, waiting to be merged with that peer's history
    buffered: HashMap<UserId, Vec<DirectMessage>>,
    /// Locally originated entries not yet confirmed
    outbox: Vec<TimelineEntry>,
    unread: HashMap<UserId, usize>,
}

impl ConversationView {
    pub fn new(self_id: UserId, clock: Arc<dyn Clock>) -> Self {
        Self {
            self_id,
            clock,
            state: ViewState::NoPeerSelected,
            generation: 0,
            timeline: Vec::new(),
            buffered: HashMap::new(),
            outbox: Vec::new(),
            unread: HashMap::new(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn timeline(&self) -> &[TimelineEntry] {
        &self.timeline
    }

    /// The peer whose timeline is rendered
    pub fn active_peer(&self) -> Option<UserId> {
        match self.state {
            ViewState::Active { peer } => Some(peer),
            _ => None,
        }
    }

    /// The peer that was last selected, whatever its loading state
    pub fn selected_peer(&self) -> Option<UserId> {
        match &self.state {
            ViewState::NoPeerSelected => None,
            ViewState::LoadingHistory { peer }
            | ViewState::Active { peer }
            | ViewState::HistoryFailed { peer, .. } => Some(*peer),
        }
    }

    pub fn unread_count(&self, peer: UserId) -> usize {
        self.unread.get(&peer).copied().unwrap_or(0)
    }

    /// Select a peer; the returned ticket must accompany its history result
    pub fn select_peer(&mut self, peer: UserId) -> Result<HistoryTicket, ClientError> {
        if peer == self.self_id {
            return Err(ClientError::Validation(
                "cannot open a conversation with yourself".to_string(),
            ));
        }

        self.generation += 1;
        self.state = ViewState::LoadingHistory { peer };
        self.timeline.clear();
        self.unread.remove(&peer);
        tracing::debug!("Selected peer {} (generation {})", peer, self.generation);

        Ok(HistoryTicket {
            peer,
            generation: self.generation,
        })
    }

    /// Select the current peer again, e.g. after a reconnect
    pub fn reselect(&mut self) -> Option<HistoryTicket> {
        let peer = self.selected_peer()?;
        self.select_peer(peer).ok()
    }

    /// Apply a History Service result
    ///
    /// # Errors
    ///
    /// * `StaleResponse` - the ticket is not the latest selection (result discarded)
    /// * the history error itself - the view moves to `HistoryFailed` with an empty timeline
    pub fn apply_history(
        &mut self,
        ticket: HistoryTicket,
        result: Result<Vec<DirectMessage>, ClientError>,
    ) -> Result<(), ClientError> {
        let is_current = ticket.generation == self.generation
            && self.state == ViewState::LoadingHistory { peer: ticket.peer };
        if !is_current {
            tracing::debug!("Discarding stale history for peer {}", ticket.peer);
            return Err(ClientError::StaleResponse(ticket.peer.value()));
        }
        let peer = ticket.peer;

        let history = match result {
            Ok(history) => history,
            Err(e) => {
                self.timeline.clear();
                self.state = ViewState::HistoryFailed {
                    peer,
                    reason: e.to_string(),
                };
                return Err(e);
            }
        };

        let mut timeline: Vec<TimelineEntry> = history
            .into_iter()
            .filter(|m| m.conversation_key().peer_of(self.self_id) == Some(peer))
            .map(TimelineEntry::confirmed)
            .collect();

        for live in self.buffered.remove(&peer).unwrap_or_default() {
            if !contains(&timeline, &live) {
                timeline.push(TimelineEntry::confirmed(live));
            }
        }

        let (mine, others): (Vec<_>, Vec<_>) = std::mem::take(&mut self.outbox)
            .into_iter()
            .partition(|entry| entry.message.target_id == peer);
        self.outbox = others;
        for entry in mine {
            if contains(&timeline, &entry.message) {
                continue;
            }
            timeline.push(entry.clone());
            self.outbox.push(entry);
        }

        timeline.sort_by_key(|entry| entry.message.created_at);
        self.timeline = timeline;
        self.state = ViewState::Active { peer };
        Ok(())
    }

    /// Handle an inbound message from the Presence Channel
    pub fn on_live_message(&mut self, message: DirectMessage) -> LiveUpdate {
        let peer = match message.conversation_key().peer_of(self.self_id) {
            Some(peer) if peer != self.self_id => peer,
            _ => return LiveUpdate::Ignored,
        };

        if message.sender_id == self.self_id {
            return self.on_echo(peer, message);
        }

        if self.active_peer() == Some(peer) {
            if contains(&self.timeline, &message) {
                return LiveUpdate::Duplicate;
            }
            self.insert_ordered(TimelineEntry::confirmed(message));
            return LiveUpdate::Appended;
        }

        let loading = self.state == ViewState::LoadingHistory { peer };
        if !self.buffer(peer, message) {
            return LiveUpdate::Duplicate;
        }
        if loading {
            return LiveUpdate::Buffered;
        }
        let count = self.unread.entry(peer).or_insert(0);
        *count += 1;
        LiveUpdate::Unread {
            peer,
            count: *count,
        }
    }

    fn on_echo(&mut self, peer: UserId, message: DirectMessage) -> LiveUpdate {
        self.outbox.retain(|entry| !entry.message.is_same_as(&message));

        if self.active_peer() == Some(peer) {
            if let Some(entry) = self
                .timeline
                .iter_mut()
                .find(|entry| entry.message.is_same_as(&message))
            {
                entry.message = message;
                entry.delivery = DeliveryState::Confirmed;
                self.timeline.sort_by_key(|entry| entry.message.created_at);
                return LiveUpdate::Confirmed;
            }
            self.insert_ordered(TimelineEntry::confirmed(message));
            return LiveUpdate::Appended;
        }

        self.buffer(peer, message);
        LiveUpdate::Buffered
    }

    /// Send `content` to the active peer, appending an optimistic entry first
    ///
    /// The entry stays in the timeline even when the sink fails; it is then
    /// marked `Failed` and the sink's error is returned.
    pub fn send_message(
        &mut self,
        content: &str,
        sink: &dyn MessageSink,
    ) -> Result<ClientMessageId, ClientError> {
        let Some(peer) = self.active_peer() else {
            return Err(ClientError::Validation(
                "open a conversation before sending".to_string(),
            ));
        };
        let content = MessageContent::new(content.to_string())
            .map_err(|e| ClientError::Validation(e.to_string()))?;
        let client_message_id = ClientMessageId::new(Uuid::new_v4().to_string())
            .map_err(|e| ClientError::Validation(e.to_string()))?;

        let message = DirectMessage::new(
            self.self_id,
            peer,
            content,
            Timestamp::new(self.clock.now_millis()),
            Some(client_message_id.clone()),
        );
        let sent = sink.send(&message);
        let entry = TimelineEntry {
            message,
            delivery: if sent.is_ok() {
                DeliveryState::Pending
            } else {
                DeliveryState::Failed
            },
        };
        self.timeline.push(entry.clone());
        self.outbox.push(entry);

        sent.map(|()| client_message_id)
    }

    /// The server rejected a send; returns whether a local entry was marked
    pub fn on_send_rejected(&mut self, client_message_id: &str) -> bool {
        let mut marked = false;
        for entry in self.timeline.iter_mut().chain(self.outbox.iter_mut()) {
            let matches = entry
                .message
                .client_message_id
                .as_ref()
                .is_some_and(|id| id.as_str() == client_message_id);
            if matches {
                entry.delivery = DeliveryState::Failed;
                marked = true;
            }
        }
        marked
    }

    /// The connection dropped: nothing pending can be confirmed by an echo anymore
    pub fn mark_pending_failed(&mut self) {
        for entry in self.timeline.iter_mut().chain(self.outbox.iter_mut()) {
            if entry.delivery == DeliveryState::Pending {
                entry.delivery = DeliveryState::Failed;
            }
        }
    }

    /// Insert after every entry with the same or an earlier `created_at`
    fn insert_ordered(&mut self, entry: TimelineEntry) {
        let index = self
            .timeline
            .partition_point(|e| e.message.created_at <= entry.message.created_at);
        self.timeline.insert(index, entry);
    }

    /// Buffer a live message for later merge; `false` if it is already buffered
    fn buffer(&mut self, peer: UserId, message: DirectMessage) -> bool {
        let buffered = self.buffered.entry(peer).or_default();
        if buffered.iter().any(|m| m.is_same_as(&message)) {
            return false;
        }
        buffered.push(message);
        true
    }
}

fn contains(timeline: &[TimelineEntry], message: &DirectMessage) -> bool {
    timeline.iter().any(|entry| entry.message.is_same_as(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence_channel::MockMessageSink;
    use pairline_shared::time::FixedClock;

    const NOW: i64 = 1_700_000_000_000;

    fn uid(id: i64) -> UserId {
        UserId::new(id).unwrap()
    }

    fn msg(sender: i64, target: i64, content: &str, at: i64) -> DirectMessage {
        DirectMessage::new(
            uid(sender),
            uid(target),
            MessageContent::new(content.to_string()).unwrap(),
            Timestamp::new(at),
            None,
        )
    }

    fn view() -> ConversationView {
        ConversationView::new(uid(1), Arc::new(FixedClock::new(NOW)))
    }

    fn accepting_sink() -> MockMessageSink {
        let mut sink = MockMessageSink::new();
        sink.expect_send().returning(|_| Ok(()));
        sink
    }

    fn contents(view: &ConversationView) -> Vec<&str> {
        view.timeline()
            .iter()
            .map(|e| e.message.content.as_str())
            .collect()
    }

    /// Server copy of a local entry: same client id, server-stamped createdAt
    fn server_copy(local: &DirectMessage, created_at: i64) -> DirectMessage {
        DirectMessage::new(
            local.sender_id,
            local.target_id,
            local.content.clone(),
            Timestamp::new(created_at),
            local.client_message_id.clone(),
        )
    }

    #[test]
    fn test_select_then_empty_history_becomes_active() {
        // テスト項目: ピア選択で LoadingHistory になり、空の履歴で Active になる
        // given (前提条件):
        let mut view = view();

        // when (操作):
        let ticket = view.select_peer(uid(2)).unwrap();
        let loading = view.state().clone();
        let result = view.apply_history(ticket, Ok(vec![]));

        // then (期待する結果):
        assert_eq!(loading, ViewState::LoadingHistory { peer: uid(2) });
        assert!(result.is_ok());
        assert_eq!(view.state(), &ViewState::Active { peer: uid(2) });
        assert!(view.timeline().is_empty());
    }

    #[test]
    fn test_select_self_is_rejected() {
        // テスト項目: 自分自身との会話は開けない
        // given (前提条件):
        let mut view = view();

        // when (操作):
        let result = view.select_peer(uid(1));

        // then (期待する結果):
        assert!(matches!(result, Err(ClientError::Validation(_))));
        assert_eq!(view.state(), &ViewState::NoPeerSelected);
    }

    #[test]
    fn test_buffered_live_copy_of_history_message_is_not_duplicated() {
        // テスト項目: 履歴に含まれるメッセージのライブ受信分はマージで 1 件にまとまる
        // given (前提条件):
        let mut view = view();
        let first = msg(2, 1, "hello", 1_000);
        let second = msg(1, 2, "hi back", 2_000);
        let ticket = view.select_peer(uid(2)).unwrap();
        assert_eq!(view.on_live_message(first.clone()), LiveUpdate::Buffered);

        // when (操作):
        view.apply_history(ticket, Ok(vec![first, second])).unwrap();

        // then (期待する結果):
        assert_eq!(contents(&view), vec!["hello", "hi back"]);
    }

    #[test]
    fn test_live_message_arriving_during_load_is_merged_in_order() {
        // テスト項目: 読み込み中に届いた新しいメッセージは履歴と時刻順にマージされる
        // given (前提条件):
        let mut view = view();
        let ticket = view.select_peer(uid(2)).unwrap();
        view.on_live_message(msg(2, 1, "late", 3_000));
        view.on_live_message(msg(2, 1, "tie", 1_000));

        // when (操作):
        view.apply_history(ticket, Ok(vec![msg(1, 2, "early", 1_000)]))
            .unwrap();

        // then (期待する結果):
        assert_eq!(contents(&view), vec!["early", "tie", "late"]);
    }

    #[test]
    fn test_stale_history_response_is_discarded() {
        // テスト項目: X の履歴が返る前に Y を選んだ場合、X の結果は破棄され Y の履歴のみ表示される
        // given (前提条件):
        let mut view = view();
        let ticket_x = view.select_peer(uid(2)).unwrap();
        let ticket_y = view.select_peer(uid(3)).unwrap();

        // when (操作):
        let late_x = view.apply_history(ticket_x, Ok(vec![msg(2, 1, "from x", 1_000)]));
        let y = view.apply_history(ticket_y, Ok(vec![msg(3, 1, "from y", 2_000)]));

        // then (期待する結果):
        assert_eq!(late_x, Err(ClientError::StaleResponse(2)));
        assert!(y.is_ok());
        assert_eq!(view.state(), &ViewState::Active { peer: uid(3) });
        assert_eq!(contents(&view), vec!["from y"]);
    }

    #[test]
    fn test_reselecting_same_peer_invalidates_older_ticket() {
        // テスト項目: 同じピアを選び直した場合も古いチケットの結果は破棄される
        // given (前提条件):
        let mut view = view();
        let old = view.select_peer(uid(2)).unwrap();
        let new = view.select_peer(uid(2)).unwrap();

        // when (操作):
        let stale = view.apply_history(old, Ok(vec![msg(2, 1, "old", 1_000)]));
        view.apply_history(new, Ok(vec![])).unwrap();

        // then (期待する結果):
        assert_eq!(stale, Err(ClientError::StaleResponse(2)));
        assert!(view.timeline().is_empty());
    }

    #[test]
    fn test_history_failure_clears_timeline() {
        // テスト項目: 履歴取得に失敗すると HistoryFailed になりタイムラインは空になる
        // given (前提条件):
        let mut view = view();
        let ticket = view.select_peer(uid(2)).unwrap();
        view.apply_history(ticket, Ok(vec![msg(2, 1, "old", 1_000)]))
            .unwrap();
        let ticket = view.select_peer(uid(2)).unwrap();

        // when (操作):
        let result = view.apply_history(
            ticket,
            Err(ClientError::ConnectionError("timeout".to_string())),
        );

        // then (期待する結果):
        assert!(result.is_err());
        assert!(matches!(view.state(), ViewState::HistoryFailed { .. }));
        assert!(view.timeline().is_empty());
        assert_eq!(view.selected_peer(), Some(uid(2)));
    }

    #[test]
    fn test_send_appends_pending_then_echo_confirms() {
        // テスト項目: 送信は即座に Pending で表示され、エコーで Confirmed の 1 件になる
        // given (前提条件):
        let mut view = view();
        let ticket = view.select_peer(uid(2)).unwrap();
        view.apply_history(ticket, Ok(vec![])).unwrap();
        let mut sink = MockMessageSink::new();
        sink.expect_send()
            .withf(|m| m.sender_id.value() == 1 && m.target_id.value() == 2)
            .times(1)
            .returning(|_| Ok(()));

        // when (操作):
        view.send_message("hi", &sink).unwrap();
        let pending = view.timeline()[0].delivery;
        let local = view.timeline()[0].message.clone();
        let update = view.on_live_message(server_copy(&local, NOW + 5));

        // then (期待する結果):
        assert_eq!(pending, DeliveryState::Pending);
        assert_eq!(update, LiveUpdate::Confirmed);
        assert_eq!(view.timeline().len(), 1);
        assert_eq!(view.timeline()[0].delivery, DeliveryState::Confirmed);
        assert_eq!(view.timeline()[0].message.created_at, Timestamp::new(NOW + 5));
    }

    #[test]
    fn test_send_empty_content_never_reaches_sink() {
        // テスト項目: 空本文の送信は ValidationError になりチャンネルに渡らない
        // given (前提条件):
        let mut view = view();
        let ticket = view.select_peer(uid(2)).unwrap();
        view.apply_history(ticket, Ok(vec![])).unwrap();
        let mut sink = MockMessageSink::new();
        sink.expect_send().times(0);

        // when (操作):
        let result = view.send_message("   ", &sink);

        // then (期待する結果):
        assert!(matches!(result, Err(ClientError::Validation(_))));
        assert!(view.timeline().is_empty());
    }

    #[test]
    fn test_send_without_active_peer_is_rejected() {
        // テスト項目: 会話を開いていない状態での送信は拒否される
        // given (前提条件):
        let mut view = view();
        let mut sink = MockMessageSink::new();
        sink.expect_send().times(0);

        // when (操作):
        let result = view.send_message("hello", &sink);

        // then (期待する結果):
        assert!(matches!(result, Err(ClientError::Validation(_))));
    }

    #[test]
    fn test_send_on_closed_channel_marks_failed() {
        // テスト項目: チャンネルが使えない場合、楽観的な項目は残り Failed になる
        // given (前提条件):
        let mut view = view();
        let ticket = view.select_peer(uid(2)).unwrap();
        view.apply_history(ticket, Ok(vec![])).unwrap();
        let mut sink = MockMessageSink::new();
        sink.expect_send()
            .returning(|_| Err(ClientError::ConnectionError("closed".to_string())));

        // when (操作):
        let result = view.send_message("anyone?", &sink);

        // then (期待する結果):
        assert!(matches!(result, Err(ClientError::ConnectionError(_))));
        assert_eq!(view.timeline().len(), 1);
        assert_eq!(view.timeline()[0].delivery, DeliveryState::Failed);
    }

    #[test]
    fn test_rejected_send_is_marked_failed() {
        // テスト項目: サーバーのエラーフレームで該当の送信が Failed になる
        // given (前提条件):
        let mut view = view();
        let ticket = view.select_peer(uid(2)).unwrap();
        view.apply_history(ticket, Ok(vec![])).unwrap();
        let cid = view.send_message("hi", &accepting_sink()).unwrap();

        // when (操作):
        let marked = view.on_send_rejected(cid.as_str());
        let unknown = view.on_send_rejected("no-such-id");

        // then (期待する結果):
        assert!(marked);
        assert!(!unknown);
        assert_eq!(view.timeline()[0].delivery, DeliveryState::Failed);
    }

    #[test]
    fn test_message_from_other_peer_is_counted_not_rendered() {
        // テスト項目: 表示中でないピアからのメッセージはタイムラインに混ざらず未読になる
        // given (前提条件):
        let mut view = view();
        let ticket = view.select_peer(uid(2)).unwrap();
        view.apply_history(ticket, Ok(vec![])).unwrap();

        // when (操作):
        let first = view.on_live_message(msg(3, 1, "psst", 1_000));
        let second = view.on_live_message(msg(3, 1, "psst again", 2_000));

        // then (期待する結果):
        assert_eq!(first, LiveUpdate::Unread { peer: uid(3), count: 1 });
        assert_eq!(second, LiveUpdate::Unread { peer: uid(3), count: 2 });
        assert!(view.timeline().is_empty());
        assert_eq!(view.unread_count(uid(3)), 2);

        // 選択すると履歴とマージされ、未読は消える
        let ticket = view.select_peer(uid(3)).unwrap();
        view.apply_history(ticket, Ok(vec![msg(3, 1, "psst", 1_000)]))
            .unwrap();
        assert_eq!(contents(&view), vec!["psst", "psst again"]);
        assert_eq!(view.unread_count(uid(3)), 0);
    }

    #[test]
    fn test_live_message_for_active_peer_is_appended_once() {
        // テスト項目: 表示中のピアからのメッセージは追加され、同じものの再受信は無視される
        // given (前提条件):
        let mut view = view();
        let ticket = view.select_peer(uid(2)).unwrap();
        view.apply_history(ticket, Ok(vec![msg(2, 1, "one", 1_000)]))
            .unwrap();

        // when (操作):
        let appended = view.on_live_message(msg(2, 1, "two", 2_000));
        let duplicate = view.on_live_message(msg(2, 1, "one", 1_000));
        let unrelated = view.on_live_message(msg(4, 5, "not mine", 3_000));

        // then (期待する結果):
        assert_eq!(appended, LiveUpdate::Appended);
        assert_eq!(duplicate, LiveUpdate::Duplicate);
        assert_eq!(unrelated, LiveUpdate::Ignored);
        assert_eq!(contents(&view), vec!["one", "two"]);
    }

    #[test]
    fn test_peer_message_reusing_own_client_id_is_still_appended() {
        // テスト項目: ピアが自分の送信と同じ clientMessageId を使っても、別のメッセージとして表示される
        // given (前提条件):
        let mut view = view();
        let ticket = view.select_peer(uid(2)).unwrap();
        view.apply_history(ticket, Ok(vec![])).unwrap();
        let cid = view.send_message("mine", &accepting_sink()).unwrap();
        let theirs = DirectMessage::new(
            uid(2),
            uid(1),
            MessageContent::new("theirs".to_string()).unwrap(),
            Timestamp::new(NOW + 10),
            Some(cid),
        );

        // when (操作):
        let update = view.on_live_message(theirs);

        // then (期待する結果):
        assert_eq!(update, LiveUpdate::Appended);
        assert_eq!(contents(&view), vec!["mine", "theirs"]);
        assert_eq!(view.timeline()[0].delivery, DeliveryState::Pending);
    }

    #[test]
    fn test_unconfirmed_entries_survive_reselect_and_collapse_with_history() {
        // テスト項目: 再接続後の再選択で、保存済みの送信は 1 件にまとまり、未保存の送信は Failed のまま残る
        // given (前提条件):
        let mut view = view();
        let ticket = view.select_peer(uid(2)).unwrap();
        view.apply_history(ticket, Ok(vec![])).unwrap();
        let sink = accepting_sink();
        view.send_message("persisted", &sink).unwrap();
        view.send_message("lost", &sink).unwrap();
        let persisted = view.timeline()[0].message.clone();

        // when (操作):
        view.mark_pending_failed();
        let ticket = view.reselect().unwrap();
        view.apply_history(ticket, Ok(vec![server_copy(&persisted, NOW + 1)]))
            .unwrap();

        // then (期待する結果):
        assert_eq!(contents(&view), vec!["lost", "persisted"]);
        let states: Vec<DeliveryState> = view.timeline().iter().map(|e| e.delivery).collect();
        assert_eq!(states, vec![DeliveryState::Failed, DeliveryState::Confirmed]);
    }
}
