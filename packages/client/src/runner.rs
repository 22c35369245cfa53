//! Client execution logic: the interactive event loop with reconnection support.
//!
//! One task owns every piece of client state ([`UserDirectory`],
//! [`ConversationView`]) and reacts, one at a time, to:
//!
//! - Presence Channel events
//! - terminal input lines (read by rustyline on a blocking thread)
//! - History Service completions (each fetch runs on its own task)
//! - reconnection results (the backoff runs on its own task)

use std::sync::{Arc, Mutex};

use pairline_server::domain::{DirectMessage, UserId};
use pairline_shared::time::SystemClock;
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    api::{ApiClient, HistoryService},
    command::{Command, parse_command},
    conversation::{ConversationView, HistoryTicket, LiveUpdate},
    directory::UserDirectory,
    error::ClientError,
    formatter::MessageFormatter,
    presence_channel::{ChannelEvent, MessageSink, PresenceChannel},
    reconnect::{ConnectPhase, ReconnectPolicy},
    session_store::Session,
    ui::{print_with_prompt, prompt},
};

type HistoryResult = (HistoryTicket, Result<Vec<DirectMessage>, ClientError>);

/// An open Presence Channel and its event stream
pub type Connection = (PresenceChannel, mpsc::UnboundedReceiver<ChannelEvent>);

/// Connection settings for a chat session
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_url: String,
    pub ws_url: String,
    pub reconnect: ReconnectPolicy,
}

/// What the loop does after an input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Reconnect,
    Quit,
}

/// What a channel event did to the session
#[derive(Debug, Clone, PartialEq, Eq)]
enum EventOutcome {
    Handled,
    Disconnected(ClientError),
}

/// State of the Presence Channel as seen by the event loop
enum Link {
    Connected {
        channel: PresenceChannel,
        events: mpsc::UnboundedReceiver<ChannelEvent>,
    },
    Reconnecting(JoinHandle<()>),
    Disconnected,
}

/// Sink used while there is no channel: every send fails
struct OfflineSink;

impl MessageSink for OfflineSink {
    fn send(&self, _message: &DirectMessage) -> Result<(), ClientError> {
        Err(ClientError::ConnectionError(
            "not connected, try /reconnect".to_string(),
        ))
    }
}

/// Open the Presence Channel, retrying failures per `policy`
pub async fn connect_with_policy(
    url: &str,
    user_id: UserId,
    policy: &ReconnectPolicy,
    phase: ConnectPhase,
) -> Result<Connection, ClientError> {
    match PresenceChannel::connect(url, user_id).await {
        Ok(connected) => Ok(connected),
        Err(e) => reconnect(url, user_id, policy, phase, e).await,
    }
}

/// Retry after `error` with capped exponential backoff
pub async fn reconnect(
    url: &str,
    user_id: UserId,
    policy: &ReconnectPolicy,
    phase: ConnectPhase,
    error: ClientError,
) -> Result<Connection, ClientError> {
    let mut error = error;
    let mut attempt = 0;

    while policy.should_attempt_reconnect(&error, attempt, phase) {
        let delay = policy.delay_for(attempt);
        tracing::info!(
            "Reconnecting in {:?}... (attempt {}/{})",
            delay,
            attempt + 1,
            policy.max_attempts
        );
        tokio::time::sleep(delay).await;

        match PresenceChannel::connect(url, user_id).await {
            Ok(connected) => return Ok(connected),
            Err(e) => {
                tracing::warn!("Reconnect attempt {} failed: {}", attempt + 1, e);
                error = e;
            }
        }
        attempt += 1;
    }

    tracing::error!("Giving up on the Presence Channel: {}", error);
    Err(error)
}

/// Run the backoff on its own task and report the outcome on `results`
///
/// `after` is the error that ended the previous connection; `None` means an
/// immediate attempt first (`/reconnect`).
fn spawn_reconnect(
    config: &ChatConfig,
    user_id: UserId,
    after: Option<ClientError>,
    results: mpsc::UnboundedSender<Result<Connection, ClientError>>,
) -> JoinHandle<()> {
    let url = config.ws_url.clone();
    let policy = config.reconnect;
    tokio::spawn(async move {
        let result = match after {
            Some(error) => reconnect(&url, user_id, &policy, ConnectPhase::Reconnect, error).await,
            None => connect_with_policy(&url, user_id, &policy, ConnectPhase::Reconnect).await,
        };
        let _ = results.send(result);
    })
}

/// Next event of the open channel; pending forever while there is none
async fn next_event(link: &mut Link) -> ChannelEvent {
    match link {
        Link::Connected { events, .. } => events.recv().await.unwrap_or_else(|| {
            ChannelEvent::Disconnected(ClientError::ConnectionError(
                "event stream ended".to_string(),
            ))
        }),
        Link::Reconnecting(_) | Link::Disconnected => std::future::pending().await,
    }
}

/// Run an interactive chat session until `/quit`, Ctrl+C or Ctrl+D
///
/// Only the first connect can fail the session. Later connection losses are
/// retried in the background; when retries run out the session stays usable
/// offline until `/reconnect`.
pub async fn run_chat(config: ChatConfig, session: Session) -> Result<(), ClientError> {
    let self_id =
        UserId::new(session.user_id).map_err(|e| ClientError::SessionStore(e.to_string()))?;
    let (channel, events) =
        connect_with_policy(&config.ws_url, self_id, &config.reconnect, ConnectPhase::Initial)
            .await?;
    let mut link = Link::Connected { channel, events };

    let (history_tx, mut history_rx) = mpsc::unbounded_channel::<HistoryResult>();
    let (reconnect_tx, mut reconnect_rx) = mpsc::unbounded_channel();
    let mut chat = ChatSession::new(session, self_id, ApiClient::new(&config.api_url), history_tx);
    chat.refresh_users().await;

    println!(
        "\nYou are '{}'. Type /help for commands. Press Ctrl+C to exit.\n",
        chat.session.username
    );

    let mut input_rx = spawn_input_thread(chat.prompt.clone());

    loop {
        tokio::select! {
            event = next_event(&mut link) => {
                if let EventOutcome::Disconnected(reason) = chat.handle_event(event) {
                    link = Link::Reconnecting(spawn_reconnect(
                        &config,
                        self_id,
                        Some(reason),
                        reconnect_tx.clone(),
                    ));
                }
            }
            Some(result) = reconnect_rx.recv() => {
                match result {
                    Ok((channel, events)) => {
                        link = Link::Connected { channel, events };
                        chat.on_reconnected().await;
                    }
                    Err(e) => {
                        link = Link::Disconnected;
                        chat.on_reconnect_failed(&e);
                    }
                }
            }
            line = input_rx.recv() => {
                let Some(line) = line else {
                    break;
                };
                let flow = match &link {
                    Link::Connected { channel, .. } => chat.handle_line(&line, channel).await,
                    Link::Reconnecting(_) | Link::Disconnected => {
                        chat.handle_line(&line, &OfflineSink).await
                    }
                };
                match flow {
                    Flow::Continue => {}
                    Flow::Quit => break,
                    Flow::Reconnect => match link {
                        Link::Connected { .. } => chat.show("\nAlready connected.\n"),
                        Link::Reconnecting(_) => chat.show("\nAlready reconnecting...\n"),
                        Link::Disconnected => {
                            chat.show("\nReconnecting...\n");
                            link = Link::Reconnecting(spawn_reconnect(
                                &config,
                                self_id,
                                None,
                                reconnect_tx.clone(),
                            ));
                        }
                    },
                }
            }
            Some((ticket, result)) = history_rx.recv() => {
                chat.apply_history(ticket, result);
            }
        }
    }

    match link {
        Link::Connected { channel, .. } => channel.close().await,
        Link::Reconnecting(task) => task.abort(),
        Link::Disconnected => {}
    }
    println!("Bye!");
    Ok(())
}

/// rustyline runs synchronously, so it lives on its own thread
fn spawn_input_thread(prompt: Arc<Mutex<String>>) -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            let current = prompt.lock().map(|p| p.clone()).unwrap_or_default();
            match rl.readline(&current) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line.as_str()).ok();
                    if input_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}

/// Client state owned by the event loop
struct ChatSession {
    session: Session,
    self_id: UserId,
    api: Arc<ApiClient>,
    directory: UserDirectory,
    view: ConversationView,
    history_tx: mpsc::UnboundedSender<HistoryResult>,
    /// Shared with the input thread
    prompt: Arc<Mutex<String>>,
}

impl ChatSession {
    fn new(
        session: Session,
        self_id: UserId,
        api: ApiClient,
        history_tx: mpsc::UnboundedSender<HistoryResult>,
    ) -> Self {
        let prompt = Arc::new(Mutex::new(prompt(&session.username, None)));
        Self {
            self_id,
            api: Arc::new(api),
            directory: UserDirectory::new(self_id),
            view: ConversationView::new(self_id, Arc::new(SystemClock)),
            history_tx,
            prompt,
            session,
        }
    }

    fn show(&self, output: &str) {
        let current = self.prompt.lock().map(|p| p.clone()).unwrap_or_default();
        print_with_prompt(output, &current);
    }

    fn update_prompt(&self) {
        let peer_name = self
            .view
            .selected_peer()
            .map(|peer| self.directory.display_name(peer));
        if let Ok(mut current) = self.prompt.lock() {
            *current = prompt(&self.session.username, peer_name.as_deref());
        }
    }

    async fn refresh_users(&mut self) {
        match self.api.list_users().await {
            Ok(users) => self.directory.replace_users(users),
            Err(e) => tracing::warn!("Failed to load users: {}", e),
        }
    }

    fn request_history(&self, ticket: HistoryTicket) {
        let api = self.api.clone();
        let tx = self.history_tx.clone();
        let self_id = self.self_id;
        tokio::spawn(async move {
            let result = api.get_history(self_id, ticket.peer).await;
            let _ = tx.send((ticket, result));
        });
    }

    fn handle_event(&mut self, event: ChannelEvent) -> EventOutcome {
        match event {
            ChannelEvent::PresenceSnapshot(snapshot) => {
                self.directory.apply_snapshot(&snapshot);
                self.show(&MessageFormatter::format_presence(
                    self.directory.online_count(),
                ));
            }
            ChannelEvent::Message(message) => match self.view.on_live_message(message.clone()) {
                LiveUpdate::Appended => {
                    let name = self.directory.display_name(message.sender_id);
                    if let Some(entry) = self
                        .view
                        .timeline()
                        .iter()
                        .find(|e| e.message.is_same_as(&message))
                    {
                        self.show(&format!("\n{}", MessageFormatter::format_entry(entry, &name)));
                    }
                }
                LiveUpdate::Unread { peer, count } => {
                    let name = self.directory.display_name(peer);
                    self.show(&MessageFormatter::format_unread_notice(&name, count));
                }
                LiveUpdate::Confirmed
                | LiveUpdate::Duplicate
                | LiveUpdate::Buffered
                | LiveUpdate::Ignored => {}
            },
            ChannelEvent::ServerError {
                code,
                message,
                client_message_id,
            } => {
                if let Some(id) = client_message_id {
                    self.view.on_send_rejected(&id);
                }
                tracing::debug!("Server error {:?}: {}", code, message);
                self.show(&MessageFormatter::format_error(&message));
            }
            ChannelEvent::Disconnected(reason) => {
                self.view.mark_pending_failed();
                self.show(&MessageFormatter::format_error(&format!(
                    "Disconnected: {}. Reconnecting...",
                    reason
                )));
                return EventOutcome::Disconnected(reason);
            }
        }
        EventOutcome::Handled
    }

    fn on_reconnect_failed(&self, reason: &ClientError) {
        self.show(&MessageFormatter::format_error(&format!(
            "Disconnected: {}. Type /reconnect to try again.",
            reason
        )));
    }

    /// Reload what may have changed while the connection was down
    async fn on_reconnected(&mut self) {
        self.refresh_users().await;
        if let Some(ticket) = self.view.reselect() {
            self.request_history(ticket);
        }
        self.show("\nReconnected.\n");
    }

    async fn handle_line(&mut self, line: &str, sink: &dyn MessageSink) -> Flow {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(e) => {
                self.show(&MessageFormatter::format_error(&e.to_string()));
                return Flow::Continue;
            }
        };

        match command {
            Command::Quit => return Flow::Quit,
            Command::Reconnect => return Flow::Reconnect,
            Command::Help => self.show(&MessageFormatter::format_help()),
            Command::Users => {
                self.refresh_users().await;
                let output = MessageFormatter::format_users(self.directory.entries(), |id| {
                    self.view.unread_count(id)
                });
                self.show(&output);
            }
            Command::Open(query) => self.open(&query).await,
            Command::Send(text) => match self.view.send_message(&text, sink) {
                Ok(_) => {
                    if let Some(entry) = self.view.timeline().last() {
                        self.show(&MessageFormatter::format_entry(
                            entry,
                            &self.session.username,
                        ));
                    }
                }
                Err(e) => self.show(&MessageFormatter::format_error(&e.to_string())),
            },
        }
        Flow::Continue
    }

    async fn open(&mut self, query: &str) {
        if self.directory.find(query).is_none() {
            self.refresh_users().await;
        }
        let Some(peer) = self.directory.find(query).map(|entry| entry.user.id) else {
            self.show(&MessageFormatter::format_error(&format!(
                "Unknown user '{}'",
                query
            )));
            return;
        };

        match self.view.select_peer(peer) {
            Ok(ticket) => {
                self.request_history(ticket);
                self.update_prompt();
                self.show(&format!(
                    "\nLoading conversation with @{}...\n",
                    self.directory.display_name(peer)
                ));
            }
            Err(e) => self.show(&MessageFormatter::format_error(&e.to_string())),
        }
    }

    fn apply_history(
        &mut self,
        ticket: HistoryTicket,
        result: Result<Vec<DirectMessage>, ClientError>,
    ) {
        match self.view.apply_history(ticket, result) {
            Ok(()) => {
                let peer_name = self.directory.display_name(ticket.peer);
                let output = MessageFormatter::format_timeline(
                    self.view.timeline(),
                    self.self_id,
                    &self.session.username,
                    &peer_name,
                );
                self.show(&output);
            }
            Err(ClientError::StaleResponse(_)) => {}
            Err(e) => self.show(&MessageFormatter::format_error(&format!(
                "Could not load the conversation: {}",
                e
            ))),
        }
    }
}
