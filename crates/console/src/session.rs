//! Session controller: owns all mutable session state and serializes every
//! mutation through one event loop.
//!
//! Two execution contexts feed the session: the terminal input stream and
//! the transport's notification channel. Both are drained by a single
//! `tokio::select!` loop, so an inbound append and an in-progress keystroke
//! edit can never interleave into a torn render. A draw happens immediately
//! after every applied event.

use std::sync::Arc;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures_util::StreamExt;
use proto::{ConnectionState, Error, StyleTag, TransportEvent};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use transport::{Transport, format_payload};

use crate::config::Config;
use crate::editor::LineEditor;
use crate::render::Renderer;
use crate::router::{self, LocalCommand};
use crate::scroll::ScrollBuffer;

/// Built-in help text, shown at startup and on `help`.
const HELP_MESSAGE: &str = "Type commands and press enter to send them to the server.\n\
Type \"help\" to view available commands.\n\
\n\
Use up and down arrows to view command history.\n\
Use page up and page down to view output history.";

/// Banner appended before the help text at startup.
const WELCOME_MESSAGE: &str = "Welcome to the animation server console";

/// The interactive session: scrollback, editor, renderer, connection state.
pub struct SessionController {
    scroll: ScrollBuffer,
    editor: LineEditor,
    renderer: Renderer,
    transport: Arc<dyn Transport>,
    state: ConnectionState,
    exiting: bool,
    /// Animation-info payloads stay hidden until the operator has asked the
    /// server for something once; then they are shown for the rest of the
    /// session.
    show_animation_info: bool,
    host: String,
    port: u16,
}

impl SessionController {
    /// Builds a session around a transport and renderer, sized to the
    /// renderer's current viewport.
    pub fn new(transport: Arc<dyn Transport>, renderer: Renderer, config: &Config) -> Self {
        let (width, height) = renderer.viewport();
        Self {
            scroll: ScrollBuffer::with_overlap(width, height, config.terminal.scroll_overlap),
            editor: LineEditor::new(),
            renderer,
            transport,
            state: ConnectionState::Disconnected,
            exiting: false,
            show_animation_info: false,
            host: config.server.host.clone(),
            port: config.server.port,
        }
    }

    /// Runs the session until the operator exits: greets, issues the initial
    /// connect, then drains terminal input and transport notifications
    /// through one loop. Blocks until the `Exiting` state is reached.
    pub async fn start(
        &mut self,
        mut events: mpsc::Receiver<TransportEvent>,
    ) -> Result<(), Error> {
        self.scroll
            .append(WELCOME_MESSAGE, StyleTag::SystemMessageEmphasis);
        self.scroll.append(HELP_MESSAGE, StyleTag::SystemMessage);
        self.begin_connect().await;
        self.renderer.draw(&self.scroll, &self.editor)?;

        let mut input = EventStream::new();
        info!(host = %self.host, port = self.port, "Session started");

        while !self.exiting {
            tokio::select! {
                maybe_input = input.next() => {
                    match maybe_input {
                        Some(Ok(event)) => self.handle_terminal_event(event).await,
                        Some(Err(e)) => {
                            // Malformed key event: drop it, keep the loop alive.
                            debug!(error = %e, "Dropped undecodable input event");
                        }
                        None => break,
                    }
                }
                maybe_event = events.recv() => {
                    match maybe_event {
                        Some(event) => self.handle_transport_event(event).await,
                        None => break,
                    }
                }
            }
            self.renderer.draw(&self.scroll, &self.editor)?;
        }

        info!("Session ended");
        Ok(())
    }

    /// Applies one terminal event (keystroke or resize).
    pub async fn handle_terminal_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key).await,
            Event::Resize(cols, rows) => {
                // Bottom row is reserved for the prompt.
                self.scroll.resize(
                    cols.max(1) as usize,
                    (rows.saturating_sub(1)).max(1) as usize,
                );
            }
            _ => {}
        }
    }

    /// Applies one keystroke to the editor, history, or scroll window.
    pub async fn handle_key(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => self.exit().await,
            (_, KeyCode::Enter) => {
                let line = self.editor.submit();
                self.handle_line(&line).await;
            }
            (mods, KeyCode::Char(c))
                if mods == KeyModifiers::NONE || mods == KeyModifiers::SHIFT =>
            {
                self.editor.insert_char(c)
            }
            (_, KeyCode::Backspace) => self.editor.backspace(),
            (_, KeyCode::Up) => self.editor.history_older(),
            (_, KeyCode::Down) => self.editor.history_newer(),
            (_, KeyCode::PageUp) => self.scroll.page_up(),
            (_, KeyCode::PageDown) => self.scroll.page_down(),
            _ => {}
        }
    }

    /// Dispatches one submitted line: echoed into the scrollback, then
    /// either handled locally or forwarded to the server. An empty line is
    /// a redraw-only no-op.
    pub async fn handle_line(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }
        self.scroll.append(line, StyleTag::Command);

        match router::parse_local(line) {
            Some(LocalCommand::Exit) => self.exit().await,
            Some(LocalCommand::Connect { host, port }) => {
                if self.state == ConnectionState::Connecting {
                    self.system("A connect attempt is already in progress");
                    return;
                }
                if let Some(host) = host {
                    self.host = host;
                }
                if let Some(port) = port {
                    self.port = port;
                }
                self.begin_connect().await;
            }
            Some(LocalCommand::Disconnect) => {
                // A cancelled in-flight attempt resolves silently in the
                // transport, so the state change is applied here.
                let was_connecting = self.state == ConnectionState::Connecting;
                match self.transport.disconnect().await {
                    Ok(()) if was_connecting => {
                        self.state = ConnectionState::Disconnected;
                        self.system("Connect attempt cancelled");
                    }
                    Ok(()) => {}
                    Err(e) => self.system(&e.to_string()),
                }
            }
            Some(LocalCommand::Help) => {
                self.scroll
                    .append("Terminal Help", StyleTag::SystemMessageEmphasis);
                self.scroll.append(HELP_MESSAGE, StyleTag::SystemMessage);
                if self.state == ConnectionState::Connected {
                    self.scroll.append("Server Help", StyleTag::NormalEmphasis);
                    self.forward("help").await;
                }
            }
            Some(LocalCommand::Invalid(message)) => self.system(&message),
            None => {
                if self.state == ConnectionState::Connected {
                    // The operator asked the server for something: stop
                    // hiding animation info for the rest of the session.
                    self.show_animation_info = true;
                    self.forward(line).await;
                } else {
                    self.system(&format!("no such command: {line}"));
                }
            }
        }
    }

    /// Applies one asynchronous transport notification.
    pub async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected { addr } => {
                self.state = ConnectionState::Connected;
                self.scroll
                    .append(&format!("Connected to {addr}"), StyleTag::ConnectionEvent);
            }
            TransportEvent::ConnectFailed { addr, reason } => {
                self.state = ConnectionState::Disconnected;
                debug!(addr = %addr, reason = %reason, "Connect failed");
                self.scroll.append(
                    &format!("Could not connect to {addr}"),
                    StyleTag::ConnectionEvent,
                );
            }
            TransportEvent::Disconnected { addr } => {
                // While Connecting, a Disconnected notice belongs to the
                // connection just torn down; the attempt is still in flight.
                if self.state == ConnectionState::Connected {
                    self.state = ConnectionState::Disconnected;
                }
                self.scroll.append(
                    &format!("Disconnected from {addr}"),
                    StyleTag::ConnectionEvent,
                );
            }
            TransportEvent::Received { payload } => {
                if self.state != ConnectionState::Connected {
                    warn!("Dropped inbound payload while not connected");
                    return;
                }
                let message = format_payload(&payload);
                if message.text.is_empty() {
                    return;
                }
                if message.category.suppressible() && !self.show_animation_info {
                    debug!("Suppressed animation info payload");
                    return;
                }
                self.scroll.append(&message.text, StyleTag::Normal);
            }
        }
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    /// Whether the session has entered the terminal `Exiting` state.
    pub fn is_exiting(&self) -> bool {
        self.exiting
    }

    /// Read access to the scrollback, for rendering and inspection.
    pub fn scroll(&self) -> &ScrollBuffer {
        &self.scroll
    }

    /// Read access to the edit line.
    pub fn editor(&self) -> &LineEditor {
        &self.editor
    }

    /// Issues a connect attempt to the configured address.
    async fn begin_connect(&mut self) {
        let addr = format!("{}:{}", self.host, self.port);
        self.state = ConnectionState::Connecting;
        if let Err(e) = self.transport.connect(&addr).await {
            self.state = ConnectionState::Disconnected;
            debug!(error = %e, "Connect request could not be issued");
            self.scroll.append(
                &format!("Could not connect to {addr}"),
                StyleTag::ConnectionEvent,
            );
        }
    }

    /// Forwards a command to the server; a failed send is reported as a
    /// system message and never retried.
    async fn forward(&mut self, command: &str) {
        if let Err(e) = self.transport.send(command).await {
            self.system(&e.to_string());
        }
    }

    /// Enters the terminal `Exiting` state and tears down the transport.
    async fn exit(&mut self) {
        self.exiting = true;
        if let Err(e) = self.transport.disconnect().await {
            // Exiting without a live connection is fine.
            debug!(error = %e, "Transport teardown on exit");
        }
    }

    /// Appends a console-originated message.
    fn system(&mut self, text: &str) {
        self.scroll.append(text, StyleTag::SystemMessage);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use proto::{DisplayLine, TransportError};

    use super::*;

    #[derive(Default)]
    struct MockTransport {
        connects: Mutex<Vec<String>>,
        sends: Mutex<Vec<String>>,
        disconnects: AtomicUsize,
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn connect(&self, addr: &str) -> Result<(), TransportError> {
            self.connects.lock().unwrap().push(addr.to_string());
            Ok(())
        }

        async fn disconnect(&self) -> Result<(), TransportError> {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn send(&self, cmd: &str) -> Result<(), TransportError> {
            self.sends.lock().unwrap().push(cmd.to_string());
            Ok(())
        }
    }

    fn controller() -> (SessionController, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::default());
        let session = SessionController::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            Renderer::headless(),
            &Config::default(),
        );
        (session, transport)
    }

    fn window(session: &SessionController) -> Vec<DisplayLine> {
        session
            .scroll()
            .visible_window()
            .into_iter()
            .filter(|l| !l.text.is_empty())
            .collect()
    }

    fn has_line(session: &SessionController, text: &str, style: StyleTag) -> bool {
        window(session)
            .iter()
            .any(|l| l.text == text && l.style == style)
    }

    async fn connect(session: &mut SessionController) {
        session
            .handle_transport_event(TransportEvent::Connected {
                addr: "localhost:6921".into(),
            })
            .await;
        assert_eq!(session.connection_state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn non_local_line_while_disconnected_is_rejected_without_send() {
        let (mut session, transport) = controller();
        session.handle_line("color 255 0 0").await;

        assert!(transport.sends.lock().unwrap().is_empty());
        assert!(has_line(
            &session,
            "no such command: color 255 0 0",
            StyleTag::SystemMessage
        ));
    }

    #[tokio::test]
    async fn non_local_line_while_connected_is_forwarded_verbatim() {
        let (mut session, transport) = controller();
        connect(&mut session).await;

        session.handle_line("color 255 0 0").await;
        assert_eq!(*transport.sends.lock().unwrap(), vec!["color 255 0 0"]);
        assert!(has_line(&session, "color 255 0 0", StyleTag::Command));
    }

    #[tokio::test]
    async fn exit_while_connected_disconnects_exactly_once() {
        let (mut session, transport) = controller();
        connect(&mut session).await;

        session.handle_line("exit").await;
        assert!(session.is_exiting());
        assert_eq!(transport.disconnects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn animation_info_is_suppressed_until_first_forward() {
        let (mut session, transport) = controller();
        connect(&mut session).await;

        let info = r#"AINF:{"name":"Bounce"}"#;
        session
            .handle_transport_event(TransportEvent::Received {
                payload: info.into(),
            })
            .await;
        assert!(!window(&session).iter().any(|l| l.text.contains("Bounce")));

        session.handle_line("bounce").await;
        assert_eq!(transport.sends.lock().unwrap().len(), 1);

        session
            .handle_transport_event(TransportEvent::Received {
                payload: info.into(),
            })
            .await;
        assert!(window(&session).iter().any(|l| l.text.contains("Bounce")));
    }

    #[tokio::test]
    async fn other_inbound_payloads_are_shown_immediately() {
        let (mut session, _transport) = controller();
        connect(&mut session).await;

        session
            .handle_transport_event(TransportEvent::Received {
                payload: "plain status line".into(),
            })
            .await;
        assert!(has_line(&session, "plain status line", StyleTag::Normal));
    }

    #[tokio::test]
    async fn inbound_payloads_are_dropped_while_not_connected() {
        let (mut session, _transport) = controller();
        session
            .handle_transport_event(TransportEvent::Received {
                payload: "stale data".into(),
            })
            .await;
        assert!(!has_line(&session, "stale data", StyleTag::Normal));
    }

    #[tokio::test]
    async fn connect_command_issues_attempt_and_overrides_address() {
        let (mut session, transport) = controller();
        session.handle_line("connect 10.0.0.5 1606").await;

        assert_eq!(session.connection_state(), ConnectionState::Connecting);
        assert_eq!(*transport.connects.lock().unwrap(), vec!["10.0.0.5:1606"]);
    }

    #[tokio::test]
    async fn connect_with_invalid_port_reports_and_stays_put() {
        let (mut session, transport) = controller();
        session.handle_line("connect 10.0.0.5 potato").await;

        assert!(transport.connects.lock().unwrap().is_empty());
        assert!(has_line(
            &session,
            "Port potato is not a valid integer",
            StyleTag::SystemMessage
        ));
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn connect_while_connecting_is_rejected() {
        let (mut session, transport) = controller();
        session.handle_line("connect").await;
        session.handle_line("connect").await;

        assert_eq!(transport.connects.lock().unwrap().len(), 1);
        assert!(has_line(
            &session,
            "A connect attempt is already in progress",
            StyleTag::SystemMessage
        ));
    }

    #[tokio::test]
    async fn disconnect_while_connecting_returns_to_disconnected() {
        let (mut session, transport) = controller();
        session.handle_line("connect").await;
        assert_eq!(session.connection_state(), ConnectionState::Connecting);

        session.handle_line("disconnect").await;
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);
        assert!(has_line(
            &session,
            "Connect attempt cancelled",
            StyleTag::SystemMessage
        ));

        // The cancelled attempt no longer blocks a fresh connect.
        session.handle_line("connect").await;
        assert_eq!(session.connection_state(), ConnectionState::Connecting);
        assert_eq!(transport.connects.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn connect_failed_event_reports_and_returns_to_disconnected() {
        let (mut session, _transport) = controller();
        session.handle_line("connect").await;

        session
            .handle_transport_event(TransportEvent::ConnectFailed {
                addr: "localhost:6921".into(),
                reason: "refused".into(),
            })
            .await;
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);
        assert!(has_line(
            &session,
            "Could not connect to localhost:6921",
            StyleTag::ConnectionEvent
        ));
    }

    #[tokio::test]
    async fn peer_disconnect_reports_and_transitions() {
        let (mut session, _transport) = controller();
        connect(&mut session).await;

        session
            .handle_transport_event(TransportEvent::Disconnected {
                addr: "localhost:6921".into(),
            })
            .await;
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);
        assert!(has_line(
            &session,
            "Disconnected from localhost:6921",
            StyleTag::ConnectionEvent
        ));
    }

    #[tokio::test]
    async fn help_while_disconnected_prints_terminal_help_only() {
        let (mut session, transport) = controller();
        session.handle_line("help").await;

        assert!(has_line(
            &session,
            "Terminal Help",
            StyleTag::SystemMessageEmphasis
        ));
        assert!(!has_line(&session, "Server Help", StyleTag::NormalEmphasis));
        assert!(transport.sends.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn help_while_connected_also_requests_server_help() {
        let (mut session, transport) = controller();
        connect(&mut session).await;
        session.handle_line("help").await;

        assert!(has_line(&session, "Server Help", StyleTag::NormalEmphasis));
        assert_eq!(*transport.sends.lock().unwrap(), vec!["help"]);
    }

    #[tokio::test]
    async fn empty_submission_appends_nothing() {
        let (mut session, _transport) = controller();
        let before = session.scroll().len();
        session.handle_line("").await;
        assert_eq!(session.scroll().len(), before);
    }

    #[tokio::test]
    async fn control_chords_do_not_insert_characters() {
        let (mut session, _transport) = controller();
        session
            .handle_key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL))
            .await;
        assert_eq!(session.editor().text(), "");

        session
            .handle_key(KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT))
            .await;
        assert_eq!(session.editor().text(), "A");
    }

    #[tokio::test]
    async fn typed_keys_build_up_and_submit_through_the_editor() {
        use crossterm::event::{KeyEvent, KeyModifiers};

        let (mut session, transport) = controller();
        connect(&mut session).await;

        for c in "strip info".chars() {
            session
                .handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
                .await;
        }
        session
            .handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
            .await;

        assert_eq!(*transport.sends.lock().unwrap(), vec!["strip info"]);
        assert!(has_line(&session, "strip info", StyleTag::Command));
    }
}
