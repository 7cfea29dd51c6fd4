//! Terminal frontend for the fundme dispatcher.
//!
//! Run with: RPC_URL=http://127.0.0.1:8545 cargo run -p fundme-tui
//!
//! Keys: c connect, b get balance, w withdraw, f fund the typed amount.
//! Digits, '.', and backspace edit the amount field. q or Ctrl+C quits.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use fundme_core::{ActionKind, MessageKind, Surface};
use fundme_dispatch::{Dispatcher, contract};
use fundme_provider::HttpProvider;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use tokio::sync::mpsc;

/// How long a surfaced message stays on screen.
const MESSAGE_TTL: Duration = Duration::from_millis(5000);

/// Surface event forwarded into the render loop.
enum UiEvent {
    Message(MessageKind, String),
    Connection(bool),
    Balance(String),
    Label(ActionKind, String),
    ClearAmount,
}

/// Surface implementation bridging dispatcher callbacks over a channel.
struct ChannelSurface {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl Surface for ChannelSurface {
    fn message(&self, kind: MessageKind, text: &str) {
        let _ = self.tx.send(UiEvent::Message(kind, text.to_string()));
    }

    fn connection_changed(&self, connected: bool) {
        let _ = self.tx.send(UiEvent::Connection(connected));
    }

    fn balance_updated(&self, formatted: &str) {
        let _ = self.tx.send(UiEvent::Balance(formatted.to_string()));
    }

    fn action_label(&self, action: ActionKind, label: &str) {
        let _ = self.tx.send(UiEvent::Label(action, label.to_string()));
    }

    fn clear_amount(&self) {
        let _ = self.tx.send(UiEvent::ClearAmount);
    }
}

struct App {
    connected: bool,
    balance: Option<String>,
    amount: String,
    message: Option<(MessageKind, String, Instant)>,
    labels: HashMap<ActionKind, String>,
}

impl App {
    fn new() -> Self {
        let labels = [
            (ActionKind::Connect, "Connect".to_string()),
            (ActionKind::Balance, "Get Balance".to_string()),
            (ActionKind::Withdraw, "Withdraw".to_string()),
            (ActionKind::Fund, "Fund".to_string()),
        ]
        .into_iter()
        .collect();
        Self {
            connected: false,
            balance: None,
            amount: String::new(),
            message: None,
            labels,
        }
    }

    fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::Message(kind, text) => self.message = Some((kind, text, Instant::now())),
            UiEvent::Connection(connected) => self.connected = connected,
            UiEvent::Balance(formatted) => self.balance = Some(formatted),
            UiEvent::Label(action, label) => {
                self.labels.insert(action, label);
            }
            UiEvent::ClearAmount => self.amount.clear(),
        }
    }

    fn expire_message(&mut self) {
        if let Some((_, _, since)) = &self.message {
            if since.elapsed() >= MESSAGE_TTL {
                self.message = None;
            }
        }
    }

    fn label(&self, action: ActionKind) -> &str {
        self.labels.get(&action).map_or("", String::as_str)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        eprintln!("Error: {e}");
    }
    result
}

async fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> anyhow::Result<()> {
    let mut app = App::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let provider = std::env::var("RPC_URL").ok().map(HttpProvider::new);
    let dispatcher = Arc::new(Dispatcher::new(
        provider,
        ChannelSurface { tx },
        contract::endpoint(),
    ));

    loop {
        while let Ok(event) = rx.try_recv() {
            app.apply(event);
        }
        app.expire_message();

        terminal.draw(|f| ui(f, &app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                match key {
                    KeyEvent {
                        code: KeyCode::Char('c'),
                        modifiers: KeyModifiers::CONTROL,
                        ..
                    }
                    | KeyEvent {
                        code: KeyCode::Char('q'),
                        ..
                    } => return Ok(()),
                    KeyEvent {
                        code: KeyCode::Char('c'),
                        ..
                    } => {
                        let d = Arc::clone(&dispatcher);
                        tokio::spawn(async move { d.connect().await });
                    }
                    KeyEvent {
                        code: KeyCode::Char('w'),
                        ..
                    } => {
                        let d = Arc::clone(&dispatcher);
                        tokio::spawn(async move { d.withdraw().await });
                    }
                    KeyEvent {
                        code: KeyCode::Char('b'),
                        ..
                    } => {
                        let d = Arc::clone(&dispatcher);
                        tokio::spawn(async move { d.get_balance().await });
                    }
                    KeyEvent {
                        code: KeyCode::Char('f'),
                        ..
                    } => {
                        let d = Arc::clone(&dispatcher);
                        let amount = app.amount.clone();
                        tokio::spawn(async move { d.fund(&amount).await });
                    }
                    KeyEvent {
                        code: KeyCode::Char(ch @ ('0'..='9' | '.')),
                        ..
                    } => app.amount.push(ch),
                    KeyEvent {
                        code: KeyCode::Backspace,
                        ..
                    } => {
                        app.amount.pop();
                    }
                    _ => {}
                }
            }
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Status + balance
            Constraint::Length(3), // Actions
            Constraint::Length(3), // Amount input
            Constraint::Length(3), // Message
            Constraint::Min(0),
        ])
        .split(f.area());

    let status_style = if app.connected {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Yellow)
    };
    let status_text = if app.connected { "Connected" } else { "Not Connected" };
    let balance_text = app
        .balance
        .as_ref()
        .map_or_else(String::new, |b| format!("  |  Contract balance: {b} ETH"));
    let status = Paragraph::new(Line::from(vec![
        Span::styled(status_text, status_style),
        Span::raw(balance_text),
    ]))
    .block(Block::default().borders(Borders::ALL).title("FundMe"));
    f.render_widget(status, chunks[0]);

    let actions = Paragraph::new(Line::from(vec![
        Span::styled("c", Style::default().fg(Color::Yellow)),
        Span::raw(format!(" {}  ", app.label(ActionKind::Connect))),
        Span::styled("b", Style::default().fg(Color::Yellow)),
        Span::raw(format!(" {}  ", app.label(ActionKind::Balance))),
        Span::styled("w", Style::default().fg(Color::Yellow)),
        Span::raw(format!(" {}  ", app.label(ActionKind::Withdraw))),
        Span::styled("f", Style::default().fg(Color::Yellow)),
        Span::raw(format!(" {}  ", app.label(ActionKind::Fund))),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" Quit"),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Actions"));
    f.render_widget(actions, chunks[1]);

    let amount = Paragraph::new(app.amount.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title("ETH amount"));
    f.render_widget(amount, chunks[2]);

    let (text, style) = match &app.message {
        Some((MessageKind::Success, text, _)) => {
            (text.as_str(), Style::default().fg(Color::Green))
        }
        Some((MessageKind::Error, text, _)) => (text.as_str(), Style::default().fg(Color::Red)),
        Some((MessageKind::Info, text, _)) => (text.as_str(), Style::default().fg(Color::Cyan)),
        None => ("", Style::default()),
    };
    let message = Paragraph::new(Span::styled(text, style))
        .block(Block::default().borders(Borders::ALL).title("Messages"));
    f.render_widget(message, chunks[3]);
}
