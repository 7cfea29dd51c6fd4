//! Web frontend for the fundme dispatcher.
//!
//! Run with: RPC_URL=http://127.0.0.1:8545 cargo run -p fundme-web
//!
//! Serves an embedded single-page UI (connect / fund / withdraw / balance)
//! and bridges it to the dispatcher over a WebSocket. Leaving RPC_URL
//! unset starts the page with no wallet provider, exercising the
//! install-prompt path.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::{Html, IntoResponse},
    routing::get,
};
use fundme_core::{ActionKind, MessageKind, Surface};
use fundme_dispatch::{Dispatcher, contract};
use fundme_provider::HttpProvider;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Message from the page to the server: one of the four actions.
#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMsg {
    Connect,
    Withdraw,
    Fund { amount: String },
    GetBalance,
}

/// Surface event pushed to every connected page.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMsg {
    Message { kind: MessageKind, text: String },
    Connection { connected: bool },
    Balance { formatted: String },
    ActionLabel { action: ActionKind, label: String },
    ClearAmount,
}

/// Surface implementation broadcasting to all open sockets.
#[derive(Clone)]
struct WsSurface {
    events: broadcast::Sender<ServerMsg>,
}

impl Surface for WsSurface {
    fn message(&self, kind: MessageKind, text: &str) {
        let _ = self.events.send(ServerMsg::Message {
            kind,
            text: text.to_string(),
        });
    }

    fn connection_changed(&self, connected: bool) {
        let _ = self.events.send(ServerMsg::Connection { connected });
    }

    fn balance_updated(&self, formatted: &str) {
        let _ = self.events.send(ServerMsg::Balance {
            formatted: formatted.to_string(),
        });
    }

    fn action_label(&self, action: ActionKind, label: &str) {
        let _ = self.events.send(ServerMsg::ActionLabel {
            action,
            label: label.to_string(),
        });
    }

    fn clear_amount(&self) {
        let _ = self.events.send(ServerMsg::ClearAmount);
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    dispatcher: Arc<Dispatcher<HttpProvider, WsSurface>>,
    events: broadcast::Sender<ServerMsg>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let (events, _) = broadcast::channel(64);

    let provider = match std::env::var("RPC_URL") {
        Ok(url) => {
            tracing::info!(%url, "wallet provider detected");
            Some(HttpProvider::new(url))
        }
        Err(_) => {
            tracing::warn!("RPC_URL unset, starting without a wallet provider");
            None
        }
    };

    let surface = WsSurface {
        events: events.clone(),
    };
    let dispatcher = Arc::new(Dispatcher::new(provider, surface, contract::endpoint()));

    let state = AppState { dispatcher, events };

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    tracing::info!("Serving on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.events.subscribe();

    // Forward surface events to this socket.
    let send_task = tokio::spawn(async move {
        while let Ok(msg) = events.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(j) => j,
                Err(e) => {
                    tracing::error!("Failed to serialize event: {e}");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Each incoming click dispatches as its own task; the dispatcher's
    // in-flight guard arbitrates repeated clicks.
    while let Some(msg) = receiver.next().await {
        let text = match msg {
            Ok(Message::Text(t)) => t,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::error!("WebSocket error: {e}");
                break;
            }
        };

        let client_msg: ClientMsg = match serde_json::from_str(&text) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("Invalid client message: {e}");
                continue;
            }
        };

        let dispatcher = Arc::clone(&state.dispatcher);
        tokio::spawn(async move {
            match client_msg {
                ClientMsg::Connect => dispatcher.connect().await,
                ClientMsg::Withdraw => dispatcher.withdraw().await,
                ClientMsg::Fund { amount } => dispatcher.fund(&amount).await,
                ClientMsg::GetBalance => dispatcher.get_balance().await,
            }
        });
    }

    send_task.abort();
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>FundMe</title>
    <style>
        body {
            margin: 0;
            padding: 40px;
            background: #1e1e1e;
            color: #d4d4d4;
            font-family: system-ui, sans-serif;
        }
        h1 { color: #fff; margin-bottom: 10px; }
        .badge {
            display: inline-block;
            padding: 4px 10px;
            border-radius: 12px;
            font-size: 13px;
            background: #444;
            color: #ccc;
            margin-bottom: 20px;
        }
        .badge.connected { background: #2d5a2d; color: #9f9; }
        .row { margin: 12px 0; }
        button {
            padding: 10px 18px;
            margin-right: 8px;
            border: none;
            border-radius: 6px;
            background: #3a6ea5;
            color: #fff;
            font-size: 15px;
            cursor: pointer;
        }
        button:hover { background: #4a7eb5; }
        input {
            padding: 10px;
            border-radius: 6px;
            border: 1px solid #555;
            background: #2a2a2a;
            color: #eee;
            font-size: 15px;
            width: 140px;
        }
        #balanceDisplay { display: none; margin-top: 16px; font-size: 17px; }
        #messageBox { margin-top: 16px; min-height: 24px; }
        .message { padding: 8px 12px; border-radius: 6px; display: inline-block; }
        .message.info { background: #2a3a4a; }
        .message.success { background: #2d5a2d; }
        .message.error { background: #5a2d2d; }
    </style>
</head>
<body>
    <h1>FundMe</h1>
    <div class="badge" id="statusBadge">Not Connected</div>
    <div class="row">
        <button id="connectButton">Connect</button>
        <button id="balanceButton">Get Balance</button>
        <button id="withdrawButton">Withdraw</button>
    </div>
    <div class="row">
        <input id="ethAmount" placeholder="ETH amount" />
        <button id="fundButton">Fund</button>
    </div>
    <div id="balanceDisplay">Contract balance: <span id="balanceAmount"></span> ETH</div>
    <div id="messageBox"></div>

    <script>
        const buttons = {
            connect: document.getElementById('connectButton'),
            withdraw: document.getElementById('withdrawButton'),
            fund: document.getElementById('fundButton'),
            balance: document.getElementById('balanceButton'),
        };
        const amountInput = document.getElementById('ethAmount');
        const statusBadge = document.getElementById('statusBadge');
        const messageBox = document.getElementById('messageBox');
        let messageTimer;
        let ws;

        function showMessage(kind, text) {
            messageBox.innerHTML = '';
            const div = document.createElement('div');
            div.className = 'message ' + kind;
            div.textContent = text;
            messageBox.appendChild(div);
            clearTimeout(messageTimer);
            messageTimer = setTimeout(() => { messageBox.innerHTML = ''; }, 5000);
        }

        function connect() {
            const protocol = window.location.protocol === 'https:' ? 'wss:' : 'ws:';
            ws = new WebSocket(`${protocol}//${window.location.host}/ws`);

            ws.onclose = () => setTimeout(connect, 2000);

            ws.onmessage = (event) => {
                const msg = JSON.parse(event.data);
                switch (msg.type) {
                    case 'message':
                        showMessage(msg.kind, msg.text);
                        break;
                    case 'connection':
                        statusBadge.textContent = msg.connected ? 'Connected' : 'Not Connected';
                        statusBadge.classList.toggle('connected', msg.connected);
                        break;
                    case 'balance':
                        document.getElementById('balanceAmount').textContent = msg.formatted;
                        document.getElementById('balanceDisplay').style.display = 'block';
                        break;
                    case 'action_label':
                        if (buttons[msg.action]) buttons[msg.action].textContent = msg.label;
                        break;
                    case 'clear_amount':
                        amountInput.value = '';
                        break;
                }
            };
        }

        function send(msg) {
            if (ws && ws.readyState === WebSocket.OPEN) {
                ws.send(JSON.stringify(msg));
            }
        }

        buttons.connect.onclick = () => send({ type: 'connect' });
        buttons.withdraw.onclick = () => send({ type: 'withdraw' });
        buttons.balance.onclick = () => send({ type: 'get_balance' });
        buttons.fund.onclick = () => send({ type: 'fund', amount: amountInput.value });

        connect();
    </script>
</body>
</html>
"#;
