use anyhow::{Context, Result};
use axum::{
    Router,
    body::Body,
    extract::State,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    http::Request,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use std::{
    net::SocketAddr,
    path::{Component, Path, PathBuf},
};
use tokio::sync::broadcast;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};

const RELOAD_PATH: &str = "/__livereload";

/// Configuration for the live development server
#[derive(Debug, Clone)]
pub struct LiveServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to serve on
    pub port: u16,
    /// Root directory to serve
    pub root: PathBuf,
    /// Auto-open browser
    pub open: bool,
}

impl Default for LiveServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            root: PathBuf::from("."),
            open: false,
        }
    }
}

/// Handle for telling connected browsers to reload.
///
/// Cheap to clone; every clone talks to the same clients.
#[derive(Debug, Clone)]
pub struct Reloader {
    tx: broadcast::Sender<String>,
}

impl Reloader {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(100);
        Self { tx }
    }

    /// Push a reload to every connected client. Returns how many were listening.
    pub fn reload(&self) -> usize {
        let clients = self.tx.send("reload".to_string()).unwrap_or(0);
        debug!("Sent reload signal to {} clients", clients);
        clients
    }

    /// Receive every reload sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

/// A live-reload static file server
pub struct LiveServer {
    config: LiveServerConfig,
    reloader: Reloader,
}

impl LiveServer {
    /// Create a new live server with the given configuration
    pub fn new(config: LiveServerConfig) -> Self {
        Self {
            config,
            reloader: Reloader::new(),
        }
    }

    pub fn reloader(&self) -> Reloader {
        self.reloader.clone()
    }

    fn router(&self) -> Router {
        let state = AppState {
            root: self.config.root.clone(),
            reloader: self.reloader.clone(),
        };

        Router::new()
            .route(RELOAD_PATH, get(websocket_handler))
            .fallback(serve_static)
            .with_state(state)
    }

    /// Run the live server
    pub async fn run(self) -> Result<()> {
        // Ensure root directory exists
        if !self.config.root.exists() {
            return Err(anyhow::anyhow!(
                "Root directory does not exist: {}",
                self.config.root.display()
            ));
        }

        let app = self.router();
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;

        info!("Serving {} at http://{}", self.config.root.display(), addr);
        info!("Live reload enabled at ws://{}{}", addr, RELOAD_PATH);

        // Open browser if requested
        if self.config.open {
            if let Err(e) = open::that(format!("http://{}", addr)) {
                warn!("Failed to open browser: {}", e);
            }
        }

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

#[derive(Clone)]
struct AppState {
    root: PathBuf,
    reloader: Reloader,
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| websocket_connection(socket, state.reloader))
}

async fn websocket_connection(mut socket: WebSocket, reloader: Reloader) {
    let mut rx = reloader.subscribe();

    // Send initial connection confirmation
    if socket
        .send(Message::Text("connected".to_string().into()))
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            msg = rx.recv() => {
                match msg {
                    Ok(reload_msg) => {
                        if socket.send(Message::Text(reload_msg.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
            msg = socket.recv() => {
                if msg.is_none() {
                    break;
                }
            }
        }
    }
}

/// HTML pages get the reload script; everything else goes to `ServeDir`.
async fn serve_static(State(state): State<AppState>, request: Request<Body>) -> Response {
    if let Some(file) = html_file(&state.root, request.uri().path()) {
        match tokio::fs::read_to_string(&file).await {
            Ok(html) => return Html(inject_livereload_script(&html)).into_response(),
            Err(e) => warn!("Could not read {}: {}", file.display(), e),
        }
    }

    match ServeDir::new(&state.root).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}

/// Map a request path onto an HTML file under `root`, if there is one.
fn html_file(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }

    let mut path = root.join(relative);
    if path.is_dir() {
        path.push("index.html");
    }

    let is_html = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"));
    (is_html && path.is_file()).then_some(path)
}

/// Inject live reload script into HTML content
pub fn inject_livereload_script(html: &str) -> String {
    let script = format!(
        r#"
<script>
(function() {{
    const scheme = location.protocol === 'https:' ? 'wss://' : 'ws://';
    const socket = new WebSocket(scheme + location.host + '{}');
    socket.onmessage = function(event) {{
        if (event.data === 'reload') {{
            location.reload();
        }}
    }};
    socket.onclose = function() {{
        console.log('Live reload disconnected');
    }};
}})();
</script>
"#,
        RELOAD_PATH
    );

    // Try to inject before closing body tag, or at the end if not found
    if let Some(pos) = html.rfind("</body>") {
        let mut result = String::with_capacity(html.len() + script.len());
        result.push_str(&html[..pos]);
        result.push_str(&script);
        result.push_str(&html[pos..]);
        result
    } else {
        format!("{}{}", html, script)
    }
}
