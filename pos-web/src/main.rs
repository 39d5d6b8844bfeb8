//! Servidor web Axum com WebSocket para visualização do etiquetador POS em tempo real
//!
//! Variáveis de ambiente:
//!
//! | Variável        | Padrão          | Uso                                     |
//! |-----------------|-----------------|-----------------------------------------|
//! | `POS_ADDR`      | `0.0.0.0:3000`  | endereço de escuta                      |
//! | `POS_MODEL_DIR` | (embutido)      | diretório com léxicos, matriz e regras  |
//! | `POS_CONFIG`    | (padrões)       | arquivo JSON com [`TaggerConfig`]       |
//! | `RUST_LOG`      | `info`          | filtro do `tracing-subscriber`          |

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use pos_core::{
    corpus::demo_texts,
    pipeline::{AnalyzedToken, PipelineEvent, PosPipeline},
    tags::TagInfo,
    PosModel, TaggerConfig,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Estado compartilhado da aplicação. O pipeline é `Send + Sync`.
struct AppState {
    pipeline: PosPipeline,
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    text: String,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    tokens: Vec<AnalyzedToken>,
    total_tokens: usize,
    processing_ms: u64,
}

/// Linha da tabela de tags da página principal.
struct TagRow {
    tag: String,
    word_class: String,
    general_tag: String,
    description: String,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    tags: Vec<TagRow>,
    demo_titles: Vec<&'static str>,
    lexicon_words: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::var("POS_CONFIG") {
        Ok(path) => TaggerConfig::from_path(path)?,
        Err(_) => TaggerConfig::default(),
    };
    let model = match std::env::var("POS_MODEL_DIR") {
        Ok(dir) => PosModel::load(dir)?,
        Err(_) => PosModel::build()?,
    };
    if model.reports.skipped_lines() > 0 {
        warn!(skipped = model.reports.skipped_lines(), "linhas ignoradas ao carregar o modelo");
    }
    let invalid = model.invalid_categories();
    if !invalid.is_empty() {
        warn!(?invalid, "léxicos usam tags fora do catálogo");
    }

    let state = Arc::new(AppState {
        pipeline: PosPipeline::with_model(model, &config),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("static");

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/analyze", post(analyze_handler))
        .route("/ws", get(ws_handler))
        .route("/demo-texts", get(demo_texts_handler))
        .route("/tags", get(tags_handler))
        .route("/stats", get(stats_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state);

    let addr = std::env::var("POS_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "servidor POS iniciado");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Retorna a página principal HTML
async fn index_handler(State(state): State<Arc<AppState>>) -> Response {
    let model = state.pipeline.model();
    let template = IndexTemplate {
        tags: model
            .catalog
            .tags()
            .map(|info| TagRow {
                tag: info.tag.clone(),
                word_class: info.word_class.clone(),
                general_tag: info.general_tag.clone(),
                description: info.description.clone(),
            })
            .collect(),
        demo_titles: demo_texts().iter().map(|(title, _)| *title).collect(),
        lexicon_words: model.word_lexicon.len(),
    };
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "falha ao renderizar a página");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Etiquetagem via HTTP POST (sem streaming)
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Response {
    if req.text.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Texto vazio"})),
        )
            .into_response();
    }

    let start = std::time::Instant::now();
    let result = tokio::task::spawn_blocking(move || state.pipeline.analyze(&req.text)).await;
    match result {
        Ok(tokens) => Json(AnalyzeResponse {
            total_tokens: tokens.len(),
            tokens,
            processing_ms: start.elapsed().as_millis() as u64,
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, "falha na tarefa de análise");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Retorna textos de demonstração
async fn demo_texts_handler() -> impl IntoResponse {
    let texts: Vec<serde_json::Value> = demo_texts()
        .iter()
        .map(|(title, text)| {
            serde_json::json!({
                "title": title,
                "text": text
            })
        })
        .collect();
    Json(texts)
}

/// Catálogo de tags do modelo carregado
async fn tags_handler(State(state): State<Arc<AppState>>) -> Json<Vec<TagInfo>> {
    Json(state.pipeline.model().catalog.tags().cloned().collect())
}

/// Contadores do etiquetador e relatórios de carga do modelo
async fn stats_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let model = state.pipeline.model();
    Json(serde_json::json!({
        "tagger": state.pipeline.tagger().stats(),
        "load": model.reports,
        "lexicon_words": model.word_lexicon.len(),
        "suffixes": model.suffix_lexicon.len(),
        "retag_rules": model.retagger.len(),
    }))
}

/// Upgrade HTTP → WebSocket
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Mensagem WebSocket recebida do cliente: JSON `{ "text": ... }` ou texto puro.
#[derive(Deserialize)]
struct WsRequest {
    text: String,
}

/// Recebe texto, executa o pipeline e envia os eventos em tempo real
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("WebSocket conectado");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(raw) => {
                let text = match serde_json::from_str::<WsRequest>(&raw) {
                    Ok(req) => req.text.trim().to_string(),
                    Err(_) => raw.trim().to_string(),
                };
                if text.is_empty() {
                    continue;
                }
                info!(chars = text.len(), "analisando via WebSocket");

                // O pipeline é síncrono: roda fora do runtime e os eventos são coletados no fim
                let (tx, rx) = std::sync::mpsc::channel::<PipelineEvent>();
                let pipeline_state = Arc::clone(&state);
                let handle = tokio::task::spawn_blocking(move || {
                    pipeline_state.pipeline.analyze_streaming(&text, tx);
                });

                let events: Vec<PipelineEvent> = match handle.await {
                    Ok(()) => rx.try_iter().collect(),
                    Err(e) => vec![PipelineEvent::Error {
                        message: e.to_string(),
                    }],
                };

                for event in &events {
                    let Ok(json) = serde_json::to_string(event) else {
                        continue;
                    };
                    if socket.send(Message::Text(json.into())).await.is_err() {
                        return; // cliente desconectou
                    }
                    // Pequena pausa para animação visual (passo a passo)
                    tokio::time::sleep(tokio::time::Duration::from_millis(35)).await;
                }
            }
            Message::Close(_) => {
                info!("WebSocket desconectado");
                return;
            }
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
            }
            _ => {}
        }
    }
}
