use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, Uri},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::compression::CompressionLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::query::ConsumeCriterion;
use crate::server::response::{RequestError, RestResult};
use crate::TailgateEngine;

type Params = Query<HashMap<String, String>>;

pub fn router(engine: TailgateEngine) -> Router {
    Router::new()
        .route("/consume", any(consume))
        .route("/listTopics", any(list_topics))
        .route("/listKeys", any(list_keys))
        .fallback(not_implemented)
        .layer(CompressionLayer::new())
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .with_state(engine)
}

/// Serves until `shutdown` is cancelled.
pub async fn serve(listener: TcpListener, engine: TailgateEngine, shutdown: CancellationToken) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("🌐 Tailgate listening on http://{}", addr);
    }
    axum::serve(listener, router(engine))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
}

async fn consume(State(engine): State<TailgateEngine>, Query(params): Params) -> RestResult {
    match parse_consume(&params) {
        Ok((topic, key, criterion)) => {
            RestResult::from(&engine.query.consume(topic, key, criterion))
        }
        Err(e) => e.into(),
    }
}

async fn list_topics(State(engine): State<TailgateEngine>) -> RestResult {
    RestResult::from(&engine.query.list_topics())
}

async fn list_keys(State(engine): State<TailgateEngine>, Query(params): Params) -> RestResult {
    match params.get("t") {
        Some(topic) => RestResult::from(&engine.query.list_keys(topic)),
        None => RequestError::MissingParameter {
            target: "listKeys",
            parameter: "topic (t=...)",
        }
        .into(),
    }
}

async fn not_implemented(uri: Uri) -> RestResult {
    RestResult::not_implemented(uri.path())
}

/// `t` is required, and exactly one of `l` (>= 1) or `o`.
fn parse_consume(params: &HashMap<String, String>) -> Result<(&str, Option<&str>, ConsumeCriterion), RequestError> {
    let topic = params.get("t").ok_or(RequestError::MissingParameter {
        target: "consume",
        parameter: "topic (t=...)",
    })?;
    let key = params.get("k").map(String::as_str);

    let criterion = match (params.get("l"), params.get("o")) {
        (Some(_), Some(_)) => {
            return Err(RequestError::WrongParameterValue {
                target: "consume",
                info: "either limit (l=...) or offset (o=...), not both.",
            })
        }
        (Some(limit), None) => {
            let limit: i32 = limit.trim().parse().map_err(|_| RequestError::WrongParameterValue {
                target: "consume",
                info: "limit (l=...) has to be a number (integer).",
            })?;
            if limit < 1 {
                return Err(RequestError::WrongParameterValue {
                    target: "consume",
                    info: "limit (l=...) has to be greater than 0.",
                });
            }
            ConsumeCriterion::Limit(limit as usize)
        }
        (None, Some(offset)) => {
            let offset: i64 = offset.trim().parse().map_err(|_| RequestError::WrongParameterValue {
                target: "consume",
                info: "offset (o=...) has to be a number (long).",
            })?;
            ConsumeCriterion::Offset(offset)
        }
        (None, None) => {
            return Err(RequestError::MissingParameter {
                target: "consume",
                parameter: "limit (l=...) or offset (o=...)",
            })
        }
    };

    Ok((topic.as_str(), key, criterion))
}
