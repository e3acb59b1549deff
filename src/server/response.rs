//! RestResult: status code plus JSON text, rendered the same way for every endpoint.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::query::{ConsumeResult, KeyList, TopicList};
use crate::server::models::{ConsumeBody, ErrorBody, KeysBody, RecordBody, TopicsBody};

pub const CONTENT_TYPE: &str = "text/plain;charset=utf-8";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResult {
    pub status: StatusCode,
    pub content: String,
}

impl RestResult {
    fn new<T: Serialize>(status: StatusCode, body: &T) -> Self {
        // The bodies are plain structs of strings and numbers
        let content = serde_json::to_string(body).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to serialize response body");
            String::from("{}")
        });
        Self { status, content }
    }

    pub fn not_implemented(target: &str) -> Self {
        RequestError::NotImplemented(target.to_string()).into()
    }
}

impl From<&ConsumeResult> for RestResult {
    fn from(result: &ConsumeResult) -> Self {
        if result.status.is_found() {
            let data = result.records.iter().map(|r| RecordBody::from(r.as_ref())).collect();
            Self::new(StatusCode::OK, &ConsumeBody { t: &result.topic, k: &result.key, d: Some(data) })
        } else {
            Self::new(StatusCode::NO_CONTENT, &ConsumeBody { t: &result.topic, k: &result.key, d: None })
        }
    }
}

impl From<&TopicList> for RestResult {
    fn from(list: &TopicList) -> Self {
        if list.status.is_found() {
            Self::new(StatusCode::OK, &TopicsBody { t: Some(list.topics.as_slice()) })
        } else {
            Self::new(StatusCode::NO_CONTENT, &TopicsBody { t: None })
        }
    }
}

impl From<&KeyList> for RestResult {
    fn from(list: &KeyList) -> Self {
        if list.status.is_found() {
            Self::new(StatusCode::OK, &KeysBody { t: &list.topic, k: Some(list.keys.as_slice()) })
        } else {
            Self::new(StatusCode::NO_CONTENT, &KeysBody { t: &list.topic, k: None })
        }
    }
}

impl IntoResponse for RestResult {
    fn into_response(self) -> Response {
        let mut response = (self.status, format!("{}\n", self.content)).into_response();
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE));
        response
    }
}

/// Rejected requests. Never fatal for the service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Missing parameter for target {target}. Requires: {parameter}")]
    MissingParameter { target: &'static str, parameter: &'static str },

    #[error("Wrong parameter value for target {target}: {info}")]
    WrongParameterValue { target: &'static str, info: &'static str },

    #[error("{0} is not implemented.")]
    NotImplemented(String),
}

impl RequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl From<RequestError> for RestResult {
    fn from(error: RequestError) -> Self {
        RestResult::new(error.status(), &ErrorBody { e: error.to_string() })
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        RestResult::from(self).into_response()
    }
}
