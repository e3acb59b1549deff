use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;

/// One record consumed from the stream. Never mutated after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub payload: Bytes,
    pub key: String,
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

impl Record {
    pub fn new(
        payload: impl Into<Bytes>,
        key: impl Into<String>,
        topic: impl Into<String>,
        partition: i32,
        offset: i64,
    ) -> Self {
        Self {
            payload: payload.into(),
            key: key.into(),
            topic: topic.into(),
            partition,
            offset,
        }
    }

    pub fn payload_base64(&self) -> String {
        STANDARD.encode(&self.payload)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[value=<{}>,key={},topic={},partition={},offset={}]",
            self.payload_base64(),
            self.key,
            self.topic,
            self.partition,
            self.offset
        )
    }
}
