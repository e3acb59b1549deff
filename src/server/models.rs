//! JSON bodies. Field names are single letters to keep responses small.

use serde::Serialize;

use crate::history::Record;

#[derive(Serialize)]
pub struct RecordBody<'a> {
    /// base64 payload
    pub v: String,
    pub k: &'a str,
    pub t: &'a str,
    pub p: i32,
    pub o: i64,
}

impl<'a> From<&'a Record> for RecordBody<'a> {
    fn from(record: &'a Record) -> Self {
        Self {
            v: record.payload_base64(),
            k: &record.key,
            t: &record.topic,
            p: record.partition,
            o: record.offset,
        }
    }
}

#[derive(Serialize)]
pub struct ConsumeBody<'a> {
    pub t: &'a str,
    pub k: &'a str,
    pub d: Option<Vec<RecordBody<'a>>>,
}

#[derive(Serialize)]
pub struct TopicsBody<'a> {
    pub t: Option<&'a [String]>,
}

#[derive(Serialize)]
pub struct KeysBody<'a> {
    pub t: &'a str,
    pub k: Option<&'a [String]>,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub e: String,
}
