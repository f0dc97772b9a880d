/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Header-resolved reader for progress-trace CSV logs.
//!
//! Column order differs between store versions, so positions are resolved
//! once per read from the header row. Any recognised column may be absent;
//! absent fields read as empty strings.

use crate::error::HarnessError;
use crate::observability::events;
use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

pub const EVENT_TYPE_COLUMN: &str = "EVENT TYPE";
pub const TIMESTAMP_COLUMN: &str = "TIMESTAMP";
pub const DURATION_COLUMN: &str = "DURATION";
pub const TRACE_ID_COLUMN: &str = "TRACE ID";
pub const SPAN_ID_COLUMN: &str = "SPAN ID";
pub const PARENT_SPAN_ID_COLUMN: &str = "PARENT SPAN ID";
pub const SESSION_ID_COLUMN: &str = "SESSION ID";
pub const TRANSACTION_ID_COLUMN: &str = "TRANSACTION ID";
pub const DATASTORE_COLUMN: &str = "DATASTORE";
pub const MESSAGE_COLUMN: &str = "MESSAGE";
pub const SERVICE_COLUMN: &str = "SERVICE";
pub const ATTRIBUTE_VALUE_COLUMN: &str = "ATTRIBUTE VALUE";

const OPERATIONAL_DATASTORE: &str = "operational";
const COMPONENT: &str = "trace_parser";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEventKind {
    Start,
    Stop,
}

impl TraceEventKind {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }
}

/// Structured identity of one timed span.
///
/// A `start` and its `stop` share every field; comparing the fields one by
/// one keeps `("ab", "c")` and `("a", "bc")` distinct.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpanKey {
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: String,
    pub session_id: String,
    pub transaction_id: String,
    pub datastore: String,
    pub service: String,
    pub message: String,
}

impl SpanKey {
    /// Identifier of the logical transaction the span belongs to.
    pub fn correlation_id(&self) -> &str {
        [&self.trace_id, &self.transaction_id, &self.session_id]
            .into_iter()
            .find(|candidate| !candidate.is_empty())
            .map(String::as_str)
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TraceEvent {
    pub key: SpanKey,
    pub kind: TraceEventKind,
    pub phase_name: String,
    pub timestamp: Option<NaiveDateTime>,
    /// Seconds; only `stop` rows carry a meaningful value.
    pub duration: f64,
    pub attribute_value: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Drop rows written against the operational datastore.
    pub skip_operational: bool,
}

#[derive(Clone, Copy, Debug, Default)]
struct ColumnMap {
    event_type: Option<usize>,
    timestamp: Option<usize>,
    duration: Option<usize>,
    trace_id: Option<usize>,
    span_id: Option<usize>,
    parent_span_id: Option<usize>,
    session_id: Option<usize>,
    transaction_id: Option<usize>,
    datastore: Option<usize>,
    message: Option<usize>,
    service: Option<usize>,
    attribute_value: Option<usize>,
}

impl ColumnMap {
    fn from_header(header: &csv::StringRecord) -> Self {
        let mut columns = Self::default();
        for (index, name) in header.iter().enumerate() {
            let slot = match name.trim() {
                EVENT_TYPE_COLUMN => &mut columns.event_type,
                TIMESTAMP_COLUMN => &mut columns.timestamp,
                DURATION_COLUMN => &mut columns.duration,
                TRACE_ID_COLUMN => &mut columns.trace_id,
                SPAN_ID_COLUMN => &mut columns.span_id,
                PARENT_SPAN_ID_COLUMN => &mut columns.parent_span_id,
                SESSION_ID_COLUMN => &mut columns.session_id,
                TRANSACTION_ID_COLUMN => &mut columns.transaction_id,
                DATASTORE_COLUMN => &mut columns.datastore,
                MESSAGE_COLUMN => &mut columns.message,
                SERVICE_COLUMN => &mut columns.service,
                ATTRIBUTE_VALUE_COLUMN => &mut columns.attribute_value,
                _ => continue,
            };
            slot.get_or_insert(index);
        }
        columns
    }
}

fn field(record: &csv::StringRecord, column: Option<usize>) -> &str {
    column
        .and_then(|index| record.get(index))
        .unwrap_or_default()
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

/// Entry point for reading trace logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct TraceEventParser {
    options: ParserOptions,
}

impl TraceEventParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Opens the log and reads whatever it holds right now.
    ///
    /// Each call starts from the top of the file, so a caller waiting for a
    /// log that is still being flushed simply calls this again.
    pub fn parse_path(&self, path: &Path) -> Result<TraceEvents<File>, HarnessError> {
        let file = File::open(path).map_err(|err| HarnessError::TraceLog {
            path: path.to_path_buf(),
            detail: err.to_string(),
        })?;
        Ok(self.parse_reader(file))
    }

    pub fn parse_reader<R: Read>(&self, reader: R) -> TraceEvents<R> {
        let records = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader)
            .into_records();

        TraceEvents {
            records,
            columns: None,
            options: self.options,
            skipped_rows: 0,
        }
    }
}

/// Lazy sequence of `start`/`stop` events.
pub struct TraceEvents<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
    columns: Option<ColumnMap>,
    options: ParserOptions,
    skipped_rows: usize,
}

impl<R: Read> TraceEvents<R> {
    /// Rows dropped as malformed so far.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    fn skip(&mut self, reason: &str) {
        self.skipped_rows += 1;
        debug!(
            event = events::TRACE_ROW_SKIPPED,
            component = COMPONENT,
            reason,
            "skipping malformed trace row"
        );
    }

    fn event_from_record(
        &mut self,
        columns: ColumnMap,
        record: &csv::StringRecord,
    ) -> Option<TraceEvent> {
        let kind = TraceEventKind::parse(field(record, columns.event_type).trim())?;

        let datastore = field(record, columns.datastore);
        if self.options.skip_operational && datastore == OPERATIONAL_DATASTORE {
            return None;
        }

        let raw_duration = field(record, columns.duration).trim();
        let duration = match (kind, raw_duration) {
            (TraceEventKind::Start, "") => 0.0,
            (TraceEventKind::Stop, "") => {
                self.skip("missing_duration");
                return None;
            }
            (_, value) => match value.parse::<f64>() {
                Ok(seconds) if seconds.is_finite() => seconds,
                _ => {
                    self.skip("invalid_duration");
                    return None;
                }
            },
        };

        let message = field(record, columns.message).to_string();
        Some(TraceEvent {
            key: SpanKey {
                trace_id: field(record, columns.trace_id).to_string(),
                span_id: field(record, columns.span_id).to_string(),
                parent_span_id: field(record, columns.parent_span_id).to_string(),
                session_id: field(record, columns.session_id).to_string(),
                transaction_id: field(record, columns.transaction_id).to_string(),
                datastore: datastore.to_string(),
                service: field(record, columns.service).to_string(),
                message: message.clone(),
            },
            kind,
            phase_name: message,
            timestamp: parse_timestamp(field(record, columns.timestamp).trim()),
            duration,
            attribute_value: field(record, columns.attribute_value).to_string(),
        })
    }
}

impl<R: Read> Iterator for TraceEvents<R> {
    type Item = TraceEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(err) if err.is_io_error() => {
                    debug!(
                        event = events::TRACE_ROW_SKIPPED,
                        component = COMPONENT,
                        err = %err,
                        "trace log read aborted"
                    );
                    return None;
                }
                Err(_) => {
                    self.skip("undecodable_row");
                    continue;
                }
            };

            if record.get(0).map_or(true, str::is_empty) {
                continue;
            }

            let Some(columns) = self.columns else {
                self.columns = Some(ColumnMap::from_header(&record));
                continue;
            };

            if let Some(event) = self.event_from_record(columns, &record) {
                return Some(event);
            }
        }
    }
}
