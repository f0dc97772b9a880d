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

//! Start/stop span listing used by the trace viewer.

use super::parser::{SpanKey, TraceEvent, TraceEventKind};
use crate::observability::fields::short_id;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;

const TRACE_ID_WIDTH: usize = 12;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelineSpan {
    pub trace_id: String,
    pub label: String,
    /// Milliseconds since the first timestamped event.
    pub start_offset_ms: f64,
    pub end_offset_ms: Option<f64>,
    /// Duration reported on the `stop` row, in milliseconds.
    pub duration_ms: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SpanTimeline {
    pub spans: Vec<TimelineSpan>,
    /// Distance between the first and the last timestamped event.
    pub total_ms: f64,
}

impl SpanTimeline {
    /// Lists spans in start order. A stop without an open span is ignored.
    pub fn build<I>(events: I) -> Self
    where
        I: IntoIterator<Item = TraceEvent>,
    {
        let mut timeline = Self::default();
        let mut open: HashMap<SpanKey, usize> = HashMap::new();
        let mut first: Option<NaiveDateTime> = None;

        for event in events {
            let offset_ms = match (event.timestamp, first) {
                (Some(timestamp), Some(begin)) => millis_between(begin, timestamp),
                (Some(timestamp), None) => {
                    first = Some(timestamp);
                    0.0
                }
                (None, _) => timeline.total_ms,
            };
            timeline.total_ms = timeline.total_ms.max(offset_ms);

            match event.kind {
                TraceEventKind::Start => {
                    if open.contains_key(&event.key) {
                        continue;
                    }
                    let label = format!("{} {}", event.phase_name, event.key.transaction_id);
                    timeline.spans.push(TimelineSpan {
                        trace_id: short_id(&event.key.trace_id, TRACE_ID_WIDTH).to_string(),
                        label: label.trim_end().to_string(),
                        start_offset_ms: offset_ms,
                        end_offset_ms: None,
                        duration_ms: None,
                    });
                    open.insert(event.key, timeline.spans.len() - 1);
                }
                TraceEventKind::Stop => {
                    let Some(position) = open.remove(&event.key) else {
                        continue;
                    };
                    if let Some(span) = timeline.spans.get_mut(position) {
                        span.end_offset_ms = Some(offset_ms);
                        span.duration_ms = Some(event.duration * 1000.0);
                    }
                }
            }
        }

        timeline
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<12}  {:<48}  {:>12}  {:>12}",
            "Trace ID", "Event [Transaction ID]", "Start (ms)", "Duration"
        );
        for span in &self.spans {
            let duration = span
                .duration_ms
                .map(|ms| format!("{ms:.3}"))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "{:<12}  {:<48}  {:>12.3}  {:>12}",
                span.trace_id, span.label, span.start_offset_ms, duration
            );
        }
        let _ = writeln!(out, "Span {:.3} ms", self.total_ms);
        out
    }
}

fn millis_between(begin: NaiveDateTime, end: NaiveDateTime) -> f64 {
    let elapsed = end.signed_duration_since(begin);
    elapsed
        .num_microseconds()
        .map(|micros| micros as f64 / 1000.0)
        .unwrap_or_else(|| elapsed.num_milliseconds() as f64)
}
