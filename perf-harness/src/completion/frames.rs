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

//! Framing and decoding of the notification stream.

use serde::Serialize;
use serde_json::Value;

const FRAME_DELIMITER: &[u8] = b"\n\n";
const NOTIFICATION_WRAPPER: &str = "ietf-restconf:notification";
const SUBJECT_ID_MEMBERS: [&str; 3] = ["service", "subject", "id"];

/// Splits a chunked event stream into frames.
///
/// Chunks may end anywhere, including inside a multi-byte character, so
/// bytes are buffered until a blank line closes the frame.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    /// Appends a chunk and returns the payload of every frame it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer
            .extend(chunk.iter().copied().filter(|byte| *byte != b'\r'));

        let mut frames = Vec::new();
        while let Some(end) = find(&self.buffer, FRAME_DELIMITER) {
            let raw: Vec<u8> = self.buffer.drain(..end + FRAME_DELIMITER.len()).collect();
            if let Some(frame) = frame_payload(&raw[..end]) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flushes a trailing frame left without a closing blank line.
    pub fn finish(&mut self) -> Option<String> {
        let raw = std::mem::take(&mut self.buffer);
        frame_payload(&raw)
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Joins the data lines of one frame. Comment and control lines are dropped;
/// lines without a field name are kept as data.
fn frame_payload(raw: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    let data: Vec<&str> = text
        .lines()
        .filter_map(|line| {
            if let Some(value) = line.strip_prefix("data:") {
                return Some(value.strip_prefix(' ').unwrap_or(value));
            }
            if line.starts_with(':')
                || ["event:", "id:", "retry:"]
                    .iter()
                    .any(|field| line.starts_with(field))
            {
                return None;
            }
            Some(line)
        })
        .collect();

    let payload = data.join("\n");
    if payload.trim().is_empty() {
        None
    } else {
        Some(payload)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Completed,
    Failed,
    /// Intermediate states such as `executing` or `waiting`.
    Other(String),
}

/// One completion notification for a queued transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionEvent {
    pub subject_id: String,
    pub status: CompletionStatus,
}

/// A frame that matched the subject filter but could not be used.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum StreamDecodeError {
    #[error("frame is not valid JSON: {0}")]
    NotJson(String),

    #[error("frame has no status for {0}")]
    MissingStatus(String),
}

/// Decodes a frame into a [`CompletionEvent`].
///
/// Frames not mentioning `subject` are not completion events and decode to
/// `None`.
pub fn decode_completion(
    frame: &str,
    subject: &str,
) -> Result<Option<CompletionEvent>, StreamDecodeError> {
    if !frame.contains(subject) {
        return Ok(None);
    }

    let value: Value =
        serde_json::from_str(frame).map_err(|err| StreamDecodeError::NotJson(err.to_string()))?;
    let body = value.get(NOTIFICATION_WRAPPER).unwrap_or(&value);
    let event = body.get(subject).unwrap_or(body);

    let status = event
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| StreamDecodeError::MissingStatus(subject.to_string()))?;
    let subject_id = SUBJECT_ID_MEMBERS
        .iter()
        .find_map(|member| event.get(*member).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string();

    let status = match status {
        "completed" => CompletionStatus::Completed,
        "failed" => CompletionStatus::Failed,
        other => CompletionStatus::Other(other.to_string()),
    };

    Ok(Some(CompletionEvent { subject_id, status }))
}
