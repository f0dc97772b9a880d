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

use super::frames::{decode_completion, CompletionStatus, FrameDecoder};
use crate::observability::{
    events,
    fields::{self, format_millis, or_none},
};
use crate::store::EventStream;
use futures::StreamExt;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

const COMPONENT: &str = "completion_watcher";

pub const DEFAULT_SUBJECT: &str = "tailf-ncs:service-commit-queue-event";
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Why the watcher stopped reading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchExit {
    /// Nothing was expected; the stream was never read.
    #[default]
    Skipped,
    ReachedExpected,
    /// As many events as confirmed-successful submissions.
    ReachedConfirmed,
    /// No frame arrived within the idle timeout.
    Stalled,
    StreamEnded,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CompletionCounts {
    pub completed: usize,
    pub failed: usize,
    /// Completed plus failed.
    pub events: usize,
    /// Matching frames that could not be decoded.
    pub discarded: usize,
    pub exit: WatchExit,
}

/// Counts completion notifications until enough have arrived.
///
/// Reading stops once the event count reaches either `expected` or the
/// number of submissions the dispatcher confirmed as successful, whichever
/// comes first. The confirmed count is published on a watch channel once
/// dispatch finishes, so listening can start before dispatch.
#[derive(Clone, Debug)]
pub struct CompletionWatcher {
    subject: String,
    idle_timeout: Duration,
}

impl Default for CompletionWatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SUBJECT, DEFAULT_IDLE_TIMEOUT)
    }
}

impl CompletionWatcher {
    pub fn new(subject: impl Into<String>, idle_timeout: Duration) -> Self {
        Self {
            subject: subject.into(),
            idle_timeout,
        }
    }

    pub async fn watch(
        &self,
        mut stream: EventStream,
        expected: usize,
        mut confirmed: watch::Receiver<Option<usize>>,
    ) -> CompletionCounts {
        let mut counts = CompletionCounts::default();
        if expected == 0 {
            info!(
                event = events::COMPLETION_WATCH_SKIPPED,
                component = COMPONENT,
                "no asynchronous completions expected"
            );
            return counts;
        }

        info!(
            event = events::COMPLETION_WATCH_START,
            component = COMPONENT,
            expected,
            subject = self.subject.as_str(),
            idle_timeout_ms = format_millis(self.idle_timeout),
            "watching for completions"
        );

        let mut decoder = FrameDecoder::default();
        let mut confirmed_open = true;
        counts.exit = loop {
            if counts.events >= expected {
                break WatchExit::ReachedExpected;
            }
            let confirmed_successes = *confirmed.borrow_and_update();
            if confirmed_successes.is_some_and(|successes| counts.events >= successes) {
                break WatchExit::ReachedConfirmed;
            }

            tokio::select! {
                changed = confirmed.changed(), if confirmed_open => {
                    if changed.is_err() {
                        confirmed_open = false;
                    }
                }
                next = tokio::time::timeout(self.idle_timeout, stream.next()) => match next {
                    Err(_) => {
                        warn!(
                            event = events::COMPLETION_WATCH_DONE,
                            component = COMPONENT,
                            reason = fields::REASON_IDLE_TIMEOUT,
                            events = counts.events,
                            expected,
                            "completion stream went idle"
                        );
                        break WatchExit::Stalled;
                    }
                    Ok(None) => {
                        if let Some(frame) = decoder.finish() {
                            self.observe(&frame, &mut counts);
                        }
                        break WatchExit::StreamEnded;
                    }
                    Ok(Some(Err(err))) => {
                        warn!(
                            event = events::COMPLETION_STREAM_ERROR,
                            component = COMPONENT,
                            err = %err,
                            "notification stream failed"
                        );
                        break WatchExit::StreamEnded;
                    }
                    Ok(Some(Ok(chunk))) => {
                        for frame in decoder.push(&chunk) {
                            self.observe(&frame, &mut counts);
                        }
                    }
                },
            }
        };

        info!(
            event = events::COMPLETION_WATCH_DONE,
            component = COMPONENT,
            completed = counts.completed,
            failed = counts.failed,
            discarded = counts.discarded,
            exit = ?counts.exit,
            "completion watch finished"
        );
        counts
    }

    fn observe(&self, frame: &str, counts: &mut CompletionCounts) {
        let event = match decode_completion(frame, &self.subject) {
            Ok(Some(event)) => event,
            Ok(None) => return,
            Err(err) => {
                counts.discarded += 1;
                debug!(
                    event = events::COMPLETION_FRAME_DISCARDED,
                    component = COMPONENT,
                    err = %err,
                    "discarding undecodable frame"
                );
                return;
            }
        };

        match event.status {
            CompletionStatus::Completed => {
                counts.completed += 1;
                counts.events += 1;
                debug!(
                    event = events::COMPLETION_OK,
                    component = COMPONENT,
                    subject = or_none(&event.subject_id),
                    "commit queue item completed"
                );
            }
            CompletionStatus::Failed => {
                counts.failed += 1;
                counts.events += 1;
                warn!(
                    event = events::COMPLETION_FAILED,
                    component = COMPONENT,
                    subject = or_none(&event.subject_id),
                    "commit queue item failed"
                );
            }
            CompletionStatus::Other(status) => {
                debug!(
                    event = events::COMPLETION_FRAME_DISCARDED,
                    component = COMPONENT,
                    status = status.as_str(),
                    "ignoring intermediate status"
                );
            }
        }
    }
}
