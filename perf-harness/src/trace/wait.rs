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

use super::correlator::{CorrelatedPhases, PhaseCorrelator};
use super::parser::{ParserOptions, TraceEventParser};
use super::phases::PhaseVocabulary;
use crate::error::{HarnessError, Result};
use crate::observability::{events, fields::format_millis};
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

const COMPONENT: &str = "trace_wait";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone, Copy, Debug)]
pub struct TraceWait {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for TraceWait {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

/// Reads and correlates the trace log as it stands right now.
///
/// A log that does not exist yet correlates to nothing.
pub fn read_trace_log(
    path: &Path,
    vocabulary: &PhaseVocabulary,
    options: ParserOptions,
) -> Result<CorrelatedPhases> {
    if !path.exists() {
        return Ok(CorrelatedPhases::new());
    }
    let events = TraceEventParser::new(options).parse_path(path)?;
    Ok(PhaseCorrelator::correlate(vocabulary, events))
}

/// Number of transactions whose root phase has been closed.
pub fn completed_transactions(records: &CorrelatedPhases, vocabulary: &PhaseVocabulary) -> usize {
    let Some(root) = vocabulary.root() else {
        return records.len();
    };
    records.values().filter(|record| record.contains(root)).count()
}

/// Polls the trace log until `expected` transactions are fully recorded.
///
/// The store flushes the log asynchronously, so records for the last
/// transactions can trail the responses. Gives up with
/// [`HarnessError::InsufficientTraceData`] once `wait.timeout` elapses.
pub async fn wait_for_trace_records(
    path: &Path,
    vocabulary: &PhaseVocabulary,
    expected: usize,
    options: ParserOptions,
    wait: TraceWait,
) -> Result<CorrelatedPhases> {
    let started = Instant::now();
    let deadline = started + wait.timeout;

    loop {
        let records = read_trace_log(path, vocabulary, options)?;
        let found = completed_transactions(&records, vocabulary);
        if found >= expected {
            return Ok(records);
        }

        if Instant::now() >= deadline {
            warn!(
                event = events::TRACE_POLL_TIMEOUT,
                component = COMPONENT,
                found,
                expected,
                waited_ms = format_millis(wait.timeout),
                "trace log incomplete"
            );
            return Err(HarnessError::InsufficientTraceData {
                found,
                expected,
                waited: started.elapsed(),
            });
        }

        debug!(
            event = events::TRACE_POLL,
            component = COMPONENT,
            found,
            expected,
            "waiting for trace log"
        );
        tokio::time::sleep(wait.poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::{wait_for_trace_records, TraceWait};
    use crate::error::HarnessError;
    use crate::trace::parser::ParserOptions;
    use crate::trace::phases::PhaseVocabulary;
    use std::io::Write;
    use std::time::Duration;

    const HEADER: &str = "EVENT TYPE,DURATION,TRACE ID,MESSAGE\n";

    fn transaction_rows(trace_id: &str) -> String {
        format!("start,,{trace_id},restconf edit\nstop,1.0,{trace_id},restconf edit\n")
    }

    fn short_wait() -> TraceWait {
        TraceWait {
            poll_interval: Duration::from_millis(100),
            timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn returns_once_every_transaction_is_recorded() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "{HEADER}{}{}", transaction_rows("t1"), transaction_rows("t2"))
            .expect("write log");

        let records = wait_for_trace_records(
            file.path(),
            &PhaseVocabulary::default(),
            2,
            ParserOptions::default(),
            short_wait(),
        )
        .await
        .expect("records");

        assert_eq!(records.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_log_times_out_with_insufficient_data() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = wait_for_trace_records(
            &dir.path().join("absent.csv"),
            &PhaseVocabulary::default(),
            1,
            ParserOptions::default(),
            short_wait(),
        )
        .await
        .expect_err("should time out");

        assert!(matches!(
            err,
            HarnessError::InsufficientTraceData {
                found: 0,
                expected: 1,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn open_root_spans_do_not_count() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "{HEADER}{}start,,t2,restconf edit\n", transaction_rows("t1"))
            .expect("write log");

        let err = wait_for_trace_records(
            file.path(),
            &PhaseVocabulary::default(),
            2,
            ParserOptions::default(),
            short_wait(),
        )
        .await
        .expect_err("should time out");

        assert!(matches!(
            err,
            HarnessError::InsufficientTraceData { found: 1, .. }
        ));
    }
}
