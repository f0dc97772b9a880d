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

//! Offline analysis of an existing trace log.

use crate::error::{HarnessError, Result};
use crate::stats::{AggregateReport, BreakdownNode, StatsAggregator, PHASE_TREE};
use crate::trace::{read_trace_log, ParserOptions, PhaseVocabulary, SpanTimeline, TraceEventParser};
use serde::Serialize;
use std::path::Path;

#[derive(Clone, Debug, Serialize)]
pub struct TraceAnalysis {
    pub aggregate: AggregateReport,
    pub breakdown: BreakdownNode,
}

/// Correlates and aggregates a trace log without contacting the store.
pub fn analyze_trace_log(
    path: &Path,
    vocabulary: &PhaseVocabulary,
    options: ParserOptions,
) -> Result<TraceAnalysis> {
    if !path.exists() {
        return Err(HarnessError::TraceLog {
            path: path.to_path_buf(),
            detail: "file not found".to_string(),
        });
    }
    let records = read_trace_log(path, vocabulary, options)?;
    let aggregate = StatsAggregator::new(vocabulary).aggregate(&records);
    let breakdown = BreakdownNode::from_report(&aggregate, &PHASE_TREE);
    Ok(TraceAnalysis {
        aggregate,
        breakdown,
    })
}

/// Lists the spans recorded in a trace log.
pub fn span_timeline(path: &Path, options: ParserOptions) -> Result<SpanTimeline> {
    let events = TraceEventParser::new(options).parse_path(path)?;
    Ok(SpanTimeline::build(events))
}

#[cfg(test)]
mod tests {
    use super::{analyze_trace_log, span_timeline};
    use crate::error::HarnessError;
    use crate::trace::{ParserOptions, PhaseVocabulary};
    use std::io::Write;

    const LOG: &str = "\
EVENT TYPE,TIMESTAMP,DURATION,TRACE ID,DATASTORE,MESSAGE
start,2024-05-01T10:00:00.000000,,t1,running,restconf edit
start,2024-05-01T10:00:00.100000,,t1,operational,commit
stop,2024-05-01T10:00:00.200000,0.1,t1,operational,commit
stop,2024-05-01T10:00:01.000000,1.0,t1,running,restconf edit
";

    #[test]
    fn analysis_and_timeline_honour_operational_filter() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(LOG.as_bytes()).expect("write log");
        let vocabulary = PhaseVocabulary::default();
        let skip = ParserOptions {
            skip_operational: true,
        };

        let all = analyze_trace_log(file.path(), &vocabulary, ParserOptions::default())
            .expect("analysis");
        let filtered = analyze_trace_log(file.path(), &vocabulary, skip).expect("analysis");

        assert_eq!(all.aggregate.mean("commit"), 0.1);
        assert_eq!(filtered.aggregate.mean("commit"), 0.0);
        assert_eq!(span_timeline(file.path(), skip).expect("timeline").spans.len(), 1);
    }

    #[test]
    fn missing_log_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = analyze_trace_log(
            &dir.path().join("missing.csv"),
            &PhaseVocabulary::default(),
            ParserOptions::default(),
        )
        .expect_err("missing");

        assert!(matches!(err, HarnessError::TraceLog { .. }));
    }
}
