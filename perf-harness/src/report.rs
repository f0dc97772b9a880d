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

//! Run reports: the serializable record of one run and its text rendering.

use crate::completion::CompletionCounts;
use crate::dispatch::{DispatchSummary, IndexedOutcome, WorkPlan};
use crate::error::{HarnessError, Result};
use crate::observability::events;
use crate::stats::{AggregateReport, BreakdownNode, PHASE_TREE};
use crate::store::CommitQueueMode;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const COMPONENT: &str = "report";

pub const HARNESS_REPORT_SCHEMA_VERSION: &str = "1.0";

const LABEL_WIDTH: usize = 52;

#[derive(Clone, Debug, Serialize)]
pub struct HarnessReport {
    pub schema_version: String,
    pub run_id: String,
    pub trace_file: PathBuf,
    pub started_at: DateTime<Utc>,
    pub wall_clock_seconds: f64,
    pub cpu_cores: usize,
    pub plan: WorkPlan,
    pub commit_queue: CommitQueueMode,
    pub requests: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<IndexedOutcome>,
    pub expected_completions: usize,
    pub completions: CompletionCounts,
    pub aggregate: AggregateReport,
    pub breakdown: BreakdownNode,
}

/// Inputs gathered by one harness run.
pub struct RunRecord<'a> {
    pub run_id: &'a str,
    pub trace_file: &'a Path,
    pub started_at: DateTime<Utc>,
    pub wall_clock: Duration,
    pub plan: WorkPlan,
    pub commit_queue: CommitQueueMode,
    pub dispatch: &'a DispatchSummary,
    pub expected_completions: usize,
    pub completions: CompletionCounts,
    pub aggregate: AggregateReport,
}

impl HarnessReport {
    pub fn from_run(run: RunRecord<'_>) -> Self {
        let breakdown = BreakdownNode::from_report(&run.aggregate, &PHASE_TREE);
        Self {
            schema_version: HARNESS_REPORT_SCHEMA_VERSION.to_string(),
            run_id: run.run_id.to_string(),
            trace_file: run.trace_file.to_path_buf(),
            started_at: run.started_at,
            wall_clock_seconds: run.wall_clock.as_secs_f64(),
            cpu_cores: cpu_cores(),
            plan: run.plan,
            commit_queue: run.commit_queue,
            requests: run.dispatch.total(),
            succeeded: run.dispatch.succeeded(),
            failed: run.dispatch.failed(),
            failures: run.dispatch.failures().cloned().collect(),
            expected_completions: run.expected_completions,
            completions: run.completions,
            aggregate: run.aggregate,
            breakdown,
        }
    }

    /// Share of requests the store accepted, 0 to 100.
    pub fn success_rate(&self) -> f64 {
        ratio_percent(self.succeeded, self.requests)
    }

    /// Share of expected asynchronous completions that completed.
    pub fn completion_rate(&self) -> f64 {
        ratio_percent(self.completions.completed, self.expected_completions)
    }
}

fn cpu_cores() -> usize {
    std::thread::available_parallelism().map_or(1, usize::from)
}

fn ratio_percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn metric_line(label: &str, percent: f64, seconds: f64, precision: usize) -> String {
    format!("{label:<LABEL_WIDTH$}{percent:6.2}% {seconds:.precision$}s")
}

/// Per-phase means laid out along the phase tree.
pub fn render_breakdown_text(breakdown: &BreakdownNode, transactions: usize) -> String {
    let mut lines = vec![format!("Detailed averages for N={transactions} transactions:")];
    for (depth, node) in breakdown.walk() {
        let label = format!("{}{}", "  ".repeat(depth), node.phase);
        lines.push(metric_line(&label, node.percent_of_total, node.seconds, 4));
    }
    lines.join("\n")
}

/// Composite metrics. The device share is only meaningful when devices are
/// configured.
pub fn render_overview_text(aggregate: &AggregateReport, devices: usize) -> String {
    let mut lines = vec![
        format!("Averages for N={} transactions:", aggregate.transactions),
        format!("{:<LABEL_WIDTH$}{:.2}s", "Start-to-finish time", aggregate.total_seconds),
    ];
    for metric in &aggregate.composites {
        match metric.percent_of_parent {
            Some(parent_share) if devices > 0 => lines.push(metric_line(
                &format!("...of which {}", metric.label.to_lowercase()),
                parent_share,
                metric.seconds,
                2,
            )),
            Some(_) => {}
            None => lines.push(metric_line(
                &metric.label,
                metric.percent_of_total,
                metric.seconds,
                2,
            )),
        }
    }
    lines.join("\n")
}

pub fn render_results_text(report: &HarnessReport) -> String {
    let mut lines = vec![
        format!("Results for N={} transactions:", report.requests),
        format!("{:<LABEL_WIDTH$}{}", "Number of CPU cores", report.cpu_cores),
        format!("{:<LABEL_WIDTH$}{}", "Number of devices configured", report.plan.devices),
        format!(
            "{:<LABEL_WIDTH$}{}",
            "Transactions per device",
            report.plan.effective_transactions_per_device()
        ),
        format!("{:<LABEL_WIDTH$}{}", "Total number of transactions", report.requests),
        format!(
            "{:<LABEL_WIDTH$}{}",
            "Total number of device transactions",
            report.plan.device_transactions()
        ),
        format!("{:<LABEL_WIDTH$}{:.0}%", "Successful requests", report.success_rate()),
    ];
    if report.expected_completions > 0 {
        lines.push(format!(
            "{:<LABEL_WIDTH$}{:.0}%",
            "Successful async queued device transactions",
            report.completion_rate()
        ));
    }
    lines.push(format!("{:<LABEL_WIDTH$}{:.2}s", "Wall-clock time", report.wall_clock_seconds));
    for failure in &report.failures {
        lines.push(format!("failed: item {} -> {:?}", failure.index, failure.outcome));
    }
    lines.join("\n")
}

pub fn render_harness_report_text(report: &HarnessReport) -> String {
    [
        render_breakdown_text(&report.breakdown, report.aggregate.transactions),
        render_overview_text(&report.aggregate, report.plan.devices),
        render_results_text(report),
    ]
    .join("\n\n")
}

/// Writes `<run_id>-report.json` and `<run_id>-report.txt` into `dir`.
pub fn write_harness_report(report: &HarnessReport, dir: &Path) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir).map_err(|source| HarnessError::Report {
        path: dir.to_path_buf(),
        source,
    })?;

    let report_json = dir.join(format!("{}-report.json", report.run_id));
    let report_txt = dir.join(format!("{}-report.txt", report.run_id));

    let json_payload = serde_json::to_string_pretty(report)?;
    fs::write(&report_json, json_payload).map_err(|source| HarnessError::Report {
        path: report_json.clone(),
        source,
    })?;
    fs::write(&report_txt, render_harness_report_text(report)).map_err(|source| {
        HarnessError::Report {
            path: report_txt.clone(),
            source,
        }
    })?;

    info!(
        event = events::REPORT_WRITTEN,
        component = COMPONENT,
        json = %report_json.display(),
        text = %report_txt.display(),
        "run report written"
    );
    Ok((report_json, report_txt))
}

#[cfg(test)]
mod tests {
    use super::{render_overview_text, write_harness_report, HarnessReport, RunRecord};
    use crate::completion::CompletionCounts;
    use crate::dispatch::{DispatchSummary, IndexedOutcome, TransactionOutcome, WorkPlan};
    use crate::stats::StatsAggregator;
    use crate::store::CommitQueueMode;
    use crate::trace::phases::{self, PhaseVocabulary};
    use crate::trace::{CorrelatedPhases, PhaseRecord};
    use chrono::Utc;
    use std::io;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().expect("log lock")).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("log lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn dispatch(outcomes: Vec<TransactionOutcome>) -> DispatchSummary {
        DispatchSummary {
            outcomes: outcomes
                .into_iter()
                .enumerate()
                .map(|(index, outcome)| IndexedOutcome {
                    index,
                    device: Some(0),
                    outcome,
                })
                .collect(),
            elapsed: Duration::from_millis(10),
        }
    }

    fn report(outcomes: Vec<TransactionOutcome>, records: CorrelatedPhases) -> HarnessReport {
        let vocabulary = PhaseVocabulary::default();
        let dispatch = dispatch(outcomes);
        let aggregate = StatsAggregator::new(&vocabulary)
            .aggregate(&records)
            .with_outcome_counts(dispatch.succeeded(), dispatch.failed());
        HarnessReport::from_run(RunRecord {
            run_id: "abc123",
            trace_file: Path::new("logs/perf-abc123.csv"),
            started_at: Utc::now(),
            wall_clock: Duration::from_millis(1250),
            plan: WorkPlan {
                devices: 1,
                transactions_per_device: dispatch.total(),
            },
            commit_queue: CommitQueueMode::None,
            dispatch: &dispatch,
            expected_completions: 0,
            completions: CompletionCounts::default(),
            aggregate,
        })
    }

    #[test]
    fn zero_success_still_reports_a_rate() {
        let report = report(vec![TransactionOutcome::HttpFailure(500)], CorrelatedPhases::new());
        let text = super::render_harness_report_text(&report);

        assert_eq!(report.success_rate(), 0.0);
        let rate_line = text
            .lines()
            .find(|line| line.starts_with("Successful requests"))
            .expect("success rate line");
        assert!(rate_line.ends_with(" 0%"));
        assert!(text.contains("failed: item 0 -> HttpFailure(500)"));
    }

    #[test]
    fn overview_reports_device_share_of_lock_hold_time() {
        let records: CorrelatedPhases = [(
            "t1".to_string(),
            PhaseRecord::from_iter([
                (phases::RESTCONF_EDIT, 1.0),
                (phases::HOLDING_TRANSACTION_LOCK, 0.5),
                (phases::PREPARE, 0.2),
                (phases::COMMIT, 0.05),
            ]),
        )]
        .into_iter()
        .collect();
        let report = report(vec![TransactionOutcome::Success], records);
        let overview = render_overview_text(&report.aggregate, 1);

        let device_line = overview
            .lines()
            .find(|line| line.starts_with("...of which device interaction"))
            .expect("device interaction line");
        assert!(device_line.contains("50.00%"));
        assert!(!render_overview_text(&report.aggregate, 0).contains("device interaction"));
    }

    #[test]
    fn writes_json_and_text_artifacts() {
        let dir = tempfile::tempdir().expect("temp dir");
        let report = report(vec![TransactionOutcome::Success], CorrelatedPhases::new());

        let (json, text) =
            write_harness_report(&report, &dir.path().join("reports")).expect("written");

        let payload: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(json).expect("json")).expect("parse");
        assert_eq!(payload["run_id"], "abc123");
        assert_eq!(payload["succeeded"], 1);
        assert!(std::fs::read_to_string(text)
            .expect("text")
            .contains("Wall-clock time"));
    }

    #[test]
    fn report_written_event_names_its_component() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let dir = tempfile::tempdir().expect("temp dir");
        let report = report(vec![TransactionOutcome::Success], CorrelatedPhases::new());

        tracing::subscriber::with_default(subscriber, || {
            write_harness_report(&report, dir.path()).expect("written");
        });

        let text = logs.text();
        let line = text
            .lines()
            .find(|line| line.contains("event=\"report_written\""))
            .expect("report written event");
        assert!(line.contains("component=\"report\""));
    }
}
