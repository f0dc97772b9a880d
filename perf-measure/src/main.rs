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


mod config;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use config::{Config, LoadOverrides};
use perf_harness::harness::{analyze_trace_log, span_timeline, HarnessOrchestrator};
use perf_harness::report::{
    render_breakdown_text, render_harness_report_text, render_overview_text, write_harness_report,
    HarnessReport,
};
use perf_harness::store::{CommitQueueMode, RestconfStore};
use perf_harness::trace::{ParserOptions, PhaseVocabulary};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    version,
    about = "Measure write-transaction latency against a configuration store",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Drive a load run and report where the time went
    Run(RunArgs),
    /// Aggregate an existing progress-trace log
    Analyze {
        #[arg(value_name = "TRACE_CSV")]
        trace_file: PathBuf,
        /// Drop rows recorded against the operational datastore
        #[arg(long)]
        skip_operational: bool,
        /// Print the aggregate as JSON
        #[arg(long)]
        json: bool,
        /// Devices touched by the traced run; 0 hides the device share
        #[arg(short, long, default_value_t = 1)]
        devices: usize,
    },
    /// List the spans of an existing progress-trace log
    Spans {
        #[arg(value_name = "TRACE_CSV")]
        trace_file: PathBuf,
        /// Keep rows recorded against the operational datastore
        #[arg(long)]
        include_operational: bool,
    },
}

#[derive(Args)]
struct RunArgs {
    /// The path to a configuration file
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,
    /// Devices to load; defaults to every device the store manages
    #[arg(short, long)]
    devices: Option<usize>,
    /// Transactions per device; 0 configures all devices in one transaction
    #[arg(short = 'n', long)]
    transactions_per_device: Option<usize>,
    /// none, async, sync or bypass
    #[arg(short = 'q', long)]
    commit_queue: Option<CommitQueueMode>,
    #[arg(short, long)]
    pool_size: Option<usize>,
    /// Directory for the JSON and text report
    #[arg(short, long, value_name = "DIR")]
    report_dir: Option<PathBuf>,
}

impl RunArgs {
    fn overrides(&self) -> LoadOverrides {
        LoadOverrides {
            devices: self.devices,
            transactions_per_device: self.transactions_per_device,
            commit_queue: self.commit_queue,
            pool_size: self.pool_size,
            report_dir: self.report_dir.clone(),
        }
    }
}

fn span_parser_options(include_operational: bool) -> ParserOptions {
    ParserOptions {
        skip_operational: !include_operational,
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run(args: RunArgs) -> Result<HarnessReport> {
    let mut config = Config::load(&args.config)?;
    config.apply_overrides(args.overrides());

    let store =
        RestconfStore::new(config.restconf_settings()).context("unable to create store client")?;
    let orchestrator = HarnessOrchestrator::new(Arc::new(store), config.harness_settings());
    let report = orchestrator.run().await.context("measurement run failed")?;

    println!("{}", render_harness_report_text(&report));
    if let Some(dir) = &config.report.dir {
        let (json, text) = write_harness_report(&report, dir).context("unable to write report")?;
        info!("report written to {} and {}", json.display(), text.display());
    }
    Ok(report)
}

fn analyze(trace_file: PathBuf, skip_operational: bool, json: bool, devices: usize) -> Result<()> {
    let vocabulary = PhaseVocabulary::default();
    let options = ParserOptions { skip_operational };
    let analysis = analyze_trace_log(&trace_file, &vocabulary, options)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        println!("{}", render_overview_text(&analysis.aggregate, devices));
        println!(
            "{}",
            render_breakdown_text(&analysis.breakdown, analysis.aggregate.transactions)
        );
    }
    Ok(())
}

fn spans(trace_file: PathBuf, include_operational: bool) -> Result<()> {
    let timeline = span_timeline(&trace_file, span_parser_options(include_operational))?;
    print!("{}", timeline.render());
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run(args) => run(args)
            .await
            .map(|report| report.failed == 0 && report.completions.failed == 0),
        Command::Analyze {
            trace_file,
            skip_operational,
            json,
            devices,
        } => analyze(trace_file, skip_operational, json, devices).map(|()| true),
        Command::Spans {
            trace_file,
            include_operational,
        } => spans(trace_file, include_operational).map(|()| true),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(error) => {
            eprintln!("perf-measure failed: {error:#}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;
    use perf_harness::trace::ParserOptions;

    #[test]
    fn analyze_keeps_operational_rows_like_a_run_does() {
        let cli = Cli::try_parse_from(["perf-measure", "analyze", "trace.csv"]).expect("args");
        let Command::Analyze { skip_operational, .. } = cli.command else {
            panic!("expected analyze");
        };

        assert_eq!(ParserOptions { skip_operational }, ParserOptions::default());
    }

    #[test]
    fn analyze_can_drop_operational_rows() {
        let cli =
            Cli::try_parse_from(["perf-measure", "analyze", "trace.csv", "--skip-operational"])
                .expect("args");

        assert!(matches!(
            cli.command,
            Command::Analyze {
                skip_operational: true,
                ..
            }
        ));
    }
}
