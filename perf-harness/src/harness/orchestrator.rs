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

use crate::completion::{CompletionCounts, CompletionWatcher, WatchExit};
use crate::dispatch::{
    LoadDispatcher, PayloadFactory, PayloadTemplate, RetryPolicy, RetryingTransactionClient,
    WorkPlan, DEFAULT_MAX_ATTEMPTS,
};
use crate::error::{HarnessError, Result};
use crate::observability::{events, fields::format_millis};
use crate::report::{HarnessReport, RunRecord};
use crate::stats::StatsAggregator;
use crate::store::{AsyncQueues, CommitQueueMode, EventSubscription, StoreService, TraceSettings};
use crate::trace::{wait_for_trace_records, ParserOptions, PhaseVocabulary, TraceWait};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

const COMPONENT: &str = "harness";
const RUN_ID_LEN: usize = 8;

pub const DEFAULT_TRACE_NAME: &str = "perf-trace";
pub const DEFAULT_TRACE_PREFIX: &str = "perf";
pub const DEFAULT_TRACE_CONTEXT: &str = "rest";

/// Where the store writes its phase trace and how long to wait for it.
#[derive(Clone, Debug)]
pub struct TraceRunSettings {
    pub name: String,
    pub file_prefix: String,
    /// Directory the store writes trace files into, as seen from here.
    pub log_dir: PathBuf,
    pub context_filter: Option<String>,
    pub wait: TraceWait,
}

impl Default for TraceRunSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_TRACE_NAME.to_string(),
            file_prefix: DEFAULT_TRACE_PREFIX.to_string(),
            log_dir: PathBuf::from("logs"),
            context_filter: Some(DEFAULT_TRACE_CONTEXT.to_string()),
            wait: TraceWait::default(),
        }
    }
}

impl TraceRunSettings {
    pub fn file_name(&self, run_id: &str) -> String {
        format!("{}-{run_id}.csv", self.file_prefix)
    }
}

#[derive(Clone, Debug)]
pub struct HarnessSettings {
    pub plan: WorkPlan,
    /// Replace `plan.devices` with the number of devices the store manages.
    pub discover_devices: bool,
    pub commit_queue: CommitQueueMode,
    /// Overrides the completion count derived from the commit-queue mode.
    pub expected_completions: Option<usize>,
    pub max_attempts: u32,
    pub retry: RetryPolicy,
    pub pool_size: Option<usize>,
    pub payload: PayloadTemplate,
    pub trace: TraceRunSettings,
    pub completion: CompletionWatcher,
    pub vocabulary: PhaseVocabulary,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            plan: WorkPlan {
                devices: 1,
                transactions_per_device: 1,
            },
            discover_devices: false,
            commit_queue: CommitQueueMode::None,
            expected_completions: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry: RetryPolicy::default(),
            pool_size: None,
            payload: PayloadTemplate::default(),
            trace: TraceRunSettings::default(),
            completion: CompletionWatcher::default(),
            vocabulary: PhaseVocabulary::default(),
        }
    }
}

impl HarnessSettings {
    /// Completion notifications to wait for when no device defaults to an
    /// async commit queue.
    pub fn expected_completions(&self) -> usize {
        self.expected_completions_for(&self.plan, AsyncQueues::Disabled)
    }

    /// Completion notifications to wait for. Without an explicit commit-queue
    /// mode the devices' own default decides which transactions complete
    /// asynchronously.
    pub fn expected_completions_for(&self, plan: &WorkPlan, async_queues: AsyncQueues) -> usize {
        if let Some(expected) = self.expected_completions {
            return expected;
        }
        match (self.commit_queue, async_queues) {
            (CommitQueueMode::Async, _) | (CommitQueueMode::None, AsyncQueues::All) => {
                plan.device_transactions()
            }
            (CommitQueueMode::None, AsyncQueues::Devices(devices)) => {
                plan.device_transactions_on(devices)
            }
            _ => 0,
        }
    }

    fn needs_inventory(&self) -> bool {
        self.discover_devices
            || (self.expected_completions.is_none() && self.commit_queue == CommitQueueMode::None)
    }
}

/// Sequences one measurement run against a store.
pub struct HarnessOrchestrator {
    store: Arc<dyn StoreService>,
    settings: HarnessSettings,
}

impl HarnessOrchestrator {
    pub fn new(store: Arc<dyn StoreService>, settings: HarnessSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &HarnessSettings {
        &self.settings
    }

    /// Runs the load and returns the correlated report.
    ///
    /// Tracing is switched on before any transaction is sent and switched off
    /// only after the trace log has been read, whether or not that read
    /// succeeded. Failing to enable tracing or to open the notification
    /// stream aborts the run before dispatch.
    pub async fn run(&self) -> Result<HarnessReport> {
        let settings = &self.settings;
        let mut run_id = Uuid::new_v4().simple().to_string();
        run_id.truncate(RUN_ID_LEN);
        let trace_file = settings.trace.file_name(&run_id);
        let trace_path = settings.trace.log_dir.join(&trace_file);
        let (plan, async_queues) = self.resolve_plan().await?;
        let expected_completions = settings.expected_completions_for(&plan, async_queues);

        info!(
            event = events::HARNESS_RUN_START,
            component = COMPONENT,
            run_id = run_id.as_str(),
            requests = plan.request_count(),
            devices = plan.devices,
            commit_queue = settings.commit_queue.as_str(),
            expected_completions,
            "starting harness run"
        );

        let trace_settings = TraceSettings {
            name: settings.trace.name.clone(),
            destination_file: trace_file,
            context_filter: settings.trace.context_filter.clone(),
        };
        self.store
            .enable_trace(&trace_settings)
            .await
            .map_err(HarnessError::TraceSetup)?;
        info!(
            event = events::TRACE_ENABLE,
            component = COMPONENT,
            trace = trace_settings.name.as_str(),
            path = %trace_path.display(),
            "progress trace enabled"
        );

        let started_at = Utc::now();
        let clock = Instant::now();
        let (confirmed_tx, confirmed_rx) = watch::channel(None);

        let watcher_task = if expected_completions > 0 {
            let subscription = EventSubscription {
                start_time: started_at,
            };
            let stream = match self.store.subscribe(&subscription).await {
                Ok(stream) => stream,
                Err(err) => {
                    self.disable_trace().await;
                    return Err(HarnessError::StreamSetup(err));
                }
            };
            let watcher = settings.completion.clone();
            Some(tokio::spawn(async move {
                watcher
                    .watch(stream, expected_completions, confirmed_rx)
                    .await
            }))
        } else {
            None
        };

        let factory = PayloadFactory::new(settings.payload.clone(), run_id.as_str());
        let items = plan.work_items(&factory, settings.max_attempts);
        let dispatcher = LoadDispatcher::new(RetryingTransactionClient::new(
            self.store.clone(),
            settings.retry,
        ))
        .with_pool_size(settings.pool_size);
        let dispatch = dispatcher.dispatch(items).await;
        let confirmed = plan.confirmed_device_transactions(dispatch.succeeded());
        let _ = confirmed_tx.send(Some(confirmed));

        let completions = match watcher_task {
            Some(task) => task.await.unwrap_or_else(|err| {
                warn!(
                    event = events::COMPLETION_STREAM_ERROR,
                    component = COMPONENT,
                    err = %err,
                    "completion watcher terminated abnormally"
                );
                CompletionCounts {
                    exit: WatchExit::StreamEnded,
                    ..CompletionCounts::default()
                }
            }),
            None => CompletionCounts::default(),
        };
        let wall_clock = clock.elapsed();

        let records = wait_for_trace_records(
            &trace_path,
            &settings.vocabulary,
            dispatch.succeeded(),
            ParserOptions::default(),
            settings.trace.wait,
        )
        .await;
        self.disable_trace().await;
        let records = records?;

        let aggregate = StatsAggregator::new(&settings.vocabulary)
            .aggregate(&records)
            .with_outcome_counts(dispatch.succeeded(), dispatch.failed());

        info!(
            event = events::HARNESS_RUN_DONE,
            component = COMPONENT,
            run_id = run_id.as_str(),
            succeeded = dispatch.succeeded(),
            failed = dispatch.failed(),
            completed = completions.completed,
            wall_clock_ms = format_millis(wall_clock),
            "harness run finished"
        );

        Ok(HarnessReport::from_run(RunRecord {
            run_id: &run_id,
            trace_file: &trace_path,
            started_at,
            wall_clock,
            plan,
            commit_queue: settings.commit_queue,
            dispatch: &dispatch,
            expected_completions,
            completions,
            aggregate,
        }))
    }

    /// Applies the store's device inventory to the configured plan. Only a
    /// failure to count devices aborts the run; an unreadable commit-queue
    /// default leaves completion watching off.
    async fn resolve_plan(&self) -> Result<(WorkPlan, AsyncQueues)> {
        let settings = &self.settings;
        let mut plan = settings.plan;
        if !settings.needs_inventory() {
            return Ok((plan, AsyncQueues::Disabled));
        }

        let inventory = match self.store.discover().await {
            Ok(inventory) => inventory,
            Err(err) if settings.discover_devices => return Err(HarnessError::Discovery(err)),
            Err(err) => {
                warn!(
                    event = events::DEVICE_DISCOVERY,
                    component = COMPONENT,
                    err = %err,
                    "unable to read device inventory, not watching completions"
                );
                return Ok((plan, AsyncQueues::Disabled));
            }
        };
        if settings.discover_devices {
            plan.devices = inventory.devices;
        }
        info!(
            event = events::DEVICE_DISCOVERY,
            component = COMPONENT,
            devices = inventory.devices,
            async_queues = ?inventory.async_queues,
            "read device inventory"
        );
        Ok((plan, inventory.async_queues))
    }

    async fn disable_trace(&self) {
        let name = self.settings.trace.name.as_str();
        match self.store.disable_trace(name).await {
            Ok(()) => info!(
                event = events::TRACE_DISABLE,
                component = COMPONENT,
                trace = name,
                "progress trace disabled"
            ),
            Err(err) => warn!(
                event = events::TRACE_DISABLE_FAILED,
                component = COMPONENT,
                trace = name,
                err = %err,
                "unable to disable progress trace"
            ),
        }
    }
}
