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


use anyhow::{Context, Result};
use perf_harness::completion::{watcher::DEFAULT_SUBJECT, CompletionWatcher};
use perf_harness::dispatch::{PayloadTemplate, RetryPolicy, WorkPlan};
use perf_harness::harness::{HarnessSettings, TraceRunSettings};
use perf_harness::store::{CommitQueueMode, RestconfSettings};
use perf_harness::trace::{PhaseVocabulary, TraceWait};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub(crate) store: StoreConfig,
    #[serde(default)]
    pub(crate) load: LoadConfig,
    #[serde(default)]
    pub(crate) trace: TraceConfig,
    #[serde(default)]
    pub(crate) completion: CompletionConfig,
    #[serde(default)]
    pub(crate) payload: PayloadConfig,
    #[serde(default)]
    pub(crate) report: ReportConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    pub(crate) base_url: String,
    #[serde(default = "default_username")]
    pub(crate) username: String,
    #[serde(default = "default_password")]
    pub(crate) password: String,
    #[serde(default = "default_stream")]
    pub(crate) stream: String,
    #[serde(default = "default_request_timeout_ms")]
    pub(crate) request_timeout_ms: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    /// Unset uses every device the store manages.
    pub(crate) devices: Option<usize>,
    /// Zero sends one transaction configuring every device.
    pub(crate) transactions_per_device: usize,
    pub(crate) commit_queue: CommitQueueMode,
    pub(crate) expected_completions: Option<usize>,
    pub(crate) max_attempts: u32,
    pub(crate) backoff_step_ms: u64,
    pub(crate) pool_size: Option<usize>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            devices: None,
            transactions_per_device: 5,
            commit_queue: CommitQueueMode::None,
            expected_completions: None,
            max_attempts: 5,
            backoff_step_ms: 20,
            pool_size: None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct TraceConfig {
    pub(crate) name: String,
    pub(crate) file_prefix: String,
    pub(crate) log_dir: PathBuf,
    pub(crate) context: Option<String>,
    pub(crate) poll_interval_ms: u64,
    pub(crate) wait_timeout_ms: u64,
}

impl Default for TraceConfig {
    fn default() -> Self {
        let defaults = TraceRunSettings::default();
        Self {
            name: defaults.name,
            file_prefix: defaults.file_prefix,
            log_dir: defaults.log_dir,
            context: defaults.context_filter,
            poll_interval_ms: millis(defaults.wait.poll_interval),
            wait_timeout_ms: millis(defaults.wait.timeout),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct CompletionConfig {
    pub(crate) subject: String,
    pub(crate) idle_timeout_ms: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            subject: DEFAULT_SUBJECT.to_string(),
            idle_timeout_ms: 120_000,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct PayloadConfig {
    pub(crate) container: String,
    pub(crate) list: String,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        let template = PayloadTemplate::default();
        Self {
            container: template.container,
            list: template.list,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Run artifacts are written here when set.
    pub(crate) dir: Option<PathBuf>,
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Default, Clone)]
pub struct LoadOverrides {
    pub(crate) devices: Option<usize>,
    pub(crate) transactions_per_device: Option<usize>,
    pub(crate) commit_queue: Option<CommitQueueMode>,
    pub(crate) pool_size: Option<usize>,
    pub(crate) report_dir: Option<PathBuf>,
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_password() -> String {
    "admin".to_string()
}

fn default_stream() -> String {
    "service-state-changes".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Config {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("unable to parse config file {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        Ok(json5::from_str(contents)?)
    }

    pub(crate) fn apply_overrides(&mut self, overrides: LoadOverrides) {
        if overrides.devices.is_some() {
            self.load.devices = overrides.devices;
        }
        if let Some(transactions) = overrides.transactions_per_device {
            self.load.transactions_per_device = transactions;
        }
        if let Some(commit_queue) = overrides.commit_queue {
            self.load.commit_queue = commit_queue;
        }
        if overrides.pool_size.is_some() {
            self.load.pool_size = overrides.pool_size;
        }
        if overrides.report_dir.is_some() {
            self.report.dir = overrides.report_dir;
        }
    }

    pub(crate) fn restconf_settings(&self) -> RestconfSettings {
        RestconfSettings {
            base_url: self.store.base_url.clone(),
            username: self.store.username.clone(),
            password: self.store.password.clone(),
            stream: self.store.stream.clone(),
            commit_queue: self.load.commit_queue,
            request_timeout: Duration::from_millis(self.store.request_timeout_ms),
        }
    }

    pub(crate) fn harness_settings(&self) -> HarnessSettings {
        HarnessSettings {
            plan: WorkPlan {
                devices: self.load.devices.unwrap_or(1),
                transactions_per_device: self.load.transactions_per_device,
            },
            discover_devices: self.load.devices.is_none(),
            commit_queue: self.load.commit_queue,
            expected_completions: self.load.expected_completions,
            max_attempts: self.load.max_attempts,
            retry: RetryPolicy {
                backoff_step: Duration::from_millis(self.load.backoff_step_ms),
            },
            pool_size: self.load.pool_size,
            payload: PayloadTemplate {
                container: self.payload.container.clone(),
                list: self.payload.list.clone(),
            },
            trace: TraceRunSettings {
                name: self.trace.name.clone(),
                file_prefix: self.trace.file_prefix.clone(),
                log_dir: self.trace.log_dir.clone(),
                context_filter: self.trace.context.clone(),
                wait: TraceWait {
                    poll_interval: Duration::from_millis(self.trace.poll_interval_ms),
                    timeout: Duration::from_millis(self.trace.wait_timeout_ms),
                },
            },
            completion: CompletionWatcher::new(
                self.completion.subject.as_str(),
                Duration::from_millis(self.completion.idle_timeout_ms),
            ),
            vocabulary: PhaseVocabulary::default(),
        }
    }
}
