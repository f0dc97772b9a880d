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

//! Canonical structured event names used across `perf-harness`.

// Dispatch and retry events.
pub const DISPATCH_START: &str = "dispatch_start";
pub const DISPATCH_DONE: &str = "dispatch_done";
pub const SUBMIT_ATTEMPT: &str = "submit_attempt";
pub const SUBMIT_OK: &str = "submit_ok";
pub const SUBMIT_REJECTED: &str = "submit_rejected";
pub const SUBMIT_RETRY: &str = "submit_retry";
pub const SUBMIT_EXHAUSTED: &str = "submit_exhausted";
pub const SUBMIT_FATAL: &str = "submit_fatal";
pub const WORKER_LOST: &str = "worker_lost";

// Completion stream events.
pub const COMPLETION_WATCH_SKIPPED: &str = "completion_watch_skipped";
pub const COMPLETION_WATCH_START: &str = "completion_watch_start";
pub const COMPLETION_OK: &str = "completion_ok";
pub const COMPLETION_FAILED: &str = "completion_failed";
pub const COMPLETION_FRAME_DISCARDED: &str = "completion_frame_discarded";
pub const COMPLETION_STREAM_ERROR: &str = "completion_stream_error";
pub const COMPLETION_WATCH_DONE: &str = "completion_watch_done";

// Trace log events.
pub const TRACE_ENABLE: &str = "trace_enable";
pub const TRACE_DISABLE: &str = "trace_disable";
pub const TRACE_DISABLE_FAILED: &str = "trace_disable_failed";
pub const TRACE_ROW_SKIPPED: &str = "trace_row_skipped";
pub const TRACE_POLL: &str = "trace_poll";
pub const TRACE_POLL_TIMEOUT: &str = "trace_poll_timeout";

// Orchestration events.
pub const HARNESS_RUN_START: &str = "harness_run_start";
pub const DEVICE_DISCOVERY: &str = "device_discovery";
pub const HARNESS_RUN_DONE: &str = "harness_run_done";
pub const REPORT_WRITTEN: &str = "report_written";
