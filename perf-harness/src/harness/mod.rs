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

pub mod analysis;
pub mod orchestrator;

pub use analysis::{analyze_trace_log, span_timeline, TraceAnalysis};
pub use orchestrator::{HarnessOrchestrator, HarnessSettings, TraceRunSettings};
