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

//! Progress-trace log handling: reading, span correlation and waiting for a
//! complete log.

pub mod correlator;
pub mod parser;
pub mod phases;
pub mod timeline;
pub mod wait;

pub use correlator::{CorrelatedPhases, PhaseCorrelator, PhaseRecord};
pub use parser::{ParserOptions, SpanKey, TraceEvent, TraceEventKind, TraceEventParser};
pub use phases::PhaseVocabulary;
pub use timeline::{SpanTimeline, TimelineSpan};
pub use wait::{read_trace_log, wait_for_trace_records, TraceWait};
