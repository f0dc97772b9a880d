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

use super::parser::{SpanKey, TraceEvent, TraceEventKind};
use super::phases::PhaseVocabulary;
use std::collections::{BTreeMap, HashSet};

/// Phase durations, in seconds, recorded for one transaction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhaseRecord {
    durations: BTreeMap<String, f64>,
}

impl PhaseRecord {
    pub fn get(&self, phase: &str) -> Option<f64> {
        self.durations.get(phase).copied()
    }

    pub fn contains(&self, phase: &str) -> bool {
        self.durations.contains_key(phase)
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.durations
            .iter()
            .map(|(phase, seconds)| (phase.as_str(), *seconds))
    }

    fn record(&mut self, phase: &str, seconds: f64) {
        self.durations.insert(phase.to_string(), seconds);
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for PhaseRecord {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            durations: iter
                .into_iter()
                .map(|(phase, seconds)| (phase.into(), seconds))
                .collect(),
        }
    }
}

/// Per-transaction phase records, keyed by correlation id.
pub type CorrelatedPhases = BTreeMap<String, PhaseRecord>;

/// Pairs `start`/`stop` events into per-transaction phase durations.
///
/// A span is open from its first `start` until a `stop` with an identical
/// [`SpanKey`]. Repeated starts collapse into one open span, stray stops are
/// dropped, and a phase closed twice for one transaction keeps the latest
/// duration. Phases outside the vocabulary never reach a record.
pub struct PhaseCorrelator<'a> {
    vocabulary: &'a PhaseVocabulary,
    open_spans: HashSet<SpanKey>,
    records: CorrelatedPhases,
}

impl<'a> PhaseCorrelator<'a> {
    pub fn new(vocabulary: &'a PhaseVocabulary) -> Self {
        Self {
            vocabulary,
            open_spans: HashSet::new(),
            records: CorrelatedPhases::new(),
        }
    }

    /// Correlates a complete event sequence in one call.
    pub fn correlate<I>(vocabulary: &'a PhaseVocabulary, events: I) -> CorrelatedPhases
    where
        I: IntoIterator<Item = TraceEvent>,
    {
        let mut correlator = Self::new(vocabulary);
        events.into_iter().for_each(|event| correlator.observe(event));
        correlator.finish()
    }

    pub fn observe(&mut self, event: TraceEvent) {
        match event.kind {
            TraceEventKind::Start => {
                self.open_spans.insert(event.key);
            }
            TraceEventKind::Stop => {
                if !self.open_spans.remove(&event.key) {
                    return;
                }
                if !self.vocabulary.contains(&event.phase_name) {
                    return;
                }
                self.records
                    .entry(event.key.correlation_id().to_string())
                    .or_default()
                    .record(&event.phase_name, event.duration);
            }
        }
    }

    /// Spans started but not yet stopped.
    pub fn open_span_count(&self) -> usize {
        self.open_spans.len()
    }

    pub fn finish(self) -> CorrelatedPhases {
        self.records
    }
}
