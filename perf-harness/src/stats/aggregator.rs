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

//! Cross-transaction phase statistics.
//!
//! Means are taken over every correlated transaction, counting a missing
//! phase as zero. Composite metrics are sums of already averaged phases, so
//! they never touch raw events.

use crate::trace::phases::{self, PhaseVocabulary};
use crate::trace::CorrelatedPhases;
use serde::Serialize;

/// Mean duration of one phase, in seconds.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PhaseMean {
    pub phase: String,
    pub seconds: f64,
}

#[derive(Clone, Copy, Debug)]
struct CompositeDefinition {
    key: &'static str,
    label: &'static str,
    phases: &'static [&'static str],
    /// Also expressed as a share of this phase.
    parent: Option<&'static str>,
    /// Reported only when larger than this phase.
    exceeds: Option<&'static str>,
}

const fn composite(
    key: &'static str,
    label: &'static str,
    phases: &'static [&'static str],
) -> CompositeDefinition {
    CompositeDefinition {
        key,
        label,
        phases,
        parent: None,
        exceeds: None,
    }
}

pub const WAITING_FOR_CORE: &str = "waiting_for_core";
pub const SERVICE_LOCK_QUEUE: &str = "service_lock_queue";
pub const PRE_TRANSFORM_VALIDATION: &str = "pre_transform_validation";
pub const RUNNING_SERVICES: &str = "running_services";
pub const VALIDATION: &str = "validation";
pub const TRANSACTION_LOCK_QUEUE: &str = "transaction_lock_queue";
pub const HOLDING_TRANSACTION_LOCK: &str = "holding_transaction_lock";
pub const DEVICE_INTERACTION: &str = "device_interaction";
pub const PUSHING_CONFIGURATION: &str = "pushing_configuration";

const COMPOSITES: [CompositeDefinition; 9] = [
    composite(
        WAITING_FOR_CORE,
        "Queued waiting for an available core",
        &[phases::WAITING_TO_APPLY],
    ),
    composite(
        SERVICE_LOCK_QUEUE,
        "Queued taking the service lock",
        &[phases::TAKING_SERVICE_WRITE_LOCK],
    ),
    composite(
        PRE_TRANSFORM_VALIDATION,
        "Pre-transform validation",
        &[phases::RUN_PRE_TRANSFORM_VALIDATION],
    ),
    composite(
        RUNNING_SERVICES,
        "Running services",
        &[phases::RUN_SERVICE, phases::EVALUATE_DELAYED_WHEN],
    ),
    composite(
        VALIDATION,
        "Validation",
        &[phases::RUN_VALIDATION, phases::RUN_DEPENDENCY_VALIDATION],
    ),
    composite(
        TRANSACTION_LOCK_QUEUE,
        "Queued taking the transaction lock",
        &[phases::TAKING_TRANSACTION_LOCK],
    ),
    composite(
        HOLDING_TRANSACTION_LOCK,
        "Holding transaction lock",
        &[phases::HOLDING_TRANSACTION_LOCK],
    ),
    CompositeDefinition {
        parent: Some(phases::HOLDING_TRANSACTION_LOCK),
        ..composite(
            DEVICE_INTERACTION,
            "Device interaction",
            &[phases::PREPARE, phases::COMMIT],
        )
    },
    CompositeDefinition {
        exceeds: Some(phases::HOLDING_TRANSACTION_LOCK),
        ..composite(
            PUSHING_CONFIGURATION,
            "Pushing the configuration",
            &[phases::PUSH_CONFIGURATION],
        )
    },
];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompositeMetric {
    pub key: String,
    pub label: String,
    pub seconds: f64,
    pub percent_of_total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_of_parent: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AggregateReport {
    /// Distinct transactions the means were taken over.
    pub transactions: usize,
    pub phase_means: Vec<PhaseMean>,
    pub composites: Vec<CompositeMetric>,
    /// Mean of the root phase, the reference for every percentage.
    pub total_seconds: f64,
    pub succeeded: usize,
    pub failed: usize,
}

impl AggregateReport {
    /// Mean for `phase`, zero when it was never observed.
    pub fn mean(&self, phase: &str) -> f64 {
        self.phase_means
            .iter()
            .find(|mean| mean.phase == phase)
            .map_or(0.0, |mean| mean.seconds)
    }

    pub fn composite(&self, key: &str) -> Option<&CompositeMetric> {
        self.composites.iter().find(|metric| metric.key == key)
    }

    pub fn percent_of_total(&self, seconds: f64) -> f64 {
        percent_of(seconds, self.total_seconds)
    }

    pub fn with_outcome_counts(mut self, succeeded: usize, failed: usize) -> Self {
        self.succeeded = succeeded;
        self.failed = failed;
        self
    }
}

/// Share of `part` in `whole`; zero when `whole` is not positive.
pub fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

pub struct StatsAggregator<'a> {
    vocabulary: &'a PhaseVocabulary,
}

impl<'a> StatsAggregator<'a> {
    pub fn new(vocabulary: &'a PhaseVocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn aggregate(&self, records: &CorrelatedPhases) -> AggregateReport {
        let transactions = records.len();
        let divisor = transactions.max(1) as f64;

        let phase_means: Vec<PhaseMean> = self
            .vocabulary
            .iter()
            .map(|phase| {
                let total: f64 = records
                    .values()
                    .filter_map(|record| record.get(phase))
                    .sum();
                PhaseMean {
                    phase: phase.to_string(),
                    seconds: total / divisor,
                }
            })
            .collect();

        let mut report = AggregateReport {
            transactions,
            phase_means,
            ..AggregateReport::default()
        };
        report.total_seconds = self
            .vocabulary
            .root()
            .map_or(0.0, |root| report.mean(root));
        report.composites = composites(&report);
        report
    }
}

fn composites(report: &AggregateReport) -> Vec<CompositeMetric> {
    COMPOSITES
        .iter()
        .filter_map(|definition| {
            let seconds: f64 = definition
                .phases
                .iter()
                .map(|phase| report.mean(phase))
                .sum();

            if let Some(threshold) = definition.exceeds {
                if seconds <= report.mean(threshold) {
                    return None;
                }
            }

            Some(CompositeMetric {
                key: definition.key.to_string(),
                label: definition.label.to_string(),
                seconds,
                percent_of_total: report.percent_of_total(seconds),
                parent_phase: definition.parent.map(str::to_string),
                percent_of_parent: definition
                    .parent
                    .map(|parent| percent_of(seconds, report.mean(parent))),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{percent_of, StatsAggregator, DEVICE_INTERACTION, PUSHING_CONFIGURATION, VALIDATION};
    use crate::trace::phases::{self, PhaseVocabulary};
    use crate::trace::{CorrelatedPhases, PhaseRecord};

    fn records<const N: usize>(entries: [(&str, PhaseRecord); N]) -> CorrelatedPhases {
        entries
            .into_iter()
            .map(|(key, record)| (key.to_string(), record))
            .collect()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn single_record_means_equal_its_durations() {
        let vocabulary = PhaseVocabulary::new(["A", "B"]);
        let report = StatsAggregator::new(&vocabulary).aggregate(&records([(
            "t1",
            PhaseRecord::from_iter([("A", 2.0), ("B", 4.0)]),
        )]));

        assert_close(report.mean("A"), 2.0);
        assert_close(report.mean("B"), 4.0);
    }

    #[test]
    fn means_divide_by_transaction_count() {
        let vocabulary = PhaseVocabulary::new(["A"]);
        let report = StatsAggregator::new(&vocabulary).aggregate(&records([
            ("t1", PhaseRecord::from_iter([("A", 2.0)])),
            ("t2", PhaseRecord::from_iter([("A", 4.0)])),
        ]));

        assert_eq!(report.transactions, 2);
        assert_close(report.mean("A"), 3.0);
    }

    #[test]
    fn absent_phase_is_zero() {
        let vocabulary = PhaseVocabulary::new(["A", "B"]);
        let report = StatsAggregator::new(&vocabulary)
            .aggregate(&records([("t1", PhaseRecord::from_iter([("A", 1.0)]))]));

        assert_close(report.mean("B"), 0.0);
    }

    #[test]
    fn no_transactions_yields_zeroes_without_dividing_by_zero() {
        let vocabulary = PhaseVocabulary::default();
        let report = StatsAggregator::new(&vocabulary).aggregate(&CorrelatedPhases::new());

        assert_eq!(report.transactions, 0);
        assert_close(report.total_seconds, 0.0);
        assert!(report
            .composites
            .iter()
            .all(|metric| metric.seconds == 0.0 && metric.percent_of_total == 0.0));
    }

    #[test]
    fn composites_sum_phase_means() {
        let vocabulary = PhaseVocabulary::default();
        let report = StatsAggregator::new(&vocabulary).aggregate(&records([(
            "t1",
            PhaseRecord::from_iter([
                (phases::RESTCONF_EDIT, 2.0),
                (phases::RUN_VALIDATION, 0.25),
                (phases::RUN_DEPENDENCY_VALIDATION, 0.25),
                (phases::HOLDING_TRANSACTION_LOCK, 1.0),
                (phases::PREPARE, 0.3),
                (phases::COMMIT, 0.2),
            ]),
        )]));

        let validation = report.composite(VALIDATION).expect("validation");
        assert_close(validation.seconds, 0.5);
        assert_close(validation.percent_of_total, 25.0);

        let devices = report.composite(DEVICE_INTERACTION).expect("devices");
        assert_close(devices.seconds, 0.5);
        assert_close(devices.percent_of_parent.unwrap_or_default(), 50.0);
    }

    #[test]
    fn pushing_configuration_only_reported_above_lock_hold_time() {
        let vocabulary = PhaseVocabulary::default();
        let aggregator = StatsAggregator::new(&vocabulary);
        let below = aggregator.aggregate(&records([(
            "t1",
            PhaseRecord::from_iter([
                (phases::HOLDING_TRANSACTION_LOCK, 1.0),
                (phases::PUSH_CONFIGURATION, 0.5),
            ]),
        )]));
        let above = aggregator.aggregate(&records([(
            "t1",
            PhaseRecord::from_iter([
                (phases::HOLDING_TRANSACTION_LOCK, 1.0),
                (phases::PUSH_CONFIGURATION, 3.0),
            ]),
        )]));

        assert!(below.composite(PUSHING_CONFIGURATION).is_none());
        assert!(above.composite(PUSHING_CONFIGURATION).is_some());
    }

    #[test]
    fn percent_of_guards_non_positive_totals() {
        assert_close(percent_of(1.0, 0.0), 0.0);
        assert_close(percent_of(1.0, 4.0), 25.0);
    }
}
