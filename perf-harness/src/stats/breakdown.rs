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

use super::aggregator::AggregateReport;
use crate::trace::phases::*;
use serde::Serialize;

/// Static nesting of the phase vocabulary.
#[derive(Debug)]
pub struct PhaseTree {
    pub phase: &'static str,
    pub children: &'static [PhaseTree],
}

const fn leaf(phase: &'static str) -> PhaseTree {
    PhaseTree {
        phase,
        children: &[],
    }
}

pub const PHASE_TREE: PhaseTree = PhaseTree {
    phase: RESTCONF_EDIT,
    children: &[PhaseTree {
        phase: APPLYING_TRANSACTION,
        children: &[
            leaf(WAITING_TO_APPLY),
            leaf(CREATING_ROLLBACK_CHECKPOINT),
            leaf(CREATING_ROLLBACK_FILE),
            leaf(CREATING_PRE_TRANSFORM_CHECKPOINT),
            leaf(RUN_PRE_TRANSFORM_VALIDATION),
            leaf(CREATING_TRANSFORM_CHECKPOINT),
            PhaseTree {
                phase: RUN_TRANSFORMS_AND_HOOKS,
                children: &[
                    leaf(TAKING_SERVICE_WRITE_LOCK),
                    PhaseTree {
                        phase: HOLDING_SERVICE_WRITE_LOCK,
                        children: &[leaf(RUN_SERVICE), leaf(EVALUATE_DELAYED_WHEN)],
                    },
                ],
            },
            leaf(CREATING_VALIDATION_CHECKPOINT),
            leaf(MARK_INACTIVE),
            leaf(PRE_VALIDATE),
            leaf(RUN_VALIDATION),
            leaf(RUN_DEPENDENCY_VALIDATION),
            leaf(CHECK_CONFIGURATION_POLICIES),
            leaf(CHECK_READ_WRITE_CONFLICTS),
            leaf(TAKING_TRANSACTION_LOCK),
            PhaseTree {
                phase: HOLDING_TRANSACTION_LOCK,
                children: &[
                    leaf(APPLYING_SERVICE_META_DATA),
                    PhaseTree {
                        phase: WRITE_START,
                        children: &[
                            leaf(MATCH_SUBSCRIBERS),
                            leaf(CREATE_PRE_COMMIT_RUNNING),
                            leaf(WRITE_CHANGESET),
                            leaf(CHECK_DATA_KICKERS),
                        ],
                    },
                    PhaseTree {
                        phase: PREPARE,
                        children: &[leaf(PUSH_CONFIGURATION)],
                    },
                    PhaseTree {
                        phase: COMMIT,
                        children: &[leaf(SWITCH_TO_NEW_RUNNING)],
                    },
                ],
            },
        ],
    }],
};

/// One phase of the nested breakdown.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BreakdownNode {
    pub phase: String,
    pub seconds: f64,
    pub percent_of_total: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BreakdownNode>,
}

impl BreakdownNode {
    /// Builds the breakdown for `tree` from the report's phase means.
    pub fn from_report(report: &AggregateReport, tree: &PhaseTree) -> Self {
        let seconds = report.mean(tree.phase);
        Self {
            phase: tree.phase.to_string(),
            seconds,
            percent_of_total: report.percent_of_total(seconds),
            children: tree
                .children
                .iter()
                .map(|child| Self::from_report(report, child))
                .collect(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Depth-first walk paired with each node's depth.
    pub fn walk(&self) -> Vec<(usize, &BreakdownNode)> {
        let mut nodes = Vec::new();
        self.collect(0, &mut nodes);
        nodes
    }

    fn collect<'a>(&'a self, depth: usize, nodes: &mut Vec<(usize, &'a BreakdownNode)>) {
        nodes.push((depth, self));
        for child in &self.children {
            child.collect(depth + 1, nodes);
        }
    }
}
