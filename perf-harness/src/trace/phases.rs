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

//! The closed set of progress-trace phases the harness reports on.

use std::collections::HashSet;

/// Root phase: one complete RESTCONF edit, start to finish.
pub const RESTCONF_EDIT: &str = "restconf edit";
pub const APPLYING_TRANSACTION: &str = "applying transaction";
pub const WAITING_TO_APPLY: &str = "waiting to apply";
pub const CREATING_ROLLBACK_CHECKPOINT: &str = "creating rollback checkpoint";
pub const CREATING_ROLLBACK_FILE: &str = "creating rollback file";
pub const CREATING_PRE_TRANSFORM_CHECKPOINT: &str = "creating pre-transform checkpoint";
pub const RUN_PRE_TRANSFORM_VALIDATION: &str = "run pre-transform validation";
pub const CREATING_TRANSFORM_CHECKPOINT: &str = "creating transform checkpoint";
pub const RUN_TRANSFORMS_AND_HOOKS: &str = "run transforms and transaction hooks";
pub const TAKING_SERVICE_WRITE_LOCK: &str = "taking service write lock";
pub const HOLDING_SERVICE_WRITE_LOCK: &str = "holding service write lock";
pub const RUN_SERVICE: &str = "run service";
pub const EVALUATE_DELAYED_WHEN: &str = "evaluate delayed when expressions";
pub const CREATING_VALIDATION_CHECKPOINT: &str = "creating validation checkpoint";
pub const MARK_INACTIVE: &str = "mark inactive";
pub const PRE_VALIDATE: &str = "pre validate";
pub const RUN_VALIDATION: &str = "run validation over the changeset";
pub const RUN_DEPENDENCY_VALIDATION: &str = "run dependency-triggered validation";
pub const CHECK_CONFIGURATION_POLICIES: &str = "check configuration policies";
pub const CHECK_READ_WRITE_CONFLICTS: &str = "check for read-write conflicts";
pub const TAKING_TRANSACTION_LOCK: &str = "taking transaction lock";
pub const HOLDING_TRANSACTION_LOCK: &str = "holding transaction lock";
pub const APPLYING_SERVICE_META_DATA: &str = "applying service meta-data";
pub const WRITE_START: &str = "write-start";
pub const MATCH_SUBSCRIBERS: &str = "match subscribers";
pub const CREATE_PRE_COMMIT_RUNNING: &str = "create pre commit running";
pub const WRITE_CHANGESET: &str = "write changeset";
pub const CHECK_DATA_KICKERS: &str = "check data kickers";
pub const PREPARE: &str = "prepare";
pub const PUSH_CONFIGURATION: &str = "push configuration";
pub const COMMIT: &str = "commit";
pub const SWITCH_TO_NEW_RUNNING: &str = "switch to new running";

pub const TRACE_PHASES: [&str; 32] = [
    RESTCONF_EDIT,
    APPLYING_TRANSACTION,
    WAITING_TO_APPLY,
    CREATING_ROLLBACK_CHECKPOINT,
    CREATING_ROLLBACK_FILE,
    CREATING_PRE_TRANSFORM_CHECKPOINT,
    RUN_PRE_TRANSFORM_VALIDATION,
    CREATING_TRANSFORM_CHECKPOINT,
    RUN_TRANSFORMS_AND_HOOKS,
    TAKING_SERVICE_WRITE_LOCK,
    HOLDING_SERVICE_WRITE_LOCK,
    RUN_SERVICE,
    EVALUATE_DELAYED_WHEN,
    CREATING_VALIDATION_CHECKPOINT,
    MARK_INACTIVE,
    PRE_VALIDATE,
    RUN_VALIDATION,
    RUN_DEPENDENCY_VALIDATION,
    CHECK_CONFIGURATION_POLICIES,
    CHECK_READ_WRITE_CONFLICTS,
    TAKING_TRANSACTION_LOCK,
    HOLDING_TRANSACTION_LOCK,
    APPLYING_SERVICE_META_DATA,
    WRITE_START,
    MATCH_SUBSCRIBERS,
    CREATE_PRE_COMMIT_RUNNING,
    WRITE_CHANGESET,
    CHECK_DATA_KICKERS,
    PREPARE,
    PUSH_CONFIGURATION,
    COMMIT,
    SWITCH_TO_NEW_RUNNING,
];

/// Ordered phase names recognised by correlation and aggregation.
///
/// The first phase is the root phase: a transaction counts as fully traced
/// once its root phase has been closed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseVocabulary {
    phases: Vec<String>,
    lookup: HashSet<String>,
}

impl PhaseVocabulary {
    pub fn new<I, S>(phases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered = Vec::new();
        let mut lookup = HashSet::new();
        for phase in phases {
            let phase = phase.into();
            if lookup.insert(phase.clone()) {
                ordered.push(phase);
            }
        }
        Self {
            phases: ordered,
            lookup,
        }
    }

    pub fn contains(&self, phase: &str) -> bool {
        self.lookup.contains(phase)
    }

    pub fn root(&self) -> Option<&str> {
        self.phases.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.phases.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

impl Default for PhaseVocabulary {
    fn default() -> Self {
        Self::new(TRACE_PHASES)
    }
}
