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

//! Shared field values and value-format helpers.

use std::time::Duration;

pub const NONE: &str = "none";
pub const REASON_IDLE_TIMEOUT: &str = "idle_timeout";

pub fn format_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Keeps the trailing `max_chars` characters, which is the distinguishing
/// part of long hex trace identifiers.
pub fn short_id(id: &str, max_chars: usize) -> &str {
    let count = id.chars().count();
    if count <= max_chars {
        return id;
    }
    let skip = count - max_chars;
    let (offset, _) = id
        .char_indices()
        .nth(skip)
        .unwrap_or((0, ' '));
    &id[offset..]
}

pub fn or_none(value: &str) -> &str {
    if value.is_empty() {
        NONE
    } else {
        value
    }
}
