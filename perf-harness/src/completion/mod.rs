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

//! Asynchronous completion tracking over the store's notification stream.

pub mod frames;
pub mod watcher;

pub use frames::{
    decode_completion, CompletionEvent, CompletionStatus, FrameDecoder, StreamDecodeError,
};
pub use watcher::{CompletionCounts, CompletionWatcher, WatchExit};
