// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing, recording, and JSON snapshots for trellis diagnostics.
//!
//! This crate provides [`TraceSink`](trellis_core::trace::TraceSink)
//! implementations for development and tests, plus a state dump:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: in-memory event log with
//!   [`replay`](recorder::RecorderSink::replay) into another sink.
//! - [`snapshot::export`]: every cached cell state as JSON.

pub mod pretty;
pub mod recorder;
pub mod snapshot;
