// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed state for the linkrelay affiliate relay.
//!
//! Two small stores share one line-file helper: the content deduplication
//! cache (what went where, and when) and the per-source cursor (the last
//! message already handled). Both re-read their file on every call and
//! rewrite it atomically, so several processes pointed at the same files
//! never observe a torn write.

pub mod cursor;
pub mod dedup;
pub mod record_file;

pub use cursor::CursorStore;
pub use dedup::DedupCache;
pub use record_file::RecordFile;
