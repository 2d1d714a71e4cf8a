// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Direct-terminal progress reporting, separate from `tracing` output.
//!
//! Mirrors the teacher's `ProgressIndicatorService`: atomic counters for
//! lock-free updates, a mutex held only while writing to the terminal, and
//! in-place `\r` updates rather than a scrolling log or a progress-bar
//! crate the teacher doesn't depend on.

use pipeline_domain::repositories::{ProgressHandle, ProgressReporter};
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Reports overall run progress (how many of the configured nodes have
/// finished) directly to the terminal.
pub struct TerminalProgressReporter {
    total_nodes: AtomicUsize,
    completed_nodes: AtomicUsize,
    terminal: Arc<Mutex<()>>,
}

impl TerminalProgressReporter {
    pub fn new() -> Self {
        TerminalProgressReporter {
            total_nodes: AtomicUsize::new(0),
            completed_nodes: AtomicUsize::new(0),
            terminal: Arc::new(Mutex::new(())),
        }
    }

    fn redraw(&self, current_node: &str) {
        let _lock = self.terminal.lock().unwrap_or_else(|e| e.into_inner());
        let total = self.total_nodes.load(Ordering::Relaxed);
        let completed = self.completed_nodes.load(Ordering::Relaxed);
        print!("\r{:>4}/{:<4} running {}", completed, total, current_node);
        let _ = io::stdout().flush();
    }
}

impl Default for TerminalProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for TerminalProgressReporter {
    fn set_node_count(&self, total: usize) {
        self.total_nodes.store(total, Ordering::Relaxed);
    }

    fn start_node(&self, node_name: &str) -> Box<dyn ProgressHandle> {
        self.redraw(node_name);
        Box::new(NodeProgressHandle {
            node_name: node_name.to_string(),
            advanced: AtomicU64::new(0),
            total: AtomicU64::new(0),
            terminal: Arc::clone(&self.terminal),
        })
    }

    fn finish_node(&self, node_name: &str) {
        self.completed_nodes.fetch_add(1, Ordering::Relaxed);
        self.redraw(node_name);
        if self.completed_nodes.load(Ordering::Relaxed) == self.total_nodes.load(Ordering::Relaxed) {
            let _lock = self.terminal.lock().unwrap_or_else(|e| e.into_inner());
            println!();
        }
    }
}

/// Per-node progress handle, for stages that want to report finer-grained
/// internal progress (e.g. rows processed) than "node started/finished."
struct NodeProgressHandle {
    node_name: String,
    advanced: AtomicU64,
    total: AtomicU64,
    terminal: Arc<Mutex<()>>,
}

impl ProgressHandle for NodeProgressHandle {
    fn advance(&self, delta: u64) {
        let advanced = self.advanced.fetch_add(delta, Ordering::Relaxed) + delta;
        let total = self.total.load(Ordering::Relaxed);
        let _lock = self.terminal.lock().unwrap_or_else(|e| e.into_inner());
        if total > 0 {
            print!("\r  {} {}/{}", self.node_name, advanced, total);
        } else {
            print!("\r  {} {}", self.node_name, advanced);
        }
        let _ = io::stdout().flush();
    }

    fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
    }
}
