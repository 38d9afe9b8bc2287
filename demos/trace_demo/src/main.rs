// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Walks a small diagram through insert, move, collapse, and bulk-edit
//! transactions, printing every trace event and the accumulated damage.
//!
//! Trace lines go to stdout through a
//! [`PrettyPrintSink`](trellis_debug::pretty::PrettyPrintSink); `tracing`
//! diagnostics go to stderr, filtered by `RUST_LOG` (try
//! `RUST_LOG=trellis_core=debug`). The final state cache is written to
//! `trellis-snapshot.json`.

use std::cell::RefCell;
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use tracing_subscriber::EnvFilter;

use trellis_core::config::ViewConfig;
use trellis_core::geometry::Geometry;
use trellis_core::graph::{Graph, GraphChanged};
use trellis_core::style::Stylesheet;
use trellis_core::trace::{
    DirtyRegionEvent, OverflowEvent, StateEvent, TraceSink, TransactionEvent, ValidateEvent,
};
use trellis_debug::pretty::PrettyPrintSink;
use trellis_debug::recorder::RecorderSink;
use trellis_render::{Damage, PaintPlan};

/// Bulk edits issued in the last step; above the configured threshold.
const BULK_EDITS: usize = 400;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = ViewConfig {
        change_threshold: 100,
        ..ViewConfig::default()
    };
    let mut graph = Graph::with_config(config, Stylesheet::new());

    // -- sinks -------------------------------------------------------------
    let pretty = Rc::new(RefCell::new(PrettyPrintSink::new(Box::new(std::io::stdout()))));
    let recorder = Rc::new(RefCell::new(RecorderSink::new()));
    graph.set_trace_sink(Box::new(Tee(Rc::clone(&pretty), Rc::clone(&recorder))));

    let damage = Rc::new(RefCell::new(Damage::None));
    let frame_damage = Rc::clone(&damage);
    graph.add_listener(Box::new(move |e: &GraphChanged| {
        frame_damage.borrow_mut().merge(Damage::from_event(e));
    }));

    // -- A: two vertices and an edge ----------------------------------------
    println!("== insert");
    graph.begin_update();
    let group = graph.insert_group(None, Geometry::new(0.0, 0.0, 160.0, 100.0), "");
    let v1 = graph.insert_vertex(Some(group), Geometry::new(20.0, 20.0, 80.0, 30.0), "");
    let v2 = graph.insert_vertex(None, Geometry::new(240.0, 150.0, 80.0, 30.0), "");
    let edge = graph.insert_edge(None, Some(v1), Some(v2), "");
    graph.end_update();
    if let Some(state) = graph.state(edge) {
        println!("   edge points: {:?}", state.points());
    }
    flush_frame(&graph, &damage);

    // -- B: move V1 -------------------------------------------------------
    println!("== move");
    graph.translate_cell(v1, 50.0, 0.0);
    flush_frame(&graph, &damage);

    // -- C: collapse the group --------------------------------------------
    println!("== collapse");
    pretty.borrow_mut().set_states(true);
    graph.fold(group, true);
    pretty.borrow_mut().set_states(false);
    println!("   V1 cached: {}", graph.state(v1).is_some());
    flush_frame(&graph, &damage);

    // -- D: bulk edits over the threshold ---------------------------------
    println!("== bulk");
    graph.begin_update();
    for i in 0..BULK_EDITS {
        let dx = if i % 2 == 0 { 1.0 } else { -1.0 };
        graph.translate_cell(v2, dx, 0.0);
    }
    graph.end_update();
    flush_frame(&graph, &damage);

    let overflows = recorder
        .borrow()
        .dirty_regions()
        .filter(|d| d.overflowed)
        .count();
    println!("recorded {} events, {overflows} overflow(s)", recorder.borrow().events().len());

    // -- snapshot ----------------------------------------------------------
    let path = "trellis-snapshot.json";
    let file = File::create(path).expect("failed to create snapshot file");
    let mut writer = BufWriter::new(file);
    trellis_debug::snapshot::export(graph.model(), graph.view(), &mut writer)
        .expect("failed to write snapshot");
    println!("Wrote {path} ({} states)", graph.view().state_count());
}

/// Prints what a renderer would repaint and resets the damage.
fn flush_frame(graph: &Graph, damage: &RefCell<Damage>) {
    let pending = damage.replace(Damage::None);
    match pending.clip() {
        Some(clip) => {
            let plan = PaintPlan::build(graph.model(), graph.view(), clip);
            println!("   repaint {pending:?}: {} item(s)", plan.len());
        }
        None => println!("   nothing to repaint"),
    }
}

/// Forwards every event to two sinks.
struct Tee<A, B>(A, B);

impl<A: TraceSink, B: TraceSink> TraceSink for Tee<A, B> {
    fn on_transaction(&mut self, e: &TransactionEvent) {
        self.0.on_transaction(e);
        self.1.on_transaction(e);
    }

    fn on_overflow(&mut self, e: &OverflowEvent) {
        self.0.on_overflow(e);
        self.1.on_overflow(e);
    }

    fn on_validate(&mut self, e: &ValidateEvent) {
        self.0.on_validate(e);
        self.1.on_validate(e);
    }

    fn on_dirty_region(&mut self, e: &DirtyRegionEvent) {
        self.0.on_dirty_region(e);
        self.1.on_dirty_region(e);
    }

    fn on_state(&mut self, e: &StateEvent) {
        self.0.on_state(e);
        self.1.on_state(e);
    }
}
