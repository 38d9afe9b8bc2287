// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end behavior of the change-propagation engine.

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::{Point, Rect, Vec2};
use trellis_core::config::ViewConfig;
use trellis_core::geometry::Geometry;
use trellis_core::graph::{Graph, GraphChanged};
use trellis_core::model::{CellId, GraphModel};
use trellis_core::style::Stylesheet;
use trellis_core::view::{CellState, GraphView};

const EPS: f64 = 1e-9;

fn covers(outer: Rect, inner: Rect) -> bool {
    outer.x0 <= inner.x0 + EPS
        && outer.y0 <= inner.y0 + EPS
        && outer.x1 + EPS >= inner.x1
        && outer.y1 + EPS >= inner.y1
}

fn covers_point(outer: Rect, p: Point) -> bool {
    covers(outer, Rect::from_origin_size(p, (0.0, 0.0)))
}

/// Whether `p` lies on the outline of `r`.
fn on_outline(r: Rect, p: Point) -> bool {
    let inside = covers_point(r, p);
    let near_side = (p.x - r.x0).abs() < 1e-6
        || (p.x - r.x1).abs() < 1e-6
        || (p.y - r.y0).abs() < 1e-6
        || (p.y - r.y1).abs() < 1e-6;
    inside && near_side
}

fn listen(graph: &mut Graph) -> Rc<RefCell<Vec<GraphChanged>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    graph.add_listener(Box::new(move |e: &GraphChanged| sink.borrow_mut().push(*e)));
    events
}

fn last(events: &Rc<RefCell<Vec<GraphChanged>>>) -> GraphChanged {
    *events.borrow().last().expect("an event was delivered")
}

fn bbox(graph: &Graph, cell: CellId) -> Rect {
    graph
        .state(cell)
        .and_then(CellState::bounding_box)
        .expect("cell is rendered")
}

/// V1, V2, and an edge between them, all in the default layer.
fn two_vertices_and_edge(graph: &mut Graph) -> (CellId, CellId, CellId) {
    graph.begin_update();
    let v1 = graph.insert_vertex(None, Geometry::new(20.0, 20.0, 80.0, 30.0), "");
    let v2 = graph.insert_vertex(None, Geometry::new(240.0, 150.0, 80.0, 30.0), "");
    let e = graph.insert_edge(None, Some(v1), Some(v2), "");
    graph.end_update();
    (v1, v2, e)
}

// -- Scenarios --

#[test]
fn scenario_a_edge_ends_on_terminal_perimeters() {
    let mut graph = Graph::new();
    let (v1, v2, e) = two_vertices_and_edge(&mut graph);
    graph.validate(None);

    let points = graph.state(e).expect("edge has a state").points();
    assert_eq!(points.len(), 2);
    let b1 = graph.state(v1).unwrap().bounds();
    let b2 = graph.state(v2).unwrap().bounds();
    assert_eq!(b1, Rect::new(20.0, 20.0, 100.0, 50.0));
    assert!(on_outline(b1, points[0]), "{:?} not on {b1:?}", points[0]);
    assert!(on_outline(b2, points[1]), "{:?} not on {b2:?}", points[1]);
}

#[test]
fn scenario_b_move_reports_old_and_new_footprints() {
    let mut graph = Graph::new();
    let (v1, _, e) = two_vertices_and_edge(&mut graph);
    let events = listen(&mut graph);
    let old_v1 = bbox(&graph, v1);
    let old_e = bbox(&graph, e);

    graph.begin_update();
    graph.translate_cell(v1, 50.0, 0.0);
    graph.end_update();

    let dirty = last(&events).dirty.expect("moving a vertex dirties something");
    let new_v1 = bbox(&graph, v1);
    assert_eq!(new_v1, old_v1 + Vec2::new(50.0, 0.0));
    assert!(covers(dirty, old_v1), "{dirty:?} misses old V1 {old_v1:?}");
    assert!(covers(dirty, new_v1), "{dirty:?} misses new V1 {new_v1:?}");
    assert!(covers(dirty, old_e), "{dirty:?} misses old edge {old_e:?}");
    for &p in graph.state(e).unwrap().points() {
        assert!(covers_point(dirty, p), "{dirty:?} misses edge point {p:?}");
    }
    assert!(!graph.state(e).unwrap().is_invalid());
}

#[test]
fn scenario_c_collapse_purges_children() {
    let mut graph = Graph::new();
    let group = graph.insert_group(None, Geometry::new(10.0, 10.0, 300.0, 200.0), "");
    let v1 = graph.insert_vertex(Some(group), Geometry::new(20.0, 20.0, 80.0, 30.0), "");
    let events = listen(&mut graph);
    let before = bbox(&graph, group);
    assert!(graph.state(v1).is_some());

    graph.fold(group, true);

    assert!(graph.state(v1).is_none(), "collapsed children are purged");
    assert_eq!(last(&events).dirty, Some(before));
    assert_eq!(last(&events).change_count, 1);
}

#[test]
fn collapsed_group_takes_over_hidden_edge_ends() {
    let mut graph = Graph::new();
    let group = graph.insert_group(None, Geometry::new(10.0, 10.0, 300.0, 200.0), "");
    let v1 = graph.insert_vertex(Some(group), Geometry::new(20.0, 20.0, 80.0, 30.0), "");
    let v2 = graph.insert_vertex(None, Geometry::new(500.0, 400.0, 80.0, 30.0), "");
    let e = graph.insert_edge(None, Some(v1), Some(v2), "");
    let events = listen(&mut graph);
    let old_e = bbox(&graph, e);

    graph.fold(group, true);

    let state = graph.state(e).unwrap();
    assert_eq!(state.visible_source(), Some(group));
    assert!(on_outline(graph.state(group).unwrap().bounds(), state.points()[0]));
    let dirty = last(&events).dirty.unwrap();
    assert!(covers(dirty, old_e));
    assert!(covers(dirty, bbox(&graph, e)));
}

#[test]
fn scenario_d_threshold_rebuilds_from_visible_cells() {
    let config = ViewConfig {
        change_threshold: 100,
        ..ViewConfig::default()
    };
    let mut graph = Graph::with_config(config, Stylesheet::new());
    graph.begin_update();
    let cells: Vec<CellId> = (0..10)
        .map(|i| {
            let x = f64::from(i) * 50.0;
            graph.insert_vertex(None, Geometry::new(x, 0.0, 40.0, 40.0), "")
        })
        .collect();
    graph.end_update();
    let bounds = graph.view().graph_bounds().unwrap();
    let events = listen(&mut graph);
    let derived_before = graph.view().derivation_count();

    // 500 records, every vertex ends where it started.
    graph.begin_update();
    for round in 0..50 {
        for &cell in &cells {
            let dx = if round % 2 == 0 { 5.0 } else { -5.0 };
            graph.translate_cell(cell, dx, 0.0);
        }
    }
    graph.end_update();

    let event = last(&events);
    assert_eq!(event.change_count, 500);
    assert!(event.overflowed);
    assert_eq!(event.dirty, Some(bounds));
    assert_eq!(graph.view().graph_bounds(), Some(bounds));
    let derived = graph.view().derivation_count() - derived_before;
    assert_eq!(derived, graph.view().state_count() as u64);
    assert!(derived < 500, "rebuild cost follows visible cells, not records");
}

#[test]
fn below_threshold_uses_per_record_tracking() {
    let mut graph = Graph::new();
    let (v1, _, _) = two_vertices_and_edge(&mut graph);
    let events = listen(&mut graph);
    graph.translate_cell(v1, 1.0, 1.0);
    assert!(!last(&events).overflowed);
}

// -- Properties --

#[test]
fn validation_is_idempotent() {
    let mut graph = Graph::new();
    let (v1, v2, e) = two_vertices_and_edge(&mut graph);
    let snapshot = |g: &Graph| -> Vec<(Rect, Option<Rect>, Vec<Point>)> {
        [v1, v2, e]
            .iter()
            .map(|&c| {
                let s = g.state(c).unwrap();
                (s.bounds(), s.bounding_box(), s.points().to_vec())
            })
            .collect()
    };
    let first = snapshot(&graph);
    let derived = graph.view().derivation_count();

    graph.validate(None);
    graph.validate(None);

    assert_eq!(graph.view().derivation_count(), derived);
    assert_eq!(snapshot(&graph), first);
}

#[test]
fn affected_states_are_invalid_before_validation() {
    let mut model = GraphModel::new();
    let sheet = Stylesheet::new();
    let mut view = GraphView::default();
    let layer = model.default_parent();
    let group = model.create_group(Geometry::new(0.0, 0.0, 200.0, 200.0), "");
    let child = model.create_vertex(Geometry::new(10.0, 10.0, 20.0, 20.0), "");
    let other = model.create_vertex(Geometry::new(300.0, 0.0, 20.0, 20.0), "");
    let edge = model.create_edge(Some(child), Some(other), "");
    model.begin_update();
    model.add_child(layer, group);
    model.add_child(group, child);
    model.add_child(layer, other);
    model.add_child(layer, edge);
    let edit = model.end_update().unwrap();
    view.model_changed(&model, &sheet, &edit);

    model.begin_update();
    model.set_geometry(group, Geometry::new(40.0, 0.0, 200.0, 200.0));
    let edit = model.end_update().unwrap();
    view.process_changes(&model, &edit.changes, true);

    for cell in [group, child, edge] {
        assert!(
            view.state(cell).is_none_or(CellState::is_invalid),
            "{cell:?} looks valid after its geometry changed"
        );
    }
    assert!(!view.state(other).unwrap().is_invalid());

    view.validate(&model, &sheet, None);
    view.process_changes(&model, &edit.changes, false);
    assert!(view.states().all(|s| !s.is_invalid()));
}

#[test]
fn dirty_region_round_trips_through_undo() {
    let mut graph = Graph::new();
    let (v1, _, e) = two_vertices_and_edge(&mut graph);
    let events = listen(&mut graph);
    let original = (bbox(&graph, v1), graph.state(e).unwrap().points().to_vec());

    graph.begin_update();
    graph.translate_cell(v1, 0.0, 70.0);
    let edit = graph.end_update().unwrap();
    let applied = last(&events).dirty;
    let moved = (bbox(&graph, v1), graph.state(e).unwrap().points().to_vec());

    graph.undo(&edit);
    assert_eq!(last(&events).dirty, applied, "revert dirties the same region");
    assert_eq!(
        (bbox(&graph, v1), graph.state(e).unwrap().points().to_vec()),
        original
    );

    graph.redo(&edit);
    assert_eq!(last(&events).dirty, applied);
    assert_eq!(
        (bbox(&graph, v1), graph.state(e).unwrap().points().to_vec()),
        moved
    );
}

#[test]
fn reparenting_under_a_descendant_is_rejected() {
    let mut model = GraphModel::new();
    let layer = model.default_parent();
    let a = model.create_group(Geometry::new(0.0, 0.0, 100.0, 100.0), "");
    let b = model.create_group(Geometry::new(0.0, 0.0, 50.0, 50.0), "");
    let c = model.create_vertex(Geometry::new(0.0, 0.0, 10.0, 10.0), "");
    model.begin_update();
    model.add_child(layer, a);
    model.add_child(a, b);
    model.add_child(b, c);
    let recorded = model.pending_changes().len();

    assert!(!model.add(c, a, 0));
    assert!(!model.add(b, a, 0));
    assert!(!model.add(a, a, 0));
    assert_eq!(model.pending_changes().len(), recorded);
    model.end_update();

    assert_eq!(model.parent(a), Some(layer));
    assert_eq!(model.parent(b), Some(a));
    assert_eq!(model.parent(c), Some(b));
}

#[test]
fn nested_coordinates_compose_with_scale() {
    let (dx, dy, s) = (30.0, 40.0, 2.0);
    let (x, y, w, h) = (5.0, 7.0, 20.0, 10.0);
    let mut graph = Graph::new();
    let grandparent = graph.insert_group(None, Geometry::new(0.0, 0.0, 400.0, 400.0), "");
    let parent = graph.insert_group(Some(grandparent), Geometry::new(dx, dy, 200.0, 200.0), "");
    let leaf = graph.insert_vertex(Some(parent), Geometry::new(x, y, w, h), "");
    let dirty = graph.set_scale(s).unwrap();

    let bounds = graph.state(leaf).unwrap().bounds();
    let expected = Rect::new((x + dx) * s, (y + dy) * s, (x + dx + w) * s, (y + dy + h) * s);
    assert!((bounds.x0 - expected.x0).abs() < EPS, "{bounds:?} != {expected:?}");
    assert!((bounds.y0 - expected.y0).abs() < EPS, "{bounds:?} != {expected:?}");
    assert!((bounds.width() - w * s).abs() < EPS);
    assert!((bounds.height() - h * s).abs() < EPS);
    assert!(covers(dirty, bbox(&graph, grandparent)));
}

#[test]
fn relative_child_follows_parent_size() {
    let mut graph = Graph::new();
    let parent = graph.insert_vertex(None, Geometry::new(100.0, 100.0, 200.0, 100.0), "");
    let port = graph.insert_vertex(
        Some(parent),
        Geometry::relative(1.0, 0.5, 10.0, 10.0).with_offset(Vec2::new(-5.0, -5.0)),
        "",
    );
    assert_eq!(
        graph.state(port).unwrap().bounds(),
        Rect::new(295.0, 145.0, 305.0, 155.0)
    );
}

#[test]
fn root_change_drops_cache_and_resets_transform() {
    let mut graph = Graph::new();
    two_vertices_and_edge(&mut graph);
    graph.set_scale(2.0);
    let old_bounds = graph.view().graph_bounds();
    let events = listen(&mut graph);

    let mut tx = graph.update();
    let root = tx.create_layer();
    assert!(tx.set_root(root));
    drop(tx);

    assert_eq!(last(&events).dirty, old_bounds);
    assert_eq!(graph.view().scale(), 1.0);
    assert_eq!(graph.view().state_count(), 1);
    assert!(graph.state(root).is_some());
}

#[test]
fn hidden_terminal_leaves_edge_end_unresolved() {
    let mut graph = Graph::new();
    let (_, v2, e) = two_vertices_and_edge(&mut graph);
    graph.update().set_visible(v2, false);

    assert!(graph.state(v2).is_none());
    let state = graph.state(e).unwrap();
    assert_eq!(state.visible_target(), None);
    assert!(!state.is_invalid());
}

#[test]
fn terminal_change_reports_old_and_new_edge() {
    let mut graph = Graph::new();
    let (_, _, e) = two_vertices_and_edge(&mut graph);
    let v3 = graph.insert_vertex(None, Geometry::new(400.0, 20.0, 80.0, 30.0), "");
    let events = listen(&mut graph);
    let old_e = bbox(&graph, e);

    graph.update().set_terminal(e, Some(v3), false);

    let dirty = last(&events).dirty.expect("reconnecting dirties something");
    let new_e = bbox(&graph, e);
    assert_ne!(old_e, new_e);
    assert!(covers(dirty, old_e), "{dirty:?} misses old edge {old_e:?}");
    assert!(covers(dirty, new_e), "{dirty:?} misses new edge {new_e:?}");
    assert_eq!(graph.state(e).unwrap().visible_target(), Some(v3));
}

#[test]
fn style_change_reports_old_and_new_box() {
    let mut graph = Graph::new();
    let (v1, _, _) = two_vertices_and_edge(&mut graph);
    let events = listen(&mut graph);
    let old_v1 = bbox(&graph, v1);

    graph.update().set_style(v1, "strokeWidth=9;shadow=1");

    let dirty = last(&events).dirty.expect("restyling dirties something");
    let new_v1 = bbox(&graph, v1);
    assert!(covers(new_v1, old_v1) && new_v1 != old_v1);
    assert!(covers(dirty, old_v1), "{dirty:?} misses old V1 {old_v1:?}");
    assert!(covers(dirty, new_v1), "{dirty:?} misses new V1 {new_v1:?}");
}

#[test]
fn visibility_change_reports_vanishing_and_appearing_boxes() {
    let mut graph = Graph::new();
    let (v1, _, e) = two_vertices_and_edge(&mut graph);
    let events = listen(&mut graph);
    let old_v1 = bbox(&graph, v1);
    let old_e = bbox(&graph, e);

    graph.update().set_visible(v1, false);

    let dirty = last(&events).dirty.expect("hiding dirties something");
    assert!(graph.state(v1).is_none());
    assert!(covers(dirty, old_v1), "{dirty:?} misses hidden V1 {old_v1:?}");
    assert!(covers(dirty, old_e), "{dirty:?} misses old edge {old_e:?}");

    let hidden_e = bbox(&graph, e);
    graph.update().set_visible(v1, true);

    let dirty = last(&events).dirty.expect("showing dirties something");
    let new_v1 = bbox(&graph, v1);
    let new_e = bbox(&graph, e);
    assert_eq!(new_v1, old_v1);
    assert!(covers(dirty, new_v1), "{dirty:?} misses shown V1 {new_v1:?}");
    assert!(covers(dirty, new_e), "{dirty:?} misses new edge {new_e:?}");
    assert!(covers(dirty, hidden_e), "{dirty:?} misses old edge {hidden_e:?}");
}

#[test]
#[should_panic(expected = "belongs to another model")]
fn foreign_handle_fails_fast() {
    let mut graph = Graph::new();
    let mut other = GraphModel::new();
    let foreign = other.create_vertex(Geometry::new(0.0, 0.0, 1.0, 1.0), "");
    graph.insert_vertex(Some(foreign), Geometry::new(0.0, 0.0, 1.0, 1.0), "");
}
