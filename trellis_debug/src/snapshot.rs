// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON dump of the view-state cache.
//!
//! [`export`] writes one object per cached [`CellState`] so a broken layout
//! can be diffed against a known-good one.

use std::io::{self, Write};

use kurbo::{Point, Rect};
use serde_json::{Value, json};

use trellis_core::model::{CellId, GraphModel};
use trellis_core::view::{CellState, GraphView};

/// Writes the view's transform, graph bounds, and every cached state as
/// pretty-printed JSON.
///
/// States are listed in slot order. Cells are identified by slot index.
pub fn export(model: &GraphModel, view: &GraphView, writer: &mut dyn Write) -> io::Result<()> {
    let states: Vec<Value> = view
        .states()
        .filter(|s| model.is_alive(s.cell()))
        .map(|s| state_json(model, s))
        .collect();
    let doc = json!({
        "scale": view.scale(),
        "translate": [view.translate().x, view.translate().y],
        "graph_bounds": view.graph_bounds().map(rect_json),
        "states": states,
    });
    serde_json::to_writer_pretty(&mut *writer, &doc)?;
    writeln!(writer)
}

fn state_json(model: &GraphModel, s: &CellState) -> Value {
    json!({
        "cell": s.cell().index(),
        "kind": s.kind().as_str(),
        "parent": model.parent(s.cell()).map(CellId::index),
        "invalid": s.is_invalid(),
        "bounds": rect_json(s.bounds()),
        "bounding_box": s.bounding_box().map(rect_json),
        "label_bounds": s.label_bounds().map(rect_json),
        "points": s.points().iter().copied().map(point_json).collect::<Vec<_>>(),
        "length": s.length(),
        "visible_source": s.visible_source().map(CellId::index),
        "visible_target": s.visible_target().map(CellId::index),
        "style": s.style(),
    })
}

fn rect_json(r: Rect) -> Value {
    json!([r.x0, r.y0, r.x1, r.y1])
}

fn point_json(p: Point) -> Value {
    json!([p.x, p.y])
}

#[cfg(test)]
mod tests {
    use trellis_core::geometry::Geometry;
    use trellis_core::graph::Graph;

    use super::*;

    #[test]
    fn exports_every_state() {
        let mut graph = Graph::new();
        let a = graph.insert_vertex(None, Geometry::new(0.0, 0.0, 10.0, 10.0), "fillColor=red");
        let b = graph.insert_vertex(None, Geometry::new(100.0, 0.0, 10.0, 10.0), "");
        graph.insert_edge(None, Some(a), Some(b), "");

        let mut out = Vec::new();
        export(graph.model(), graph.view(), &mut out).unwrap();
        let doc: Value = serde_json::from_slice(&out).unwrap();

        let states = doc["states"].as_array().unwrap();
        // Root, layer, two vertices, one edge.
        assert_eq!(states.len(), 5);
        let first = &states[2];
        assert_eq!(first["kind"], "vertex");
        assert_eq!(first["bounds"], json!([0.0, 0.0, 10.0, 10.0]));
        assert_eq!(first["style"]["fillColor"], "red");
        let edge = &states[4];
        assert_eq!(edge["visible_source"], a.index());
        assert_eq!(edge["points"].as_array().unwrap().len(), 2);
        assert_eq!(doc["scale"], 1.0);
        assert!(doc["states"][0]["bounding_box"].is_null(), "root does not render");
    }
}
