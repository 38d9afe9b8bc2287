// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style keys and values understood by the view.
//!
//! Any other key is carried through the resolved style untouched for
//! renderers to interpret.

/// Name of the stylesheet entry merged under every vertex and group style.
pub const DEFAULT_VERTEX_STYLE: &str = "defaultVertex";
/// Name of the stylesheet entry merged under every edge style.
pub const DEFAULT_EDGE_STYLE: &str = "defaultEdge";
/// Inline value that removes a key inherited from a named or default style.
pub const NONE: &str = "none";

/// Shape name. `swimlane` gives the cell a content offset for its children.
pub const SHAPE: &str = "shape";
/// The `shape` value for containers with a title bar.
pub const SHAPE_SWIMLANE: &str = "swimlane";
/// Size of a swimlane's title bar, in unscaled units.
pub const START_SIZE: &str = "startSize";
/// Default for [`START_SIZE`].
pub const DEFAULT_START_SIZE: f64 = 40.0;
/// Whether text and title bars run horizontally.
pub const HORIZONTAL: &str = "horizontal";

/// Perimeter used to project floating edge ends: `rectangle`, `ellipse`, or
/// `none` (connect to the center).
pub const PERIMETER: &str = "perimeter";
/// Extra distance between a perimeter and the connected edge end.
pub const PERIMETER_SPACING: &str = "perimeterSpacing";
/// Fixed source connection point, as a fraction of the terminal's width.
pub const EXIT_X: &str = "exitX";
/// Fixed source connection point, as a fraction of the terminal's height.
pub const EXIT_Y: &str = "exitY";
/// Fixed target connection point, as a fraction of the terminal's width.
pub const ENTRY_X: &str = "entryX";
/// Fixed target connection point, as a fraction of the terminal's height.
pub const ENTRY_Y: &str = "entryY";

/// Horizontal label placement relative to the cell: `left`, `center`, `right`.
pub const LABEL_POSITION: &str = "labelPosition";
/// Vertical label placement relative to the cell: `top`, `middle`, `bottom`.
pub const VERTICAL_LABEL_POSITION: &str = "verticalLabelPosition";
/// Inset applied on every side of a vertex label box.
pub const SPACING: &str = "spacing";
/// Edge label box width in unscaled units.
pub const LABEL_WIDTH: &str = "labelWidth";
/// Edge label box height in unscaled units.
pub const LABEL_HEIGHT: &str = "labelHeight";

/// Rotation in degrees about the center of the cell.
pub const ROTATION: &str = "rotation";
/// Stroke width in unscaled units. Half of it overflows the bounds.
pub const STROKE_WIDTH: &str = "strokeWidth";
/// Default for [`STROKE_WIDTH`].
pub const DEFAULT_STROKE_WIDTH: f64 = 1.0;
/// Whether the shape casts a shadow.
pub const SHADOW: &str = "shadow";
/// Horizontal shadow displacement in unscaled units.
pub const SHADOW_OFFSET_X: &str = "shadowOffsetX";
/// Vertical shadow displacement in unscaled units.
pub const SHADOW_OFFSET_Y: &str = "shadowOffsetY";
/// Default for [`SHADOW_OFFSET_X`].
pub const DEFAULT_SHADOW_OFFSET_X: f64 = 2.0;
/// Default for [`SHADOW_OFFSET_Y`].
pub const DEFAULT_SHADOW_OFFSET_Y: f64 = 3.0;
