//! Coordinate math shared by the editor and the render adapter.
//!
//! World (document) coordinates are what nodes store. Screen coordinates are
//! pointer positions relative to the canvas element. The viewport maps one to
//! the other by translating by `offset` first and then scaling the whole
//! coordinate space: `screen = (world + offset) * scale`.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

pub const DEFAULT_ZOOM_STEP: f32 = 1.2;
pub const DEFAULT_MIN_SCALE: f32 = 0.5;
pub const DEFAULT_MAX_SCALE: f32 = 2.0;
pub const DEFAULT_GRID_SIZE: f32 = 20.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    pub fn distance(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(self) -> Point {
        Point {
            x: self.width / 2.0,
            y: self.height / 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub offset: Point,
    pub scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: Point::ZERO,
            scale: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(offset: Point, scale: f32) -> Self {
        Self { offset, scale }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomDirection {
    In,
    Out,
}

/// Multiplicative zoom step and the scale range it is clamped to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZoomLimits {
    pub step: f32,
    pub min_scale: f32,
    pub max_scale: f32,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            step: DEFAULT_ZOOM_STEP,
            min_scale: DEFAULT_MIN_SCALE,
            max_scale: DEFAULT_MAX_SCALE,
        }
    }
}

impl ZoomLimits {
    /// Finite bounds with `0 < min_scale <= max_scale` and a step above one.
    pub fn is_valid(&self) -> bool {
        self.step.is_finite()
            && self.min_scale.is_finite()
            && self.max_scale.is_finite()
            && self.step > 1.0
            && self.min_scale > 0.0
            && self.min_scale <= self.max_scale
    }

    /// Never panics, even on limits that fail `is_valid`: the lower bound
    /// wins when the two cross.
    pub fn clamp(&self, scale: f32) -> f32 {
        scale.min(self.max_scale).max(self.min_scale)
    }
}

/// Side of a node's bounding box used as a connection endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorSide {
    #[default]
    Center,
    Top,
    Right,
    Bottom,
    Left,
}

pub fn world_to_screen(point: Point, viewport: &Viewport) -> Point {
    (point + viewport.offset).scaled(viewport.scale)
}

pub fn screen_to_world(point: Point, viewport: &Viewport) -> Point {
    point.scaled(1.0 / viewport.scale) - viewport.offset
}

pub fn zoom(viewport: &Viewport, direction: ZoomDirection, limits: &ZoomLimits) -> Viewport {
    let scale = match direction {
        ZoomDirection::In => viewport.scale * limits.step,
        ZoomDirection::Out => viewport.scale / limits.step,
    };
    Viewport {
        offset: viewport.offset,
        scale: limits.clamp(scale),
    }
}

/// Shifts the offset by a raw screen-space delta. The delta is not divided by
/// the current scale, so content moves faster than the pointer when zoomed in.
pub fn pan(viewport: &Viewport, delta: Point) -> Viewport {
    Viewport {
        offset: viewport.offset + delta,
        scale: viewport.scale,
    }
}

/// Connection endpoint on a node whose top-left corner sits at `origin`.
pub fn anchor_point(origin: Point, size: Size, side: AnchorSide) -> Point {
    let center = origin + size.center();
    match side {
        AnchorSide::Center => center,
        AnchorSide::Top => Point::new(center.x, origin.y),
        AnchorSide::Bottom => Point::new(center.x, origin.y + size.height),
        AnchorSide::Left => Point::new(origin.x, center.y),
        AnchorSide::Right => Point::new(origin.x + size.width, center.y),
    }
}

pub fn snap_to_grid(point: Point, grid: f32) -> Point {
    if grid <= 0.0 {
        return point;
    }
    Point {
        x: (point.x / grid).round() * grid,
        y: (point.y / grid).round() * grid,
    }
}
