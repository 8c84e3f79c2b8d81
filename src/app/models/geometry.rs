//! GeoJSON geometries and bounding boxes
//!
//! Geometries are 2D and expressed in WGS84 longitude/latitude. The
//! serialized form follows GeoJSON (`{"type": ..., "coordinates": ...}`)
//! and bounding boxes serialize as `[min_x, min_y, max_x, max_y]`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A longitude/latitude position
pub type Position = [f64; 2];

// =============================================================================
// Bounding Box
// =============================================================================

/// Axis-aligned bounding box in longitude/latitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 4]", try_from = "[f64; 4]")]
pub struct Bbox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bbox {
    /// Create a bounding box, rejecting non-finite or inverted bounds
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self> {
        if ![min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite()) {
            return Err(Error::validation(format!(
                "Bounding box [{}, {}, {}, {}] contains non-finite values",
                min_x, min_y, max_x, max_y
            )));
        }

        if min_x > max_x || min_y > max_y {
            return Err(Error::validation(format!(
                "Bounding box [{}, {}, {}, {}] has minimum greater than maximum",
                min_x, min_y, max_x, max_y
            )));
        }

        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// Degenerate box covering a single position
    pub fn from_position(position: Position) -> Self {
        Self {
            min_x: position[0],
            min_y: position[1],
            max_x: position[0],
            max_y: position[1],
        }
    }

    /// True if the position lies inside or on the boundary
    pub fn contains(&self, position: Position) -> bool {
        position[0] >= self.min_x
            && position[0] <= self.max_x
            && position[1] >= self.min_y
            && position[1] <= self.max_y
    }

    /// True if the boxes share at least one point (touching counts)
    pub fn intersects(&self, other: &Bbox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Smallest box covering both boxes
    pub fn union(&self, other: &Bbox) -> Bbox {
        Bbox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Grow the box to include a position
    pub fn expand(&mut self, position: Position) {
        self.min_x = self.min_x.min(position[0]);
        self.min_y = self.min_y.min(position[1]);
        self.max_x = self.max_x.max(position[0]);
        self.max_y = self.max_y.max(position[1]);
    }

    /// Centre of the box
    pub fn center(&self) -> Position {
        [
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        ]
    }

    /// The box as a closed polygon ring
    pub fn to_polygon(&self) -> Geometry {
        Geometry::Polygon(vec![vec![
            [self.min_x, self.min_y],
            [self.max_x, self.min_y],
            [self.max_x, self.max_y],
            [self.min_x, self.max_y],
            [self.min_x, self.min_y],
        ]])
    }

    /// `[min_x, min_y, max_x, max_y]`
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

impl From<Bbox> for [f64; 4] {
    fn from(bbox: Bbox) -> Self {
        bbox.to_array()
    }
}

impl TryFrom<[f64; 4]> for Bbox {
    type Error = Error;

    fn try_from(values: [f64; 4]) -> Result<Self> {
        Bbox::new(values[0], values[1], values[2], values[3])
    }
}

impl std::str::FromStr for Bbox {
    type Err = Error;

    /// Parse `min_x,min_y,max_x,max_y`
    fn from_str(s: &str) -> Result<Self> {
        let values = s
            .split(',')
            .map(|part| {
                part.trim().parse::<f64>().map_err(|_| {
                    Error::validation(format!("Invalid bounding box value '{}'", part.trim()))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        match values.as_slice() {
            [min_x, min_y, max_x, max_y] => Bbox::new(*min_x, *min_y, *max_x, *max_y),
            _ => Err(Error::validation(format!(
                "Bounding box '{}' must have exactly 4 comma-separated values",
                s
            ))),
        }
    }
}

// =============================================================================
// Geometry
// =============================================================================

/// GeoJSON geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    /// Exterior ring followed by optional holes; rings are closed
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

impl Geometry {
    /// GeoJSON type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::LineString(_) => "LineString",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// Validate coordinate ranges and structural rules
    pub fn validate(&self) -> Result<()> {
        for position in self.positions() {
            validate_position(*position)?;
        }

        match self {
            Geometry::Point(_) => Ok(()),
            Geometry::MultiPoint(points) => {
                if points.is_empty() {
                    return Err(Error::validation("MultiPoint must contain at least one point"));
                }
                Ok(())
            }
            Geometry::LineString(line) => validate_line(line),
            Geometry::MultiLineString(lines) => {
                if lines.is_empty() {
                    return Err(Error::validation(
                        "MultiLineString must contain at least one line",
                    ));
                }
                lines.iter().try_for_each(|line| validate_line(line))
            }
            Geometry::Polygon(rings) => validate_polygon(rings),
            Geometry::MultiPolygon(polygons) => {
                if polygons.is_empty() {
                    return Err(Error::validation(
                        "MultiPolygon must contain at least one polygon",
                    ));
                }
                polygons.iter().try_for_each(|rings| validate_polygon(rings))
            }
        }
    }

    /// Every position of the geometry, in document order
    pub fn positions(&self) -> Box<dyn Iterator<Item = &Position> + '_> {
        match self {
            Geometry::Point(point) => Box::new(std::iter::once(point)),
            Geometry::MultiPoint(points) | Geometry::LineString(points) => Box::new(points.iter()),
            Geometry::MultiLineString(lines) | Geometry::Polygon(lines) => {
                Box::new(lines.iter().flatten())
            }
            Geometry::MultiPolygon(polygons) => Box::new(polygons.iter().flatten().flatten()),
        }
    }

    /// Envelope of the geometry; `None` only for empty coordinate lists
    pub fn bbox(&self) -> Option<Bbox> {
        let mut positions = self.positions();
        let mut bbox = Bbox::from_position(*positions.next()?);
        for position in positions {
            bbox.expand(*position);
        }
        Some(bbox)
    }

    /// Exact intersection test against a bounding box
    pub fn intersects_bbox(&self, bbox: &Bbox) -> bool {
        match self.bbox() {
            Some(envelope) if envelope.intersects(bbox) => {}
            _ => return false,
        }

        match self {
            Geometry::Point(point) => bbox.contains(*point),
            Geometry::MultiPoint(points) => points.iter().any(|p| bbox.contains(*p)),
            Geometry::LineString(line) => line_intersects_bbox(line, bbox),
            Geometry::MultiLineString(lines) => {
                lines.iter().any(|line| line_intersects_bbox(line, bbox))
            }
            Geometry::Polygon(rings) => polygon_intersects_bbox(rings, bbox),
            Geometry::MultiPolygon(polygons) => polygons
                .iter()
                .any(|rings| polygon_intersects_bbox(rings, bbox)),
        }
    }
}

impl From<Bbox> for Geometry {
    fn from(bbox: Bbox) -> Self {
        bbox.to_polygon()
    }
}

fn validate_position(position: Position) -> Result<()> {
    let [lon, lat] = position;
    if !lon.is_finite() || !lat.is_finite() {
        return Err(Error::validation(format!(
            "Position [{}, {}] contains non-finite values",
            lon, lat
        )));
    }

    if !(-180.0..=180.0).contains(&lon) {
        return Err(Error::validation(format!(
            "Invalid longitude {}: must be between -180 and 180 degrees",
            lon
        )));
    }

    if !(-90.0..=90.0).contains(&lat) {
        return Err(Error::validation(format!(
            "Invalid latitude {}: must be between -90 and 90 degrees",
            lat
        )));
    }

    Ok(())
}

fn validate_line(line: &[Position]) -> Result<()> {
    if line.len() < 2 {
        return Err(Error::validation(format!(
            "LineString must have at least 2 positions, found {}",
            line.len()
        )));
    }
    Ok(())
}

fn validate_polygon(rings: &[Vec<Position>]) -> Result<()> {
    if rings.is_empty() {
        return Err(Error::validation("Polygon must have an exterior ring"));
    }

    for ring in rings {
        if ring.len() < 4 {
            return Err(Error::validation(format!(
                "Polygon ring must have at least 4 positions, found {}",
                ring.len()
            )));
        }

        if ring.first() != ring.last() {
            return Err(Error::validation(
                "Polygon ring must be closed (first position equals last)",
            ));
        }
    }

    Ok(())
}

fn line_intersects_bbox(line: &[Position], bbox: &Bbox) -> bool {
    match line {
        [single] => bbox.contains(*single),
        _ => line
            .windows(2)
            .any(|segment| segment_intersects_bbox(segment[0], segment[1], bbox)),
    }
}

/// Liang-Barsky clip of segment `a`-`b` against the box
fn segment_intersects_bbox(a: Position, b: Position, bbox: &Bbox) -> bool {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let mut t_enter = 0.0_f64;
    let mut t_exit = 1.0_f64;

    let edges = [
        (-dx, a[0] - bbox.min_x),
        (dx, bbox.max_x - a[0]),
        (-dy, a[1] - bbox.min_y),
        (dy, bbox.max_y - a[1]),
    ];

    for (p, q) in edges {
        if p == 0.0 {
            // Parallel to this edge: reject if outside it
            if q < 0.0 {
                return false;
            }
        } else {
            let t = q / p;
            if p < 0.0 {
                if t > t_exit {
                    return false;
                }
                t_enter = t_enter.max(t);
            } else {
                if t < t_enter {
                    return false;
                }
                t_exit = t_exit.min(t);
            }
        }
    }

    t_enter <= t_exit
}

fn polygon_intersects_bbox(rings: &[Vec<Position>], bbox: &Bbox) -> bool {
    let boundary_hits = rings.iter().any(|ring| line_intersects_bbox(ring, bbox));
    if boundary_hits {
        return true;
    }

    // No ring touches the box, so the box lies wholly inside or outside the polygon
    point_in_polygon(bbox.center(), rings)
}

fn point_in_polygon(point: Position, rings: &[Vec<Position>]) -> bool {
    let Some((exterior, holes)) = rings.split_first() else {
        return false;
    };

    point_in_ring(point, exterior) && !holes.iter().any(|hole| point_in_ring(point, hole))
}

/// Even-odd ray casting
fn point_in_ring(point: Position, ring: &[Position]) -> bool {
    let [x, y] = point;
    let mut inside = false;
    let mut j = ring.len().saturating_sub(1);

    for i in 0..ring.len() {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }

    inside
}
