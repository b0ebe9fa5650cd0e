// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon triangulation utilities
//!
//! Wrapper around earcutr for planar polygons, plus projection of 3D faces
//! onto their own plane.

use crate::{Error, Point2, Point3, Result, Vector3};

/// Check if a polygon is convex (all turns have the same sign)
fn is_convex(points: &[Point2<f64>]) -> bool {
    let n = points.len();
    let mut sign = 0.0f64;

    for i in 0..n {
        let p0 = &points[i];
        let p1 = &points[(i + 1) % n];
        let p2 = &points[(i + 2) % n];
        let cross = (p1.x - p0.x) * (p2.y - p1.y) - (p1.y - p0.y) * (p2.x - p1.x);

        if cross.abs() > 1e-10 {
            if sign == 0.0 {
                sign = cross.signum();
            } else if sign != cross.signum() {
                return false;
            }
        }
    }

    n >= 3
}

/// Fan triangulation around the first vertex
pub fn fan_indices(n: usize) -> Vec<usize> {
    (1..n.saturating_sub(1))
        .flat_map(|i| [0, i, i + 1])
        .collect()
}

fn flatten<'a>(rings: impl Iterator<Item = &'a Point2<f64>>) -> Vec<f64> {
    rings.flat_map(|p| [p.x, p.y]).collect()
}

/// Triangulate a simple polygon (no holes)
///
/// Returns triangle indices into the input points.
pub fn triangulate_polygon(points: &[Point2<f64>]) -> Result<Vec<usize>> {
    match points.len() {
        n if n < 3 => Err(Error::triangulation("Need at least 3 points to triangulate")),
        3 => Ok(vec![0, 1, 2]),
        n if n <= 8 && is_convex(points) => Ok(fan_indices(n)),
        _ => earcutr::earcut(&flatten(points.iter()), &[], 2)
            .map_err(|e| Error::triangulation(format!("{:?}", e))),
    }
}

/// Triangulate a polygon with holes
///
/// Returns triangle indices into the outer ring followed by each hole.
/// Holes with fewer than 3 points are expected to be filtered by the caller.
pub fn triangulate_polygon_with_holes(
    outer: &[Point2<f64>],
    holes: &[Vec<Point2<f64>>],
) -> Result<Vec<usize>> {
    if outer.len() < 3 {
        return Err(Error::triangulation(
            "Need at least 3 points in outer boundary",
        ));
    }
    if holes.is_empty() {
        return triangulate_polygon(outer);
    }

    let mut hole_starts = Vec::with_capacity(holes.len());
    let mut offset = outer.len();
    for hole in holes {
        hole_starts.push(offset);
        offset += hole.len();
    }

    let vertices = flatten(outer.iter().chain(holes.iter().flatten()));
    earcutr::earcut(&vertices, &hole_starts, 2)
        .map_err(|e| Error::triangulation(format!("{:?}", e)))
}

/// Orthonormal 2D frame on a plane in 3D
#[derive(Debug, Clone, Copy)]
pub struct PlaneBasis {
    pub origin: Point3<f64>,
    pub u_axis: Vector3<f64>,
    pub v_axis: Vector3<f64>,
}

impl PlaneBasis {
    /// Frame through `origin` perpendicular to `normal`
    pub fn new(origin: Point3<f64>, normal: &Vector3<f64>) -> Self {
        // Cross with the axis least aligned to the normal
        let reference = if normal.x.abs() <= normal.y.abs() && normal.x.abs() <= normal.z.abs() {
            Vector3::x()
        } else if normal.y.abs() <= normal.z.abs() {
            Vector3::y()
        } else {
            Vector3::z()
        };

        let u_axis = normal.cross(&reference).normalize();
        let v_axis = normal.cross(&u_axis).normalize();
        Self {
            origin,
            u_axis,
            v_axis,
        }
    }

    pub fn project(&self, points: &[Point3<f64>]) -> Vec<Point2<f64>> {
        points
            .iter()
            .map(|p| {
                let v = p - self.origin;
                Point2::new(v.dot(&self.u_axis), v.dot(&self.v_axis))
            })
            .collect()
    }
}

/// Unit normal of a polygon, +Z for degenerate input
pub fn polygon_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let n = points.len();
    if n < 3 {
        return Vector3::z();
    }

    // Newell's method
    let mut normal = Vector3::<f64>::zeros();
    for i in 0..n {
        let current = &points[i];
        let next = &points[(i + 1) % n];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }

    normal.try_normalize(1e-10).unwrap_or_else(Vector3::z)
}

/// Triangulate a planar 3D face with optional holes
///
/// Returns indices into the outer ring followed by each hole. Falls back to a
/// fan over the outer ring when the projected polygon cannot be cut.
pub fn triangulate_face(outer: &[Point3<f64>], holes: &[Vec<Point3<f64>>]) -> Vec<usize> {
    if holes.is_empty() && outer.len() <= 4 {
        return fan_indices(outer.len());
    }

    let basis = PlaneBasis::new(outer[0], &polygon_normal(outer));
    let outer_2d = basis.project(outer);
    let holes_2d: Vec<Vec<Point2<f64>>> = holes.iter().map(|h| basis.project(h)).collect();

    triangulate_polygon_with_holes(&outer_2d, &holes_2d)
        .unwrap_or_else(|_| fan_indices(outer.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64, z: f64) -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, z),
            Point3::new(size, 0.0, z),
            Point3::new(size, size, z),
            Point3::new(0.0, size, z),
        ]
    }

    #[test]
    fn test_triangulate_square() {
        let points: Vec<Point2<f64>> = square(1.0, 0.0).iter().map(|p| p.xy()).collect();
        assert_eq!(triangulate_polygon(&points).unwrap(), vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_triangulate_concave() {
        // L-shaped hexagon is concave, so earcut handles it
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        assert!(!is_convex(&points));
        assert_eq!(triangulate_polygon(&points).unwrap().len(), 12);
    }

    #[test]
    fn test_too_few_points() {
        assert!(triangulate_polygon(&[Point2::new(0.0, 0.0)]).is_err());
    }

    #[test]
    fn test_polygon_normal() {
        let normal = polygon_normal(&square(1.0, 3.0));
        assert!((normal.z - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_triangulate_face_with_hole() {
        let outer = square(4.0, 0.0);
        let hole: Vec<Point3<f64>> = square(2.0, 0.0)
            .into_iter()
            .rev()
            .map(|p| p + Vector3::new(1.0, 1.0, 0.0))
            .collect();

        let indices = triangulate_face(&outer, &[hole]);
        assert_eq!(indices.len() % 3, 0);
        assert!(indices.len() >= 24);
        assert!(indices.iter().all(|&i| i < 8));
    }
}
