// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D profile definitions and triangulation

use crate::error::{Error, Result};
use crate::triangulation::triangulate_polygon_with_holes;
use nalgebra::{Matrix3, Point2};
use std::f64::consts::PI;

/// 2D profile with optional holes
#[derive(Debug, Clone, PartialEq)]
pub struct Profile2D {
    /// Outer boundary (counter-clockwise)
    pub outer: Vec<Point2<f64>>,
    /// Holes (clockwise)
    pub holes: Vec<Vec<Point2<f64>>>,
}

/// Triangulated profile
#[derive(Debug, Clone)]
pub struct Triangulation {
    /// All vertices, outer boundary first, then each hole
    pub points: Vec<Point2<f64>>,
    pub indices: Vec<usize>,
}

impl Profile2D {
    pub fn new(outer: Vec<Point2<f64>>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    pub fn add_hole(&mut self, hole: Vec<Point2<f64>>) {
        self.holes.push(hole);
    }

    /// Rectangle centred at the origin
    pub fn rectangle(width: f64, height: f64) -> Self {
        let half_w = width / 2.0;
        let half_h = height / 2.0;

        Self::new(vec![
            Point2::new(-half_w, -half_h),
            Point2::new(half_w, -half_h),
            Point2::new(half_w, half_h),
            Point2::new(-half_w, half_h),
        ])
    }

    /// Circle centred at the origin, segment count adapted to the radius
    pub fn circle(radius: f64) -> Self {
        Self::new(circle_points(radius))
    }

    /// Tube section with the inner circle as a hole
    pub fn hollow_circle(radius: f64, wall_thickness: f64) -> Result<Self> {
        let inner = radius - wall_thickness;
        if inner <= 0.0 {
            return Err(Error::profile("hollow circle has no inner radius"));
        }
        let mut profile = Self::circle(radius);
        let mut hole = circle_points(inner);
        hole.reverse();
        profile.add_hole(hole);
        Ok(profile)
    }

    /// Apply a 2D placement to every point
    pub fn transform(&mut self, matrix: &Matrix3<f64>) {
        let apply = |points: &mut Vec<Point2<f64>>| {
            for p in points.iter_mut() {
                *p = matrix.transform_point(p);
            }
        };
        apply(&mut self.outer);
        self.holes.iter_mut().for_each(apply);
    }

    /// Triangulate the profile with earcutr
    pub fn triangulate(&self) -> Result<Triangulation> {
        if self.outer.len() < 3 {
            return Err(Error::profile("Profile must have at least 3 vertices"));
        }
        let holes: Vec<Vec<Point2<f64>>> = self
            .holes
            .iter()
            .filter(|h| h.len() >= 3)
            .cloned()
            .collect();
        let indices = triangulate_polygon_with_holes(&self.outer, &holes)?;

        let points = self
            .outer
            .iter()
            .chain(holes.iter().flatten())
            .copied()
            .collect();

        Ok(Triangulation { points, indices })
    }
}

fn circle_points(radius: f64) -> Vec<Point2<f64>> {
    let segments = calculate_circle_segments(radius);
    (0..segments)
        .map(|i| {
            let angle = 2.0 * PI * (i as f64) / (segments as f64);
            Point2::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

/// Adaptive number of segments for a circle
#[inline]
pub fn calculate_circle_segments(radius: f64) -> usize {
    let segments = (radius.abs().sqrt() * 8.0).ceil() as usize;
    segments.clamp(8, 32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector2;

    #[test]
    fn test_rectangle_profile() {
        let profile = Profile2D::rectangle(10.0, 5.0);
        assert_eq!(profile.outer.len(), 4);
        assert!(profile.holes.is_empty());
        assert_relative_eq!(profile.outer[2].x, 5.0);
        assert_relative_eq!(profile.outer[2].y, 2.5);
    }

    #[test]
    fn test_circle_segments_clamped() {
        assert_eq!(Profile2D::circle(0.05).outer.len(), 8);
        assert_eq!(Profile2D::circle(5000.0).outer.len(), 32);
    }

    #[test]
    fn test_hollow_circle() {
        let profile = Profile2D::hollow_circle(0.5, 0.1).unwrap();
        assert_eq!(profile.holes.len(), 1);
        assert!(Profile2D::hollow_circle(0.5, 0.6).is_err());

        let tri = profile.triangulate().unwrap();
        assert_eq!(tri.points.len(), profile.outer.len() + profile.holes[0].len());
        assert!(tri.indices.len() >= profile.outer.len() * 3);
    }

    #[test]
    fn test_triangulate_rectangle() {
        let tri = Profile2D::rectangle(10.0, 5.0).triangulate().unwrap();
        assert_eq!(tri.points.len(), 4);
        assert_eq!(tri.indices.len(), 6);
    }

    #[test]
    fn test_transform() {
        let mut profile = Profile2D::rectangle(2.0, 2.0);
        profile.transform(&Matrix3::new_translation(&Vector2::new(3.0, 1.0)));
        assert_relative_eq!(profile.outer[0].x, 2.0);
        assert_relative_eq!(profile.outer[0].y, 0.0);
    }

    #[test]
    fn test_degenerate_profile() {
        let profile = Profile2D::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]);
        assert!(profile.triangulate().is_err());
    }
}
