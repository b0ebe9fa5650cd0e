// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extrusion of 2D profiles into 3D meshes

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::profile::{Profile2D, Triangulation};
use nalgebra::{Point2, Point3, Vector3};

/// Extrude a profile lying in the XY plane along `direction`
///
/// The swept distance is `depth` measured along the unit direction, so an
/// oblique direction produces a sheared prism.
pub fn extrude_profile(profile: &Profile2D, depth: f64, direction: Vector3<f64>) -> Result<Mesh> {
    if !depth.is_finite() || depth <= 0.0 {
        return Err(Error::InvalidExtrusion(format!(
            "depth must be positive, got {}",
            depth
        )));
    }
    let direction = direction
        .try_normalize(1e-12)
        .ok_or_else(|| Error::InvalidExtrusion("zero extrusion direction".into()))?;
    let offset = direction * depth;

    let triangulation = profile.triangulate()?;
    let ring_points: usize = profile.outer.len() + profile.holes.iter().map(Vec::len).sum::<usize>();
    let mut mesh = Mesh::with_capacity(
        triangulation.points.len() * 2 + ring_points * 4,
        triangulation.indices.len() * 2 + ring_points * 6,
    );

    // Bottom cap faces against the sweep
    let flip_bottom = offset.z >= 0.0;
    create_cap(&triangulation, Vector3::zeros(), flip_bottom, &mut mesh);
    create_cap(&triangulation, offset, !flip_bottom, &mut mesh);

    create_side_walls(&profile.outer, offset, &mut mesh);
    for hole in &profile.holes {
        create_side_walls(hole, offset, &mut mesh);
    }

    Ok(mesh)
}

fn create_cap(triangulation: &Triangulation, offset: Vector3<f64>, flip: bool, mesh: &mut Mesh) {
    let base = mesh.vertex_count() as u32;
    for p in &triangulation.points {
        mesh.add_vertex(Point3::new(p.x, p.y, 0.0) + offset);
    }
    for tri in triangulation.indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as u32, tri[1] as u32, tri[2] as u32);
        if flip {
            mesh.add_triangle(base + i0, base + i2, base + i1);
        } else {
            mesh.add_triangle(base + i0, base + i1, base + i2);
        }
    }
}

fn create_side_walls(boundary: &[Point2<f64>], offset: Vector3<f64>, mesh: &mut Mesh) {
    let n = boundary.len();
    for i in 0..n {
        let p0 = boundary[i];
        let p1 = boundary[(i + 1) % n];
        // Duplicate consecutive points
        if (p1 - p0).norm() < 1e-10 {
            continue;
        }

        let b0 = Point3::new(p0.x, p0.y, 0.0);
        let b1 = Point3::new(p1.x, p1.y, 0.0);
        let idx = mesh.add_vertex(b0);
        mesh.add_vertex(b1);
        mesh.add_vertex(b1 + offset);
        mesh.add_vertex(b0 + offset);

        mesh.add_triangle(idx, idx + 1, idx + 2);
        mesh.add_triangle(idx, idx + 2, idx + 3);
    }
}
