// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Placements, points and directions as nalgebra types

use ifc_estate_model::{AttributeValue, DecodedEntity, EntityId, EntityResolver, IfcType};
use log::debug;
use nalgebra::{Matrix3, Matrix4, Point2, Point3, Vector3};

/// PlacementRelTo chains deeper than this are treated as cyclic
const MAX_CHAIN: usize = 64;

/// Coordinates of a list value, zero-padded to three components
pub fn coordinates(value: &AttributeValue) -> Option<[f64; 3]> {
    let list = value.as_list()?;
    if list.is_empty() {
        return None;
    }
    let mut coords = [0.0; 3];
    for (slot, item) in coords.iter_mut().zip(list) {
        *slot = item.as_float()?;
    }
    Some(coords)
}

/// IfcCartesianPoint coordinates, 2D points get z = 0
pub fn point(resolver: &dyn EntityResolver, id: EntityId) -> Option<Point3<f64>> {
    let entity = resolver.get(id)?;
    if entity.ifc_type != IfcType::IfcCartesianPoint {
        return None;
    }
    let [x, y, z] = coordinates(entity.get(0)?)?;
    Some(Point3::new(x, y, z))
}

/// IfcDirection ratios, not normalized
pub fn direction(resolver: &dyn EntityResolver, id: EntityId) -> Option<Vector3<f64>> {
    let entity = resolver.get(id)?;
    if entity.ifc_type != IfcType::IfcDirection {
        return None;
    }
    let [x, y, z] = coordinates(entity.get(0)?)?;
    Some(Vector3::new(x, y, z))
}

/// Right-handed basis from a Z axis and an approximate X axis
fn basis(axis: Vector3<f64>, ref_direction: Vector3<f64>) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
    let z = axis.try_normalize(1e-12).unwrap_or_else(Vector3::z);
    let x = (ref_direction - z * ref_direction.dot(&z))
        .try_normalize(1e-12)
        .unwrap_or_else(|| {
            // RefDirection parallel to Axis: any perpendicular will do
            let helper = if z.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
            (helper - z * helper.dot(&z)).normalize()
        });
    let y = z.cross(&x);
    (x, y, z)
}

fn frame_matrix(x: Vector3<f64>, y: Vector3<f64>, z: Vector3<f64>, origin: Point3<f64>) -> Matrix4<f64> {
    Matrix4::new(
        x.x, y.x, z.x, origin.x,
        x.y, y.y, z.y, origin.y,
        x.z, y.z, z.z, origin.z,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Transform of an IfcAxis2Placement3D
///
/// Location at index 0, Axis at 1, RefDirection at 2.
pub fn axis2_placement_3d(resolver: &dyn EntityResolver, entity: &DecodedEntity) -> Option<Matrix4<f64>> {
    if entity.ifc_type != IfcType::IfcAxis2Placement3D {
        return None;
    }
    let location = entity
        .get_ref(0)
        .and_then(|id| point(resolver, id))
        .unwrap_or_else(Point3::origin);
    let axis = entity
        .get_ref(1)
        .and_then(|id| direction(resolver, id))
        .unwrap_or_else(Vector3::z);
    let ref_direction = entity
        .get_ref(2)
        .and_then(|id| direction(resolver, id))
        .unwrap_or_else(Vector3::x);

    let (x, y, z) = basis(axis, ref_direction);
    Some(frame_matrix(x, y, z, location))
}

/// Homogeneous 2D transform of an IfcAxis2Placement2D
pub fn axis2_placement_2d(resolver: &dyn EntityResolver, entity: &DecodedEntity) -> Option<Matrix3<f64>> {
    if entity.ifc_type != IfcType::IfcAxis2Placement2D {
        return None;
    }
    let location = entity
        .get_ref(0)
        .and_then(|id| point(resolver, id))
        .map(|p| Point2::new(p.x, p.y))
        .unwrap_or_else(Point2::origin);
    let x = entity
        .get_ref(1)
        .and_then(|id| direction(resolver, id))
        .and_then(|d| d.xy().try_normalize(1e-12))
        .unwrap_or_else(nalgebra::Vector2::x);

    Some(Matrix3::new(
        x.x, -x.y, location.x,
        x.y, x.x, location.y,
        0.0, 0.0, 1.0,
    ))
}

/// Transform of an IfcCartesianTransformationOperator3D (or its non-uniform subtype)
///
/// Axis1 at index 0, Axis2 at 1, LocalOrigin at 2, Scale at 3, Axis3 at 4,
/// Scale2 and Scale3 at 5 and 6 for the non-uniform variant.
pub fn transformation_operator(
    resolver: &dyn EntityResolver,
    entity: &DecodedEntity,
) -> Option<Matrix4<f64>> {
    let non_uniform = match entity.ifc_type {
        IfcType::IfcCartesianTransformationOperator3D => false,
        IfcType::IfcCartesianTransformationOperator3DnonUniform => true,
        _ => return None,
    };
    let dir = |index| entity.get_ref(index).and_then(|id| direction(resolver, id));
    let origin = entity
        .get_ref(2)
        .and_then(|id| point(resolver, id))
        .unwrap_or_else(Point3::origin);

    let (x, y, z) = basis(
        dir(4).unwrap_or_else(Vector3::z),
        dir(0).unwrap_or_else(Vector3::x),
    );
    let scale = entity.get_float(3).unwrap_or(1.0);
    let (scale_y, scale_z) = if non_uniform {
        (
            entity.get_float(5).unwrap_or(scale),
            entity.get_float(6).unwrap_or(scale),
        )
    } else {
        (scale, scale)
    };

    Some(frame_matrix(x * scale, y * scale_y, z * scale_z, origin))
}

/// Location and x-axis of a local placement, relative to its parent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    pub location: Point3<f64>,
    /// Explicit RefDirection, if the placement declares one
    pub ref_direction: Option<Vector3<f64>>,
}

impl LocalFrame {
    /// Rotation about Z in radians, zero without a RefDirection
    pub fn rotation_z(&self) -> f64 {
        self.ref_direction.map_or(0.0, |d| d.y.atan2(d.x))
    }
}

/// RelativePlacement (index 1) of an IfcLocalPlacement
pub fn local_frame(resolver: &dyn EntityResolver, placement_id: EntityId) -> Option<LocalFrame> {
    let placement = resolver.get(placement_id)?;
    if placement.ifc_type != IfcType::IfcLocalPlacement {
        return None;
    }
    let relative = resolver.get(placement.get_ref(1)?)?;
    let location = relative
        .get_ref(0)
        .and_then(|id| point(resolver, id))
        .unwrap_or_else(Point3::origin);
    let ref_direction = match relative.ifc_type {
        IfcType::IfcAxis2Placement3D => relative.get_ref(2),
        IfcType::IfcAxis2Placement2D => relative.get_ref(1),
        _ => None,
    }
    .and_then(|id| direction(resolver, id));

    Some(LocalFrame {
        location,
        ref_direction,
    })
}

/// World transform of an object placement
///
/// Multiplies the RelativePlacement of every IfcLocalPlacement up the
/// PlacementRelTo (index 0) chain.
pub fn object_placement(resolver: &dyn EntityResolver, placement_id: EntityId) -> Option<Matrix4<f64>> {
    let mut transform = Matrix4::identity();
    let mut current = Some(placement_id);
    let mut depth = 0;

    while let Some(id) = current {
        if depth == MAX_CHAIN {
            debug!("placement chain from {} exceeds {} links", placement_id, MAX_CHAIN);
            return None;
        }
        depth += 1;

        let placement = resolver.get(id)?;
        let local = match placement.ifc_type {
            IfcType::IfcLocalPlacement => placement
                .get_ref(1)
                .and_then(|rel| resolver.get(rel))
                .and_then(|rel| relative_transform(resolver, &rel))
                .unwrap_or_else(Matrix4::identity),
            IfcType::IfcAxis2Placement3D => axis2_placement_3d(resolver, &placement)?,
            _ => return None,
        };
        transform = local * transform;
        current = match placement.ifc_type {
            IfcType::IfcLocalPlacement => placement.get_ref(0),
            _ => None,
        };
    }

    Some(transform)
}

fn relative_transform(resolver: &dyn EntityResolver, entity: &DecodedEntity) -> Option<Matrix4<f64>> {
    match entity.ifc_type {
        IfcType::IfcAxis2Placement3D => axis2_placement_3d(resolver, entity),
        IfcType::IfcAxis2Placement2D => {
            let m = axis2_placement_2d(resolver, entity)?;
            Some(Matrix4::new(
                m[(0, 0)], m[(0, 1)], 0.0, m[(0, 2)],
                m[(1, 0)], m[(1, 1)], 0.0, m[(1, 2)],
                0.0, 0.0, 1.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ))
        }
        _ => None,
    }
}
