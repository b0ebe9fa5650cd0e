// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry processors for individual representation items
//!
//! Each processor turns one kind of IFC solid or surface into a mesh in the
//! item's own coordinate system and file units.

use crate::{
    extrusion::extrude_profile,
    placement::{axis2_placement_2d, axis2_placement_3d, coordinates, direction, point},
    profile::Profile2D,
    router::GeometryProcessor,
    triangulation::triangulate_face,
    Error, Mesh, Result,
};
use ifc_estate_model::{AttributeValue, DecodedEntity, EntityId, EntityResolver, IfcType};
use log::debug;
use nalgebra::{Point2, Point3};

fn required_float(entity: &DecodedEntity, index: usize, what: &str) -> Result<f64> {
    entity
        .get_float(index)
        .ok_or_else(|| Error::invalid_attribute(index, format!("Missing {}", what)))
}

fn required_ref(entity: &DecodedEntity, index: usize, what: &str) -> Result<EntityId> {
    entity
        .get_ref(index)
        .ok_or_else(|| Error::invalid_attribute(index, format!("Missing {}", what)))
}

fn fetch(resolver: &dyn EntityResolver, id: EntityId) -> Result<std::sync::Arc<DecodedEntity>> {
    resolver.get(id).ok_or_else(|| Error::entity_not_found(id))
}

/// ExtrudedAreaSolid processor
///
/// SweptArea at index 0, Position at 1, ExtrudedDirection at 2, Depth at 3.
#[derive(Default)]
pub struct ExtrudedAreaSolidProcessor;

impl ExtrudedAreaSolidProcessor {
    pub fn new() -> Self {
        Self
    }

    /// 2D profile of an IfcProfileDef, with its own Position applied
    fn extract_profile(&self, entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Profile2D> {
        let mut profile = match entity.ifc_type {
            IfcType::IfcRectangleProfileDef => Profile2D::rectangle(
                required_float(entity, 3, "XDim")?,
                required_float(entity, 4, "YDim")?,
            ),
            IfcType::IfcCircleProfileDef => Profile2D::circle(required_float(entity, 3, "Radius")?),
            IfcType::IfcCircleHollowProfileDef => Profile2D::hollow_circle(
                required_float(entity, 3, "Radius")?,
                required_float(entity, 4, "WallThickness")?,
            )?,
            IfcType::IfcIShapeProfileDef => i_shape(
                required_float(entity, 3, "OverallWidth")?,
                required_float(entity, 4, "OverallDepth")?,
                required_float(entity, 5, "WebThickness")?,
                required_float(entity, 6, "FlangeThickness")?,
            ),
            IfcType::IfcLShapeProfileDef => {
                // Width defaults to Depth for equal-leg angles
                let depth = required_float(entity, 3, "Depth")?;
                l_shape(
                    depth,
                    entity.get_float(4).unwrap_or(depth),
                    required_float(entity, 5, "Thickness")?,
                )
            }
            IfcType::IfcTShapeProfileDef => t_shape(
                required_float(entity, 3, "Depth")?,
                required_float(entity, 4, "FlangeWidth")?,
                required_float(entity, 5, "WebThickness")?,
                required_float(entity, 6, "FlangeThickness")?,
            ),
            IfcType::IfcArbitraryClosedProfileDef | IfcType::IfcArbitraryProfileDefWithVoids => {
                // Arbitrary profiles carry no Position
                return self.extract_arbitrary_profile(entity, resolver);
            }
            _ => {
                return Err(Error::unsupported_type(format!(
                    "Profile type {}",
                    entity.ifc_type
                )))
            }
        };

        // Position at index 2 for parameterized profiles
        if let Some(position) = entity.get_ref(2).and_then(|id| resolver.get(id)) {
            if let Some(matrix) = axis2_placement_2d(resolver, &position) {
                profile.transform(&matrix);
            }
        }
        Ok(profile)
    }

    /// OuterCurve at index 2, InnerCurves at index 3
    fn extract_arbitrary_profile(
        &self,
        entity: &DecodedEntity,
        resolver: &dyn EntityResolver,
    ) -> Result<Profile2D> {
        let outer = curve_points(resolver, required_ref(entity, 2, "OuterCurve")?)?;
        if outer.len() < 3 {
            return Err(Error::profile("Profile must have at least 3 points"));
        }
        let mut profile = Profile2D::new(outer);

        if entity.ifc_type == IfcType::IfcArbitraryProfileDefWithVoids {
            for curve_id in entity.get_refs(3).unwrap_or_default() {
                match curve_points(resolver, curve_id) {
                    Ok(hole) if hole.len() >= 3 => profile.add_hole(hole),
                    Ok(_) => {}
                    Err(e) => debug!("skipping inner curve {}: {}", curve_id, e),
                }
            }
        }
        Ok(profile)
    }
}

impl GeometryProcessor for ExtrudedAreaSolidProcessor {
    fn process(&self, entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Mesh> {
        let profile_entity = fetch(resolver, required_ref(entity, 0, "SweptArea")?)?;
        let profile = self.extract_profile(&profile_entity, resolver)?;

        let extrusion = required_ref(entity, 2, "ExtrudedDirection")
            .and_then(|id| direction(resolver, id).ok_or_else(|| Error::entity_not_found(id)))?;
        let depth = required_float(entity, 3, "Depth")?;

        let mut mesh = extrude_profile(&profile, depth, extrusion)?;

        if let Some(position) = entity.get_ref(1).and_then(|id| resolver.get(id)) {
            if let Some(matrix) = axis2_placement_3d(resolver, &position) {
                mesh.transform(&matrix);
            }
        }
        Ok(mesh)
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcExtrudedAreaSolid]
    }
}

fn i_shape(width: f64, depth: f64, web: f64, flange: f64) -> Profile2D {
    let hw = width / 2.0;
    let hd = depth / 2.0;
    let ht = web / 2.0;

    Profile2D::new(vec![
        Point2::new(-hw, -hd),
        Point2::new(hw, -hd),
        Point2::new(hw, -hd + flange),
        Point2::new(ht, -hd + flange),
        Point2::new(ht, hd - flange),
        Point2::new(hw, hd - flange),
        Point2::new(hw, hd),
        Point2::new(-hw, hd),
        Point2::new(-hw, hd - flange),
        Point2::new(-ht, hd - flange),
        Point2::new(-ht, -hd + flange),
        Point2::new(-hw, -hd + flange),
    ])
}

/// Angle section centred on its bounding box
fn l_shape(depth: f64, width: f64, thickness: f64) -> Profile2D {
    let (hw, hd) = (width / 2.0, depth / 2.0);
    Profile2D::new(vec![
        Point2::new(-hw, -hd),
        Point2::new(hw, -hd),
        Point2::new(hw, -hd + thickness),
        Point2::new(-hw + thickness, -hd + thickness),
        Point2::new(-hw + thickness, hd),
        Point2::new(-hw, hd),
    ])
}

/// Tee section centred on its bounding box, flange on top
fn t_shape(depth: f64, flange_width: f64, web: f64, flange: f64) -> Profile2D {
    let (hf, hd, ht) = (flange_width / 2.0, depth / 2.0, web / 2.0);
    Profile2D::new(vec![
        Point2::new(-ht, -hd),
        Point2::new(ht, -hd),
        Point2::new(ht, hd - flange),
        Point2::new(hf, hd - flange),
        Point2::new(hf, hd),
        Point2::new(-hf, hd),
        Point2::new(-hf, hd - flange),
        Point2::new(-ht, hd - flange),
    ])
}

/// Points of a bounded 2D curve, closing point removed
fn curve_points(resolver: &dyn EntityResolver, curve_id: EntityId) -> Result<Vec<Point2<f64>>> {
    let curve = fetch(resolver, curve_id)?;

    let mut points: Vec<Point2<f64>> = match curve.ifc_type {
        // Points at index 0
        IfcType::IfcPolyline => curve
            .get_refs(0)
            .ok_or_else(|| Error::invalid_attribute(0, "Missing Points"))?
            .into_iter()
            .filter_map(|id| point(resolver, id))
            .map(|p| Point2::new(p.x, p.y))
            .collect(),
        // Points at index 0 is an IfcCartesianPointList2D with CoordList at 0
        IfcType::IfcIndexedPolyCurve => {
            let list = fetch(resolver, required_ref(&curve, 0, "Points")?)?;
            list.get_list(0)
                .ok_or_else(|| Error::invalid_attribute(0, "Missing CoordList"))?
                .iter()
                .filter_map(coordinates)
                .map(|[x, y, _]| Point2::new(x, y))
                .collect()
        }
        _ => {
            return Err(Error::unsupported_type(format!(
                "Curve type {}",
                curve.ifc_type
            )))
        }
    };

    if points.len() > 1 && (points[0] - points[points.len() - 1]).norm() < 1e-10 {
        points.pop();
    }
    Ok(points)
}

/// TriangulatedFaceSet and PolygonalFaceSet processor
///
/// Coordinates at index 0 reference an IfcCartesianPointList3D. Triangle
/// indices are 1-based: CoordIndex at index 3 for triangulated sets, Faces
/// at index 2 for polygonal sets.
#[derive(Default)]
pub struct FaceSetProcessor;

impl FaceSetProcessor {
    pub fn new() -> Self {
        Self
    }

    fn polygon_indices(face: &[AttributeValue], count: usize) -> Option<Vec<u32>> {
        face.iter()
            .map(|v| {
                let i = v.as_integer()?;
                (1..=count as i64).contains(&i).then(|| (i - 1) as u32)
            })
            .collect()
    }
}

impl GeometryProcessor for FaceSetProcessor {
    fn process(&self, entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Mesh> {
        let coords = fetch(resolver, required_ref(entity, 0, "Coordinates")?)?;
        let points: Vec<Point3<f64>> = coords
            .get_list(0)
            .ok_or_else(|| Error::invalid_attribute(0, "Missing CoordList"))?
            .iter()
            .filter_map(coordinates)
            .map(|[x, y, z]| Point3::new(x, y, z))
            .collect();

        let mut mesh = Mesh::with_capacity(points.len(), points.len() * 2);
        for p in &points {
            mesh.add_vertex(*p);
        }

        let polygons: Vec<Vec<u32>> = match entity.ifc_type {
            IfcType::IfcTriangulatedFaceSet => entity
                .get_list(3)
                .ok_or_else(|| Error::invalid_attribute(3, "Missing CoordIndex"))?
                .iter()
                .filter_map(|face| Self::polygon_indices(face.as_list()?, points.len()))
                .collect(),
            _ => resolver
                .resolve_ref_list(
                    entity
                        .get(2)
                        .ok_or_else(|| Error::invalid_attribute(2, "Missing Faces"))?,
                )
                .iter()
                // IfcIndexedPolygonalFace: CoordIndex at index 0
                .filter_map(|face| Self::polygon_indices(face.get_list(0)?, points.len()))
                .collect(),
        };

        for polygon in polygons.iter().filter(|p| p.len() >= 3) {
            let ring: Vec<Point3<f64>> = polygon.iter().map(|&i| points[i as usize]).collect();
            for tri in triangulate_face(&ring, &[]).chunks_exact(3) {
                mesh.add_triangle(polygon[tri[0]], polygon[tri[1]], polygon[tri[2]]);
            }
        }

        Ok(mesh)
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcTriangulatedFaceSet, IfcType::IfcPolygonalFaceSet]
    }
}

/// FacetedBrep processor
///
/// Outer shell at index 0, faces with outer and inner bounds.
#[derive(Default)]
pub struct FacetedBrepProcessor;

impl FacetedBrepProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Polygon of an IfcPolyLoop (Polygon at index 0)
    fn loop_points(resolver: &dyn EntityResolver, loop_id: EntityId) -> Option<Vec<Point3<f64>>> {
        let poly_loop = resolver.get(loop_id)?;
        let points: Vec<Point3<f64>> = poly_loop
            .get_refs(0)?
            .into_iter()
            .filter_map(|id| point(resolver, id))
            .collect();
        (points.len() >= 3).then_some(points)
    }

    /// Add one face to the mesh; Bounds at index 0
    fn add_face(mesh: &mut Mesh, face: &DecodedEntity, resolver: &dyn EntityResolver) {
        let mut outer: Option<Vec<Point3<f64>>> = None;
        let mut holes: Vec<Vec<Point3<f64>>> = Vec::new();

        let bounds = face
            .get(0)
            .map(|b| resolver.resolve_ref_list(b))
            .unwrap_or_default();
        for bound in bounds {
            // Bound loop at index 0, Orientation at index 1
            let Some(mut points) = bound.get_ref(0).and_then(|id| Self::loop_points(resolver, id))
            else {
                continue;
            };
            if bound.get(1).and_then(|v| v.as_bool()) == Some(false) {
                points.reverse();
            }
            if bound.ifc_type == IfcType::IfcFaceOuterBound && outer.is_none() {
                outer = Some(points);
            } else {
                holes.push(points);
            }
        }

        // Faces without an explicit outer bound use their first bound
        let outer = match outer {
            Some(outer) => outer,
            None if !holes.is_empty() => holes.remove(0),
            None => return,
        };

        let indices = triangulate_face(&outer, &holes);
        let base = mesh.vertex_count() as u32;
        for p in outer.iter().chain(holes.iter().flatten()) {
            mesh.add_vertex(*p);
        }
        for tri in indices.chunks_exact(3) {
            mesh.add_triangle(base + tri[0] as u32, base + tri[1] as u32, base + tri[2] as u32);
        }
    }
}

impl GeometryProcessor for FacetedBrepProcessor {
    fn process(&self, entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Mesh> {
        let shell = fetch(resolver, required_ref(entity, 0, "Outer shell")?)?;
        // CfsFaces at index 0
        let faces = shell
            .get(0)
            .ok_or_else(|| Error::invalid_attribute(0, "Missing CfsFaces"))?;

        let mut mesh = Mesh::new();
        for face in resolver.resolve_ref_list(faces) {
            Self::add_face(&mut mesh, &face, resolver);
        }
        Ok(mesh)
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcFacetedBrep]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::tests::resolver_for;
    use approx::assert_relative_eq;

    fn process(processor: &dyn GeometryProcessor, data: &str, id: u32) -> Result<Mesh> {
        let resolver = resolver_for(data);
        let entity = resolver.get(EntityId(id)).unwrap();
        processor.process(&entity, &resolver)
    }

    #[test]
    fn test_extruded_rectangle_with_position() {
        let mesh = process(
            &ExtrudedAreaSolidProcessor::new(),
            "#1=IFCRECTANGLEPROFILEDEF(.AREA.,$,$,4000.,200.);
#2=IFCDIRECTION((0.,0.,1.));
#3=IFCCARTESIANPOINT((0.,0.,1000.));
#4=IFCAXIS2PLACEMENT3D(#3,$,$);
#5=IFCEXTRUDEDAREASOLID(#1,#4,#2,3000.);",
            5,
        )
        .unwrap();

        let (min, max) = mesh.bounds().unwrap();
        assert_relative_eq!(min.x, -2000.0);
        assert_relative_eq!(max.y, 100.0);
        assert_relative_eq!(min.z, 1000.0);
        assert_relative_eq!(max.z, 4000.0);
    }

    #[test]
    fn test_extruded_arbitrary_profile_with_void() {
        let mesh = process(
            &ExtrudedAreaSolidProcessor::new(),
            "#1=IFCCARTESIANPOINT((0.,0.));
#2=IFCCARTESIANPOINT((4.,0.));
#3=IFCCARTESIANPOINT((4.,4.));
#4=IFCCARTESIANPOINT((0.,4.));
#5=IFCPOLYLINE((#1,#2,#3,#4,#1));
#6=IFCCARTESIANPOINTLIST2D(((1.,1.),(1.,3.),(3.,3.),(3.,1.)));
#7=IFCINDEXEDPOLYCURVE(#6,$,$);
#8=IFCARBITRARYPROFILEDEFWITHVOIDS(.AREA.,$,#5,(#7));
#9=IFCDIRECTION((0.,0.,1.));
#10=IFCEXTRUDEDAREASOLID(#8,$,#9,2.);",
            10,
        )
        .unwrap();

        // Ring caps: 8 triangles each, 8 side quads
        assert_eq!(mesh.triangle_count(), 8 * 2 + 8 * 2);
        let (min, max) = mesh.bounds().unwrap();
        assert_relative_eq!(max.x, 4.0);
        assert_relative_eq!(max.z, 2.0);
        assert_relative_eq!(min.z, 0.0);
    }

    #[test]
    fn test_unsupported_profile() {
        let result = process(
            &ExtrudedAreaSolidProcessor::new(),
            "#1=IFCELLIPSEPROFILEDEF(.AREA.,$,$,2.,1.);
#2=IFCDIRECTION((0.,0.,1.));
#3=IFCEXTRUDEDAREASOLID(#1,$,#2,1.);",
            3,
        );
        assert!(matches!(result, Err(Error::UnsupportedType(_))));
    }

    #[test]
    fn test_triangulated_face_set() {
        let mesh = process(
            &FaceSetProcessor::new(),
            "#1=IFCCARTESIANPOINTLIST3D(((0.,0.,0.),(1.,0.,0.),(1.,1.,0.),(0.,1.,0.)));
#2=IFCTRIANGULATEDFACESET(#1,$,.T.,((1,2,3),(1,3,4),(1,9,2)),$);",
            2,
        )
        .unwrap();

        assert_eq!(mesh.vertex_count(), 4);
        // Out-of-range triangle dropped
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_polygonal_face_set() {
        let mesh = process(
            &FaceSetProcessor::new(),
            "#1=IFCCARTESIANPOINTLIST3D(((0.,0.,0.),(1.,0.,0.),(1.,1.,0.),(0.,1.,0.)));
#2=IFCINDEXEDPOLYGONALFACE((1,2,3,4));
#3=IFCPOLYGONALFACESET(#1,.T.,(#2),$);",
            3,
        )
        .unwrap();
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_faceted_brep() {
        let mesh = process(
            &FacetedBrepProcessor::new(),
            "#1=IFCCARTESIANPOINT((0.,0.,0.));
#2=IFCCARTESIANPOINT((1.,0.,0.));
#3=IFCCARTESIANPOINT((1.,1.,0.));
#4=IFCCARTESIANPOINT((0.,0.,1.));
#5=IFCPOLYLOOP((#1,#2,#3));
#6=IFCPOLYLOOP((#1,#2,#4));
#7=IFCFACEOUTERBOUND(#5,.T.);
#8=IFCFACEBOUND(#6,.F.);
#9=IFCFACE((#7));
#10=IFCFACE((#8));
#11=IFCCLOSEDSHELL((#9,#10));
#12=IFCFACETEDBREP(#11);",
            12,
        )
        .unwrap();

        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.triangle_count(), 2);
        let (_, max) = mesh.bounds().unwrap();
        assert_relative_eq!(max.z, 1.0);
    }

    #[test]
    fn test_supported_types() {
        assert_eq!(
            ExtrudedAreaSolidProcessor::new().supported_types(),
            vec![IfcType::IfcExtrudedAreaSolid]
        );
        assert_eq!(FaceSetProcessor::new().supported_types().len(), 2);
    }
}
