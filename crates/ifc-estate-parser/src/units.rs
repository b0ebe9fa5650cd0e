// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Length unit scale extraction

use ifc_estate_model::{
    AttributeValue, DecodedEntity, EntityResolver, EntityResolverExt, IfcType, ProjectRecord,
};
use log::debug;

/// Factor converting the project's length unit to metres
///
/// Reads `IfcProject.UnitsInContext` and returns 1.0 when no length unit
/// is declared.
pub fn extract_unit_scale(resolver: &dyn EntityResolver) -> f64 {
    let Some(project) = resolver
        .entities_by_type(&IfcType::IfcProject)
        .into_iter()
        .find_map(ProjectRecord::from_entity)
    else {
        return 1.0;
    };
    let Some(assignment) = project.units().and_then(|id| resolver.get(id)) else {
        return 1.0;
    };

    let scale = resolver
        .follow_list(&assignment, 0)
        .iter()
        .find_map(|unit| length_unit_scale(unit, resolver, 0));

    match scale {
        Some(scale) if scale.is_finite() && scale > 0.0 => scale,
        Some(scale) => {
            debug!("ignoring unusable length unit scale {}", scale);
            1.0
        }
        None => 1.0,
    }
}

/// Scale of an IFCSIUNIT or IFCCONVERSIONBASEDUNIT, if it measures length
fn length_unit_scale(unit: &DecodedEntity, resolver: &dyn EntityResolver, depth: u8) -> Option<f64> {
    // Conversion chains are one or two links deep in practice
    if depth > 4 {
        return None;
    }
    // UnitType at index 1 for both kinds
    if unit.get_enum(1) != Some("LENGTHUNIT") {
        return None;
    }
    match unit.ifc_type {
        IfcType::IfcSIUnit => si_unit_scale(unit),
        IfcType::IfcConversionBasedUnit => {
            // ConversionFactor at index 3 is an IFCMEASUREWITHUNIT
            let factor = resolver.follow(unit, 3)?;
            if factor.ifc_type != IfcType::IfcMeasureWithUnit {
                return None;
            }
            let value = measure_value(factor.get(0)?)?;
            let base = resolver
                .follow(&factor, 1)
                .and_then(|base| length_unit_scale(&base, resolver, depth + 1))
                .unwrap_or(1.0);
            Some(value * base)
        }
        _ => None,
    }
}

/// IFCSIUNIT(*, UnitType, Prefix, Name)
fn si_unit_scale(unit: &DecodedEntity) -> Option<f64> {
    if unit.get_enum(3)? != "METRE" {
        return None;
    }
    Some(unit.get_enum(2).map(si_prefix).unwrap_or(1.0))
}

fn si_prefix(prefix: &str) -> f64 {
    match prefix {
        "EXA" => 1e18,
        "PETA" => 1e15,
        "TERA" => 1e12,
        "GIGA" => 1e9,
        "MEGA" => 1e6,
        "KILO" => 1e3,
        "HECTO" => 1e2,
        "DECA" => 1e1,
        "DECI" => 1e-1,
        "CENTI" => 1e-2,
        "MILLI" => 1e-3,
        "MICRO" => 1e-6,
        "NANO" => 1e-9,
        "PICO" => 1e-12,
        "FEMTO" => 1e-15,
        "ATTO" => 1e-18,
        _ => 1.0,
    }
}

fn measure_value(attr: &AttributeValue) -> Option<f64> {
    match attr {
        AttributeValue::TypedValue(_, args) => args.first().and_then(measure_value),
        other => other.as_float(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolverImpl;
    use crate::scanner::EntityScanner;
    use approx::assert_relative_eq;

    fn scale_of(data: &str) -> f64 {
        let content = format!(
            "ISO-10303-21;\nHEADER;\nFILE_SCHEMA(('IFC4'));\nENDSEC;\nDATA;\n{}\nENDSEC;\nEND-ISO-10303-21;\n",
            data
        );
        let resolver = ResolverImpl::new(content.clone(), EntityScanner::index(&content));
        extract_unit_scale(&resolver)
    }

    #[test]
    fn test_millimetre() {
        let scale = scale_of(
            "#1=IFCPROJECT('p',$,'P',$,$,$,$,$,#2);\n\
             #2=IFCUNITASSIGNMENT((#4,#3));\n\
             #3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);\n\
             #4=IFCSIUNIT(*,.AREAUNIT.,$,.SQUARE_METRE.);",
        );
        assert_relative_eq!(scale, 0.001);
    }

    #[test]
    fn test_plain_metre() {
        let scale = scale_of(
            "#1=IFCPROJECT('p',$,'P',$,$,$,$,$,#2);\n\
             #2=IFCUNITASSIGNMENT((#3));\n\
             #3=IFCSIUNIT(*,.LENGTHUNIT.,$,.METRE.);",
        );
        assert_relative_eq!(scale, 1.0);
    }

    #[test]
    fn test_foot_conversion() {
        let scale = scale_of(
            "#1=IFCPROJECT('p',$,'P',$,$,$,$,$,#2);\n\
             #2=IFCUNITASSIGNMENT((#5));\n\
             #3=IFCSIUNIT(*,.LENGTHUNIT.,$,.METRE.);\n\
             #4=IFCMEASUREWITHUNIT(IFCLENGTHMEASURE(0.3048),#3);\n\
             #5=IFCCONVERSIONBASEDUNIT(#6,.LENGTHUNIT.,'FOOT',#4);\n\
             #6=IFCDIMENSIONALEXPONENTS(1,0,0,0,0,0,0);",
        );
        assert_relative_eq!(scale, 0.3048);
    }

    #[test]
    fn test_missing_units_default_to_metres() {
        assert_relative_eq!(scale_of("#1=IFCPROJECT('p',$,'P',$,$,$,$,$,$);"), 1.0);
        assert_relative_eq!(scale_of("#1=IFCWALL('w',$,$,$,$,$,$,$);"), 1.0);
    }
}
