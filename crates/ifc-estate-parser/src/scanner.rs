// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fast entity scanner using SIMD-accelerated byte searching
//!
//! Finds instance boundaries and class keywords without decoding attributes,
//! and reads the HEADER section.

use crate::tokenizer::parse_record;
use ifc_estate_model::{AttributeValue, EntityId, IfcType, ModelMetadata, ParseError, Result};
use log::debug;
use memchr::{memchr, memchr2};
use rustc_hash::FxHashMap;

/// Entity index mapping ID to byte offsets
pub type EntityIndex = FxHashMap<u32, (usize, usize)>;

/// Type -> entity IDs, each list in file order
pub type TypeIndex = FxHashMap<IfcType, Vec<EntityId>>;

/// Schema families accepted by the pipeline
pub const SUPPORTED_SCHEMAS: [&str; 5] = ["IFC2X3", "IFC4", "IFC4X1", "IFC4X2", "IFC4X3"];

/// Result of one scanning pass
#[derive(Debug, Default)]
pub struct ScanIndex {
    pub offsets: EntityIndex,
    pub types: TypeIndex,
}

/// Fast entity scanner for IFC files
///
/// Uses memchr to jump between `#` marks and only inspects the bytes that
/// can start an instance definition.
pub struct EntityScanner<'a> {
    content: &'a str,
    pos: usize,
}

impl<'a> EntityScanner<'a> {
    /// Create a scanner positioned after the `DATA;` marker
    pub fn new(content: &'a str) -> Self {
        let pos = content.find("DATA;").map(|p| p + 5).unwrap_or(0);
        Self { content, pos }
    }

    /// Scan to find the next entity
    ///
    /// Returns (id, type_name, start_byte, end_byte)
    pub fn next_entity(&mut self) -> Option<(u32, &'a str, usize, usize)> {
        let bytes = self.content.as_bytes();

        while self.pos < bytes.len() {
            let hash_pos = memchr(b'#', &bytes[self.pos..])?;
            self.pos += hash_pos;

            // Definitions open a statement; references sit inside one
            let opens_statement = self.pos == 0
                || matches!(bytes[self.pos - 1], b'\n' | b'\r' | b';' | b' ' | b'\t');
            if !opens_statement {
                self.pos += 1;
                continue;
            }

            let start = self.pos;
            self.pos += 1;
            let id_start = self.pos;
            self.skip_while(|b| b.is_ascii_digit());
            if self.pos == id_start {
                continue;
            }
            let Ok(id) = self.content[id_start..self.pos].parse::<u32>() else {
                continue;
            };

            self.skip_while(|b| b == b' ' || b == b'\t');
            if bytes.get(self.pos) != Some(&b'=') {
                continue;
            }
            self.pos += 1;
            self.skip_while(|b| b.is_ascii_whitespace());

            let type_start = self.pos;
            self.skip_while(|b| b.is_ascii_alphanumeric() || b == b'_');
            if self.pos == type_start {
                continue;
            }
            let type_name = &self.content[type_start..self.pos];

            let end = self.find_statement_end()?;
            return Some((id, type_name, start, end));
        }

        None
    }

    fn skip_while(&mut self, pred: impl Fn(u8) -> bool) {
        let bytes = self.content.as_bytes();
        while self.pos < bytes.len() && pred(bytes[self.pos]) {
            self.pos += 1;
        }
    }

    /// Advance past the terminating semicolon, skipping quoted strings
    fn find_statement_end(&mut self) -> Option<usize> {
        let end = statement_end(self.content.as_bytes(), self.pos)?;
        self.pos = end;
        Some(end)
    }

    /// Offsets and type index in a single pass
    pub fn index(content: &'a str) -> ScanIndex {
        let mut scanner = Self::new(content);
        let mut index = ScanIndex::default();

        while let Some((id, type_name, start, end)) = scanner.next_entity() {
            index.offsets.insert(id, (start, end));
            index
                .types
                .entry(IfcType::parse(type_name))
                .or_default()
                .push(EntityId(id));
        }

        index
    }

    /// Count entities by upper-case type keyword
    pub fn count_by_type(content: &'a str) -> FxHashMap<String, usize> {
        let mut scanner = Self::new(content);
        let mut counts: FxHashMap<String, usize> = FxHashMap::default();

        while let Some((_, type_name, _, _)) = scanner.next_entity() {
            *counts.entry(type_name.to_ascii_uppercase()).or_insert(0) += 1;
        }

        counts
    }
}

/// Byte offset just past the `;` ending the statement that contains `from`
fn statement_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut pos = from;
    while pos < bytes.len() {
        let hit = memchr2(b'\'', b';', &bytes[pos..])?;
        pos += hit;
        if bytes[pos] == b';' {
            return Some(pos + 1);
        }
        // Skip the string body; a doubled quote stays inside it
        pos += 1;
        loop {
            let close = memchr(b'\'', &bytes[pos..])?;
            pos += close + 1;
            if bytes.get(pos) == Some(&b'\'') {
                pos += 1;
                continue;
            }
            break;
        }
    }
    None
}

/// Check the ISO-10303-21 envelope and return the declared schema
///
/// Fails with [`ParseError::InvalidFormat`] when the magic line is missing
/// and [`ParseError::UnsupportedSchema`] when the schema is not an IFC
/// release the pipeline reads.
pub fn validate(content: &str) -> Result<String> {
    if !content.trim_start().starts_with("ISO-10303-21") {
        return Err(ParseError::format("missing ISO-10303-21 magic line"));
    }
    let header = parse_header(content)?;
    let schema = header.schema_version.to_ascii_uppercase();
    if schema.is_empty() {
        return Err(ParseError::InvalidHeader("FILE_SCHEMA is empty".into()));
    }
    if SUPPORTED_SCHEMAS.iter().any(|s| schema.starts_with(s)) {
        Ok(header.schema_version)
    } else {
        Err(ParseError::UnsupportedSchema(header.schema_version))
    }
}

/// Read the HEADER section records
pub fn parse_header(content: &str) -> Result<ModelMetadata> {
    let start = content
        .find("HEADER;")
        .ok_or_else(|| ParseError::InvalidHeader("no HEADER section".into()))?
        + "HEADER;".len();
    let end = content[start..]
        .find("ENDSEC;")
        .map(|e| start + e)
        .ok_or_else(|| ParseError::InvalidHeader("unterminated HEADER section".into()))?;

    let bytes = content.as_bytes();
    let mut metadata = ModelMetadata::default();
    let mut pos = start;
    while pos < end {
        let Some(stop) = statement_end(bytes, pos) else {
            break;
        };
        if stop > end {
            break;
        }
        let statement = content[pos..stop - 1].trim();
        pos = stop;
        if statement.is_empty() {
            continue;
        }

        let (name, args) = match parse_record(statement) {
            Ok(record) => record,
            Err(e) => {
                debug!("skipping header record: {}", e);
                continue;
            }
        };
        match name.as_str() {
            "FILE_DESCRIPTION" => {
                metadata.file_description = first_text(args.first());
            }
            "FILE_NAME" => {
                metadata.file_name = text(args.first());
                metadata.timestamp = text(args.get(1));
                metadata.author = first_text(args.get(2));
                metadata.organization = first_text(args.get(3));
                metadata.preprocessor_version = text(args.get(4));
                metadata.originating_system = text(args.get(5));
            }
            "FILE_SCHEMA" => {
                metadata.schema_version = first_text(args.first()).unwrap_or_default();
            }
            _ => {}
        }
    }

    Ok(metadata)
}

fn text(value: Option<&AttributeValue>) -> Option<String> {
    value
        .and_then(|v| v.as_non_empty_string())
        .map(str::to_string)
}

fn first_text(value: Option<&AttributeValue>) -> Option<String> {
    value
        .and_then(|v| v.as_list())
        .and_then(|items| items.iter().find_map(|i| i.as_non_empty_string()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('test.ifc','2024-01-01T00:00:00',('Author'),('Org'),'Preprocessor','App','');
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCPROJECT('guid',$,'Project',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
#3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#4= IFCWALL('guid;with;semicolons',$,'O''Brien''s wall',$,$,#5,#6,$);
  #5=IFCWALL('guid5',$,$,$,$,$,$,$);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_scanner_finds_entities() {
        let mut scanner = EntityScanner::new(TEST_IFC);
        let mut entities = Vec::new();

        while let Some((id, type_name, _, _)) = scanner.next_entity() {
            entities.push((id, type_name.to_string()));
        }

        assert_eq!(entities.len(), 5);
        assert_eq!(entities[0], (1, "IFCPROJECT".to_string()));
        assert_eq!(entities[3], (4, "IFCWALL".to_string()));
        assert_eq!(entities[4], (5, "IFCWALL".to_string()));
    }

    #[test]
    fn test_statement_end_skips_strings() {
        let index = EntityScanner::index(TEST_IFC);
        let (start, end) = index.offsets[&4];
        let statement = &TEST_IFC[start..end];
        assert!(statement.starts_with("#4="));
        assert!(statement.ends_with("$);"));
    }

    #[test]
    fn test_index_groups_types_in_file_order() {
        let index = EntityScanner::index(TEST_IFC);
        assert_eq!(index.offsets.len(), 5);
        assert_eq!(
            index.types.get(&IfcType::IfcWall),
            Some(&vec![EntityId(4), EntityId(5)])
        );
    }

    #[test]
    fn test_count_by_type() {
        let counts = EntityScanner::count_by_type(TEST_IFC);
        assert_eq!(counts.get("IFCPROJECT"), Some(&1));
        assert_eq!(counts.get("IFCWALL"), Some(&2));
    }

    #[test]
    fn test_parse_header() {
        let info = parse_header(TEST_IFC).unwrap();
        assert_eq!(info.schema_version, "IFC2X3");
        assert_eq!(info.file_name.as_deref(), Some("test.ifc"));
        assert_eq!(info.author.as_deref(), Some("Author"));
        assert_eq!(info.originating_system.as_deref(), Some("App"));
        assert_eq!(
            info.file_description.as_deref(),
            Some("ViewDefinition [CoordinationView]")
        );
    }

    #[test]
    fn test_validate() {
        assert_eq!(validate(TEST_IFC).unwrap(), "IFC2X3");

        let ifc4 = TEST_IFC.replace("IFC2X3", "IFC4X3_ADD2");
        assert_eq!(validate(&ifc4).unwrap(), "IFC4X3_ADD2");

        let old = TEST_IFC.replace("IFC2X3", "IFC2X2_FINAL");
        assert!(matches!(validate(&old), Err(ParseError::UnsupportedSchema(_))));

        assert!(matches!(
            validate("hello world"),
            Err(ParseError::InvalidFormat(_))
        ));
    }
}
