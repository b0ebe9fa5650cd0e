// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP tokenizer using nom combinators
//!
//! Parses instance definitions (`#12=IFCWALL(...);`) and header records
//! (`FILE_NAME(...);`) into [`AttributeValue`]s.

use ifc_estate_model::{AttributeValue, DecodedEntity, EntityId, IfcType, ParseError, Result};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while, take_while1},
    character::complete::{char, multispace1},
    combinator::{map, map_res, opt, recognize, value},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded},
    IResult, Parser,
};
use std::borrow::Cow;

/// Raw token borrowed from the source text
#[derive(Clone, Debug, PartialEq)]
pub enum Token<'a> {
    /// Entity reference (#123)
    EntityRef(u32),
    /// String body as written, escapes not yet decoded
    String(&'a str),
    Integer(i64),
    Float(f64),
    /// Enumeration (.VALUE.)
    Enum(&'a str),
    List(Vec<Token<'a>>),
    /// Typed value like IFCLABEL('text')
    TypedValue(&'a str, Vec<Token<'a>>),
    /// Null value ($)
    Null,
    /// Derived value (*)
    Derived,
}

impl Token<'_> {
    /// Convert token to owned AttributeValue, decoding string escapes
    pub fn to_attribute_value(&self) -> AttributeValue {
        match self {
            Token::EntityRef(id) => AttributeValue::EntityRef(EntityId(*id)),
            Token::String(s) => AttributeValue::String(decode_string(s).into_owned()),
            Token::Integer(i) => AttributeValue::Integer(*i),
            Token::Float(f) => AttributeValue::Float(*f),
            Token::Enum(s) => AttributeValue::Enum((*s).to_string()),
            Token::List(items) => {
                AttributeValue::List(items.iter().map(Token::to_attribute_value).collect())
            }
            Token::TypedValue(name, args) => AttributeValue::TypedValue(
                (*name).to_ascii_uppercase(),
                args.iter().map(Token::to_attribute_value).collect(),
            ),
            Token::Null => AttributeValue::Null,
            Token::Derived => AttributeValue::Derived,
        }
    }
}

/// Decode the escapes of a STEP string body
///
/// Handles doubled apostrophes, `\\`, `\S\c` (upper half of ISO 8859-1),
/// `\X\hh` (ISO 8859-1 code point) and `\X2\hhhh...\X0\` (UTF-16). Unknown
/// directives such as `\P?\` are dropped.
pub fn decode_string(raw: &str) -> Cow<'_, str> {
    if !raw.contains('\'') && !raw.contains('\\') {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(c) = rest.chars().next() {
        if c == '\'' && rest.starts_with("''") {
            out.push('\'');
            rest = &rest[2..];
        } else if c == '\\' {
            rest = decode_directive(rest, &mut out);
        } else {
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }
    Cow::Owned(out)
}

fn decode_directive<'a>(rest: &'a str, out: &mut String) -> &'a str {
    if let Some(tail) = rest.strip_prefix("\\\\") {
        out.push('\\');
        return tail;
    }
    if let Some(tail) = rest.strip_prefix("\\S\\") {
        if let Some(c) = tail.chars().next() {
            if let Some(shifted) = char::from_u32(c as u32 + 0x80) {
                out.push(shifted);
            }
            return &tail[c.len_utf8()..];
        }
        return tail;
    }
    if let Some(tail) = rest.strip_prefix("\\X2\\") {
        let (hex, tail) = match tail.find("\\X0\\") {
            Some(end) => (&tail[..end], &tail[end + 4..]),
            None => (tail, ""),
        };
        let units: Vec<u16> = hex
            .as_bytes()
            .chunks(4)
            .filter_map(|chunk| std::str::from_utf8(chunk).ok())
            .filter_map(|chunk| u16::from_str_radix(chunk, 16).ok())
            .collect();
        out.extend(char::decode_utf16(units).filter_map(|c| c.ok()));
        return tail;
    }
    if let Some(tail) = rest.strip_prefix("\\X\\") {
        if let Some(code) = tail.get(..2).and_then(|h| u8::from_str_radix(h, 16).ok()) {
            out.push(char::from(code));
            return &tail[2..];
        }
        return tail;
    }
    if let Some(tail) = rest.strip_prefix("\\P") {
        // Code page switch, e.g. \PA\
        return tail.get(2..).unwrap_or("");
    }
    out.push('\\');
    &rest[1..]
}

// ============================================================================
// Parsing Primitives
// ============================================================================

/// Skip whitespace and `/* ... */` comments
fn ws(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many0(alt((
            value((), multispace1),
            value((), (tag("/*"), take_until("*/"), tag("*/"))),
        ))),
    )
    .parse(input)
}

/// Parse an entity reference (#123)
fn entity_ref(input: &str) -> IResult<&str, Token<'_>> {
    map_res(
        preceded(char('#'), take_while1(|c: char| c.is_ascii_digit())),
        |digits: &str| digits.parse::<u32>().map(Token::EntityRef),
    )
    .parse(input)
}

/// Parse a STEP string ('text' with '' for escaped quotes)
fn step_string(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('\'')(input)?;

    let bytes = input.as_bytes();
    let mut end = 0;
    while end < bytes.len() {
        if bytes[end] == b'\'' {
            if bytes.get(end + 1) == Some(&b'\'') {
                end += 2;
                continue;
            }
            return Ok((&input[end + 1..], Token::String(&input[..end])));
        }
        end += 1;
    }

    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

/// Parse a number (integer or real, STEP reals may end in a bare `.`)
fn number(input: &str) -> IResult<&str, Token<'_>> {
    let (input, num_str) = recognize((
        opt(alt((char('-'), char('+')))),
        take_while1(|c: char| c.is_ascii_digit()),
        opt(pair(char('.'), take_while(|c: char| c.is_ascii_digit()))),
        opt((
            alt((char('e'), char('E'))),
            opt(alt((char('+'), char('-')))),
            take_while1(|c: char| c.is_ascii_digit()),
        )),
    ))
    .parse(input)?;

    let bytes = num_str.trim_start_matches('+').as_bytes();
    let token = if num_str.contains(['.', 'e', 'E']) {
        lexical_core::parse::<f64>(bytes).map(Token::Float)
    } else {
        lexical_core::parse::<i64>(bytes).map(Token::Integer)
    };

    token.map(|t| (input, t)).map_err(|_| {
        nom::Err::Error(nom::error::Error::new(
            num_str,
            nom::error::ErrorKind::Float,
        ))
    })
}

/// Parse an enumeration (.VALUE.)
fn enumeration(input: &str) -> IResult<&str, Token<'_>> {
    map(
        delimited(
            char('.'),
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            char('.'),
        ),
        Token::Enum,
    )
    .parse(input)
}

/// Parse null ($)
fn null_value(input: &str) -> IResult<&str, Token<'_>> {
    value(Token::Null, char('$')).parse(input)
}

/// Parse derived (*)
fn derived_value(input: &str) -> IResult<&str, Token<'_>> {
    value(Token::Derived, char('*')).parse(input)
}

/// Parenthesized, comma-separated tokens
fn arguments(input: &str) -> IResult<&str, Vec<Token<'_>>> {
    delimited(
        pair(char('('), ws),
        separated_list0((ws, char(','), ws), token),
        pair(ws, char(')')),
    )
    .parse(input)
}

fn keyword(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_').parse(input)
}

/// Parse a list of tokens
fn list(input: &str) -> IResult<&str, Token<'_>> {
    map(arguments, Token::List).parse(input)
}

/// Parse a typed value like IFCLABEL('text')
fn typed_value(input: &str) -> IResult<&str, Token<'_>> {
    map((keyword, ws, arguments), |(name, _, args)| {
        Token::TypedValue(name, args)
    })
    .parse(input)
}

/// Parse any token
fn token(input: &str) -> IResult<&str, Token<'_>> {
    alt((
        entity_ref,
        step_string,
        null_value,
        derived_value,
        enumeration,
        number,
        list,
        typed_value,
    ))
    .parse(input)
}

/// `#id = KEYWORD (` prefix of an instance definition
fn instance_head(input: &str) -> IResult<&str, (u32, &str)> {
    let (input, _) = ws(input)?;
    let (input, id) = map_res(
        preceded(char('#'), take_while1(|c: char| c.is_ascii_digit())),
        |digits: &str| digits.parse::<u32>(),
    )
    .parse(input)?;
    let (input, _) = (ws, char('='), ws).parse(input)?;
    let (input, name) = keyword(input)?;
    let (input, _) = ws(input)?;
    Ok((input, (id, name)))
}

// ============================================================================
// Entity Parsing
// ============================================================================

/// Parse a complete instance definition
///
/// Format: `#123=IFCWALL(attr1,attr2,...);`
pub fn parse_entity(input: &str) -> Result<DecodedEntity> {
    let (rest, (id, type_name)) = instance_head(input)
        .map_err(|e| ParseError::entity_parse(EntityId(0), format!("bad instance head: {e}")))?;

    let (_, tokens) = arguments(rest).map_err(|e| {
        ParseError::entity_parse(EntityId(id), format!("bad attribute list: {e}"))
    })?;

    Ok(DecodedEntity {
        id: EntityId(id),
        ifc_type: IfcType::parse(type_name),
        attributes: tokens.iter().map(Token::to_attribute_value).collect(),
    })
}

/// Parse the instance stored at the given byte range
pub fn parse_entity_at(content: &str, start: usize, end: usize) -> Result<DecodedEntity> {
    let slice = content
        .get(start..end)
        .ok_or_else(|| ParseError::format(format!("byte range {start}..{end} out of bounds")))?;
    parse_entity(slice)
}

/// Parse a header record such as `FILE_SCHEMA(('IFC4'))`
///
/// Returns the record keyword and its decoded arguments.
pub fn parse_record(input: &str) -> Result<(String, Vec<AttributeValue>)> {
    let (_, (_, name, _, tokens)) = (ws, keyword, ws, arguments)
        .parse(input)
        .map_err(|e| ParseError::InvalidHeader(format!("bad header record: {e}")))?;
    Ok((
        name.to_ascii_uppercase(),
        tokens.iter().map(Token::to_attribute_value).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_entity_ref() {
        let (remaining, token) = entity_ref("#123").unwrap();
        assert_eq!(remaining, "");
        assert_eq!(token, Token::EntityRef(123));
    }

    #[test]
    fn test_parse_string_keeps_raw_body() {
        let (remaining, token) = step_string("'it''s a test',").unwrap();
        assert_eq!(remaining, ",");
        assert_eq!(token, Token::String("it''s a test"));
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        assert!(step_string("'never closed").is_err());
    }

    #[test]
    fn test_decode_escapes() {
        assert_eq!(decode_string("it''s"), "it's");
        assert_eq!(decode_string("plain"), "plain");
        assert_eq!(decode_string("Stra\\X\\DFe"), "Straße");
        assert_eq!(decode_string("\\X2\\00FC\\X0\\ber"), "über");
        assert_eq!(decode_string("\\S\\d"), "ä");
        assert_eq!(decode_string("a\\\\b"), "a\\b");
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(number("42").unwrap().1, Token::Integer(42));
        assert_eq!(number("-7").unwrap().1, Token::Integer(-7));

        let Token::Float(f) = number("1.5E-3").unwrap().1 else {
            panic!("expected float");
        };
        assert_relative_eq!(f, 0.0015);

        // STEP reals are often written with a trailing dot
        let (rest, token) = number("3.,").unwrap();
        assert_eq!(rest, ",");
        assert_eq!(token, Token::Float(3.0));
    }

    #[test]
    fn test_parse_enum() {
        let (remaining, token) = enumeration(".TRUE.").unwrap();
        assert_eq!(remaining, "");
        assert_eq!(token, Token::Enum("TRUE"));
    }

    #[test]
    fn test_parse_nested_list() {
        let (remaining, token) = list("((0.,0.),(1.,0.) , (1.,1.))").unwrap();
        assert_eq!(remaining, "");
        let Token::List(items) = token else {
            panic!("expected list");
        };
        assert_eq!(items.len(), 3);
        assert!(matches!(&items[2], Token::List(p) if p.len() == 2));
    }

    #[test]
    fn test_parse_entity_with_typed_values() {
        let entity = parse_entity(
            "#7= IFCPROPERTYSINGLEVALUE('IsExternal',$,IFCBOOLEAN(.T.),$);",
        )
        .unwrap();
        assert_eq!(entity.id, EntityId(7));
        assert_eq!(entity.ifc_type, IfcType::IfcPropertySingleValue);
        assert_eq!(
            entity.attributes[2],
            AttributeValue::TypedValue("IFCBOOLEAN".into(), vec![AttributeValue::Enum("T".into())])
        );
    }

    #[test]
    fn test_parse_entity_with_comment() {
        let entity = parse_entity("#1=IFCWALL('abc', /* owner */ $, #2);").unwrap();
        assert_eq!(entity.ifc_type, IfcType::IfcWall);
        assert_eq!(entity.attributes.len(), 3);
        assert_eq!(entity.get_ref(2), Some(EntityId(2)));
    }

    #[test]
    fn test_parse_entity_errors_carry_id() {
        let err = parse_entity("#9=IFCWALL('abc',").unwrap_err();
        assert!(matches!(err, ParseError::EntityParse(EntityId(9), _)));
        assert!(parse_entity("IFCWALL();").is_err());
    }

    #[test]
    fn test_parse_header_record() {
        let (name, args) = parse_record("FILE_SCHEMA(('IFC4'))").unwrap();
        assert_eq!(name, "FILE_SCHEMA");
        assert_eq!(
            args[0],
            AttributeValue::List(vec![AttributeValue::String("IFC4".into())])
        );
    }
}
