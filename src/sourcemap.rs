//! Source Map v3 support.
//!
//! [`SourceMapBuilder`] collects mappings while code is generated and
//! encodes them into the `mappings` string with base64 VLQ deltas.
//! [`SourceMap::decode_mappings`] and [`SourceMap::original_position_for`]
//! read a map back, mostly so round trips can be tested.
//!
//! All lines and columns here are 0-indexed, as in the serialized format.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const VLQ_SHIFT: u32 = 5;
const VLQ_MASK: u64 = (1 << VLQ_SHIFT) - 1;
const VLQ_CONTINUATION: u64 = 1 << VLQ_SHIFT;

/// Error decoding a `mappings` string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceMapError {
    #[error("invalid base64 character '{0}' in mappings")]
    InvalidBase64(char),
    #[error("VLQ value ends in the middle of a number")]
    TruncatedVlq,
    #[error("segment with {0} fields, expected 1, 4 or 5")]
    InvalidSegment(usize),
    #[error("mapping position out of range")]
    OutOfRange,
}

/// Serialized Source Map v3 document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,
    pub names: Vec<String>,
    pub mappings: String,
}

/// One decoded mapping segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub generated_line: u32,
    pub generated_column: u32,
    pub source: u32,
    pub original_line: u32,
    pub original_column: u32,
    /// Index into [`SourceMap::names`].
    pub name: Option<u32>,
}

/// Original location found by [`SourceMap::original_position_for`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalPosition {
    pub source: String,
    pub line: u32,
    pub column: u32,
    pub name: Option<String>,
}

impl SourceMap {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn decode_mappings(&self) -> Result<Vec<Mapping>, SourceMapError> {
        decode_mappings(&self.mappings)
    }

    /// The original position of the closest mapping at or before
    /// `column` on generated `line`.
    pub fn original_position_for(
        &self,
        line: u32,
        column: u32,
    ) -> Result<Option<OriginalPosition>, SourceMapError> {
        let found = self
            .decode_mappings()?
            .into_iter()
            .filter(|m| m.generated_line == line && m.generated_column <= column)
            .max_by_key(|m| m.generated_column);

        Ok(found.map(|m| OriginalPosition {
            source: usize::try_from(m.source)
                .ok()
                .and_then(|i| self.sources.get(i))
                .cloned()
                .unwrap_or_default(),
            line: m.original_line,
            column: m.original_column,
            name: m
                .name
                .and_then(|n| usize::try_from(n).ok())
                .and_then(|i| self.names.get(i))
                .cloned(),
        }))
    }
}

/// Collects mappings for a single source file.
#[derive(Debug, Clone)]
pub struct SourceMapBuilder {
    file: Option<String>,
    source: String,
    source_content: Option<String>,
    names: Vec<String>,
    name_index: HashMap<String, u32>,
    mappings: Vec<Mapping>,
}

impl SourceMapBuilder {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            file: None,
            source: source.into(),
            source_content: None,
            names: Vec::new(),
            name_index: HashMap::new(),
            mappings: Vec::new(),
        }
    }

    /// Name of the generated file.
    #[must_use]
    pub fn file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Embed the original text as `sourcesContent`.
    #[must_use]
    pub fn source_content(mut self, content: impl Into<String>) -> Self {
        self.source_content = Some(content.into());
        self
    }

    /// Record that generated `(line, column)` comes from original
    /// `(line, column)`. Mappings must arrive in generated order; a second
    /// mapping at the same generated position is dropped, apart from
    /// filling in a name the first one lacked.
    pub fn add_mapping(
        &mut self,
        generated: (u32, u32),
        original: (u32, u32),
        name: Option<&str>,
    ) {
        let duplicate = self
            .mappings
            .last()
            .map(|m| ((m.generated_line, m.generated_column) == generated, m.name.is_none()));
        match (duplicate, name) {
            // first mapping wins, but a later one may supply the name
            (Some((true, true)), Some(name)) => {
                let index = self.intern(name);
                if let Some(last) = self.mappings.last_mut() {
                    last.name = Some(index);
                }
                return;
            }
            (Some((true, _)), _) => return,
            _ => {}
        }
        let name = name.map(|n| self.intern(n));
        self.mappings.push(Mapping {
            generated_line: generated.0,
            generated_column: generated.1,
            source: 0,
            original_line: original.0,
            original_column: original.1,
            name,
        });
    }

    fn intern(&mut self, name: &str) -> u32 {
        if let Some(&index) = self.name_index.get(name) {
            return index;
        }
        let index = u32::try_from(self.names.len()).unwrap_or(u32::MAX);
        self.names.push(name.to_string());
        self.name_index.insert(name.to_string(), index);
        index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    #[must_use]
    pub fn build(self) -> SourceMap {
        SourceMap {
            version: 3,
            file: self.file,
            sources: vec![self.source],
            sources_content: self.source_content.map(|c| vec![Some(c)]),
            names: self.names,
            mappings: encode_mappings(&self.mappings),
        }
    }
}

/// Encode mappings (sorted by generated position) into a `mappings` string.
#[must_use]
pub fn encode_mappings(mappings: &[Mapping]) -> String {
    let mut out = String::new();
    let mut line = 0;
    let mut first_in_line = true;
    let mut prev_column = 0i64;
    let mut prev_source = 0i64;
    let mut prev_original_line = 0i64;
    let mut prev_original_column = 0i64;
    let mut prev_name = 0i64;

    for m in mappings {
        while line < m.generated_line {
            out.push(';');
            line += 1;
            prev_column = 0;
            first_in_line = true;
        }
        if !first_in_line {
            out.push(',');
        }
        first_in_line = false;

        let column = i64::from(m.generated_column);
        let source = i64::from(m.source);
        let original_line = i64::from(m.original_line);
        let original_column = i64::from(m.original_column);

        encode_vlq(column - prev_column, &mut out);
        encode_vlq(source - prev_source, &mut out);
        encode_vlq(original_line - prev_original_line, &mut out);
        encode_vlq(original_column - prev_original_column, &mut out);
        if let Some(name) = m.name {
            let name = i64::from(name);
            encode_vlq(name - prev_name, &mut out);
            prev_name = name;
        }

        prev_column = column;
        prev_source = source;
        prev_original_line = original_line;
        prev_original_column = original_column;
    }
    out
}

/// Decode a `mappings` string back into absolute positions.
pub fn decode_mappings(mappings: &str) -> Result<Vec<Mapping>, SourceMapError> {
    let mut result = Vec::new();
    let mut source = 0i64;
    let mut original_line = 0i64;
    let mut original_column = 0i64;
    let mut name = 0i64;

    for (line, group) in mappings.split(';').enumerate() {
        let generated_line = u32::try_from(line).map_err(|_| SourceMapError::OutOfRange)?;
        let mut column = 0i64;
        for segment in group.split(',').filter(|s| !s.is_empty()) {
            let fields = decode_vlq(segment)?;
            match fields.len() {
                1 => {
                    column += fields[0];
                    continue;
                }
                4 | 5 => {}
                n => return Err(SourceMapError::InvalidSegment(n)),
            }
            column += fields[0];
            source += fields[1];
            original_line += fields[2];
            original_column += fields[3];
            let name_index = if let Some(delta) = fields.get(4) {
                name += delta;
                Some(to_u32(name)?)
            } else {
                None
            };
            result.push(Mapping {
                generated_line,
                generated_column: to_u32(column)?,
                source: to_u32(source)?,
                original_line: to_u32(original_line)?,
                original_column: to_u32(original_column)?,
                name: name_index,
            });
        }
    }
    Ok(result)
}

fn to_u32(value: i64) -> Result<u32, SourceMapError> {
    u32::try_from(value).map_err(|_| SourceMapError::OutOfRange)
}

/// Append the base64 VLQ encoding of `value`.
#[allow(clippy::cast_possible_truncation)]
pub fn encode_vlq(value: i64, out: &mut String) {
    let mut vlq = if value < 0 {
        (value.unsigned_abs() << 1) | 1
    } else {
        value.unsigned_abs() << 1
    };
    loop {
        let mut digit = vlq & VLQ_MASK;
        vlq >>= VLQ_SHIFT;
        if vlq > 0 {
            digit |= VLQ_CONTINUATION;
        }
        out.push(char::from(BASE64[digit as usize]));
        if vlq == 0 {
            break;
        }
    }
}

/// Decode every VLQ value in one segment.
pub fn decode_vlq(segment: &str) -> Result<Vec<i64>, SourceMapError> {
    let mut values = Vec::new();
    let mut value = 0u64;
    let mut shift = 0u32;
    let mut pending = false;

    for ch in segment.chars() {
        let index = BASE64
            .iter()
            .position(|&b| char::from(b) == ch)
            .ok_or(SourceMapError::InvalidBase64(ch))?;
        let digit = u64::try_from(index).map_err(|_| SourceMapError::OutOfRange)?;
        if shift >= 64 {
            return Err(SourceMapError::OutOfRange);
        }
        value |= (digit & VLQ_MASK) << shift;
        if digit & VLQ_CONTINUATION == 0 {
            let magnitude = i64::try_from(value >> 1).map_err(|_| SourceMapError::OutOfRange)?;
            values.push(if value & 1 == 1 { -magnitude } else { magnitude });
            value = 0;
            shift = 0;
            pending = false;
        } else {
            shift += VLQ_SHIFT;
            pending = true;
        }
    }

    if pending {
        return Err(SourceMapError::TruncatedVlq);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vlq(value: i64) -> String {
        let mut out = String::new();
        encode_vlq(value, &mut out);
        out
    }

    #[test]
    fn vlq_known_values() {
        assert_eq!(vlq(0), "A");
        assert_eq!(vlq(1), "C");
        assert_eq!(vlq(-1), "D");
        assert_eq!(vlq(15), "e");
        assert_eq!(vlq(16), "gB");
        assert_eq!(vlq(123), "2H");
        assert_eq!(vlq(-123), "3H");
    }

    #[test]
    fn vlq_decodes_multiple_values() {
        assert_eq!(decode_vlq("AACAgB").expect("decode"), vec![0, 0, 1, 0, 16]);
        assert_eq!(decode_vlq("3H").expect("decode"), vec![-123]);
    }

    #[test]
    fn vlq_rejects_bad_input() {
        assert_eq!(decode_vlq("A!"), Err(SourceMapError::InvalidBase64('!')));
        assert_eq!(decode_vlq("g"), Err(SourceMapError::TruncatedVlq));
    }

    #[test]
    fn builder_encodes_deltas() {
        let mut builder = SourceMapBuilder::new("input.fratm").file("input.js");
        builder.add_mapping((0, 0), (0, 0), None);
        builder.add_mapping((0, 6), (0, 8), Some("nome"));
        builder.add_mapping((1, 0), (1, 0), None);
        let map = builder.build();
        assert_eq!(map.version, 3);
        assert_eq!(map.sources, vec!["input.fratm".to_string()]);
        assert_eq!(map.names, vec!["nome".to_string()]);
        assert_eq!(map.mappings, "AAAA,MAAQA;AACR");
    }

    #[test]
    fn builder_skips_duplicate_positions() {
        let mut builder = SourceMapBuilder::new("a.fratm");
        builder.add_mapping((0, 0), (0, 0), None);
        builder.add_mapping((0, 0), (0, 4), Some("x"));
        assert_eq!(builder.len(), 1);
        let decoded = builder.build().decode_mappings().expect("decode");
        assert_eq!(decoded[0].original_column, 0);
        assert_eq!(decoded[0].name, Some(0));
    }

    #[test]
    fn names_are_interned() {
        let mut builder = SourceMapBuilder::new("a.fratm");
        builder.add_mapping((0, 0), (0, 0), Some("x"));
        builder.add_mapping((0, 4), (0, 4), Some("y"));
        builder.add_mapping((1, 0), (1, 0), Some("x"));
        let map = builder.build();
        assert_eq!(map.names, vec!["x".to_string(), "y".to_string()]);
        let decoded = map.decode_mappings().expect("decode");
        assert_eq!(decoded[2].name, Some(0));
    }

    #[test]
    fn decode_round_trip() {
        let mut builder = SourceMapBuilder::new("a.fratm");
        builder.add_mapping((0, 2), (3, 4), Some("f"));
        builder.add_mapping((0, 9), (3, 1), None);
        builder.add_mapping((4, 1), (0, 0), Some("g"));
        let map = builder.build();
        let decoded = map.decode_mappings().expect("decode");
        assert_eq!(decoded.len(), 3);
        assert_eq!(
            (decoded[1].generated_line, decoded[1].generated_column),
            (0, 9)
        );
        assert_eq!((decoded[1].original_line, decoded[1].original_column), (3, 1));
        assert_eq!(decoded[2].generated_line, 4);
        assert_eq!(decoded[2].name, Some(1));
    }

    #[test]
    fn position_lookup_uses_closest_preceding_mapping() {
        let mut builder = SourceMapBuilder::new("a.fratm");
        builder.add_mapping((0, 0), (0, 0), None);
        builder.add_mapping((0, 6), (0, 9), Some("nome"));
        let map = builder.build();
        let pos = map
            .original_position_for(0, 8)
            .expect("decode")
            .expect("mapped");
        assert_eq!(pos.column, 9);
        assert_eq!(pos.name.as_deref(), Some("nome"));
        assert_eq!(pos.source, "a.fratm");
        assert!(map.original_position_for(3, 0).expect("decode").is_none());
    }

    #[test]
    fn json_shape() {
        let map = SourceMapBuilder::new("a.fratm")
            .file("a.js")
            .source_content("tien x = 1")
            .build();
        let json = map.to_json().expect("serialize");
        assert!(json.contains("\"sourcesContent\":[\"tien x = 1\"]"));
        assert!(json.contains("\"version\":3"));
        let back = SourceMap::from_json(&json).expect("parse");
        assert_eq!(back, map);

        let bare = SourceMapBuilder::new("a.fratm").build();
        let json = bare.to_json().expect("serialize");
        assert!(!json.contains("sourcesContent"));
        assert!(!json.contains("\"file\""));
    }
}
