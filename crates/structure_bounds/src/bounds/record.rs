//! Text records for saving bounds with a model's settings
//!
//! One line per bound, fields separated by `|`:
//!
//! ```text
//! LargerBound|<x> <y> <z>|<radius>|<i> <j> ...
//! SmallerBound|<x> <y> <z>|<radius>
//! ```
//!
//! Coarse (`LargerBound`) lines come first, then fine (`SmallerBound`) lines.
//! Centers are object space. References are positional indices into the fine
//! lines. Lines with any other tag belong to other settings and are skipped.

use thiserror::Error;

use crate::error::BoundsError;
use crate::foundation::math::Vec3;

use super::bound_set::BoundSet;
use super::sphere::StructureSphere;

/// Tag of a coarse bound line
pub const COARSE_TAG: &str = "LargerBound";

/// Tag of a fine bound line
pub const FINE_TAG: &str = "SmallerBound";

/// Errors reading bound records
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    /// Wrong number of fields for the tag
    #[error("Line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        /// 1-based line number
        line: usize,
        /// Fields the tag needs
        expected: &'static str,
        /// Fields present
        found: usize,
    },

    /// A field that should be numeric is not
    #[error("Line {line}: invalid {field} '{value}'")]
    InvalidNumber {
        /// 1-based line number
        line: usize,
        /// Which field
        field: &'static str,
        /// The offending text
        value: String,
    },

    /// A coarse line referencing a fine bound that does not exist
    #[error("Line {line}: reference {reference} is outside the {fine_len} fine bounds")]
    ReferenceOutOfRange {
        /// 1-based line number
        line: usize,
        /// The bad reference
        reference: usize,
        /// Number of fine lines read
        fine_len: usize,
    },

    /// The records could not be assembled into a set
    #[error(transparent)]
    Bounds(#[from] BoundsError),
}

/// Write a set as record lines, joined with newlines
pub fn to_records(set: &BoundSet) -> String {
    let mut lines = Vec::with_capacity(set.coarse_len() + set.fine_len());

    for (index, sphere) in set.coarse_spheres().enumerate() {
        let mut line = format_sphere(COARSE_TAG, sphere);
        let references = set.coarse_references(index).unwrap_or_default();
        if !references.is_empty() {
            let joined: Vec<String> = references.iter().map(usize::to_string).collect();
            line.push('|');
            line.push_str(&joined.join(" "));
        }
        lines.push(line);
    }
    for sphere in set.fine_spheres() {
        lines.push(format_sphere(FINE_TAG, sphere));
    }

    lines.join("\n")
}

fn format_sphere(tag: &str, sphere: &StructureSphere) -> String {
    let c = sphere.center_local;
    format!("{}|{} {} {}|{}", tag, c.x, c.y, c.z, sphere.radius)
}

/// Read bound records back into an object-space set
pub fn parse_records(text: &str) -> Result<BoundSet, RecordError> {
    let mut coarse: Vec<(usize, StructureSphere, Vec<usize>)> = Vec::new();
    let mut fine: Vec<StructureSphere> = Vec::new();

    for (number, raw) in text.lines().enumerate() {
        let line = number + 1;
        let fields: Vec<&str> = raw.trim().split('|').collect();

        match fields[0] {
            COARSE_TAG => {
                if !(3..=4).contains(&fields.len()) {
                    return Err(RecordError::FieldCount { line, expected: "3 or 4", found: fields.len() });
                }
                let sphere = parse_sphere(line, fields[1], fields[2])?;
                let references = match fields.get(3) {
                    Some(list) => parse_references(line, list)?,
                    None => Vec::new(),
                };
                coarse.push((line, sphere, references));
            }
            FINE_TAG => {
                if fields.len() != 3 {
                    return Err(RecordError::FieldCount { line, expected: "3", found: fields.len() });
                }
                fine.push(parse_sphere(line, fields[1], fields[2])?);
            }
            _ => continue,
        }
    }

    let fine_len = fine.len();
    for (line, _, references) in &coarse {
        if let Some(&reference) = references.iter().find(|&&r| r >= fine_len) {
            return Err(RecordError::ReferenceOutOfRange { line: *line, reference, fine_len });
        }
    }

    let coarse = coarse.into_iter().map(|(_, sphere, refs)| (sphere, refs)).collect();
    Ok(BoundSet::from_parts(fine, coarse)?)
}

fn parse_sphere(line: usize, center: &str, radius: &str) -> Result<StructureSphere, RecordError> {
    let coords: Vec<&str> = center.split_whitespace().collect();
    if coords.len() != 3 {
        return Err(RecordError::InvalidNumber { line, field: "center", value: center.to_string() });
    }
    let mut parsed = [0.0f32; 3];
    for (slot, text) in parsed.iter_mut().zip(&coords) {
        *slot = parse_float(line, "center", text)?;
    }
    let radius = parse_float(line, "radius", radius)?;
    if radius < 0.0 {
        return Err(RecordError::InvalidNumber { line, field: "radius", value: radius.to_string() });
    }
    Ok(StructureSphere::new(Vec3::new(parsed[0], parsed[1], parsed[2]), radius))
}

fn parse_float(line: usize, field: &'static str, text: &str) -> Result<f32, RecordError> {
    text.trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RecordError::InvalidNumber { line, field, value: text.to_string() })
}

fn parse_references(line: usize, list: &str) -> Result<Vec<usize>, RecordError> {
    list.split_whitespace()
        .map(|item| {
            item.parse::<usize>().map_err(|_| RecordError::InvalidNumber {
                line,
                field: "reference",
                value: item.to_string(),
            })
        })
        .collect()
}
