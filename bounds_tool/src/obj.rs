//! Minimal OBJ reader producing collision geometry
//!
//! Only positions and faces matter for bounds. Each `o` or `g` statement
//! starts a new mesh part; faces with more than three corners are fan
//! triangulated.

use std::fs;
use std::path::Path;

use structure_bounds::collision::{MeshGeometry, MeshPart};
use structure_bounds::foundation::math::Vec3;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ObjError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Read an OBJ file from disk
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<MeshGeometry, ObjError> {
    let contents = fs::read_to_string(path)?;
    parse_obj(&contents)
}

/// Parse OBJ text
pub fn parse_obj(contents: &str) -> Result<MeshGeometry, ObjError> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut part_indices: Vec<Vec<u32>> = vec![Vec::new()];

    for (number, raw) in contents.lines().enumerate() {
        let line = number + 1;
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = raw.split_whitespace().collect();
        match parts[0] {
            "v" => {
                if parts.len() < 4 {
                    return Err(ObjError::ParseError { line, message: "vertex needs x y z".to_string() });
                }
                let mut xyz = [0.0f32; 3];
                for (slot, text) in xyz.iter_mut().zip(&parts[1..4]) {
                    *slot = text.parse().map_err(|_| ObjError::ParseError {
                        line,
                        message: format!("invalid coordinate '{}'", text),
                    })?;
                }
                positions.push(Vec3::new(xyz[0], xyz[1], xyz[2]));
            }
            "o" | "g" => {
                if part_indices.last().is_some_and(|p| !p.is_empty()) {
                    part_indices.push(Vec::new());
                }
            }
            "f" => {
                if parts.len() < 4 {
                    return Err(ObjError::ParseError { line, message: "face needs three corners".to_string() });
                }
                let corners = parts[1..]
                    .iter()
                    .map(|corner| resolve_corner(corner, positions.len(), line))
                    .collect::<Result<Vec<u32>, ObjError>>()?;

                if let Some(indices) = part_indices.last_mut() {
                    for i in 1..corners.len() - 1 {
                        indices.extend_from_slice(&[corners[0], corners[i], corners[i + 1]]);
                    }
                }
            }
            _ => {
                // Normals, texture coordinates and materials carry no collision data
            }
        }
    }

    if positions.is_empty() {
        return Err(ObjError::InvalidFormat("No vertices found in OBJ file".to_string()));
    }

    let parts = part_indices
        .iter()
        .filter(|indices| !indices.is_empty())
        .map(|indices| MeshPart::from_vertices(&positions, indices))
        .collect();
    Ok(MeshGeometry { parts })
}

/// Position index of a face corner such as `7`, `7/2` or `-1//3`, zero-based
fn resolve_corner(corner: &str, vertex_count: usize, line: usize) -> Result<u32, ObjError> {
    let position = corner.split('/').next().unwrap_or_default();
    let index: i64 = position.parse().map_err(|_| ObjError::ParseError {
        line,
        message: format!("invalid face corner '{}'", corner),
    })?;

    // Positive indices are 1-based, negative ones count back from the latest vertex
    let resolved = if index > 0 {
        index - 1
    } else {
        vertex_count as i64 + index
    };
    if index == 0 || resolved < 0 || resolved >= vertex_count as i64 {
        return Err(ObjError::ParseError {
            line,
            message: format!("face corner '{}' refers to a missing vertex", corner),
        });
    }
    u32::try_from(resolved).map_err(|_| ObjError::InvalidFormat("too many vertices".to_string()))
}
