/// STL mesh import (binary and ASCII)
///
/// Stored facet normals are ignored; triangle normals are recomputed from the
/// vertex winding.
use nom::{
    bytes::complete::{tag, take, take_till},
    character::complete::{multispace0, multispace1},
    multi::many0,
    number::complete::{float, le_f32, le_u32},
    sequence::{preceded, tuple},
    IResult,
};

use crate::error::StlError;
use crate::geometry::{Triangle, Vector};

const HEADER_SIZE: usize = 80;
const FACET_SIZE: usize = 50;

fn le_vector(input: &[u8]) -> IResult<&[u8], Vector> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, Vector::new(x, y, z)))
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], [Vector; 3]> {
    let (input, _normal) = le_vector(input)?;
    let (input, (a, b, c)) = tuple((le_vector, le_vector, le_vector))(input)?;
    // Attribute byte count
    let (input, _) = take(2usize)(input)?;
    Ok((input, [a, b, c]))
}

/// Parse a binary STL file.
pub fn parse_binary_stl(data: &[u8], color: Vector) -> Result<Vec<Triangle>, StlError> {
    if data.len() < HEADER_SIZE + 4 {
        return Err(StlError::TooSmall(data.len()));
    }

    let body = &data[HEADER_SIZE..];
    let (mut input, count) =
        le_u32::<_, nom::error::Error<&[u8]>>(body).map_err(|_| StlError::TooSmall(data.len()))?;
    let expected = count as usize;

    // Cap the reservation by what the data can actually hold
    let mut triangles = Vec::with_capacity(expected.min(input.len() / FACET_SIZE));
    for parsed in 0..expected {
        let (rest, [a, b, c]) =
            binary_facet(input).map_err(|_| StlError::Truncated { parsed, expected })?;
        triangles.push(Triangle::new(a, b, c, color));
        input = rest;
    }

    Ok(triangles)
}

/// Parse an ASCII STL file.
pub fn parse_ascii_stl(input: &str, color: Vector) -> Result<Vec<Triangle>, StlError> {
    match ascii_solid(input) {
        Ok((_, facets)) => Ok(facets
            .into_iter()
            .map(|[a, b, c]| Triangle::new(a, b, c, color))
            .collect()),
        Err(e) => Err(StlError::Ascii(e.to_string())),
    }
}

fn ascii_solid(input: &str) -> IResult<&str, Vec<[Vector; 3]>> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    // Optional solid name up to the end of the line
    let (input, _) = take_till(|c| c == '\n')(input)?;
    let (input, facets) = many0(ascii_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    Ok((input, facets))
}

fn ascii_facet(input: &str) -> IResult<&str, [Vector; 3]> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, _normal) = ascii_vector(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, a) = ascii_vertex(input)?;
    let (input, b) = ascii_vertex(input)?;
    let (input, c) = ascii_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;
    Ok((input, [a, b, c]))
}

fn ascii_vertex(input: &str) -> IResult<&str, Vector> {
    let (input, _) = preceded(multispace0, tag("vertex"))(input)?;
    ascii_vector(input)
}

fn ascii_vector(input: &str) -> IResult<&str, Vector> {
    let (input, x) = preceded(multispace0, float)(input)?;
    let (input, y) = preceded(multispace1, float)(input)?;
    let (input, z) = preceded(multispace1, float)(input)?;
    Ok((input, Vector::new(x, y, z)))
}

/// Detect the STL flavour and parse it.
pub fn parse_stl(data: &[u8], color: Vector) -> Result<Vec<Triangle>, StlError> {
    // Binary files may also start with "solid", so fall back on failure
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(triangles) = parse_ascii_stl(text, color) {
                return Ok(triangles);
            }
        }
    }

    parse_binary_stl(data, color)
}
