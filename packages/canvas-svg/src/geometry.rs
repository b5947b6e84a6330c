//! Parsing of the presentation attributes that affect geometry.

use kurbo::Affine;

use crate::ParseError;

/// A length as written in an attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Px(f64),
    Em(f64),
}

impl Length {
    pub fn to_px(self, font_size: f64) -> f64 {
        match self {
            Length::Px(v) => v,
            Length::Em(v) => v * font_size,
        }
    }
}

pub fn parse_length(raw: &str) -> Result<Length, ParseError> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| c.is_ascii_alphabetic() || c == '%')
        .unwrap_or(raw.len());
    let (number, unit) = raw.split_at(split);
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidLength(raw.to_string()))?;

    match unit {
        "" | "px" => Ok(Length::Px(value)),
        "em" => Ok(Length::Em(value)),
        _ => Err(ParseError::UnsupportedUnit(raw.to_string())),
    }
}

/// Parse an SVG `transform` attribute into an affine matrix.
///
/// Supports `translate`, `scale`, `rotate` (about the origin) and `matrix`.
pub fn parse_transform(raw: &str) -> Result<Affine, ParseError> {
    let mut transform = Affine::IDENTITY;
    let mut rest = raw.trim();

    while !rest.is_empty() {
        let open = rest
            .find('(')
            .ok_or_else(|| ParseError::InvalidTransform(raw.to_string()))?;
        let close = rest
            .find(')')
            .ok_or_else(|| ParseError::InvalidTransform(raw.to_string()))?;
        if close < open {
            return Err(ParseError::InvalidTransform(raw.to_string()));
        }

        let name = rest[..open].trim().trim_start_matches(',').trim();
        let args = rest[open + 1..close]
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|arg| !arg.is_empty())
            .map(|arg| {
                arg.parse::<f64>()
                    .map_err(|_| ParseError::InvalidTransform(raw.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let arity = |expected: &'static str| ParseError::TransformArity {
            name: name.to_string(),
            expected,
            got: args.len(),
        };

        let step = match (name, args.as_slice()) {
            ("translate", [tx]) => Affine::translate((*tx, 0.0)),
            ("translate", [tx, ty]) => Affine::translate((*tx, *ty)),
            ("translate", _) => return Err(arity("1 or 2")),
            ("scale", [s]) => Affine::scale(*s),
            ("scale", [sx, sy]) => Affine::scale_non_uniform(*sx, *sy),
            ("scale", _) => return Err(arity("1 or 2")),
            ("rotate", [deg]) => Affine::rotate(deg.to_radians()),
            ("rotate", _) => return Err(arity("1")),
            ("matrix", [a, b, c, d, e, f]) => Affine::new([*a, *b, *c, *d, *e, *f]),
            ("matrix", _) => return Err(arity("6")),
            _ => return Err(ParseError::InvalidTransform(raw.to_string())),
        };

        transform *= step;
        rest = rest[close + 1..].trim();
    }

    Ok(transform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn lengths() {
        assert_eq!(parse_length("12"), Ok(Length::Px(12.0)));
        assert_eq!(parse_length(" 3.5px "), Ok(Length::Px(3.5)));
        assert_eq!(parse_length("1.2em"), Ok(Length::Em(1.2)));
        assert_eq!(parse_length("1.2em").map(|l| l.to_px(10.0)), Ok(12.0));
        assert!(matches!(parse_length("50%"), Err(ParseError::UnsupportedUnit(_))));
        assert!(matches!(parse_length("abc"), Err(ParseError::InvalidLength(_))));
    }

    #[test]
    fn transforms_compose_left_to_right() {
        let t = parse_transform("translate(10 20) scale(2)").unwrap();
        assert_eq!(t * Point::new(1.0, 1.0), Point::new(12.0, 22.0));

        let t = parse_transform("translate(5,-5)").unwrap();
        assert_eq!(t * Point::ORIGIN, Point::new(5.0, -5.0));
    }

    #[test]
    fn malformed_transforms() {
        assert!(parse_transform("translate(1 2 3)").is_err());
        assert!(parse_transform("skew(1)").is_err());
        assert!(parse_transform("translate(1").is_err());
    }
}
