use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::point::Point2;

#[derive(Debug, Error, PartialEq)]
pub enum AttributeError {
    #[error("face has no attribute named {key:?}")]
    Missing { key: String },
    #[error("attribute {key:?} is {found}, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: AttributeKind,
        found: AttributeKind,
    },
    #[error("attribute {key:?} is not declared on the network")]
    NotDeclared { key: String },
    #[error("attribute {key:?} has {found} dimensions, expected {expected}")]
    DimensionMismatch {
        key: String,
        expected: usize,
        found: usize,
    },
    #[error("cannot parse {text:?} as {kind}")]
    Parse { kind: AttributeKind, text: String },
}

/// Value categories a face attribute can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    Point,
    Integer,
    Decimal,
    Vector,
    IntVector,
    Text,
}

impl AttributeKind {
    pub const ALL: [AttributeKind; 6] = [
        AttributeKind::Point,
        AttributeKind::Integer,
        AttributeKind::Decimal,
        AttributeKind::Vector,
        AttributeKind::IntVector,
        AttributeKind::Text,
    ];

    /// Case-insensitive lookup by display name.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.to_string().to_lowercase() == lower)
    }

    /// Kind used to store a `k`-dimensional embedding result.
    pub fn for_embedding(dimensions: usize) -> Self {
        match dimensions {
            0 | 1 => AttributeKind::Decimal,
            2 => AttributeKind::Point,
            _ => AttributeKind::Vector,
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeKind::Point => "Point",
            AttributeKind::Integer => "Integer",
            AttributeKind::Decimal => "Decimal",
            AttributeKind::Vector => "Vector",
            AttributeKind::IntVector => "Integer Vector",
            AttributeKind::Text => "String",
        };
        f.write_str(name)
    }
}

/// A typed value attached to a face under a string key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum FaceAttribute {
    Point(Point2),
    Integer(i64),
    Decimal(f64),
    Vector(Vec<f64>),
    IntVector(Vec<i64>),
    Text(String),
}

impl FaceAttribute {
    pub fn kind(&self) -> AttributeKind {
        match self {
            FaceAttribute::Point(_) => AttributeKind::Point,
            FaceAttribute::Integer(_) => AttributeKind::Integer,
            FaceAttribute::Decimal(_) => AttributeKind::Decimal,
            FaceAttribute::Vector(_) => AttributeKind::Vector,
            FaceAttribute::IntVector(_) => AttributeKind::IntVector,
            FaceAttribute::Text(_) => AttributeKind::Text,
        }
    }

    /// Numeric view of the value. Scalars become length-1 vectors and points
    /// `[x, y]`; text is a type mismatch.
    pub fn as_vector(&self, key: &str) -> Result<Vec<f64>, AttributeError> {
        match self {
            FaceAttribute::Point(p) => Ok(vec![p.x, p.y]),
            FaceAttribute::Integer(v) => Ok(vec![*v as f64]),
            FaceAttribute::Decimal(v) => Ok(vec![*v]),
            FaceAttribute::Vector(v) => Ok(v.clone()),
            FaceAttribute::IntVector(v) => Ok(v.iter().map(|&x| x as f64).collect()),
            FaceAttribute::Text(_) => Err(AttributeError::TypeMismatch {
                key: key.to_string(),
                expected: AttributeKind::Vector,
                found: self.kind(),
            }),
        }
    }

    /// Planar view: points directly, vectors by their first two components.
    pub fn as_point(&self, key: &str) -> Result<Point2, AttributeError> {
        let mismatch = || AttributeError::TypeMismatch {
            key: key.to_string(),
            expected: AttributeKind::Point,
            found: self.kind(),
        };
        match self {
            FaceAttribute::Point(p) => Ok(*p),
            FaceAttribute::Vector(_) | FaceAttribute::IntVector(_) => {
                let v = self.as_vector(key)?;
                if v.len() < 2 {
                    return Err(mismatch());
                }
                Ok(Point2::new(v[0], v[1]))
            }
            _ => Err(mismatch()),
        }
    }

    /// Builds an embedding result value from one output row.
    pub fn from_embedding(row: &[f64]) -> Self {
        match row.len() {
            0 => FaceAttribute::Decimal(0.0),
            1 => FaceAttribute::Decimal(row[0]),
            2 => FaceAttribute::Point(Point2::new(row[0], row[1])),
            _ => FaceAttribute::Vector(row.to_vec()),
        }
    }

    /// Parses the textual form produced by `Display`. Brackets, parentheses
    /// and whitespace are ignored for points and vectors.
    pub fn parse(kind: AttributeKind, text: &str) -> Result<Self, AttributeError> {
        let fail = || AttributeError::Parse {
            kind,
            text: text.to_string(),
        };
        let stripped: String = text
            .chars()
            .filter(|c| !matches!(c, '(' | ')' | '[' | ']') && !c.is_whitespace())
            .collect();
        let fields = || stripped.split(',').filter(|s| !s.is_empty());

        match kind {
            AttributeKind::Point => {
                let axes: Vec<&str> = fields().collect();
                if axes.len() < 2 {
                    return Err(fail());
                }
                let x = axes[0].parse::<f64>().map_err(|_| fail())?;
                let y = axes[1].parse::<f64>().map_err(|_| fail())?;
                Ok(FaceAttribute::Point(Point2::new(x, y)))
            }
            AttributeKind::Integer => text
                .trim()
                .parse::<i64>()
                .map(FaceAttribute::Integer)
                .map_err(|_| fail()),
            AttributeKind::Decimal => text
                .trim()
                .parse::<f64>()
                .map(FaceAttribute::Decimal)
                .map_err(|_| fail()),
            AttributeKind::Vector => fields()
                .map(|s| s.parse::<f64>().map_err(|_| fail()))
                .collect::<Result<Vec<_>, _>>()
                .map(FaceAttribute::Vector),
            AttributeKind::IntVector => fields()
                .map(|s| s.parse::<i64>().map_err(|_| fail()))
                .collect::<Result<Vec<_>, _>>()
                .map(FaceAttribute::IntVector),
            AttributeKind::Text => Ok(FaceAttribute::Text(text.to_string())),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, values: &[T]) -> fmt::Result {
    f.write_str("[")?;
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{v}")?;
    }
    f.write_str("]")
}

impl fmt::Display for FaceAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaceAttribute::Point(p) => write!(f, "({}, {})", p.x, p.y),
            FaceAttribute::Integer(v) => write!(f, "{v}"),
            FaceAttribute::Decimal(v) => write!(f, "{v}"),
            FaceAttribute::Vector(v) => write_list(f, v),
            FaceAttribute::IntVector(v) => write_list(f, v),
            FaceAttribute::Text(s) => f.write_str(s),
        }
    }
}

/// Declaration of an attribute column on the network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeSchema {
    pub name: String,
    pub kind: AttributeKind,
    /// Declared length for vector kinds.
    pub dimensions: Option<usize>,
}
