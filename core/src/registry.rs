//! String-to-value parsers keyed by exact type, with fallbacks by kind.
//!
//! The registry is an explicit value handed to the
//! [`Dispatcher`](crate::Dispatcher) and to [`wrap`](crate::wrap), so
//! separate dispatch runs never share parser state.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use flagtree_core::{FlagType, ParseError, ParserRegistry, Value};
//!
//! #[derive(Debug, PartialEq)]
//! struct Millis(Duration);
//!
//! impl FlagType for Millis {
//!     fn render(&self) -> String {
//!         format!("{}ms", self.0.as_millis())
//!     }
//! }
//!
//! let mut registry = ParserRegistry::new();
//! assert!(registry.resolve::<Millis>().is_none());
//!
//! registry.register::<Millis, _>(|s| {
//!     let ms: u64 = s
//!         .trim_end_matches("ms")
//!         .parse()
//!         .map_err(|_| ParseError::Custom(format!("bad duration {s:?}")))?;
//!     Ok(Millis(Duration::from_millis(ms)))
//! });
//! let parse = registry.resolve::<Millis>().unwrap();
//! let value = parse("250ms").unwrap().into_flag::<Millis>().unwrap();
//! assert_eq!(value, Millis(Duration::from_millis(250)));
//! ```

use std::any::TypeId;
use std::collections::HashMap;
use std::rc::Rc;
use std::str::FromStr;

use num_complex::Complex64;

use crate::error::ParseError;
use crate::value::{FlagType, Kind, Value};

/// Parses a command-line string into a [`Value`].
pub type ParseFn = Rc<dyn Fn(&str) -> Result<Value, ParseError>>;

/// Registry of parsers, resolved by exact type first, then by [`Kind`].
#[derive(Clone)]
pub struct ParserRegistry {
    exact: HashMap<TypeId, ParseFn>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserRegistry {
    /// Creates a registry with only the built-in kind parsers.
    pub fn new() -> Self {
        Self {
            exact: HashMap::new(),
        }
    }

    /// Installs a parser for the exact type `T`, overriding its kind parser.
    pub fn register<T, F>(&mut self, parse: F) -> &mut Self
    where
        T: FlagType,
        F: Fn(&str) -> Result<T, ParseError> + 'static,
    {
        let parse: ParseFn = Rc::new(move |s| parse(s).map(Value::any));
        self.exact.insert(TypeId::of::<T>(), parse);
        self
    }

    /// Resolves the parser for `T`.
    pub fn resolve<T: FlagType>(&self) -> Option<ParseFn> {
        self.resolve_id(TypeId::of::<T>(), T::KIND)
    }

    pub(crate) fn resolve_id(&self, id: TypeId, kind: Option<Kind>) -> Option<ParseFn> {
        if let Some(parse) = self.exact.get(&id) {
            return Some(Rc::clone(parse));
        }
        kind.map(kind_parser)
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("exact", &self.exact.len())
            .finish()
    }
}

fn kind_parser(kind: Kind) -> ParseFn {
    match kind {
        Kind::String => Rc::new(|s| Ok(Value::Str(s.to_string()))),
        Kind::Int(_) => Rc::new(|s| parse_int(s).map(Value::Int)),
        Kind::Uint(_) => Rc::new(|s| parse_uint(s).map(Value::Uint)),
        Kind::Float(_) => Rc::new(|s| parse_float(s).map(Value::Float)),
        Kind::Complex => Rc::new(|s| parse_complex(s).map(Value::Complex)),
        Kind::Bool => Rc::new(|s| parse_bool(s).map(Value::Bool)),
    }
}

fn syntax(kind: Kind, s: &str) -> ParseError {
    ParseError::Syntax {
        kind: kind.name(),
        input: s.to_string(),
    }
}

/// Parses a base-10 signed integer in the 64-bit range.
pub fn parse_int(s: &str) -> Result<i64, ParseError> {
    s.parse::<i64>().map_err(|e| match e.kind() {
        std::num::IntErrorKind::PosOverflow | std::num::IntErrorKind::NegOverflow => {
            ParseError::Range {
                type_name: "i64",
                input: s.to_string(),
            }
        }
        _ => syntax(Kind::Int(64), s),
    })
}

/// Parses a base-10 unsigned integer in the 64-bit range.
pub fn parse_uint(s: &str) -> Result<u64, ParseError> {
    s.parse::<u64>().map_err(|e| match e.kind() {
        std::num::IntErrorKind::PosOverflow => ParseError::Range {
            type_name: "u64",
            input: s.to_string(),
        },
        _ => syntax(Kind::Uint(64), s),
    })
}

/// Parses a 64-bit floating point number.
pub fn parse_float(s: &str) -> Result<f64, ParseError> {
    s.parse::<f64>().map_err(|_| syntax(Kind::Float(64), s))
}

/// Parses a complex number such as `1+2i` or `(1.5-0.5i)`.
pub fn parse_complex(s: &str) -> Result<Complex64, ParseError> {
    let inner = s
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(s);
    Complex64::from_str(inner).map_err(|_| syntax(Kind::Complex, s))
}

/// Parses the conventional boolean literals.
pub fn parse_bool(s: &str) -> Result<bool, ParseError> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(syntax(Kind::Bool, s)),
    }
}
