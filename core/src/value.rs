//! Flag value types and the settable values bound to record fields.
//!
//! [`FlagType`] is implemented by every type that can back a flag or a
//! function argument. Parsers (see [`ParserRegistry`](crate::ParserRegistry))
//! turn text into an intermediate [`Value`], which the destination type then
//! narrows into itself.
//!
//! A [`SettableValue`] is the write handle the flag set uses: a
//! [`ScalarValue`] overwrites its field on every set, a [`RepeatingValue`]
//! appends to a `Vec`, discarding the pre-populated default on the first set.

use std::any::Any;
use std::fmt;

use num_complex::Complex64;

use crate::error::ParseError;
use crate::names::quote;
use crate::registry::ParseFn;

/// Primitive kind of a flag type, used to pick a fallback parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    /// Signed integer of the given width in bits.
    Int(u32),
    /// Unsigned integer of the given width in bits.
    Uint(u32),
    /// Floating point of the given width in bits.
    Float(u32),
    Complex,
    Bool,
}

impl Kind {
    /// Human-readable kind name used in parse errors.
    pub fn name(self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Int(_) => "int",
            Kind::Uint(_) => "uint",
            Kind::Float(_) => "float",
            Kind::Complex => "complex",
            Kind::Bool => "bool",
        }
    }
}

/// Intermediate result of parsing a command-line string.
pub enum Value {
    Str(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Complex(Complex64),
    Bool(bool),
    /// Output of an exact-type parser, downcast by the destination type.
    Any(Box<dyn Any>),
}

impl Value {
    /// Wraps the output of a custom parser.
    pub fn any<T: Any>(value: T) -> Self {
        Value::Any(Box::new(value))
    }

    /// Recovers a custom parser's output as `T`.
    pub fn downcast<T: Any>(self) -> Result<T, ParseError> {
        match self {
            Value::Any(boxed) => boxed
                .downcast::<T>()
                .map(|b| *b)
                .map_err(|_| ParseError::Mismatch {
                    type_name: std::any::type_name::<T>(),
                }),
            _ => Err(ParseError::Mismatch {
                type_name: std::any::type_name::<T>(),
            }),
        }
    }

    /// Converts into `T`. An exact-type parser's output for `T` is taken as
    /// is; anything else goes through [`FlagType::from_value`].
    pub fn into_flag<T: FlagType>(self) -> Result<T, ParseError> {
        match self {
            Value::Any(boxed) => match boxed.downcast::<T>() {
                Ok(value) => Ok(*value),
                Err(boxed) => T::from_value(Value::Any(boxed)),
            },
            other => T::from_value(other),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Value::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Value::Uint(n) => f.debug_tuple("Uint").field(n).finish(),
            Value::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Value::Complex(c) => f.debug_tuple("Complex").field(c).finish(),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Any(_) => f.write_str("Any(..)"),
        }
    }
}

/// A type that can be bound to a flag or a function parameter.
///
/// Built-in implementations cover `String`, every integer width, `f32`,
/// `f64`, `bool` and [`Complex64`]. A newtype picks the kind whose built-in
/// parser it reuses, or leaves [`KIND`](FlagType::KIND) as `None` and relies
/// on a parser registered for its exact type.
///
/// ```
/// use flagtree_core::{FlagType, Kind, ParseError, Value};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Ratio(f32);
///
/// impl FlagType for Ratio {
///     const KIND: Option<Kind> = Some(Kind::Float(32));
///
///     fn from_value(value: Value) -> Result<Self, ParseError> {
///         f32::from_value(value).map(Ratio)
///     }
///
///     fn render(&self) -> String {
///         self.0.render()
///     }
/// }
///
/// assert_eq!(Ratio::from_value(Value::Float(0.5)), Ok(Ratio(0.5)));
/// ```
pub trait FlagType: Sized + 'static {
    /// Primitive kind used to resolve a fallback parser.
    const KIND: Option<Kind> = None;

    /// Converts a parsed value into `Self`, narrowing numeric widths.
    fn from_value(value: Value) -> Result<Self, ParseError> {
        value.downcast::<Self>()
    }

    /// Renders the value for help output.
    fn render(&self) -> String;
}

impl FlagType for String {
    const KIND: Option<Kind> = Some(Kind::String);

    fn from_value(value: Value) -> Result<Self, ParseError> {
        match value {
            Value::Str(s) => Ok(s),
            other => other.downcast(),
        }
    }

    fn render(&self) -> String {
        self.clone()
    }
}

impl FlagType for bool {
    const KIND: Option<Kind> = Some(Kind::Bool);

    fn from_value(value: Value) -> Result<Self, ParseError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => other.downcast(),
        }
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

macro_rules! int_flag_type {
    ($variant:ident, $kind:ident, $($ty:ty),*) => {
        $(
            impl FlagType for $ty {
                const KIND: Option<Kind> = Some(Kind::$kind(<$ty>::BITS));

                fn from_value(value: Value) -> Result<Self, ParseError> {
                    match value {
                        Value::$variant(n) => <$ty>::try_from(n).map_err(|_| ParseError::Range {
                            type_name: stringify!($ty),
                            input: n.to_string(),
                        }),
                        other => other.downcast(),
                    }
                }

                fn render(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

int_flag_type!(Int, Int, i8, i16, i32, i64, isize);
int_flag_type!(Uint, Uint, u8, u16, u32, u64, usize);

impl FlagType for f64 {
    const KIND: Option<Kind> = Some(Kind::Float(64));

    fn from_value(value: Value) -> Result<Self, ParseError> {
        match value {
            Value::Float(x) => Ok(x),
            other => other.downcast(),
        }
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl FlagType for f32 {
    const KIND: Option<Kind> = Some(Kind::Float(32));

    fn from_value(value: Value) -> Result<Self, ParseError> {
        match value {
            Value::Float(x) => {
                let narrowed = x as f32;
                if x.is_finite() && !narrowed.is_finite() {
                    return Err(ParseError::Range {
                        type_name: "f32",
                        input: x.to_string(),
                    });
                }
                Ok(narrowed)
            }
            other => other.downcast(),
        }
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl FlagType for Complex64 {
    const KIND: Option<Kind> = Some(Kind::Complex);

    fn from_value(value: Value) -> Result<Self, ParseError> {
        match value {
            Value::Complex(c) => Ok(c),
            other => other.downcast(),
        }
    }

    fn render(&self) -> String {
        format!("({self})")
    }
}

/// Renders a value the way help text displays it: strings are quoted,
/// and an empty rendering falls back to the override or `""`.
fn display<T: FlagType>(value: &T, default_use: Option<&str>) -> String {
    let s = value.render();
    if s.is_empty() {
        match default_use {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => "\"\"".to_string(),
        }
    } else if T::KIND == Some(Kind::String) {
        quote(&s)
    } else {
        s
    }
}

trait ScalarCell {
    fn assign(&mut self, value: Value) -> Result<(), ParseError>;
    fn display(&self, default_use: Option<&str>) -> String;
}

struct ScalarRef<'a, T>(&'a mut T);

impl<T: FlagType> ScalarCell for ScalarRef<'_, T> {
    fn assign(&mut self, value: Value) -> Result<(), ParseError> {
        *self.0 = value.into_flag()?;
        Ok(())
    }

    fn display(&self, default_use: Option<&str>) -> String {
        display(&*self.0, default_use)
    }
}

trait SequenceCell {
    fn clear(&mut self);
    fn push(&mut self, value: Value) -> Result<(), ParseError>;
    fn is_empty(&self) -> bool;
    fn display(&self) -> String;
}

struct SequenceRef<'a, T>(&'a mut Vec<T>);

impl<T: FlagType> SequenceCell for SequenceRef<'_, T> {
    fn clear(&mut self) {
        self.0.clear();
    }

    fn push(&mut self, value: Value) -> Result<(), ParseError> {
        self.0.push(value.into_flag()?);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn display(&self) -> String {
        let items: Vec<String> = self.0.iter().map(FlagType::render).collect();
        format!("[{}]", items.join(" "))
    }
}

/// Single-assignment value: every set overwrites the field.
pub struct ScalarValue<'a> {
    cell: Box<dyn ScalarCell + 'a>,
    parse: ParseFn,
    kind: Option<Kind>,
    default_use: Option<String>,
}

impl<'a> ScalarValue<'a> {
    pub(crate) fn new<T: FlagType>(
        target: &'a mut T,
        parse: ParseFn,
        default_use: Option<String>,
    ) -> Self {
        Self {
            cell: Box::new(ScalarRef(target)),
            parse,
            kind: T::KIND,
            default_use,
        }
    }
}

/// Accumulating value: the first set clears the sequence, later sets append.
pub struct RepeatingValue<'a> {
    cell: Box<dyn SequenceCell + 'a>,
    parse: ParseFn,
    kind: Option<Kind>,
    default_use: Option<String>,
    is_set: bool,
}

impl<'a> RepeatingValue<'a> {
    pub(crate) fn new<T: FlagType>(
        target: &'a mut Vec<T>,
        parse: ParseFn,
        default_use: Option<String>,
    ) -> Self {
        Self {
            cell: Box::new(SequenceRef(target)),
            parse,
            kind: T::KIND,
            default_use,
            is_set: false,
        }
    }
}

/// Write handle for one flag, bound to a record field.
pub enum SettableValue<'a> {
    Scalar(ScalarValue<'a>),
    Repeating(RepeatingValue<'a>),
}

impl SettableValue<'_> {
    /// Parses `s` and stores it in the bound field.
    pub fn set(&mut self, s: &str) -> Result<(), ParseError> {
        match self {
            SettableValue::Scalar(v) => {
                let value = (v.parse)(s)?;
                v.cell.assign(value)
            }
            SettableValue::Repeating(v) => {
                let value = (v.parse)(s)?;
                if !v.is_set {
                    v.cell.clear();
                    v.is_set = true;
                }
                v.cell.push(value)
            }
        }
    }

    /// Textual form of the current value, as shown in help.
    pub fn display(&self) -> String {
        match self {
            SettableValue::Scalar(v) => v.cell.display(v.default_use.as_deref()),
            SettableValue::Repeating(v) => match v.default_use.as_deref() {
                Some(d) if !d.is_empty() && v.cell.is_empty() => d.to_string(),
                _ => v.cell.display(),
            },
        }
    }

    /// Boolean flags may be given without a value.
    pub fn is_bool(&self) -> bool {
        let kind = match self {
            SettableValue::Scalar(v) => v.kind,
            SettableValue::Repeating(v) => v.kind,
        };
        kind == Some(Kind::Bool)
    }
}

impl fmt::Debug for SettableValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettableValue::Scalar(_) => write!(f, "Scalar({})", self.display()),
            SettableValue::Repeating(_) => write!(f, "Repeating({})", self.display()),
        }
    }
}
