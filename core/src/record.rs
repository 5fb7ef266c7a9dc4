//! Field schemas exposed by configuration records.
//!
//! A configuration record describes its flag-bearing fields by returning a
//! list of [`Field`]s that borrow into it. The list is the record's schema:
//! declared identifier, optional annotations and a write handle.
//!
//! # Examples
//!
//! ```
//! use flagtree_core::{Field, Record};
//!
//! #[derive(Default)]
//! struct Server {
//!     host: String,
//!     port: u16,
//!     tags: Vec<String>,
//!     secret: String,
//! }
//!
//! impl Record for Server {
//!     fn fields(&mut self) -> Vec<Field<'_>> {
//!         vec![
//!             Field::scalar("Host", &mut self.host).usage("address to bind"),
//!             Field::scalar("Port", &mut self.port).name("p,port"),
//!             Field::list("Tags", &mut self.tags).name("tag"),
//!             Field::scalar("Secret", &mut self.secret).name("-"),
//!         ]
//!     }
//! }
//! ```

use crate::error::BoxError;
use crate::registry::ParserRegistry;
use crate::value::{FlagType, RepeatingValue, ScalarValue, SettableValue};

/// A configuration record whose fields become command flags.
///
/// The three lifecycle hooks are optional: their default implementations do
/// nothing. They run only for records attached to a command, never for
/// records reached through nesting.
pub trait Record {
    /// Lists the record's fields in declaration order.
    fn fields(&mut self) -> Vec<Field<'_>>;

    /// Called once before flags are derived. May set defaults and allocate
    /// optional nested records so that their flags are discovered.
    fn init(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called after parsing, root to leaf, just before the command runs.
    fn configured(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called after the command ran, leaf to root.
    fn close(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<R: Record + ?Sized> Record for Box<R> {
    fn fields(&mut self) -> Vec<Field<'_>> {
        (**self).fields()
    }

    fn init(&mut self) -> Result<(), BoxError> {
        (**self).init()
    }

    fn configured(&mut self) -> Result<(), BoxError> {
        (**self).configured()
    }

    fn close(&mut self) -> Result<(), BoxError> {
        (**self).close()
    }
}

/// Binds a typed field to a parser once the registry is known.
pub(crate) trait Bind<'a> {
    fn type_name(&self) -> &'static str;

    fn bind(
        self: Box<Self>,
        registry: &ParserRegistry,
        default_use: Option<String>,
    ) -> Option<SettableValue<'a>>;
}

struct BindScalar<'a, T>(&'a mut T);

impl<'a, T: FlagType> Bind<'a> for BindScalar<'a, T> {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn bind(
        self: Box<Self>,
        registry: &ParserRegistry,
        default_use: Option<String>,
    ) -> Option<SettableValue<'a>> {
        let parse = registry.resolve::<T>()?;
        let BindScalar(target) = *self;
        Some(SettableValue::Scalar(ScalarValue::new(
            target,
            parse,
            default_use,
        )))
    }
}

struct BindSequence<'a, T>(&'a mut Vec<T>);

impl<'a, T: FlagType> Bind<'a> for BindSequence<'a, T> {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Vec<T>>()
    }

    fn bind(
        self: Box<Self>,
        registry: &ParserRegistry,
        default_use: Option<String>,
    ) -> Option<SettableValue<'a>> {
        let parse = registry.resolve::<T>()?;
        let BindSequence(target) = *self;
        Some(SettableValue::Repeating(RepeatingValue::new(
            target,
            parse,
            default_use,
        )))
    }
}

pub(crate) enum FieldKind<'a> {
    Scalar(Box<dyn Bind<'a> + 'a>),
    Sequence(Box<dyn Bind<'a> + 'a>),
    Nested(&'a mut dyn Record),
    Pointer(Option<&'a mut dyn Record>),
    Dynamic(Option<&'a mut dyn Record>),
}

/// One field of a configuration record.
pub struct Field<'a> {
    pub(crate) identifier: &'static str,
    pub(crate) name: Option<String>,
    pub(crate) usage: String,
    pub(crate) default_use: Option<String>,
    pub(crate) kind: FieldKind<'a>,
}

impl<'a> Field<'a> {
    fn new(identifier: &'static str, kind: FieldKind<'a>) -> Self {
        Self {
            identifier,
            name: None,
            usage: String::new(),
            default_use: None,
            kind,
        }
    }

    /// A primitive field set by a single-valued flag.
    pub fn scalar<T: FlagType>(identifier: &'static str, target: &'a mut T) -> Self {
        Self::new(identifier, FieldKind::Scalar(Box::new(BindScalar(target))))
    }

    /// A sequence field; each occurrence of the flag appends one element.
    pub fn list<T: FlagType>(identifier: &'static str, target: &'a mut Vec<T>) -> Self {
        Self::new(
            identifier,
            FieldKind::Sequence(Box::new(BindSequence(target))),
        )
    }

    /// An embedded record whose fields are derived in place.
    pub fn nested<R: Record>(identifier: &'static str, target: &'a mut R) -> Self {
        Self::new(identifier, FieldKind::Nested(target))
    }

    /// An optional record. Contributes no flags while it is `None`.
    pub fn optional<R: Record>(identifier: &'static str, target: &'a mut Option<R>) -> Self {
        Self::new(
            identifier,
            FieldKind::Pointer(target.as_mut().map(|r| r as &mut dyn Record)),
        )
    }

    /// A holder for any record chosen at runtime. Contributes no flags while
    /// it is empty.
    pub fn dynamic(identifier: &'static str, target: &'a mut Option<Box<dyn Record>>) -> Self {
        Self::new(
            identifier,
            FieldKind::Dynamic(target.as_mut().map(|r| r as &mut dyn Record)),
        )
    }

    /// Comma-separated flag names. An empty string or `-` excludes the
    /// field from flag derivation.
    pub fn name(mut self, names: &str) -> Self {
        self.name = Some(names.to_string());
        self
    }

    /// Usage text shown in help.
    pub fn usage(mut self, usage: &str) -> Self {
        self.usage = usage.to_string();
        self
    }

    /// Text shown as the default in help when the live value is empty.
    pub fn default(mut self, display: &str) -> Self {
        self.default_use = Some(display.to_string());
        self
    }

    /// The declared identifier.
    pub fn identifier(&self) -> &str {
        self.identifier
    }
}

impl std::fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.kind {
            FieldKind::Scalar(b) => b.type_name(),
            FieldKind::Sequence(b) => b.type_name(),
            FieldKind::Nested(_) => "record",
            FieldKind::Pointer(_) => "optional record",
            FieldKind::Dynamic(_) => "dyn record",
        };
        f.debug_struct("Field")
            .field("identifier", &self.identifier)
            .field("name", &self.name)
            .field("kind", &kind)
            .finish()
    }
}
