//! Derivation of flag descriptors from configuration records.
//!
//! [`extract`] walks a record's [`Field`](crate::Field) list depth-first and
//! produces a flat, ordered list of [`FlagDescriptor`]s. Nested records
//! contribute their own fields under a composed prefix; absent optional
//! records contribute nothing.

use tracing::{debug, warn};

use crate::names::{flag_name, is_exported};
use crate::record::{FieldKind, Record};
use crate::registry::ParserRegistry;
use crate::value::SettableValue;

/// Name and usage prefix inherited from enclosing records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prefix {
    /// Dot-joined names of the enclosing records.
    pub name: String,
    /// Space-joined usage strings of the enclosing records.
    pub usage: String,
}

impl Prefix {
    /// Prepends the name prefix: `sub` + `x` is `sub.x`.
    pub fn compose_name(&self, name: &str) -> String {
        if self.name.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.name, name)
        }
    }

    /// Prepends the usage prefix, separated by a space.
    pub fn compose_usage(&self, usage: &str) -> String {
        if self.usage.is_empty() {
            usage.to_string()
        } else if usage.is_empty() {
            self.usage.clone()
        } else {
            format!("{} {}", self.usage, usage)
        }
    }

    /// Prefix for the fields of a nested record. A nested record without an
    /// explicit name shares the enclosing prefix.
    pub fn append(&self, name: &str, usage: &str) -> Prefix {
        if name.is_empty() {
            return self.clone();
        }
        Prefix {
            name: self.compose_name(name),
            usage: self.compose_usage(usage),
        }
    }
}

/// A flag derived from one record field.
#[derive(Debug)]
pub struct FlagDescriptor<'a> {
    /// Flag names, without the prefix. Never empty.
    pub names: Vec<String>,
    /// Usage text from the field annotation.
    pub usage: String,
    /// Prefix inherited from enclosing records.
    pub prefix: Prefix,
    /// Write handle into the field.
    pub value: SettableValue<'a>,
}

impl FlagDescriptor<'_> {
    /// Index of the first name longer than one character, or 0.
    pub fn primary_index(&self) -> usize {
        self.names
            .iter()
            .position(|name| name.chars().count() > 1)
            .unwrap_or(0)
    }

    /// The composed primary name, e.g. `sub2.x`.
    pub fn primary_name(&self) -> String {
        self.prefix.compose_name(&self.names[self.primary_index()])
    }

    /// Composed names paired with the usage each one is registered with.
    /// Secondary names refer to the primary one.
    pub fn registrations(&self) -> Vec<(String, String)> {
        let primary = self.primary_index();
        let primary_name = self.primary_name();
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let usage = if i == primary {
                    self.prefix.compose_usage(&self.usage)
                } else {
                    format!("same as --{primary_name}")
                };
                (self.prefix.compose_name(name), usage)
            })
            .collect()
    }
}

/// A field that produced no flag because its type has no parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Declared identifier of the field.
    pub field: String,
    /// Rust type name of the field.
    pub type_name: &'static str,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "no parser for {} (field {})", self.type_name, self.field)
    }
}

/// Result of walking a record.
#[derive(Debug, Default)]
pub struct Extraction<'a> {
    pub flags: Vec<FlagDescriptor<'a>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Derives the flags of `record`, depth-first in declaration order.
///
/// ```
/// use flagtree_core::{extract, Field, ParserRegistry, Prefix, Record};
///
/// #[derive(Default)]
/// struct Limits {
///     max: u32,
/// }
///
/// impl Record for Limits {
///     fn fields(&mut self) -> Vec<Field<'_>> {
///         vec![Field::scalar("Max", &mut self.max).usage("maximum")]
///     }
/// }
///
/// #[derive(Default)]
/// struct Options {
///     dry_run: bool,
///     limits: Limits,
/// }
///
/// impl Record for Options {
///     fn fields(&mut self) -> Vec<Field<'_>> {
///         vec![
///             Field::scalar("DryRun", &mut self.dry_run),
///             Field::nested("Limits", &mut self.limits).name("limits").usage("limits:"),
///         ]
///     }
/// }
///
/// let mut options = Options::default();
/// let registry = ParserRegistry::new();
/// let extraction = extract(&mut options, &Prefix::default(), &registry);
/// let names: Vec<String> = extraction.flags.iter().map(|f| f.primary_name()).collect();
/// assert_eq!(names, ["dry-run", "limits.max"]);
/// assert_eq!(extraction.flags[1].prefix.compose_usage("maximum"), "limits: maximum");
/// ```
pub fn extract<'a>(
    record: &'a mut dyn Record,
    prefix: &Prefix,
    registry: &ParserRegistry,
) -> Extraction<'a> {
    let mut out = Extraction::default();
    extract_into(record, prefix, registry, &mut out);
    out
}

fn extract_into<'a>(
    record: &'a mut dyn Record,
    prefix: &Prefix,
    registry: &ParserRegistry,
    out: &mut Extraction<'a>,
) {
    for field in record.fields() {
        let identifier = field.identifier;
        if !is_exported(identifier) {
            debug!(field = identifier, "Skipping unexported field");
            continue;
        }
        let names: Vec<String> = match field.name.as_deref() {
            Some("") | Some("-") => {
                debug!(field = identifier, "Field excluded by name annotation");
                continue;
            }
            Some(list) => list.split(',').map(str::to_string).collect(),
            None => vec![flag_name(identifier)],
        };
        let nested_name = if field.name.is_some() {
            names[0].as_str()
        } else {
            ""
        };

        match field.kind {
            FieldKind::Nested(inner) => {
                debug!(field = identifier, "Descending into nested record");
                let inner_prefix = prefix.append(nested_name, &field.usage);
                extract_into(inner, &inner_prefix, registry, out);
            }
            FieldKind::Pointer(Some(inner)) | FieldKind::Dynamic(Some(inner)) => {
                debug!(field = identifier, "Descending into optional record");
                let inner_prefix = prefix.append(nested_name, &field.usage);
                extract_into(inner, &inner_prefix, registry, out);
            }
            FieldKind::Pointer(None) | FieldKind::Dynamic(None) => {
                debug!(field = identifier, "Optional record is empty, no flags");
            }
            FieldKind::Scalar(bind) | FieldKind::Sequence(bind) => {
                let type_name = bind.type_name();
                match bind.bind(registry, field.default_use) {
                    Some(value) => out.flags.push(FlagDescriptor {
                        names,
                        usage: field.usage,
                        prefix: prefix.clone(),
                        value,
                    }),
                    None => {
                        warn!(field = identifier, type_name, "No parser for field type");
                        out.diagnostics.push(Diagnostic {
                            field: identifier.to_string(),
                            type_name,
                        });
                    }
                }
            }
        }
    }
}
