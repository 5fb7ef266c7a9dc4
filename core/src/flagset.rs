//! Parse table for one command level.
//!
//! Accepts `-name`, `--name`, `-name value` and `-name=value`. Boolean flags
//! may omit the value. Parsing stops at the first non-flag argument or after
//! a `--` terminator; everything after that is positional.

use std::collections::HashMap;

use crate::error::FlagError;
use crate::extract::FlagDescriptor;
use crate::registry::parse_bool;
use crate::value::SettableValue;

/// Help text entry for one registered flag name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagUsage {
    pub name: String,
    pub usage: String,
    /// Default display captured before parsing; `None` for the help flag.
    pub default: Option<String>,
    pub is_bool: bool,
}

/// Outcome of a successful parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parsed {
    /// Arguments left after the flags.
    pub positional: Vec<String>,
    /// The help flag was given, or `-help`/`-h` was used without being
    /// defined.
    pub help: bool,
}

enum Target<'a> {
    Field(SettableValue<'a>),
    Help,
}

impl Target<'_> {
    fn is_bool(&self) -> bool {
        match self {
            Target::Field(value) => value.is_bool(),
            Target::Help => true,
        }
    }
}

/// Named flags bound to record fields.
#[derive(Default)]
pub struct FlagSet<'a> {
    targets: Vec<Target<'a>>,
    index: HashMap<String, usize>,
    usages: Vec<FlagUsage>,
}

impl<'a> FlagSet<'a> {
    pub fn new() -> Self {
        Self {
            targets: Vec::new(),
            index: HashMap::new(),
            usages: Vec::new(),
        }
    }

    /// Registers every name of a descriptor against its value.
    pub fn add(&mut self, descriptor: FlagDescriptor<'a>) -> Result<(), FlagError> {
        let registrations = descriptor.registrations();
        for (name, _) in &registrations {
            if self.index.contains_key(name) {
                return Err(FlagError::Redefined(name.clone()));
            }
        }
        let default = descriptor.value.display();
        let is_bool = descriptor.value.is_bool();
        let slot = self.targets.len();
        self.targets.push(Target::Field(descriptor.value));
        for (name, usage) in registrations {
            self.index.insert(name.clone(), slot);
            self.usages.push(FlagUsage {
                name,
                usage,
                default: Some(default.clone()),
                is_bool,
            });
        }
        Ok(())
    }

    /// Registers a help flag under `name` unless a flag already uses it.
    pub fn add_help(&mut self, name: &str) {
        if self.contains(name) {
            return;
        }
        self.index.insert(name.to_string(), self.targets.len());
        self.targets.push(Target::Help);
        self.usages.push(FlagUsage {
            name: name.to_string(),
            usage: "help".to_string(),
            default: None,
            is_bool: true,
        });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Help entries sorted by flag name.
    pub fn usages(&self) -> Vec<FlagUsage> {
        let mut usages = self.usages.clone();
        usages.sort_by(|a, b| a.name.cmp(&b.name));
        usages
    }

    /// Parses `args`, writing flag values into their fields.
    pub fn parse(&mut self, args: &[String]) -> Result<Parsed, FlagError> {
        let mut parsed = Parsed::default();
        let mut i = 0;
        while i < args.len() {
            let arg = &args[i];
            if arg.len() < 2 || !arg.starts_with('-') {
                break;
            }
            let body = match arg.strip_prefix("--") {
                Some("") => {
                    i += 1;
                    break;
                }
                Some(rest) => rest,
                None => &arg[1..],
            };
            if body.is_empty() || body.starts_with('-') || body.starts_with('=') {
                return Err(FlagError::BadSyntax(arg.clone()));
            }
            let (name, inline) = match body.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (body, None),
            };
            i += 1;

            let Some(&slot) = self.index.get(name) else {
                if name == "help" || name == "h" {
                    parsed.help = true;
                    return Ok(parsed);
                }
                return Err(FlagError::Undefined(name.to_string()));
            };
            let target = &mut self.targets[slot];
            let value = if target.is_bool() {
                inline.unwrap_or("true")
            } else if let Some(value) = inline {
                value
            } else if i < args.len() {
                i += 1;
                args[i - 1].as_str()
            } else {
                return Err(FlagError::MissingValue(name.to_string()));
            };
            let result = match target {
                Target::Field(field) => field.set(value),
                Target::Help => parse_bool(value).map(|on| parsed.help |= on),
            };
            result.map_err(|source| FlagError::InvalidValue {
                name: name.to_string(),
                value: value.to_string(),
                source,
            })?;
        }
        parsed.positional = args[i..].to_vec();
        Ok(parsed)
    }
}

impl std::fmt::Debug for FlagSet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlagSet")
            .field("usages", &self.usages)
            .finish()
    }
}
