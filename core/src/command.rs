//! Command tree construction.
//!
//! A [`Command`] carries its documentation, an optional configuration
//! record, an optional run handler and its subcommands. Builder methods
//! return `&mut Self`, so a tree is set up with chained calls:
//!
//! ```
//! use flagtree_core::{Command, Field, Record, shared};
//!
//! #[derive(Default)]
//! struct Greeting {
//!     prefix: String,
//! }
//!
//! impl Record for Greeting {
//!     fn fields(&mut self) -> Vec<Field<'_>> {
//!         vec![Field::scalar("Prefix", &mut self.prefix)]
//!     }
//! }
//!
//! let greeting = shared(Greeting::default());
//! let g = greeting.clone();
//! let mut root = Command::new();
//! root.short("greeter");
//! root.command("hello")
//!     .flags(greeting)
//!     .short("say hello")
//!     .usage_line("<name>")
//!     .run_fn(move |name: String| println!("{} {name}", g.borrow().prefix));
//! assert!(root.commands().contains_key("hello"));
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{ArgumentError, BoxError};
use crate::function::{Function, Handler, Outcome, wrap};
use crate::record::Record;
use crate::registry::ParserRegistry;

/// Shared handle to a configuration record, also captured by run handlers.
pub type Shared<T> = Rc<RefCell<T>>;

/// Wraps a record for use with [`Command::flags`].
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Documentation for a command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Documentation {
    /// One-line description, shown in lists of commands.
    #[serde(default)]
    pub short: String,
    /// Arguments without options, e.g. `<arg1> <arg2>`.
    #[serde(rename = "use", default, skip_serializing_if = "String::is_empty")]
    pub usage_line: String,
    /// Longer description shown in the help for a single command.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub long: String,
    /// Example invocations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// A node of the command tree.
#[derive(Default)]
pub struct Command {
    pub(crate) doc: Documentation,
    pub(crate) config: Option<Rc<RefCell<dyn Record>>>,
    pub(crate) handler: Option<Handler>,
    pub(crate) children: BTreeMap<String, Command>,
    pub(crate) skip_validation: bool,
    pub(crate) initialized: bool,
}

impl Command {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the argument synopsis shown after the options in the usage line.
    pub fn usage_line(&mut self, usage_line: &str) -> &mut Self {
        self.doc.usage_line = usage_line.to_string();
        self
    }

    /// Sets the one-line description.
    pub fn short(&mut self, short: &str) -> &mut Self {
        self.doc.short = short.to_string();
        self
    }

    /// Sets the long description.
    pub fn long(&mut self, long: &str) -> &mut Self {
        self.doc.long = long.to_string();
        self
    }

    /// Adds an example invocation. May be called repeatedly.
    pub fn example(&mut self, example: &str) -> &mut Self {
        self.doc.examples.push(example.to_string());
        self
    }

    pub fn documentation(&self) -> &Documentation {
        &self.doc
    }

    pub fn documentation_mut(&mut self) -> &mut Documentation {
        &mut self.doc
    }

    /// Attaches the record whose fields define this command's flags.
    ///
    /// The record's lifecycle hooks run as described on [`Record`].
    pub fn flags<R: Record + 'static>(&mut self, record: Shared<R>) -> &mut Self {
        self.config = Some(record);
        self
    }

    /// Runs `handler` with the positional arguments as given.
    pub fn run_args<F, E>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&[String]) -> Result<(), E> + 'static,
        E: Into<BoxError>,
    {
        self.handler = Some(Box::new(move |args: &[String]| {
            handler(args).map_err(Into::into)
        }));
        self
    }

    /// Runs `handler`, rejecting any positional arguments.
    pub fn run<F, O>(&mut self, handler: F) -> &mut Self
    where
        F: Fn() -> O + 'static,
        O: Outcome,
    {
        self.handler = Some(Box::new(move |args: &[String]| {
            if !args.is_empty() {
                return Err(ArgumentError::Unrecognized(args.join(" ")).into());
            }
            handler().into_result()
        }));
        self
    }

    /// Runs a typed function, converting positional arguments to its
    /// parameter types with the built-in parsers.
    ///
    /// # Panics
    ///
    /// Panics if a parameter type has no built-in parser; use
    /// [`run_fn_with`](Command::run_fn_with) for types with registered
    /// parsers.
    pub fn run_fn<Args, F: Function<Args>>(&mut self, f: F) -> &mut Self {
        self.run_fn_with(&ParserRegistry::new(), f)
    }

    /// Like [`run_fn`](Command::run_fn), resolving parameter types in
    /// `registry`.
    ///
    /// # Panics
    ///
    /// Panics if a parameter type has no parser in `registry`.
    pub fn run_fn_with<Args, F: Function<Args>>(
        &mut self,
        registry: &ParserRegistry,
        f: F,
    ) -> &mut Self {
        match wrap(registry, f) {
            Ok(handler) => self.handler = Some(handler),
            Err(e) => panic!("cannot use function as a command: {e}"),
        }
        self
    }

    /// Disables validation hooks for this command and its ancestors when
    /// this command runs. Meant for commands like `version` that must work
    /// without valid options.
    pub fn skip_validation(&mut self) -> &mut Self {
        self.skip_validation = true;
        self
    }

    /// Creates a subcommand, replacing any existing one with the same name,
    /// and returns it.
    pub fn command(&mut self, name: &str) -> &mut Command {
        let child = self.children.entry(name.to_string()).or_default();
        *child = Command::new();
        child
    }

    /// Subcommands by name.
    pub fn commands(&self) -> &BTreeMap<String, Command> {
        &self.children
    }

    pub fn commands_mut(&mut self) -> &mut BTreeMap<String, Command> {
        &mut self.children
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("doc", &self.doc)
            .field("has_flags", &self.config.is_some())
            .field("has_handler", &self.handler.is_some())
            .field("children", &self.children)
            .field("skip_validation", &self.skip_validation)
            .finish()
    }
}
