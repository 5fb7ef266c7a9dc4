//! Command trees whose flags are derived from configuration records.
//!
//! An application describes its commands as a tree of [`Command`] nodes.
//! Each node may carry:
//!
//! - a configuration [`Record`] whose [`Field`]s become the node's flags,
//!   with names derived from the field identifiers ([`flag_name`]) unless
//!   annotated;
//! - a run handler, either over raw arguments or a typed function whose
//!   parameters are converted by the [`ParserRegistry`] ([`wrap`]);
//! - documentation used to render help ([`Documentation`]).
//!
//! The [`Dispatcher`] resolves the command line one level at a time,
//! parsing each level's flags before looking up the next subcommand, and
//! drives the record lifecycle hooks around the leaf handler.
//!
//! # Example
//!
//! ```
//! use flagtree_core::*;
//!
//! #[derive(Default)]
//! struct Global {
//!     verbose: bool,
//! }
//!
//! impl Record for Global {
//!     fn fields(&mut self) -> Vec<Field<'_>> {
//!         vec![Field::scalar("Verbose", &mut self.verbose).name("v,verbose")]
//!     }
//! }
//!
//! let global = shared(Global::default());
//! let mut root = Command::new();
//! root.flags(global.clone()).short("example tool");
//! root.command("add")
//!     .short("add two numbers")
//!     .usage_line("<a> <b>")
//!     .run_fn(|a: i32, b: i32| -> Result<(), BoxError> {
//!         assert_eq!(a + b, 5);
//!         Ok(())
//!     });
//!
//! let args: Vec<String> = ["-v", "add", "2", "3"].iter().map(|s| s.to_string()).collect();
//! let mut dispatcher = Dispatcher::with_output(ParserRegistry::new(), Vec::new(), Vec::new());
//! let exit = dispatcher.dispatch("tool", &mut root, &args);
//! assert_eq!(exit.code(), 0);
//! assert!(global.borrow().verbose);
//! ```

mod command;
mod dispatch;
mod error;
mod extract;
mod flagset;
mod function;
mod help;
mod names;
mod record;
mod registry;
mod table;
mod value;

pub use command::{Command, Documentation, Shared, shared};
pub use dispatch::{Dispatcher, Exit, main, main_with};
pub use error::{ArgumentError, BoxError, CommandError, FlagError, ParseError, SignatureError};
pub use extract::{Diagnostic, Extraction, FlagDescriptor, Prefix, extract};
pub use flagset::{FlagSet, FlagUsage, Parsed};
pub use function::{Function, Handler, Outcome, Param, Rest, Signature, Variadic, wrap, wrap_strict};
pub use help::{LevelHelp, render_usage};
pub use names::{flag_name, is_exported, quote};
pub use num_complex::Complex64;
pub use record::{Field, Record};
pub use registry::{
    ParseFn, ParserRegistry, parse_bool, parse_complex, parse_float, parse_int, parse_uint,
};
pub use table::Table;
pub use value::{FlagType, Kind, RepeatingValue, ScalarValue, SettableValue, Value};
