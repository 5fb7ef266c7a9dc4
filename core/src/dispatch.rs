//! Resolves command-line arguments against a [`Command`] tree and runs the
//! selected leaf.
//!
//! Each level of the chain initializes its record once, derives and parses
//! its flags, then either prints help, descends into a subcommand or runs.
//! Running a leaf validates every record in the chain root to leaf, invokes
//! the handler and finally closes the records leaf to root.
//!
//! ```
//! use flagtree_core::{Command, Dispatcher, Exit, Field, ParserRegistry, Record, shared};
//!
//! #[derive(Default)]
//! struct Opts {
//!     loud: bool,
//! }
//!
//! impl Record for Opts {
//!     fn fields(&mut self) -> Vec<Field<'_>> {
//!         vec![Field::scalar("Loud", &mut self.loud).usage("shout")]
//!     }
//! }
//!
//! let opts = shared(Opts::default());
//! let mut root = Command::new();
//! root.flags(opts.clone()).run(|| {});
//!
//! let mut dispatcher = Dispatcher::with_output(ParserRegistry::new(), Vec::new(), Vec::new());
//! let args = vec!["-loud".to_string()];
//! let exit = dispatcher.dispatch("app", &mut root, &args);
//! assert!(matches!(exit, Exit::Success));
//! assert!(opts.borrow().loud);
//! ```

use std::cell::RefCell;
use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::command::Command;
use crate::error::{CommandError, FlagError};
use crate::extract::{FlagDescriptor, Prefix, extract};
use crate::flagset::{FlagSet, FlagUsage, Parsed};
use crate::help::{LevelHelp, render_usage};
use crate::record::Record;
use crate::registry::ParserRegistry;

/// How a dispatch ended.
#[derive(Debug)]
pub enum Exit {
    /// The leaf handler ran and succeeded.
    Success,
    /// Usage was printed instead of running a command.
    Help,
    /// The error has already been reported on the error writer.
    Failure(CommandError),
}

impl Exit {
    /// Process exit code: 0 for success and help, 1 for failures.
    pub fn code(&self) -> i32 {
        match self {
            Exit::Success | Exit::Help => 0,
            Exit::Failure(_) => 1,
        }
    }
}

/// One resolved level of the command chain.
struct Level {
    help: LevelHelp,
    config: Option<Rc<RefCell<dyn Record>>>,
    skip_validation: bool,
}

/// Runs command trees, writing help to `out` and errors to `err`.
pub struct Dispatcher<O = io::Stdout, E = io::Stderr> {
    registry: ParserRegistry,
    out: O,
    err: E,
}

impl Dispatcher {
    /// A dispatcher writing to the process's stdout and stderr.
    pub fn new(registry: ParserRegistry) -> Self {
        Self::with_output(registry, io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> Dispatcher<O, E> {
    pub fn with_output(registry: ParserRegistry, out: O, err: E) -> Self {
        Self { registry, out, err }
    }

    /// Returns the output writers.
    pub fn into_output(self) -> (O, E) {
        (self.out, self.err)
    }

    /// Dispatches `args` (without the program name) to `cmd`, named `name`.
    pub fn dispatch(&mut self, name: &str, cmd: &mut Command, args: &[String]) -> Exit {
        let mut chain = Vec::new();
        self.resolve(name, cmd, args, &mut chain)
    }

    fn resolve(
        &mut self,
        name: &str,
        cmd: &mut Command,
        args: &[String],
        chain: &mut Vec<Level>,
    ) -> Exit {
        debug!(command = name, ?args, depth = chain.len(), "Resolving command level");
        if let Err(error) = initialize(name, cmd) {
            self.report(&error);
            return Exit::Failure(error);
        }

        let mut has_options = false;
        let (flags, parsed) = match &cmd.config {
            Some(config) => {
                let mut record = config.borrow_mut();
                let extraction = extract(&mut *record, &Prefix::default(), &self.registry);
                for diagnostic in &extraction.diagnostics {
                    let _ = writeln!(self.err, "{name}: {diagnostic}");
                }
                has_options = !extraction.flags.is_empty();
                parse_level(extraction.flags, args)
            }
            None => parse_level(Vec::new(), args),
        };

        chain.push(Level {
            help: LevelHelp {
                name: name.to_string(),
                doc: cmd.doc.clone(),
                flags,
                has_options,
            },
            config: cmd.config.clone(),
            skip_validation: cmd.skip_validation,
        });
        let children: Vec<(String, String)> = cmd
            .children
            .iter()
            .map(|(name, child)| (name.clone(), child.doc.short.clone()))
            .collect();

        let parsed = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                let error = CommandError::from(e);
                self.report(&error);
                let usage = usage_text(chain, &children);
                let _ = self.err.write_all(usage.as_bytes());
                return Exit::Failure(error);
            }
        };
        if parsed.help {
            return self.print_usage(chain, &children);
        }

        if !cmd.children.is_empty() {
            let Some(next) = parsed.positional.first() else {
                return self.print_usage(chain, &children);
            };
            return match cmd.children.get_mut(next) {
                Some(child) => {
                    debug!(command = name, subcommand = next.as_str(), "Descending");
                    self.resolve(next, child, &parsed.positional[1..], chain)
                }
                None => {
                    let error = CommandError::NoSuchCommand(next.clone());
                    self.report(&error);
                    let usage = usage_text(chain, &children);
                    let _ = self.err.write_all(usage.as_bytes());
                    Exit::Failure(error)
                }
            };
        }

        self.run_leaf(cmd, &parsed.positional, chain)
    }

    fn run_leaf(&mut self, cmd: &Command, args: &[String], chain: &[Level]) -> Exit {
        let Some(handler) = &cmd.handler else {
            return self.print_usage(chain, &[]);
        };

        if chain.iter().any(|level| level.skip_validation) {
            debug!("Validation disabled for this chain");
        } else {
            for (i, level) in chain.iter().enumerate() {
                let Some(config) = &level.config else {
                    continue;
                };
                let validated = config.borrow_mut().configured();
                if let Err(source) = validated {
                    let error = CommandError::Validation {
                        command: level.help.name.clone(),
                        source,
                    };
                    self.cleanup(&chain[..=i]);
                    self.report(&error);
                    return Exit::Failure(error);
                }
            }
        }

        debug!(?args, "Running command");
        let result = handler(args);
        self.cleanup(chain);

        match result {
            Ok(()) => Exit::Success,
            Err(e) => {
                let error = if e.to_string().is_empty() {
                    let usage_line = &cmd.doc.usage_line;
                    if usage_line.is_empty() {
                        CommandError::WrongUsage
                    } else {
                        CommandError::Usage(usage_line.clone())
                    }
                } else {
                    CommandError::Run(e)
                };
                self.report(&error);
                Exit::Failure(error)
            }
        }
    }

    /// Closes the records of `chain`, most specific first.
    fn cleanup(&mut self, chain: &[Level]) {
        for level in chain.iter().rev() {
            let Some(config) = &level.config else {
                continue;
            };
            let closed = config.borrow_mut().close();
            if let Err(e) = closed {
                warn!(command = level.help.name.as_str(), error = %e, "Cleanup failed");
                let _ = writeln!(self.err, "{}: {e}", level.help.name);
            }
        }
    }

    fn print_usage(&mut self, chain: &[Level], children: &[(String, String)]) -> Exit {
        let usage = usage_text(chain, children);
        let _ = self.out.write_all(usage.as_bytes());
        Exit::Help
    }

    fn report(&mut self, error: &CommandError) {
        let _ = writeln!(self.err, "{error}");
    }
}

/// Runs the record's initialize hook the first time the command is reached.
fn initialize(name: &str, cmd: &mut Command) -> Result<(), CommandError> {
    if cmd.initialized {
        return Ok(());
    }
    cmd.initialized = true;
    if let Some(config) = &cmd.config {
        let initialized = config.borrow_mut().init();
        initialized.map_err(|source| CommandError::Init {
            command: name.to_string(),
            source,
        })?;
    }
    Ok(())
}

/// Builds the parse table for one level and parses `args` with it.
fn parse_level<'a>(
    flags: Vec<FlagDescriptor<'a>>,
    args: &[String],
) -> (Vec<FlagUsage>, Result<Parsed, FlagError>) {
    let mut set = FlagSet::new();
    let mut added = Ok(());
    for flag in flags {
        if let Err(e) = set.add(flag) {
            added = Err(e);
            break;
        }
    }
    set.add_help("h");
    let parsed = added.and_then(|()| set.parse(args));
    (set.usages(), parsed)
}

fn usage_text(chain: &[Level], children: &[(String, String)]) -> String {
    let levels: Vec<LevelHelp> = chain.iter().map(|level| level.help.clone()).collect();
    render_usage(&levels, children)
}

fn program_name() -> (String, Vec<String>) {
    let mut args = std::env::args();
    let name = args
        .next()
        .as_deref()
        .and_then(|path| Path::new(path).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    (name, args.collect())
}

/// Runs `cmd` on the process arguments and exits with the resulting code.
/// The command is named after the basename of the executable.
pub fn main(cmd: &mut Command) -> ! {
    main_with(ParserRegistry::new(), cmd)
}

/// Like [`main`], resolving flag types in `registry`.
pub fn main_with(registry: ParserRegistry, cmd: &mut Command) -> ! {
    let (name, args) = program_name();
    let exit = Dispatcher::new(registry).dispatch(&name, cmd, &args);
    let _ = io::stdout().flush();
    std::process::exit(exit.code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Shared, shared};
    use crate::error::BoxError;
    use crate::error::ParseError;
    use crate::record::Field;
    use crate::value::{FlagType, Kind, Value};

    type Log = Rc<RefCell<Vec<String>>>;

    struct Traced {
        name: &'static str,
        log: Log,
        fail_validation: bool,
        value: String,
    }

    impl Traced {
        fn new(name: &'static str, log: &Log) -> Shared<Traced> {
            shared(Traced {
                name,
                log: Rc::clone(log),
                fail_validation: false,
                value: String::new(),
            })
        }
    }

    impl Record for Traced {
        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![Field::scalar("Value", &mut self.value).name(self.name)]
        }

        fn init(&mut self) -> Result<(), BoxError> {
            self.log.borrow_mut().push(format!("init {}", self.name));
            Ok(())
        }

        fn configured(&mut self) -> Result<(), BoxError> {
            self.log.borrow_mut().push(format!("configured {}", self.name));
            if self.fail_validation {
                return Err(format!("{} is invalid", self.name).into());
            }
            Ok(())
        }

        fn close(&mut self) -> Result<(), BoxError> {
            self.log.borrow_mut().push(format!("close {}", self.name));
            Ok(())
        }
    }

    struct Tree {
        root: Command,
        log: Log,
        a: Shared<Traced>,
        b: Shared<Traced>,
        c: Shared<Traced>,
    }

    fn tree() -> Tree {
        let log: Log = Rc::default();
        let a = Traced::new("a", &log);
        let b = Traced::new("b", &log);
        let c = Traced::new("c", &log);
        let mut root = Command::new();
        root.flags(a.clone()).short("root");
        let run_log = Rc::clone(&log);
        root.command("b")
            .flags(b.clone())
            .short("middle")
            .command("c")
            .flags(c.clone())
            .short("leaf")
            .run_args(move |args: &[String]| -> Result<(), BoxError> {
                run_log.borrow_mut().push(format!("run {}", args.join(",")));
                match args.first().map(String::as_str) {
                    Some("fail") => Err("handler failed".into()),
                    Some("empty") => Err("".into()),
                    _ => Ok(()),
                }
            });
        Tree { root, log, a, b, c }
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn run(cmd: &mut Command, list: &[&str]) -> (Exit, String, String) {
        let mut dispatcher =
            Dispatcher::with_output(ParserRegistry::new(), Vec::new(), Vec::new());
        let exit = dispatcher.dispatch("app", cmd, &args(list));
        let (out, err) = dispatcher.into_output();
        (
            exit,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    fn entries(log: &Log) -> Vec<String> {
        log.borrow().clone()
    }

    #[test]
    fn test_lifecycle_order() {
        let mut t = tree();
        let (exit, _, err) = run(&mut t.root, &["-a", "1", "b", "-b=2", "c", "-c", "3", "x", "y"]);
        assert!(matches!(exit, Exit::Success));
        assert_eq!(err, "");
        assert_eq!(
            entries(&t.log),
            vec![
                "init a",
                "init b",
                "init c",
                "configured a",
                "configured b",
                "configured c",
                "run x,y",
                "close c",
                "close b",
                "close a",
            ]
        );
        assert_eq!(t.a.borrow().value, "1");
        assert_eq!(t.b.borrow().value, "2");
        assert_eq!(t.c.borrow().value, "3");
    }

    #[test]
    fn test_validation_failure_cleans_up_validated_prefix() {
        let mut t = tree();
        t.b.borrow_mut().fail_validation = true;
        let (exit, _, err) = run(&mut t.root, &["b", "c"]);
        assert_eq!(exit.code(), 1);
        assert!(matches!(exit, Exit::Failure(CommandError::Validation { .. })));
        assert_eq!(err, "b is invalid\n");
        let log = entries(&t.log);
        assert!(!log.iter().any(|e| e.starts_with("run") || e == "configured c"));
        assert!(!log.contains(&"close c".to_string()));
        assert_eq!(&log[log.len() - 2..], ["close b", "close a"]);
    }

    #[test]
    fn test_handler_error_still_cleans_up() {
        let mut t = tree();
        let (exit, _, err) = run(&mut t.root, &["b", "c", "fail"]);
        assert_eq!(exit.code(), 1);
        assert_eq!(err, "handler failed\n");
        let log = entries(&t.log);
        assert_eq!(&log[log.len() - 3..], ["close c", "close b", "close a"]);
    }

    #[test]
    fn test_empty_error_becomes_usage() {
        let mut t = tree();
        let (_, _, err) = run(&mut t.root, &["b", "c", "empty"]);
        assert_eq!(err, "wrong usage\n");

        let mut t = tree();
        t.root
            .commands_mut()
            .get_mut("b")
            .and_then(|b| b.commands_mut().get_mut("c"))
            .unwrap()
            .usage_line("<name>");
        let (exit, _, err) = run(&mut t.root, &["b", "c", "empty"]);
        assert!(matches!(exit, Exit::Failure(CommandError::Usage(_))));
        assert_eq!(err, "usage: <name>\n");
    }

    #[test]
    fn test_skip_validation_anywhere_in_chain() {
        let mut t = tree();
        t.a.borrow_mut().fail_validation = true;
        t.root
            .commands_mut()
            .get_mut("b")
            .unwrap()
            .skip_validation();
        let (exit, _, _) = run(&mut t.root, &["b", "c"]);
        assert!(matches!(exit, Exit::Success));
        let log = entries(&t.log);
        assert!(!log.iter().any(|e| e.starts_with("configured")));
        assert!(log.iter().any(|e| e == "close a"));
    }

    #[test]
    fn test_group_without_arguments_prints_usage() {
        let mut t = tree();
        let (exit, out, err) = run(&mut t.root, &["b"]);
        assert!(matches!(exit, Exit::Help));
        assert_eq!(err, "");
        assert!(out.contains("Usage:\napp [options] b [options] <command>\n"));
        assert!(out.contains("Available Commands:\n  c leaf\n"));
        assert!(!entries(&t.log).iter().any(|e| e.starts_with("close")));
    }

    #[test]
    fn test_no_such_command() {
        let mut t = tree();
        let (exit, out, err) = run(&mut t.root, &["nope"]);
        assert_eq!(exit.code(), 1);
        assert_eq!(out, "");
        assert!(err.starts_with("no such command: nope\n"));
        assert!(err.contains("Available Commands:"));
    }

    #[test]
    fn test_parse_error_exits_with_failure() {
        let mut t = tree();
        let (exit, _, err) = run(&mut t.root, &["-zzz"]);
        assert!(matches!(exit, Exit::Failure(CommandError::Flag(FlagError::Undefined(_)))));
        assert!(err.starts_with("flag provided but not defined: -zzz\n"));
    }

    #[test]
    fn test_help_lists_levels_most_specific_first() {
        let mut t = tree();
        let (exit, out, _) = run(&mut t.root, &["b", "c", "-h"]);
        assert!(matches!(exit, Exit::Help));
        let options = out.find("\nOptions:").unwrap();
        let middle = out.find("\nb Options:").unwrap();
        let global = out.find("\nGlobal Options:").unwrap();
        assert!(options < middle && middle < global);
        assert!(out.starts_with("leaf\n\nUsage:\napp [options] b [options] c [options]\n"));
    }

    #[test]
    fn test_init_runs_once_per_node() {
        let mut t = tree();
        run(&mut t.root, &["b", "c"]);
        run(&mut t.root, &["b", "c"]);
        let inits = entries(&t.log)
            .iter()
            .filter(|e| e.starts_with("init"))
            .count();
        assert_eq!(inits, 3);
    }

    #[derive(Default)]
    struct Greeting {
        s: String,
    }

    impl Record for Greeting {
        fn init(&mut self) -> Result<(), BoxError> {
            self.s = "default".to_string();
            Ok(())
        }

        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![Field::scalar("S", &mut self.s).usage("a string")]
        }
    }

    fn greeter() -> (Command, Log) {
        let greeting = shared(Greeting::default());
        let seen: Log = Rc::default();
        let (g, record) = (greeting.clone(), Rc::clone(&seen));
        let mut root = Command::new();
        root.flags(greeting).run_args(move |rest: &[String]| -> Result<(), BoxError> {
            record
                .borrow_mut()
                .push(format!("{} {}", g.borrow().s, rest.join(" ")));
            Ok(())
        });
        (root, seen)
    }

    #[test]
    fn test_defaults_and_overrides() {
        let (mut root, seen) = greeter();
        run(&mut root, &[]);
        assert_eq!(entries(&seen), vec!["default "]);

        let (mut root, seen) = greeter();
        run(&mut root, &["-s", "custom", "arg1"]);
        assert_eq!(entries(&seen), vec!["custom arg1"]);
    }

    #[test]
    fn test_help_shows_initialized_default() {
        let (mut root, seen) = greeter();
        let (exit, out, _) = run(&mut root, &["-h"]);
        assert_eq!(exit.code(), 0);
        assert!(entries(&seen).is_empty());
        assert_eq!(
            out,
            "\nUsage:\napp [options]\n\nGlobal Options:\n  -h\thelp\n  -s value\n    \ta string (default \"default\")\n"
        );
    }

    #[test]
    fn test_leaf_without_handler_prints_usage() {
        let mut root = Command::new();
        root.short("nothing to do");
        let (exit, out, _) = run(&mut root, &[]);
        assert!(matches!(exit, Exit::Help));
        assert_eq!(out, "nothing to do\n\nUsage:\napp\n");
    }

    #[test]
    fn test_cleanup_error_does_not_replace_primary() {
        struct Stubborn;
        impl Record for Stubborn {
            fn fields(&mut self) -> Vec<Field<'_>> {
                Vec::new()
            }

            fn close(&mut self) -> Result<(), BoxError> {
                Err("cannot close".into())
            }
        }
        let mut root = Command::new();
        root.flags(shared(Stubborn))
            .run_args(|_: &[String]| -> Result<(), BoxError> { Err("boom".into()) });
        let (exit, _, err) = run(&mut root, &[]);
        assert!(matches!(exit, Exit::Failure(CommandError::Run(_))));
        assert_eq!(err, "app: cannot close\nboom\n");
    }

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    struct Share(f32);

    impl FlagType for Share {
        const KIND: Option<Kind> = Some(Kind::Float(32));

        fn from_value(value: Value) -> Result<Self, ParseError> {
            f32::from_value(value).map(Share)
        }

        fn render(&self) -> String {
            self.0.render()
        }
    }

    #[derive(Default)]
    struct Split {
        share: Share,
    }

    impl Record for Split {
        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![Field::scalar("Share", &mut self.share).name("f")]
        }
    }

    #[test]
    fn test_registered_parser_for_kind_newtype() {
        let mut registry = ParserRegistry::new();
        registry.register::<Share, _>(|s| {
            let digits = s
                .strip_suffix('%')
                .ok_or_else(|| ParseError::Custom(format!("expected a percentage, got {s:?}")))?;
            let n: f32 = digits.parse().map_err(|_| ParseError::Syntax {
                kind: "percentage",
                input: s.to_string(),
            })?;
            Ok(Share(n / 100.0))
        });

        let split = shared(Split::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (record, sink) = (split.clone(), Rc::clone(&seen));
        let mut root = Command::new();
        root.flags(split)
            .run_fn_with(&registry, move |n: Share| {
                sink.borrow_mut().push((record.borrow().share, n));
            });

        let mut dispatcher = Dispatcher::with_output(registry, Vec::new(), Vec::new());
        let exit = dispatcher.dispatch("app", &mut root, &args(&["-f", "50%", "25%"]));
        let (_, err) = dispatcher.into_output();
        assert!(matches!(exit, Exit::Success), "{}", String::from_utf8_lossy(&err));
        assert_eq!(*seen.borrow(), vec![(Share(0.5), Share(0.25))]);
    }
}
