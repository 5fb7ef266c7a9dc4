mod app;

use std::cell::OnceCell;
use std::rc::Rc;

use flagtree_core::{BoxError, Command, ParserRegistry, Rest, shared};
use flagtree_usage::UsageTree;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::app::{App, Hello, Scratch, Timeout, parse_timeout};

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Documentation applied when no external usage file is given.
const EMBEDDED_USAGE: &str = include_str!("../usage.yaml");

/// Names a YAML usage file that replaces the embedded documentation.
const USAGE_ENV: &str = "FLAGTREE_USAGE";

/// Documentation of the whole tree, filled in once the tree is complete.
type Docs = Rc<OnceCell<UsageTree>>;

fn build() -> (Command, Docs) {
    let app = shared(App::default());
    let docs: Docs = Rc::default();

    let mut root = Command::new();
    root.flags(app.clone()).short("demonstrate command usage");

    let a = app.clone();
    root.command("flags")
        .short("demonstrate flag processing")
        .run(move || print!("{}", a.borrow().summary()));

    root.command("error")
        .short("demonstrate error handling")
        .run(|| -> Result<(), BoxError> { Err("here's an error".into()) });

    let hello = shared(Hello::default());
    let (a, h) = (app.clone(), hello.clone());
    root.command("hello")
        .flags(hello)
        .short("sub-command with args and additional flags")
        .usage_line("<name>...")
        .run_args(move |names: &[String]| -> Result<(), BoxError> {
            if names.is_empty() {
                // reported as a usage error
                return Err("".into());
            }
            print!("{}", a.borrow().summary());
            let prefix = h.borrow().prefix.clone();
            for name in names {
                println!("{prefix} {name}");
            }
            Ok(())
        });

    root.command("two")
        .short("two strings")
        .usage_line("<a> <b>")
        .run_fn(|a: String, b: String| println!("two: {a} {b}"));

    root.command("one+")
        .short("1+ args")
        .usage_line("<a> [b]...")
        .run_fn(|a: String, rest: Rest<String>| println!("one+: {a} [{}]", rest.join(" ")));

    root.command("mixed")
        .short("args with mixed types")
        .usage_line("<string> <int>")
        .run_fn(|a: String, n: i32| -> Result<(), BoxError> {
            println!("a={a} n={n}");
            Ok(())
        });

    root.command("version")
        .short("print the version")
        .run(|| println!("flagtree-demo {PACKAGE_VERSION}"))
        .skip_validation();

    let scratch = shared(Scratch::default());
    let s = scratch.clone();
    root.command("scratch")
        .flags(scratch)
        .short("write a file into a temporary directory")
        .run(move || -> Result<(), BoxError> {
            let scratch = s.borrow();
            let file = scratch.file().ok_or("scratch directory was not created")?;
            std::fs::write(&file, "scratch\n")?;
            println!("{}", file.display());
            Ok(())
        });

    let group = root.command("docs");
    group.short("print the documentation of all commands");
    let d = docs.clone();
    group
        .command("yaml")
        .short("print as YAML")
        .run(move || -> Result<(), BoxError> {
            let tree = d.get().ok_or("documentation is not available")?;
            print!("{}", tree.to_yaml()?);
            Ok(())
        });
    let d = docs.clone();
    group
        .command("json")
        .short("print as JSON")
        .run(move || -> Result<(), BoxError> {
            let tree = d.get().ok_or("documentation is not available")?;
            println!("{}", tree.to_json()?);
            Ok(())
        });

    (root, docs)
}

/// Applies the usage file named by [`USAGE_ENV`], or the embedded one.
fn load_usage(root: &mut Command) {
    match flagtree_usage::apply_env(root, USAGE_ENV) {
        Ok(true) => {
            debug!(var = USAGE_ENV, "Using external usage file");
            return;
        }
        Ok(false) => {}
        Err(e) => warn!(var = USAGE_ENV, error = %e, "Ignoring external usage file"),
    }
    if let Err(e) = flagtree_usage::apply_yaml(root, EMBEDDED_USAGE) {
        warn!(error = %e, "Embedded usage is invalid");
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let mut registry = ParserRegistry::new();
    registry.register::<Timeout, _>(parse_timeout);

    let (mut root, docs) = build();
    load_usage(&mut root);
    let _ = docs.set(UsageTree::extract(&root));

    flagtree_core::main_with(registry, &mut root)
}
