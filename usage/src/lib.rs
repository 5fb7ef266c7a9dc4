//! External documentation for flagtree command trees.
//!
//! A [`UsageTree`] mirrors a command tree and holds the short and long
//! descriptions, usage lines and examples of each command. Keeping this text
//! in a YAML file separates documentation from code:
//!
//! - [`apply_yaml`] / [`apply_file`] overlay a document onto a tree;
//! - [`apply_env`] does the same for a file named by an environment
//!   variable, so edited text can be previewed without rebuilding;
//! - [`to_yaml`] / [`to_json`] export the documentation already set in code.
//!
//! # Example
//!
//! ```
//! use flagtree_core::Command;
//!
//! let mut root = Command::new();
//! root.short("inventory tool");
//! root.command("list").short("list items");
//!
//! let yaml = flagtree_usage::to_yaml(&root).unwrap();
//! let mut bare = Command::new();
//! bare.command("list");
//! flagtree_usage::apply_yaml(&mut bare, &yaml).unwrap();
//! assert_eq!(bare.documentation().short, "inventory tool");
//! assert_eq!(bare.commands()["list"].documentation().short, "list items");
//! ```

mod error;
mod loader;
mod tree;

pub use error::{Result, UsageError};
pub use loader::{apply_env, apply_file, apply_yaml, to_json, to_yaml};
pub use tree::UsageTree;
