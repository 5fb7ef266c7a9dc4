//! Configuration records of the demo commands.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use flagtree_core::{BoxError, Field, FlagType, Kind, ParseError, Record, Value};
use tempfile::TempDir;
use tracing::debug;

/// A float flag with its own type.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Ratio(pub f32);

impl FlagType for Ratio {
    const KIND: Option<Kind> = Some(Kind::Float(32));

    fn from_value(value: Value) -> Result<Self, ParseError> {
        f32::from_value(value).map(Ratio)
    }

    fn render(&self) -> String {
        self.0.render()
    }
}

/// A duration written as `250ms` or `2s`. Has no built-in parser; see
/// [`parse_timeout`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timeout(pub Duration);

impl Default for Timeout {
    fn default() -> Self {
        Self(Duration::from_secs(2))
    }
}

impl FlagType for Timeout {
    fn render(&self) -> String {
        let ms = self.0.as_millis();
        if ms % 1000 == 0 {
            format!("{}s", ms / 1000)
        } else {
            format!("{ms}ms")
        }
    }
}

/// Parser for [`Timeout`] flags, registered with the dispatcher.
pub fn parse_timeout(s: &str) -> Result<Timeout, ParseError> {
    let (digits, scale) = if let Some(ms) = s.strip_suffix("ms") {
        (ms, 1)
    } else if let Some(secs) = s.strip_suffix('s') {
        (secs, 1000)
    } else {
        return Err(ParseError::Custom(format!(
            "invalid duration {s:?}: expected a ms or s suffix"
        )));
    };
    let n: u64 = digits.parse().map_err(|_| ParseError::Syntax {
        kind: "duration",
        input: s.to_string(),
    })?;
    let ms = n.checked_mul(scale).ok_or_else(|| ParseError::Range {
        type_name: "duration",
        input: s.to_string(),
    })?;
    Ok(Timeout(Duration::from_millis(ms)))
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Sub {
    pub x: String,
    pub y: String,
}

impl Record for Sub {
    fn fields(&mut self) -> Vec<Field<'_>> {
        vec![
            Field::scalar("X", &mut self.x).usage("X"),
            Field::scalar("Y", &mut self.y).usage("Y"),
        ]
    }
}

/// Global options shared by every command.
#[derive(Debug, Clone, PartialEq)]
pub struct App {
    pub s: String,
    pub b: bool,
    pub int_flag: i32,
    pub f: Ratio,
    pub sub1: Sub,
    pub sub2: Option<Sub>,
    pub sub3: Sub,
    pub tags: Vec<String>,
    pub timeout: Timeout,
}

impl Default for App {
    fn default() -> Self {
        Self {
            s: String::new(),
            b: false,
            int_flag: 0,
            f: Ratio::default(),
            sub1: Sub::default(),
            sub2: Some(Sub {
                x: "x2".to_string(),
                y: "y2".to_string(),
            }),
            sub3: Sub::default(),
            tags: Vec::new(),
            timeout: Timeout::default(),
        }
    }
}

impl App {
    /// Renders the current flag values, one per line.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "s: {}", self.s);
        let _ = writeln!(out, "b: {}", self.b);
        let _ = writeln!(out, "i: {}", self.int_flag);
        let _ = writeln!(out, "f: {:.6}", self.f.0);
        let _ = writeln!(out, "sub.x: {}", self.sub1.x);
        if let Some(sub2) = &self.sub2 {
            let _ = writeln!(out, "sub2.y: {}", sub2.y);
        }
        let _ = writeln!(out, "tags: [{}]", self.tags.join(" "));
        let _ = writeln!(out, "timeout: {}", self.timeout.render());
        out
    }
}

impl Record for App {
    fn fields(&mut self) -> Vec<Field<'_>> {
        vec![
            Field::scalar("S", &mut self.s)
                .name("s,s-flag")
                .usage("string flag with two names"),
            Field::scalar("B", &mut self.b),
            Field::scalar("IntFlag", &mut self.int_flag)
                .name("i")
                .usage("int flag"),
            Field::scalar("F", &mut self.f).name("f").usage("aliased float32"),
            Field::nested("Sub1", &mut self.sub1),
            Field::optional("Sub2", &mut self.sub2)
                .name("sub2")
                .usage("sub-2:"),
            Field::nested("Sub3", &mut self.sub3).name(""),
            Field::list("Tags", &mut self.tags)
                .name("tag")
                .usage("attach a `label`, may be repeated")
                .default("none"),
            Field::scalar("Timeout", &mut self.timeout).usage("operation timeout"),
        ]
    }

    fn init(&mut self) -> Result<(), BoxError> {
        self.s = "s-default".to_string();
        if let Some(sub2) = self.sub2.as_mut() {
            sub2.y = "y-default".to_string();
        }
        Ok(())
    }

    fn configured(&mut self) -> Result<(), BoxError> {
        if self.s.is_empty() {
            return Err("missing -s".into());
        }
        Ok(())
    }
}

/// Options of the `hello` command.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Hello {
    pub prefix: String,
}

impl Record for Hello {
    fn fields(&mut self) -> Vec<Field<'_>> {
        vec![Field::scalar("Prefix", &mut self.prefix).usage("greeting to print before each name")]
    }

    fn init(&mut self) -> Result<(), BoxError> {
        self.prefix = "hello".to_string();
        Ok(())
    }
}

/// Options of the `scratch` command. Validation creates a scratch
/// directory that cleanup removes again.
#[derive(Debug)]
pub struct Scratch {
    pub name: String,
    dir: Option<TempDir>,
}

impl Default for Scratch {
    fn default() -> Self {
        Self {
            name: "scratch.txt".to_string(),
            dir: None,
        }
    }
}

impl Scratch {
    /// Path of the scratch file inside the scratch directory.
    pub fn file(&self) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.path().join(&self.name))
    }
}

impl Record for Scratch {
    fn fields(&mut self) -> Vec<Field<'_>> {
        vec![Field::scalar("Name", &mut self.name).usage("file to create in the scratch directory")]
    }

    fn configured(&mut self) -> Result<(), BoxError> {
        if self.name.is_empty() || self.name.contains(std::path::MAIN_SEPARATOR) {
            return Err(format!("invalid scratch file name {:?}", self.name).into());
        }
        let dir = tempfile::Builder::new().prefix("flagtree-scratch").tempdir()?;
        debug!(path = %dir.path().display(), "Created scratch directory");
        self.dir = Some(dir);
        Ok(())
    }

    fn close(&mut self) -> Result<(), BoxError> {
        if let Some(dir) = self.dir.take() {
            debug!(path = %dir.path().display(), "Removing scratch directory");
            dir.close()?;
        }
        Ok(())
    }
}
