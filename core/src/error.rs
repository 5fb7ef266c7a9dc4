//! Error types for flag derivation, argument parsing and dispatch.

use thiserror::Error;

/// Error type returned by user hooks and run handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A string could not be converted into a flag or argument value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The text is not a valid literal for the target kind.
    #[error("invalid syntax for {kind}: {input:?}")]
    Syntax { kind: &'static str, input: String },
    /// The number does not fit the destination width.
    #[error("value out of range for {type_name}: {input:?}")]
    Range {
        type_name: &'static str,
        input: String,
    },
    /// A parser produced a value of a different type than the destination.
    #[error("parser produced a value that is not a {type_name}")]
    Mismatch { type_name: &'static str },
    /// No parser is registered for the type.
    #[error("no parser for {type_name}")]
    Unsupported { type_name: &'static str },
    /// A custom parser rejected the input.
    #[error("{0}")]
    Custom(String),
}

/// Errors raised while building or parsing a flag set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
    /// The flag is not defined at this command level.
    #[error("flag provided but not defined: -{0}")]
    Undefined(String),
    /// A non-boolean flag was given without a value.
    #[error("flag needs an argument: -{0}")]
    MissingValue(String),
    /// The value could not be parsed.
    #[error("invalid value {value:?} for flag -{name}: {source}")]
    InvalidValue {
        name: String,
        value: String,
        source: ParseError,
    },
    /// Malformed flag syntax such as `---x` or `-=x`.
    #[error("bad flag syntax: {0}")]
    BadSyntax(String),
    /// Two fields derived the same flag name.
    #[error("flag redefined: {0}")]
    Redefined(String),
}

/// Argument errors raised by wrapped functions at call time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    /// The function takes no arguments but some were given.
    #[error("function takes no arguments, got {got}")]
    NoArguments { got: usize },
    /// More arguments than parameters.
    #[error("too many arguments: expected {expected}, got {got}")]
    TooMany { expected: usize, got: usize },
    /// Fewer arguments than required.
    #[error("not enough arguments: expected {expected}, got {got}")]
    NotEnough { expected: usize, got: usize },
    /// An argument could not be converted to its parameter type.
    #[error("argument {position} ({value:?}): {source}")]
    Invalid {
        position: usize,
        value: String,
        source: ParseError,
    },
    /// Arguments given to a handler that accepts none.
    #[error("unrecognized arguments: {0}")]
    Unrecognized(String),
}

/// A function cannot be wrapped as a command handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// No parser resolves for a parameter type.
    #[error("function input({position}) has unsupported type {type_name}")]
    UnsupportedParam {
        position: usize,
        type_name: &'static str,
    },
    /// Strict wrapping requires leading parameters to be strings.
    #[error("function input({position}) is not String")]
    NotString { position: usize },
    /// Strict wrapping requires the last parameter to be `String` or `Rest<String>`.
    #[error("last input should be String or Rest<String>")]
    LastNotString,
}

/// Errors that end a dispatch with a failure exit code.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Flag parsing failed.
    #[error(transparent)]
    Flag(#[from] FlagError),
    /// The first positional argument names no subcommand.
    #[error("no such command: {0}")]
    NoSuchCommand(String),
    /// A record's initialize hook failed.
    #[error("{command}: {source}")]
    Init { command: String, source: BoxError },
    /// A record's validation hook failed.
    #[error("{source}")]
    Validation { command: String, source: BoxError },
    /// The run handler failed.
    #[error("{0}")]
    Run(BoxError),
    /// The run handler failed with an empty message.
    #[error("usage: {0}")]
    Usage(String),
    /// The run handler failed with an empty message and no usage line is set.
    #[error("wrong usage")]
    WrongUsage,
}
