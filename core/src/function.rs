//! Adapts typed functions into positional-argument handlers.
//!
//! Any `Fn` whose parameters implement [`FlagType`] can back a command. The
//! last parameter may be [`Rest<T>`] to accept a variadic tail. The return
//! type is either `()` or `Result<(), E>` for an error `E` convertible into
//! [`BoxError`].
//!
//! ```
//! use flagtree_core::{ParserRegistry, Rest, wrap};
//!
//! let registry = ParserRegistry::new();
//! let handler = wrap(&registry, |name: String, times: u8| {
//!     assert_eq!((name.as_str(), times), ("x", 3));
//! })
//! .unwrap();
//! assert!(handler(&["x".to_string(), "3".to_string()]).is_ok());
//! assert!(handler(&["x".to_string()]).is_err());
//!
//! let join = wrap(&registry, |first: String, rest: Rest<String>| -> Result<(), String> {
//!     if rest.is_empty() { Err(format!("only {first}")) } else { Ok(()) }
//! })
//! .unwrap();
//! assert!(join(&["a".to_string(), "b".to_string()]).is_ok());
//! assert_eq!(join(&["a".to_string()]).unwrap_err().to_string(), "only a");
//! ```

use std::any::TypeId;
use std::marker::PhantomData;
use std::ops::Deref;

use crate::error::{ArgumentError, BoxError, ParseError, SignatureError};
use crate::registry::{ParseFn, ParserRegistry};
use crate::value::{FlagType, Kind, Value};

/// A command run handler over positional arguments.
pub type Handler = Box<dyn Fn(&[String]) -> Result<(), BoxError>>;

/// Trailing variadic parameter of a wrapped function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rest<T>(pub Vec<T>);

impl<T> Rest<T> {
    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T> Deref for Rest<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

/// Marker distinguishing functions that end in a [`Rest`] parameter.
pub struct Variadic<Args>(PhantomData<Args>);

/// Declared parameter type of a wrapped function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub type_name: &'static str,
    type_id: TypeId,
    kind: Option<Kind>,
}

impl Param {
    pub fn of<T: FlagType>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
            kind: T::KIND,
        }
    }

    fn is_string(&self) -> bool {
        self.type_id == TypeId::of::<String>()
    }
}

/// Parameter list of a wrapped function. For a variadic function the last
/// entry is the element type of its [`Rest`] parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<Param>,
    pub variadic: bool,
}

/// Result type of a wrapped function: `()` or `Result<(), E>`.
pub trait Outcome {
    fn into_result(self) -> Result<(), BoxError>;
}

impl Outcome for () {
    fn into_result(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E: Into<BoxError>> Outcome for Result<(), E> {
    fn into_result(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

/// A function that can be wrapped into a [`Handler`].
///
/// Implemented for closures and functions of up to six [`FlagType`]
/// parameters, optionally followed by a [`Rest`] parameter.
pub trait Function<Args>: 'static {
    fn signature() -> Signature;

    /// Calls the function with converted arguments, paired with their text.
    fn invoke(&self, args: Vec<(String, Value)>) -> Result<(), BoxError>;
}

type ArgIter = std::iter::Enumerate<std::vec::IntoIter<(String, Value)>>;

fn take<T: FlagType>(args: &mut ArgIter) -> Result<T, ArgumentError> {
    let Some((position, (text, value))) = args.next() else {
        return Err(ArgumentError::NotEnough {
            expected: 1,
            got: 0,
        });
    };
    value.into_flag::<T>().map_err(|source| ArgumentError::Invalid {
        position,
        value: text,
        source,
    })
}

fn take_rest<T: FlagType>(args: &mut ArgIter) -> Result<Rest<T>, ArgumentError> {
    args.map(|(position, (text, value))| {
        value.into_flag::<T>().map_err(|source| ArgumentError::Invalid {
            position,
            value: text,
            source,
        })
    })
    .collect::<Result<Vec<T>, _>>()
    .map(Rest)
}

macro_rules! impl_function {
    ($($param:ident $arg:ident),*) => {
        impl<Func, Out, $($param,)*> Function<($($param,)*)> for Func
        where
            Func: Fn($($param),*) -> Out + 'static,
            Out: Outcome,
            $($param: FlagType,)*
        {
            fn signature() -> Signature {
                Signature {
                    params: vec![$(Param::of::<$param>()),*],
                    variadic: false,
                }
            }

            #[allow(unused_mut, unused_variables)]
            fn invoke(&self, args: Vec<(String, Value)>) -> Result<(), BoxError> {
                let mut args = args.into_iter().enumerate();
                $(let $arg = take::<$param>(&mut args)?;)*
                (self)($($arg),*).into_result()
            }
        }

        impl<Func, Out, $($param,)* Tail> Function<Variadic<($($param,)* Tail,)>> for Func
        where
            Func: Fn($($param,)* Rest<Tail>) -> Out + 'static,
            Out: Outcome,
            $($param: FlagType,)*
            Tail: FlagType,
        {
            fn signature() -> Signature {
                Signature {
                    params: vec![$(Param::of::<$param>(),)* Param::of::<Tail>()],
                    variadic: true,
                }
            }

            #[allow(unused_mut)]
            fn invoke(&self, args: Vec<(String, Value)>) -> Result<(), BoxError> {
                let mut args = args.into_iter().enumerate();
                $(let $arg = take::<$param>(&mut args)?;)*
                let rest = take_rest::<Tail>(&mut args)?;
                (self)($($arg,)* rest).into_result()
            }
        }
    };
}

impl_function!();
impl_function!(A a);
impl_function!(A a, B b);
impl_function!(A a, B b, C c);
impl_function!(A a, B b, C c, D d);
impl_function!(A a, B b, C c, D d, E e);
impl_function!(A a, B b, C c, D d, E e, G g);

fn resolve(registry: &ParserRegistry, signature: &Signature) -> Result<Vec<ParseFn>, SignatureError> {
    signature
        .params
        .iter()
        .enumerate()
        .map(|(position, param)| {
            registry
                .resolve_id(param.type_id, param.kind)
                .ok_or(SignatureError::UnsupportedParam {
                    position,
                    type_name: param.type_name,
                })
        })
        .collect()
}

fn check_arity(signature: &Signature, got: usize) -> Result<(), ArgumentError> {
    let expected = signature.params.len();
    if expected == 0 {
        if got > 0 {
            return Err(ArgumentError::NoArguments { got });
        }
        return Ok(());
    }
    if signature.variadic {
        if got < expected - 1 {
            return Err(ArgumentError::NotEnough {
                expected: expected - 1,
                got,
            });
        }
        return Ok(());
    }
    if got < expected {
        return Err(ArgumentError::NotEnough { expected, got });
    }
    if got > expected {
        return Err(ArgumentError::TooMany { expected, got });
    }
    Ok(())
}

fn into_handler<Args, F: Function<Args>>(f: F, signature: Signature, parsers: Vec<ParseFn>) -> Handler {
    Box::new(move |args: &[String]| {
        check_arity(&signature, args.len())?;
        let last = parsers.len().saturating_sub(1);
        let mut values = Vec::with_capacity(args.len());
        for (position, text) in args.iter().enumerate() {
            let parse = &parsers[position.min(last)];
            let value = parse(text).map_err(|source: ParseError| ArgumentError::Invalid {
                position,
                value: text.clone(),
                source,
            })?;
            values.push((text.clone(), value));
        }
        f.invoke(values)
    })
}

/// Wraps `f` into a handler, resolving a parser for every parameter.
///
/// # Errors
///
/// Returns [`SignatureError::UnsupportedParam`] if a parameter type has no
/// parser in `registry`.
pub fn wrap<Args, F: Function<Args>>(registry: &ParserRegistry, f: F) -> Result<Handler, SignatureError> {
    let signature = F::signature();
    let parsers = resolve(registry, &signature)?;
    Ok(into_handler::<Args, F>(f, signature, parsers))
}

/// Like [`wrap`], but requires every parameter except the last to be
/// `String`, and the last one to be `String` or `Rest<String>`.
pub fn wrap_strict<Args, F: Function<Args>>(
    registry: &ParserRegistry,
    f: F,
) -> Result<Handler, SignatureError> {
    let signature = F::signature();
    if let Some((last, leading)) = signature.params.split_last() {
        if let Some(position) = leading.iter().position(|p| !p.is_string()) {
            return Err(SignatureError::NotString { position });
        }
        if !last.is_string() {
            return Err(SignatureError::LastNotString);
        }
    }
    wrap(registry, f)
}
