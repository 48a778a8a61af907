//! rplcore: object runtime and symbolic-algebra core for an RPL calculator.
//!
//! Every value the calculator manipulates is an [`Object`]. Objects live in
//! two forms: a decoded enum used while computing, and a compact byte
//! encoding stored in the runtime heap and referenced from the stack and
//! from directories.
//!
//! Encoding shape
//!  - Each encoded object starts with a LEB128 type identifier, followed by a
//!    type-specific payload. Sequences carry their byte length up front so a
//!    reader can skip them without decoding.
//!  - Commands are a single identifier with no payload; algebraic expressions
//!    are sequences of objects in postfix order.
//!
//! Numbers
//!  - Small integers, bignums, fractions, decimals with a configurable
//!    precision, and complex numbers in rectangular or polar form.
//!  - Exact results stay exact; decimals only appear when an operand is
//!    already decimal or when the result has no exact form.
//!
//! Example
//! ```
//! use rplcore::{Runtime, Settings, render};
//!
//! let mut rt = Runtime::new(Settings::default());
//! rt.run("1 3 / 1 6 / +").unwrap();
//! let top = rt.top().unwrap();
//! assert_eq!(render(&top, rt.settings()), "1/2");
//! ```

/// Arithmetic over the numeric tower, with symbolic fallback.
pub mod arithmetic;
/// Command identifiers, names and precedence.
pub mod command;
/// Byte encoding of objects.
pub mod encoding;
/// Error type shared by every layer.
pub mod error;
/// Program execution and evaluation of names and expressions.
pub mod eval;
/// Decoded objects and their helpers.
pub mod object;
/// Text to object parsing.
pub mod parser;
/// Sparse multivariate polynomials.
pub mod polynomial;
/// Object to text rendering.
pub mod render;
/// Heap, stack and directories.
pub mod runtime;
/// Display, precision and runtime settings.
pub mod settings;
/// Numerical root finder.
pub mod solver;

pub use error::{RplError, RplResult, Span};
pub use object::Object;
pub use parser::{Parsed, parse, parse_object};
pub use render::render;
pub use runtime::Runtime;
pub use settings::Settings;

pub mod prelude {
    //! Convenient re-exports for end users.
    pub use crate::command::Command;
    pub use crate::object::{Object, SeqKind, Symbol};
    pub use crate::polynomial::Polynomial;
    pub use crate::{RplError, RplResult, Runtime, Settings, parse, render};
}
