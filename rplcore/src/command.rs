//! Command identifiers and their parsing/rendering properties.

use strum::{EnumIter, FromRepr, IntoEnumIterator};

/// Binding strength of operators, loosest first.
pub mod precedence {
    pub const NONE: u8 = 0;
    pub const PARENTHESES: u8 = 1;
    pub const WHERE: u8 = 2;
    pub const EQUATION: u8 = 3;
    pub const LOGICAL: u8 = 4;
    pub const RELATIONAL: u8 = 5;
    pub const ADDITIVE: u8 = 6;
    pub const MULTIPLICATIVE: u8 = 7;
    pub const NEGATE: u8 = 8;
    pub const POWER: u8 = 9;
    pub const FUNCTION: u8 = 10;
    pub const POSTFIX: u8 = 11;
    pub const PRIMARY: u8 = 12;
}

/// How a command is written inside an algebraic expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fixity {
    /// `a + b`
    Infix,
    /// `-a`, `not a`
    Prefix,
    /// `a²`
    Postfix,
    /// `sin(a)`, `hypot(a; b)`
    Function,
    /// Only valid in programs and on the command line.
    Stack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: &'static str,
    pub long: &'static str,
    pub aliases: &'static [&'static str],
    /// Spelling inside algebraic expressions when it differs from `name`.
    pub glyph: Option<&'static str>,
    pub arity: u8,
    pub fixity: Fixity,
    pub precedence: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, FromRepr)]
#[repr(u8)]
pub enum Command {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Rem,
    Pow,
    Hypot,
    Atan2,
    Xroot,

    Neg,
    Inv,
    Sq,
    Cube,
    Fact,
    Sqrt,
    Abs,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Exp,
    Ln,
    Log,
    Alog,

    Equation,
    Same,
    NotEqual,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    And,
    Or,
    Xor,
    Not,
    Where,

    ToNum,
    ToPoly,
    ToExpr,
    Eval,
    Root,

    Dup,
    Drop,
    Swap,
    Over,
    Rot,
    Depth,
    Pick,
    Clear,
    Dup2,
    Drop2,

    Sto,
    Rcl,
    Purge,
    CrDir,
    UpDir,
    Home,
}

const fn info(
    name: &'static str,
    long: &'static str,
    aliases: &'static [&'static str],
    arity: u8,
    fixity: Fixity,
    precedence: u8,
) -> CommandInfo {
    CommandInfo {
        name,
        long,
        aliases,
        glyph: None,
        arity,
        fixity,
        precedence,
    }
}

const fn with_glyph(mut info: CommandInfo, glyph: &'static str) -> CommandInfo {
    info.glyph = Some(glyph);
    info
}

use Fixity::*;
use precedence::*;

impl Command {
    pub fn info(self) -> CommandInfo {
        match self {
            Command::Add => info("+", "add", &[], 2, Infix, ADDITIVE),
            Command::Sub => info("-", "subtract", &[], 2, Infix, ADDITIVE),
            Command::Mul => info("*", "multiply", &["×", "·"], 2, Infix, MULTIPLICATIVE),
            Command::Div => info("/", "divide", &["÷"], 2, Infix, MULTIPLICATIVE),
            Command::Mod => info("mod", "modulo", &[], 2, Infix, MULTIPLICATIVE),
            Command::Rem => info("rem", "remainder", &[], 2, Infix, MULTIPLICATIVE),
            Command::Pow => info("^", "power", &["↑", "pow"], 2, Infix, POWER),
            Command::Hypot => info("hypot", "hypotenuse", &[], 2, Function, FUNCTION),
            Command::Atan2 => info("atan2", "arc_tangent2", &[], 2, Function, FUNCTION),
            Command::Xroot => info("xroot", "nth_root", &[], 2, Function, FUNCTION),

            Command::Neg => with_glyph(info("neg", "negate", &[], 1, Prefix, NEGATE), "-"),
            Command::Inv => with_glyph(info("inv", "invert", &["⁻¹"], 1, Postfix, POSTFIX), "⁻¹"),
            Command::Sq => with_glyph(info("sq", "square", &["²"], 1, Postfix, POSTFIX), "²"),
            Command::Cube => with_glyph(info("cubed", "cube", &["³"], 1, Postfix, POSTFIX), "³"),
            Command::Fact => info("!", "factorial", &["fact"], 1, Postfix, POSTFIX),
            Command::Sqrt => info("sqrt", "square_root", &["√"], 1, Function, FUNCTION),
            Command::Abs => info("abs", "absolute_value", &["norm"], 1, Function, FUNCTION),
            Command::Sin => info("sin", "sine", &[], 1, Function, FUNCTION),
            Command::Cos => info("cos", "cosine", &[], 1, Function, FUNCTION),
            Command::Tan => info("tan", "tangent", &[], 1, Function, FUNCTION),
            Command::Asin => info("asin", "arc_sine", &[], 1, Function, FUNCTION),
            Command::Acos => info("acos", "arc_cosine", &[], 1, Function, FUNCTION),
            Command::Atan => info("atan", "arc_tangent", &[], 1, Function, FUNCTION),
            Command::Exp => info("exp", "exponential", &[], 1, Function, FUNCTION),
            Command::Ln => info("ln", "natural_log", &[], 1, Function, FUNCTION),
            Command::Log => info("log", "common_log", &["log10"], 1, Function, FUNCTION),
            Command::Alog => info("alog", "exp10", &[], 1, Function, FUNCTION),

            Command::Equation => info("=", "equation", &[], 2, Infix, EQUATION),
            Command::Same => info("==", "same", &[], 2, Infix, RELATIONAL),
            Command::NotEqual => info("≠", "not_equal", &["<>", "!="], 2, Infix, RELATIONAL),
            Command::Less => info("<", "less_than", &[], 2, Infix, RELATIONAL),
            Command::LessEq => info("≤", "less_or_equal", &["<="], 2, Infix, RELATIONAL),
            Command::Greater => info(">", "greater_than", &[], 2, Infix, RELATIONAL),
            Command::GreaterEq => info("≥", "greater_or_equal", &[">="], 2, Infix, RELATIONAL),
            Command::And => info("and", "and", &[], 2, Infix, LOGICAL),
            Command::Or => info("or", "or", &[], 2, Infix, LOGICAL),
            Command::Xor => info("xor", "xor", &[], 2, Infix, LOGICAL),
            Command::Not => info("not", "not", &[], 1, Prefix, LOGICAL),
            Command::Where => info("|", "where", &[], 2, Infix, WHERE),

            Command::ToNum => info("→num", "to_decimal", &["->num", "tonum"], 1, Stack, NONE),
            Command::ToPoly => info("→poly", "to_polynomial", &["->poly"], 1, Stack, NONE),
            Command::ToExpr => info("→expr", "to_expression", &["->expr"], 1, Stack, NONE),
            Command::Eval => info("eval", "evaluate", &[], 1, Stack, NONE),
            Command::Root => info("root", "solve_root", &["solve"], 3, Stack, NONE),

            Command::Dup => info("dup", "duplicate", &[], 1, Stack, NONE),
            Command::Drop => info("drop", "drop", &[], 1, Stack, NONE),
            Command::Swap => info("swap", "swap", &[], 2, Stack, NONE),
            Command::Over => info("over", "over", &[], 2, Stack, NONE),
            Command::Rot => info("rot", "rotate", &[], 3, Stack, NONE),
            Command::Depth => info("depth", "depth", &[], 0, Stack, NONE),
            Command::Pick => info("pick", "pick", &[], 1, Stack, NONE),
            Command::Clear => info("clear", "clear_stack", &[], 0, Stack, NONE),
            Command::Dup2 => info("dup2", "duplicate2", &[], 2, Stack, NONE),
            Command::Drop2 => info("drop2", "drop2", &[], 2, Stack, NONE),

            Command::Sto => info("sto", "store", &["▶"], 2, Stack, NONE),
            Command::Rcl => info("rcl", "recall", &[], 1, Stack, NONE),
            Command::Purge => info("purge", "purge", &[], 1, Stack, NONE),
            Command::CrDir => info("crdir", "create_directory", &[], 1, Stack, NONE),
            Command::UpDir => info("updir", "up_directory", &[], 0, Stack, NONE),
            Command::Home => info("home", "home", &[], 0, Stack, NONE),
        }
    }

    pub fn opcode(self) -> u8 {
        self as u8
    }

    pub fn from_opcode(opcode: u64) -> Option<Self> {
        u8::try_from(opcode).ok().and_then(Self::from_repr)
    }

    /// Find a command by name, long name or alias, ignoring case.
    pub fn lookup(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        Self::iter().find(|cmd| {
            let info = cmd.info();
            info.name == lower
                || info.long == lower
                || info.aliases.iter().any(|alias| *alias == lower)
        })
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn arity(self) -> usize {
        self.info().arity as usize
    }

    pub fn fixity(self) -> Fixity {
        self.info().fixity
    }

    pub fn precedence(self) -> u8 {
        self.info().precedence
    }

    /// Commands that may appear inside an algebraic expression.
    pub fn is_algebraic(self) -> bool {
        self.fixity() != Fixity::Stack
    }

    /// Number of operands the command takes inside an algebraic expression.
    pub fn operands(self) -> usize {
        if self.is_algebraic() { self.arity() } else { 0 }
    }
}
