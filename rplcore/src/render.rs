//! Text form of objects.
//!
//! Output parses back to an equal object, except for the display-only
//! [`RenderFlags::MIXED_FRACTIONS`] form and alternate multiplication glyphs.

use std::fmt::{self, Write as _};

use bigdecimal::BigDecimal;
use num_bigint::Sign;
use num_traits::Zero;

use crate::{
    command::{Command, Fixity, precedence},
    object::{Complex, Fraction, Object, postfix},
    settings::{Precision, RenderFlags, Settings},
};

/// Render `object` into a new string.
pub fn render(object: &Object, settings: &Settings) -> String {
    let mut out = String::new();
    render_into(object, &mut out, settings);
    out
}

/// Append the text form of `object` to `out`.
pub fn render_into(object: &Object, out: &mut String, settings: &Settings) {
    // Writing into a String cannot fail
    let _ = write!(out, "{}", object.display(settings));
}

impl Object {
    /// Build a formatting helper that renders the object under the given settings.
    pub fn display<'a>(&'a self, settings: &'a Settings) -> impl fmt::Display + 'a {
        struct Fmt<'a> {
            object: &'a Object,
            settings: &'a Settings,
        }

        impl fmt::Display for Fmt<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write_object(f, self.object, self.settings)
            }
        }

        Fmt {
            object: self,
            settings,
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_object(f, self, &Settings::default())
    }
}

/// Spelling of a command name under the case and long-name flags.
pub fn command_name(cmd: Command, settings: &Settings) -> String {
    let info = cmd.info();
    let name = if settings.render.contains(RenderFlags::LONG_NAMES) {
        info.long
    } else {
        info.name
    };
    if settings.render.contains(RenderFlags::UPPERCASE) {
        name.to_uppercase()
    } else if settings.render.contains(RenderFlags::LOWERCASE) {
        name.to_lowercase()
    } else {
        name.to_string()
    }
}

fn write_object(f: &mut fmt::Formatter<'_>, object: &Object, settings: &Settings) -> fmt::Result {
    match object {
        Object::Integer(i) => {
            if i.is_negative() {
                f.write_char('-')?;
            }
            write!(f, "{}", i.magnitude())
        }
        Object::Bignum(b) => write!(f, "{b}"),
        Object::Fraction(q) => write_fraction(f, q, settings),
        Object::Decimal(d) => write_decimal(f, &d.value, d.precision),
        Object::Complex(c) => {
            let (a, b) = c.parts();
            let separator = match c {
                Complex::Rectangular(..) => ';',
                Complex::Polar(..) => '∡',
            };
            write!(
                f,
                "({}{separator}{})",
                a.display(settings),
                b.display(settings)
            )
        }
        Object::Symbol(s) => write!(f, "{s}"),
        Object::Text(t) => write!(f, "\"{t}\""),
        Object::List(items) => write_sequence(f, "{", "}", items, settings),
        Object::Array(items) => write_sequence(f, "[", "]", items, settings),
        Object::Program(items) => write_sequence(f, "«", "»", items, settings),
        Object::Expression(items) => write!(f, "'{}'", infix(items, settings)),
        Object::Polynomial(p) => write!(f, "Ⓟ'{}'", infix(&p.to_expression(), settings)),
        Object::Unit(u) => write!(f, "{}_{}", u.value.display(settings), infix(&u.unit, settings)),
        Object::Command(cmd) => f.write_str(&command_name(*cmd, settings)),
    }
}

fn write_sequence(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    close: &str,
    items: &[Object],
    settings: &Settings,
) -> fmt::Result {
    f.write_str(open)?;
    for item in items {
        write!(f, " {}", item.display(settings))?;
    }
    write!(f, " {close}")
}

const SUPERSCRIPT: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];
const SUBSCRIPT: [char; 10] = ['₀', '₁', '₂', '₃', '₄', '₅', '₆', '₇', '₈', '₉'];

fn shifted(digits: &str, table: &[char; 10]) -> String {
    digits
        .bytes()
        .map(|b| table[(b - b'0') as usize])
        .collect()
}

fn write_fraction(f: &mut fmt::Formatter<'_>, q: &Fraction, settings: &Settings) -> fmt::Result {
    let (num, den) = q.magnitude();
    if q.is_negative() {
        f.write_char('-')?;
    }
    if !settings.render.contains(RenderFlags::MIXED_FRACTIONS) {
        return write!(f, "{num}/{den}");
    }
    let whole = num / den;
    let rest = num % den;
    if !whole.is_zero() {
        write!(f, "{whole} ")?;
    }
    write!(
        f,
        "{}/{}",
        shifted(&rest.to_string(), &SUPERSCRIPT),
        shifted(&den.to_string(), &SUBSCRIPT)
    )
}

/// Positional notation while the exponent fits the precision, scientific otherwise.
fn write_decimal(f: &mut fmt::Formatter<'_>, value: &BigDecimal, precision: Precision) -> fmt::Result {
    if value.is_zero() {
        return f.write_str("0.");
    }
    let (mantissa, mut scale) = value.as_bigint_and_exponent();
    let mut digits = mantissa.magnitude().to_string();
    while digits.len() > 1 && digits.ends_with('0') {
        digits.pop();
        scale -= 1;
    }
    if mantissa.sign() == Sign::Minus {
        f.write_char('-')?;
    }
    let exponent = digits.len() as i64 - 1 - scale;
    if (-5..precision.digits() as i64).contains(&exponent) {
        if scale <= 0 {
            write!(f, "{digits}{}.", "0".repeat(scale.unsigned_abs() as usize))
        } else if scale as usize >= digits.len() {
            write!(f, "0.{}{digits}", "0".repeat(scale as usize - digits.len()))
        } else {
            let (int, frac) = digits.split_at(digits.len() - scale as usize);
            write!(f, "{int}.{frac}")
        }
    } else {
        let (first, rest) = digits.split_at(1);
        f.write_str(first)?;
        if !rest.is_empty() {
            write!(f, ".{rest}")?;
        }
        write!(f, "E{exponent}")
    }
}

/// Rendered sub-expression and the precedence of its outermost operator.
struct Fragment {
    text: String,
    level: u8,
}

impl Fragment {
    fn wrapped(self, parens: bool) -> String {
        if parens {
            format!("({})", self.text)
        } else {
            self.text
        }
    }
}

fn leaf(object: &Object, settings: &Settings) -> Fragment {
    let level = match object {
        Object::Fraction(_) => precedence::MULTIPLICATIVE,
        _ if object.is_real() && object.is_negative() => precedence::NEGATE,
        _ => precedence::PRIMARY,
    };
    Fragment {
        text: render(object, settings),
        level,
    }
}

fn operator(cmd: Command, settings: &Settings) -> String {
    match cmd {
        Command::Mul if settings.render.contains(RenderFlags::MULTIPLY_DOT) => "·".into(),
        Command::Mul if settings.render.contains(RenderFlags::MULTIPLY_CROSS) => "×".into(),
        _ => {
            let name = command_name(cmd, settings);
            if name.chars().any(char::is_alphanumeric) {
                format!(" {name} ")
            } else {
                name
            }
        }
    }
}

fn node(cmd: Command, args: Vec<Fragment>, settings: &Settings) -> Fragment {
    let level = cmd.precedence();
    let mut args = args.into_iter();
    match (cmd.fixity(), args.next(), args.next()) {
        (Fixity::Infix, Some(l), Some(r)) => {
            let l_parens = l.level < level;
            let r_parens = r.level <= level || r.text.starts_with('-');
            Fragment {
                text: format!(
                    "{}{}{}",
                    l.wrapped(l_parens),
                    operator(cmd, settings),
                    r.wrapped(r_parens)
                ),
                level,
            }
        }
        (Fixity::Prefix, Some(a), None) => {
            let parens = a.level <= level;
            let glyph = match cmd.info().glyph {
                Some(glyph) => glyph.to_string(),
                None => format!("{} ", command_name(cmd, settings)),
            };
            Fragment {
                text: format!("{glyph}{}", a.wrapped(parens)),
                level,
            }
        }
        (Fixity::Postfix, Some(a), None) => {
            let parens = a.level < precedence::POSTFIX;
            let glyph = cmd.info().glyph.unwrap_or(cmd.name());
            Fragment {
                text: format!("{}{glyph}", a.wrapped(parens)),
                level: precedence::POSTFIX,
            }
        }
        (_, first, second) => {
            let mut args: Vec<String> = first.into_iter().chain(second).chain(args).map(|a| a.text).collect();
            if cmd == Command::Xroot {
                args.reverse();
            }
            Fragment {
                text: format!("{}({})", command_name(cmd, settings), args.join(";")),
                level: precedence::PRIMARY,
            }
        }
    }
}

/// Infix text of a postfix item list.
pub fn infix(items: &[Object], settings: &Settings) -> String {
    let folded = postfix::fold(
        items,
        |object| Ok(leaf(object, settings)),
        |cmd, args| Ok(node(cmd, args, settings)),
    );
    match folded {
        Ok(mut parts) if parts.len() == 1 => parts.remove(0).text,
        _ => items
            .iter()
            .map(|item| render(item, settings))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use num_bigint::BigInt;

    use super::*;
    use crate::{arithmetic::fraction, parser::parse};

    fn roundtrip(src: &str) -> String {
        let settings = Settings::default();
        match parse(src, &settings).unwrap() {
            Object::Program(items) => items
                .iter()
                .map(|item| render(item, &settings))
                .collect::<Vec<_>>()
                .join(" "),
            _ => unreachable!(),
        }
    }

    fn dec(text: &str) -> String {
        render(
            &Object::decimal(BigDecimal::from_str(text).unwrap(), Precision::Decimal64),
            &Settings::default(),
        )
    }

    #[test]
    fn decimals() {
        assert_eq!(dec("1.5"), "1.5");
        assert_eq!(dec("100"), "100.");
        assert_eq!(dec("0.25"), "0.25");
        assert_eq!(dec("-0.001"), "-0.001");
        assert_eq!(dec("0.00000015"), "1.5E-7");
        assert_eq!(dec("1E20"), "1E20");
        assert_eq!(dec("0"), "0.");
    }

    #[test]
    fn expressions() {
        assert_eq!(roundtrip("'1+2*3'"), "'1+2*3'");
        assert_eq!(roundtrip("'(1+2)*3'"), "'(1+2)*3'");
        assert_eq!(roundtrip("'2^3^2'"), "'2^3^2'");
        assert_eq!(roundtrip("'2^(3^2)'"), "'2^(3^2)'");
        assert_eq!(roundtrip("'a-(b-c)'"), "'a-(b-c)'");
        assert_eq!(roundtrip("'-X^2'"), "'-X^2'");
        assert_eq!(roundtrip("'(-2)^2'"), "'(-2)^2'");
        assert_eq!(roundtrip("'sin X²'"), "'sin(X²)'");
        assert_eq!(roundtrip("'(X+1)²'"), "'(X+1)²'");
        assert_eq!(roundtrip("'xroot(3;X)'"), "'xroot(3;X)'");
        assert_eq!(roundtrip("'X mod 3'"), "'X mod 3'");
        assert_eq!(roundtrip("'X+Y|X=1'"), "'X+Y|X=1'");
        assert_eq!(roundtrip("'not X'"), "'not X'");
    }

    #[test]
    fn containers_and_literals() {
        assert_eq!(roundtrip("{ 1 \"a\" X }"), "{ 1 \"a\" X }");
        assert_eq!(roundtrip("« dup * »"), "« dup * »");
        assert_eq!(roundtrip("-1/3 (1;2) 3_m"), "-1/3 (1;2) 3_m");
        assert_eq!(roundtrip("Ⓟ'X^2-3*X'"), "Ⓟ'X^2-3*X'");
    }

    #[test]
    fn flags() {
        let mut settings = Settings::default();
        settings.render = RenderFlags::LONG_NAMES | RenderFlags::UPPERCASE;
        assert_eq!(render(&Object::Command(Command::Dup), &settings), "DUPLICATE");
        settings.render = RenderFlags::MULTIPLY_DOT;
        let product = Object::Expression(vec![
            Object::integer(2),
            Object::symbol("X"),
            Object::Command(Command::Mul),
        ]);
        assert_eq!(render(&product, &settings), "'2·X'");
        settings.render = RenderFlags::MIXED_FRACTIONS;
        let q = fraction::make(BigInt::from(4), BigInt::from(3)).unwrap();
        assert_eq!(render(&q, &settings), "1 ¹/₃");
    }
}
