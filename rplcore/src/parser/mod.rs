//! Parsing command lines and algebraic expressions into objects.
//!
//! Two stages:
//! 1) [`lexer::tokenize`] turns text into spanned tokens.
//! 2) A recursive descent over the tokens builds objects. Plain mode reads
//!    juxtaposed objects (`1 2 + { 3 4 }`); algebraic mode, used between
//!    quotes, climbs the operator precedence ladder in [`precedence`] and
//!    emits expressions in postfix order.
//!
//! All binary operators are left-associative, so `2^3^2` is `(2^3)^2`.
//! Prefix operators take their operand at the next tighter level: unary minus
//! binds looser than `^`, so `-2^2` is `-(2^2)`.

pub mod lexer;

use num_bigint::BigInt;

use crate::{
    arithmetic::{self, decimal, fraction},
    command::{Command, Fixity, precedence},
    error::{RplError, RplResult, Span},
    object::{Complex, Object, SeqKind, Symbol, Unit},
    polynomial::Polynomial,
    settings::Settings,
};
use lexer::{Spanned, Token, tokenize};

/// Outcome of [`parse_object`].
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    /// An object, and the number of source bytes it used.
    Object { object: Object, consumed: usize },
    /// Nothing but whitespace and comments.
    Skip,
}

/// Parse a whole command line into a program holding its objects in order.
pub fn parse(src: &str, settings: &Settings) -> RplResult<Object> {
    let mut parser = Parser::new(src, settings)?;
    let mut items = Vec::new();
    while let Some(object) = parser.object()? {
        items.push(object);
    }
    Ok(Object::Program(items))
}

/// Parse the first object of `src`.
///
/// With `kind` set, `src` is the body of a sequence whose opening delimiter was
/// already read, and parsing runs up to and including the closing delimiter.
/// Otherwise a precedence of zero reads one object in plain mode, and a higher
/// precedence reads an algebraic expression that stops at the first operator
/// binding looser than `precedence`.
pub fn parse_object(
    src: &str,
    settings: &Settings,
    kind: Option<SeqKind>,
    precedence: u8,
) -> RplResult<Parsed> {
    let mut parser = Parser::new(src, settings)?;
    let start = Span::new(0, 0);
    let object = match (kind, precedence) {
        (Some(SeqKind::Expression), _) => Object::Expression(parser.quoted_items(start)?),
        (Some(kind), _) => parser.sequence(kind, start)?,
        (None, 0) => match parser.object()? {
            Some(object) => object,
            None => return Ok(Parsed::Skip),
        },
        (None, level) => {
            if parser.peek().is_none() {
                return Ok(Parsed::Skip);
            }
            let mut items = Vec::new();
            parser.algebraic(level, &mut items)?;
            Object::Expression(items)
        }
    };
    Ok(Parsed::Object {
        object,
        consumed: parser.consumed(),
    })
}

fn unexpected(token: &Token, span: Span) -> RplError {
    RplError::syntax(format!("unexpected '{token}'"), span)
}

fn closing(kind: SeqKind) -> Token {
    match kind {
        SeqKind::List => Token::RBrace,
        SeqKind::Array => Token::RBracket,
        SeqKind::Program => Token::ProgramClose,
        SeqKind::Expression => Token::Quote,
    }
}

fn describe(kind: SeqKind) -> &'static str {
    match kind {
        SeqKind::List => "list",
        SeqKind::Array => "array",
        SeqKind::Program => "program",
        SeqKind::Expression => "expression",
    }
}

fn single_real(mut items: Vec<Object>, span: Span) -> RplResult<Object> {
    match items.pop() {
        Some(x) if items.is_empty() && x.is_real() => Ok(x),
        _ => Err(RplError::syntax("complex parts must be real numbers", span)),
    }
}

struct Parser<'s> {
    tokens: Vec<Spanned<Token>>,
    pos: usize,
    end: usize,
    settings: &'s Settings,
    depth: u32,
}

impl<'s> Parser<'s> {
    fn new(src: &str, settings: &'s Settings) -> RplResult<Self> {
        Ok(Self {
            tokens: tokenize(src)?,
            pos: 0,
            end: src.len(),
            settings,
            depth: 0,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    /// Span of the next token, or an empty span at the end of input.
    fn span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| *span)
            .unwrap_or(Span::new(self.end, 0))
    }

    fn advance(&mut self) -> Option<Spanned<Token>> {
        let next = self.tokens.get(self.pos).cloned();
        if next.is_some() {
            self.pos += 1;
        }
        next
    }

    fn consumed(&self) -> usize {
        match self.pos {
            0 => 0,
            n => self.tokens[n - 1].1.end(),
        }
    }

    /// The next token starts exactly where the previous one ended.
    fn adjacent(&self) -> bool {
        self.pos > 0
            && self.pos < self.tokens.len()
            && self.tokens[self.pos].1.offset == self.tokens[self.pos - 1].1.end()
    }

    fn adjacent_number(&mut self) -> Option<(String, Span)> {
        if !self.adjacent() {
            return None;
        }
        match self.tokens.get(self.pos) {
            Some((Token::Number(text), span)) => {
                let number = (text.clone(), *span);
                self.pos += 1;
                Some(number)
            }
            _ => None,
        }
    }

    /// Run `parse` one nesting level deeper, up to the recursion limit.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> RplResult<T>) -> RplResult<T> {
        if self.depth >= self.settings.max_recursion {
            return Err(RplError::syntax("nesting too deep", self.span()));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn unterminated(&self, what: &'static str, open: Span) -> RplError {
        RplError::Unterminated {
            what,
            span: Span::between(open.offset, self.end),
        }
    }

    fn number(&self, text: &str, span: Span) -> RplResult<Object> {
        let invalid = || RplError::syntax(format!("invalid number '{text}'"), span);
        if text.bytes().all(|b| b.is_ascii_digit()) {
            let value: BigInt = text.parse().map_err(|_| invalid())?;
            return Ok(Object::from_bigint(value));
        }
        let value = decimal::parse_literal(text).ok_or_else(invalid)?;
        Ok(Object::decimal(value, self.settings.precision))
    }

    // ---------------- Plain mode ----------------

    /// Next object in plain mode, `None` at the end of input.
    fn object(&mut self) -> RplResult<Option<Object>> {
        loop {
            let Some((token, span)) = self.advance() else {
                return Ok(None);
            };
            let object = match token {
                Token::Comma | Token::Semicolon => continue,
                Token::Number(text) => {
                    let value = self.number(&text, span)?;
                    self.literal_suffix(value)?
                }
                Token::Op(Command::Sub) => match self.adjacent_number() {
                    Some((text, span)) => {
                        let value = arithmetic::negate(&self.number(&text, span)?)?;
                        self.literal_suffix(value)?
                    }
                    None => Object::Command(Command::Sub),
                },
                Token::Op(cmd) => Object::Command(cmd),
                Token::Name(name) => match Command::lookup(&name) {
                    Some(cmd) => Object::Command(cmd),
                    None => self.literal_suffix(Object::Symbol(Symbol::new(name)))?,
                },
                Token::Text(body, true) => Object::Text(body),
                Token::Text(_, false) => return Err(self.unterminated("text", span)),
                Token::LBrace => self.sequence(SeqKind::List, span)?,
                Token::LBracket => self.sequence(SeqKind::Array, span)?,
                Token::ProgramOpen => self.sequence(SeqKind::Program, span)?,
                Token::Quote => Object::Expression(self.quoted_items(span)?),
                Token::PolynomialMark => self.polynomial(span)?,
                Token::LParen => self.complex(span)?,
                other => return Err(unexpected(&other, span)),
            };
            return Ok(Some(object));
        }
    }

    /// `1/3` and `3_m` written without spaces.
    fn literal_suffix(&mut self, mut value: Object) -> RplResult<Object> {
        if value.is_integer() && self.adjacent() && self.peek() == Some(&Token::Op(Command::Div)) {
            let save = self.pos;
            self.pos += 1;
            match self.adjacent_number() {
                Some((text, span)) if text.bytes().all(|b| b.is_ascii_digit()) => {
                    let denominator = self.number(&text, span)?;
                    if let (Some(n), Some(d)) = (value.to_bigint(), denominator.to_bigint()) {
                        value = fraction::make(n, d)?;
                    }
                }
                _ => self.pos = save,
            }
        }
        self.unit_suffix(value)
    }

    fn unit_suffix(&mut self, mut value: Object) -> RplResult<Object> {
        if self.adjacent() && self.peek() == Some(&Token::Underscore) {
            self.pos += 1;
            let mut unit = Vec::new();
            self.algebraic(precedence::MULTIPLICATIVE, &mut unit)?;
            value = Object::Unit(Unit {
                value: Box::new(value),
                unit,
            });
        }
        Ok(value)
    }

    fn sequence(&mut self, kind: SeqKind, open: Span) -> RplResult<Object> {
        if kind == SeqKind::Expression {
            return self.quoted_items(open).map(Object::Expression);
        }
        self.nested(|parser| parser.sequence_items(kind, open))
    }

    fn sequence_items(&mut self, kind: SeqKind, open: Span) -> RplResult<Object> {
        let close = closing(kind);
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.unterminated(describe(kind), open)),
                Some(token) if *token == close => {
                    self.pos += 1;
                    break;
                }
                Some(Token::Comma | Token::Semicolon) => self.pos += 1,
                Some(_) => {
                    if let Some(item) = self.object()? {
                        items.push(item);
                    }
                }
            }
        }
        Ok(kind.wrap(items))
    }

    fn complex(&mut self, open: Span) -> RplResult<Object> {
        let mut items = Vec::new();
        self.parenthesized(open, &mut items)?;
        match items.as_slice() {
            [number @ Object::Complex(_)] => Ok(number.clone()),
            _ => Err(RplError::syntax("complex number expected", open)),
        }
    }

    fn polynomial(&mut self, mark: Span) -> RplResult<Object> {
        let open = self.span();
        if self.peek() != Some(&Token::Quote) {
            return Err(RplError::syntax("expression expected after 'Ⓟ'", mark));
        }
        self.pos += 1;
        let items = self.quoted_items(open)?;
        Polynomial::from_expression(&items, self.settings)
            .map(Object::Polynomial)
            .map_err(|error| {
                RplError::syntax(
                    format!("not a polynomial: {error}"),
                    Span::between(mark.offset, self.consumed()),
                )
            })
    }

    // ---------------- Algebraic mode ----------------

    /// Expression body after an opening quote, up to and including the closing quote.
    fn quoted_items(&mut self, open: Span) -> RplResult<Vec<Object>> {
        let mut items = Vec::new();
        self.algebraic(precedence::PARENTHESES, &mut items)?;
        match self.advance() {
            Some((Token::Quote, _)) => Ok(items),
            None => Err(self.unterminated("expression", open)),
            Some((token, span)) => Err(unexpected(&token, span)),
        }
    }

    fn infix(&self) -> Option<Command> {
        let cmd = match self.peek()? {
            Token::Op(cmd) => *cmd,
            Token::Name(name) => Command::lookup(name)?,
            _ => return None,
        };
        (cmd.fixity() == Fixity::Infix).then_some(cmd)
    }

    /// Precedence climbing: operators binding at least as tight as `min`.
    fn algebraic(&mut self, min: u8, out: &mut Vec<Object>) -> RplResult<()> {
        self.nested(|parser| parser.climb(min, out))
    }

    fn climb(&mut self, min: u8, out: &mut Vec<Object>) -> RplResult<()> {
        self.primary(out)?;
        while let Some(cmd) = self.infix() {
            let level = cmd.precedence();
            if level < min {
                break;
            }
            self.pos += 1;
            if cmd == Command::Where {
                self.where_clause(out)?;
                continue;
            }
            self.algebraic(level + 1, out)?;
            out.push(cmd.into());
        }
        Ok(())
    }

    fn primary(&mut self, out: &mut Vec<Object>) -> RplResult<()> {
        let span = self.span();
        let Some((token, _)) = self.advance() else {
            return Err(RplError::ArgumentExpected { span });
        };
        match token {
            Token::Number(text) => {
                let value = self.number(&text, span)?;
                out.push(self.unit_suffix(value)?);
            }
            Token::Text(body, true) => out.push(Object::Text(body)),
            Token::Text(_, false) => return Err(self.unterminated("text", span)),
            Token::Op(Command::Sub) => self.prefix(Command::Neg, out)?,
            Token::Op(Command::Sqrt) => self.function(Command::Sqrt, out)?,
            Token::Op(cmd) => {
                return Err(RplError::PrefixExpected {
                    operator: Token::Op(cmd).to_string(),
                    span,
                });
            }
            Token::Name(name) => self.name(name, span, out)?,
            Token::LParen => self.parenthesized(span, out)?,
            Token::PolynomialMark => out.push(self.polynomial(span)?),
            _ => {
                self.pos -= 1;
                return Err(RplError::ArgumentExpected { span });
            }
        }
        while let Some(Token::Op(cmd)) = self.peek() {
            let cmd = *cmd;
            if cmd.fixity() != Fixity::Postfix {
                break;
            }
            self.pos += 1;
            out.push(cmd.into());
        }
        Ok(())
    }

    fn name(&mut self, name: String, span: Span, out: &mut Vec<Object>) -> RplResult<()> {
        let Some(cmd) = Command::lookup(&name) else {
            out.push(Object::Symbol(Symbol::new(name)));
            return Ok(());
        };
        match cmd.fixity() {
            Fixity::Stack => Err(RplError::NotAlgebraic { name, span }),
            Fixity::Function => self.function(cmd, out),
            Fixity::Postfix if self.peek() == Some(&Token::LParen) => self.function(cmd, out),
            Fixity::Prefix => self.prefix(cmd, out),
            Fixity::Infix | Fixity::Postfix => Err(RplError::PrefixExpected {
                operator: name,
                span,
            }),
        }
    }

    fn prefix(&mut self, cmd: Command, out: &mut Vec<Object>) -> RplResult<()> {
        let start = out.len();
        self.algebraic(cmd.precedence() + 1, out)?;
        if cmd == Command::Neg && out.len() == start + 1 && out[start].is_real() {
            out[start] = arithmetic::negate(&out[start])?;
        } else {
            out.push(cmd.into());
        }
        Ok(())
    }

    /// `f(a)`, `f(a; b)` or `f a` for functions of one argument.
    fn function(&mut self, cmd: Command, out: &mut Vec<Object>) -> RplResult<()> {
        let arity = cmd.arity();
        if self.peek() == Some(&Token::LParen) {
            let open = self.span();
            self.pos += 1;
            let mut args = Vec::with_capacity(arity);
            for index in 0..arity {
                if index > 0 {
                    match self.peek() {
                        Some(Token::Semicolon | Token::Comma) => self.pos += 1,
                        _ => return Err(RplError::ArgumentExpected { span: self.span() }),
                    }
                }
                let mut arg = Vec::new();
                self.algebraic(precedence::PARENTHESES, &mut arg)?;
                args.push(arg);
            }
            self.close_paren(open)?;
            // xroot(n; x) takes x first on the stack
            if cmd == Command::Xroot {
                args.reverse();
            }
            out.extend(args.into_iter().flatten());
        } else if arity == 1 {
            self.algebraic(precedence::FUNCTION, out)?;
        } else {
            return Err(RplError::ArgumentExpected { span: self.span() });
        }
        out.push(cmd.into());
        Ok(())
    }

    fn close_paren(&mut self, open: Span) -> RplResult<()> {
        match self.peek() {
            Some(Token::RParen) => {
                self.pos += 1;
                Ok(())
            }
            None => Err(self.unterminated("parentheses", open)),
            Some(token) => Err(unexpected(token, self.span())),
        }
    }

    /// `(expr)`, or the complex forms `(re; im)` and `(r ∡ θ)`.
    fn parenthesized(&mut self, open: Span, out: &mut Vec<Object>) -> RplResult<()> {
        let start = out.len();
        self.algebraic(precedence::PARENTHESES, out)?;
        let polar = match self.peek() {
            Some(Token::Semicolon) => false,
            Some(Token::Angle) => true,
            _ => return self.close_paren(open),
        };
        let first = single_real(out.split_off(start), open)?;
        self.pos += 1;
        let mut rest = Vec::new();
        self.algebraic(precedence::PARENTHESES, &mut rest)?;
        let second = single_real(rest, open)?;
        self.close_paren(open)?;
        out.push(Object::Complex(if polar {
            Complex::polar(first, second)
        } else {
            Complex::rectangular(first, second)
        }));
        Ok(())
    }

    /// Bindings after `|`: `name=value` or `(a=1; b=2)`, each its own where operator.
    fn where_clause(&mut self, out: &mut Vec<Object>) -> RplResult<()> {
        if self.peek() != Some(&Token::LParen) {
            self.algebraic(precedence::EQUATION, out)?;
            out.push(Command::Where.into());
            return Ok(());
        }
        let open = self.span();
        self.pos += 1;
        loop {
            self.algebraic(precedence::EQUATION, out)?;
            out.push(Command::Where.into());
            match self.peek() {
                Some(Token::Semicolon | Token::Comma) => self.pos += 1,
                _ => return self.close_paren(open),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(src: &str) -> Vec<Object> {
        match parse(src, &Settings::default()).unwrap() {
            Object::Program(items) => items,
            other => panic!("unexpected {other:?}"),
        }
    }

    fn expr(src: &str) -> Vec<Object> {
        match items(src).as_slice() {
            [Object::Expression(items)] => items.clone(),
            other => panic!("expected one expression, got {other:?}"),
        }
    }

    fn n(v: i64) -> Object {
        Object::integer(v)
    }

    fn c(cmd: Command) -> Object {
        Object::Command(cmd)
    }

    fn x(name: &str) -> Object {
        Object::symbol(name)
    }

    fn error(src: &str) -> RplError {
        parse(src, &Settings::default()).unwrap_err()
    }

    #[test]
    fn plain_command_line() {
        assert_eq!(items("1 2 +"), vec![n(1), n(2), c(Command::Add)]);
        assert_eq!(items("-3 - 4"), vec![n(-3), c(Command::Sub), n(4)]);
        assert_eq!(items("1,2"), vec![n(1), n(2)]);
        assert_eq!(items("DUP sto"), vec![c(Command::Dup), c(Command::Sto)]);
    }

    #[test]
    fn adjacent_literals() {
        let third = fraction::make(BigInt::from(1), BigInt::from(3)).unwrap();
        assert_eq!(items("1/3"), vec![third]);
        assert_eq!(items("1 / 3"), vec![n(1), c(Command::Div), n(3)]);
        assert_eq!(items("4/2"), vec![n(2)]);
        assert_eq!(
            items("3_m"),
            vec![Object::Unit(Unit {
                value: Box::new(n(3)),
                unit: vec![x("m")],
            })]
        );
        assert_eq!(
            items("9_m/s^2"),
            vec![Object::Unit(Unit {
                value: Box::new(n(9)),
                unit: vec![x("m"), x("s"), n(2), c(Command::Pow), c(Command::Div)],
            })]
        );
    }

    #[test]
    fn sequences() {
        assert_eq!(items("{ 1 { 2 } }"), vec![Object::List(vec![n(1), Object::List(vec![n(2)])])]);
        assert_eq!(items("[1 2]"), vec![Object::Array(vec![n(1), n(2)])]);
        assert_eq!(
            items("« 1 + »"),
            vec![Object::Program(vec![n(1), c(Command::Add)])]
        );
        assert_eq!(items("'X'"), vec![Object::Expression(vec![x("X")])]);
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(
            expr("'1+2*3'"),
            vec![n(1), n(2), n(3), c(Command::Mul), c(Command::Add)]
        );
        assert_eq!(
            expr("'2^3^2'"),
            vec![n(2), n(3), c(Command::Pow), n(2), c(Command::Pow)]
        );
        assert_eq!(
            expr("'(1+2)*3'"),
            vec![n(1), n(2), c(Command::Add), n(3), c(Command::Mul)]
        );
        assert_eq!(
            expr("'a-b-c'"),
            vec![x("a"), x("b"), c(Command::Sub), x("c"), c(Command::Sub)]
        );
    }

    #[test]
    fn prefix_and_postfix() {
        assert_eq!(expr("'-2'"), vec![n(-2)]);
        assert_eq!(expr("'-2^2'"), vec![n(2), n(2), c(Command::Pow), c(Command::Neg)]);
        assert_eq!(expr("'-X'"), vec![x("X"), c(Command::Neg)]);
        assert_eq!(expr("'X²+1'"), vec![x("X"), c(Command::Sq), n(1), c(Command::Add)]);
        assert_eq!(expr("'3!'"), vec![n(3), c(Command::Fact)]);
        assert_eq!(
            expr("'not a<b'"),
            vec![x("a"), x("b"), c(Command::Less), c(Command::Not)]
        );
    }

    #[test]
    fn functions() {
        assert_eq!(expr("'sin(X)'"), vec![x("X"), c(Command::Sin)]);
        assert_eq!(expr("'sin X'"), vec![x("X"), c(Command::Sin)]);
        assert_eq!(expr("'√X'"), vec![x("X"), c(Command::Sqrt)]);
        assert_eq!(expr("'hypot(3;4)'"), vec![n(3), n(4), c(Command::Hypot)]);
        assert_eq!(expr("'xroot(3, 8)'"), vec![n(8), n(3), c(Command::Xroot)]);
        assert_eq!(expr("'sq(X)'"), vec![x("X"), c(Command::Sq)]);
    }

    #[test]
    fn where_bindings() {
        assert_eq!(
            expr("'X+Y | (X=1; Y=2)'"),
            vec![
                x("X"),
                x("Y"),
                c(Command::Add),
                x("X"),
                n(1),
                c(Command::Equation),
                c(Command::Where),
                x("Y"),
                n(2),
                c(Command::Equation),
                c(Command::Where),
            ]
        );
        assert_eq!(
            expr("'X|X=1'"),
            vec![x("X"), x("X"), n(1), c(Command::Equation), c(Command::Where)]
        );
    }

    #[test]
    fn complex_literals() {
        assert_eq!(
            items("(1;2)"),
            vec![Object::Complex(Complex::rectangular(n(1), n(2)))]
        );
        assert_eq!(
            items("(2∡-1)"),
            vec![Object::Complex(Complex::polar(n(2), n(-1)))]
        );
    }

    #[test]
    fn polynomial_literal() {
        let [Object::Polynomial(p)] = <[Object; 1]>::try_from(items("Ⓟ'X^2+1'")).unwrap() else {
            panic!("expected a polynomial");
        };
        assert_eq!(p.terms().len(), 2);
        assert!(matches!(error("Ⓟ'X/Y'"), RplError::Syntax { .. }));
    }

    #[test]
    fn syntax_errors() {
        assert!(matches!(error("{1 2"), RplError::Unterminated { what: "list", .. }));
        assert!(matches!(error("'1+2"), RplError::Unterminated { what: "expression", .. }));
        assert!(matches!(error("'(1+2'"), RplError::Syntax { .. }));
        assert!(matches!(error("'1+'"), RplError::ArgumentExpected { .. }));
        assert!(matches!(error("'*2'"), RplError::PrefixExpected { .. }));
        assert!(matches!(error("'dup(1)'"), RplError::NotAlgebraic { .. }));
        assert!(matches!(error("\"abc"), RplError::Unterminated { what: "text", .. }));
        assert!(matches!(error("}"), RplError::Syntax { .. }));
    }

    #[test]
    fn deep_nesting_is_a_syntax_error() {
        let parens = format!("'{}1{}'", "(".repeat(5000), ")".repeat(5000));
        let RplError::Syntax { span, .. } = error(&parens) else {
            panic!("expected a syntax error");
        };
        assert!(span.offset > 1 && span.offset < 5000);
        let lists = format!("{}1{}", "{".repeat(5000), "}".repeat(5000));
        assert!(matches!(error(&lists), RplError::Syntax { .. }));
        let negations = format!("'{}2'", "-".repeat(5000));
        assert!(matches!(error(&negations), RplError::Syntax { .. }));
        // Left-associative chains do not nest
        let powers = format!("'{}2'", "2^".repeat(5000));
        assert!(matches!(items(&powers).as_slice(), [Object::Expression(_)]));

        let shallow = format!("'{}1{}'", "(".repeat(20), ")".repeat(20));
        assert!(matches!(items(&shallow).as_slice(), [Object::Expression(_)]));
    }

    #[test]
    fn error_spans_point_at_the_problem() {
        let RplError::PrefixExpected { span, .. } = error("'*2'") else {
            panic!("expected PrefixExpected");
        };
        assert_eq!(span, Span::new(1, 1));
    }

    #[test]
    fn parse_single_objects() {
        let s = Settings::default();
        assert_eq!(
            parse_object("12 34", &s, None, 0).unwrap(),
            Parsed::Object {
                object: n(12),
                consumed: 2
            }
        );
        assert_eq!(parse_object("  @ comment", &s, None, 0).unwrap(), Parsed::Skip);
        assert_eq!(
            parse_object("1 2 } 3", &s, Some(SeqKind::List), 0).unwrap(),
            Parsed::Object {
                object: Object::List(vec![n(1), n(2)]),
                consumed: 5
            }
        );
        assert_eq!(
            parse_object("A+B=C", &s, None, precedence::ADDITIVE).unwrap(),
            Parsed::Object {
                object: Object::Expression(vec![x("A"), x("B"), c(Command::Add)]),
                consumed: 3
            }
        );
    }

    #[test]
    fn units_inside_expressions() {
        let three_meters = Object::Unit(Unit {
            value: Box::new(n(3)),
            unit: vec![x("m")],
        });
        assert_eq!(expr("'X-3_m'"), vec![x("X"), three_meters, c(Command::Sub)]);
    }
}
