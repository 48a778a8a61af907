//! Tokeniser for command lines and algebraic expressions.
//!
//! The lexer only splits the input; whether `1/3` is a fraction or a division
//! depends on the parsing mode and on token adjacency, which the parser decides
//! from the token spans.

use std::fmt;

use chumsky::prelude::*;

use crate::{
    command::Command,
    error::{RplError, RplResult, Span},
};

pub type Spanned<T> = (T, Span);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// Digits with an optional fractional part and exponent, without sign.
    Number(String),
    /// Body of a text literal and whether the closing quote was found.
    Text(String, bool),
    Name(String),
    /// Operator glyph such as `+`, `≤` or `²`.
    Op(Command),

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    ProgramOpen,
    ProgramClose,
    Quote,
    Comma,
    Semicolon,
    Underscore,
    Angle,
    PolynomialMark,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::Text(t, _) => write!(f, "\"{t}\""),
            Token::Name(n) => write!(f, "{n}"),
            Token::Op(cmd) => write!(f, "{}", cmd.info().glyph.unwrap_or(cmd.name())),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::ProgramOpen => write!(f, "«"),
            Token::ProgramClose => write!(f, "»"),
            Token::Quote => write!(f, "'"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::Underscore => write!(f, "_"),
            Token::Angle => write!(f, "∡"),
            Token::PolynomialMark => write!(f, "Ⓟ"),
        }
    }
}

/// Single-character operator glyphs, resolved through [`Command::lookup`].
const OPERATOR_GLYPHS: &str = "+-*/^↑×·÷=≠<>≤≥²³!√|";

// `Ⓟ` counts as alphabetic in Unicode but marks a polynomial literal
fn is_name_start(c: char) -> bool {
    c != 'Ⓟ' && (c.is_alphabetic() || matches!(c, '→' | '▶' | '∂' | '∑' | '∏' | '∫'))
}

// Superscripts are numeric in Unicode, but `X²` is a square
fn is_name_char(c: char) -> bool {
    c != 'Ⓟ' && (c.is_alphabetic() || c.is_ascii_digit() || c == '→')
}

pub fn lexer<'a>() -> impl Parser<'a, &'a str, Vec<(Token, SimpleSpan)>, extra::Err<Rich<'a, char>>> {
    let digits = any()
        .filter(|c: &char| c.is_ascii_digit())
        .repeated()
        .at_least(1);
    let exponent = one_of("eE⁳")
        .then(one_of("+-").or_not())
        .then(digits.clone());
    let mantissa = choice((
        digits
            .clone()
            .then(just('.').then(digits.clone().or_not()).or_not())
            .to(()),
        just('.').then(digits).to(()),
    ));
    let number = mantissa
        .then(exponent.or_not())
        .to_slice()
        .map(|s: &str| Token::Number(s.to_string()));

    let text = just('"')
        .ignore_then(none_of('"').repeated().to_slice())
        .then(just('"').or_not())
        .map(|(body, close): (&str, Option<char>)| Token::Text(body.to_string(), close.is_some()));

    // `->num` spells the same command as `→num`
    let name = choice((
        just("->")
            .then(any().filter(|c: &char| c.is_alphabetic()))
            .to(()),
        any().filter(|c: &char| is_name_start(*c)).to(()),
    ))
    .then(any().filter(|c: &char| is_name_char(*c)).repeated())
    .to_slice()
    .map(|s: &str| Token::Name(s.to_string()));

    // Longest glyphs first
    let operator = choice((
        just("⁻¹").to(Command::Inv),
        just("==").to(Command::Same),
        just("<=").to(Command::LessEq),
        just(">=").to(Command::GreaterEq),
        just("<>").to(Command::NotEqual),
        just("!=").to(Command::NotEqual),
        one_of(OPERATOR_GLYPHS).try_map(|c: char, span| {
            Command::lookup(c.encode_utf8(&mut [0; 4]))
                .ok_or_else(|| Rich::custom(span, format!("unknown operator '{c}'")))
        }),
    ))
    .map(Token::Op);

    let punct = choice((
        just("<<").to(Token::ProgramOpen),
        just(">>").to(Token::ProgramClose),
        just('«').to(Token::ProgramOpen),
        just('»').to(Token::ProgramClose),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('{').to(Token::LBrace),
        just('}').to(Token::RBrace),
        just('[').to(Token::LBracket),
        just(']').to(Token::RBracket),
        just('\'').to(Token::Quote),
        just(',').to(Token::Comma),
        just(';').to(Token::Semicolon),
        just('_').to(Token::Underscore),
        just('∡').to(Token::Angle),
        just('Ⓟ').to(Token::PolynomialMark),
    ));

    let token = choice((number, text, name, punct, operator));

    // Comments run from `@` to the end of the line
    let comment = just('@')
        .then(any().and_is(just('\n').not()).repeated())
        .padded()
        .to(());

    token
        .map_with(|tok, e| (tok, e.span()))
        .padded_by(comment.clone().repeated())
        .padded()
        .repeated()
        .collect()
        .then_ignore(comment.repeated())
        .padded()
        .then_ignore(end())
}

/// Split `src` into tokens with byte spans.
pub fn tokenize(src: &str) -> RplResult<Vec<Spanned<Token>>> {
    let (tokens, errors) = lexer().parse(src).into_output_errors();
    if let Some(error) = errors.into_iter().next() {
        let span = *error.span();
        return Err(RplError::syntax(
            error.reason().to_string(),
            Span::between(span.start, span.end),
        ));
    }
    Ok(tokens
        .unwrap_or_default()
        .into_iter()
        .map(|(tok, span)| (tok, Span::between(span.start, span.end)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        tokenize(src).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn polynomial_mark_is_not_a_name() {
        assert_eq!(
            kinds("Ⓟ'X' AⓅ"),
            vec![
                Token::PolynomialMark,
                Token::Quote,
                Token::Name("X".into()),
                Token::Quote,
                Token::Name("A".into()),
                Token::PolynomialMark,
            ]
        );
    }

    #[test]
    fn numbers_and_names() {
        assert_eq!(
            kinds("12 3.5 .5 2. 1E-3 X2 sin"),
            vec![
                Token::Number("12".into()),
                Token::Number("3.5".into()),
                Token::Number(".5".into()),
                Token::Number("2.".into()),
                Token::Number("1E-3".into()),
                Token::Name("X2".into()),
                Token::Name("sin".into()),
            ]
        );
    }

    #[test]
    fn operators_longest_first() {
        assert_eq!(
            kinds("a<=b x⁻¹ 2² Y³"),
            vec![
                Token::Name("a".into()),
                Token::Op(Command::LessEq),
                Token::Name("b".into()),
                Token::Name("x".into()),
                Token::Op(Command::Inv),
                Token::Number("2".into()),
                Token::Op(Command::Sq),
                Token::Name("Y".into()),
                Token::Op(Command::Cube),
            ]
        );
    }

    #[test]
    fn delimiters_and_comments() {
        assert_eq!(
            kinds("« 1 » @ ignored\n<< >> { } 'x'"),
            vec![
                Token::ProgramOpen,
                Token::Number("1".into()),
                Token::ProgramClose,
                Token::ProgramOpen,
                Token::ProgramClose,
                Token::LBrace,
                Token::RBrace,
                Token::Quote,
                Token::Name("x".into()),
                Token::Quote,
            ]
        );
    }

    #[test]
    fn spans_are_byte_offsets() {
        let tokens = tokenize("1/3 ab").unwrap();
        assert_eq!(tokens[0].1, Span::new(0, 1));
        assert_eq!(tokens[1].1, Span::new(1, 1));
        assert_eq!(tokens[3].1, Span::new(4, 2));
    }

    #[test]
    fn unterminated_text_is_flagged() {
        assert_eq!(kinds("\"abc"), vec![Token::Text("abc".into(), false)]);
        assert_eq!(kinds("->num"), vec![Token::Name("->num".into())]);
    }

    #[test]
    fn stray_character_is_a_syntax_error() {
        assert!(matches!(tokenize("1 $ 2"), Err(RplError::Syntax { .. })));
    }
}
