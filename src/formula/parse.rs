//! Formula grammar on nom combinators.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('-' | '+') unary | primary
//! primary := NUMBER | IDENT | IDENT '(' (IDENT | STRING) ')' | '(' expr ')'
//! ```
//!
//! Identifiers and labels are case-insensitive and normalized to upper case.
//! Signs and parentheses nest at most [`MAX_NESTING`] levels deep.

use super::{BinaryOp, Expr, Face, FormulaError};
use nom::{
    branch::alt,
    bytes::complete::{take_till, take_while, take_while1},
    character::complete::{char, one_of, satisfy},
    combinator::{cut, map, map_res, opt, peek, recognize},
    error::{ErrorKind, FromExternalError, ParseError},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

/// Deepest allowed chain of signs and parentheses.
pub const MAX_NESTING: usize = 64;

/// Longest accepted formula source, in bytes.
pub const MAX_LENGTH: usize = 1024;

/// Where parsing stopped and, for semantic failures, why.
#[derive(Debug, PartialEq)]
struct SyntaxError<'a> {
    input: &'a str,
    cause: Option<FormulaError>,
}

impl<'a> SyntaxError<'a> {
    fn fatal(input: &'a str, cause: FormulaError) -> nom::Err<Self> {
        nom::Err::Failure(Self {
            input,
            cause: Some(cause),
        })
    }
}

impl<'a> ParseError<&'a str> for SyntaxError<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        Self { input, cause: None }
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }

    fn or(self, other: Self) -> Self {
        match (self.cause.is_some(), other.cause.is_some()) {
            (true, false) => self,
            (false, true) => other,
            _ if self.input.len() < other.input.len() => self,
            _ => other,
        }
    }
}

impl<'a> FromExternalError<&'a str, FormulaError> for SyntaxError<'a> {
    fn from_external_error(input: &'a str, _kind: ErrorKind, cause: FormulaError) -> Self {
        Self {
            input,
            cause: Some(cause),
        }
    }
}

type PResult<'a, T> = IResult<&'a str, T, SyntaxError<'a>>;

/// Lexeme found where the grammar could not continue, for error messages.
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(String),
    Ident(String),
    Str(String),
    Symbol(char),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::Ident(name) => format!("identifier {}", name),
            Token::Str(s) => format!("string '{}'", s),
            Token::Symbol(c) => format!("'{}'", c),
        }
    }
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

/// Skip whitespace
fn ws(input: &str) -> PResult<'_, ()> {
    map(take_while(|c: char| c.is_whitespace()), |_| ())(input)
}

/// Identifier, upper-cased: `bay_width` -> `BAY_WIDTH`
fn identifier(input: &str) -> PResult<'_, String> {
    map(
        recognize(pair(
            satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
            take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
        )),
        str::to_ascii_uppercase,
    )(input)
}

/// Quoted label: 'text' or "text"
fn quoted(input: &str) -> PResult<'_, String> {
    map(
        alt((
            delimited(char('\''), take_till(|c: char| c == '\''), char('\'')),
            delimited(char('"'), take_till(|c: char| c == '"'), char('"')),
        )),
        |text: &str| text.trim().to_uppercase(),
    )(input)
}

/// Number literal; a malformed literal such as `1.2.3` is fatal.
fn number(input: &str) -> PResult<'_, Expr> {
    preceded(
        peek(satisfy(is_number_char)),
        cut(map_res(take_while1(is_number_char), |literal: &str| {
            literal
                .parse::<f64>()
                .map(Expr::Number)
                .map_err(|_| FormulaError::InvalidNumber(literal.to_string()))
        })),
    )(input)
}

fn token(input: &str) -> PResult<'_, Token> {
    alt((
        map(take_while1(is_number_char), |s: &str| Token::Number(s.to_string())),
        map(identifier, Token::Ident),
        map(quoted, Token::Str),
        map(one_of("+-*/()"), Token::Symbol),
    ))(input)
}

fn nested<'a>(input: &'a str, depth: usize) -> Result<usize, nom::Err<SyntaxError<'a>>> {
    if depth >= MAX_NESTING {
        Err(SyntaxError::fatal(input, FormulaError::TooDeep(MAX_NESTING)))
    } else {
        Ok(depth + 1)
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

fn expr<'a>(input: &'a str, depth: usize) -> PResult<'a, Expr> {
    let (input, first) = term(input, depth)?;
    let additive = map(one_of("+-"), |c| match c {
        '+' => BinaryOp::Add,
        _ => BinaryOp::Sub,
    });
    let (input, rest) = many0(pair(
        preceded(ws, additive),
        cut(|i: &'a str| term(i, depth)),
    ))(input)?;
    Ok((
        input,
        rest.into_iter()
            .fold(first, |lhs, (op, rhs)| binary(op, lhs, rhs)),
    ))
}

fn term<'a>(input: &'a str, depth: usize) -> PResult<'a, Expr> {
    let (input, first) = unary(input, depth)?;
    let multiplicative = map(one_of("*/"), |c| match c {
        '*' => BinaryOp::Mul,
        _ => BinaryOp::Div,
    });
    let (input, rest) = many0(pair(
        preceded(ws, multiplicative),
        cut(|i: &'a str| unary(i, depth)),
    ))(input)?;
    Ok((
        input,
        rest.into_iter()
            .fold(first, |lhs, (op, rhs)| binary(op, lhs, rhs)),
    ))
}

fn unary<'a>(input: &'a str, depth: usize) -> PResult<'a, Expr> {
    preceded(
        ws,
        alt((
            |i: &'a str| signed(i, depth),
            |i: &'a str| primary(i, depth),
        )),
    )(input)
}

fn signed<'a>(input: &'a str, depth: usize) -> PResult<'a, Expr> {
    let (rest, sign) = one_of::<_, _, SyntaxError<'a>>("+-")(input)?;
    let depth = nested(input, depth)?;
    let (rest, operand) = cut(|i: &'a str| unary(i, depth))(rest)?;
    let operand = match sign {
        '-' => Expr::Neg(Box::new(operand)),
        _ => operand,
    };
    Ok((rest, operand))
}

fn primary<'a>(input: &'a str, depth: usize) -> PResult<'a, Expr> {
    alt((
        number,
        |i: &'a str| group(i, depth),
        call_or_variable,
    ))(input)
}

/// Parenthesized sub-expression
fn group<'a>(input: &'a str, depth: usize) -> PResult<'a, Expr> {
    let (rest, _) = char::<_, SyntaxError<'a>>('(')(input)?;
    let depth = nested(input, depth)?;
    cut(terminated(
        move |i: &'a str| expr(i, depth),
        preceded(ws, char(')')),
    ))(rest)
}

/// `INTERIOR_THICKNESS(label)`, `EXTERIOR_THICKNESS(label)` or a variable
fn call_or_variable(input: &str) -> PResult<'_, Expr> {
    let (rest, name) = identifier(input)?;
    let (after_paren, open) = opt(preceded(ws, char('(')))(rest)?;
    if open.is_none() {
        return Ok((rest, Expr::Variable(name)));
    }
    let face = match name.as_str() {
        "EXTERIOR_THICKNESS" => Face::Exterior,
        "INTERIOR_THICKNESS" => Face::Interior,
        _ => return Err(SyntaxError::fatal(input, FormulaError::UnknownFunction(name))),
    };
    let (rest, label) = cut(terminated(
        preceded(ws, alt((identifier, quoted))),
        preceded(ws, char(')')),
    ))(after_paren)?;
    Ok((rest, Expr::Thickness { face, label }))
}

/// Map the stopping point back to an offset in `source`.
fn locate(source: &str, error: SyntaxError<'_>) -> FormulaError {
    if let Some(cause) = error.cause {
        return cause;
    }
    let rest = error.input.trim_start();
    let offset = source.len() - rest.len();
    match token(rest) {
        Ok((_, found)) => FormulaError::UnexpectedToken {
            offset,
            found: found.describe(),
        },
        Err(_) => match rest.chars().next() {
            Some(found) => FormulaError::UnexpectedCharacter { offset, found },
            None => FormulaError::UnexpectedEnd,
        },
    }
}

pub(super) fn parse(source: &str) -> Result<Expr, FormulaError> {
    if source.len() > MAX_LENGTH {
        return Err(FormulaError::TooLong(MAX_LENGTH));
    }
    match terminated(|i| expr(i, 0), ws)(source) {
        Ok(("", parsed)) => Ok(parsed),
        Ok((rest, _)) => Err(locate(source, SyntaxError { input: rest, cause: None })),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(locate(source, e)),
        Err(nom::Err::Incomplete(_)) => Err(FormulaError::UnexpectedEnd),
    }
}
