//! nom grammar for functional weights and rates.
use nom::IResult;
use nom::Parser;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::{char, digit0, digit1, multispace0};
use nom::combinator::{all_consuming, map, map_res, opt, recognize, value};
use nom::multi::many0;
use nom::sequence::{delimited, preceded};

use super::ExprError;
use super::ast::{BinaryOp, Expr, UnaryOp};

type Error<'a> = nom::error::Error<&'a str>;

pub fn parse(input: &str) -> Result<Expr, ExprError> {
    match all_consuming(ws(expr)).parse(input) {
        Ok((_, expr)) => Ok(expr),
        Err(nom::Err::Error(err)) | Err(nom::Err::Failure(err)) => Err(ExprError::Parse {
            input: input.to_owned(),
            message: if err.input.is_empty() {
                "unexpected end of expression".to_owned()
            } else {
                format!("unexpected input at {:?}", err.input)
            },
        }),
        Err(nom::Err::Incomplete(_)) => Err(ExprError::Parse {
            input: input.to_owned(),
            message: "incomplete expression".to_owned(),
        }),
    }
}

fn ws<'a, O, F>(inner: F) -> impl Parser<&'a str, Output = O, Error = Error<'a>>
where
    F: Parser<&'a str, Output = O, Error = Error<'a>>,
{
    delimited(multispace0, inner, multispace0)
}

fn fold(first: Expr, rest: Vec<(BinaryOp, Expr)>) -> Expr {
    rest.into_iter()
        .fold(first, |lhs, (op, rhs)| Expr::binary(op, lhs, rhs))
}

fn expr(input: &str) -> IResult<&str, Expr> {
    or_expr(input)
}

fn or_expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = and_expr(input)?;
    let (input, rest) =
        many0((value(BinaryOp::Or, ws(tag("||"))), and_expr)).parse(input)?;
    Ok((input, fold(first, rest)))
}

fn and_expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = comparison(input)?;
    let (input, rest) =
        many0((value(BinaryOp::And, ws(tag("&&"))), comparison)).parse(input)?;
    Ok((input, fold(first, rest)))
}

fn comparison_op(input: &str) -> IResult<&str, BinaryOp> {
    ws(alt((
        value(BinaryOp::Eq, tag("==")),
        value(BinaryOp::Ne, tag("!=")),
        value(BinaryOp::Le, tag("<=")),
        value(BinaryOp::Ge, tag(">=")),
        value(BinaryOp::Lt, tag("<")),
        value(BinaryOp::Gt, tag(">")),
    )))
    .parse(input)
}

fn comparison(input: &str) -> IResult<&str, Expr> {
    let (input, lhs) = sum(input)?;
    let (input, rhs) = opt((comparison_op, sum)).parse(input)?;
    let expr = match rhs {
        Some((op, rhs)) => Expr::binary(op, lhs, rhs),
        None => lhs,
    };
    Ok((input, expr))
}

fn sum(input: &str) -> IResult<&str, Expr> {
    let (input, first) = product(input)?;
    let (input, rest) = many0((
        ws(alt((
            value(BinaryOp::Add, char('+')),
            value(BinaryOp::Sub, char('-')),
        ))),
        product,
    ))
    .parse(input)?;
    Ok((input, fold(first, rest)))
}

fn product(input: &str) -> IResult<&str, Expr> {
    let (input, first) = unary(input)?;
    let (input, rest) = many0((
        ws(alt((
            value(BinaryOp::Mul, char('*')),
            value(BinaryOp::Div, char('/')),
        ))),
        unary,
    ))
    .parse(input)?;
    Ok((input, fold(first, rest)))
}

fn unary(input: &str) -> IResult<&str, Expr> {
    alt((
        map(preceded(ws(char('-')), unary), |e| {
            Expr::Unary(UnaryOp::Neg, Box::new(e))
        }),
        map(preceded(ws(char('!')), unary), |e| {
            Expr::Unary(UnaryOp::Not, Box::new(e))
        }),
        atom,
    ))
    .parse(input)
}

fn atom(input: &str) -> IResult<&str, Expr> {
    ws(alt((
        number,
        token_count,
        capacity,
        map(preceded((tag("floor"), multispace0), parenthesized), |e| {
            Expr::Floor(Box::new(e))
        }),
        map(preceded((tag("ceil"), multispace0), parenthesized), |e| {
            Expr::Ceil(Box::new(e))
        }),
        parenthesized,
    )))
    .parse(input)
}

fn parenthesized(input: &str) -> IResult<&str, Expr> {
    delimited(char('('), ws(expr), char(')')).parse(input)
}

fn number(input: &str) -> IResult<&str, Expr> {
    map_res(recognize((digit1, opt((char('.'), digit0)))), |s: &str| {
        s.parse::<f64>().map(Expr::Number)
    })
    .parse(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_').parse(input)
}

fn token_count(input: &str) -> IResult<&str, Expr> {
    map(
        (
            char('#'),
            multispace0,
            char('('),
            ws(identifier),
            opt(preceded(char(','), ws(identifier))),
            char(')'),
        ),
        |(_, _, _, place, token, _)| Expr::TokenCount {
            place: place.to_owned(),
            token: token.map(str::to_owned),
        },
    )
    .parse(input)
}

fn capacity(input: &str) -> IResult<&str, Expr> {
    map(
        delimited((tag("cap"), multispace0, char('(')), ws(identifier), char(')')),
        |place: &str| Expr::Capacity(place.to_owned()),
    )
    .parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(place: &str, token: Option<&str>) -> Expr {
        Expr::TokenCount {
            place: place.to_owned(),
            token: token.map(str::to_owned),
        }
    }

    #[test]
    fn parses_literals() {
        assert_eq!(parse("2").unwrap(), Expr::Number(2.0));
        assert_eq!(parse(" 2.5 ").unwrap(), Expr::Number(2.5));
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::binary(
                BinaryOp::Add,
                Expr::Number(1.0),
                Expr::binary(BinaryOp::Mul, Expr::Number(2.0), Expr::Number(3.0)),
            )
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        let expr = parse("5-2-1").unwrap();
        assert_eq!(expr.to_string(), "((5 - 2) - 1)");
    }

    #[test]
    fn parses_place_references() {
        assert_eq!(parse("#(P0)").unwrap(), count("P0", None));
        assert_eq!(parse("#( P0 , Red )").unwrap(), count("P0", Some("Red")));
        assert_eq!(parse("cap(P1)").unwrap(), Expr::Capacity("P1".to_owned()));
        let expr = parse("floor(#(P0) / 2) + ceil(cap(P1))").unwrap();
        assert_eq!(
            expr.components().into_iter().collect::<Vec<_>>(),
            vec!["P0", "P1"]
        );
    }

    #[test]
    fn parses_boolean_guards() {
        let expr = parse("#(P0) >= 2 && !(#(P1) == 0) || 0").unwrap();
        assert_eq!(expr.to_string(), "(((#(P0) >= 2) && !(#(P1) == 0)) || 0)");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(parse("1 +"), Err(ExprError::Parse { .. })));
        assert!(matches!(parse("#(P0"), Err(ExprError::Parse { .. })));
        assert!(matches!(parse(""), Err(ExprError::Parse { .. })));
        assert!(matches!(parse("2 3"), Err(ExprError::Parse { .. })));
    }

    #[test]
    fn constants_have_no_components() {
        assert!(parse("(1 + 2) * -3").unwrap().is_constant());
        assert!(!parse("#(P0)").unwrap().is_constant());
    }
}
