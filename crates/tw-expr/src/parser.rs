use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::ast::{BinaryOp, Expr, Place, UnaryOp};
use crate::lexer::Token;

type Span = SimpleSpan;

/// Longest token sequence [`parse`] accepts.
pub const MAX_EXPRESSION_TOKENS: usize = 256;

/// Deepest nesting [`parse`] accepts. Open brackets, `else` branches and
/// assignments each count one level.
pub const MAX_NESTING_DEPTH: usize = 16;

/// Parse error with source span.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Byte range of the offending input.
    pub span: std::ops::Range<usize>,
    /// Human-readable description of the parse error.
    pub message: String,
}

/// A suffix applied to an atom: `.field`, `.method(args)`, or `[index]`.
enum Postfix {
    Field(String),
    Method(String, Vec<Expr>),
    Index(Expr),
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

fn unary(op: UnaryOp, operand: Expr) -> Expr {
    Expr::Unary {
        op,
        operand: Box::new(operand),
    }
}

/// Build the expression parser.
///
/// Precedence, loosest first: assignment / conditional, `or`, `and`, `not`,
/// comparison, `+ -`, `* / %`, unary `-`, postfix access.
fn expr_parser<'a, I>() -> impl Parser<'a, I, Expr, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = Span>,
{
    recursive(|expr| {
        let ident = select! { Token::Ident(name) => name }.labelled("identifier");

        let literal = select! {
            Token::Integer(n) => Expr::Int(n),
            Token::Float(n) => Expr::Float(n),
            Token::Str(s) => Expr::Str(s),
            Token::True => Expr::Bool(true),
            Token::False => Expr::Bool(false),
            Token::Nil => Expr::Nil,
        }
        .labelled("literal");

        let args = expr
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<Expr>>()
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .labelled("arguments");

        let list = expr
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<Expr>>()
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map(Expr::List)
            .labelled("list");

        // Name or global call: `score`, `len(x)`
        let name_or_call = ident
            .clone()
            .then(args.clone().or_not())
            .map(|(name, args)| match args {
                Some(args) => Expr::Call {
                    function: name,
                    args,
                },
                None => Expr::Name(name),
            });

        let atom = choice((
            literal,
            list,
            name_or_call,
            expr.clone()
                .delimited_by(just(Token::LParen), just(Token::RParen)),
        ));

        // -- Postfix: field access, method calls, indexing --
        let postfix_op = choice((
            just(Token::Dot)
                .ignore_then(ident.clone())
                .then(args.or_not())
                .map(|(name, args)| match args {
                    Some(args) => Postfix::Method(name, args),
                    None => Postfix::Field(name),
                }),
            expr.clone()
                .delimited_by(just(Token::LBracket), just(Token::RBracket))
                .map(Postfix::Index),
        ));

        let postfix = atom
            .foldl(postfix_op.repeated(), |target, op| match op {
                Postfix::Field(field) => Expr::Field {
                    target: Box::new(target),
                    field,
                },
                Postfix::Method(method, args) => Expr::Method {
                    target: Box::new(target),
                    method,
                    args,
                },
                Postfix::Index(index) => Expr::Index {
                    target: Box::new(target),
                    index: Box::new(index),
                },
            })
            .boxed();

        // -- Arithmetic --
        let negation = just(Token::Minus)
            .to(UnaryOp::Neg)
            .repeated()
            .foldr(postfix, unary);

        let product_op = choice((
            just(Token::Star).to(BinaryOp::Mul),
            just(Token::Slash).to(BinaryOp::Div),
            just(Token::Percent).to(BinaryOp::Rem),
        ));
        let product = negation
            .clone()
            .foldl(product_op.then(negation).repeated(), |lhs, (op, rhs)| {
                binary(op, lhs, rhs)
            });

        let sum_op = choice((
            just(Token::Plus).to(BinaryOp::Add),
            just(Token::Minus).to(BinaryOp::Sub),
        ));
        let sum = product
            .clone()
            .foldl(sum_op.then(product).repeated(), |lhs, (op, rhs)| {
                binary(op, lhs, rhs)
            })
            .boxed();

        // -- Comparison --
        let cmp_op = choice((
            just(Token::Eq).to(BinaryOp::Eq),
            just(Token::Ne).to(BinaryOp::Ne),
            just(Token::Le).to(BinaryOp::Le),
            just(Token::Ge).to(BinaryOp::Ge),
            just(Token::Lt).to(BinaryOp::Lt),
            just(Token::Gt).to(BinaryOp::Gt),
        ));
        let comparison = sum
            .clone()
            .foldl(cmp_op.then(sum).repeated(), |lhs, (op, rhs)| {
                binary(op, lhs, rhs)
            });

        // -- Logic --
        let not_expr = just(Token::Not)
            .to(UnaryOp::Not)
            .repeated()
            .foldr(comparison, unary);

        let and_expr = not_expr.clone().foldl(
            just(Token::And).to(BinaryOp::And).then(not_expr).repeated(),
            |lhs, (op, rhs)| binary(op, lhs, rhs),
        );

        let or_expr = and_expr
            .clone()
            .foldl(
                just(Token::Or).to(BinaryOp::Or).then(and_expr).repeated(),
                |lhs, (op, rhs)| binary(op, lhs, rhs),
            )
            .boxed();

        // `a if cond else b`
        let conditional = or_expr
            .clone()
            .then(
                just(Token::If)
                    .ignore_then(or_expr)
                    .then_ignore(just(Token::Else))
                    .then(expr.clone())
                    .or_not(),
            )
            .map(|(then_branch, rest)| match rest {
                Some((condition, else_branch)) => Expr::Conditional {
                    then_branch: Box::new(then_branch),
                    condition: Box::new(condition),
                    else_branch: Box::new(else_branch),
                },
                None => then_branch,
            });

        // `score = 1`, `lamp.lit = true`
        let place = ident
            .clone()
            .then(just(Token::Dot).ignore_then(ident).or_not())
            .map(|(name, key)| match key {
                Some(key) => Place::Property { entity: name, key },
                None => Place::Attribute(name),
            })
            .labelled("assignment target");

        let assignment = place
            .then_ignore(just(Token::Assign))
            .then(expr)
            .map(|(place, value)| Expr::Assign {
                place,
                value: Box::new(value),
            });

        choice((assignment, conditional))
    })
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a token stream into a single expression.
///
/// Streams over [`MAX_EXPRESSION_TOKENS`] or nested past
/// [`MAX_NESTING_DEPTH`] are rejected without being parsed.
pub fn parse(tokens: &[(Token, std::ops::Range<usize>)]) -> Result<Expr, Vec<ParseError>> {
    check_size(tokens).map_err(|e| vec![e])?;

    let token_iter = tokens
        .iter()
        .map(|(tok, span)| (tok.clone(), Span::from(span.clone())));

    let len = tokens.last().map_or(0, |(_, s)| s.end);
    let eoi: Span = (len..len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let (output, errors) = expr_parser()
        .then_ignore(end())
        .parse(stream)
        .into_output_errors();

    if let Some(expr) = output
        && errors.is_empty()
    {
        return Ok(expr);
    }

    Err(errors
        .into_iter()
        .map(|e| ParseError {
            span: e.span().into_range(),
            message: e.to_string(),
        })
        .collect())
}

fn check_size(tokens: &[(Token, std::ops::Range<usize>)]) -> Result<(), ParseError> {
    if let Some((_, span)) = tokens.get(MAX_EXPRESSION_TOKENS) {
        return Err(ParseError {
            span: span.clone(),
            message: format!("expression longer than {MAX_EXPRESSION_TOKENS} tokens"),
        });
    }
    let mut open = 0usize;
    let mut chained = 0usize;
    for (token, span) in tokens {
        match token {
            Token::LParen | Token::LBracket => open += 1,
            Token::RParen | Token::RBracket => open = open.saturating_sub(1),
            Token::Else | Token::Assign => chained += 1,
            _ => {}
        }
        if open + chained > MAX_NESTING_DEPTH {
            return Err(ParseError {
                span: span.clone(),
                message: format!("expression nested deeper than {MAX_NESTING_DEPTH} levels"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer;

    fn parse_source(source: &str) -> Result<Expr, Vec<ParseError>> {
        let (tokens, lex_errors) = lexer::lex(source);
        assert!(lex_errors.is_empty(), "lex errors: {lex_errors:?}");
        parse(&tokens)
    }

    fn int(n: i64) -> Box<Expr> {
        Box::new(Expr::Int(n))
    }

    #[test]
    fn parse_precedence() {
        let expr = parse_source("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Add,
                lhs: int(1),
                rhs: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    lhs: int(2),
                    rhs: int(3),
                }),
            }
        );
    }

    #[test]
    fn parse_left_associative_subtraction() {
        let expr = parse_source("10 - 4 - 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Sub,
                lhs: Box::new(Expr::Binary {
                    op: BinaryOp::Sub,
                    lhs: int(10),
                    rhs: int(4),
                }),
                rhs: int(3),
            }
        );
    }

    #[test]
    fn parse_negation_binds_tighter_than_product() {
        let expr = parse_source("-2 * 3").unwrap();
        assert!(matches!(
            expr,
            Expr::Binary { op: BinaryOp::Mul, ref lhs, .. }
                if matches!(**lhs, Expr::Unary { op: UnaryOp::Neg, .. })
        ));
    }

    #[test]
    fn parse_field_and_method_chain() {
        let expr = parse_source("lamp.owner.has('oil')").unwrap();
        let Expr::Method {
            target,
            method,
            args,
        } = expr
        else {
            panic!("expected method call");
        };
        assert_eq!(method, "has");
        assert_eq!(args, vec![Expr::Str("oil".into())]);
        assert_eq!(
            *target,
            Expr::Field {
                target: Box::new(Expr::Name("lamp".into())),
                field: "owner".into(),
            }
        );
    }

    #[test]
    fn parse_global_call_and_index() {
        let expr = parse_source("len(items[0])").unwrap();
        assert_eq!(
            expr,
            Expr::Call {
                function: "len".into(),
                args: vec![Expr::Index {
                    target: Box::new(Expr::Name("items".into())),
                    index: int(0),
                }],
            }
        );
    }

    #[test]
    fn parse_conditional() {
        let expr = parse_source("'lit' if lamp.lit else 'dark'").unwrap();
        assert!(matches!(expr, Expr::Conditional { .. }));
    }

    #[test]
    fn parse_attribute_assignment() {
        let expr = parse_source("score = score + 1").unwrap();
        assert!(matches!(
            expr,
            Expr::Assign { place: Place::Attribute(ref name), .. } if name == "score"
        ));
    }

    #[test]
    fn parse_property_assignment() {
        let expr = parse_source("lamp.lit = not lamp.lit").unwrap();
        assert!(matches!(
            expr,
            Expr::Assign { place: Place::Property { ref entity, ref key }, .. }
                if entity == "lamp" && key == "lit"
        ));
    }

    #[test]
    fn parse_equality_is_not_assignment() {
        let expr = parse_source("score == 3").unwrap();
        assert!(matches!(expr, Expr::Binary { op: BinaryOp::Eq, .. }));
    }

    #[test]
    fn parse_logic_precedence() {
        let expr = parse_source("a or b and not c").unwrap();
        let Expr::Binary { op, rhs, .. } = expr else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Or);
        assert!(matches!(*rhs, Expr::Binary { op: BinaryOp::And, .. }));
    }

    #[test]
    fn parse_list_literal() {
        let expr = parse_source("[1, 'two', true]").unwrap();
        assert_eq!(
            expr,
            Expr::List(vec![Expr::Int(1), Expr::Str("two".into()), Expr::Bool(true)])
        );
    }

    #[test]
    fn parse_rejects_trailing_tokens() {
        assert!(parse_source("1 2").is_err());
    }

    #[test]
    fn parse_rejects_empty_input() {
        assert!(parse_source("").is_err());
    }

    #[test]
    fn parse_rejects_unbalanced_parens() {
        let errors = parse_source("(1 + 2").unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn parse_rejects_nesting_past_the_limit() {
        let depth = MAX_NESTING_DEPTH + 1;
        let source = format!("{}1{}", "[".repeat(depth), "]".repeat(depth));
        let errors = parse_source(&source).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("nested deeper"));
        assert_eq!(errors[0].span, MAX_NESTING_DEPTH..MAX_NESTING_DEPTH + 1);

        let ok = format!("{}1{}", "[".repeat(MAX_NESTING_DEPTH), "]".repeat(MAX_NESTING_DEPTH));
        assert!(parse_source(&ok).is_ok());
    }

    #[test]
    fn parse_rejects_overlong_token_streams() {
        let source = vec!["1"; MAX_EXPRESSION_TOKENS].join("+");
        let errors = parse_source(&source).unwrap_err();
        assert!(errors[0].message.contains("longer than"));
    }
}
