use logos::Logos;
use std::fmt;

/// Token type for the embedded expression language.
///
/// Keywords are lexed as identifiers by logos and promoted afterwards, so
/// `android` stays an identifier while `and` becomes [`Token::And`].
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Left parenthesis `(`.
    LParen,
    /// Right parenthesis `)`.
    RParen,
    /// Left bracket `[`.
    LBracket,
    /// Right bracket `]`.
    RBracket,
    /// Comma separator `,`.
    Comma,
    /// Field access `.`.
    Dot,
    /// Assignment `=`.
    Assign,
    /// Equality `==`.
    Eq,
    /// Inequality `!=`.
    Ne,
    /// Less than `<`.
    Lt,
    /// Less than or equal `<=`.
    Le,
    /// Greater than `>`.
    Gt,
    /// Greater than or equal `>=`.
    Ge,
    /// Addition or concatenation `+`.
    Plus,
    /// Subtraction or negation `-`.
    Minus,
    /// Multiplication or repetition `*`.
    Star,
    /// Division `/`.
    Slash,
    /// Remainder `%`.
    Percent,
    /// Keyword `and`.
    And,
    /// Keyword `or`.
    Or,
    /// Keyword `not`.
    Not,
    /// Keyword `if`.
    If,
    /// Keyword `else`.
    Else,
    /// Keyword `true`.
    True,
    /// Keyword `false`.
    False,
    /// Keyword `nil`.
    Nil,
    /// Integer literal (supports Rust-style underscores).
    Integer(i64),
    /// Floating-point literal.
    Float(f64),
    /// Single- or double-quoted string literal, escapes processed.
    Str(String),
    /// Identifier.
    Ident(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::Assign => write!(f, "="),
            Token::Eq => write!(f, "=="),
            Token::Ne => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Le => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::Ge => write!(f, ">="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Nil => write!(f, "nil"),
            Token::Integer(n) => write!(f, "{n}"),
            Token::Float(n) => write!(f, "{n}"),
            Token::Str(s) => write!(f, "{s:?}"),
            Token::Ident(w) => write!(f, "{w}"),
        }
    }
}

/// Internal logos token, converted to an owned [`Token`] after lexing.
#[derive(Logos, Debug)]
#[logos(skip r"[ \t\r\n]+")]
enum RawToken {
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    #[token("=")]
    Assign,

    #[token("==")]
    Eq,

    #[token("!=")]
    Ne,

    #[token("<")]
    Lt,

    #[token("<=")]
    Le,

    #[token(">")]
    Gt,

    #[token(">=")]
    Ge,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[regex(r#""([^"\\]|\\.)*""#)]
    DoubleQuoted,

    #[regex(r"'([^'\\]|\\.)*'")]
    SingleQuoted,

    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*")]
    Float,

    #[regex(r"[0-9][0-9_]*")]
    Integer,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

/// A lexer error with source location.
#[derive(Debug, Clone)]
pub struct LexError {
    /// Byte range of the erroneous input in the source.
    pub span: std::ops::Range<usize>,
    /// Human-readable description of the lexer error.
    pub message: String,
}

/// Lex an expression into a sequence of `(Token, Span)` pairs.
///
/// Returns the token stream and any lexer errors. Lexing continues past
/// errors so every bad character is reported at once.
pub fn lex(source: &str) -> (Vec<(Token, std::ops::Range<usize>)>, Vec<LexError>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut lexer = RawToken::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(raw) => {
                let token = match raw {
                    RawToken::LParen => Token::LParen,
                    RawToken::RParen => Token::RParen,
                    RawToken::LBracket => Token::LBracket,
                    RawToken::RBracket => Token::RBracket,
                    RawToken::Comma => Token::Comma,
                    RawToken::Dot => Token::Dot,
                    RawToken::Assign => Token::Assign,
                    RawToken::Eq => Token::Eq,
                    RawToken::Ne => Token::Ne,
                    RawToken::Lt => Token::Lt,
                    RawToken::Le => Token::Le,
                    RawToken::Gt => Token::Gt,
                    RawToken::Ge => Token::Ge,
                    RawToken::Plus => Token::Plus,
                    RawToken::Minus => Token::Minus,
                    RawToken::Star => Token::Star,
                    RawToken::Slash => Token::Slash,
                    RawToken::Percent => Token::Percent,
                    RawToken::DoubleQuoted | RawToken::SingleQuoted => {
                        let slice = lexer.slice();
                        Token::Str(unescape(&slice[1..slice.len() - 1]))
                    }
                    RawToken::Float => {
                        let raw = lexer.slice();
                        match raw.replace('_', "").parse::<f64>() {
                            Ok(n) => Token::Float(n),
                            Err(_) => {
                                errors.push(LexError {
                                    span: span.clone(),
                                    message: format!("invalid float literal: {raw}"),
                                });
                                continue;
                            }
                        }
                    }
                    RawToken::Integer => {
                        let raw = lexer.slice();
                        match raw.replace('_', "").parse::<i64>() {
                            Ok(n) => Token::Integer(n),
                            Err(_) => {
                                errors.push(LexError {
                                    span: span.clone(),
                                    message: format!("integer literal out of range: {raw}"),
                                });
                                continue;
                            }
                        }
                    }
                    RawToken::Ident => keyword_or_ident(lexer.slice()),
                };
                tokens.push((token, span));
            }
            Err(()) => {
                errors.push(LexError {
                    span: span.clone(),
                    message: format!("unexpected character: {:?}", &source[span.clone()]),
                });
            }
        }
    }

    (tokens, errors)
}

fn keyword_or_ident(word: &str) -> Token {
    match word {
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "if" => Token::If,
        "else" => Token::Else,
        "true" => Token::True,
        "false" => Token::False,
        "nil" => Token::Nil,
        other => Token::Ident(other.to_string()),
    }
}

/// Process escape sequences in a string literal.
///
/// Supports `\\`, `\n`, `\t`, `\"`, `\'`. Unknown sequences are kept as-is.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some('\'') => out.push('\''),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        let (tokens, errors) = lex(source);
        assert!(errors.is_empty(), "errors: {errors:?}");
        tokens.into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn lex_arithmetic() {
        assert_eq!(
            tokens("2+2 * 10"),
            vec![
                Token::Integer(2),
                Token::Plus,
                Token::Integer(2),
                Token::Star,
                Token::Integer(10)
            ]
        );
    }

    #[test]
    fn lex_comparison_prefers_longest_operator() {
        assert_eq!(
            tokens("a <= b == c = d"),
            vec![
                Token::Ident("a".into()),
                Token::Le,
                Token::Ident("b".into()),
                Token::Eq,
                Token::Ident("c".into()),
                Token::Assign,
                Token::Ident("d".into()),
            ]
        );
    }

    #[test]
    fn lex_keywords_but_not_prefixes() {
        assert_eq!(
            tokens("not android and true"),
            vec![
                Token::Not,
                Token::Ident("android".into()),
                Token::And,
                Token::True
            ]
        );
    }

    #[test]
    fn lex_both_quote_styles() {
        assert_eq!(
            tokens(r#"'lit' "dark""#),
            vec![Token::Str("lit".into()), Token::Str("dark".into())]
        );
    }

    #[test]
    fn lex_string_with_escapes() {
        assert_eq!(
            tokens(r#""say \"hi\"\n""#),
            vec![Token::Str("say \"hi\"\n".into())]
        );
        assert_eq!(tokens(r"'it\'s'"), vec![Token::Str("it's".into())]);
    }

    #[test]
    fn lex_numbers_with_underscores() {
        assert_eq!(tokens("45_000"), vec![Token::Integer(45_000)]);
        assert_eq!(tokens("2.5"), vec![Token::Float(2.5)]);
    }

    #[test]
    fn lex_field_access() {
        assert_eq!(
            tokens("lamp.lit"),
            vec![
                Token::Ident("lamp".into()),
                Token::Dot,
                Token::Ident("lit".into())
            ]
        );
    }

    #[test]
    fn lex_reports_unexpected_characters() {
        let (_, errors) = lex("1 ; 2");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].span, 2..3);
    }

    #[test]
    fn lex_reports_integer_overflow() {
        let (tokens, errors) = lex("99999999999999999999");
        assert!(tokens.is_empty());
        assert!(errors[0].message.contains("out of range"));
    }

    #[test]
    fn unescape_unknown_kept() {
        assert_eq!(unescape(r"\x"), "\\x");
        assert_eq!(unescape("trail\\"), "trail\\");
    }
}
