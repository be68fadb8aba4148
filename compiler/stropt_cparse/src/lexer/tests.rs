use super::*;
use pretty_assertions::assert_eq;

fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source)
        .unwrap()
        .into_iter()
        .map(|token| token.kind)
        .collect()
}

fn ident(name: &str) -> TokenKind {
    TokenKind::Ident(name.to_owned())
}

#[test]
fn struct_declaration_tokens() {
    assert_eq!(
        kinds("struct s { unsigned int *p; char buf[8]; };"),
        vec![
            TokenKind::Struct,
            ident("s"),
            TokenKind::LBrace,
            ident("unsigned"),
            ident("int"),
            TokenKind::Star,
            ident("p"),
            TokenKind::Semicolon,
            ident("char"),
            ident("buf"),
            TokenKind::LBracket,
            TokenKind::Int(8),
            TokenKind::RBracket,
            TokenKind::Semicolon,
            TokenKind::RBrace,
            TokenKind::Semicolon,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn keywords_need_word_boundaries() {
    assert_eq!(
        kinds("structure union_t enum"),
        vec![ident("structure"), ident("union_t"), TokenKind::Enum, TokenKind::Eof]
    );
}

#[test]
fn comments_are_skipped() {
    assert_eq!(
        kinds("int /* a * b */ x; // trailing ;\n/** doc\n * more */ y"),
        vec![
            ident("int"),
            ident("x"),
            TokenKind::Semicolon,
            ident("y"),
            TokenKind::Eof
        ]
    );
}

#[test]
fn integer_literal_forms() {
    assert_eq!(
        kinds("42 0x2A 0X2a 052 42u 42UL 0"),
        vec![
            TokenKind::Int(42),
            TokenKind::Int(42),
            TokenKind::Int(42),
            TokenKind::Int(42),
            TokenKind::Int(42),
            TokenKind::Int(42),
            TokenKind::Int(0),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn invalid_octal_literal() {
    let err = lex("char a[09];").unwrap_err();

    assert_eq!(err.kind, ParseErrorKind::InvalidLiteral("09".to_owned()));
    assert_eq!(err.span, 7..9);
}

#[test]
fn operators_in_skipped_code() {
    assert_eq!(
        kinds("a->b == c && d << 2 ... 1.5f \"s;\" ';'"),
        vec![
            ident("a"),
            TokenKind::Punct,
            ident("b"),
            TokenKind::Punct,
            ident("c"),
            TokenKind::Punct,
            ident("d"),
            TokenKind::Shl,
            TokenKind::Int(2),
            TokenKind::Ellipsis,
            TokenKind::Float,
            TokenKind::Str,
            TokenKind::Char,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn unknown_character_is_an_error() {
    let err = lex("int a; @").unwrap_err();

    assert_eq!(err.kind, ParseErrorKind::InvalidCharacter("@".to_owned()));
    assert_eq!(err.span, 7..8);
}

#[test]
fn eof_span_is_at_the_end() {
    let tokens = lex("x ").unwrap();
    assert_eq!(tokens.last().map(|t| t.span.clone()), Some(2..2));
}

#[test]
fn token_descriptions() {
    assert_eq!(TokenKind::LBrace.to_string(), "`{`");
    assert_eq!(ident("foo").to_string(), "identifier `foo`");
    assert_eq!(TokenKind::Eof.to_string(), "end of input");
}
