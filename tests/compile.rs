use std::collections::HashMap;
use std::io;

use moustache::{Engine, Error, ErrorKind, Position};

#[test]
fn compile_empty() {
    Engine::new().compile("").unwrap();
}

#[test]
fn compile_raw() {
    Engine::new().compile("lorem ipsum dolor sit amet").unwrap();
}

#[test]
fn compile_all_tags() {
    Engine::new()
        .compile("{{a}} {{{b}}} {{&c}} {{#d}}{{^e}}{{/e}}{{/d}} {{! f }} {{=<% %>=}}<%g.h%>")
        .unwrap();
}

#[test]
fn compile_reader() {
    let engine = Engine::new();
    let template = engine.compile_reader(io::Cursor::new("lorem {{ ipsum }}")).unwrap();
    assert_eq!(template.source(), "lorem {{ ipsum }}");
}

#[test]
fn compile_err_empty_tag() {
    let err = Engine::new().compile("lorem {{ }} ipsum").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(
        format!("{:#}", err),
        "
   |
 1 | lorem {{ }} ipsum
   |       ^^^^^ empty tag
"
    );
}

#[test]
fn compile_err_invalid_tag_content() {
    let err = Engine::new().compile("{{ a b }}").unwrap_err();
    assert_eq!(err.to_string(), "invalid tag content `a b` at line 1 column 1");

    let err = Engine::new().compile("{{# 1a }}{{/ 1a }}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
}

#[test]
fn compile_err_unterminated_tag() {
    let err = Engine::new().compile("lorem\nipsum {{ dolor").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(err.position(), Some(Position { line: 2, column: 7 }));
    assert_eq!(
        format!("{:#}", err),
        "
   |
 2 | ipsum {{ dolor
   |       ^^^^^^^^ unterminated tag
"
    );
}

#[test]
fn compile_err_section_mismatch() {
    let err = Engine::new().compile("{{#a}}{{/b}}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SectionMismatch);
    assert_eq!(
        format!("{:#}", err),
        "
   |
 1 | {{#a}}{{/b}}
   |       ^^^^^^ expected `{{/a}}` but found `{{/b}}`
"
    );
}

#[test]
fn compile_err_unexpected_close() {
    let err = Engine::new().compile("lorem {{/a}}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SectionMismatch);
    assert_eq!(
        err.to_string(),
        "unexpected `{{/a}}`, no section is open at line 1 column 7"
    );
}

#[test]
fn compile_err_unclosed_section() {
    let err = Engine::new().compile("{{#a}}\n{{^b}}\n{{/b}}\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SectionMismatch);
    assert_eq!(err.to_string(), "unclosed section `a` at line 1 column 1");
}

#[test]
fn compile_err_invalid_delimiters() {
    let err = Engine::new().compile("{{=<% %>}}").unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid delimiter directive `=<% %>` at line 1 column 1"
    );

    let err = Engine::new().compile("{{={{{ }}}=}}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
}

#[test]
fn compile_err_partial_not_found() {
    let err = Engine::new().compile("a\n  {{> nope }}\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PartialNotFound);
    assert_eq!(err.to_string(), "unknown partial `nope` at line 2 column 3");
}

#[test]
fn compile_err_in_partial() {
    let mut engine = Engine::new();
    engine.set_partial_loader(HashMap::from([
        (String::from("outer"), String::from("{{> inner}}")),
        (String::from("inner"), String::from("x\n{{#a}}")),
    ]));
    let err = engine.compile("{{> outer}}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SectionMismatch);
    assert_eq!(err.name(), Some("inner"));
    assert_eq!(
        err.to_string(),
        "unclosed section `a` at line 2 column 1 in partial `inner`"
    );
    assert_eq!(
        format!("{:#}", err),
        "
  --> inner
   |
 2 | {{#a}}
   | ^^^^^^ unclosed section `a`
"
    );
}

#[test]
fn compile_err_loader_io() {
    let mut engine = Engine::new();
    engine.set_partial_loader(|_: &str| -> io::Result<String> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
    });
    let err = engine.compile("{{> p}}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(
        err.to_string(),
        "failed to load partial `p` at line 1 column 1"
    );
    let source = std::error::Error::source(&err).unwrap();
    assert_eq!(source.to_string(), "denied");
}

#[test]
fn compile_err_loader_not_found() {
    let mut engine = Engine::new();
    engine.set_partial_loader(|name: &str| -> io::Result<String> {
        match name {
            "a" => Ok(String::from("{{> b}}")),
            _ => Err(io::Error::from(io::ErrorKind::NotFound)),
        }
    });
    let err = engine.compile("{{> a}}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PartialNotFound);
    assert_eq!(err.name(), Some("a"));
}

#[test]
fn compile_err_is_std_error() {
    fn check(_: &dyn std::error::Error) {}
    let err: Error = Engine::new().compile("{{").unwrap_err();
    check(&err);
}
