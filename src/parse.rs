use std::fs;

use bacon_rajan_cc::Cc;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::expr::Object;
use crate::symbol::{sym, SymbolTable};

#[derive(Parser)]
#[grammar = "skink.pest"]
struct SkinkParser;

pub fn parse_source_file(path: &str, symbols: &mut SymbolTable) -> Result<Vec<Cc<Object>>, String> {
    let code = fs::read_to_string(path)
        .map_err(|e| format!(r#"error reading file "{}": {}"#, path, e))?;
    parse_program(&code, symbols)
}

/// Parse every expression in `src`.
pub fn parse_program(src: &str, symbols: &mut SymbolTable) -> Result<Vec<Cc<Object>>, String> {
    let pairs =
        SkinkParser::parse(Rule::program, src).map_err(|e| format!("syntax error: {}", e))?;
    Ok(pairs
        .filter(|pair| pair.as_rule() != Rule::EOI)
        .map(|pair| build_object(pair, symbols))
        .collect())
}

/// Parse at most one expression; `None` when the input holds nothing.
pub fn parse_expr(src: &str, symbols: &mut SymbolTable) -> Result<Option<Cc<Object>>, String> {
    let mut pairs =
        SkinkParser::parse(Rule::single_expr, src).map_err(|e| format!("syntax error: {}", e))?;
    Ok(pairs
        .find(|pair| pair.as_rule() != Rule::EOI)
        .map(|pair| build_object(pair, symbols)))
}

fn build_object(pair: Pair<Rule>, symbols: &mut SymbolTable) -> Cc<Object> {
    match pair.as_rule() {
        Rule::sexpr => build_object(pair.into_inner().next().unwrap(), symbols),
        Rule::number => Object::number(pair.as_str().parse::<f64>().unwrap()),
        Rule::symbol => Object::symbol(symbols.intern(pair.as_str())),
        Rule::list => {
            let items: Vec<Cc<Object>> = pair
                .into_inner()
                .map(|sub| build_object(sub, symbols))
                .collect();
            proper_list(items)
        }
        Rule::quoted => proper_list(vec![
            Object::symbol(sym::QUOTE),
            build_object(pair.into_inner().next().unwrap(), symbols),
        ]),
        _ => unreachable!(),
    }
}

fn proper_list(items: Vec<Cc<Object>>) -> Cc<Object> {
    items
        .into_iter()
        .rev()
        .fold(Object::nil(), |tail, item| Object::cons(item, tail))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(src: &str) -> String {
        let mut symbols = SymbolTable::new();
        let expr = parse_expr(src, &mut symbols)
            .expect("parse failure")
            .expect("no expression");
        expr.render(&symbols)
    }

    #[test]
    fn reader_and_printer_invert_each_other() {
        for src in [
            "42",
            "foo",
            "call/cc",
            "(+ 1 2)",
            "(a (b c) 99)",
            "()",
            "(a (b (c (d))))",
        ] {
            assert_eq!(roundtrip(src), src);
        }
    }

    #[test]
    fn whitespace_is_normalized() {
        assert_eq!(roundtrip("( +   1\n  2 )"), "(+ 1 2)");
    }

    #[test]
    fn quote_shorthand_expands() {
        assert_eq!(roundtrip("'x"), "(quote x)");
        assert_eq!(roundtrip("'(1 2)"), "(quote (1 2))");
    }

    #[test]
    fn empty_input_is_end_of_input() {
        let mut symbols = SymbolTable::new();
        assert!(parse_expr("", &mut symbols).unwrap().is_none());
        assert!(parse_expr("   ", &mut symbols).unwrap().is_none());
    }

    #[test]
    fn program_parses_every_expression() {
        let mut symbols = SymbolTable::new();
        let exprs = parse_program("1 (a) ()", &mut symbols).unwrap();
        assert_eq!(exprs.len(), 3);
    }

    #[test]
    fn numbers_are_nonnegative_integer_literals() {
        let mut symbols = SymbolTable::new();
        let expr = parse_expr("007", &mut symbols).unwrap().unwrap();
        assert!(matches!(&*expr, Object::Number(n) if *n == 7.0));
    }

    #[test]
    fn bare_minus_is_a_symbol() {
        let mut symbols = SymbolTable::new();
        let expr = parse_expr("-", &mut symbols).unwrap().unwrap();
        assert!(matches!(&*expr, Object::Symbol(_)));
    }

    #[test]
    fn garbage_is_a_syntax_error() {
        let mut symbols = SymbolTable::new();
        assert!(parse_expr("(a", &mut symbols).is_err());
        assert!(parse_expr(")", &mut symbols).is_err());
    }
}
