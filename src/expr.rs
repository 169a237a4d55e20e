use bacon_rajan_cc::{Cc, Trace, Tracer};

use crate::interpreter::{Env, PrimFn};
use crate::symbol::SymbolTable;

/// Interned symbol handle. Two occurrences of the same name always carry
/// the same id, so identity comparison doubles as name comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Sym(pub u32);

/// A Scheme value. Values circulate as `Cc<Object>` handles; pair cells are
/// never mutated after creation.
#[derive(Clone, Debug)]
pub enum Object {
    Nil,
    Number(f64),
    Symbol(Sym),
    Pair(Cc<Object>, Cc<Object>),
    Primitive(Primitive),
    Closure(Closure),
    Continuation(Continuation),
}

impl Trace for Object {
    fn trace(&mut self, tracer: &mut Tracer) {
        match self {
            Object::Pair(car, cdr) => {
                tracer(car);
                tracer(cdr);
            }
            Object::Closure(closure) => closure.trace(tracer),
            _ => {}
        }
    }
}

/// A procedure value: parameter list and body, closed over the local
/// environment chain active at creation.
#[derive(Clone, Debug)]
pub struct Closure {
    pub params: Vec<Sym>,
    pub body: Cc<Object>,
    pub env: Env,
}

impl Trace for Closure {
    fn trace(&mut self, tracer: &mut Tracer) {
        tracer(&mut self.body);
        self.env.trace(tracer);
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Primitive {
    pub name: &'static str,
    pub run: PrimFn,
}

/// An escape-only continuation. The token is checked against the single
/// active capture point when the continuation is invoked.
#[derive(Clone, Copy, Debug)]
pub struct Continuation {
    pub token: u64,
}

impl Object {
    pub fn nil() -> Cc<Object> {
        Cc::new(Object::Nil)
    }

    pub fn number(n: f64) -> Cc<Object> {
        Cc::new(Object::Number(n))
    }

    pub fn symbol(id: Sym) -> Cc<Object> {
        Cc::new(Object::Symbol(id))
    }

    pub fn cons(car: Cc<Object>, cdr: Cc<Object>) -> Cc<Object> {
        Cc::new(Object::Pair(car, cdr))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Object::Nil)
    }

    /// Print a value back out. Proper lists render space-separated; a
    /// non-list tail renders dotted.
    pub fn render(&self, symbols: &SymbolTable) -> String {
        match self {
            Object::Nil => "()".to_owned(),
            Object::Number(n) => format_number(*n),
            Object::Symbol(id) => symbols.name(*id).to_owned(),
            Object::Pair(car, cdr) => {
                let mut out = String::from("(");
                out.push_str(&car.render(symbols));
                let mut rest: &Object = &**cdr;
                loop {
                    match rest {
                        Object::Nil => break,
                        Object::Pair(a, d) => {
                            out.push(' ');
                            out.push_str(&a.render(symbols));
                            rest = &**d;
                        }
                        tail => {
                            out.push_str(" . ");
                            out.push_str(&tail.render(symbols));
                            break;
                        }
                    }
                }
                out.push(')');
                out
            }
            Object::Primitive(prim) => format!("#<primitive {}>", prim.name),
            Object::Closure(_) => "#<closure>".to_owned(),
            Object::Continuation(_) => "#<continuation>".to_owned(),
        }
    }
}

/// Identity comparison: symbols by interned id, Nil by kind, everything
/// else by cell identity.
pub fn identical(a: &Cc<Object>, b: &Cc<Object>) -> bool {
    match (&**a, &**b) {
        (Object::Symbol(x), Object::Symbol(y)) => x == y,
        (Object::Nil, Object::Nil) => true,
        _ => &**a as *const Object == &**b as *const Object,
    }
}

/// Render like C's "%.15g": integral values without a fractional part,
/// everything else trimmed to 15 significant digits.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_owned();
    }
    if !n.is_finite() {
        return format!("{}", n);
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }
    let magnitude = n.abs().log10().floor() as i32;
    let decimals = (14 - magnitude).max(0) as usize;
    let rendered = format!("{:.*}", decimals, n);
    rendered.trim_end_matches('0').trim_end_matches('.').to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_render_without_trailing_noise() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(7.0), "7");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(1.0 / 3.0), "0.333333333333333");
    }

    #[test]
    fn pairs_render_as_lists_or_dotted() {
        let symbols = SymbolTable::new();
        let pair = Object::cons(Object::number(1.0), Object::number(2.0));
        assert_eq!(pair.render(&symbols), "(1 . 2)");
        let list = Object::cons(
            Object::number(1.0),
            Object::cons(Object::number(2.0), Object::nil()),
        );
        assert_eq!(list.render(&symbols), "(1 2)");
    }

    #[test]
    fn identity_follows_interning_for_symbols_and_cells_for_pairs() {
        let a1 = Object::symbol(Sym(3));
        let a2 = Object::symbol(Sym(3));
        let b = Object::symbol(Sym(4));
        assert!(identical(&a1, &a2));
        assert!(!identical(&a1, &b));

        let p = Object::cons(Object::nil(), Object::nil());
        let q = Object::cons(Object::nil(), Object::nil());
        assert!(identical(&p, &Cc::clone(&p)));
        assert!(!identical(&p, &q));
        assert!(identical(&Object::nil(), &Object::nil()));
    }
}
