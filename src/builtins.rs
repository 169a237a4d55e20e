use std::collections::HashMap;
use std::io::{self, Write};

use bacon_rajan_cc::Cc;
use lazy_static::lazy_static;

use crate::error::{EvalError, EvalResult};
use crate::expr::{identical, Object};
use crate::interpreter::{Interpreter, PrimFn};
use crate::parse::parse_expr;
use crate::symbol::sym;

fn truth(test: bool) -> Cc<Object> {
    if test {
        Object::symbol(sym::T)
    } else {
        Object::nil()
    }
}

fn number_of(interp: &Interpreter, callee: &str, arg: &Cc<Object>) -> Result<f64, EvalError> {
    match &**arg {
        Object::Number(n) => Ok(*n),
        _ => Err(EvalError::TypeError(format!(
            "{} expects numbers (got {})",
            callee,
            arg.render(&interp.symbols)
        ))),
    }
}

macro_rules! numeric_fold {
    ($($fname:ident => $kname:expr, $identity:expr, $op:tt);+) => {
        $(
        fn $fname(interp: &mut Interpreter, args: &[Cc<Object>]) -> EvalResult {
            let mut acc = $identity;
            for arg in args.iter() {
                acc = acc $op number_of(interp, $kname, arg)?;
            }
            Ok(Object::number(acc))
        }
        )+
    }
}

macro_rules! numeric_compare {
    ($($fname:ident => $kname:expr, $op:tt);+) => {
        $(
        fn $fname(interp: &mut Interpreter, args: &[Cc<Object>]) -> EvalResult {
            args_check!($kname, args, 2);
            let a = number_of(interp, $kname, &args[0])?;
            let b = number_of(interp, $kname, &args[1])?;
            Ok(truth(a $op b))
        }
        )+
    }
}

numeric_fold! { prim_add => "+", 0.0, +; prim_mul => "*", 1.0, * }

numeric_compare! { prim_num_eq => "=", ==; prim_less => "<", < }

fn prim_sub(interp: &mut Interpreter, args: &[Cc<Object>]) -> EvalResult {
    match args.len() {
        1 => Ok(Object::number(-number_of(interp, "-", &args[0])?)),
        2 => {
            let a = number_of(interp, "-", &args[0])?;
            let b = number_of(interp, "-", &args[1])?;
            Ok(Object::number(a - b))
        }
        n => Err(EvalError::ArityMismatch {
            callee: "-".to_owned(),
            expected: "1 or 2".to_owned(),
            got: n,
        }
        .into()),
    }
}

fn prim_div(interp: &mut Interpreter, args: &[Cc<Object>]) -> EvalResult {
    args_check!("/", args, 2);
    let a = number_of(interp, "/", &args[0])?;
    let b = number_of(interp, "/", &args[1])?;
    Ok(Object::number(a / b))
}

fn prim_cons(_interp: &mut Interpreter, args: &[Cc<Object>]) -> EvalResult {
    args_check!("cons", args, 2);
    Ok(Object::cons(Cc::clone(&args[0]), Cc::clone(&args[1])))
}

fn prim_car(interp: &mut Interpreter, args: &[Cc<Object>]) -> EvalResult {
    args_check!("car", args, 1);
    match &*args[0] {
        Object::Pair(car, _) => Ok(Cc::clone(car)),
        _ => Err(EvalError::TypeError(format!(
            "car expects a pair (got {})",
            args[0].render(&interp.symbols)
        ))
        .into()),
    }
}

fn prim_cdr(interp: &mut Interpreter, args: &[Cc<Object>]) -> EvalResult {
    args_check!("cdr", args, 1);
    match &*args[0] {
        Object::Pair(_, cdr) => Ok(Cc::clone(cdr)),
        _ => Err(EvalError::TypeError(format!(
            "cdr expects a pair (got {})",
            args[0].render(&interp.symbols)
        ))
        .into()),
    }
}

fn prim_null(_interp: &mut Interpreter, args: &[Cc<Object>]) -> EvalResult {
    args_check!("null?", args, 1);
    Ok(truth(args[0].is_nil()))
}

fn prim_eq(_interp: &mut Interpreter, args: &[Cc<Object>]) -> EvalResult {
    args_check!("eq?", args, 2);
    Ok(truth(identical(&args[0], &args[1])))
}

fn prim_symbol(_interp: &mut Interpreter, args: &[Cc<Object>]) -> EvalResult {
    args_check!("symbol?", args, 1);
    Ok(truth(matches!(&*args[0], Object::Symbol(_))))
}

fn prim_not(_interp: &mut Interpreter, args: &[Cc<Object>]) -> EvalResult {
    args_check!("not", args, 1);
    Ok(truth(args[0].is_nil()))
}

/// Read one expression from stdin; Nil at end of input.
fn prim_read(interp: &mut Interpreter, args: &[Cc<Object>]) -> EvalResult {
    args_check!("read", args, 0);
    let mut line = String::new();
    loop {
        line.clear();
        let n = io::stdin()
            .read_line(&mut line)
            .map_err(|e| EvalError::TypeError(format!("read: {}", e)))?;
        if n == 0 {
            return Ok(Object::nil());
        }
        match parse_expr(&line, &mut interp.symbols) {
            Ok(Some(expr)) => return Ok(expr),
            Ok(None) => continue,
            Err(error) => return Err(EvalError::TypeError(format!("read: {}", error)).into()),
        }
    }
}

fn prim_print(interp: &mut Interpreter, args: &[Cc<Object>]) -> EvalResult {
    args_check!("print", args, 1);
    print!("{}", args[0].render(&interp.symbols));
    let _ = io::stdout().flush();
    Ok(Object::nil())
}

/// Re-enters the evaluator against the global environment.
fn prim_eval(interp: &mut Interpreter, args: &[Cc<Object>]) -> EvalResult {
    args_check!("eval", args, 1);
    interp.eval_global(&args[0])
}

lazy_static! {
    /// Primitive registry, installed into the global environment at init.
    pub static ref BUILTINS: HashMap<&'static str, PrimFn> = {
        let mut m: HashMap<&'static str, PrimFn> = HashMap::new();
        m.insert("+", prim_add);
        m.insert("-", prim_sub);
        m.insert("*", prim_mul);
        m.insert("/", prim_div);
        m.insert("=", prim_num_eq);
        m.insert("<", prim_less);
        m.insert("cons", prim_cons);
        m.insert("car", prim_car);
        m.insert("cdr", prim_cdr);
        m.insert("null?", prim_null);
        m.insert("eq?", prim_eq);
        m.insert("symbol?", prim_symbol);
        m.insert("not", prim_not);
        m.insert("read", prim_read);
        m.insert("print", prim_print);
        m.insert("eval", prim_eval);
        m
    };
}
