use bacon_rajan_cc::{Cc, Trace, Tracer};

use crate::builtins::BUILTINS;
use crate::error::{EvalError, EvalResult, Signal};
use crate::expr::{Closure, Continuation, Object, Primitive, Sym};
use crate::parse::parse_source_file;
use crate::symbol::{sym, SymbolTable};

pub type PrimFn = fn(&mut Interpreter, &[Cc<Object>]) -> EvalResult;

#[macro_export]
macro_rules! args_check {
    ($name:expr, $args:expr, $nparams:expr) => {
        if $args.len() != $nparams {
            return Err($crate::error::EvalError::ArityMismatch {
                callee: $name.to_owned(),
                expected: $nparams.to_string(),
                got: $args.len(),
            }
            .into());
        }
    };
}

macro_rules! form_check {
    ($name:expr, $args:expr, $nparams:expr) => {
        if $args.len() != $nparams {
            return Err(EvalError::MalformedSpecialForm($name).into());
        }
    };
}

/// A persistent chain of bindings. Extending never touches the parent
/// chain; closures share the frames they captured.
#[derive(Clone, Debug)]
pub struct Env(Option<Cc<Frame>>);

#[derive(Debug)]
pub struct Frame {
    name: Sym,
    value: Cc<Object>,
    next: Env,
}

impl Trace for Frame {
    fn trace(&mut self, tracer: &mut Tracer) {
        tracer(&mut self.value);
        self.next.trace(tracer);
    }
}

impl Trace for Env {
    fn trace(&mut self, tracer: &mut Tracer) {
        if let Some(frame) = &mut self.0 {
            tracer(frame);
        }
    }
}

impl Env {
    pub fn empty() -> Env {
        Env(None)
    }

    /// Innermost binding wins; this is how shadowing works.
    pub fn lookup(&self, name: Sym) -> Option<Cc<Object>> {
        let mut frame = &self.0;
        while let Some(f) = frame {
            if f.name == name {
                return Some(Cc::clone(&f.value));
            }
            frame = &f.next.0;
        }
        None
    }

    /// Prepend one binding, leaving `self` untouched.
    pub fn define(&self, name: Sym, value: Cc<Object>) -> Env {
        Env(Some(Cc::new(Frame {
            name,
            value,
            next: self.clone(),
        })))
    }

    /// Bind formals to arguments pairwise on top of `self`.
    pub fn extend(&self, formals: &[Sym], args: &[Cc<Object>]) -> Result<Env, EvalError> {
        if formals.len() != args.len() {
            return Err(EvalError::ArityMismatch {
                callee: "#<closure>".to_owned(),
                expected: formals.len().to_string(),
                got: args.len(),
            });
        }
        let mut env = self.clone();
        for (formal, arg) in formals.iter().zip(args.iter()) {
            env = env.define(*formal, Cc::clone(arg));
        }
        Ok(env)
    }
}

/// The closed set of special forms, resolved from pre-interned symbol ids
/// so dispatch never compares strings.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Form {
    Quote,
    If,
    Lambda,
    Define,
    CallCc,
}

impl Form {
    fn of(id: Sym) -> Option<Form> {
        match id {
            sym::QUOTE => Some(Form::Quote),
            sym::IF => Some(Form::If),
            sym::LAMBDA => Some(Form::Lambda),
            sym::DEFINE => Some(Form::Define),
            sym::CALL_CC => Some(Form::CallCc),
            _ => None,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Form::Quote => "quote",
            Form::If => "if",
            Form::Lambda => "lambda",
            Form::Define => "define",
            Form::CallCc => "call/cc",
        }
    }
}

pub struct Interpreter {
    pub symbols: SymbolTable,
    /// The designated global environment: process-wide mutable state,
    /// shared as the tail scope of every evaluation.
    global: Env,
    capture_seq: u64,
    active_capture: Option<u64>,
}

impl Interpreter {
    /// Build the global environment with every primitive installed.
    pub fn init() -> Interpreter {
        let mut symbols = SymbolTable::new();
        let mut global = Env::empty();
        for (&name, &run) in BUILTINS.iter() {
            let id = symbols.intern(name);
            let prim = Primitive { name, run };
            global = global.define(id, Cc::new(Object::Primitive(prim)));
        }
        Interpreter {
            symbols,
            global,
            capture_seq: 0,
            active_capture: None,
        }
    }

    /// Evaluate one top-level expression. A `define` reached in this
    /// context extends the global environment for every subsequent
    /// evaluation; the `eval` primitive re-enters here.
    pub fn eval_global(&mut self, expr: &Cc<Object>) -> EvalResult {
        let mut locals = Env::empty();
        self.eval(expr, &mut locals, true)
    }

    /// Drop any capture left behind by an aborted evaluation.
    pub fn recover(&mut self) {
        self.active_capture = None;
    }

    pub fn exec_file(&mut self, path: &str) -> Result<(), String> {
        let exprs = parse_source_file(path, &mut self.symbols)?;
        for expr in exprs.iter() {
            self.eval_global(expr)
                .map_err(|signal| signal.into_error().to_string())?;
        }
        Ok(())
    }

    /// Dispatch on the shape of `expr`. `env` is the local lexical chain;
    /// names missing from it resolve against the global environment.
    /// `global_scope` marks evaluation whose environment *is* the global
    /// instance, which is where `define` becomes globally visible.
    pub fn eval(&mut self, expr: &Cc<Object>, env: &mut Env, global_scope: bool) -> EvalResult {
        match &**expr {
            Object::Number(_) | Object::Nil => Ok(Cc::clone(expr)),
            Object::Symbol(id) => match env.lookup(*id).or_else(|| self.global.lookup(*id)) {
                Some(value) => Ok(value),
                None => {
                    Err(EvalError::UnboundVariable(self.symbols.name(*id).to_owned()).into())
                }
            },
            Object::Pair(car, _) => {
                if let Object::Symbol(head) = &**car {
                    if let Some(form) = Form::of(*head) {
                        return self.eval_form(form, expr, env, global_scope);
                    }
                }
                self.eval_call(expr, env, global_scope)
            }
            _ => Err(EvalError::TypeError(format!(
                "cannot evaluate {}",
                expr.render(&self.symbols)
            ))
            .into()),
        }
    }

    fn eval_form(
        &mut self,
        form: Form,
        expr: &Cc<Object>,
        env: &mut Env,
        global_scope: bool,
    ) -> EvalResult {
        let name = form.keyword();
        let items = list_items(expr).ok_or(EvalError::MalformedSpecialForm(name))?;
        let args = &items[1..];
        match form {
            Form::Quote => {
                form_check!(name, args, 1);
                Ok(Cc::clone(&args[0]))
            }
            Form::If => {
                form_check!(name, args, 3);
                let test = self.eval(&args[0], env, global_scope)?;
                if test.is_nil() {
                    self.eval(&args[2], env, global_scope)
                } else {
                    self.eval(&args[1], env, global_scope)
                }
            }
            Form::Lambda => {
                // Extra body expressions are ignored, not sequenced.
                if args.len() < 2 {
                    return Err(EvalError::MalformedSpecialForm(name).into());
                }
                let params = param_list(&args[0]).ok_or(EvalError::MalformedSpecialForm(name))?;
                Ok(Cc::new(Object::Closure(Closure {
                    params,
                    body: Cc::clone(&args[1]),
                    env: env.clone(),
                })))
            }
            Form::Define => {
                form_check!(name, args, 2);
                let id = match &*args[0] {
                    Object::Symbol(id) => *id,
                    _ => return Err(EvalError::MalformedSpecialForm(name).into()),
                };
                let value = self.eval(&args[1], env, global_scope)?;
                if global_scope {
                    self.global = self.global.define(id, value);
                } else {
                    *env = env.define(id, value);
                }
                Ok(Object::nil())
            }
            Form::CallCc => {
                form_check!(name, args, 1);
                self.eval_callcc(&args[0], env, global_scope)
            }
        }
    }

    fn eval_call(&mut self, expr: &Cc<Object>, env: &mut Env, global_scope: bool) -> EvalResult {
        let items = match list_items(expr) {
            Some(items) => items,
            None => {
                return Err(EvalError::TypeError(format!(
                    "improper call form {}",
                    expr.render(&self.symbols)
                ))
                .into())
            }
        };
        let mut evaluated = Vec::with_capacity(items.len());
        for item in items.iter() {
            evaluated.push(self.eval(item, env, global_scope)?);
        }
        let callee = evaluated.remove(0);
        self.apply(callee, &evaluated)
    }

    /// Apply a callee to an already-evaluated argument list.
    pub fn apply(&mut self, callee: Cc<Object>, args: &[Cc<Object>]) -> EvalResult {
        match &*callee {
            Object::Primitive(prim) => (prim.run)(self, args),
            Object::Closure(closure) => {
                let mut call_env = closure.env.extend(&closure.params, args)?;
                self.eval(&closure.body, &mut call_env, false)
            }
            Object::Continuation(k) => self.invoke_continuation(*k, args),
            _ => Err(EvalError::NotAProcedure(callee.render(&self.symbols)).into()),
        }
    }

    /// Establish a capture point and apply the receiver to its
    /// continuation. The capture slot is single: a newer capture
    /// permanently invalidates the previous one.
    fn eval_callcc(
        &mut self,
        receiver: &Cc<Object>,
        env: &mut Env,
        global_scope: bool,
    ) -> EvalResult {
        let callee = self.eval(receiver, env, global_scope)?;
        self.capture_seq += 1;
        let token = self.capture_seq;
        self.active_capture = Some(token);
        let k = Cc::new(Object::Continuation(Continuation { token }));
        let result = self.apply(callee, &[k]);
        if self.active_capture == Some(token) {
            self.active_capture = None;
        }
        match result {
            Err(Signal::Escape { token: t, value }) if t == token => Ok(value),
            other => other,
        }
    }

    fn invoke_continuation(&mut self, k: Continuation, args: &[Cc<Object>]) -> EvalResult {
        args_check!("#<continuation>", args, 1);
        if self.active_capture == Some(k.token) {
            Err(Signal::Escape {
                token: k.token,
                value: Cc::clone(&args[0]),
            })
        } else {
            Err(EvalError::InvalidContinuationUse.into())
        }
    }
}

/// Collect a proper list into a vector; `None` for dotted shapes.
pub fn list_items(obj: &Cc<Object>) -> Option<Vec<Cc<Object>>> {
    let mut items = Vec::new();
    let mut rest: &Object = &**obj;
    loop {
        match rest {
            Object::Nil => return Some(items),
            Object::Pair(car, cdr) => {
                items.push(Cc::clone(car));
                rest = &**cdr;
            }
            _ => return None,
        }
    }
}

fn param_list(obj: &Cc<Object>) -> Option<Vec<Sym>> {
    let mut params = Vec::new();
    for item in list_items(obj)? {
        match &*item {
            Object::Symbol(id) => params.push(*id),
            _ => return None,
        }
    }
    Some(params)
}
