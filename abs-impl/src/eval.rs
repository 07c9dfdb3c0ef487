//! Reference interpreter for flattened models.
//!
//! Execution is sequential. Asynchronous calls run to completion when they
//! are made and yield an already resolved future, so `.get` never blocks.

use abs_grammar::nodes::*;
use abs_grammar::symbol_table::{LookupError, SymbolTable};
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_FUEL: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
    Unit,
    Null,
    Object(ObjectId),
    /// A resolved future.
    Future(Box<Value>),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Str(_) => "String",
            Value::Unit => "Unit",
            Value::Null => "null",
            Value::Object(_) => "object",
            Value::Future(_) => "future",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Unit => write!(f, "Unit"),
            Value::Null => write!(f, "null"),
            Value::Object(id) => write!(f, "object#{}", id.0),
            Value::Future(v) => write!(f, "future({})", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("class {0} is not declared")]
    UnknownClass(String),
    #[error("class {name} is {reason}")]
    AmbiguousClass { name: String, reason: String },
    #[error("class {class} has no method {method}")]
    UnknownMethod { class: String, method: String },
    #[error("class {class} has no field {field}")]
    UnknownField { class: String, field: String },
    #[error("variable {0} is not bound")]
    UnboundVariable(String),
    #[error("{what} expects {expected} argument(s), found {found}")]
    WrongArgumentCount {
        what: String,
        expected: usize,
        found: usize,
    },
    #[error("call of {0} on null")]
    NullDereference(String),
    #[error("original() in {0}, which replaced no method")]
    NoOriginal(String),
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    Overflow,
    #[error("step budget of {0} exhausted")]
    OutOfFuel(u64),
}

#[derive(Debug)]
struct Object<'m> {
    class: &'m ClassDecl,
    module: &'m str,
    fields: BTreeMap<String, Value>,
}

/// Activation of one body.
struct Frame<'m> {
    this: ObjectId,
    module: &'m str,
    method: Option<&'m MethodImpl>,
    scopes: Vec<BTreeMap<String, Value>>,
}

impl<'m> Frame<'m> {
    fn new(this: ObjectId, module: &'m str, method: Option<&'m MethodImpl>) -> Self {
        Self {
            this,
            module,
            method,
            scopes: vec![BTreeMap::new()],
        }
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|s| s.get(name))
    }

    fn lookup_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.scopes.iter_mut().rev().find_map(|s| s.get_mut(name))
    }
}

pub struct Interpreter<'m> {
    symbols: SymbolTable<'m>,
    heap: Vec<Object<'m>>,
    fuel: u64,
    limit: u64,
}

impl<'m> Interpreter<'m> {
    pub fn new(model: &'m Model) -> Self {
        Self::with_fuel(model, DEFAULT_FUEL)
    }

    /// An interpreter that gives up after `fuel` statements and calls.
    pub fn with_fuel(model: &'m Model, fuel: u64) -> Self {
        Self {
            symbols: SymbolTable::new(model),
            heap: Vec::new(),
            fuel,
            limit: fuel,
        }
    }

    /// Creates an object of `class`, as `new class(args)` would.
    pub fn instantiate(&mut self, class: &str, args: Vec<Value>) -> Result<ObjectId, EvalError> {
        let (module, decl) = self.resolve_class(None, class)?;
        self.create(module, decl, args)
    }

    /// Synchronously calls `method` on `receiver`.
    pub fn call(&mut self, receiver: ObjectId, method: &str, args: Vec<Value>) -> Result<Value, EvalError> {
        self.invoke(receiver, method, args)
    }

    pub fn field(&self, object: ObjectId, name: &str) -> Option<&Value> {
        self.heap.get(object.0).and_then(|o| o.fields.get(name))
    }

    pub fn class_of(&self, object: ObjectId) -> Option<&'m str> {
        self.heap.get(object.0).map(|o| o.class.name.as_str())
    }

    /// Steps taken so far.
    pub fn steps(&self) -> u64 {
        self.limit - self.fuel
    }

    fn tick(&mut self) -> Result<(), EvalError> {
        if self.fuel == 0 {
            return Err(EvalError::OutOfFuel(self.limit));
        }
        self.fuel -= 1;
        Ok(())
    }

    fn resolve_class(&self, from: Option<&str>, name: &str) -> Result<(&'m str, &'m ClassDecl), EvalError> {
        match self.symbols.classes.resolve_entry(from, name) {
            Ok(entry) => Ok((entry.module, entry.decl)),
            Err(LookupError::Unresolved) => Err(EvalError::UnknownClass(name.to_string())),
            Err(e) => Err(EvalError::AmbiguousClass {
                name: name.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn create(&mut self, module: &'m str, class: &'m ClassDecl, args: Vec<Value>) -> Result<ObjectId, EvalError> {
        if class.params.len() != args.len() {
            return Err(EvalError::WrongArgumentCount {
                what: format!("class {}", class.name),
                expected: class.params.len(),
                found: args.len(),
            });
        }
        let id = ObjectId(self.heap.len());
        let fields = class
            .params
            .iter()
            .map(|p| p.name.clone())
            .zip(args)
            .chain(class.fields.iter().map(|f| (f.name.clone(), Value::Null)))
            .collect();
        self.heap.push(Object { class, module, fields });
        tracing::trace!(class = %class.name, object = id.0, "created object");

        let mut frame = Frame::new(id, module, None);
        for f in &class.fields {
            if let Some(init) = &f.init {
                let value = self.eval(&mut frame, init)?;
                self.set_field(id, &f.name, value)?;
            }
        }
        if let Some(init) = &class.init {
            self.exec_block(&mut frame, init)?;
        }
        Ok(id)
    }

    fn object(&self, id: ObjectId) -> &Object<'m> {
        &self.heap[id.0]
    }

    fn set_field(&mut self, id: ObjectId, name: &str, value: Value) -> Result<(), EvalError> {
        let object = &mut self.heap[id.0];
        match object.fields.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(EvalError::UnknownField {
                class: object.class.name.clone(),
                field: name.to_string(),
            }),
        }
    }

    fn invoke(&mut self, receiver: ObjectId, method: &str, args: Vec<Value>) -> Result<Value, EvalError> {
        let object = self.object(receiver);
        let (class, module) = (object.class, object.module);
        let imp = class.method(method).ok_or_else(|| EvalError::UnknownMethod {
            class: class.name.clone(),
            method: method.to_string(),
        })?;
        self.run_method(receiver, module, imp, args)
    }

    fn run_method(
        &mut self,
        receiver: ObjectId,
        module: &'m str,
        imp: &'m MethodImpl,
        args: Vec<Value>,
    ) -> Result<Value, EvalError> {
        self.tick()?;
        if imp.sig.params.len() != args.len() {
            return Err(EvalError::WrongArgumentCount {
                what: format!("method {}", imp.name()),
                expected: imp.sig.params.len(),
                found: args.len(),
            });
        }
        let mut frame = Frame::new(receiver, module, Some(imp));
        for (p, v) in imp.sig.params.iter().zip(args) {
            frame.scopes[0].insert(p.name.clone(), v);
        }
        Ok(self.exec_block(&mut frame, &imp.body)?.unwrap_or(Value::Unit))
    }

    /// Runs `block`; `Some` carries a returned value.
    fn exec_block(&mut self, frame: &mut Frame<'m>, block: &'m Block) -> Result<Option<Value>, EvalError> {
        frame.scopes.push(BTreeMap::new());
        let mut result = Ok(None);
        for stmt in &block.stmts {
            match self.exec(frame, stmt) {
                Ok(None) => {}
                done => {
                    result = done;
                    break;
                }
            }
        }
        frame.scopes.pop();
        result
    }

    fn exec(&mut self, frame: &mut Frame<'m>, stmt: &'m Stmt) -> Result<Option<Value>, EvalError> {
        self.tick()?;
        match &stmt.kind {
            StmtKind::Skip => {}
            StmtKind::Return(e) => return self.eval(frame, e).map(Some),
            StmtKind::VarDecl { name, init, .. } => {
                let value = match init {
                    Some(e) => self.eval(frame, e)?,
                    None => Value::Null,
                };
                if let Some(scope) = frame.scopes.last_mut() {
                    scope.insert(name.clone(), value);
                }
            }
            StmtKind::Assign { target, value } => {
                let value = self.eval(frame, value)?;
                match target {
                    LValue::Var(name) => match frame.lookup_mut(name) {
                        Some(slot) => *slot = value,
                        None => self.set_field(frame.this, name, value).map_err(|_| EvalError::UnboundVariable(name.clone()))?,
                    },
                    LValue::Field(name) => self.set_field(frame.this, name, value)?,
                }
            }
            StmtKind::If { cond, then, otherwise } => {
                if self.eval_bool(frame, cond)? {
                    return self.exec_block(frame, then);
                } else if let Some(otherwise) = otherwise {
                    return self.exec_block(frame, otherwise);
                }
            }
            StmtKind::While { cond, body } => {
                while self.eval_bool(frame, cond)? {
                    if let Some(v) = self.exec_block(frame, body)? {
                        return Ok(Some(v));
                    }
                    self.tick()?;
                }
            }
            StmtKind::Expr(e) => {
                self.eval(frame, e)?;
            }
        }
        Ok(None)
    }

    fn eval_bool(&mut self, frame: &mut Frame<'m>, e: &'m Expr) -> Result<bool, EvalError> {
        match self.eval(frame, e)? {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch("Bool", &other)),
        }
    }

    fn eval_int(&mut self, frame: &mut Frame<'m>, e: &'m Expr) -> Result<i64, EvalError> {
        match self.eval(frame, e)? {
            Value::Int(i) => Ok(i),
            other => Err(mismatch("Int", &other)),
        }
    }

    fn eval_args(&mut self, frame: &mut Frame<'m>, args: &'m [Expr]) -> Result<Vec<Value>, EvalError> {
        args.iter().map(|a| self.eval(frame, a)).collect()
    }

    fn eval(&mut self, frame: &mut Frame<'m>, expr: &'m Expr) -> Result<Value, EvalError> {
        match &expr.kind {
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Int(i) => Ok(Value::Int(*i)),
            ExprKind::Str(s) => Ok(Value::Str(s.clone())),
            ExprKind::Null => Ok(Value::Null),
            ExprKind::This => Ok(Value::Object(frame.this)),
            ExprKind::Var(name) => match frame.lookup(name) {
                Some(v) => Ok(v.clone()),
                None => self
                    .field(frame.this, name)
                    .cloned()
                    .ok_or_else(|| EvalError::UnboundVariable(name.clone())),
            },
            ExprKind::Field(name) => self.field(frame.this, name).cloned().ok_or_else(|| EvalError::UnknownField {
                class: self.object(frame.this).class.name.clone(),
                field: name.clone(),
            }),
            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Not => Ok(Value::Bool(!self.eval_bool(frame, operand)?)),
                UnaryOp::Neg => self
                    .eval_int(frame, operand)?
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or(EvalError::Overflow),
            },
            ExprKind::Binary { op, lhs, rhs } => self.eval_binary(frame, *op, lhs, rhs),
            ExprKind::Call {
                target,
                method,
                args,
                asynchronous,
            } => {
                let receiver = match self.eval(frame, target)? {
                    Value::Object(id) => id,
                    Value::Null => return Err(EvalError::NullDereference(method.clone())),
                    other => return Err(mismatch("object", &other)),
                };
                let args = self.eval_args(frame, args)?;
                let result = self.invoke(receiver, method, args)?;
                if *asynchronous {
                    Ok(Value::Future(Box::new(result)))
                } else {
                    Ok(result)
                }
            }
            ExprKind::Get(future) => match self.eval(frame, future)? {
                Value::Future(v) => Ok(*v),
                other => Err(mismatch("future", &other)),
            },
            ExprKind::New { class, args, .. } => {
                let args = self.eval_args(frame, args)?;
                let (module, decl) = self.resolve_class(Some(frame.module), class)?;
                self.create(module, decl, args).map(Value::Object)
            }
            ExprKind::Original(args) => {
                let args = self.eval_args(frame, args)?;
                let current = frame.method.ok_or_else(|| EvalError::NoOriginal("an initializer".to_string()))?;
                let predecessor = current
                    .original
                    .as_deref()
                    .ok_or_else(|| EvalError::NoOriginal(current.name().to_string()))?;
                self.run_method(frame.this, frame.module, predecessor, args)
            }
        }
    }

    fn eval_binary(&mut self, frame: &mut Frame<'m>, op: BinaryOp, lhs: &'m Expr, rhs: &'m Expr) -> Result<Value, EvalError> {
        match op {
            BinaryOp::And => Ok(Value::Bool(self.eval_bool(frame, lhs)? && self.eval_bool(frame, rhs)?)),
            BinaryOp::Or => Ok(Value::Bool(self.eval_bool(frame, lhs)? || self.eval_bool(frame, rhs)?)),
            BinaryOp::Eq | BinaryOp::Ne => {
                let equal = self.eval(frame, lhs)? == self.eval(frame, rhs)?;
                Ok(Value::Bool(equal == (op == BinaryOp::Eq)))
            }
            BinaryOp::Add => match (self.eval(frame, lhs)?, self.eval(frame, rhs)?) {
                (Value::Int(a), Value::Int(b)) => a.checked_add(b).map(Value::Int).ok_or(EvalError::Overflow),
                (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
                (Value::Int(_), other) | (other, _) => Err(mismatch("Int or String", &other)),
            },
            _ => {
                let a = self.eval_int(frame, lhs)?;
                let b = self.eval_int(frame, rhs)?;
                let result = match op {
                    BinaryOp::Lt => return Ok(Value::Bool(a < b)),
                    BinaryOp::Le => return Ok(Value::Bool(a <= b)),
                    BinaryOp::Gt => return Ok(Value::Bool(a > b)),
                    BinaryOp::Ge => return Ok(Value::Bool(a >= b)),
                    BinaryOp::Sub => a.checked_sub(b),
                    BinaryOp::Mul => a.checked_mul(b),
                    BinaryOp::Div if b == 0 => return Err(EvalError::DivisionByZero),
                    BinaryOp::Mod if b == 0 => return Err(EvalError::DivisionByZero),
                    BinaryOp::Div => a.checked_div(b),
                    BinaryOp::Mod => a.checked_rem(b),
                    BinaryOp::And | BinaryOp::Or | BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Add => None,
                };
                result.map(Value::Int).ok_or(EvalError::Overflow)
            }
        }
    }
}

fn mismatch(expected: &'static str, found: &Value) -> EvalError {
    EvalError::TypeMismatch {
        expected,
        found: found.kind().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::{flatten, ProductConfig};
    use abs_grammar::parse_unit;

    fn model(src: &str) -> Model {
        Model::new(vec![parse_unit(None, src).unwrap()])
    }

    #[test]
    fn test_loops_and_fields() {
        let m = model(
            r#"module M;
            class Counter(Int step) {
                Int calls = 0;
                Int countTo(Int n) {
                    this.calls = this.calls + 1;
                    Int i = 0;
                    Int sum = 0;
                    while (i < n) {
                        i = i + step;
                        if (i % 2 == 0) { sum = sum + i; } else { skip; }
                    }
                    return sum;
                }
            }"#,
        );
        let mut interp = Interpreter::new(&m);
        let counter = interp.instantiate("Counter", vec![Value::Int(1)]).unwrap();
        assert_eq!(interp.call(counter, "countTo", vec![Value::Int(10)]), Ok(Value::Int(30)));
        assert_eq!(interp.field(counter, "calls"), Some(&Value::Int(1)));
        assert_eq!(interp.class_of(counter), Some("Counter"));
    }

    #[test]
    fn test_objects_futures_and_init() {
        let m = model(
            r#"module M;
            interface Cell { Int read(); }
            class CellImpl(Int start) implements Cell {
                Int value = start * 2;
                { this.value = this.value + 1; }
                Int read() { return value; }
            }
            class Main {
                Int run() {
                    Cell c = new local CellImpl(4);
                    Fut<Int> f = c!read();
                    String s = "a" + "b";
                    if (s == "ab" && c != null) { return f.get; }
                    return 0;
                }
            }"#,
        );
        let mut interp = Interpreter::new(&m);
        let main = interp.instantiate("M.Main", vec![]).unwrap();
        assert_eq!(interp.call(main, "run", vec![]), Ok(Value::Int(9)));
    }

    #[test]
    fn test_original_runs_predecessor() {
        let m = model(
            r#"module Account;
            class AccountImpl(Int initial) {
                Int total = initial;
                Int deposit(Int amount) { this.total = this.total + amount; return this.total; }
            }
            delta DFee {
                modifies class AccountImpl {
                    modifies Int deposit(Int amount) { return original(amount - 1); }
                }
            }"#,
        );
        let flat = flatten(&m, &ProductConfig::new(None, vec!["DFee".into()])).unwrap();
        let mut interp = Interpreter::new(&flat.model);
        let account = interp.instantiate("AccountImpl", vec![Value::Int(100)]).unwrap();
        assert_eq!(interp.call(account, "deposit", vec![Value::Int(10)]), Ok(Value::Int(109)));
    }

    #[test]
    fn test_runtime_errors() {
        let m = model(
            r#"module M;
            interface I { Unit m(); }
            class C {
                I nothing = null;
                Int div(Int x) { return 10 / x; }
                Unit spin() { while (true) { skip; } }
                Unit deref() { this.nothing.m(); }
                Int orig() { return original(); }
            }"#,
        );
        let mut interp = Interpreter::with_fuel(&m, 1_000);
        let c = interp.instantiate("C", vec![]).unwrap();
        assert_eq!(interp.call(c, "div", vec![Value::Int(0)]), Err(EvalError::DivisionByZero));
        assert_eq!(interp.call(c, "deref", vec![]), Err(EvalError::NullDereference("m".into())));
        assert_eq!(interp.call(c, "orig", vec![]), Err(EvalError::NoOriginal("orig".into())));
        assert!(matches!(interp.call(c, "missing", vec![]), Err(EvalError::UnknownMethod { .. })));
        assert_eq!(interp.call(c, "spin", vec![]), Err(EvalError::OutOfFuel(1_000)));
        assert_eq!(interp.steps(), 1_000);
    }
}
