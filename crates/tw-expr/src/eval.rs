//! Tree-walking evaluator for embedded expressions.
//!
//! The evaluator can read and write root attributes and entity
//! properties, do arithmetic and text operations, and call a fixed
//! allowlist of functions and methods. Nothing else is reachable.

use std::cmp::Ordering;

use tracing::debug;
use tw_core::{EntityId, Value, WorldState};

use crate::ast::{BinaryOp, Expr, Place, UnaryOp};
use crate::error::{EvalError, EvalResult};
use crate::lexer;
use crate::parser;

/// Global functions callable from expressions.
pub const ALLOWED_FUNCTIONS: &[&str] = &[
    "abs",
    "capitalize",
    "entity",
    "float",
    "int",
    "len",
    "lower",
    "max",
    "min",
    "str",
    "upper",
];

/// Default limit on the length of text produced by `+` and `*`.
pub const DEFAULT_MAX_TEXT_LEN: usize = 10_000;

/// Default limit on the number of elements in a list built by `+`.
pub const DEFAULT_MAX_LIST_LEN: usize = 10_000;

/// Evaluates expression source against a world state.
#[derive(Debug, Clone)]
pub struct Evaluator {
    max_text_len: usize,
    max_list_len: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self {
            max_text_len: DEFAULT_MAX_TEXT_LEN,
            max_list_len: DEFAULT_MAX_LIST_LEN,
        }
    }
}

impl Evaluator {
    /// Create an evaluator with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum length (in characters) of text built by `+` and `*`.
    pub fn with_max_text_len(mut self, max_text_len: usize) -> Self {
        self.max_text_len = max_text_len;
        self
    }

    /// Set the maximum number of elements in a list built by `+`.
    pub fn with_max_list_len(mut self, max_list_len: usize) -> Self {
        self.max_list_len = max_list_len;
        self
    }

    /// Evaluate `source`, recovering any failure into a diagnostic value.
    ///
    /// Never fails: on error the result is the text
    /// `Invalid expression '<source>'`.
    pub fn evaluate(&self, world: &mut WorldState, source: &str) -> Value {
        match self.try_evaluate(world, source) {
            Ok(value) => value,
            Err(error) => {
                debug!(expression = source, %error, "expression evaluation failed");
                Value::Text(invalid_expression(source))
            }
        }
    }

    /// Evaluate `source`, returning the typed error on failure.
    pub fn try_evaluate(&self, world: &mut WorldState, source: &str) -> EvalResult<Value> {
        let expr = compile(source)?;
        self.eval(world, &expr)
    }

    /// Evaluate an already-parsed expression.
    pub fn eval(&self, world: &mut WorldState, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Nil => Ok(Value::Nil),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Float(n) => Ok(Value::Float(*n)),
            Expr::Str(s) => Ok(Value::Text(s.clone())),
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval(world, item))
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::List),
            Expr::Name(name) => lookup(world, name),
            Expr::Field { target, field } => {
                let target = self.eval(world, target)?;
                read_field(world, &target, field)
            }
            Expr::Index { target, index } => {
                let target = self.eval(world, target)?;
                let index = self.eval(world, index)?;
                read_index(&target, &index)
            }
            Expr::Call { function, args } => {
                let args = self.eval_args(world, args)?;
                self.call_function(world, function, args)
            }
            Expr::Method {
                target,
                method,
                args,
            } => {
                let target = self.eval(world, target)?;
                let args = self.eval_args(world, args)?;
                self.call_method(world, &target, method, args)
            }
            Expr::Unary { op, operand } => {
                let operand = self.eval(world, operand)?;
                unary(*op, operand)
            }
            Expr::Binary {
                op: BinaryOp::And,
                lhs,
                rhs,
            } => {
                let lhs = self.eval(world, lhs)?;
                if lhs.is_truthy() {
                    self.eval(world, rhs)
                } else {
                    Ok(lhs)
                }
            }
            Expr::Binary {
                op: BinaryOp::Or,
                lhs,
                rhs,
            } => {
                let lhs = self.eval(world, lhs)?;
                if lhs.is_truthy() {
                    Ok(lhs)
                } else {
                    self.eval(world, rhs)
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval(world, lhs)?;
                let rhs = self.eval(world, rhs)?;
                self.binary(*op, lhs, rhs)
            }
            Expr::Conditional {
                then_branch,
                condition,
                else_branch,
            } => {
                if self.eval(world, condition)?.is_truthy() {
                    self.eval(world, then_branch)
                } else {
                    self.eval(world, else_branch)
                }
            }
            Expr::Assign { place, value } => {
                let value = self.eval(world, value)?;
                assign(world, place, value)?;
                Ok(Value::Nil)
            }
        }
    }

    fn eval_args(&self, world: &mut WorldState, args: &[Expr]) -> EvalResult<Vec<Value>> {
        args.iter().map(|arg| self.eval(world, arg)).collect()
    }

    // -----------------------------------------------------------------------
    // Operators
    // -----------------------------------------------------------------------

    fn binary(&self, op: BinaryOp, lhs: Value, rhs: Value) -> EvalResult<Value> {
        match op {
            BinaryOp::Eq => Ok(Value::Bool(values_equal(&lhs, &rhs))),
            BinaryOp::Ne => Ok(Value::Bool(!values_equal(&lhs, &rhs))),
            BinaryOp::Lt => compare(op, &lhs, &rhs).map(|o| Value::Bool(o == Ordering::Less)),
            BinaryOp::Le => compare(op, &lhs, &rhs).map(|o| Value::Bool(o != Ordering::Greater)),
            BinaryOp::Gt => compare(op, &lhs, &rhs).map(|o| Value::Bool(o == Ordering::Greater)),
            BinaryOp::Ge => compare(op, &lhs, &rhs).map(|o| Value::Bool(o != Ordering::Less)),
            BinaryOp::Add => match (lhs, rhs) {
                (Value::Text(a), Value::Text(b)) => self.checked_text(a + &b),
                (Value::List(mut a), Value::List(b)) => {
                    let len = a.len().saturating_add(b.len());
                    if len > self.max_list_len {
                        return Err(EvalError::ListTooLong(self.max_list_len));
                    }
                    a.extend(b);
                    Ok(Value::List(a))
                }
                (lhs, rhs) => arithmetic(op, lhs, rhs),
            },
            BinaryOp::Mul => match (lhs, rhs) {
                (Value::Text(s), Value::Int(n)) | (Value::Int(n), Value::Text(s)) => {
                    let count = usize::try_from(n).map_err(|_| {
                        EvalError::TypeMismatch("cannot repeat text a negative number of times".into())
                    })?;
                    let len = s.chars().count().saturating_mul(count);
                    if len > self.max_text_len {
                        return Err(EvalError::TooLarge(self.max_text_len));
                    }
                    Ok(Value::Text(s.repeat(count)))
                }
                (lhs, rhs) => arithmetic(op, lhs, rhs),
            },
            BinaryOp::Sub | BinaryOp::Div | BinaryOp::Rem => arithmetic(op, lhs, rhs),
            // Reached only for pre-evaluated operands; `eval` short-circuits.
            BinaryOp::And => Ok(if lhs.is_truthy() { rhs } else { lhs }),
            BinaryOp::Or => Ok(if lhs.is_truthy() { lhs } else { rhs }),
        }
    }

    fn checked_text(&self, text: String) -> EvalResult<Value> {
        let len = text.chars().count();
        if len > self.max_text_len {
            return Err(EvalError::TooLarge(self.max_text_len));
        }
        Ok(Value::Text(text))
    }

    /// Render `value` as text, giving up once it cannot fit the text limit.
    fn describe_bounded(&self, world: &WorldState, value: &Value) -> EvalResult<String> {
        world
            .describe_value_within(value, self.max_text_bytes())
            .ok_or(EvalError::TooLarge(self.max_text_len))
    }

    /// Byte length past which text is certainly over the character limit.
    fn max_text_bytes(&self) -> usize {
        self.max_text_len.saturating_mul(4)
    }

    // -----------------------------------------------------------------------
    // Allowlisted calls
    // -----------------------------------------------------------------------

    fn call_function(&self, world: &WorldState, name: &str, args: Vec<Value>) -> EvalResult<Value> {
        match name {
            "len" => {
                let [value] = exact_args::<1>(name, args)?;
                length(&value)
            }
            "str" => {
                let [value] = exact_args::<1>(name, args)?;
                let text = self.describe_bounded(world, &value)?;
                self.checked_text(text)
            }
            "int" => {
                let [value] = exact_args::<1>(name, args)?;
                to_int(value)
            }
            "float" => {
                let [value] = exact_args::<1>(name, args)?;
                to_float(value)
            }
            "upper" | "lower" | "capitalize" => {
                let [value] = exact_args::<1>(name, args)?;
                let text = expect_text(name, &value)?;
                Ok(Value::Text(transform_text(name, text)))
            }
            "abs" => {
                let [value] = exact_args::<1>(name, args)?;
                match value {
                    Value::Int(n) => n.checked_abs().map(Value::Int).ok_or(EvalError::Overflow),
                    Value::Float(n) => Ok(Value::Float(n.abs())),
                    other => Err(EvalError::TypeMismatch(format!(
                        "abs expects a number, got {}",
                        other.type_name()
                    ))),
                }
            }
            "min" | "max" => {
                let values = match <[Value; 1]>::try_from(args) {
                    Ok([Value::List(items)]) => items,
                    Ok([single]) => vec![single],
                    Err(args) => args,
                };
                let mut iter = values.into_iter();
                let first = iter.next().ok_or_else(|| EvalError::WrongArity {
                    name: name.to_string(),
                    expected: "at least 1",
                    found: 0,
                })?;
                iter.try_fold(first, |best, candidate| {
                    let ordering = compare_values(&candidate, &best).ok_or_else(|| {
                        EvalError::TypeMismatch(format!(
                            "{name} cannot compare {} with {}",
                            candidate.type_name(),
                            best.type_name()
                        ))
                    })?;
                    let better = if name == "min" {
                        ordering == Ordering::Less
                    } else {
                        ordering == Ordering::Greater
                    };
                    Ok(if better { candidate } else { best })
                })
            }
            "entity" => {
                let [value] = exact_args::<1>(name, args)?;
                let entity_name = expect_text(name, &value)?;
                world
                    .find_id_by_name(entity_name)
                    .map(Value::Ref)
                    .ok_or_else(|| EvalError::EntityNotFound(entity_name.to_string()))
            }
            other => Err(EvalError::DisallowedCall(format!("{other}()"))),
        }
    }

    fn call_method(
        &self,
        world: &WorldState,
        target: &Value,
        method: &str,
        args: Vec<Value>,
    ) -> EvalResult<Value> {
        match (target, method) {
            (Value::Ref(id), "name") => {
                exact_args::<0>(method, args)?;
                entity_field(world, *id, "name")
            }
            (Value::Ref(id), "has") => {
                let [key] = exact_args::<1>(method, args)?;
                let key = expect_text(method, &key)?;
                Ok(Value::Bool(world.property(*id, key).is_some()))
            }
            (Value::Ref(id), "get") => {
                let (key, default) = match <[Value; 1]>::try_from(args) {
                    Ok([key]) => (key, Value::Nil),
                    Err(args) => {
                        let [key, default] = exact_args::<2>(method, args)?;
                        (key, default)
                    }
                };
                let key = expect_text(method, &key)?;
                Ok(world.property(*id, key).cloned().unwrap_or(default))
            }
            (Value::Text(s), "upper" | "lower" | "capitalize") => {
                exact_args::<0>(method, args)?;
                Ok(Value::Text(transform_text(method, s)))
            }
            (Value::Text(_) | Value::List(_) | Value::Map(_), "len") => {
                exact_args::<0>(method, args)?;
                length(target)
            }
            (Value::Text(s), "contains") => {
                let [needle] = exact_args::<1>(method, args)?;
                let needle = expect_text(method, &needle)?;
                Ok(Value::Bool(s.contains(needle)))
            }
            (Value::List(items), "contains") => {
                let [needle] = exact_args::<1>(method, args)?;
                Ok(Value::Bool(items.iter().any(|v| values_equal(v, &needle))))
            }
            (Value::List(items), "join") => {
                let [separator] = exact_args::<1>(method, args)?;
                let separator = expect_text(method, &separator)?;
                let mut joined = String::new();
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        joined.push_str(separator);
                    }
                    joined.push_str(&self.describe_bounded(world, item)?);
                    if joined.len() > self.max_text_bytes() {
                        return Err(EvalError::TooLarge(self.max_text_len));
                    }
                }
                self.checked_text(joined)
            }
            (Value::Map(map), "has") => {
                let [key] = exact_args::<1>(method, args)?;
                let key = expect_text(method, &key)?;
                Ok(Value::Bool(map.contains_key(key)))
            }
            (other, method) => Err(EvalError::DisallowedCall(format!(
                "{}.{method}()",
                other.type_name()
            ))),
        }
    }
}

/// The diagnostic text substituted for a failed expression.
pub fn invalid_expression(source: &str) -> String {
    format!("Invalid expression '{source}'")
}

/// Lex and parse expression source into an AST.
///
/// Oversized or overly nested sources fail with [`EvalError::Syntax`]; see
/// [`parser::MAX_EXPRESSION_TOKENS`] and [`parser::MAX_NESTING_DEPTH`].
pub fn compile(source: &str) -> EvalResult<Expr> {
    let (tokens, lex_errors) = lexer::lex(source);
    if !lex_errors.is_empty() {
        let messages: Vec<String> = lex_errors.into_iter().map(|e| e.message).collect();
        return Err(EvalError::Syntax(messages.join("; ")));
    }
    parser::parse(&tokens).map_err(|errors| {
        let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
        EvalError::Syntax(messages.join("; "))
    })
}

// ---------------------------------------------------------------------------
// Names, fields, and assignment
// ---------------------------------------------------------------------------

/// Resolve a bare identifier: a root attribute first, then an entity name.
///
/// Underscores in the identifier also match spaces in entity names, so
/// `brass_lamp` finds the entity "brass lamp".
fn lookup(world: &WorldState, name: &str) -> EvalResult<Value> {
    if let Some(value) = world.attribute(name) {
        return Ok(value.clone());
    }
    resolve_entity(world, name)
        .map(Value::Ref)
        .ok_or_else(|| EvalError::UnknownIdentifier(name.to_string()))
}

fn resolve_entity(world: &WorldState, name: &str) -> Option<EntityId> {
    world
        .find_id_by_name(name)
        .or_else(|| world.find_id_by_name(&name.replace('_', " ")))
}

fn read_field(world: &WorldState, target: &Value, field: &str) -> EvalResult<Value> {
    match target {
        Value::Ref(id) => match world.property(*id, field) {
            Some(value) => Ok(value.clone()),
            None => entity_field(world, *id, field),
        },
        Value::Map(map) => map.get(field).cloned().ok_or_else(|| EvalError::UnknownField {
            type_name: "map",
            field: field.to_string(),
        }),
        other => Err(EvalError::UnknownField {
            type_name: other.type_name(),
            field: field.to_string(),
        }),
    }
}

/// Built-in entity fields, used when no property of that name exists.
fn entity_field(world: &WorldState, id: EntityId, field: &str) -> EvalResult<Value> {
    let entity = world
        .entity(id)
        .ok_or_else(|| EvalError::EntityNotFound(format!("#{id}")))?;
    match field {
        "name" => Ok(Value::Text(entity.name.clone())),
        "kind" => Ok(Value::Text(entity.kind.to_string())),
        "id" => Ok(Value::Text(entity.id.0.to_string())),
        _ => Err(EvalError::UnknownField {
            type_name: "entity",
            field: field.to_string(),
        }),
    }
}

fn assign(world: &mut WorldState, place: &Place, value: Value) -> EvalResult<()> {
    match place {
        Place::Attribute(name) => {
            world.set_attribute(name.clone(), value);
            Ok(())
        }
        Place::Property { entity, key } => {
            let id = match lookup(world, entity)? {
                Value::Ref(id) => id,
                other => {
                    return Err(EvalError::TypeMismatch(format!(
                        "cannot set property `{key}` on {}",
                        other.type_name()
                    )));
                }
            };
            world
                .set_property(id, key.clone(), value)
                .map(|_| ())
                .map_err(|_| EvalError::EntityNotFound(format!("#{id}")))
        }
    }
}

fn read_index(target: &Value, index: &Value) -> EvalResult<Value> {
    match (target, index) {
        (Value::List(items), Value::Int(i)) => {
            let pos = normalize_index(*i, items.len())?;
            Ok(items[pos].clone())
        }
        (Value::Text(s), Value::Int(i)) => {
            let chars: Vec<char> = s.chars().collect();
            let pos = normalize_index(*i, chars.len())?;
            Ok(Value::Text(chars[pos].to_string()))
        }
        (Value::Map(map), Value::Text(key)) => map.get(key).cloned().ok_or_else(|| {
            EvalError::UnknownField {
                type_name: "map",
                field: key.clone(),
            }
        }),
        (target, index) => Err(EvalError::TypeMismatch(format!(
            "cannot index {} with {}",
            target.type_name(),
            index.type_name()
        ))),
    }
}

/// Negative indices count from the end.
fn normalize_index(index: i64, len: usize) -> EvalResult<usize> {
    let out_of_range = || EvalError::IndexOutOfRange { index, len };
    let len_i = i64::try_from(len).map_err(|_| out_of_range())?;
    let pos = if index < 0 { len_i + index } else { index };
    if (0..len_i).contains(&pos) {
        usize::try_from(pos).map_err(|_| out_of_range())
    } else {
        Err(out_of_range())
    }
}

// ---------------------------------------------------------------------------
// Arithmetic and comparison helpers
// ---------------------------------------------------------------------------

fn unary(op: UnaryOp, operand: Value) -> EvalResult<Value> {
    match (op, operand) {
        (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
        (UnaryOp::Neg, Value::Int(n)) => n.checked_neg().map(Value::Int).ok_or(EvalError::Overflow),
        (UnaryOp::Neg, Value::Float(n)) => Ok(Value::Float(-n)),
        (UnaryOp::Neg, other) => Err(EvalError::TypeMismatch(format!(
            "cannot negate {}",
            other.type_name()
        ))),
    }
}

fn arithmetic(op: BinaryOp, lhs: Value, rhs: Value) -> EvalResult<Value> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => {
            let result = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Div if b == 0 => return Err(EvalError::DivisionByZero),
                BinaryOp::Div => a.checked_div(b),
                BinaryOp::Rem if b == 0 => return Err(EvalError::DivisionByZero),
                BinaryOp::Rem => a.checked_rem_euclid(b),
                _ => None,
            };
            result.map(Value::Int).ok_or(EvalError::Overflow)
        }
        (Value::Int(a), Value::Float(b)) => float_arithmetic(op, a as f64, b),
        (Value::Float(a), Value::Int(b)) => float_arithmetic(op, a, b as f64),
        (Value::Float(a), Value::Float(b)) => float_arithmetic(op, a, b),
        (lhs, rhs) => Err(EvalError::TypeMismatch(format!(
            "cannot apply `{}` to {} and {}",
            op.symbol(),
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}

fn float_arithmetic(op: BinaryOp, a: f64, b: f64) -> EvalResult<Value> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div | BinaryOp::Rem if b == 0.0 => return Err(EvalError::DivisionByZero),
        BinaryOp::Div => a / b,
        BinaryOp::Rem => a.rem_euclid(b),
        _ => {
            return Err(EvalError::TypeMismatch(format!(
                "`{}` is not arithmetic",
                op.symbol()
            )));
        }
    };
    if result.is_finite() {
        Ok(Value::Float(result))
    } else {
        Err(EvalError::Overflow)
    }
}

/// Equality with numeric coercion between ints and floats.
fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => (*a as f64) == *b,
        _ => lhs == rhs,
    }
}

/// Ordering for numbers (mixed int/float) and text; `None` otherwise.
fn compare_values(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
        (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn compare(op: BinaryOp, lhs: &Value, rhs: &Value) -> EvalResult<Ordering> {
    compare_values(lhs, rhs).ok_or_else(|| {
        EvalError::TypeMismatch(format!(
            "cannot compare {} {} {}",
            lhs.type_name(),
            op.symbol(),
            rhs.type_name()
        ))
    })
}

fn length(value: &Value) -> EvalResult<Value> {
    let len = match value {
        Value::Text(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Map(map) => map.len(),
        other => {
            return Err(EvalError::TypeMismatch(format!(
                "{} has no length",
                other.type_name()
            )));
        }
    };
    i64::try_from(len).map(Value::Int).map_err(|_| EvalError::Overflow)
}

fn to_int(value: Value) -> EvalResult<Value> {
    match value {
        Value::Int(n) => Ok(Value::Int(n)),
        Value::Bool(b) => Ok(Value::Int(i64::from(b))),
        Value::Float(n) if n.is_finite() && n.abs() < i64::MAX as f64 => Ok(Value::Int(n.trunc() as i64)),
        Value::Float(_) => Err(EvalError::Overflow),
        Value::Text(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| EvalError::TypeMismatch(format!("cannot convert {s:?} to int"))),
        other => Err(EvalError::TypeMismatch(format!(
            "cannot convert {} to int",
            other.type_name()
        ))),
    }
}

fn to_float(value: Value) -> EvalResult<Value> {
    match value {
        Value::Int(n) => Ok(Value::Float(n as f64)),
        Value::Float(n) => Ok(Value::Float(n)),
        Value::Text(s) => match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Value::Float(n)),
            _ => Err(EvalError::TypeMismatch(format!("cannot convert {s:?} to float"))),
        },
        other => Err(EvalError::TypeMismatch(format!(
            "cannot convert {} to float",
            other.type_name()
        ))),
    }
}

fn transform_text(name: &str, text: &str) -> String {
    match name {
        "upper" => text.to_uppercase(),
        "lower" => text.to_lowercase(),
        _ => {
            let mut chars = text.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

fn expect_text<'v>(name: &str, value: &'v Value) -> EvalResult<&'v str> {
    value.as_text().ok_or_else(|| {
        EvalError::TypeMismatch(format!("{name} expects text, got {}", value.type_name()))
    })
}

fn exact_args<const N: usize>(name: &str, args: Vec<Value>) -> EvalResult<[Value; N]> {
    let found = args.len();
    <[Value; N]>::try_from(args).map_err(|_| EvalError::WrongArity {
        name: name.to_string(),
        expected: ["0", "1", "2", "3"].get(N).copied().unwrap_or("several"),
        found,
    })
}
