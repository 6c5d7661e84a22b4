//! Test-only reference unpickler.
//!
//! Decodes the compiler's output far enough to verify round-trip laws
//! without a host interpreter. Globals decode symbolically; `REDUCE`
//! applies a small set of pure `operator` and `builtins` functions (the
//! ones the compiler's desugarings rely on) and keeps anything else as an
//! uninterpreted constructed object.
//!
//! The machine works on shared nodes: memo slots alias the objects on the
//! stack, so `BUILD` and `SETITEM` mutations are visible through every
//! binding, as they are in a real unpickler. The result is frozen into a
//! plain [`Value`] tree for assertions.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A decoded pickle value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i128),
    Float(f64),
    /// Unicode payload bytes, kept raw so surrogate encodings survive.
    Str(Vec<u8>),
    Bytes(Vec<u8>),
    Tuple(Vec<Value>),
    List(Vec<Value>),
    Dict(Vec<(Value, Value)>),
    Set(Vec<Value>),
    /// A symbolic `module.name` global.
    Global(String, String),
    /// A constructed object: callee, arguments, applied attributes.
    Object {
        ctor: Box<Value>,
        args: Vec<Value>,
        attrs: Vec<(Value, Value)>,
    },
}

impl Value {
    /// Convenience constructor for string values.
    pub fn str(s: &str) -> Self {
        Self::Str(s.as_bytes().to_vec())
    }

    /// Looks up an applied attribute on a constructed object.
    pub fn attr(&self, name: &str) -> Option<&Value> {
        let Self::Object { attrs, .. } = self else {
            return None;
        };
        attrs
            .iter()
            .rev()
            .find(|(k, _)| *k == Value::str(name))
            .map(|(_, v)| v)
    }
}

/// Decodes a protocol 4 stream produced by the compiler.
pub fn unpickle(stream: &[u8]) -> Result<Value, String> {
    let result = Machine::new(stream).run()?;
    Ok(freeze(&result))
}

/// A shared, mutable decoded object.
type Obj = Rc<RefCell<Node>>;

/// The in-machine representation; children are shared.
#[derive(Clone, Debug)]
enum Node {
    None,
    Bool(bool),
    Int(i128),
    Float(f64),
    Str(Vec<u8>),
    Bytes(Vec<u8>),
    Tuple(Vec<Obj>),
    List(Vec<Obj>),
    Dict(Vec<(Obj, Obj)>),
    Set(Vec<Obj>),
    Global(String, String),
    Object {
        ctor: Obj,
        args: Vec<Obj>,
        attrs: Vec<(Obj, Obj)>,
    },
}

impl Node {
    fn truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Float(n) => *n != 0.0,
            Self::Str(b) | Self::Bytes(b) => !b.is_empty(),
            Self::Tuple(v) | Self::List(v) | Self::Set(v) => !v.is_empty(),
            Self::Dict(v) => !v.is_empty(),
            Self::Global(..) | Self::Object { .. } => true,
        }
    }
}

fn obj(node: Node) -> Obj {
    Rc::new(RefCell::new(node))
}

/// Deep-copies a node tree into an owned [`Value`].
fn freeze(o: &Obj) -> Value {
    match &*o.borrow() {
        Node::None => Value::None,
        Node::Bool(b) => Value::Bool(*b),
        Node::Int(n) => Value::Int(*n),
        Node::Float(n) => Value::Float(*n),
        Node::Str(b) => Value::Str(b.clone()),
        Node::Bytes(b) => Value::Bytes(b.clone()),
        Node::Tuple(v) => Value::Tuple(v.iter().map(freeze).collect()),
        Node::List(v) => Value::List(v.iter().map(freeze).collect()),
        Node::Set(v) => Value::Set(v.iter().map(freeze).collect()),
        Node::Dict(pairs) => Value::Dict(
            pairs
                .iter()
                .map(|(k, v)| (freeze(k), freeze(v)))
                .collect(),
        ),
        Node::Global(module, name) => Value::Global(module.clone(), name.clone()),
        Node::Object { ctor, args, attrs } => Value::Object {
            ctor: Box::new(freeze(ctor)),
            args: args.iter().map(freeze).collect(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (freeze(k), freeze(v)))
                .collect(),
        },
    }
}

/// Structural equality, ignoring sharing.
fn equal(a: &Obj, b: &Obj) -> bool {
    freeze(a) == freeze(b)
}

fn as_int(o: &Obj) -> Option<i128> {
    match &*o.borrow() {
        Node::Int(n) => Some(*n),
        _ => None,
    }
}

struct Machine<'a> {
    stream: &'a [u8],
    position: usize,
    stack: Vec<Obj>,
    marks: Vec<usize>,
    memo: HashMap<u32, Obj>,
}

impl<'a> Machine<'a> {
    fn new(stream: &'a [u8]) -> Self {
        Self {
            stream,
            position: 0,
            stack: Vec::new(),
            marks: Vec::new(),
            memo: HashMap::new(),
        }
    }

    fn run(mut self) -> Result<Obj, String> {
        loop {
            let opcode = self.take_u8()?;
            match opcode {
                0x80 => {
                    let version = self.take_u8()?;
                    if version != 4 {
                        return Err(format!("unexpected protocol version {version}"));
                    }
                }
                b'.' => return self.pop(),
                b'(' => self.marks.push(self.stack.len()),
                b'1' => {
                    let mark = self.pop_mark()?;
                    self.stack.truncate(mark);
                }
                b'N' => self.stack.push(obj(Node::None)),
                0x88 => self.stack.push(obj(Node::Bool(true))),
                0x89 => self.stack.push(obj(Node::Bool(false))),
                b'K' => {
                    let n = self.take_u8()?;
                    self.stack.push(obj(Node::Int(i128::from(n))));
                }
                b'M' => {
                    let b = self.take_bytes(2)?;
                    let n = u16::from_le_bytes([b[0], b[1]]);
                    self.stack.push(obj(Node::Int(i128::from(n))));
                }
                b'J' => {
                    let b = self.take_bytes(4)?;
                    let n = i32::from_le_bytes([b[0], b[1], b[2], b[3]]);
                    self.stack.push(obj(Node::Int(i128::from(n))));
                }
                b'I' | b'L' => {
                    let line = self.take_line()?;
                    let n: i128 = line
                        .trim_end_matches('L')
                        .parse()
                        .map_err(|e| format!("bad int text: {e}"))?;
                    self.stack.push(obj(Node::Int(n)));
                }
                b'F' => {
                    let line = self.take_line()?;
                    let n: f64 = line.parse().map_err(|e| format!("bad float text: {e}"))?;
                    self.stack.push(obj(Node::Float(n)));
                }
                0x8C => {
                    let len = usize::from(self.take_u8()?);
                    let bytes = self.take_bytes(len)?.to_vec();
                    self.stack.push(obj(Node::Str(bytes)));
                }
                b'X' => {
                    let len = self.take_u32()? as usize;
                    let bytes = self.take_bytes(len)?.to_vec();
                    self.stack.push(obj(Node::Str(bytes)));
                }
                b'C' => {
                    let len = usize::from(self.take_u8()?);
                    let bytes = self.take_bytes(len)?.to_vec();
                    self.stack.push(obj(Node::Bytes(bytes)));
                }
                b'B' => {
                    let len = self.take_u32()? as usize;
                    let bytes = self.take_bytes(len)?.to_vec();
                    self.stack.push(obj(Node::Bytes(bytes)));
                }
                b')' => self.stack.push(obj(Node::Tuple(Vec::new()))),
                0x85 => {
                    let a = self.pop()?;
                    self.stack.push(obj(Node::Tuple(vec![a])));
                }
                0x86 => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    self.stack.push(obj(Node::Tuple(vec![a, b])));
                }
                0x87 => {
                    let c = self.pop()?;
                    let b = self.pop()?;
                    let a = self.pop()?;
                    self.stack.push(obj(Node::Tuple(vec![a, b, c])));
                }
                b't' => {
                    let items = self.pop_to_mark()?;
                    self.stack.push(obj(Node::Tuple(items)));
                }
                b'l' => {
                    let items = self.pop_to_mark()?;
                    self.stack.push(obj(Node::List(items)));
                }
                b'd' => {
                    let items = self.pop_to_mark()?;
                    if items.len() % 2 != 0 {
                        return Err("odd number of dict items".to_string());
                    }
                    let pairs = items
                        .chunks(2)
                        .map(|pair| (Rc::clone(&pair[0]), Rc::clone(&pair[1])))
                        .collect();
                    self.stack.push(obj(Node::Dict(pairs)));
                }
                b'}' => self.stack.push(obj(Node::Dict(Vec::new()))),
                0x8F => self.stack.push(obj(Node::Set(Vec::new()))),
                0x90 => {
                    let items = self.pop_to_mark()?;
                    let set = Rc::clone(self.top()?);
                    match &mut *set.borrow_mut() {
                        Node::Set(v) => v.extend(items),
                        _ => return Err("ADDITEMS without a set".to_string()),
                    }
                }
                b's' => {
                    let value = self.pop()?;
                    let key = self.pop()?;
                    let dict = Rc::clone(self.top()?);
                    match &mut *dict.borrow_mut() {
                        Node::Dict(pairs) => pairs.push((key, value)),
                        _ => return Err("SETITEM without a dict".to_string()),
                    }
                }
                b'R' => {
                    let args_obj = self.pop()?;
                    let args = match &*args_obj.borrow() {
                        Node::Tuple(args) => args.clone(),
                        other => return Err(format!("REDUCE args not a tuple: {other:?}")),
                    };
                    let callee = self.pop()?;
                    let value = apply(&callee, args)?;
                    self.stack.push(value);
                }
                b'b' => {
                    let state = self.pop()?;
                    let target = self.pop()?;
                    apply_build(&target, &state)?;
                    self.stack.push(target);
                }
                0x93 => {
                    let name = self.pop_str()?;
                    let module = self.pop_str()?;
                    self.stack.push(obj(Node::Global(module, name)));
                }
                b'c' => {
                    let module = self.take_line()?;
                    let name = self.take_line()?;
                    self.stack.push(obj(Node::Global(module, name)));
                }
                b'i' => {
                    let module = self.take_line()?;
                    let name = self.take_line()?;
                    let args = self.pop_to_mark()?;
                    self.stack.push(obj(Node::Object {
                        ctor: obj(Node::Global(module, name)),
                        args,
                        attrs: Vec::new(),
                    }));
                }
                b'q' => {
                    let slot = u32::from(self.take_u8()?);
                    let top = Rc::clone(self.top()?);
                    self.memo.insert(slot, top);
                }
                b'r' => {
                    let slot = self.take_u32()?;
                    let top = Rc::clone(self.top()?);
                    self.memo.insert(slot, top);
                }
                b'h' => {
                    let slot = u32::from(self.take_u8()?);
                    self.push_memo(slot)?;
                }
                b'j' => {
                    let slot = self.take_u32()?;
                    self.push_memo(slot)?;
                }
                other => return Err(format!("unhandled opcode {other:#04x}")),
            }
        }
    }

    fn push_memo(&mut self, slot: u32) -> Result<(), String> {
        let value = self
            .memo
            .get(&slot)
            .cloned()
            .ok_or_else(|| format!("fetch of unset memo slot {slot}"))?;
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<Obj, String> {
        self.stack.pop().ok_or_else(|| "stack underflow".to_string())
    }

    fn top(&self) -> Result<&Obj, String> {
        self.stack.last().ok_or_else(|| "stack underflow".to_string())
    }

    fn pop_str(&mut self) -> Result<String, String> {
        let top = self.pop()?;
        match &*top.borrow() {
            Node::Str(bytes) => String::from_utf8(bytes.clone())
                .map_err(|_| "global name not UTF-8".to_string()),
            other => Err(format!("expected string, got {other:?}")),
        }
    }

    fn pop_mark(&mut self) -> Result<usize, String> {
        self.marks.pop().ok_or_else(|| "no mark on stack".to_string())
    }

    fn pop_to_mark(&mut self) -> Result<Vec<Obj>, String> {
        let mark = self.pop_mark()?;
        Ok(self.stack.split_off(mark))
    }

    fn take_u8(&mut self) -> Result<u8, String> {
        let byte = *self
            .stream
            .get(self.position)
            .ok_or_else(|| "unexpected end of stream".to_string())?;
        self.position += 1;
        Ok(byte)
    }

    fn take_u32(&mut self) -> Result<u32, String> {
        let b = self.take_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn take_bytes(&mut self, len: usize) -> Result<&'a [u8], String> {
        let end = self.position + len;
        if end > self.stream.len() {
            return Err("unexpected end of stream".to_string());
        }
        let bytes = &self.stream[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    fn take_line(&mut self) -> Result<String, String> {
        let mut bytes = Vec::new();
        loop {
            let b = self.take_u8()?;
            if b == b'\n' {
                break;
            }
            bytes.push(b);
        }
        String::from_utf8(bytes).map_err(|_| "text operand not UTF-8".to_string())
    }
}

/// Applies `BUILD` state to an object, mutating it in place.
///
/// A `(state, slotstate)` pair sets attributes from the second element; a
/// plain dict sets attributes directly. In-place mutation means every
/// memo slot aliasing the object sees the update.
fn apply_build(target: &Obj, state: &Obj) -> Result<(), String> {
    let attrs: Vec<(Obj, Obj)> = match &*state.borrow() {
        Node::Tuple(pair) if pair.len() == 2 => match &*pair[1].borrow() {
            Node::Dict(attrs) => attrs.clone(),
            other => return Err(format!("BUILD slotstate not a dict: {other:?}")),
        },
        Node::Dict(attrs) => attrs.clone(),
        other => return Err(format!("BUILD state not a dict: {other:?}")),
    };
    let mut node = target.borrow_mut();
    match &mut *node {
        Node::Object {
            attrs: existing, ..
        } => existing.extend(attrs),
        other => {
            let prior = std::mem::replace(other, Node::None);
            *other = Node::Object {
                ctor: obj(prior),
                args: Vec::new(),
                attrs,
            };
        }
    }
    Ok(())
}

/// Applies a callee to arguments.
///
/// Known pure `operator`/`builtins` functions evaluate; everything else
/// stays symbolic as an `Object`.
fn apply(callee: &Obj, args: Vec<Obj>) -> Result<Obj, String> {
    let global = match &*callee.borrow() {
        Node::Global(module, name) => Some((module.clone(), name.clone())),
        _ => None,
    };
    let Some((module, name)) = global else {
        return Ok(opaque(callee, &args));
    };
    match (module.as_str(), name.as_str()) {
        ("operator", op) => apply_operator(op, callee, &args),
        ("builtins", func) => apply_builtin(func, callee, &args),
        _ => Ok(opaque(callee, &args)),
    }
}

fn opaque(callee: &Obj, args: &[Obj]) -> Obj {
    obj(Node::Object {
        ctor: Rc::clone(callee),
        args: args.to_vec(),
        attrs: Vec::new(),
    })
}

fn apply_operator(op: &str, callee: &Obj, args: &[Obj]) -> Result<Obj, String> {
    match (op, args) {
        ("truth", [a]) => Ok(obj(Node::Bool(a.borrow().truthy()))),
        ("not_", [a]) => Ok(obj(Node::Bool(!a.borrow().truthy()))),
        ("is_", [a, b]) | ("eq", [a, b]) => Ok(obj(Node::Bool(equal(a, b)))),
        ("is_not", [a, b]) | ("ne", [a, b]) => Ok(obj(Node::Bool(!equal(a, b)))),
        ("lt" | "le" | "gt" | "ge", [a, b]) => {
            let (Some(a), Some(b)) = (as_int(a), as_int(b)) else {
                return Ok(opaque(callee, args));
            };
            let result = match op {
                "lt" => a < b,
                "le" => a <= b,
                "gt" => a > b,
                _ => a >= b,
            };
            Ok(obj(Node::Bool(result)))
        }
        ("contains", [container, item]) => {
            let found = match &*container.borrow() {
                Node::Tuple(v) | Node::List(v) | Node::Set(v) => {
                    v.iter().any(|e| equal(e, item))
                }
                Node::Dict(pairs) => pairs.iter().any(|(k, _)| equal(k, item)),
                other => return Err(format!("contains on {other:?}")),
            };
            Ok(obj(Node::Bool(found)))
        }
        ("getitem", [container, index]) => match &*container.borrow() {
            Node::Tuple(v) | Node::List(v) => {
                let Some(i) = as_int(index) else {
                    return Err("sequence index not an integer".to_string());
                };
                let i = usize::try_from(i).map_err(|_| "negative index".to_string())?;
                v.get(i).cloned().ok_or_else(|| "index out of range".to_string())
            }
            Node::Dict(pairs) => pairs
                .iter()
                .rev()
                .find(|(k, _)| equal(k, index))
                .map(|(_, v)| Rc::clone(v))
                .ok_or_else(|| "key not found".to_string()),
            other => Err(format!("getitem on {other:?}")),
        },
        (
            "add" | "sub" | "mul" | "floordiv" | "mod" | "lshift" | "rshift" | "or_" | "xor"
            | "and_",
            [a, b],
        ) => {
            let (Some(a), Some(b)) = (as_int(a), as_int(b)) else {
                return Ok(opaque(callee, args));
            };
            let result = match op {
                "add" => a + b,
                "sub" => a - b,
                "mul" => a * b,
                "floordiv" => a.div_euclid(b),
                "mod" => a.rem_euclid(b),
                "lshift" => a << b,
                "rshift" => a >> b,
                "or_" => a | b,
                "xor" => a ^ b,
                _ => a & b,
            };
            Ok(obj(Node::Int(result)))
        }
        ("neg", [a]) => match as_int(a) {
            Some(n) => Ok(obj(Node::Int(-n))),
            None => Ok(opaque(callee, args)),
        },
        ("pos", [a]) => match as_int(a) {
            Some(n) => Ok(obj(Node::Int(n))),
            None => Ok(opaque(callee, args)),
        },
        ("inv", [a]) => match as_int(a) {
            Some(n) => Ok(obj(Node::Int(!n))),
            None => Ok(opaque(callee, args)),
        },
        _ => Ok(opaque(callee, args)),
    }
}

fn apply_builtin(func: &str, callee: &Obj, args: &[Obj]) -> Result<Obj, String> {
    match (func, args) {
        ("all" | "any", [seq]) => {
            let items = match &*seq.borrow() {
                Node::Tuple(v) | Node::List(v) => v.clone(),
                _ => return Ok(opaque(callee, args)),
            };
            let verdict = if func == "all" {
                items.iter().all(|o| o.borrow().truthy())
            } else {
                items.iter().any(|o| o.borrow().truthy())
            };
            Ok(obj(Node::Bool(verdict)))
        }
        ("filter", [predicate, seq]) => {
            let items = match &*seq.borrow() {
                Node::Tuple(v) | Node::List(v) => v.clone(),
                _ => return Ok(opaque(callee, args)),
            };
            let mut kept = Vec::new();
            for item in items {
                let verdict = apply(predicate, vec![Rc::clone(&item)])?;
                if verdict.borrow().truthy() {
                    kept.push(item);
                }
            }
            Ok(obj(Node::List(kept)))
        }
        ("next", [seq, default]) => {
            let first = match &*seq.borrow() {
                Node::Tuple(v) | Node::List(v) => v.first().cloned(),
                _ => return Ok(opaque(callee, args)),
            };
            Ok(first.unwrap_or_else(|| Rc::clone(default)))
        }
        ("getattr", [target, name]) => {
            let name = match &*name.borrow() {
                Node::Str(bytes) => String::from_utf8(bytes.clone())
                    .map_err(|_| "bad attribute name".to_string())?,
                other => return Err(format!("getattr name not a string: {other:?}")),
            };
            match &*target.borrow() {
                Node::Object { attrs, .. } => attrs
                    .iter()
                    .rev()
                    .find(|(k, _)| freeze(k) == Value::str(&name))
                    .map(|(_, v)| Rc::clone(v))
                    .ok_or_else(|| format!("no attribute {name}")),
                other => Err(format!("no attribute {name} on {other:?}")),
            }
        }
        ("len", [value]) => {
            let len = match &*value.borrow() {
                Node::Str(b) | Node::Bytes(b) => b.len(),
                Node::Tuple(v) | Node::List(v) | Node::Set(v) => v.len(),
                Node::Dict(v) => v.len(),
                other => return Err(format!("len of {other:?}")),
            };
            Ok(obj(Node::Int(len as i128)))
        }
        ("dict", []) => Ok(obj(Node::Dict(Vec::new()))),
        ("set", []) => Ok(obj(Node::Set(Vec::new()))),
        ("list", []) => Ok(obj(Node::List(Vec::new()))),
        ("tuple", [seq]) => {
            let items = match &*seq.borrow() {
                Node::Tuple(v) | Node::List(v) => v.clone(),
                _ => return Ok(opaque(callee, args)),
            };
            Ok(obj(Node::Tuple(items)))
        }
        ("bool", [value]) => Ok(obj(Node::Bool(value.borrow().truthy()))),
        ("__import__", [name]) => {
            let name = match &*name.borrow() {
                Node::Str(bytes) => String::from_utf8(bytes.clone())
                    .map_err(|_| "bad module name".to_string())?,
                other => return Err(format!("__import__ of {other:?}")),
            };
            let root = name.split('.').next().unwrap_or(&name).to_string();
            Ok(obj(Node::Global(root, String::new())))
        }
        _ => Ok(opaque(callee, args)),
    }
}
