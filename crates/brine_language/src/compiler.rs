//! AST-to-pickle compiler.
//!
//! The traversal engine walks the AST with one rule per node kind. Every
//! expression rule leaves exactly one value on the pickle machine's stack;
//! aggregate rules open a mark frame and collapse it with a single closing
//! opcode. The protocol has no arithmetic or attribute instructions, so
//! operators, comparisons, subscripts, and attribute access all lower to
//! `REDUCE` calls against the `operator` and `builtins` modules.
//!
//! Boolean `and`/`or` lower to a filter-then-first composition that
//! evaluates every operand eagerly. The selected value matches the source
//! language, but side effects of operands after the deciding one still
//! happen. This is inherent to a protocol without jumps.

use std::str::FromStr;

use brine_foundation::{Error, ErrorContext, PyString, Result};

use crate::ast::{Alias, BoolOpKind, CmpOp, Constant, Expr, Program, Stmt};
use crate::gensym::GensymGenerator;
use crate::memo::{MemoKey, MemoManager, TEMP_SLOT};
use crate::opcode::{PickleStream, op};
use crate::optimizer::optimize;
use crate::parser::parse;
use crate::span::Span;

/// The identifier reserved for the program result.
///
/// `RETURN = expr` as the sole target of the final statement makes `expr`
/// the program's value. Any other use is a compile error.
pub const RESERVED_RESULT_NAME: &str = "RETURN";

/// The pickle protocol version emitted.
const PROTOCOL_VERSION: u8 = 4;

/// The namespace ambient names resolve against.
const AMBIENT_MODULE: &str = "builtins";

/// Ambient symbols resolvable without an import.
const BUILTINS: &[&str] = &[
    "ArithmeticError",
    "AssertionError",
    "AttributeError",
    "BaseException",
    "BytesWarning",
    "DeprecationWarning",
    "EOFError",
    "Ellipsis",
    "EnvironmentError",
    "Exception",
    "FileExistsError",
    "FileNotFoundError",
    "FloatingPointError",
    "GeneratorExit",
    "IOError",
    "ImportError",
    "IndentationError",
    "IndexError",
    "InterruptedError",
    "IsADirectoryError",
    "KeyError",
    "KeyboardInterrupt",
    "LookupError",
    "MemoryError",
    "ModuleNotFoundError",
    "NameError",
    "NotADirectoryError",
    "NotImplemented",
    "NotImplementedError",
    "OSError",
    "OverflowError",
    "PermissionError",
    "RecursionError",
    "ReferenceError",
    "RuntimeError",
    "RuntimeWarning",
    "StopAsyncIteration",
    "StopIteration",
    "SyntaxError",
    "SyntaxWarning",
    "SystemError",
    "SystemExit",
    "TabError",
    "TimeoutError",
    "TypeError",
    "UnboundLocalError",
    "UnicodeDecodeError",
    "UnicodeEncodeError",
    "UnicodeError",
    "UnicodeTranslateError",
    "UserWarning",
    "ValueError",
    "Warning",
    "ZeroDivisionError",
    "__import__",
    "abs",
    "aiter",
    "all",
    "anext",
    "any",
    "ascii",
    "bin",
    "bool",
    "breakpoint",
    "bytearray",
    "bytes",
    "callable",
    "chr",
    "classmethod",
    "compile",
    "complex",
    "delattr",
    "dict",
    "dir",
    "divmod",
    "enumerate",
    "eval",
    "exec",
    "filter",
    "float",
    "format",
    "frozenset",
    "getattr",
    "globals",
    "hasattr",
    "hash",
    "help",
    "hex",
    "id",
    "input",
    "int",
    "isinstance",
    "issubclass",
    "iter",
    "len",
    "list",
    "locals",
    "map",
    "max",
    "memoryview",
    "min",
    "next",
    "object",
    "oct",
    "open",
    "ord",
    "pow",
    "print",
    "property",
    "range",
    "repr",
    "reversed",
    "round",
    "set",
    "setattr",
    "slice",
    "sorted",
    "staticmethod",
    "str",
    "sum",
    "super",
    "tuple",
    "type",
    "vars",
    "zip",
];

/// Returns true if `name` resolves in the ambient namespace.
fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

/// How lambda expressions are compiled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LambdaMode {
    /// Lambdas are a hard error (the default).
    #[default]
    Disabled,
    /// Serialize the lambda by embedding host-interpreter code objects.
    ///
    /// Recognized for configuration compatibility; the representation is
    /// tied to one interpreter's internals and cannot be produced here,
    /// so selecting it still errors at the first lambda.
    CodeEmbedding,
}

impl FromStr for LambdaMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "disabled" => Ok(Self::Disabled),
            "code-embedding" => Ok(Self::CodeEmbedding),
            other => Err(Error::feature_disabled(format!(
                "unknown lambda mode '{other}' (expected 'disabled' or 'code-embedding')"
            ))),
        }
    }
}

/// Options controlling compilation.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// How lambda expressions are handled.
    pub lambda_mode: LambdaMode,
    /// Whether to run dead-store elimination on the finished stream.
    pub optimize: bool,
    /// Source name for error messages.
    pub source_name: Option<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            lambda_mode: LambdaMode::Disabled,
            optimize: true,
            source_name: None,
        }
    }
}

/// Parses and compiles source text to a pickle byte stream.
pub fn compile_source(source: &str, options: &CompileOptions) -> Result<Vec<u8>> {
    let program = parse(source)?;
    let bytes = Compiler::new(source, options.clone()).compile(&program)?;
    if options.optimize {
        optimize(&bytes)
    } else {
        Ok(bytes)
    }
}

/// Compiles one program to a pickle byte stream.
///
/// Holds the output buffer and memo table for a single compilation; not
/// reusable across programs.
pub struct Compiler<'src> {
    source: &'src str,
    options: CompileOptions,
    stream: PickleStream,
    memo: MemoManager,
    gensym: GensymGenerator,
}

impl<'src> Compiler<'src> {
    /// Creates a compiler for one program.
    ///
    /// `source` is the text the program was parsed from, used for error
    /// snippets.
    #[must_use]
    pub fn new(source: &'src str, options: CompileOptions) -> Self {
        Self {
            source,
            options,
            stream: PickleStream::new(),
            memo: MemoManager::new(),
            gensym: GensymGenerator::new(),
        }
    }

    /// Compiles the program and returns the byte stream.
    ///
    /// The stream starts with the protocol header and ends with `STOP`;
    /// the value on top of the stack at `STOP` is the program result.
    pub fn compile(mut self, program: &Program) -> Result<Vec<u8>> {
        self.stream.proto(PROTOCOL_VERSION);

        if program.statements.is_empty() {
            self.stream.none();
            self.stream.stop();
            return Ok(self.stream.into_bytes());
        }

        self.stream.mark();
        let (body, last) = program
            .statements
            .split_at(program.statements.len() - 1);
        for stmt in body {
            self.compile_stmt(stmt)?;
        }

        let last = &last[0];
        if let Some(value) = return_form(last) {
            // The reserved return form: drop the statement frame, leave
            // the value as the stream's result.
            self.check_expr(value)?;
            self.stream.pop_mark();
            self.compile_expr(value)?;
            self.stream.stop();
        } else {
            self.compile_stmt(last)?;
            self.stream.pop_mark();
            self.stream.none();
            self.stream.stop();
        }
        Ok(self.stream.into_bytes())
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Compiles one non-final statement (or a final one that is not the
    /// return form).
    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Assign { targets, value, .. } => self.compile_assign(targets, value),
            Stmt::Import { names, .. } => self.compile_import(names),
            Stmt::ImportFrom { module, names, .. } => self.compile_import_from(module, names),
            Stmt::Expr { value, .. } => {
                self.check_expr(value)?;
                self.compile_expr(value)
            }
        }
    }

    /// Compiles an assignment statement.
    ///
    /// The value is produced once and parked in the reserved temp slot so
    /// each target can fetch it without re-evaluating side effects.
    fn compile_assign(&mut self, targets: &[Expr], value: &Expr) -> Result<()> {
        for target in targets {
            if let Expr::Name { id, span } = target {
                if id == RESERVED_RESULT_NAME {
                    return Err(self.fail(Error::reserved_name(id.clone()), *span));
                }
            }
        }
        self.check_expr(value)?;

        self.compile_expr(value)?;
        self.stream.put(TEMP_SLOT);

        for target in targets {
            self.compile_assign_target(target)?;
        }
        Ok(())
    }

    /// Emits the store sequence for one assignment target.
    fn compile_assign_target(&mut self, target: &Expr) -> Result<()> {
        match target {
            Expr::Name { id, .. } => {
                self.stream.get(TEMP_SLOT);
                let slot = self.memo.bind(MemoKey::local(id.clone()));
                self.stream.put(slot);
                Ok(())
            }
            Expr::Subscript { value, index, .. } => {
                self.check_expr(value)?;
                self.check_expr(index)?;
                self.compile_expr(value)?;
                self.compile_expr(index)?;
                self.stream.get(TEMP_SLOT);
                self.stream.emit(op::SETITEM);
                Ok(())
            }
            Expr::Attribute { value, attr, .. } => {
                // BUILD with a (state, slotstate) pair: the second element
                // updates attributes directly.
                self.check_expr(value)?;
                self.compile_expr(value)?;
                self.stream.emit(op::EMPTY_DICT);
                self.stream.mark();
                self.stream.string(&PyString::from(attr.as_str()));
                self.stream.get(TEMP_SLOT);
                self.stream.emit(op::DICT);
                self.stream.tuple(2);
                self.stream.emit(op::BUILD);
                Ok(())
            }
            Expr::Tuple { span, .. } | Expr::List { span, .. } => Err(self.fail(
                Error::unsupported("destructuring assignment targets"),
                *span,
            )),
            other => Err(self.fail(
                Error::unsupported(format!("assignment target: {}", node_name(other))),
                other.span(),
            )),
        }
    }

    /// Compiles `import a.b as c, d`.
    ///
    /// Each module is produced by calling the ambient import function and
    /// bound under its local name.
    fn compile_import(&mut self, names: &[Alias]) -> Result<()> {
        for alias in names {
            let binding = alias.binding().to_string();
            if binding == RESERVED_RESULT_NAME {
                return Err(self.fail(Error::reserved_name(binding), alias.span));
            }
            let call = Expr::Call {
                func: Box::new(external(AMBIENT_MODULE, "__import__", alias.span)),
                args: vec![Expr::Constant {
                    value: Constant::Str(PyString::from(alias.name.as_str())),
                    span: alias.span,
                }],
                span: alias.span,
            };
            self.compile_expr(&call)?;
            let slot = self.memo.bind(MemoKey::local(binding));
            self.stream.put(slot);
        }
        Ok(())
    }

    /// Compiles `from mod import a, b as c`.
    fn compile_import_from(&mut self, module: &str, names: &[Alias]) -> Result<()> {
        for alias in names {
            let binding = alias.binding().to_string();
            if binding == RESERVED_RESULT_NAME {
                return Err(self.fail(Error::reserved_name(binding), alias.span));
            }
            self.emit_global(module, &alias.name);
            let slot = self.memo.bind(MemoKey::local(binding));
            self.stream.put(slot);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Compiles one expression, leaving exactly one value on the stack.
    fn compile_expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Constant { value, .. } => self.compile_constant(value),
            Expr::Name { id, span } => self.compile_name(id, *span),
            Expr::Tuple { elts, .. } => self.compile_tuple(elts),
            Expr::List { elts, .. } => {
                self.stream.mark();
                for elt in elts {
                    self.compile_expr(elt)?;
                }
                self.stream.emit(op::LIST);
                Ok(())
            }
            Expr::Dict { keys, values, .. } => {
                self.stream.mark();
                for (key, value) in keys.iter().zip(values) {
                    self.compile_expr(key)?;
                    self.compile_expr(value)?;
                }
                self.stream.emit(op::DICT);
                Ok(())
            }
            Expr::Set { elts, .. } => {
                self.stream.emit(op::EMPTY_SET);
                if !elts.is_empty() {
                    self.stream.mark();
                    for elt in elts {
                        self.compile_expr(elt)?;
                    }
                    self.stream.emit(op::ADDITEMS);
                }
                Ok(())
            }
            Expr::Call { func, args, span } => self.compile_call(func, args, *span),
            Expr::Attribute { value, attr, span } => {
                let call = Expr::Call {
                    func: Box::new(external(AMBIENT_MODULE, "getattr", *span)),
                    args: vec![
                        (**value).clone(),
                        Expr::Constant {
                            value: Constant::Str(PyString::from(attr.as_str())),
                            span: *span,
                        },
                    ],
                    span: *span,
                };
                self.compile_expr(&call)
            }
            Expr::Subscript { value, index, span } => {
                let call = Expr::Call {
                    func: Box::new(external("operator", "getitem", *span)),
                    args: vec![(**value).clone(), (**index).clone()],
                    span: *span,
                };
                self.compile_expr(&call)
            }
            Expr::Slice {
                lower,
                upper,
                step,
                span,
            } => {
                let bound = |part: &Option<Box<Expr>>| {
                    part.as_deref().cloned().unwrap_or(Expr::Constant {
                        value: Constant::None,
                        span: *span,
                    })
                };
                let call = Expr::Call {
                    func: Box::new(external(AMBIENT_MODULE, "slice", *span)),
                    args: vec![bound(lower), bound(upper), bound(step)],
                    span: *span,
                };
                self.compile_expr(&call)
            }
            Expr::BinOp {
                left,
                op,
                right,
                span,
            } => {
                let call = Expr::Call {
                    func: Box::new(external("operator", op.method_name(), *span)),
                    args: vec![(**left).clone(), (**right).clone()],
                    span: *span,
                };
                self.compile_expr(&call)
            }
            Expr::UnaryOp { op, operand, span } => {
                let call = Expr::Call {
                    func: Box::new(external("operator", op.method_name(), *span)),
                    args: vec![(**operand).clone()],
                    span: *span,
                };
                self.compile_expr(&call)
            }
            Expr::BoolOp { op, values, span } => self.compile_bool_op(*op, values, *span),
            Expr::Compare {
                left,
                ops,
                comparators,
                span,
            } => self.compile_compare(left, ops, comparators, *span),
            Expr::NamedExpr {
                target,
                value,
                span,
            } => {
                if target == RESERVED_RESULT_NAME {
                    return Err(self.fail(Error::reserved_name(target.clone()), *span));
                }
                self.compile_expr(value)?;
                let slot = self.memo.bind(MemoKey::local(target.clone()));
                self.stream.put(slot);
                Ok(())
            }
            Expr::Lambda { span, .. } => match self.options.lambda_mode {
                LambdaMode::Disabled => Err(self.fail(
                    Error::feature_disabled(
                        "lambda compilation is disabled (enable a lambda mode to use it)",
                    ),
                    *span,
                )),
                LambdaMode::CodeEmbedding => Err(self.fail(
                    Error::feature_disabled(
                        "lambda mode 'code-embedding' serializes host-interpreter code \
                         objects and is not available in this compiler",
                    ),
                    *span,
                )),
            },
            Expr::ExternalRef { module, name, .. } => {
                self.emit_global(module, name);
                Ok(())
            }
        }
    }

    /// Compiles a literal constant.
    fn compile_constant(&mut self, value: &Constant) -> Result<()> {
        match value {
            Constant::None => self.stream.none(),
            Constant::Bool(b) => self.stream.bool(*b),
            Constant::Int(n) => self.stream.int(*n),
            Constant::Float(n) => self.stream.float(*n),
            Constant::Str(s) => self.stream.string(s),
            Constant::Bytes(b) => self.stream.bytes(b),
            Constant::Ellipsis => self.emit_global(AMBIENT_MODULE, "Ellipsis"),
        }
        Ok(())
    }

    /// Compiles a name reference.
    ///
    /// Bound names fetch their memo slot; otherwise the name must resolve
    /// in the ambient namespace.
    fn compile_name(&mut self, id: &str, span: Span) -> Result<()> {
        if id == RESERVED_RESULT_NAME {
            return Err(self.fail(Error::reserved_name(id), span));
        }
        if let Some(slot) = self.memo.get(&MemoKey::local(id)) {
            self.stream.get(slot);
            return Ok(());
        }
        if is_builtin(id) {
            self.emit_global(AMBIENT_MODULE, id);
            return Ok(());
        }
        Err(self.fail(Error::undefined_name(id), span))
    }

    /// Compiles a tuple display.
    fn compile_tuple(&mut self, elts: &[Expr]) -> Result<()> {
        if elts.len() > 3 {
            self.stream.mark();
        }
        for elt in elts {
            self.compile_expr(elt)?;
        }
        self.stream.tuple(elts.len());
        Ok(())
    }

    /// Compiles a call, dispatching macros by callee name.
    fn compile_call(&mut self, func: &Expr, args: &[Expr], span: Span) -> Result<()> {
        if let Expr::Name { id, .. } = func {
            match id.as_str() {
                "BUILD" => return self.macro_build(args, span),
                "STACK_GLOBAL" => return self.macro_stack_global(args, span),
                "GLOBAL" => return self.macro_global(args, span),
                "INST" => return self.macro_inst(args, span),
                _ => {}
            }
        }
        self.compile_expr(func)?;
        if args.len() > 3 {
            self.stream.mark();
        }
        for arg in args {
            self.compile_expr(arg)?;
        }
        self.stream.tuple(args.len());
        self.stream.emit(op::REDUCE);
        Ok(())
    }

    /// Compiles a comparison, single or chained.
    ///
    /// `a < b` becomes `operator.lt(a, b)`. A chain `a < b < c` becomes
    /// `all((lt(a, t := b), lt(t, c)))`, binding each interior operand
    /// once so it is evaluated once and shared between adjacent pairs.
    fn compile_compare(
        &mut self,
        left: &Expr,
        ops: &[CmpOp],
        comparators: &[Expr],
        span: Span,
    ) -> Result<()> {
        if ops.len() == 1 {
            let call = self.comparison_call(left.clone(), ops[0], comparators[0].clone(), span)?;
            return self.compile_expr(&call);
        }

        let mut pairs = Vec::with_capacity(ops.len());
        let mut lhs = left.clone();
        for (i, (cmp, rhs)) in ops.iter().zip(comparators).enumerate() {
            let last = i == ops.len() - 1;
            let rhs = if last {
                rhs.clone()
            } else {
                let temp = self.gensym.gensym("chain");
                let bound = Expr::NamedExpr {
                    target: temp.clone(),
                    value: Box::new(rhs.clone()),
                    span: rhs.span(),
                };
                pairs.push(self.comparison_call(lhs, *cmp, bound, span)?);
                lhs = Expr::Name {
                    id: temp,
                    span: rhs.span(),
                };
                continue;
            };
            pairs.push(self.comparison_call(lhs.clone(), *cmp, rhs, span)?);
        }

        let call = Expr::Call {
            func: Box::new(external(AMBIENT_MODULE, "all", span)),
            args: vec![Expr::Tuple { elts: pairs, span }],
            span,
        };
        self.compile_expr(&call)
    }

    /// Builds the library call for one pairwise comparison.
    ///
    /// Membership tests swap operands: `operator.contains` takes the
    /// container first.
    fn comparison_call(&self, left: Expr, cmp: CmpOp, right: Expr, span: Span) -> Result<Expr> {
        let Some(method) = cmp.method_name() else {
            return Err(self.fail(
                Error::unsupported(format!("comparison operator '{}'", cmp.as_str())),
                span,
            ));
        };
        let args = if cmp == CmpOp::In {
            vec![right, left]
        } else {
            vec![left, right]
        };
        Ok(Expr::Call {
            func: Box::new(external("operator", method, span)),
            args,
            span,
        })
    }

    /// Compiles `and`/`or` over N operands.
    ///
    /// `a or b or c` becomes `next(filter(truth, (a, b, t := c)), t)`:
    /// the first operand passing the predicate, defaulting to the last.
    /// All operands are evaluated before the predicate runs.
    fn compile_bool_op(&mut self, op: BoolOpKind, values: &[Expr], span: Span) -> Result<()> {
        let predicate = match op {
            BoolOpKind::Or => "truth",
            BoolOpKind::And => "not_",
        };
        let temp = self.gensym.gensym("tail");
        let (last, init) = values
            .split_last()
            .ok_or_else(|| Error::internal("boolean operator with no operands"))?;
        let mut elts: Vec<Expr> = init.to_vec();
        elts.push(Expr::NamedExpr {
            target: temp.clone(),
            value: Box::new(last.clone()),
            span: last.span(),
        });

        let filtered = Expr::Call {
            func: Box::new(external(AMBIENT_MODULE, "filter", span)),
            args: vec![external("operator", predicate, span), Expr::Tuple { elts, span }],
            span,
        };
        let call = Expr::Call {
            func: Box::new(external(AMBIENT_MODULE, "next", span)),
            args: vec![
                filtered,
                Expr::Name {
                    id: temp,
                    span,
                },
            ],
            span,
        };
        self.compile_expr(&call)
    }

    // ------------------------------------------------------------------
    // Macro intrinsics
    // ------------------------------------------------------------------

    /// `BUILD(obj, state)`: apply state onto an object.
    fn macro_build(&mut self, args: &[Expr], span: Span) -> Result<()> {
        self.require_arity("BUILD", args, 2, span)?;
        self.compile_expr(&args[0])?;
        self.compile_expr(&args[1])?;
        self.stream.emit(op::BUILD);
        Ok(())
    }

    /// `STACK_GLOBAL(module, name)`: resolve a global from two stack values.
    fn macro_stack_global(&mut self, args: &[Expr], span: Span) -> Result<()> {
        self.require_arity("STACK_GLOBAL", args, 2, span)?;
        self.compile_expr(&args[0])?;
        self.compile_expr(&args[1])?;
        self.stream.emit(op::STACK_GLOBAL);
        Ok(())
    }

    /// `GLOBAL(module, name)`: the legacy text-form global reference.
    ///
    /// Both arguments must be string literals; the reference is written as
    /// text, never touching the value stack.
    fn macro_global(&mut self, args: &[Expr], span: Span) -> Result<()> {
        self.require_arity("GLOBAL", args, 2, span)?;
        let module = self.require_str("GLOBAL", &args[0])?;
        let name = self.require_str("GLOBAL", &args[1])?;
        self.stream.global(&module, &name);
        Ok(())
    }

    /// `INST(module, name, args)`: the legacy text-form instantiation.
    fn macro_inst(&mut self, args: &[Expr], span: Span) -> Result<()> {
        self.require_arity("INST", args, 3, span)?;
        let module = self.require_str("INST", &args[0])?;
        let name = self.require_str("INST", &args[1])?;
        let Expr::Tuple { elts, .. } = &args[2] else {
            return Err(self.fail(
                Error::macro_argument("INST", "constructor arguments must be a literal tuple"),
                args[2].span(),
            ));
        };
        self.stream.mark();
        for elt in elts {
            self.compile_expr(elt)?;
        }
        self.stream.inst(&module, &name);
        Ok(())
    }

    /// Checks a macro's argument count.
    fn require_arity(&self, name: &str, args: &[Expr], expected: usize, span: Span) -> Result<()> {
        if args.len() == expected {
            Ok(())
        } else {
            Err(self.fail(Error::macro_arity(name, expected, args.len()), span))
        }
    }

    /// Extracts a string-literal macro argument.
    fn require_str(&self, name: &str, arg: &Expr) -> Result<String> {
        if let Expr::Constant {
            value: Constant::Str(s),
            ..
        } = arg
        {
            if let Some(text) = s.as_str() {
                return Ok(text.to_string());
            }
        }
        Err(self.fail(
            Error::macro_argument(name, "module and symbol must be string literals"),
            arg.span(),
        ))
    }

    // ------------------------------------------------------------------
    // Support
    // ------------------------------------------------------------------

    /// Pushes an external (module, name) reference, memoized.
    ///
    /// The first reference resolves via `STACK_GLOBAL` and is remembered;
    /// later references fetch the memo slot.
    fn emit_global(&mut self, module: &str, name: &str) {
        let key = MemoKey::external(module, name);
        if let Some(slot) = self.memo.get(&key) {
            self.stream.get(slot);
            return;
        }
        self.stream.string(&PyString::from(module));
        self.stream.string(&PyString::from(name));
        self.stream.emit(op::STACK_GLOBAL);
        let slot = self.memo.bind(key);
        self.stream.put(slot);
    }

    /// Rejects reserved-name references anywhere inside an expression.
    fn check_expr(&self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Name { id, span } => {
                if id == RESERVED_RESULT_NAME {
                    return Err(self.fail(Error::reserved_name(id.clone()), *span));
                }
                Ok(())
            }
            Expr::NamedExpr {
                target,
                value,
                span,
            } => {
                if target == RESERVED_RESULT_NAME {
                    return Err(self.fail(Error::reserved_name(target.clone()), *span));
                }
                self.check_expr(value)
            }
            Expr::Constant { .. } | Expr::ExternalRef { .. } => Ok(()),
            Expr::Tuple { elts, .. } | Expr::List { elts, .. } | Expr::Set { elts, .. } => {
                elts.iter().try_for_each(|e| self.check_expr(e))
            }
            Expr::Dict { keys, values, .. } => keys
                .iter()
                .chain(values)
                .try_for_each(|e| self.check_expr(e)),
            Expr::Call { func, args, .. } => {
                self.check_expr(func)?;
                args.iter().try_for_each(|e| self.check_expr(e))
            }
            Expr::Attribute { value, .. } => self.check_expr(value),
            Expr::Subscript { value, index, .. } => {
                self.check_expr(value)?;
                self.check_expr(index)
            }
            Expr::Slice {
                lower,
                upper,
                step,
                ..
            } => [lower, upper, step]
                .into_iter()
                .flatten()
                .try_for_each(|e| self.check_expr(e)),
            Expr::BinOp { left, right, .. } => {
                self.check_expr(left)?;
                self.check_expr(right)
            }
            Expr::UnaryOp { operand, .. } => self.check_expr(operand),
            Expr::BoolOp { values, .. } => values.iter().try_for_each(|e| self.check_expr(e)),
            Expr::Compare {
                left, comparators, ..
            } => {
                self.check_expr(left)?;
                comparators.iter().try_for_each(|e| self.check_expr(e))
            }
            Expr::Lambda { body, .. } => self.check_expr(body),
        }
    }

    /// Attaches source position and snippet to an error.
    fn fail(&self, error: Error, span: Span) -> Error {
        let mut context = ErrorContext::new()
            .with_position(span.line, span.column)
            .with_snippet(span.source_line(self.source));
        if let Some(name) = &self.options.source_name {
            context = context.with_source(name.clone());
        }
        error.with_context(context)
    }
}

/// Matches the reserved return form: `RETURN = expr` with a sole target.
///
/// Returns the value expression when the statement is that form.
fn return_form(stmt: &Stmt) -> Option<&Expr> {
    let Stmt::Assign { targets, value, .. } = stmt else {
        return None;
    };
    let [Expr::Name { id, .. }] = targets.as_slice() else {
        return None;
    };
    (id == RESERVED_RESULT_NAME).then_some(value)
}

/// Builds a synthetic reference to an external symbol.
const fn external(module: &'static str, name: &'static str, span: Span) -> Expr {
    Expr::ExternalRef { module, name, span }
}

/// Names an expression kind for error messages.
const fn node_name(expr: &Expr) -> &'static str {
    match expr {
        Expr::Constant { .. } => "constant",
        Expr::Name { .. } => "name",
        Expr::Tuple { .. } => "tuple",
        Expr::List { .. } => "list",
        Expr::Dict { .. } => "dict",
        Expr::Set { .. } => "set",
        Expr::Call { .. } => "call",
        Expr::Attribute { .. } => "attribute",
        Expr::Subscript { .. } => "subscript",
        Expr::Slice { .. } => "slice",
        Expr::BinOp { .. } => "binary operation",
        Expr::UnaryOp { .. } => "unary operation",
        Expr::BoolOp { .. } => "boolean operation",
        Expr::Compare { .. } => "comparison",
        Expr::NamedExpr { .. } => "named expression",
        Expr::Lambda { .. } => "lambda",
        Expr::ExternalRef { .. } => "external reference",
    }
}
