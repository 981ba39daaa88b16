//! Arena-backed AST
//!
//! Nodes live in a single arena owned by [`Ast`] and are addressed by stable
//! [`NodeId`]s. Later passes key their side tables (resolved declarations,
//! scopes, types) by `NodeId`, so node identity must survive tree mutation.
//! The only mutations the front end performs are wrapping an expression in an
//! implicit checked cast and appending cloned generic specializations to a
//! statement list; both allocate new nodes and re-point edges, they never
//! invalidate existing ids.

use crate::interner::{Atom, NameInterner};
use crate::span::Span;
use std::fmt;

/// Unique identifier of a node in the AST arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Declaration kind of a `VariableDeclaration` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    /// `var` - function scoped.
    Var,
    /// `let` - block scoped.
    Let,
    /// `const` - block scoped, single assignment.
    Const,
}

/// Kind of a class member method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Ordinary method.
    Method,
    /// The class constructor.
    Constructor,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitNot,
    Typeof,
    Void,
    Delete,
}

impl UnaryOp {
    /// Operator spelling as it appears in source.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Minus => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Typeof => "typeof",
            UnaryOp::Void => "void",
            UnaryOp::Delete => "delete",
        }
    }
}

/// Update operators (`++`, `--`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    In,
    Instanceof,
}

impl BinaryOp {
    /// Operator spelling as it appears in source.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Exp => "**",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNe => "!==",
            BinaryOp::In => "in",
            BinaryOp::Instanceof => "instanceof",
        }
    }

    /// True for `==`, `!=`, `===`, `!==`.
    pub fn is_equality(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::StrictEq | BinaryOp::StrictNe
        )
    }

    /// True for `<`, `>`, `<=`, `>=`.
    pub fn is_relational(&self) -> bool {
        matches!(self, BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge)
    }
}

/// Logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    NullishCoalesce,
}

/// Assignment operators. `Assign` is plain `=`; the rest are compound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
}

impl AssignOp {
    /// The binary operator a compound assignment applies, if any.
    pub fn binary_op(&self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::AddAssign => Some(BinaryOp::Add),
            AssignOp::SubAssign => Some(BinaryOp::Sub),
            AssignOp::MulAssign => Some(BinaryOp::Mul),
            AssignOp::DivAssign => Some(BinaryOp::Div),
            AssignOp::ModAssign => Some(BinaryOp::Mod),
        }
    }
}

/// Primitive type annotation keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKeyword {
    Void,
    Null,
    Boolean,
    String,
    Number,
    BigInt,
    Any,
    Mixed,
}

/// The kind and payload of a node.
///
/// Child links are `NodeId`s into the same arena. Statement lists are plain
/// vectors; the checker may push cloned generic specializations onto them.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // ==== Top level ====
    /// Whole-program root.
    Program { body: Vec<NodeId> },

    // ==== Statements ====
    VariableDeclaration { kind: VarKind, declarators: Vec<NodeId> },
    /// One `name = init` pair of a variable declaration.
    VariableDeclarator { id: NodeId, init: Option<NodeId> },
    FunctionDeclaration {
        id: NodeId,
        type_params: Option<NodeId>,
        params: Vec<NodeId>,
        return_type: Option<NodeId>,
        body: NodeId,
        is_async: bool,
        is_generator: bool,
    },
    ClassDeclaration {
        id: NodeId,
        type_params: Option<NodeId>,
        super_class: Option<NodeId>,
        super_type_args: Option<NodeId>,
        body: NodeId,
    },
    /// Member list of a class.
    ClassBody { members: Vec<NodeId> },
    /// `key: T = value;` field of a class.
    ClassProperty {
        key: NodeId,
        type_annotation: Option<NodeId>,
        value: Option<NodeId>,
        is_static: bool,
    },
    /// Method of a class; `value` is a `FunctionExpression`.
    MethodDefinition {
        key: NodeId,
        value: NodeId,
        kind: MethodKind,
        is_static: bool,
    },
    /// `type Name<T> = annotation;`
    TypeAliasDeclaration {
        id: NodeId,
        type_params: Option<NodeId>,
        right: NodeId,
    },
    ImportDeclaration { specifiers: Vec<NodeId>, source: Atom },
    /// One imported binding.
    ImportSpecifier { local: NodeId },
    Block { body: Vec<NodeId> },
    EmptyStatement,
    ExpressionStatement { expression: NodeId },
    IfStatement {
        test: NodeId,
        consequent: NodeId,
        alternate: Option<NodeId>,
    },
    WhileStatement { test: NodeId, body: NodeId },
    DoWhileStatement { body: NodeId, test: NodeId },
    ForStatement {
        init: Option<NodeId>,
        test: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    ForInStatement { left: NodeId, right: NodeId, body: NodeId },
    ForOfStatement { left: NodeId, right: NodeId, body: NodeId },
    SwitchStatement { discriminant: NodeId, cases: Vec<NodeId> },
    /// `case test:` (or `default:` when `test` is `None`).
    SwitchCase { test: Option<NodeId>, consequent: Vec<NodeId> },
    ReturnStatement { argument: Option<NodeId> },
    BreakStatement { label: Option<NodeId> },
    ContinueStatement { label: Option<NodeId> },
    LabeledStatement { label: NodeId, body: NodeId },
    ThrowStatement { argument: NodeId },
    TryStatement {
        block: NodeId,
        handler: Option<NodeId>,
        finalizer: Option<NodeId>,
    },
    CatchClause { param: Option<NodeId>, body: NodeId },

    // ==== Expressions ====
    /// An identifier. In binding positions (declarators, parameters, class
    /// member keys) `annotation` may carry a type annotation; in reference
    /// positions it is always `None`.
    Identifier { name: Atom, annotation: Option<NodeId> },
    NumberLiteral { value: f64 },
    StringLiteral { value: Atom },
    BooleanLiteral { value: bool },
    NullLiteral,
    BigIntLiteral { value: Atom },
    TemplateLiteral { quasis: Vec<Atom>, expressions: Vec<NodeId> },
    ArrayExpression { elements: Vec<NodeId> },
    ObjectExpression { properties: Vec<NodeId> },
    /// `key: value` of an object literal or object pattern.
    Property { key: NodeId, value: NodeId, computed: bool },
    UnaryExpression { op: UnaryOp, argument: NodeId },
    UpdateExpression { op: UpdateOp, prefix: bool, argument: NodeId },
    BinaryExpression { op: BinaryOp, left: NodeId, right: NodeId },
    LogicalExpression { op: LogicalOp, left: NodeId, right: NodeId },
    AssignmentExpression { op: AssignOp, left: NodeId, right: NodeId },
    ConditionalExpression {
        test: NodeId,
        consequent: NodeId,
        alternate: NodeId,
    },
    CallExpression {
        callee: NodeId,
        type_args: Option<NodeId>,
        arguments: Vec<NodeId>,
    },
    NewExpression {
        callee: NodeId,
        type_args: Option<NodeId>,
        arguments: Vec<NodeId>,
    },
    MemberExpression { object: NodeId, property: NodeId, computed: bool },
    SequenceExpression { expressions: Vec<NodeId> },
    FunctionExpression {
        id: Option<NodeId>,
        params: Vec<NodeId>,
        return_type: Option<NodeId>,
        body: NodeId,
        is_async: bool,
        is_generator: bool,
    },
    /// Arrow function; the parser normalizes expression bodies into a block
    /// with a single return statement.
    ArrowFunction {
        params: Vec<NodeId>,
        return_type: Option<NodeId>,
        body: NodeId,
        is_async: bool,
    },
    ClassExpression {
        id: Option<NodeId>,
        type_params: Option<NodeId>,
        super_class: Option<NodeId>,
        super_type_args: Option<NodeId>,
        body: NodeId,
    },
    SpreadElement { argument: NodeId },
    YieldExpression { argument: Option<NodeId>, delegate: bool },
    AwaitExpression { argument: NodeId },
    This,
    Super,
    /// `new.target`.
    NewTarget,
    /// Runtime-checked cast inserted by the type checker around expressions
    /// whose static type needs narrowing at runtime. Never produced by the
    /// parser.
    ImplicitCheckedCast { argument: NodeId },

    // ==== Patterns ====
    ArrayPattern { elements: Vec<NodeId> },
    ObjectPattern { properties: Vec<NodeId> },
    /// `left = right` default value inside a pattern or parameter list.
    AssignmentPattern { left: NodeId, right: NodeId },
    RestElement { argument: NodeId },
    /// Elided element of an array pattern/literal.
    Elision,

    // ==== Type annotations ====
    PrimitiveAnnotation { keyword: PrimitiveKeyword },
    /// Reference to a named type, optionally with type arguments:
    /// `Foo`, `Box<number>`.
    NamedAnnotation { id: NodeId, type_args: Option<NodeId> },
    UnionAnnotation { members: Vec<NodeId> },
    /// `?T`, shorthand for `void | null | T`.
    NullableAnnotation { inner: NodeId },
    ArrayAnnotation { element: NodeId },
    TupleAnnotation { elements: Vec<NodeId> },
    FunctionAnnotation {
        params: Vec<NodeId>,
        return_type: NodeId,
    },
    /// One `name: T` parameter of a function type annotation.
    FunctionTypeParam { name: Option<Atom>, annotation: NodeId },
    /// `{| a: T, b: U |}` exact object type.
    ExactObjectAnnotation { fields: Vec<NodeId> },
    /// One field of an exact object annotation.
    ObjectTypeField { name: Atom, annotation: NodeId },
    /// `<T, U>` declaration on a generic function/class/alias.
    TypeParams { params: Vec<NodeId> },
    /// One declared type parameter.
    TypeParam { name: NodeId },
    /// `<number, string>` instantiation at a use site.
    TypeArgs { args: Vec<NodeId> },
}

/// One allocated node: a span plus its kind/payload.
#[derive(Debug, Clone)]
pub struct Node {
    pub span: Span,
    pub kind: NodeKind,
}

/// The AST arena. Owns every node and the name interner.
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    /// Interner for identifier and property names.
    pub names: NameInterner,
}

impl Ast {
    /// Create an empty arena.
    pub fn new() -> Self {
        Ast::default()
    }

    /// Allocate a node and return its id.
    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { span, kind });
        id
    }

    /// Borrow a node.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    /// Borrow a node's kind.
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0 as usize].kind
    }

    /// Mutably borrow a node's kind.
    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0 as usize].kind
    }

    /// Span of a node.
    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.0 as usize].span
    }

    /// Number of allocated nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The interned name of an `Identifier` node, if `id` is one.
    pub fn ident_name(&self, id: NodeId) -> Option<Atom> {
        match self.kind(id) {
            NodeKind::Identifier { name, .. } => Some(*name),
            _ => None,
        }
    }

    /// The type annotation of an `Identifier` binding, if any.
    pub fn ident_annotation(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(id) {
            NodeKind::Identifier { annotation, .. } => *annotation,
            _ => None,
        }
    }

    /// Resolve an `Identifier` node to its string. Panics if not an
    /// identifier; for diagnostics only.
    pub fn ident_str(&self, id: NodeId) -> &str {
        match self.kind(id) {
            NodeKind::Identifier { name, .. } => self.names.resolve(*name),
            _ => panic!("ident_str on non-identifier node"),
        }
    }

    /// True for the four function-like kinds (declaration, expression,
    /// arrow, method value).
    pub fn is_function_like(&self, id: NodeId) -> bool {
        matches!(
            self.kind(id),
            NodeKind::FunctionDeclaration { .. }
                | NodeKind::FunctionExpression { .. }
                | NodeKind::ArrowFunction { .. }
        )
    }

    /// True if the node is an arrow function.
    pub fn is_arrow(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::ArrowFunction { .. })
    }

    /// The body block of a function-like node.
    pub fn function_body(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(id) {
            NodeKind::FunctionDeclaration { body, .. }
            | NodeKind::FunctionExpression { body, .. }
            | NodeKind::ArrowFunction { body, .. } => Some(*body),
            _ => None,
        }
    }

    /// The parameter list of a function-like node.
    pub fn function_params(&self, id: NodeId) -> Option<&[NodeId]> {
        match self.kind(id) {
            NodeKind::FunctionDeclaration { params, .. }
            | NodeKind::FunctionExpression { params, .. }
            | NodeKind::ArrowFunction { params, .. } => Some(params),
            _ => None,
        }
    }

    /// Collect the direct children of `id` in source order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.for_each_child(id, |c| out.push(c));
        out
    }

    /// Invoke `f` on every direct child of `id` in source order.
    pub fn for_each_child(&self, id: NodeId, mut f: impl FnMut(NodeId)) {
        use NodeKind::*;
        match self.kind(id) {
            Program { body } | Block { body } => {
                for &c in body {
                    f(c);
                }
            }
            VariableDeclaration { declarators, .. } => {
                for &c in declarators {
                    f(c);
                }
            }
            VariableDeclarator { id, init } => {
                f(*id);
                if let Some(init) = init {
                    f(*init);
                }
            }
            FunctionDeclaration { id, type_params, params, return_type, body, .. } => {
                f(*id);
                if let Some(tp) = type_params {
                    f(*tp);
                }
                for &p in params {
                    f(p);
                }
                if let Some(rt) = return_type {
                    f(*rt);
                }
                f(*body);
            }
            ClassDeclaration { id, type_params, super_class, super_type_args, body } => {
                f(*id);
                if let Some(tp) = type_params {
                    f(*tp);
                }
                if let Some(sc) = super_class {
                    f(*sc);
                }
                if let Some(sta) = super_type_args {
                    f(*sta);
                }
                f(*body);
            }
            ClassExpression { id, type_params, super_class, super_type_args, body } => {
                if let Some(id) = id {
                    f(*id);
                }
                if let Some(tp) = type_params {
                    f(*tp);
                }
                if let Some(sc) = super_class {
                    f(*sc);
                }
                if let Some(sta) = super_type_args {
                    f(*sta);
                }
                f(*body);
            }
            ClassBody { members } => {
                for &m in members {
                    f(m);
                }
            }
            ClassProperty { key, type_annotation, value, .. } => {
                f(*key);
                if let Some(t) = type_annotation {
                    f(*t);
                }
                if let Some(v) = value {
                    f(*v);
                }
            }
            MethodDefinition { key, value, .. } => {
                f(*key);
                f(*value);
            }
            TypeAliasDeclaration { id, type_params, right } => {
                f(*id);
                if let Some(tp) = type_params {
                    f(*tp);
                }
                f(*right);
            }
            ImportDeclaration { specifiers, .. } => {
                for &s in specifiers {
                    f(s);
                }
            }
            ImportSpecifier { local } => f(*local),
            Identifier { annotation, .. } => {
                if let Some(a) = annotation {
                    f(*a);
                }
            }
            EmptyStatement | Elision | NumberLiteral { .. } | StringLiteral { .. }
            | BooleanLiteral { .. } | NullLiteral | BigIntLiteral { .. } | This | Super
            | NewTarget | PrimitiveAnnotation { .. } => {}
            ExpressionStatement { expression } => f(*expression),
            IfStatement { test, consequent, alternate } => {
                f(*test);
                f(*consequent);
                if let Some(alt) = alternate {
                    f(*alt);
                }
            }
            WhileStatement { test, body } => {
                f(*test);
                f(*body);
            }
            DoWhileStatement { body, test } => {
                f(*body);
                f(*test);
            }
            ForStatement { init, test, update, body } => {
                if let Some(i) = init {
                    f(*i);
                }
                if let Some(t) = test {
                    f(*t);
                }
                if let Some(u) = update {
                    f(*u);
                }
                f(*body);
            }
            ForInStatement { left, right, body } | ForOfStatement { left, right, body } => {
                f(*left);
                f(*right);
                f(*body);
            }
            SwitchStatement { discriminant, cases } => {
                f(*discriminant);
                for &c in cases {
                    f(c);
                }
            }
            SwitchCase { test, consequent } => {
                if let Some(t) = test {
                    f(*t);
                }
                for &c in consequent {
                    f(c);
                }
            }
            ReturnStatement { argument } => {
                if let Some(a) = argument {
                    f(*a);
                }
            }
            BreakStatement { label } | ContinueStatement { label } => {
                if let Some(l) = label {
                    f(*l);
                }
            }
            LabeledStatement { label, body } => {
                f(*label);
                f(*body);
            }
            ThrowStatement { argument } => f(*argument),
            TryStatement { block, handler, finalizer } => {
                f(*block);
                if let Some(h) = handler {
                    f(*h);
                }
                if let Some(fin) = finalizer {
                    f(*fin);
                }
            }
            CatchClause { param, body } => {
                if let Some(p) = param {
                    f(*p);
                }
                f(*body);
            }
            TemplateLiteral { expressions, .. } => {
                for &e in expressions {
                    f(e);
                }
            }
            ArrayExpression { elements } | ArrayPattern { elements }
            | TupleAnnotation { elements } => {
                for &e in elements {
                    f(e);
                }
            }
            ObjectExpression { properties } | ObjectPattern { properties } => {
                for &p in properties {
                    f(p);
                }
            }
            Property { key, value, .. } => {
                f(*key);
                f(*value);
            }
            UnaryExpression { argument, .. }
            | UpdateExpression { argument, .. }
            | SpreadElement { argument }
            | AwaitExpression { argument }
            | ImplicitCheckedCast { argument }
            | RestElement { argument } => f(*argument),
            BinaryExpression { left, right, .. }
            | LogicalExpression { left, right, .. }
            | AssignmentExpression { left, right, .. }
            | AssignmentPattern { left, right } => {
                f(*left);
                f(*right);
            }
            ConditionalExpression { test, consequent, alternate } => {
                f(*test);
                f(*consequent);
                f(*alternate);
            }
            CallExpression { callee, type_args, arguments }
            | NewExpression { callee, type_args, arguments } => {
                f(*callee);
                if let Some(ta) = type_args {
                    f(*ta);
                }
                for &a in arguments {
                    f(a);
                }
            }
            MemberExpression { object, property, .. } => {
                f(*object);
                f(*property);
            }
            SequenceExpression { expressions } => {
                for &e in expressions {
                    f(e);
                }
            }
            FunctionExpression { id, params, return_type, body, .. } => {
                if let Some(id) = id {
                    f(*id);
                }
                for &p in params {
                    f(p);
                }
                if let Some(rt) = return_type {
                    f(*rt);
                }
                f(*body);
            }
            ArrowFunction { params, return_type, body, .. } => {
                for &p in params {
                    f(p);
                }
                if let Some(rt) = return_type {
                    f(*rt);
                }
                f(*body);
            }
            YieldExpression { argument, .. } => {
                if let Some(a) = argument {
                    f(*a);
                }
            }
            NamedAnnotation { id, type_args } => {
                f(*id);
                if let Some(ta) = type_args {
                    f(*ta);
                }
            }
            UnionAnnotation { members } => {
                for &m in members {
                    f(m);
                }
            }
            NullableAnnotation { inner } => f(*inner),
            ArrayAnnotation { element } => f(*element),
            FunctionAnnotation { params, return_type } => {
                for &p in params {
                    f(p);
                }
                f(*return_type);
            }
            FunctionTypeParam { annotation, .. } => f(*annotation),
            ExactObjectAnnotation { fields } => {
                for &fld in fields {
                    f(fld);
                }
            }
            ObjectTypeField { annotation, .. } => f(*annotation),
            TypeParams { params } => {
                for &p in params {
                    f(p);
                }
            }
            TypeParam { name } => f(*name),
            TypeArgs { args } => {
                for &a in args {
                    f(a);
                }
            }
        }
    }

    /// Rewrite the edge `parent -> old_child` to point at `new_child`.
    /// Used by the checker to splice implicit cast wrappers in place.
    /// \return true if the edge was found and rewritten.
    pub fn replace_child(&mut self, parent: NodeId, old_child: NodeId, new_child: NodeId) -> bool {
        let mut replaced = false;
        let mut visit = |slot: &mut NodeId| {
            if *slot == old_child && !replaced {
                *slot = new_child;
                replaced = true;
            }
        };
        self.for_each_child_mut(parent, &mut visit);
        replaced
    }

    /// Invoke `f` on a mutable reference to every direct child edge of `id`.
    fn for_each_child_mut(&mut self, id: NodeId, f: &mut impl FnMut(&mut NodeId)) {
        // Temporarily move the kind out to sidestep aliasing of the arena.
        let mut kind =
            std::mem::replace(&mut self.nodes[id.0 as usize].kind, NodeKind::EmptyStatement);
        Ast::remap_edges(&mut kind, f);
        self.nodes[id.0 as usize].kind = kind;
    }

    /// Invoke `f` on a mutable reference to every child edge of a detached
    /// `kind`. Subtree cloning remaps edges on kinds it has not yet inserted
    /// into the arena.
    pub(crate) fn remap_edges(kind: &mut NodeKind, f: &mut impl FnMut(&mut NodeId)) {
        use NodeKind::*;
        match kind {
            Program { body } | Block { body } => body.iter_mut().for_each(f),
            VariableDeclaration { declarators, .. } => declarators.iter_mut().for_each(f),
            VariableDeclarator { id, init } => {
                f(id);
                if let Some(init) = init {
                    f(init);
                }
            }
            FunctionDeclaration { id, type_params, params, return_type, body, .. } => {
                f(id);
                if let Some(tp) = type_params {
                    f(tp);
                }
                params.iter_mut().for_each(&mut *f);
                if let Some(rt) = return_type {
                    f(rt);
                }
                f(body);
            }
            ClassDeclaration { id, type_params, super_class, super_type_args, body } => {
                f(id);
                if let Some(tp) = type_params {
                    f(tp);
                }
                if let Some(sc) = super_class {
                    f(sc);
                }
                if let Some(sta) = super_type_args {
                    f(sta);
                }
                f(body);
            }
            ClassExpression { id, type_params, super_class, super_type_args, body } => {
                if let Some(id) = id {
                    f(id);
                }
                if let Some(tp) = type_params {
                    f(tp);
                }
                if let Some(sc) = super_class {
                    f(sc);
                }
                if let Some(sta) = super_type_args {
                    f(sta);
                }
                f(body);
            }
            ClassBody { members } => members.iter_mut().for_each(f),
            ClassProperty { key, type_annotation, value, .. } => {
                f(key);
                if let Some(t) = type_annotation {
                    f(t);
                }
                if let Some(v) = value {
                    f(v);
                }
            }
            MethodDefinition { key, value, .. } => {
                f(key);
                f(value);
            }
            TypeAliasDeclaration { id, type_params, right } => {
                f(id);
                if let Some(tp) = type_params {
                    f(tp);
                }
                f(right);
            }
            ImportDeclaration { specifiers, .. } => specifiers.iter_mut().for_each(f),
            ImportSpecifier { local } => f(local),
            Identifier { annotation, .. } => {
                if let Some(a) = annotation {
                    f(a);
                }
            }
            EmptyStatement | Elision | NumberLiteral { .. } | StringLiteral { .. }
            | BooleanLiteral { .. } | NullLiteral | BigIntLiteral { .. } | This | Super
            | NewTarget | PrimitiveAnnotation { .. } => {}
            ExpressionStatement { expression } => f(expression),
            IfStatement { test, consequent, alternate } => {
                f(test);
                f(consequent);
                if let Some(alt) = alternate {
                    f(alt);
                }
            }
            WhileStatement { test, body } => {
                f(test);
                f(body);
            }
            DoWhileStatement { body, test } => {
                f(body);
                f(test);
            }
            ForStatement { init, test, update, body } => {
                if let Some(i) = init {
                    f(i);
                }
                if let Some(t) = test {
                    f(t);
                }
                if let Some(u) = update {
                    f(u);
                }
                f(body);
            }
            ForInStatement { left, right, body } | ForOfStatement { left, right, body } => {
                f(left);
                f(right);
                f(body);
            }
            SwitchStatement { discriminant, cases } => {
                f(discriminant);
                cases.iter_mut().for_each(f);
            }
            SwitchCase { test, consequent } => {
                if let Some(t) = test {
                    f(t);
                }
                consequent.iter_mut().for_each(f);
            }
            ReturnStatement { argument } => {
                if let Some(a) = argument {
                    f(a);
                }
            }
            BreakStatement { label } | ContinueStatement { label } => {
                if let Some(l) = label {
                    f(l);
                }
            }
            LabeledStatement { label, body } => {
                f(label);
                f(body);
            }
            ThrowStatement { argument } => f(argument),
            TryStatement { block, handler, finalizer } => {
                f(block);
                if let Some(h) = handler {
                    f(h);
                }
                if let Some(fin) = finalizer {
                    f(fin);
                }
            }
            CatchClause { param, body } => {
                if let Some(p) = param {
                    f(p);
                }
                f(body);
            }
            TemplateLiteral { expressions, .. } => expressions.iter_mut().for_each(f),
            ArrayExpression { elements } | ArrayPattern { elements }
            | TupleAnnotation { elements } => elements.iter_mut().for_each(f),
            ObjectExpression { properties } | ObjectPattern { properties } => {
                properties.iter_mut().for_each(f)
            }
            Property { key, value, .. } => {
                f(key);
                f(value);
            }
            UnaryExpression { argument, .. }
            | UpdateExpression { argument, .. }
            | SpreadElement { argument }
            | AwaitExpression { argument }
            | ImplicitCheckedCast { argument }
            | RestElement { argument } => f(argument),
            BinaryExpression { left, right, .. }
            | LogicalExpression { left, right, .. }
            | AssignmentExpression { left, right, .. }
            | AssignmentPattern { left, right } => {
                f(left);
                f(right);
            }
            ConditionalExpression { test, consequent, alternate } => {
                f(test);
                f(consequent);
                f(alternate);
            }
            CallExpression { callee, type_args, arguments }
            | NewExpression { callee, type_args, arguments } => {
                f(callee);
                if let Some(ta) = type_args {
                    f(ta);
                }
                arguments.iter_mut().for_each(&mut *f);
            }
            MemberExpression { object, property, .. } => {
                f(object);
                f(property);
            }
            SequenceExpression { expressions } => expressions.iter_mut().for_each(f),
            FunctionExpression { id, params, return_type, body, .. } => {
                if let Some(id) = id {
                    f(id);
                }
                params.iter_mut().for_each(&mut *f);
                if let Some(rt) = return_type {
                    f(rt);
                }
                f(body);
            }
            ArrowFunction { params, return_type, body, .. } => {
                params.iter_mut().for_each(&mut *f);
                if let Some(rt) = return_type {
                    f(rt);
                }
                f(body);
            }
            YieldExpression { argument, .. } => {
                if let Some(a) = argument {
                    f(a);
                }
            }
            NamedAnnotation { id, type_args } => {
                f(id);
                if let Some(ta) = type_args {
                    f(ta);
                }
            }
            UnionAnnotation { members } => members.iter_mut().for_each(f),
            NullableAnnotation { inner } => f(inner),
            ArrayAnnotation { element } => f(element),
            FunctionAnnotation { params, return_type } => {
                params.iter_mut().for_each(&mut *f);
                f(return_type);
            }
            FunctionTypeParam { annotation, .. } => f(annotation),
            ExactObjectAnnotation { fields } => fields.iter_mut().for_each(f),
            ObjectTypeField { annotation, .. } => f(annotation),
            TypeParams { params } => params.iter_mut().for_each(f),
            TypeParam { name } => f(name),
            TypeArgs { args } => args.iter_mut().for_each(f),
        }
    }

    /// Insert `new_stmt` into the statement list of `parent` (a `Program` or
    /// `Block`) directly after `after`, or at the end if `after` is absent
    /// from the list. Used to position cloned generic specializations after
    /// their template.
    pub fn insert_stmt_after(&mut self, parent: NodeId, after: NodeId, new_stmt: NodeId) {
        let body = match &mut self.nodes[parent.0 as usize].kind {
            NodeKind::Program { body } | NodeKind::Block { body } => body,
            _ => panic!("insert_stmt_after: parent is not a statement list"),
        };
        match body.iter().position(|&s| s == after) {
            Some(pos) => body.insert(pos + 1, new_stmt),
            None => body.push(new_stmt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_children() {
        let mut ast = Ast::new();
        let name = ast.names.intern("x");
        let id = ast.alloc(NodeKind::Identifier { name, annotation: None }, Span::dummy());
        let init = ast.alloc(NodeKind::NumberLiteral { value: 1.0 }, Span::dummy());
        let declarator = ast.alloc(
            NodeKind::VariableDeclarator { id, init: Some(init) },
            Span::dummy(),
        );
        assert_eq!(ast.children(declarator), vec![id, init]);
        assert_eq!(ast.ident_name(id), Some(name));
    }

    #[test]
    fn test_replace_child() {
        let mut ast = Ast::new();
        let name = ast.names.intern("a");
        let arg = ast.alloc(NodeKind::Identifier { name, annotation: None }, Span::dummy());
        let ret = ast.alloc(NodeKind::ReturnStatement { argument: Some(arg) }, Span::dummy());
        let cast = ast.alloc(NodeKind::ImplicitCheckedCast { argument: arg }, Span::dummy());
        assert!(ast.replace_child(ret, arg, cast));
        assert_eq!(ast.children(ret), vec![cast]);
        assert_eq!(ast.children(cast), vec![arg]);
    }

    #[test]
    fn test_insert_stmt_after() {
        let mut ast = Ast::new();
        let a = ast.alloc(NodeKind::EmptyStatement, Span::dummy());
        let b = ast.alloc(NodeKind::EmptyStatement, Span::dummy());
        let program = ast.alloc(NodeKind::Program { body: vec![a, b] }, Span::dummy());
        let c = ast.alloc(NodeKind::EmptyStatement, Span::dummy());
        ast.insert_stmt_after(program, a, c);
        assert_eq!(ast.children(program), vec![a, c, b]);
    }
}
