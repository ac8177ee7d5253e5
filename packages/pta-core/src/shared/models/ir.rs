//! Program model ("Scene")
//!
//! The intermediate representation the pointer analysis consumes. A Scene
//! is a whole program: classes with superclass links and per-name method
//! tables, methods with parameter lists and a single canonical `this`
//! local, and flat statement lists per method body. Producing a Scene
//! (parsing, lowering, CFG construction) is a collaborator's job; this
//! crate only reads it.
//!
//! Identities are dense integer ids (`FuncId`, `ClassId`, `ValueId`, ...)
//! used as map keys and array indices, never pointers.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Dense function identifier
pub type FuncId = u32;
/// Dense class identifier
pub type ClassId = u32;
/// Dense program-value identifier (locals, params, `this`, static fields)
pub type ValueId = u32;
/// Interned field-name identifier
pub type FieldId = u32;
/// Global statement identifier
pub type StmtId = u32;
/// Allocation-site identifier (one per `new` expression)
pub type AllocSiteId = u32;

/// Declared static type of a value, as far as the IR producer knows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeHint {
    /// No static type information
    Unknown,

    /// Reference to a class instance
    Class(ClassId),

    /// Function value (closure, method reference)
    Function,

    /// Non-reference type; carries no points-to information
    Primitive,
}

impl Default for TypeHint {
    fn default() -> Self {
        TypeHint::Unknown
    }
}

/// What kind of program value a `ValueId` names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// Ordinary method-body local
    Local,

    /// Formal parameter
    Param,

    /// The canonical `this` local of a method body
    This,

    /// A static field of a class (global value)
    StaticField { class: ClassId },
}

/// A named program value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueDef {
    pub id: ValueId,
    pub name: String,
    pub kind: ValueKind,
    /// Owning function; `None` for static fields
    pub func: Option<FuncId>,
    pub declared_type: TypeHint,
}

/// A class with its superclass link and method table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDef {
    pub id: ClassId,
    pub name: String,
    pub super_class: Option<ClassId>,
    /// Method short name → function, for dynamic dispatch lookup
    pub methods: FxHashMap<String, FuncId>,
}

/// A method. `body: None` marks an SDK method whose implementation is not
/// part of the program under analysis; calls to it are modeled with a
/// fabricated return object instead of being analyzed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDef {
    pub id: FuncId,
    pub signature: String,
    pub class: Option<ClassId>,
    pub params: Vec<ValueId>,
    /// Single canonical `this` local of the body, if the method has one
    pub this_local: Option<ValueId>,
    /// Intrinsics are body-less methods whose receiver binding still matters
    pub is_intrinsic: bool,
    pub body: Option<Vec<Stmt>>,
}

impl MethodDef {
    /// True if the method has no analyzable body.
    #[inline]
    pub fn is_sdk(&self) -> bool {
        self.body.is_none()
    }
}

/// An operand position in a call or return.
///
/// `Composite` covers expressions that are neither a plain value nor a
/// constant (element accesses, arithmetic over references, spreads). They
/// are not modeled: the analysis skips them, which is a documented
/// precision loss, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operand {
    Value(ValueId),
    Constant,
    Composite,
}

/// Assignment target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LValue {
    /// Local, param, `this`, or static field
    Value(ValueId),

    /// `base.field = ...`
    InstanceField { base: ValueId, field: FieldId },
}

/// Callee position of a call expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalleeRef {
    /// Statically resolved target
    Static(FuncId),

    /// Dispatch on the receiver's runtime type; resolved during solving
    Dynamic { receiver: ValueId, method: String },
}

/// A call expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallExpr {
    pub callee: CalleeRef,
    /// Receiver of a statically-resolved instance call, if any
    pub receiver: Option<ValueId>,
    pub args: Vec<Operand>,
}

/// Assignment source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RValue {
    /// `new C()` — one allocation site per occurrence
    New { class: ClassId, site: AllocSiteId },

    /// A function value whose call targets are not statically resolved
    FuncRef { func: FuncId },

    /// Plain value read (local / param / this / static field)
    Value(ValueId),

    /// Literal constant; carries no points-to information
    Constant,

    /// `base.field`
    InstanceField { base: ValueId, field: FieldId },

    /// Call expression
    Call(CallExpr),
}

/// Statement payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StmtKind {
    Assign { lhs: LValue, rhs: RValue },
    Return { value: Option<Operand> },
}

/// A statement with its owning function and source text for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stmt {
    pub id: StmtId,
    pub func: FuncId,
    pub text: String,
    pub kind: StmtKind,
}

/// The whole program under analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    pub classes: Vec<ClassDef>,
    pub methods: Vec<MethodDef>,
    pub values: Vec<ValueDef>,
    /// Interned field names, indexed by `FieldId`
    pub fields: Vec<String>,

    #[serde(skip)]
    method_index: FxHashMap<String, FuncId>,
    #[serde(skip)]
    class_index: FxHashMap<String, ClassId>,
}

impl Scene {
    /// Rebuild the signature/name indices. Called by the builder and after
    /// deserializing a fixture.
    pub fn reindex(&mut self) {
        self.method_index = self
            .methods
            .iter()
            .map(|m| (m.signature.clone(), m.id))
            .collect();
        self.class_index = self.classes.iter().map(|c| (c.name.clone(), c.id)).collect();
    }

    #[inline]
    pub fn method(&self, func: FuncId) -> &MethodDef {
        &self.methods[func as usize]
    }

    #[inline]
    pub fn class(&self, class: ClassId) -> &ClassDef {
        &self.classes[class as usize]
    }

    #[inline]
    pub fn value(&self, value: ValueId) -> &ValueDef {
        &self.values[value as usize]
    }

    #[inline]
    pub fn field_name(&self, field: FieldId) -> &str {
        &self.fields[field as usize]
    }

    /// Method lookup by full signature.
    pub fn method_by_signature(&self, signature: &str) -> Option<FuncId> {
        self.method_index.get(signature).copied()
    }

    /// Class lookup by name.
    pub fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.class_index.get(name).copied()
    }

    /// Resolve `method` on `class`, walking the superclass chain upward.
    /// Returns `None` when no class in the chain declares the method.
    pub fn resolve_method(&self, class: ClassId, method: &str) -> Option<FuncId> {
        let mut cursor = Some(class);
        while let Some(c) = cursor {
            let def = self.class(c);
            if let Some(&func) = def.methods.get(method) {
                return Some(func);
            }
            cursor = def.super_class;
        }
        None
    }

    /// Statements of a method body; empty for SDK methods.
    pub fn statements(&self, func: FuncId) -> &[Stmt] {
        self.method(func)
            .body
            .as_deref()
            .unwrap_or(&[])
    }

    /// Short, human-readable description of a statement for diagnostics.
    pub fn stmt_text(&self, func: FuncId, stmt: StmtId) -> String {
        self.statements(func)
            .iter()
            .find(|s| s.id == stmt)
            .map(|s| s.text.clone())
            .unwrap_or_else(|| format!("<stmt {}>", stmt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(id: ClassId, name: &str, super_class: Option<ClassId>) -> ClassDef {
        ClassDef {
            id,
            name: name.to_string(),
            super_class,
            methods: FxHashMap::default(),
        }
    }

    #[test]
    fn test_superclass_method_resolution() {
        let mut base = class(0, "Base", None);
        let derived = class(1, "Derived", Some(0));
        base.methods.insert("run".to_string(), 7);

        let mut scene = Scene {
            classes: vec![base, derived],
            ..Default::default()
        };
        scene.reindex();

        assert_eq!(scene.resolve_method(1, "run"), Some(7));
        assert_eq!(scene.resolve_method(1, "missing"), None);
    }

    #[test]
    fn test_override_shadows_super() {
        let mut base = class(0, "Base", None);
        let mut derived = class(1, "Derived", Some(0));
        base.methods.insert("run".to_string(), 7);
        derived.methods.insert("run".to_string(), 9);

        let mut scene = Scene {
            classes: vec![base, derived],
            ..Default::default()
        };
        scene.reindex();

        assert_eq!(scene.resolve_method(1, "run"), Some(9));
        assert_eq!(scene.resolve_method(0, "run"), Some(7));
    }

    #[test]
    fn test_reindex_after_deserialize() {
        let mut scene = Scene::default();
        scene.methods.push(MethodDef {
            id: 0,
            signature: "main()".to_string(),
            class: None,
            params: vec![],
            this_local: None,
            is_intrinsic: false,
            body: Some(vec![]),
        });
        scene.reindex();

        let json = serde_json::to_string(&scene).unwrap();
        let mut restored: Scene = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.method_by_signature("main()"), None); // index skipped
        restored.reindex();
        assert_eq!(restored.method_by_signature("main()"), Some(0));
    }
}
