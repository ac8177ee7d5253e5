//! Scene construction utility
//!
//! Get-or-create style builder for assembling Scenes programmatically.
//! Fixture tests and the bench CLI use it; a real frontend would emit the
//! same structures from lowered source.

use super::ir::*;
use rustc_hash::FxHashMap;

/// Incremental Scene builder with interning for fields.
#[derive(Debug, Default)]
pub struct SceneBuilder {
    scene: Scene,
    field_index: FxHashMap<String, FieldId>,
    next_stmt: StmtId,
    next_site: AllocSiteId,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a class.
    pub fn class(&mut self, name: &str, super_class: Option<ClassId>) -> ClassId {
        let id = self.scene.classes.len() as ClassId;
        self.scene.classes.push(ClassDef {
            id,
            name: name.to_string(),
            super_class,
            methods: FxHashMap::default(),
        });
        id
    }

    /// Intern a field name.
    pub fn field(&mut self, name: &str) -> FieldId {
        if let Some(&id) = self.field_index.get(name) {
            return id;
        }
        let id = self.scene.fields.len() as FieldId;
        self.scene.fields.push(name.to_string());
        self.field_index.insert(name.to_string(), id);
        id
    }

    fn new_method(&mut self, name: &str, class: Option<ClassId>, body: Option<Vec<Stmt>>) -> FuncId {
        let id = self.scene.methods.len() as FuncId;
        let signature = match class {
            Some(c) => format!("{}.{}()", self.scene.classes[c as usize].name, name),
            None => format!("{}()", name),
        };
        self.scene.methods.push(MethodDef {
            id,
            signature,
            class,
            params: vec![],
            this_local: None,
            is_intrinsic: false,
            body,
        });
        if let Some(c) = class {
            self.scene.classes[c as usize]
                .methods
                .insert(name.to_string(), id);
        }
        id
    }

    /// Declare a method with an (initially empty) body.
    pub fn method(&mut self, name: &str, class: Option<ClassId>) -> FuncId {
        self.new_method(name, class, Some(vec![]))
    }

    /// Declare an SDK method: no body, calls are modeled with a fabricated
    /// return object.
    pub fn sdk_method(&mut self, name: &str, class: Option<ClassId>) -> FuncId {
        self.new_method(name, class, None)
    }

    /// Declare an intrinsic: body-less like an SDK method, but its receiver
    /// binding is still modeled.
    pub fn intrinsic_method(&mut self, name: &str, class: Option<ClassId>) -> FuncId {
        let id = self.new_method(name, class, None);
        self.scene.methods[id as usize].is_intrinsic = true;
        id
    }

    fn new_value(&mut self, name: &str, kind: ValueKind, func: Option<FuncId>, ty: TypeHint) -> ValueId {
        let id = self.scene.values.len() as ValueId;
        self.scene.values.push(ValueDef {
            id,
            name: name.to_string(),
            kind,
            func,
            declared_type: ty,
        });
        id
    }

    /// Declare a method-body local.
    pub fn local(&mut self, func: FuncId, name: &str) -> ValueId {
        self.new_value(name, ValueKind::Local, Some(func), TypeHint::Unknown)
    }

    /// Declare a local with a declared static type.
    pub fn typed_local(&mut self, func: FuncId, name: &str, ty: TypeHint) -> ValueId {
        self.new_value(name, ValueKind::Local, Some(func), ty)
    }

    /// Declare a formal parameter (appended to the method's param list).
    pub fn param(&mut self, func: FuncId, name: &str) -> ValueId {
        let id = self.new_value(name, ValueKind::Param, Some(func), TypeHint::Unknown);
        self.scene.methods[func as usize].params.push(id);
        id
    }

    /// Declare the canonical `this` local of a method body.
    pub fn this(&mut self, func: FuncId) -> ValueId {
        let id = self.new_value("this", ValueKind::This, Some(func), TypeHint::Unknown);
        self.scene.methods[func as usize].this_local = Some(id);
        id
    }

    /// Declare a static field of a class.
    pub fn static_field(&mut self, class: ClassId, name: &str) -> ValueId {
        self.new_value(
            name,
            ValueKind::StaticField { class },
            None,
            TypeHint::Unknown,
        )
    }

    fn push_stmt(&mut self, func: FuncId, text: String, kind: StmtKind) -> StmtId {
        let id = self.next_stmt;
        self.next_stmt += 1;
        let body = self.scene.methods[func as usize]
            .body
            .as_mut()
            .expect("cannot append statements to an SDK method");
        body.push(Stmt {
            id,
            func,
            text,
            kind,
        });
        id
    }

    fn value_name(&self, v: ValueId) -> String {
        self.scene.values[v as usize].name.clone()
    }

    /// `lhs = new C()`
    pub fn assign_new(&mut self, func: FuncId, lhs: ValueId, class: ClassId) -> StmtId {
        let site = self.next_site;
        self.next_site += 1;
        let text = format!(
            "{} = new {}",
            self.value_name(lhs),
            self.scene.classes[class as usize].name
        );
        self.push_stmt(
            func,
            text,
            StmtKind::Assign {
                lhs: LValue::Value(lhs),
                rhs: RValue::New { class, site },
            },
        )
    }

    /// `lhs = f` (function value)
    pub fn assign_func_ref(&mut self, func: FuncId, lhs: ValueId, target: FuncId) -> StmtId {
        let text = format!(
            "{} = {}",
            self.value_name(lhs),
            self.scene.methods[target as usize].signature
        );
        self.push_stmt(
            func,
            text,
            StmtKind::Assign {
                lhs: LValue::Value(lhs),
                rhs: RValue::FuncRef { func: target },
            },
        )
    }

    /// `lhs = rhs`
    pub fn assign_copy(&mut self, func: FuncId, lhs: ValueId, rhs: ValueId) -> StmtId {
        let text = format!("{} = {}", self.value_name(lhs), self.value_name(rhs));
        self.push_stmt(
            func,
            text,
            StmtKind::Assign {
                lhs: LValue::Value(lhs),
                rhs: RValue::Value(rhs),
            },
        )
    }

    /// `lhs = <constant>`
    pub fn assign_const(&mut self, func: FuncId, lhs: ValueId) -> StmtId {
        let text = format!("{} = <const>", self.value_name(lhs));
        self.push_stmt(
            func,
            text,
            StmtKind::Assign {
                lhs: LValue::Value(lhs),
                rhs: RValue::Constant,
            },
        )
    }

    /// `lhs = base.field`
    pub fn assign_load(&mut self, func: FuncId, lhs: ValueId, base: ValueId, field: &str) -> StmtId {
        let field = self.field(field);
        let text = format!(
            "{} = {}.{}",
            self.value_name(lhs),
            self.value_name(base),
            self.scene.fields[field as usize]
        );
        self.push_stmt(
            func,
            text,
            StmtKind::Assign {
                lhs: LValue::Value(lhs),
                rhs: RValue::InstanceField { base, field },
            },
        )
    }

    /// `base.field = rhs`
    pub fn assign_store(&mut self, func: FuncId, base: ValueId, field: &str, rhs: ValueId) -> StmtId {
        let field = self.field(field);
        let text = format!(
            "{}.{} = {}",
            self.value_name(base),
            self.scene.fields[field as usize],
            self.value_name(rhs)
        );
        self.push_stmt(
            func,
            text,
            StmtKind::Assign {
                lhs: LValue::InstanceField { base, field },
                rhs: RValue::Value(rhs),
            },
        )
    }

    /// `lhs = callee(args)` with a statically known target.
    pub fn call_static(
        &mut self,
        func: FuncId,
        lhs: Option<ValueId>,
        callee: FuncId,
        receiver: Option<ValueId>,
        args: Vec<Operand>,
    ) -> StmtId {
        let text = format!(
            "{}{}(..)",
            lhs.map(|l| format!("{} = ", self.value_name(l))).unwrap_or_default(),
            self.scene.methods[callee as usize].signature
        );
        // A call without a destination still needs an Assign shape; use a
        // throwaway local so the statement stays uniform.
        let lhs = match lhs {
            Some(v) => LValue::Value(v),
            None => {
                let tmp = self.local(func, "_");
                LValue::Value(tmp)
            }
        };
        self.push_stmt(
            func,
            text,
            StmtKind::Assign {
                lhs,
                rhs: RValue::Call(CallExpr {
                    callee: CalleeRef::Static(callee),
                    receiver,
                    args,
                }),
            },
        )
    }

    /// `lhs = receiver.method(args)` resolved during solving.
    pub fn call_dynamic(
        &mut self,
        func: FuncId,
        lhs: Option<ValueId>,
        receiver: ValueId,
        method: &str,
        args: Vec<Operand>,
    ) -> StmtId {
        let text = format!(
            "{}{}.{}(..)",
            lhs.map(|l| format!("{} = ", self.value_name(l))).unwrap_or_default(),
            self.value_name(receiver),
            method
        );
        let lhs = match lhs {
            Some(v) => LValue::Value(v),
            None => {
                let tmp = self.local(func, "_");
                LValue::Value(tmp)
            }
        };
        self.push_stmt(
            func,
            text,
            StmtKind::Assign {
                lhs,
                rhs: RValue::Call(CallExpr {
                    callee: CalleeRef::Dynamic {
                        receiver,
                        method: method.to_string(),
                    },
                    receiver: Some(receiver),
                    args,
                }),
            },
        )
    }

    /// `return v` / bare `return`
    pub fn ret(&mut self, func: FuncId, value: Option<ValueId>) -> StmtId {
        let text = match value {
            Some(v) => format!("return {}", self.value_name(v)),
            None => "return".to_string(),
        };
        self.push_stmt(
            func,
            text,
            StmtKind::Return {
                value: value.map(Operand::Value),
            },
        )
    }

    /// Finalize: build lookup indices and hand the Scene over.
    pub fn build(mut self) -> Scene {
        self.scene.reindex();
        self.scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_indexed_scene() {
        let mut b = SceneBuilder::new();
        let a = b.class("A", None);
        let main = b.method("main", None);
        let x = b.local(main, "x");
        b.assign_new(main, x, a);

        let scene = b.build();
        assert_eq!(scene.method_by_signature("main()"), Some(main));
        assert_eq!(scene.class_by_name("A"), Some(a));
        assert_eq!(scene.statements(main).len(), 1);
    }

    #[test]
    fn test_field_interning_dedups() {
        let mut b = SceneBuilder::new();
        let f1 = b.field("next");
        let f2 = b.field("next");
        assert_eq!(f1, f2);
    }

    #[test]
    #[should_panic]
    fn test_sdk_method_rejects_statements() {
        let mut b = SceneBuilder::new();
        let sdk = b.sdk_method("fetch", None);
        let x = b.local(sdk, "x");
        b.assign_const(sdk, x);
    }
}
