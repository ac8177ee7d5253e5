//! End-to-end properties of the pointer analysis, exercised through the
//! public facade over small hand-built Scenes.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use pta_core::shared::models::ir::{ClassId, Operand, Scene, TypeHint, ValueId};
use pta_core::{AliasOracle, PointerAnalysis, PtaConfig, PtaResult, SceneBuilder};

fn analyze(scene: &Scene, config: PtaConfig) -> PtaResult {
    PointerAnalysis::with_config(scene, config)
        .run_entry_signatures(&["main()"])
        .unwrap()
}

fn analyze_default(scene: &Scene) -> PtaResult {
    analyze(scene, PtaConfig::default())
}

#[test]
fn alias_oracle_on_allocations_and_copies() {
    let mut b = SceneBuilder::new();
    let a = b.class("A", None);
    let main = b.method("main", None);
    let x = b.local(main, "x");
    let y = b.local(main, "y");
    let z = b.local(main, "z");
    b.assign_new(main, x, a);
    b.assign_new(main, y, a);
    b.assign_copy(main, z, x);
    let scene = b.build();

    let result = analyze_default(&scene);
    // Distinct allocation sites never alias, even with the same class.
    assert!(result.no_alias(x, y));
    // A copy shares the allocation.
    assert!(result.may_alias(x, z));
    assert!(result.no_alias(y, z));
}

#[test]
fn context_separation_with_k1() {
    // id(p) { return p } called from two sites with different arguments;
    // with k >= 1 the two parameter instances stay apart.
    let mut b = SceneBuilder::new();
    let ca = b.class("A", None);
    let cb = b.class("B", None);
    let id = b.method("id", None);
    let p = b.param(id, "p");
    b.ret(id, Some(p));

    let main = b.method("main", None);
    let x = b.local(main, "x");
    let y = b.local(main, "y");
    let rx = b.local(main, "rx");
    let ry = b.local(main, "ry");
    b.assign_new(main, x, ca);
    b.assign_new(main, y, cb);
    b.call_static(main, Some(rx), id, None, vec![Operand::Value(x)]);
    b.call_static(main, Some(ry), id, None, vec![Operand::Value(y)]);
    let scene = b.build();

    let result = analyze(&scene, PtaConfig { k_limit: 1, ..Default::default() });
    assert_eq!(result.pointee_classes(rx), vec![ca]);
    assert_eq!(result.pointee_classes(ry), vec![cb]);
    assert!(result.no_alias(rx, ry));
}

#[test]
fn k_zero_merges_call_sites() {
    // Same program as above under k = 0: one shared context for `id`, so
    // both returns see both objects.
    let mut b = SceneBuilder::new();
    let ca = b.class("A", None);
    let cb = b.class("B", None);
    let id = b.method("id", None);
    let p = b.param(id, "p");
    b.ret(id, Some(p));

    let main = b.method("main", None);
    let x = b.local(main, "x");
    let y = b.local(main, "y");
    let rx = b.local(main, "rx");
    let ry = b.local(main, "ry");
    b.assign_new(main, x, ca);
    b.assign_new(main, y, cb);
    b.call_static(main, Some(rx), id, None, vec![Operand::Value(x)]);
    b.call_static(main, Some(ry), id, None, vec![Operand::Value(y)]);
    let scene = b.build();

    let result = analyze(&scene, PtaConfig { k_limit: 0, ..Default::default() });
    assert_eq!(result.pointee_classes(rx), vec![ca, cb]);
    assert!(result.may_alias(rx, ry));
}

#[test]
fn field_facts_flow_between_functions() {
    // set(b, v) { b.f = v } ; get(b) { r = b.f; return r }
    let mut b = SceneBuilder::new();
    let boxc = b.class("Box", None);
    let vc = b.class("V", None);

    let set = b.method("set", None);
    let sb = b.param(set, "b");
    let sv = b.param(set, "v");
    b.assign_store(set, sb, "f", sv);

    let get = b.method("get", None);
    let gb = b.param(get, "b");
    let gr = b.local(get, "r");
    b.assign_load(get, gr, gb, "f");
    b.ret(get, Some(gr));

    let main = b.method("main", None);
    let bx = b.local(main, "bx");
    let val = b.local(main, "val");
    let out = b.local(main, "out");
    b.assign_new(main, bx, boxc);
    b.assign_new(main, val, vc);
    b.call_static(main, None, set, None, vec![Operand::Value(bx), Operand::Value(val)]);
    b.call_static(main, Some(out), get, None, vec![Operand::Value(bx)]);
    let scene = b.build();

    let result = analyze_default(&scene);
    assert_eq!(result.pointee_classes(out), vec![vc]);
}

#[test]
fn dynamic_dispatch_through_inherited_method() {
    // `run` declared on Base only; a Derived receiver resolves it by
    // walking the superclass chain.
    let mut b = SceneBuilder::new();
    let base = b.class("Base", None);
    let derived = b.class("Derived", Some(base));
    let rc = b.class("R", None);

    let run = b.method("run", Some(base));
    let rr = b.local(run, "rr");
    b.assign_new(run, rr, rc);
    b.ret(run, Some(rr));

    let main = b.method("main", None);
    let o = b.local(main, "o");
    let out = b.local(main, "out");
    b.assign_new(main, o, derived);
    b.call_dynamic(main, Some(out), o, "run", vec![]);
    let scene = b.build();

    let result = analyze_default(&scene);
    assert_eq!(result.pointee_classes(out), vec![rc]);
    assert_eq!(result.stats.dyn_edges_resolved, 1);
}

#[test]
fn function_value_call_dispatches_to_its_target() {
    // make() { m = new A; return m } ; f = make; out = f()
    let mut b = SceneBuilder::new();
    let a = b.class("A", None);
    let make = b.method("make", None);
    let m = b.local(make, "m");
    b.assign_new(make, m, a);
    b.ret(make, Some(m));

    let main = b.method("main", None);
    let f = b.local(main, "f");
    let out = b.local(main, "out");
    b.assign_func_ref(main, f, make);
    b.call_dynamic(main, Some(out), f, "call", vec![]);
    let scene = b.build();

    let result = analyze_default(&scene);
    assert_eq!(result.pointee_classes(out), vec![a]);
}

#[test]
fn receiver_binds_this_local() {
    // class C { tag() { t = this; return t } } ; o = new C; out = o.tag()
    let mut b = SceneBuilder::new();
    let c = b.class("C", None);
    let tag = b.method("tag", Some(c));
    let this = b.this(tag);
    let t = b.local(tag, "t");
    b.assign_copy(tag, t, this);
    b.ret(tag, Some(t));

    let main = b.method("main", None);
    let o = b.local(main, "o");
    let out = b.local(main, "out");
    b.assign_new(main, o, c);
    b.call_dynamic(main, Some(out), o, "tag", vec![]);
    let scene = b.build();

    let result = analyze_default(&scene);
    assert_eq!(result.pointee_classes(out), vec![c]);
    assert!(result.may_alias(o, out));
}

#[test]
fn closure_argument_fallback_resolves_missing_method() {
    // `apply` is not declared anywhere on C; the single function-typed
    // argument supplies the callee instead.
    let mut b = SceneBuilder::new();
    let a = b.class("A", None);
    let c = b.class("C", None);
    let make = b.method("make", None);
    let m = b.local(make, "m");
    b.assign_new(make, m, a);
    b.ret(make, Some(m));

    let main = b.method("main", None);
    let o = b.local(main, "o");
    let cb = b.typed_local(main, "cb", TypeHint::Function);
    let out = b.local(main, "out");
    b.assign_new(main, o, c);
    b.assign_func_ref(main, cb, make);
    b.call_dynamic(main, Some(out), o, "apply", vec![Operand::Value(cb)]);
    let scene = b.build();

    let result = analyze_default(&scene);
    assert_eq!(result.pointee_classes(out), vec![a]);
}

#[test]
fn unresolvable_dispatch_is_silent() {
    let mut b = SceneBuilder::new();
    let c = b.class("C", None);
    let main = b.method("main", None);
    let o = b.local(main, "o");
    let out = b.local(main, "out");
    b.assign_new(main, o, c);
    b.call_dynamic(main, Some(out), o, "missing", vec![]);
    let scene = b.build();

    let result = analyze_default(&scene);
    assert_eq!(result.points_to(out).len(), 0);
    assert_eq!(result.stats.dyn_edges_resolved, 0);
}

#[test]
fn capped_run_is_a_subset_of_the_fixpoint() {
    // Monotonicity: stopping early never reports facts the full fixpoint
    // lacks.
    let mut b = SceneBuilder::new();
    let a = b.class("A", None);
    let id = b.method("id", None);
    let p = b.param(id, "p");
    b.ret(id, Some(p));
    let main = b.method("main", None);
    let x = b.local(main, "x");
    let y = b.local(main, "y");
    let z = b.local(main, "z");
    b.assign_new(main, x, a);
    b.call_static(main, Some(y), id, None, vec![Operand::Value(x)]);
    b.call_static(main, Some(z), id, None, vec![Operand::Value(y)]);
    let scene = b.build();

    let capped = analyze(&scene, PtaConfig { max_rounds: 1, ..Default::default() });
    let full = analyze_default(&scene);
    for v in [x, y, z] {
        let partial = capped.points_to(v);
        let complete = full.points_to(v);
        assert!(partial.is_subset(&complete));
    }
    assert_eq!(full.pointee_classes(z), vec![a]);
}

#[test]
fn static_field_base_supports_store_and_load() {
    // The base of a field access is itself a static field:
    // s = o; s.f = v; r = s.f. The load must observe the store.
    let mut b = SceneBuilder::new();
    let oc = b.class("O", None);
    let vc = b.class("V", None);
    let holder = b.class("Holder", None);
    let s = b.static_field(holder, "slot");

    let main = b.method("main", None);
    let o = b.local(main, "o");
    let v = b.local(main, "v");
    let r = b.local(main, "r");
    b.assign_new(main, o, oc);
    b.assign_new(main, v, vc);
    b.assign_copy(main, s, o);
    b.assign_store(main, s, "f", v);
    b.assign_load(main, r, s, "f");
    let scene = b.build();

    let result = analyze_default(&scene);
    assert_eq!(result.pointee_classes(r), vec![vc]);
    assert!(result.may_alias(r, v));
}

#[test]
fn static_fields_carry_facts_between_functions() {
    let mut b = SceneBuilder::new();
    let c = b.class("C", None);
    let holder = b.class("Holder", None);
    let shared = b.static_field(holder, "shared");

    let producer = b.method("produce", None);
    let pv = b.local(producer, "pv");
    b.assign_new(producer, pv, c);
    b.assign_copy(producer, shared, pv);

    let main = b.method("main", None);
    let out = b.local(main, "out");
    b.call_static(main, None, producer, None, vec![]);
    b.assign_copy(main, out, shared);
    let scene = b.build();

    let result = analyze_default(&scene);
    assert_eq!(result.pointee_classes(out), vec![c]);
}

// === Randomized soundness ===

/// A straight-line program of allocations and copies, plus the expected
/// classes per local computed by naive transitive closure.
fn copy_program(ops: Vec<(bool, u8, u8)>) -> (Scene, Vec<ValueId>, Vec<Vec<ClassId>>) {
    const LOCALS: usize = 6;
    let mut b = SceneBuilder::new();
    let classes: Vec<ClassId> = (0..4).map(|i| b.class(&format!("K{}", i), None)).collect();
    let main = b.method("main", None);
    let locals: Vec<ValueId> = (0..LOCALS)
        .map(|i| b.local(main, &format!("v{}", i)))
        .collect();

    let mut expected: Vec<std::collections::BTreeSet<ClassId>> =
        vec![Default::default(); LOCALS];
    for (is_alloc, dst, src) in ops {
        let dst = dst as usize % LOCALS;
        if is_alloc {
            let class = classes[src as usize % classes.len()];
            b.assign_new(main, locals[dst], class);
            expected[dst].insert(class);
        } else {
            let src = src as usize % LOCALS;
            b.assign_copy(main, locals[dst], locals[src]);
        }
    }
    (b.build(), locals, expected.into_iter().map(|s| s.into_iter().collect()).collect())
}

proptest! {
    #[test]
    fn allocations_always_reach_their_local(
        ops in proptest::collection::vec((any::<bool>(), any::<u8>(), any::<u8>()), 1..20)
    ) {
        // Reference model: start from direct allocations, then close over
        // copy edges until stable, order-independent like the analysis.
        const LOCALS: usize = 6;
        let (scene, locals, direct) = copy_program(ops.clone());
        let mut expected: Vec<std::collections::BTreeSet<ClassId>> = direct
            .iter()
            .map(|v| v.iter().copied().collect())
            .collect();
        loop {
            let mut changed = false;
            for &(is_alloc, dst, src) in &ops {
                if is_alloc {
                    continue;
                }
                let dst = dst as usize % LOCALS;
                let src = src as usize % LOCALS;
                let add: Vec<ClassId> = expected[src].iter().copied().collect();
                for c in add {
                    changed |= expected[dst].insert(c);
                }
            }
            if !changed {
                break;
            }
        }

        let result = analyze_default(&scene);
        for (i, &v) in locals.iter().enumerate() {
            let got: Vec<ClassId> = result.pointee_classes(v);
            let want: Vec<ClassId> = expected[i].iter().copied().collect();
            prop_assert_eq!(got, want);
        }
    }
}
