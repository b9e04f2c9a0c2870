//! Delegate synthesis.
//!
//! The Delegate is the concrete class host code actually uses. It holds a
//! pointer to the library object (through its Interface), forwards every
//! call to it and rebinds public fields as references. Constructors reach
//! the library through factory slots that the host binds after loading, so
//! the Delegate never links against the library statically.

use serde::Serialize;

use dlwrap_core::names::{split_template, QualifiedName};

use crate::context::{GenContext, Side};
use crate::emit::CodeWriter;
use crate::interface::{
    class_head, pointer_assign_name, pointer_copy_name, protocol_for,
};
use crate::lifetime::{
    delegate_link_body, write_delegate_destructor, write_hook_definitions,
    write_protocol_definitions,
};
use crate::plan::{ClassPlan, PlannedCallable, PlannedField};
use crate::translate::{
    call_arguments, delegate_return_type, delegate_type, interface_arg_type, parameter_list,
    to_delegate_return, to_interface_arg,
};

/// Name of the static factory slot for the `index`th constructor arity.
pub fn factory_slot_name(index: usize) -> String {
    format!("__factory{index}")
}

/// A synthesized Delegate class with its out-of-class definitions.
#[derive(Debug, Clone, Serialize)]
pub struct DelegateDecl {
    pub class: String,
    pub name: QualifiedName,
    /// Factory slots, one per accepted constructor arity.
    pub factory_slots: Vec<String>,
    /// Names of the forwarding member functions, one per accepted arity.
    pub methods: Vec<String>,
    /// Public reference members, one per accepted field.
    pub fields: Vec<String>,
    /// Class declaration.
    pub declaration: String,
    /// Lifetime hooks and member definitions, written after the declaration.
    pub definitions: String,
}

impl DelegateDecl {
    pub fn code(&self) -> String {
        format!("{}\n{}", self.declaration, self.definitions)
    }
}

struct DelegateNames {
    /// Delegate class name (with template arguments).
    delegate: String,
    /// Constructor name.
    ctor: String,
    /// Interface class name.
    interface: String,
}

/// Declaration of a field's reference member.
fn field_member(ctx: &GenContext<'_>, field: &PlannedField<'_>) -> String {
    let name = &field.member.name;
    match &field.loaded {
        Some(names) if field.shadow.is_some() => {
            format!("{}*& {name}", ctx.delegate_name(names, Side::Generated))
        }
        Some(names) => {
            let mut ty = field.ty.clone();
            ty.is_reference = true;
            ty.pointer_depth = 0;
            ty.declare(&ctx.delegate_name(names, Side::Generated), name)
        }
        None => {
            let mut ty = field.ty.clone();
            ty.is_reference = true;
            ty.declare(&ctx.original_base(field.ty), name)
        }
    }
}

/// Initializer binding a field's reference member to the library object.
fn field_initializer(ctx: &GenContext<'_>, field: &PlannedField<'_>) -> String {
    let access = format!("get_BEptr()->{}()", field.accessor);
    let value = match &field.loaded {
        Some(_) if field.shadow.is_none() => {
            let mut ty = field.ty.clone();
            ty.is_reference = true;
            ty.pointer_depth = 0;
            to_delegate_return(ctx, &ty, &access)
        }
        _ => access,
    };
    format!("{}({value})", field.member.name)
}

fn method_params(ctx: &GenContext<'_>, callable: &PlannedCallable<'_>) -> String {
    parameter_list(callable.args, |ty| delegate_type(ctx, ty))
}

fn method_returns(ctx: &GenContext<'_>, callable: &PlannedCallable<'_>) -> String {
    match callable.returns() {
        Some(ty) => delegate_return_type(ctx, ty),
        None => "void".to_string(),
    }
}

fn constness(callable: &PlannedCallable<'_>) -> &'static str {
    if callable.is_const() {
        " const"
    } else {
        ""
    }
}

fn write_declaration(ctx: &GenContext<'_>, plan: &ClassPlan<'_>, n: &DelegateNames, decl: &DelegateDecl, copyable: bool, assignable: bool) -> String {
    let mut w = CodeWriter::new(ctx.indent());
    let mut bases = vec![ctx.affixes().delegate_root()];
    bases.extend(
        plan.loaded_parents()
            .filter_map(|p| p.loaded())
            .map(|names| ctx.delegate_name(names, Side::Generated)),
    );
    w.open(class_head(plan.class, &n.delegate, &bases));

    if !plan.constructors.is_empty() {
        w.line("public:");
        w.indent();
        for (slot, ctor) in decl.factory_slots.iter().zip(&plan.constructors) {
            let types: Vec<String> = ctor
                .args
                .iter()
                .map(|arg| interface_arg_type(ctx, &arg.ty, Side::Generated))
                .collect();
            w.line(format!(
                "inline static {}* (*{slot})({}) = 0;",
                n.interface,
                types.join(", ")
            ));
        }
        w.dedent();
        w.blank();
    }

    if !plan.fields.is_empty() {
        w.line("public:");
        w.indent();
        for field in &plan.fields {
            w.line(format!("{};", field_member(ctx, field)));
        }
        w.dedent();
        w.blank();
    }

    if !plan.methods.is_empty() {
        w.line("public:");
        w.indent();
        for method in &plan.methods {
            w.line(format!(
                "{} {}({}){};",
                method_returns(ctx, method),
                method.original_name(),
                method_params(ctx, method),
                constness(method)
            ));
        }
        w.dedent();
        w.blank();
    }

    let ctor = &n.ctor;
    let delegate = &n.delegate;
    w.line("public:");
    w.indent();
    for constructor in &plan.constructors {
        w.line(format!("{ctor}({});", method_params(ctx, constructor)));
    }
    w.line(format!("{ctor}({}* in, bool owns_target = false);", n.interface));
    if copyable {
        w.line(format!("{ctor}(const {delegate}& in);"));
    } else {
        w.line(format!("{ctor}(const {delegate}& in) = delete;"));
    }
    if assignable {
        w.line(format!("{delegate}& operator=(const {delegate}& in);"));
    } else {
        w.line(format!("{delegate}& operator=(const {delegate}& in) = delete;"));
    }
    w.line(format!("~{ctor}();"));
    w.blank();
    w.line(format!("{}* get_BEptr() const;", n.interface));
    w.dedent();
    w.close(";");
    w.finish()
}

fn write_definitions(ctx: &GenContext<'_>, plan: &ClassPlan<'_>, n: &DelegateNames, decl: &DelegateDecl, copyable: bool, assignable: bool) -> String {
    let mut w = CodeWriter::new(ctx.indent());
    let ctor = &n.ctor;
    let delegate = &n.delegate;

    write_hook_definitions(&mut w, &n.interface, delegate);
    w.blank();
    let protocol = protocol_for(ctx, plan);
    if !protocol.ancestors.is_empty() {
        write_protocol_definitions(&mut w, &protocol);
        w.blank();
    }

    for method in &plan.methods {
        let call = format!(
            "get_BEptr()->{}({})",
            method.interface_name,
            call_arguments(method.args, |ty, name| to_interface_arg(ctx, ty, name))
        );
        let statement = match method.returns() {
            Some(ty) if !ty.is_void() => format!("return {};", to_delegate_return(ctx, ty, &call)),
            _ => format!("{call};"),
        };
        w.function(
            format!(
                "inline {} {delegate}::{}({}){}",
                method_returns(ctx, method),
                method.original_name(),
                method_params(ctx, method),
                constness(method)
            ),
            &[statement],
        );
        w.blank();
    }

    for (slot, constructor) in decl.factory_slots.iter().zip(&plan.constructors) {
        let args = call_arguments(constructor.args, |ty, name| to_interface_arg(ctx, ty, name));
        w.line(format!(
            "inline {delegate}::{ctor}({}) : {ctor}({slot}({args}), true) {{}}",
            method_params(ctx, constructor)
        ));
        w.blank();
    }

    let mut init = vec![format!("{}(in, owns_target)", ctx.affixes().delegate_root())];
    init.extend(
        plan.loaded_ancestors
            .iter()
            .map(|names| format!("{}(in, owns_target)", ctx.delegate_name(names, Side::Generated))),
    );
    init.extend(plan.fields.iter().map(|f| field_initializer(ctx, f)));
    w.function(
        format!(
            "inline {delegate}::{ctor}({}* in, bool owns_target) : {}",
            n.interface,
            init.join(", ")
        ),
        &delegate_link_body(),
    );
    w.blank();

    if copyable {
        w.line(format!(
            "inline {delegate}::{ctor}(const {delegate}& in) : {ctor}(in.get_BEptr()->{}(), true) {{}}",
            pointer_copy_name(ctx)
        ));
        w.blank();
    }
    if assignable {
        w.open(format!("inline {delegate}& {delegate}::operator=(const {delegate}& in)"));
        w.open("if (this != &in)");
        w.line(format!("get_BEptr()->{}(in.get_BEptr());", pointer_assign_name(ctx)));
        w.close("");
        w.line("return *this;");
        w.close("");
        w.blank();
    }

    write_delegate_destructor(&mut w, delegate);
    w.blank();
    w.function(
        format!("inline {}* {delegate}::get_BEptr() const", n.interface),
        &[format!("return dynamic_cast<{}*>(BEptr);", n.interface)],
    );
    w.finish()
}

/// Build the Delegate of a planned class. `copyable`/`assignable` follow
/// whether the Interface got `pointer_copy`/`pointer_assign`.
pub fn synthesize_delegate(
    ctx: &GenContext<'_>,
    plan: &ClassPlan<'_>,
    copyable: bool,
    assignable: bool,
) -> DelegateDecl {
    let delegate = plan.names.delegate.name.clone();
    let n = DelegateNames {
        ctor: split_template(&delegate).0.to_string(),
        delegate,
        interface: plan.names.interface.name.clone(),
    };
    let mut decl = DelegateDecl {
        class: plan.qualified_name(),
        name: plan.names.delegate.clone(),
        factory_slots: (0..plan.constructors.len()).map(factory_slot_name).collect(),
        methods: plan.methods.iter().map(|m| m.original_name()).collect(),
        fields: plan.fields.iter().map(|f| f.member.name.clone()).collect(),
        declaration: String::new(),
        definitions: String::new(),
    };
    decl.declaration = write_declaration(ctx, plan, &n, &decl, copyable, assignable);
    decl.definitions = write_definitions(ctx, plan, &n, &decl, copyable, assignable);
    tracing::debug!(
        class = %decl.class,
        methods = decl.methods.len(),
        slots = decl.factory_slots.len(),
        "Synthesized delegate"
    );
    decl
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WrapConfig;
    use crate::context::Session;
    use crate::plan::plan_class;
    use dlwrap_core::{Access, ArgRecord, SymbolIndex, SymbolTable, TableBuilder, TypeRef};

    fn synthesize(table: &SymbolIndex, loaded: &[&str], class: &str) -> DelegateDecl {
        let config = WrapConfig::default();
        let mut ctx = GenContext::new(table, &config);
        for name in loaded {
            ctx.names.register(QualifiedName::parse(name));
        }
        let mut session = Session::new();
        let record = table.class_by_name(class).unwrap();
        let plan = plan_class(&ctx, &mut session, record).unwrap();
        synthesize_delegate(&ctx, &plan, plan.flags.copyable(), plan.flags.assignable())
    }

    fn foo_table() -> SymbolIndex {
        let mut b = TableBuilder::new();
        let double = b.fundamental("double");
        let int = b.fundamental("int");
        let bar = b.add_class("ns::Bar");
        let bar_ty = b.class_type(&bar);
        let foo = b.add_class("ns::Foo");
        b.add_implicit_members(&foo);
        b.add_constructor(
            &foo,
            vec![
                ArgRecord::new(double.clone(), "x"),
                ArgRecord::new(int.clone(), "n").defaulted(),
            ],
        );
        let get = b.add_method(&foo, "get", double.clone(), vec![]);
        b.member_mut(&get).unwrap().is_const = true;
        b.add_method(&foo, "make", bar_ty.clone(), vec![ArgRecord::new(int, "n")]);
        b.add_method(&foo, "use", TypeRef::named("void"), vec![ArgRecord::new(bar_ty.clone().pointer(), "p")]);
        b.add_field(&foo, "x", double);
        b.add_field(&foo, "next", bar_ty.clone().pointer());
        b.add_field(&foo, "inner", bar_ty);
        b.build().unwrap()
    }

    #[test]
    fn one_factory_slot_per_constructor_arity() {
        let table = foo_table();
        let decl = synthesize(&table, &["ns::Foo", "ns::Bar"], "ns::Foo");
        // Implicit default constructor first, then both arities of (x, n = 0).
        assert_eq!(decl.factory_slots, vec!["__factory0", "__factory1", "__factory2"]);
        assert!(decl
            .declaration
            .contains("inline static Abstract_Foo* (*__factory0)() = 0;"));
        assert!(decl
            .declaration
            .contains("inline static Abstract_Foo* (*__factory1)(double, int) = 0;"));
        assert!(decl
            .declaration
            .contains("inline static Abstract_Foo* (*__factory2)(double) = 0;"));
        assert!(decl
            .definitions
            .contains("inline Wrapper_Foo::Wrapper_Foo() : Wrapper_Foo(__factory0(), true) {}"));
        assert!(decl
            .definitions
            .contains("inline Wrapper_Foo::Wrapper_Foo(double x, int n) : Wrapper_Foo(__factory1(x, n), true) {}"));
        assert!(decl
            .definitions
            .contains("inline Wrapper_Foo::Wrapper_Foo(double x) : Wrapper_Foo(__factory2(x), true) {}"));
    }

    #[test]
    fn pointer_constructor_links_without_owning() {
        let table = foo_table();
        let decl = synthesize(&table, &["ns::Foo", "ns::Bar"], "ns::Foo");
        assert!(decl
            .declaration
            .contains("Wrapper_Foo(Abstract_Foo* in, bool owns_target = false);"));
        let code = decl.code();
        assert!(code.contains(
            "inline Wrapper_Foo::Wrapper_Foo(Abstract_Foo* in, bool owns_target) : WrapperBase(in, owns_target), \
             x(get_BEptr()->x_ref_BE()), next(get_BEptr()->next_ref_BE()), \
             inner(get_BEptr()->inner_ref_BE().get_init_wref())"
        ));
        assert!(code.contains("get_BEptr()->set_wptr(this);"));
        assert!(code.contains("get_BEptr()->set_delete_wrapper(false);"));
        assert!(code.contains("return dynamic_cast<Abstract_Foo*>(BEptr);"));
    }

    #[test]
    fn methods_forward_and_rehydrate() {
        let table = foo_table();
        let decl = synthesize(&table, &["ns::Foo", "ns::Bar"], "ns::Foo");
        assert_eq!(decl.methods, vec!["get", "make", "use"]);
        assert!(decl.declaration.contains("double get() const;"));
        assert!(decl.declaration.contains("ns::Wrapper_Bar make(int n);"));
        assert!(decl.declaration.contains("ns::Wrapper_Bar*& next;"));
        assert!(decl.declaration.contains("ns::Wrapper_Bar& inner;"));
        assert!(decl.definitions.contains("return get_BEptr()->get();"));
        assert!(decl
            .definitions
            .contains("return ns::Wrapper_Bar(get_BEptr()->make_BE(n), true);"));
        assert!(decl
            .definitions
            .contains("get_BEptr()->use_BE((p == 0 ? 0 : p->get_BEptr()));"));
    }

    #[test]
    fn copy_and_assignment_go_through_the_library() {
        let table = foo_table();
        let decl = synthesize(&table, &["ns::Foo", "ns::Bar"], "ns::Foo");
        assert!(decl.definitions.contains(
            "inline Wrapper_Foo::Wrapper_Foo(const Wrapper_Foo& in) : Wrapper_Foo(in.get_BEptr()->pointer_copy_BE(), true) {}"
        ));
        assert!(decl
            .definitions
            .contains("get_BEptr()->pointer_assign_BE(in.get_BEptr());"));
        assert!(decl.definitions.contains("inline Wrapper_Foo::~Wrapper_Foo()"));
    }

    #[test]
    fn non_copyable_delegates_delete_copy_members() {
        let mut b = TableBuilder::new();
        let double = b.fundamental("double");
        let shape = b.add_class("ns::Shape");
        let area = b.add_method(&shape, "area", double, vec![]);
        b.member_mut(&area).unwrap().is_pure_virtual = true;
        let table = b.build().unwrap();
        let decl = synthesize(&table, &["ns::Shape"], "ns::Shape");
        assert!(decl.factory_slots.is_empty());
        assert!(decl
            .declaration
            .contains("Wrapper_Shape(const Wrapper_Shape& in) = delete;"));
        assert!(!decl.definitions.contains("pointer_copy_BE"));
    }

    #[test]
    fn derived_delegate_initializes_every_loaded_ancestor() {
        let mut b = TableBuilder::new();
        let root = b.add_class("ns::Root");
        let mid = b.add_class("ns::Mid");
        let leaf = b.add_class("ns::Leaf");
        b.add_parent(&mid, &root, Access::Public, false);
        b.add_parent(&leaf, &mid, Access::Public, false);
        let table = b.build().unwrap();
        let decl = synthesize(&table, &["ns::Root", "ns::Mid", "ns::Leaf"], "ns::Leaf");
        assert!(decl
            .declaration
            .contains("class Wrapper_Leaf : public virtual WrapperBase, public virtual ns::Wrapper_Mid"));
        assert!(decl.definitions.contains(
            ": WrapperBase(in, owns_target), ns::Wrapper_Root(in, owns_target), ns::Wrapper_Mid(in, owns_target)"
        ));
        assert!(decl
            .definitions
            .contains("inline void Abstract_Leaf::set_wptr(Wrapper_Leaf* wptr_in)"));
    }
}
