//! Interface synthesis.
//!
//! The Interface of a loaded class is an abstract class the host compiles
//! against. It declares one pure virtual per accepted method arity, one
//! reference accessor per accepted field, the copy/assign hooks and the
//! lifetime protocol members. The library's original class inherits it and
//! provides the implementations (see [`crate::augment`]).

use serde::Serialize;

use dlwrap_core::names::{split_template, QualifiedName};
use dlwrap_core::records::ClassRecord;

use crate::context::{GenContext, Session, Side};
use crate::diagnostics::NoticeKind;
use crate::emit::CodeWriter;
use crate::lifetime::{
    write_hook_declarations, write_interface_protocol, Flavor, InterfaceProtocol,
    INTERFACE_PROTOCOL_MEMBERS,
};
use crate::plan::{ClassPlan, PlannedCallable, PlannedField};
use crate::translate::{interface_arg_type, interface_return_type, parameter_list};

/// A synthesized Interface class.
#[derive(Debug, Clone, Serialize)]
pub struct InterfaceDecl {
    /// Qualified name of the wrapped class.
    pub class: String,
    pub name: QualifiedName,
    /// Pure virtuals in declaration order: methods, field accessors, then
    /// `pointer_copy`/`pointer_assign` when present.
    pub virtuals: Vec<String>,
    pub pointer_copy: bool,
    pub pointer_assign: bool,
    /// Declaration compiled into the library.
    pub code: String,
    /// Declaration compiled into the host.
    pub host_code: String,
}

impl InterfaceDecl {
    /// Every member the Interface declares: the pure virtuals followed by the
    /// protocol members.
    pub fn member_names(&self) -> Vec<&str> {
        self.virtuals
            .iter()
            .map(String::as_str)
            .chain(INTERFACE_PROTOCOL_MEMBERS)
            .collect()
    }
}

/// `template <typename T0, int T1>` parameter list for the primary template
/// a specialization belongs to.
pub(crate) fn primary_template_params(args: &[String]) -> String {
    let params: Vec<String> = args
        .iter()
        .enumerate()
        .map(|(i, arg)| {
            if arg.parse::<i64>().is_ok() || arg == "true" || arg == "false" {
                format!("int T{i}")
            } else {
                format!("typename T{i}")
            }
        })
        .collect();
    format!("template <{}>", params.join(", "))
}

/// Forward-declare a generated class named `name` (a prefixed variant of
/// `class`'s short name).
pub(crate) fn write_forward_declaration(w: &mut CodeWriter, class: &ClassRecord, name: &str) {
    if class.is_template_specialization() {
        let short = split_template(name).0;
        w.line(format!("{} class {short};", primary_template_params(&class.template_args())));
        w.line(format!("template <> class {name};"));
    } else {
        w.line(format!("class {name};"));
    }
}

/// Class head for a generated class, `template <>` included for
/// specializations.
pub(crate) fn class_head(class: &ClassRecord, name: &str, bases: &[String]) -> String {
    let template = if class.is_template_specialization() {
        "template <>\n"
    } else {
        ""
    };
    let bases: Vec<String> = bases.iter().map(|b| format!("public virtual {b}")).collect();
    format!("{template}class {name} : {}", bases.join(", "))
}

/// `name(params) const` for a callable arity, with Interface-side types.
pub(crate) fn interface_signature(ctx: &GenContext<'_>, callable: &PlannedCallable<'_>, side: Side) -> String {
    let params = parameter_list(callable.args, |ty| interface_arg_type(ctx, ty, side));
    let constness = if callable.is_const() { " const" } else { "" };
    let returns = match callable.returns() {
        Some(ty) => interface_return_type(ctx, ty, side),
        None => "void".to_string(),
    };
    format!("{returns} {}({params}){constness}", callable.interface_name)
}

/// Declarator of a field's reference accessor: `double (&x_ref_BE())[3]`.
pub(crate) fn accessor_signature(ctx: &GenContext<'_>, field: &PlannedField<'_>, side: Side) -> String {
    let call = format!("{}()", field.accessor);
    match &field.loaded {
        Some(names) if field.shadow.is_some() => {
            format!("{}*& {call}", ctx.delegate_name(names, side))
        }
        Some(names) => {
            let mut ty = field.ty.clone();
            ty.is_reference = true;
            ty.pointer_depth = 0;
            ty.declare(&ctx.interface_name(names, side), &call)
        }
        None => {
            let mut ty = field.ty.clone();
            ty.is_reference = true;
            ty.declare(&ctx.original_base(field.ty), &call)
        }
    }
}

/// Names the lifetime protocol of `plan`'s Interface is written with.
pub(crate) fn protocol_for(ctx: &GenContext<'_>, plan: &ClassPlan<'_>) -> InterfaceProtocol {
    InterfaceProtocol {
        interface: plan.names.interface.name.clone(),
        delegate: plan.names.delegate.name.clone(),
        ancestors: plan
            .loaded_ancestors
            .iter()
            .map(|n| ctx.interface_name(n, Side::Generated))
            .collect(),
        shadows: plan.fields.iter().filter_map(|f| f.shadow.clone()).collect(),
    }
}

pub(crate) fn pointer_copy_name(ctx: &GenContext<'_>) -> String {
    ctx.affixes().suffixed("pointer_copy")
}

pub(crate) fn pointer_assign_name(ctx: &GenContext<'_>) -> String {
    ctx.affixes().suffixed("pointer_assign")
}

/// Signature of `pointer_copy` for the Interface `iface`.
pub(crate) fn pointer_copy_signature(ctx: &GenContext<'_>, iface: &str) -> String {
    format!("{iface}* {}()", pointer_copy_name(ctx))
}

/// Signature of `pointer_assign` for the Interface `iface`.
pub(crate) fn pointer_assign_signature(ctx: &GenContext<'_>, iface: &str) -> String {
    format!("void {}({iface}* in)", pointer_assign_name(ctx))
}

fn copy_assign_notice(session: &mut Session, plan: &ClassPlan<'_>) {
    let flags = plan.flags;
    let reason = if flags.has_pure_virtual {
        "Contains pure virtual member functions."
    } else if !flags.copyable() && !flags.assignable() {
        "No public copy constructor or assignment operator."
    } else if !flags.copyable() {
        "No public copy constructor."
    } else if !flags.assignable() {
        "No public assignment operator."
    } else {
        return;
    };
    session
        .diagnostics
        .record(NoticeKind::NoPointerCopyAndAssignment, plan.qualified_name(), reason);
}

fn write_class(
    ctx: &GenContext<'_>,
    plan: &ClassPlan<'_>,
    decl: &InterfaceDecl,
    flavor: Flavor,
) -> String {
    let names = &plan.names;
    let iface = names.interface.name.clone();
    let delegate = names.delegate.name.clone();

    let mut w = CodeWriter::new(ctx.indent());
    write_forward_declaration(&mut w, plan.class, &iface);
    write_forward_declaration(&mut w, plan.class, &delegate);
    if flavor == Flavor::Library {
        write_hook_declarations(&mut w, &iface, &delegate);
    }
    w.blank();

    let mut bases: Vec<String> = plan
        .loaded_parents()
        .filter_map(|p| p.loaded())
        .map(|n| ctx.interface_name(n, Side::Generated))
        .collect();
    if bases.is_empty() {
        bases.push(ctx.affixes().interface_root());
    }
    w.open(class_head(plan.class, &iface, &bases));

    let shadows: Vec<&PlannedField<'_>> = plan.fields.iter().filter(|f| f.shadow.is_some()).collect();
    if !shadows.is_empty() {
        w.line("protected:");
        w.indent();
        for field in &shadows {
            if let (Some(names), Some(shadow)) = (&field.loaded, &field.shadow) {
                w.line(format!("{}* {shadow};", ctx.delegate_name(names, Side::Generated)));
            }
        }
        w.dedent();
        w.blank();
    }

    w.line("public:");
    w.indent();
    for method in &plan.methods {
        w.line(format!("virtual {} =0;", interface_signature(ctx, method, Side::Generated)));
    }
    if !plan.fields.is_empty() {
        w.blank();
    }
    for field in &plan.fields {
        w.line(format!("virtual {} =0;", accessor_signature(ctx, field, Side::Generated)));
    }
    if decl.pointer_copy || decl.pointer_assign {
        w.blank();
    }
    if decl.pointer_copy {
        w.line(format!("virtual {} =0;", pointer_copy_signature(ctx, &iface)));
    }
    if decl.pointer_assign {
        w.line(format!("virtual {} =0;", pointer_assign_signature(ctx, &iface)));
    }
    w.dedent();
    w.blank();

    write_interface_protocol(&mut w, &protocol_for(ctx, plan), flavor);
    w.close(";");
    w.finish()
}

/// Build the Interface of a planned class.
pub fn synthesize_interface(
    ctx: &GenContext<'_>,
    session: &mut Session,
    plan: &ClassPlan<'_>,
) -> InterfaceDecl {
    copy_assign_notice(session, plan);

    let mut virtuals: Vec<String> = plan.methods.iter().map(|m| m.interface_name.clone()).collect();
    virtuals.extend(plan.fields.iter().map(|f| f.accessor.clone()));
    let pointer_copy = plan.flags.copyable();
    let pointer_assign = plan.flags.assignable();
    if pointer_copy {
        virtuals.push(pointer_copy_name(ctx));
    }
    if pointer_assign {
        virtuals.push(pointer_assign_name(ctx));
    }

    let mut decl = InterfaceDecl {
        class: plan.qualified_name(),
        name: plan.names.interface.clone(),
        virtuals,
        pointer_copy,
        pointer_assign,
        code: String::new(),
        host_code: String::new(),
    };
    decl.code = write_class(ctx, plan, &decl, Flavor::Library);
    decl.host_code = write_class(ctx, plan, &decl, Flavor::Host);
    tracing::debug!(class = %decl.class, virtuals = decl.virtuals.len(), "Synthesized interface");
    decl
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WrapConfig;
    use crate::plan::plan_class;
    use dlwrap_core::{Access, ArgRecord, SymbolIndex, SymbolTable, TableBuilder, TypeRef};

    fn synthesize(table: &SymbolIndex, loaded: &[&str], class: &str) -> (InterfaceDecl, Session) {
        let config = WrapConfig::default();
        let mut ctx = GenContext::new(table, &config);
        for name in loaded {
            ctx.names.register(QualifiedName::parse(name));
        }
        let mut session = Session::new();
        let record = table.class_by_name(class).unwrap();
        let plan = plan_class(&ctx, &mut session, record).unwrap();
        let decl = synthesize_interface(&ctx, &mut session, &plan);
        (decl, session)
    }

    #[test]
    fn declares_one_virtual_per_method_plus_protocol() {
        let mut b = TableBuilder::new();
        let double = b.fundamental("double");
        let int = b.fundamental("int");
        let foo = b.add_class("ns::Foo");
        b.add_implicit_members(&foo);
        b.add_method(&foo, "get", double.clone(), vec![]);
        b.add_method(&foo, "set", TypeRef::named("void"), vec![ArgRecord::new(double, "x")]);
        b.add_method(&foo, "count", int, vec![]);
        let table = b.build().unwrap();

        let (decl, _) = synthesize(&table, &["ns::Foo"], "ns::Foo");
        assert_eq!(
            decl.virtuals,
            vec!["get", "set", "count", "pointer_copy_BE", "pointer_assign_BE"]
        );
        let members = decl.member_names();
        assert_eq!(members.len(), 5 + INTERFACE_PROTOCOL_MEMBERS.len());
        assert!(decl.code.contains("class Abstract_Foo : public virtual AbstractBase"));
        assert!(decl.code.contains("virtual double get() =0;"));
        assert!(decl.code.contains("virtual void set(double x) =0;"));
        assert!(decl.code.contains("virtual Abstract_Foo* pointer_copy_BE() =0;"));
        assert!(decl.code.contains("virtual void pointer_assign_BE(Abstract_Foo* in) =0;"));
        assert!(decl.code.contains("Wrapper_Foo* wrapper_creator(Abstract_Foo*);"));
        assert!(!decl.host_code.contains("wrapper_creator"));
    }

    #[test]
    fn pure_virtual_class_has_no_copy_members() {
        let mut b = TableBuilder::new();
        let double = b.fundamental("double");
        let shape = b.add_class("ns::Shape");
        b.add_implicit_members(&shape);
        let area = b.add_method(&shape, "area", double, vec![]);
        b.member_mut(&area).unwrap().is_pure_virtual = true;
        let table = b.build().unwrap();

        let (decl, session) = synthesize(&table, &["ns::Shape"], "ns::Shape");
        assert!(!decl.pointer_copy);
        assert!(!decl.pointer_assign);
        assert_eq!(decl.virtuals, vec!["area"]);
        let notice = session
            .diagnostics
            .of_kind(NoticeKind::NoPointerCopyAndAssignment)
            .next()
            .unwrap();
        assert_eq!(notice.subject, "ns::Shape");
        assert_eq!(notice.reason, "Contains pure virtual member functions.");
    }

    #[test]
    fn loaded_parents_replace_root_and_others_are_omitted() {
        let mut b = TableBuilder::new();
        let base = b.add_class("ns::Base");
        let unknown = b.add_class("other::Mixin");
        let bar = b.add_class("ns::Bar");
        b.add_parent(&bar, &base, Access::Public, false);
        b.add_parent(&bar, &unknown, Access::Public, false);
        let table = b.build().unwrap();

        let (decl, session) = synthesize(&table, &["ns::Bar", "ns::Base"], "ns::Bar");
        assert!(decl.code.contains("class Abstract_Bar : public virtual ns::Abstract_Base\n"));
        assert!(!decl.code.contains("Mixin"));
        assert!(!decl.code.contains("AbstractBase"));
        assert!(decl.code.contains("ns::Abstract_Base::set_wptr(0);"));
        assert!(session
            .diagnostics
            .contains(NoticeKind::ParentClassIgnored, "other::Mixin"));
    }

    #[test]
    fn loaded_types_are_translated() {
        let mut b = TableBuilder::new();
        let int = b.fundamental("int");
        let bar = b.add_class("ns::Bar");
        let bar_ty = b.class_type(&bar);
        let foo = b.add_class("ns::Foo");
        b.add_method(&foo, "make", bar_ty.clone(), vec![ArgRecord::new(int, "n")]);
        let at = b.add_method(&foo, "first", bar_ty.clone().constant().reference(), vec![]);
        b.member_mut(&at).unwrap().is_const = true;
        b.add_method(&foo, "take", TypeRef::named("void"), vec![ArgRecord::new(bar_ty.clone(), "b")]);
        b.add_field(&foo, "next", bar_ty.clone().pointer());
        b.add_field(&foo, "inner", bar_ty);
        let table = b.build().unwrap();

        let (decl, _) = synthesize(&table, &["ns::Foo", "ns::Bar"], "ns::Foo");
        let code = &decl.code;
        assert!(code.contains("virtual ns::Abstract_Bar* make_BE(int n) =0;"));
        assert!(code.contains("virtual const ns::Abstract_Bar& first_BE() const =0;"));
        assert!(code.contains("virtual void take_BE(ns::Abstract_Bar& b) =0;"));
        assert!(code.contains("virtual ns::Wrapper_Bar*& next_ref_BE() =0;"));
        assert!(code.contains("virtual ns::Abstract_Bar& inner_ref_BE() =0;"));
        assert!(code.contains("protected:\n        ns::Wrapper_Bar* next_wrapper_BE;"));
        assert!(code.contains("next_wrapper_BE = 0;"));
    }

    #[test]
    fn array_fields_return_array_references() {
        let mut b = TableBuilder::new();
        let double = b.fundamental("double");
        let foo = b.add_class("ns::Foo");
        b.add_field(&foo, "xs", double.array(3));
        let table = b.build().unwrap();
        let (decl, _) = synthesize(&table, &["ns::Foo"], "ns::Foo");
        assert!(decl.code.contains("virtual double (&xs_ref_BE())[3] =0;"));
    }

    #[test]
    fn specializations_declare_primary_template() {
        let mut b = TableBuilder::new();
        let vec = b.add_class("ns::Vec<double, 3>");
        b.add_implicit_members(&vec);
        let table = b.build().unwrap();
        let (decl, _) = synthesize(&table, &["ns::Vec<double, 3>"], "ns::Vec<double, 3>");
        assert!(decl
            .code
            .contains("template <typename T0, int T1> class Abstract_Vec;"));
        assert!(decl.code.contains("template <> class Abstract_Vec<double, 3>;"));
        assert!(decl
            .code
            .contains("template <>\nclass Abstract_Vec<double, 3> : public virtual AbstractBase"));
        assert!(decl.code.contains("virtual ~Abstract_Vec()"));
    }
}
