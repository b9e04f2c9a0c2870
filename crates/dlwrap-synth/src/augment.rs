//! Library-side class augmentation.
//!
//! For the original class to implement its Interface it must inherit it and
//! define every suffixed entry point the Interface declares. This module
//! produces that text plus where it goes: the inheritance clause for the
//! class head, and a member block for the class body. Generated names are
//! written from the global scope because the block lives inside the
//! library's own namespaces.

use serde::Serialize;

use dlwrap_core::records::SourceLocation;

use crate::context::{GenContext, Session, Side};
use crate::diagnostics::NoticeKind;
use crate::emit::CodeWriter;
use crate::interface::{
    accessor_signature, interface_signature, pointer_assign_signature, pointer_copy_signature,
    InterfaceDecl,
};
use crate::plan::{ClassPlan, PlannedCallable, PlannedField};
use crate::translate::{call_arguments, to_interface_return, to_original_arg};

/// Additions to one library class.
#[derive(Debug, Clone, Serialize)]
pub struct Augmentation {
    pub class: String,
    /// Base-specifier to append to the class head.
    pub inheritance: String,
    /// Declaration of the class in the library sources.
    pub location: Option<SourceLocation>,
    /// Members defined by `body`, in order.
    pub members: Vec<String>,
    /// Member definitions to insert into the class body.
    pub body: String,
}

fn forwarder_body(ctx: &GenContext<'_>, method: &PlannedCallable<'_>) -> String {
    let target = if method.inherited {
        format!("::{}::{}", method.owner.qualified_name(), method.original_name())
    } else {
        method.original_name()
    };
    let call = format!(
        "{target}({})",
        call_arguments(method.args, |ty, name| to_original_arg(ctx, ty, name))
    );
    match method.returns() {
        Some(ty) if !ty.is_void() => format!("return {};", to_interface_return(ctx, ty, &call)),
        _ => format!("{call};"),
    }
}

fn accessor_body(ctx: &GenContext<'_>, field: &PlannedField<'_>) -> Vec<String> {
    let name = &field.member.name;
    match &field.shadow {
        Some(shadow) => {
            let target = if field.ty.cv.is_const {
                format!("const_cast<{}*>({name})", ctx.original_base(field.ty))
            } else {
                name.clone()
            };
            vec![
                format!("if ({name} != 0 && {shadow} == 0) {{ {shadow} = {target}->get_init_wptr(); }}"),
                format!("return {shadow};"),
            ]
        }
        None => vec![format!("return {name};")],
    }
}

/// Build the additions for a planned class.
pub fn synthesize_augmentation(
    ctx: &GenContext<'_>,
    session: &mut Session,
    plan: &ClassPlan<'_>,
    interface: &InterfaceDecl,
) -> Augmentation {
    let class = plan.qualified_name();
    let original = format!("::{class}");
    let iface = ctx.interface_name(&plan.names, Side::Library);
    let delegate = ctx.delegate_name(&plan.names, Side::Library);

    if plan.class.location.is_none() {
        session.diagnostics.record(
            NoticeKind::NoInsertionPoint,
            class.clone(),
            "no source location for the class declaration",
        );
    }

    let mut w = CodeWriter::new(ctx.indent());
    let mut members = Vec::new();
    w.line("public:");
    w.indent();

    for method in plan.methods.iter().filter(|m| m.needs_forwarder()) {
        w.function(
            interface_signature(ctx, method, Side::Library),
            &[forwarder_body(ctx, method)],
        );
        w.blank();
        members.push(method.interface_name.clone());
    }

    for field in &plan.fields {
        w.function(accessor_signature(ctx, field, Side::Library), &accessor_body(ctx, field));
        w.blank();
        members.push(field.accessor.clone());
    }

    if interface.pointer_copy {
        w.function(
            pointer_copy_signature(ctx, &iface),
            &[format!("return new {original}(*this);")],
        );
        w.blank();
        members.push(crate::interface::pointer_copy_name(ctx));
    }
    if interface.pointer_assign {
        w.function(
            pointer_assign_signature(ctx, &iface),
            &[
                format!("{delegate}* wptr_temp = get_wptr();"),
                format!("*this = *dynamic_cast<{original}*>(in);"),
                "set_wptr(wptr_temp);".to_string(),
            ],
        );
        members.push(crate::interface::pointer_assign_name(ctx));
    }
    w.dedent();

    Augmentation {
        class,
        inheritance: format!("public virtual {iface}"),
        location: plan.class.location.clone(),
        members,
        body: w.finish(),
    }
}
