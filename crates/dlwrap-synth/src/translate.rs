//! Type and expression translation across the load boundary.
//!
//! Loaded classes never cross the boundary as themselves. On the Interface
//! side they appear as their Interface type, and by-value returns become
//! heap pointers, so the caller never needs the original class's size:
//!
//! | original      | Interface signature    | Delegate signature |
//! |---------------|------------------------|--------------------|
//! | `Bar` (arg)   | `Abstract_Bar&`        | `Wrapper_Bar`      |
//! | `Bar&`        | `Abstract_Bar&`        | `Wrapper_Bar&`     |
//! | `Bar*`        | `Abstract_Bar*`        | `Wrapper_Bar*`     |
//! | `Bar` (ret)   | `Abstract_Bar*`        | `Wrapper_Bar`      |
//!
//! Types that are not loaded keep their original spelling everywhere.

use dlwrap_core::records::ArgRecord;
use dlwrap_core::TypeRef;

use crate::context::{GenContext, Side};

/// The argument's declared name, or `arg_<n>` when it has none.
pub fn arg_name(index: usize, arg: &ArgRecord) -> String {
    arg.name
        .clone()
        .unwrap_or_else(|| format!("arg_{}", index + 1))
}

/// Original spelling of a type, with class names globally qualified.
pub fn original_type(ctx: &GenContext<'_>, ty: &TypeRef) -> String {
    ty.render_with(&ctx.original_base(ty))
}

/// Interface-side spelling of an argument type.
pub fn interface_arg_type(ctx: &GenContext<'_>, ty: &TypeRef, side: Side) -> String {
    match ctx.loaded(ty) {
        Some(names) => {
            let base = ctx.interface_name(names, side);
            if ty.is_by_value() {
                ty.clone().reference().render_with(&base)
            } else {
                ty.render_with(&base)
            }
        }
        None => original_type(ctx, ty),
    }
}

/// Interface-side spelling of a return type.
pub fn interface_return_type(ctx: &GenContext<'_>, ty: &TypeRef, side: Side) -> String {
    match ctx.loaded(ty) {
        Some(names) => {
            let base = ctx.interface_name(names, side);
            if ty.is_by_value() {
                ty.clone().pointer().render_with(&base)
            } else {
                ty.render_with(&base)
            }
        }
        None => original_type(ctx, ty),
    }
}

/// Delegate-side spelling of an argument or field type.
pub fn delegate_type(ctx: &GenContext<'_>, ty: &TypeRef) -> String {
    match ctx.loaded(ty) {
        Some(names) => ty.render_with(&ctx.delegate_name(names, Side::Generated)),
        None => original_type(ctx, ty),
    }
}

/// Delegate-side spelling of a return type. By-value Delegates are returned
/// without cv-qualifiers.
pub fn delegate_return_type(ctx: &GenContext<'_>, ty: &TypeRef) -> String {
    match ctx.loaded(ty) {
        Some(names) if ty.is_by_value() => {
            let mut ty = ty.clone();
            ty.cv.is_const = false;
            ty.cv.is_volatile = false;
            ty.render_with(&ctx.delegate_name(names, Side::Generated))
        }
        _ => delegate_type(ctx, ty),
    }
}

/// Library side: turn an Interface-typed argument back into what the
/// original callable expects.
pub fn to_original_arg(ctx: &GenContext<'_>, ty: &TypeRef, name: &str) -> String {
    if ctx.loaded(ty).is_none() {
        return name.to_string();
    }
    let base = ctx.original_base(ty);
    let target = if ty.is_by_value() {
        ty.clone().reference().render_with(&base)
    } else {
        ty.render_with(&base)
    };
    format!("dynamic_cast<{target}>({name})")
}

/// Library side: wrap the original call so its result matches the
/// Interface return type.
pub fn to_interface_return(ctx: &GenContext<'_>, ty: &TypeRef, call: &str) -> String {
    match ctx.loaded(ty) {
        Some(_) if ty.is_by_value() => format!("new {}({call})", ctx.original_base(ty)),
        _ => call.to_string(),
    }
}

/// Delegate side: turn a Delegate-typed argument into the Interface object
/// behind it.
pub fn to_interface_arg(ctx: &GenContext<'_>, ty: &TypeRef, name: &str) -> String {
    match ctx.loaded(ty) {
        Some(_) if ty.is_pointer() => format!("({name} == 0 ? 0 : {name}->get_BEptr())"),
        Some(_) => format!("*{name}.get_BEptr()"),
        None => name.to_string(),
    }
}

/// Delegate side: turn an Interface-typed result into the companion
/// Delegate the caller sees.
pub fn to_delegate_return(ctx: &GenContext<'_>, ty: &TypeRef, call: &str) -> String {
    let Some(names) = ctx.loaded(ty) else {
        return call.to_string();
    };
    let interface = ctx.interface_name(names, Side::Generated);
    if ty.is_by_value() {
        format!("{}({call}, true)", ctx.delegate_name(names, Side::Generated))
    } else if ty.is_pointer() {
        if ty.cv.is_const {
            format!("const_cast<{interface}*>({call})->get_init_wptr()")
        } else {
            format!("{call}->get_init_wptr()")
        }
    } else if ty.cv.is_const {
        format!("const_cast<{interface}&>({call}).get_init_wref()")
    } else {
        format!("{call}.get_init_wref()")
    }
}

/// Render `type name` pairs for a parameter list.
pub fn parameter_list<F>(args: &[ArgRecord], mut spell: F) -> String
where
    F: FnMut(&TypeRef) -> String,
{
    args.iter()
        .enumerate()
        .map(|(i, arg)| format!("{} {}", spell(&arg.ty), arg_name(i, arg)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render converted argument expressions for a call.
pub fn call_arguments<F>(args: &[ArgRecord], mut convert: F) -> String
where
    F: FnMut(&TypeRef, &str) -> String,
{
    args.iter()
        .enumerate()
        .map(|(i, arg)| convert(&arg.ty, &arg_name(i, arg)))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WrapConfig;
    use dlwrap_core::{QualifiedName, SymbolIndex, TableBuilder};

    fn fixture() -> (SymbolIndex, TypeRef, TypeRef) {
        let mut builder = TableBuilder::new();
        let double = builder.fundamental("double");
        let bar = builder.add_class("ns::Bar");
        let bar_ty = builder.class_type(&bar);
        (builder.build().unwrap(), bar_ty, double)
    }

    fn context<'a>(table: &'a SymbolIndex, config: &'a WrapConfig) -> GenContext<'a> {
        let mut ctx = GenContext::new(table, config);
        ctx.names.register(QualifiedName::parse("ns::Bar"));
        ctx
    }

    #[test]
    fn return_translation_table() {
        let (table, bar, _) = fixture();
        let config = WrapConfig::default();
        let ctx = context(&table, &config);
        let side = Side::Generated;
        assert_eq!(interface_return_type(&ctx, &bar.clone().reference(), side), "ns::Abstract_Bar&");
        assert_eq!(interface_return_type(&ctx, &bar.clone().pointer(), side), "ns::Abstract_Bar*");
        assert_eq!(interface_return_type(&ctx, &bar, side), "ns::Abstract_Bar*");
        assert_eq!(
            interface_return_type(&ctx, &bar, Side::Library),
            "::ns::Abstract_Bar*"
        );
    }

    #[test]
    fn by_value_loaded_argument_becomes_reference() {
        let (table, bar, double) = fixture();
        let config = WrapConfig::default();
        let ctx = context(&table, &config);
        assert_eq!(interface_arg_type(&ctx, &bar, Side::Generated), "ns::Abstract_Bar&");
        assert_eq!(interface_arg_type(&ctx, &double, Side::Generated), "double");
        assert_eq!(delegate_type(&ctx, &bar.clone().constant().reference()), "const ns::Wrapper_Bar&");
    }

    #[test]
    fn library_side_conversions() {
        let (table, bar, double) = fixture();
        let config = WrapConfig::default();
        let ctx = context(&table, &config);
        assert_eq!(to_original_arg(&ctx, &bar, "b"), "dynamic_cast<::ns::Bar&>(b)");
        assert_eq!(to_original_arg(&ctx, &bar.clone().pointer(), "p"), "dynamic_cast<::ns::Bar*>(p)");
        assert_eq!(to_original_arg(&ctx, &double, "x"), "x");
        assert_eq!(to_interface_return(&ctx, &bar, "make()"), "new ::ns::Bar(make())");
        assert_eq!(to_interface_return(&ctx, &bar.clone().reference(), "get()"), "get()");
    }

    #[test]
    fn delegate_side_conversions() {
        let (table, bar, _) = fixture();
        let config = WrapConfig::default();
        let ctx = context(&table, &config);
        assert_eq!(to_interface_arg(&ctx, &bar, "b"), "*b.get_BEptr()");
        assert_eq!(
            to_interface_arg(&ctx, &bar.clone().pointer(), "p"),
            "(p == 0 ? 0 : p->get_BEptr())"
        );
        assert_eq!(to_delegate_return(&ctx, &bar, "f()"), "ns::Wrapper_Bar(f(), true)");
        assert_eq!(to_delegate_return(&ctx, &bar.clone().reference(), "f()"), "f().get_init_wref()");
        assert_eq!(to_delegate_return(&ctx, &bar.clone().pointer(), "f()"), "f()->get_init_wptr()");
    }

    #[test]
    fn unnamed_arguments_get_positional_names() {
        let args = vec![
            ArgRecord::new(TypeRef::named("int"), ""),
            ArgRecord::new(TypeRef::named("int"), "n"),
        ];
        assert_eq!(parameter_list(&args, |t| t.to_string()), "int arg_1, int n");
        assert_eq!(call_arguments(&args, |_, n| n.to_string()), "arg_1, n");
    }
}
