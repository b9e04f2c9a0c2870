//! Free-function wrapping.
//!
//! A selected function whose signature avoids loaded classes and that is
//! used at full arity is passed through under its own name. Every other
//! arity gets an exported wrapper in the library that converts Interface
//! arguments back to the original types, plus a host-side function in the
//! generated namespace that takes Delegates and calls the wrapper through a
//! pointer slot bound after loading.

use serde::Serialize;

use dlwrap_core::names::join_scope;
use dlwrap_core::overload::arity_variants;
use dlwrap_core::records::{ArgRecord, FunctionRecord};
use dlwrap_core::TypeRef;

use crate::analyzer::{check_function, Verdict};
use crate::context::{GenContext, Session, Side};
use crate::diagnostics::NoticeKind;
use crate::emit::CodeWriter;
use crate::error::Result;
use crate::factory::write_exported;
use crate::signature::describe_call;
use crate::translate::{
    call_arguments, delegate_return_type, delegate_type, interface_arg_type,
    interface_return_type, parameter_list, to_delegate_return, to_interface_arg,
    to_interface_return, to_original_arg,
};

/// One accepted arity of a selected function.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionWrapper {
    /// Qualified name of the wrapped function.
    pub function: String,
    pub arity: usize,
    /// Name host code calls.
    pub name: String,
    /// Exported symbol of the library-side wrapper; `None` for pass-through.
    pub symbol: Option<String>,
    /// Host-side pointer slot bound to `symbol`, qualified within the
    /// generated namespace.
    pub slot: Option<String>,
    /// Wrapper definition compiled into the library.
    pub library_code: String,
    /// Slot and host function, inside the generated namespaces.
    pub host_code: String,
}

impl FunctionWrapper {
    pub fn is_passthrough(&self) -> bool {
        self.symbol.is_none()
    }
}

fn write_library_wrapper(
    ctx: &GenContext<'_>,
    function: &FunctionRecord,
    returns: &TypeRef,
    args: &[ArgRecord],
    symbol: &str,
) -> String {
    let mut w = CodeWriter::new(ctx.indent());
    let params = parameter_list(args, |ty| interface_arg_type(ctx, ty, Side::Library));
    let call = format!(
        "::{}({})",
        function.qualified_name(),
        call_arguments(args, |ty, name| to_original_arg(ctx, ty, name))
    );
    let statement = if returns.is_void() {
        format!("{call};")
    } else {
        format!("return {};", to_interface_return(ctx, returns, &call))
    };
    write_exported(
        &mut w,
        &interface_return_type(ctx, returns, Side::Library),
        symbol,
        &params,
        &statement,
    );
    w.finish()
}

fn write_host_function(
    ctx: &GenContext<'_>,
    function: &FunctionRecord,
    returns: &TypeRef,
    args: &[ArgRecord],
    name: &str,
    slot: &str,
) -> String {
    let mut scope = ctx.names.outer_namespace().to_vec();
    scope.extend(function.namespace.iter().cloned());

    let mut w = CodeWriter::new(ctx.indent());
    let slot_types: Vec<String> = args
        .iter()
        .map(|arg| interface_arg_type(ctx, &arg.ty, Side::Generated))
        .collect();
    let call = format!(
        "{slot}({})",
        call_arguments(args, |ty, name| to_interface_arg(ctx, ty, name))
    );
    let statement = if returns.is_void() {
        format!("{call};")
    } else {
        format!("return {};", to_delegate_return(ctx, returns, &call))
    };

    w.open_namespaces(&scope);
    w.line(format!(
        "inline {} (*{slot})({}) = 0;",
        interface_return_type(ctx, returns, Side::Generated),
        slot_types.join(", ")
    ));
    w.function(
        format!(
            "inline {} {name}({})",
            delegate_return_type(ctx, returns),
            parameter_list(args, |ty| delegate_type(ctx, ty))
        ),
        &[statement],
    );
    w.close_namespaces(&scope);
    w.finish()
}

fn wrap_function(
    ctx: &GenContext<'_>,
    session: &mut Session,
    function: &FunctionRecord,
    out: &mut Vec<FunctionWrapper>,
) -> Result<()> {
    let qualified = function.qualified_name();
    let returns = function.return_type()?;
    let uses_loaded =
        ctx.uses_loaded(std::iter::once(returns).chain(function.args.iter().map(|a| &a.ty)));
    let suffixed = ctx.affixes().suffixed(&function.name);
    let mut accepted = 0;

    for variant in arity_variants(&function.args) {
        match check_function(ctx, function, variant.args)? {
            Verdict::Rejected(reason) => {
                session.diagnostics.record(
                    NoticeKind::FunctionNotLoadable,
                    describe_call(&qualified, variant.args),
                    reason.to_string(),
                );
                continue;
            }
            Verdict::Accepted => accepted += 1,
        }

        if !uses_loaded && !variant.is_truncated() {
            out.push(FunctionWrapper {
                function: qualified.clone(),
                arity: variant.arity(),
                name: function.name.clone(),
                symbol: None,
                slot: None,
                library_code: String::new(),
                host_code: String::new(),
            });
            continue;
        }

        let name = if uses_loaded {
            function.name.clone()
        } else {
            suffixed.clone()
        };
        let symbol = format!("{suffixed}_{}", session.next_symbol_index());
        let slot = format!("__{symbol}");
        out.push(FunctionWrapper {
            function: qualified.clone(),
            arity: variant.arity(),
            library_code: write_library_wrapper(ctx, function, returns, variant.args, &symbol),
            host_code: write_host_function(ctx, function, returns, variant.args, &name, &slot),
            slot: Some(join_scope(&function.namespace, &slot)),
            symbol: Some(symbol),
            name,
        });
    }

    if accepted > 0 {
        session
            .ledger
            .functions_done
            .push(describe_call(&qualified, &function.args));
    }
    Ok(())
}

/// Wrap every function selected by `load.functions`.
pub fn synthesize_functions(ctx: &GenContext<'_>, session: &mut Session) -> Result<Vec<FunctionWrapper>> {
    let mut out = Vec::new();
    let functions = ctx.table.functions();
    for selector in ctx.config.selectors()? {
        let selected: Vec<&FunctionRecord> = functions
            .iter()
            .copied()
            .filter(|f| selector.matches(f))
            .collect();
        if selected.is_empty() {
            session.diagnostics.record(
                NoticeKind::FunctionNotLoadable,
                selector.to_string(),
                "class/function not found",
            );
            continue;
        }
        for function in selected {
            if session
                .ledger
                .has_function(&describe_call(&function.qualified_name(), &function.args))
            {
                continue;
            }
            wrap_function(ctx, session, function, &mut out)?;
        }
    }
    tracing::debug!(wrappers = out.len(), "Wrapped functions");
    Ok(out)
}
