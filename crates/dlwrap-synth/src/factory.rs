//! Factory synthesis.
//!
//! Every accepted constructor arity gets one exported free function that
//! allocates the original class inside the library. The exported symbol is
//! set with an asm label, so the host finds it by plain string lookup no
//! matter how the compiler mangles names. Symbols carry the run-wide
//! counter and never repeat within a run.

use serde::Serialize;

use dlwrap_core::records::ClassRecord;

use crate::context::{GenContext, Session, Side};
use crate::delegate::factory_slot_name;
use crate::diagnostics::NoticeKind;
use crate::emit::CodeWriter;
use crate::plan::{ClassPlan, PlannedCallable};
use crate::translate::{call_arguments, interface_arg_type, parameter_list, to_original_arg};

/// What a factory hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FactoryReturn {
    /// A bare Interface pointer; the caller's Delegate takes ownership.
    Interface,
    /// A Delegate already linked to, and owning, the new object.
    Delegate,
}

/// One generated factory function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactoryRecord {
    /// Exported symbol name.
    pub symbol: String,
    /// Qualified name of the constructed class.
    pub class: String,
    /// Interface-side parameter types.
    pub args: Vec<String>,
    pub returns: FactoryReturn,
    /// Delegate slot (`Wrapper_Foo::__factory0`) bound to this symbol.
    pub slot: Option<String>,
}

impl FactoryRecord {
    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

/// The factories of one class and their library-side definitions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FactorySet {
    pub records: Vec<FactoryRecord>,
    pub code: String,
}

impl FactorySet {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Template arguments as they appear in a symbol: `_double_3` for
/// `<double, 3>`, with `*`, `&` and `::` spelled `P`, `R` and `_`.
fn template_tag(class: &ClassRecord) -> String {
    class
        .template_args()
        .iter()
        .map(|arg| {
            let arg = arg.replace("::", "_").replace('*', "P").replace('&', "R");
            let cleaned: String = arg
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
                .collect();
            format!("_{cleaned}")
        })
        .collect()
}

/// Exported symbol for the `overload`th constructor arity of `class`.
pub fn factory_symbol(ctx: &GenContext<'_>, class: &ClassRecord, overload: usize, counter: usize) -> String {
    format!(
        "{}{}_{overload}{}{}_{counter}",
        ctx.config.naming.factory_prefix,
        class.short_name(),
        template_tag(class),
        ctx.affixes().code_suffix
    )
}

/// Declare `symbol` with C linkage under an asm label of the same name,
/// then define it.
pub(crate) fn write_exported(
    w: &mut CodeWriter,
    returns: &str,
    symbol: &str,
    params: &str,
    body: &str,
) {
    let signature = format!("{returns} {symbol}({params})");
    w.open("extern \"C\"");
    w.line(format!("{signature} asm(\"{symbol}\");"));
    w.close("");
    w.function(signature, &[body.to_string()]);
    w.blank();
}

fn record_for(
    ctx: &GenContext<'_>,
    plan: &ClassPlan<'_>,
    constructor: &PlannedCallable<'_>,
    symbol: String,
    returns: FactoryReturn,
    slot: Option<String>,
) -> FactoryRecord {
    FactoryRecord {
        symbol,
        class: plan.qualified_name(),
        args: constructor
            .args
            .iter()
            .map(|arg| interface_arg_type(ctx, &arg.ty, Side::Generated))
            .collect(),
        returns,
        slot,
    }
}

/// Build the factories of a planned class.
pub fn synthesize_factories(
    ctx: &GenContext<'_>,
    session: &mut Session,
    plan: &ClassPlan<'_>,
) -> FactorySet {
    let class = plan.qualified_name();
    if !plan.has_public_constructor {
        session
            .diagnostics
            .record(NoticeKind::NoFactoryFunctions, class, "No public constructors");
        return FactorySet::default();
    }
    if plan.flags.has_pure_virtual {
        session.diagnostics.record(
            NoticeKind::NoFactoryFunctions,
            class,
            "Contains pure virtual member functions.",
        );
        return FactorySet::default();
    }
    if plan.constructors.is_empty() {
        session
            .diagnostics
            .record(NoticeKind::NoFactoryFunctions, class, "No accepted constructors");
        return FactorySet::default();
    }

    let original = format!("::{class}");
    let interface = ctx.interface_name(&plan.names, Side::Library);
    let delegate = ctx.delegate_name(&plan.names, Side::Library);
    let mut set = FactorySet::default();
    let mut w = CodeWriter::new(ctx.indent());

    for (index, constructor) in plan.constructors.iter().enumerate() {
        let params = parameter_list(constructor.args, |ty| interface_arg_type(ctx, ty, Side::Library));
        let args = call_arguments(constructor.args, |ty, name| to_original_arg(ctx, ty, name));
        let construct = format!("new {original}({args})");

        let symbol = factory_symbol(ctx, plan.class, index, session.next_symbol_index());
        write_exported(&mut w, &format!("{interface}*"), &symbol, &params, &format!("return {construct};"));
        let slot = format!("{}::{}", plan.names.delegate.long(), factory_slot_name(index));
        set.records
            .push(record_for(ctx, plan, constructor, symbol, FactoryReturn::Interface, Some(slot)));

        if ctx.config.output.wrapper_return_factories {
            let symbol = factory_symbol(ctx, plan.class, index, session.next_symbol_index());
            write_exported(
                &mut w,
                &format!("{delegate}*"),
                &symbol,
                &params,
                &format!("return new {delegate}({construct}, true);"),
            );
            set.records
                .push(record_for(ctx, plan, constructor, symbol, FactoryReturn::Delegate, None));
        }
    }

    set.code = w.finish();
    tracing::debug!(class = %class, factories = set.records.len(), "Synthesized factories");
    set
}
