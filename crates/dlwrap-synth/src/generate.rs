//! Generation run driver.
//!
//! A run has two passes over the load set. The first checks every requested
//! class (and, when configured, discovers their parents) and registers the
//! generated names of the accepted ones, so that signatures planned in the
//! second pass can refer to any loaded class regardless of order. The second
//! pass plans each class and runs the Interface, Delegate, factory and
//! augmentation synthesizers over the plan. Free functions come last.

use std::collections::HashSet;

use serde::Serialize;

use dlwrap_core::names::{GeneratedNames, QualifiedName};
use dlwrap_core::records::{ClassRecord, Record, RecordId};
use dlwrap_core::SymbolTable;

use crate::analyzer::{check_class, Verdict};
use crate::augment::{synthesize_augmentation, Augmentation};
use crate::config::WrapConfig;
use crate::context::{GenContext, Ledger, Session};
use crate::delegate::{synthesize_delegate, DelegateDecl};
use crate::diagnostics::{Notice, NoticeKind};
use crate::emit::CodeWriter;
use crate::error::Result;
use crate::factory::{synthesize_factories, FactoryRecord, FactorySet};
use crate::functions::{synthesize_functions, FunctionWrapper};
use crate::interface::{synthesize_interface, write_forward_declaration, InterfaceDecl};
use crate::lifetime::write_roots;
use crate::plan::plan_class;

/// Everything generated for one loaded class.
#[derive(Debug, Clone, Serialize)]
pub struct ClassOutput {
    pub class: String,
    pub names: GeneratedNames,
    /// Namespace the generated classes live in, outermost first.
    pub scope: Vec<String>,
    pub interface: InterfaceDecl,
    pub delegate: DelegateDecl,
    pub factories: FactorySet,
    pub augmentation: Augmentation,
}

/// One row of the loaded-types table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedType {
    pub class: String,
    pub interface: String,
    pub delegate: String,
    /// Exported factory symbols, in slot order.
    pub factories: Vec<String>,
}

/// Result of a generation run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutput {
    /// Namespace enclosing all generated code.
    pub outer_namespace: Vec<String>,
    /// Interface and Delegate root classes.
    pub roots: String,
    /// Forward declarations of every Interface and Delegate, grouped by
    /// namespace.
    pub forward_declarations: String,
    /// Loaded classes, every class after its loaded ancestors.
    pub classes: Vec<ClassOutput>,
    pub functions: Vec<FunctionWrapper>,
    pub loaded_types: Vec<LoadedType>,
    pub ledger: Ledger,
    pub notices: Vec<Notice>,
    #[serde(skip)]
    indent: usize,
    #[serde(skip)]
    bind_function: String,
}

impl GenerationOutput {
    /// Nothing was generated.
    pub fn is_empty(&self) -> bool {
        self.ledger.classes_done.is_empty() && self.ledger.functions_done.is_empty()
    }

    /// Every factory of the run, in symbol order.
    pub fn factories(&self) -> impl Iterator<Item = &FactoryRecord> {
        self.classes.iter().flat_map(|c| c.factories.records.iter())
    }

    pub fn class(&self, qualified: &str) -> Option<&ClassOutput> {
        self.classes.iter().find(|c| c.class == qualified)
    }

    fn write_preamble(&self, w: &mut CodeWriter) {
        w.line("#pragma once");
        w.blank();
        w.open_namespaces(&self.outer_namespace);
        w.raw(&self.roots);
        w.close_namespaces(&self.outer_namespace);
        w.blank();
        w.raw(&self.forward_declarations);
    }

    fn write_classes(&self, w: &mut CodeWriter, host: bool) {
        for class in &self.classes {
            w.blank();
            w.open_namespaces(&class.scope);
            if host {
                w.raw(&class.interface.host_code);
            } else {
                w.raw(&class.interface.code);
            }
            w.close_namespaces(&class.scope);
        }
        for class in &self.classes {
            w.blank();
            w.open_namespaces(&class.scope);
            w.raw(&class.delegate.declaration);
            w.close_namespaces(&class.scope);
        }
        for class in &self.classes {
            w.blank();
            w.open_namespaces(&class.scope);
            w.raw(&class.delegate.definitions);
            w.close_namespaces(&class.scope);
        }
    }

    /// Header the library compiles: roots, Interfaces with their lifetime
    /// hooks, and Delegates.
    pub fn library_header(&self) -> String {
        let mut w = CodeWriter::new(self.indent);
        self.write_preamble(&mut w);
        self.write_classes(&mut w, false);
        w.finish()
    }

    /// Header the host compiles: roots, Interfaces, Delegates, wrapped
    /// functions and the function binding every slot to its symbol.
    pub fn host_header(&self) -> String {
        let mut w = CodeWriter::new(self.indent);
        self.write_preamble(&mut w);
        self.write_classes(&mut w, true);
        for function in self.functions.iter().filter(|f| !f.is_passthrough()) {
            w.blank();
            w.raw(&function.host_code);
        }
        w.blank();
        w.open_namespaces(&self.outer_namespace);
        w.raw(&self.bind_function);
        w.close_namespaces(&self.outer_namespace);
        w.finish()
    }

    /// Library source defining the exported factories and function
    /// wrappers. `header` is the include name of [`Self::library_header`].
    pub fn library_source(&self, header: &str) -> String {
        let mut w = CodeWriter::new(self.indent);
        w.line(format!("#include \"{header}\""));
        let mut included = HashSet::new();
        for class in &self.classes {
            if let Some(location) = &class.augmentation.location {
                if included.insert(location.file.as_str()) {
                    w.line(format!("#include \"{}\"", location.file));
                }
            }
        }
        for class in self.classes.iter().filter(|c| !c.factories.is_empty()) {
            w.blank();
            w.raw(&class.factories.code);
        }
        for function in self.functions.iter().filter(|f| !f.is_passthrough()) {
            w.blank();
            w.raw(&function.library_code);
        }
        w.finish()
    }
}

/// Check the requested classes and, when configured, their parents.
/// Returns the accepted classes in discovery order.
fn resolve_load_set<'a>(ctx: &GenContext<'a>, session: &mut Session) -> Vec<&'a ClassRecord> {
    fn discover<'a>(
        ctx: &GenContext<'a>,
        class: &'a ClassRecord,
        seen: &mut HashSet<RecordId>,
        out: &mut Vec<&'a ClassRecord>,
    ) {
        for base in &class.bases {
            let Some(Record::Class(parent)) = ctx.table.lookup(&base.id) else {
                continue;
            };
            if seen.contains(&parent.id) || !check_class(ctx, &parent.qualified_name()).is_accepted() {
                continue;
            }
            seen.insert(parent.id.clone());
            tracing::debug!(class = %parent.qualified_name(), child = %class.qualified_name(), "Discovered parent");
            out.push(parent);
            discover(ctx, parent, seen, out);
        }
    }

    let table = ctx.table;
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for requested in ctx.config.requested_classes() {
        if let Verdict::Rejected(reason) = check_class(ctx, requested) {
            session
                .diagnostics
                .record(NoticeKind::ClassNotLoadable, requested, reason.to_string());
            continue;
        }
        let Some(class) = table.class_by_name(requested) else {
            continue;
        };
        if seen.insert(class.id.clone()) {
            out.push(class);
        }
        if ctx.config.load.parent_classes {
            discover(ctx, class, &mut seen, &mut out);
        }
    }
    out
}

/// Order classes so every loaded ancestor precedes its descendants.
fn emission_order<'a>(ctx: &GenContext<'a>, classes: &[&'a ClassRecord]) -> Vec<&'a ClassRecord> {
    fn visit<'a>(
        ctx: &GenContext<'a>,
        class: &'a ClassRecord,
        loaded: &HashSet<&RecordId>,
        placed: &mut HashSet<RecordId>,
        out: &mut Vec<&'a ClassRecord>,
    ) {
        if !placed.insert(class.id.clone()) {
            return;
        }
        for base in &class.bases {
            if let Some(Record::Class(parent)) = ctx.table.lookup(&base.id) {
                if loaded.contains(&parent.id) {
                    visit(ctx, parent, loaded, placed, out);
                }
            }
        }
        out.push(class);
    }

    let loaded: HashSet<&RecordId> = classes.iter().map(|c| &c.id).collect();
    let mut placed = HashSet::new();
    let mut out = Vec::new();
    for &class in classes {
        visit(ctx, class, &loaded, &mut placed, &mut out);
    }
    out
}

fn class_scope(ctx: &GenContext<'_>, class: &ClassRecord) -> Vec<String> {
    let mut scope = ctx.names.outer_namespace().to_vec();
    scope.extend(class.namespace.iter().cloned());
    scope
}

fn write_forward_declarations(ctx: &GenContext<'_>, classes: &[ClassOutput]) -> String {
    let mut groups: Vec<(&[String], Vec<&ClassOutput>)> = Vec::new();
    for class in classes {
        match groups.iter_mut().find(|(scope, _)| *scope == class.scope.as_slice()) {
            Some((_, members)) => members.push(class),
            None => groups.push((class.scope.as_slice(), vec![class])),
        }
    }

    let mut w = CodeWriter::new(ctx.indent());
    for (scope, members) in groups {
        w.open_namespaces(scope);
        for class in members {
            if let Some(record) = ctx.table.class_by_name(&class.class) {
                write_forward_declaration(&mut w, record, &class.names.interface.name);
                write_forward_declaration(&mut w, record, &class.names.delegate.name);
            }
        }
        w.close_namespaces(scope);
    }
    w.finish()
}

fn write_bind_function(
    ctx: &GenContext<'_>,
    classes: &[ClassOutput],
    functions: &[FunctionWrapper],
) -> String {
    let mut statements = Vec::new();
    let slots = classes
        .iter()
        .flat_map(|c| c.factories.records.iter())
        .filter_map(|r| r.slot.as_ref().map(|slot| (slot, &r.symbol)))
        .chain(
            functions
                .iter()
                .filter_map(|f| f.slot.as_ref().zip(f.symbol.as_ref())),
        );
    for (slot, symbol) in slots {
        statements.push(format!(
            "{slot} = reinterpret_cast<decltype({slot})>(lookup(\"{symbol}\"));"
        ));
    }

    let mut w = CodeWriter::new(ctx.indent());
    w.line("template <typename Lookup>");
    w.function(
        format!("inline void {}(Lookup lookup)", ctx.affixes().suffixed("bind_symbols")),
        &statements,
    );
    w.finish()
}

/// Run generation for `config` against `table`.
pub fn generate(table: &dyn SymbolTable, config: &WrapConfig) -> Result<GenerationOutput> {
    config.validate()?;
    let mut ctx = GenContext::new(table, config);
    let mut session = Session::new();

    let load_set = resolve_load_set(&ctx, &mut session);
    for class in &load_set {
        ctx.names
            .register(QualifiedName::new(&class.namespace, &class.name));
    }
    tracing::info!(
        requested = config.load.classes.len(),
        loaded = load_set.len(),
        "Resolved load set"
    );

    let mut classes = Vec::new();
    for class in emission_order(&ctx, &load_set) {
        let qualified = class.qualified_name();
        if session.ledger.has_class(&qualified) {
            continue;
        }
        let plan = plan_class(&ctx, &mut session, class)?;
        let interface = synthesize_interface(&ctx, &mut session, &plan);
        let delegate = synthesize_delegate(&ctx, &plan, interface.pointer_copy, interface.pointer_assign);
        let factories = synthesize_factories(&ctx, &mut session, &plan);
        let augmentation = synthesize_augmentation(&ctx, &mut session, &plan, &interface);
        classes.push(ClassOutput {
            class: qualified.clone(),
            names: plan.names.clone(),
            scope: class_scope(&ctx, class),
            interface,
            delegate,
            factories,
            augmentation,
        });
        session.ledger.classes_done.push(qualified);
    }

    let functions = synthesize_functions(&ctx, &mut session)?;

    let mut roots = CodeWriter::new(ctx.indent());
    write_roots(&mut roots, ctx.affixes());

    let loaded_types = classes
        .iter()
        .map(|c| LoadedType {
            class: c.class.clone(),
            interface: c.names.interface.long(),
            delegate: c.names.delegate.long(),
            factories: c
                .factories
                .records
                .iter()
                .map(|r| r.symbol.clone())
                .collect(),
        })
        .collect();

    let output = GenerationOutput {
        outer_namespace: ctx.names.outer_namespace().to_vec(),
        roots: roots.finish(),
        forward_declarations: write_forward_declarations(&ctx, &classes),
        bind_function: write_bind_function(&ctx, &classes, &functions),
        loaded_types,
        classes,
        functions,
        ledger: session.ledger,
        notices: session.diagnostics.into_notices(),
        indent: ctx.indent(),
    };
    tracing::info!(
        classes = output.ledger.classes_done.len(),
        functions = output.ledger.functions_done.len(),
        notices = output.notices.len(),
        "Generation finished"
    );
    Ok(output)
}
