//! Per-class wrapping plan.
//!
//! Planning walks a loaded class once, runs every member through the
//! analyzer, expands default arguments into separate arities, settles the
//! generated name of each entry point and resolves the parent list. The
//! Interface, Delegate, factory and augmentation synthesizers all work from
//! the same plan, so they agree on which members exist and what they are
//! called.

use std::collections::HashSet;

use dlwrap_core::names::GeneratedNames;
use dlwrap_core::operators::operator_name;
use dlwrap_core::overload::arity_variants;
use dlwrap_core::records::{
    Access, ArgRecord, ClassRecord, MemberKind, MemberRecord, Record, RecordId,
};
use dlwrap_core::TypeRef;

use crate::analyzer::{
    check_member_function, check_member_variable, class_flags, is_copy_constructor,
    member_path, ClassFlags, Verdict,
};
use crate::context::{GenContext, Session, TypeClass};
use crate::diagnostics::NoticeKind;
use crate::error::{Result, SynthError};
use crate::signature::describe_call;

/// How a direct parent is treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentStatus {
    /// In the load set: the Interface inherits its Interface.
    Loaded(GeneratedNames),
    /// A fundamental type; omitted.
    Fundamental,
    /// A standard-library class; omitted.
    Std,
    /// Not loaded, not resolvable, or otherwise not accepted; omitted.
    NotLoaded,
}

/// A direct parent of a planned class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentInfo {
    pub name: String,
    pub access: Access,
    pub is_virtual: bool,
    pub status: ParentStatus,
}

impl ParentInfo {
    pub fn loaded(&self) -> Option<&GeneratedNames> {
        match &self.status {
            ParentStatus::Loaded(names) => Some(names),
            _ => None,
        }
    }
}

/// One accepted arity of a constructor, method or operator.
#[derive(Debug, Clone)]
pub struct PlannedCallable<'a> {
    pub member: &'a MemberRecord,
    /// Class declaring the member.
    pub owner: &'a ClassRecord,
    /// Declared in a parent that is not loaded itself.
    pub inherited: bool,
    pub args: &'a [ArgRecord],
    /// Trailing defaulted arguments dropped for this arity.
    pub removed: usize,
    /// The full signature mentions a loaded class.
    pub uses_loaded: bool,
    /// Name of the Interface entry point.
    pub interface_name: String,
}

impl<'a> PlannedCallable<'a> {
    pub fn returns(&self) -> Option<&'a TypeRef> {
        match self.member.kind {
            MemberKind::Method | MemberKind::Operator => self.member.value_type.as_ref(),
            _ => None,
        }
    }

    /// Name as written in the library (`get`, `operator+`).
    pub fn original_name(&self) -> String {
        match self.member.kind {
            MemberKind::Operator => format!("operator{}", self.member.name),
            _ => self.member.name.clone(),
        }
    }

    /// The Interface entry point differs from the original member, so the
    /// library class must provide a forwarding body for it.
    pub fn needs_forwarder(&self) -> bool {
        self.uses_loaded || self.removed > 0 || self.inherited
    }

    pub fn is_const(&self) -> bool {
        self.member.is_const
    }
}

/// An accepted field.
#[derive(Debug, Clone)]
pub struct PlannedField<'a> {
    pub member: &'a MemberRecord,
    pub owner: &'a ClassRecord,
    pub ty: &'a TypeRef,
    /// Generated names of the field's class, if it is loaded.
    pub loaded: Option<GeneratedNames>,
    /// Reference accessor on the Interface (`x_ref_BE`).
    pub accessor: String,
    /// Shadow member caching the companion of a pointer-to-loaded field.
    pub shadow: Option<String>,
}

/// Everything the synthesizers need to know about one loaded class.
#[derive(Debug, Clone)]
pub struct ClassPlan<'a> {
    pub class: &'a ClassRecord,
    pub names: GeneratedNames,
    pub flags: ClassFlags,
    pub parents: Vec<ParentInfo>,
    /// Interface names of all loaded ancestors, furthest first.
    pub loaded_ancestors: Vec<GeneratedNames>,
    pub methods: Vec<PlannedCallable<'a>>,
    pub fields: Vec<PlannedField<'a>>,
    /// Accepted constructor arities, in factory order. Empty for abstract
    /// classes, which cannot be instantiated.
    pub constructors: Vec<PlannedCallable<'a>>,
    /// At least one public constructor other than the copy constructor.
    pub has_public_constructor: bool,
}

impl<'a> ClassPlan<'a> {
    pub fn qualified_name(&self) -> String {
        self.class.qualified_name()
    }

    /// Loaded direct parents.
    pub fn loaded_parents(&self) -> impl Iterator<Item = &ParentInfo> {
        self.parents.iter().filter(|p| p.loaded().is_some())
    }
}

/// Name of the Interface entry point for one arity of a method or operator.
pub fn interface_member_name(
    ctx: &GenContext<'_>,
    member: &MemberRecord,
    suffixed: bool,
) -> String {
    let suffix = &ctx.affixes().code_suffix;
    match member.kind {
        MemberKind::Operator if suffixed => {
            let name = operator_name(&member.name).unwrap_or("unnamed");
            format!("operator_{name}{suffix}")
        }
        MemberKind::Operator => format!("operator{}", member.name),
        _ if suffixed => format!("{}{suffix}", member.name),
        _ => member.name.clone(),
    }
}

fn resolve_parents(
    ctx: &GenContext<'_>,
    session: &mut Session,
    class: &ClassRecord,
) -> Vec<ParentInfo> {
    let child = class.qualified_name();
    let mut parents = Vec::new();
    for base in &class.bases {
        let (name, status) = match ctx.table.lookup(&base.id) {
            Some(Record::Class(parent)) => {
                let name = parent.qualified_name();
                let status = match ctx.classify_name(&name) {
                    TypeClass::Loaded => ctx
                        .names
                        .get(&name)
                        .cloned()
                        .map(ParentStatus::Loaded)
                        .unwrap_or(ParentStatus::NotLoaded),
                    TypeClass::Std => ParentStatus::Std,
                    _ => ParentStatus::NotLoaded,
                };
                (name, status)
            }
            Some(Record::Fundamental(f)) => (f.name.clone(), ParentStatus::Fundamental),
            Some(other) => (
                other.qualified_name().unwrap_or_else(|| base.id.to_string()),
                ParentStatus::NotLoaded,
            ),
            None => (base.id.to_string(), ParentStatus::NotLoaded),
        };

        let reason = match status {
            ParentStatus::Fundamental | ParentStatus::Std => Some("avoid inheritance ambiguity"),
            ParentStatus::NotLoaded => Some("not loaded or accepted type"),
            ParentStatus::Loaded(_) => None,
        };
        if let Some(reason) = reason {
            session.diagnostics.record(
                NoticeKind::ParentClassIgnored,
                name.clone(),
                format!("parent of {child}: {reason}"),
            );
        }

        parents.push(ParentInfo {
            name,
            access: base.access,
            is_virtual: base.is_virtual,
            status,
        });
    }
    parents
}

/// Loaded ancestors reachable through loaded parents, furthest first.
fn loaded_ancestors(ctx: &GenContext<'_>, class: &ClassRecord) -> Vec<GeneratedNames> {
    fn visit(
        ctx: &GenContext<'_>,
        class: &ClassRecord,
        visited: &mut HashSet<RecordId>,
        out: &mut Vec<GeneratedNames>,
    ) {
        for base in &class.bases {
            let Some(Record::Class(parent)) = ctx.table.lookup(&base.id) else {
                continue;
            };
            let Some(names) = ctx.names.get(&parent.qualified_name()) else {
                continue;
            };
            if !visited.insert(parent.id.clone()) {
                continue;
            }
            out.push(names.clone());
            visit(ctx, parent, visited, out);
        }
    }

    let mut visited = HashSet::new();
    let mut out = Vec::new();
    visit(ctx, class, &mut visited, &mut out);
    out.reverse();
    out
}

/// Own members followed, when configured, by the public members of parents
/// that are not loaded. Inherited members hidden by a same-named member
/// lower in the hierarchy are dropped.
fn collect_members<'a>(
    ctx: &GenContext<'a>,
    class: &'a ClassRecord,
) -> Result<Vec<(&'a ClassRecord, &'a MemberRecord)>> {
    let table = ctx.table;
    let mut members = Vec::new();
    let mut seen_names = HashSet::new();
    for id in &class.members {
        let member = table.member(id)?;
        seen_names.insert(member.name.clone());
        members.push((class, member));
    }
    if !ctx.config.load.inherited_members {
        return Ok(members);
    }

    let mut visited = HashSet::new();
    let mut queue: Vec<&'a ClassRecord> = vec![class];
    while let Some(current) = queue.pop() {
        for base in &current.bases {
            let Some(Record::Class(parent)) = table.lookup(&base.id) else {
                continue;
            };
            if ctx.names.is_loaded(&parent.qualified_name()) || !visited.insert(parent.id.clone()) {
                continue;
            }
            let mut declared_here = Vec::new();
            for id in &parent.members {
                let member = table.member(id)?;
                let inheritable = member.access == Access::Public
                    && matches!(
                        member.kind,
                        MemberKind::Method | MemberKind::Operator | MemberKind::Field
                    );
                if inheritable && !seen_names.contains(&member.name) {
                    members.push((parent, member));
                    declared_here.push(member.name.clone());
                }
            }
            seen_names.extend(declared_here);
            queue.push(parent);
        }
    }
    Ok(members)
}

/// Build the plan for a loaded class, recording a notice for everything
/// that is left out.
pub fn plan_class<'a>(
    ctx: &GenContext<'a>,
    session: &mut Session,
    class: &'a ClassRecord,
) -> Result<ClassPlan<'a>> {
    let qualified = class.qualified_name();
    let names = ctx
        .names
        .get(&qualified)
        .cloned()
        .ok_or_else(|| SynthError::Unregistered {
            class: qualified.clone(),
        })?;

    let mut plan = ClassPlan {
        class,
        names,
        flags: class_flags(ctx.table, class)?,
        parents: resolve_parents(ctx, session, class),
        loaded_ancestors: loaded_ancestors(ctx, class),
        methods: Vec::new(),
        fields: Vec::new(),
        constructors: Vec::new(),
        has_public_constructor: false,
    };

    for (owner, member) in collect_members(ctx, class)? {
        let inherited = owner.id != class.id;
        match member.kind {
            MemberKind::Destructor => {}
            MemberKind::Constructor => {
                if inherited || member.access != Access::Public || is_copy_constructor(class, member) {
                    continue;
                }
                plan.has_public_constructor = true;
                if plan.flags.has_pure_virtual {
                    continue;
                }
                for variant in arity_variants(&member.args) {
                    match check_member_function(ctx, class, member, variant.args)? {
                        Verdict::Accepted => plan.constructors.push(PlannedCallable {
                            member,
                            owner,
                            inherited,
                            args: variant.args,
                            removed: variant.removed,
                            uses_loaded: false,
                            interface_name: class.short_name().to_string(),
                        }),
                        Verdict::Rejected(reason) => session.diagnostics.record(
                            NoticeKind::MemberFunctionIgnored,
                            describe_call(&member_path(class, member), variant.args),
                            reason.to_string(),
                        ),
                    }
                }
            }
            MemberKind::Method | MemberKind::Operator => {
                if member.access != Access::Public || member.is_artificial {
                    continue;
                }
                // Replaced by the generated assignment on both sides.
                if member.kind == MemberKind::Operator && member.name == "=" {
                    continue;
                }
                let returns = member.return_type()?;
                let uses_loaded = ctx.uses_loaded(
                    std::iter::once(returns).chain(member.args.iter().map(|a| &a.ty)),
                );
                for variant in arity_variants(&member.args) {
                    match check_member_function(ctx, owner, member, variant.args)? {
                        Verdict::Accepted => {
                            let suffixed = uses_loaded || variant.is_truncated() || inherited;
                            plan.methods.push(PlannedCallable {
                                member,
                                owner,
                                inherited,
                                args: variant.args,
                                removed: variant.removed,
                                uses_loaded,
                                interface_name: interface_member_name(ctx, member, suffixed),
                            });
                        }
                        Verdict::Rejected(reason) => session.diagnostics.record(
                            NoticeKind::MemberFunctionIgnored,
                            describe_call(&member_path(owner, member), variant.args),
                            reason.to_string(),
                        ),
                    }
                }
            }
            MemberKind::Field => {
                if member.access != Access::Public || member.is_artificial {
                    continue;
                }
                match check_member_variable(ctx, owner, member)? {
                    Verdict::Accepted => {
                        let ty = member.return_type()?;
                        let loaded = ctx.loaded(ty).cloned();
                        let suffix = &ctx.affixes().code_suffix;
                        let shadow = match &loaded {
                            Some(_) if ty.is_pointer() => {
                                Some(format!("{}_wrapper{suffix}", member.name))
                            }
                            _ => None,
                        };
                        plan.fields.push(PlannedField {
                            member,
                            owner,
                            ty,
                            loaded,
                            accessor: format!("{}_ref{suffix}", member.name),
                            shadow,
                        });
                    }
                    Verdict::Rejected(reason) => session.diagnostics.record(
                        NoticeKind::MemberVariableIgnored,
                        member_path(owner, member),
                        reason.to_string(),
                    ),
                }
            }
        }
    }

    tracing::debug!(
        class = %qualified,
        methods = plan.methods.len(),
        fields = plan.fields.len(),
        constructors = plan.constructors.len(),
        "Planned class"
    );
    Ok(plan)
}
