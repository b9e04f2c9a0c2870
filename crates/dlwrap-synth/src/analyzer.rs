//! Loadability analysis.
//!
//! Decides which classes, functions and members can cross the load
//! boundary. A rejection is a verdict, not an error: the caller records a
//! notice and carries on. Only a broken symbol table aborts the run.

use std::fmt;

use dlwrap_core::operators::operator_name;
use dlwrap_core::records::{ArgRecord, ClassRecord, FunctionRecord, MemberKind, MemberRecord};
use dlwrap_core::{SymbolTable, TypeRef};

use crate::context::{GenContext, TypeClass};
use crate::error::Result;

/// Why something cannot be wrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    ExplicitlyExcluded,
    NotFound,
    Incomplete,
    Template,
    UnsupportedType { detail: String },
    UnsupportedOperator { symbol: String },
    StaticMember,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::ExplicitlyExcluded => write!(f, "explicitly excluded"),
            Rejection::NotFound => write!(f, "class/function not found"),
            Rejection::Incomplete => write!(f, "incomplete type"),
            Rejection::Template => write!(f, "template without concrete arguments"),
            Rejection::UnsupportedType { detail } => write!(f, "unsupported type: {detail}"),
            Rejection::UnsupportedOperator { symbol } => {
                write!(f, "unsupported operator: operator{symbol}")
            }
            Rejection::StaticMember => write!(f, "static member"),
        }
    }
}

/// Outcome of a loadability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Check a class named in the configuration.
pub fn check_class(ctx: &GenContext<'_>, qualified: &str) -> Verdict {
    if ctx.is_ditched(qualified) {
        return Verdict::Rejected(Rejection::ExplicitlyExcluded);
    }
    let Some(class) = ctx.table.class_by_name(qualified) else {
        return Verdict::Rejected(Rejection::NotFound);
    };
    if class.is_incomplete {
        return Verdict::Rejected(Rejection::Incomplete);
    }
    if class.is_template {
        return Verdict::Rejected(Rejection::Template);
    }
    Verdict::Accepted
}

/// Check one type used in a signature or field.
pub fn check_type(ctx: &GenContext<'_>, ty: &TypeRef) -> Result<Verdict> {
    if ty.pointer_depth > 1 {
        return Ok(Verdict::Rejected(Rejection::UnsupportedType {
            detail: format!("pointer-to-pointer '{ty}'"),
        }));
    }
    let verdict = match ctx.classify(ty)? {
        TypeClass::Unresolved => Verdict::Rejected(Rejection::NotFound),
        TypeClass::Unknown => Verdict::Rejected(Rejection::UnsupportedType {
            detail: format!("non-accepted type '{}'", ty.qualified_name()),
        }),
        TypeClass::Loaded if ty.is_array() => Verdict::Rejected(Rejection::UnsupportedType {
            detail: format!("array of loaded type '{ty}'"),
        }),
        _ => Verdict::Accepted,
    };
    Ok(verdict)
}

/// Check a return type (if any) and an argument list.
pub fn check_signature(
    ctx: &GenContext<'_>,
    returns: Option<&TypeRef>,
    args: &[ArgRecord],
) -> Result<Verdict> {
    for ty in returns.into_iter().chain(args.iter().map(|a| &a.ty)) {
        let verdict = check_type(ctx, ty)?;
        if !verdict.is_accepted() {
            return Ok(verdict);
        }
    }
    Ok(Verdict::Accepted)
}

/// Qualified name of a member, as used on the ditch list.
pub fn member_path(class: &ClassRecord, member: &MemberRecord) -> String {
    match member.kind {
        MemberKind::Operator => format!("{}::operator{}", class.qualified_name(), member.name),
        _ => format!("{}::{}", class.qualified_name(), member.name),
    }
}

/// Check a constructor, method or operator restricted to `args`.
pub fn check_member_function(
    ctx: &GenContext<'_>,
    class: &ClassRecord,
    member: &MemberRecord,
    args: &[ArgRecord],
) -> Result<Verdict> {
    if ctx.is_ditched(&member_path(class, member)) {
        return Ok(Verdict::Rejected(Rejection::ExplicitlyExcluded));
    }
    if member.is_static && member.kind != MemberKind::Constructor {
        return Ok(Verdict::Rejected(Rejection::StaticMember));
    }
    if member.kind == MemberKind::Operator && operator_name(&member.name).is_none() {
        return Ok(Verdict::Rejected(Rejection::UnsupportedOperator {
            symbol: member.name.clone(),
        }));
    }
    let returns = match member.kind {
        MemberKind::Method | MemberKind::Operator => Some(member.return_type()?),
        _ => None,
    };
    check_signature(ctx, returns, args)
}

/// Check a field.
pub fn check_member_variable(
    ctx: &GenContext<'_>,
    class: &ClassRecord,
    member: &MemberRecord,
) -> Result<Verdict> {
    if ctx.is_ditched(&member_path(class, member)) {
        return Ok(Verdict::Rejected(Rejection::ExplicitlyExcluded));
    }
    if member.is_static {
        return Ok(Verdict::Rejected(Rejection::StaticMember));
    }
    check_type(ctx, member.return_type()?)
}

/// Check a free function restricted to `args`.
pub fn check_function(
    ctx: &GenContext<'_>,
    function: &FunctionRecord,
    args: &[ArgRecord],
) -> Result<Verdict> {
    if ctx.is_ditched(&function.qualified_name()) {
        return Ok(Verdict::Rejected(Rejection::ExplicitlyExcluded));
    }
    check_signature(ctx, Some(function.return_type()?), args)
}

/// Whether `member` is a copy constructor of `class`: a public constructor
/// taking exactly one argument whose base type is the class itself.
pub fn is_copy_constructor(class: &ClassRecord, member: &MemberRecord) -> bool {
    member.kind == MemberKind::Constructor
        && member.args.len() == 1
        && member.args[0].ty.element.as_ref() == Some(&class.id)
}

/// Whether `member` is a copy-assignment operator of `class`: `operator=`
/// taking one argument of the class type and returning void or the class.
pub fn is_assignment_operator(class: &ClassRecord, member: &MemberRecord) -> bool {
    if member.kind != MemberKind::Operator || member.name != "=" || member.args.len() != 1 {
        return false;
    }
    if member.args[0].ty.element.as_ref() != Some(&class.id) {
        return false;
    }
    match &member.value_type {
        Some(returns) => returns.is_void() || returns.element.as_ref() == Some(&class.id),
        None => false,
    }
}

/// Properties of a class that decide which protocol members it gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassFlags {
    /// Declares at least one pure-virtual member function.
    pub has_pure_virtual: bool,
    pub has_copy_constructor: bool,
    pub has_assignment_operator: bool,
}

impl ClassFlags {
    /// `pointer_copy` can be generated.
    pub fn copyable(&self) -> bool {
        self.has_copy_constructor && !self.has_pure_virtual
    }

    /// `pointer_assign` can be generated.
    pub fn assignable(&self) -> bool {
        self.has_assignment_operator && !self.has_pure_virtual
    }
}

/// Inspect a class's members for its [`ClassFlags`].
pub fn class_flags(table: &dyn SymbolTable, class: &ClassRecord) -> Result<ClassFlags> {
    let mut flags = ClassFlags::default();
    for id in &class.members {
        let member = table.member(id)?;
        if member.is_pure_virtual {
            flags.has_pure_virtual = true;
        }
        if member.access != dlwrap_core::Access::Public {
            continue;
        }
        if is_copy_constructor(class, member) {
            flags.has_copy_constructor = true;
        }
        if is_assignment_operator(class, member) {
            flags.has_assignment_operator = true;
        }
    }
    Ok(flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WrapConfig;
    use dlwrap_core::{Access, QualifiedName, RecordId, SymbolIndex, TableBuilder};

    struct Fixture {
        table: SymbolIndex,
        foo: RecordId,
        get: RecordId,
        shift: RecordId,
        set_other: RecordId,
    }

    fn fixture() -> Fixture {
        let mut b = TableBuilder::new();
        let double = b.fundamental("double");
        let foo = b.add_class("ns::Foo");
        let other = b.add_class("ns::Other");
        let other_ty = b.class_type(&other);
        b.add_implicit_members(&foo);
        let get = b.add_method(&foo, "get", double.clone(), vec![]);
        let shift = b.add_operator(&foo, "<=>", double.clone(), vec![]);
        let set_other = b.add_method(
            &foo,
            "set_other",
            TypeRef::named("void"),
            vec![ArgRecord::new(other_ty.reference(), "o")],
        );
        Fixture {
            table: b.build().unwrap(),
            foo,
            get,
            shift,
            set_other,
        }
    }

    #[test]
    fn class_verdicts() {
        let mut b = TableBuilder::new();
        let fwd = b.add_class("ns::Fwd");
        b.mark_incomplete(&fwd);
        let tmpl = b.add_class("ns::Tmpl");
        b.mark_template(&tmpl);
        b.add_class("ns::Skip");
        b.add_class("ns::Ok");
        let table = b.build().unwrap();
        let config = WrapConfig::parse("[load]\nditch = [\"ns::Skip\"]").unwrap();
        let ctx = GenContext::new(&table, &config);

        assert_eq!(check_class(&ctx, "ns::Ok"), Verdict::Accepted);
        assert_eq!(check_class(&ctx, "ns::Fwd"), Verdict::Rejected(Rejection::Incomplete));
        assert_eq!(check_class(&ctx, "ns::Tmpl"), Verdict::Rejected(Rejection::Template));
        assert_eq!(
            check_class(&ctx, "ns::Skip"),
            Verdict::Rejected(Rejection::ExplicitlyExcluded)
        );
        assert_eq!(check_class(&ctx, "ns::Missing"), Verdict::Rejected(Rejection::NotFound));
        assert_eq!(Rejection::NotFound.to_string(), "class/function not found");
    }

    #[test]
    fn member_function_verdicts() {
        let f = fixture();
        let config = WrapConfig::parse("[load]\nditch = [\"ns::Foo::get\"]").unwrap();
        let mut ctx = GenContext::new(&f.table, &config);
        ctx.names.register(QualifiedName::parse("ns::Foo"));
        let foo = f.table.class(&f.foo).unwrap();

        let get = f.table.member(&f.get).unwrap();
        assert_eq!(
            check_member_function(&ctx, foo, get, &get.args).unwrap(),
            Verdict::Rejected(Rejection::ExplicitlyExcluded)
        );

        let shift = f.table.member(&f.shift).unwrap();
        assert!(matches!(
            check_member_function(&ctx, foo, shift, &shift.args).unwrap(),
            Verdict::Rejected(Rejection::UnsupportedOperator { .. })
        ));

        let set_other = f.table.member(&f.set_other).unwrap();
        let verdict = check_member_function(&ctx, foo, set_other, &set_other.args).unwrap();
        assert!(matches!(verdict, Verdict::Rejected(Rejection::UnsupportedType { .. })));
    }

    #[test]
    fn pointer_to_pointer_is_unsupported() {
        let f = fixture();
        let config = WrapConfig::default();
        let ctx = GenContext::new(&f.table, &config);
        let ty = TypeRef::named("double").pointer().pointer();
        assert!(!check_type(&ctx, &ty).unwrap().is_accepted());
    }

    #[test]
    fn implicit_members_give_copy_and_assignment() {
        let f = fixture();
        let foo = f.table.class(&f.foo).unwrap();
        let flags = class_flags(&f.table, foo).unwrap();
        assert!(flags.has_copy_constructor);
        assert!(flags.has_assignment_operator);
        assert!(!flags.has_pure_virtual);
        assert!(flags.copyable() && flags.assignable());
    }

    #[test]
    fn pure_virtual_suppresses_copy_and_assignment() {
        let mut b = TableBuilder::new();
        let double = b.fundamental("double");
        let shape = b.add_class("geo::Shape");
        b.add_implicit_members(&shape);
        let area = b.add_method(&shape, "area", double, vec![]);
        b.member_mut(&area).unwrap().is_pure_virtual = true;
        let hidden = b.add_constructor(&shape, vec![ArgRecord::new(TypeRef::named("int"), "n")]);
        b.member_mut(&hidden).unwrap().access = Access::Private;
        let table = b.build().unwrap();
        let flags = class_flags(&table, table.class(&shape).unwrap()).unwrap();
        assert!(flags.has_pure_virtual);
        assert!(flags.has_copy_constructor);
        assert!(!flags.copyable());
        assert!(!flags.assignable());
    }

    #[test]
    fn missing_member_record_is_fatal() {
        let mut b = TableBuilder::new();
        let foo = b.add_class("ns::Foo");
        let table = b.build().unwrap();
        let mut class = table.class(&foo).unwrap().clone();
        class.members.push(RecordId::new("_404"));
        assert!(class_flags(&table, &class).is_err());
    }
}
