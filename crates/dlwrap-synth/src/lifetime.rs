//! The Interface/Delegate lifetime protocol.
//!
//! A library object (seen through its Interface) and a host object (its
//! Delegate) form a linked pair. Exactly one side owns the other at any time:
//!
//! - a Delegate built through a factory owns its Interface object;
//! - a Delegate materialized on demand by the Interface (`init_wrapper`) is
//!   owned by the Interface object;
//! - destroying either end unlinks the pair and frees the other end only if
//!   the destroyed end owned it.
//!
//! [`Boundary`] is an executable model of these rules. The `write_*`
//! functions emit the C++ members that implement them, so the generated code
//! and the model are defined side by side.

use std::fmt;

use dlwrap_core::names::{split_template, NameAffixes};

use crate::emit::CodeWriter;
use crate::error::ProtocolError;

/// An Interface-side (library) object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceHandle(usize);

impl fmt::Display for InterfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I{}", self.0)
    }
}

/// A Delegate-side (host) object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DelegateHandle(usize);

impl fmt::Display for DelegateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{}", self.0)
    }
}

/// Which end of a pair is responsible for freeing the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Unlinked,
    /// The Interface object deletes its companion Delegate.
    OwnedByInterfaceSide,
    /// The Delegate deletes the Interface object behind it.
    OwnedByDelegateSide,
}

/// How a Delegate adopts an existing Interface object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adoption {
    /// The Delegate borrows the object and the object takes ownership of
    /// the Delegate (the creation-hook path).
    Borrowed,
    /// The Delegate takes ownership of a freshly allocated object (by-value
    /// returns).
    Owned,
}

/// One Interface/Delegate link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkedPair {
    pub interface: InterfaceHandle,
    pub delegate: DelegateHandle,
    pub ownership: Ownership,
}

impl LinkedPair {
    /// The two ownership flags as the generated code stores them:
    /// `(delete_wrapper, owns_BEptr)`.
    pub fn flags(&self) -> (bool, bool) {
        match self.ownership {
            Ownership::Unlinked => (false, false),
            Ownership::OwnedByInterfaceSide => (true, false),
            Ownership::OwnedByDelegateSide => (false, true),
        }
    }

    pub fn is_linked(&self) -> bool {
        self.ownership != Ownership::Unlinked
    }
}

/// An object freed by a destroy operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Freed {
    Interface(InterfaceHandle),
    Delegate(DelegateHandle),
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    alive: bool,
    pair: Option<usize>,
}

/// Model of every object on both sides of the load boundary.
#[derive(Debug, Clone, Default)]
pub struct Boundary {
    interfaces: Vec<Slot>,
    delegates: Vec<Slot>,
    pairs: Vec<LinkedPair>,
    freed: Vec<Freed>,
}

impl Boundary {
    pub fn new() -> Self {
        Self::default()
    }

    fn interface_slot(&self, handle: InterfaceHandle) -> Result<Slot, ProtocolError> {
        let slot = self
            .interfaces
            .get(handle.0)
            .copied()
            .ok_or(ProtocolError::UnknownInterface(handle))?;
        if !slot.alive {
            return Err(ProtocolError::InterfaceDestroyed(handle));
        }
        Ok(slot)
    }

    fn delegate_slot(&self, handle: DelegateHandle) -> Result<Slot, ProtocolError> {
        let slot = self
            .delegates
            .get(handle.0)
            .copied()
            .ok_or(ProtocolError::UnknownDelegate(handle))?;
        if !slot.alive {
            return Err(ProtocolError::DelegateDestroyed(handle));
        }
        Ok(slot)
    }

    fn link(&mut self, interface: InterfaceHandle, ownership: Ownership) -> DelegateHandle {
        let delegate = DelegateHandle(self.delegates.len());
        let pair = self.pairs.len();
        self.pairs.push(LinkedPair {
            interface,
            delegate,
            ownership,
        });
        self.delegates.push(Slot {
            alive: true,
            pair: Some(pair),
        });
        self.interfaces[interface.0].pair = Some(pair);
        delegate
    }

    fn unlink(&mut self, pair: usize) -> LinkedPair {
        let before = self.pairs[pair];
        self.pairs[pair].ownership = Ownership::Unlinked;
        self.interfaces[before.interface.0].pair = None;
        self.delegates[before.delegate.0].pair = None;
        before
    }

    /// A library object created by library code, with no companion yet.
    pub fn create_interface(&mut self) -> InterfaceHandle {
        let handle = InterfaceHandle(self.interfaces.len());
        self.interfaces.push(Slot {
            alive: true,
            pair: None,
        });
        handle
    }

    /// A Delegate constructed through a factory: the factory allocates the
    /// library object and the Delegate owns it.
    pub fn construct_via_factory(&mut self) -> DelegateHandle {
        let interface = self.create_interface();
        self.link(interface, Ownership::OwnedByDelegateSide)
    }

    /// The pointer-adopting Delegate constructor.
    pub fn adopt(
        &mut self,
        interface: InterfaceHandle,
        adoption: Adoption,
    ) -> Result<DelegateHandle, ProtocolError> {
        if self.interface_slot(interface)?.pair.is_some() {
            return Err(ProtocolError::AlreadyLinked(interface));
        }
        let ownership = match adoption {
            Adoption::Borrowed => Ownership::OwnedByInterfaceSide,
            Adoption::Owned => Ownership::OwnedByDelegateSide,
        };
        Ok(self.link(interface, ownership))
    }

    /// `init_wrapper`: return the companion, creating it on first use.
    /// Calling it again returns the same Delegate.
    pub fn materialize(&mut self, interface: InterfaceHandle) -> Result<DelegateHandle, ProtocolError> {
        match self.interface_slot(interface)?.pair {
            Some(pair) => Ok(self.pairs[pair].delegate),
            None => self.adopt(interface, Adoption::Borrowed),
        }
    }

    /// `get_BEptr`: the Interface object behind a Delegate.
    pub fn get_be_ptr(&self, delegate: DelegateHandle) -> Result<InterfaceHandle, ProtocolError> {
        match self.delegate_slot(delegate)?.pair {
            Some(pair) => Ok(self.pairs[pair].interface),
            None => Err(ProtocolError::NotLinked(delegate)),
        }
    }

    /// `get_wptr`: the companion of an Interface object, if any.
    pub fn companion(&self, interface: InterfaceHandle) -> Result<Option<DelegateHandle>, ProtocolError> {
        Ok(self
            .interface_slot(interface)?
            .pair
            .map(|pair| self.pairs[pair].delegate))
    }

    /// Current link of a Delegate.
    pub fn pair_of(&self, delegate: DelegateHandle) -> Option<&LinkedPair> {
        let slot = self.delegates.get(delegate.0)?;
        slot.pair.map(|pair| &self.pairs[pair])
    }

    /// Delegate destructor. Frees the Interface object too if the Delegate
    /// owned it.
    pub fn destroy_delegate(&mut self, delegate: DelegateHandle) -> Result<Vec<Freed>, ProtocolError> {
        let slot = self.delegate_slot(delegate)?;
        let mut freed = vec![Freed::Delegate(delegate)];
        self.delegates[delegate.0].alive = false;
        if let Some(pair) = slot.pair {
            let before = self.unlink(pair);
            if before.ownership == Ownership::OwnedByDelegateSide {
                self.interfaces[before.interface.0].alive = false;
                freed.push(Freed::Interface(before.interface));
            }
        }
        self.freed.extend(freed.iter().copied());
        Ok(freed)
    }

    /// Interface destructor. Frees the companion too if the Interface
    /// object owned it.
    pub fn destroy_interface(&mut self, interface: InterfaceHandle) -> Result<Vec<Freed>, ProtocolError> {
        let slot = self.interface_slot(interface)?;
        let mut freed = vec![Freed::Interface(interface)];
        self.interfaces[interface.0].alive = false;
        if let Some(pair) = slot.pair {
            let before = self.unlink(pair);
            if before.ownership == Ownership::OwnedByInterfaceSide {
                self.delegates[before.delegate.0].alive = false;
                freed.push(Freed::Delegate(before.delegate));
            }
        }
        self.freed.extend(freed.iter().copied());
        Ok(freed)
    }

    pub fn is_interface_alive(&self, handle: InterfaceHandle) -> bool {
        self.interfaces.get(handle.0).is_some_and(|s| s.alive)
    }

    pub fn is_delegate_alive(&self, handle: DelegateHandle) -> bool {
        self.delegates.get(handle.0).is_some_and(|s| s.alive)
    }

    pub fn live_interfaces(&self) -> Vec<InterfaceHandle> {
        (0..self.interfaces.len())
            .map(InterfaceHandle)
            .filter(|h| self.is_interface_alive(*h))
            .collect()
    }

    pub fn live_delegates(&self) -> Vec<DelegateHandle> {
        (0..self.delegates.len())
            .map(DelegateHandle)
            .filter(|h| self.is_delegate_alive(*h))
            .collect()
    }

    pub fn linked_pairs(&self) -> impl Iterator<Item = &LinkedPair> {
        self.pairs.iter().filter(|p| p.is_linked())
    }

    /// Every object freed so far, in order.
    pub fn freed(&self) -> &[Freed] {
        &self.freed
    }
}

/// Which build a generated Interface declaration is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// Compiled into the library: protocol members have bodies.
    Library,
    /// Compiled into the host: lifetime hooks stay pure virtual, so calls
    /// dispatch into the library's implementation.
    Host,
}

/// Members every Interface declares for the protocol.
pub const INTERFACE_PROTOCOL_MEMBERS: [&str; 7] = [
    "get_wptr",
    "set_wptr",
    "get_delete_wrapper",
    "set_delete_wrapper",
    "init_wrapper",
    "get_init_wptr",
    "get_init_wref",
];

/// Names the Interface protocol block is written with.
#[derive(Debug, Clone)]
pub struct InterfaceProtocol {
    /// Interface class name, with template arguments for specializations.
    pub interface: String,
    /// Delegate type as spelled inside the Interface.
    pub delegate: String,
    /// Loaded ancestor Interfaces, furthest first.
    pub ancestors: Vec<String>,
    /// Shadow members to null in the constructors.
    pub shadows: Vec<String>,
}

/// Write the companion bookkeeping, constructors, `init_wrapper` family and
/// destructor of an Interface class body.
pub fn write_interface_protocol(w: &mut CodeWriter, p: &InterfaceProtocol, flavor: Flavor) {
    let iface = &p.interface;
    let ctor = split_template(iface).0;
    let delegate = &p.delegate;

    w.line("private:");
    w.indent();
    w.line(format!("{delegate}* wptr;"));
    w.line("bool delete_wrapper;");
    w.dedent();
    w.line("public:");
    w.indent();
    w.line(format!("{delegate}* get_wptr() {{ return wptr; }}"));
    if p.ancestors.is_empty() {
        w.line(format!("void set_wptr({delegate}* wptr_in) {{ wptr = wptr_in; }}"));
    } else {
        // Converting to an ancestor's Delegate needs the complete type.
        w.line(format!("void set_wptr({delegate}* wptr_in);"));
    }
    w.line("bool get_delete_wrapper() { return delete_wrapper; }");
    let mut set_delete = vec!["delete_wrapper = del_wrp_in;".to_string()];
    set_delete.extend(
        p.ancestors
            .iter()
            .map(|a| format!("{a}::set_delete_wrapper(del_wrp_in);")),
    );
    w.line(format!(
        "void set_delete_wrapper(bool del_wrp_in) {{ {} }}",
        set_delete.join(" ")
    ));
    w.dedent();
    w.blank();

    let mut init = vec!["wptr = 0;".to_string(), "delete_wrapper = false;".to_string()];
    init.extend(p.shadows.iter().map(|s| format!("{s} = 0;")));

    w.line("public:");
    w.indent();
    w.function(format!("{ctor}()"), &init);
    w.blank();

    let chain: Vec<String> = p.ancestors.iter().map(|a| format!("{a}(in)")).collect();
    let header = if chain.is_empty() {
        format!("{ctor}(const {iface}& in)")
    } else {
        format!("{ctor}(const {iface}& in) : {}", chain.join(", "))
    };
    w.function(header, &init);
    w.blank();

    // Assignment keeps the companion link of the target untouched; values
    // are copied through pointer_assign instead.
    w.line(format!("{iface}& operator=(const {iface}&) {{ return *this; }}"));
    w.blank();

    match flavor {
        Flavor::Library => {
            w.open("virtual void init_wrapper()");
            w.open("if (wptr == 0)");
            w.line("set_wptr(wrapper_creator(this));");
            w.line("set_delete_wrapper(true);");
            w.close("");
            w.close("");
        }
        Flavor::Host => w.line("virtual void init_wrapper() =0;"),
    }
    w.blank();

    w.function(
        format!("{delegate}* get_init_wptr()"),
        &["init_wrapper();".to_string(), "return wptr;".to_string()],
    );
    w.blank();
    w.function(
        format!("{delegate}& get_init_wref()"),
        &["init_wrapper();".to_string(), "return *wptr;".to_string()],
    );
    w.blank();

    match flavor {
        Flavor::Library => {
            w.open(format!("virtual ~{ctor}()"));
            w.open("if (wptr != 0)");
            w.line("set_delete_BEptr(wptr, false);");
            w.open("if (delete_wrapper == true)");
            w.line("wrapper_deleter(wptr);");
            w.close("");
            w.line("wptr = 0;");
            w.line("delete_wrapper = false;");
            for ancestor in &p.ancestors {
                w.line(format!("{ancestor}::set_wptr(0);"));
            }
            w.close("");
            w.close("");
        }
        Flavor::Host => w.line(format!("virtual ~{ctor}() {{}}")),
    }
    w.dedent();
}

/// Out-of-class protocol members, written after the Delegate class. Empty
/// unless the Interface has loaded ancestors.
pub fn write_protocol_definitions(w: &mut CodeWriter, p: &InterfaceProtocol) {
    if p.ancestors.is_empty() {
        return;
    }
    let mut body = vec!["wptr = wptr_in;".to_string()];
    body.extend(p.ancestors.iter().map(|a| format!("{a}::set_wptr(wptr_in);")));
    w.function(
        format!(
            "inline void {}::set_wptr({}* wptr_in)",
            p.interface, p.delegate
        ),
        &body,
    );
}

/// Declarations of the creation, deletion and ownership hooks an Interface
/// calls, written before the Interface class.
pub fn write_hook_declarations(w: &mut CodeWriter, interface: &str, delegate: &str) {
    w.line(format!("{delegate}* wrapper_creator({interface}*);"));
    w.line(format!("void wrapper_deleter({delegate}*);"));
    w.line(format!("void set_delete_BEptr({delegate}*, bool);"));
}

/// Definitions of the hooks, written after the Delegate class.
pub fn write_hook_definitions(w: &mut CodeWriter, interface: &str, delegate: &str) {
    w.function(
        format!("inline {delegate}* wrapper_creator({interface}* in)"),
        &[format!("return new {delegate}(in);")],
    );
    w.blank();
    w.function(
        format!("inline void wrapper_deleter({delegate}* in)"),
        &["delete in;".to_string()],
    );
    w.blank();
    w.function(
        format!("inline void set_delete_BEptr({delegate}* in, bool setting)"),
        &["in->set_delete_BEptr(setting);".to_string()],
    );
}

/// Body shared by every Delegate constructor once the Interface pointer is
/// set: register as companion without taking the Interface's ownership.
pub fn delegate_link_body() -> Vec<String> {
    vec![
        "get_BEptr()->set_wptr(this);".to_string(),
        "get_BEptr()->set_delete_wrapper(false);".to_string(),
    ]
}

/// Out-of-class Delegate destructor.
pub fn write_delegate_destructor(w: &mut CodeWriter, delegate: &str) {
    let dtor = split_template(delegate).0;
    w.open(format!("inline {delegate}::~{dtor}()"));
    w.open("if (get_BEptr() != 0)");
    w.line("get_BEptr()->set_wptr(0);");
    w.line("get_BEptr()->set_delete_wrapper(false);");
    w.open("if (can_delete_BEptr())");
    w.line("delete BEptr;");
    w.line("BEptr = 0;");
    w.close("");
    w.close("");
    w.line("set_delete_BEptr(false);");
    w.close("");
}

/// The common Interface and Delegate root classes.
pub fn write_roots(w: &mut CodeWriter, affixes: &NameAffixes) {
    let iroot = affixes.interface_root();
    let droot = affixes.delegate_root();

    w.open(format!("class {iroot}"));
    w.line("public:");
    w.indent();
    w.line(format!("{iroot}() {{}}"));
    w.line(format!("virtual ~{iroot}() {{}}"));
    w.dedent();
    w.close(";");
    w.blank();

    w.open(format!("class {droot}"));
    w.line("protected:");
    w.indent();
    w.line(format!("{iroot}* BEptr;"));
    w.line("bool owns_BEptr;");
    w.dedent();
    w.blank();
    w.line("public:");
    w.indent();
    w.line(format!(
        "{droot}({iroot}* in, bool owns_target) : BEptr(in), owns_BEptr(owns_target) {{}}"
    ));
    w.line("bool can_delete_BEptr() const { return owns_BEptr; }");
    w.line("void set_delete_BEptr(bool setting) { owns_BEptr = setting; }");
    w.line(format!("virtual ~{droot}() {{}}"));
    w.dedent();
    w.close(";");
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    #[test]
    fn factory_delegate_owns_its_interface() {
        let mut boundary = Boundary::new();
        let d = boundary.construct_via_factory();
        let i = boundary.get_be_ptr(d).unwrap();
        assert_eq!(boundary.companion(i).unwrap(), Some(d));
        assert_eq!(boundary.pair_of(d).unwrap().flags(), (false, true));

        let freed = boundary.destroy_delegate(d).unwrap();
        assert_eq!(freed, vec![Freed::Delegate(d), Freed::Interface(i)]);
        assert!(!boundary.is_interface_alive(i));
    }

    #[test]
    fn materialize_is_idempotent_and_interface_owned() {
        let mut boundary = Boundary::new();
        let i = boundary.create_interface();
        let first = boundary.materialize(i).unwrap();
        let second = boundary.materialize(i).unwrap();
        assert_eq!(first, second);
        assert_eq!(boundary.pair_of(first).unwrap().ownership, Ownership::OwnedByInterfaceSide);
        assert_eq!(boundary.get_be_ptr(first).unwrap(), i);

        let freed = boundary.destroy_interface(i).unwrap();
        assert_eq!(freed, vec![Freed::Interface(i), Freed::Delegate(first)]);
    }

    #[test]
    fn destroying_borrowing_delegate_leaves_interface() {
        let mut boundary = Boundary::new();
        let i = boundary.create_interface();
        let d = boundary.materialize(i).unwrap();
        assert_eq!(boundary.destroy_delegate(d).unwrap(), vec![Freed::Delegate(d)]);
        assert!(boundary.is_interface_alive(i));
        assert_eq!(boundary.companion(i).unwrap(), None);

        let again = boundary.materialize(i).unwrap();
        assert_ne!(again, d);
    }

    #[test]
    fn destroying_owned_interface_unlinks_delegate() {
        let mut boundary = Boundary::new();
        let d = boundary.construct_via_factory();
        let i = boundary.get_be_ptr(d).unwrap();
        boundary.destroy_interface(i).unwrap();
        assert!(boundary.is_delegate_alive(d));
        assert_eq!(boundary.get_be_ptr(d), Err(ProtocolError::NotLinked(d)));
        assert_eq!(boundary.destroy_delegate(d).unwrap(), vec![Freed::Delegate(d)]);
    }

    #[test]
    fn misuse_is_reported() {
        let mut boundary = Boundary::new();
        let i = boundary.create_interface();
        boundary.adopt(i, Adoption::Owned).unwrap();
        assert_eq!(
            boundary.adopt(i, Adoption::Borrowed),
            Err(ProtocolError::AlreadyLinked(i))
        );
        boundary.destroy_interface(i).unwrap();
        assert_eq!(
            boundary.destroy_interface(i),
            Err(ProtocolError::InterfaceDestroyed(i))
        );
        assert_eq!(
            boundary.materialize(InterfaceHandle(9)),
            Err(ProtocolError::UnknownInterface(InterfaceHandle(9)))
        );
    }

    #[derive(Debug, Clone)]
    enum Op {
        Factory,
        Create,
        Adopt(usize, bool),
        Materialize(usize),
        DestroyDelegate(usize),
        DestroyInterface(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Factory),
            Just(Op::Create),
            (0..8usize, any::<bool>()).prop_map(|(i, owned)| Op::Adopt(i, owned)),
            (0..8usize).prop_map(Op::Materialize),
            (0..8usize).prop_map(Op::DestroyDelegate),
            (0..8usize).prop_map(Op::DestroyInterface),
        ]
    }

    fn assert_consistent(boundary: &Boundary) {
        for pair in boundary.linked_pairs() {
            assert!(boundary.is_interface_alive(pair.interface));
            assert!(boundary.is_delegate_alive(pair.delegate));
            let (delete_wrapper, owns_target) = pair.flags();
            assert!(delete_wrapper != owns_target, "exactly one side owns a linked pair");
            assert_eq!(boundary.companion(pair.interface).unwrap(), Some(pair.delegate));
            assert_eq!(boundary.get_be_ptr(pair.delegate).unwrap(), pair.interface);
        }
        let mut counts: HashMap<Freed, usize> = HashMap::new();
        for freed in boundary.freed() {
            *counts.entry(*freed).or_default() += 1;
        }
        assert!(counts.values().all(|&n| n == 1), "an object was freed twice");
    }

    proptest! {
        #[test]
        fn every_object_is_freed_exactly_once(ops in proptest::collection::vec(op(), 0..64)) {
            let mut boundary = Boundary::new();
            for op in ops {
                match op {
                    Op::Factory => {
                        boundary.construct_via_factory();
                    }
                    Op::Create => {
                        boundary.create_interface();
                    }
                    Op::Adopt(i, owned) => {
                        let adoption = if owned { Adoption::Owned } else { Adoption::Borrowed };
                        let _ = boundary.adopt(InterfaceHandle(i), adoption);
                    }
                    Op::Materialize(i) => {
                        let _ = boundary.materialize(InterfaceHandle(i));
                    }
                    Op::DestroyDelegate(d) => {
                        let _ = boundary.destroy_delegate(DelegateHandle(d));
                    }
                    Op::DestroyInterface(i) => {
                        let _ = boundary.destroy_interface(InterfaceHandle(i));
                    }
                }
                assert_consistent(&boundary);
            }

            // Tear down whatever is left, host objects first.
            for d in boundary.live_delegates() {
                if boundary.is_delegate_alive(d) {
                    boundary.destroy_delegate(d).unwrap();
                }
            }
            for i in boundary.live_interfaces() {
                boundary.destroy_interface(i).unwrap();
            }
            assert_consistent(&boundary);
            prop_assert!(boundary.live_delegates().is_empty());
            prop_assert!(boundary.live_interfaces().is_empty());
            prop_assert_eq!(boundary.linked_pairs().count(), 0);
        }
    }

    #[test]
    fn interface_protocol_library_flavor() {
        let mut w = CodeWriter::new(4);
        let protocol = InterfaceProtocol {
            interface: "Abstract_Foo".to_string(),
            delegate: "ns::Wrapper_Foo".to_string(),
            ancestors: vec!["ns::Abstract_Base".to_string()],
            shadows: vec!["next_wrapper_BE".to_string()],
        };
        write_interface_protocol(&mut w, &protocol, Flavor::Library);
        let code = w.finish();
        assert!(code.contains("ns::Wrapper_Foo* wptr;"));
        assert!(code.contains("Abstract_Foo(const Abstract_Foo& in) : ns::Abstract_Base(in)"));
        assert!(code.contains("next_wrapper_BE = 0;"));
        assert!(code.contains("set_wptr(wrapper_creator(this));"));
        assert!(code.contains("void set_wptr(ns::Wrapper_Foo* wptr_in);"));
        assert!(code.contains("ns::Abstract_Base::set_delete_wrapper(del_wrp_in);"));
        assert!(code.contains("set_delete_BEptr(wptr, false);"));
        assert!(code.contains("ns::Abstract_Base::set_wptr(0);"));
        assert!(code.contains("Abstract_Foo& operator=(const Abstract_Foo&) { return *this; }"));
        for member in INTERFACE_PROTOCOL_MEMBERS {
            assert!(code.contains(member), "missing {member}");
        }
    }

    #[test]
    fn set_wptr_reaches_every_ancestor() {
        let mut w = CodeWriter::new(4);
        let protocol = InterfaceProtocol {
            interface: "Abstract_Leaf".to_string(),
            delegate: "Wrapper_Leaf".to_string(),
            ancestors: vec!["Abstract_Root".to_string(), "Abstract_Mid".to_string()],
            shadows: Vec::new(),
        };
        write_protocol_definitions(&mut w, &protocol);
        let code = w.finish();
        assert!(code.starts_with("inline void Abstract_Leaf::set_wptr(Wrapper_Leaf* wptr_in)"));
        assert!(code.contains("Abstract_Root::set_wptr(wptr_in);"));
        assert!(code.contains("Abstract_Mid::set_wptr(wptr_in);"));

        let mut empty = CodeWriter::new(4);
        write_protocol_definitions(&mut empty, &InterfaceProtocol { ancestors: Vec::new(), ..protocol });
        assert!(empty.is_empty());
    }

    #[test]
    fn interface_protocol_host_flavor_keeps_hooks_virtual() {
        let mut w = CodeWriter::new(4);
        let protocol = InterfaceProtocol {
            interface: "Abstract_Foo".to_string(),
            delegate: "ns::Wrapper_Foo".to_string(),
            ancestors: Vec::new(),
            shadows: Vec::new(),
        };
        write_interface_protocol(&mut w, &protocol, Flavor::Host);
        let code = w.finish();
        assert!(code.contains("virtual void init_wrapper() =0;"));
        assert!(code.contains("virtual ~Abstract_Foo() {}"));
        assert!(!code.contains("wrapper_creator"));
    }
}
