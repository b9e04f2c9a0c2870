//! Interface, Delegate and factory synthesis for dlwrap.
//!
//! Given a symbol table of a C++ library and a wrapping configuration,
//! produces the C++ that lets a host program use the library's classes
//! after loading it at runtime: an abstract Interface per class, a
//! concrete Delegate forwarding to it, exported factories, and the
//! lifetime protocol linking each Interface/Delegate pair.
//!
//! ## Modules
//!
//! - [`config`]: `dlwrap.toml` parsing and validation
//! - [`analyzer`]: which classes, functions and members can be loaded
//! - [`plan`]: per-class member selection and naming
//! - [`interface`], [`delegate`], [`factory`]: the three generated pieces
//! - [`augment`]: additions to the library's own classes
//! - [`functions`]: free-function wrappers
//! - [`lifetime`]: the pair ownership model and its C++ scaffolding
//! - [`generate`]: the run driver
//! - [`diagnostics`]: notices for everything skipped

pub mod analyzer;
pub mod augment;
pub mod config;
pub mod context;
pub mod delegate;
pub mod diagnostics;
pub mod emit;
pub mod error;
pub mod factory;
pub mod functions;
pub mod generate;
pub mod interface;
pub mod lifetime;
pub mod plan;
pub mod signature;
pub mod translate;

pub use config::WrapConfig;
pub use diagnostics::{Diagnostics, Notice, NoticeKind};
pub use error::{ProtocolError, Result, SynthError};
pub use factory::{FactoryRecord, FactoryReturn};
pub use functions::FunctionWrapper;
pub use generate::{generate, ClassOutput, GenerationOutput, LoadedType};
pub use lifetime::{Adoption, Boundary, DelegateHandle, InterfaceHandle, LinkedPair, Ownership};
pub use signature::FunctionSelector;
