//! Command dispatch and binding engine.
//!
//! Turns free-text triggers into typed handler calls: registry lookup,
//! overload resolution, parameter coercion, scope and permission gating,
//! invocation and result normalisation.

mod arguments;
mod binder;
mod coerce;
mod context;
mod dispatcher;
mod error;
mod gate;
mod invoker;
mod registry;
mod resolver;
mod result;
mod types;

pub use arguments::{Arguments, BoundArgument};
pub use binder::{Binder, Binding};
pub use coerce::Coerce;
pub use context::*;
pub use dispatcher::{Dispatcher, PrefixSource, Stage, StaticPrefix};
pub use error::*;
pub use gate::{CapabilityService, Gate};
pub use invoker::Invoker;
pub use registry::Registry;
pub use resolver::{Resolved, Resolver};
pub use result::{InvocationResult, RichField, RichPayload};
pub use types::*;
