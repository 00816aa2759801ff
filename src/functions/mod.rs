//! Local functions
//!
//! The catalog advertised to the reasoner, argument validation against each
//! function's parameter schema, and the handlers that execute validated calls.

mod args;
mod handlers;
mod registry;
mod result;
mod spec;

pub use args::{SmartMoneyArgs, SwapQuoteArgs, TraderArgs};
pub use handlers::LocalHandlers;
pub use registry::{registry, FunctionCall, FunctionRegistry, LocalFunction, ParsedCall};
pub use result::LocalFunctionResult;
pub use spec::{FunctionSpec, ParamType, ParameterSchema, ParameterSpec, Properties};
