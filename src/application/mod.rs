//! Application layer: presets, script language and services
//!
//! This layer drives the domain tree for concrete integer use cases.

pub mod error;
pub mod error_ext;
pub mod presets;
pub mod render;
pub mod script;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use presets::{Aggregation, IntTree, Operation};
pub use render::TreeRender;
pub use script::{parse_command, parse_script, Command, ScriptLine};
