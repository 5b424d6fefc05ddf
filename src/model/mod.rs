//! Model loading: definitions, the validated registry and metadata export

pub mod definition;
pub mod metadata;
pub mod registry;

pub use definition::{ModelDefinition, ModelFormat, RuleDefinition, SetDefinition, VariableDefinition};
pub use metadata::{FuzzyMetadata, FuzzySetInfo, RuleInfo, VariableInfo};
pub use registry::Registry;
