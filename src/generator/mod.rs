pub mod operation;
pub mod operations;
pub mod schema;
pub mod types;

pub use operation::{GenerationOperation, PromptTemplate};
pub use types::OperationKind;

#[cfg(test)]
mod tests;
