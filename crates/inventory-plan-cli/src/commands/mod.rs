pub mod assemble;
pub mod edit;
pub mod plan;
pub mod rollforward;
