pub mod precondition_validator;

pub use precondition_validator::PreconditionValidator;
