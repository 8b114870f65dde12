pub mod completions;
pub mod convert;
pub mod interactive;
