//! Use cases (application services)

pub mod execute_query;
pub(crate) mod shared;
pub mod translate_and_run;
