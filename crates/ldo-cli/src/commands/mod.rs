//! Command implementations.

pub mod describe;
pub mod run;

pub use self::describe::execute_describe;
pub use self::run::execute_run;
