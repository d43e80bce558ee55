pub mod command;
pub mod grader;
pub mod normalize;
pub mod result;
pub mod runner;
pub mod testcase;

pub use command::*;
pub use grader::*;
pub use normalize::*;
pub use result::*;
pub use runner::*;
pub use testcase::*;
