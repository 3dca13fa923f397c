pub mod directives;
pub mod loader;
pub mod parser;
pub mod tables;

pub use directives::{Directive, parse_directive};
pub use loader::ConfigLoader;
pub use parser::ConfigParser;
pub use tables::{RuleTables, domain};
