mod attributes;
mod parser;

pub use parser::parse;
