// file: src/minify/mod.rs
// description: minification and unminification of document records
// reference: internal module structure

mod minifier;
mod unminifier;

pub use minifier::Minifier;
pub use unminifier::{FailurePolicy, UnminifyFailure, UnminifyOutcome, Unminifier};
