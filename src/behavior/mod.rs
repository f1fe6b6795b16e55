pub mod tree;

pub use tree::{default_fallback_tree, Behavior};
