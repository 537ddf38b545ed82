pub mod index;
pub mod model;
pub mod search;
pub mod selection;
pub mod tree;
