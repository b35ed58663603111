pub mod pagination;

pub use pagination::{ListParams, PageRequest};
