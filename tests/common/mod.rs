#![allow(dead_code)]

pub mod builders;
pub mod store_fake;

pub use builders::*;
pub use store_fake::*;
