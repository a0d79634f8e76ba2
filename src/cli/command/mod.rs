pub mod fetch;
pub mod means;
pub mod merge;

pub use fetch::fetch;
pub use means::means;
pub use merge::merge;
