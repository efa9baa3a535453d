pub mod analysis;
pub mod exec;
pub mod fleet;

pub use exec::exec;
