pub mod config;
pub mod load;
pub mod pipeline;
pub mod process;
pub mod storage;
pub mod transfer;
pub mod warehouse;

#[cfg(test)]
pub(crate) mod testing;
