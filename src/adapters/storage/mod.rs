pub mod json_file;
#[cfg(test)]
pub mod memory;

pub use json_file::JsonFileStorage;
#[cfg(test)]
pub use memory::InMemoryStorage;
