pub mod create_file;
pub mod read_file;

pub use create_file::{CreateFileParams, CreateFileTool};
pub use read_file::{ReadFileParams, ReadFileTool};
