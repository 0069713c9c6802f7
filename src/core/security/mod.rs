// Security module for path validation and access control
//
// File tools are restricted to the configured workspace root, preventing
// path traversal and writes outside the project.

pub mod path_validator;

pub use path_validator::{PathSecurityError, validate_path, validate_write_path};
