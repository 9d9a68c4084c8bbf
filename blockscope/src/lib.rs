pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{load_config, load_resource_urls_from_file, parse_resource_line};
