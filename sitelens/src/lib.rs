// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    DataPaths,
    options_from_args,
    parse_url_line,
    resolve_data_paths,
};
