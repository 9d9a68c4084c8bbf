pub mod block;
pub mod config;
pub mod context;
pub mod default_content;
pub mod detail;
pub mod dom;
pub mod engine;
pub mod error;
pub mod icon;
pub mod model;
pub mod overlay;
pub mod path;
pub mod report;
pub mod scheduler;
pub mod section;
pub mod session;

pub use config::EngineConfig;
pub use engine::{analyze, analyze_html};
pub use error::EngineError;
pub use model::{Block, BlockCategory, DetectionResult, Icon, Section, SsrRef};
pub use path::{ElementPath, decode_path, encode_path};
pub use session::Session;

pub fn print_banner() {
    println!(
        r#"
   __   __         __
  / /  / /__  ____/ /__ ___ _______  ___  ___
 / _ \/ / _ \/ __/  '_/(_-</ __/ _ \/ _ \/ -_)
/_.__/_/\___/\__/_/\_\/___/\__/\___/ .__/\__/
                                  /_/   v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
