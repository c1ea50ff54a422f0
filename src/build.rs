mod assets;
mod builder;
mod document;
mod highlight;
mod index;
mod links;
mod markdown;
mod math;
mod post;
mod templates;

pub use assets::{dir_entries, empty_dir};
pub use builder::{Builder, base_path_from_config};
