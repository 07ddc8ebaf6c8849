mod completions;
mod delete;
mod list;
mod upload;

pub use completions::run_completions;
pub use delete::run_delete;
pub use list::run_list;
pub use upload::run_upload;
