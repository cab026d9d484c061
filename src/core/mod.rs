pub mod links;
pub mod services;
pub mod utils;
pub mod workspace;

pub use links::PageRequest;
pub use workspace::{Collection, LoadMetadata, Workspace, WorkspaceManager};
