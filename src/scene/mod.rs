pub mod captions;
pub mod history;
pub mod project;
pub mod timeline;
