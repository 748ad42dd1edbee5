pub mod file;

pub use file::FileSessionRepository;
