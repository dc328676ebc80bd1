use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("{failed} of {total} documents failed")]
    BatchFailed { failed: usize, total: usize },
}
