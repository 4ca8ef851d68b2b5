/// Name, size and permission bits of a payload placed into an image layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub mode: u32,
}

impl FileInfo {
    pub fn new(name: impl Into<String>, size: u64, mode: u32) -> Self {
        Self {
            name: name.into(),
            size,
            mode,
        }
    }
}
