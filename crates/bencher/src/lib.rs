//! Shared fixtures for the micro-scan benchmarks.

/// A request fixture read through buffers of one capacity.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    file: TestFile,
    buffer_capacity: usize,
}

impl TestCase {
    pub fn new(name: &'static str, file: TestFile, buffer_capacity: usize) -> Self {
        Self { name, file, buffer_capacity }
    }

    /// The whole request fits into one buffer.
    pub fn single_buffer(name: &'static str, file: TestFile) -> Self {
        Self::new(name, file, file.len().next_power_of_two())
    }

    /// The request is spread over many small buffers, so most tokens cross a boundary.
    pub fn fragmented(name: &'static str, file: TestFile) -> Self {
        Self::new(name, file, 16)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn file(&self) -> &TestFile {
        &self.file
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TestFile {
    file_name: &'static str,
    content: &'static str,
}

impl TestFile {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn bytes(&self) -> &'static [u8] {
        self.content.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }
}
