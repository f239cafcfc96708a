/// A named input for a benchmark.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    file: TestFile,
}

impl TestCase {
    pub const fn new(name: &'static str, file: TestFile) -> Self {
        Self { name, file }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn file(&self) -> &TestFile {
        &self.file
    }
}

/// A fixture file embedded with `include_str!`.
#[derive(Debug, Copy, Clone)]
pub struct TestFile {
    file_name: &'static str,
    content: &'static str,
}

impl TestFile {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }

    /// Non-empty lines, trimmed.
    pub fn lines(&self) -> impl Iterator<Item = &'static str> {
        self.content.lines().map(str::trim).filter(|line| !line.is_empty())
    }

    /// `Name: value` lines split into pairs. Lines without a colon are skipped.
    pub fn header_pairs(&self) -> Vec<(&'static str, &'static str)> {
        self.lines().filter_map(|line| line.split_once(':')).map(|(name, value)| (name.trim(), value.trim())).collect()
    }
}
