//! Inputs shared by the micro-rest benchmarks.

#[derive(Debug, Copy, Clone)]
pub struct BenchCase {
    name: &'static str,
    size: CaseSize,
    fixture: Fixture,
}

impl BenchCase {
    pub fn new(name: &'static str, size: CaseSize, fixture: Fixture) -> Self {
        Self { name, size, fixture }
    }

    pub fn small(name: &'static str, fixture: Fixture) -> Self {
        Self::new(name, CaseSize::Small, fixture)
    }

    pub fn normal(name: &'static str, fixture: Fixture) -> Self {
        Self::new(name, CaseSize::Normal, fixture)
    }

    pub fn large(name: &'static str, fixture: Fixture) -> Self {
        Self::new(name, CaseSize::Large, fixture)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn size(&self) -> CaseSize {
        self.size
    }

    pub fn fixture(&self) -> &Fixture {
        &self.fixture
    }
}

/// A resource file compiled into the benchmark binary.
#[derive(Debug, Copy, Clone)]
pub struct Fixture {
    file_name: &'static str,
    content: &'static str,
}

impl Fixture {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }

    /// Non blank lines, trimmed.
    pub fn lines(&self) -> impl Iterator<Item = &'static str> {
        self.content.lines().map(str::trim).filter(|line| !line.is_empty())
    }
}

#[derive(Clone, Copy, Debug)]
pub enum CaseSize {
    Small,
    Normal,
    Large,
}
