/// Limits applied while matching.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ScanConfig {
    /// Maximum number of nested rule attempts. An attempt that would nest deeper fails as if the
    /// rule did not match.
    ///
    /// Left recursion is cut off on its own, this only bounds the memory used by deeply right
    /// recursive matches.
    pub max_depth: u32,
}

impl ScanConfig {
    pub const DEFAULT_MAX_DEPTH: u32 = 1 << 16;

    pub fn new() -> ScanConfig {
        ScanConfig {
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
    pub fn max_depth(self, max_depth: u32) -> ScanConfig {
        ScanConfig { max_depth, ..self }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig::new()
    }
}
