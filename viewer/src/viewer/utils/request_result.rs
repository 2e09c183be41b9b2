#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestResult {
    Detected(usize),
    Empty,
    Superseded,
    /// The change did not trigger detection because no image is selected.
    Skipped,
}
