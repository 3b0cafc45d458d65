#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub listen: String,
    /// Seed canned fixture timelines so the apps have data without a real
    /// request-creation path.
    pub mock: bool,
}
