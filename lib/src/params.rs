use crate::merge::DEFAULT_REPORT_INTERVAL;

/// Used to pass around options for a pair computation
#[derive(Clone, Debug, PartialEq)]
pub struct D2sParams {
    /// Fail on kmer keys that don't strictly increase instead of trusting
    /// the encoder that produced the file.
    pub check_order: bool,
    /// Run the cross and self scoring passes on separate threads.
    pub parallel: bool,
    /// Log a progress line every this many merge steps (0 disables).
    pub report_interval: u64,
}

impl Default for D2sParams {
    fn default() -> Self {
        D2sParams {
            check_order: true,
            parallel: true,
            report_interval: DEFAULT_REPORT_INTERVAL,
        }
    }
}
