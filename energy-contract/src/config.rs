use chrono::Duration;

/// Minutes after generation during which a token may be sold
pub const DEFAULT_SALE_WINDOW_MINUTES: i64 = 30;

/// Contract settings supplied by the embedding process.
///
/// Every executor replaying the same calls must use the same configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractConfig {
    /// Length of the half-open sale window starting at `GeneratedTime`
    pub sale_window: Duration,

    /// Whether bootstrap also writes the per-category cost entries
    pub seed_cost_records: bool,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            sale_window: Duration::minutes(DEFAULT_SALE_WINDOW_MINUTES),
            seed_cost_records: true,
        }
    }
}

impl ContractConfig {
    pub fn with_sale_window(mut self, sale_window: Duration) -> Self {
        self.sale_window = sale_window;
        self
    }

    pub fn with_cost_records(mut self, seed_cost_records: bool) -> Self {
        self.seed_cost_records = seed_cost_records;
        self
    }

    /// Sale window rounded down to whole minutes, for error messages
    pub fn sale_window_minutes(&self) -> i64 {
        self.sale_window.num_minutes()
    }
}
