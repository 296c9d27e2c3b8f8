//! Plain-text rendering of the ledger reports

pub mod balance;
pub mod print;
pub mod register;

use ledgerite_config::ReportConfig;
use ledgerite_parser::{Balance, Commodity};
use rust_decimal::Decimal;

/// Column layout shared by the reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Renderer {
    pub decimal_places: u32,
    pub amount_width: usize,
}

impl From<&ReportConfig> for Renderer {
    fn from(config: &ReportConfig) -> Self {
        Self {
            decimal_places: config.decimal_places,
            amount_width: config.amount_width,
        }
    }
}

impl Renderer {
    fn amount(&self, commodity: &Commodity, amount: Decimal) -> String {
        format!(
            "{:>width$}",
            commodity.format_amount_with_precision(amount, self.decimal_places),
            width = self.amount_width
        )
    }

    /// One right-aligned line per commodity
    fn amounts(&self, balance: &Balance) -> Vec<String> {
        balance.iter().map(|(c, a)| self.amount(c, *a)).collect()
    }

    /// Like [`Renderer::amounts`], but an empty balance shows as `0`
    fn amounts_or_zero(&self, balance: &Balance) -> Vec<String> {
        if balance.is_empty() {
            vec![format!("{:>width$}", "0", width = self.amount_width)]
        } else {
            self.amounts(balance)
        }
    }

    fn blank(&self) -> String {
        " ".repeat(self.amount_width)
    }
}
