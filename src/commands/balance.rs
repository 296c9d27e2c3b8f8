//! `balance` report

use ledgerite_core::BalanceReport;

use super::Renderer;

impl Renderer {
    /// Account rows, each commodity on its own line with the indented
    /// account name after the last one, then a rule and the grand total
    pub fn balance(&self, report: &BalanceReport) -> String {
        let mut lines = Vec::new();
        for entry in &report.entries {
            let mut rows = self.amounts_or_zero(&entry.aggregates);
            if let Some(last) = rows.last_mut() {
                last.push_str(&"  ".repeat(entry.depth));
                last.push_str(&entry.name);
            }
            lines.extend(rows);
        }
        lines.push("-".repeat(20));
        lines.extend(self.amounts_or_zero(&report.total));
        lines.join("\n")
    }
}
