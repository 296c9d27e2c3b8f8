//! `register` report

use ledgerite_core::RegisterEntry;

use super::Renderer;

impl Renderer {
    /// Columns: date and description, account, change, running total.
    ///
    /// A posting with several commodities takes several lines; the date and
    /// account columns are only filled on the first of them.
    pub fn register(&self, entries: &[RegisterEntry]) -> String {
        let mut lines = Vec::new();
        for entry in entries {
            let mut header = format!("{} {}", entry.transaction.date_str(), entry.transaction.description);
            for posting in &entry.postings {
                let mut account = posting.account.clone();
                let changes = self.amounts(&posting.change);
                let totals = self.amounts_or_zero(&posting.total);

                for i in 0..changes.len().max(totals.len()) {
                    let change = changes.get(i).cloned().unwrap_or_else(|| self.blank());
                    let total = totals.get(i).cloned().unwrap_or_else(|| self.blank());
                    lines.push(format!("{:<64} {:<50} {} {}", header, account, change, total));
                    header.clear();
                    account.clear();
                }
            }
        }
        lines.join("\n")
    }
}
