//! Briefing prompt construction.

use crate::item::Item;

/// Notice sent when a run finds nothing new (when idle notices are enabled).
pub const IDLE_NOTICE: &str = "📭 No new market news since the last briefing.";

/// Build the briefing prompt from the novel items, in batch order.
pub fn build_briefing_prompt(items: &[Item]) -> String {
    let news_lines = items
        .iter()
        .map(Item::prompt_line)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Below are freshly collected US market news items.\n\
         Write a briefing for a retail investor based on them.\n\
         \n\
         [Portfolio]\n\
         1. Growth: PSTG (Pure Storage) — NAND/AI related news matters most\n\
         2. Dividend: SPHD (high dividend, low volatility) — rates, defensives, dividend news\n\
         3. Index: VOO/SSO (S&P 500) — overall market mood\n\
         \n\
         [Conditions]\n\
         1. Focus on items likely to affect the portfolio positions above.\n\
         2. Explain jargon with beginner-friendly analogies.\n\
         3. Cite the source tag under each section.\n\
         4. Structure: 📉 Market mood, 🚨 Key news, 💼 Portfolio check (PSTG, SPHD).\n\
         \n\
         [Collected news]\n\
         {news_lines}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_items_in_batch_order() {
        let items = vec![
            Item::new("PSTG stock news", "First headline", "first body"),
            Item::new("SPHD ETF news", "Second headline", "second body"),
        ];
        let prompt = build_briefing_prompt(&items);

        let first = prompt.find("- First headline: first body").unwrap();
        let second = prompt.find("- Second headline: second body").unwrap();
        assert!(first < second);
    }

    #[test]
    fn prompt_carries_the_portfolio_sections() {
        let prompt = build_briefing_prompt(&[]);
        assert!(prompt.contains("PSTG"));
        assert!(prompt.contains("SPHD"));
        assert!(prompt.contains("[Collected news]"));
    }
}
