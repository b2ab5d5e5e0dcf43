use crate::models::*;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io::{self, Write};

/// One-shot terminal renderer for status and stats output.
pub struct TerminalUI {
    config: UserConfig,
}

impl TerminalUI {
    pub fn new(config: UserConfig) -> Self {
        Self { config }
    }

    /// Draw today's usage against the plan's target for today.
    pub fn draw_status(
        &self,
        today_count: u64,
        today_limit: Option<u32>,
        mean_strength: Option<f64>,
    ) -> io::Result<()> {
        let mut stdout = io::stdout();

        self.draw_title(&mut stdout)?;
        execute!(stdout, Print("Today:\n"))?;

        match today_limit {
            Some(limit) => {
                let percent = if limit > 0 {
                    (today_count as f64 / limit as f64) * 100.0
                } else if today_count > 0 {
                    100.0
                } else {
                    0.0
                };
                let bar_color = if percent > 90.0 {
                    Color::Red
                } else if percent > 75.0 {
                    Color::Yellow
                } else {
                    Color::Green
                };

                execute!(stdout, Print("  "))?;
                self.draw_bar(&mut stdout, percent, bar_color)?;
                execute!(
                    stdout,
                    Print(format!(" {percent:.0}%\n")),
                    Print(format!("  {today_count} / {limit} puffs (plan target)\n"))
                )?;
            }
            None => {
                execute!(
                    stdout,
                    Print(format!("  {today_count} puffs\n")),
                    SetForegroundColor(Color::DarkGrey),
                    Print("  No active plan - run 'pufflog plan create' to set one\n"),
                    ResetColor
                )?;
            }
        }

        if let Some(strength) = mean_strength {
            execute!(
                stdout,
                Print(format!("  Mean strength: {strength:.1} mg/ml\n"))
            )?;
        }

        stdout.flush()
    }

    /// Draw the four window summaries as a table.
    pub fn draw_summaries(&self, summaries: &[WindowSummary]) -> io::Result<()> {
        let mut stdout = io::stdout();
        let currency = &self.config.cost_model.currency_symbol;

        self.draw_title(&mut stdout)?;
        execute!(
            stdout,
            Print(format!(
                "  {:<7} {:>8} {:>10} {:>9} {:>10} {:>12}\n",
                "Window", "Puffs", "Previous", "Change", "Average", "Saved"
            ))
        )?;

        for summary in summaries {
            let change = match summary.change_percent {
                Some(p) => format!("{p:+}%"),
                None => "-".to_string(),
            };
            let change_color = match summary.change_percent {
                Some(p) if p > 0 => Color::Red,
                Some(p) if p < 0 => Color::Green,
                _ => Color::Reset,
            };
            let saved_color = if summary.amount_saved >= 0.0 {
                Color::Green
            } else {
                Color::Red
            };

            execute!(
                stdout,
                Print(format!(
                    "  {:<7} {:>8} {:>10} ",
                    summary.kind.to_string(),
                    summary.total,
                    summary.previous_total
                )),
                SetForegroundColor(change_color),
                Print(format!("{change:>9}")),
                ResetColor,
                Print(format!(" {:>10.1} ", summary.average)),
                SetForegroundColor(saved_color),
                Print(format!("{:>11}\n", format_money(summary.amount_saved, currency))),
                ResetColor
            )?;
        }

        stdout.flush()
    }

    fn draw_title(&self, stdout: &mut io::Stdout) -> io::Result<()> {
        execute!(
            stdout,
            SetForegroundColor(Color::Blue),
            Print("── Pufflog ──────────────────────────────────────────\n"),
            ResetColor
        )
    }

    fn draw_bar(&self, stdout: &mut io::Stdout, percent: f64, color: Color) -> io::Result<()> {
        let bar = render_progress_bar(percent, 40);
        execute!(stdout, SetForegroundColor(color), Print(bar), ResetColor)
    }
}

/// Fixed-width progress bar for `percent` in 0..=100.
pub fn render_progress_bar(percent: f64, width: usize) -> String {
    let clamped = percent.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * width as f64) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Format a signed money amount, e.g. `-$3.40` / `$12.00`.
pub fn format_money(amount: f64, currency: &str) -> String {
    if amount < 0.0 {
        format!("-{currency}{:.2}", amount.abs())
    } else {
        format!("{currency}{amount:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_bounds() {
        assert_eq!(render_progress_bar(0.0, 10), "░".repeat(10));
        assert_eq!(render_progress_bar(100.0, 10), "█".repeat(10));
        // Over-limit usage clamps instead of overflowing the bar
        assert_eq!(render_progress_bar(250.0, 10), "█".repeat(10));
    }

    #[test]
    fn test_format_money_sign() {
        assert_eq!(format_money(12.0, "$"), "$12.00");
        assert_eq!(format_money(-3.4, "$"), "-$3.40");
        assert_eq!(format_money(0.0, "€"), "€0.00");
    }
}
