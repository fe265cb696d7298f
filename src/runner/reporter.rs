use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, Table};

use crate::runner::types::{CaseResult, FileResult, RunReport};
use crate::utils::{ResponseFormat, ResponseFormatter};

pub struct TestReporter {
    verbose: bool,
    formatter: ResponseFormatter,
}

impl TestReporter {
    pub fn new(verbose: bool) -> Self {
        let format = if verbose {
            ResponseFormat::Verbose
        } else {
            ResponseFormat::Compact
        };

        Self {
            verbose,
            formatter: ResponseFormatter::new(format),
        }
    }

    /// 打印单个文件的所有用例结果
    pub fn print_file(&self, file_result: &FileResult) {
        println!();
        println!("{}", file_result.path.display().to_string().bold());
        for result in &file_result.results {
            self.print_result(result);
        }
    }

    /// 打印单个用例结果
    pub fn print_result(&self, result: &CaseResult) {
        // 跳过的用例
        if result.skipped {
            println!(
                " {} [{}] {} {} {} {}",
                "⊘".dimmed(),
                result.case_number,
                result.display_name(),
                result.method.cyan(),
                result.url,
                "(skipped)".dimmed()
            );
            return;
        }

        let symbol = if result.success { "✓" } else { "✗" };
        let color = if result.success { "green" } else { "red" };

        println!(
            " {} [{}] {} {} {} ({}ms)",
            symbol.color(color),
            result.case_number,
            result.display_name(),
            result.method.cyan(),
            result.url,
            result.duration.as_millis()
        );

        // 断言明细：verbose 显示全部，否则只显示失败的
        for assertion in &result.assertions {
            if assertion.passed && !self.verbose {
                continue;
            }
            let mark = if assertion.passed {
                "✓".green()
            } else {
                "✗".red()
            };
            match (&assertion.message, &assertion.actual) {
                (Some(message), _) => {
                    println!("   {} {} — {}", mark, assertion.raw, message)
                }
                (None, Some(actual)) => {
                    println!("   {} {} (actual: {})", mark, assertion.raw, actual)
                }
                (None, None) => println!("   {} {}", mark, assertion.raw),
            }
        }

        // verbose 模式或失败时显示响应详情
        if (self.verbose || !result.success) && result.response.is_some() {
            let response = result.response.as_ref().unwrap();
            match self.formatter.format(response) {
                Ok(formatted) => {
                    for line in formatted.lines() {
                        println!("   {}", line);
                    }
                }
                Err(e) => {
                    println!(
                        "   {}: Failed to format response: {}",
                        "Warning".yellow(),
                        e
                    );
                }
            }
            println!();
        }

        // 网络或构造错误
        if let Some(error) = &result.error {
            println!("   {}: {}", "Error".red().bold(), error);
        }
    }

    /// 打印运行摘要表
    pub fn print_summary(&self, report: &RunReport) {
        let summary = report.summary();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL).set_header(vec![
            "Total", "Passed", "Failed", "Skipped", "Assertions", "Duration",
        ]);

        let failed_cell = if summary.failed > 0 {
            Cell::new(summary.failed).fg(Color::Red)
        } else {
            Cell::new(summary.failed)
        };

        table.add_row(vec![
            Cell::new(summary.total),
            Cell::new(summary.passed).fg(Color::Green),
            failed_cell,
            Cell::new(summary.skipped).add_attribute(Attribute::Dim),
            Cell::new(format!(
                "{}/{}",
                summary.passed_assertions, summary.total_assertions
            )),
            Cell::new(format!("{}ms", summary.total_duration.as_millis())),
        ]);

        println!();
        println!("{}", table);

        let verdict = if summary.failed == 0 {
            "All cases passed".green().bold().to_string()
        } else {
            format!("{} case(s) failed", summary.failed)
                .red()
                .bold()
                .to_string()
        };
        println!(
            "{} (run {} at {})",
            verdict,
            &report.run_id[..8],
            report.started_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
}
