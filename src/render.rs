use console::style;

use trendlag::llm::provider::Provider;
use trendlag::llm::types::{GemReport, Region, TrendResponse};

/// Print a trend report. Sources only appear for grounded calls.
pub fn print_trends(report: &TrendResponse, provider: Provider) {
    println!(
        "{}",
        style(format!("=== Viral Trends ({provider}) ===")).bold()
    );
    println!(
        "  Fetched {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M")
    );
    println!();

    for trend in &report.trends {
        println!(
            "  {}  {}  {}",
            region_badge(trend.region),
            style(&trend.topic).bold(),
            style(format!("{}/100", trend.viral_score)).yellow()
        );
        println!("      {}", trend.description);
        println!("      {} {}", style("Lag:").dim(), trend.trend_lag_status);
        if !trend.hashtags.is_empty() {
            println!("      {}", style(trend.hashtags.join(" ")).cyan());
        }
        println!();
    }

    if !report.sources.is_empty() {
        println!("{}", style("  Search Sources").bold());
        for source in &report.sources {
            println!("    {} {}", source.title, style(&source.uri).dim());
        }
    } else if provider == Provider::OpenAI {
        println!(
            "  {}",
            style(format!("Web grounding sources not available with {provider}.")).dim()
        );
    }
}

/// Print a GEM rating.
pub fn print_report(report: &GemReport) {
    println!("{}", style("=== GEM Score ===").bold());
    println!();
    println!(
        "  Total:          {}",
        score_style(report.total_score, 100)
    );
    println!("  Matched trend:  {}", style(&report.matched_trend).cyan());
    println!();

    for (label, score, reasoning) in report.dimensions() {
        println!("  {:<20} {}", style(label).bold(), score_style(score, 25));
        println!("      {reasoning}");
    }

    if !report.improvement_tips.is_empty() {
        println!();
        println!("{}", style("  Improvement Tips").bold());
        for tip in &report.improvement_tips {
            println!("    {} {tip}", style("*").green());
        }
    }
}

/// Print an error in place of results.
pub fn print_error(message: &str) {
    eprintln!("{} {message}", style("Error:").red().bold());
}

fn region_badge(region: Region) -> String {
    let label = format!("[{region}]");
    let styled = match region {
        Region::Us => style(label).blue(),
        Region::Uk => style(label).red(),
        Region::Au => style(label).green(),
    };
    styled.bold().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    High,
    Middle,
    Low,
}

/// Where `score` falls relative to `max`. Scores come from the model
/// unchecked, so the arithmetic is widened to avoid overflow.
fn band(score: i64, max: i64) -> Band {
    let scaled = i128::from(score) * 100;
    let max = i128::from(max);
    if scaled >= max * 75 {
        Band::High
    } else if scaled >= max * 50 {
        Band::Middle
    } else {
        Band::Low
    }
}

/// Color a score by how much of `max` it reaches.
fn score_style(score: i64, max: i64) -> String {
    let text = format!("{score}/{max}");
    let styled = match band(score, max) {
        Band::High => style(text).green(),
        Band::Middle => style(text).yellow(),
        Band::Low => style(text).red(),
    };
    styled.to_string()
}
