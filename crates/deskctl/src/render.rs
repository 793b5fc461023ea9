//! Terminal table rendering.

use crate::views::{DashboardView, HealthView};
use console::style;
use desk_common::{Campaign, Company, Ticket, TicketStatus};
use owo_colors::OwoColorize;

pub fn tickets(items: &[Ticket], total: u64) {
    if items.is_empty() {
        println!("No tickets match.");
        return;
    }

    println!(
        "{:<10} {:<12} {:<12} {:<40} {}",
        style("KEY").bold(),
        style("KIND").bold(),
        style("STATUS").bold(),
        style("SUBJECT").bold(),
        style("CREATED").bold(),
    );
    for ticket in items {
        let status = match ticket.status {
            TicketStatus::Open => ticket.status.to_string().red().to_string(),
            TicketStatus::InProgress => ticket.status.to_string().yellow().to_string(),
            TicketStatus::Resolved | TicketStatus::Closed => {
                ticket.status.to_string().green().to_string()
            }
        };
        println!(
            "{:<10} {:<12} {:<12} {:<40} {}",
            ticket.key,
            ticket.kind,
            status,
            truncate(&ticket.subject, 38),
            ticket.created_at.format("%Y-%m-%d %H:%M"),
        );
    }
    footer(items.len(), total);
}

pub fn companies(items: &[Company], total: u64) {
    if items.is_empty() {
        println!("No companies match.");
        return;
    }

    println!(
        "{:<32} {:<28} {}",
        style("NAME").bold(),
        style("DOMAIN").bold(),
        style("CREATED").bold(),
    );
    for company in items {
        println!(
            "{:<32} {:<28} {}",
            truncate(&company.name, 30),
            company.domain.as_deref().unwrap_or("-"),
            company.created_at.format("%Y-%m-%d"),
        );
    }
    footer(items.len(), total);
}

pub fn campaigns(items: &[Campaign], total: u64) {
    if items.is_empty() {
        println!("No campaigns match.");
        return;
    }

    println!(
        "{:<32} {:<10} {:<12} {}",
        style("NAME").bold(),
        style("STATUS").bold(),
        style("STARTS").bold(),
        style("ENDS").bold(),
    );
    for campaign in items {
        println!(
            "{:<32} {:<10} {:<12} {}",
            truncate(&campaign.name, 30),
            campaign.status.as_str(),
            campaign.starts_at.format("%Y-%m-%d"),
            campaign
                .ends_at
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    footer(items.len(), total);
}

pub fn dashboard(view: &DashboardView) {
    println!(
        "{} ({} .. {})",
        style(format!("Dashboard - {}", view.period)).bold(),
        view.start.format("%Y-%m-%d"),
        view.end.format("%Y-%m-%d"),
    );

    if let Some(strategic) = &view.strategic {
        println!();
        println!("{}", style("Strategic").bold().underlined());
        println!("  Open backlog:       {}", strategic.open_backlog);
        println!("  Created in window:  {}", strategic.created_total);
        println!("  Resolved in window: {}", strategic.resolved_total);
        println!(
            "  Avg resolution:     {} min",
            strategic.avg_resolution_minutes
        );
    }

    println!();
    println!("{}", style("Volume (bugs / requests / assistances)").bold());
    if view.volume.is_empty() {
        println!("  no data");
    }
    for point in &view.volume {
        println!(
            "  {:<12} {:>4} / {:>4} / {:>4}",
            point.date, point.counts.bugs, point.counts.reqs, point.counts.assistances
        );
    }

    println!();
    println!("{}", style("Time spent (minutes)").bold());
    if view.time_spent.is_empty() {
        println!("  no data");
    }
    for point in &view.time_spent {
        println!("  {:<12} {:>6}", point.date, point.total_minutes);
    }
}

pub fn health(view: &HealthView) {
    println!(
        "deskd {} - {} (up {}s)",
        view.version,
        if view.status == "healthy" {
            view.status.green().to_string()
        } else {
            view.status.red().to_string()
        },
        view.uptime_seconds,
    );
}

fn footer(shown: usize, total: u64) {
    println!();
    println!("{}", style(format!("{shown} of {total} rows")).dim());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
