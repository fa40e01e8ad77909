//! Template-based text rendering for the shift report

use chrono::{DateTime, Utc};

use crate::analysis::{
    CategoryEfficiency, ExceedanceReport, LithologyReport, OperationReport, SegmentStats,
    ShiftReport,
};
use crate::types::Segment;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Human-readable duration: whole seconds under a minute, else minutes with one decimal.
pub fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{secs:.0} s")
    } else {
        format!("{:.1} min", secs / 60.0)
    }
}

fn format_time(t: DateTime<Utc>) -> String {
    t.format(TIME_FORMAT).to_string()
}

fn segment_line(label: &str, seg: &Segment) -> String {
    format!(
        "- {} {} to {} ({}, {} samples)",
        label,
        format_time(seg.start_time),
        format_time(seg.end_time),
        format_duration(seg.duration_secs),
        seg.sample_count,
    )
}

fn longest_text(stats: &SegmentStats) -> String {
    match &stats.longest {
        Some(seg) => format!(
            "{} ({} to {})",
            format_duration(seg.duration_secs),
            format_time(seg.start_time),
            format_time(seg.end_time)
        ),
        None => "none".to_string(),
    }
}

fn stats_line(name: &str, stats: &SegmentStats, short_secs: f64) -> String {
    format!(
        "- {}: {} segment(s), {:.1} min total, longest {}, {} shorter than {}",
        name,
        stats.count,
        stats.total_minutes(),
        longest_text(stats),
        stats.short_segment_count,
        format_duration(short_secs),
    )
}

/// Work/stop section: optional segment list, then statistics.
pub fn render_operation(op: &OperationReport, short_secs: f64, include_segments: bool) -> String {
    let mut lines = vec![format!("## Work / Stop ({})\n", op.channel)];

    if include_segments {
        for seg in &op.segments {
            let label = if seg.state.as_flag() == Some(true) {
                "WORK"
            } else {
                "STOP"
            };
            lines.push(segment_line(label, seg));
        }
        if !op.segments.is_empty() {
            lines.push(String::new());
        }
    }

    lines.push(stats_line("Work", &op.work, short_secs));
    lines.push(stats_line("Stop", &op.stop, short_secs));
    lines.push(format!("- Utilization: {:.1}%", op.utilization() * 100.0));
    lines.join("\n")
}

fn efficiency_value(v: Option<f64>, decimals: usize) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.decimals$}"))
}

fn efficiency_line(eff: &CategoryEfficiency) -> String {
    format!(
        "- Class {}: {} samples, penetration {}, advance speed {}, thrust {}, specific thrust {}",
        eff.category,
        eff.sample_count,
        efficiency_value(eff.mean_penetration, 2),
        efficiency_value(eff.mean_advance_speed, 2),
        efficiency_value(eff.mean_thrust, 0),
        efficiency_value(eff.specific_thrust, 1),
    )
}

/// Lithology section. Classes `0..category_count` are always listed, plus
/// any class observed outside that range.
pub fn render_lithology(
    lith: &LithologyReport,
    category_count: u32,
    short_secs: f64,
    include_segments: bool,
) -> String {
    let mut lines = vec![format!("## Lithology ({})\n", lith.label_channel)];

    let mut categories: Vec<u32> = (0..category_count).collect();
    categories.extend(lith.categories().filter(|&c| c >= category_count));

    for category in categories {
        let Some(stats) = lith.stats.per_category.get(&category) else {
            lines.push(format!("- Class {category}: not observed"));
            continue;
        };
        let occupancy = lith
            .stats
            .occupancy_ratio
            .get(&category)
            .copied()
            .unwrap_or(0.0);
        lines.push(format!(
            "- Class {}: {} segment(s), {:.1} min total ({:.1}% of shift), longest {}, {} shorter than {}",
            category,
            stats.count,
            stats.total_minutes(),
            occupancy * 100.0,
            longest_text(stats),
            stats.short_segment_count,
            format_duration(short_secs),
        ));
        if include_segments {
            for seg in lith.segments_for(category) {
                lines.push(format!("  {}", segment_line("run", seg)));
            }
        }
    }

    lines.push(format!("- Class switches: {}", lith.stats.switch_count));
    if lith.stats.unclassified_samples > 0 {
        lines.push(format!(
            "- Unclassified samples: {}",
            lith.stats.unclassified_samples
        ));
    }

    if !lith.efficiency.is_empty() {
        lines.push("\n### Advance Efficiency\n".to_string());
        lines.extend(lith.efficiency.iter().map(efficiency_line));
    }

    lines.join("\n")
}

/// One block per gas channel: distribution, limit and exceedance windows.
pub fn render_gas(gas: &[ExceedanceReport], skipped: &[String], include_segments: bool) -> String {
    let mut lines = vec!["## Gas Monitoring\n".to_string()];

    if gas.is_empty() {
        lines.push("- No monitored gas channels in this log.".to_string());
    }

    for report in gas {
        let Some(summary) = report.summary else {
            lines.push(format!("- {}: no valid readings", report.channel));
            continue;
        };
        let status = if report.has_exceedance() {
            format!(
                "**{} sample(s) exceeded** in {} window(s), {:.1} min total",
                report.exceed_count,
                report.stats.count,
                report.stats.total_minutes()
            )
        } else {
            "within limit".to_string()
        };
        lines.push(format!(
            "- {}: mean {:.2}, min {:.2}, max {:.2} (limit {}). {}",
            report.channel, summary.mean, summary.min, summary.max, report.threshold, status,
        ));
        if include_segments {
            for seg in &report.segments {
                lines.push(format!("  {}", segment_line("exceeded", seg)));
            }
        }
    }

    if !skipped.is_empty() {
        lines.push(format!("- Not recorded: {}", skipped.join(", ")));
    }

    lines.join("\n")
}

/// Render the whole report as Markdown-flavoured text.
pub fn render_report(report: &ShiftReport, include_segments: bool) -> String {
    let mut sections = Vec::new();

    let period = match (report.start_time, report.end_time) {
        (Some(start), Some(end)) => format!("{} to {}", format_time(start), format_time(end)),
        _ => "no samples".to_string(),
    };
    sections.push(format!(
        "## Summary\n\n\
         {} sample(s), {} ({}). Segments shorter than {} are counted as short.",
        report.sample_count,
        period,
        format_duration(report.elapsed_secs),
        format_duration(report.short_segment_secs),
    ));

    sections.push(render_operation(
        &report.operation,
        report.short_segment_secs,
        include_segments,
    ));

    if let Some(lith) = &report.lithology {
        sections.push(render_lithology(
            lith,
            report.category_count,
            report.short_segment_secs,
            include_segments,
        ));
    }

    sections.push(render_gas(
        &report.gas,
        &report.skipped_gas_channels,
        include_segments,
    ));

    sections.join("\n\n")
}
