//! The six dashboard boxes, built from one [`Sample`].

use std::time::Duration;

use crate::format::{format_bytes, format_rate, format_uptime};
use crate::gauge::Gauge;
use crate::layout::Panel;
use crate::preferences::{Preferences, Thresholds};
use crate::sampler::Sample;
use crate::text::Line;
use crate::theme::{Role, Tier};

pub const APP_TITLE: &str = "Vitals System Monitor";

const CPU_GAUGE: usize = 15;
const CORE_GAUGE: usize = 5;
const MEMORY_GAUGE: usize = 25;
const VOLUME_GAUGE: usize = 10;
const SEPARATOR_WIDTH: usize = 60;
const DEVICE_LABEL: usize = 5;
const HOST_NAME: usize = 20;
/// Ping at or above this many milliseconds is drawn as an alert.
const SLOW_PING_MS: f64 = 100.0;

pub fn panels(sample: &Sample, prefs: &Preferences) -> Vec<Panel> {
    vec![
        header(sample, prefs),
        uptime(sample),
        cpu(sample, &prefs.thresholds),
        memory(sample, &prefs.thresholds),
        storage(sample, &prefs.thresholds),
        network(sample),
    ]
}

/// `  Label     : ` followed by `value`.
fn field(label: &str, value: Line) -> Line {
    Line::plain("  ")
        .role(format!("{label:<10}:"), Role::Label)
        .text(" ")
        .append(value)
}

fn heading(text: &str) -> Line {
    Line::plain("  ").role(format!("--- {text} ---"), Role::Heading)
}

fn header(sample: &Sample, prefs: &Preferences) -> Panel {
    let host: String = sample.host_name.chars().take(HOST_NAME).collect();
    let mut panel = Panel::untitled().row(Line::styled(
        format!("{APP_TITLE:<34}|  {host:<HOST_NAME$}"),
        Role::Heading,
    ));
    if prefs.logging_enabled {
        panel.push_row(Line::styled(" [REC] LOGGING ENABLED", Role::Alert));
    }
    panel
}

fn uptime(sample: &Sample) -> Panel {
    Panel::titled("UPTIME").row(field("System Up", Line::plain(format_uptime(sample.uptime))))
}

fn cpu(sample: &Sample, thresholds: &Thresholds) -> Panel {
    let mut panel = Panel::titled("CPU INFO").row(field(
        "Usage",
        Gauge::new(sample.cpu_percent, CPU_GAUGE)
            .line(thresholds)
            .text(format!(" {:>5.1}%", sample.cpu_percent)),
    ));
    if let Some(mhz) = sample.cpu_frequency_mhz {
        panel.push_row(field("Speed", Line::plain(format!("{mhz} MHz"))));
    }
    for (pair_index, pair) in sample.per_core.chunks(2).enumerate() {
        let mut row = Line::new();
        for (offset, &percent) in pair.iter().enumerate() {
            let number = pair_index * 2 + offset + 1;
            let lead = if offset == 0 { " " } else { "   " };
            row = row
                .text(format!("{lead}#{number:02} "))
                .append(Gauge::new(percent, CORE_GAUGE).line(thresholds))
                .text(format!(" {percent:>3.0}%"));
        }
        panel.push_row(row);
    }
    panel
}

fn memory(sample: &Sample, thresholds: &Thresholds) -> Panel {
    let mem = &sample.memory;
    let swap = &sample.swap;
    Panel::titled("MEMORY")
        .row(heading("Physical RAM"))
        .row(field("Total", Line::plain(format_bytes(mem.total as f64))))
        .row(field(
            "Used",
            Line::plain(format!("{} ({:.1}%)", format_bytes(mem.used as f64), mem.percent)),
        ))
        .row(field("Free/Avail", Line::plain(format_bytes(mem.available as f64))))
        .row(field("Progress", Gauge::new(mem.percent, MEMORY_GAUGE).line(thresholds)))
        .row(Line::plain("  ").role("-".repeat(SEPARATOR_WIDTH), Role::Border))
        .row(heading("Swap (Virtual Mem)"))
        .row(field("Total", Line::plain(format_bytes(swap.total as f64))))
        .row(field(
            "Used",
            Line::plain(format!("{} ({:.1}%)", format_bytes(swap.used as f64), swap.percent)),
        ))
        .row(field("Free", Line::plain(format_bytes(swap.free as f64))))
        .row(field("Progress", Gauge::new(swap.percent, MEMORY_GAUGE).line(thresholds)))
}

/// Short device label: `/dev/sda1` → `sda1`, `C:\` → `C:\`.
fn device_label(device: &str) -> String {
    let name = device.strip_prefix("/dev/").unwrap_or(device);
    name.chars().take(DEVICE_LABEL).collect()
}

fn storage(sample: &Sample, thresholds: &Thresholds) -> Panel {
    let mut panel = Panel::titled("STORAGE");
    for volume in &sample.volumes {
        let label = format!("{:<width$}", device_label(&volume.device), width = DEVICE_LABEL);
        panel.push_row(field(
            &label,
            Gauge::new(volume.percent, VOLUME_GAUGE).line(thresholds).text(format!(
                " {:>5.1}% {}/{}",
                volume.percent,
                format_bytes(volume.used as f64),
                format_bytes(volume.total as f64)
            )),
        ));
    }
    panel
}

fn ping(latency: Option<Duration>) -> Line {
    match latency {
        Some(rtt) => {
            let ms = rtt.as_secs_f64() * 1000.0;
            let role = if ms < SLOW_PING_MS {
                Role::Value(Tier::Low)
            } else {
                Role::Alert
            };
            Line::styled(format!("{ms:.0} ms"), role)
        }
        None => Line::styled("Offline", Role::Alert),
    }
}

fn network(sample: &Sample) -> Panel {
    Panel::titled("NETWORK")
        .row(field("Ping", ping(sample.latency)))
        .row(field(
            "Down",
            Line::styled(format_rate(sample.throughput.down), Role::Value(Tier::Low)),
        ))
        .row(field(
            "Up",
            Line::styled(format_rate(sample.throughput.up), Role::Value(Tier::Mid)),
        ))
}
