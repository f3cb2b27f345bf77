use std::fmt::Write;

use chrono_tz::Tz;

use crate::data::datetime::{format_duration, format_timestamp};
use crate::processing::spans::OperationalSpan;
use crate::processing::window::WindowAccumulator;
use crate::state::channel_spec::ChannelSpecs;

/// One line per span: startup, running and shutdown ranges. Human-readable
/// times are shown in `tz`.
pub fn render_spans(spans: &[OperationalSpan], human_time: bool, tz: Tz) -> String {
    if spans.is_empty() {
        return "No operational spans detected.\n".to_string();
    }
    let ts = |t: f64| format_timestamp(t, human_time, tz);
    let mut out = String::new();
    for (i, span) in spans.iter().enumerate() {
        let _ = writeln!(
            out,
            "Span {}: startup {} .. {} ({})",
            i + 1,
            ts(span.startup.start),
            ts(span.startup.end),
            format_duration(span.startup.duration())
        );
        let _ = writeln!(
            out,
            "        running {} .. {} ({})",
            ts(span.running.start),
            ts(span.running.end),
            format_duration(span.running.duration())
        );
        match span.shutdown {
            Some(shutdown) => {
                let _ = writeln!(out, "        shutdown {} .. {}", ts(shutdown.start), ts(shutdown.end));
            }
            None => {
                let _ = writeln!(out, "        no shutdown");
            }
        }
    }
    out
}

/// Status list in channel order, one `icon name: status` line each.
/// Channels never evaluated show as unclassified.
pub fn render_statuses(acc: &WindowAccumulator, specs: &ChannelSpecs) -> String {
    let mut out = String::new();
    for (channel, _) in specs.iter() {
        let status = acc.status(channel);
        let _ = writeln!(out, "{} {}: {}", status.icon(), channel, status.label());
    }
    let _ = writeln!(out, "Overall: {}", acc.worst().label());
    out
}

pub fn render_stats(acc: &WindowAccumulator) -> String {
    if acc.stats.is_empty() {
        return "\u{26a0}\u{fe0f} No data available.\n".to_string();
    }
    acc.stats
        .iter()
        .map(|(channel, stats)| stats.report(channel) + "\n")
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::classifier::Status;
    use crate::processing::spans::Interval;
    use crate::processing::statistics::WindowStats;
    use crate::state::channel_spec::ChannelSpec;

    #[test]
    fn spans_block() {
        let spans = [OperationalSpan {
            startup: Interval::new(0.0, 18.0),
            running: Interval::new(18.0, 18.0),
            shutdown: None,
        }];
        let text = render_spans(&spans, false, Tz::UTC);
        assert!(text.starts_with("Span 1: startup 0.000 .. 18.000 (18.0s)\n"));
        assert!(text.ends_with("no shutdown\n"));
        assert_eq!(render_spans(&[], false, Tz::UTC), "No operational spans detected.\n");
    }

    #[test]
    fn spans_in_instrument_local_time() {
        let spans = [OperationalSpan {
            startup: Interval::new(1_749_600_000.0, 1_749_600_060.0),
            running: Interval::new(1_749_600_060.0, 1_749_603_600.0),
            shutdown: Some(Interval::new(1_749_603_600.0, 1_749_603_602.0)),
        }];
        let text = render_spans(&spans, true, Tz::America__Chicago);
        assert!(text.starts_with("Span 1: startup 2025-06-10 19:00:00 .. 2025-06-10 19:01:00 (1m 00s)\n"));
        assert!(text.ends_with("shutdown 2025-06-10 20:00:00 .. 2025-06-10 20:00:02\n"));
    }

    #[test]
    fn statuses_and_stats() {
        let mut specs = ChannelSpecs::default();
        specs.insert("CO2", ChannelSpec::default().typical(1.0, 2.0));
        specs.insert("H2O", ChannelSpec::default());

        let mut acc = WindowAccumulator::new();
        assert!(render_stats(&acc).contains("No data available."));

        acc.statuses.insert("CO2".to_string(), Status::OutsideTypical);
        let stats = WindowStats::compute(&[1.0, 3.0], specs.get("CO2").unwrap()).unwrap();
        acc.stats.insert("CO2".to_string(), stats);

        let text = render_statuses(&acc, &specs);
        assert!(text.contains("CO2: outside typical"));
        assert!(text.contains("H2O: unclassified"));
        assert!(text.ends_with("Overall: outside typical\n"));
        assert!(render_stats(&acc).contains("In Typical: 1/2"));
    }
}
