use crate::error::SegmentError;
use crate::table::Sample;
use crate::util::round_half_up;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decimal places kept on a pulse's average current.
const AVERAGE_PLACES: u32 = 3;

/// One contiguous run of samples above the idle threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pulse {
    pub start: i64,
    /// Inclusive: one second before the first idle sample.
    pub end: i64,
    pub average: f64,
    pub exceeded: bool,
}

impl Pulse {
    pub fn duration(&self) -> i64 {
        self.end - self.start + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    /// Never empty.
    Pulses(Vec<Pulse>),
    NotUsed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelReport {
    pub channel: usize,
    pub activity: Activity,
}

impl ChannelReport {
    fn from_pulses(channel: usize, pulses: Vec<Pulse>) -> Self {
        let activity = if pulses.is_empty() {
            Activity::NotUsed
        } else {
            Activity::Pulses(pulses)
        };
        Self { channel, activity }
    }

    pub fn pulses(&self) -> &[Pulse] {
        match &self.activity {
            Activity::Pulses(pulses) => pulses,
            Activity::NotUsed => &[],
        }
    }

    pub fn is_used(&self) -> bool {
        matches!(self.activity, Activity::Pulses(_))
    }
}

/// What to do with a pulse still active at the last sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingPulse {
    /// Emit nothing for it. This is how the logger reports have always read.
    #[default]
    Drop,
    /// Close it at the last sample's timestamp and emit it.
    Close,
}

/// Which samples of a pulse can raise its exceeded flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExceededRule {
    /// Only the sample that opens the pulse.
    #[default]
    FirstSample,
    /// Any sample inside the pulse.
    AnySample,
}

impl FromStr for TrailingPulse {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(TrailingPulse::Drop),
            "close" => Ok(TrailingPulse::Close),
            other => Err(anyhow::anyhow!(
                "unknown trailing pulse policy '{}' (expected drop or close)",
                other
            )),
        }
    }
}

impl fmt::Display for TrailingPulse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrailingPulse::Drop => "drop",
            TrailingPulse::Close => "close",
        })
    }
}

impl FromStr for ExceededRule {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-sample" | "first" => Ok(ExceededRule::FirstSample),
            "any-sample" | "any" => Ok(ExceededRule::AnySample),
            other => Err(anyhow::anyhow!(
                "unknown exceeded rule '{}' (expected first-sample or any-sample)",
                other
            )),
        }
    }
}

impl fmt::Display for ExceededRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExceededRule::FirstSample => "first-sample",
            ExceededRule::AnySample => "any-sample",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentOptions {
    pub idle_threshold: f64,
    pub max_threshold: f64,
    pub trailing: TrailingPulse,
    pub exceeded: ExceededRule,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            idle_threshold: 1.0,
            max_threshold: 8.0,
            trailing: TrailingPulse::default(),
            exceeded: ExceededRule::default(),
        }
    }
}

struct OpenPulse {
    start: i64,
    total: f64,
    samples: usize,
    exceeded: bool,
}

impl OpenPulse {
    /// `end` never lands before `start`: a pulse closed by an idle sample that
    /// repeats its opening timestamp still covers that second.
    fn close(self, end: i64) -> Pulse {
        let mut pulse = Pulse {
            start: self.start,
            end: end.max(self.start),
            average: 0.0,
            exceeded: self.exceeded,
        };
        // Repeated timestamps put more samples in a pulse than seconds it spans.
        let divisor = pulse.duration().max(self.samples as i64);
        pulse.average = round_half_up(self.total / divisor as f64, AVERAGE_PLACES);
        pulse
    }
}

fn reading(sample: &Sample, channel: usize) -> Result<f64, SegmentError> {
    channel
        .checked_sub(1)
        .and_then(|i| sample.currents.get(i))
        .copied()
        .ok_or(SegmentError::ChannelOutOfRange {
            channel,
            available: sample.currents.len(),
        })
}

/// Splits one channel's readings into pulses.
///
/// `channel` is 1-based, matching the table layout where column 0 holds the
/// timestamp. A pulse opens on the first sample strictly above the idle
/// threshold and closes on the next sample at or below it; its end time is the
/// second before that idle sample.
pub fn segment(
    samples: &[Sample],
    channel: usize,
    options: &SegmentOptions,
) -> Result<ChannelReport, SegmentError> {
    let mut pulses = Vec::new();
    let mut open: Option<OpenPulse> = None;
    let mut previous: Option<i64> = None;

    for sample in samples {
        if let Some(previous) = previous.filter(|&p| sample.timestamp < p) {
            return Err(SegmentError::TimestampDecreased {
                previous,
                at: sample.timestamp,
            });
        }
        previous = Some(sample.timestamp);

        let current = reading(sample, channel)?;

        if current > options.idle_threshold {
            let spike = current > options.max_threshold;
            let pulse = open.get_or_insert_with(|| OpenPulse {
                start: sample.timestamp,
                total: 0.0,
                samples: 0,
                exceeded: spike,
            });
            if options.exceeded == ExceededRule::AnySample {
                pulse.exceeded |= spike;
            }
            pulse.total += current;
            pulse.samples += 1;
        } else if let Some(pulse) = open.take() {
            let pulse = pulse.close(sample.timestamp - 1);
            debug!(
                "Channel {}: pulse {}..={} avg {} exceeded={}",
                channel, pulse.start, pulse.end, pulse.average, pulse.exceeded
            );
            pulses.push(pulse);
        }
    }

    if let Some(pulse) = open {
        match (options.trailing, samples.last()) {
            (TrailingPulse::Close, Some(last)) => {
                let pulse = pulse.close(last.timestamp);
                debug!(
                    "Channel {}: closing trailing pulse {}..={} at end of data",
                    channel, pulse.start, pulse.end
                );
                pulses.push(pulse);
            }
            _ => debug!(
                "Channel {}: dropping pulse open since {}s at end of data",
                channel, pulse.start
            ),
        }
    }

    Ok(ChannelReport::from_pulses(channel, pulses))
}
