use crate::error::SegmentError;
use crate::segment::{segment, ChannelReport, SegmentOptions};
use crate::table::{channel_count, Sample};
use log::info;
use rayon::prelude::*;
use std::ops::RangeInclusive;

/// Every channel the table carries, numbered like its columns.
pub fn available_channels(samples: &[Sample]) -> RangeInclusive<usize> {
    1..=channel_count(samples)
}

/// Segments each channel in `channels` independently, in parallel.
/// Reports come back in channel order.
pub fn analyze(
    samples: &[Sample],
    channels: RangeInclusive<usize>,
    options: &SegmentOptions,
) -> Result<Vec<ChannelReport>, SegmentError> {
    info!(
        "Segmenting channels {}..={} (idle > {}A, max > {}A)",
        channels.start(),
        channels.end(),
        options.idle_threshold,
        options.max_threshold
    );

    let reports = channels
        .into_par_iter()
        .map(|channel| segment(samples, channel, options))
        .collect::<Result<Vec<_>, _>>()?;

    let used = reports.iter().filter(|r| r.is_used()).count();
    info!("{} of {} channels saw activity", used, reports.len());
    Ok(reports)
}
