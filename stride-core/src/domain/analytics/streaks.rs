use stride_model::{DailyActivityBucket, StreakSummary};

/// Consecutive active days ending on the last bucket; 0 when that day is idle.
///
/// Expects one bucket per calendar day, oldest first, as produced by
/// [`super::daily_buckets`].
pub fn current_streak(buckets: &[DailyActivityBucket]) -> u32 {
    buckets
        .iter()
        .rev()
        .take_while(|bucket| bucket.is_active())
        .count() as u32
}

/// Longest run of consecutive active days
pub fn longest_streak(buckets: &[DailyActivityBucket]) -> u32 {
    let mut longest = 0u32;
    let mut run = 0u32;
    let mut previous = None;

    for bucket in buckets {
        if !bucket.is_active() {
            run = 0;
            previous = None;
            continue;
        }
        run = match previous {
            Some(date) if bucket.date.pred_opt() == Some(date) => run + 1,
            _ => 1,
        };
        previous = Some(bucket.date);
        longest = longest.max(run);
    }

    longest
}

pub fn summarize(buckets: &[DailyActivityBucket]) -> StreakSummary {
    StreakSummary {
        current: current_streak(buckets),
        longest: longest_streak(buckets),
    }
}
