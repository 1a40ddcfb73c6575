use crate::error::InputError;
use crate::types::ProbeTask;

/// Largest concurrency degree accepted (the platform's signed 32-bit maximum).
pub const MAX_CONCURRENCY: usize = i32::MAX as usize;

/// Largest number of probes accepted in one batch.
pub const MAX_COUNT: usize = u32::MAX as usize;

/// Build the ordered task list for a batch.
///
/// Takes the first `count` host entries, trims them, and labels them `1..=count`
/// in input order. Fails if fewer than `count` entries are supplied or any of
/// them is blank.
pub fn build_tasks<S: AsRef<str>>(count: usize, hosts: &[S]) -> Result<Vec<ProbeTask>, InputError> {
    if hosts.len() < count {
        return Err(InputError::MissingHosts {
            expected: count,
            got: hosts.len(),
        });
    }

    hosts
        .iter()
        .take(count)
        .enumerate()
        .map(|(idx, raw)| {
            let host = raw.as_ref().trim();
            if host.is_empty() {
                Err(InputError::EmptyHost { index: idx + 1 })
            } else {
                Ok(ProbeTask::new(idx + 1, host))
            }
        })
        .collect()
}

/// Parse the maximum number of concurrently running probes (1..=`MAX_CONCURRENCY`).
pub fn parse_concurrency(s: &str) -> Result<usize, InputError> {
    parse_bounded(s, MAX_CONCURRENCY)
}

/// Parse the number of probes to run (1..=`MAX_COUNT`).
pub fn parse_count(s: &str) -> Result<usize, InputError> {
    parse_bounded(s, MAX_COUNT)
}

fn parse_bounded(s: &str, max: usize) -> Result<usize, InputError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(InputError::Empty);
    }
    // u64 keeps "too large" distinct from "not a number" for anything up to 20 digits.
    let val: u64 = s
        .parse::<u64>()
        .map_err(|_| InputError::NotANumber(s.to_string()))?;
    if val == 0 {
        return Err(InputError::Zero);
    }
    if val > max as u64 {
        return Err(InputError::TooLarge {
            value: val,
            max: max as u64,
        });
    }
    Ok(val as usize)
}
