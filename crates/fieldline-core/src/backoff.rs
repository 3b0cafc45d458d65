/// Pure backoff policy for timeline append retries.
///
/// Appends are user-visible history, so retries are short and bounded:
/// Attempt 1: immediate
/// Attempt 2: 500ms
/// Attempt 3: 1s
/// Attempt 4: 2s
/// Attempt 5+: 5s (caller gives up after its max attempts)
pub fn append_backoff_ms(attempt_number: u32) -> u64 {
    match attempt_number {
        0 | 1 => 0,
        2 => 500,
        3 => 1_000,
        4 => 2_000,
        _ => 5_000,
    }
}
