/// Rolling session statistics over the retained solve times, WCA style:
/// `ao5`/`ao12` drop the single best and single worst of the last 5/12
/// solves and average the rest.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SessionStats {
    pub count: usize,
    pub best: Option<f64>,
    pub mean: Option<f64>,
    pub ao5: Option<f64>,
    pub ao12: Option<f64>,
}

pub fn session_stats(times: &[f64]) -> SessionStats {
    let count = times.len();
    if count == 0 {
        return SessionStats::default();
    }

    let best = times.iter().copied().fold(f64::INFINITY, f64::min);
    let mean = times.iter().sum::<f64>() / count as f64;

    SessionStats {
        count,
        best: Some(best),
        mean: Some(mean),
        ao5: trimmed_average(times, 5),
        ao12: trimmed_average(times, 12),
    }
}

/// Average of the last `window` times with the single minimum and single
/// maximum removed. None until the history holds a full window.
fn trimmed_average(times: &[f64], window: usize) -> Option<f64> {
    if times.len() < window {
        return None;
    }
    let mut last: Vec<f64> = times[times.len() - window..].to_vec();
    last.sort_by(|a, b| a.total_cmp(b));
    let kept = &last[1..window - 1];
    Some(kept.iter().sum::<f64>() / kept.len() as f64)
}

/// Truncating `m:ss.cc` display. 65.4378 renders as "1:05.43", never
/// "1:05.44"; truncation keeps the display deterministic.
pub fn format_time(seconds: f64) -> String {
    let total_centis = (seconds * 100.0).max(0.0) as u64;
    let mins = total_centis / 6000;
    let secs = (total_centis / 100) % 60;
    let centis = total_centis % 100;
    format!("{mins}:{secs:02}.{centis:02}")
}
