//! Peak extraction from spectra and periodograms.

/// Prominence of the local maximum (or plateau) spanning `start..=end`.
///
/// The peak's bases are the lowest points between it and the nearest
/// strictly higher sample on each side (or the array edge); prominence is
/// the height above the higher of the two bases.
fn plateau_prominence(spectrum: &[f64], start: usize, end: usize) -> f64 {
    let peak = spectrum[start];

    let mut left_min = peak;
    for &v in spectrum[..start].iter().rev() {
        if v > peak {
            break;
        }
        left_min = left_min.min(v);
    }

    let mut right_min = peak;
    for &v in &spectrum[end + 1..] {
        if v > peak {
            break;
        }
        right_min = right_min.min(v);
    }

    peak - left_min.max(right_min)
}

/// Prominence of the sample at `index`, or 0 if it is not a local maximum.
pub fn prominence(spectrum: &[f64], index: usize) -> f64 {
    local_maxima(spectrum)
        .into_iter()
        .find(|&(start, end)| start <= index && index <= end)
        .map(|(start, end)| plateau_prominence(spectrum, start, end))
        .unwrap_or(0.0)
}

/// Interior local maxima as inclusive `(start, end)` plateau ranges.
///
/// A plateau qualifies when both neighbours are strictly lower; samples at
/// the array edges are never peaks.
fn local_maxima(spectrum: &[f64]) -> Vec<(usize, usize)> {
    let n = spectrum.len();
    let mut maxima = Vec::new();
    if n < 3 {
        return maxima;
    }

    let mut i = 1;
    while i < n - 1 {
        if !spectrum[i].is_finite() || spectrum[i] <= spectrum[i - 1] {
            i += 1;
            continue;
        }
        let mut end = i;
        while end + 1 < n && spectrum[end + 1] == spectrum[i] {
            end += 1;
        }
        if end + 1 < n && spectrum[end + 1] < spectrum[i] {
            maxima.push((i, end));
        }
        i = end + 1;
    }

    maxima
}

/// Find local maxima whose prominence is at least `min_prominence`.
///
/// Returns at most `max_count` indices sorted by value, highest first, with
/// ties broken by the lower index (lower frequency or shorter period). A
/// plateau reports its middle sample, rounded down.
pub fn find_peaks(spectrum: &[f64], min_prominence: f64, max_count: usize) -> Vec<usize> {
    let mut peaks: Vec<usize> = local_maxima(spectrum)
        .into_iter()
        .filter(|&(start, end)| plateau_prominence(spectrum, start, end) >= min_prominence)
        .map(|(start, end)| (start + end) / 2)
        .collect();

    peaks.sort_by(|&a, &b| spectrum[b].total_cmp(&spectrum[a]).then(a.cmp(&b)));
    peaks.truncate(max_count);
    peaks
}
