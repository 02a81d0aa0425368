/*!
 * Proportional redistribution of translated text across formatting runs.
 *
 * All lengths are in characters, never bytes, so a run boundary can never
 * fall inside a multi-byte character.
 */

/// Default distance searched around a split point for a space
pub const DEFAULT_SPACE_SEARCH_WINDOW: usize = 5;

/// Split `text` across runs in proportion to their original character lengths.
///
/// Returns exactly one string per run; their concatenation equals `text`.
/// When the original runs carried no text at all, the first run receives
/// everything.
pub fn distribute(text: &str, run_lengths: &[usize], window: usize) -> Vec<String> {
    if run_lengths.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let total_original: usize = run_lengths.iter().sum();

    let mut pieces = vec![String::new(); run_lengths.len()];
    if total_original == 0 || run_lengths.len() == 1 {
        pieces[0] = text.to_string();
        return pieces;
    }

    let last = run_lengths.len() - 1;
    let mut cursor = 0;
    let mut remaining_original = total_original;

    for (index, &original_length) in run_lengths.iter().enumerate() {
        let remaining = chars.len() - cursor;
        if index == last {
            pieces[index] = chars[cursor..].iter().collect();
            break;
        }

        let take = if remaining_original == 0 || original_length == 0 {
            0
        } else {
            let target = (remaining as f64 * original_length as f64 / remaining_original as f64).round() as usize;
            snap_to_space(&chars[cursor..], target.min(remaining), window)
        };

        pieces[index] = chars[cursor..cursor + take].iter().collect();
        cursor += take;
        remaining_original -= original_length;
    }

    pieces
}

/// Move a split point to just after the nearest space within `window` characters
fn snap_to_space(chars: &[char], target: usize, window: usize) -> usize {
    if target == 0 || target >= chars.len() {
        return target;
    }

    let low = target.saturating_sub(window);
    let high = (target + window).min(chars.len());

    // A split at `n` keeps chars[..n]; it is clean when chars[n - 1] is whitespace.
    (low.max(1)..=high)
        .filter(|&split| chars[split - 1].is_whitespace())
        .min_by_key(|&split| split.abs_diff(target))
        .unwrap_or(target)
}
