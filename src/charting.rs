/// Top of the value axis for a bar chart: the largest value, but never below 1
pub fn chart_ceiling(values: &[f64]) -> f64 {
    values.iter().copied().fold(1.0, f64::max)
}

/// Length in cells of a bar for `value` on a chart `width` cells wide
pub fn bar_len(value: f64, ceiling: f64, width: usize) -> usize {
    if ceiling <= 0.0 || value <= 0.0 {
        return 0;
    }
    let ratio = (value / ceiling).min(1.0);
    (ratio * width as f64).round() as usize
}

pub fn render_bar(value: f64, ceiling: f64, width: usize) -> String {
    "█".repeat(bar_len(value, ceiling, width))
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.1}")
    }
}
