/// value = score / cost（顯示單位）。缺值或 cost <= 0 時回傳 None
pub fn derived_value(score: Option<f64>, cost_display: Option<f64>) -> Option<f64> {
    let score = score?;
    let cost = cost_display?;
    if cost <= 0.0 {
        return None;
    }
    Some(score / cost)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_value() {
        assert_eq!(derived_value(Some(6.0), Some(8.0)), Some(0.75));
        assert_eq!(derived_value(Some(6.0), Some(0.0)), None);
        assert_eq!(derived_value(Some(6.0), Some(-4.5)), None);
        assert_eq!(derived_value(None, Some(8.0)), None);
        assert_eq!(derived_value(Some(6.0), None), None);
    }

    #[test]
    fn test_zero_score_is_a_real_value() {
        assert_eq!(derived_value(Some(0.0), Some(4.5)), Some(0.0));
    }
}
