use crate::domain::model::DEFAULT_COST_UNIT_RATIO;

/// 顯示單位與上游原生單位之間的換算（例如 8.0 <-> 80）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitConverter {
    ratio: i64,
}

impl UnitConverter {
    pub fn new(ratio: i64) -> Self {
        Self { ratio: ratio.max(1) }
    }

    pub fn ratio(&self) -> i64 {
        self.ratio
    }

    /// 四捨五入到最近的整數（遠離零），避免浮點誤差造成上游篩選不一致
    pub fn to_native(&self, display_value: f64) -> i64 {
        (display_value * self.ratio as f64).round() as i64
    }

    /// 單純除法，不做四捨五入
    pub fn to_display(&self, native_value: f64) -> f64 {
        native_value / self.ratio as f64
    }
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self::new(DEFAULT_COST_UNIT_RATIO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_native_rounds_half_away_from_zero() {
        let conv = UnitConverter::default();
        assert_eq!(conv.to_native(7.5), 75);
        assert_eq!(conv.to_native(7.55), 76);
        assert_eq!(conv.to_native(0.05), 1);
        assert_eq!(conv.to_native(-0.05), -1);
        // 0.1 + 0.2 的浮點漂移不能影響結果
        assert_eq!(conv.to_native(0.1 + 0.2), 3);
    }

    #[test]
    fn test_to_display_is_plain_division() {
        let conv = UnitConverter::default();
        assert_eq!(conv.to_display(80.0), 8.0);
        assert_eq!(conv.to_display(45.0), 4.5);
        assert_eq!(conv.to_display(1.0), 0.1);
    }

    #[test]
    fn test_round_trip_within_native_granularity() {
        let conv = UnitConverter::default();
        let half_unit = 0.5 / conv.ratio() as f64;
        for x in [0.0, 0.04, 3.33, 4.25, 7.77, 12.3456, 99.99, 150.05] {
            let back = conv.to_display(conv.to_native(x) as f64);
            assert!(
                (back - x).abs() <= half_unit + 1e-9,
                "{} round-tripped to {}",
                x,
                back
            );
        }
    }

    #[test]
    fn test_ratio_is_configurable() {
        let conv = UnitConverter::new(100);
        assert_eq!(conv.to_native(1.234), 123);
        assert_eq!(conv.to_display(250.0), 2.5);
        // 非正數比例退回 1
        assert_eq!(UnitConverter::new(0).ratio(), 1);
    }
}
