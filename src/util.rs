/// Arithmetic mean, None for an empty slice
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population standard deviation, None for an empty slice
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    let variance = data.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / data.len() as f64;
    Some(variance.sqrt())
}

/// Rounded integer percentage of `part` over `whole`; 0 when `whole` is 0
pub fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_values() {
        assert_eq!(mean(&[250., 300., 350.]), Some(300.0));
        assert_eq!(mean(&[87.5]), Some(87.5));
    }

    #[test]
    fn mean_empty_is_none() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn std_dev_of_values() {
        assert_eq!(std_dev(&[300., 300., 300.]), Some(0.0));
        let sd = std_dev(&[300., 400.]).unwrap();
        assert!((sd - 50.0).abs() < 1e-10);
    }

    #[test]
    fn std_dev_empty_is_none() {
        assert_eq!(std_dev(&[]), None);
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(0, 3), 0);
    }

    #[test]
    fn percent_of_zero_whole() {
        assert_eq!(percent(5, 0), 0);
    }
}
