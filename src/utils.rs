/// Formats a float the way C's `%g` does: six significant digits,
/// trailing zeros trimmed, scientific notation outside [1e-4, 1e6).
///
/// Parameter values written into case XML and used in directory names go
/// through this so that `0.01` never shows up as `0.010000000000000002`.
pub fn fmt_g(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    if !v.is_finite() {
        return v.to_string();
    }
    let exp = v.abs().log10().floor() as i32;
    if (-4..6).contains(&exp) {
        let decimals = (5 - exp).max(0) as usize;
        trim_trailing_zeros(format!("{:.*}", decimals, v))
    } else {
        // {:.5e} gives "1.50000e-7"; %g wants "1.5e-07"
        let s = format!("{:.5e}", v);
        match s.split_once('e') {
            Some((mantissa, exp_str)) => {
                let mantissa = trim_trailing_zeros(mantissa.to_string());
                let e: i32 = exp_str.parse().unwrap_or(0);
                let sign = if e < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, e.abs())
            }
            None => s,
        }
    }
}

fn trim_trailing_zeros(mut s: String) -> String {
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_values_drop_trailing_zeros() {
        assert_eq!(fmt_g(0.01), "0.01");
        assert_eq!(fmt_g(8.0), "8");
        assert_eq!(fmt_g(-1.0), "-1");
        assert_eq!(fmt_g(0.5), "0.5");
        assert_eq!(fmt_g(2.5), "2.5");
        assert_eq!(fmt_g(123.456), "123.456");
        assert_eq!(fmt_g(0.0), "0");
    }

    #[test]
    fn six_significant_digits() {
        assert_eq!(fmt_g(0.000123), "0.000123");
        assert_eq!(fmt_g(123456.0), "123456");
        assert_eq!(fmt_g(1.2345678), "1.23457");
    }

    #[test]
    fn scientific_outside_fixed_range() {
        assert_eq!(fmt_g(1e-5), "1e-05");
        assert_eq!(fmt_g(1234567.0), "1.23457e+06");
        assert_eq!(fmt_g(-2.5e-7), "-2.5e-07");
    }
}
