/// Group the integer part of an already-rounded amount with commas: 1234567.5 -> "1,234,567.50"
pub fn number(val: f64) -> String {
    let fixed = format!("{:.2}", val.abs());
    let (int_part, dec_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if val < 0.0 && fixed != "0.00" {
        format!("-{with_commas}.{dec_part}")
    } else {
        format!("{with_commas}.{dec_part}")
    }
}

/// Format an amount with a currency label: `Rs. 1,234.56`.
pub fn money(val: f64, currency: &str) -> String {
    if currency.is_empty() {
        number(val)
    } else {
        format!("{currency} {}", number(val))
    }
}

/// Quantities print without decimals when they are whole.
pub fn quantity(val: f64) -> String {
    if val.fract() == 0.0 && val.abs() < 1e15 {
        format!("{}", val as i64)
    } else {
        format!("{val:.2}")
    }
}
