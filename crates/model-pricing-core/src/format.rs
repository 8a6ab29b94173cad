use crate::currency::currency_symbol;

/// Minor-unit digits shown for a currency.
pub fn minor_digits(code: &str) -> usize {
    match code.trim().to_uppercase().as_str() {
        "JPY" | "KRW" => 0,
        _ => 2,
    }
}

/// Prefix placed before an amount: the symbol when known, else "CODE ".
pub fn currency_prefix(code: &str) -> String {
    match currency_symbol(code) {
        Some(sym) => sym.to_string(),
        None => format!("{} ", code.trim().to_uppercase()),
    }
}

/// "$1.50", "€0.30", "¥150", "XYZ 4.00".
pub fn format_amount(amount: f64, code: &str) -> String {
    format_amount_with(amount, code, minor_digits(code))
}

/// Like [`format_amount`] with a fixed number of decimals.
pub fn format_amount_with(amount: f64, code: &str, decimals: usize) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}{}{:.*}", currency_prefix(code), decimals, amount.abs())
}
