// storefront/src/models/money.rs

/// Formats an amount in pence as `£x.yy`.
pub fn format_gbp(pence: i64) -> String {
  let sign = if pence < 0 { "-" } else { "" };
  let abs = pence.unsigned_abs();
  format!("{}£{}.{:02}", sign, abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
  use super::format_gbp;

  #[test]
  fn formats_pounds_and_pence() {
    assert_eq!(format_gbp(0), "£0.00");
    assert_eq!(format_gbp(550), "£5.50");
    assert_eq!(format_gbp(1440), "£14.40");
    assert_eq!(format_gbp(4000), "£40.00");
    assert_eq!(format_gbp(-220), "-£2.20");
  }
}
