//! Small utility helpers used across modules.

/// Display name before any parenthesised alias: "Educator (AKA ED)" -> "Educator".
pub fn short_name(name: &str) -> &str {
  name.split(" (").next().unwrap_or(name)
}

/// Keep logs free of full addresses: "alice@example.org" -> "a***@example.org".
pub fn mask_email(email: &str) -> String {
  match email.split_once('@') {
    Some((local, domain)) => {
      let first: String = local.chars().take(1).collect();
      format!("{}***@{}", first, domain)
    }
    None => "***".into(),
  }
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) {
    cut -= 1;
  }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn short_name_strips_alias() {
    assert_eq!(short_name("Educator (AKA ED)"), "Educator");
    assert_eq!(short_name("Plain"), "Plain");
  }

  #[test]
  fn mask_email_hides_local_part() {
    assert_eq!(mask_email("alice@example.org"), "a***@example.org");
    assert_eq!(mask_email("garbage"), "***");
  }

  #[test]
  fn trunc_respects_char_boundaries() {
    assert_eq!(trunc_for_log("short", 10), "short");
    let out = trunc_for_log("ééééé", 3);
    assert!(out.starts_with("é…"));
    assert!(out.ends_with("(10 bytes total)"));
  }
}
