//! Phone-number normalization shared by the SMS and Voice processors
//! (§4.3): strip everything but digits, then prepend the US country code
//! when the result looks like a bare 10-digit local number. Idempotent by
//! construction — a number that already carries the country code, or isn't
//! 10 digits once stripped, passes through unchanged on a second call.

pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 10 { format!("1{digits}") } else { digits }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_and_adds_country_code() {
        assert_eq!(normalize_phone("+1 (555) 123-4567"), "15551234567");
        assert_eq!(normalize_phone("555-123-4567"), "15551234567");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["+15551234567", "555-123-4567", "not-a-number"] {
            let once = normalize_phone(raw);
            assert_eq!(normalize_phone(&once), once);
        }
    }
}
