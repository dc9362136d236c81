/// Validates a SteamID64 format.
///
/// A valid SteamID64 is:
/// - Exactly 17 digits
/// - Starts with the "7656119" individual-account prefix
/// - All characters are ASCII digits
#[must_use]
pub fn is_valid_steam_id64(s: &str) -> bool {
    s.len() == 17 && s.starts_with("7656119") && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_steam_id64() {
        assert!(is_valid_steam_id64("76561197960287930"));
        assert!(is_valid_steam_id64("76561190000000000"));
        assert!(is_valid_steam_id64("76561199999999999"));
    }

    #[test]
    fn test_invalid_steam_id64_wrong_prefix() {
        assert!(!is_valid_steam_id64("12345678901234567"));
        assert!(!is_valid_steam_id64("76561207960287930"));
    }

    #[test]
    fn test_invalid_steam_id64_wrong_length() {
        assert!(!is_valid_steam_id64("7656119796028793")); // 16 chars
        assert!(!is_valid_steam_id64("765611979602879301")); // 18 chars
        assert!(!is_valid_steam_id64(""));
    }

    #[test]
    fn test_invalid_steam_id64_non_digits() {
        assert!(!is_valid_steam_id64("7656119abcdefghij"));
        assert!(!is_valid_steam_id64("7656119796028793a"));
    }
}
