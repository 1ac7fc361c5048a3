//! Utility functions and helpers

/// Validate Ethereum address format
pub fn is_valid_address(address: &str) -> bool {
    if !address.starts_with("0x") {
        return false;
    }

    if address.len() != 42 {
        return false;
    }

    address[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Validate transaction hash format
pub fn is_valid_tx_hash(hash: &str) -> bool {
    if !hash.starts_with("0x") {
        return false;
    }

    if hash.len() != 66 {
        return false;
    }

    hash[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Shorten hashes and addresses for logging
pub fn sanitize_for_logging(s: &str) -> String {
    if s.len() <= 10 {
        return s.to_string();
    }

    // Show first 6 and last 4 characters for hashes/addresses
    if s.starts_with("0x") && s.len() > 20 {
        format!("{}...{}", &s[..6], &s[s.len() - 4..])
    } else {
        format!("{}...", &s[..10])
    }
}

/// Calculate percentage
pub fn calculate_percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64) * 100.0
}

/// Format a crypto amount with six decimals, e.g. `2.500000 ETH`
pub fn format_crypto(amount: f64, symbol: &str) -> String {
    format!("{:.6} {}", amount, symbol)
}

/// Format a USD amount, e.g. `$6000.00`
pub fn format_usd(amount: f64) -> String {
    format!("${:.2}", amount)
}
