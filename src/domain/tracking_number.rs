use {
    crate::config::constants::tracking_number::{PREFIX, RANDOM_DIGITS, TIMESTAMP_DIGITS},
    anyhow::{Result, anyhow},
    chrono::{DateTime, Utc},
};

/// `SP` + the last six digits of the epoch-ms timestamp + three zero-padded digits.
pub fn format_tracking_number(epoch_ms: i64, random: u32) -> String {
    let stamp = epoch_ms.unsigned_abs().to_string();
    let tail = &stamp[stamp.len().saturating_sub(TIMESTAMP_DIGITS)..];
    let modulus = 10u32.pow(RANDOM_DIGITS);
    format!(
        "{}{:0>ts$}{:0rd$}",
        PREFIX,
        tail,
        random % modulus,
        ts = TIMESTAMP_DIGITS,
        rd = RANDOM_DIGITS as usize
    )
}

pub fn generate_tracking_number(now: DateTime<Utc>) -> Result<String> {
    let mut buf = [0u8; 4];
    getrandom::fill(&mut buf).map_err(|e| anyhow!("Failed to gather randomness: {}", e))?;
    Ok(format_tracking_number(
        now.timestamp_millis(),
        u32::from_le_bytes(buf),
    ))
}
