use rand::Rng;

pub const OTP_LENGTH: usize = 6;

/// Six digit numeric code, uniform over 100000..=999999.
pub fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}
