use num_prime::nt_funcs::factorize64;

use crate::error::DspError;

/// Lengths whose largest prime factor reaches this bound make the FFT slow.
pub const MAX_PRIME_FACTOR: u64 = 100;

/// Largest prime factor of `n`. A prime is its own largest factor; 1 maps to 1.
///
/// # Example
/// ```
/// use aaa_dsp::fft_length::largest_prime_factor;
/// assert_eq!(largest_prime_factor(100), 5);
/// assert_eq!(largest_prime_factor(101), 101);
/// assert_eq!(largest_prime_factor(1), 1);
/// ```
#[must_use]
pub fn largest_prime_factor(n: u64) -> u64 {
    if n <= 1 {
        return n;
    }
    factorize64(n).keys().next_back().copied().unwrap_or(n)
}

/// Largest length `m <= n` whose prime factors are all below [`MAX_PRIME_FACTOR`].
///
/// Computing an FFT on a length with a large prime factor can be very slow;
/// truncating the signal to `best_fft_length(n)` samples avoids it.
///
/// # Errors
/// Returns `DspError::InvalidLength` if `n == 0`.
///
/// # Example
/// ```
/// use aaa_dsp::best_fft_length;
/// assert_eq!(best_fft_length(100).unwrap(), 100);
/// assert_eq!(best_fft_length(101).unwrap(), 100);
/// assert_eq!(best_fft_length(37).unwrap(), 37);
/// ```
pub fn best_fft_length(n: usize) -> Result<usize, DspError> {
    if n == 0 {
        return Err(DspError::InvalidLength(n));
    }
    if (n as u64) < MAX_PRIME_FACTOR {
        return Ok(n);
    }

    let mut m = n as u64;
    while largest_prime_factor(m) >= MAX_PRIME_FACTOR {
        m -= 1;
    }
    if m != n as u64 {
        log::debug!("best_fft_length: {n} -> {m}");
    }
    Ok(m as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smooth_lengths_are_kept() {
        assert_eq!(best_fft_length(1).unwrap(), 1);
        assert_eq!(best_fft_length(2).unwrap(), 2);
        assert_eq!(best_fft_length(97).unwrap(), 97);
        assert_eq!(best_fft_length(1024).unwrap(), 1024);
        assert_eq!(best_fft_length(44100).unwrap(), 44100);
    }

    #[test]
    fn prime_lengths_step_down() {
        assert_eq!(best_fft_length(101).unwrap(), 100);
        // 211 prime, 210 = 2·3·5·7
        assert_eq!(best_fft_length(211).unwrap(), 210);
        // 202 = 2·101, 201 = 3·67
        assert_eq!(best_fft_length(202).unwrap(), 201);
    }

    #[test]
    fn zero_length_is_rejected() {
        assert_eq!(best_fft_length(0), Err(DspError::InvalidLength(0)));
    }

    #[test]
    fn result_is_bounded_and_smooth() {
        for n in (1..5000).step_by(7) {
            let m = best_fft_length(n).unwrap();
            assert!(m <= n, "best_fft_length({n}) = {m} > {n}");
            assert!(
                largest_prime_factor(m as u64) < MAX_PRIME_FACTOR,
                "best_fft_length({n}) = {m} has a large prime factor"
            );
        }
    }

    #[test]
    fn largest_prime_factor_of_composites() {
        assert_eq!(largest_prime_factor(2 * 2 * 3 * 97), 97);
        assert_eq!(largest_prime_factor(3 * 101 * 103), 103);
        assert_eq!(largest_prime_factor(1 << 20), 2);
    }
}
