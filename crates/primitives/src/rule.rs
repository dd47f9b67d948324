//! This module contains the [Rule] type as well as several helper macros for applying
//! rules on top of one another.

/// A [Rule] checks a piece of state, passing it through on success.
pub type Rule<T, E = anyhow::Error> = Box<dyn Fn(T) -> Result<T, E>>;

/// Applies each rule to the state in order, short-circuiting on the first failure.
#[macro_export]
macro_rules! chain_rules {
    ($state:expr, $($rule:expr),+) => {{
        let mut result = Ok($state);

        $(
            result = match result {
                Ok(val) => $rule(val),
                err @ Err(_) => err,
            };
        )+

        result
    }};
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum SeqError {
        TooLarge,
        Misaligned,
    }

    #[test]
    fn apply_sequential_rules() {
        let sequence = 1_200u64;

        let rule_bounded: Rule<u64> = Box::new(|seq: u64| {
            if seq < 10_000 {
                Ok(seq)
            } else {
                Err(anyhow::anyhow!("sequence number must be below 10000"))
            }
        });
        let rule_aligned: Rule<u64> = Box::new(|seq: u64| {
            if seq % 600 == 0 {
                Ok(seq)
            } else {
                Err(anyhow::anyhow!("sequence number must be a multiple of 600"))
            }
        });

        let result = chain_rules!(sequence, rule_bounded, rule_aligned);
        assert_eq!(result.unwrap(), 1_200);
    }

    #[test]
    fn first_failure_short_circuits() {
        let sequence = 20_001u64;

        let rule_bounded: Rule<u64, SeqError> = Box::new(|seq: u64| {
            if seq < 10_000 {
                Ok(seq)
            } else {
                Err(SeqError::TooLarge)
            }
        });
        let rule_aligned: Rule<u64, SeqError> = Box::new(|seq: u64| {
            if seq % 600 == 0 {
                Ok(seq)
            } else {
                Err(SeqError::Misaligned)
            }
        });

        let result = chain_rules!(sequence, rule_bounded, rule_aligned);
        assert_eq!(result, Err(SeqError::TooLarge));
    }

    fn starts_with_seven(s: &[u8; 4]) -> Result<&[u8; 4], SeqError> {
        if s[0] == 7 {
            Ok(s)
        } else {
            Err(SeqError::Misaligned)
        }
    }

    fn ends_with_seven(s: &[u8; 4]) -> Result<&[u8; 4], SeqError> {
        if s[3] == 7 {
            Ok(s)
        } else {
            Err(SeqError::TooLarge)
        }
    }

    #[test]
    fn borrowed_state_passes_through() {
        let expected = [7u8; 4];
        let result = chain_rules!(&expected, starts_with_seven, ends_with_seven);
        assert_eq!(result, Ok(&expected));

        let mixed = [7u8, 0, 0, 0];
        assert_eq!(
            chain_rules!(&mixed, starts_with_seven, ends_with_seven),
            Err(SeqError::TooLarge)
        );
    }
}
