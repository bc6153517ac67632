/*
 * Responsibility
 * - public id <-> internal id for auctions (sqids)
 * - extractors and handlers go through this service only, so the scheme can change in one place
 */
use sqids::{Error as SqidsError, Sqids};

pub type Result<T> = std::result::Result<T, IdCodecError>;

#[derive(Debug, thiserror::Error)]
pub enum IdCodecError {
    #[error("SQIDS_MIN_LENGTH must be between 0 and 255, got {value}")]
    InvalidMinLength { value: usize },
    #[error("sqids error: {0}")]
    Sqids(#[from] SqidsError),
    #[error("id must be positive, got {value}")]
    NonPositiveId { value: i64 },
    #[error("invalid public id format")]
    DecodeInvalidFormat,
    #[error("decoded id is out of range")]
    DecodeOutOfRange,
}

#[derive(Clone, Debug)]
pub struct IdCodec {
    sqids: Sqids,
}

impl IdCodec {
    pub fn new(min_length: usize, alphabet: &str) -> Result<Self> {
        let min_length: u8 = min_length
            .try_into()
            .map_err(|_| IdCodecError::InvalidMinLength { value: min_length })?;

        let sqids = Sqids::builder()
            .min_length(min_length)
            .alphabet(alphabet.chars().collect())
            .build()?;

        Ok(Self { sqids })
    }

    /// Auction ids start at 1; zero and negatives never leave the server.
    pub fn encode(&self, id: i64) -> Result<String> {
        let n = u64::try_from(id)
            .ok()
            .filter(|n| *n > 0)
            .ok_or(IdCodecError::NonPositiveId { value: id })?;
        Ok(self.sqids.encode(&[n])?)
    }

    pub fn decode(&self, public_id: &str) -> Result<i64> {
        let nums = self.sqids.decode(public_id);
        let [n] = nums.as_slice() else {
            return Err(IdCodecError::DecodeInvalidFormat);
        };
        // reject non-canonical spellings that happen to decode
        if self.sqids.encode(&[*n])? != public_id {
            return Err(IdCodecError::DecodeInvalidFormat);
        }
        i64::try_from(*n).map_err(|_| IdCodecError::DecodeOutOfRange)
    }
}
