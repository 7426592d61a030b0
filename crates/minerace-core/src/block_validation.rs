//! Admission rules for candidate blocks.
//!
//! The validator runs three checks in a fixed order and stops at the first
//! failure:
//!
//! 1. **Proof-of-work** ([`check_proof_of_work`]): the checksum recomputed
//!    from the candidate's own fields must equal the stored checksum and meet
//!    the run difficulty, and the candidate must claim the run difficulty.
//! 2. **Height** ([`check_height`]): the candidate must sit at the current
//!    chain length, one past the head.
//! 3. **Linkage** ([`check_linkage`]): the candidate's `prev_checksum` must
//!    equal the head's checksum.
//!
//! All three are pure functions of the candidate and a chain view.
//! [`Chain::admit`] runs them and links the candidate in one call, so a
//! caller holding the chain's write lock cannot interleave a second append.

use crate::chain::{Chain, ChainTip};
use crate::difficulty::Difficulty;
use crate::digest::ChecksumProvider;
use crate::error::AdmissionError;
use crate::types::Block;

/// Recompute the checksum and check it against the stored value and the
/// run difficulty.
pub fn check_proof_of_work(
    candidate: &Block,
    difficulty: Difficulty,
    digest: &dyn ChecksumProvider,
) -> Result<(), AdmissionError> {
    let calculated = digest.checksum(&candidate.header);
    if calculated != candidate.checksum {
        return Err(AdmissionError::ChecksumMismatch {
            received: candidate.checksum,
            calculated,
        });
    }

    if candidate.header.difficulty != difficulty.bits() {
        return Err(AdmissionError::DifficultyMismatch {
            got: candidate.header.difficulty,
            expected: difficulty.bits(),
        });
    }

    if !difficulty.is_met_by(calculated) {
        return Err(AdmissionError::InsufficientWork {
            checksum: calculated,
            leading_zeros: calculated.leading_zeros(),
            difficulty: difficulty.bits(),
        });
    }

    Ok(())
}

/// The candidate must extend the chain by exactly one.
pub fn check_height(candidate: &Block, tip: &ChainTip) -> Result<(), AdmissionError> {
    let expected = tip.next_height();
    let got = candidate.header.height;
    if got < expected {
        return Err(AdmissionError::StaleHeight { got, expected });
    }
    if got > expected {
        return Err(AdmissionError::UnexpectedHeight { got, expected });
    }
    Ok(())
}

/// The candidate must point at the current head.
pub fn check_linkage(candidate: &Block, tip: &ChainTip) -> Result<(), AdmissionError> {
    if candidate.header.prev_checksum != tip.checksum {
        return Err(AdmissionError::BrokenLinkage {
            got: candidate.header.prev_checksum,
            expected: tip.checksum,
        });
    }
    Ok(())
}

/// Run all admission checks in order against the current chain.
pub fn validate_candidate(
    candidate: &Block,
    chain: &Chain,
    digest: &dyn ChecksumProvider,
) -> Result<(), AdmissionError> {
    let tip = chain.tip();
    check_proof_of_work(candidate, chain.difficulty(), digest)?;
    check_height(candidate, &tip)?;
    check_linkage(candidate, &tip)?;
    Ok(())
}
