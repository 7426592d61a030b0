//! The accepted chain.
//!
//! [`Chain`] owns every accepted block through a singly-linked list running
//! from the head back to genesis. It is not thread-safe on its own; the
//! consensus crate wraps it in a lock and lets only the validator append.
//!
//! The only way to extend a chain is [`Chain::admit`], which runs the
//! [`block_validation`](crate::block_validation) rules first. Accepted blocks
//! are reachable only through shared references, so they never change.

use std::fmt;

use crate::block_validation;
use crate::difficulty::Difficulty;
use crate::digest::ChecksumProvider;
use crate::error::{AdmissionError, ChainError};
use crate::genesis;
use crate::types::{Block, Checksum};

/// A copy of the chain head's coordinates.
///
/// Miners take one of these under the chain lock and build against it after
/// the lock is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainTip {
    /// Height of the head block.
    pub height: u64,
    /// Checksum of the head block.
    pub checksum: Checksum,
    /// Number of blocks including genesis. Always `height + 1`.
    pub length: u64,
}

impl ChainTip {
    /// Height the next block must carry.
    pub fn next_height(&self) -> u64 {
        self.length
    }
}

/// Linear chain of accepted blocks.
pub struct Chain {
    head: Box<Block>,
    length: u64,
    difficulty: Difficulty,
}

impl Chain {
    /// Start a chain with a freshly built genesis block.
    pub fn new(difficulty: Difficulty, timestamp: u64, digest: &dyn ChecksumProvider) -> Self {
        Self {
            head: Box::new(genesis::genesis_block(difficulty, timestamp, digest)),
            length: 1,
            difficulty,
        }
    }

    /// The most recently accepted block.
    pub fn head(&self) -> &Block {
        &self.head
    }

    /// Number of accepted blocks, genesis included.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Run difficulty every block above genesis must meet.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Snapshot of the head's coordinates.
    pub fn tip(&self) -> ChainTip {
        ChainTip {
            height: self.head.header.height,
            checksum: self.head.checksum,
            length: self.length,
        }
    }

    /// Run the admission checks against this chain and, if they pass, link
    /// `candidate` as the new head.
    ///
    /// A rejected candidate is dropped and the chain is left untouched.
    pub fn admit(
        &mut self,
        candidate: Block,
        digest: &dyn ChecksumProvider,
    ) -> Result<(), AdmissionError> {
        block_validation::validate_candidate(&candidate, self, digest)?;
        self.link(candidate);
        Ok(())
    }

    fn link(&mut self, block: Block) {
        let old_head = std::mem::replace(&mut self.head, Box::new(block));
        self.head.prev = Some(old_head);
        self.length += 1;
    }

    /// Walk from the head back to genesis.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            next: Some(&self.head),
        }
    }

    /// The accepted block at `height`, if any.
    pub fn get(&self, height: u64) -> Option<&Block> {
        if height >= self.length {
            return None;
        }
        self.iter().find(|b| b.header.height == height)
    }

    /// Re-verify every accepted block.
    ///
    /// Checks that heights descend by one down to genesis, that every stored
    /// checksum matches a fresh recomputation, that every non-genesis block
    /// meets the run difficulty and links to its predecessor's checksum, and
    /// that `length` agrees with the head height.
    pub fn audit(&self, digest: &dyn ChecksumProvider) -> Result<(), ChainError> {
        if self.head.header.height + 1 != self.length {
            return Err(ChainError::LengthMismatch {
                length: self.length,
                head_height: self.head.header.height,
            });
        }

        let mut expected_height = self.head.header.height;
        for block in self.iter() {
            let height = block.header.height;
            if height != expected_height {
                return Err(ChainError::HeightMismatch {
                    expected: expected_height,
                    got: height,
                });
            }

            let calculated = digest.checksum(&block.header);
            if calculated != block.checksum {
                return Err(ChainError::ChecksumMismatch {
                    height,
                    stored: block.checksum,
                    calculated,
                });
            }

            match block.prev() {
                Some(prev) => {
                    if !self.difficulty.is_met_by(block.checksum) {
                        return Err(ChainError::InsufficientWork {
                            height,
                            checksum: block.checksum,
                        });
                    }
                    if block.header.prev_checksum != prev.checksum {
                        return Err(ChainError::LinkageMismatch {
                            height,
                            got: block.header.prev_checksum,
                            expected: prev.checksum,
                        });
                    }
                }
                None if height != 0 => {
                    return Err(ChainError::HeightMismatch {
                        expected: 0,
                        got: height,
                    });
                }
                None => {}
            }

            expected_height = expected_height.saturating_sub(1);
        }
        Ok(())
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("length", &self.length)
            .field("difficulty", &self.difficulty)
            .field("head", &self.head)
            .finish()
    }
}

impl Drop for Chain {
    // Unlink iteratively; the default recursive drop would overflow the stack
    // on a long chain.
    fn drop(&mut self) {
        let mut next = self.head.prev.take();
        while let Some(mut block) = next {
            next = block.prev.take();
        }
    }
}

/// Iterator over accepted blocks, head first.
pub struct Iter<'a> {
    next: Option<&'a Block>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Block;

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.next?;
        self.next = block.prev();
        Some(block)
    }
}

impl<'a> IntoIterator for &'a Chain {
    type Item = &'a Block;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
