//! End-to-end tests for minerace.
//!
//! Each test drives real producers and a real validator, either round by
//! round on the test thread or as a threaded simulation, and checks the
//! resulting chain from head to genesis.

use std::sync::Arc;

use minerace_consensus::{Event, MemorySink, Producer, Submission, Validator, Verdict};
use minerace_core::digest::DigestKind;
use minerace_core::{ChecksumProvider, Crc32Checksum, ProducerId, Sha256Checksum};
use minerace_sim::{SimConfig, Simulation};
use minerace_tests::helpers::*;

#[test]
fn single_miner_five_rounds() {
    let (shared, sink) = shared_state(0, Arc::new(Crc32Checksum));
    let miner = Producer::honest(ProducerId(1), shared.clone());
    let mut validator = Validator::new(shared.clone());

    for round in 1..=5 {
        assert_eq!(miner.step().unwrap(), Submission::Published { height: round });
        let verdict = validator.process_next().unwrap();
        assert!(verdict.is_accepted(), "round {round}: {verdict:?}");
    }

    let chain = shared.chain();
    assert_eq!(chain.length(), 6);
    assert_eq!(heights(&chain), vec![5, 4, 3, 2, 1, 0]);
    assert_chain_consistent(&chain);
    assert!(chain.audit(shared.digest()).is_ok());
    assert_eq!(sink.accepted().len(), 5);
    assert!(sink.rejected().is_empty());
}

#[test]
fn single_miner_five_rounds_threaded() {
    let sim = Simulation::start(&fast_config(1, 0, 5)).unwrap();
    let shared = sim.shared().clone();
    let report = sim.join().unwrap();

    assert_eq!(report.accepted, 5);
    assert_eq!(report.tip.length, 6);
    let chain = shared.chain();
    assert_eq!(heights(&chain), vec![5, 4, 3, 2, 1, 0]);
    assert_chain_consistent(&chain);
    assert!(chain
        .iter()
        .filter(|b| !b.producer().is_genesis())
        .all(|b| b.producer() == ProducerId(1)));
}

#[test]
fn mined_blocks_meet_difficulty() {
    let (shared, _) = shared_state(6, Arc::new(Sha256Checksum));
    let miner = Producer::honest(ProducerId(7), shared.clone());
    let mut validator = Validator::new(shared.clone());

    for _ in 0..4 {
        miner.step().unwrap();
        assert!(validator.process_next().unwrap().is_accepted());
    }

    let chain = shared.chain();
    for block in chain.iter().filter(|b| b.height() > 0) {
        assert!(block.checksum.leading_zeros() >= 6, "{block:?}");
        assert_eq!(block.checksum, Sha256Checksum.checksum(&block.header));
    }
    assert!(chain.audit(shared.digest()).is_ok());
}

#[test]
fn predictable_search_with_stub_digest() {
    let (shared, sink) = shared_state(9, Arc::new(ShiftedNonce));
    let miner = Producer::honest(ProducerId(1), shared.clone());
    let mut validator = Validator::new(shared.clone());

    miner.step().unwrap();
    validator.process_next().unwrap();

    assert_eq!(shared.chain().head().header.nonce, 9);
    let mined = sink
        .events()
        .into_iter()
        .find(|e| e.kind() == "mined")
        .unwrap();
    assert!(matches!(mined, Event::Mined { attempts: 10, nonce: 9, .. }));
}

#[test]
fn accepted_events_carry_full_block() {
    let (shared, sink) = shared_state(0, Arc::new(Crc32Checksum));
    let miner = Producer::honest(ProducerId(4), shared.clone());
    let mut validator = Validator::new(shared.clone());
    miner.step().unwrap();
    validator.process_next().unwrap();

    let chain = shared.chain();
    let head = chain.head();
    assert_eq!(
        sink.accepted(),
        vec![Event::Accepted {
            producer: ProducerId(4),
            height: 1,
            checksum: head.checksum,
            prev_checksum: chain.get(0).unwrap().checksum,
            timestamp: TEST_TIME,
            difficulty: 0,
            nonce: 0,
        }]
    );
}

#[test]
fn sha256_simulation_audits_clean() {
    let sink = Arc::new(MemorySink::new());
    let config = SimConfig {
        difficulty: 4,
        digest: DigestKind::Sha256,
        ..fast_config(3, 1, 10)
    };
    let sim = Simulation::start_observed(&config, sink.clone()).unwrap();
    let shared = sim.shared().clone();
    let report = sim.join().unwrap();

    assert_eq!(report.accepted, 10);
    let chain = shared.chain();
    assert_chain_consistent(&chain);
    assert!(chain.audit(&Sha256Checksum).is_ok());
    assert_eq!(sink.accepted().len(), 10);
}

#[test]
fn validator_verdicts_match_chain() {
    let (shared, _) = shared_state(0, Arc::new(Crc32Checksum));
    let a = Producer::honest(ProducerId(1), shared.clone());
    let mut validator = Validator::new(shared.clone());

    a.step().unwrap();
    let Verdict::Accepted { height, checksum, producer } = validator.process_next().unwrap()
    else {
        panic!("expected acceptance");
    };
    let chain = shared.chain();
    assert_eq!(height, chain.head().height());
    assert_eq!(checksum, chain.head().checksum);
    assert_eq!(producer, ProducerId(1));
}
