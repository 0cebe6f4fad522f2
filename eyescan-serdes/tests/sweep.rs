//! End-to-end sweeps against the simulated chain, raw bit-bang path.

use eyescan_io::{ChainPosition, Controller, bitbang::BitbangTransport, fake::SimulatedChain};
use eyescan_serdes::{
    ReceiverBlock, SweepConfig,
    readback::synthesize_reply,
    registers::Diagnostic,
    sweep,
};

fn controller_with_counters(
    chain: ChainPosition,
    block: ReceiverBlock,
    counters: [u16; 4],
) -> Controller<BitbangTransport<SimulatedChain>> {
    let (sim, state) = SimulatedChain::new();
    let reply_len = Diagnostic::BITS + block.trailing_pad() + chain.count() - 1;
    state.borrow_mut().default_dr_reply =
        Some(synthesize_reply(counters, chain, block, reply_len));
    Controller::new(BitbangTransport::new(sim), chain)
}

#[test]
fn single_block_sweep_shape() {
    let chain = ChainPosition::SOLO;
    let mut cont = controller_with_counters(chain, ReceiverBlock::R0, [5, 6, 7, 8]);
    let config = SweepConfig::default();

    let mut out = Vec::new();
    let emitted = sweep::run_block(&mut cont, ReceiverBlock::R0, &config, &mut out).unwrap();
    assert_eq!(emitted, 8192);

    let lines: Vec<Vec<i32>> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| l.split('\t').map(|f| f.parse().unwrap()).collect())
        .collect();
    assert_eq!(lines.len(), 8192);
    assert_eq!(lines[0], [0, 0, 31, 15, 5]);

    let mut expected = Vec::new();
    for voltage in (-32..=31).rev() {
        for phase in (-16..=15).rev() {
            for (lane, counter) in [5, 6, 7, 8].into_iter().enumerate() {
                expected.push(vec![lane as i32, 0, voltage, phase, counter]);
            }
        }
    }
    assert_eq!(lines, expected);
}

#[test]
fn r1_lanes_are_offset_by_four() {
    let chain = ChainPosition::SOLO;
    let mut cont = controller_with_counters(chain, ReceiverBlock::R1, [1, 2, 3, 4]);
    let config = SweepConfig::default();

    let mut out = Vec::new();
    let emitted = sweep::run_block(&mut cont, ReceiverBlock::R1, &config, &mut out).unwrap();
    assert_eq!(emitted, 8192);

    let out = String::from_utf8(out).unwrap();
    let first: Vec<&str> = out.lines().next().unwrap().split('\t').collect();
    assert_eq!(first, ["4", "0", "31", "15", "1"]);
    for line in out.lines() {
        let lane: u8 = line.split('\t').next().unwrap().parse().unwrap();
        assert!((4..8).contains(&lane));
    }
}

#[test]
fn full_sweep_covers_both_blocks() {
    let chain = ChainPosition::SOLO;
    let mut cont = controller_with_counters(chain, ReceiverBlock::R0, [0, 0, 0, 0]);
    let config = SweepConfig { bit_number: 2, ..SweepConfig::default() };

    let mut out = Vec::new();
    let emitted = sweep::run(&mut cont, &config, &mut out).unwrap();
    assert_eq!(emitted, config.expected_samples());
    assert_eq!(emitted, 32768);

    let out = String::from_utf8(out).unwrap();
    let bits: Vec<u8> = out
        .lines()
        .map(|l| l.split('\t').nth(1).unwrap().parse().unwrap())
        .collect();
    assert!(bits.iter().all(|&b| b < 2));
    let lanes: Vec<u8> = out
        .lines()
        .map(|l| l.split('\t').next().unwrap().parse().unwrap())
        .collect();
    assert!(lanes.contains(&0));
    assert!(lanes.contains(&7));
}

#[test]
fn counters_survive_a_daisy_chain() {
    let chain = ChainPosition::new(2, 3).unwrap();
    let mut cont = controller_with_counters(chain, ReceiverBlock::R0, [100, 200, 300, 400]);
    let config = SweepConfig::default();

    let mut out = Vec::new();
    sweep::run_block(&mut cont, ReceiverBlock::R0, &config, &mut out).unwrap();

    let out = String::from_utf8(out).unwrap();
    let first: Vec<&str> = out.lines().next().unwrap().split('\t').collect();
    assert_eq!(first, ["0", "0", "31", "15", "100"]);
}
